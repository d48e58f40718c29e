use chrono::{DateTime, Utc};
use sqlx::Row;

use upkeep_core::domain::history::{ActiveService, CompletedService, PendingRequest};
use upkeep_core::domain::service_type::ServiceType;

use super::{HistoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlHistoryRepository {
    pool: DbPool,
}

impl SqlHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn parse_service_type(raw: &str) -> Result<ServiceType, RepositoryError> {
    raw.parse().map_err(|_| RepositoryError::Decode(format!("unknown service type `{raw}`")))
}

fn get_text(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<String, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl HistoryRepository for SqlHistoryRepository {
    async fn completed_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<CompletedService>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, service_type, request_id, completed_at
             FROM completed_services
             WHERE user_id = ?
             ORDER BY completed_at DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CompletedService {
                    id: get_text(row, "id")?,
                    user_id: get_text(row, "user_id")?,
                    service_type: parse_service_type(&get_text(row, "service_type")?)?,
                    request_id: row
                        .try_get("request_id")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    completed_at: parse_datetime(&get_text(row, "completed_at")?)?,
                })
            })
            .collect()
    }

    async fn pending_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<PendingRequest>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, service_type, status, created_at
             FROM service_requests
             WHERE user_id = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PendingRequest {
                    id: get_text(row, "id")?,
                    user_id: get_text(row, "user_id")?,
                    service_type: parse_service_type(&get_text(row, "service_type")?)?,
                    status: get_text(row, "status")?,
                    created_at: parse_datetime(&get_text(row, "created_at")?)?,
                })
            })
            .collect()
    }

    async fn active_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActiveService>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, service_type, started_at
             FROM active_services
             WHERE user_id = ?
             ORDER BY started_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ActiveService {
                    id: get_text(row, "id")?,
                    user_id: get_text(row, "user_id")?,
                    service_type: parse_service_type(&get_text(row, "service_type")?)?,
                    started_at: parse_datetime(&get_text(row, "started_at")?)?,
                })
            })
            .collect()
    }

    async fn record_completed(
        &self,
        service: &CompletedService,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO completed_services (id, user_id, service_type, request_id, completed_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&service.id)
        .bind(&service.user_id)
        .bind(service.service_type.as_str())
        .bind(&service.request_id)
        .bind(service.completed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_request(&self, request: &PendingRequest) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO service_requests (id, user_id, service_type, status, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(request.service_type.as_str())
        .bind(&request.status)
        .bind(request.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_active(&self, service: &ActiveService) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO active_services (id, user_id, service_type, started_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&service.id)
        .bind(&service.user_id)
        .bind(service.service_type.as_str())
        .bind(service.started_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use upkeep_core::domain::history::{ActiveService, CompletedService};
    use upkeep_core::domain::service_type::ServiceType;

    use super::SqlHistoryRepository;
    use crate::repositories::HistoryRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlHistoryRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlHistoryRepository::new(pool)
    }

    fn completed(id: &str, user: &str, ty: ServiceType, days_ago: i64) -> CompletedService {
        CompletedService {
            id: id.to_owned(),
            user_id: user.to_owned(),
            service_type: ty,
            request_id: None,
            completed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn zero_history_returns_empty_collections() {
        let repo = setup().await;
        assert!(repo.completed_for_user("user-1", 50).await.expect("completed").is_empty());
        assert!(repo.pending_for_user("user-1", 100).await.expect("pending").is_empty());
        assert!(repo.active_for_user("user-1").await.expect("active").is_empty());
    }

    #[tokio::test]
    async fn completed_services_come_back_most_recent_first() {
        let repo = setup().await;
        repo.record_completed(&completed("c-1", "user-1", ServiceType::Hvac, 300))
            .await
            .expect("insert");
        repo.record_completed(&completed("c-2", "user-1", ServiceType::Hvac, 100))
            .await
            .expect("insert");
        repo.record_completed(&completed("c-3", "user-2", ServiceType::Cleaning, 10))
            .await
            .expect("insert");

        let services = repo.completed_for_user("user-1", 50).await.expect("completed");
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].id, "c-2");
        assert_eq!(services[1].id, "c-1");
    }

    #[tokio::test]
    async fn limit_caps_the_result_set() {
        let repo = setup().await;
        for index in 0..5 {
            repo.record_completed(&completed(
                &format!("c-{index}"),
                "user-1",
                ServiceType::Cleaning,
                index * 30,
            ))
            .await
            .expect("insert");
        }
        let services = repo.completed_for_user("user-1", 3).await.expect("completed");
        assert_eq!(services.len(), 3);
    }

    #[tokio::test]
    async fn active_services_are_scoped_to_the_user() {
        let repo = setup().await;
        repo.record_active(&ActiveService {
            id: "a-1".to_owned(),
            user_id: "user-1".to_owned(),
            service_type: ServiceType::Plumbing,
            started_at: Utc::now(),
        })
        .await
        .expect("insert");

        let mine = repo.active_for_user("user-1").await.expect("active");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].service_type, ServiceType::Plumbing);
        assert!(repo.active_for_user("user-2").await.expect("active").is_empty());
    }
}
