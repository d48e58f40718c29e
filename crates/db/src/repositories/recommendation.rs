use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use upkeep_core::domain::analytics::{
    AnalyticsFilter, AnalyticsReport, KindBreakdown, ServiceTypeBreakdown,
};
use upkeep_core::domain::recommendation::{
    CostRange, Priority, Recommendation, RecommendationKind,
};
use upkeep_core::domain::service_type::ServiceType;

use super::{ActiveFilter, RecommendationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRecommendationRepository {
    pool: DbPool,
}

impl SqlRecommendationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, service_type, kind, priority, title, description, \
     predicted_date, confidence, reasons, cost_min, cost_max, \
     is_active, is_accepted, accepted_at, is_dismissed, dismissed_at, dismiss_reason, \
     actions, notifications, created_at, updated_at";

/// SQL expression ranking priorities for descending sorts.
const PRIORITY_RANK: &str = "CASE priority \
     WHEN 'urgent' THEN 4 WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END";

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse().map_err(|_| RepositoryError::Decode(format!("invalid decimal `{raw}`")))
}

fn decode<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::Decode(format!("column `{column}`: {e}")))
}

fn row_to_recommendation(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Recommendation, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let opt_text = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let flag = |column: &str| -> Result<bool, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };

    let service_type: ServiceType = text("service_type")?
        .parse()
        .map_err(|e| RepositoryError::Decode(format!("{e}")))?;
    let kind: RecommendationKind =
        text("kind")?.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?;
    let priority: Priority =
        text("priority")?.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?;

    let confidence: f64 =
        row.try_get("confidence").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Recommendation {
        id: text("id")?,
        user_id: text("user_id")?,
        service_type,
        kind,
        priority,
        title: text("title")?,
        description: text("description")?,
        predicted_date: parse_datetime(&text("predicted_date")?)?,
        confidence,
        reasons: decode("reasons", &text("reasons")?)?,
        estimated_cost: CostRange::new(
            parse_decimal(&text("cost_min")?)?,
            parse_decimal(&text("cost_max")?)?,
        ),
        is_active: flag("is_active")?,
        is_accepted: flag("is_accepted")?,
        accepted_at: opt_text("accepted_at")?.map(|raw| parse_datetime(&raw)).transpose()?,
        is_dismissed: flag("is_dismissed")?,
        dismissed_at: opt_text("dismissed_at")?.map(|raw| parse_datetime(&raw)).transpose()?,
        dismiss_reason: opt_text("dismiss_reason")?,
        actions: decode("actions", &text("actions")?)?,
        notifications: decode("notifications", &text("notifications")?)?,
        created_at: parse_datetime(&text("created_at")?)?,
        updated_at: parse_datetime(&text("updated_at")?)?,
    })
}

fn push_analytics_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    filter: &AnalyticsFilter,
) {
    if let Some(start) = filter.start {
        builder.push(" AND created_at >= ").push_bind(start.to_rfc3339());
    }
    if let Some(end) = filter.end {
        builder.push(" AND created_at <= ").push_bind(end.to_rfc3339());
    }
    if let Some(user_id) = &filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.clone());
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for SqlRecommendationRepository {
    async fn find_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Recommendation>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM recommendations WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_recommendation).transpose()
    }

    async fn find_active_triple(
        &self,
        user_id: &str,
        service_type: ServiceType,
        kind: RecommendationKind,
    ) -> Result<Option<Recommendation>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM recommendations
             WHERE user_id = ? AND service_type = ? AND kind = ? AND is_active = 1
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(service_type.as_str())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_recommendation).transpose()
    }

    async fn save(&self, rec: &Recommendation) -> Result<(), RepositoryError> {
        let reasons = serde_json::to_string(&rec.reasons)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let actions = serde_json::to_string(&rec.actions)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let notifications = serde_json::to_string(&rec.notifications)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO recommendations
                (id, user_id, service_type, kind, priority, title, description,
                 predicted_date, confidence, reasons, cost_min, cost_max,
                 is_active, is_accepted, accepted_at, is_dismissed, dismissed_at,
                 dismiss_reason, actions, notifications, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                priority = excluded.priority,
                title = excluded.title,
                description = excluded.description,
                predicted_date = excluded.predicted_date,
                confidence = excluded.confidence,
                reasons = excluded.reasons,
                cost_min = excluded.cost_min,
                cost_max = excluded.cost_max,
                is_active = excluded.is_active,
                is_accepted = excluded.is_accepted,
                accepted_at = excluded.accepted_at,
                is_dismissed = excluded.is_dismissed,
                dismissed_at = excluded.dismissed_at,
                dismiss_reason = excluded.dismiss_reason,
                actions = excluded.actions,
                notifications = excluded.notifications,
                updated_at = excluded.updated_at",
        )
        .bind(&rec.id)
        .bind(&rec.user_id)
        .bind(rec.service_type.as_str())
        .bind(rec.kind.as_str())
        .bind(rec.priority.as_str())
        .bind(&rec.title)
        .bind(&rec.description)
        .bind(rec.predicted_date.to_rfc3339())
        .bind(rec.confidence)
        .bind(&reasons)
        .bind(rec.estimated_cost.min.to_string())
        .bind(rec.estimated_cost.max.to_string())
        .bind(rec.is_active)
        .bind(rec.is_accepted)
        .bind(rec.accepted_at.map(|at| at.to_rfc3339()))
        .bind(rec.is_dismissed)
        .bind(rec.dismissed_at.map(|at| at.to_rfc3339()))
        .bind(&rec.dismiss_reason)
        .bind(&actions)
        .bind(&notifications)
        .bind(rec.created_at.to_rfc3339())
        .bind(rec.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_active(
        &self,
        user_id: &str,
        filter: &ActiveFilter,
    ) -> Result<Vec<Recommendation>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM recommendations
             WHERE user_id = "
        ));
        builder.push_bind(user_id);
        builder.push(" AND is_active = 1 AND is_dismissed = 0");

        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ").push_bind(priority.as_str());
        }

        builder.push(format!(
            " ORDER BY {PRIORITY_RANK} DESC, confidence DESC, predicted_date ASC LIMIT "
        ));
        builder.push_bind(filter.limit);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_recommendation).collect()
    }

    async fn count_active_created_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM recommendations
             WHERE user_id = ? AND is_active = 1 AND created_at >= ?",
        )
        .bind(user_id)
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let count: i64 =
            row.try_get("count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        Ok(count as u64)
    }

    async fn list_reminder_candidates(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM recommendations
             WHERE is_active = 1 AND is_accepted = 0 AND is_dismissed = 0
               AND created_at <= ?
             ORDER BY created_at ASC"
        ))
        .bind(created_before.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_recommendation).collect()
    }

    async fn delete_dismissed_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM recommendations
             WHERE is_dismissed = 1 AND dismissed_at <= ?",
        )
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn deactivate_stale(
        &self,
        predicted_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE recommendations
             SET is_active = 0, updated_at = ?
             WHERE is_active = 1 AND is_accepted = 0 AND is_dismissed = 0
               AND predicted_date <= ?",
        )
        .bind(now.to_rfc3339())
        .bind(predicted_before.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn sweep_user_ids(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, RepositoryError> {
        let cutoff = since.to_rfc3339();
        let rows = sqlx::query(
            "SELECT user_id FROM recommendations WHERE created_at >= ?
             UNION
             SELECT user_id FROM completed_services WHERE completed_at >= ?
             ORDER BY user_id",
        )
        .bind(&cutoff)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn analytics(
        &self,
        filter: &AnalyticsFilter,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, RepositoryError> {
        let mut totals: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(is_accepted), 0) AS accepted,
                    COALESCE(SUM(is_dismissed), 0) AS dismissed,
                    COALESCE(SUM(CASE WHEN predicted_date < ",
        );
        totals.push_bind(now.to_rfc3339());
        totals.push(
            " AND is_active = 1 THEN 1 ELSE 0 END), 0) AS overdue,
                    COALESCE(AVG(confidence), 0.0) AS avg_confidence
             FROM recommendations WHERE 1 = 1",
        );
        push_analytics_filters(&mut totals, filter);

        let row = totals.build().fetch_one(&self.pool).await?;
        let count = |column: &str| -> Result<u64, RepositoryError> {
            row.try_get::<i64, _>(column)
                .map(|value| value as u64)
                .map_err(|e| RepositoryError::Decode(e.to_string()))
        };

        let mut report = AnalyticsReport {
            total: count("total")?,
            accepted: count("accepted")?,
            dismissed: count("dismissed")?,
            overdue: count("overdue")?,
            avg_confidence: row
                .try_get("avg_confidence")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            ..AnalyticsReport::default()
        };

        let mut by_type: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT service_type,
                    COUNT(*) AS count,
                    COALESCE(SUM(is_accepted), 0) AS accepted,
                    COALESCE(SUM(is_dismissed), 0) AS dismissed,
                    COALESCE(AVG(confidence), 0.0) AS avg_confidence
             FROM recommendations WHERE 1 = 1",
        );
        push_analytics_filters(&mut by_type, filter);
        by_type.push(" GROUP BY service_type ORDER BY count DESC");

        for row in by_type.build().fetch_all(&self.pool).await? {
            let raw: String = row
                .try_get("service_type")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let service_type: ServiceType =
                raw.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?;
            report.by_service_type.push(ServiceTypeBreakdown {
                service_type,
                count: row.try_get::<i64, _>("count").unwrap_or(0) as u64,
                accepted: row.try_get::<i64, _>("accepted").unwrap_or(0) as u64,
                dismissed: row.try_get::<i64, _>("dismissed").unwrap_or(0) as u64,
                avg_confidence: row.try_get("avg_confidence").unwrap_or(0.0),
            });
        }

        let mut by_kind: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT kind,
                    COUNT(*) AS count,
                    COALESCE(SUM(is_accepted), 0) AS accepted,
                    COALESCE(AVG(confidence), 0.0) AS avg_confidence
             FROM recommendations WHERE 1 = 1",
        );
        push_analytics_filters(&mut by_kind, filter);
        by_kind.push(" GROUP BY kind ORDER BY count DESC");

        for row in by_kind.build().fetch_all(&self.pool).await? {
            let raw: String =
                row.try_get("kind").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let kind: RecommendationKind =
                raw.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?;
            report.by_kind.push(KindBreakdown {
                kind,
                count: row.try_get::<i64, _>("count").unwrap_or(0) as u64,
                accepted: row.try_get::<i64, _>("accepted").unwrap_or(0) as u64,
                avg_confidence: row.try_get("avg_confidence").unwrap_or(0.0),
            });
        }

        Ok(report.with_rates())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use upkeep_core::domain::analytics::AnalyticsFilter;
    use upkeep_core::domain::recommendation::{
        ActionKind, CostRange, Priority, Recommendation, RecommendationKind,
    };
    use upkeep_core::domain::service_type::ServiceType;
    use upkeep_core::engine::Candidate;

    use super::SqlRecommendationRepository;
    use crate::repositories::{ActiveFilter, RecommendationRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlRecommendationRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlRecommendationRepository::new(pool)
    }

    fn candidate(ty: ServiceType, kind: RecommendationKind, priority: Priority) -> Candidate {
        Candidate {
            service_type: ty,
            kind,
            priority,
            title: format!("{} suggestion", ty.label()),
            description: "test".to_owned(),
            predicted_date: Utc::now() + Duration::days(10),
            confidence: 0.7,
            reasons: vec!["reason one".to_owned()],
            estimated_cost: CostRange::new(Decimal::new(100, 0), Decimal::new(250, 0)),
        }
    }

    fn recommendation(
        user: &str,
        ty: ServiceType,
        kind: RecommendationKind,
        priority: Priority,
    ) -> Recommendation {
        Recommendation::from_candidate(user, candidate(ty, kind, priority), Utc::now())
    }

    #[tokio::test]
    async fn save_and_find_round_trips_all_fields() {
        let repo = setup().await;
        let mut rec = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::High,
        );
        rec.apply_action(ActionKind::Viewed, None, Utc::now()).expect("viewed");

        repo.save(&rec).await.expect("save");
        let loaded =
            repo.find_by_id(&rec.id, "user-1").await.expect("find").expect("record exists");

        assert_eq!(loaded, rec);
    }

    #[tokio::test]
    async fn find_by_id_is_scoped_to_the_owner() {
        let repo = setup().await;
        let rec = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::Medium,
        );
        repo.save(&rec).await.expect("save");

        assert!(repo.find_by_id(&rec.id, "user-2").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn triple_lookup_only_sees_active_records() {
        let repo = setup().await;
        let mut rec = recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        );
        repo.save(&rec).await.expect("save");

        let found = repo
            .find_active_triple("user-1", ServiceType::Cleaning, RecommendationKind::UsageBased)
            .await
            .expect("lookup");
        assert!(found.is_some());

        rec.apply_action(ActionKind::Dismissed, None, Utc::now()).expect("dismiss");
        repo.save(&rec).await.expect("save dismissed");

        let found = repo
            .find_active_triple("user-1", ServiceType::Cleaning, RecommendationKind::UsageBased)
            .await
            .expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_updates_in_place_rather_than_duplicating() {
        let repo = setup().await;
        let mut rec = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::Medium,
        );
        repo.save(&rec).await.expect("insert");

        rec.priority = Priority::Urgent;
        rec.confidence = 0.9;
        repo.save(&rec).await.expect("update");

        let listed =
            repo.list_active("user-1", &ActiveFilter::default()).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].priority, Priority::Urgent);
    }

    #[tokio::test]
    async fn list_active_sorts_by_priority_confidence_then_date() {
        let repo = setup().await;

        let mut low = recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Low,
        );
        low.confidence = 0.95;
        let mut urgent = recommendation(
            "user-1",
            ServiceType::Plumbing,
            RecommendationKind::EmergencyPrevention,
            Priority::Urgent,
        );
        urgent.confidence = 0.6;
        let mut high_confident = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::High,
        );
        high_confident.confidence = 0.9;
        let mut high_faint = recommendation(
            "user-1",
            ServiceType::Roofing,
            RecommendationKind::SeasonalRecommendation,
            Priority::High,
        );
        high_faint.confidence = 0.5;

        for rec in [&low, &urgent, &high_confident, &high_faint] {
            repo.save(rec).await.expect("save");
        }

        let listed =
            repo.list_active("user-1", &ActiveFilter::default()).await.expect("list");
        let priorities: Vec<Priority> = listed.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::Urgent, Priority::High, Priority::High, Priority::Low]
        );
        assert_eq!(listed[1].service_type, ServiceType::Hvac, "higher confidence first");
    }

    #[tokio::test]
    async fn list_active_honors_kind_and_priority_filters() {
        let repo = setup().await;
        repo.save(&recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::High,
        ))
        .await
        .expect("save");
        repo.save(&recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        ))
        .await
        .expect("save");

        let filter = ActiveFilter {
            kind: Some(RecommendationKind::UsageBased),
            ..ActiveFilter::default()
        };
        let listed = repo.list_active("user-1", &filter).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, RecommendationKind::UsageBased);

        let filter =
            ActiveFilter { priority: Some(Priority::High), ..ActiveFilter::default() };
        let listed = repo.list_active("user-1", &filter).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn recent_window_count_sees_only_fresh_active_records() {
        let repo = setup().await;
        let fresh = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::Medium,
        );
        repo.save(&fresh).await.expect("save");

        let mut old = recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        );
        old.created_at = Utc::now() - Duration::days(30);
        repo.save(&old).await.expect("save old");

        let since = Utc::now() - Duration::days(7);
        let count = repo.count_active_created_since("user-1", since).await.expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn cleanup_deletes_old_dismissed_and_deactivates_stale() {
        let repo = setup().await;
        let now = Utc::now();

        let mut dismissed_old = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::Medium,
        );
        dismissed_old
            .apply_action(ActionKind::Dismissed, None, now - Duration::days(120))
            .expect("dismiss");
        repo.save(&dismissed_old).await.expect("save");

        let mut stale = recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        );
        stale.predicted_date = now - Duration::days(90);
        repo.save(&stale).await.expect("save");

        let mut accepted = recommendation(
            "user-1",
            ServiceType::Plumbing,
            RecommendationKind::EmergencyPrevention,
            Priority::High,
        );
        accepted.predicted_date = now - Duration::days(90);
        accepted.apply_action(ActionKind::Accepted, None, now).expect("accept");
        repo.save(&accepted).await.expect("save");

        let deleted =
            repo.delete_dismissed_before(now - Duration::days(90)).await.expect("delete");
        assert_eq!(deleted, 1);

        let deactivated =
            repo.deactivate_stale(now - Duration::days(60), now).await.expect("deactivate");
        assert_eq!(deactivated, 1, "accepted records are never deactivated");

        let remaining =
            repo.list_active("user-1", &ActiveFilter::default()).await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].service_type, ServiceType::Plumbing);
    }

    #[tokio::test]
    async fn cleanup_sweeps_are_idempotent() {
        let repo = setup().await;
        let now = Utc::now();

        let mut stale = recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        );
        stale.predicted_date = now - Duration::days(90);
        repo.save(&stale).await.expect("save");

        let first =
            repo.deactivate_stale(now - Duration::days(60), now).await.expect("first");
        let second =
            repo.deactivate_stale(now - Duration::days(60), now).await.expect("second");
        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn analytics_aggregates_counts_rates_and_breakdowns() {
        let repo = setup().await;
        let now = Utc::now();

        let mut accepted = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::High,
        );
        accepted.apply_action(ActionKind::Accepted, None, now).expect("accept");
        repo.save(&accepted).await.expect("save");

        let mut dismissed = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::SeasonalRecommendation,
            Priority::Medium,
        );
        dismissed.apply_action(ActionKind::Dismissed, None, now).expect("dismiss");
        repo.save(&dismissed).await.expect("save");

        let mut overdue = recommendation(
            "user-2",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        );
        overdue.predicted_date = now - Duration::days(5);
        repo.save(&overdue).await.expect("save");

        let report =
            repo.analytics(&AnalyticsFilter::default(), now).await.expect("analytics");
        assert_eq!(report.total, 3);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.dismissed, 1);
        assert_eq!(report.overdue, 2, "accepted records do not count as overdue-inactive");
        assert!((report.acceptance_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((report.dismissal_rate - 1.0 / 3.0).abs() < 1e-9);

        let hvac = report
            .by_service_type
            .iter()
            .find(|b| b.service_type == ServiceType::Hvac)
            .expect("hvac breakdown");
        assert_eq!(hvac.count, 2);
        assert_eq!(hvac.accepted, 1);
        assert_eq!(hvac.dismissed, 1);

        assert_eq!(report.by_kind.len(), 3);

        let scoped = repo
            .analytics(
                &AnalyticsFilter { user_id: Some("user-2".to_owned()), ..Default::default() },
                now,
            )
            .await
            .expect("scoped analytics");
        assert_eq!(scoped.total, 1);
    }

    #[tokio::test]
    async fn sweep_population_unions_recommendations_and_completions() {
        let repo = setup().await;
        let now = Utc::now();

        repo.save(&recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::Medium,
        ))
        .await
        .expect("save");

        let history = crate::repositories::SqlHistoryRepository::new(repo.pool.clone());
        crate::repositories::HistoryRepository::record_completed(
            &history,
            &upkeep_core::domain::history::CompletedService {
                id: "c-1".to_owned(),
                user_id: "user-2".to_owned(),
                service_type: ServiceType::Cleaning,
                request_id: None,
                completed_at: now - Duration::days(3),
            },
        )
        .await
        .expect("record completed");

        let users = repo.sweep_user_ids(now - Duration::days(180)).await.expect("sweep ids");
        assert_eq!(users, vec!["user-1".to_owned(), "user-2".to_owned()]);
    }

    #[tokio::test]
    async fn reminder_candidates_exclude_accepted_and_dismissed() {
        let repo = setup().await;
        let now = Utc::now();

        let mut unacted = recommendation(
            "user-1",
            ServiceType::Hvac,
            RecommendationKind::PredictiveMaintenance,
            Priority::Medium,
        );
        unacted.created_at = now - Duration::days(5);
        repo.save(&unacted).await.expect("save");

        let mut accepted = recommendation(
            "user-1",
            ServiceType::Cleaning,
            RecommendationKind::UsageBased,
            Priority::Medium,
        );
        accepted.created_at = now - Duration::days(5);
        accepted.apply_action(ActionKind::Accepted, None, now).expect("accept");
        repo.save(&accepted).await.expect("save");

        let mut fresh = recommendation(
            "user-1",
            ServiceType::Roofing,
            RecommendationKind::SeasonalRecommendation,
            Priority::Medium,
        );
        fresh.created_at = now;
        repo.save(&fresh).await.expect("save");

        let candidates = repo
            .list_reminder_candidates(now - Duration::days(3))
            .await
            .expect("candidates");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].service_type, ServiceType::Hvac);
    }

    #[tokio::test]
    async fn timestamps_survive_the_round_trip() {
        let repo = setup().await;
        let mut rec = recommendation(
            "user-1",
            ServiceType::Painting,
            RecommendationKind::SeasonalRecommendation,
            Priority::Low,
        );
        rec.predicted_date = Utc.with_ymd_and_hms(2026, 9, 1, 8, 30, 0).unwrap();
        repo.save(&rec).await.expect("save");

        let loaded =
            repo.find_by_id(&rec.id, "user-1").await.expect("find").expect("exists");
        assert_eq!(loaded.predicted_date, rec.predicted_date);
    }
}
