use chrono::{DateTime, Utc};
use sqlx::Row;

use upkeep_core::domain::profile::{
    BehaviorProfile, BudgetProfile, HomeProfile, LearningData, UserProfile,
};

use super::{ProfileRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProfileRepository {
    pool: DbPool,
}

impl SqlProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::Decode(format!("column `{column}`: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, RepositoryError> {
    let get = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };

    let home: HomeProfile = decode("home", &get("home")?)?;
    let behavior: BehaviorProfile = decode("behavior", &get("behavior")?)?;
    let budgets: BudgetProfile = decode("budgets", &get("budgets")?)?;
    let feedback = decode("feedback_log", &get("feedback_log")?)?;
    let outcomes = decode("outcome_log", &get("outcome_log")?)?;

    Ok(UserProfile {
        user_id: get("user_id")?,
        home,
        behavior,
        budgets,
        learning: LearningData { feedback, outcomes },
        created_at: parse_datetime(&get("created_at")?)?,
        updated_at: parse_datetime(&get("updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl ProfileRepository for SqlProfileRepository {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, home, behavior, budgets, feedback_log, outcome_log,
                    created_at, updated_at
             FROM user_profiles
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn save(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let home = encode(&profile.home)?;
        let behavior = encode(&profile.behavior)?;
        let budgets = encode(&profile.budgets)?;
        let feedback = encode(&profile.learning.feedback)?;
        let outcomes = encode(&profile.learning.outcomes)?;

        sqlx::query(
            "INSERT INTO user_profiles
                (user_id, home, behavior, budgets, feedback_log, outcome_log,
                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                home = excluded.home,
                behavior = excluded.behavior,
                budgets = excluded.budgets,
                feedback_log = excluded.feedback_log,
                outcome_log = excluded.outcome_log,
                updated_at = excluded.updated_at",
        )
        .bind(&profile.user_id)
        .bind(&home)
        .bind(&behavior)
        .bind(&budgets)
        .bind(&feedback)
        .bind(&outcomes)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
