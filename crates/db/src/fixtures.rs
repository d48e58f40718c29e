use chrono::{Duration, Utc};

use upkeep_core::domain::history::CompletedService;
use upkeep_core::domain::profile::{MaintenanceStyle, UserProfile};
use upkeep_core::domain::service_type::ServiceType;

use crate::repositories::{
    HistoryRepository, ProfileRepository, RepositoryError, SqlHistoryRepository,
    SqlProfileRepository,
};
use crate::DbPool;

/// One deterministic demo user: profile shape plus completed-service
/// history expressed as day offsets from seed time.
pub struct SeedUserContract {
    pub user_id: &'static str,
    pub maintenance_style: MaintenanceStyle,
    pub home_age_years: u32,
    pub completed: &'static [(ServiceType, i64)],
    pub description: &'static str,
}

/// Canonical demo dataset covering each signal generator's trigger path.
pub const SEED_USERS: &[SeedUserContract] = &[
    SeedUserContract {
        user_id: "demo-interval-hvac",
        maintenance_style: MaintenanceStyle::Proactive,
        home_age_years: 12,
        completed: &[
            (ServiceType::Hvac, 200),
            (ServiceType::Hvac, 410),
            (ServiceType::Hvac, 610),
        ],
        description: "HVAC serviced on a ~200 day rhythm, now overdue",
    },
    SeedUserContract {
        user_id: "demo-routine-cleaning",
        maintenance_style: MaintenanceStyle::Preventive,
        home_age_years: 4,
        completed: &[
            (ServiceType::Cleaning, 85),
            (ServiceType::Cleaning, 175),
            (ServiceType::Cleaning, 265),
            (ServiceType::Cleaning, 355),
        ],
        description: "cleaning booked quarterly, due again",
    },
    SeedUserContract {
        user_id: "demo-aging-home",
        maintenance_style: MaintenanceStyle::Reactive,
        home_age_years: 28,
        completed: &[],
        description: "older home with no service history, emergency risks apply",
    },
];

/// Outcome of a seed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub users: usize,
    pub completed_services: usize,
}

/// Loads the deterministic demo dataset. Idempotent: profiles upsert and
/// completions insert-or-ignore on fixed ids.
pub async fn seed(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let profiles = SqlProfileRepository::new(pool.clone());
    let history = SqlHistoryRepository::new(pool.clone());
    let now = Utc::now();

    let mut completed_services = 0usize;
    for contract in SEED_USERS {
        let mut profile = UserProfile::with_defaults(contract.user_id, now);
        profile.home.age_years = contract.home_age_years;
        profile.behavior.maintenance_style = contract.maintenance_style;
        profiles.save(&profile).await?;

        for (index, (service_type, days_ago)) in contract.completed.iter().enumerate() {
            history
                .record_completed(&CompletedService {
                    id: format!("seed-{}-{index}", contract.user_id),
                    user_id: contract.user_id.to_owned(),
                    service_type: *service_type,
                    request_id: None,
                    completed_at: now - Duration::days(*days_ago),
                })
                .await?;
            completed_services += 1;
        }
    }

    Ok(SeedResult { users: SEED_USERS.len(), completed_services })
}

#[cfg(test)]
mod tests {
    use crate::repositories::{HistoryRepository, ProfileRepository};
    use crate::repositories::{SqlHistoryRepository, SqlProfileRepository};
    use crate::{connect_with_settings, migrations};

    use super::{seed, SEED_USERS};

    #[tokio::test]
    async fn seed_loads_every_contract_user() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let result = seed(&pool).await.expect("seed");
        assert_eq!(result.users, SEED_USERS.len());
        assert_eq!(
            result.completed_services,
            SEED_USERS.iter().map(|u| u.completed.len()).sum::<usize>()
        );

        let profiles = SqlProfileRepository::new(pool.clone());
        let history = SqlHistoryRepository::new(pool.clone());
        for contract in SEED_USERS {
            let profile =
                profiles.find(contract.user_id).await.expect("find").expect("profile seeded");
            assert_eq!(profile.home.age_years, contract.home_age_years);

            let completed =
                history.completed_for_user(contract.user_id, 50).await.expect("completed");
            assert_eq!(completed.len(), contract.completed.len());
        }
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_history() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        seed(&pool).await.expect("first seed");
        seed(&pool).await.expect("second seed");

        let history = SqlHistoryRepository::new(pool.clone());
        let completed =
            history.completed_for_user("demo-interval-hvac", 50).await.expect("completed");
        assert_eq!(completed.len(), 3);
    }
}
