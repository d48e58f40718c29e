use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use upkeep_core::config::EngineTuning;
use upkeep_core::domain::analytics::{AnalyticsFilter, AnalyticsReport};
use upkeep_core::domain::profile::{ProfilePatch, ServiceOutcome, UserProfile};
use upkeep_core::domain::recommendation::{
    ActionKind, NotificationEntry, NotificationStatus, Recommendation,
};
use upkeep_core::engine::{generate_candidates, rank_candidates};
use upkeep_core::errors::ApplicationError;
use upkeep_db::repositories::{
    ActiveFilter, HistoryRepository, ProfileRepository, RecommendationRepository,
    SqlHistoryRepository, SqlProfileRepository, SqlRecommendationRepository,
};
use upkeep_db::DbPool;

use crate::notify::{Notifier, TracingNotifier};

/// Outcome of one user's generation inside a bulk sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserGeneration {
    pub user_id: String,
    pub count: usize,
}

/// Outcome of a bulk generation sweep. Per-user failures are counted, not
/// propagated; the sweep always runs to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub attempted: usize,
    pub generated: Vec<UserGeneration>,
    pub failed: usize,
}

/// Outcome of a reminder sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub candidates: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Outcome of a cleanup sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: u64,
    pub deactivated: u64,
}

type ServiceResult<T> = Result<T, ApplicationError>;

/// The application service around the recommendation engine: wires the
/// store to the pure generators, enforces the reconciler invariant, records
/// feedback, and hosts the scheduler entry points.
///
/// Stateless between calls; every invocation re-reads history.
pub struct RecommendationService {
    profiles: Arc<dyn ProfileRepository>,
    history: Arc<dyn HistoryRepository>,
    recommendations: Arc<dyn RecommendationRepository>,
    notifier: Arc<dyn Notifier>,
    tuning: EngineTuning,
}

impl RecommendationService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        history: Arc<dyn HistoryRepository>,
        recommendations: Arc<dyn RecommendationRepository>,
        notifier: Arc<dyn Notifier>,
        tuning: EngineTuning,
    ) -> Self {
        Self { profiles, history, recommendations, notifier, tuning }
    }

    /// Service over the SQL store with the log-transport notifier.
    pub fn with_sql_store(pool: DbPool, tuning: EngineTuning) -> Self {
        Self::new(
            Arc::new(SqlProfileRepository::new(pool.clone())),
            Arc::new(SqlHistoryRepository::new(pool.clone())),
            Arc::new(SqlRecommendationRepository::new(pool)),
            Arc::new(TracingNotifier),
            tuning,
        )
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    /// Loads the user's profile, synthesizing and persisting defaults when
    /// absent. Profile absence is never an error.
    async fn ensure_profile(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<UserProfile> {
        let existing = self
            .profiles
            .find(user_id)
            .await
            .map_err(|e| ApplicationError::persistence("profile read", e))?;

        match existing {
            Some(profile) => Ok(profile),
            None => {
                let profile = UserProfile::with_defaults(user_id, now);
                self.profiles
                    .save(&profile)
                    .await
                    .map_err(|e| ApplicationError::persistence("profile create", e))?;
                info!(
                    event_name = "engine.profile.defaults_created",
                    user_id,
                    "synthesized default profile"
                );
                Ok(profile)
            }
        }
    }

    /// Generates the ranked recommendation set for one user and reconciles
    /// it against existing active records.
    ///
    /// Without `force_regenerate`, an active record created inside the
    /// recent window short-circuits to the existing set instead of
    /// recomputing.
    pub async fn generate(
        &self,
        user_id: &str,
        force_regenerate: bool,
    ) -> ServiceResult<Vec<Recommendation>> {
        let now = Utc::now();
        let profile = self.ensure_profile(user_id, now).await?;

        if !force_regenerate {
            let since = now - Duration::days(self.tuning.recent_window_days);
            let recent = self
                .recommendations
                .count_active_created_since(user_id, since)
                .await
                .map_err(|e| ApplicationError::persistence("recent-window check", e))?;
            if recent > 0 {
                info!(
                    event_name = "engine.generate.recent_window_hit",
                    user_id,
                    "returning existing recommendations"
                );
                return self.list_active(user_id, &self.default_filter()).await;
            }
        }

        // The three store reads are independent; issue them concurrently
        // and join before generation.
        let (completed, _pending, active) = tokio::try_join!(
            self.history.completed_for_user(user_id, 50),
            self.history.pending_for_user(user_id, 100),
            self.history.active_for_user(user_id),
        )
        .map_err(|e| ApplicationError::persistence("history read", e))?;

        let candidates = generate_candidates(&profile, &completed, &self.tuning, now);
        let active_types: HashSet<_> =
            active.iter().map(|service| service.service_type).collect();
        let ranked = rank_candidates(candidates, &profile, &active_types, &self.tuning, now);

        let mut results = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            let existing = self
                .recommendations
                .find_active_triple(user_id, candidate.service_type, candidate.kind)
                .await
                .map_err(|e| ApplicationError::persistence("reconcile lookup", e))?;

            let record = match existing {
                Some(mut record) => {
                    record.apply_candidate(candidate, now);
                    record
                }
                None => Recommendation::from_candidate(user_id, candidate, now),
            };
            self.recommendations
                .save(&record)
                .await
                .map_err(|e| ApplicationError::persistence("reconcile save", e))?;
            results.push(record);
        }

        info!(
            event_name = "engine.generate.completed",
            user_id,
            count = results.len(),
            "generated recommendations"
        );
        Ok(results)
    }

    fn default_filter(&self) -> ActiveFilter {
        ActiveFilter { limit: self.tuning.max_recommendations as u32, ..ActiveFilter::default() }
    }

    /// Active recommendations sorted by priority, confidence, and predicted
    /// date.
    pub async fn list_active(
        &self,
        user_id: &str,
        filter: &ActiveFilter,
    ) -> ServiceResult<Vec<Recommendation>> {
        self.recommendations
            .list_active(user_id, filter)
            .await
            .map_err(|e| ApplicationError::persistence("list", e))
    }

    /// Applies a user action to a recommendation and folds it into the
    /// profile's feedback log.
    pub async fn record_action(
        &self,
        recommendation_id: &str,
        user_id: &str,
        action: &str,
        metadata: Option<serde_json::Value>,
    ) -> ServiceResult<Recommendation> {
        let now = Utc::now();
        let kind: ActionKind = action.parse().map_err(ApplicationError::Domain)?;

        let mut record = self
            .recommendations
            .find_by_id(recommendation_id, user_id)
            .await
            .map_err(|e| ApplicationError::persistence("action lookup", e))?
            .ok_or_else(|| {
                ApplicationError::RecommendationNotFound(recommendation_id.to_owned())
            })?;

        record.apply_action(kind, metadata, now).map_err(ApplicationError::Domain)?;
        self.recommendations
            .save(&record)
            .await
            .map_err(|e| ApplicationError::persistence("action save", e))?;

        // The feedback log is best-effort learning data; a failure here must
        // not roll back the applied action.
        match self.ensure_profile(user_id, now).await {
            Ok(mut profile) => {
                profile.record_feedback(recommendation_id, record.service_type, kind, now);
                if let Err(e) = self.profiles.save(&profile).await {
                    warn!(
                        event_name = "engine.action.feedback_save_failed",
                        user_id,
                        error = %e,
                        "failed to persist feedback log entry"
                    );
                }
            }
            Err(e) => {
                warn!(
                    event_name = "engine.action.profile_load_failed",
                    user_id,
                    error = %e,
                    "failed to load profile for feedback"
                );
            }
        }

        Ok(record)
    }

    pub async fn get_profile(&self, user_id: &str) -> ServiceResult<Option<UserProfile>> {
        self.profiles
            .find(user_id)
            .await
            .map_err(|e| ApplicationError::persistence("profile read", e))
    }

    /// Merges a patch into the user's profile, creating it first if needed.
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> ServiceResult<UserProfile> {
        let now = Utc::now();
        let mut profile = self.ensure_profile(user_id, now).await?;
        profile.apply_patch(patch, now);
        self.profiles
            .save(&profile)
            .await
            .map_err(|e| ApplicationError::persistence("profile update", e))?;
        Ok(profile)
    }

    /// Appends a completed-service outcome to the profile's bounded
    /// learning history.
    pub async fn record_service_outcome(
        &self,
        user_id: &str,
        outcome: ServiceOutcome,
    ) -> ServiceResult<UserProfile> {
        let now = Utc::now();
        let mut profile = self.ensure_profile(user_id, now).await?;
        profile.record_outcome(outcome, now);
        self.profiles
            .save(&profile)
            .await
            .map_err(|e| ApplicationError::persistence("outcome save", e))?;
        Ok(profile)
    }

    pub async fn analytics(&self, filter: &AnalyticsFilter) -> ServiceResult<AnalyticsReport> {
        self.recommendations
            .analytics(filter, Utc::now())
            .await
            .map_err(|e| ApplicationError::persistence("analytics", e))
    }

    /// Scheduler entry point: regenerates for every user with recent
    /// activity. One user's failure is logged and skipped; the sweep never
    /// aborts early.
    pub async fn generate_for_all(&self) -> ServiceResult<SweepReport> {
        let since = Utc::now() - Duration::days(self.tuning.sweep_activity_window_days);
        let users = self
            .recommendations
            .sweep_user_ids(since)
            .await
            .map_err(|e| ApplicationError::persistence("sweep population", e))?;

        let mut report = SweepReport { attempted: users.len(), ..SweepReport::default() };
        for user_id in users {
            match self.generate(&user_id, false).await {
                Ok(records) => {
                    report.generated.push(UserGeneration { user_id, count: records.len() });
                }
                Err(e) => {
                    error!(
                        event_name = "engine.sweep.user_failed",
                        user_id = %user_id,
                        error = %e,
                        "generation failed for user, continuing sweep"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            event_name = "engine.sweep.completed",
            attempted = report.attempted,
            succeeded = report.generated.len(),
            failed = report.failed,
            "bulk generation sweep finished"
        );
        Ok(report)
    }

    /// Scheduler entry point: dispatches reminders for stale unacted
    /// records. Transport failures are recorded on the record and never
    /// retried here.
    pub async fn send_reminders(&self) -> ServiceResult<ReminderReport> {
        let now = Utc::now();
        let cutoff = now - Duration::days(self.tuning.reminder_after_days);
        let candidates = self
            .recommendations
            .list_reminder_candidates(cutoff)
            .await
            .map_err(|e| ApplicationError::persistence("reminder query", e))?;

        let mut report = ReminderReport::default();
        for mut record in candidates.into_iter().filter(Recommendation::is_unacted) {
            report.candidates += 1;
            let status = match self.notifier.send(&record.user_id, &record).await {
                Ok(()) => {
                    report.sent += 1;
                    NotificationStatus::Sent
                }
                Err(e) => {
                    warn!(
                        event_name = "engine.reminder.dispatch_failed",
                        user_id = %record.user_id,
                        recommendation_id = %record.id,
                        error = %e,
                        "reminder dispatch failed"
                    );
                    report.failed += 1;
                    NotificationStatus::Failed
                }
            };
            record.record_notification(
                NotificationEntry { channel: self.notifier.channel(), sent_at: now, status },
                now,
            );
            self.recommendations
                .save(&record)
                .await
                .map_err(|e| ApplicationError::persistence("reminder save", e))?;
        }

        Ok(report)
    }

    /// Scheduler entry point: the two idempotent retention sweeps.
    pub async fn cleanup(&self) -> ServiceResult<CleanupReport> {
        let now = Utc::now();

        let deleted = self
            .recommendations
            .delete_dismissed_before(now - Duration::days(self.tuning.dismissed_retention_days))
            .await
            .map_err(|e| ApplicationError::persistence("cleanup delete", e))?;

        let deactivated = self
            .recommendations
            .deactivate_stale(
                now - Duration::days(self.tuning.stale_deactivation_days),
                now,
            )
            .await
            .map_err(|e| ApplicationError::persistence("cleanup deactivate", e))?;

        info!(
            event_name = "engine.cleanup.completed",
            deleted,
            deactivated,
            "cleanup sweep finished"
        );
        Ok(CleanupReport { deleted, deactivated })
    }
}
