//! Per-service-type statistics over a user's completed services.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::history::CompletedService;
use crate::domain::service_type::ServiceType;

/// Interval statistics for one service type.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceTypeStats {
    pub service_type: ServiceType,
    /// Completion timestamps, most recent first.
    pub completions: Vec<DateTime<Utc>>,
    /// Whole-day gaps between consecutive completions, most recent pair
    /// first. Non-positive gaps (same-day duplicates) are dropped.
    pub intervals: Vec<f64>,
    /// Whole days since the most recent completion.
    pub days_since_last: Option<i64>,
}

impl ServiceTypeStats {
    pub fn count(&self) -> usize {
        self.completions.len()
    }

    /// Arithmetic mean of the positive intervals.
    pub fn average_interval(&self) -> Option<f64> {
        if self.intervals.is_empty() {
            return None;
        }
        Some(self.intervals.iter().sum::<f64>() / self.intervals.len() as f64)
    }

    /// Population standard deviation of the intervals.
    pub fn interval_stddev(&self) -> Option<f64> {
        let mean = self.average_interval()?;
        let variance = self
            .intervals
            .iter()
            .map(|interval| (interval - mean).powi(2))
            .sum::<f64>()
            / self.intervals.len() as f64;
        Some(variance.sqrt())
    }
}

/// A user's completed services grouped and reduced per service type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySnapshot {
    stats: BTreeMap<ServiceType, ServiceTypeStats>,
}

impl HistorySnapshot {
    pub fn stats(&self, service_type: ServiceType) -> Option<&ServiceTypeStats> {
        self.stats.get(&service_type)
    }

    /// Number of completions on record for a service type.
    pub fn completions_for(&self, service_type: ServiceType) -> usize {
        self.stats.get(&service_type).map_or(0, ServiceTypeStats::count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceTypeStats> {
        self.stats.values()
    }
}

/// Groups completions by service type and computes interval statistics.
///
/// Tolerates an empty history; unknown users simply produce an empty
/// snapshot.
pub fn aggregate_history(completed: &[CompletedService], now: DateTime<Utc>) -> HistorySnapshot {
    let mut grouped: BTreeMap<ServiceType, Vec<DateTime<Utc>>> = BTreeMap::new();
    for service in completed {
        grouped.entry(service.service_type).or_default().push(service.completed_at);
    }

    let mut stats = BTreeMap::new();
    for (service_type, mut completions) in grouped {
        completions.sort_by(|a, b| b.cmp(a));

        let intervals: Vec<f64> = completions
            .windows(2)
            .filter_map(|pair| {
                let days = (pair[0] - pair[1]).num_days();
                (days > 0).then_some(days as f64)
            })
            .collect();

        let days_since_last =
            completions.first().map(|latest| (now - *latest).num_days());

        stats.insert(
            service_type,
            ServiceTypeStats { service_type, completions, intervals, days_since_last },
        );
    }

    HistorySnapshot { stats }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn completion(ty: ServiceType, days_ago: i64) -> CompletedService {
        CompletedService {
            id: format!("svc-{ty}-{days_ago}"),
            user_id: "user-1".to_owned(),
            service_type: ty,
            request_id: None,
            completed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn empty_history_yields_empty_snapshot() {
        let snapshot = aggregate_history(&[], Utc::now());
        assert_eq!(snapshot.iter().count(), 0);
        assert_eq!(snapshot.completions_for(ServiceType::Hvac), 0);
    }

    #[test]
    fn average_interval_is_mean_of_positive_consecutive_differences() {
        let now = Utc::now();
        let completed = vec![
            completion(ServiceType::Hvac, 200),
            completion(ServiceType::Hvac, 400),
            completion(ServiceType::Hvac, 610),
        ];
        let snapshot = aggregate_history(&completed, now);
        let stats = snapshot.stats(ServiceType::Hvac).expect("hvac stats");

        assert_eq!(stats.intervals, vec![200.0, 210.0]);
        assert_eq!(stats.average_interval(), Some(205.0));
        assert_eq!(stats.days_since_last, Some(200));
    }

    #[test]
    fn same_day_duplicates_are_dropped_from_intervals() {
        let now = Utc::now();
        let completed = vec![
            completion(ServiceType::Cleaning, 30),
            completion(ServiceType::Cleaning, 30),
            completion(ServiceType::Cleaning, 60),
        ];
        let snapshot = aggregate_history(&completed, now);
        let stats = snapshot.stats(ServiceType::Cleaning).expect("cleaning stats");

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.intervals, vec![30.0]);
    }

    #[test]
    fn completions_are_sorted_most_recent_first_regardless_of_input_order() {
        let now = Utc::now();
        let completed = vec![
            completion(ServiceType::Plumbing, 300),
            completion(ServiceType::Plumbing, 100),
            completion(ServiceType::Plumbing, 200),
        ];
        let snapshot = aggregate_history(&completed, now);
        let stats = snapshot.stats(ServiceType::Plumbing).expect("plumbing stats");

        assert_eq!(stats.days_since_last, Some(100));
        assert_eq!(stats.intervals, vec![100.0, 100.0]);
    }

    #[test]
    fn stddev_is_zero_for_perfectly_regular_history() {
        let now = Utc::now();
        let completed = vec![
            completion(ServiceType::PestControl, 90),
            completion(ServiceType::PestControl, 180),
            completion(ServiceType::PestControl, 270),
        ];
        let snapshot = aggregate_history(&completed, now);
        let stats = snapshot.stats(ServiceType::PestControl).expect("stats");
        assert_eq!(stats.interval_stddev(), Some(0.0));
    }
}
