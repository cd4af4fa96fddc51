//! Read-only analytics over queue entries

use crate::types::{QueueEntry, QueueStatus};
use crate::utils::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view returned by `/analytics/summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_customers: usize,
    pub waiting: usize,
    pub serving: usize,
    pub completed: usize,
    pub no_show: usize,
    pub cancelled: usize,
    /// Percentage of all entries marked no-show
    pub no_show_rate: f64,
    /// Mean actual wait in minutes over completed entries
    pub average_wait_time: f64,
    /// Mean actual service time in minutes over the same completed entries
    pub average_service_time: f64,
    /// Percentage of counters currently serving someone
    pub counter_utilization: f64,
    pub total_counters: u32,
    pub service_baselines: BTreeMap<String, f64>,
}

impl AnalyticsSummary {
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a QueueEntry>,
        total_counters: u32,
        service_baselines: BTreeMap<String, f64>,
    ) -> Self {
        let mut total = 0;
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut wait_sum = 0i64;
        let mut service_sum = 0i64;
        let mut timed_completions = 0usize;

        for entry in entries {
            total += 1;
            *counts.entry(entry.status.as_str()).or_default() += 1;

            if entry.status == QueueStatus::Completed {
                if let Some(wait) = entry.actual_wait_time {
                    timed_completions += 1;
                    wait_sum += wait;
                    service_sum += entry.actual_service_time.unwrap_or(0);
                }
            }
        }

        let count = |status: QueueStatus| counts.get(status.as_str()).copied().unwrap_or(0);
        let serving = count(QueueStatus::InService);
        let no_show = count(QueueStatus::NoShow);

        let percentage = |part: usize, whole: usize| {
            if whole == 0 {
                0.0
            } else {
                round_to(part as f64 / whole as f64 * 100.0, 2)
            }
        };
        let mean = |sum: i64| {
            if timed_completions == 0 {
                0.0
            } else {
                round_to(sum as f64 / timed_completions as f64, 2)
            }
        };

        Self {
            total_customers: total,
            waiting: count(QueueStatus::Waiting),
            serving,
            completed: count(QueueStatus::Completed),
            no_show,
            cancelled: count(QueueStatus::Cancelled),
            no_show_rate: percentage(no_show, total),
            average_wait_time: mean(wait_sum),
            average_service_time: mean(service_sum),
            counter_utilization: percentage(serving, total_counters.max(1) as usize),
            total_counters,
            service_baselines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::store::test_support::entry_at;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_empty_summary_has_no_division_by_zero() {
        let summary = AnalyticsSummary::from_entries(Vec::<&QueueEntry>::new(), 3, BTreeMap::new());
        assert_eq!(summary.total_customers, 0);
        assert_eq!(summary.waiting, 0);
        assert_eq!(summary.serving, 0);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.no_show, 0);
        assert_eq!(summary.no_show_rate, 0.0);
        assert_eq!(summary.average_wait_time, 0.0);
        assert_eq!(summary.average_service_time, 0.0);
        assert_eq!(summary.counter_utilization, 0.0);
    }

    #[test]
    fn test_summary_counts_and_rates() {
        let now = Local.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        let mut entries = Vec::new();

        let mut done_a = entry_at("a", now);
        done_a.status = QueueStatus::Completed;
        done_a.actual_wait_time = Some(10);
        done_a.actual_service_time = Some(12);
        entries.push(done_a);

        let mut done_b = entry_at("b", now);
        done_b.status = QueueStatus::Completed;
        done_b.actual_wait_time = Some(20);
        done_b.actual_service_time = None;
        entries.push(done_b);

        // Completed without a recorded wait is excluded from the averages
        let mut done_untimed = entry_at("c", now);
        done_untimed.status = QueueStatus::Completed;
        entries.push(done_untimed);

        let mut no_show = entry_at("d", now);
        no_show.status = QueueStatus::NoShow;
        entries.push(no_show);

        let mut serving = entry_at("e", now);
        serving.status = QueueStatus::InService;
        entries.push(serving);

        entries.push(entry_at("f", now));

        let summary = AnalyticsSummary::from_entries(&entries, 3, BTreeMap::new());
        assert_eq!(summary.total_customers, 6);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.no_show, 1);
        assert_eq!(summary.serving, 1);
        assert_eq!(summary.waiting, 1);
        assert_eq!(summary.no_show_rate, 16.67);
        assert_eq!(summary.average_wait_time, 15.0);
        assert_eq!(summary.average_service_time, 6.0);
        assert_eq!(summary.counter_utilization, 33.33);
    }
}
