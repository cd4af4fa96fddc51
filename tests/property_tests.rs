//! Property tests for queue reconciliation and estimation

mod fixtures;

use chrono::{Duration, Local, TimeZone};
use fixtures::{at, TestQueue};
use proptest::prelude::*;
use queue_desk::types::{CustomerType, JoinRequest, QueueStatus, StatusUpdate};
use queue_desk::wait_time::{
    EstimateInput, LoadAwareEstimator, WaitTimeConfig, WaitTimeEstimator,
};

fn customer_type() -> impl Strategy<Value = CustomerType> {
    prop_oneof![
        Just(CustomerType::WalkIn),
        Just(CustomerType::Appointment),
        Just(CustomerType::Vip),
        Just(CustomerType::Returning),
    ]
}

fn service_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("general"),
        Just("consultation"),
        Just("payment"),
        Just("unlisted"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn positions_are_dense_and_follow_check_in(
        joins in prop::collection::vec((0i64..240, customer_type(), service_type()), 1..25),
        counters in 1u32..5,
        hour in 6u32..18,
    ) {
        let start = at(hour, 0);
        let queue = TestQueue::new(counters, start);

        for (offset, customer_type, service_type) in &joins {
            queue.clock.set(start + Duration::minutes(*offset));
            queue.manager
                .join(
                    JoinRequest::new("prop")
                        .with_customer_type(*customer_type)
                        .with_service_type(*service_type),
                )
                .unwrap();
        }

        let waiting = queue.manager.list_waiting().unwrap();
        prop_assert_eq!(waiting.len(), joins.len());
        for (index, entry) in waiting.iter().enumerate() {
            prop_assert_eq!(entry.position, index + 1);
        }
        for pair in waiting.windows(2) {
            prop_assert!(pair[0].check_in_time <= pair[1].check_in_time);
        }
        prop_assert_eq!(waiting[0].estimated_wait_time, 0);
    }

    #[test]
    fn reconcile_is_idempotent(
        count in 1usize..20,
        served in 0usize..5,
        counters in 1u32..4,
    ) {
        let queue = TestQueue::new(counters, at(10, 0));
        let ids = queue.join_walk_ins(count);
        for id in ids.iter().take(served.min(count)) {
            queue.manager
                .update_status(id, StatusUpdate::new(QueueStatus::InService))
                .unwrap();
        }

        queue.manager.reconcile().unwrap();
        let first = queue.manager.snapshot().unwrap();
        queue.manager.reconcile().unwrap();
        let second = queue.manager.snapshot().unwrap();

        prop_assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn later_positions_never_wait_less(
        position in 1usize..200,
        base in 0.5f64..120.0,
        customer_type in customer_type(),
        total_counters in 1u32..10,
        in_service in 0usize..12,
        hour in 0u32..24,
    ) {
        let estimator = LoadAwareEstimator::new(WaitTimeConfig::default()).unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 4, hour, 15, 0).single().unwrap();
        let input = EstimateInput {
            position,
            base_minutes: base,
            customer_type,
            total_counters,
            in_service,
            now,
        };

        let here = estimator.estimate(&input);
        let behind = estimator.estimate(&EstimateInput { position: position + 1, ..input });

        prop_assert!(behind.wait_minutes >= here.wait_minutes);
        prop_assert!(behind.turnaround_minutes >= here.turnaround_minutes);
        prop_assert!(here.turnaround_minutes >= here.wait_minutes);
        if position == 1 {
            prop_assert_eq!(here.wait_minutes, 0);
        }
    }

    #[test]
    fn removing_non_waiting_entry_keeps_positions(
        count in 2usize..15,
        pick in any::<prop::sample::Index>(),
        status in prop_oneof![
            Just(QueueStatus::InService),
            Just(QueueStatus::Completed),
            Just(QueueStatus::NoShow),
            Just(QueueStatus::Cancelled),
        ],
    ) {
        let queue = TestQueue::flat(2);
        let ids = queue.join_walk_ins(count);
        let target = ids[pick.index(count)];

        queue.manager.update_status(&target, StatusUpdate::new(status)).unwrap();
        let before: Vec<_> = queue.manager
            .list_waiting()
            .unwrap()
            .into_iter()
            .map(|e| (e.id, e.position))
            .collect();

        queue.manager.remove(&target).unwrap();
        let after: Vec<_> = queue.manager
            .list_waiting()
            .unwrap()
            .into_iter()
            .map(|e| (e.id, e.position))
            .collect();

        prop_assert_eq!(before, after);
    }
}
