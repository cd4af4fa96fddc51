//! Queue position reconciliation
//!
//! After every mutation the waiting line is re-ranked by check-in time and
//! every waiting entry gets a fresh estimate, so no read ever observes a
//! stale position.

use crate::error::{QueueError, Result};
use crate::queue::store::EntryStore;
use crate::types::{CustomerType, QueueStatus, Timestamp};
use crate::wait_time::{EstimateInput, ServiceCatalog, WaitEstimate, WaitTimeEstimator};
use tracing::{debug, error};

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub waiting: usize,
    pub in_service: usize,
}

/// Estimate for a customer at `position` given the current store load
#[allow(clippy::too_many_arguments)]
pub fn estimate_position(
    store: &EntryStore,
    catalog: &ServiceCatalog,
    estimator: &dyn WaitTimeEstimator,
    total_counters: u32,
    position: usize,
    service_type: &str,
    customer_type: CustomerType,
    now: Timestamp,
) -> WaitEstimate {
    estimator.estimate(&EstimateInput {
        position,
        base_minutes: catalog.get_baseline(service_type),
        customer_type,
        total_counters,
        in_service: store.count_with_status(QueueStatus::InService),
        now,
    })
}

/// Re-rank all waiting entries and refresh their estimates
pub fn reconcile(
    store: &mut EntryStore,
    catalog: &ServiceCatalog,
    estimator: &dyn WaitTimeEstimator,
    total_counters: u32,
    now: Timestamp,
) -> Result<ReconcileReport> {
    if let Some((key, id)) = store.find_misfiled() {
        let message = format!("entry {} is stored under key {}", id, key);
        error!("Refusing to reconcile corrupted queue store: {}", message);
        return Err(QueueError::InvariantViolation { message }.into());
    }

    let in_service = store.count_with_status(QueueStatus::InService);
    let order = store.waiting_in_queue_order();

    for (index, id) in order.iter().enumerate() {
        let position = index + 1;
        let Some(entry) = store.get(id) else {
            return Err(QueueError::InvariantViolation {
                message: format!("waiting entry {} vanished during reconciliation", id),
            }
            .into());
        };

        let estimate = estimator.estimate(&EstimateInput {
            position,
            base_minutes: catalog.get_baseline(&entry.service_type),
            customer_type: entry.customer_type,
            total_counters,
            in_service,
            now,
        });

        if let Some(entry) = store.get_mut(id) {
            entry.position = position;
            entry.estimated_wait_time = estimate.wait_minutes;
            entry.estimated_turnaround_time = estimate.turnaround_minutes;
            debug!(
                "Reconciled '{}' ({}) -> position {}, wait {}m, turnaround {}m",
                entry.customer_name,
                entry.id,
                position,
                estimate.wait_minutes,
                estimate.turnaround_minutes
            );
        }
    }

    Ok(ReconcileReport {
        waiting: order.len(),
        in_service,
    })
}
