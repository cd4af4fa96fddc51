//! Queue manager implementation
//!
//! This module provides the `QueueManager` that owns the entry store, the
//! service catalog and the counter count as one aggregate. Every mutation
//! takes the write lock, applies its change and reconciles before the lock
//! is released, so readers only ever see fully reconciled state.

use crate::clock::{Clock, SystemClock};
use crate::config::{clamp_counters, QueueSettings};
use crate::error::{QueueError, Result};
use crate::metrics::MetricsCollector;
use crate::queue::analytics::AnalyticsSummary;
use crate::queue::persistence::QueueSnapshot;
use crate::queue::reconciler::{estimate_position, reconcile, ReconcileReport};
use crate::queue::store::EntryStore;
use crate::types::{
    CustomerId, JoinRequest, QueueEntry, QueueHealth, QueueStatus, StatusUpdate, Timestamp,
};
use crate::utils::{generate_customer_id, whole_minutes_between};
use crate::wait_time::{LoadAwareEstimator, ServiceCatalog, WaitTimeConfig, WaitTimeEstimator};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Point-in-time counts used by health checks and gauges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Entries currently in the store, any status
    pub total_entries: usize,
    pub waiting: usize,
    pub in_service: usize,
    pub counters: u32,
    /// Entries ever created, including removed ones
    pub total_created: u64,
}

/// Everything guarded by the manager's lock
#[derive(Debug)]
struct QueueState {
    store: EntryStore,
    catalog: ServiceCatalog,
    counters: u32,
    total_created: u64,
}

/// The queue lifecycle controller
pub struct QueueManager {
    state: RwLock<QueueState>,
    estimator: Box<dyn WaitTimeEstimator>,
    clock: Arc<dyn Clock>,
    metrics_collector: Arc<MetricsCollector>,
    default_service_type: String,
    /// Baselines from configuration; restored snapshots overlay learned values on these
    configured_baselines: BTreeMap<String, f64>,
}

impl QueueManager {
    /// Create a queue manager reading the system clock
    pub fn new(settings: &QueueSettings, wait_time: WaitTimeConfig) -> Result<Self> {
        Self::with_clock(settings, wait_time, Arc::new(SystemClock))
    }

    /// Create a queue manager with a custom clock
    pub fn with_clock(
        settings: &QueueSettings,
        wait_time: WaitTimeConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let estimator = LoadAwareEstimator::new(wait_time)?;
        let metrics_collector = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_components(
            settings,
            Box::new(estimator),
            clock,
            metrics_collector,
        ))
    }

    /// Create a queue manager from explicit components
    pub fn with_components(
        settings: &QueueSettings,
        estimator: Box<dyn WaitTimeEstimator>,
        clock: Arc<dyn Clock>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        let catalog = ServiceCatalog::new(
            settings.baselines.clone(),
            settings.default_baseline_minutes,
            estimator.config().baseline_blend_weight,
        );
        let counters = settings.counters.max(1);

        metrics_collector.update_queue_gauges(0, 0, counters);
        for (service_type, minutes) in catalog.snapshot() {
            metrics_collector.record_baseline(&service_type, minutes);
        }

        Self {
            state: RwLock::new(QueueState {
                store: EntryStore::new(),
                catalog,
                counters,
                total_created: 0,
            }),
            estimator,
            clock,
            metrics_collector,
            default_service_type: settings.default_service_type.clone(),
            configured_baselines: settings.baselines.clone(),
        }
    }

    /// Metrics collector shared with the HTTP layer
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, QueueState>> {
        self.state.read().map_err(|_| {
            QueueError::InternalError {
                message: "Failed to acquire queue lock".to_string(),
            }
            .into()
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, QueueState>> {
        self.state.write().map_err(|_| {
            QueueError::InternalError {
                message: "Failed to acquire queue lock".to_string(),
            }
            .into()
        })
    }

    /// Reconcile while the caller holds the write lock
    fn reconcile_locked(&self, state: &mut QueueState, now: Timestamp) -> Result<ReconcileReport> {
        let timer = self.metrics_collector.start_timer();
        let report = reconcile(
            &mut state.store,
            &state.catalog,
            self.estimator.as_ref(),
            state.counters,
            now,
        )?;
        self.metrics_collector.record_reconciliation(timer.stop());
        self.metrics_collector
            .update_queue_gauges(report.waiting, report.in_service, state.counters);
        Ok(report)
    }

    /// Add a customer to the back of the line
    pub fn join(&self, request: JoinRequest) -> Result<QueueEntry> {
        let start = Instant::now();

        let customer_name = request.customer_name.trim();
        if customer_name.is_empty() {
            return Err(QueueError::invalid("customer_name must not be empty").into());
        }
        let service_type = match request.service_type.as_deref().map(str::trim) {
            None | Some("") => self.default_service_type.clone(),
            Some(service_type) => service_type.to_string(),
        };

        let now = self.clock.now();
        let mut guard = self.write_state()?;
        let state = &mut *guard;

        let provisional_position = state.store.count_with_status(QueueStatus::Waiting) + 1;
        let provisional = estimate_position(
            &state.store,
            &state.catalog,
            self.estimator.as_ref(),
            state.counters,
            provisional_position,
            &service_type,
            request.customer_type,
            now,
        );

        let entry = QueueEntry {
            id: generate_customer_id(),
            customer_name: customer_name.to_string(),
            phone: request.phone,
            email: request.email,
            customer_type: request.customer_type,
            service_type,
            status: QueueStatus::Waiting,
            position: provisional_position,
            estimated_wait_time: provisional.wait_minutes,
            estimated_turnaround_time: provisional.turnaround_minutes,
            actual_wait_time: None,
            actual_service_time: None,
            check_in_time: now,
            service_start_time: None,
            service_end_time: None,
            notes: request.notes,
        };
        let id = entry.id;

        state.store.insert(entry);
        state.total_created += 1;

        if let Err(e) = self.reconcile_locked(state, now) {
            state.store.remove(&id);
            state.total_created -= 1;
            return Err(e);
        }

        let entry = state
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| QueueError::not_found(id))?;
        drop(guard);

        info!(
            "Customer '{}' ({}) joined as {} for '{}' - position {}, wait {}m, turnaround {}m",
            entry.customer_name,
            entry.id,
            entry.customer_type,
            entry.service_type,
            entry.position,
            entry.estimated_wait_time,
            entry.estimated_turnaround_time
        );

        self.metrics_collector
            .record_join(entry.customer_type, entry.estimated_wait_time);
        self.metrics_collector
            .record_queue_operation("join", start.elapsed());

        Ok(entry)
    }

    /// All entries in creation order, reconciled at the current time
    pub fn list_entries(&self) -> Result<Vec<QueueEntry>> {
        let now = self.clock.now();
        let mut guard = self.write_state()?;
        self.reconcile_locked(&mut guard, now)?;

        Ok(guard
            .store
            .entries_in_insertion_order()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Waiting entries sorted by position
    pub fn list_waiting(&self) -> Result<Vec<QueueEntry>> {
        let state = self.read_state()?;
        let mut waiting: Vec<QueueEntry> = state
            .store
            .iter()
            .filter(|entry| entry.is_waiting())
            .cloned()
            .collect();
        waiting.sort_by_key(|entry| entry.position);
        Ok(waiting)
    }

    pub fn get_entry(&self, id: &CustomerId) -> Result<QueueEntry> {
        let state = self.read_state()?;
        state
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| QueueError::not_found(id).into())
    }

    /// Set an entry's status, applying transition side effects
    pub fn update_status(&self, id: &CustomerId, update: StatusUpdate) -> Result<QueueEntry> {
        let start = Instant::now();

        if let Some(duration) = update.actual_service_duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(QueueError::invalid(
                    "actual_service_duration must be a non-negative number of minutes",
                )
                .into());
            }
        }

        let now = self.clock.now();
        let mut guard = self.write_state()?;
        let state = &mut *guard;

        let entry = state
            .store
            .get_mut(id)
            .ok_or_else(|| QueueError::not_found(id))?;

        let previous = entry.status;
        let next = update.status;

        let mut observed_wait = None;
        let mut observed_service = None;

        match (previous, next) {
            (QueueStatus::Waiting, QueueStatus::InService) => {
                let wait = whole_minutes_between(entry.check_in_time, now);
                entry.service_start_time = Some(now);
                entry.actual_wait_time = Some(wait);
                observed_wait = Some(wait);
            }
            (QueueStatus::InService, QueueStatus::Completed) => {
                entry.service_end_time = Some(now);
                if let Some(started) = entry.service_start_time {
                    let service = whole_minutes_between(started, now);
                    entry.actual_service_time = Some(service);
                    observed_service = Some(service);
                }
            }
            _ => {}
        }
        entry.status = next;

        let mut new_baseline = None;
        if let Some(duration) = update.actual_service_duration {
            entry.actual_service_time = Some(duration.trunc() as i64);
            observed_service = entry.actual_service_time;
            let service_type = entry.service_type.clone();
            new_baseline = state
                .catalog
                .update_baseline(&service_type, duration)
                .map(|minutes| (service_type, minutes));
        }

        self.reconcile_locked(state, now)?;

        let entry = state
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| QueueError::not_found(id))?;
        drop(guard);

        info!(
            "Customer '{}' ({}) moved {} -> {}",
            entry.customer_name, entry.id, previous, next
        );
        if previous.is_terminal() && !next.is_terminal() {
            warn!(
                "Customer '{}' ({}) reopened from terminal status {}",
                entry.customer_name, entry.id, previous
            );
        }

        if previous != next {
            self.metrics_collector.record_status_change(previous, next);
        }
        if let Some(wait) = observed_wait {
            self.metrics_collector.record_actual_wait(wait);
        }
        if let Some(service) = observed_service {
            self.metrics_collector.record_actual_service(service);
        }
        if let Some((service_type, minutes)) = new_baseline {
            self.metrics_collector.record_baseline(&service_type, minutes);
        }
        self.metrics_collector
            .record_queue_operation("update_status", start.elapsed());

        Ok(entry)
    }

    /// Delete an entry whatever its status
    pub fn remove(&self, id: &CustomerId) -> Result<QueueEntry> {
        let start = Instant::now();
        let now = self.clock.now();
        let mut guard = self.write_state()?;

        let removed = guard
            .store
            .remove(id)
            .ok_or_else(|| QueueError::not_found(id))?;
        self.reconcile_locked(&mut guard, now)?;
        drop(guard);

        info!(
            "Removed customer '{}' ({}) with status {}",
            removed.customer_name, removed.id, removed.status
        );
        self.metrics_collector.record_removal();
        self.metrics_collector
            .record_queue_operation("remove", start.elapsed());

        Ok(removed)
    }

    /// Change the number of open counters, clamped to at least one
    pub fn set_counters(&self, requested: i64) -> Result<u32> {
        let start = Instant::now();
        let counters = clamp_counters(requested);
        if i64::from(counters) != requested {
            warn!("Requested {} counters, using {}", requested, counters);
        }

        let now = self.clock.now();
        let mut guard = self.write_state()?;
        let previous = guard.counters;
        guard.counters = counters;
        self.reconcile_locked(&mut guard, now)?;
        drop(guard);

        info!("Counters changed {} -> {}", previous, counters);
        self.metrics_collector
            .record_queue_operation("set_counters", start.elapsed());
        Ok(counters)
    }

    pub fn counters(&self) -> Result<u32> {
        Ok(self.read_state()?.counters)
    }

    /// The waiting entry at the head of the line, if any
    pub fn next_customer(&self) -> Result<Option<QueueEntry>> {
        let state = self.read_state()?;
        Ok(state
            .store
            .iter()
            .filter(|entry| entry.is_waiting())
            .min_by_key(|entry| entry.position)
            .cloned())
    }

    pub fn analytics(&self) -> Result<AnalyticsSummary> {
        let state = self.read_state()?;
        Ok(AnalyticsSummary::from_entries(
            state.store.iter(),
            state.counters,
            state.catalog.snapshot(),
        ))
    }

    pub fn health(&self) -> Result<QueueHealth> {
        let state = self.read_state()?;
        Ok(QueueHealth {
            status: "healthy".to_string(),
            timestamp: self.clock.now(),
            customers_waiting: state.store.count_with_status(QueueStatus::Waiting),
            total_customers_created: state.total_created,
        })
    }

    pub fn stats(&self) -> Result<QueueStats> {
        let state = self.read_state()?;
        Ok(QueueStats {
            total_entries: state.store.len(),
            waiting: state.store.count_with_status(QueueStatus::Waiting),
            in_service: state.store.count_with_status(QueueStatus::InService),
            counters: state.counters,
            total_created: state.total_created,
        })
    }

    /// Run a reconciliation pass at the current time
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let now = self.clock.now();
        let mut guard = self.write_state()?;
        self.reconcile_locked(&mut guard, now)
    }

    /// Current baseline for a service type
    pub fn baseline(&self, service_type: &str) -> Result<f64> {
        Ok(self.read_state()?.catalog.get_baseline(service_type))
    }

    /// Capture the full queue state
    pub fn snapshot(&self) -> Result<QueueSnapshot> {
        let state = self.read_state()?;
        Ok(QueueSnapshot {
            entries: state
                .store
                .entries_in_insertion_order()
                .into_iter()
                .cloned()
                .collect(),
            baselines: state.catalog.snapshot(),
            counters: state.counters,
            total_created: state.total_created,
            saved_at: self.clock.now(),
        })
    }

    /// Replace the queue state with a snapshot and reconcile
    pub fn restore(&self, snapshot: QueueSnapshot) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &snapshot.entries {
            if !seen.insert(entry.id) {
                return Err(QueueError::InvariantViolation {
                    message: format!("snapshot contains customer {} twice", entry.id),
                }
                .into());
            }
        }
        for (service_type, minutes) in &snapshot.baselines {
            if !minutes.is_finite() || *minutes <= 0.0 {
                return Err(QueueError::InvariantViolation {
                    message: format!(
                        "snapshot baseline for '{}' must be positive, got {}",
                        service_type, minutes
                    ),
                }
                .into());
            }
        }

        let mut baselines = self.configured_baselines.clone();
        baselines.extend(snapshot.baselines);

        let now = self.clock.now();
        let mut guard = self.write_state()?;

        let mut store = EntryStore::new();
        let restored = snapshot.entries.len();
        for entry in snapshot.entries {
            store.insert(entry);
        }
        let catalog = ServiceCatalog::new(
            baselines,
            guard.catalog.default_baseline(),
            self.estimator.config().baseline_blend_weight,
        );

        guard.store = store;
        guard.catalog = catalog;
        guard.counters = snapshot.counters.max(1);
        guard.total_created = snapshot.total_created.max(restored as u64);

        let report = self.reconcile_locked(&mut guard, now)?;
        for (service_type, minutes) in guard.catalog.snapshot() {
            self.metrics_collector.record_baseline(&service_type, minutes);
        }

        info!(
            "Restored {} entries ({} waiting, {} in service) with {} counters",
            restored, report.waiting, report.in_service, guard.counters
        );
        debug!("Snapshot was saved at {}", snapshot.saved_at);
        Ok(())
    }
}
