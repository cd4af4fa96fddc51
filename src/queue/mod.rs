//! Queue state and lifecycle
//!
//! This module owns the entry store, the reconciliation pass, analytics and
//! snapshot persistence, tied together by the `QueueManager`.

pub mod analytics;
pub mod manager;
pub mod persistence;
pub mod reconciler;
pub mod store;

pub use analytics::AnalyticsSummary;
pub use manager::{QueueManager, QueueStats};
pub use persistence::{load_snapshot, save_snapshot, QueueSnapshot};
pub use reconciler::{reconcile, ReconcileReport};
pub use store::EntryStore;
