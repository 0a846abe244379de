//! Counters, snapshots, and recorder traits for cache observability.

pub mod cell;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use cell::MetricsCell;
pub use metrics_impl::TtlLruMetrics;
pub use snapshot::TtlLruMetricsSnapshot;
