pub use crate::config::CacheConfig;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::hysteresis::Hysteresis;
pub use crate::metrics::snapshot::TtlLruMetricsSnapshot;
pub use crate::policy::ttl_lru::{Lookup, TtlLruCore};
pub use crate::traits::Cache;

#[cfg(feature = "concurrency")]
pub use crate::policy::ttl_lru::{ConcurrentTtlCache, EvictionListener};
#[cfg(feature = "concurrency")]
pub use crate::traits::ConcurrentCache;
