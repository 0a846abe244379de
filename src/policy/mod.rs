//! Eviction policy cores and their concurrent wrappers.

pub mod ttl_lru;
