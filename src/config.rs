//! Tuning parameters consumed from the host's configuration source.
//!
//! The cache engine takes two numbers: a target item count and a fractional
//! band width. The derived eviction band is
//!
//! ```text
//!   lower = item_threshold * (1 - hysteresis)
//!   upper = item_threshold * (1 + hysteresis)
//! ```
//!
//! so `item_threshold = 10`, `hysteresis = 0.2` yields the `(8, 12)` band.
//! How the two values are loaded (file format, environment, flags) is a host
//! concern; with the `serde` feature enabled the struct derives
//! `Deserialize`/`Serialize` so it can be embedded directly in a host config
//! file.

use crate::error::ConfigError;
use crate::hysteresis::Hysteresis;

/// Engine tuning parameters.
///
/// # Example
///
/// ```
/// use ttlkit::config::CacheConfig;
///
/// let config = CacheConfig::new(10.0, 0.2);
/// assert_eq!(config.lower_threshold(), 8.0);
/// assert_eq!(config.upper_threshold(), 12.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    /// Target (ideal) number of cached items.
    pub item_threshold: f64,

    /// Fractional band width around the target, e.g. `0.2` for ±20%.
    pub hysteresis: f64,
}

impl CacheConfig {
    /// Creates a config from the two tuning values.
    pub fn new(item_threshold: f64, hysteresis: f64) -> Self {
        Self {
            item_threshold,
            hysteresis,
        }
    }

    /// Derived lower edge of the eviction band.
    #[inline]
    pub fn lower_threshold(&self) -> f64 {
        self.item_threshold * (1.0 - self.hysteresis)
    }

    /// Derived upper edge of the eviction band.
    #[inline]
    pub fn upper_threshold(&self) -> f64 {
        self.item_threshold * (1.0 + self.hysteresis)
    }

    /// Checks both values for range and finiteness.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `item_threshold` is non-positive or
    /// non-finite, or when `hysteresis` is outside `(0.0, 1.0)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.item_threshold.is_finite() || self.item_threshold <= 0.0 {
            return Err(ConfigError::new(format!(
                "item_threshold must be positive and finite, got {}",
                self.item_threshold
            )));
        }
        if !self.hysteresis.is_finite() || self.hysteresis <= 0.0 || self.hysteresis >= 1.0 {
            return Err(ConfigError::new(format!(
                "hysteresis must be in (0.0, 1.0), got {}",
                self.hysteresis
            )));
        }
        Ok(())
    }

    /// Builds the gate for the derived band.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when [`validate`](Self::validate) fails or the
    /// derived band is degenerate.
    pub fn gate(&self) -> Result<Hysteresis, ConfigError> {
        self.validate()?;
        Hysteresis::new(self.lower_threshold(), self.upper_threshold())
    }
}
