//! # Hysteresis Gate
//!
//! A two-threshold sticky predicate over a scalar observation, used by the
//! cache engine to decide when background reclamation starts and stops.
//!
//! ## Why two thresholds
//!
//! ```text
//!   size
//!    │                 ╭── sweep triggered (value > upper)
//!    │   ▲▲▲▲▲▲▲▲▲▲▲▲▲▲▼
//!  12┼──────────────────────────── upper threshold
//!    │                   ▼
//!    │    hysteresis     ▼   sweep keeps removing inside the band;
//!    │       band        ▼   state stays sticky-true
//!    │                   ▼
//!   8┼──────────────────────────── lower threshold
//!    │                   ╰── state clears (value <= lower), sweep stops
//!    │
//!    └──────────────────────────────────────────────────── time
//! ```
//!
//! A single boundary would start and stop the eviction loop on every insert
//! once the cache size oscillates around it. The band absorbs that
//! oscillation: the gate turns on only above the upper threshold and turns
//! off only at or below the lower one.
//!
//! ## State
//!
//! | Field                   | Meaning                                        |
//! |-------------------------|------------------------------------------------|
//! | `state`                 | Sticky "value is above the band" flag          |
//! | `above_upper_threshold` | Instantaneous `value > upper` from last check  |
//!
//! `check` is a pure side-effecting observation: it never returns a value,
//! callers read the two flags afterwards.

use crate::error::ConfigError;

/// Two-threshold gate with a sticky state.
///
/// `state` transitions `false -> true` only when an observed value exceeds
/// the upper threshold, and `true -> false` only once a value falls to the
/// lower threshold or below. Observations inside the band leave `state`
/// unchanged. `above_upper_threshold` tracks the raw comparison of the most
/// recent observation, independent of the sticky state.
///
/// # Example
///
/// ```
/// use ttlkit::hysteresis::Hysteresis;
///
/// let mut gate = Hysteresis::new(8.0, 12.0).unwrap();
/// assert!(!gate.state());
///
/// gate.check(13.0);
/// assert!(gate.state());
/// assert!(gate.above_upper_threshold());
///
/// // Inside the band: sticky state holds, instantaneous flag drops
/// gate.check(10.0);
/// assert!(gate.state());
/// assert!(!gate.above_upper_threshold());
///
/// // At the lower threshold the sticky state clears
/// gate.check(8.0);
/// assert!(!gate.state());
/// ```
#[derive(Debug, Clone)]
pub struct Hysteresis {
    lower_threshold: f64,
    upper_threshold: f64,
    state: bool,
    above_upper_threshold: bool,
}

impl Hysteresis {
    /// Creates a gate over the `(lower, upper)` band.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when either threshold is non-finite or when
    /// `lower >= upper` (an empty or inverted band cannot absorb
    /// oscillation).
    pub fn new(lower_threshold: f64, upper_threshold: f64) -> Result<Self, ConfigError> {
        if !lower_threshold.is_finite() || !upper_threshold.is_finite() {
            return Err(ConfigError::new(format!(
                "thresholds must be finite, got lower={} upper={}",
                lower_threshold, upper_threshold
            )));
        }
        if lower_threshold >= upper_threshold {
            return Err(ConfigError::new(format!(
                "lower threshold must be less than upper threshold, got lower={} upper={}",
                lower_threshold, upper_threshold
            )));
        }

        Ok(Self {
            lower_threshold,
            upper_threshold,
            state: false,
            above_upper_threshold: false,
        })
    }

    /// Observes a value, updating both flags. No return value.
    pub fn check(&mut self, value: f64) {
        if self.state && value <= self.lower_threshold {
            self.state = false;
        } else if !self.state && value > self.upper_threshold {
            self.state = true;
        }

        self.above_upper_threshold = value > self.upper_threshold;
    }

    /// Sticky "above the band" flag.
    #[inline]
    pub fn state(&self) -> bool {
        self.state
    }

    /// Raw `value > upper` comparison from the most recent [`check`](Self::check).
    #[inline]
    pub fn above_upper_threshold(&self) -> bool {
        self.above_upper_threshold
    }

    /// Lower edge of the band.
    #[inline]
    pub fn lower_threshold(&self) -> f64 {
        self.lower_threshold
    }

    /// Upper edge of the band.
    #[inline]
    pub fn upper_threshold(&self) -> f64 {
        self.upper_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn valid_band_constructs() {
            let gate = Hysteresis::new(8.0, 12.0).unwrap();
            assert_eq!(gate.lower_threshold(), 8.0);
            assert_eq!(gate.upper_threshold(), 12.0);
            assert!(!gate.state());
            assert!(!gate.above_upper_threshold());
        }

        #[test]
        fn inverted_band_is_rejected() {
            let err = Hysteresis::new(10.0, 5.0).unwrap_err();
            assert!(err.to_string().contains("lower threshold"));
        }

        #[test]
        fn empty_band_is_rejected() {
            assert!(Hysteresis::new(10.0, 10.0).is_err());
        }

        #[test]
        fn non_finite_thresholds_are_rejected() {
            assert!(Hysteresis::new(f64::NAN, 12.0).is_err());
            assert!(Hysteresis::new(8.0, f64::INFINITY).is_err());
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn state_sets_only_above_upper() {
            let mut gate = Hysteresis::new(8.0, 12.0).unwrap();

            gate.check(12.0); // not strictly above
            assert!(!gate.state());

            gate.check(12.5);
            assert!(gate.state());
        }

        #[test]
        fn state_clears_at_or_below_lower() {
            let mut gate = Hysteresis::new(8.0, 12.0).unwrap();
            gate.check(13.0);
            assert!(gate.state());

            gate.check(9.0); // inside the band
            assert!(gate.state());

            gate.check(8.0); // lower edge clears
            assert!(!gate.state());
        }

        #[test]
        fn band_values_leave_state_unchanged() {
            let mut gate = Hysteresis::new(8.0, 12.0).unwrap();

            // Rising through the band never sets the state
            gate.check(9.0);
            gate.check(11.0);
            assert!(!gate.state());

            // Falling through the band never clears it
            gate.check(13.0);
            gate.check(11.0);
            gate.check(9.0);
            assert!(gate.state());
        }

        #[test]
        fn above_upper_is_instantaneous() {
            let mut gate = Hysteresis::new(8.0, 12.0).unwrap();

            gate.check(13.0);
            assert!(gate.above_upper_threshold());

            gate.check(11.0);
            assert!(!gate.above_upper_threshold());
            assert!(gate.state()); // sticky flag unaffected

            gate.check(13.0);
            assert!(gate.above_upper_threshold());
        }

        #[test]
        fn oscillation_inside_band_does_not_flap() {
            let mut gate = Hysteresis::new(8.0, 12.0).unwrap();
            gate.check(13.0);

            for value in [11.0, 9.0, 11.5, 8.5, 10.0] {
                gate.check(value);
                assert!(gate.state(), "state flapped at {}", value);
            }
        }
    }
}
