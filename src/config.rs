//! Validated configuration for the slew-rate limiter.
//!
//! [`FilterConfig`] is the plain value form. [`SharedFilterConfig`] holds the
//! same pair behind a single atomic word, so it can be adjusted from another
//! thread (e.g. an operator UI) while the control loop keeps ticking, and
//! every tick still observes one consistent `(max_rate, period)` pair.

use crate::error::ConfigError;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Default control period, in seconds (50 Hz).
pub const DEFAULT_PERIOD: f32 = 0.02;

/// Maximum rate of change and control period of a [`SlewRateLimiter`].
///
/// Both values are strictly positive and finite. Setters reject anything
/// else and leave the stored value untouched.
///
/// There is no default maximum rate: it depends on the actuator and has to
/// be supplied by the caller.
///
/// # Example
///
/// ```
/// use slew_limiter::FilterConfig;
/// use std::time::Duration;
///
/// // 180 deg/s at 100 Hz.
/// let mut config = FilterConfig::new(180.0)?
///     .with_period(Duration::from_millis(10))?;
/// assert!((config.max_step() - 1.8).abs() < 1e-6);
///
/// // Invalid updates are rejected and the previous value is kept.
/// assert!(config.set_max_rate(0.0).is_err());
/// assert_eq!(config.max_rate(), 180.0);
/// # Ok::<(), slew_limiter::ConfigError>(())
/// ```
///
/// [`SlewRateLimiter`]: crate::SlewRateLimiter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "RawFilterConfig", into = "RawFilterConfig")
)]
pub struct FilterConfig {
    /// Maximum rate of change, in units per second.
    max_rate: f32,
    /// Control period, in seconds.
    period: f32,
}

impl FilterConfig {
    /// Creates a configuration with the given maximum rate of change and the
    /// default 50 Hz period.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxRate`] if `max_rate` is not positive
    /// and finite.
    pub fn new(max_rate: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            max_rate: validate_max_rate(max_rate)?,
            period: DEFAULT_PERIOD,
        })
    }

    /// Replaces the control period.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPeriod`] if `period` is zero (not
    /// positive).
    pub fn with_period(mut self, period: Duration) -> Result<Self, ConfigError> {
        self.set_period(period.as_secs_f32())?;
        Ok(self)
    }

    /// Maximum rate of change, in units per second.
    #[must_use]
    pub fn max_rate(&self) -> f32 {
        self.max_rate
    }

    /// Control period, in seconds.
    #[must_use]
    pub fn period(&self) -> f32 {
        self.period
    }

    /// Largest change allowed between two consecutive outputs of a channel.
    #[must_use]
    pub fn max_step(&self) -> f32 {
        self.max_rate * self.period
    }

    /// Sets the maximum rate of change.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxRate`] if `max_rate` is not positive
    /// and finite. The previous value is kept.
    pub fn set_max_rate(&mut self, max_rate: f32) -> Result<(), ConfigError> {
        self.max_rate = validate_max_rate(max_rate)?;
        log::debug!("max rate set to {max_rate}");
        Ok(())
    }

    /// Sets the control period, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPeriod`] if `period` is not positive and
    /// finite. The previous value is kept.
    pub fn set_period(&mut self, period: f32) -> Result<(), ConfigError> {
        self.period = validate_period(period)?;
        log::debug!("period set to {period} s");
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_bits(bits: u64) -> Self {
        Self {
            max_rate: f32::from_bits((bits >> 32) as u32),
            period: f32::from_bits(bits as u32),
        }
    }

    fn to_bits(self) -> u64 {
        (u64::from(self.max_rate.to_bits()) << 32) | u64::from(self.period.to_bits())
    }
}

fn validate_max_rate(max_rate: f32) -> Result<f32, ConfigError> {
    if max_rate.is_finite() && max_rate > 0.0 {
        Ok(max_rate)
    } else {
        log::warn!("rejected max rate {max_rate}");
        Err(ConfigError::InvalidMaxRate(max_rate))
    }
}

fn validate_period(period: f32) -> Result<f32, ConfigError> {
    if period.is_finite() && period > 0.0 {
        Ok(period)
    } else {
        log::warn!("rejected period {period} s");
        Err(ConfigError::InvalidPeriod(period))
    }
}

/// Unvalidated wire form of [`FilterConfig`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawFilterConfig {
    max_rate: f32,
    period: f32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFilterConfig> for FilterConfig {
    type Error = ConfigError;

    fn try_from(raw: RawFilterConfig) -> Result<Self, Self::Error> {
        let mut config = FilterConfig::new(raw.max_rate)?;
        config.set_period(raw.period)?;
        Ok(config)
    }
}

#[cfg(feature = "serde")]
impl From<FilterConfig> for RawFilterConfig {
    fn from(config: FilterConfig) -> Self {
        Self {
            max_rate: config.max_rate,
            period: config.period,
        }
    }
}

/// A [`FilterConfig`] that can be read and written through a shared
/// reference.
///
/// Both values are packed into one [`AtomicU64`], so [`Self::snapshot`]
/// always returns a pair that was valid together, even while another thread
/// is writing.
///
/// # Example
///
/// ```
/// use slew_limiter::{FilterConfig, SharedFilterConfig};
/// use std::sync::Arc;
///
/// let shared = Arc::new(SharedFilterConfig::new(FilterConfig::new(90.0)?));
///
/// let ui = Arc::clone(&shared);
/// std::thread::spawn(move || ui.set_max_rate(45.0))
///     .join()
///     .unwrap()?;
///
/// assert_eq!(shared.snapshot().max_rate(), 45.0);
/// # Ok::<(), slew_limiter::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct SharedFilterConfig {
    packed: AtomicU64,
}

impl SharedFilterConfig {
    /// Wraps a validated configuration.
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        Self {
            packed: AtomicU64::new(config.to_bits()),
        }
    }

    /// Returns the current configuration as a single consistent value.
    #[must_use]
    pub fn snapshot(&self) -> FilterConfig {
        FilterConfig::from_bits(self.packed.load(Ordering::Acquire))
    }

    /// Maximum rate of change, in units per second.
    #[must_use]
    pub fn max_rate(&self) -> f32 {
        self.snapshot().max_rate()
    }

    /// Control period, in seconds.
    #[must_use]
    pub fn period(&self) -> f32 {
        self.snapshot().period()
    }

    /// Sets the maximum rate of change.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxRate`] if `max_rate` is not positive
    /// and finite. The previous value is kept.
    pub fn set_max_rate(&self, max_rate: f32) -> Result<(), ConfigError> {
        let max_rate = validate_max_rate(max_rate)?;
        self.update(|config| config.max_rate = max_rate);
        log::debug!("max rate set to {max_rate}");
        Ok(())
    }

    /// Sets the control period, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPeriod`] if `period` is not positive and
    /// finite. The previous value is kept.
    pub fn set_period(&self, period: f32) -> Result<(), ConfigError> {
        let period = validate_period(period)?;
        self.update(|config| config.period = period);
        log::debug!("period set to {period} s");
        Ok(())
    }

    /// Replaces both values at once.
    pub fn store(&self, config: FilterConfig) {
        self.packed.store(config.to_bits(), Ordering::Release);
    }

    fn update(&self, mut apply: impl FnMut(&mut FilterConfig)) {
        // the closure never returns `None`, so this cannot fail
        let _ = self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let mut config = FilterConfig::from_bits(bits);
                apply(&mut config);
                Some(config.to_bits())
            });
    }
}

impl From<FilterConfig> for SharedFilterConfig {
    fn from(config: FilterConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_period_is_50_hz() {
        let config = FilterConfig::new(180.0).unwrap();
        assert_eq!(config.period(), 0.02);
        assert!((config.max_step() - 3.6).abs() < 1e-5);
    }

    #[test]
    fn rejects_non_positive_max_rate() {
        assert_eq!(
            FilterConfig::new(0.0),
            Err(ConfigError::InvalidMaxRate(0.0))
        );

        let mut config = FilterConfig::new(180.0).unwrap();
        for value in [0.0, -5.0, f32::INFINITY, f32::NEG_INFINITY] {
            assert_eq!(
                config.set_max_rate(value),
                Err(ConfigError::InvalidMaxRate(value))
            );
            assert_eq!(config.max_rate(), 180.0);
        }

        assert!(config.set_max_rate(f32::NAN).is_err());
        assert_eq!(config.max_rate(), 180.0);
    }

    #[test]
    fn rejects_non_positive_period() {
        let mut config = FilterConfig::new(180.0).unwrap();
        for value in [0.0, -5.0, f32::INFINITY] {
            assert_eq!(
                config.set_period(value),
                Err(ConfigError::InvalidPeriod(value))
            );
            assert_eq!(config.period(), DEFAULT_PERIOD);
        }

        assert!(config.set_period(f32::NAN).is_err());
        assert_eq!(config.period(), DEFAULT_PERIOD);

        assert_eq!(
            config.with_period(Duration::ZERO),
            Err(ConfigError::InvalidPeriod(0.0))
        );
    }

    #[test]
    fn accepts_positive_updates() {
        let mut config = FilterConfig::new(180.0).unwrap();
        config.set_max_rate(90.0).unwrap();
        config.set_period(0.01).unwrap();
        assert_eq!(config.max_rate(), 90.0);
        assert_eq!(config.period(), 0.01);
    }

    #[test]
    fn packed_bits_preserve_both_values() {
        let config = FilterConfig::new(123.456)
            .unwrap()
            .with_period(Duration::from_millis(4))
            .unwrap();
        assert_eq!(FilterConfig::from_bits(config.to_bits()), config);
    }

    #[test]
    fn shared_config_from_plain_config() {
        let config = FilterConfig::new(75.0).unwrap();
        let shared: SharedFilterConfig = config.into();
        assert_eq!(shared.snapshot(), config);
    }

    #[test]
    fn shared_config_updates_one_field_at_a_time() {
        let shared = SharedFilterConfig::new(FilterConfig::new(180.0).unwrap());

        shared.set_period(0.01).unwrap();
        assert_eq!(shared.max_rate(), 180.0);
        assert_eq!(shared.period(), 0.01);

        shared.set_max_rate(60.0).unwrap();
        assert_eq!(shared.max_rate(), 60.0);
        assert_eq!(shared.period(), 0.01);
    }

    #[test]
    fn shared_config_keeps_previous_value_on_rejection() {
        let shared = SharedFilterConfig::new(FilterConfig::new(180.0).unwrap());

        assert_eq!(
            shared.set_max_rate(-5.0),
            Err(ConfigError::InvalidMaxRate(-5.0))
        );
        assert_eq!(shared.set_period(0.0), Err(ConfigError::InvalidPeriod(0.0)));
        assert_eq!(shared.snapshot(), FilterConfig::new(180.0).unwrap());
    }

    #[test]
    fn concurrent_writers_never_tear_a_snapshot() {
        let a = FilterConfig::new(10.0).unwrap();
        let b = FilterConfig::new(1000.0)
            .unwrap()
            .with_period(Duration::from_millis(1))
            .unwrap();
        let shared = SharedFilterConfig::new(a);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..10_000 {
                    shared.store(if i % 2 == 0 { a } else { b });
                }
            });

            for _ in 0..10_000 {
                let snapshot = shared.snapshot();
                assert!(snapshot == a || snapshot == b, "torn read: {snapshot:?}");
            }
        });
    }
}
