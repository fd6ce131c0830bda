//! A per-channel slew-rate limiter for streaming actuator targets.
//!
//! Targets such as robot joint angles are sampled once per control period
//! and passed through [`SlewRateLimiter::tick`], which bounds how far each
//! channel may move between two consecutive ticks to `max_rate * period`.
//! The bound holds no matter how abruptly the upstream source changes its
//! target.
//!
//! # Example
//!
//! ```
//! use nalgebra::DVector;
//! use slew_limiter::{FilterConfig, SlewRateLimiter};
//!
//! // 180 deg/s at the default 50 Hz gives a 3.6 deg step.
//! let mut limiter = SlewRateLimiter::new(FilterConfig::new(180.0)?);
//!
//! // The first sample of a channel passes through verbatim.
//! let output = limiter.tick(&DVector::from_vec(vec![0.0])).unwrap();
//! assert_eq!(output[0], 0.0);
//!
//! // A jump to 100 deg is spread over many ticks.
//! let target = DVector::from_vec(vec![100.0]);
//! let output = limiter.tick(&target).unwrap();
//! assert!((output[0] - 3.6).abs() < 1e-4);
//! # Ok::<(), slew_limiter::ConfigError>(())
//! ```

pub mod channel_state;
pub mod config;
pub mod error;

use std::sync::Arc;

use nalgebra::DVector;

pub use channel_state::ChannelState;
pub use config::{FilterConfig, SharedFilterConfig, DEFAULT_PERIOD};
pub use error::{ConfigError, InvalidInputError};

/// Limits the rate of change of every channel of a sampled target vector.
///
/// The limiter owns its [`ChannelState`]; independent limiters (e.g. one per
/// robot) never share state. Configuration lives in a
/// [`SharedFilterConfig`], so it can be tuned from another thread through
/// [`Self::config_handle`] while the control loop ticks.
#[derive(Debug)]
pub struct SlewRateLimiter {
    /// Maximum rate and period, read once per tick.
    config: Arc<SharedFilterConfig>,
    /// Last output of every observed channel.
    state: ChannelState,
}

impl SlewRateLimiter {
    /// Creates a limiter with the given configuration and no observed
    /// channels.
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        Self::with_shared_config(Arc::new(config.into()))
    }

    /// Creates a limiter that reads its configuration from `config`.
    #[must_use]
    pub fn with_shared_config(config: Arc<SharedFilterConfig>) -> Self {
        Self {
            config,
            state: ChannelState::new(),
        }
    }

    /// Returns a snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> FilterConfig {
        self.config.snapshot()
    }

    /// Returns a handle to the configuration, which can be moved to another
    /// thread and written while this limiter ticks.
    #[must_use]
    pub fn config_handle(&self) -> Arc<SharedFilterConfig> {
        Arc::clone(&self.config)
    }

    /// Sets the maximum rate of change, in units per second.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxRate`] if `max_rate` is not positive
    /// and finite. The previous value stays active.
    pub fn set_max_rate(&self, max_rate: f32) -> Result<(), ConfigError> {
        self.config.set_max_rate(max_rate)
    }

    /// Sets the control period, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPeriod`] if `period` is not positive and
    /// finite. The previous value stays active.
    pub fn set_period(&self, period: f32) -> Result<(), ConfigError> {
        self.config.set_period(period)
    }

    /// The last output of every observed channel.
    #[must_use]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// The last output of `channel`, or `None` if it was never observed.
    #[must_use]
    pub fn last_output(&self, channel: usize) -> Option<f32> {
        self.state.get(channel)
    }

    /// Runs one control period.
    ///
    /// Index `i` of `inputs` must refer to the same physical channel on every
    /// call. Each channel is handled independently:
    ///
    /// * on its first observation the target passes through unchanged;
    /// * afterwards the output moves towards the target by at most
    ///   [`FilterConfig::max_step`], landing exactly on the target once it is
    ///   within reach.
    ///
    /// Channels beyond `inputs.len()` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] if any target is NaN or infinite. The
    /// error still carries the full output vector: rejected channels repeat
    /// their previous output (or `0.0` if they were never observed, in which
    /// case they stay unobserved), and all other channels are limited
    /// normally.
    pub fn tick(&mut self, inputs: &DVector<f32>) -> Result<DVector<f32>, InvalidInputError> {
        let config = self.config.snapshot();
        let mut output = DVector::zeros(inputs.len());
        let mut rejected = Vec::new();

        for (channel, &target) in inputs.iter().enumerate() {
            let previous = self.state.get(channel);

            if !target.is_finite() {
                log::warn!("rejected non-finite target {target} on channel {channel}");
                rejected.push(channel);
                output[channel] = previous.unwrap_or(0.0);
                continue;
            }

            let Some(previous) = previous else {
                log::debug!("channel {channel} first observed at {target}");
                self.state.set(channel, target);
                output[channel] = target;
                continue;
            };

            let value = limit(previous, target, config);
            self.state.set(channel, value);
            output[channel] = value;
        }

        if rejected.is_empty() {
            Ok(output)
        } else {
            Err(InvalidInputError::new(output, rejected))
        }
    }
}

/// Moves `previous` towards `target` by at most one step of `config`.
#[inline]
fn limit(previous: f32, target: f32, config: FilterConfig) -> f32 {
    let delta = target - previous;
    let rate = delta / config.period();

    if rate.abs() <= config.max_rate() {
        return target;
    }

    let stepped = previous + config.max_step().copysign(delta);

    // never step past the target
    if (stepped - previous).abs() >= delta.abs() {
        target
    } else {
        log::trace!("limited {previous} -> {target} to {stepped}");
        stepped
    }
}
