//! Error types returned by the limiter and its configuration.

use nalgebra::DVector;

/// Error returned when a configuration value is rejected.
///
/// The rejected value is carried for diagnostics. The configuration that
/// produced this error keeps its previous, valid value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Maximum rate of change must be positive and finite.
    InvalidMaxRate(f32),
    /// Control period must be positive and finite.
    InvalidPeriod(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidMaxRate(value) => {
                write!(f, "max rate must be positive and finite, got {value}")
            }
            ConfigError::InvalidPeriod(value) => {
                write!(f, "period must be positive and finite, got {value} s")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error returned by [`SlewRateLimiter::tick`](crate::SlewRateLimiter::tick)
/// when one or more targets are NaN or infinite.
///
/// The tick still completes: the error carries the full, bounded output
/// vector. A rejected channel that was observed before repeats its previous
/// output. A rejected channel that was never observed has no position to
/// hold and reads `0.0`; actuators listed in [`Self::channels`] that were
/// never commanded should be held by the caller rather than sent that value.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidInputError {
    output: DVector<f32>,
    channels: Vec<usize>,
}

impl InvalidInputError {
    pub(crate) fn new(output: DVector<f32>, channels: Vec<usize>) -> Self {
        Self { output, channels }
    }

    /// The bounded output computed for this tick.
    #[must_use]
    pub fn output(&self) -> &DVector<f32> {
        &self.output
    }

    /// Consumes the error, returning the bounded output for this tick.
    #[must_use]
    pub fn into_output(self) -> DVector<f32> {
        self.output
    }

    /// Indices of the channels whose target was not finite, in ascending
    /// order.
    #[must_use]
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }
}

impl std::fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "non-finite target on channel(s) {:?}", self.channels)
    }
}

impl std::error::Error for InvalidInputError {}
