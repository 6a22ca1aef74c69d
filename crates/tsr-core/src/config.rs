//! Reconstruction settings.

use std::num::NonZeroU32;

use thiserror::Error;

use crate::day::DayBoundaryTimeZone;

/// Default seconds between presence samples.
pub const DEFAULT_STEP_SECS: u32 = 60;

/// Invalid reconstruction settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sampling step must be at least one second")]
    ZeroStep,

    #[error("invalid time zone {0:?}: expected \"utc\", \"local\" or an offset like \"+02:00\"")]
    InvalidTimeZone(String),
}

/// Configuration for timeline reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructionConfig {
    /// Seconds between presence samples.
    /// Default: 60 (1 minute).
    pub step: NonZeroU32,

    /// Time zone anchoring calendar-day boundaries.
    /// Default: the host's local calendar.
    pub day_boundary_time_zone: DayBoundaryTimeZone,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            step: NonZeroU32::new(DEFAULT_STEP_SECS).unwrap_or(NonZeroU32::MIN),
            day_boundary_time_zone: DayBoundaryTimeZone::default(),
        }
    }
}

impl ReconstructionConfig {
    /// Builds a configuration from raw settings.
    pub fn new(step_secs: u32, day_boundary_time_zone: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            step: NonZeroU32::new(step_secs).ok_or(ConfigError::ZeroStep)?,
            day_boundary_time_zone: day_boundary_time_zone.parse()?,
        })
    }
}
