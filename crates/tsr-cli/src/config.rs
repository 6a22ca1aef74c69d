//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tsr_core::{ConfigError, DEFAULT_STEP_SECS, ReconstructionConfig};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between presence samples.
    pub step_secs: u32,

    /// Time zone anchoring day boundaries: "utc", "local" or "+HH:MM".
    pub day_boundary_time_zone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step_secs: DEFAULT_STEP_SECS,
            day_boundary_time_zone: "local".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TSR_*)
        figment = figment.merge(Env::prefixed("TSR_"));

        figment.extract()
    }

    /// Builds the core configuration, applying command-line overrides.
    pub fn reconstruction(
        &self,
        step_override: Option<u32>,
        time_zone_override: Option<&str>,
    ) -> Result<ReconstructionConfig, ConfigError> {
        ReconstructionConfig::new(
            step_override.unwrap_or(self.step_secs),
            time_zone_override.unwrap_or(&self.day_boundary_time_zone),
        )
    }
}

/// Returns the platform-specific config directory for tsr.
///
/// On Linux: `~/.config/tsr`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tsr"))
}
