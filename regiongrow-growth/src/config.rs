use std::path::{Path, PathBuf};
use std::time::Duration;

use regiongrow_grid::CHUNK_SIZE;
use regiongrow_scan::ScanSettings;
use regiongrow_storage::NamingRules;
use regiongrow_world::{RetryPolicy, WorldBounds};
use serde::Deserialize;
use thiserror::Error;

use crate::decision::Thresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Pause before the one whole-region recapture.
    pub recapture_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: retry.max_attempts,
            retry_delay_ms: retry.retry_delay_ms,
            recapture_delay_ms: 5000,
        }
    }
}

impl CaptureConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            retry_delay_ms: self.retry_delay_ms,
        }
    }

    pub fn recapture_delay(&self) -> Duration {
        Duration::from_millis(self.recapture_delay_ms)
    }
}

/// Everything the growth loop can be tuned with. Missing keys take defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Region side length in blocks.
    pub region_size: i32,
    pub world: WorldBounds,
    pub scan: ScanSettings,
    pub thresholds: Thresholds,
    pub capture: CaptureConfig,
    pub naming: NamingRules,
    pub scan_interval_secs: u64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            region_size: 400,
            world: WorldBounds::default(),
            scan: ScanSettings::default(),
            thresholds: Thresholds::default(),
            capture: CaptureConfig::default(),
            naming: NamingRules::default(),
            scan_interval_secs: 6 * 60 * 60,
        }
    }
}

impl GrowthConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region_size <= 0 || self.region_size % CHUNK_SIZE != 0 {
            return Err(ConfigError::Invalid(format!(
                "region_size must be a positive multiple of {}, got {}",
                CHUNK_SIZE, self.region_size
            )));
        }
        if self.world.max_y <= self.world.min_y {
            return Err(ConfigError::Invalid(format!(
                "world max_y ({}) must be above min_y ({})",
                self.world.max_y, self.world.min_y
            )));
        }
        if self.scan.inset < 0 || self.scan.inset * 2 >= self.region_size {
            return Err(ConfigError::Invalid(format!(
                "scan inset {} leaves no room inside a {}-block region",
                self.scan.inset, self.region_size
            )));
        }
        if self.scan.depth_below < 0 || self.scan.height_above < 0 {
            return Err(ConfigError::Invalid("scan window must not be negative".to_string()));
        }
        if self.capture.max_attempts == 0 {
            return Err(ConfigError::Invalid("capture max_attempts must be at least 1".to_string()));
        }
        if !self.thresholds.density_ratio.is_finite() || self.thresholds.density_ratio < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "density_ratio must be a non-negative number, got {}",
                self.thresholds.density_ratio
            )));
        }
        if self.scan_interval_secs == 0 {
            return Err(ConfigError::Invalid("scan_interval_secs must be at least 1".to_string()));
        }
        if self.naming.names.is_empty() {
            log::error!("No region names configured; new regions cannot be allocated");
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// One-line description for the metrics report.
    pub fn summary(&self) -> String {
        format!(
            "region {} blocks, y {}..{}, window -{}/+{}, min score {}, min wood {}, max player blocks {}",
            self.region_size,
            self.world.min_y,
            self.world.max_y,
            self.scan.depth_below,
            self.scan.height_above,
            self.thresholds.min_score,
            self.thresholds.min_wood,
            self.thresholds.max_player_blocks()
        )
    }
}
