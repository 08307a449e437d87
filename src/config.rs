//! Run configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! command-line flags. Every section validates itself before use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Spectral analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Frames per second of the source footage.
    pub sampling_rate: f64,
    /// Worker threads for the row scheduler (0 uses the rayon default).
    pub threads: usize,
    /// Log periodic progress while rows complete.
    pub progress: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 60.0,
            threads: 0,
            progress: true,
        }
    }
}

impl AnalysisConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(ConfigError::InvalidSamplingRate(self.sampling_rate));
        }
        Ok(())
    }
}

/// CBF/FFCA resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Minimum peak PSD a pixel must exceed to count as ciliated.
    pub power_threshold: f64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            power_threshold: 5.0,
        }
    }
}

impl ResolveConfig {
    /// Rejects negative or non-finite thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.power_threshold.is_finite() && self.power_threshold >= 0.0) {
            return Err(ConfigError::InvalidPowerThreshold(self.power_threshold));
        }
        Ok(())
    }
}

/// Output handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Skip inputs whose summary file already exists.
    pub skip_existing: bool,
    /// Keep the binary maps and metadata after the summary is written.
    pub keep_maps: bool,
    /// Write Prometheus text metrics here after the run.
    pub metrics_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            skip_existing: true,
            keep_maps: true,
            metrics_file: None,
        }
    }
}

/// Parameters of the synthetic beating source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of frames to generate.
    pub num_frames: u32,
    /// Frames per second the pattern is generated for.
    pub sampling_rate: f64,
    /// Beat frequency in Hz.
    pub beat_frequency: f64,
    /// Mean intensity.
    pub baseline: f64,
    /// Peak deviation from the baseline.
    pub amplitude: f64,
    /// Fraction of columns (from the left) that beat.
    pub ciliated_fraction: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            num_frames: 256,
            sampling_rate: 60.0,
            beat_frequency: 12.0,
            baseline: 128.0,
            amplitude: 40.0,
            ciliated_fraction: 0.5,
        }
    }
}

impl SyntheticConfig {
    /// Checks dimensions, frame count, rate and fraction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.num_frames == 0 {
            return Err(ConfigError::InvalidFrameCount);
        }
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(ConfigError::InvalidSamplingRate(self.sampling_rate));
        }
        if !(0.0..=1.0).contains(&self.ciliated_fraction) {
            return Err(ConfigError::InvalidFraction(self.ciliated_fraction));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Synthetic frame count is zero.
    #[error("frame count must be at least 1")]
    InvalidFrameCount,
    /// Sampling rate is zero, negative, or not finite.
    #[error("sampling rate must be positive and finite, got {0}")]
    InvalidSamplingRate(f64),
    /// Power threshold is negative or not finite.
    #[error("power threshold must be finite and non-negative, got {0}")]
    InvalidPowerThreshold(f64),
    /// Ciliated fraction lies outside `0..=1`.
    #[error("ciliated fraction must be within 0..=1, got {0}")]
    InvalidFraction(f64),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[analysis]`: spectral engine settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// `[resolve]`: CBF/FFCA settings.
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// `[output]`: file handling.
    #[serde(default)]
    pub output: OutputConfig,
    /// `[synthetic]`: test volume generator.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration file");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.resolve.validate()?;
        self.synthetic.validate()
    }
}
