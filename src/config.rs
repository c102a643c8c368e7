//! Run configuration, loaded from JSON with every field defaulted.

use crate::data::{LoadOptions, MISSING_SENTINEL};
use crate::stats::smoother::{SmoothError, DEFAULT_SIGMA, DEFAULT_TRUNCATE};
use crate::stats::{AnalysisSettings, GaussianSmoother, LatBand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INPUT: &str = "pr_Amon_TRMM_201001-201012.nc";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid latitude band [{south}, {north}]")]
    InvalidBand { south: f64, north: f64 },
    #[error("{0}")]
    Smoothing(#[from] SmoothError),
    #[error("At least 2 contour levels are required, got {0}")]
    TooFewLevels(usize),
    #[error("Image size for {0} must be non-zero")]
    EmptyImage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItczConfig {
    pub input: PathBuf,
    pub variable: String,
    pub missing_value: f64,
    pub smoothing_sigma: f64,
    pub smoothing_truncate: f64,
    pub lat_band: LatBand,
    pub strict_time: bool,
    pub contour_levels: usize,
    pub output_dir: PathBuf,
    pub show: bool,
    pub export: bool,
    pub profile_size: (u32, u32),
    pub map_size: (u32, u32),
}

impl Default for ItczConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            variable: "pr".to_string(),
            missing_value: MISSING_SENTINEL,
            smoothing_sigma: DEFAULT_SIGMA,
            smoothing_truncate: DEFAULT_TRUNCATE,
            lat_band: LatBand::default(),
            strict_time: false,
            contour_levels: 30,
            output_dir: PathBuf::from("itcz_output"),
            show: true,
            export: true,
            profile_size: (800, 400),
            map_size: (1300, 600),
        }
    }
}

impl ItczConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.lat_band.is_valid() {
            return Err(ConfigError::InvalidBand {
                south: self.lat_band.south,
                north: self.lat_band.north,
            });
        }
        GaussianSmoother::new(self.smoothing_sigma, self.smoothing_truncate)?;
        if self.contour_levels < 2 {
            return Err(ConfigError::TooFewLevels(self.contour_levels));
        }
        if self.profile_size.0 == 0 || self.profile_size.1 == 0 {
            return Err(ConfigError::EmptyImage("profile"));
        }
        if self.map_size.0 == 0 || self.map_size.1 == 0 {
            return Err(ConfigError::EmptyImage("map"));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            variable: self.variable.clone(),
            missing_value: self.missing_value,
            strict_time: self.strict_time,
        }
    }

    pub fn analysis_settings(&self) -> Result<AnalysisSettings, ConfigError> {
        Ok(AnalysisSettings {
            band: self.lat_band,
            smoother: GaussianSmoother::new(self.smoothing_sigma, self.smoothing_truncate)?,
        })
    }
}
