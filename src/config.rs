/// Visualization settings
///
/// Defaults come from `constants`; a JSON file may override any subset.

use crate::cell_projector::Coverage;
use crate::constants::{
    FIT_TARGET_SIZE, HEX_RESOLUTION_LEVEL, MAX_SCALE_Y, MIN_SCALE_Y, TIME_KEY_INTERVAL_SECS,
};
use crate::error::{Result, SolarHexError};
use crate::spring::SpringPreset;
use h3o::Resolution;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// H3 resolution (0-15)
    pub resolution: u8,
    pub coverage: Coverage,
    pub min_scale_y: f64,
    pub max_scale_y: f64,
    pub spring_preset: SpringPreset,
    /// Seconds between time-key steps
    pub time_key_interval_secs: f64,
    /// Largest horizontal extent of the fitted scene
    pub fit_target_size: f64,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            resolution: HEX_RESOLUTION_LEVEL,
            coverage: Coverage::Centroid,
            min_scale_y: MIN_SCALE_Y,
            max_scale_y: MAX_SCALE_Y,
            spring_preset: SpringPreset::Fast,
            time_key_interval_secs: TIME_KEY_INTERVAL_SECS,
            fit_target_size: FIT_TARGET_SIZE,
        }
    }
}

impl VisualizationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: VisualizationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| SolarHexError::Configuration(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn h3_resolution(&self) -> Result<Resolution> {
        Resolution::try_from(self.resolution)
            .map_err(|e| SolarHexError::Configuration(format!("resolution {}: {}", self.resolution, e)))
    }

    pub fn validate(&self) -> Result<()> {
        self.h3_resolution()?;
        if !(self.min_scale_y.is_finite() && self.max_scale_y.is_finite())
            || self.min_scale_y <= 0.0
            || self.max_scale_y < self.min_scale_y
        {
            return Err(SolarHexError::Configuration(format!(
                "scale range {}..{} must be positive and ascending",
                self.min_scale_y, self.max_scale_y
            )));
        }
        if !(self.time_key_interval_secs > 0.0) {
            return Err(SolarHexError::Configuration(
                "time_key_interval_secs must be positive".to_string(),
            ));
        }
        if !(self.fit_target_size > 0.0) {
            return Err(SolarHexError::Configuration(
                "fit_target_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
