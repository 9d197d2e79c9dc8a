use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{RadiationError, Result};
use crate::sim::period::AnalysisPeriod;
use crate::sim::sky::matrix::SkyConfig;

/// What the evaluator reports per sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Cumulative radiation over the analysis period (Wh/m^2).
    #[default]
    Cumulative,
    /// Mean irradiance over the analysis period (W/m^2).
    AverageIrradiance,
}

/// Configuration of the radiation evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Distance the ray origin is moved along the sensor normal (m).
    pub offset: f64,
    pub mode: EvaluationMode,
    /// Worker threads; None uses the global rayon pool.
    pub num_threads: Option<usize>,
    /// Voxel size of the context scene; None derives it from the geometry.
    pub voxel_size: Option<f64>,
}

impl EvaluationConfig {
    pub fn new() -> Self {
        Self {
            offset: 0.1,
            mode: EvaluationMode::Cumulative,
            num_threads: None,
            voxel_size: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.offset.is_finite() || self.offset < 0.0 {
            return Err(RadiationError::config(format!(
                "offset must be a non-negative distance, got {}",
                self.offset
            )));
        }
        if self.num_threads == Some(0) {
            return Err(RadiationError::config("thread count must be at least 1"));
        }
        if let Some(v) = self.voxel_size
            && !(v.is_finite() && v > 0.0)
        {
            return Err(RadiationError::config(format!(
                "voxel size must be positive, got {v}"
            )));
        }
        Ok(())
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a radiation study needs besides its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub sky: SkyConfig,
    pub period: AnalysisPeriod,
    /// Ground reflectance in [0, 1].
    pub reflectance: f64,
    pub evaluation: EvaluationConfig,
}

impl StudyConfig {
    pub fn new() -> Self {
        Self {
            sky: SkyConfig::default(),
            period: AnalysisPeriod::annual(),
            reflectance: 0.2,
            evaluation: EvaluationConfig::new(),
        }
    }

    /// Checks every part of the configuration without building anything.
    pub fn validate(&self) -> Result<()> {
        self.sky.validate()?;
        self.period.validate()?;
        self.evaluation.validate()?;
        if !(0.0..=1.0).contains(&self.reflectance) {
            return Err(RadiationError::InvalidReflectance(self.reflectance));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(content).context("Failed to parse study configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize study configuration")
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self::new()
    }
}
