use cgmath::InnerSpace;
use serde::{Deserialize, Serialize};
use skyorbit_base::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::math::Vec3;
use crate::setup::{Projection, ViewFace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    #[serde(default = "default_resume_delay_ms")]
    pub resume_delay_ms: u64,
    #[serde(default = "default_angular_rate")]
    pub angular_rate_deg_per_sec: f64,
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    #[serde(default = "default_rotation_axis")]
    pub rotation_axis: [f64; 3],
    #[serde(default)]
    pub setup: SetupConfig,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            resume_delay_ms: default_resume_delay_ms(),
            angular_rate_deg_per_sec: default_angular_rate(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            rotation_axis: default_rotation_axis(),
            setup: SetupConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default = "default_true")]
    pub lock_pan: bool,
    #[serde(default = "default_framing_min")]
    pub framing_min: [f64; 3],
    #[serde(default = "default_framing_max")]
    pub framing_max: [f64; 3],
    #[serde(default)]
    pub view_face: ViewFace,
    #[serde(default)]
    pub projection: Projection,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            lock_pan: true,
            framing_min: default_framing_min(),
            framing_max: default_framing_max(),
            view_face: ViewFace::default(),
            projection: Projection::default(),
        }
    }
}

fn default_resume_delay_ms() -> u64 {
    3500
}

fn default_angular_rate() -> f64 {
    10.0
}

fn default_min_distance() -> f64 {
    100.0
}

fn default_max_distance() -> f64 {
    700.0
}

fn default_rotation_axis() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn default_true() -> bool {
    true
}

fn default_framing_min() -> [f64; 3] {
    [-100.0, -100.0, -100.0]
}

fn default_framing_max() -> [f64; 3] {
    [100.0, 100.0, 100.0]
}

impl OrbitConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), "loaded orbit configuration");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resume_delay_ms == 0 {
            return Err(invalid("resume_delay_ms must be positive"));
        }
        if !self.angular_rate_deg_per_sec.is_finite() {
            return Err(invalid("angular_rate_deg_per_sec must be finite"));
        }
        if !self.min_distance.is_finite() || self.min_distance <= 0.0 {
            return Err(invalid("min_distance must be a positive number"));
        }
        if !self.max_distance.is_finite() || self.max_distance < self.min_distance {
            return Err(invalid(format!(
                "max_distance ({}) must be finite and not less than min_distance ({})",
                self.max_distance, self.min_distance
            )));
        }
        let axis = Vec3::from(self.rotation_axis);
        if !finite3(self.rotation_axis) || axis.magnitude2() <= 0.0 {
            return Err(invalid("rotation_axis must be a finite, non-zero vector"));
        }
        self.setup.validate()
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }

    pub fn angular_rate_rad_per_sec(&self) -> f64 {
        self.angular_rate_deg_per_sec.to_radians()
    }

    pub fn rotation_axis(&self) -> Vec3 {
        Vec3::from(self.rotation_axis).normalize()
    }
}

impl SetupConfig {
    pub fn validate(&self) -> Result<()> {
        if !finite3(self.framing_min) || !finite3(self.framing_max) {
            return Err(invalid("framing bounds must be finite"));
        }
        let inverted = self
            .framing_min
            .iter()
            .zip(self.framing_max.iter())
            .any(|(min, max)| min > max);
        if inverted {
            return Err(invalid("framing_min must not exceed framing_max on any axis"));
        }
        Ok(())
    }
}

fn finite3(values: [f64; 3]) -> bool {
    values.iter().all(|value| value.is_finite())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig(message.into())
}
