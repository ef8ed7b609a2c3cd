use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid viewer config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid viewer config: {0}")]
    Invalid(String),
}

/// Viewer settings. Every field has a default, so callers only override what
/// they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub texture_url: String,
    pub model_url: String,
    /// Largest dimension of a loaded model after normalization, in world units.
    pub target_size: f32,
    /// Rotation about the vertical axis added every frame while not dragging (radians).
    pub idle_spin: f32,
    /// Radians of rotation per pixel of pointer drag.
    pub drag_sensitivity: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera position before any model has loaded.
    pub camera_position: [f32; 3],
    pub clear_color: [f64; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            texture_url: "/_0731232307_texture.png".into(),
            model_url: "/_0731232307_texture.glb".into(),
            target_size: 8.0,
            idle_spin: 0.01,
            drag_sensitivity: 0.01,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            camera_position: [0.0, 2.0, 12.0],
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl ViewerConfig {
    /// Parse overrides from JSON and validate. An empty string yields defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "target_size must be positive, got {}",
                self.target_size
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if self.model_url.is_empty() {
            return Err(ConfigError::Invalid("model_url is empty".into()));
        }
        Ok(())
    }
}
