//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`LIGHTING_DEMO_SECTION__KEY`)

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "LIGHTING_DEMO_";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from `config/` relative to the working directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    ///
    /// Missing files are skipped, so an empty directory yields the defaults
    /// plus any environment overrides.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        } else {
            log::warn!("No {:?}, using built-in defaults", default_path);
        }

        if user_path.exists() {
            log::info!("Applying user config {:?}", user_path);
            figment = figment.merge(Toml::file(&user_path));
        }

        // LIGHTING_DEMO_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the projection matrices degenerate
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lighting Toggles".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory that holds `images/` and `models/`
    pub root: PathBuf,
    /// Substitute placeholders for missing files instead of failing
    pub allow_missing: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            allow_missing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    /// Background color [r, g, b, a]
    pub clear_color: [f32; 4],
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.08, 0.17, 0.31, 1.0],
        }
    }
}

/// Point light and initial toggle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingConfig {
    pub light_position: [f32; 3],
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    /// Index into the lighting modes, 0 (no lighting) to 5 (toon)
    pub initial_mode: i32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_position: [0.0, 0.0, 2.0],
            attenuation_constant: 1.0,
            attenuation_linear: 0.09,
            attenuation_quadratic: 0.032,
            initial_mode: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Visible height of the orthographic projection
    pub ortho_height: f32,
    pub near: f32,
    pub far: f32,
    /// Movement speed (units per second)
    pub move_speed: f32,
    /// Speed multiplier while Shift is held
    pub boost_multiplier: f32,
    /// Degrees of rotation per pixel of mouse movement
    pub mouse_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 90.0,
            ortho_height: 3.0,
            near: 0.01,
            far: 1000.0,
            move_speed: 4.0,
            boost_multiplier: 3.0,
            mouse_sensitivity: 0.2,
        }
    }
}

impl CameraConfig {
    /// Checks `0 < fov < 180`, `0 < near < far` and `ortho_height > 0`
    ///
    /// NaN fails every comparison and is rejected too.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(invalid("camera.fov", format!("{} is not between 0 and 180 degrees", self.fov)));
        }
        if !(self.near > 0.0) {
            return Err(invalid("camera.near", format!("{} must be positive", self.near)));
        }
        if !(self.far > self.near) {
            return Err(invalid(
                "camera.far",
                format!("{} must be greater than near ({})", self.far, self.near),
            ));
        }
        if !(self.ortho_height > 0.0) {
            return Err(invalid(
                "camera.ortho_height",
                format!("{} must be positive", self.ortho_height),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
