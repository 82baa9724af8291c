//! Configuration structs with defaults and RON persistence.

use std::path::Path;

use galaxy_core::{ParamField, ParameterSet, Rgb};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub camera: CameraConfig,
    /// Generation parameters and seed.
    pub galaxy: GalaxyConfig,
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start borderless fullscreen.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Upper bound on the device pixel ratio used for the render surface.
    pub max_pixel_ratio: f64,
    /// Background color.
    pub clear_color: Rgb,
}

/// Perspective camera and orbit-control configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial eye position; the camera looks at the origin.
    pub position: [f32; 3],
    /// Fraction of the remaining orbit velocity removed each frame.
    pub damping: f32,
    /// Orbit speed multiplier; at 1.0 a drag across the full window height
    /// turns one revolution.
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

/// Galaxy generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalaxyConfig {
    pub parameters: ParameterSet,
    /// Fixed seed for reproducible runs. `None` draws a fresh seed each start.
    pub seed: Option<u64>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Seconds between frame-rate log lines. Zero disables them.
    pub stats_interval_secs: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Galaxy".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            clear_color: Rgb::BLACK,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [3.0, 3.0, 3.0],
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.2,
            max_distance: 50.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval_secs: 5.0,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Replace the stored galaxy parameters and write the file.
    pub fn save_parameters(
        &mut self,
        parameters: &ParameterSet,
        config_dir: &Path,
    ) -> Result<(), ConfigError> {
        self.galaxy.parameters = parameters.clone();
        self.save(config_dir)?;
        log::info!("Saved galaxy parameters to {}", config_dir.join(CONFIG_FILE).display());
        Ok(())
    }

    /// Snap the galaxy parameters into their control bounds. Returns one
    /// entry per field that moved; the caller logs them once logging is up.
    #[must_use = "clamped fields should be reported to the user"]
    pub fn clamp_parameters(&mut self) -> Vec<ClampedParameter> {
        let before = self.galaxy.parameters.clone();
        self.galaxy
            .parameters
            .clamp_to_bounds()
            .into_iter()
            .map(|field| ClampedParameter {
                field,
                requested: before.describe(field),
                applied: self.galaxy.parameters.describe(field),
            })
            .collect()
    }
}

/// A galaxy parameter that was outside its bounds and got snapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampedParameter {
    pub field: ParamField,
    pub requested: String,
    pub applied: String,
}

impl std::fmt::Display for ClampedParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "galaxy.{} = {} is outside its bounds, using {}",
            self.field, self.requested, self.applied
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::JitterScale;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("fov_degrees: 75.0"));
        assert!(ron_str.contains("\"#ff6030\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), render: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.galaxy, GalaxyConfig::default());
    }

    #[test]
    fn test_partial_galaxy_section() {
        let ron_str = r##"(galaxy: (parameters: (branches: 3, inside_color: "#ffffff"), seed: Some(9)))"##;
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.galaxy.parameters.branches, 3);
        assert_eq!(config.galaxy.parameters.inside_color, Rgb::WHITE);
        assert_eq!(config.galaxy.parameters.count, 160_500);
        assert_eq!(config.galaxy.seed, Some(9));
    }

    #[test]
    fn test_jitter_mode_parses() {
        let ron_str = "(galaxy: (parameters: (jitter: Unit)))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.galaxy.parameters.jitter, JitterScale::Unit);
    }

    #[test]
    fn test_bad_color_is_parse_error() {
        let ron_str = r##"(galaxy: (parameters: (outside_color: "#12")))"##;
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.galaxy.seed = Some(1234);
        config.galaxy.parameters.spin = -2.5;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.galaxy.parameters.count = 5_000;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().galaxy.parameters.count, 5_000);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_parameters_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        let params = ParameterSet {
            radius: 7.5,
            ..Default::default()
        };
        config.save_parameters(&params, dir.path()).unwrap();

        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(loaded.galaxy.parameters.radius, 7.5);
    }

    #[test]
    fn test_clamp_parameters() {
        let mut config = Config::default();
        config.galaxy.parameters.count = 50;
        config.galaxy.parameters.spin = 9.0;
        let clamped = config.clamp_parameters();
        assert_eq!(config.galaxy.parameters.count, 100);
        assert_eq!(config.galaxy.parameters.spin, 5.0);

        let fields: Vec<_> = clamped.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![ParamField::Count, ParamField::Spin]);
        assert_eq!(clamped[0].requested, "50");
        assert_eq!(clamped[0].applied, "100");
        assert_eq!(
            clamped[1].to_string(),
            "galaxy.spin = 9.000 is outside its bounds, using 5.000"
        );
    }

    #[test]
    fn test_clamp_parameters_in_bounds_reports_nothing() {
        let mut config = Config::default();
        assert!(config.clamp_parameters().is_empty());
    }

    #[test]
    fn test_out_of_bounds_file_value_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "(galaxy: (parameters: (branches: 40)))",
        )
        .unwrap();
        let mut config = Config::load_or_create(dir.path()).unwrap();
        let clamped = config.clamp_parameters();
        assert_eq!(config.galaxy.parameters.branches, 10);
        assert_eq!(clamped.len(), 1);
        assert_eq!(clamped[0].field, ParamField::Branches);
        assert_eq!(clamped[0].requested, "40");
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
