use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TrackerError, TrackerResult};
use crate::module::map::MapStyle;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Where the rendered image is written, overwritten on every run
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub style: MapStyle,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.png")
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            output_path: default_output_path(),
            api: ApiConfig::default(),
            render: RenderConfig::default(),
            style: MapStyle::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> TrackerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> TrackerResult<Self> {
        toml::from_str(content).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Read `path` if it exists, otherwise fall back to the built-in defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> TrackerResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Upstream endpoints and their timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub position_url: String,
    pub astros_url: String,
    pub geocode_url: String,
    pub overpass_url: String,
    pub user_agent: String,

    /// Timeout for the position and crew requests. Unset means wait forever.
    pub fetch_timeout_secs: Option<u64>,
    pub geocode_timeout_secs: u64,
    pub overpass_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            position_url: "http://api.open-notify.org/iss-now.json".to_string(),
            astros_url: "http://api.open-notify.org/astros.json".to_string(),
            geocode_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            user_agent: "iss".to_string(),
            fetch_timeout_secs: None,
            geocode_timeout_secs: 10,
            overpass_timeout_secs: 60,
        }
    }
}

/// Physical size of an output image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: f32,
}

impl CanvasConfig {
    pub const POINTS_PER_INCH: f32 = 72.0;

    /// Canvas size in SVG user units
    pub fn size_pt(&self) -> (f32, f32) {
        (
            self.width_in * Self::POINTS_PER_INCH,
            self.height_in * Self::POINTS_PER_INCH,
        )
    }

    /// Factor applied when rasterising the SVG
    pub fn scale(&self) -> f32 {
        self.dpi / Self::POINTS_PER_INCH
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Map radius around the ISS position, in metres
    pub radius_m: f64,
    pub font_family: String,
    /// Extra font directory loaded on top of the system fonts
    pub fonts_dir: Option<PathBuf>,
    pub ocean_background: String,
    pub land: CanvasConfig,
    pub ocean: CanvasConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            radius_m: 30_000.0,
            font_family: "monospace".to_string(),
            fonts_dir: Some(PathBuf::from("fonts")),
            ocean_background: "#00aa99".to_string(),
            land: CanvasConfig {
                width_in: 6.0,
                height_in: 10.0,
                dpi: 100.0,
            },
            ocean: CanvasConfig {
                width_in: 10.0,
                height_in: 8.0,
                dpi: 100.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TrackerConfig::from_toml("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.output_path, PathBuf::from("output.png"));
        assert_eq!(config.api.geocode_timeout_secs, 10);
        assert!(config.api.fetch_timeout_secs.is_none());
        assert_eq!(config.render.radius_m, 30_000.0);
        assert_eq!(config.style.layers.len(), 4);
    }

    #[test]
    fn test_partial_override() {
        let config = TrackerConfig::from_toml(
            r#"
            output_path = "out/iss.png"

            [api]
            fetch_timeout_secs = 15

            [render]
            radius_m = 1000.0

            [render.land]
            width_in = 8.0
            height_in = 8.0
            dpi = 72.0
            "#,
        )
        .unwrap();

        assert_eq!(config.output_path, PathBuf::from("out/iss.png"));
        assert_eq!(config.api.fetch_timeout_secs, Some(15));
        assert_eq!(config.api.geocode_timeout_secs, 10);
        assert_eq!(config.render.radius_m, 1000.0);
        assert_eq!(config.render.land.size_pt(), (576.0, 576.0));
        assert_eq!(config.render.land.scale(), 1.0);
        assert_eq!(config.render.ocean.width_in, 10.0);
    }

    #[test]
    fn test_single_layer_style_override() {
        let config = TrackerConfig::from_toml(
            r##"
            [style.styles.water]
            fill = "#0000ff"
            stroke = "#000000"
            "##,
        )
        .unwrap();

        let defaults = MapStyle::default();
        assert_eq!(config.style.styles.water.fill, "#0000ff");
        assert_eq!(config.style.styles.water.stroke_width, 1.0);
        assert_eq!(config.style.styles.building, defaults.styles.building);
        assert_eq!(config.style.styles.background, defaults.styles.background);
        assert_eq!(config.style.street_widths, defaults.street_widths);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = TrackerConfig::from_toml("log_level = [").unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = TrackerConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.log_dir, "logs");
    }
}
