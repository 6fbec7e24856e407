// Library exports for shp2svg

pub mod archive;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod graph;
pub mod parser;
pub mod project;
pub mod render;
pub mod runtime;
pub mod scale;
pub mod select;
pub mod source;

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "svg")]
    #[default]
    Svg,
    #[serde(rename = "png")]
    Png,
}

impl OutputFormat {
    /// Format implied by a file extension, if any
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "svg" => Some(OutputFormat::Svg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Defaults of the two historical flavours of the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Web mercator, scale 1000, heavy markers
    #[default]
    Projected,
    /// Source coordinates, scale 1, light markers
    Plain,
}

impl Preset {
    pub fn options(self) -> RenderOptions {
        match self {
            Preset::Projected => RenderOptions::default(),
            Preset::Plain => RenderOptions {
                scale: 1.0,
                point_divisor: 10.0,
                line_divisor: 100.0,
                crs: None,
                format: OutputFormat::Svg,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_point_divisor")]
    pub point_divisor: f64,
    #[serde(default = "default_line_divisor")]
    pub line_divisor: f64,
    /// Target CRS, `None` keeps source coordinates
    #[serde(default = "default_crs")]
    pub crs: Option<String>,
    #[serde(default, alias = "type")]
    pub format: OutputFormat,
}

fn default_scale() -> f64 {
    1000.0
}

fn default_point_divisor() -> f64 {
    5.0
}

fn default_line_divisor() -> f64 {
    50.0
}

fn default_crs() -> Option<String> {
    Some("EPSG:3857".to_string())
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            point_divisor: default_point_divisor(),
            line_divisor: default_line_divisor(),
            crs: default_crs(),
            format: OutputFormat::Svg,
        }
    }
}

impl RenderOptions {
    /// Parse a JSON options document; absent keys take the projected defaults
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Scale and divisors must be finite and strictly positive
    pub fn validate(&self) -> error::Result<()> {
        let checks = [
            ("scale", self.scale),
            ("point_divisor", self.point_divisor),
            ("line_divisor", self.line_divisor),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(error::ConvertError::InvalidRenderOptions(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
