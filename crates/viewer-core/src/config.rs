//! Viewer configuration.
//!
//! Configuration can be created programmatically, loaded from environment
//! variables or a `key = value` file, and finally overlaid with the startup
//! parameters of the page that hosts the viewer.

use crate::geometry::ViewportSize;
use crate::params::StartupParams;
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_OUTPUT_SCALE: f32 = 4.0;
pub const DEFAULT_GEOMETRY_CACHE: usize = 64;

/// Tunables of one viewer instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Supersampling factor applied to surface pixel buffers.
    pub output_scale: f32,
    /// Never pair the first page with the second.
    pub first_page_alone: bool,
    /// Viewport assumed until the host reports a real size.
    pub initial_viewport: ViewportSize,
    /// Page geometries kept per document.
    pub geometry_cache_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            output_scale: DEFAULT_OUTPUT_SCALE,
            first_page_alone: false,
            initial_viewport: ViewportSize::default(),
            geometry_cache_capacity: DEFAULT_GEOMETRY_CACHE,
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_scale(mut self, scale: f32) -> Self {
        self.output_scale = scale;
        self
    }

    pub fn with_first_page_alone(mut self, first_page_alone: bool) -> Self {
        self.first_page_alone = first_page_alone;
        self
    }

    pub fn with_initial_viewport(mut self, viewport: ViewportSize) -> Self {
        self.initial_viewport = viewport;
        self
    }

    pub fn with_geometry_cache_capacity(mut self, capacity: usize) -> Self {
        self.geometry_cache_capacity = capacity;
        self
    }

    /// Applies the page's startup parameters on top of this configuration.
    pub fn merge_params(mut self, params: &StartupParams) -> Self {
        self.first_page_alone |= params.first_page_alone;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// - `FOLIO_OUTPUT_SCALE`: supersampling factor (default: 4)
    /// - `FOLIO_GEOMETRY_CACHE`: cached page geometries (default: 64)
    /// - `FOLIO_FIRST_PAGE_ALONE`: `1`/`true` to show the cover alone
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("FOLIO_OUTPUT_SCALE") {
            config.output_scale = parse_output_scale("FOLIO_OUTPUT_SCALE", &value)?;
        }

        if let Ok(value) = std::env::var("FOLIO_GEOMETRY_CACHE") {
            config.geometry_cache_capacity = parse_capacity("FOLIO_GEOMETRY_CACHE", &value)?;
        }

        if let Ok(value) = std::env::var("FOLIO_FIRST_PAGE_ALONE") {
            config.first_page_alone = parse_flag("FOLIO_FIRST_PAGE_ALONE", &value)?;
        }

        Ok(config)
    }

    /// Loads configuration from a file of `key = value` lines.
    ///
    /// ```text
    /// output_scale = 2
    /// geometry_cache = 128
    /// first_page_alone = true
    /// viewport_width = 1280
    /// viewport_height = 720
    /// ```
    ///
    /// Blank lines, `#` comments and unknown keys are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "output_scale" => config.output_scale = parse_output_scale(key, value)?,
                "geometry_cache" => {
                    config.geometry_cache_capacity = parse_capacity(key, value)?;
                }
                "first_page_alone" => config.first_page_alone = parse_flag(key, value)?,
                "viewport_width" => config.initial_viewport.width = parse_extent(key, value)?,
                "viewport_height" => config.initial_viewport.height = parse_extent(key, value)?,
                _ => {}
            }
        }

        Ok(config)
    }
}

fn parse_output_scale(key: &str, value: &str) -> Result<f32, ConfigError> {
    match value.parse::<f32>() {
        Ok(scale) if scale.is_finite() && scale >= 1.0 => Ok(scale),
        _ => Err(ConfigError::InvalidValue(key.to_owned())),
    }
}

fn parse_capacity(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_owned()))
}

fn parse_extent(key: &str, value: &str) -> Result<f32, ConfigError> {
    match value.parse::<f32>() {
        Ok(extent) if extent.is_finite() && extent > 0.0 => Ok(extent),
        _ => Err(ConfigError::InvalidValue(key.to_owned())),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_owned())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
