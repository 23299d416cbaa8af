use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::engine::{BendPreference, RoutingMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cornerRadius must be non-negative, got {0}")]
    NegativeCornerRadius(f32),
    #[error("laneSpacing must be positive, got {0}")]
    NonPositiveLaneSpacing(f32),
    #[error("curveSpacing must be positive, got {0}")]
    NonPositiveCurveSpacing(f32),
    #[error("fontSize must be positive, got {0}")]
    NonPositiveFontSize(f32),
    #[error("cameraDebounceMs must be non-negative, got {0}")]
    NegativeDebounce(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub mode: RoutingMode,
    pub corner_radius: f32,
    pub bend_preference: BendPreference,
    pub lane_spacing: f32,
    pub curve_spacing: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: RoutingMode::Straight,
            corner_radius: 8.0,
            bend_preference: BendPreference::Auto,
            lane_spacing: 12.0,
            curve_spacing: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub font_size: f32,
    pub width_per_char: f32,
    pub min_width: f32,
    pub height_factor: f32,
    pub min_segment_length: f32,
    pub segment_margin: f32,
    pub obstacle_padding: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            width_per_char: 0.55,
            min_width: 16.0,
            height_factor: 1.1,
            min_segment_length: 64.0,
            segment_margin: 24.0,
            obstacle_padding: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub deadband: f32,
    pub drag_deadband: f32,
    pub grid_snap_deadband: f32,
    pub camera_debounce_ms: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            deadband: 1.0,
            drag_deadband: 0.0,
            grid_snap_deadband: 0.5,
            camera_debounce_ms: 750.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub routing: RoutingConfig,
    pub label: LabelConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routing.corner_radius < 0.0 {
            return Err(ConfigError::NegativeCornerRadius(self.routing.corner_radius));
        }
        if self.routing.lane_spacing <= 0.0 {
            return Err(ConfigError::NonPositiveLaneSpacing(self.routing.lane_spacing));
        }
        if self.routing.curve_spacing <= 0.0 {
            return Err(ConfigError::NonPositiveCurveSpacing(self.routing.curve_spacing));
        }
        if self.label.font_size <= 0.0 {
            return Err(ConfigError::NonPositiveFontSize(self.label.font_size));
        }
        if self.cache.camera_debounce_ms < 0.0 {
            return Err(ConfigError::NegativeDebounce(self.cache.camera_debounce_ms));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    mode: Option<RoutingMode>,
    corner_radius: Option<f32>,
    bend_preference: Option<BendPreference>,
    lane_spacing: Option<f32>,
    curve_spacing: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LabelConfigFile {
    font_size: Option<f32>,
    width_per_char: Option<f32>,
    min_width: Option<f32>,
    height_factor: Option<f32>,
    min_segment_length: Option<f32>,
    segment_margin: Option<f32>,
    obstacle_padding: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CacheConfigFile {
    deadband: Option<f32>,
    drag_deadband: Option<f32>,
    grid_snap_deadband: Option<f32>,
    camera_debounce_ms: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    routing: Option<RoutingConfigFile>,
    label: Option<LabelConfigFile>,
    cache: Option<CacheConfigFile>,
}

fn apply_overrides(config: &mut EngineConfig, parsed: ConfigFile) {
    if let Some(routing) = parsed.routing {
        if let Some(v) = routing.mode {
            config.routing.mode = v;
        }
        if let Some(v) = routing.corner_radius {
            config.routing.corner_radius = v;
        }
        if let Some(v) = routing.bend_preference {
            config.routing.bend_preference = v;
        }
        if let Some(v) = routing.lane_spacing {
            config.routing.lane_spacing = v;
        }
        if let Some(v) = routing.curve_spacing {
            config.routing.curve_spacing = v;
        }
    }
    if let Some(label) = parsed.label {
        if let Some(v) = label.font_size {
            config.label.font_size = v;
        }
        if let Some(v) = label.width_per_char {
            config.label.width_per_char = v;
        }
        if let Some(v) = label.min_width {
            config.label.min_width = v;
        }
        if let Some(v) = label.height_factor {
            config.label.height_factor = v;
        }
        if let Some(v) = label.min_segment_length {
            config.label.min_segment_length = v;
        }
        if let Some(v) = label.segment_margin {
            config.label.segment_margin = v;
        }
        if let Some(v) = label.obstacle_padding {
            config.label.obstacle_padding = v;
        }
    }
    if let Some(cache) = parsed.cache {
        if let Some(v) = cache.deadband {
            config.cache.deadband = v;
        }
        if let Some(v) = cache.drag_deadband {
            config.cache.drag_deadband = v;
        }
        if let Some(v) = cache.grid_snap_deadband {
            config.cache.grid_snap_deadband = v;
        }
        if let Some(v) = cache.camera_debounce_ms {
            config.cache.camera_debounce_ms = v;
        }
    }
}

/// Load the engine configuration, overlaying file values on the defaults.
/// Accepts strict JSON and falls back to JSON5 for hand-edited files with
/// comments or trailing commas.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        let config = EngineConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse configuration overrides from an in-memory string, for hosts that
/// embed the engine and carry settings in their own document format.
pub fn parse_config(contents: &str) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::default();
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };
    apply_overrides(&mut config, parsed);
    config.validate()?;
    Ok(config)
}
