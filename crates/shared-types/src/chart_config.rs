//! Declarative plot configuration as persisted by the panel, plus engine options

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds1D;
use crate::errors::{PlotError, PlotResult};

/// Line colors handed out by path position when a path has no explicit color
pub const SERIES_PALETTE: [[f32; 4]; 8] = [
    [0.306, 0.596, 0.886, 1.0],
    [0.961, 0.467, 0.302, 1.0],
    [0.969, 0.875, 0.443, 1.0],
    [0.361, 0.839, 0.663, 1.0],
    [0.714, 0.627, 1.0, 1.0],
    [0.380, 0.796, 1.0, 1.0],
    [0.957, 0.635, 0.380, 1.0],
    [0.925, 0.427, 0.655, 1.0],
];

/// Which timestamp of a sample is used for the X value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimestampMethod {
    #[default]
    ReceiveTime,
    HeaderStamp,
}

/// Pointwise transform applied over a resolved series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Transform {
    Derivative,
    Negative,
    AbsoluteValue,
    /// A scalar function registered under this name
    Custom(String),
}

/// One configured series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlotPath {
    /// Value expression identifying the series' samples
    pub value: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `#rrggbb` or `#rrggbbaa`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_size: Option<f32>,
    #[serde(default = "default_true")]
    pub show_line: bool,
    #[serde(default)]
    pub timestamp_method: TimestampMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

fn default_true() -> bool {
    true
}

impl PlotPath {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: true,
            label: None,
            color: None,
            line_size: None,
            show_line: true,
            timestamp_method: TimestampMethod::default(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_timestamp_method(mut self, method: TimestampMethod) -> Self {
        self.timestamp_method = method;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Label shown for the series: explicit label, else the expression
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.value)
    }

    /// Line color: the configured color if it parses, else the palette entry for `index`
    pub fn line_color(&self, index: usize) -> [f32; 4] {
        self.color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(SERIES_PALETTE[index % SERIES_PALETTE.len()])
    }
}

/// Persisted choice of X axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum XAxisValue {
    #[default]
    Timestamp,
    Index,
    Custom,
    CurrentCustom,
}

/// Resolved X axis mode used by the dataset builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XAxisMode {
    /// Sample time relative to the recording start
    Timestamp,
    /// Position of the sample in its series
    Index,
    /// Values of another path, paired by position
    Custom { path: String },
    /// Only the latest sample of each series against the latest X path value
    CurrentCustom { path: String },
}

/// Complete plot panel configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    #[serde(default)]
    pub paths: Vec<PlotPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_x_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_x_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_y_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_y_value: Option<f64>,
    /// Keep a window of this width ending at the playback position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_view_width: Option<f64>,
    #[serde(default)]
    pub is_synced: bool,
    #[serde(default)]
    pub x_axis_val: XAxisValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_path: Option<String>,
    #[serde(default = "default_true")]
    pub show_x_axis_labels: bool,
    #[serde(default = "default_true")]
    pub show_y_axis_labels: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            min_x_value: None,
            max_x_value: None,
            min_y_value: None,
            max_y_value: None,
            following_view_width: None,
            is_synced: false,
            x_axis_val: XAxisValue::default(),
            x_axis_path: None,
            show_x_axis_labels: true,
            show_y_axis_labels: true,
        }
    }
}

/// Config validation result
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PlotConfig {
    pub fn from_json(json: &str) -> PlotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PlotResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Resolve `x_axis_val` and `x_axis_path` into a mode
    pub fn x_axis_mode(&self) -> PlotResult<XAxisMode> {
        let path = self
            .x_axis_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        match (self.x_axis_val, path) {
            (XAxisValue::Timestamp, _) => Ok(XAxisMode::Timestamp),
            (XAxisValue::Index, _) => Ok(XAxisMode::Index),
            (XAxisValue::Custom, Some(path)) => Ok(XAxisMode::Custom { path }),
            (XAxisValue::CurrentCustom, Some(path)) => Ok(XAxisMode::CurrentCustom { path }),
            (_, None) => Err(PlotError::InvalidConfig {
                message: "custom x axis requires an x axis path".to_string(),
                field: Some("xAxisPath".to_string()),
            }),
        }
    }

    /// Declared Y range; only returned when both ends are set and ordered
    pub fn declared_y_bounds(&self) -> Option<Bounds1D> {
        Bounds1D::new(self.min_y_value?, self.max_y_value?)
    }

    /// Substitute `$name` references with global variable values and trim expressions.
    /// Paths keep their position so series identity stays positional.
    pub fn normalized(&self, variables: &HashMap<String, serde_json::Value>) -> PlotConfig {
        let mut config = self.clone();
        for path in &mut config.paths {
            path.value = substitute_variables(path.value.trim(), variables);
        }
        if let Some(x_path) = config.x_axis_path.as_mut() {
            *x_path = substitute_variables(x_path.trim(), variables);
        }
        config
    }

    pub fn validate(&self) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(e) = self.x_axis_mode() {
            errors.push(e.to_string());
        }

        if let (Some(min), Some(max)) = (self.min_x_value, self.max_x_value) {
            if min > max {
                errors.push(format!("Invalid x range: min {min} > max {max}"));
            }
        }

        if let (Some(min), Some(max)) = (self.min_y_value, self.max_y_value) {
            if min > max {
                errors.push(format!("Invalid y range: min {min} > max {max}"));
            }
        }

        if let Some(width) = self.following_view_width {
            if !(width > 0.0) {
                errors.push(format!("Following view width must be positive, got {width}"));
            }
        }

        if !self.paths.is_empty() && self.paths.iter().all(|p| !p.enabled) {
            warnings.push("All paths are disabled".to_string());
        }

        for (index, path) in self.paths.iter().enumerate() {
            if path.value.trim().is_empty() {
                warnings.push(format!("Path {index} has an empty expression"));
            }
            if let Some(color) = &path.color {
                if parse_hex_color(color).is_none() {
                    warnings.push(format!("Path {index} has an unreadable color {color:?}"));
                }
            }
        }

        ConfigValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

fn substitute_variables(expr: &str, variables: &HashMap<String, serde_json::Value>) -> String {
    if !expr.contains('$') {
        return expr.to_string();
    }
    let mut out = String::with_capacity(expr.len());
    let mut chars = expr.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut end = start + 1;
        while let Some(&(i, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                end = i + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let name = &expr[start + 1..end];
        match variables.get(name) {
            Some(serde_json::Value::String(s)) => out.push_str(s),
            Some(value) if !name.is_empty() => out.push_str(&value.to_string()),
            _ => out.push_str(&expr[start..end]),
        }
    }
    out
}

/// Parse `#rrggbb` / `#rrggbbaa` into normalized RGBA
pub fn parse_hex_color(color: &str) -> Option<[f32; 4]> {
    let hex = color.strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some([
        channel(0)? as f32 / 255.0,
        channel(2)? as f32 / 255.0,
        channel(4)? as f32 / 255.0,
        alpha as f32 / 255.0,
    ])
}

/// UI color scheme
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    #[default]
    Dark,
}

impl ColorScheme {
    pub fn theme(&self) -> ThemeColors {
        match self {
            ColorScheme::Dark => ThemeColors {
                background: [0.075, 0.075, 0.098, 1.0],
                grid: [0.2, 0.2, 0.22, 1.0],
                axis: [0.55, 0.55, 0.6, 1.0],
                cursor: [0.9, 0.9, 0.9, 0.8],
                hover: [1.0, 0.8, 0.3, 0.9],
            },
            ColorScheme::Light => ThemeColors {
                background: [1.0, 1.0, 1.0, 1.0],
                grid: [0.88, 0.88, 0.9, 1.0],
                axis: [0.35, 0.35, 0.4, 1.0],
                cursor: [0.2, 0.2, 0.2, 0.8],
                hover: [0.85, 0.45, 0.0, 0.9],
            },
        }
    }
}

/// Colors the renderer needs that do not belong to a series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThemeColors {
    pub background: [f32; 4],
    pub grid: [f32; 4],
    pub axis: [f32; 4],
    pub cursor: [f32; 4],
    pub hover: [f32; 4],
}

impl Default for ThemeColors {
    fn default() -> Self {
        ColorScheme::default().theme()
    }
}

/// Engine tuning, independent of the persisted panel config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinatorOptions {
    /// Cap on live-tail samples kept per path
    pub max_streamed_samples: usize,
    /// Treat a forward playback jump larger than this as a seek
    pub seek_jump_threshold: Option<f64>,
    /// Hover tolerance radius in pixels
    pub hit_radius: f64,
    pub device_pixel_ratio: f64,
    /// Downsampling buckets per horizontal pixel
    pub buckets_per_pixel: f64,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            max_streamed_samples: 100_000,
            seek_jump_threshold: None,
            hit_radius: 8.0,
            device_pixel_ratio: 1.0,
            buckets_per_pixel: 1.0,
        }
    }
}
