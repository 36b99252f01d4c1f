//! Pointer interaction and hover types exchanged with the renderer

use serde::{Deserialize, Serialize};

use crate::data_types::DataPoint;

/// Position on the canvas in logical pixels, origin at the top-left corner
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

impl PixelPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PixelPosition) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axes a pan/zoom is allowed to change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoomMode {
    #[default]
    X,
    Y,
    Xy,
}

impl ZoomMode {
    pub fn affects_x(&self) -> bool {
        matches!(self, ZoomMode::X | ZoomMode::Xy)
    }

    pub fn affects_y(&self) -> bool {
        matches!(self, ZoomMode::Y | ZoomMode::Xy)
    }
}

/// One user interaction, expressed against the current canvas
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InteractionEvent {
    /// Drag the view by a pixel delta
    Pan { delta_x: f64, delta_y: f64 },
    /// Wheel/pinch zoom; `factor > 1.0` zooms in around `center`
    Zoom { factor: f64, center: PixelPosition },
    /// Box zoom to the dragged pixel rectangle
    Drag {
        start: PixelPosition,
        end: PixelPosition,
    },
}

/// A rendered point found under a pixel
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoverElement {
    /// Index of the series in the configured path list
    pub series_index: usize,
    /// Index of the point inside the drawn dataset
    pub point_index: usize,
    pub position: PixelPosition,
    pub data: DataPoint,
}
