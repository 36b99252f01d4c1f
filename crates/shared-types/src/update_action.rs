//! The tagged update sent with every renderer `update` call

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, Bounds1D, Size};
use crate::chart_config::ThemeColors;
use crate::events::ZoomMode;

/// Full view state. Every view update carries all of it, so the renderer
/// never has to remember which part was sent last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewUpdate {
    pub size: Size,
    /// Effective X viewport; `None` means fit to the data
    pub x_bounds: Option<Bounds1D>,
    /// Effective Y viewport; `None` means fit to the visible data
    pub y_bounds: Option<Bounds1D>,
    pub zoom_mode: ZoomMode,
    pub theme: ThemeColors,
    /// Synchronized hover position in data space
    pub hover_x: Option<f64>,
    pub show_x_axis_labels: bool,
    pub show_y_axis_labels: bool,
}

/// Sent before new datasets so the renderer can fit unbounded axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataUpdate {
    /// Observed range of the full-resolution data
    pub data_bounds: Option<Bounds>,
    /// Playback position in X units, drawn as a cursor
    pub current_x: Option<f64>,
}

/// Exactly one of these goes out per renderer `update` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum UpdateAction {
    /// Size, zoom mode, viewport or interaction changed
    View(ViewUpdate),
    /// New data is about to be drawn
    Data(DataUpdate),
    /// Playback jumped; transient render state must reset
    Seek,
}

impl UpdateAction {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateAction::View(_) => "view",
            UpdateAction::Data(_) => "data",
            UpdateAction::Seek => "seek",
        }
    }
}
