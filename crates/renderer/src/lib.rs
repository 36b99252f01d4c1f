//! Chart renderer for the plot engine
//!
//! The renderer runs in the worker context and is the single owner of the
//! rendering surface. It only ever answers calls; it never initiates any.

use shared_types::{Bounds, Dataset, HoverElement, PixelPosition, PlotResult, Scale, ThemeColors, UpdateAction};

pub mod calcables;
pub mod drawables;
pub mod frame;
pub mod raster_renderer;
pub mod surface;

pub use frame::FrameBuffer;
pub use raster_renderer::{PlotArea, RasterRenderer, DEFAULT_HIT_RADIUS};
pub use surface::{ChannelSurface, NullSurface, RenderSurface};

/// Contract between the bridge and whatever draws the plot
pub trait ChartRenderer {
    /// One-time setup; takes exclusive ownership of the surface
    fn init(
        &mut self,
        surface: Box<dyn RenderSurface>,
        device_pixel_ratio: f64,
        theme: ThemeColors,
    ) -> PlotResult<()>;

    /// Apply one update action. Returns the resulting bounds, or `None` when
    /// the action does not affect them.
    fn update(&mut self, action: UpdateAction) -> PlotResult<Option<Bounds>>;

    /// Elements under `pixel`, nearest first; empty when nothing is in reach
    fn get_elements_at_pixel(&self, pixel: PixelPosition) -> Vec<HoverElement>;

    /// Replace every drawn series. Returns the realized scale, `None` before
    /// the canvas has a size.
    fn update_datasets(&mut self, datasets: Vec<Dataset>) -> PlotResult<Option<Scale>>;
}
