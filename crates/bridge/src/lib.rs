//! Plot engine bridge
//!
//! Connects the host UI to the renderer: the [`PlotCoordinator`] owns panel
//! state and decides what to draw, the [`RendererBridge`] runs the renderer
//! on its own worker thread and carries calls to it.

pub mod controls;
pub mod events;
pub mod plot_coordinator;
pub mod renderer_bridge;
pub mod viewport;

pub use controls::{InteractionBounds, InteractionController};
pub use events::{EventChannel, PlotEvents, Subscription};
pub use plot_coordinator::{PlotCoordinator, RendererStatus};
pub use renderer_bridge::{RendererBridge, RendererFactory};
pub use viewport::{config_x_bounds, config_y_bounds, BoundsSource, XBoundsSources};

// Re-export the pieces hosts need to drive a coordinator
pub use renderer::{ChannelSurface, ChartRenderer, FrameBuffer, NullSurface, RenderSurface};
pub use shared_types;
