pub mod cursor;
pub mod grid;
pub mod plot;

pub use cursor::draw_vertical_marker;
pub use grid::{calculate_axis_interval, draw_axes, draw_grid, grid_ticks, MIN_GRID_SPACING};
pub use plot::draw_dataset;
