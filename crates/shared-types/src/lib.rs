//! Shared types for the plot engine
//!
//! This crate contains all types that are shared between the data-manager,
//! renderer, and bridge crates: viewport bounds and scales, update actions,
//! interaction events, datasets, configuration and errors.

pub mod bounds;
pub mod chart_config;
pub mod data_types;
pub mod errors;
pub mod events;
pub mod update_action;

pub use bounds::{AxisScale, Bounds, Bounds1D, Scale, Size};
pub use chart_config::{
    parse_hex_color, ColorScheme, ConfigValidationResult, CoordinatorOptions, PlotConfig,
    PlotPath, ThemeColors, TimestampMethod, Transform, XAxisMode, XAxisValue, SERIES_PALETTE,
};
pub use data_types::{Block, CsvDataset, DataPoint, Dataset, DatasetStyle, PlayerState, Sample};
pub use errors::{PlotError, PlotResult};
pub use events::{HoverElement, InteractionEvent, PixelPosition, ZoomMode};
pub use update_action::{DataUpdate, UpdateAction, ViewUpdate};
