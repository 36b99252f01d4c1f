//! Data Manager crate for the plot engine
//! Turns player snapshots and path definitions into render-ready datasets

pub mod data_store;
pub mod dataset_builder;
pub mod downsample;
pub mod transforms;

pub use data_store::SeriesStore;
pub use dataset_builder::{DatasetBuilder, ResolvedData, ResolvedSeries, MAX_BUCKETS_PER_PIXEL};
pub use downsample::{downsample_indexed, downsample_timeseries};
pub use transforms::{ScalarFn, TransformRegistry};
