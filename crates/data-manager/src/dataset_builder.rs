//! Turns stored samples and path definitions into render-ready datasets
//!
//! Building happens in two phases. `resolve` produces full-resolution series
//! and is cached until an input changes; `datasets` downsamples the cached
//! series for a given viewport and pixel width.

use std::sync::Arc;

use shared_types::{
    Bounds, Bounds1D, CsvDataset, DataPoint, Dataset, DatasetStyle, PlayerState, PlotPath,
    Sample, TimestampMethod, XAxisMode,
};

use crate::data_store::SeriesStore;
use crate::downsample::{downsample_indexed, downsample_timeseries};
use crate::transforms::TransformRegistry;

/// Upper limit on downsampling resolution
pub const MAX_BUCKETS_PER_PIXEL: f64 = 16.0;

/// One series at full resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSeries {
    /// Position of the path in the configured list
    pub series_index: usize,
    pub style: DatasetStyle,
    pub points: Vec<DataPoint>,
}

/// Output of one full resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedData {
    pub series: Vec<ResolvedSeries>,
    /// Observed range over finite points of every series
    pub bounds: Option<Bounds>,
    pub x_bounds: Option<Bounds1D>,
    pub y_bounds: Option<Bounds1D>,
    /// Paths whose sample count differs from the custom X path's
    pub mismatched_paths: Vec<String>,
}

/// Dataset builder state. Owned by the coordinator; never shared.
#[derive(Debug)]
pub struct DatasetBuilder {
    store: SeriesStore,
    paths: Vec<PlotPath>,
    x_axis: XAxisMode,
    transforms: TransformRegistry,
    start_time: f64,
    current_time: Option<f64>,
    resolved: Option<Arc<ResolvedData>>,
}

impl DatasetBuilder {
    pub fn new(max_streamed_samples: usize) -> Self {
        Self {
            store: SeriesStore::new(max_streamed_samples),
            paths: Vec::new(),
            x_axis: XAxisMode::Timestamp,
            transforms: TransformRegistry::new(),
            start_time: 0.0,
            current_time: None,
            resolved: None,
        }
    }

    pub fn paths(&self) -> &[PlotPath] {
        &self.paths
    }

    pub fn x_axis(&self) -> &XAxisMode {
        &self.x_axis
    }

    /// Replace path definitions. Returns whether they differ from before.
    pub fn set_paths(&mut self, paths: Vec<PlotPath>) -> bool {
        if self.paths == paths {
            return false;
        }
        for path in &paths {
            if let Some(transform) = &path.transform {
                if !self.transforms.supports(transform) {
                    log::warn!(
                        "[DatasetBuilder] Path {:?} uses unregistered transform {:?}",
                        path.value,
                        transform
                    );
                }
            }
        }
        self.paths = paths;
        self.invalidate();
        true
    }

    pub fn set_x_axis(&mut self, x_axis: XAxisMode) -> bool {
        if self.x_axis == x_axis {
            return false;
        }
        log::debug!("[DatasetBuilder] X axis mode now {x_axis:?}");
        self.x_axis = x_axis;
        self.invalidate();
        true
    }

    pub fn register_transform<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.transforms.register(name, function);
        self.invalidate();
    }

    /// Take in a player snapshot. Returns whether the datasets need rebuilding.
    pub fn handle_player_state(&mut self, state: &PlayerState) -> bool {
        let mut changed = self.store.ingest(state);
        if self.start_time != state.start_time {
            self.start_time = state.start_time;
            changed = true;
        }
        self.current_time = Some(state.current_time);
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Forget live-tail samples, e.g. after a seek
    pub fn clear_streamed(&mut self) {
        if self.store.clear_streamed() {
            self.invalidate();
        }
    }

    /// Playback position in X units; only meaningful on a timestamp axis
    pub fn current_x(&self) -> Option<f64> {
        match self.x_axis {
            XAxisMode::Timestamp => self.current_time.map(|t| t - self.start_time),
            _ => None,
        }
    }

    /// Latest observed x across all series
    pub fn latest_x(&mut self) -> Option<f64> {
        self.resolve()
            .series
            .iter()
            .filter_map(|s| s.points.iter().rev().find(|p| p.x.is_finite()).map(|p| p.x))
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x))))
    }

    fn invalidate(&mut self) {
        self.resolved = None;
    }

    /// Full-resolution series, cached until an input changes
    pub fn resolve(&mut self) -> Arc<ResolvedData> {
        if let Some(resolved) = &self.resolved {
            return Arc::clone(resolved);
        }
        let resolved = Arc::new(self.build());
        log::debug!(
            "[DatasetBuilder] Resolved {} series, mismatched: {:?}",
            resolved.series.len(),
            resolved.mismatched_paths
        );
        self.resolved = Some(Arc::clone(&resolved));
        resolved
    }

    /// Render-ready datasets for the given X viewport and pixel width
    pub fn datasets(
        &mut self,
        viewport: Option<Bounds1D>,
        pixel_width: u32,
        buckets_per_pixel: f64,
    ) -> Vec<Dataset> {
        let resolved = self.resolve();
        let bucket_count = bucket_budget(pixel_width, buckets_per_pixel);
        let sorted_x = matches!(self.x_axis, XAxisMode::Timestamp | XAxisMode::Index);

        resolved
            .series
            .iter()
            .map(|series| {
                let points = if sorted_x {
                    downsample_timeseries(&series.points, viewport, bucket_count)
                } else {
                    downsample_indexed(&series.points, bucket_count.saturating_mul(2))
                };
                Dataset {
                    series_index: series.series_index,
                    style: series.style.clone(),
                    points,
                }
            })
            .collect()
    }

    /// Full-resolution export, one entry per enabled series
    pub fn csv_datasets(&mut self) -> Vec<CsvDataset> {
        self.resolve()
            .series
            .iter()
            .map(|series| CsvDataset {
                label: series.style.label.clone(),
                points: series.points.clone(),
            })
            .collect()
    }

    /// Latest value of each configured path at the playback position,
    /// positionally aligned with the path list
    pub fn current_values(&mut self) -> Vec<Option<f64>> {
        let resolved = self.resolve();
        let current_x = self.current_x();
        let mut values = vec![None; self.paths.len()];
        for series in &resolved.series {
            let upto = match current_x {
                Some(x) => series.points.partition_point(|p| p.x <= x),
                None => series.points.len(),
            };
            values[series.series_index] = upto
                .checked_sub(1)
                .map(|i| series.points[i].y)
                .filter(|y| y.is_finite());
        }
        values
    }

    fn build(&self) -> ResolvedData {
        let mut data = ResolvedData::default();

        let x_values: Option<Vec<f64>> = match &self.x_axis {
            XAxisMode::Custom { path } | XAxisMode::CurrentCustom { path } => Some(
                self.store
                    .samples(path)
                    .iter()
                    .map(|s| s.value)
                    .collect(),
            ),
            _ => None,
        };

        for (index, path) in self.paths.iter().enumerate() {
            if !path.enabled || path.value.is_empty() {
                continue;
            }

            let samples = self.store.samples(&path.value);
            let (times, mut values) = split_samples(&samples, path.timestamp_method);
            if let Some(transform) = &path.transform {
                self.transforms.apply(transform, &times, &mut values);
            }

            let points = match &self.x_axis {
                XAxisMode::Timestamp => {
                    let mut points: Vec<DataPoint> = times
                        .iter()
                        .zip(&values)
                        .map(|(t, v)| DataPoint::new(t - self.start_time, *v))
                        .collect();
                    if points.windows(2).any(|w| w[1].x < w[0].x) {
                        points.sort_by(|a, b| a.x.total_cmp(&b.x));
                    }
                    points
                }
                XAxisMode::Index => values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| DataPoint::new(i as f64, *v))
                    .collect(),
                XAxisMode::Custom { .. } => {
                    let xs = x_values.as_deref().unwrap_or_default();
                    if xs.len() != values.len() {
                        data.mismatched_paths.push(path.value.clone());
                    }
                    xs.iter()
                        .zip(&values)
                        .map(|(x, y)| DataPoint::new(*x, *y))
                        .collect()
                }
                XAxisMode::CurrentCustom { .. } => {
                    let latest_x = x_values.as_deref().and_then(|xs| xs.last());
                    match (latest_x, values.last()) {
                        (Some(x), Some(y)) => vec![DataPoint::new(*x, *y)],
                        _ => Vec::new(),
                    }
                }
            };

            data.series.push(ResolvedSeries {
                series_index: index,
                style: DatasetStyle {
                    label: path.display_label().to_string(),
                    color: path.line_color(index),
                    line_width: path.line_size.unwrap_or(1.0),
                    show_line: path.show_line,
                },
                points,
            });
        }

        let finite: Vec<DataPoint> = data
            .series
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .filter(DataPoint::is_finite)
            .collect();
        data.x_bounds = Bounds1D::from_values(finite.iter().map(|p| p.x));
        data.y_bounds = Bounds1D::from_values(finite.iter().map(|p| p.y));
        data.bounds = data
            .x_bounds
            .zip(data.y_bounds)
            .map(|(x, y)| Bounds::new(x, y));
        data
    }
}

/// Split samples into (time, value) columns, dropping samples that lack the
/// requested timestamp
fn split_samples(samples: &[Sample], method: TimestampMethod) -> (Vec<f64>, Vec<f64>) {
    samples
        .iter()
        .filter_map(|s| {
            let time = match method {
                TimestampMethod::ReceiveTime => Some(s.receive_time),
                TimestampMethod::HeaderStamp => s.header_time,
            };
            time.map(|t| (t, s.value))
        })
        .unzip()
}

/// Buckets for one viewport width. Unusable ratios fall back to one per
/// pixel; large ones are capped at [`MAX_BUCKETS_PER_PIXEL`].
fn bucket_budget(pixel_width: u32, buckets_per_pixel: f64) -> usize {
    let per_pixel = if buckets_per_pixel.is_finite() && buckets_per_pixel > 0.0 {
        buckets_per_pixel.min(MAX_BUCKETS_PER_PIXEL)
    } else {
        1.0
    };
    (f64::from(pixel_width) * per_pixel).ceil() as usize
}
