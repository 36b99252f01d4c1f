//! Viewport-aware downsampling that keeps per-bucket extremes
//!
//! Each horizontal bucket keeps its first, minimum, maximum and last point,
//! so spikes survive no matter how many samples fall into one pixel. NaN
//! values split buckets and are passed through to keep gaps visible.

use shared_types::{Bounds1D, DataPoint};

/// Downsample points whose x values are non-decreasing.
///
/// Only points inside `view` (plus one on each side, so lines reach the
/// edges) are kept. `view` defaults to the data's own x range. A
/// `bucket_count` of zero, or data that already fits the budget, is
/// returned unchanged.
pub fn downsample_timeseries(
    points: &[DataPoint],
    view: Option<Bounds1D>,
    bucket_count: usize,
) -> Vec<DataPoint> {
    if bucket_count == 0 || points.len() <= bucket_count.saturating_mul(4) {
        return points.to_vec();
    }

    let Some(view) = view.or_else(|| Bounds1D::from_values(points.iter().map(|p| p.x))) else {
        return points.to_vec();
    };

    let first_inside = points.partition_point(|p| p.x < view.min);
    let after_inside = points.partition_point(|p| p.x <= view.max);
    let start = first_inside.saturating_sub(1);
    let end = (after_inside + 1).min(points.len());
    if start >= end {
        return Vec::new();
    }

    let span = view.span();
    if span <= 0.0 {
        return points[start..end].to_vec();
    }
    let bucket_width = span / bucket_count as f64;
    let bucket_of = |x: f64| -> i64 {
        let raw = ((x - view.min) / bucket_width).floor();
        raw.clamp(-1.0, bucket_count as f64) as i64
    };

    let mut out = Vec::with_capacity(bucket_count * 4 + 2);
    let mut bucket = Bucket::default();
    for (index, point) in points.iter().enumerate().take(end).skip(start) {
        if !point.y.is_finite() {
            bucket.flush(points, &mut out);
            out.push(*point);
            continue;
        }
        let id = bucket_of(point.x);
        if bucket.id != Some(id) {
            bucket.flush(points, &mut out);
            bucket.id = Some(id);
        }
        bucket.add(index, point.y);
    }
    bucket.flush(points, &mut out);

    log::trace!(
        "[Downsample] {} -> {} points over {} buckets",
        end - start,
        out.len(),
        bucket_count
    );
    out
}

/// Downsample points in position order, for series whose x values may move
/// in any direction. Keeps the min and max point of each run of
/// `points.len() / (max_points / 2)` positions.
pub fn downsample_indexed(points: &[DataPoint], max_points: usize) -> Vec<DataPoint> {
    if max_points < 2 || points.len() <= max_points {
        return points.to_vec();
    }

    let chunk = points.len().div_ceil(max_points / 2);
    let mut out = Vec::with_capacity(max_points + 2);
    for (chunk_index, run) in points.chunks(chunk).enumerate() {
        let offset = chunk_index * chunk;
        let mut bucket = Bucket::default();
        for (i, point) in run.iter().enumerate() {
            if !point.y.is_finite() {
                bucket.flush_extremes(points, &mut out);
                out.push(*point);
                continue;
            }
            bucket.add(offset + i, point.y);
        }
        bucket.flush_extremes(points, &mut out);
    }
    out
}

#[derive(Debug, Default)]
struct Bucket {
    id: Option<i64>,
    first: Option<usize>,
    last: usize,
    min: (usize, f64),
    max: (usize, f64),
}

impl Bucket {
    fn add(&mut self, index: usize, y: f64) {
        if self.first.is_none() {
            self.first = Some(index);
            self.min = (index, y);
            self.max = (index, y);
        } else {
            if y < self.min.1 {
                self.min = (index, y);
            }
            if y > self.max.1 {
                self.max = (index, y);
            }
        }
        self.last = index;
    }

    fn flush(&mut self, points: &[DataPoint], out: &mut Vec<DataPoint>) {
        if let Some(first) = self.first {
            let mut indices = [first, self.min.0, self.max.0, self.last];
            indices.sort_unstable();
            push_unique(points, &indices, out);
        }
        self.reset();
    }

    fn flush_extremes(&mut self, points: &[DataPoint], out: &mut Vec<DataPoint>) {
        if self.first.is_some() {
            let mut indices = [self.min.0, self.max.0];
            indices.sort_unstable();
            push_unique(points, &indices, out);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.first = None;
        self.id = None;
    }
}

fn push_unique(points: &[DataPoint], sorted: &[usize], out: &mut Vec<DataPoint>) {
    let mut previous = None;
    for &index in sorted {
        if previous != Some(index) {
            out.push(points[index]);
            previous = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<DataPoint> {
        (0..n).map(|i| DataPoint::new(i as f64, (i % 7) as f64)).collect()
    }

    #[test]
    fn test_small_input_is_untouched() {
        let points = ramp(10);
        assert_eq!(downsample_timeseries(&points, None, 100), points);
        assert_eq!(downsample_timeseries(&points, None, 0), points);
        assert_eq!(downsample_indexed(&points, 100), points);
    }

    #[test]
    fn test_huge_budget_keeps_everything() {
        let points = ramp(50);
        assert_eq!(downsample_timeseries(&points, None, usize::MAX), points);
        assert_eq!(downsample_indexed(&points, usize::MAX), points);
    }

    #[test]
    fn test_output_is_bounded_and_ordered() {
        let points = ramp(100_000);
        let out = downsample_timeseries(&points, None, 200);
        assert!(out.len() <= 200 * 4 + 2);
        assert!(out.windows(2).all(|w| w[0].x <= w[1].x));
        assert_eq!(out.first(), points.first());
        assert_eq!(out.last(), points.last());
    }

    #[test]
    fn test_view_clips_with_one_point_margin() {
        let points = ramp(10_000);
        let view = Bounds1D::new(1000.0, 2000.0);
        let out = downsample_timeseries(&points, view, 10);
        assert_eq!(out.first().map(|p| p.x), Some(999.0));
        assert_eq!(out.last().map(|p| p.x), Some(2001.0));
    }

    #[test]
    fn test_nan_gap_survives() {
        let mut points = ramp(10_000);
        points[5000].y = f64::NAN;
        let out = downsample_timeseries(&points, None, 10);
        assert!(out.iter().any(|p| p.x == 5000.0 && p.y.is_nan()));
    }

    #[test]
    fn test_indexed_keeps_extremes() {
        let mut points: Vec<DataPoint> = (0..1000)
            .map(|i| DataPoint::new(((i * 37) % 100) as f64, 0.0))
            .collect();
        points[421].y = 50.0;
        points[422].y = -50.0;
        let out = downsample_indexed(&points, 20);
        assert!(out.len() <= 22);
        assert!(out.iter().any(|p| p.y == 50.0));
        assert!(out.iter().any(|p| p.y == -50.0));
    }
}
