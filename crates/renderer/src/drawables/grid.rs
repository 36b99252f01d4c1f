//! Grid lines, axis lines and tick marks

use shared_types::{AxisScale, Bounds1D, Scale, ThemeColors};

use crate::frame::FrameBuffer;

/// Minimum logical pixel spacing between grid lines
pub const MIN_GRID_SPACING: f64 = 60.0;

const TICK_LENGTH: f64 = 4.0;

/// Calculates a "nice" axis interval given a min and max value.
/// Returns `(interval, start, end)` with start and end snapped to the interval.
pub fn calculate_axis_interval(min: f64, max: f64, target_intervals: f64) -> (f64, f64, f64) {
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return (1.0, min.floor(), min.ceil() + 1.0);
    }

    let raw_interval = range / target_intervals.max(1.0);
    let exponent = raw_interval.log10().floor();
    let base = 10f64.powf(exponent);
    let fraction = raw_interval / base;

    let nice_fraction = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };

    let interval = nice_fraction * base;
    let start = (min / interval).floor() * interval;
    let end = (max / interval).ceil() * interval;
    (interval, start, end)
}

/// Tick values inside `bounds` for an axis `pixel_length` logical pixels long
pub fn grid_ticks(bounds: Bounds1D, pixel_length: f64) -> Vec<f64> {
    let target = (pixel_length / MIN_GRID_SPACING).floor().max(2.0);
    let (interval, start, end) = calculate_axis_interval(bounds.min, bounds.max, target);
    if interval <= 0.0 {
        return Vec::new();
    }
    let count = ((end - start) / interval).round() as i64;
    (0..=count.clamp(0, 1000))
        .map(|i| start + i as f64 * interval)
        .filter(|v| bounds.contains(*v))
        .collect()
}

/// Draw grid lines over the plot area.
/// Coordinates in `scale` are logical pixels; `dpr` converts to frame pixels.
pub fn draw_grid(frame: &mut FrameBuffer, scale: &Scale, dpr: f64, theme: &ThemeColors) {
    let (left, right) = scale.x.pixel_range();
    let (top, bottom) = scale.y.pixel_range();

    for x in axis_ticks(&scale.x) {
        let px = scale.x.value_to_pixel(x) * dpr;
        frame.vline(px, top * dpr, bottom * dpr, dpr, theme.grid);
    }
    for y in axis_ticks(&scale.y) {
        let py = scale.y.value_to_pixel(y) * dpr;
        frame.hline(py, left * dpr, right * dpr, dpr, theme.grid);
    }
}

/// Draw the axis lines along the plot edges, with tick marks in the label
/// gutters that are shown
pub fn draw_axes(
    frame: &mut FrameBuffer,
    scale: &Scale,
    dpr: f64,
    theme: &ThemeColors,
    show_x_labels: bool,
    show_y_labels: bool,
) {
    let (left, right) = scale.x.pixel_range();
    let (top, bottom) = scale.y.pixel_range();

    if show_x_labels {
        for x in axis_ticks(&scale.x) {
            let px = scale.x.value_to_pixel(x) * dpr;
            frame.vline(px, bottom * dpr, (bottom + TICK_LENGTH) * dpr, dpr, theme.axis);
        }
    }
    if show_y_labels {
        for y in axis_ticks(&scale.y) {
            let py = scale.y.value_to_pixel(y) * dpr;
            frame.hline(py, (left - TICK_LENGTH) * dpr, left * dpr, dpr, theme.axis);
        }
    }

    frame.vline(left * dpr, top * dpr, bottom * dpr, dpr, theme.axis);
    frame.hline(bottom * dpr, left * dpr, right * dpr, dpr, theme.axis);
}

fn axis_ticks(axis: &AxisScale) -> Vec<f64> {
    let (low, high) = axis.pixel_range();
    match axis.bounds() {
        Some(bounds) => grid_ticks(bounds, high - low),
        None => Vec::new(),
    }
}
