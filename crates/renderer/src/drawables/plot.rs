//! Series drawing

use shared_types::{Dataset, Scale};

use crate::frame::FrameBuffer;

/// Draw one dataset. Consecutive finite points are joined when the series
/// shows a line; a non-finite point breaks the line. Points without a
/// neighbour to join, and every point of a marker-only series, get a square.
pub fn draw_dataset(frame: &mut FrameBuffer, dataset: &Dataset, scale: &Scale, dpr: f64) {
    let style = &dataset.style;
    let width = (style.line_width as f64).max(0.5) * dpr;
    let marker = (width * 1.5).max(3.0 * dpr) * 0.5;

    let to_pixel = |x: f64, y: f64| {
        (
            scale.x.value_to_pixel(x) * dpr,
            scale.y.value_to_pixel(y) * dpr,
        )
    };

    let points = &dataset.points;
    let mut previous: Option<(f64, f64)> = None;
    for (i, point) in points.iter().enumerate() {
        if !point.is_finite() {
            previous = None;
            continue;
        }
        let current = to_pixel(point.x, point.y);

        if style.show_line {
            match previous {
                Some(from) => frame.line(from, current, width, style.color),
                None => {
                    let next_joins = points.get(i + 1).is_some_and(|p| p.is_finite());
                    if !next_joins {
                        square(frame, current, marker, style.color);
                    }
                }
            }
        } else {
            square(frame, current, marker, style.color);
        }
        previous = Some(current);
    }
}

fn square(frame: &mut FrameBuffer, (x, y): (f64, f64), half: f64, color: [f32; 4]) {
    frame.fill_rect(x - half, y - half, x + half, y + half, color);
}
