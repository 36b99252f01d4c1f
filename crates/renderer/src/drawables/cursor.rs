use shared_types::Scale;

use crate::frame::FrameBuffer;

/// Full-height vertical line at `x`, skipped when `x` is outside the X range
pub fn draw_vertical_marker(frame: &mut FrameBuffer, scale: &Scale, x: f64, dpr: f64, color: [f32; 4]) {
    let inside = scale.x.bounds().is_some_and(|b| b.contains(x));
    if !inside {
        return;
    }
    let (top, bottom) = scale.y.pixel_range();
    let px = scale.x.value_to_pixel(x) * dpr;
    frame.vline(px, top * dpr, bottom * dpr, dpr, color);
}
