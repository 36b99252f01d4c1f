//! CPU frame buffer and the drawing primitives the drawables build on

/// RGBA8 pixels in row-major order, top row first
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 4]>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 0]; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        let rgba = to_rgba8(color);
        self.pixels.iter_mut().for_each(|p| *p = rgba);
    }

    /// Source-over blend of one pixel; out-of-range coordinates are ignored
    pub fn blend(&mut self, x: i64, y: i64, color: [f32; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        let Some(dst) = self.pixels.get_mut(index) else {
            return;
        };
        let alpha = color[3].clamp(0.0, 1.0);
        for channel in 0..3 {
            let src = color[channel].clamp(0.0, 1.0) * 255.0;
            let mixed = src * alpha + dst[channel] as f32 * (1.0 - alpha);
            dst[channel] = mixed.round() as u8;
        }
        let dst_alpha = dst[3] as f32 / 255.0;
        dst[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
    }

    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: [f32; 4]) {
        let (left, right) = (x0.min(x1).floor() as i64, x0.max(x1).ceil() as i64);
        let (top, bottom) = (y0.min(y1).floor() as i64, y0.max(y1).ceil() as i64);
        let left = left.max(0);
        let top = top.max(0);
        let right = right.min(self.width as i64);
        let bottom = bottom.min(self.height as i64);
        for y in top..bottom {
            for x in left..right {
                self.blend(x, y, color);
            }
        }
    }

    pub fn vline(&mut self, x: f64, top: f64, bottom: f64, width: f64, color: [f32; 4]) {
        let half = (width * 0.5).max(0.5);
        self.fill_rect(x - half, top, x + half, bottom, color);
    }

    pub fn hline(&mut self, y: f64, left: f64, right: f64, width: f64, color: [f32; 4]) {
        let half = (width * 0.5).max(0.5);
        self.fill_rect(left, y - half, right, y + half, color);
    }

    /// Thick line segment, clipped to the buffer first
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: [f32; 4]) {
        let pad = width.max(1.0);
        let clip = (
            -pad,
            -pad,
            self.width as f64 + pad,
            self.height as f64 + pad,
        );
        let Some(((x0, y0), (x1, y1))) = clip_segment(from, to, clip) else {
            return;
        };

        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        let half = (width * 0.5).max(0.5);
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.stamp(x, y, half, color);
        }
    }

    fn stamp(&mut self, x: f64, y: f64, half: f64, color: [f32; 4]) {
        let left = (x - half).round() as i64;
        let right = (x + half).round() as i64;
        let top = (y - half).round() as i64;
        let bottom = (y + half).round() as i64;
        for py in top..bottom.max(top + 1) {
            for px in left..right.max(left + 1) {
                self.set_opaque_or_blend(px, py, color);
            }
        }
    }

    fn set_opaque_or_blend(&mut self, x: i64, y: i64, color: [f32; 4]) {
        if color[3] >= 1.0 {
            if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                return;
            }
            let index = y as usize * self.width as usize + x as usize;
            if let Some(dst) = self.pixels.get_mut(index) {
                *dst = to_rgba8(color);
            }
        } else {
            self.blend(x, y, color);
        }
    }
}

pub fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Liang-Barsky clip of a segment against `(left, top, right, bottom)`
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (left, top, right, bottom): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if !(from.0.is_finite() && from.1.is_finite() && to.0.is_finite() && to.1.is_finite()) {
        return None;
    }
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, from.0 - left),
        (dx, right - from.0),
        (-dy, from.1 - top),
        (dy, bottom - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}
