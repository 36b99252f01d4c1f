//! Pan, wheel zoom and drag-box zoom applied to the realized scale

use shared_types::{Bounds1D, InteractionEvent, PixelPosition, Scale, ZoomMode};

/// Drags shorter than this many pixels are treated as clicks
pub const MIN_DRAG_PIXELS: f64 = 2.0;

/// User-driven viewport overrides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionBounds {
    pub x: Option<Bounds1D>,
    pub y: Option<Bounds1D>,
}

impl InteractionBounds {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

/// Turns interaction events into viewport overrides
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    zoom_mode: ZoomMode,
    bounds: InteractionBounds,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_mode(&self) -> ZoomMode {
        self.zoom_mode
    }

    pub fn set_zoom_mode(&mut self, zoom_mode: ZoomMode) {
        self.zoom_mode = zoom_mode;
    }

    pub fn bounds(&self) -> InteractionBounds {
        self.bounds
    }

    /// Forget all overrides. Returns whether anything was overridden.
    pub fn reset(&mut self) -> bool {
        let had_bounds = !self.bounds.is_empty();
        self.bounds = InteractionBounds::default();
        had_bounds
    }

    /// Apply one event against the scale the renderer last realized.
    /// Returns whether the overrides changed.
    pub fn handle_event(&mut self, event: &InteractionEvent, scale: &Scale) -> bool {
        let next = match *event {
            InteractionEvent::Pan { delta_x, delta_y } => self.apply_pan(delta_x, delta_y, scale),
            InteractionEvent::Zoom { factor, center } => self.apply_zoom(factor, center, scale),
            InteractionEvent::Drag { start, end } => self.apply_drag_zoom(start, end, scale),
        };
        if next == self.bounds {
            return false;
        }
        log::debug!("[InteractionController] {:?} -> {:?}", event, next);
        self.bounds = next;
        true
    }

    fn apply_pan(&self, delta_x: f64, delta_y: f64, scale: &Scale) -> InteractionBounds {
        let mut next = self.bounds;
        if self.zoom_mode.affects_x() && delta_x.is_finite() && delta_x != 0.0 {
            // Content follows the pointer, so the window moves the other way
            let shift = -delta_x * scale.x.value_per_pixel();
            if let Some(x) = scale.x.bounds().and_then(|b| b.shifted(shift)) {
                next.x = Some(x);
            }
        }
        if self.zoom_mode.affects_y() && delta_y.is_finite() && delta_y != 0.0 {
            // Pixel Y grows downwards while values grow upwards
            let shift = delta_y * scale.y.value_per_pixel();
            if let Some(y) = scale.y.bounds().and_then(|b| b.shifted(shift)) {
                next.y = Some(y);
            }
        }
        next
    }

    fn apply_zoom(&self, factor: f64, center: PixelPosition, scale: &Scale) -> InteractionBounds {
        let mut next = self.bounds;
        if !factor.is_finite() || factor <= 0.0 || factor == 1.0 {
            return next;
        }
        if self.zoom_mode.affects_x() {
            let anchor = scale.x.pixel_to_value(center.x);
            if let Some(x) = scale.x.bounds().and_then(|b| b.zoomed(factor, anchor)) {
                next.x = Some(x);
            }
        }
        if self.zoom_mode.affects_y() {
            let anchor = scale.y.pixel_to_value(center.y);
            if let Some(y) = scale.y.bounds().and_then(|b| b.zoomed(factor, anchor)) {
                next.y = Some(y);
            }
        }
        next
    }

    fn apply_drag_zoom(
        &self,
        start: PixelPosition,
        end: PixelPosition,
        scale: &Scale,
    ) -> InteractionBounds {
        let mut next = self.bounds;
        if self.zoom_mode.affects_x() && (end.x - start.x).abs() >= MIN_DRAG_PIXELS {
            if let Some(x) = Bounds1D::spanning(
                scale.x.pixel_to_value(start.x),
                scale.x.pixel_to_value(end.x),
            ) {
                next.x = Some(x);
            }
        }
        if self.zoom_mode.affects_y() && (end.y - start.y).abs() >= MIN_DRAG_PIXELS {
            if let Some(y) = Bounds1D::spanning(
                scale.y.pixel_to_value(start.y),
                scale.y.pixel_to_value(end.y),
            ) {
                next.y = Some(y);
            }
        }
        next
    }
}
