//! Viewport ranges and the realized pixel scale
//!
//! An absent range is always `None`; a `Bounds1D` is never NaN or inverted.

use serde::{Deserialize, Serialize};

/// Closed numeric interval with `min <= max` and finite ends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds1D {
    pub min: f64,
    pub max: f64,
}

impl Bounds1D {
    /// Create a range, rejecting non-finite or inverted input
    pub fn new(min: f64, max: f64) -> Option<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return None;
        }
        Some(Self { min, max })
    }

    /// Create a range from two ends in any order
    pub fn spanning(a: f64, b: f64) -> Option<Self> {
        if a <= b {
            Self::new(a, b)
        } else {
            Self::new(b, a)
        }
    }

    /// Smallest range holding every finite value; non-finite values are skipped
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(b) => Some(b.including(v)),
            })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Expand to include a value; non-finite values leave the range untouched
    pub fn including(self, value: f64) -> Self {
        if !value.is_finite() {
            return self;
        }
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Union of two optional ranges
    pub fn union_opt(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Shift both ends by `delta`
    pub fn shifted(self, delta: f64) -> Option<Self> {
        Self::new(self.min + delta, self.max + delta)
    }

    /// Scale the span by `1 / factor` keeping `anchor` at the same relative position.
    /// A factor above 1.0 zooms in.
    pub fn zoomed(self, factor: f64, anchor: f64) -> Option<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return None;
        }
        let min = anchor - (anchor - self.min) / factor;
        let max = anchor + (self.max - anchor) / factor;
        Self::new(min, max)
    }

    /// Widen a zero-width range so it can be mapped onto pixels.
    /// Flat ranges get padding proportional to their magnitude.
    pub fn with_min_span(self) -> Self {
        if self.span() > 0.0 {
            return self;
        }
        let magnitude = self.min.abs();
        let half = if magnitude > 0.0 { magnitude * 0.05 } else { 0.5 };
        Self {
            min: self.min - half,
            max: self.max + half,
        }
    }

    /// Add `frac` of the span on both sides
    pub fn padded(self, frac: f64) -> Self {
        let pad = self.span() * frac;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }
}

/// Two-dimensional bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub x: Bounds1D,
    pub y: Bounds1D,
}

impl Bounds {
    pub fn new(x: Bounds1D, y: Bounds1D) -> Self {
        Self { x, y }
    }
}

/// Canvas size in logical pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Linear mapping between one data axis and its pixel range.
///
/// `pixel_min` is where `min` lands; for a Y axis it is the bottom edge, so
/// `pixel_min > pixel_max` there.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AxisScale {
    pub min: f64,
    pub max: f64,
    pub pixel_min: f64,
    pub pixel_max: f64,
}

impl AxisScale {
    pub fn value_to_pixel(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return self.pixel_min;
        }
        self.pixel_min + (value - self.min) / span * (self.pixel_max - self.pixel_min)
    }

    pub fn pixel_to_value(&self, pixel: f64) -> f64 {
        let pixel_span = self.pixel_max - self.pixel_min;
        if pixel_span == 0.0 {
            return self.min;
        }
        self.min + (pixel - self.pixel_min) / pixel_span * (self.max - self.min)
    }

    /// Data-space size of one pixel
    pub fn value_per_pixel(&self) -> f64 {
        let pixel_span = (self.pixel_max - self.pixel_min).abs();
        if pixel_span == 0.0 {
            return 0.0;
        }
        (self.max - self.min) / pixel_span
    }

    pub fn bounds(&self) -> Option<Bounds1D> {
        Bounds1D::new(self.min, self.max)
    }

    /// Pixel extent, smaller end first
    pub fn pixel_range(&self) -> (f64, f64) {
        if self.pixel_min <= self.pixel_max {
            (self.pixel_min, self.pixel_max)
        } else {
            (self.pixel_max, self.pixel_min)
        }
    }
}

/// Realized layout produced by the renderer after drawing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Scale {
    pub x: AxisScale,
    pub y: AxisScale,
}

impl Scale {
    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds::new(self.x.bounds()?, self.y.bounds()?))
    }
}
