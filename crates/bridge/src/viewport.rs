//! Effective viewport bounds
//!
//! X precedence, highest first: interaction, global (only while synced),
//! config, observed dataset range. Y has no global or dataset layer; when
//! neither interaction nor config set it, the renderer fits the visible data.

use shared_types::{Bounds1D, PlotConfig};

/// Which layer produced the effective X range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsSource {
    Interaction,
    Global,
    Config,
    Dataset,
}

/// Every candidate X range at one moment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct XBoundsSources {
    pub interaction: Option<Bounds1D>,
    pub global: Option<Bounds1D>,
    pub should_sync: bool,
    pub config: Option<Bounds1D>,
    pub dataset: Option<Bounds1D>,
}

impl XBoundsSources {
    pub fn resolve(&self) -> Option<(BoundsSource, Bounds1D)> {
        let global = self.global.filter(|_| self.should_sync);
        self.interaction
            .map(|b| (BoundsSource::Interaction, b))
            .or(global.map(|b| (BoundsSource::Global, b)))
            .or(self.config.map(|b| (BoundsSource::Config, b)))
            .or(self.dataset.map(|b| (BoundsSource::Dataset, b)))
    }

    pub fn effective(&self) -> Option<Bounds1D> {
        self.resolve().map(|(_, bounds)| bounds)
    }

    /// True while interaction or global bounds override config and data
    pub fn can_reset(&self) -> bool {
        matches!(
            self.resolve(),
            Some((BoundsSource::Interaction | BoundsSource::Global, _))
        )
    }
}

/// X range implied by the panel config.
///
/// A follow width wins over declared limits and ends at `follow_end`. A
/// declared limit on one side only is completed from the observed range.
pub fn config_x_bounds(
    config: &PlotConfig,
    follow_end: Option<f64>,
    observed: Option<Bounds1D>,
) -> Option<Bounds1D> {
    let follow = config
        .following_view_width
        .filter(|width| width.is_finite() && *width > 0.0);
    if let Some(width) = follow {
        if let Some(end) = follow_end {
            return Bounds1D::new(end - width, end);
        }
    }
    declared(config.min_x_value, config.max_x_value, observed)
}

pub fn config_y_bounds(config: &PlotConfig, observed: Option<Bounds1D>) -> Option<Bounds1D> {
    declared(config.min_y_value, config.max_y_value, observed)
}

fn declared(min: Option<f64>, max: Option<f64>, observed: Option<Bounds1D>) -> Option<Bounds1D> {
    match (min, max) {
        (Some(min), Some(max)) => Bounds1D::new(min, max),
        (Some(min), None) => observed.and_then(|o| Bounds1D::new(min, o.max)),
        (None, Some(max)) => observed.and_then(|o| Bounds1D::new(o.min, max)),
        (None, None) => None,
    }
}
