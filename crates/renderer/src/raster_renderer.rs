//! CPU raster implementation of the chart renderer

use shared_types::{
    AxisScale, Bounds, Bounds1D, DataUpdate, Dataset, HoverElement, PixelPosition, PlotError,
    PlotResult, Scale, Size, ThemeColors, UpdateAction, ViewUpdate,
};

use crate::calcables::calculate_min_max_y;
use crate::drawables::{draw_axes, draw_dataset, draw_grid, draw_vertical_marker};
use crate::frame::FrameBuffer;
use crate::hit_test::elements_at_pixel;
use crate::surface::RenderSurface;
use crate::ChartRenderer;

pub const DEFAULT_HIT_RADIUS: f64 = 8.0;

const EDGE_MARGIN: f64 = 8.0;
const Y_LABEL_GUTTER: f64 = 48.0;
const X_LABEL_GUTTER: f64 = 24.0;
/// Fraction of the span added around auto-fitted Y ranges
const Y_FIT_PADDING: f64 = 0.05;

/// Plot area inside the canvas, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn for_view(view: &ViewUpdate) -> Self {
        let left = if view.show_y_axis_labels {
            Y_LABEL_GUTTER
        } else {
            EDGE_MARGIN
        };
        let bottom_gutter = if view.show_x_axis_labels {
            X_LABEL_GUTTER
        } else {
            EDGE_MARGIN
        };
        let width = view.size.width as f64;
        let height = view.size.height as f64;
        Self {
            left: left.min(width * 0.5),
            top: EDGE_MARGIN.min(height * 0.25),
            right: (width - EDGE_MARGIN).max(width * 0.5),
            bottom: (height - bottom_gutter).max(height * 0.5),
        }
    }
}

/// Renderer drawing into a CPU frame buffer and presenting it on its surface
pub struct RasterRenderer {
    surface: Option<Box<dyn RenderSurface>>,
    device_pixel_ratio: f64,
    theme: ThemeColors,
    hit_radius: f64,
    view: Option<ViewUpdate>,
    configured_size: Option<(u32, u32)>,
    data_bounds: Option<Bounds>,
    current_x: Option<f64>,
    hover_x: Option<f64>,
    datasets: Vec<Dataset>,
    scale: Option<Scale>,
    frames_presented: u64,
}

impl RasterRenderer {
    pub fn new(hit_radius: f64) -> Self {
        Self {
            surface: None,
            device_pixel_ratio: 1.0,
            theme: ThemeColors::default(),
            hit_radius,
            view: None,
            configured_size: None,
            data_bounds: None,
            current_x: None,
            hover_x: None,
            datasets: Vec::new(),
            scale: None,
            frames_presented: 0,
        }
    }

    pub fn scale(&self) -> Option<Scale> {
        self.scale
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn surface_mut(&mut self) -> PlotResult<&mut Box<dyn RenderSurface>> {
        self.surface
            .as_mut()
            .ok_or_else(|| PlotError::RendererUnavailable {
                message: "renderer has no surface".to_string(),
            })
    }

    fn physical_size(&self, size: Size) -> (u32, u32) {
        let dpr = self.device_pixel_ratio;
        (
            (size.width as f64 * dpr).round() as u32,
            (size.height as f64 * dpr).round() as u32,
        )
    }

    fn apply_view(&mut self, view: ViewUpdate) -> PlotResult<()> {
        let physical = self.physical_size(view.size);
        if !view.size.is_empty() && self.configured_size != Some(physical) {
            log::debug!(
                "[RasterRenderer] Configuring surface {}x{}",
                physical.0,
                physical.1
            );
            let result = self.surface_mut()?.configure(physical.0, physical.1);
            if let Err(err) = result {
                self.lose_surface(&err);
                return Err(err);
            }
            self.configured_size = Some(physical);
        }
        self.theme = view.theme;
        self.hover_x = view.hover_x;
        self.view = Some(view);
        Ok(())
    }

    fn apply_data(&mut self, data: DataUpdate) {
        self.data_bounds = data.data_bounds;
        self.current_x = data.current_x;
    }

    /// Recompute the scale from the view, data bounds and datasets
    fn layout(&mut self) {
        let Some(view) = &self.view else {
            self.scale = None;
            return;
        };
        if view.size.is_empty() {
            self.scale = None;
            return;
        }

        let x = view
            .x_bounds
            .or(self.data_bounds.map(|b| b.x))
            .or_else(|| {
                Bounds1D::from_values(
                    self.datasets
                        .iter()
                        .flat_map(|d| d.points.iter())
                        .filter(|p| p.is_finite())
                        .map(|p| p.x),
                )
            })
            .unwrap_or(Bounds1D { min: 0.0, max: 1.0 })
            .with_min_span();

        let y = match view.y_bounds {
            Some(y) => y,
            None => calculate_min_max_y(&self.datasets, x)
                .or(self.data_bounds.map(|b| b.y))
                .map(|y| y.padded(Y_FIT_PADDING))
                .unwrap_or(Bounds1D { min: 0.0, max: 1.0 }),
        }
        .with_min_span();

        let area = PlotArea::for_view(view);
        self.scale = Some(Scale {
            x: AxisScale {
                min: x.min,
                max: x.max,
                pixel_min: area.left,
                pixel_max: area.right,
            },
            y: AxisScale {
                min: y.min,
                max: y.max,
                pixel_min: area.bottom,
                pixel_max: area.top,
            },
        });
    }

    fn draw(&mut self) -> PlotResult<()> {
        let (Some(scale), Some(view)) = (self.scale, self.view.as_ref()) else {
            return Ok(());
        };
        let physical = self.physical_size(view.size);
        let dpr = self.device_pixel_ratio;
        let theme = self.theme;
        let (show_x_labels, show_y_labels) = (view.show_x_axis_labels, view.show_y_axis_labels);

        let mut frame = FrameBuffer::new(physical.0, physical.1);
        frame.clear(theme.background);
        draw_grid(&mut frame, &scale, dpr, &theme);
        for dataset in &self.datasets {
            draw_dataset(&mut frame, dataset, &scale, dpr);
        }
        if let Some(x) = self.current_x {
            draw_vertical_marker(&mut frame, &scale, x, dpr, theme.cursor);
        }
        if let Some(x) = self.hover_x {
            draw_vertical_marker(&mut frame, &scale, x, dpr, theme.hover);
        }

        // Repaint the gutters so series are clipped to the plot area
        let (left, right) = scale.x.pixel_range();
        let (top, bottom) = scale.y.pixel_range();
        let (w, h) = (physical.0 as f64, physical.1 as f64);
        frame.fill_rect(0.0, 0.0, w, top * dpr, theme.background);
        frame.fill_rect(0.0, bottom * dpr, w, h, theme.background);
        frame.fill_rect(0.0, 0.0, left * dpr, h, theme.background);
        frame.fill_rect(right * dpr, 0.0, w, h, theme.background);
        draw_axes(&mut frame, &scale, dpr, &theme, show_x_labels, show_y_labels);

        let result = self.surface_mut()?.present(frame);
        if let Err(err) = result {
            self.lose_surface(&err);
            return Err(err);
        }
        self.frames_presented += 1;
        Ok(())
    }

    fn lose_surface(&mut self, err: &PlotError) {
        log::error!("[RasterRenderer] Surface lost: {err}");
        self.surface = None;
        self.configured_size = None;
    }
}

impl ChartRenderer for RasterRenderer {
    fn init(
        &mut self,
        mut surface: Box<dyn RenderSurface>,
        device_pixel_ratio: f64,
        theme: ThemeColors,
    ) -> PlotResult<()> {
        if let Err(err) = surface.configure(1, 1) {
            return Err(PlotError::RendererInit {
                message: err.to_string(),
            });
        }
        self.device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            log::warn!("[RasterRenderer] Ignoring device pixel ratio {device_pixel_ratio}");
            1.0
        };
        self.theme = theme;
        self.surface = Some(surface);
        self.configured_size = Some((1, 1));
        log::info!(
            "[RasterRenderer] Initialized with device pixel ratio {}",
            self.device_pixel_ratio
        );
        Ok(())
    }

    fn update(&mut self, action: UpdateAction) -> PlotResult<Option<Bounds>> {
        self.surface_mut()?;
        log::debug!("[RasterRenderer] update: {}", action.name());
        match action {
            UpdateAction::View(view) => {
                self.apply_view(view)?;
                self.layout();
                self.draw()?;
                Ok(self.scale.and_then(|s| s.bounds()))
            }
            UpdateAction::Data(data) => {
                self.apply_data(data);
                self.layout();
                Ok(self.scale.and_then(|s| s.bounds()))
            }
            UpdateAction::Seek => {
                self.hover_x = None;
                self.draw()?;
                Ok(None)
            }
        }
    }

    fn get_elements_at_pixel(&self, pixel: PixelPosition) -> Vec<HoverElement> {
        match &self.scale {
            Some(scale) => elements_at_pixel(&self.datasets, scale, pixel, self.hit_radius),
            None => Vec::new(),
        }
    }

    fn update_datasets(&mut self, datasets: Vec<Dataset>) -> PlotResult<Option<Scale>> {
        self.surface_mut()?;
        log::debug!("[RasterRenderer] Drawing {} datasets", datasets.len());
        self.datasets = datasets;
        self.layout();
        self.draw()?;
        Ok(self.scale)
    }
}
