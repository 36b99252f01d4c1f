//! UI-side owner of one plot panel
//!
//! Every public method is synchronous and only records the new state. A
//! single dispatcher task turns the accumulated state into renderer calls,
//! one job at a time, so bursts of updates collapse into one render with the
//! latest state. Each job carries a token; a reply whose token is no longer
//! the latest issued is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use data_manager::DatasetBuilder;
use parking_lot::Mutex;
use renderer::{ChartRenderer, RasterRenderer, RenderSurface};
use shared_types::{
    AxisScale, Bounds, Bounds1D, ColorScheme, CoordinatorOptions, CsvDataset, DataUpdate,
    Dataset, HoverElement, InteractionEvent, PixelPosition, PlayerState, PlotConfig, PlotError,
    PlotResult, Scale, Size, ThemeColors, UpdateAction, ViewUpdate, XAxisMode, ZoomMode,
};
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::controls::InteractionController;
use crate::events::PlotEvents;
use crate::renderer_bridge::{RendererBridge, RendererFactory};
use crate::viewport::{config_x_bounds, config_y_bounds, XBoundsSources};

/// Downsampling width used until the canvas has a size
const FALLBACK_PIXEL_WIDTH: u32 = 1024;

type SharedFactory = Arc<dyn Fn() -> Box<dyn ChartRenderer> + Send + Sync>;

/// Renderer health as seen by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum RendererStatus {
    Initializing,
    Ready,
    /// No renderer calls are made until [`PlotCoordinator::reinitialize`]
    Failed(PlotError),
    Destroyed,
}

#[derive(Debug, Default, Clone, Copy)]
struct Pending {
    seek: bool,
    view: bool,
    data: bool,
}

impl Pending {
    fn everything() -> Self {
        Self {
            seek: false,
            view: true,
            data: true,
        }
    }

    fn any(&self) -> bool {
        self.seek || self.view || self.data
    }
}

/// Last values pushed to listeners; events only fire on change
#[derive(Debug, Default)]
struct Emitted {
    timeseries_bounds: Option<Bounds1D>,
    x_scale: Option<Option<AxisScale>>,
    current_values: Option<Vec<Option<f64>>>,
    mismatched: Vec<String>,
}

enum Emission {
    TimeseriesBounds(Bounds1D),
    XScale(Option<AxisScale>),
    CurrentValues(Vec<Option<f64>>),
    Mismatched(Vec<String>),
    ViewportChange(bool),
    RendererError(PlotError),
}

struct RenderCalls {
    seek: bool,
    view: Option<ViewUpdate>,
    data: Option<(DataUpdate, Vec<Dataset>)>,
}

/// What listeners learn once the job's reply is accepted
struct JobSummary {
    timeseries_bounds: Option<Bounds1D>,
    current_values: Vec<Option<f64>>,
    mismatched: Vec<String>,
}

struct RenderJob {
    token: u64,
    calls: RenderCalls,
    summary: JobSummary,
}

#[derive(Debug, Default)]
struct JobOutcome {
    bounds: Option<Bounds>,
    scale: Option<Option<Scale>>,
}

impl RenderCalls {
    async fn run(self, bridge: &RendererBridge) -> PlotResult<JobOutcome> {
        let mut outcome = JobOutcome::default();
        if self.seek {
            bridge.update(UpdateAction::Seek).await?;
        }
        if let Some(view) = self.view {
            outcome.bounds = bridge.update(UpdateAction::View(view)).await?;
        }
        if let Some((data, datasets)) = self.data {
            if let Some(bounds) = bridge.update(UpdateAction::Data(data)).await? {
                outcome.bounds = Some(bounds);
            }
            outcome.scale = Some(bridge.update_datasets(datasets).await?);
        }
        Ok(outcome)
    }
}

struct CoordinatorState {
    options: CoordinatorOptions,
    builder: DatasetBuilder,
    config: PlotConfig,
    theme: ThemeColors,
    interaction: InteractionController,
    global_bounds: Option<Bounds1D>,
    should_sync: bool,
    size: Size,
    hover_x: Option<f64>,
    last_player_time: Option<f64>,
    pending: Pending,
    status: RendererStatus,
    token: u64,
    scale: Option<Scale>,
    /// Bounds the renderer reported for its last accepted job
    rendered_bounds: Option<Bounds>,
    last_view: Option<ViewUpdate>,
    can_reset: bool,
    emitted: Emitted,
}

impl CoordinatorState {
    fn new(options: CoordinatorOptions, theme: ThemeColors) -> Self {
        Self {
            builder: DatasetBuilder::new(options.max_streamed_samples),
            options,
            config: PlotConfig::default(),
            theme,
            interaction: InteractionController::new(),
            global_bounds: None,
            should_sync: false,
            size: Size::default(),
            hover_x: None,
            last_player_time: None,
            pending: Pending::default(),
            status: RendererStatus::Initializing,
            token: 0,
            scale: None,
            rendered_bounds: None,
            last_view: None,
            can_reset: false,
            emitted: Emitted::default(),
        }
    }

    fn is_seek(&self, current_time: f64) -> bool {
        let Some(last) = self.last_player_time else {
            return false;
        };
        if current_time < last {
            return true;
        }
        self.options
            .seek_jump_threshold
            .is_some_and(|threshold| current_time - last > threshold)
    }

    /// Re-evaluate whether the viewport is overridden; `Some` when it flipped
    fn refresh_can_reset(&mut self) -> Option<Emission> {
        let interaction = self.interaction.bounds();
        let sources = XBoundsSources {
            interaction: interaction.x,
            global: self.global_bounds,
            should_sync: self.should_sync,
            ..XBoundsSources::default()
        };
        let can_reset = sources.can_reset() || interaction.y.is_some();
        if can_reset == self.can_reset {
            return None;
        }
        self.can_reset = can_reset;
        Some(Emission::ViewportChange(can_reset))
    }

    fn follow_end(&mut self) -> Option<f64> {
        match self.builder.x_axis() {
            XAxisMode::Timestamp => self.builder.current_x(),
            _ => self.builder.latest_x(),
        }
    }

    fn build_job(&mut self, pending: Pending) -> RenderJob {
        let resolved = self.builder.resolve();
        let follow_end = self.follow_end();
        let interaction = self.interaction.bounds();

        let sources = XBoundsSources {
            interaction: interaction.x,
            global: self.global_bounds,
            should_sync: self.should_sync,
            config: config_x_bounds(&self.config, follow_end, resolved.x_bounds),
            dataset: resolved.x_bounds,
        };
        let x_bounds = sources.effective();
        let y_bounds = interaction
            .y
            .or_else(|| config_y_bounds(&self.config, resolved.y_bounds));

        let view = ViewUpdate {
            size: self.size,
            x_bounds,
            y_bounds,
            zoom_mode: self.interaction.zoom_mode(),
            theme: self.theme,
            hover_x: self.hover_x,
            show_x_axis_labels: self.config.show_x_axis_labels,
            show_y_axis_labels: self.config.show_y_axis_labels,
        };
        let layout_changed = self
            .last_view
            .as_ref()
            .map_or(true, |last| layout_differs(last, &view));
        let view_changed = self.last_view.as_ref() != Some(&view);

        let data = (pending.data || pending.seek || layout_changed).then(|| {
            let width = if self.size.width > 0 {
                self.size.width
            } else {
                FALLBACK_PIXEL_WIDTH
            };
            let datasets =
                self.builder
                    .datasets(x_bounds, width, self.options.buckets_per_pixel);
            let update = DataUpdate {
                data_bounds: resolved.bounds,
                current_x: self.builder.current_x(),
            };
            (update, datasets)
        });

        self.last_view = Some(view.clone());
        RenderJob {
            token: self.token,
            calls: RenderCalls {
                seek: pending.seek,
                view: view_changed.then_some(view),
                data,
            },
            summary: JobSummary {
                timeseries_bounds: resolved.x_bounds,
                current_values: self.builder.current_values(),
                mismatched: resolved.mismatched_paths.clone(),
            },
        }
    }

    /// Record an accepted reply and work out which events it triggers
    fn accept(&mut self, summary: JobSummary, outcome: JobOutcome) -> Vec<Emission> {
        let mut emissions = Vec::new();
        if outcome.bounds.is_some() {
            self.rendered_bounds = outcome.bounds;
        }

        if let Some(bounds) = summary.timeseries_bounds {
            if self.emitted.timeseries_bounds != Some(bounds) {
                self.emitted.timeseries_bounds = Some(bounds);
                emissions.push(Emission::TimeseriesBounds(bounds));
            }
        }

        if let Some(scale) = outcome.scale {
            self.scale = scale;
            let x_scale = scale.map(|s| s.x);
            if self.emitted.x_scale != Some(x_scale) {
                self.emitted.x_scale = Some(x_scale);
                emissions.push(Emission::XScale(x_scale));
            }
        }

        if self.emitted.current_values.as_ref() != Some(&summary.current_values) {
            self.emitted.current_values = Some(summary.current_values.clone());
            emissions.push(Emission::CurrentValues(summary.current_values));
        }

        if self.emitted.mismatched != summary.mismatched {
            self.emitted.mismatched = summary.mismatched.clone();
            emissions.push(Emission::Mismatched(summary.mismatched));
        }
        emissions
    }
}

fn layout_differs(a: &ViewUpdate, b: &ViewUpdate) -> bool {
    a.size != b.size
        || a.x_bounds != b.x_bounds
        || a.y_bounds != b.y_bounds
        || a.show_x_axis_labels != b.show_x_axis_labels
        || a.show_y_axis_labels != b.show_y_axis_labels
}

struct Shared {
    id: Uuid,
    state: Mutex<CoordinatorState>,
    /// Lock order: `state` before `bridge`
    bridge: Mutex<Option<Arc<RendererBridge>>>,
    factory: SharedFactory,
    wake: Notify,
    busy: watch::Sender<bool>,
    events: PlotEvents,
    destroyed: AtomicBool,
}

impl Shared {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn current_bridge(&self) -> Option<Arc<RendererBridge>> {
        self.bridge.lock().clone()
    }

    fn is_current(&self, bridge: &Arc<RendererBridge>) -> bool {
        self.bridge
            .lock()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, bridge))
    }

    fn spawn_bridge(
        &self,
        surface: Box<dyn RenderSurface>,
        device_pixel_ratio: f64,
        theme: ThemeColors,
    ) -> PlotResult<Arc<RendererBridge>> {
        let factory = Arc::clone(&self.factory);
        let boxed: RendererFactory = Box::new(move || factory());
        Ok(Arc::new(RendererBridge::spawn(
            surface,
            device_pixel_ratio,
            theme,
            boxed,
        )?))
    }

    /// Wake the dispatcher for whatever is pending
    fn schedule(&self, state: &CoordinatorState) {
        if matches!(
            state.status,
            RendererStatus::Failed(_) | RendererStatus::Destroyed
        ) {
            return;
        }
        if state.pending.any() {
            self.busy.send_replace(true);
            self.wake.notify_one();
        }
    }

    fn emit(&self, emissions: Vec<Emission>) {
        if self.is_destroyed() {
            return;
        }
        for emission in emissions {
            match emission {
                Emission::TimeseriesBounds(bounds) => self.events.timeseries_bounds.emit(&bounds),
                Emission::XScale(scale) => self.events.x_scale_changed.emit(&scale),
                Emission::CurrentValues(values) => {
                    self.events.current_values_changed.emit(&values)
                }
                Emission::Mismatched(paths) => self
                    .events
                    .paths_with_mismatched_data_lengths_changed
                    .emit(&paths),
                Emission::ViewportChange(can_reset) => {
                    self.events.viewport_change.emit(&can_reset)
                }
                Emission::RendererError(err) => self.events.renderer_error.emit(&err),
            }
        }
    }

    /// Lock the state, apply `update`, schedule and emit what it returns
    fn mutate<F>(&self, update: F)
    where
        F: FnOnce(&mut CoordinatorState) -> Vec<Emission>,
    {
        if self.is_destroyed() {
            return;
        }
        let emissions = {
            let mut state = self.state.lock();
            let emissions = update(&mut state);
            self.schedule(&state);
            emissions
        };
        self.emit(emissions);
    }

    fn fail(&self, err: PlotError) {
        let emissions = {
            let mut state = self.state.lock();
            if state.status == RendererStatus::Destroyed {
                return;
            }
            log::error!("[PlotCoordinator] {} renderer failed: {err}", self.id);
            state.status = RendererStatus::Failed(err.clone());
            state.pending = Pending::default();
            state.scale = None;
            let mut emissions = vec![Emission::RendererError(err)];
            if state.emitted.x_scale != Some(None) {
                state.emitted.x_scale = Some(None);
                emissions.push(Emission::XScale(None));
            }
            self.busy.send_replace(false);
            emissions
        };
        self.emit(emissions);
    }

    async fn ensure_ready(&self, bridge: &Arc<RendererBridge>) -> bool {
        let status = self.state.lock().status.clone();
        match status {
            RendererStatus::Ready => return true,
            RendererStatus::Failed(_) | RendererStatus::Destroyed => return false,
            RendererStatus::Initializing => {}
        }

        let result = bridge.ready().await;
        {
            let mut state = self.state.lock();
            if state.status != RendererStatus::Initializing || !self.is_current(bridge) {
                return state.status == RendererStatus::Ready && self.is_current(bridge);
            }
            if result.is_ok() {
                log::info!("[PlotCoordinator] {} renderer ready", self.id);
                state.status = RendererStatus::Ready;
                return true;
            }
        }
        if let Err(err) = result {
            self.fail(err);
        }
        false
    }

    fn take_job(&self) -> Option<RenderJob> {
        let mut state = self.state.lock();
        if state.status != RendererStatus::Ready || !state.pending.any() {
            return None;
        }
        let pending = std::mem::take(&mut state.pending);
        state.token += 1;
        Some(state.build_job(pending))
    }

    fn finish_job(&self, token: u64, summary: JobSummary, outcome: PlotResult<JobOutcome>) {
        let emissions = {
            let mut state = self.state.lock();
            if self.is_destroyed() || token != state.token {
                log::debug!(
                    "[PlotCoordinator] Dropping reply for token {token}, latest is {}",
                    state.token
                );
                return;
            }
            match outcome {
                Ok(outcome) => state.accept(summary, outcome),
                Err(err) if err.is_renderer_fatal() => {
                    drop(state);
                    self.fail(err);
                    return;
                }
                Err(err) => {
                    log::warn!("[PlotCoordinator] Render job {token} failed: {err}");
                    return;
                }
            }
        };
        self.emit(emissions);
    }

    fn mark_idle(&self) {
        let state = self.state.lock();
        let working = matches!(
            state.status,
            RendererStatus::Ready | RendererStatus::Initializing
        ) && state.pending.any();
        if !working {
            self.busy.send_replace(false);
        }
    }

    /// Run jobs until nothing is pending
    async fn drain(&self) {
        while let Some(bridge) = self.current_bridge() {
            if !self.ensure_ready(&bridge).await {
                break;
            }
            let Some(job) = self.take_job() else {
                break;
            };
            let RenderJob {
                token,
                calls,
                summary,
            } = job;
            let outcome = calls.run(&bridge).await;
            self.finish_job(token, summary, outcome);
        }
        self.mark_idle();
    }
}

async fn run_dispatcher(shared: Arc<Shared>) {
    loop {
        shared.drain().await;
        if shared.is_destroyed() {
            break;
        }
        shared.wake.notified().await;
        if shared.is_destroyed() {
            break;
        }
    }
    log::debug!("[PlotCoordinator] {} dispatcher stopped", shared.id);
}

/// Coordinates one plot panel: ingests player state and config, keeps the
/// viewport, and drives a renderer on its own worker.
///
/// Must be created inside a tokio runtime. Dropping it is equivalent to
/// [`PlotCoordinator::destroy`].
pub struct PlotCoordinator {
    shared: Arc<Shared>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl PlotCoordinator {
    /// Coordinator backed by the built-in raster renderer
    pub fn new(surface: Box<dyn RenderSurface>, options: CoordinatorOptions) -> PlotResult<Self> {
        let hit_radius = options.hit_radius;
        Self::with_renderer(surface, options, move || {
            Box::new(RasterRenderer::new(hit_radius)) as Box<dyn ChartRenderer>
        })
    }

    /// Coordinator with a custom renderer. `factory` runs on the worker
    /// thread, again on every [`PlotCoordinator::reinitialize`].
    pub fn with_renderer<F>(
        surface: Box<dyn RenderSurface>,
        options: CoordinatorOptions,
        factory: F,
    ) -> PlotResult<Self>
    where
        F: Fn() -> Box<dyn ChartRenderer> + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|err| PlotError::NoRuntime {
            message: err.to_string(),
        })?;

        let id = Uuid::new_v4();
        let theme = ColorScheme::default().theme();
        let device_pixel_ratio = options.device_pixel_ratio;
        let (busy, _) = watch::channel(true);
        let shared = Arc::new(Shared {
            id,
            state: Mutex::new(CoordinatorState::new(options, theme)),
            bridge: Mutex::new(None),
            factory: Arc::new(factory),
            wake: Notify::new(),
            busy,
            events: PlotEvents::new(),
            destroyed: AtomicBool::new(false),
        });

        let bridge = shared.spawn_bridge(surface, device_pixel_ratio, theme)?;
        *shared.bridge.lock() = Some(bridge);

        let dispatcher = runtime.spawn(run_dispatcher(Arc::clone(&shared)));
        log::info!("[PlotCoordinator] {id} created");
        Ok(Self {
            shared,
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn events(&self) -> &PlotEvents {
        &self.shared.events
    }

    pub fn renderer_status(&self) -> RendererStatus {
        self.shared.state.lock().status.clone()
    }

    pub fn can_reset(&self) -> bool {
        self.shared.state.lock().can_reset
    }

    /// Scale realized by the last accepted draw
    pub fn scale(&self) -> Option<Scale> {
        self.shared.state.lock().scale
    }

    /// Bounds the renderer reported for the last accepted job
    pub fn rendered_bounds(&self) -> Option<Bounds> {
        self.shared.state.lock().rendered_bounds
    }

    /// Ingest a player snapshot. Backward jumps, and forward jumps beyond the
    /// configured threshold, are treated as seeks.
    pub fn handle_player_state(&self, player_state: &PlayerState) {
        let id = self.shared.id;
        if !player_state.current_time.is_finite() {
            log::warn!(
                "[PlotCoordinator] {id} ignoring player state at time {}",
                player_state.current_time
            );
            return;
        }
        self.shared.mutate(|state| {
            let mut emissions = Vec::new();
            if state.is_seek(player_state.current_time) {
                log::debug!(
                    "[PlotCoordinator] {id} seek to {}",
                    player_state.current_time
                );
                state.builder.clear_streamed();
                state.interaction.reset();
                state.hover_x = None;
                state.pending.seek = true;
                emissions.extend(state.refresh_can_reset());
            }
            state.last_player_time = Some(player_state.current_time);
            state.builder.handle_player_state(player_state);
            state.pending.data = true;
            emissions
        });
    }

    /// Apply a panel config. `$name` references in paths are substituted from
    /// `global_variables`.
    pub fn handle_config(
        &self,
        config: &PlotConfig,
        color_scheme: ColorScheme,
        global_variables: &HashMap<String, serde_json::Value>,
    ) {
        let config = config.normalized(global_variables);
        let validation = config.validate();
        for problem in validation.errors.iter().chain(&validation.warnings) {
            log::warn!("[PlotCoordinator] Config: {problem}");
        }
        let x_axis = config.x_axis_mode().unwrap_or_else(|err| {
            log::warn!("[PlotCoordinator] {err}; falling back to timestamps");
            XAxisMode::Timestamp
        });
        let theme = color_scheme.theme();

        self.shared.mutate(|state| {
            let mut emissions = Vec::new();
            if state.builder.set_paths(config.paths.clone()) {
                state.pending.data = true;
            }
            if state.builder.set_x_axis(x_axis) {
                state.pending.data = true;
                // Overrides in the old axis units mean nothing now
                state.interaction.reset();
                emissions.extend(state.refresh_can_reset());
            }
            // Only a change of the flag itself overrides set_should_sync
            if state.config.is_synced != config.is_synced {
                state.should_sync = config.is_synced;
                emissions.extend(state.refresh_can_reset());
            }
            if state.config != config || state.theme != theme {
                state.pending.view = true;
            }
            state.config = config;
            state.theme = theme;
            emissions
        });
    }

    pub fn set_should_sync(&self, should_sync: bool) {
        self.shared.mutate(|state| {
            if state.should_sync == should_sync {
                return Vec::new();
            }
            state.should_sync = should_sync;
            state.pending.view = true;
            state.refresh_can_reset().into_iter().collect()
        });
    }

    /// Bounds shared between synced panels; only honored while syncing
    pub fn set_global_bounds(&self, bounds: Option<Bounds1D>) {
        let bounds = bounds.and_then(|b| {
            let checked = Bounds1D::new(b.min, b.max);
            if checked.is_none() {
                log::warn!(
                    "[PlotCoordinator] Ignoring invalid global bounds [{}, {}]",
                    b.min,
                    b.max
                );
            }
            checked
        });
        self.shared.mutate(|state| {
            if state.global_bounds == bounds {
                return Vec::new();
            }
            state.global_bounds = bounds;
            state.pending.view = true;
            state.refresh_can_reset().into_iter().collect()
        });
    }

    pub fn set_zoom_mode(&self, zoom_mode: ZoomMode) {
        self.shared.mutate(|state| {
            if state.interaction.zoom_mode() != zoom_mode {
                state.interaction.set_zoom_mode(zoom_mode);
                state.pending.view = true;
            }
            Vec::new()
        });
    }

    /// Drop interaction overrides, and the global bounds while synced
    pub fn reset_bounds(&self) {
        self.shared.mutate(|state| {
            let mut changed = state.interaction.reset();
            if state.should_sync && state.global_bounds.take().is_some() {
                changed = true;
            }
            if changed {
                state.pending.view = true;
            }
            state.refresh_can_reset().into_iter().collect()
        });
    }

    pub fn set_size(&self, size: Size) {
        self.shared.mutate(|state| {
            if state.size != size {
                state.size = size;
                state.pending.view = true;
            }
            Vec::new()
        });
    }

    /// Apply a pan, zoom or drag against the last realized scale. Ignored
    /// until something has been drawn.
    pub fn add_interaction_event(&self, event: InteractionEvent) {
        self.shared.mutate(|state| {
            let Some(scale) = state.scale else {
                log::debug!("[PlotCoordinator] Ignoring {event:?} before first draw");
                return Vec::new();
            };
            if !state.interaction.handle_event(&event, &scale) {
                return Vec::new();
            }
            state.pending.view = true;
            state.refresh_can_reset().into_iter().collect()
        });
    }

    /// Hover marker position in X units, or `None` to hide it
    pub fn set_hover_value(&self, x: Option<f64>) {
        let x = x.filter(|x| x.is_finite());
        self.shared.mutate(|state| {
            if state.hover_x != x {
                state.hover_x = x;
                state.pending.view = true;
            }
            Vec::new()
        });
    }

    /// Data-space X under a canvas pixel, using the last realized scale
    pub fn get_x_value_at_pixel(&self, pixel_x: f64) -> Option<f64> {
        if self.shared.is_destroyed() || !pixel_x.is_finite() {
            return None;
        }
        let scale = self.shared.state.lock().scale?;
        Some(scale.x.pixel_to_value(pixel_x))
    }

    pub async fn get_elements_at_pixel(&self, pixel: PixelPosition) -> Vec<HoverElement> {
        if self.renderer_status() != RendererStatus::Ready {
            return Vec::new();
        }
        let Some(bridge) = self.shared.current_bridge() else {
            return Vec::new();
        };
        bridge
            .get_elements_at_pixel(pixel)
            .await
            .unwrap_or_default()
    }

    /// Full-resolution series for export
    pub async fn get_csv_data(&self) -> Vec<CsvDataset> {
        if self.shared.is_destroyed() {
            return Vec::new();
        }
        self.shared.state.lock().builder.csv_datasets()
    }

    /// Make a named scalar function available to `Transform::Custom` paths
    pub fn register_transform<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        let name = name.into();
        self.shared.mutate(move |state| {
            state.builder.register_transform(name, function);
            state.pending.data = true;
            Vec::new()
        });
    }

    /// Replace the renderer and its surface, e.g. after a lost context.
    /// Replies still in flight from the old renderer are dropped.
    pub fn reinitialize(&self, surface: Box<dyn RenderSurface>) -> PlotResult<()> {
        if self.shared.is_destroyed() {
            log::warn!("[PlotCoordinator] reinitialize after destroy ignored");
            return Ok(());
        }
        let (device_pixel_ratio, theme) = {
            let state = self.shared.state.lock();
            (state.options.device_pixel_ratio, state.theme)
        };
        let bridge = self.shared.spawn_bridge(surface, device_pixel_ratio, theme)?;

        let previous = {
            let mut state = self.shared.state.lock();
            state.status = RendererStatus::Initializing;
            state.token += 1;
            state.scale = None;
            state.last_view = None;
            state.pending = Pending::everything();
            let previous = self.shared.bridge.lock().replace(bridge);
            self.shared.schedule(&state);
            previous
        };
        if let Some(previous) = previous {
            previous.dispose();
        }
        log::info!("[PlotCoordinator] {} reinitialized", self.shared.id);
        Ok(())
    }

    /// Stop the dispatcher and release the renderer. Idempotent; after this
    /// every method is a silent no-op and no events are emitted.
    pub fn destroy(&self) {
        if self.shared.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.shared.state.lock();
            state.status = RendererStatus::Destroyed;
            state.pending = Pending::default();
            state.token += 1;
        }
        self.shared.events.close();

        if let Some(dispatcher) = self.dispatcher.lock().take() {
            dispatcher.abort();
        }
        let bridge = self.shared.bridge.lock().take();
        if let Some(bridge) = bridge {
            bridge.dispose();
        }
        self.shared.busy.send_replace(false);
        self.shared.wake.notify_one();
        log::info!("[PlotCoordinator] {} destroyed", self.shared.id);
    }

    /// Resolves once every pending update has been rendered, or the renderer
    /// has failed, or the coordinator is destroyed
    pub async fn settled(&self) {
        let mut busy = self.shared.busy.subscribe();
        let _ = busy.wait_for(|busy| !*busy).await;
    }
}

impl Drop for PlotCoordinator {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for PlotCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotCoordinator")
            .field("id", &self.shared.id)
            .field("status", &self.renderer_status())
            .finish()
    }
}
