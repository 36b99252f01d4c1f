//! End-to-end tests driving a coordinator, its worker and the raster renderer

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use plot_bridge::{
    ChannelSurface, ChartRenderer, EventChannel, NullSurface, PlotCoordinator, RenderSurface,
    RendererStatus, Subscription,
};
use renderer::{RasterRenderer, DEFAULT_HIT_RADIUS};
use shared_types::{
    AxisScale, Bounds, Bounds1D, ColorScheme, CoordinatorOptions, Dataset, HoverElement,
    InteractionEvent, PixelPosition, PlayerState, PlotConfig, PlotError, PlotPath, PlotResult,
    Sample, Scale, Size, ThemeColors, Transform, UpdateAction, XAxisValue,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn record<T: Clone + Send + 'static>(channel: &EventChannel<T>) -> (Arc<Mutex<Vec<T>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = channel.subscribe(move |value: &T| sink.lock().push(value.clone()));
    (seen, subscription)
}

async fn settle(coordinator: &PlotCoordinator) {
    tokio::time::timeout(Duration::from_secs(10), coordinator.settled())
        .await
        .expect("coordinator did not settle");
}

fn config(paths: &[&str]) -> PlotConfig {
    PlotConfig {
        paths: paths.iter().map(|p| PlotPath::new(*p)).collect(),
        ..PlotConfig::default()
    }
}

fn raster_coordinator() -> PlotCoordinator {
    PlotCoordinator::new(Box::new(NullSurface::new()), CoordinatorOptions::default()).unwrap()
}

/// 100 batches of 10 samples at t = 0..999, value equal to the time
fn stream_batches(coordinator: &PlotCoordinator, path: &str) {
    for batch in 0..100 {
        let samples = (0..10)
            .map(|i| {
                let t = (batch * 10 + i) as f64;
                Sample::new(t, t)
            })
            .collect();
        let current_time = (batch * 10 + 9) as f64;
        coordinator.handle_player_state(&PlayerState::new(current_time).with_messages(path, samples));
    }
}

/// Renderers are released on their worker after dispose returns
async fn wait_for_drops(drops: &AtomicUsize, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while drops.load(Ordering::SeqCst) < expected {
        assert!(Instant::now() < deadline, "renderer was never released");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(drops.load(Ordering::SeqCst), expected);
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
        "{actual} != {expected}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_streaming_batches_report_full_bounds() {
    init_logging();
    let coordinator = raster_coordinator();
    let (bounds, _bounds_sub) = record(&coordinator.events().timeseries_bounds);
    let (scales, _scale_sub) = record(&coordinator.events().x_scale_changed);

    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;

    assert_eq!(bounds.lock().last(), Bounds1D::new(0.0, 999.0).as_ref());
    let x_scale = scales.lock().last().copied().flatten().unwrap();
    assert_eq!((x_scale.min, x_scale.max), (0.0, 999.0));
    assert_eq!(coordinator.renderer_status(), RendererStatus::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backward_seek_drops_streamed_samples() {
    init_logging();
    let coordinator = raster_coordinator();
    let (bounds, _sub) = record(&coordinator.events().timeseries_bounds);
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;

    let after_seek = (100..110).map(|t| Sample::new(t as f64, 1.0)).collect();
    coordinator.handle_player_state(&PlayerState::new(109.0).with_messages("/a", after_seek));
    settle(&coordinator).await;

    assert_eq!(bounds.lock().last(), Bounds1D::new(100.0, 109.0).as_ref());
    let csv = coordinator.get_csv_data().await;
    assert_eq!(csv[0].points.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zoom_then_reset_restores_mapping() {
    init_logging();
    let coordinator = raster_coordinator();
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Light, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;
    let before = coordinator.scale().unwrap();

    let (viewport, _sub) = record(&coordinator.events().viewport_change);
    coordinator.add_interaction_event(InteractionEvent::Zoom {
        factor: 2.0,
        center: PixelPosition::new(400.0, 200.0),
    });
    assert_eq!(*viewport.lock(), vec![true]);
    assert!(coordinator.can_reset());
    settle(&coordinator).await;
    let zoomed = coordinator.scale().unwrap();
    assert!(zoomed.x.max - zoomed.x.min < before.x.max - before.x.min);

    coordinator.reset_bounds();
    coordinator.reset_bounds();
    assert_eq!(*viewport.lock(), vec![true, false]);
    settle(&coordinator).await;

    for pixel in [100.0, 400.0, 700.0] {
        let value = coordinator.get_x_value_at_pixel(pixel).unwrap();
        assert_close(value, before.x.pixel_to_value(pixel));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_custom_axis_reports_mismatched_paths() {
    init_logging();
    let coordinator = raster_coordinator();
    let (mismatched, _sub) =
        record(&coordinator.events().paths_with_mismatched_data_lengths_changed);

    let config = PlotConfig {
        x_axis_val: XAxisValue::Custom,
        x_axis_path: Some("/odom.x".to_string()),
        ..config(&["thatPath"])
    };
    coordinator.set_size(Size::new(400, 200));
    coordinator.handle_config(&config, ColorScheme::Dark, &HashMap::new());

    let xs = (0..5).map(|i| Sample::new(i as f64, i as f64)).collect();
    let ys = (0..8).map(|i| Sample::new(i as f64, (i * i) as f64)).collect();
    coordinator.handle_player_state(
        &PlayerState::new(7.0)
            .with_messages("/odom.x", xs)
            .with_messages("thatPath", ys),
    );
    settle(&coordinator).await;

    assert_eq!(*mismatched.lock(), vec![vec!["thatPath".to_string()]]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_global_bounds_only_apply_while_synced() {
    init_logging();
    let coordinator = raster_coordinator();
    let (viewport, _sub) = record(&coordinator.events().viewport_change);
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");

    coordinator.set_global_bounds(Bounds1D::new(100.0, 200.0));
    settle(&coordinator).await;
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(0.0, 999.0));
    assert!(viewport.lock().is_empty());

    coordinator.set_should_sync(true);
    settle(&coordinator).await;
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(100.0, 200.0));
    assert_eq!(*viewport.lock(), vec![true]);

    // interaction wins over the global range
    coordinator.add_interaction_event(InteractionEvent::Drag {
        start: PixelPosition::new(300.0, 10.0),
        end: PixelPosition::new(500.0, 10.0),
    });
    settle(&coordinator).await;
    let dragged = coordinator.scale().unwrap().x;
    assert!(dragged.min > 100.0 && dragged.max < 200.0);

    coordinator.reset_bounds();
    settle(&coordinator).await;
    assert_eq!(*viewport.lock(), vec![true, false]);
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(0.0, 999.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_synced_coordinators_converge() {
    init_logging();
    let panels = [raster_coordinator(), raster_coordinator()];
    let mut recorded = Vec::new();
    for panel in &panels {
        recorded.push(record(&panel.events().x_scale_changed));
        panel.set_size(Size::new(800, 400));
        panel.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
        panel.set_should_sync(true);
        panel.set_global_bounds(Bounds1D::new(0.0, 10.0));
        stream_batches(panel, "/a");
    }
    for panel in &panels {
        settle(panel).await;
    }

    let first = recorded[0].0.lock().last().copied().flatten().unwrap();
    let second = recorded[1].0.lock().last().copied().flatten().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.bounds(), Bounds1D::new(0.0, 10.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pixel_value_inverse() {
    init_logging();
    let coordinator = raster_coordinator();
    coordinator.set_size(Size::new(640, 480));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;

    let scale = coordinator.scale().unwrap();
    for value in [0.0, 123.4, 500.0, 999.0] {
        let pixel = scale.x.value_to_pixel(value);
        assert_close(coordinator.get_x_value_at_pixel(pixel).unwrap(), value);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hover_and_current_values() {
    init_logging();
    let coordinator = raster_coordinator();
    let (values, _sub) = record(&coordinator.events().current_values_changed);
    coordinator.register_transform("double", |v| v * 2.0);

    let mut doubled = PlotPath::new("/a");
    doubled.transform = Some(Transform::Custom("double".to_string()));
    let config = PlotConfig {
        paths: vec![PlotPath::new("/a"), doubled],
        ..PlotConfig::default()
    };
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config, ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    coordinator.set_hover_value(Some(500.0));
    settle(&coordinator).await;

    assert_eq!(values.lock().last(), Some(&vec![Some(999.0), Some(1998.0)]));

    let scale = coordinator.scale().unwrap();
    let pixel = PixelPosition::new(scale.x.value_to_pixel(500.0), scale.y.value_to_pixel(500.0));
    let hits = coordinator.get_elements_at_pixel(pixel).await;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].series_index, 0);
    assert_eq!(hits[0].data.x, 500.0);
}

/// Renderer answering with a fixed scale, optionally slowly
struct ScriptedRenderer {
    scale: Scale,
    delay: Duration,
    drops: Arc<AtomicUsize>,
}

impl ScriptedRenderer {
    fn new(offset: f64, delay: Duration, drops: Arc<AtomicUsize>) -> Self {
        let axis = AxisScale {
            min: offset,
            max: offset + 1.0,
            pixel_min: 0.0,
            pixel_max: 100.0,
        };
        Self {
            scale: Scale { x: axis, y: axis },
            delay,
            drops,
        }
    }
}

impl Drop for ScriptedRenderer {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChartRenderer for ScriptedRenderer {
    fn init(
        &mut self,
        _surface: Box<dyn RenderSurface>,
        _device_pixel_ratio: f64,
        _theme: ThemeColors,
    ) -> PlotResult<()> {
        Ok(())
    }

    fn update(&mut self, _action: UpdateAction) -> PlotResult<Option<Bounds>> {
        Ok(self.scale.bounds())
    }

    fn get_elements_at_pixel(&self, _pixel: PixelPosition) -> Vec<HoverElement> {
        Vec::new()
    }

    fn update_datasets(&mut self, _datasets: Vec<Dataset>) -> PlotResult<Option<Scale>> {
        std::thread::sleep(self.delay);
        Ok(Some(self.scale))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reply_from_replaced_renderer_is_dropped() {
    init_logging();
    let created = Arc::new(AtomicUsize::new(0));
    let drops = Arc::new(AtomicUsize::new(0));
    let (created_in, drops_in) = (Arc::clone(&created), Arc::clone(&drops));
    let coordinator = PlotCoordinator::with_renderer(
        Box::new(NullSurface::new()),
        CoordinatorOptions::default(),
        move || {
            // first renderer is slow and reports x in [0, 1], the next in [10, 11]
            let generation = created_in.fetch_add(1, Ordering::SeqCst);
            let (offset, delay) = if generation == 0 {
                (0.0, Duration::from_millis(400))
            } else {
                (10.0, Duration::ZERO)
            };
            Box::new(ScriptedRenderer::new(offset, delay, Arc::clone(&drops_in)))
                as Box<dyn ChartRenderer>
        },
    )
    .unwrap();
    let (scales, _sub) = record(&coordinator.events().x_scale_changed);

    coordinator.set_size(Size::new(100, 100));
    coordinator.handle_player_state(&PlayerState::new(1.0).with_messages("/a", vec![Sample::new(0.0, 1.0)]));
    tokio::time::sleep(Duration::from_millis(100)).await;

    coordinator.reinitialize(Box::new(NullSurface::new())).unwrap();
    wait_for_drops(&drops, 1).await;
    settle(&coordinator).await;

    let seen: Vec<Option<f64>> = scales.lock().iter().map(|s| s.map(|a| a.min)).collect();
    assert_eq!(seen, vec![Some(10.0)]);
    assert_eq!(coordinator.scale().unwrap().x.min, 10.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_destroy_is_idempotent_and_silent() {
    init_logging();
    let drops = Arc::new(AtomicUsize::new(0));
    let drops_in = Arc::clone(&drops);
    let coordinator = PlotCoordinator::with_renderer(
        Box::new(NullSurface::new()),
        CoordinatorOptions::default(),
        move || Box::new(ScriptedRenderer::new(0.0, Duration::ZERO, Arc::clone(&drops_in))) as Box<dyn ChartRenderer>,
    )
    .unwrap();
    coordinator.set_size(Size::new(100, 100));
    settle(&coordinator).await;

    let (bounds, _sub) = record(&coordinator.events().timeseries_bounds);
    coordinator.destroy();
    coordinator.destroy();
    wait_for_drops(&drops, 1).await;
    assert_eq!(coordinator.renderer_status(), RendererStatus::Destroyed);

    coordinator.handle_player_state(&PlayerState::new(1.0).with_messages("/a", vec![Sample::new(0.0, 1.0)]));
    coordinator.set_size(Size::new(10, 10));
    coordinator.reset_bounds();
    coordinator.add_interaction_event(InteractionEvent::Pan {
        delta_x: 5.0,
        delta_y: 0.0,
    });
    assert!(coordinator.reinitialize(Box::new(NullSurface::new())).is_ok());
    assert_eq!(coordinator.get_x_value_at_pixel(10.0), None);
    assert!(coordinator
        .get_elements_at_pixel(PixelPosition::new(1.0, 1.0))
        .await
        .is_empty());
    assert!(coordinator.get_csv_data().await.is_empty());
    settle(&coordinator).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(bounds.lock().is_empty());
    drop(coordinator);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_init_failure_then_reinitialize() {
    init_logging();
    let coordinator = PlotCoordinator::new(
        Box::new(NullSurface::refusing("no adapter")),
        CoordinatorOptions::default(),
    )
    .unwrap();
    settle(&coordinator).await;
    assert!(matches!(
        coordinator.renderer_status(),
        RendererStatus::Failed(PlotError::RendererInit { .. })
    ));

    // calls keep working as plain state updates
    coordinator.set_size(Size::new(400, 200));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;
    assert_eq!(coordinator.scale(), None);
    assert!(coordinator
        .get_elements_at_pixel(PixelPosition::new(10.0, 10.0))
        .await
        .is_empty());

    coordinator.reinitialize(Box::new(NullSurface::new())).unwrap();
    settle(&coordinator).await;
    assert_eq!(coordinator.renderer_status(), RendererStatus::Ready);
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(0.0, 999.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lost_surface_stops_rendering() {
    init_logging();
    let (surface, mut frames) = ChannelSurface::new();
    let hit_radius = DEFAULT_HIT_RADIUS;
    let coordinator = PlotCoordinator::with_renderer(
        Box::new(surface),
        CoordinatorOptions::default(),
        move || Box::new(RasterRenderer::new(hit_radius)) as Box<dyn ChartRenderer>,
    )
    .unwrap();
    let (errors, _errors_sub) = record(&coordinator.events().renderer_error);
    let (scales, _scales_sub) = record(&coordinator.events().x_scale_changed);

    coordinator.set_size(Size::new(200, 100));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;
    let frame = frames.try_recv().unwrap();
    assert_eq!((frame.width, frame.height), (200, 100));

    drop(frames);
    coordinator.handle_player_state(&PlayerState::new(1000.0).with_messages("/a", vec![Sample::new(1000.0, 1.0)]));
    settle(&coordinator).await;

    assert!(matches!(
        coordinator.renderer_status(),
        RendererStatus::Failed(PlotError::Surface { .. })
    ));
    assert_eq!(errors.lock().len(), 1);
    assert_eq!(scales.lock().last(), Some(&None));

    // no further renderer calls while failed
    coordinator.set_size(Size::new(300, 100));
    settle(&coordinator).await;
    assert_eq!(errors.lock().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_destroy_returns_while_render_in_flight() {
    init_logging();
    let drops = Arc::new(AtomicUsize::new(0));
    let drops_in = Arc::clone(&drops);
    let coordinator = PlotCoordinator::with_renderer(
        Box::new(NullSurface::new()),
        CoordinatorOptions::default(),
        move || {
            Box::new(ScriptedRenderer::new(0.0, Duration::from_secs(2), Arc::clone(&drops_in)))
                as Box<dyn ChartRenderer>
        },
    )
    .unwrap();
    coordinator.set_size(Size::new(100, 100));
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    coordinator.destroy();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(coordinator.renderer_status(), RendererStatus::Destroyed);
    settle(&coordinator).await;

    // the worker lets go once the slow call returns
    wait_for_drops(&drops, 1).await;
    assert_eq!(coordinator.scale(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_inverted_global_bounds_are_ignored() {
    init_logging();
    let coordinator = raster_coordinator();
    let (viewport, _viewport_sub) = record(&coordinator.events().viewport_change);
    let (scales, _scale_sub) = record(&coordinator.events().x_scale_changed);
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    coordinator.set_should_sync(true);
    stream_batches(&coordinator, "/a");

    coordinator.set_global_bounds(Some(Bounds1D { min: 10.0, max: 0.0 }));
    coordinator.set_global_bounds(Some(Bounds1D {
        min: f64::NAN,
        max: 5.0,
    }));
    settle(&coordinator).await;

    assert!(viewport.lock().is_empty());
    assert!(!coordinator.can_reset());
    for scale in scales.lock().iter().flatten() {
        assert!(scale.min <= scale.max, "{scale:?}");
    }
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(0.0, 999.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unbounded_bucket_ratio_still_renders() {
    init_logging();
    let options = CoordinatorOptions {
        buckets_per_pixel: f64::INFINITY,
        ..CoordinatorOptions::default()
    };
    let coordinator = PlotCoordinator::new(Box::new(NullSurface::new()), options).unwrap();
    coordinator.set_size(Size::new(400, 200));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    let samples = (0..6).map(|t| Sample::new(t as f64, t as f64)).collect();
    coordinator.handle_player_state(&PlayerState::new(5.0).with_messages("/a", samples));
    settle(&coordinator).await;

    assert_eq!(coordinator.renderer_status(), RendererStatus::Ready);
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(0.0, 5.0));
}

#[derive(Debug, Default)]
struct RendererLog {
    actions: Vec<&'static str>,
    dataset_calls: usize,
    last_x: Option<f64>,
}

/// Raster renderer that records what it is asked to do
struct RecordingRenderer {
    inner: RasterRenderer,
    dataset_delay: Duration,
    log: Arc<Mutex<RendererLog>>,
}

impl ChartRenderer for RecordingRenderer {
    fn init(
        &mut self,
        surface: Box<dyn RenderSurface>,
        device_pixel_ratio: f64,
        theme: ThemeColors,
    ) -> PlotResult<()> {
        self.inner.init(surface, device_pixel_ratio, theme)
    }

    fn update(&mut self, action: UpdateAction) -> PlotResult<Option<Bounds>> {
        self.log.lock().actions.push(action.name());
        self.inner.update(action)
    }

    fn get_elements_at_pixel(&self, pixel: PixelPosition) -> Vec<HoverElement> {
        self.inner.get_elements_at_pixel(pixel)
    }

    fn update_datasets(&mut self, datasets: Vec<Dataset>) -> PlotResult<Option<Scale>> {
        std::thread::sleep(self.dataset_delay);
        {
            let mut log = self.log.lock();
            log.dataset_calls += 1;
            log.last_x = datasets
                .first()
                .and_then(|d| d.points.last())
                .map(|p| p.x);
        }
        self.inner.update_datasets(datasets)
    }
}

fn recording_coordinator(dataset_delay: Duration) -> (PlotCoordinator, Arc<Mutex<RendererLog>>) {
    let log = Arc::new(Mutex::new(RendererLog::default()));
    let log_in = Arc::clone(&log);
    let coordinator = PlotCoordinator::with_renderer(
        Box::new(NullSurface::new()),
        CoordinatorOptions::default(),
        move || {
            Box::new(RecordingRenderer {
                inner: RasterRenderer::new(DEFAULT_HIT_RADIUS),
                dataset_delay,
                log: Arc::clone(&log_in),
            }) as Box<dyn ChartRenderer>
        },
    )
    .unwrap();
    (coordinator, log)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bursts_coalesce_into_latest_state() {
    init_logging();
    let (coordinator, log) = recording_coordinator(Duration::from_millis(5));
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;

    let log = log.lock();
    assert!(log.dataset_calls >= 1);
    assert!(log.dataset_calls < 20, "{} dataset uploads", log.dataset_calls);
    assert_eq!(log.last_x, Some(999.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_seek_resets_renderer_and_interaction() {
    init_logging();
    let (coordinator, log) = recording_coordinator(Duration::ZERO);
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    settle(&coordinator).await;
    assert!(!log.lock().actions.contains(&"seek"));

    let (viewport, _sub) = record(&coordinator.events().viewport_change);
    coordinator.add_interaction_event(InteractionEvent::Zoom {
        factor: 2.0,
        center: PixelPosition::new(400.0, 200.0),
    });
    settle(&coordinator).await;

    let after_seek = (100..110).map(|t| Sample::new(t as f64, 1.0)).collect();
    coordinator.handle_player_state(&PlayerState::new(109.0).with_messages("/a", after_seek));
    assert_eq!(*viewport.lock(), vec![true, false]);
    assert!(!coordinator.can_reset());
    settle(&coordinator).await;

    assert_eq!(
        log.lock().actions.iter().filter(|a| **a == "seek").count(),
        1
    );
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(100.0, 109.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_config_push_keeps_explicit_sync() {
    init_logging();
    let coordinator = raster_coordinator();
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    coordinator.set_should_sync(true);
    coordinator.set_global_bounds(Bounds1D::new(100.0, 200.0));

    // theme-only change leaves the sync flag alone
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Light, &HashMap::new());
    settle(&coordinator).await;
    assert!(coordinator.can_reset());
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(100.0, 200.0));

    // turning the flag off in config still applies
    let synced = PlotConfig {
        is_synced: true,
        ..config(&["/a"])
    };
    coordinator.handle_config(&synced, ColorScheme::Light, &HashMap::new());
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Light, &HashMap::new());
    settle(&coordinator).await;
    assert!(!coordinator.can_reset());
    assert_eq!(coordinator.scale().unwrap().x.bounds(), Bounds1D::new(0.0, 999.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_finite_time_does_not_break_seek_detection() {
    init_logging();
    let coordinator = raster_coordinator();
    let (bounds, _sub) = record(&coordinator.events().timeseries_bounds);
    coordinator.set_size(Size::new(800, 400));
    coordinator.handle_config(&config(&["/a"]), ColorScheme::Dark, &HashMap::new());
    stream_batches(&coordinator, "/a");
    coordinator.handle_player_state(&PlayerState::new(f64::NAN));
    settle(&coordinator).await;
    assert_eq!(bounds.lock().last(), Bounds1D::new(0.0, 999.0).as_ref());

    let after_seek = (100..110).map(|t| Sample::new(t as f64, 1.0)).collect();
    coordinator.handle_player_state(&PlayerState::new(109.0).with_messages("/a", after_seek));
    settle(&coordinator).await;
    assert_eq!(bounds.lock().last(), Bounds1D::new(100.0, 109.0).as_ref());
}
