//! Owns the render worker and turns its message protocol into async calls
//!
//! The renderer lives on a dedicated thread for its whole life. Requests go
//! over an unbounded channel in order; each carries a oneshot for its reply.
//! Dropping the bridge (or calling [`RendererBridge::dispose`]) closes the
//! channel and joins the thread, which drops the renderer and its surface.

use std::thread;

use parking_lot::Mutex;
use renderer::{ChartRenderer, RenderSurface};
use shared_types::{
    map_plot_error, Bounds, Dataset, HoverElement, PixelPosition, PlotError, PlotResult, Scale,
    ThemeColors, UpdateAction,
};
use tokio::sync::{mpsc, oneshot, OnceCell};
use uuid::Uuid;

/// Builds the renderer on the worker thread
pub type RendererFactory = Box<dyn FnOnce() -> Box<dyn ChartRenderer> + Send>;

enum RendererRequest {
    Update {
        action: UpdateAction,
        reply: oneshot::Sender<PlotResult<Option<Bounds>>>,
    },
    ElementsAtPixel {
        pixel: PixelPosition,
        reply: oneshot::Sender<Vec<HoverElement>>,
    },
    UpdateDatasets {
        datasets: Vec<Dataset>,
        reply: oneshot::Sender<PlotResult<Option<Scale>>>,
    },
}

/// Handle to a renderer running on its own worker thread
pub struct RendererBridge {
    id: Uuid,
    sender: Mutex<Option<mpsc::UnboundedSender<RendererRequest>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    init_reply: Mutex<Option<oneshot::Receiver<PlotResult<()>>>>,
    init_result: OnceCell<PlotResult<()>>,
}

impl RendererBridge {
    /// Start the worker. The surface moves to the worker and is only ever
    /// touched by the renderer from then on.
    pub fn spawn(
        surface: Box<dyn RenderSurface>,
        device_pixel_ratio: f64,
        theme: ThemeColors,
        factory: RendererFactory,
    ) -> PlotResult<Self> {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let (init_tx, init_rx) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name(format!("plot-renderer-{}", &id.simple().to_string()[..8]))
            .spawn(move || {
                run_worker(
                    factory,
                    surface,
                    device_pixel_ratio,
                    theme,
                    init_tx,
                    receiver,
                )
            });
        let worker = map_plot_error!(spawned, RendererInit, "failed to start render worker")?;

        log::info!("[RendererBridge] Worker {id} started");
        Ok(Self {
            id,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            init_reply: Mutex::new(Some(init_rx)),
            init_result: OnceCell::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolves once the renderer finished `init`, with its outcome
    pub async fn ready(&self) -> PlotResult<()> {
        self.init_result
            .get_or_init(|| async {
                let receiver = self.init_reply.lock().take();
                match receiver {
                    Some(receiver) => receiver
                        .await
                        .unwrap_or(Err(PlotError::WorkerDisconnected)),
                    None => Err(PlotError::WorkerDisconnected),
                }
            })
            .await
            .clone()
    }

    pub async fn update(&self, action: UpdateAction) -> PlotResult<Option<Bounds>> {
        let (reply, response) = oneshot::channel();
        self.send(RendererRequest::Update { action, reply })?;
        response.await.map_err(|_| PlotError::WorkerDisconnected)?
    }

    pub async fn get_elements_at_pixel(
        &self,
        pixel: PixelPosition,
    ) -> PlotResult<Vec<HoverElement>> {
        let (reply, response) = oneshot::channel();
        self.send(RendererRequest::ElementsAtPixel { pixel, reply })?;
        response.await.map_err(|_| PlotError::WorkerDisconnected)
    }

    pub async fn update_datasets(&self, datasets: Vec<Dataset>) -> PlotResult<Option<Scale>> {
        let (reply, response) = oneshot::channel();
        self.send(RendererRequest::UpdateDatasets { datasets, reply })?;
        response.await.map_err(|_| PlotError::WorkerDisconnected)?
    }

    pub fn is_disposed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Stop the worker and release the renderer. Safe to call repeatedly;
    /// only the first call does anything.
    ///
    /// Never waits for the worker. A renderer call still running finishes on
    /// the worker, which then drops the renderer and its surface.
    pub fn dispose(&self) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        drop(sender);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            reap_worker(self.id, worker);
        }
        log::info!("[RendererBridge] Worker {} disposed", self.id);
    }

    fn send(&self, request: RendererRequest) -> PlotResult<()> {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(PlotError::RendererUnavailable {
                message: "renderer bridge disposed".to_string(),
            });
        };
        sender
            .send(request)
            .map_err(|_| PlotError::WorkerDisconnected)
    }
}

impl Drop for RendererBridge {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for RendererBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererBridge")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Join a finished worker in place; otherwise join it from a short-lived
/// reaper thread so the caller never blocks on a busy renderer.
fn reap_worker(id: Uuid, worker: thread::JoinHandle<()>) {
    if worker.is_finished() {
        join_worker(id, worker);
        return;
    }
    let reaper = thread::Builder::new()
        .name(format!("plot-reaper-{}", &id.simple().to_string()[..8]))
        .spawn(move || join_worker(id, worker));
    if let Err(err) = reaper {
        log::warn!("[RendererBridge] Worker {id} left detached: {err}");
    }
}

fn join_worker(id: Uuid, worker: thread::JoinHandle<()>) {
    if worker.join().is_err() {
        log::error!("[RendererBridge] Worker {id} panicked");
    }
}

fn run_worker(
    factory: RendererFactory,
    surface: Box<dyn RenderSurface>,
    device_pixel_ratio: f64,
    theme: ThemeColors,
    init_tx: oneshot::Sender<PlotResult<()>>,
    mut receiver: mpsc::UnboundedReceiver<RendererRequest>,
) {
    let mut renderer = factory();
    let init = renderer.init(surface, device_pixel_ratio, theme);
    if let Err(err) = &init {
        log::error!("[RendererBridge] Renderer init failed: {err}");
    }
    let unavailable = init.as_ref().err().map(|err| PlotError::RendererUnavailable {
        message: err.to_string(),
    });
    let _ = init_tx.send(init);

    while let Some(request) = receiver.blocking_recv() {
        match request {
            RendererRequest::Update { action, reply } => {
                let result = match &unavailable {
                    Some(err) => Err(err.clone()),
                    None => renderer.update(action),
                };
                let _ = reply.send(result);
            }
            RendererRequest::ElementsAtPixel { pixel, reply } => {
                let elements = match &unavailable {
                    Some(_) => Vec::new(),
                    None => renderer.get_elements_at_pixel(pixel),
                };
                let _ = reply.send(elements);
            }
            RendererRequest::UpdateDatasets { datasets, reply } => {
                let result = match &unavailable {
                    Some(err) => Err(err.clone()),
                    None => renderer.update_datasets(datasets),
                };
                let _ = reply.send(result);
            }
        }
    }
    log::debug!("[RendererBridge] Request channel closed, releasing renderer");
}
