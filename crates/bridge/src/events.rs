//! Typed event channels emitted by the plot coordinator
//!
//! Listeners are called synchronously on the emitting thread, outside the
//! channel lock. A [`Subscription`] removes its listener when dropped.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shared_types::{AxisScale, Bounds1D, PlotError};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ChannelInner<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
    closed: bool,
}

/// A named, multi-listener event channel
pub struct EventChannel<T> {
    name: &'static str,
    inner: Arc<Mutex<ChannelInner<T>>>,
}

impl<T: Send + 'static> EventChannel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(ChannelInner {
                next_id: 0,
                listeners: Vec::new(),
                closed: false,
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a listener. Subscribing to a closed channel yields an inert subscription.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Subscription { cancel: None };
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));

        let weak: Weak<Mutex<ChannelInner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().listeners.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn emit(&self, value: &T) {
        let listeners: Vec<Listener<T>> = {
            let inner = self.inner.lock();
            if inner.closed {
                return;
            }
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        log::trace!("[EventChannel] {} -> {} listeners", self.name, listeners.len());
        for listener in listeners {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Drop every listener and ignore later emits
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.listeners.clear();
    }
}

/// Keeps a listener registered; dropping it unsubscribes
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener for as long as the channel lives
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Every event the coordinator emits
pub struct PlotEvents {
    /// Full X range of the resolved datasets
    pub timeseries_bounds: EventChannel<Bounds1D>,
    /// Realized X scale after a draw; `None` once the renderer is unavailable
    pub x_scale_changed: EventChannel<Option<AxisScale>>,
    /// Value of each configured path at the playback position
    pub current_values_changed: EventChannel<Vec<Option<f64>>>,
    pub paths_with_mismatched_data_lengths_changed: EventChannel<Vec<String>>,
    /// Whether the viewport is overridden and can be reset
    pub viewport_change: EventChannel<bool>,
    pub renderer_error: EventChannel<PlotError>,
}

impl PlotEvents {
    pub fn new() -> Self {
        Self {
            timeseries_bounds: EventChannel::new("timeseriesBounds"),
            x_scale_changed: EventChannel::new("xScaleChanged"),
            current_values_changed: EventChannel::new("currentValuesChanged"),
            paths_with_mismatched_data_lengths_changed: EventChannel::new(
                "pathsWithMismatchedDataLengthsChanged",
            ),
            viewport_change: EventChannel::new("viewportChange"),
            renderer_error: EventChannel::new("rendererError"),
        }
    }

    pub(crate) fn close(&self) {
        self.timeseries_bounds.close();
        self.x_scale_changed.close();
        self.current_values_changed.close();
        self.paths_with_mismatched_data_lengths_changed.close();
        self.viewport_change.close();
        self.renderer_error.close();
    }
}

impl Default for PlotEvents {
    fn default() -> Self {
        Self::new()
    }
}
