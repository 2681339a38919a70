use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::config::WorkerConfig;
use super::stop::StopHandle;
use super::worker::Worker;
use crate::events::Bus;
use crate::processor::ProcessorRef;
use crate::subscribers::Subscribe;
use crate::transport::{Connect, Endpoint, SocketConnector};

/// Builder for constructing a [`Worker`].
///
/// Defaults: [`WorkerConfig::default`], a [`SocketConnector`] using the
/// config's connect timeout, no stop predicate, and (with the `logging`
/// feature) a [`LogWriter`](crate::LogWriter) subscriber.
pub struct WorkerBuilder {
    endpoint: Endpoint,
    processor: ProcessorRef,
    cfg: WorkerConfig,
    connector: Option<Arc<dyn Connect>>,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
    stop: StopHandle,
    service: Option<Arc<str>>,
}

impl WorkerBuilder {
    /// Creates a builder for `endpoint` dispatching to `processor`.
    pub fn new(endpoint: Endpoint, processor: ProcessorRef) -> Self {
        Self {
            endpoint,
            processor,
            cfg: WorkerConfig::default(),
            connector: None,
            subscribers: None,
            stop: StopHandle::new(),
            service: None,
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, cfg: WorkerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Uses a custom connector instead of real sockets.
    ///
    /// The connector is responsible for its own connect timeout.
    pub fn connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets event subscribers, replacing the defaults.
    ///
    /// Pass an empty vector to run without any subscriber.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Installs the stop predicate polled after every heartbeat.
    pub fn stop_predicate<F>(self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.stop.set(predicate);
        self
    }

    /// Uses an existing stop handle, e.g. one shared by several workers.
    pub fn stop_handle(mut self, handle: StopHandle) -> Self {
        self.stop = handle;
        self
    }

    /// Labels every event from this worker with `service`.
    pub fn service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Builds the worker. Nothing is spawned until [`Worker::run`].
    pub fn build(self) -> Worker {
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(SocketConnector::new(self.cfg.connect_timeout_opt())));
        let subscribers = self.subscribers.unwrap_or_else(default_subscribers);

        Worker {
            bus: Bus::new(self.cfg.bus_capacity_clamped()),
            endpoint: self.endpoint,
            processor: self.processor,
            connector,
            cfg: self.cfg,
            alive: AtomicBool::new(true),
            stop: self.stop,
            subscribers,
            service: self.service,
        }
    }
}

#[cfg(feature = "logging")]
fn default_subscribers() -> Vec<Arc<dyn Subscribe>> {
    vec![Arc::new(crate::subscribers::LogWriter) as Arc<dyn Subscribe>]
}

#[cfg(not(feature = "logging"))]
fn default_subscribers() -> Vec<Arc<dyn Subscribe>> {
    Vec::new()
}
