// Session controller - Composes the session workers at startup
//
// The controller owns no business logic. It registers the hotkey (fatal on
// failure), builds one SessionContext, spawns the hotkey, visibility and relay
// workers on the current tokio runtime, and hands back a Session that serves
// presentation calls until shutdown.

use crate::metrics::SessionMetrics;
use crate::models::Visibility;
use crate::presentation::{PresentationCall, PresentationEvent, Presenter};
use crate::services::{
    APP_WINDOW_TITLE, DEFAULT_HOTKEY, DEFAULT_POLL_INTERVAL, ForegroundWindowInspector,
    HotkeyBinding, HotkeyError, HotkeyListener, HotkeySource, ImageCatalog, NativeHotkeySource,
    NoopSearchEngine, ResultQueue, ResultRelay, SearchEngine, VisibilityMonitor,
    default_inspector,
};
use crate::state::SessionStateManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Hotkey registration failed: {0}")]
    Hotkey(#[from] HotkeyError),
}

/// Everything the workers share, built once per process
#[derive(Clone)]
pub struct SessionContext {
    pub presenter: Arc<dyn Presenter>,
    pub state: Arc<SessionStateManager>,
    pub metrics: Arc<SessionMetrics>,
    pub app_title: String,
    shutdown_rx: watch::Receiver<bool>,
}

impl SessionContext {
    /// A fresh receiver for one worker's shutdown signal
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }
}

/// Startup wiring for a session
///
/// # Example
/// ```ignore
/// let (presenter, command_rx) = ChannelPresenter::new();
/// let session = SessionController::new(Arc::new(presenter))
///     .with_search_engine(Arc::new(MyEngine::new(&config)))
///     .start()?;
/// ```
pub struct SessionController {
    presenter: Arc<dyn Presenter>,
    hotkey_source: Box<dyn HotkeySource>,
    binding: String,
    inspector: Option<Arc<dyn ForegroundWindowInspector>>,
    search_engine: Arc<dyn SearchEngine>,
    images: ImageCatalog,
    app_title: String,
    poll_interval: Duration,
}

impl SessionController {
    /// Controller with the native hotkey, the platform inspector and no search engine
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            presenter,
            hotkey_source: Box::new(NativeHotkeySource::new()),
            binding: DEFAULT_HOTKEY.to_string(),
            inspector: default_inspector(),
            search_engine: Arc::new(NoopSearchEngine),
            images: ImageCatalog::new(),
            app_title: APP_WINDOW_TITLE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_hotkey_source(mut self, source: Box<dyn HotkeySource>) -> Self {
        self.hotkey_source = source;
        self
    }

    /// Replace the platform inspector; `None` disables the visibility worker
    pub fn with_inspector(mut self, inspector: Option<Arc<dyn ForegroundWindowInspector>>) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn with_search_engine(mut self, engine: Arc<dyn SearchEngine>) -> Self {
        self.search_engine = engine;
        self
    }

    pub fn with_images(mut self, images: ImageCatalog) -> Self {
        self.images = images;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Register the hotkey and spawn the workers on the current tokio runtime.
    ///
    /// A hotkey the OS refuses is returned as an error; callers treat it as fatal.
    pub fn start(mut self) -> Result<Session, SessionError> {
        let binding: HotkeyBinding = self.binding.parse()?;
        let signals = match self.hotkey_source.register(&binding) {
            Ok(signals) => signals,
            Err(e) => {
                tracing::error!("Main hotkey {} failed to register: {}", binding, e);
                return Err(e.into());
            }
        };

        let state = Arc::new(SessionStateManager::new());
        state.mark_hotkey_registered();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = SessionContext {
            presenter: self.presenter.clone(),
            state,
            metrics: Arc::new(SessionMetrics::new()),
            app_title: self.app_title.clone(),
            shutdown_rx,
        };

        let (queue, batch_rx) = ResultQueue::new();
        let mut workers = Vec::with_capacity(3);

        let relay = ResultRelay::new(
            ctx.presenter.clone(),
            queue.generation().clone(),
            ctx.metrics.clone(),
        );
        workers.push(tokio::spawn(relay.run(batch_rx, ctx.shutdown_signal())));

        let listener = HotkeyListener::new(ctx.presenter.clone(), ctx.state.clone(), ctx.metrics.clone());
        workers.push(tokio::spawn(listener.run(signals, ctx.shutdown_signal())));

        match self.inspector.take() {
            Some(inspector) => {
                let monitor = VisibilityMonitor::new(
                    inspector,
                    ctx.presenter.clone(),
                    ctx.state.clone(),
                    ctx.metrics.clone(),
                    ctx.app_title.clone(),
                )
                .with_interval(self.poll_interval);
                workers.push(tokio::spawn(monitor.run(ctx.shutdown_signal())));
            }
            None => {
                tracing::warn!(
                    "No foreground window inspector on this platform - window will not auto-hide"
                );
            }
        }

        tracing::info!("Session started with {} worker(s)", workers.len());

        Ok(Session {
            ctx,
            queue,
            search_engine: self.search_engine,
            images: self.images,
            shutdown_tx,
            workers,
            _hotkey_source: self.hotkey_source,
        })
    }
}

/// A running session: the workers plus the presentation-call surface
pub struct Session {
    ctx: SessionContext,
    queue: ResultQueue,
    search_engine: Arc<dyn SearchEngine>,
    images: ImageCatalog,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
    // Dropping the source releases the OS binding
    _hotkey_source: Box<dyn HotkeySource>,
}

impl Session {
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn state(&self) -> &Arc<SessionStateManager> {
        &self.ctx.state
    }

    pub fn metrics(&self) -> &Arc<SessionMetrics> {
        &self.ctx.metrics
    }

    /// Start a search; results arrive later as `searchResult` events.
    ///
    /// An empty query skips the search engine and yields one empty batch.
    /// Either way any in-flight search is superseded.
    pub fn launch_search(&self, query: &str) {
        self.ctx.metrics.record_search_launched();
        let sink = self.queue.begin_search();

        if query.is_empty() {
            if sink.send(Vec::new()).is_err() {
                tracing::warn!("Result relay has stopped - dropping empty result");
            }
            return;
        }

        tracing::debug!("Launching search {} for {} chars", sink.generation(), query.len());
        self.search_engine.start_search(query, sink);
    }

    /// `data:` URI for the named icon, or `""` if unknown
    pub fn request_image(&self, name: &str) -> String {
        self.images.data_uri(name)
    }

    pub fn open_file_location(&self, path: &str) {
        if let Err(e) = crate::services::open_file_location(path) {
            tracing::error!("Failed to open file location {}: {}", path, e);
        }
    }

    /// The front end hid itself; keep the session's belief in sync
    pub fn hide_window(&self) {
        self.ctx.state.set_visibility(Visibility::Hidden);
        self.ctx.presenter.hide_window();
        self.ctx.presenter.emit(PresentationEvent::HidApp);
    }

    /// Dispatch one call from the presentation layer
    pub fn handle_call(&self, call: PresentationCall) {
        match call {
            PresentationCall::RequestImage { id, name } => {
                self.ctx.presenter.reply(id, self.request_image(&name));
            }
            PresentationCall::LaunchSearch { query } => self.launch_search(&query),
            PresentationCall::OpenFileLocation { path } => self.open_file_location(&path),
            PresentationCall::HideWindow => self.hide_window(),
            PresentationCall::LogError { message } => {
                tracing::error!(target: "frontend", "{}", message);
            }
        }
    }

    /// Signal every worker to stop and wait for them
    pub async fn shutdown(self) {
        tracing::info!("Shutting down session");
        let _ = self.shutdown_tx.send(true);

        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!("Session worker panicked: {}", e);
            }
        }

        self.ctx.metrics.log_summary();
        tracing::info!("Session shutdown complete");
    }
}
