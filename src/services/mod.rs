//! Services module - The long-lived session workers and their OS seams.
//!
//! # Components
//!
//! - [`HotkeyListener`]: Turns global hotkey key-downs into "show window" side effects.
//!   The OS binding sits behind [`HotkeySource`] ([`NativeHotkeySource`] in production).
//! - [`VisibilityMonitor`]: Polls the foreground window every 100 ms and hides the
//!   overlay when focus leaves it. The OS query sits behind [`ForegroundWindowInspector`].
//! - [`ResultRelay`]: Forwards search-result batches to the presentation layer in
//!   receipt order, dropping batches from superseded searches.
//! - [`ImageCatalog`] and [`open_file_location`]: Small helpers behind presentation calls.
//!
//! Every worker's `run` loop races its input against a `watch` shutdown signal, so
//! each one stops promptly and independently when the session shuts down.

pub mod file_location;
pub mod hotkey;
pub mod images;
pub mod relay;
pub mod visibility;

pub use file_location::{RevealCommand, open_file_location};
pub use hotkey::{
    DEFAULT_HOTKEY, HotkeyBinding, HotkeyError, HotkeyListener, HotkeySignal, HotkeySource,
    NativeHotkeySource,
};
pub use images::{ImageCatalog, KNOWN_IMAGES};
pub use relay::{
    BatchSink, NoopSearchEngine, RelayClosed, ResultBatch, ResultQueue, ResultRelay,
    SearchEngine, SearchGeneration,
};
pub use visibility::{
    APP_WINDOW_TITLE, DEFAULT_POLL_INTERVAL, ForegroundWindowInspector, VisibilityAction,
    VisibilityMonitor, VisibilityTracker, default_inspector,
};

use tokio::sync::watch;

/// Resolves once shutdown is requested or the session's sender is gone
pub(crate) async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}
