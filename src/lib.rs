// Bolt - Quick-search overlay session core
//
// This is the library crate containing the session controller, its workers and
// the on-disk bootstrap. The binary crate (main.rs) hosts it over stdio.

pub mod bootstrap;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod presentation;
pub mod services;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use bootstrap::{BootstrapManager, BootstrapPaths, BootstrapReport};
pub use config::ConfigStore;
pub use models::{Config, Rules, SessionState, Visibility};
pub use presentation::{ChannelPresenter, PresentationCall, PresentationEvent, Presenter};
pub use session::{Session, SessionController};
pub use state::{SessionChange, SessionStateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
