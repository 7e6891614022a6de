//! Data models for the Bolt session core.
//!
//! - [`Config`]: Persisted settings loaded from `config.json`
//! - [`Rules`]: Name/path/regex exclusion sets with union semantics
//! - [`SessionState`]: Ephemeral visibility and hotkey bookkeeping for one process run
//!
//! # Architecture Note
//!
//! `Config` and `Rules` derive `Serialize`/`Deserialize` for JSON persistence.
//! `SessionState` is never persisted; it lives behind
//! [`SessionStateManager`](crate::state::SessionStateManager) for the lifetime of the process.

pub mod config;
pub mod session_state;

pub use config::{CompiledRules, Config, DEFAULT_EXCLUDED_DIR_NAMES, Rules};
pub use session_state::{SessionState, Visibility};
