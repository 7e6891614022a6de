// State management module
//
// This module provides the SessionStateManager which wraps SessionState with thread-safe
// access using Arc<RwLock<T>> and emits change events for interested listeners.

use crate::models::{SessionState, Visibility};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when session state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum SessionChange {
    /// The believed window visibility flipped
    VisibilityChanged { visible: bool },

    /// The foreground window title differs from the previous poll
    ForegroundTitleChanged { title: String },

    /// The global hotkey was registered with the OS
    HotkeyRegistered,
}

/// Thread-safe session state with event emission
///
/// The hotkey and visibility workers each mutate the state through
/// [`update()`](Self::update); neither holds the lock across an await point.
pub struct SessionStateManager {
    state: Arc<RwLock<SessionState>>,
    state_tx: broadcast::Sender<SessionChange>,
}

impl SessionStateManager {
    /// Create a new manager with hidden, unregistered state
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            state_tx,
        }
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Apply `update_fn`, then broadcast whatever changed
    pub fn update<F>(&self, update_fn: F) -> Vec<SessionChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &SessionState, new: &SessionState) -> Vec<SessionChange> {
        let mut changes = Vec::new();

        if old.visibility != new.visibility {
            changes.push(SessionChange::VisibilityChanged {
                visible: new.is_visible(),
            });
        }

        if old.last_title != new.last_title {
            changes.push(SessionChange::ForegroundTitleChanged {
                title: new.last_title.clone(),
            });
        }

        if !old.hotkey_registered && new.hotkey_registered {
            changes.push(SessionChange::HotkeyRegistered);
        }

        changes
    }

    /// Record the believed visibility; returns the previous value
    pub fn set_visibility(&self, visibility: Visibility) -> Visibility {
        let mut previous = visibility;
        self.update(|state| {
            previous = state.visibility;
            state.visibility = visibility;
        });
        previous
    }

    pub fn set_last_title(&self, title: &str) {
        if self.read(|state| state.last_title == title) {
            return;
        }
        self.update(|state| state.last_title = title.to_string());
    }

    pub fn mark_hotkey_registered(&self) -> Vec<SessionChange> {
        self.update(|state| state.hotkey_registered = true)
    }

    pub fn is_visible(&self) -> bool {
        self.read(|state| state.is_visible())
    }
}

impl Default for SessionStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_manager_creation() {
        let manager = SessionStateManager::new();
        assert_eq!(manager.snapshot(), SessionState::default());
    }

    #[test]
    fn test_visibility_change_detected() {
        let manager = SessionStateManager::new();

        let previous = manager.set_visibility(Visibility::Visible);
        assert_eq!(previous, Visibility::Hidden);
        assert!(manager.is_visible());

        let changes = manager.update(|state| state.visibility = Visibility::Hidden);
        assert_eq!(changes, vec![SessionChange::VisibilityChanged { visible: false }]);
    }

    #[test]
    fn test_no_change_no_event() {
        let manager = SessionStateManager::new();
        let changes = manager.update(|state| state.visibility = Visibility::Hidden);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_hotkey_registered_event_fires_once() {
        let manager = SessionStateManager::new();
        assert_eq!(
            manager.mark_hotkey_registered(),
            vec![SessionChange::HotkeyRegistered]
        );
        assert!(manager.mark_hotkey_registered().is_empty());
    }

    #[test]
    fn test_set_last_title() {
        let manager = SessionStateManager::new();
        manager.set_last_title("Editor");
        manager.set_last_title("Editor");
        assert_eq!(manager.read(|state| state.last_title.clone()), "Editor");
    }
}
