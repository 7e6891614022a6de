/// Window visibility as believed by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Visible,
    #[default]
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Ephemeral per-process session state.
///
/// Created once at startup and dropped at exit; never persisted.
///
/// # Thread Safety
///
/// Shared between the hotkey and visibility workers through
/// [`crate::state::SessionStateManager`]; never mutate it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub visibility: Visibility,

    /// Title of the foreground window at the most recent poll
    pub last_title: String,

    pub hotkey_registered: bool,
}

impl SessionState {
    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_starts_hidden() {
        let state = SessionState::default();
        assert!(!state.is_visible());
        assert!(state.last_title.is_empty());
        assert!(!state.hotkey_registered);
    }
}
