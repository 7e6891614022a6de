use crate::metrics::SessionMetrics;
use crate::models::Visibility;
use crate::presentation::{PresentationEvent, Presenter};
use crate::state::SessionStateManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Title of the overlay's own top-level window
pub const APP_WINDOW_TITLE: &str = "Quick Search";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads the title of the OS's currently focused top-level window.
///
/// Implementations never fail: a missing window or empty title is reported as `""`.
pub trait ForegroundWindowInspector: Send + Sync {
    fn foreground_title(&self) -> String;
}

/// Win32 inspector: `GetForegroundWindow`, then the two-step length/text query
#[cfg(target_os = "windows")]
#[derive(Debug, Default)]
pub struct Win32ForegroundInspector;

#[cfg(target_os = "windows")]
impl ForegroundWindowInspector for Win32ForegroundInspector {
    fn foreground_title(&self) -> String {
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
        };

        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_null() {
            return String::new();
        }

        let len = unsafe { GetWindowTextLengthW(hwnd) };
        if len <= 0 {
            return String::new();
        }

        // One extra unit for the terminating NUL
        let mut buf = vec![0u16; len as usize + 1];
        let copied = unsafe { GetWindowTextW(hwnd, buf.as_mut_ptr(), buf.len() as i32) };
        if copied <= 0 {
            return String::new();
        }

        String::from_utf16_lossy(&buf[..copied as usize])
    }
}

/// The platform inspector, if this platform has one
pub fn default_inspector() -> Option<Arc<dyn ForegroundWindowInspector>> {
    #[cfg(target_os = "windows")]
    {
        Some(Arc::new(Win32ForegroundInspector))
    }

    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}

/// What a poll tick asks the worker to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityAction {
    None,
    Hide,
}

/// Decides on hide transitions from successive foreground titles.
///
/// Seeing the app's own title marks the window visible (bookkeeping only, this
/// never shows anything). A different title while visible produces exactly one
/// hide; further mismatches while hidden are ignored.
#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    app_title: String,
    visibility: Visibility,
}

impl VisibilityTracker {
    pub fn new(app_title: impl Into<String>, initial: Visibility) -> Self {
        Self {
            app_title: app_title.into(),
            visibility: initial,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Sync with a change made elsewhere, e.g. a hotkey show
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn observe(&mut self, title: &str) -> VisibilityAction {
        if title == self.app_title {
            self.visibility = Visibility::Visible;
            return VisibilityAction::None;
        }

        match self.visibility {
            Visibility::Visible => {
                self.visibility = Visibility::Hidden;
                VisibilityAction::Hide
            }
            Visibility::Hidden => VisibilityAction::None,
        }
    }
}

/// Polls the foreground window and hides the overlay once focus leaves it
pub struct VisibilityMonitor {
    inspector: Arc<dyn ForegroundWindowInspector>,
    presenter: Arc<dyn Presenter>,
    state: Arc<SessionStateManager>,
    metrics: Arc<SessionMetrics>,
    app_title: String,
    interval: Duration,
}

impl VisibilityMonitor {
    pub fn new(
        inspector: Arc<dyn ForegroundWindowInspector>,
        presenter: Arc<dyn Presenter>,
        state: Arc<SessionStateManager>,
        metrics: Arc<SessionMetrics>,
        app_title: impl Into<String>,
    ) -> Self {
        Self {
            inspector,
            presenter,
            state,
            metrics,
            app_title: app_title.into(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn tick(&self, tracker: &mut VisibilityTracker) {
        // The hotkey worker may have shown the window since the last tick
        tracker.set_visibility(self.state.read(|state| state.visibility));

        let title = self.inspector.foreground_title();
        self.state.set_last_title(&title);

        match tracker.observe(&title) {
            VisibilityAction::Hide => {
                tracing::debug!("Focus moved to '{}', hiding window", title);
                self.state.set_visibility(Visibility::Hidden);
                self.presenter.hide_window();
                self.presenter.emit(PresentationEvent::HidApp);
                self.metrics.record_hide();
            }
            VisibilityAction::None => {
                if tracker.visibility() == Visibility::Visible {
                    self.state.set_visibility(Visibility::Visible);
                }
            }
        }
    }

    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        tracing::debug!("Visibility monitor started ({:?} interval)", self.interval);

        let mut tracker = VisibilityTracker::new(self.app_title.clone(), Visibility::Hidden);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = super::shutdown_requested(&mut shutdown_rx) => {
                    tracing::debug!("Visibility monitor received shutdown signal");
                    break;
                }
                _ = ticker.tick() => self.tick(&mut tracker),
            }
        }

        tracing::debug!("Visibility monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hides_for(titles: &[&str]) -> usize {
        let mut tracker = VisibilityTracker::new(APP_WINDOW_TITLE, Visibility::Hidden);
        titles
            .iter()
            .filter(|title| tracker.observe(title) == VisibilityAction::Hide)
            .count()
    }

    #[test]
    fn test_matching_title_never_hides() {
        assert_eq!(hides_for(&[APP_WINDOW_TITLE; 5]), 0);
    }

    #[test]
    fn test_single_hide_per_focus_loss() {
        let titles = [
            APP_WINDOW_TITLE,
            "Editor",
            "Terminal",
            "",
            APP_WINDOW_TITLE,
            APP_WINDOW_TITLE,
            "Browser",
        ];
        assert_eq!(hides_for(&titles), 2);
    }

    #[test]
    fn test_empty_title_counts_as_mismatch() {
        assert_eq!(hides_for(&[APP_WINDOW_TITLE, ""]), 1);
    }

    #[test]
    fn test_hidden_start_ignores_foreign_titles() {
        assert_eq!(hides_for(&["Editor", "Terminal"]), 0);
    }

    #[test]
    fn test_externally_shown_window_hides_on_mismatch() {
        let mut tracker = VisibilityTracker::new(APP_WINDOW_TITLE, Visibility::Hidden);
        tracker.set_visibility(Visibility::Visible);
        assert_eq!(tracker.observe("Editor"), VisibilityAction::Hide);
        assert_eq!(tracker.visibility(), Visibility::Hidden);
    }

    proptest! {
        #[test]
        fn prop_hides_equal_app_to_foreign_transitions(
            focus in proptest::collection::vec(any::<bool>(), 0..64)
        ) {
            let titles: Vec<&str> = focus
                .iter()
                .map(|&own| if own { APP_WINDOW_TITLE } else { "Other" })
                .collect();

            let expected = titles
                .windows(2)
                .filter(|pair| pair[0] == APP_WINDOW_TITLE && pair[1] != APP_WINDOW_TITLE)
                .count();

            prop_assert_eq!(hides_for(&titles), expected);
        }
    }
}
