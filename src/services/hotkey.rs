use crate::metrics::SessionMetrics;
use crate::models::Visibility;
use crate::presentation::Presenter;
use crate::state::SessionStateManager;
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Global binding that brings the overlay up
pub const DEFAULT_HOTKEY: &str = "ctrl+shift+s";

/// How long the native listener thread waits for an event before checking for shutdown
const NATIVE_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("Invalid hotkey '{0}'")]
    InvalidBinding(String),

    #[error("OS refused hotkey {binding}: {reason}")]
    RegistrationFailed { binding: String, reason: String },

    #[error("Hotkey listener unavailable: {0}")]
    ListenerUnavailable(String),
}

/// A modifier set plus one key, e.g. `ctrl+shift+s`
///
/// Key and modifier names follow `global-hotkey`'s accelerator syntax; at least
/// one modifier is required so the binding cannot swallow plain typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    label: String,
    hotkey: HotKey,
}

impl HotkeyBinding {
    /// The OS-level hotkey this binding registers
    pub fn hotkey(&self) -> HotKey {
        self.hotkey
    }
}

impl FromStr for HotkeyBinding {
    type Err = HotkeyError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || HotkeyError::InvalidBinding(input.to_string());

        let tokens: Vec<&str> = input.split('+').map(str::trim).collect();
        if tokens.len() < 2 || tokens.iter().any(|token| token.is_empty()) {
            return Err(invalid());
        }

        let label = tokens.join("+").to_ascii_lowercase();
        // Every token before the last is read as a modifier, so two tokens guarantee one
        let hotkey: HotKey = label.parse().map_err(|_| invalid())?;

        Ok(Self { label, hotkey })
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// One key-down of the registered binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeySignal;

/// Registers a global binding and yields its key-down signals.
///
/// Registration happens once per process; the binding is released when the
/// source is dropped.
pub trait HotkeySource: Send {
    fn register(
        &mut self,
        binding: &HotkeyBinding,
    ) -> Result<mpsc::UnboundedReceiver<HotkeySignal>, HotkeyError>;
}

/// [`HotkeySource`] backed by the OS through `global-hotkey`.
///
/// The manager lives on a dedicated thread for its whole life, since some
/// platforms tie hotkey delivery to the thread that registered it.
#[derive(Default)]
pub struct NativeHotkeySource {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl NativeHotkeySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HotkeySource for NativeHotkeySource {
    fn register(
        &mut self,
        binding: &HotkeyBinding,
    ) -> Result<mpsc::UnboundedReceiver<HotkeySignal>, HotkeyError> {
        if self.thread.is_some() {
            return Err(HotkeyError::ListenerUnavailable(
                "a hotkey is already registered".to_string(),
            ));
        }

        let hotkey = binding.hotkey();
        let hotkey_id = hotkey.id();
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<(), String>>(1);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let stop = self.stop.clone();

        let thread = std::thread::Builder::new()
            .name("bolt-hotkey".to_string())
            .spawn(move || {
                let manager = match GlobalHotKeyManager::new() {
                    Ok(manager) => manager,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                if let Err(e) = manager.register(hotkey) {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                let receiver = GlobalHotKeyEvent::receiver();
                while !stop.load(Ordering::Relaxed) {
                    pump_thread_messages();

                    match receiver.recv_timeout(NATIVE_POLL_INTERVAL) {
                        Ok(event) if event.id == hotkey_id && event.state == HotKeyState::Pressed => {
                            if signal_tx.send(HotkeySignal).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) if e.is_disconnected() => break,
                        Err(_) => {}
                    }
                }

                tracing::debug!("Hotkey listener thread terminated");
            })
            .map_err(|e| HotkeyError::ListenerUnavailable(e.to_string()))?;

        let outcome = ready_rx.recv();
        self.thread = Some(thread);

        match outcome {
            Ok(Ok(())) => {
                tracing::info!("Registered global hotkey {}", binding);
                Ok(signal_rx)
            }
            Ok(Err(reason)) => Err(HotkeyError::RegistrationFailed {
                binding: binding.to_string(),
                reason,
            }),
            Err(_) => Err(HotkeyError::ListenerUnavailable(
                "listener thread exited before registering".to_string(),
            )),
        }
    }
}

impl Drop for NativeHotkeySource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Drain the Win32 message queue so the hidden hotkey window receives `WM_HOTKEY`
#[cfg(target_os = "windows")]
fn pump_thread_messages() {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
    };

    let mut msg: MSG = unsafe { std::mem::zeroed() };
    while unsafe { PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) } != 0 {
        unsafe {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn pump_thread_messages() {}

/// Turns hotkey signals into "show window" side effects
pub struct HotkeyListener {
    presenter: Arc<dyn Presenter>,
    state: Arc<SessionStateManager>,
    metrics: Arc<SessionMetrics>,
}

impl HotkeyListener {
    pub fn new(
        presenter: Arc<dyn Presenter>,
        state: Arc<SessionStateManager>,
        metrics: Arc<SessionMetrics>,
    ) -> Self {
        Self {
            presenter,
            state,
            metrics,
        }
    }

    /// Show the window for one key-down; repeated presses re-show and refocus it
    pub fn on_signal(&self) {
        self.metrics.record_hotkey_press();
        self.presenter.show_window();
        if self.state.set_visibility(Visibility::Visible) == Visibility::Hidden {
            tracing::debug!("Window shown by hotkey");
        }
    }

    pub async fn run(
        self,
        mut signals: mpsc::UnboundedReceiver<HotkeySignal>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        tracing::debug!("Hotkey listener started");

        loop {
            tokio::select! {
                biased;

                _ = super::shutdown_requested(&mut shutdown_rx) => {
                    tracing::debug!("Hotkey listener received shutdown signal");
                    break;
                }
                signal = signals.recv() => {
                    match signal {
                        Some(HotkeySignal) => self.on_signal(),
                        None => {
                            tracing::warn!("Hotkey signal stream ended");
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!("Hotkey listener stopped");
    }
}
