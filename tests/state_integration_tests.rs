//! Integration tests for SessionStateManager with state change events
//!
//! These tests verify that the SessionStateManager correctly:
//! - Emits change events on mutations
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple threads

use bolt::{SessionChange, SessionStateManager, Visibility};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn test_visibility_change_emitted() {
    let state = Arc::new(SessionStateManager::new());
    let mut rx = state.subscribe();

    state.set_visibility(Visibility::Visible);

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(event, SessionChange::VisibilityChanged { visible: true });
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(SessionStateManager::new());
    let mut receivers = vec![state.subscribe(), state.subscribe(), state.subscribe()];

    state.mark_hotkey_registered();

    for rx in &mut receivers {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout")
            .expect("Channel closed");
        assert_eq!(event, SessionChange::HotkeyRegistered);
    }
}

#[tokio::test]
async fn test_repeated_title_is_not_rebroadcast() {
    let state = Arc::new(SessionStateManager::new());
    let mut rx = state.subscribe();

    state.set_last_title("Terminal");
    state.set_last_title("Terminal");
    state.set_last_title("Quick Search");

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(
        first,
        SessionChange::ForegroundTitleChanged {
            title: "Terminal".to_string()
        }
    );
    assert_eq!(
        second,
        SessionChange::ForegroundTitleChanged {
            title: "Quick Search".to_string()
        }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_no_event_when_nothing_changes() {
    let state = Arc::new(SessionStateManager::new());
    let mut rx = state.subscribe();

    // Starts hidden
    state.set_visibility(Visibility::Hidden);

    let result = timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "Expected no event for a no-op update");
}

#[test]
fn test_concurrent_visibility_updates() {
    let state = Arc::new(SessionStateManager::new());
    let mut handles = Vec::new();

    for i in 0..8 {
        let state = state.clone();
        handles.push(std::thread::spawn(move || {
            for j in 0..100 {
                let visibility = if (i + j) % 2 == 0 {
                    Visibility::Visible
                } else {
                    Visibility::Hidden
                };
                state.set_visibility(visibility);
                state.set_last_title(&format!("window-{i}"));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = state.snapshot();
    assert!(snapshot.last_title.starts_with("window-"));
}

#[test]
fn test_set_visibility_returns_previous() {
    let state = SessionStateManager::new();

    assert_eq!(state.set_visibility(Visibility::Visible), Visibility::Hidden);
    assert_eq!(state.set_visibility(Visibility::Visible), Visibility::Visible);
    assert_eq!(state.set_visibility(Visibility::Hidden), Visibility::Visible);
    assert!(!state.is_visible());
}
