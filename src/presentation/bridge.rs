// Presenter bridge - Hands window commands and events to the presentation layer
//
// The session core never renders anything. Workers talk to a Presenter, and the
// ChannelPresenter marshals those calls onto a channel drained by whatever hosts
// the UI (the stdio host in the binary, a test harness in tests).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "payload")]
pub enum PresentationEvent {
    /// One batch of matched entry identifiers, possibly empty
    #[serde(rename = "searchResult")]
    SearchResult(Vec<String>),

    /// The window has just hidden itself
    #[serde(rename = "hidApp")]
    HidApp,
}

impl PresentationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PresentationEvent::SearchResult(_) => "searchResult",
            PresentationEvent::HidApp => "hidApp",
        }
    }
}

/// Everything the session asks of the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PresenterCommand {
    ShowWindow,
    HideWindow,
    Event {
        #[serde(flatten)]
        event: PresentationEvent,
    },
    /// Answer to a presentation call that returns a value
    Reply { id: u64, value: String },
}

/// Calls accepted from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum PresentationCall {
    /// Answered with a [`PresenterCommand::Reply`] carrying a data URI, or `""`
    RequestImage { id: u64, name: String },
    LaunchSearch { query: String },
    OpenFileLocation { path: String },
    /// The front end hid itself, e.g. on Escape
    HideWindow,
    /// A front-end error to record in the error log
    LogError { message: String },
}

/// Side effects the session workers can trigger in the presentation layer
pub trait Presenter: Send + Sync {
    fn show_window(&self);
    fn hide_window(&self);
    fn emit(&self, event: PresentationEvent);
    fn reply(&self, id: u64, value: String);
}

/// Presenter that forwards every call as a [`PresenterCommand`] over a channel
///
/// The channel is unbounded so result batches are never dropped under load;
/// ordering follows call order.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    command_tx: mpsc::UnboundedSender<PresenterCommand>,
}

impl ChannelPresenter {
    /// Create a presenter and the receiver the presentation host drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresenterCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (Self { command_tx }, command_rx)
    }

    fn send(&self, command: PresenterCommand) {
        if self.command_tx.send(command).is_err() {
            tracing::warn!("Failed to send presenter command - presentation host has stopped");
        }
    }
}

impl Presenter for ChannelPresenter {
    fn show_window(&self) {
        self.send(PresenterCommand::ShowWindow);
    }

    fn hide_window(&self) {
        self.send(PresenterCommand::HideWindow);
    }

    fn emit(&self, event: PresentationEvent) {
        tracing::debug!("Emitting {} event", event.name());
        self.send(PresenterCommand::Event { event });
    }

    fn reply(&self, id: u64, value: String) {
        self.send(PresenterCommand::Reply { id, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_commands_arrive_in_call_order() {
        let (presenter, mut rx) = ChannelPresenter::new();

        presenter.show_window();
        presenter.emit(PresentationEvent::SearchResult(vec!["a".into()]));
        presenter.hide_window();

        assert_eq!(rx.try_recv().unwrap(), PresenterCommand::ShowWindow);
        assert_eq!(
            rx.try_recv().unwrap(),
            PresenterCommand::Event {
                event: PresentationEvent::SearchResult(vec!["a".into()])
            }
        );
        assert_eq!(rx.try_recv().unwrap(), PresenterCommand::HideWindow);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_after_host_stopped_does_not_panic() {
        let (presenter, rx) = ChannelPresenter::new();
        drop(rx);
        presenter.show_window();
    }

    #[test]
    fn test_parse_calls() {
        let call: PresentationCall =
            serde_json::from_str(r#"{"call":"launchSearch","query":"notes"}"#).unwrap();
        assert_eq!(
            call,
            PresentationCall::LaunchSearch {
                query: "notes".into()
            }
        );

        let call: PresentationCall =
            serde_json::from_str(r#"{"call":"requestImage","id":3,"name":"tick"}"#).unwrap();
        assert_eq!(
            call,
            PresentationCall::RequestImage {
                id: 3,
                name: "tick".into()
            }
        );

        let call: PresentationCall = serde_json::from_str(r#"{"call":"hideWindow"}"#).unwrap();
        assert_eq!(call, PresentationCall::HideWindow);

        assert!(serde_json::from_str::<PresentationCall>(r#"{"call":"reboot"}"#).is_err());
    }

    #[test]
    fn test_wire_format() {
        let search = PresenterCommand::Event {
            event: PresentationEvent::SearchResult(vec!["/tmp/a".into(), "/tmp/b".into()]),
        };
        assert_eq!(
            serde_json::to_value(&search).unwrap(),
            json!({"kind": "event", "name": "searchResult", "payload": ["/tmp/a", "/tmp/b"]})
        );

        let hid = PresenterCommand::Event {
            event: PresentationEvent::HidApp,
        };
        assert_eq!(
            serde_json::to_value(&hid).unwrap(),
            json!({"kind": "event", "name": "hidApp"})
        );

        assert_eq!(
            serde_json::to_value(PresenterCommand::ShowWindow).unwrap(),
            json!({"kind": "showWindow"})
        );
        assert_eq!(
            serde_json::to_value(PresenterCommand::Reply {
                id: 7,
                value: String::new()
            })
            .unwrap(),
            json!({"kind": "reply", "id": 7, "value": ""})
        );
    }
}
