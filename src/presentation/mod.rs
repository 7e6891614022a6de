// Presentation module - The boundary to the (external) rendering layer
//
// This module contains:
// - Presenter / ChannelPresenter: window commands and events flowing out of the session
// - PresentationCall: calls flowing in from the front end
// - stdio: a JSON-lines host that connects a front-end process over stdin/stdout

pub mod bridge;
pub mod stdio;

pub use bridge::{
    ChannelPresenter, PresentationCall, PresentationEvent, Presenter, PresenterCommand,
};
