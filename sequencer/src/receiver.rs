use thiserror::Error;

use postbox_shared::{Message, PeerId};

/// Errors a MessageReceiver may report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiverError {
    /// The application refused the message
    #[error("Receiver rejected message: {reason}")]
    Rejected { reason: String },

    /// The application side of the receiver is gone
    #[error("Receiver is closed and can no longer accept messages")]
    Closed,
}

/// Downstream consumer of one peer's deduplicated, ordered messages.
///
/// A receiver runs while the device is mid-delivery, so it cannot send
/// through that device; replies should be queued and sent afterwards.
pub trait MessageReceiver: Send + Sync {
    fn receive(&mut self, peer: &PeerId, message: &Message) -> Result<(), ReceiverError>;
}

impl<F> MessageReceiver for F
where
    F: FnMut(&PeerId, &Message) -> Result<(), ReceiverError> + Send + Sync,
{
    fn receive(&mut self, peer: &PeerId, message: &Message) -> Result<(), ReceiverError> {
        self(peer, message)
    }
}
