use thiserror::Error;

use postbox_shared::MsgNum;

use crate::ReceiverError;

/// Errors that can occur during Sequencer operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    /// New messages arrived for a peer that has no receiver bound
    #[error("No receiver bound for peer {peer:?}; new messages cannot be delivered. Call set_receiver() before the peer starts sending")]
    NoReceiver { peer: String },

    /// A receiver failed while taking delivery
    #[error("Receiver for peer {peer:?} failed on message {num}: {source}")]
    Receiver {
        peer: String,
        num: MsgNum,
        #[source]
        source: ReceiverError,
    },

    /// The peer acknowledged a message we never assigned
    #[error("Peer {peer:?} acknowledged {ack} but only {last_assigned} message(s) were ever sent to it")]
    AckBeyondSent {
        peer: String,
        ack: MsgNum,
        last_assigned: MsgNum,
    },

    /// No further outbound numbers can be assigned
    #[error("Outbound message numbers for peer {peer:?} are exhausted")]
    NumbersExhausted { peer: String },

    /// Cursor population was attempted over live cursors
    #[error("Cannot populate cursors: {peers} peer(s) already have progress. Cursors may only be restored into a fresh Sequencer")]
    AlreadyPopulated { peers: usize },

    /// Cursor snapshot could not be encoded or decoded
    #[error("Invalid cursor snapshot: {reason}")]
    Snapshot { reason: String },

    /// Shared cursor state was poisoned by a panic on another handle
    #[error("Sequencer state lock is poisoned. A previous holder panicked and the cursors can no longer be trusted")]
    LockPoisoned,
}
