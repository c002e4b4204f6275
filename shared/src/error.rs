use thiserror::Error;

use crate::MsgNum;

/// Errors that can occur while encoding, decoding or validating checkpoint data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    /// Checkpoint data could not be encoded
    #[error("Failed to encode mailbox checkpoint: {reason}")]
    Encode { reason: String },

    /// Checkpoint data could not be decoded
    #[error("Failed to decode mailbox checkpoint: {reason}. The stored data is corrupted or was written by an incompatible host")]
    Decode { reason: String },

    /// An outbox listing is not strictly ascending by message number
    #[error("Outbox for peer {peer:?} is not strictly ascending: {next} follows {previous}. Checkpoint outboxes must be sorted and free of duplicates")]
    OutboxNotAscending {
        peer: String,
        previous: MsgNum,
        next: MsgNum,
    },
}

/// Errors that can occur during Ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Bulk population was attempted on a Ledger that already holds peers
    #[error("Cannot populate Ledger from data: it already holds {peers} peer(s). Restoring into a live Ledger would merge two independent ledgers")]
    AlreadyPopulated { peers: usize },

    /// The snapshot handed to the Ledger is malformed
    #[error("Invalid Ledger snapshot: {0}")]
    InvalidSnapshot(#[from] CheckpointError),
}
