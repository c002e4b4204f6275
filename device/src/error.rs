use thiserror::Error;

use postbox_shared::{LedgerError, MsgNumError};

use crate::CallbackError;

/// Errors that can occur during MailboxDevice operations
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Inbound data arrived before any callback was registered
    #[error("No inbound callback registered; delivery from peer {peer:?} cannot be processed. Call register_inbound_callback() before the host delivers inbound data")]
    NoInboundCallback { peer: String },

    /// The registered callback failed part way through a delivery
    #[error("Error in inbound callback for peer {peer:?}: {source}. The enclosing processing step must be aborted")]
    InboundCallback {
        peer: String,
        #[source]
        source: CallbackError,
    },

    /// The host handed over a message number or ack that is not a valid MsgNum
    #[error("Invalid inbound data from peer {peer:?}: {source}")]
    InvalidInbound {
        peer: String,
        #[source]
        source: MsgNumError,
    },

    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
