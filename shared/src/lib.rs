//! # Postbox Shared
//! Ledger, message numbers and checkpoint format shared between the
//! postbox-device & postbox-sequencer crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod checkpoint;
mod error;
mod ledger;
mod msg_num;
mod types;

pub use checkpoint::{MailboxData, PeerMailboxData};
pub use error::{CheckpointError, LedgerError};
pub use ledger::{export_mailbox, import_mailbox, import_mailbox_into, Ledger, PeerMailbox};
pub use msg_num::{MsgNum, MsgNumError};
pub use types::{Message, PeerId};
