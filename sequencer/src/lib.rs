//! # Postbox Sequencer
//! Turns possibly-duplicated, possibly-reordered inbound batches into an
//! exactly-once, strictly-ordered stream per peer, numbers outbound sends,
//! and prunes the outbox as peers acknowledge progress.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod cursor;
mod error;
mod receiver;
mod sequencer;
mod sequencer_config;

pub use cursor::{cursors_from_json, cursors_to_json, CursorSnapshot, CursorState};
pub use error::SequencerError;
pub use receiver::{MessageReceiver, ReceiverError};
pub use sequencer::Sequencer;
pub use sequencer_config::SequencerConfig;
