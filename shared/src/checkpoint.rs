//! The host-persisted representation of a [`Ledger`](crate::Ledger).
//!
//! ```json
//! { "peer1": { "ack": 13, "outbox": [[2, "data2"], [3, "data3"]] } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{error::CheckpointError, MsgNum, PeerId};

/// Key prefix under which a host stores each peer's mailbox individually
pub const STORAGE_KEY_PREFIX: &str = "mailbox.";

/// Snapshot of a whole Ledger, keyed by peer
pub type MailboxData = BTreeMap<PeerId, PeerMailboxData>;

/// Snapshot of one peer's outbox and ack
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMailboxData {
    pub ack: MsgNum,
    pub outbox: Vec<(MsgNum, String)>,
}

impl PeerMailboxData {
    /// Checks that the outbox is strictly ascending by message number
    pub fn validate(&self, peer: &PeerId) -> Result<(), CheckpointError> {
        for pair in self.outbox.windows(2) {
            let (previous, next) = (pair[0].0, pair[1].0);
            if next <= previous {
                return Err(CheckpointError::OutboxNotAscending {
                    peer: peer.to_string(),
                    previous,
                    next,
                });
            }
        }
        Ok(())
    }
}

pub fn storage_key(peer: &PeerId) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, peer)
}

pub fn to_json(data: &MailboxData) -> Result<String, CheckpointError> {
    serde_json::to_string(data).map_err(|e| CheckpointError::Encode {
        reason: e.to_string(),
    })
}

/// Decodes a whole-Ledger checkpoint, validating every peer's outbox
pub fn from_json(json: &str) -> Result<MailboxData, CheckpointError> {
    let data: MailboxData = serde_json::from_str(json).map_err(|e| CheckpointError::Decode {
        reason: e.to_string(),
    })?;
    for (peer, peer_data) in &data {
        peer_data.validate(peer)?;
    }
    Ok(data)
}

pub fn peer_to_json(data: &PeerMailboxData) -> Result<String, CheckpointError> {
    serde_json::to_string(data).map_err(|e| CheckpointError::Encode {
        reason: e.to_string(),
    })
}

/// Decodes one peer's entry, as stored under [`storage_key`]
pub fn peer_from_json(peer: &PeerId, json: &str) -> Result<PeerMailboxData, CheckpointError> {
    let data: PeerMailboxData =
        serde_json::from_str(json).map_err(|e| CheckpointError::Decode {
            reason: e.to_string(),
        })?;
    data.validate(peer)?;
    Ok(data)
}
