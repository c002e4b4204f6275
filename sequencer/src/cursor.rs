use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use postbox_shared::{MsgNum, PeerId};

use crate::{MessageReceiver, SequencerError};

/// The durable half of a peer's cursor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    /// Highest inbound number delivered to the receiver
    pub last_accepted: MsgNum,
    /// Highest outbound number handed out
    pub last_assigned: MsgNum,
}

/// Every peer's durable cursor, as persisted across restarts
pub type CursorSnapshot = BTreeMap<PeerId, CursorState>;

pub(crate) struct PeerCursor {
    pub(crate) state: CursorState,
    // None while checked out for a delivery, or before the first binding
    pub(crate) receiver: Option<Box<dyn MessageReceiver>>,
}

impl PeerCursor {
    pub(crate) fn new() -> Self {
        Self {
            state: CursorState::default(),
            receiver: None,
        }
    }
}

pub fn cursors_to_json(snapshot: &CursorSnapshot) -> Result<String, SequencerError> {
    serde_json::to_string(snapshot).map_err(|e| SequencerError::Snapshot {
        reason: e.to_string(),
    })
}

pub fn cursors_from_json(json: &str) -> Result<CursorSnapshot, SequencerError> {
    serde_json::from_str(json).map_err(|e| SequencerError::Snapshot {
        reason: e.to_string(),
    })
}
