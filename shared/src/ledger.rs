use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::{
    checkpoint::{MailboxData, PeerMailboxData},
    error::LedgerError,
    MsgNum, PeerId,
};

/// One peer's unacknowledged outbound messages plus the inbound ack we export
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerMailbox {
    outbox: BTreeMap<MsgNum, String>,
    ack: MsgNum,
}

impl PeerMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ack(&self) -> MsgNum {
        self.ack
    }

    pub fn outbox(&self) -> &BTreeMap<MsgNum, String> {
        &self.outbox
    }

    pub fn body(&self, num: MsgNum) -> Option<&str> {
        self.outbox.get(&num).map(String::as_str)
    }
}

/// Rebuilds a fresh [`PeerMailbox`] from one peer's snapshot
pub fn import_mailbox(data: &PeerMailboxData) -> PeerMailbox {
    let mut mailbox = PeerMailbox::new();
    import_mailbox_into(data, &mut mailbox);
    mailbox
}

/// Overwrites an existing [`PeerMailbox`] with one peer's snapshot
pub fn import_mailbox_into(data: &PeerMailboxData, mailbox: &mut PeerMailbox) {
    mailbox.outbox = data.outbox.iter().cloned().collect();
    mailbox.ack = data.ack;
}

pub fn export_mailbox(mailbox: &PeerMailbox) -> PeerMailboxData {
    PeerMailboxData {
        ack: mailbox.ack,
        // BTreeMap iteration is already ascending
        outbox: mailbox
            .outbox
            .iter()
            .map(|(num, body)| (*num, body.clone()))
            .collect(),
    }
}

/// Per-peer outboxes and acks.
///
/// Mutations auto-create the peer with an empty outbox and an ack of zero.
/// Reads of an unknown peer observe that same empty state without creating
/// it.
///
/// The Ledger checks that numbers are valid but does not require acks to be
/// monotonic: callers may lower a peer's ack. Keeping acks non-decreasing is
/// the job of whoever drives the protocol.
#[derive(Debug, Default)]
pub struct Ledger {
    peers: BTreeMap<PeerId, PeerMailbox>,
    changed: BTreeSet<PeerId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create_peer(&mut self, peer: &PeerId) -> &mut PeerMailbox {
        if !self.changed.contains(peer) {
            self.changed.insert(peer.clone());
        }
        self.peers.entry(peer.clone()).or_default()
    }

    // Mutations

    /// Upserts `num -> body` into the peer's outbox
    pub fn add(&mut self, peer: &PeerId, num: MsgNum, body: impl Into<String>) {
        self.get_or_create_peer(peer)
            .outbox
            .insert(num, body.into());
    }

    /// Removes `num` from the peer's outbox, returning whether it was present.
    /// Removing an absent entry is not an error.
    pub fn remove(&mut self, peer: &PeerId, num: MsgNum) -> bool {
        self.get_or_create_peer(peer).outbox.remove(&num).is_some()
    }

    /// Overwrites the ack exported to the peer
    pub fn set_acknum(&mut self, peer: &PeerId, num: MsgNum) {
        self.get_or_create_peer(peer).ack = num;
    }

    // Reads

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.keys()
    }

    pub fn peer(&self, peer: &PeerId) -> Option<&PeerMailbox> {
        self.peers.get(peer)
    }

    pub fn ack(&self, peer: &PeerId) -> MsgNum {
        self.peers
            .get(peer)
            .map(PeerMailbox::ack)
            .unwrap_or(MsgNum::ZERO)
    }

    /// Outbox entries numbered at or below `ack`, ascending
    pub fn outbox_nums_through(&self, peer: &PeerId, ack: MsgNum) -> Vec<MsgNum> {
        match self.peers.get(peer) {
            Some(mailbox) => mailbox.outbox.range(..=ack).map(|(num, _)| *num).collect(),
            None => Vec::new(),
        }
    }

    // Checkpoints

    /// Snapshot of every peer, suitable for external serialization
    pub fn export_to_data(&self) -> MailboxData {
        self.peers
            .iter()
            .map(|(peer, mailbox)| (peer.clone(), export_mailbox(mailbox)))
            .collect()
    }

    pub fn export_peer(&self, peer: &PeerId) -> Option<PeerMailboxData> {
        self.peers.get(peer).map(export_mailbox)
    }

    /// Drains the set of peers mutated since the last call, ascending
    pub fn take_changed_peers(&mut self) -> Vec<PeerId> {
        std::mem::take(&mut self.changed).into_iter().collect()
    }

    /// Loads a snapshot into an empty Ledger.
    ///
    /// Fails if the Ledger already holds any peer, or if the snapshot is
    /// malformed. Nothing is loaded on failure.
    pub fn populate_from_data(&mut self, data: &MailboxData) -> Result<(), LedgerError> {
        if !self.peers.is_empty() {
            return Err(LedgerError::AlreadyPopulated {
                peers: self.peers.len(),
            });
        }
        for (peer, peer_data) in data {
            peer_data.validate(peer)?;
        }
        for (peer, peer_data) in data {
            let mailbox = self.peers.entry(peer.clone()).or_default();
            import_mailbox_into(peer_data, mailbox);
        }
        info!("Ledger populated with {} peer(s)", data.len());
        Ok(())
    }
}
