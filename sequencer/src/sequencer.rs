use std::{
    collections::{btree_map::Entry, BTreeMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{debug, info, warn};

use postbox_device::{CallbackError, InboundCallback, OutboxWriter};
use postbox_shared::{Message, MsgNum, PeerId};

use crate::{
    cursor::{CursorSnapshot, CursorState, PeerCursor},
    MessageReceiver, SequencerConfig, SequencerError,
};

/// Deduplication, ordering and ack-driven pruning for every peer.
///
/// A `Sequencer` is a handle: clones share the same cursors, so one clone can
/// be registered as a device's inbound callback while the application keeps
/// another to send with.
#[derive(Clone)]
pub struct Sequencer {
    state: Arc<RwLock<SequencerState>>,
}

struct SequencerState {
    config: SequencerConfig,
    cursors: BTreeMap<PeerId, PeerCursor>,
}

impl SequencerState {
    fn cursor_mut(&mut self, peer: &PeerId) -> &mut PeerCursor {
        self.cursors
            .entry(peer.clone())
            .or_insert_with(PeerCursor::new)
    }

    fn cursor_state(&self, peer: &PeerId) -> CursorState {
        self.cursors
            .get(peer)
            .map(|cursor| cursor.state)
            .unwrap_or_default()
    }
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(SequencerState {
                config,
                cursors: BTreeMap::new(),
            })),
        }
    }

    /// Builds a Sequencer whose cursors resume from a snapshot
    pub fn from_snapshot(
        config: SequencerConfig,
        snapshot: &CursorSnapshot,
    ) -> Result<Self, SequencerError> {
        let sequencer = Self::new(config);
        sequencer.populate_cursors(snapshot)?;
        Ok(sequencer)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SequencerState>, SequencerError> {
        self.state
            .as_ref()
            .read()
            .map_err(|_| SequencerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SequencerState>, SequencerError> {
        self.state
            .as_ref()
            .write()
            .map_err(|_| SequencerError::LockPoisoned)
    }

    // Receivers

    /// Binds (or rebinds) the receiver for `peer`, creating its cursor if
    /// needed. Counters are never reset by a rebinding.
    pub fn set_receiver<R: MessageReceiver + 'static>(
        &self,
        peer: &PeerId,
        receiver: R,
    ) -> Result<(), SequencerError> {
        let mut state = self.write()?;
        let cursor = state.cursor_mut(peer);
        if cursor.receiver.is_some() {
            info!(
                "rebinding receiver for {} (last accepted {})",
                peer, cursor.state.last_accepted
            );
        } else {
            info!("receiver bound for {}", peer);
        }
        cursor.receiver = Some(Box::new(receiver));
        Ok(())
    }

    pub fn has_receiver(&self, peer: &PeerId) -> Result<bool, SequencerError> {
        Ok(self
            .read()?
            .cursors
            .get(peer)
            .map_or(false, |cursor| cursor.receiver.is_some()))
    }

    // Cursors

    pub fn cursor(&self, peer: &PeerId) -> Result<Option<CursorState>, SequencerError> {
        Ok(self.read()?.cursors.get(peer).map(|cursor| cursor.state))
    }

    pub fn peers(&self) -> Result<Vec<PeerId>, SequencerError> {
        Ok(self.read()?.cursors.keys().cloned().collect())
    }

    pub fn export_cursors(&self) -> Result<CursorSnapshot, SequencerError> {
        Ok(self
            .read()?
            .cursors
            .iter()
            .map(|(peer, cursor)| (peer.clone(), cursor.state))
            .collect())
    }

    /// Restores cursors from a snapshot.
    ///
    /// Receivers bound beforehand are kept, but no existing cursor may have
    /// made progress: restoring over live counters would fork the protocol.
    pub fn populate_cursors(&self, snapshot: &CursorSnapshot) -> Result<(), SequencerError> {
        let mut state = self.write()?;
        let live = state
            .cursors
            .values()
            .filter(|cursor| cursor.state != CursorState::default())
            .count();
        if live > 0 {
            return Err(SequencerError::AlreadyPopulated { peers: live });
        }
        for (peer, cursor_state) in snapshot {
            state.cursor_mut(peer).state = *cursor_state;
        }
        info!("cursors restored for {} peer(s)", snapshot.len());
        Ok(())
    }

    // Outgoing Messages

    /// Assigns the next outbound number for `peer` and records the message in
    /// the outbox. Never waits for acknowledgment of earlier sends.
    pub fn send(
        &self,
        outbox: &mut dyn OutboxWriter,
        peer: &PeerId,
        body: &str,
    ) -> Result<MsgNum, SequencerError> {
        let num = {
            let mut state = self.write()?;
            let cursor = state.cursor_mut(peer);
            let num = cursor
                .state
                .last_assigned
                .next()
                .map_err(|_| SequencerError::NumbersExhausted {
                    peer: peer.to_string(),
                })?;
            cursor.state.last_assigned = num;
            num
        };
        outbox.add(peer, num, body);
        debug!("sent {} to {}", num, peer);
        Ok(num)
    }

    // Incoming Messages

    /// Processes one inbound batch.
    ///
    /// New messages are handed to the peer's receiver once each, in
    /// increasing order; the exported ack is then refreshed, and every outbox
    /// entry covered by `ack` is pruned. Returns whether a message was
    /// delivered or an entry pruned.
    pub fn process_inbound(
        &self,
        outbox: &mut dyn OutboxWriter,
        peer: &PeerId,
        messages: &[Message],
        ack: MsgNum,
    ) -> Result<bool, SequencerError> {
        let mut did_something = false;

        let (cursor_state, config) = {
            let state = self.read()?;
            (state.cursor_state(peer), state.config.clone())
        };

        if config.reject_future_acks && ack > cursor_state.last_assigned {
            return Err(SequencerError::AckBeyondSent {
                peer: peer.to_string(),
                ack,
                last_assigned: cursor_state.last_assigned,
            });
        } else if ack > cursor_state.last_assigned {
            warn!(
                "{} acknowledged {} but only {} were sent",
                peer, ack, cursor_state.last_assigned
            );
        }

        let fresh = select_new_messages(peer, messages, cursor_state.last_accepted, &config);
        if !fresh.is_empty() {
            self.deliver(peer, &fresh)?;
            did_something = true;
        }

        // refreshed even when nothing was new, so a lost export is repeated
        let last_accepted = self.read()?.cursor_state(peer).last_accepted;
        outbox.set_acknum(peer, last_accepted);

        let acknowledged = outbox.outbox_nums_through(peer, ack);
        for num in &acknowledged {
            outbox.remove(peer, *num);
        }
        if !acknowledged.is_empty() {
            debug!("pruned {} message(s) to {} through {}", acknowledged.len(), peer, ack);
            did_something = true;
        }

        Ok(did_something)
    }

    /// Hands `fresh` to the peer's receiver, advancing the cursor after each
    /// message. The lock is released while the receiver runs.
    fn deliver(&self, peer: &PeerId, fresh: &[Message]) -> Result<(), SequencerError> {
        let mut receiver = self
            .write()?
            .cursors
            .get_mut(peer)
            .and_then(|cursor| cursor.receiver.take())
            .ok_or_else(|| SequencerError::NoReceiver {
                peer: peer.to_string(),
            })?;

        let result = self.deliver_to(peer, receiver.as_mut(), fresh);

        // a receiver bound while this one was checked out takes precedence
        let mut state = self.write()?;
        let cursor = state.cursor_mut(peer);
        if cursor.receiver.is_none() {
            cursor.receiver = Some(receiver);
        }
        result
    }

    fn deliver_to(
        &self,
        peer: &PeerId,
        receiver: &mut dyn MessageReceiver,
        fresh: &[Message],
    ) -> Result<(), SequencerError> {
        for message in fresh {
            receiver
                .receive(peer, message)
                .map_err(|source| SequencerError::Receiver {
                    peer: peer.to_string(),
                    num: message.num,
                    source,
                })?;
            self.write()?.cursor_mut(peer).state.last_accepted = message.num;
            debug!("accepted {} from {}", message.num, peer);
        }
        Ok(())
    }
}

impl InboundCallback for Sequencer {
    fn on_inbound(
        &mut self,
        outbox: &mut dyn OutboxWriter,
        peer: &PeerId,
        messages: &[Message],
        ack: MsgNum,
    ) -> Result<bool, CallbackError> {
        Ok(self.process_inbound(outbox, peer, messages, ack)?)
    }
}

/// Messages above `last_accepted`, ascending, each number once
fn select_new_messages(
    peer: &PeerId,
    messages: &[Message],
    last_accepted: MsgNum,
    config: &SequencerConfig,
) -> Vec<Message> {
    let mut fresh: BTreeMap<MsgNum, &Message> = BTreeMap::new();
    for message in messages {
        if message.num <= last_accepted {
            continue;
        }
        match fresh.entry(message.num) {
            Entry::Vacant(entry) => {
                entry.insert(message);
            }
            Entry::Occupied(entry) => {
                if entry.get().body != message.body {
                    warn!(
                        "{} sent {} twice with different bodies; keeping the first",
                        peer, message.num
                    );
                }
            }
        }
    }

    if config.warn_on_gaps {
        let mut expected = last_accepted.get() + 1;
        for num in fresh.keys() {
            if num.get() != expected {
                warn!("{} skipped from {} to {}", peer, expected, num);
            }
            expected = num.get() + 1;
        }
    }

    fresh.into_values().cloned().collect()
}
