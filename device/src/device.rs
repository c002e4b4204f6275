use log::{debug, info};

use postbox_shared::{Ledger, MailboxData, Message, MsgNum, PeerId, PeerMailboxData};

use crate::{
    callback::{InboundCallback, OutboxWriter},
    device_config::DeviceConfig,
    error::DeviceError,
};

/// Relays inbound data from the host to the registered callback, and exposes
/// the Ledger mutations the callback (or the executor) performs.
///
/// The device never deduplicates or orders anything itself.
pub struct MailboxDevice {
    config: DeviceConfig,
    ledger: Ledger,
    inbound_callback: Option<Box<dyn InboundCallback>>,
}

impl MailboxDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_ledger(config, Ledger::new())
    }

    pub fn with_ledger(config: DeviceConfig, ledger: Ledger) -> Self {
        Self {
            config,
            ledger,
            inbound_callback: None,
        }
    }

    /// Builds a device over a Ledger restored from a host checkpoint
    pub fn from_data(config: DeviceConfig, data: &MailboxData) -> Result<Self, DeviceError> {
        let mut device = Self::new(config);
        device.populate_from_data(data)?;
        Ok(device)
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // Registration

    /// Binds the inbound handler, replacing any previous one. Ledger state is
    /// neither consulted nor reset.
    pub fn register_inbound_callback<C: InboundCallback + 'static>(&mut self, callback: C) {
        if self.inbound_callback.is_some() {
            info!("[{}] replacing inbound callback", self.config.label);
        } else {
            info!("[{}] inbound callback registered", self.config.label);
        }
        self.inbound_callback = Some(Box::new(callback));
    }

    pub fn has_inbound_callback(&self) -> bool {
        self.inbound_callback.is_some()
    }

    // Incoming Data

    /// The sole inbound entry point. Forwards `(peer, messages, ack)` verbatim
    /// to the registered callback and returns whether it reported work.
    pub fn deliver_inbound(
        &mut self,
        peer: &PeerId,
        messages: &[Message],
        ack: MsgNum,
    ) -> Result<bool, DeviceError> {
        let Some(mut callback) = self.inbound_callback.take() else {
            return Err(DeviceError::NoInboundCallback {
                peer: peer.to_string(),
            });
        };

        if self.config.trace_deliveries {
            debug!(
                "[{}] deliver_inbound from {}: {} message(s), ack {}",
                self.config.label,
                peer,
                messages.len(),
                ack
            );
        }

        let result = callback.on_inbound(self, peer, messages, ack);
        self.inbound_callback = Some(callback);

        result.map_err(|source| DeviceError::InboundCallback {
            peer: peer.to_string(),
            source,
        })
    }

    /// Like [`deliver_inbound`](Self::deliver_inbound), for hosts holding
    /// loosely-typed numbers. Every number is validated before the callback
    /// runs, so a malformed batch changes nothing.
    pub fn deliver_inbound_raw(
        &mut self,
        peer: &PeerId,
        messages: &[(i64, String)],
        ack: i64,
    ) -> Result<bool, DeviceError> {
        let invalid = |source| DeviceError::InvalidInbound {
            peer: peer.to_string(),
            source,
        };
        let messages = messages
            .iter()
            .map(|(num, body)| {
                MsgNum::try_from(*num).map(|num| Message::new(num, body.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        let ack = MsgNum::try_from(ack).map_err(invalid)?;

        self.deliver_inbound(peer, &messages, ack)
    }

    // Outgoing Data

    pub fn add(&mut self, peer: &PeerId, num: MsgNum, body: &str) {
        self.ledger.add(peer, num, body);
    }

    pub fn remove(&mut self, peer: &PeerId, num: MsgNum) {
        self.ledger.remove(peer, num);
    }

    pub fn set_acknum(&mut self, peer: &PeerId, num: MsgNum) {
        self.ledger.set_acknum(peer, num);
    }

    // Checkpoints

    pub fn export_to_data(&self) -> MailboxData {
        self.ledger.export_to_data()
    }

    pub fn export_peer(&self, peer: &PeerId) -> Option<PeerMailboxData> {
        self.ledger.export_peer(peer)
    }

    pub fn take_changed_peers(&mut self) -> Vec<PeerId> {
        self.ledger.take_changed_peers()
    }

    pub fn populate_from_data(&mut self, data: &MailboxData) -> Result<(), DeviceError> {
        self.ledger.populate_from_data(data)?;
        Ok(())
    }
}

impl OutboxWriter for MailboxDevice {
    fn add(&mut self, peer: &PeerId, num: MsgNum, body: &str) {
        MailboxDevice::add(self, peer, num, body);
    }

    fn remove(&mut self, peer: &PeerId, num: MsgNum) {
        MailboxDevice::remove(self, peer, num);
    }

    fn set_acknum(&mut self, peer: &PeerId, num: MsgNum) {
        MailboxDevice::set_acknum(self, peer, num);
    }

    fn ack(&self, peer: &PeerId) -> MsgNum {
        self.ledger.ack(peer)
    }

    fn outbox_nums_through(&self, peer: &PeerId, ack: MsgNum) -> Vec<MsgNum> {
        self.ledger.outbox_nums_through(peer, ack)
    }
}
