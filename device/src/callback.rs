use postbox_shared::{Message, MsgNum, PeerId};

/// Error type an [`InboundCallback`] reports back through the device
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// The outbound mutation API, as seen by whoever drives the protocol
pub trait OutboxWriter {
    /// Upserts `num -> body` into the peer's outbox
    fn add(&mut self, peer: &PeerId, num: MsgNum, body: &str);

    /// Deletes an outbox entry if present
    fn remove(&mut self, peer: &PeerId, num: MsgNum);

    /// Overwrites the ack exported to the peer
    fn set_acknum(&mut self, peer: &PeerId, num: MsgNum);

    fn ack(&self, peer: &PeerId) -> MsgNum;

    /// Outbox entries numbered at or below `ack`, ascending
    fn outbox_nums_through(&self, peer: &PeerId, ack: MsgNum) -> Vec<MsgNum>;
}

/// The single handler a device relays inbound data to
pub trait InboundCallback: Send + Sync {
    /// Handles one inbound batch, returning whether any work happened.
    ///
    /// Implementations must leave their own durable state consistent even
    /// when they fail part way: the device performs no rollback.
    fn on_inbound(
        &mut self,
        outbox: &mut dyn OutboxWriter,
        peer: &PeerId,
        messages: &[Message],
        ack: MsgNum,
    ) -> Result<bool, CallbackError>;
}

impl<F> InboundCallback for F
where
    F: FnMut(&mut dyn OutboxWriter, &PeerId, &[Message], MsgNum) -> Result<bool, CallbackError>
        + Send
        + Sync,
{
    fn on_inbound(
        &mut self,
        outbox: &mut dyn OutboxWriter,
        peer: &PeerId,
        messages: &[Message],
        ack: MsgNum,
    ) -> Result<bool, CallbackError> {
        self(outbox, peer, messages, ack)
    }
}
