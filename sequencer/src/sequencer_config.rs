use std::default::Default;

/// Contains Config properties which will be used by a Sequencer
#[derive(Clone, Debug)]
pub struct SequencerConfig {
    /// Treat an ack above the highest number ever sent to that peer as an
    /// error instead of a no-op
    pub reject_future_acks: bool,
    /// Log a warning when an inbound batch skips message numbers
    pub warn_on_gaps: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            reject_future_acks: false,
            warn_on_gaps: true,
        }
    }
}
