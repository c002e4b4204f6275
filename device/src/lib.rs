//! # Postbox Device
//! The synchronous mailbox device: the single inbound entry point the host
//! transport calls, and the outbound mutation API the sequencer drives, both
//! over one [`Ledger`](postbox_shared::Ledger).

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod callback;
mod device;
mod device_config;
mod error;

pub use callback::{CallbackError, InboundCallback, OutboxWriter};
pub use device::MailboxDevice;
pub use device_config::DeviceConfig;
pub use error::DeviceError;
