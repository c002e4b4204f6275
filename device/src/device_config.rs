use std::default::Default;

/// Contains Config properties which will be used by a MailboxDevice
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    /// Name used to tell devices apart in log output
    pub label: String,
    /// Log every inbound delivery at debug level
    pub trace_deliveries: bool,
}

impl DeviceConfig {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            label: "mailbox".to_string(),
            trace_deliveries: true,
        }
    }
}
