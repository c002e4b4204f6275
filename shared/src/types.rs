use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

use crate::MsgNum;

/// Opaque name of a remote counterpart
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PeerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for PeerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A numbered message body, exchanged on the wire as `[num, body]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(MsgNum, String)", into = "(MsgNum, String)")]
pub struct Message {
    pub num: MsgNum,
    pub body: String,
}

impl Message {
    pub fn new(num: MsgNum, body: impl Into<String>) -> Self {
        Self {
            num,
            body: body.into(),
        }
    }
}

impl From<(MsgNum, String)> for Message {
    fn from((num, body): (MsgNum, String)) -> Self {
        Self { num, body }
    }
}

impl From<Message> for (MsgNum, String) {
    fn from(message: Message) -> Self {
        (message.num, message.body)
    }
}
