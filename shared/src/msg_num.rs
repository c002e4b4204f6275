use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use thiserror::Error;

/// Errors that can occur when constructing a [`MsgNum`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MsgNumError {
    /// A negative value was supplied
    #[error("Message number {value} is negative. Message numbers and acks are unsigned counters, so a negative value indicates a protocol bug upstream")]
    Negative { value: i64 },

    /// A fractional, infinite or NaN value was supplied
    #[error("Message number {value} is not a whole number. Message numbers and acks must be integers")]
    NotAnInteger { value: f64 },

    /// The value cannot be represented as a plain checkpoint number
    #[error("Message number {value} exceeds the largest exportable value {max}")]
    TooLarge { value: u64, max: u64 },
}

/// A message number or ack value.
///
/// Always within `0..=MsgNum::MAX`, which keeps every value exportable as a
/// plain (non-arbitrary-precision) number in the checkpoint format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MsgNum(u64);

impl MsgNum {
    /// Largest integer a double-precision float represents exactly
    pub const MAX: MsgNum = MsgNum((1 << 53) - 1);
    pub const ZERO: MsgNum = MsgNum(0);

    pub fn new(value: u64) -> Result<Self, MsgNumError> {
        if value > Self::MAX.0 {
            return Err(MsgNumError::TooLarge {
                value,
                max: Self::MAX.0,
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The number following this one, or an error once `MAX` is reached
    pub fn next(self) -> Result<Self, MsgNumError> {
        Self::new(self.0 + 1)
    }
}

impl fmt::Display for MsgNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for MsgNum {
    type Error = MsgNumError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for MsgNum {
    type Error = MsgNumError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(MsgNumError::Negative { value });
        }
        Self::new(value as u64)
    }
}

impl TryFrom<f64> for MsgNum {
    type Error = MsgNumError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(MsgNumError::NotAnInteger { value });
        }
        if value < 0.0 {
            return Err(MsgNumError::Negative {
                value: value as i64,
            });
        }
        if value > Self::MAX.0 as f64 {
            return Err(MsgNumError::TooLarge {
                value: value as u64,
                max: Self::MAX.0,
            });
        }
        Ok(Self(value as u64))
    }
}

impl From<MsgNum> for u64 {
    fn from(num: MsgNum) -> Self {
        num.0
    }
}

impl Serialize for MsgNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for MsgNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MsgNumVisitor)
    }
}

struct MsgNumVisitor;

impl<'de> Visitor<'de> for MsgNumVisitor {
    type Value = MsgNum;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a non-negative integer no larger than {}", MsgNum::MAX)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<MsgNum, E> {
        MsgNum::new(value).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<MsgNum, E> {
        MsgNum::try_from(value).map_err(E::custom)
    }

    // whole floats are what a JavaScript host writes for large counters
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<MsgNum, E> {
        MsgNum::try_from(value).map_err(E::custom)
    }
}
