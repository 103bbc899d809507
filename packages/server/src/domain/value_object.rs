//! Value objects.
//!
//! Message ids are assigned by the store and are always positive integers.
//! Project and user ids belong to the host application and are opaque
//! strings. On the wire every id is accepted either as a JSON number or as a
//! string, so `42` and `"42"` name the same project. Text ids that spell a
//! canonical integer are written back as numbers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::ValueObjectError;

/// Longest accepted project or user id, in bytes
pub const MAX_TEXT_ID_LEN: usize = 64;

/// Raw wire representation of an id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

/// Store-assigned message id, unique and increasing within a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawId", into = "i64")]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(value: i64) -> Result<Self, ValueObjectError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(ValueObjectError::InvalidId {
                kind: "message id",
                value: value.to_string(),
            })
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl FromStr for MessageId {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(value) => Self::new(value),
            Err(_) => Err(ValueObjectError::InvalidId {
                kind: "message id",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<RawId> for MessageId {
    type Error = ValueObjectError;

    fn try_from(raw: RawId) -> Result<Self, Self::Error> {
        match raw {
            RawId::Number(value) => Self::new(value),
            RawId::Text(text) => text.parse(),
        }
    }
}

impl From<MessageId> for i64 {
    fn from(id: MessageId) -> i64 {
        id.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_text_id(kind: &'static str, raw: &str) -> Result<String, ValueObjectError> {
    let value = raw.trim();
    let valid = !value.is_empty()
        && value.len() <= MAX_TEXT_ID_LEN
        && !value.chars().any(char::is_control);
    if valid {
        Ok(value.to_string())
    } else {
        Err(ValueObjectError::InvalidId {
            kind,
            value: raw.to_string(),
        })
    }
}

/// `Some(n)` when `text` is exactly how `n` prints.
fn canonical_integer(text: &str) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .filter(|value| value.to_string() == text)
}

macro_rules! text_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Build from anything printable; numbers become their decimal form.
            pub fn new(value: impl ToString) -> Result<Self, ValueObjectError> {
                validate_text_id($kind, &value.to_string()).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ValueObjectError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<RawId> for $name {
            type Error = ValueObjectError;

            fn try_from(raw: RawId) -> Result<Self, Self::Error> {
                match raw {
                    RawId::Number(value) => Self::new(value),
                    RawId::Text(text) => Self::new(text),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match canonical_integer(&self.0) {
                    Some(value) => serializer.serialize_i64(value),
                    None => serializer.serialize_str(&self.0),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = RawId::deserialize(deserializer)?;
                Self::try_from(raw).map_err(serde::de::Error::custom)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_id!(
    /// Project id; selects the room instance
    ProjectId,
    "project id"
);
text_id!(
    /// User id owned by the host application's auth layer
    UserId,
    "user id"
);

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Process-local identity of one live WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
