//! Caller ID payloads and call outcomes shared by the screener.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller ID delivered for one incoming call.
///
/// Either field may be empty when the network or the modem delivered no
/// Caller ID (private numbers, out-of-area calls, or a Caller-ID timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub name: String,
    pub number: String,
    pub received_at: DateTime<Utc>,
}

impl CallEvent {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self::received(name, number, Utc::now())
    }

    /// Caller ID for a call that started ringing at `received_at`.
    pub fn received(
        name: impl Into<String>,
        number: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            received_at,
        }
    }

    /// A call that rang at `received_at` but whose Caller ID never arrived.
    pub fn anonymous(received_at: DateTime<Utc>) -> Self {
        Self::received("", "", received_at)
    }

    /// True when neither name nor number was delivered.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() && self.number.is_empty()
    }
}

/// Which pattern list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Allow,
    Block,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// Caller ID field a pattern matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerField {
    Name,
    Number,
}

impl fmt::Display for CallerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Number => write!(f, "number"),
        }
    }
}

/// Final outcome recorded for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionKind {
    /// Matched the allow list; the phone kept ringing.
    Allowed,
    /// Matched the block list; answered and hung up on the first ring.
    Blocked,
    /// Unknown caller added to the block list by a `*` keypress.
    UnknownAdded,
    /// Unknown caller; the keypress window elapsed without `*`.
    UnknownIgnored,
}

impl fmt::Display for DispositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::Blocked => write!(f, "blocked"),
            Self::UnknownAdded => write!(f, "unknown_added"),
            Self::UnknownIgnored => write!(f, "unknown_ignored"),
        }
    }
}
