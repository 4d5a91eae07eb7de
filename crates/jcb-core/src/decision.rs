//! Allow/block decision for one caller.
//!
//! The allow list is scanned first, then the block list, each in file
//! order. Within an entry the number is tested before the name. The first
//! hit wins; nothing else is consulted.

use jcb_common::{CallerField, ListKind};
use serde::Serialize;
use std::fmt;

use crate::lists::{PatternEntry, PatternList, PatternLists};

/// The entry that decided a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub pattern: String,
    pub list: ListKind,
    pub field: CallerField,
    pub permanent: bool,
    pub comment: String,
}

impl PatternMatch {
    fn new(entry: &PatternEntry, field: CallerField) -> Self {
        Self {
            pattern: entry.pattern().to_string(),
            list: entry.list(),
            field,
            permanent: entry.is_permanent(),
            comment: entry.comment().to_string(),
        }
    }
}

/// Outcome of evaluating a caller against both lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed(PatternMatch),
    Blocked(PatternMatch),
    Unknown,
}

impl Verdict {
    pub fn matched(&self) -> Option<&PatternMatch> {
        match self {
            Self::Allowed(m) | Self::Blocked(m) => Some(m),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed(m) => write!(f, "allowed by {:?} ({} matched)", m.pattern, m.field),
            Self::Blocked(m) => write!(f, "blocked by {:?} ({} matched)", m.pattern, m.field),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// First entry of `list` matching the number or the name.
fn first_match(list: &PatternList, name: &str, number: &str) -> Option<PatternMatch> {
    list.entries().iter().find_map(|entry| {
        if entry.is_match(number) {
            Some(PatternMatch::new(entry, CallerField::Number))
        } else if entry.is_match(name) {
            Some(PatternMatch::new(entry, CallerField::Name))
        } else {
            None
        }
    })
}

/// Decide a caller. Pure; activity is updated by the caller of this
/// function when a block entry fires.
pub fn evaluate(lists: &PatternLists, name: &str, number: &str) -> Verdict {
    if let Some(m) = first_match(&lists.allow, name, number) {
        return Verdict::Allowed(m);
    }
    if let Some(m) = first_match(&lists.block, name, number) {
        return Verdict::Blocked(m);
    }
    Verdict::Unknown
}
