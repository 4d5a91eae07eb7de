//! Pattern entries and their flags.

use jcb_common::ListKind;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::fmt;

use super::ListError;

/// A recognized per-entry flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryFlag {
    /// Exempt from purge.
    Permanent,
}

impl EntryFlag {
    /// All recognized flags, in rendering order.
    pub const ALL: [EntryFlag; 1] = [EntryFlag::Permanent];

    /// Map a flag character (case-insensitive) to a flag.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Permanent),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Permanent => 'p',
        }
    }
}

/// Flag set of one entry.
///
/// Characters that are not recognized flags are kept so a rewrite of the
/// list file does not lose them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFlags {
    known: BTreeSet<EntryFlag>,
    unrecognized: String,
}

impl EntryFlags {
    pub fn permanent() -> Self {
        let mut flags = Self::default();
        flags.insert(EntryFlag::Permanent);
        flags
    }

    /// Parse the flags field of a list line. Whitespace is ignored.
    pub fn parse(text: &str) -> Self {
        let mut flags = Self::default();
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            match EntryFlag::from_char(c) {
                Some(flag) => {
                    flags.known.insert(flag);
                }
                None => flags.unrecognized.push(c),
            }
        }
        flags
    }

    pub fn insert(&mut self, flag: EntryFlag) {
        self.known.insert(flag);
    }

    pub fn contains(&self, flag: EntryFlag) -> bool {
        self.known.contains(&flag)
    }

    /// Flag characters that carried no meaning.
    pub fn unrecognized(&self) -> &str {
        &self.unrecognized
    }
}

impl fmt::Display for EntryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in EntryFlag::ALL {
            if self.known.contains(&flag) {
                write!(f, "{}", flag.as_char())?;
            }
        }
        write!(f, "{}", self.unrecognized)
    }
}

/// One allow or block pattern with its compiled regex.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    pattern: String,
    flags: EntryFlags,
    comment: String,
    list: ListKind,
    regex: Regex,
    /// Comment, blank and skipped lines that preceded this entry on disk.
    pub(crate) leading: Vec<String>,
}

impl PatternEntry {
    /// Build an entry, compiling `pattern` as a case-insensitive regex.
    pub fn new(
        list: ListKind,
        pattern: impl Into<String>,
        flags: EntryFlags,
        comment: impl Into<String>,
    ) -> Result<Self, ListError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(ListError::EmptyPattern);
        }
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ListError::InvalidRegex {
                pattern: pattern.clone(),
                source,
            })?;
        Ok(Self {
            pattern,
            flags,
            comment: comment.into(),
            list,
            regex,
            leading: Vec::new(),
        })
    }

    /// Source text of the pattern; also the key of its activity record.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &EntryFlags {
        &self.flags
    }

    pub fn is_permanent(&self) -> bool {
        self.flags.contains(EntryFlag::Permanent)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn list(&self) -> ListKind {
        self.list
    }

    /// Case-insensitive substring search against one Caller ID field.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse_case_and_whitespace() {
        let flags = EntryFlags::parse("  P  ");
        assert!(flags.contains(EntryFlag::Permanent));
        assert_eq!(flags.to_string(), "p");
        assert!(!EntryFlags::parse("").contains(EntryFlag::Permanent));
    }

    #[test]
    fn test_flags_keep_unrecognized() {
        let flags = EntryFlags::parse("xp");
        assert!(flags.contains(EntryFlag::Permanent));
        assert_eq!(flags.unrecognized(), "x");
        assert_eq!(flags.to_string(), "px");
    }

    #[test]
    fn test_entry_is_case_insensitive_search() {
        let entry =
            PatternEntry::new(ListKind::Block, "spam", EntryFlags::default(), "").expect("entry");
        assert!(entry.is_match("SPAM LIKELY"));
        assert!(entry.is_match("call from Spam"));
        assert!(!entry.is_match("SPA M"));
    }

    #[test]
    fn test_entry_rejects_empty_and_invalid() {
        assert!(matches!(
            PatternEntry::new(ListKind::Allow, "", EntryFlags::default(), ""),
            Err(ListError::EmptyPattern)
        ));
        assert!(matches!(
            PatternEntry::new(ListKind::Allow, "(unclosed", EntryFlags::default(), ""),
            Err(ListError::InvalidRegex { .. })
        ));
    }
}
