//! List file grammar.
//!
//! ```text
//! # comment line
//! <pattern>;<flags>;<comment>
//! ```
//!
//! The first unescaped `;` ends the pattern and `\;` is a literal `;`
//! inside it. A `\\` pair is kept as-is so a pattern may end in an escaped
//! backslash. Whitespace around the pattern is part of the pattern.
//! Everything after the second `;` is the comment, further `;` included.

use jcb_common::ListKind;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use super::entry::{EntryFlags, PatternEntry};
use super::ListError;
use crate::persist::write_atomic;

/// The three fields of a list line, before the pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub pattern: String,
    pub flags: String,
    pub comment: String,
}

/// Split one non-comment line into its fields.
pub fn split_line(line: &str) -> Result<RawLine, ListError> {
    let mut pattern = String::new();
    let mut rest = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&(_, ';')) => {
                    pattern.push(';');
                    chars.next();
                }
                Some(&(_, '\\')) => {
                    pattern.push_str("\\\\");
                    chars.next();
                }
                _ => pattern.push('\\'),
            },
            ';' => {
                rest = Some(&line[i + 1..]);
                break;
            }
            _ => pattern.push(c),
        }
    }

    if pattern.is_empty() {
        return Err(ListError::EmptyPattern);
    }

    let (flags, comment) = match rest {
        Some(rest) => match rest.split_once(';') {
            Some((flags, comment)) => (flags.to_string(), comment.to_string()),
            None => (rest.to_string(), String::new()),
        },
        None => (String::new(), String::new()),
    };

    Ok(RawLine {
        pattern,
        flags,
        comment,
    })
}

/// Escape a pattern for the list grammar.
pub fn escape_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'\\') => {
                out.push_str("\\\\");
                chars.next();
            }
            ';' => out.push_str("\\;"),
            _ => out.push(c),
        }
    }
    out
}

/// True when `pattern` survives an escape/split cycle unchanged.
///
/// A lone backslash directly before `;` (or at the very end), a line break,
/// or a leading `#` cannot be written in the list grammar.
pub fn is_representable(pattern: &str) -> bool {
    if pattern.is_empty() || pattern.starts_with('#') || pattern.contains(['\n', '\r']) {
        return false;
    }
    let line = format!("{};", escape_pattern(pattern));
    matches!(split_line(&line), Ok(raw) if raw.pattern == pattern)
}

/// Render an entry as a list line (without the line terminator).
pub fn render_entry(entry: &PatternEntry) -> String {
    format!(
        "{};{};{}",
        escape_pattern(entry.pattern()),
        entry.flags(),
        entry.comment()
    )
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.trim().is_empty()
}

/// An ordered pattern list as loaded from one file.
#[derive(Debug, Clone)]
pub struct PatternList {
    kind: ListKind,
    entries: Vec<PatternEntry>,
    /// Comment and skipped lines after the last entry.
    trailing: Vec<String>,
}

impl PatternList {
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            trailing: Vec::new(),
        }
    }

    /// Parse list text. Bad lines are warned about, kept for rewriting, and
    /// never abort the parse.
    pub fn parse(kind: ListKind, text: &str, source: &Path) -> Self {
        let mut list = Self::new(kind);
        let mut pending: Vec<String> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if is_comment(line) {
                pending.push(line.to_string());
                continue;
            }

            let parsed = split_line(line).and_then(|raw| {
                let flags = EntryFlags::parse(&raw.flags);
                if !flags.unrecognized().is_empty() {
                    warn!(
                        file = %source.display(),
                        line = idx + 1,
                        flags = flags.unrecognized(),
                        "ignoring unrecognized flags"
                    );
                }
                PatternEntry::new(kind, raw.pattern, flags, raw.comment)
            });

            match parsed {
                Ok(entry) if list.contains(entry.pattern()) => {
                    warn!(
                        file = %source.display(),
                        line = idx + 1,
                        pattern = entry.pattern(),
                        "skipping duplicate pattern"
                    );
                    pending.push(line.to_string());
                }
                Ok(mut entry) => {
                    entry.leading = std::mem::take(&mut pending);
                    list.entries.push(entry);
                }
                Err(e) => {
                    warn!(
                        file = %source.display(),
                        line = idx + 1,
                        error = %e,
                        "skipping list line"
                    );
                    pending.push(line.to_string());
                }
            }
        }

        list.trailing = pending;
        list
    }

    /// Render the list back to file text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            for line in &entry.leading {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&render_entry(entry));
            out.push('\n');
        }
        for line in &self.trailing {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Load a list file. A missing file is an empty list.
    pub fn load(kind: ListKind, path: &Path) -> Result<Self, ListError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let list = Self::parse(kind, &text, path);
                debug!(file = %path.display(), entries = list.len(), "loaded {kind} list");
                Ok(list)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(file = %path.display(), "{kind} list not found, starting empty");
                Ok(Self::new(kind))
            }
            Err(e) => Err(ListError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Atomically rewrite the list file.
    pub fn save(&self, path: &Path) -> Result<(), ListError> {
        write_atomic(path, self.render().as_bytes()).map_err(|e| ListError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pattern: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|e| e.pattern() == pattern)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.get(pattern).is_some()
    }

    pub(crate) fn push(&mut self, entry: PatternEntry) {
        self.entries.push(entry);
    }

    /// Remove an entry. Its leading lines move to the entry that followed it.
    pub(crate) fn remove(&mut self, pattern: &str) -> Option<PatternEntry> {
        let idx = self.entries.iter().position(|e| e.pattern() == pattern)?;
        let mut removed = self.entries.remove(idx);
        let leading = std::mem::take(&mut removed.leading);
        match self.entries.get_mut(idx) {
            Some(next) => {
                let mut merged = leading;
                merged.append(&mut next.leading);
                next.leading = merged;
            }
            None => {
                let mut merged = leading;
                merged.append(&mut self.trailing);
                self.trailing = merged;
            }
        }
        Some(removed)
    }
}
