//! Dotted identifiers, used for gate names and `usepulses` module paths.

use std::fmt;

const RESERVED_WORDS: &[&str] = &[
    "register", "map", "let", "macro", "loop", "branch", "subcircuit", "usepulses",
];

/// A non-empty sequence of identifier segments, rendered dotted (`a.b.c`).
///
/// A `usepulses` module path may have leading empty segments to denote a
/// relative path (`.foo.bar`), so segments are not individually validated as
/// non-empty; only the whole identifier must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    segments: Vec<String>,
}

impl Identifier {
    /// Build an identifier from a single unqualified segment.
    pub fn simple(name: impl Into<String>) -> Self {
        Identifier {
            segments: vec![name.into()],
        }
    }

    /// Build a qualified identifier from dot-separated segments.
    pub fn qualified(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Identifier { segments })
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True if this identifier is a single segment (not dotted).
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    /// The final segment, used as the unqualified name at use sites.
    pub fn leaf(&self) -> &str {
        self.segments.last().expect("identifier is never empty")
    }

    /// Number of leading empty segments, i.e. leading dots in `.foo.bar`.
    pub fn leading_dots(&self) -> usize {
        self.segments.iter().take_while(|s| s.is_empty()).count()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Is `segment` a syntactically valid identifier segment (and not a reserved
/// word)?
pub fn is_valid_segment(segment: &str) -> bool {
    if segment.is_empty() || RESERVED_WORDS.contains(&segment) {
        return false;
    }
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
