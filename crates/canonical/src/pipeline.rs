use std::fmt;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::hash::{digest_bytes, Digest256};

/// Normalize raw text into its canonical form.
///
/// Steps, in order: lowercase, NFKC, lowercase again, then a single pass that
/// keeps alphanumeric characters, turns whitespace runs into one ASCII space,
/// and drops everything else. Leading and trailing whitespace never survive.
///
/// Dropping a character can leave two composable characters side by side
/// (`"\u{1100}-\u{1161}"`), so when the first pass drops anything the pass
/// is repeated until the output stops changing. The result is idempotent.
///
/// The function is total: empty or punctuation-only input yields `""`.
///
/// ```rust
/// use canonical::normalize;
///
/// assert_eq!(normalize("  The  Water-Cycle,\tEXPLAINED! "), "the watercycle explained");
/// assert_eq!(normalize("?!"), "");
/// assert_eq!(normalize("\u{1100}-\u{1161}"), normalize("\u{AC00}"));
/// ```
pub fn normalize(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let (mut canonical, dropped) = canonical_pass(input);
    if dropped {
        loop {
            let (next, _) = canonical_pass(&canonical);
            if next == canonical {
                break;
            }
            canonical = next;
        }
    }
    canonical
}

/// One lowercase/NFKC/filter pass. The flag reports whether any
/// non-whitespace character was dropped.
fn canonical_pass(input: &str) -> (String, bool) {
    let mut canonical = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut dropped = false;

    // NFKC can emit uppercase (U+210C -> 'H'), so fold again afterwards.
    for ch in input.to_lowercase().nfkc().flat_map(char::to_lowercase) {
        dropped |= !dispatch_char(ch, &mut canonical, &mut pending_space);
    }

    (canonical, dropped)
}

/// Decides whether a character is kept, treated as a separator, or dropped.
/// Returns `false` only when the character was dropped.
#[inline]
fn dispatch_char(ch: char, canonical: &mut String, pending_space: &mut bool) -> bool {
    if ch.is_whitespace() {
        // A separator only matters once some content has been written.
        if !canonical.is_empty() {
            *pending_space = true;
        }
        true
    } else if ch.is_alphanumeric() {
        if *pending_space {
            canonical.push(' ');
            *pending_space = false;
        }
        canonical.push(ch);
        true
    } else {
        // Punctuation, symbols, marks and control characters vanish without
        // breaking the current word: "water-cycle" becomes "watercycle".
        false
    }
}

/// Text that has already been through [`normalize`].
///
/// Holding a `CanonicalText` means the normalization step cannot be skipped
/// or applied twice by accident; every downstream hash is computed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalText(String);

impl CanonicalText {
    /// Normalize `raw` and wrap the result.
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the canonical form in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Words of the canonical text. Canonical text is single-space separated,
    /// so this never yields empty items.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split(' ').filter(|w| !w.is_empty())
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    /// SHA-256 of the canonical UTF-8 bytes.
    pub fn digest(&self) -> Digest256 {
        digest_bytes(self.0.as_bytes())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalText {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
