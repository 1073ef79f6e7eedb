//! Short identifier generation.
//!
//! Names are produced by bijective base-N counting over a fixed alphabet:
//! every name of length 1 comes before any name of length 2, and names of the
//! same length are ordered alphabetically (`a`..`z`, `aa`..`az`, `ba`, ...).
//! The sequence is a pure function of the index, so "skip and take the next"
//! never needs generator state.

use compact_str::CompactString;

use crate::errors::ConfigError;

/// Lowercase ASCII letters. Every name drawn from it is a valid CSS identifier.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Deterministic, infinite sequence of short names.
///
/// # Examples
///
/// ```
/// use ruminate::naming::IdentifierSequence;
///
/// let seq = IdentifierSequence::default();
/// assert_eq!(seq.nth(0), "a");
/// assert_eq!(seq.nth(25), "z");
/// assert_eq!(seq.nth(26), "aa");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierSequence {
    alphabet: Vec<char>,
}

impl IdentifierSequence {
    /// Build a sequence over a custom alphabet.
    ///
    /// Duplicate characters would make the sequence non-injective, so they
    /// are rejected along with an empty alphabet.
    pub fn new(alphabet: &str) -> Result<Self, ConfigError> {
        let chars: Vec<char> = alphabet.chars().collect();
        if chars.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(ConfigError::DuplicateAlphabetChar(*c));
            }
        }
        Ok(Self { alphabet: chars })
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// The name at position `index` (0-based).
    pub fn nth(&self, index: u64) -> CompactString {
        let base = self.alphabet.len() as u64;
        let mut digits = Vec::new();
        let mut n = index + 1;
        while n > 0 {
            n -= 1;
            digits.push(self.alphabet[(n % base) as usize]);
            n /= base;
        }
        digits.iter().rev().collect()
    }

    /// Iterate names starting at `start`.
    pub fn iter_from(&self, start: u64) -> Names<'_> {
        Names {
            sequence: self,
            next: start,
        }
    }

    /// Iterate names from the beginning.
    pub fn iter(&self) -> Names<'_> {
        self.iter_from(0)
    }
}

impl Default for IdentifierSequence {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

/// Iterator over an [`IdentifierSequence`]. Never ends.
#[derive(Debug, Clone)]
pub struct Names<'a> {
    sequence: &'a IdentifierSequence,
    next: u64,
}

impl Iterator for Names<'_> {
    type Item = CompactString;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.sequence.nth(self.next);
        self.next += 1;
        Some(name)
    }
}
