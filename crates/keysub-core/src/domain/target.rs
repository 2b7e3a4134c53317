//! The fixed source → replacement pair an engine instance works on.

use thiserror::Error;

/// Character the engine stops the user from typing by default.
pub const DEFAULT_SOURCE_CHAR: char = '§';

/// Character injected in place of the source character by default.
pub const DEFAULT_REPLACEMENT_CHAR: char = '`';

/// Error returned when a substitution pair cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("source and replacement are both {0:?}; nothing would change")]
    IdenticalCharacters(char),
    #[error("{0:?} is a control character and cannot be produced by a printable key")]
    ControlCharacter(char),
}

/// A validated source/replacement pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionTarget {
    source: char,
    replacement: char,
}

impl SubstitutionTarget {
    /// # Errors
    ///
    /// Returns [`TargetError`] when the characters are identical or when
    /// either is a control character.
    pub fn new(source: char, replacement: char) -> Result<Self, TargetError> {
        for c in [source, replacement] {
            if c.is_control() {
                return Err(TargetError::ControlCharacter(c));
            }
        }
        if source == replacement {
            return Err(TargetError::IdenticalCharacters(source));
        }
        Ok(Self {
            source,
            replacement,
        })
    }

    pub fn source(&self) -> char {
        self.source
    }

    pub fn replacement(&self) -> char {
        self.replacement
    }
}

impl Default for SubstitutionTarget {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_CHAR,
            replacement: DEFAULT_REPLACEMENT_CHAR,
        }
    }
}
