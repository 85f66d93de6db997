//! Internal error taxonomy.
//!
//! `spec.md` §7 is explicit that the parser's public surface reports nothing
//! beyond the terminal [`crate::token::TokenType::Error`] token — no
//! position, no message, no recoverable variant. This module exists for the
//! implementation and its own test suite, not for downstream consumers: it
//! gives the state machine a typed reason to latch `Error` instead of a
//! scattering of `bool`/`()` returns, the way the teacher crate threads a
//! typed `Error` through its `Result`-returning API. Nothing here is part of
//! the crate's public API (see `DESIGN.md` for the rationale).

use std::fmt;

/// Why the parser latched into the terminal `Error` token.
///
/// Kept crate-private; retrievable only through `#[cfg(test)]`-only
/// accessors used by this crate's own test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseErrorKind {
    /// A byte sequence could not be decoded as a codepoint in the selected
    /// codec (overlong UTF-8, unpaired UTF-16 surrogate, ...).
    Encoding,
    /// The XML declaration was present but malformed, or declared a version
    /// or encoding this codec rejects.
    Declaration,
    /// A `Name` was expected but the current character is not a
    /// `NameStartChar`.
    ExpectedName,
    /// An attribute was missing its `=`, or its value was not `'`/`"`
    /// delimited.
    MalformedAttribute,
    /// A character or entity reference was not a recognized predefined
    /// entity, or a numeric reference was malformed (non-digit, empty digit
    /// sequence, or out of range).
    MalformedReference,
    /// A codepoint forbidden by the XML `Char` production appeared where
    /// character or attribute content was expected.
    IllegalChar,
    /// A tag was not terminated the way the grammar requires (e.g. garbage
    /// after `/`, or a close tag whose name wasn't followed by optional
    /// whitespace and `>`).
    MalformedTag,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Encoding => "invalid byte sequence for the selected encoding",
            Self::Declaration => "malformed or unsupported XML declaration",
            Self::ExpectedName => "expected a Name",
            Self::MalformedAttribute => "malformed attribute",
            Self::MalformedReference => "malformed character or entity reference",
            Self::IllegalChar => "illegal character in this context",
            Self::MalformedTag => "malformed tag",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseErrorKind {}
