//! Error handling for the harness.
//!
//! All parsing and reduction failures are fatal to the current parse and
//! surface through one crate-wide [`Error`] enum. [`Error::kind`] classifies
//! each variant so callers can distinguish a deliberate capacity ceiling
//! ([`ErrorKind::BufferOverflow`]) from malformed input without matching on
//! individual variants.
//!
//! Degenerate timer calibration is deliberately *not* represented here: it is
//! the `0` sentinel returned by [`crate::timing::estimate_frequency`], and it
//! never affects parsing results.

use thiserror::Error;

/// All fatal failures raised by the tokenizer, parsers, and reducer.
#[derive(Debug, Error)]
pub enum Error {
    /// A byte that cannot start any JSON token.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// A backslash escape other than `\" \\ \/ \b \f \n \r \t`.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// Input that starts like `true`/`false`/`null` but does not match it.
    #[error("expected literal '{expected}'")]
    InvalidLiteral {
        /// The keyword the input was expected to spell out.
        expected: &'static str,
    },

    /// The stream ended in the middle of a token or structure.
    #[error("unexpected end of input {context}")]
    UnexpectedEof {
        /// Where the input ran out, e.g. `"in string"`.
        context: &'static str,
    },

    /// A string, property name, or numeric literal exceeded its fixed
    /// scratch-buffer capacity. The capacities are deliberate ceilings, not
    /// resizable buffers; see [`crate::json::limits`].
    #[error("{what} exceeds the maximum length of {capacity} bytes")]
    BufferOverflow {
        /// Which literal overflowed, e.g. `"string literal"`.
        what: &'static str,
        /// The capacity that was exceeded, in bytes.
        capacity: usize,
    },

    /// A string literal that decoded to invalid UTF-8.
    #[error("string literal is not valid UTF-8")]
    InvalidUtf8,

    /// Accumulated numeric text that `f64` parsing rejected.
    #[error("malformed number literal '{0}'")]
    MalformedNumber(String),

    /// A required token was missing or of the wrong kind.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// Description of the token that was required here.
        expected: &'static str,
        /// Description of the token that was actually present.
        found: String,
    },

    /// Data followed a complete top-level value.
    #[error("trailing data after top-level value")]
    TrailingData,

    /// A typed accessor was called on a [`crate::json::JsonValue`] whose
    /// actual tag differs.
    #[error("expected {expected}, found {actual}")]
    TypeMismatch {
        /// The tag the caller asked for.
        expected: &'static str,
        /// The value's actual tag.
        actual: &'static str,
    },

    /// Failure reading from the underlying stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Byte-level failures: bad characters, bad escapes, truncated
    /// literals, unterminated strings or structures.
    Lexical,
    /// A fixed-capacity scratch buffer was exceeded.
    BufferOverflow,
    /// Token-level failures: wrong punctuation, trailing data.
    Structural,
    /// A typed view of a tree value did not match its tag.
    TypeAccess,
    /// The underlying stream failed.
    Io,
}

impl Error {
    /// Classify this error into the taxonomy callers branch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter(_)
            | Error::InvalidEscape(_)
            | Error::InvalidLiteral { .. }
            | Error::UnexpectedEof { .. }
            | Error::InvalidUtf8
            | Error::MalformedNumber(_) => ErrorKind::Lexical,
            Error::BufferOverflow { .. } => ErrorKind::BufferOverflow,
            Error::UnexpectedToken { .. } | Error::TrailingData => ErrorKind::Structural,
            Error::TypeMismatch { .. } => ErrorKind::TypeAccess,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type for parse and reduce operations.
pub type ParseResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::UnexpectedCharacter('%').kind(), ErrorKind::Lexical);
        assert_eq!(
            Error::UnexpectedEof { context: "in string" }.kind(),
            ErrorKind::Lexical
        );
        assert_eq!(
            Error::BufferOverflow {
                what: "string literal",
                capacity: 4096
            }
            .kind(),
            ErrorKind::BufferOverflow
        );
        assert_eq!(Error::TrailingData.kind(), ErrorKind::Structural);
        assert_eq!(
            Error::TypeMismatch {
                expected: "number",
                actual: "string"
            }
            .kind(),
            ErrorKind::TypeAccess
        );
    }

    #[test]
    fn test_display_names_expected_and_actual() {
        let err = Error::UnexpectedToken {
            expected: "':'",
            found: "'}'".to_string(),
        };
        assert_eq!(err.to_string(), "expected ':', found '}'");
    }

    #[test]
    fn test_eof_mentions_unexpected_end_of_input() {
        let err = Error::UnexpectedEof {
            context: "inside object",
        };
        assert!(err.to_string().contains("unexpected end of input"));
    }
}
