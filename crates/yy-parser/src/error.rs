//! Error type shared by the lexer and both parsing engines.

use thiserror::Error;

/// Boxed error returned by host callbacks.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the lexer, the recursive-descent driver and the LALR
/// interpreter.
///
/// End of input is not an error: token sources report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// No literal, real pattern or ignore pattern matched at `position`.
    #[error("malformed input at {line}:{column} (offset {position})")]
    MalformedInput {
        position: usize,
        line: u32,
        column: u32,
    },

    /// The start element did not match the whole token stream.
    #[error("invalid sequence at {line}:{column}")]
    InvalidSequence { line: u32, column: u32 },

    /// Memory could not be reserved.
    #[error("insufficient resources")]
    InsufficientResources,

    /// The recursion ceiling was reached.
    #[error("maximum recursion depth of {depth} exceeded")]
    BufferOverrun { depth: u32 },

    /// The LALR automaton could not recover from a syntax error.
    #[error("parse error")]
    ParseError,

    /// The LALR stacks reached their ceiling.
    #[error("parse stack exceeded {limit} items")]
    TooManyItems { limit: usize },

    /// A destroyed (or never allocated) node handle was used.
    #[error("node {0} is not live")]
    StaleNode(u32),

    /// A symbol outside the grammar was used where an element was expected.
    #[error("symbol {0} is not a grammar element")]
    UnknownElement(u32),

    /// The LALR tables referenced an entry that does not exist.
    #[error("malformed parse table: {0}")]
    MalformedTable(&'static str),

    /// Failure reported by a host callback, propagated verbatim.
    #[error(transparent)]
    Host(HostError),
}

impl Error {
    /// Wrap a host-side failure.
    #[must_use]
    pub fn host(err: impl Into<HostError>) -> Self {
        Self::Host(err.into())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::InsufficientResources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::MalformedInput {
            position: 7,
            line: 2,
            column: 3,
        };
        assert_eq!(err.to_string(), "malformed input at 2:3 (offset 7)");
        assert_eq!(
            Error::TooManyItems { limit: 10 }.to_string(),
            "parse stack exceeded 10 items"
        );
    }

    #[test]
    fn test_host_is_transparent() {
        let err = Error::host("reduction failed");
        assert_eq!(err.to_string(), "reduction failed");
        assert!(matches!(err, Error::Host(_)));
    }

    #[test]
    fn test_reserve_failure_maps_to_resources() {
        let mut v: Vec<u64> = Vec::new();
        let err: Error = v.try_reserve(usize::MAX).unwrap_err().into();
        assert!(matches!(err, Error::InsufficientResources));
    }
}
