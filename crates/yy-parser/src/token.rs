//! Tokens and the token source trait.
//!
//! Literal characters and pattern matches share one numbering space: a
//! literal byte is its own symbol id, a pattern match is `token_base` plus
//! the pattern's declaration index.

use crate::error::Error;
use crate::span::Span;

/// A symbol id. Tokens and grammar elements share this space.
pub type Symbol = u32;

/// A token with its symbol and source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    /// The symbol id.
    pub symbol: Symbol,
    /// Byte range of the matched text.
    pub span: Span,
    /// Line the token starts on (1-based).
    pub line: u32,
    /// Column the token starts at (0-based).
    pub column: u32,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(symbol: Symbol, span: Span, line: u32, column: u32) -> Self {
        Self {
            symbol,
            span,
            line,
            column,
        }
    }

    /// Byte offset of the token in the input.
    #[inline]
    pub const fn position(&self) -> usize {
        self.span.start
    }

    /// Length of the token text in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.span.len()
    }

    /// The token text, or `None` if the span lies outside `input`.
    #[inline]
    pub fn text<'a>(&self, input: &'a [u8]) -> Option<&'a [u8]> {
        self.span.slice(input)
    }
}

/// Something that hands out tokens on demand.
///
/// `Ok(None)` signals end of input. Any error is propagated by the parser
/// unchanged.
pub trait TokenSource {
    /// Produce the next token.
    fn next_token(&mut self) -> Result<Option<Token>, Error>;

    /// Display name of a token symbol, used in trace output.
    fn symbol_name(&self, _symbol: Symbol) -> Option<&str> {
        None
    }
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    #[inline]
    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        (**self).next_token()
    }

    #[inline]
    fn symbol_name(&self, symbol: Symbol) -> Option<&str> {
        (**self).symbol_name(symbol)
    }
}
