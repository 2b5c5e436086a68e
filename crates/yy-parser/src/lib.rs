#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! yy-parser: embeddable lexing and parsing engines.
//!
//! Two independent strategies share one token model:
//!
//! 1. **Pattern lexer + recursive descent**
//!    - [`Lexer`] matches restricted regular expressions, longest match wins
//!    - [`Parser`] reduces grammar elements by ordered alternatives with
//!      backtracking and iterative left recursion, building a node tree
//!
//! 2. **LALR(1) tables**
//!    - [`LalrParser`] executes generator-produced shift/reduce/goto tables
//!    - reductions are handed to the host instead of building a tree
//!
//! Tables and patterns are borrowed, never copied. Memory is reserved
//! fallibly, so exhaustion surfaces as [`Error::InsufficientResources`].
//!
//! # Example
//!
//! ```
//! use yy_parser::{Grammar, GrammarElement, Lexer, LexerOptions, Parser, ParserOptions, PatternSet, Symbol};
//!
//! const WORD: Symbol = 256;
//! const LIST: &[&[Symbol]] = &[&[1000, WORD], &[WORD]];
//! const ELEMENTS: &[GrammarElement<'static>] = &[GrammarElement::new("List", LIST)];
//!
//! let expressions = ["[a-z]+"];
//! let ignore = [" +"];
//! let patterns = PatternSet::new(&expressions).with_ignore(&ignore);
//! let lexer = Lexer::new(b"one two three", patterns, LexerOptions::default());
//!
//! let mut parser = Parser::new(Grammar::new(1000, ELEMENTS), lexer, ParserOptions::default());
//! let root = parser.parse()?;
//! assert_eq!(parser.node(root).unwrap().token_count(), 3);
//! # Ok::<(), yy_parser::Error>(())
//! ```

mod arena;
mod error;
mod grammar;
mod lalr;
mod lexer;
mod parser;
mod regex;
mod span;
mod table;
mod token;
mod token_buffer;
mod trace;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports
pub use arena::{Node, NodeArena, NodeId};
pub use error::{Error, HostError};
pub use grammar::{ElementFlags, Grammar, GrammarElement};
pub use lalr::{LalrGrammar, LalrHost, LalrOptions, LalrParser, END_OF_INPUT, ERROR_SYMBOL};
pub use lexer::{Lexer, LexerOptions, LexerStats, PatternSet, DEFAULT_TOKEN_BASE};
pub use parser::{NodeRef, Parser, ParserHost, ParserOptions};
pub use regex::Pattern;
pub use span::Span;
pub use table::{CompressedTable, TableValue};
pub use token::{Symbol, Token, TokenSource};
pub use token_buffer::TokenBuffer;
pub use trace::{TraceFlags, LALR_TARGET, RD_TARGET};
