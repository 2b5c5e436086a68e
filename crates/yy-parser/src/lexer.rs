//! Pattern-driven lexer.
//!
//! Each call to [`Lexer::get_token`] tries, in order:
//!
//! 1. the single-byte literal set (the byte value is the symbol),
//! 2. the real patterns, longest match winning and the earliest pattern
//!    winning ties (symbol is `token_base + index`),
//! 3. the ignore patterns, same rule, with the match discarded,
//! 4. a one-byte skip when `skip_unknown` is set.
//!
//! Ignored spans are consumed in a loop so the caller only ever sees real
//! tokens, end of input, or an error.

use tracing::debug;

use crate::error::Error;
use crate::regex::Pattern;
use crate::span::Span;
use crate::token::{Symbol, Token, TokenSource};

/// Default value of [`LexerOptions::token_base`]: just above every byte.
pub const DEFAULT_TOKEN_BASE: Symbol = 256;

/// The patterns a lexer recognizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSet<'p> {
    /// Bytes returned as single-character tokens.
    pub literals: &'p [u8],
    /// Real token patterns, in priority order.
    pub expressions: &'p [&'p str],
    /// Display names parallel to `expressions`. Empty means use the pattern.
    pub names: &'p [&'p str],
    /// Patterns whose matches are skipped.
    pub ignore: &'p [&'p str],
}

impl<'p> PatternSet<'p> {
    /// Create a pattern set with real patterns only.
    #[must_use]
    pub const fn new(expressions: &'p [&'p str]) -> Self {
        Self {
            literals: &[],
            expressions,
            names: &[],
            ignore: &[],
        }
    }

    /// Set the literal bytes.
    #[must_use]
    pub const fn with_literals(mut self, literals: &'p [u8]) -> Self {
        self.literals = literals;
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub const fn with_ignore(mut self, ignore: &'p [&'p str]) -> Self {
        self.ignore = ignore;
        self
    }

    /// Set display names for the real patterns.
    #[must_use]
    pub const fn with_names(mut self, names: &'p [&'p str]) -> Self {
        self.names = names;
        self
    }

    /// Display name of real pattern `index`, falling back to its text.
    pub fn name(&self, index: usize) -> Option<&'p str> {
        self.names
            .get(index)
            .or_else(|| self.expressions.get(index))
            .copied()
    }
}

/// Lexer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerOptions {
    /// Symbol id of the first real pattern.
    pub token_base: Symbol,
    /// Skip bytes nothing matches instead of failing.
    pub skip_unknown: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            token_base: DEFAULT_TOKEN_BASE,
            skip_unknown: false,
        }
    }
}

impl LexerOptions {
    /// Set the token base.
    #[must_use]
    pub fn with_token_base(mut self, token_base: Symbol) -> Self {
        self.token_base = token_base;
        self
    }

    /// Enable or disable unknown-byte skipping.
    #[must_use]
    pub fn with_skip_unknown(mut self, skip: bool) -> Self {
        self.skip_unknown = skip;
        self
    }
}

/// Running totals over the tokens returned so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexerStats {
    /// Number of tokens returned.
    pub token_count: usize,
    /// Size of the largest token, in bytes.
    pub largest_token: usize,
    /// Sum of all token sizes, in bytes.
    pub total_size: usize,
}

/// The lexer state.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    patterns: PatternSet<'a>,
    options: LexerOptions,
    /// Current byte position.
    pos: usize,
    /// Current line (1-based).
    line: u32,
    /// Current column (0-based).
    column: u32,
    stats: LexerStats,
}

/// How the bytes at the cursor were classified.
enum Lexeme {
    Token(Symbol, usize),
    Ignored(usize),
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over `input`.
    pub fn new(input: &'a [u8], patterns: PatternSet<'a>, options: LexerOptions) -> Self {
        Self {
            input,
            patterns,
            options,
            pos: 0,
            line: 1,
            column: 0,
            stats: LexerStats::default(),
        }
    }

    /// Reset the cursor and statistics to the start of input.
    pub fn initialize(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.column = 0;
        self.stats = LexerStats::default();
    }

    /// Get the current byte position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current line (1-based) and column (0-based).
    #[inline]
    pub fn location(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Statistics over the tokens returned so far.
    #[inline]
    pub fn stats(&self) -> LexerStats {
        self.stats
    }

    /// The input being lexed.
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// The pattern set in use.
    #[inline]
    pub fn patterns(&self) -> &PatternSet<'a> {
        &self.patterns
    }

    /// The configured options.
    #[inline]
    pub fn options(&self) -> LexerOptions {
        self.options
    }

    /// Display name of a real pattern's symbol: its name, or the pattern
    /// text when unnamed. Literal bytes have no name.
    pub fn symbol_name(&self, symbol: Symbol) -> Option<&'a str> {
        let index = symbol.checked_sub(self.options.token_base)?;
        self.patterns.name(usize::try_from(index).ok()?)
    }

    /// Get the next token.
    ///
    /// Returns `Ok(None)` at end of input and [`Error::MalformedInput`] when
    /// nothing matches and unknown bytes are not skipped. A failed call
    /// leaves the cursor on the offending byte and the statistics untouched.
    pub fn get_token(&mut self) -> Result<Option<Token>, Error> {
        loop {
            if self.pos >= self.input.len() {
                return Ok(None);
            }

            match self.classify() {
                Some(Lexeme::Token(symbol, len)) => {
                    let token = Token::new(symbol, Span::at(self.pos, len), self.line, self.column);
                    self.advance(len);
                    self.stats.token_count += 1;
                    self.stats.largest_token = self.stats.largest_token.max(len);
                    self.stats.total_size += len;
                    return Ok(Some(token));
                }
                Some(Lexeme::Ignored(len)) => self.advance(len),
                None => {
                    debug!(
                        position = self.pos,
                        line = self.line,
                        column = self.column,
                        "no pattern matched"
                    );
                    return Err(Error::MalformedInput {
                        position: self.pos,
                        line: self.line,
                        column: self.column,
                    });
                }
            }
        }
    }

    /// Decide what the bytes at the cursor are.
    fn classify(&self) -> Option<Lexeme> {
        let byte = self.input[self.pos];
        if self.patterns.literals.contains(&byte) {
            return Some(Lexeme::Token(Symbol::from(byte), 1));
        }

        if let Some((index, len)) = self.longest_match(self.patterns.expressions) {
            let offset = Symbol::try_from(index).unwrap_or(Symbol::MAX);
            return Some(Lexeme::Token(self.options.token_base.saturating_add(offset), len));
        }

        if let Some((_, len)) = self.longest_match(self.patterns.ignore) {
            return Some(Lexeme::Ignored(len));
        }

        self.options.skip_unknown.then_some(Lexeme::Ignored(1))
    }

    /// The pattern with the longest non-empty match at the cursor; the
    /// earliest pattern wins ties.
    fn longest_match(&self, patterns: &[&str]) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            let Some(len) = Pattern::new(pattern).match_len(self.input, self.pos) else {
                continue;
            };

            if len > 0 && best.map_or(true, |(_, longest)| len > longest) {
                best = Some((index, len));
            }
        }

        best
    }

    /// Move the cursor forward, tracking lines and columns.
    fn advance(&mut self, len: usize) {
        let end = (self.pos + len).min(self.input.len());
        for &byte in &self.input[self.pos..end] {
            if byte == b'\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }

        self.pos = end;
    }
}

impl TokenSource for Lexer<'_> {
    #[inline]
    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        self.get_token()
    }

    fn symbol_name(&self, symbol: Symbol) -> Option<&str> {
        Lexer::symbol_name(self, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(lexer: &mut Lexer<'_>) -> Vec<(Symbol, String)> {
        let mut tokens = Vec::new();
        while let Some(token) = lexer.get_token().unwrap() {
            let text = token.text(lexer.input()).unwrap();
            tokens.push((token.symbol, String::from_utf8_lossy(text).into_owned()));
        }
        tokens
    }

    #[test]
    fn test_longest_match_across_patterns() {
        let expressions = ["[0-9]+", "[a-z]+"];
        let mut lexer = Lexer::new(b"ab12", PatternSet::new(&expressions), LexerOptions::default());
        assert_eq!(
            tokenize(&mut lexer),
            vec![(257, "ab".to_string()), (256, "12".to_string())]
        );
    }

    #[test]
    fn test_ignore_loop() {
        let expressions = ["[a-z]+"];
        let ignore = [" +"];
        let patterns = PatternSet::new(&expressions).with_ignore(&ignore);
        let mut lexer = Lexer::new(b"a   b", patterns, LexerOptions::default());

        let first = lexer.get_token().unwrap().unwrap();
        assert_eq!(first.span, Span::new(0, 1));
        let second = lexer.get_token().unwrap().unwrap();
        assert_eq!(second.span, Span::new(4, 5));
        assert_eq!(second.column, 4);
        assert!(lexer.get_token().unwrap().is_none());
        assert_eq!(lexer.stats().token_count, 2);
        assert_eq!(lexer.stats().total_size, 2);
    }

    #[test]
    fn test_earliest_pattern_wins_ties() {
        let expressions = ["if", "[a-z]+"];
        let mut lexer = Lexer::new(b"if iffy", PatternSet::new(&expressions).with_ignore(&[" "]), LexerOptions::default());
        assert_eq!(
            tokenize(&mut lexer),
            vec![(256, "if".to_string()), (257, "iffy".to_string())]
        );
    }

    #[test]
    fn test_literals_take_priority() {
        let expressions = ["[-+]?[0-9]+"];
        let patterns = PatternSet::new(&expressions).with_literals(b"+;");
        let mut lexer = Lexer::new(b"+5;", patterns, LexerOptions::default().with_token_base(1000));
        assert_eq!(
            tokenize(&mut lexer),
            vec![
                (Symbol::from(b'+'), "+".to_string()),
                (1000, "5".to_string()),
                (Symbol::from(b';'), ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_length_match_is_not_a_token() {
        let expressions = ["[a-z]*"];
        let mut lexer = Lexer::new(b"9", PatternSet::new(&expressions), LexerOptions::default());
        assert!(matches!(
            lexer.get_token(),
            Err(Error::MalformedInput { position: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_input_leaves_stats_alone() {
        let expressions = ["[a-z]+"];
        let ignore = [" "];
        let patterns = PatternSet::new(&expressions).with_ignore(&ignore);
        let mut lexer = Lexer::new(b"ab cd #ef", patterns, LexerOptions::default());

        assert!(lexer.get_token().unwrap().is_some());
        assert!(lexer.get_token().unwrap().is_some());
        let before = lexer.stats();

        let err = lexer.get_token().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedInput {
                position: 6,
                line: 1,
                column: 6
            }
        ));
        assert_eq!(lexer.stats(), before);
        assert_eq!(lexer.pos(), 6);
    }

    #[test]
    fn test_skip_unknown() {
        let expressions = ["[a-z]+"];
        let options = LexerOptions::default().with_skip_unknown(true);
        let mut lexer = Lexer::new(b"ab#@cd", PatternSet::new(&expressions), options);
        assert_eq!(
            tokenize(&mut lexer),
            vec![(256, "ab".to_string()), (256, "cd".to_string())]
        );
        assert_eq!(lexer.stats().token_count, 2);
    }

    #[test]
    fn test_line_tracking_across_multiline_token() {
        let expressions = ["/\\*.*?\\*/", "[a-z]+"];
        let ignore = ["[ \n]+"];
        let patterns = PatternSet::new(&expressions).with_ignore(&ignore);
        let mut lexer = Lexer::new(b"/* a\nb */\n  x", patterns, LexerOptions::default());

        let comment = lexer.get_token().unwrap().unwrap();
        assert_eq!((comment.line, comment.column), (1, 0));
        let ident = lexer.get_token().unwrap().unwrap();
        assert_eq!(ident.symbol, 257);
        assert_eq!((ident.line, ident.column), (3, 2));
        assert_eq!(lexer.stats().largest_token, 9);
    }

    #[test]
    fn test_initialize_resets() {
        let expressions = ["[a-z]+"];
        let mut lexer = Lexer::new(b"abc", PatternSet::new(&expressions), LexerOptions::default());
        assert!(lexer.get_token().unwrap().is_some());
        lexer.initialize();
        assert_eq!(lexer.pos(), 0);
        assert_eq!(lexer.location(), (1, 0));
        assert_eq!(lexer.stats(), LexerStats::default());
        assert!(lexer.get_token().unwrap().is_some());
    }

    #[test]
    fn test_symbol_names() {
        let expressions = ["[0-9]+", "[a-z]+"];
        let names = ["NUMBER"];
        let patterns = PatternSet::new(&expressions).with_names(&names);
        let lexer = Lexer::new(b"", patterns, LexerOptions::default());
        assert_eq!(lexer.symbol_name(256), Some("NUMBER"));
        assert_eq!(lexer.symbol_name(257), Some("[a-z]+"));
        assert_eq!(lexer.symbol_name(258), None);
        assert_eq!(lexer.symbol_name(b'+'.into()), None);
    }
}
