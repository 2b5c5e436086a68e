//! `yy lex`: dump the token stream of a file.

use std::io::{self, Write};
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing::debug;
use yy_parser::{Lexer, LexerStats};

use super::{located, print_json, read_source, TokenRecord};
use crate::config::Config;
use crate::description::{load, LexerDescription};

#[derive(Serialize)]
struct LexReport {
    tokens: Vec<TokenRecord>,
    token_count: usize,
    largest_token: usize,
    total_size: usize,
}

/// Run the lex command.
///
/// Human output prints one line per source line that produced tokens,
/// each token as `NAME "text"`.
pub fn run(config: &Config, file: &Path, patterns: &Path) -> Result<()> {
    let description: LexerDescription = load(&config.resolve(patterns)).into_diagnostic()?;
    let (path, input) = read_source(config, file)?;
    let table = description.table();
    let mut lexer = Lexer::new(&input, table.pattern_set(), description.options());

    let mut tokens = Vec::new();
    while let Some(token) = lexer.get_token().map_err(|err| located(&path, &err))? {
        tokens.push(TokenRecord::new(&lexer, &token));
    }

    let LexerStats {
        token_count,
        largest_token,
        total_size,
    } = lexer.stats();
    debug!(token_count, largest_token, total_size, "lexed {}", path.display());

    if config.json_logs {
        return print_json(&LexReport {
            tokens,
            token_count,
            largest_token,
            total_size,
        });
    }

    print_human(&tokens).into_diagnostic()
}

fn print_human(tokens: &[TokenRecord]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let mut current = None;
    for token in tokens {
        if current != Some(token.line) {
            if current.is_some() {
                writeln!(out)?;
            }
            write!(out, "{:>4}:", token.line)?;
            current = Some(token.line);
        }
        write!(out, " {} {:?}", token.name, token.text)?;
    }

    if current.is_some() {
        writeln!(out)?;
    }
    Ok(())
}
