pub mod lalr;
pub mod lex;
pub mod parse;
pub mod version;

use std::path::{Path, PathBuf};

use miette::{miette, IntoDiagnostic, Report, Result, WrapErr};
use serde::Serialize;
use yy_parser::{Error, Lexer, Symbol, Token};

use crate::config::Config;
use crate::description::literal_name;

/// Read a source file named on the command line.
pub(crate) fn read_source(config: &Config, file: &Path) -> Result<(PathBuf, Vec<u8>)> {
    let path = config.resolve(file);
    let input = std::fs::read(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok((path, input))
}

/// Turn a library error into a report, prefixed with `file:line:column`
/// when the error carries a location.
pub(crate) fn located(path: &Path, err: &Error) -> Report {
    match *err {
        Error::MalformedInput { line, column, .. } | Error::InvalidSequence { line, column } => {
            miette!("{}:{line}:{column}: {err}", path.display())
        }
        _ => miette!("{}: {err}", path.display()),
    }
}

/// Display name of a lexer symbol.
pub(crate) fn symbol_label(lexer: &Lexer<'_>, symbol: Symbol) -> String {
    if let Some(name) = lexer.symbol_name(symbol) {
        return name.to_string();
    }

    match u8::try_from(symbol) {
        Ok(byte) => literal_name(byte),
        Err(_) => format!("#{symbol}"),
    }
}

/// A token as it appears in command output.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRecord {
    pub symbol: Symbol,
    pub name: String,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl TokenRecord {
    pub(crate) fn new(lexer: &Lexer<'_>, token: &Token) -> Self {
        let text = token
            .text(lexer.input())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        Self {
            symbol: token.symbol,
            name: symbol_label(lexer, token.symbol),
            text,
            line: token.line,
            column: token.column,
            offset: token.position(),
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
