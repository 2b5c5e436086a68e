//! `yy lalr`: run generated LALR tables over a lexed file.
//!
//! Lexer tokens are mapped onto table tokens by name: a pattern's name, or
//! `'c'` for a literal character. Each reduction builds a value node
//! labelled with the reduced symbol, so the accepted value is the parse
//! tree.

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use yy_parser::{
    Error, LalrGrammar, LalrHost, LalrOptions, LalrParser, Lexer, Symbol, TableValue, TraceFlags,
};

use super::{located, print_json, read_source};
use crate::config::Config;
use crate::description::{load, LexerDescription, TableDescription};

/// LALR command inputs.
#[derive(Debug)]
pub struct LalrAction<'a> {
    pub file: &'a Path,
    pub patterns: &'a Path,
    pub tables: &'a Path,
    /// Resume after syntax errors instead of stopping at the first one.
    pub keep_going: bool,
    pub max_stack: usize,
    pub trace: bool,
}

/// Semantic value: a token's text, or a reduced symbol over its parts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Value {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Value>,
}

#[derive(Serialize)]
struct LalrReport<'a> {
    accepted: bool,
    reductions: usize,
    diagnostics: &'a [String],
    value: Option<&'a Value>,
}

struct TableHost<'a> {
    lexer: Lexer<'a>,
    grammar: LalrGrammar<'a>,
    path: &'a Path,
    /// Lexer symbol to table token.
    tokens: FxHashMap<Symbol, Symbol>,
    undefined: Symbol,
    keep_going: bool,
    reductions: usize,
    diagnostics: Vec<String>,
}

impl LalrHost<Value> for TableHost<'_> {
    fn next_token(&mut self) -> Result<Option<(Symbol, Value)>, Error> {
        let Some(token) = self.lexer.get_token()? else {
            return Ok(None);
        };

        let symbol = self
            .tokens
            .get(&token.symbol)
            .copied()
            .unwrap_or(self.undefined);
        let text = token
            .text(self.lexer.input())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        Ok(Some((
            symbol,
            Value {
                label: text,
                children: Vec::new(),
            },
        )))
    }

    fn reduce(&mut self, symbol: Symbol, rule: usize, values: &[Value], out: &mut Value) -> Result<(), Error> {
        self.reductions += 1;
        let name = TableValue::try_from(symbol).map_or("?", |id| self.grammar.symbol_name(id));
        debug!(rule, symbol = name, "reduce");
        *out = Value {
            label: name.to_string(),
            children: values.to_vec(),
        };
        Ok(())
    }

    fn error(&mut self, err: Error) -> Result<(), Error> {
        let kind = match err {
            Error::ParseError => "syntax error",
            Error::MalformedInput { .. } => "lexical error",
            Error::TooManyItems { .. } => "overflow",
            _ => "error",
        };
        let (line, column) = self.lexer.location();
        let message = format!("{}:{line}:{column}: {kind}", self.path.display());
        warn!("{message}");
        self.diagnostics.push(message);

        if self.keep_going && matches!(err, Error::ParseError) {
            return Ok(());
        }

        Err(err)
    }
}

/// Run the lalr command.
pub fn run(config: &Config, action: &LalrAction<'_>) -> Result<()> {
    let lexer_description: LexerDescription =
        load(&config.resolve(action.patterns)).into_diagnostic()?;
    let tables: TableDescription = load(&config.resolve(action.tables)).into_diagnostic()?;
    tables.validate().into_diagnostic()?;
    let names = tables.names();
    let grammar = names.grammar(&tables);

    // Map every lexer symbol the tables know by name.
    let table_ids = tables.token_ids();
    let mut tokens = FxHashMap::default();
    for (name, lexer_id) in lexer_description.symbols().into_diagnostic()? {
        match table_ids.get(name.as_str()) {
            Some(&table_id) => {
                tokens.insert(lexer_id, table_id);
            }
            None => debug!(token = %name, "token unknown to the tables"),
        }
    }

    let (path, input) = read_source(config, action.file)?;
    let table = lexer_description.table();
    let lexer = Lexer::new(&input, table.pattern_set(), lexer_description.options());
    let host = TableHost {
        lexer,
        grammar,
        path: &path,
        tokens,
        undefined: tables.undefined_symbol(),
        keep_going: action.keep_going,
        reductions: 0,
        diagnostics: Vec::new(),
    };

    let mut options = LalrOptions::default().with_max_stack(action.max_stack);
    if action.trace {
        options = options.with_trace(TraceFlags::LALR);
    }

    let mut parser = LalrParser::new(grammar, host, options);
    let outcome = parser.run();
    let errors = parser.error_count();
    let value = parser.value().cloned();
    let host = parser.into_host();
    info!(
        reductions = host.reductions,
        errors,
        accepted = outcome.is_ok(),
        "ran tables over {}",
        path.display()
    );

    if config.json_logs {
        print_json(&LalrReport {
            accepted: outcome.is_ok(),
            reductions: host.reductions,
            diagnostics: &host.diagnostics,
            value: outcome.as_ref().ok().and(value.as_ref()),
        })?;
    } else {
        for message in &host.diagnostics {
            eprintln!("{message}");
        }
        if let (Ok(()), Some(value)) = (&outcome, &value) {
            print_value(value, 0);
            println!("accepted after {} reductions, {errors} errors", host.reductions);
        }
    }

    outcome.map_err(|err| located(&path, &err))
}

fn print_value(value: &Value, depth: usize) {
    let indent = depth * 2;
    if value.children.is_empty() {
        println!("{:indent$}{:?}", "", value.label);
        return;
    }

    println!("{:indent$}{}", "", value.label);
    for child in &value.children {
        print_value(child, depth + 1);
    }
}

