//! `yy parse`: run the recursive-descent driver and print the tree.

use std::io::{self, Write};
use std::path::Path;

use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use tracing::{debug, info};
use yy_parser::{Grammar, GrammarElement, Lexer, NodeRef, Parser, ParserOptions, Token, TraceFlags};

use super::{located, print_json, read_source, TokenRecord};
use crate::config::Config;
use crate::description::{load, GrammarDescription, LexerDescription};

/// Parse command inputs.
#[derive(Debug)]
pub struct ParseAction<'a> {
    pub file: &'a Path,
    pub patterns: &'a Path,
    pub grammar: &'a Path,
    /// Element to parse instead of the grammar's start element.
    pub start: Option<&'a str>,
    pub max_depth: u32,
    pub trace: bool,
}

/// A node as it appears in JSON output.
#[derive(Serialize)]
struct TreeRecord {
    element: String,
    rule: Option<usize>,
    tokens: Vec<TokenRecord>,
    children: Vec<TreeRecord>,
}

/// Run the parse command.
pub fn run(config: &Config, action: &ParseAction<'_>) -> Result<()> {
    let lexer_description: LexerDescription =
        load(&config.resolve(action.patterns)).into_diagnostic()?;
    let grammar_description: GrammarDescription =
        load(&config.resolve(action.grammar)).into_diagnostic()?;
    let resolved = grammar_description
        .resolve(&lexer_description)
        .into_diagnostic()?;

    let start = match action.start {
        Some(name) => resolved
            .names
            .iter()
            .position(|n| n == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(|index| resolved.base + index)
            .ok_or_else(|| miette!("start element `{name}` is not defined"))?,
        None => resolved.start,
    };

    let rule_slices = resolved.rule_slices();
    let elements: Vec<GrammarElement<'_>> = resolved
        .names
        .iter()
        .zip(&rule_slices)
        .zip(&resolved.flags)
        .map(|((name, rules), flags)| GrammarElement::new(name, rules).with_flags(*flags))
        .collect();
    let grammar = Grammar::new(resolved.base, &elements).with_start(start);

    let (path, input) = read_source(config, action.file)?;
    let table = lexer_description.table();
    let lexer = Lexer::new(&input, table.pattern_set(), lexer_description.options());

    let mut options = ParserOptions::default().with_max_depth(action.max_depth);
    if action.trace {
        options = options.with_trace(TraceFlags::ALL);
    }

    let mut parser = Parser::new(grammar, lexer, options);
    let root = parser.parse().map_err(|err| located(&path, &err))?;
    let node = parser
        .node(root)
        .ok_or_else(|| miette!("parse returned a released node"))?;
    info!(
        tokens = parser.token_count(),
        nodes = parser.arena().live_count(),
        "parsed {}",
        path.display()
    );

    let lexer = parser.host();
    if config.json_logs {
        print_json(&record(grammar, lexer, node))?;
    } else {
        let mut out = io::stdout().lock();
        print_tree(&mut out, grammar, lexer, node, 0).into_diagnostic()?;
    }

    parser.destroy_node(root).into_diagnostic()?;
    debug!(free = parser.arena().free_count(), "tree released");
    Ok(())
}

fn element_name<'g>(grammar: Grammar<'g>, node: NodeRef<'_>) -> &'g str {
    grammar.name(node.element()).unwrap_or("?")
}

fn record(grammar: Grammar<'_>, lexer: &Lexer<'_>, node: NodeRef<'_>) -> TreeRecord {
    TreeRecord {
        element: element_name(grammar, node).to_string(),
        rule: node.rule(),
        tokens: node.tokens().map(|t| TokenRecord::new(lexer, t)).collect(),
        children: node
            .children()
            .map(|child| record(grammar, lexer, child))
            .collect(),
    }
}

/// Print a node, then its tokens and children in input order.
fn print_tree<W: Write>(
    out: &mut W,
    grammar: Grammar<'_>,
    lexer: &Lexer<'_>,
    node: NodeRef<'_>,
    depth: usize,
) -> io::Result<()> {
    let indent = depth * 2;
    match node.rule() {
        Some(rule) => writeln!(out, "{:indent$}{} (rule {rule})", "", element_name(grammar, node))?,
        None => writeln!(out, "{:indent$}{}", "", element_name(grammar, node))?,
    }

    enum Item<'p> {
        Token(&'p Token),
        Child(NodeRef<'p>),
    }

    let mut items: Vec<(usize, Item<'_>)> = node
        .token_indices()
        .iter()
        .zip(node.tokens())
        .map(|(&index, token)| (index, Item::Token(token)))
        .collect();
    for child in node.children() {
        let first = child
            .leaf_tokens()
            .first()
            .copied()
            .unwrap_or(child.start_token());
        items.push((first, Item::Child(child)));
    }
    items.sort_by_key(|(position, _)| *position);

    let inner = indent + 2;
    for (_, item) in items {
        match item {
            Item::Token(token) => {
                let record = TokenRecord::new(lexer, token);
                writeln!(
                    out,
                    "{:inner$}{} {:?} {}:{}",
                    "", record.name, record.text, record.line, record.column
                )?;
            }
            Item::Child(child) => print_tree(out, grammar, lexer, child, depth + 1)?,
        }
    }

    Ok(())
}
