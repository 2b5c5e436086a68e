//! JSON description files.
//!
//! A lexer description lists the literal characters and the named patterns;
//! a grammar description lists elements whose rules refer to symbols by
//! name; a table description carries generator output for the LALR
//! interpreter. The parser library borrows everything, so each description
//! is loaded into owned storage first and borrowed from there.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use yy_parser::{
    ElementFlags, LalrGrammar, LexerOptions, PatternSet, Symbol, TableValue, DEFAULT_TOKEN_BASE,
    ERROR_SYMBOL,
};

/// Element ids start here unless the grammar says otherwise.
pub const DEFAULT_ELEMENT_BASE: Symbol = 1000;

/// Errors raised while loading description files.
#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("element `{element}` refers to unknown symbol `{symbol}`")]
    UnknownSymbol { element: String, symbol: String },

    #[error("symbol name `{0}` is defined twice")]
    DuplicateName(String),

    #[error("start element `{0}` is not defined")]
    UnknownStart(String),

    #[error("element `{0}` has an empty rule")]
    EmptyRule(String),

    #[error("element ids starting at {base} overlap token ids")]
    ElementBase { base: Symbol },

    #[error("table `{0}` is malformed")]
    Table(&'static str),
}

/// Read and deserialize a JSON file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, DescriptionError> {
    let text = std::fs::read_to_string(path).map_err(|source| DescriptionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DescriptionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Lexer
// ============================================================================

/// One real token pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPattern {
    /// Display name; also how grammars refer to the token.
    pub name: String,
    pub pattern: String,
}

/// Lexer description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerDescription {
    /// Symbol id of the first pattern.
    pub token_base: Option<Symbol>,
    /// Characters returned as their own symbol.
    pub literals: String,
    pub tokens: Vec<TokenPattern>,
    /// Patterns matched and discarded.
    pub ignore: Vec<String>,
    pub skip_unknown: bool,
}

/// Borrowed pattern arrays for one lexer description.
#[derive(Debug)]
pub struct PatternTable<'d> {
    literals: &'d [u8],
    expressions: Vec<&'d str>,
    names: Vec<&'d str>,
    ignore: Vec<&'d str>,
}

impl PatternTable<'_> {
    /// The pattern set the lexer runs with.
    pub fn pattern_set(&self) -> PatternSet<'_> {
        PatternSet::new(&self.expressions)
            .with_names(&self.names)
            .with_ignore(&self.ignore)
            .with_literals(self.literals)
    }
}

impl LexerDescription {
    pub fn options(&self) -> LexerOptions {
        LexerOptions::default()
            .with_token_base(self.token_base.unwrap_or(DEFAULT_TOKEN_BASE))
            .with_skip_unknown(self.skip_unknown)
    }

    pub fn table(&self) -> PatternTable<'_> {
        PatternTable {
            literals: self.literals.as_bytes(),
            expressions: self.tokens.iter().map(|t| t.pattern.as_str()).collect(),
            names: self.tokens.iter().map(|t| t.name.as_str()).collect(),
            ignore: self.ignore.iter().map(String::as_str).collect(),
        }
    }

    /// Symbol ids by name: pattern names plus `'c'` for each literal.
    pub fn symbols(&self) -> Result<FxHashMap<String, Symbol>, DescriptionError> {
        let base = self.options().token_base;
        let mut symbols = FxHashMap::default();
        for byte in self.literals.bytes() {
            let name = literal_name(byte);
            if symbols.insert(name.clone(), Symbol::from(byte)).is_some() {
                return Err(DescriptionError::DuplicateName(name));
            }
        }

        for (offset, token) in (0..).zip(&self.tokens) {
            if symbols
                .insert(token.name.clone(), base.saturating_add(offset))
                .is_some()
            {
                return Err(DescriptionError::DuplicateName(token.name.clone()));
            }
        }

        Ok(symbols)
    }

    /// One past the highest symbol id this lexer can produce.
    pub fn symbol_end(&self) -> Symbol {
        let patterns = Symbol::try_from(self.tokens.len()).unwrap_or(Symbol::MAX);
        self.options().token_base.saturating_add(patterns)
    }
}

/// Name of a literal character token, in the generator's quoting.
pub fn literal_name(byte: u8) -> String {
    format!("'{}'", char::from(byte))
}

// ============================================================================
// Recursive-descent grammar
// ============================================================================

/// One grammar element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDescription {
    pub name: String,
    /// Replace a node holding exactly one child and no tokens by the child.
    #[serde(default)]
    pub collapse: bool,
    /// Nest left-recursive matches instead of flattening them.
    #[serde(default)]
    pub nest: bool,
    /// Alternatives, each a list of symbol names.
    pub rules: Vec<Vec<String>>,
}

/// Grammar description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarDescription {
    /// Element to parse; the first element when absent.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub element_base: Option<Symbol>,
    pub elements: Vec<ElementDescription>,
}

/// A grammar with every rule resolved to symbol ids.
#[derive(Debug)]
pub struct ResolvedGrammar {
    pub base: Symbol,
    pub start: Symbol,
    pub names: Vec<String>,
    pub flags: Vec<ElementFlags>,
    pub rules: Vec<Vec<Vec<Symbol>>>,
}

impl GrammarDescription {
    /// Resolve rule symbol names against the element names and the lexer's
    /// token names.
    pub fn resolve(&self, lexer: &LexerDescription) -> Result<ResolvedGrammar, DescriptionError> {
        let base = self.element_base.unwrap_or(DEFAULT_ELEMENT_BASE);
        if base < lexer.symbol_end() {
            return Err(DescriptionError::ElementBase { base });
        }

        let mut symbols = lexer.symbols()?;
        for (offset, element) in (0..).zip(&self.elements) {
            if symbols
                .insert(element.name.clone(), base.saturating_add(offset))
                .is_some()
            {
                return Err(DescriptionError::DuplicateName(element.name.clone()));
            }
        }

        let start = match &self.start {
            Some(name) => *symbols
                .get(name)
                .filter(|&&id| id >= base)
                .ok_or_else(|| DescriptionError::UnknownStart(name.clone()))?,
            None => base,
        };

        let mut rules = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            let mut alternatives = Vec::with_capacity(element.rules.len());
            for rule in &element.rules {
                if rule.is_empty() {
                    return Err(DescriptionError::EmptyRule(element.name.clone()));
                }

                let resolved = rule
                    .iter()
                    .map(|name| {
                        symbols
                            .get(name)
                            .copied()
                            .ok_or_else(|| DescriptionError::UnknownSymbol {
                                element: element.name.clone(),
                                symbol: name.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                alternatives.push(resolved);
            }
            rules.push(alternatives);
        }

        Ok(ResolvedGrammar {
            base,
            start,
            names: self.elements.iter().map(|e| e.name.clone()).collect(),
            flags: self.elements.iter().map(ElementDescription::flags).collect(),
            rules,
        })
    }
}

impl ElementDescription {
    fn flags(&self) -> ElementFlags {
        let mut flags = ElementFlags::NONE;
        if self.collapse {
            flags = flags | ElementFlags::COLLAPSE_ONE;
        }
        if self.nest {
            flags = flags | ElementFlags::NEST_LEFT_RECURSION;
        }
        flags
    }
}

impl ResolvedGrammar {
    /// Rules as nested slices, the shape grammar elements borrow.
    pub fn rule_slices(&self) -> Vec<Vec<&[Symbol]>> {
        self.rules
            .iter()
            .map(|alternatives| alternatives.iter().map(Vec::as_slice).collect())
            .collect()
    }
}

// ============================================================================
// LALR tables
// ============================================================================

/// Generator output for one grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescription {
    pub left_side: Vec<TableValue>,
    pub rule_length: Vec<TableValue>,
    pub default_reductions: Vec<TableValue>,
    pub shift_index: Vec<TableValue>,
    pub reduce_index: Vec<TableValue>,
    pub goto_index: Vec<TableValue>,
    pub table: Vec<TableValue>,
    pub check: Vec<TableValue>,
    pub default_goto: Vec<TableValue>,
    pub table_size: TableValue,
    pub names: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    pub final_state: TableValue,
    #[serde(default)]
    pub start: TableValue,
    pub max_token: TableValue,
    pub undefined_token: TableValue,
    #[serde(default = "default_error_symbol")]
    pub error_symbol: TableValue,
}

fn default_error_symbol() -> TableValue {
    ERROR_SYMBOL
}

/// Borrowed name arrays for one table description.
#[derive(Debug)]
pub struct TableNames<'d> {
    names: Vec<&'d str>,
    rules: Vec<&'d str>,
}

impl TableDescription {
    pub fn names(&self) -> TableNames<'_> {
        TableNames {
            names: self.names.iter().map(String::as_str).collect(),
            rules: self.rules.iter().map(String::as_str).collect(),
        }
    }

    /// Basic shape checks; the interpreter still bounds-checks every read.
    pub fn validate(&self) -> Result<(), DescriptionError> {
        if self.left_side.len() != self.rule_length.len() {
            return Err(DescriptionError::Table("rule_length"));
        }
        if self.table.len() != self.check.len() {
            return Err(DescriptionError::Table("check"));
        }
        if self.goto_index.len() != self.default_goto.len() {
            return Err(DescriptionError::Table("default_goto"));
        }
        let states = self.default_reductions.len();
        if self.shift_index.len() != states || self.reduce_index.len() != states {
            return Err(DescriptionError::Table("shift_index"));
        }
        if self.max_token < ERROR_SYMBOL {
            return Err(DescriptionError::Table("max_token"));
        }
        Ok(())
    }

    /// Table token id for each name in the token range.
    pub fn token_ids(&self) -> FxHashMap<&str, Symbol> {
        let tokens = usize::try_from(self.max_token).map_or(0, |max| max + 1);
        (0..)
            .zip(self.names.iter().take(tokens))
            .filter(|(_, name)| !name.is_empty())
            .map(|(id, name)| (name.as_str(), id))
            .collect()
    }

    /// Id reported for lexer tokens the tables do not know.
    pub fn undefined_symbol(&self) -> Symbol {
        Symbol::try_from(self.undefined_token).unwrap_or(Symbol::MAX)
    }
}

impl<'d> TableNames<'d> {
    pub fn grammar<'t>(&'t self, tables: &'t TableDescription) -> LalrGrammar<'t> {
        LalrGrammar {
            left_side: &tables.left_side,
            rule_length: &tables.rule_length,
            default_reductions: &tables.default_reductions,
            shift_index: &tables.shift_index,
            reduce_index: &tables.reduce_index,
            goto_index: &tables.goto_index,
            table: &tables.table,
            check: &tables.check,
            default_goto: &tables.default_goto,
            table_size: tables.table_size,
            names: &self.names,
            rules: &self.rules,
            final_state: tables.final_state,
            start: tables.start,
            max_token: tables.max_token,
            undefined_token: tables.undefined_token,
            error_symbol: tables.error_symbol,
        }
    }
}
