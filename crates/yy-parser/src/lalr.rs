//! LALR(1) table interpreter.
//!
//! Drives a shift/reduce/goto automaton over tables produced by an external
//! grammar compiler. The interpreter builds nothing itself: every reduction
//! is handed to [`LalrHost::reduce`], which computes the semantic value for
//! the new nonterminal.
//!
//! Symbol numbering follows the generator: `0` is end of input, `1` is the
//! `error` token, real tokens run up to `max_token`. Left-hand sides are
//! numbered so the start symbol is `start` and the accept rule (rule 0) has
//! `-1`; hosts see them shifted above the tokens, at `lhs + max_token + 1`.

use tracing::{debug, trace};

use crate::error::Error;
use crate::table::{CompressedTable, TableValue};
use crate::token::Symbol;
use crate::trace::{TraceFlags, LALR_TARGET};

/// Symbol id of end of input.
pub const END_OF_INPUT: TableValue = 0;

/// Default symbol id of the `error` token.
pub const ERROR_SYMBOL: TableValue = 1;

/// Consecutive shifts required before leaving error recovery.
const RECOVERY_SHIFTS: u8 = 3;

/// Tables for one grammar, borrowed from the generator output.
#[derive(Debug, Clone, Copy)]
pub struct LalrGrammar<'t> {
    /// Left-hand side per rule.
    pub left_side: &'t [TableValue],
    /// Number of right-hand side symbols per rule.
    pub rule_length: &'t [TableValue],
    /// Rule to reduce unconditionally in each state; zero for none.
    pub default_reductions: &'t [TableValue],
    /// Shift row base per state.
    pub shift_index: &'t [TableValue],
    /// Reduce row base per state.
    pub reduce_index: &'t [TableValue],
    /// Goto row base per nonterminal.
    pub goto_index: &'t [TableValue],
    /// Shared action table.
    pub table: &'t [TableValue],
    /// Key owning each `table` slot.
    pub check: &'t [TableValue],
    /// Goto used when the goto row has no entry, per nonterminal.
    pub default_goto: &'t [TableValue],
    /// Highest valid index into `table` and `check`.
    pub table_size: TableValue,
    /// Symbol names: tokens first, then nonterminals.
    pub names: &'t [&'t str],
    /// Human-readable rule descriptions.
    pub rules: &'t [&'t str],
    /// State entered after the start symbol is reduced in state 0.
    pub final_state: TableValue,
    /// Left-hand side number of the start symbol.
    pub start: TableValue,
    /// Highest token id.
    pub max_token: TableValue,
    /// Index into `names` used for ids without a name.
    pub undefined_token: TableValue,
    /// Symbol id of the `error` token.
    pub error_symbol: TableValue,
}

impl<'t> LalrGrammar<'t> {
    #[inline]
    fn actions(&self) -> CompressedTable<'t> {
        CompressedTable::new(self.table, self.check, self.table_size)
    }

    /// Display name of a symbol, falling back to the undefined-token name.
    pub fn symbol_name(&self, symbol: TableValue) -> &'t str {
        let lookup = |id: TableValue| {
            usize::try_from(id)
                .ok()
                .and_then(|index| self.names.get(index))
                .copied()
                .filter(|name| !name.is_empty())
        };

        lookup(symbol)
            .or_else(|| lookup(self.undefined_token))
            .unwrap_or("illegal-symbol")
    }

    /// Description of a rule, if the tables carry one.
    pub fn rule_text(&self, rule: usize) -> &'t str {
        self.rules.get(rule).copied().unwrap_or("")
    }

    /// Symbol id hosts see for a left-hand side.
    pub fn reduced_symbol(&self, lhs: TableValue) -> Option<Symbol> {
        Symbol::try_from(i64::from(lhs) + i64::from(self.max_token) + 1).ok()
    }
}

/// Read a per-state or per-rule entry.
fn entry(values: &[TableValue], index: usize, what: &'static str) -> Result<TableValue, Error> {
    values.get(index).copied().ok_or(Error::MalformedTable(what))
}

fn slot(value: TableValue, what: &'static str) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| Error::MalformedTable(what))
}

/// Host side of the LALR interpreter.
pub trait LalrHost<V> {
    /// Produce the next token and its semantic value. `Ok(None)` is end of
    /// input.
    fn next_token(&mut self) -> Result<Option<(Symbol, V)>, Error>;

    /// Reduce by `rule`, whose right-hand side values are `values`. `out`
    /// starts as a copy of the first value (or the default value for empty
    /// rules) and becomes the value of `symbol`.
    fn reduce(&mut self, symbol: Symbol, rule: usize, values: &[V], out: &mut V)
        -> Result<(), Error>;

    /// Called on the first syntax error before recovery, and once more at
    /// the end of a failed run that never saw a syntax error. Returning
    /// `Ok` continues (or, at the end, turns the failure into success).
    fn error(&mut self, err: Error) -> Result<(), Error> {
        Err(err)
    }
}

impl<V, T: LalrHost<V> + ?Sized> LalrHost<V> for &mut T {
    fn next_token(&mut self) -> Result<Option<(Symbol, V)>, Error> {
        (**self).next_token()
    }

    fn reduce(
        &mut self,
        symbol: Symbol,
        rule: usize,
        values: &[V],
        out: &mut V,
    ) -> Result<(), Error> {
        (**self).reduce(symbol, rule, values, out)
    }

    fn error(&mut self, err: Error) -> Result<(), Error> {
        (**self).error(err)
    }
}

/// Interpreter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LalrOptions {
    /// Stack capacity reserved at the start of a run.
    pub initial_stack: usize,
    /// Most frames the stacks may hold.
    pub max_stack: usize,
    /// Which trace events to emit.
    pub trace: TraceFlags,
}

impl Default for LalrOptions {
    fn default() -> Self {
        Self {
            initial_stack: 128,
            max_stack: 10_000,
            trace: TraceFlags::NONE,
        }
    }
}

impl LalrOptions {
    /// Set the initial stack capacity.
    #[must_use]
    pub fn with_initial_stack(mut self, capacity: usize) -> Self {
        self.initial_stack = capacity;
        self
    }

    /// Set the stack ceiling.
    #[must_use]
    pub fn with_max_stack(mut self, limit: usize) -> Self {
        self.max_stack = limit;
        self
    }

    /// Set the trace flags.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceFlags) -> Self {
        self.trace = trace;
        self
    }
}

/// What to do after a reduction.
enum Step {
    Continue,
    Accept,
}

/// The shift-reduce automaton.
pub struct LalrParser<'t, H, V> {
    grammar: LalrGrammar<'t>,
    host: H,
    options: LalrOptions,
    states: Vec<TableValue>,
    values: Vec<V>,
    lookahead: Option<(TableValue, V)>,
    /// Shifts still required before recovery ends.
    recovering: u8,
    error_count: usize,
}

impl<'t, H, V> LalrParser<'t, H, V>
where
    H: LalrHost<V>,
    V: Clone + Default,
{
    /// Create a new interpreter.
    pub fn new(grammar: LalrGrammar<'t>, host: H, options: LalrOptions) -> Self {
        Self {
            grammar,
            host,
            options,
            states: Vec::new(),
            values: Vec::new(),
            lookahead: None,
            recovering: 0,
            error_count: 0,
        }
    }

    /// Run the automaton until the input is accepted or parsing fails.
    pub fn run(&mut self) -> Result<(), Error> {
        let result = self.drive();
        match result {
            Err(err) if self.error_count == 0 => {
                debug!(error = %err, "parse failed");
                self.host.error(err)
            }
            other => other,
        }
    }

    /// Number of syntax errors reported during the last run.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Value of the start symbol after a successful run.
    pub fn value(&self) -> Option<&V> {
        self.values.last()
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the interpreter, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    fn drive(&mut self) -> Result<(), Error> {
        self.states.clear();
        self.values.clear();
        self.lookahead = None;
        self.recovering = 0;
        self.error_count = 0;
        self.push(0, V::default())?;

        let actions = self.grammar.actions();
        loop {
            let state = self.top()?;
            let index = slot(state, "state")?;
            let default = entry(self.grammar.default_reductions, index, "default reduction")?;
            let rule = if default != 0 {
                default
            } else {
                let symbol = self.lookahead_symbol()?;
                let shift_base = entry(self.grammar.shift_index, index, "shift index")?;
                if let Some(next) = actions.probe(shift_base, symbol) {
                    self.trace_step(|| format!("state {state}, shifting to state {next}"));
                    let value = self.lookahead.take().map(|(_, value)| value).unwrap_or_default();
                    self.push(next, value)?;
                    self.recovering = self.recovering.saturating_sub(1);
                    continue;
                }

                let reduce_base = entry(self.grammar.reduce_index, index, "reduce index")?;
                match actions.probe(reduce_base, symbol) {
                    Some(rule) => rule,
                    None => {
                        self.syntax_error(state, symbol)?;
                        continue;
                    }
                }
            };

            if let Step::Accept = self.reduce(rule)? {
                debug!(errors = self.error_count, "input accepted");
                return Ok(());
            }
        }
    }

    /// Handle a missing action: report, then recover by shifting `error` or
    /// by discarding the lookahead.
    fn syntax_error(&mut self, state: TableValue, symbol: TableValue) -> Result<(), Error> {
        if self.recovering == 0 {
            self.error_count += 1;
            self.trace_step(|| {
                format!(
                    "state {state}, syntax error on {}",
                    self.grammar.symbol_name(symbol)
                )
            });
            self.host.error(Error::ParseError)?;
        }

        if self.recovering < RECOVERY_SHIFTS {
            self.recovering = RECOVERY_SHIFTS;
            let actions = self.grammar.actions();
            loop {
                let top = self.top()?;
                let base = entry(self.grammar.shift_index, slot(top, "state")?, "shift index")?;
                if let Some(next) = actions.probe(base, self.grammar.error_symbol) {
                    self.trace_step(|| {
                        format!("state {top}, error recovery shifting to state {next}")
                    });
                    let value = self
                        .lookahead
                        .as_ref()
                        .map(|(_, value)| value.clone())
                        .unwrap_or_default();
                    return self.push(next, value);
                }

                if self.states.len() <= 1 {
                    self.trace_step(|| "error recovery failed, stack exhausted".to_string());
                    return Err(Error::ParseError);
                }

                self.trace_step(|| format!("error recovery discarding state {top}"));
                self.states.pop();
                self.values.pop();
            }
        }

        if symbol == END_OF_INPUT {
            self.trace_step(|| "error recovery reached end of input".to_string());
            return Err(Error::ParseError);
        }

        self.trace_step(|| {
            format!(
                "state {state}, error recovery discards token {symbol} ({})",
                self.grammar.symbol_name(symbol)
            )
        });
        self.lookahead = None;
        Ok(())
    }

    /// Reduce by `rule` and take the goto (or move to the final state).
    fn reduce(&mut self, rule: TableValue) -> Result<Step, Error> {
        let index = slot(rule, "rule")?;
        let length = slot(entry(self.grammar.rule_length, index, "rule length")?, "rule length")?;
        let lhs = entry(self.grammar.left_side, index, "left side")?;
        if length >= self.states.len() {
            return Err(Error::MalformedTable("rule longer than stack"));
        }

        let base = self.values.len() - length;
        let mut value = if length == 0 {
            V::default()
        } else {
            self.values[base].clone()
        };

        let symbol = self
            .grammar
            .reduced_symbol(lhs)
            .ok_or(Error::MalformedTable("left side"))?;
        self.trace_step(|| {
            format!(
                "state {}, reducing by rule {index} ({})",
                self.states.last().copied().unwrap_or_default(),
                self.grammar.rule_text(index)
            )
        });
        self.host.reduce(symbol, index, &self.values[base..], &mut value)?;

        self.states.truncate(base);
        self.values.truncate(base);
        let top = self.top()?;
        if top == 0 && lhs == self.grammar.start {
            let final_state = self.grammar.final_state;
            self.trace_step(|| format!("after reduction, shifting from state 0 to state {final_state}"));
            self.push(final_state, value)?;
            if self.lookahead_symbol()? == END_OF_INPUT {
                return Ok(Step::Accept);
            }

            return Ok(Step::Continue);
        }

        let nonterminal = slot(lhs, "left side")?;
        let goto_base = entry(self.grammar.goto_index, nonterminal, "goto index")?;
        let next = match self.grammar.actions().probe(goto_base, top) {
            Some(next) => next,
            None => entry(self.grammar.default_goto, nonterminal, "default goto")?,
        };

        self.trace_step(|| format!("after reduction, shifting from state {top} to state {next}"));
        self.push(next, value)?;
        Ok(Step::Continue)
    }

    // =========================================================================
    // Stack and lookahead
    // =========================================================================

    fn top(&self) -> Result<TableValue, Error> {
        self.states.last().copied().ok_or(Error::ParseError)
    }

    /// Push a frame, doubling the stacks up to the ceiling.
    fn push(&mut self, state: TableValue, value: V) -> Result<(), Error> {
        let len = self.states.len();
        if len >= self.options.max_stack {
            debug!(limit = self.options.max_stack, "parse stack full");
            return Err(Error::TooManyItems {
                limit: self.options.max_stack,
            });
        }

        if len == self.states.capacity() || len == self.values.capacity() {
            let target = (len * 2)
                .max(self.options.initial_stack)
                .max(len + 1)
                .min(self.options.max_stack);
            self.states.try_reserve_exact(target - len)?;
            self.values.try_reserve_exact(target - len)?;
        }

        self.states.push(state);
        self.values.push(value);
        Ok(())
    }

    /// Symbol of the held lookahead, fetching one if none is held.
    fn lookahead_symbol(&mut self) -> Result<TableValue, Error> {
        if let Some((symbol, _)) = &self.lookahead {
            return Ok(*symbol);
        }

        let (symbol, value) = match self.host.next_token()? {
            Some((symbol, value)) => (TableValue::try_from(symbol).unwrap_or(TableValue::MAX), value),
            None => (END_OF_INPUT, V::default()),
        };

        self.trace_step(|| {
            format!(
                "state {}, reading {symbol} ({})",
                self.states.last().copied().unwrap_or_default(),
                self.grammar.symbol_name(symbol)
            )
        });
        self.lookahead = Some((symbol, value));
        Ok(symbol)
    }

    #[inline]
    fn trace_step(&self, message: impl FnOnce() -> String) {
        if self.options.trace.contains(TraceFlags::LALR) {
            trace!(target: LALR_TARGET, "{}", message());
        }
    }
}
