//! Backtracking recursive-descent driver.
//!
//! The driver reduces grammar elements by trying their alternatives in
//! order. Tokens are fetched from the host on demand and memoized, so
//! backtracking only moves the next-token index. Left-recursive
//! alternatives are handled iteratively: after a non-recursive alternative
//! matches, the driver keeps matching the tails of the left-recursive ones
//! for as long as one succeeds.
//!
//! Nodes come from a [`NodeArena`]. A node abandoned during backtracking is
//! returned to the arena's free list and reused by the next allocation.

use tracing::{debug, trace};

use crate::arena::{Node, NodeArena, NodeId};
use crate::error::Error;
use crate::grammar::{ElementFlags, Grammar, GrammarElement};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Symbol, Token, TokenSource};
use crate::token_buffer::TokenBuffer;
use crate::trace::{TraceFlags, RD_TARGET};

/// Parser configuration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum element nesting depth. Zero means unbounded.
    pub max_depth: u32,
    /// Which trace events to emit.
    pub trace: TraceFlags,
}

impl ParserOptions {
    /// Set the maximum recursion depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the trace flags.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceFlags) -> Self {
        self.trace = trace;
        self
    }
}

/// Host side of the recursive-descent driver.
pub trait ParserHost: TokenSource {
    /// Called once when an element attempt finishes with `matched = true`,
    /// and with `matched = false` both for failed attempts and when a
    /// previously matched node is destroyed.
    fn node_complete(&mut self, _node: NodeRef<'_>, _matched: bool) {}
}

impl<T: ParserHost + ?Sized> ParserHost for &mut T {
    #[inline]
    fn node_complete(&mut self, node: NodeRef<'_>, matched: bool) {
        (**self).node_complete(node, matched);
    }
}

impl ParserHost for Lexer<'_> {}

/// Read-only view of a live node.
#[derive(Clone, Copy)]
pub struct NodeRef<'p> {
    arena: &'p NodeArena,
    tokens: &'p TokenBuffer,
    id: NodeId,
    node: &'p Node,
}

impl<'p> NodeRef<'p> {
    fn new(arena: &'p NodeArena, tokens: &'p TokenBuffer, id: NodeId) -> Option<Self> {
        let node = arena.get(id)?;
        Some(Self {
            arena,
            tokens,
            id,
            node,
        })
    }

    /// The node's handle.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Grammar element this node was built for.
    #[inline]
    pub fn element(&self) -> Symbol {
        self.node.element.unwrap_or_default()
    }

    /// Index of the matched alternative.
    #[inline]
    pub fn rule(&self) -> Option<usize> {
        self.node.rule
    }

    /// Index of the token the match began at.
    #[inline]
    pub fn start_token(&self) -> usize {
        self.node.start_token
    }

    /// Number of tokens matched directly by this node.
    #[inline]
    pub fn token_count(&self) -> usize {
        self.node.tokens.len()
    }

    /// Number of child nodes.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    /// Buffer indices of the direct tokens.
    #[inline]
    pub fn token_indices(&self) -> &'p [usize] {
        &self.node.tokens
    }

    /// Direct token `index`.
    pub fn token(&self, index: usize) -> Option<&'p Token> {
        self.tokens.get(*self.node.tokens.get(index)?)
    }

    /// Direct tokens, in match order.
    pub fn tokens(&self) -> impl Iterator<Item = &'p Token> + 'p {
        let tokens = self.tokens;
        self.node.tokens.iter().filter_map(move |&index| tokens.get(index))
    }

    /// Child node `index`.
    pub fn child(&self, index: usize) -> Option<NodeRef<'p>> {
        NodeRef::new(self.arena, self.tokens, *self.node.children.get(index)?)
    }

    /// Child nodes, in match order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'p>> + 'p {
        let (arena, tokens) = (self.arena, self.tokens);
        self.node
            .children
            .iter()
            .filter_map(move |&id| NodeRef::new(arena, tokens, id))
    }

    /// Buffer indices of every token in the subtree, in input order.
    pub fn leaf_tokens(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out.sort_unstable();
        out
    }

    fn collect_tokens(&self, out: &mut Vec<usize>) {
        out.extend_from_slice(&self.node.tokens);
        for child in self.children() {
            child.collect_tokens(out);
        }
    }

    /// Byte range covered by the subtree, if it holds any token.
    pub fn span(&self) -> Option<Span> {
        let own = self.tokens().map(|token| token.span);
        let nested = self.children().filter_map(|child| child.span());
        own.chain(nested).reduce(Span::merge)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("element", &self.element())
            .field("rule", &self.rule())
            .field("tokens", &self.node.tokens)
            .field("children", &self.node.children)
            .finish()
    }
}

/// The recursive-descent parser.
pub struct Parser<'g, H> {
    grammar: Grammar<'g>,
    host: H,
    options: ParserOptions,
    arena: NodeArena,
    tokens: TokenBuffer,
    /// Index of the next token to consume.
    next_token: usize,
    /// Whether the host reported end of input.
    end_of_input: bool,
    /// Current element nesting depth.
    depth: u32,
}

impl<'g, H: ParserHost> Parser<'g, H> {
    /// Create a new parser.
    pub fn new(grammar: Grammar<'g>, host: H, options: ParserOptions) -> Self {
        Self {
            grammar,
            host,
            options,
            arena: NodeArena::new(),
            tokens: TokenBuffer::new(),
            next_token: 0,
            end_of_input: false,
            depth: 0,
        }
    }

    /// Parse the grammar's start element over the whole input.
    pub fn parse(&mut self) -> Result<NodeId, Error> {
        self.parse_symbol(self.grammar.start)
    }

    /// Parse `start` over the whole input.
    ///
    /// Fails with [`Error::InvalidSequence`] unless the element matched and
    /// every token up to end of input was consumed. On success the caller
    /// owns the returned tree and releases it with [`Parser::destroy_node`].
    pub fn parse_symbol(&mut self, start: Symbol) -> Result<NodeId, Error> {
        if !self.grammar.is_element(start) {
            return Err(Error::UnknownElement(start));
        }

        let Some(root) = self.parse_element(start)? else {
            let (line, column) = self.furthest_location();
            debug!(line, column, "start element did not match");
            return Err(Error::InvalidSequence { line, column });
        };

        match self.peek() {
            Ok(None) => {}
            Ok(Some(extra)) => {
                debug!(line = extra.line, column = extra.column, "input left over");
                self.destroy_node(root)?;
                return Err(Error::InvalidSequence {
                    line: extra.line,
                    column: extra.column,
                });
            }
            Err(err) => {
                if let Err(cleanup) = self.destroy_node(root) {
                    debug!(error = %cleanup, "cleanup after failed parse");
                }

                return Err(err);
            }
        }

        debug!(root = %root, tokens = self.tokens.len(), "parse complete");
        Ok(root)
    }

    /// Rewind to the first token. Fetched tokens are kept and re-read.
    pub fn reset(&mut self) {
        self.next_token = 0;
        self.depth = 0;
    }

    /// Destroy a tree.
    ///
    /// Nodes the host saw match are reported again with `matched = false`,
    /// parents before their children. Every node goes back on the free
    /// list. Destroying a node twice is [`Error::StaleNode`].
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), Error> {
        let node = self.arena.get(id).ok_or(Error::StaleNode(id.index()))?;
        if node.announced {
            if let Some(view) = NodeRef::new(&self.arena, &self.tokens, id) {
                self.host.node_complete(view, false);
            }
        }

        // Take the list so the recursion can borrow the arena, then hand the
        // (emptied) allocation back to the node.
        let mut children = std::mem::take(&mut self.arena.get_mut(id)?.children);
        for &child in &children {
            self.destroy_node(child)?;
        }

        children.clear();
        self.arena.get_mut(id)?.children = children;
        self.arena.retire(id)
    }

    /// Release every node. Outstanding handles become stale.
    pub fn destroy_all(&mut self) {
        self.arena.destroy_all();
    }

    /// View a live node.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        NodeRef::new(&self.arena, &self.tokens, id)
    }

    /// A fetched token.
    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Number of tokens fetched so far.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Index of the next token to consume.
    pub fn next_token_index(&self) -> usize {
        self.next_token
    }

    /// Line and column of the token the parser stopped at, or of the last
    /// fetched token when it stopped at end of input.
    pub fn next_token_position(&self) -> Option<(u32, u32)> {
        self.tokens
            .get(self.next_token)
            .map(|token| (token.line, token.column))
            .or_else(|| self.tokens.len().checked_sub(1).map(|_| self.furthest_location()))
    }

    /// The node arena.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The grammar.
    pub fn grammar(&self) -> &Grammar<'g> {
        &self.grammar
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the parser, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    // =========================================================================
    // Element reduction
    // =========================================================================

    fn parse_element(&mut self, symbol: Symbol) -> Result<Option<NodeId>, Error> {
        self.depth += 1;
        let result = self.parse_node(symbol);
        self.depth -= 1;
        result
    }

    fn parse_node(&mut self, symbol: Symbol) -> Result<Option<NodeId>, Error> {
        let element = *self
            .grammar
            .element(symbol)
            .ok_or(Error::UnknownElement(symbol))?;
        if self.options.max_depth != 0 && self.depth > self.options.max_depth {
            return Err(Error::BufferOverrun {
                depth: self.options.max_depth,
            });
        }

        let start = self.next_token;
        let mut node = self.arena.allocate(symbol, start)?;
        self.trace_element(element.name, node, None);
        let outcome = self.reduce(symbol, &element, start, &mut node);
        self.trace_element(element.name, node, Some(&outcome));
        match outcome {
            Ok(true) => {
                self.arena.get_mut(node)?.announced = true;
                if let Some(view) = NodeRef::new(&self.arena, &self.tokens, node) {
                    self.host.node_complete(view, true);
                }

                Ok(Some(node))
            }

            Ok(false) => {
                self.next_token = start;
                self.abandon(node)?;
                Ok(None)
            }

            Err(err) => {
                self.next_token = start;
                if let Err(cleanup) = self.abandon(node) {
                    debug!(error = %cleanup, "cleanup after failed parse");
                }

                Err(err)
            }
        }
    }

    /// Report a failed attempt and recycle its node.
    fn abandon(&mut self, node: NodeId) -> Result<(), Error> {
        if let Some(view) = NodeRef::new(&self.arena, &self.tokens, node) {
            if !view.node.announced {
                self.host.node_complete(view, false);
            }
        }

        self.destroy_node(node)
    }

    /// Match `element` into `node`. On return `node` holds the root of
    /// whatever was built, which may differ from the node passed in when
    /// nesting or collapsing replaced it.
    fn reduce(
        &mut self,
        symbol: Symbol,
        element: &GrammarElement<'g>,
        start: usize,
        node: &mut NodeId,
    ) -> Result<bool, Error> {
        let mut left_recursive = false;
        let mut matched = false;
        for (index, rule) in element.rules.iter().enumerate() {
            if rule.first() == Some(&symbol) {
                left_recursive = true;
                continue;
            }

            if !matched && self.match_rule(*node, rule)? {
                self.arena.get_mut(*node)?.rule = Some(index);
                matched = true;
            }

            if matched && left_recursive {
                break;
            }
        }

        if !matched {
            return Ok(false);
        }

        if left_recursive {
            self.extend(symbol, element, start, node)?;
        }

        if element.flags.contains(ElementFlags::COLLAPSE_ONE) {
            *node = self.collapse(*node)?;
        }

        Ok(true)
    }

    /// Apply left-recursive alternatives until none matches.
    fn extend(
        &mut self,
        symbol: Symbol,
        element: &GrammarElement<'g>,
        start: usize,
        node: &mut NodeId,
    ) -> Result<(), Error> {
        let nest = element.flags.contains(ElementFlags::NEST_LEFT_RECURSION);
        loop {
            let target = if nest {
                let outer = self.arena.allocate(symbol, start)?;
                if let Err(err) = self.arena.push_child(outer, *node) {
                    self.arena.retire(outer)?;
                    return Err(err);
                }

                *node = outer;
                outer
            } else {
                *node
            };

            let mut extended = false;
            for (index, rule) in element.rules.iter().enumerate() {
                let [head, tail @ ..] = rule else {
                    continue;
                };

                if *head == symbol && self.match_tail(target, tail)? {
                    if nest {
                        self.arena.get_mut(target)?.rule = Some(index);
                    }

                    extended = true;
                    break;
                }
            }

            if !extended {
                if nest {
                    let inner = self
                        .arena
                        .get(target)
                        .and_then(|outer| outer.children.first().copied())
                        .ok_or(Error::StaleNode(target.index()))?;
                    self.arena.retire(target)?;
                    *node = inner;
                }

                return Ok(());
            }

            if nest && element.flags.contains(ElementFlags::COLLAPSE_ONE) {
                let first = self
                    .arena
                    .get(target)
                    .and_then(|outer| outer.children.first().copied());
                if let Some(inner) = first {
                    let collapsed = self.collapse(inner)?;
                    self.arena.get_mut(target)?.children[0] = collapsed;
                }
            }
        }
    }

    /// Replace a node holding one child node and no tokens with the child.
    fn collapse(&mut self, id: NodeId) -> Result<NodeId, Error> {
        let node = self.arena.get(id).ok_or(Error::StaleNode(id.index()))?;
        match (node.tokens.len(), node.children.as_slice()) {
            (0, [child]) => {
                let child = *child;
                self.arena.retire(id)?;
                Ok(child)
            }
            _ => Ok(id),
        }
    }

    // =========================================================================
    // Rule matching
    // =========================================================================

    /// Match one alternative's symbols into `node`, leaving no trace on
    /// failure.
    fn match_rule(&mut self, node: NodeId, symbols: &[Symbol]) -> Result<bool, Error> {
        self.attempt(node, |parser| {
            for &symbol in symbols {
                if !parser.match_symbol(node, symbol)? {
                    return Ok(false);
                }
            }

            Ok(true)
        })
    }

    /// Match a left-recursive alternative's tail into `node`. A tail that
    /// consumes no tokens does not count as an extension.
    fn match_tail(&mut self, node: NodeId, symbols: &[Symbol]) -> Result<bool, Error> {
        let cursor = self.next_token;
        self.attempt(node, |parser| {
            for &symbol in symbols {
                if !parser.match_symbol(node, symbol)? {
                    return Ok(false);
                }
            }

            Ok(parser.next_token > cursor)
        })
    }

    /// Run `body`; if it reports no match, restore the token cursor and the
    /// node's token and child counts, destroying any children it added.
    fn attempt<F>(&mut self, node: NodeId, body: F) -> Result<bool, Error>
    where
        F: FnOnce(&mut Self) -> Result<bool, Error>,
    {
        let cursor = self.next_token;
        let (tokens, children) = self
            .arena
            .get(node)
            .map(|n| (n.tokens.len(), n.children.len()))
            .ok_or(Error::StaleNode(node.index()))?;
        if body(self)? {
            return Ok(true);
        }

        self.next_token = cursor;
        self.arena.get_mut(node)?.tokens.truncate(tokens);
        loop {
            let current = self.arena.get_mut(node)?;
            if current.children.len() <= children {
                break;
            }

            let Some(child) = current.children.pop() else {
                break;
            };
            self.destroy_node(child)?;
        }

        Ok(false)
    }

    fn match_symbol(&mut self, node: NodeId, symbol: Symbol) -> Result<bool, Error> {
        if self.grammar.is_element(symbol) {
            let Some(child) = self.parse_element(symbol)? else {
                return Ok(false);
            };

            if let Err(err) = self.arena.push_child(node, child) {
                self.destroy_node(child)?;
                return Err(err);
            }

            return Ok(true);
        }

        let index = self.next_token;
        let Some(token) = self.peek()? else {
            return Ok(false);
        };

        if token.symbol != symbol {
            if self.options.trace.contains(TraceFlags::NON_MATCHES) {
                trace!(
                    target: RD_TARGET,
                    "No Match: Wanted {} got {}",
                    self.describe(symbol),
                    self.describe(token.symbol)
                );
            }

            return Ok(false);
        }

        if self.options.trace.contains(TraceFlags::MATCHES) {
            trace!(
                target: RD_TARGET,
                "Match: {} ({}:{})",
                self.describe(symbol),
                token.line,
                token.column
            );
        }

        self.arena.push_token(node, index)?;
        self.next_token += 1;
        Ok(true)
    }

    // =========================================================================
    // Token handling
    // =========================================================================

    /// The next token, fetching it from the host if needed.
    fn peek(&mut self) -> Result<Option<Token>, Error> {
        if let Some(token) = self.tokens.get(self.next_token) {
            return Ok(Some(*token));
        }

        if self.end_of_input {
            return Ok(None);
        }

        match self.host.next_token()? {
            Some(token) => {
                self.tokens.push(token)?;
                Ok(Some(token))
            }
            None => {
                self.end_of_input = true;
                Ok(None)
            }
        }
    }

    /// Location of the furthest token fetched, where a failed parse stalled.
    fn furthest_location(&self) -> (u32, u32) {
        self.tokens
            .len()
            .checked_sub(1)
            .and_then(|last| self.tokens.get(last))
            .map_or((0, 0), |token| (token.line, token.column))
    }

    // =========================================================================
    // Tracing
    // =========================================================================

    fn describe(&self, symbol: Symbol) -> String {
        if let Some(name) = self.grammar.name(symbol) {
            return name.to_string();
        }

        if let Some(name) = self.host.symbol_name(symbol) {
            return name.to_string();
        }

        match u8::try_from(symbol) {
            Ok(byte) if byte.is_ascii_graphic() => format!("'{}'", char::from(byte)),
            _ => format!("#{symbol}"),
        }
    }

    fn trace_element(&self, name: &str, node: NodeId, outcome: Option<&Result<bool, Error>>) {
        if !self.options.trace.contains(TraceFlags::ELEMENTS) {
            return;
        }

        let indent = self.depth as usize;
        match outcome {
            None => trace!(target: RD_TARGET, "{:indent$} {} {}", "", name, node),
            Some(result) => {
                let status = match result {
                    Ok(true) => "matched".to_string(),
                    Ok(false) => "no match".to_string(),
                    Err(err) => err.to_string(),
                };
                trace!(target: RD_TARGET, "{:indent$} {} {} Done: {}", "", name, node, status);
            }
        }
    }
}
