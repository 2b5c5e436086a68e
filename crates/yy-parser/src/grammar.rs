//! Grammar description for the recursive-descent driver.
//!
//! A grammar is a table of elements numbered from `base`. Each element owns
//! an ordered list of alternatives, and every alternative is a sequence of
//! symbols: ids in `[base, base + elements.len())` name other elements, any
//! other id names a token.

use crate::token::Symbol;

/// Per-element behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ElementFlags(u8);

impl ElementFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Replace a node holding exactly one child node and no tokens with
    /// that child.
    pub const COLLAPSE_ONE: Self = Self(1 << 0);
    /// Wrap each left-recursive repetition in a new outer node instead of
    /// appending to the same node.
    pub const NEST_LEFT_RECURSION: Self = Self(1 << 1);

    /// Whether every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for ElementFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A nonterminal: a name, flags and ordered alternatives.
#[derive(Debug, Clone, Copy)]
pub struct GrammarElement<'g> {
    pub name: &'g str,
    pub flags: ElementFlags,
    pub rules: &'g [&'g [Symbol]],
}

impl<'g> GrammarElement<'g> {
    /// Create an element without flags.
    #[must_use]
    pub const fn new(name: &'g str, rules: &'g [&'g [Symbol]]) -> Self {
        Self {
            name,
            flags: ElementFlags::NONE,
            rules,
        }
    }

    /// Set the flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A complete grammar.
#[derive(Debug, Clone, Copy)]
pub struct Grammar<'g> {
    /// Symbol id of the first element.
    pub base: Symbol,
    /// The elements, numbered from `base`.
    pub elements: &'g [GrammarElement<'g>],
    /// Element the top-level parse reduces.
    pub start: Symbol,
}

impl<'g> Grammar<'g> {
    /// Create a grammar whose start element is the first one.
    #[must_use]
    pub const fn new(base: Symbol, elements: &'g [GrammarElement<'g>]) -> Self {
        Self {
            base,
            elements,
            start: base,
        }
    }

    /// Set the start element.
    #[must_use]
    pub const fn with_start(mut self, start: Symbol) -> Self {
        self.start = start;
        self
    }

    /// One past the last element id.
    #[inline]
    pub fn end(&self) -> Symbol {
        let count = Symbol::try_from(self.elements.len()).unwrap_or(Symbol::MAX);
        self.base.saturating_add(count)
    }

    /// Whether `symbol` names an element.
    #[inline]
    pub fn is_element(&self, symbol: Symbol) -> bool {
        symbol >= self.base && symbol < self.end()
    }

    /// Look up an element by symbol id.
    #[inline]
    pub fn element(&self, symbol: Symbol) -> Option<&GrammarElement<'g>> {
        let index = symbol.checked_sub(self.base)?;
        self.elements.get(usize::try_from(index).ok()?)
    }

    /// Name of an element symbol.
    pub fn name(&self, symbol: Symbol) -> Option<&'g str> {
        self.element(symbol).map(|element| element.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPR: &[&[Symbol]] = &[&[1000, b'+' as Symbol, 1001], &[1001]];
    const TERM: &[&[Symbol]] = &[&[300]];
    const ELEMENTS: &[GrammarElement<'static>] = &[
        GrammarElement::new("Expr", EXPR),
        GrammarElement::new("Term", TERM).with_flags(ElementFlags::COLLAPSE_ONE),
    ];

    #[test]
    fn test_element_range() {
        let grammar = Grammar::new(1000, ELEMENTS);
        assert_eq!(grammar.end(), 1002);
        assert!(grammar.is_element(1000));
        assert!(grammar.is_element(1001));
        assert!(!grammar.is_element(1002));
        assert!(!grammar.is_element(300));
        assert_eq!(grammar.name(1001), Some("Term"));
        assert!(grammar.element(999).is_none());
        assert_eq!(grammar.with_start(1001).start, 1001);
    }

    #[test]
    fn test_flags() {
        let both = ElementFlags::COLLAPSE_ONE | ElementFlags::NEST_LEFT_RECURSION;
        assert!(both.contains(ElementFlags::COLLAPSE_ONE));
        assert!(both.contains(ElementFlags::NEST_LEFT_RECURSION));
        assert!(!ElementFlags::NONE.contains(ElementFlags::COLLAPSE_ONE));
        assert_eq!(both.bits(), 3);
    }
}
