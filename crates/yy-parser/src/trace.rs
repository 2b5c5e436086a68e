//! Debug trace switches.
//!
//! Trace output goes through `tracing` at TRACE level; these flags decide
//! which events are emitted at all, so hosts can enable tracing for one
//! engine without drowning in the other.

/// Tracing target for the recursive-descent driver.
pub const RD_TARGET: &str = "yy::rd";
/// Tracing target for the LALR interpreter.
pub const LALR_TARGET: &str = "yy::lalr";

/// Which trace events to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Grammar element entry and exit.
    pub const ELEMENTS: Self = Self(1 << 0);
    /// Tokens that matched a rule symbol.
    pub const MATCHES: Self = Self(1 << 1);
    /// Tokens that failed to match a rule symbol.
    pub const NON_MATCHES: Self = Self(1 << 2);
    /// Shift, reduce, goto and recovery steps.
    pub const LALR: Self = Self(1 << 3);
    /// Everything.
    pub const ALL: Self = Self(0b1111);

    /// Whether every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TraceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
