//! Restricted, non-backtracking regular expression matcher.
//!
//! Supported syntax:
//!
//! - literals, `\x` escapes and `.` (any byte, including newline)
//! - classes `[...]` with `^` negation, a leading literal `]` and `a-z` ranges
//! - groups `(...)` and alternation `|`
//! - quantifiers `?`, `*`, `+` and the non-greedy `*?`, `+?`
//!
//! Matching walks the pattern text directly; nothing is compiled. Input
//! consumed by a successful element is never re-scanned: when an element
//! fails, the matcher abandons the whole alternative and retries the next
//! `|` branch at the same depth from the alternative's starting position.
//! A quantifier character in element position is an ordinary literal, so
//! patterns like `+=` match the two bytes `+=`.
//!
//! A non-greedy quantifier stops at the first iteration count where the rest
//! of the pattern matches: the rest of its alternative, then whatever follows
//! each enclosing group. Inside a repeated group only the rest of that group
//! is considered.

/// A pattern borrowed from the host's pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern<'p> {
    source: &'p [u8],
}

impl<'p> Pattern<'p> {
    /// Wrap a pattern string.
    #[inline]
    pub const fn new(source: &'p str) -> Self {
        Self {
            source: source.as_bytes(),
        }
    }

    /// The pattern text.
    #[inline]
    pub const fn as_bytes(&self) -> &'p [u8] {
        self.source
    }

    /// Match the pattern against `input` starting at `position`.
    ///
    /// Returns the end offset of the match. A zero-length match returns
    /// `Some(position)`; callers that need progress must compare the two.
    pub fn match_at(&self, input: &[u8], position: usize) -> Option<usize> {
        let matcher = Matcher {
            pattern: self.source,
            input,
        };
        let mut cursor = 0;
        let mut pos = position;
        matcher.alternatives(&mut cursor, &mut pos, None).then_some(pos)
    }

    /// Length of the match at `position`, if any.
    #[inline]
    pub fn match_len(&self, input: &[u8], position: usize) -> Option<usize> {
        self.match_at(input, position).map(|end| end - position)
    }
}

/// Repetition attached to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    One,
    Optional,
    Star,
    Plus,
    LazyStar,
    LazyPlus,
}

/// Pattern text that follows an enclosing group, innermost first.
struct Continuation<'c> {
    cursor: usize,
    outer: Option<&'c Continuation<'c>>,
}

struct Matcher<'p, 'i> {
    pattern: &'p [u8],
    input: &'i [u8],
}

impl Matcher<'_, '_> {
    #[inline]
    fn at(&self, cursor: usize) -> Option<u8> {
        self.pattern.get(cursor).copied()
    }

    /// Match one of the `|`-separated alternatives starting at `cursor`.
    ///
    /// On success the cursor is left at the `)` closing the group (or at the
    /// end of the pattern). On failure it is left at the group boundary after
    /// the last alternative tried.
    fn alternatives(
        &self,
        cursor: &mut usize,
        pos: &mut usize,
        then: Option<&Continuation<'_>>,
    ) -> bool {
        loop {
            let mut branch = *cursor;
            let mut end = *pos;
            if self.sequence(&mut branch, &mut end, then) {
                *cursor = self.skip_to_boundary(branch, true);
                *pos = end;
                return true;
            }

            let boundary = self.skip_to_boundary(branch, false);
            if self.at(boundary) == Some(b'|') {
                *cursor = boundary + 1;
            } else {
                *cursor = boundary;
                return false;
            }
        }
    }

    /// Match the elements of a single alternative.
    ///
    /// On failure the cursor is left at the start of the failing element.
    fn sequence(
        &self,
        cursor: &mut usize,
        pos: &mut usize,
        then: Option<&Continuation<'_>>,
    ) -> bool {
        loop {
            match self.at(*cursor) {
                None | Some(b'|' | b')') => return true,
                Some(_) => {}
            }

            let element = *cursor;
            let (quantifier, next) = self.quantifier(self.element_end(element));
            let after = Continuation {
                cursor: next,
                outer: then,
            };
            match quantifier {
                Quantifier::One => match self.element(element, *pos, Some(&after)) {
                    Some(end) => *pos = end,
                    None => return false,
                },

                Quantifier::Optional => {
                    if let Some(end) = self.element(element, *pos, Some(&after)) {
                        *pos = end;
                    }
                }

                Quantifier::Star | Quantifier::Plus => {
                    let mut count = 0usize;
                    while let Some(end) = self.element(element, *pos, None) {
                        count += 1;
                        if end == *pos {
                            break;
                        }

                        *pos = end;
                    }

                    if quantifier == Quantifier::Plus && count == 0 {
                        return false;
                    }
                }

                Quantifier::LazyStar | Quantifier::LazyPlus => {
                    if quantifier == Quantifier::LazyPlus {
                        match self.element(element, *pos, None) {
                            Some(end) => *pos = end,
                            None => return false,
                        }
                    }

                    // Prefer the rest of the pattern, taking one more
                    // iteration only when it fails.
                    loop {
                        let mut rest = next;
                        let mut end = *pos;
                        if self.sequence(&mut rest, &mut end, then) && self.follows(then, end) {
                            *cursor = rest;
                            *pos = end;
                            return true;
                        }

                        match self.element(element, *pos, None) {
                            Some(end) if end != *pos => *pos = end,
                            _ => return false,
                        }
                    }
                }
            }

            *cursor = next;
        }
    }

    /// Whether the text after the enclosing groups matches at `pos`.
    fn follows(&self, mut then: Option<&Continuation<'_>>, mut pos: usize) -> bool {
        while let Some(continuation) = then {
            let mut cursor = continuation.cursor;
            if !self.sequence(&mut cursor, &mut pos, continuation.outer) {
                return false;
            }

            then = continuation.outer;
        }

        true
    }

    /// Match a single element at `pos`, returning the new input position.
    /// `then` is the pattern following the element, used by non-greedy
    /// quantifiers inside a group.
    fn element(
        &self,
        cursor: usize,
        pos: usize,
        then: Option<&Continuation<'_>>,
    ) -> Option<usize> {
        match self.at(cursor)? {
            b'[' => {
                let byte = *self.input.get(pos)?;
                self.class_contains(cursor, byte).then_some(pos + 1)
            }

            b'(' => {
                let mut inner = cursor + 1;
                let mut end = pos;
                self.alternatives(&mut inner, &mut end, then).then_some(end)
            }

            b'.' => (pos < self.input.len()).then_some(pos + 1),

            b'\\' => {
                let wanted = self.at(cursor + 1).unwrap_or(b'\\');
                (self.input.get(pos) == Some(&wanted)).then_some(pos + 1)
            }

            literal => (self.input.get(pos) == Some(&literal)).then_some(pos + 1),
        }
    }

    /// Read the quantifier at `cursor`, returning it and the cursor after it.
    fn quantifier(&self, cursor: usize) -> (Quantifier, usize) {
        let lazy = self.at(cursor + 1) == Some(b'?');
        match self.at(cursor) {
            Some(b'?') => (Quantifier::Optional, cursor + 1),
            Some(b'*') if lazy => (Quantifier::LazyStar, cursor + 2),
            Some(b'*') => (Quantifier::Star, cursor + 1),
            Some(b'+') if lazy => (Quantifier::LazyPlus, cursor + 2),
            Some(b'+') => (Quantifier::Plus, cursor + 1),
            _ => (Quantifier::One, cursor),
        }
    }

    // === Pattern walking ===

    /// Index just past the element starting at `cursor`.
    fn element_end(&self, cursor: usize) -> usize {
        match self.at(cursor) {
            Some(b'[') => self.class_end(cursor),
            Some(b'(') => {
                let close = self.skip_to_boundary(cursor + 1, true);
                (close + 1).min(self.pattern.len())
            }
            Some(b'\\') => (cursor + 2).min(self.pattern.len()),
            Some(_) => cursor + 1,
            None => cursor,
        }
    }

    /// Index just past the `]` closing the class that opens at `cursor`.
    fn class_end(&self, cursor: usize) -> usize {
        let mut index = cursor + 1;
        if self.at(index) == Some(b'^') {
            index += 1;
        }

        if self.at(index) == Some(b']') {
            index += 1;
        }

        while let Some(byte) = self.at(index) {
            match byte {
                b']' => return index + 1,
                b'\\' => index += 2,
                _ => index += 1,
            }
        }

        self.pattern.len()
    }

    /// Skip forward over elements until a `|` (unless `through_bars`) or a
    /// `)` at the current depth, or the end of the pattern.
    fn skip_to_boundary(&self, mut cursor: usize, through_bars: bool) -> usize {
        while let Some(byte) = self.at(cursor) {
            match byte {
                b')' => return cursor,
                b'|' if !through_bars => return cursor,
                b'|' => cursor += 1,
                _ => cursor = self.element_end(cursor),
            }
        }

        self.pattern.len()
    }

    /// Test `byte` against the class opening at `cursor`.
    fn class_contains(&self, cursor: usize, byte: u8) -> bool {
        let mut index = cursor + 1;
        let negate = self.at(index) == Some(b'^');
        if negate {
            index += 1;
        }

        let mut first = true;
        let mut found = false;
        while let Some(current) = self.at(index) {
            if current == b']' && !first {
                break;
            }

            first = false;
            let (low, after) = self.class_member(index);
            index = after;
            let mut high = low;
            if self.at(index) == Some(b'-') {
                if let Some(end) = self.at(index + 1) {
                    if end != b']' {
                        let (value, after) = self.class_member(index + 1);
                        high = value;
                        index = after;
                    }
                }
            }

            if (low..=high).contains(&byte) {
                found = true;
            }
        }

        found != negate
    }

    /// Read one (possibly escaped) class member.
    fn class_member(&self, index: usize) -> (u8, usize) {
        match (self.at(index), self.at(index + 1)) {
            (Some(b'\\'), Some(escaped)) => (escaped, index + 2),
            (Some(byte), _) => (byte, index + 1),
            (None, _) => (0, index + 1),
        }
    }
}
