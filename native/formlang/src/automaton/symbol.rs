//! Symbol types for automata transitions.
//!
//! Input symbols are `char`s. The index-based automata in
//! [`crate::formlang`] work on [`SymbolId`]s, which are the scalar value of
//! the char, so ids from different automata are directly comparable.

/// A symbol identifier represented as a u32.
/// The special value `EPSILON` represents an epsilon (empty) transition.
pub type SymbolId = u32;

/// Special symbol ID representing epsilon (empty) transitions.
/// u32::MAX is not a valid `char`, so it can never collide with a real symbol.
pub const EPSILON: SymbolId = u32::MAX;

/// Shown in place of the empty string.
pub const LAMBDA: &str = "λ";

/// The blank tape symbol of a Turing machine.
pub const BLANK: char = '□';

/// End-of-input marker for parse tables, also the bottom marker pushed by
/// the LL pushdown construction.
pub const END_MARKER: char = '$';

#[inline]
pub fn is_epsilon(symbol: SymbolId) -> bool {
    symbol == EPSILON
}

#[inline]
pub fn symbol_of(c: char) -> SymbolId {
    c as SymbolId
}

/// The char behind a symbol id, or `None` for epsilon.
#[inline]
pub fn char_of(symbol: SymbolId) -> Option<char> {
    char::from_u32(symbol)
}

/// Render a possibly empty string, using λ for the empty one.
pub fn display_string(s: &str) -> &str {
    if s.is_empty() { LAMBDA } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon() {
        assert!(is_epsilon(EPSILON));
        assert!(!is_epsilon(0));
        assert!(!is_epsilon(symbol_of('a')));
        assert_eq!(char_of(EPSILON), None);
    }

    #[test]
    fn test_char_round_trip() {
        assert_eq!(char_of(symbol_of('λ')), Some('λ'));
        assert_eq!(display_string(""), "λ");
        assert_eq!(display_string("ab"), "ab");
    }
}
