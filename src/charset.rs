//! A charset: an ordered, deduplicated codepoint sequence with a cyclic cursor.

use std::sync::Arc;

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};

/// An ordered set of codepoints and a cursor over it.
///
/// The body is immutable and shared: cloning a `Charset` bumps a reference
/// count instead of copying the codepoints, while the cursor is copied, so
/// every clone iterates independently. This is what makes masks cheap to
/// build even when the same charset appears at millions of positions.
pub struct Charset<A: Alphabet> {
    symbols: Arc<[A::Cp]>,
    pos: usize,
}

impl<A: Alphabet> Clone for Charset<A> {
    fn clone(&self) -> Self {
        Self {
            symbols: Arc::clone(&self.symbols),
            pos: self.pos,
        }
    }
}

impl<A: Alphabet> std::fmt::Debug for Charset<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Charset")
            .field("len", &self.symbols.len())
            .field("pos", &self.pos)
            .finish()
    }
}

impl<A: Alphabet> Charset<A> {
    /// Build a charset from a codepoint sequence.
    ///
    /// Duplicates are dropped, keeping the first occurrence of each
    /// codepoint. An empty body is an error: a charset must offer at least
    /// one choice.
    pub fn new(body: &[A::Cp]) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(body.len());
        let mut symbols = Vec::with_capacity(body.len());
        for &cp in body {
            if seen.insert(cp) {
                symbols.push(cp);
            }
        }
        if symbols.is_empty() {
            return Err(Error::EmptyCharset {
                name: "<inline>".to_string(),
            });
        }
        Ok(Self {
            symbols: symbols.into(),
            pos: 0,
        })
    }

    /// Number of codepoints in the charset. Always at least 1.
    #[inline]
    pub fn len(&self) -> u64 {
        self.symbols.len() as u64
    }

    /// Move the cursor to `o` modulo the charset length. Never fails.
    pub fn set_position(&mut self, o: u64) {
        self.pos = (o % self.len()) as usize;
    }

    /// The codepoint under the cursor, without moving it.
    #[inline]
    pub fn current(&self) -> A::Cp {
        self.symbols[self.pos]
    }

    /// Step the cursor forward one place, wrapping at the end.
    ///
    /// Returns the codepoint now under the cursor, and whether the cursor
    /// rolled over from the last position back to the first.
    #[inline]
    pub fn advance(&mut self) -> (A::Cp, bool) {
        self.pos += 1;
        let wrapped = self.pos == self.symbols.len();
        if wrapped {
            self.pos = 0;
        }
        (self.symbols[self.pos], wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Bytes;
    use proptest::prelude::*;

    fn cs(body: &[u8]) -> Charset<Bytes> {
        Charset::<Bytes>::new(body).unwrap()
    }

    #[test]
    fn dedups_preserving_first_occurrence() {
        let c = cs(b"abcabd");
        assert_eq!(c.len(), 4);
        let mut got = vec![c.current()];
        let mut c = c;
        for _ in 0..3 {
            got.push(c.advance().0);
        }
        assert_eq!(got, b"abcd");
    }

    #[test]
    fn rejects_empty_body() {
        assert!(Charset::<Bytes>::new(b"").is_err());
    }

    #[test]
    fn advance_signals_wraparound() {
        let mut c = cs(b"xy");
        assert_eq!(c.advance(), (b'y', false));
        assert_eq!(c.advance(), (b'x', true));
        assert_eq!(c.advance(), (b'y', false));
    }

    #[test]
    fn clones_iterate_independently() {
        let mut a = cs(b"0123");
        a.advance();
        let mut b = a.clone();
        a.advance();
        assert_eq!(a.current(), b'2');
        assert_eq!(b.current(), b'1');
        b.set_position(0);
        assert_eq!(a.current(), b'2');
    }

    proptest! {
        /// set_position(o) always lands on body[o % len].
        #[test]
        fn prop_set_position_is_modular(body in proptest::collection::vec(any::<u8>(), 1..40), o: u64) {
            let mut c = Charset::<Bytes>::new(&body).unwrap();
            let mut unique = Vec::new();
            for b in body {
                if !unique.contains(&b) {
                    unique.push(b);
                }
            }
            c.set_position(o);
            prop_assert_eq!(c.current(), unique[(o % unique.len() as u64) as usize]);
        }

        /// o advances from position 0 equal one set_position(o).
        #[test]
        fn prop_advance_matches_set_position(body in proptest::collection::vec(any::<u8>(), 1..20), o in 0u64..200) {
            let mut by_steps = Charset::<Bytes>::new(&body).unwrap();
            let mut direct = by_steps.clone();
            by_steps.set_position(0);
            for _ in 0..o {
                by_steps.advance();
            }
            direct.set_position(o);
            prop_assert_eq!(by_steps.current(), direct.current());
        }
    }
}
