//! A mask: an ordered list of charsets enumerated like an odometer.

use crate::alphabet::Alphabet;
use crate::charset::Charset;
use crate::error::{Error, Result};

/// A word template. Each position holds a charset; the mask enumerates the
/// Cartesian product of its positions in odometer order, rightmost position
/// varying fastest.
///
/// Call [`set_position`](Mask::set_position) first, then
/// [`current`](Mask::current) to materialise the initial word, then
/// [`advance`](Mask::advance) with the *same buffer* for each following
/// word. `advance` only rewrites buffer positions whose wheel ticked, which
/// is what keeps the per-word cost at a couple of cursor bumps.
pub struct Mask<A: Alphabet> {
    charsets: Vec<Charset<A>>,
    len: u64,
}

impl<A: Alphabet> Clone for Mask<A> {
    fn clone(&self) -> Self {
        Self {
            charsets: self.charsets.clone(),
            len: self.len,
        }
    }
}

impl<A: Alphabet> std::fmt::Debug for Mask<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width())
            .field("len", &self.len)
            .finish()
    }
}

impl<A: Alphabet> Default for Mask<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Alphabet> Mask<A> {
    /// Create an empty mask (width 0, length 0).
    pub fn new() -> Self {
        Self {
            charsets: Vec::new(),
            len: 0,
        }
    }

    /// Create an empty mask with room for `width` charsets.
    pub fn with_capacity(width: usize) -> Self {
        Self {
            charsets: Vec::with_capacity(width),
            len: 0,
        }
    }

    /// Append a charset to the right of the existing positions.
    pub fn push_right(&mut self, charset: Charset<A>) -> Result<()> {
        self.grow_len(charset.len())?;
        self.charsets.push(charset);
        Ok(())
    }

    /// Prepend a charset to the left of the existing positions.
    pub fn push_left(&mut self, charset: Charset<A>) -> Result<()> {
        self.grow_len(charset.len())?;
        self.charsets.insert(0, charset);
        Ok(())
    }

    fn grow_len(&mut self, charset_len: u64) -> Result<()> {
        self.len = if self.charsets.is_empty() {
            charset_len
        } else {
            self.len
                .checked_mul(charset_len)
                .ok_or(Error::MaskLengthOverflow)?
        };
        Ok(())
    }

    /// Number of words this mask enumerates.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True for a freshly created, zero-width mask.
    pub fn is_empty(&self) -> bool {
        self.charsets.is_empty()
    }

    /// Number of positions (characters per word).
    #[inline]
    pub fn width(&self) -> usize {
        self.charsets.len()
    }

    /// Position the odometer on word number `o` (modulo the mask length).
    pub fn set_position(&mut self, o: u64) {
        if self.len == 0 {
            return;
        }
        let mut o = o % self.len;
        for cs in self.charsets.iter_mut().rev() {
            let s = cs.len();
            cs.set_position(o % s);
            o /= s;
        }
    }

    /// Write the word under the cursor into `buf[..width]`.
    #[inline]
    pub fn current(&self, buf: &mut [A::Cp]) {
        for (slot, cs) in buf.iter_mut().zip(&self.charsets) {
            *slot = cs.current();
        }
    }

    /// Step to the next word, updating only the changed positions of `buf`.
    ///
    /// Returns true when the odometer rolled over back to word 0.
    #[inline]
    pub fn advance(&mut self, buf: &mut [A::Cp]) -> bool {
        let mut carry = true;
        for i in (0..self.charsets.len()).rev() {
            if !carry {
                break;
            }
            let (cp, wrapped) = self.charsets[i].advance();
            buf[i] = cp;
            carry = wrapped;
        }
        carry
    }
}
