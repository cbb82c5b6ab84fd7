//! The restartable mask source abstraction consumed by the range driver.

use crate::alphabet::Alphabet;
use crate::error::Result;
use crate::mask::Mask;

/// A restartable, lazy sequence of masks.
///
/// The driver walks a generator twice: once to count words and once to
/// emit them, with a [`reset`](MaskGenerator::reset) in between. `Ok(None)`
/// is clean exhaustion; an `Err` aborts the run.
pub trait MaskGenerator<A: Alphabet> {
    /// Produce the next mask.
    fn next_mask(&mut self) -> Result<Option<Mask<A>>>;

    /// Produce only the next mask's word count and width.
    ///
    /// Implementations override this when they can answer without building
    /// the mask; the default just builds and discards one.
    fn next_len(&mut self) -> Result<Option<(u64, usize)>> {
        Ok(self.next_mask()?.map(|m| (m.len(), m.width())))
    }

    /// Rewind to the first mask.
    fn reset(&mut self);
}
