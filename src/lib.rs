//! # maskmill — mask-based word enumeration
//!
//! A mask is a word template: one charset per position. `?d?d?d` is every
//! three-digit string, `@?u?l?l?d@` runs from `@Aaa0@` to `@Zzz9@`. This
//! crate enumerates the Cartesian product behind a mask (or a whole list of
//! masks, or every mask matching bruteforce occurrence constraints) in a
//! deterministic order, and can stream any contiguous sub-range of that
//! product without materialising the rest.
//!
//! ```no_run
//! use maskmill::{Bytes, MaskGenerator, MaskList, Registry};
//!
//! # fn main() -> maskmill::Result<()> {
//! let mut registry = Registry::<Bytes>::with_builtins();
//! registry.expand_all()?;
//!
//! let mut masks = MaskList::open("?d?d", registry)?;
//! let mut mask = masks.next_mask()?.unwrap();
//! let mut word = vec![0u8; mask.width()];
//!
//! mask.set_position(42);
//! mask.current(&mut word);
//! assert_eq!(&word, b"42");
//! # Ok(())
//! # }
//! ```
//!
//! Position 0 is the word with every charset at its first codepoint; the
//! rightmost position varies fastest. Because any index can be seeked in
//! O(width), disjoint sub-ranges can be generated by independent processes
//! (`--job J/N`) and concatenate to exactly the single-process output.
//!
//! The engine works on one of two alphabets, chosen once per run: raw bytes
//! (every 8-bit value) or unicode scalars (strict UTF-8 in and out). See
//! [`Alphabet`].

pub mod alphabet;
pub mod bruteforce;
pub mod charset;
pub mod cli;
pub mod codec;
pub mod driver;
pub mod error;
pub mod generator;
pub mod mask;
pub mod masklist;
pub mod registry;

pub use alphabet::{Alphabet, Bytes, Unicode};
pub use bruteforce::Bruteforce;
pub use charset::Charset;
pub use error::{Error, Result};
pub use generator::MaskGenerator;
pub use mask::Mask;
pub use masklist::MaskList;
pub use registry::Registry;
