//! Specialization logic for the two word alphabets (raw bytes vs unicode).

use std::fmt::Debug;
use std::hash::Hash;

use crate::codec;
use crate::error::{Error, Result};

/// A trait that defines the behavior of a word alphabet.
///
/// The whole engine — charsets, masks, generators, the range driver — is
/// generic over an `Alphabet` and monomorphises per mode, so the per-word
/// hot path contains no dynamic dispatch. The binary picks [`Bytes`] or
/// [`Unicode`] once, from the command line.
pub trait Alphabet: 'static {
    /// A short name used for debugging and logging.
    const NAME: &'static str;

    /// Whether the `?b` built-in charset (all 256 byte values) exists.
    const FULL_BYTE_CLASS: bool;

    /// The codepoint type words are made of.
    /// - `u8` for byte mode.
    /// - `char` for unicode mode.
    type Cp: Copy + Eq + Ord + Hash + Debug + 'static;

    /// Lift an ASCII byte into the alphabet. Used for syntax characters
    /// (`?`, `,`, digits) and delimiters, which are ASCII in every mode.
    fn ascii(c: u8) -> Self::Cp;

    /// Decode raw input bytes into codepoints.
    ///
    /// `what` names the input for diagnostics (a file, an argument).
    fn decode(bytes: &[u8], what: &str) -> Result<Vec<Self::Cp>>;

    /// Decode the first codepoint of `bytes`, returning it and the number
    /// of bytes it occupied.
    fn decode_first(bytes: &[u8], what: &str) -> Result<(Self::Cp, usize)>;

    /// Append the output encoding of `word` to `out`.
    fn extend_bytes(word: &[Self::Cp], out: &mut Vec<u8>);

    /// Printable form of a single codepoint for error messages.
    fn display(cp: Self::Cp) -> String;
}

/// Marker type for 8-bit mode: every byte value is a codepoint and input
/// and output pass through unchanged.
#[derive(Debug)]
pub struct Bytes;

impl Alphabet for Bytes {
    const NAME: &'static str = "byte";
    const FULL_BYTE_CLASS: bool = true;
    type Cp = u8;

    fn ascii(c: u8) -> u8 {
        c
    }

    fn decode(bytes: &[u8], _what: &str) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn decode_first(bytes: &[u8], what: &str) -> Result<(u8, usize)> {
        match bytes.first() {
            Some(&b) => Ok((b, 1)),
            None => Err(Error::Syntax(format!("{what} is empty"))),
        }
    }

    fn extend_bytes(word: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(word);
    }

    fn display(cp: u8) -> String {
        if cp.is_ascii_graphic() || cp == b' ' {
            (cp as char).to_string()
        } else {
            format!("\\x{cp:02x}")
        }
    }
}

/// Marker type for unicode mode: input is strict UTF-8, codepoints are
/// unicode scalars, output is re-encoded UTF-8.
#[derive(Debug)]
pub struct Unicode;

impl Alphabet for Unicode {
    const NAME: &'static str = "unicode";
    const FULL_BYTE_CLASS: bool = false;
    type Cp = char;

    fn ascii(c: u8) -> char {
        debug_assert!(c.is_ascii());
        c as char
    }

    fn decode(bytes: &[u8], what: &str) -> Result<Vec<char>> {
        codec::decode_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
            what: what.to_string(),
        })
    }

    fn decode_first(bytes: &[u8], what: &str) -> Result<(char, usize)> {
        codec::decode_one_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
            what: what.to_string(),
        })
    }

    fn extend_bytes(word: &[char], out: &mut Vec<u8>) {
        codec::encode_utf8(word, out);
    }

    fn display(cp: char) -> String {
        cp.to_string()
    }
}
