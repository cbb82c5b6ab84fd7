//! Strict UTF-8 decoding and encoding.
//!
//! The decoder rejects everything the WHATWG/RFC 3629 rules reject: overlong
//! forms, surrogate codepoints, values above U+10FFFF, and stray continuation
//! bytes. A clean-but-incomplete sequence at the end of the input is reported
//! as [`DecodeErrorKind::Truncated`] so callers can distinguish a short read
//! from corrupt data.

/// How a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A byte sequence that can never start or continue a valid scalar.
    Invalid,
    /// The input ends in the middle of an otherwise valid sequence.
    Truncated,
}

/// A decode failure, locating the first offending byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    /// Number of input bytes that decoded cleanly before the error.
    pub valid_up_to: usize,
    pub kind: DecodeErrorKind,
}

/// Decode a whole byte stream into unicode scalars.
///
/// Either every byte is consumed or an error pinpoints the first bad offset.
pub fn decode_utf8(bytes: &[u8]) -> Result<Vec<char>, DecodeError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.chars().collect()),
        Err(e) => Err(DecodeError {
            valid_up_to: e.valid_up_to(),
            kind: match e.error_len() {
                Some(_) => DecodeErrorKind::Invalid,
                None => DecodeErrorKind::Truncated,
            },
        }),
    }
}

/// Decode the first scalar of a byte stream.
///
/// Returns the scalar and the number of bytes it occupied.
pub fn decode_one_utf8(bytes: &[u8]) -> Result<(char, usize), DecodeError> {
    let width = match bytes.first() {
        None => {
            return Err(DecodeError {
                valid_up_to: 0,
                kind: DecodeErrorKind::Truncated,
            })
        }
        Some(b) if b & 0x80 == 0 => 1,
        Some(b) if b & 0xE0 == 0xC0 => 2,
        Some(b) if b & 0xF0 == 0xE0 => 3,
        Some(b) if b & 0xF8 == 0xF0 => 4,
        Some(_) => {
            return Err(DecodeError {
                valid_up_to: 0,
                kind: DecodeErrorKind::Invalid,
            })
        }
    };

    let take = width.min(bytes.len());
    match std::str::from_utf8(&bytes[..take]) {
        Ok(s) if take == width => {
            // a valid prefix of `width` bytes holds exactly one scalar
            Ok((s.chars().next().unwrap(), width))
        }
        Ok(_) => Err(DecodeError {
            valid_up_to: 0,
            kind: DecodeErrorKind::Truncated,
        }),
        Err(e) => Err(DecodeError {
            valid_up_to: 0,
            kind: match e.error_len() {
                Some(_) => DecodeErrorKind::Invalid,
                None => DecodeErrorKind::Truncated,
            },
        }),
    }
}

/// Append the UTF-8 encoding of `cps` to `out`.
///
/// Infallible: `char` cannot hold a surrogate or out-of-range value.
pub fn encode_utf8(cps: &[char], out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    for &cp in cps {
        out.extend_from_slice(cp.encode_utf8(&mut buf).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_ascii_and_multibyte() {
        let cps = decode_utf8("aé€💧".as_bytes()).unwrap();
        assert_eq!(cps, vec!['a', 'é', '€', '💧']);
    }

    #[test]
    fn rejects_overlong_encoding() {
        // 0xC0 0x80 is an overlong NUL
        let err = decode_utf8(&[b'a', 0xC0, 0x80]).unwrap_err();
        assert_eq!(err.valid_up_to, 1);
        assert_eq!(err.kind, DecodeErrorKind::Invalid);
    }

    #[test]
    fn rejects_surrogates() {
        // U+D800 encoded as 0xED 0xA0 0x80
        let err = decode_utf8(&[0xED, 0xA0, 0x80]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Invalid);
    }

    #[test]
    fn rejects_out_of_range() {
        // 0xF4 0x90 0x80 0x80 would be U+110000
        let err = decode_utf8(&[0xF4, 0x90, 0x80, 0x80]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Invalid);
    }

    #[test]
    fn reports_truncation_at_end() {
        // '€' is 0xE2 0x82 0xAC; drop the last byte
        let err = decode_utf8(&[b'x', 0xE2, 0x82]).unwrap_err();
        assert_eq!(err.valid_up_to, 1);
        assert_eq!(err.kind, DecodeErrorKind::Truncated);
    }

    #[test]
    fn decode_one_reports_width() {
        assert_eq!(decode_one_utf8("é:rest".as_bytes()).unwrap(), ('é', 2));
        assert_eq!(decode_one_utf8(b"a").unwrap(), ('a', 1));
        let err = decode_one_utf8(&[0xE2, 0x82]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Truncated);
        let err = decode_one_utf8(&[0xFF]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Invalid);
    }

    proptest! {
        /// Any sequence of scalars survives encode -> decode unchanged.
        #[test]
        fn prop_roundtrip(input: Vec<char>) {
            let mut bytes = Vec::new();
            encode_utf8(&input, &mut bytes);
            let decoded = decode_utf8(&bytes).unwrap();
            prop_assert_eq!(decoded, input);
        }

        /// The decoder never consumes past the reported error offset.
        #[test]
        fn prop_valid_up_to_is_decodable(bytes: Vec<u8>) {
            if let Err(e) = decode_utf8(&bytes) {
                prop_assert!(decode_utf8(&bytes[..e.valid_up_to]).is_ok());
            }
        }
    }
}
