//! Custom error types for the maskmill crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from I/O operations on a named path.
    #[error("can't access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An error while writing generated words to the output.
    #[error("error while writing the output data: {0}")]
    Output(#[source] std::io::Error),

    /// Input that must be UTF-8 was not.
    #[error("invalid UTF-8 in {what}")]
    InvalidUtf8 { what: String },

    /// A `?X` reference names a charset with no definition.
    #[error("charset '?{name}' is not defined")]
    UnknownCharset { name: String },

    /// A self-referential charset ran out of previous definitions to use.
    #[error("charset '{name}' references itself more times than it has definitions")]
    CharsetRecursion { name: String },

    /// A charset body resolved to zero codepoints.
    #[error("the charset '{name}' is empty")]
    EmptyCharset { name: String },

    /// A mask parsed to zero positions.
    #[error("empty mask")]
    EmptyMask,

    /// More than 9 inline custom charsets on a single mask line.
    #[error("too many custom charsets defined (max: 9)")]
    TooManyCustomCharsets,

    /// A malformed line in a mask or bruteforce file.
    #[error("{0}")]
    Syntax(String),

    /// A malformed `-c K:VAL` argument.
    #[error("invalid charset definition '{spec}' (expected K:VAL)")]
    BadCharsetSpec { spec: String },

    /// A malformed or out-of-range `-j J/N` argument.
    #[error("invalid job specification '{spec}' (expected J/N with 1 <= J <= N)")]
    BadJobSpec { spec: String },

    /// The requested begin/end window does not fit the enumeration.
    #[error("invalid word range [{start}, {end}) for {total} words")]
    InvalidRange { start: u64, end: u64, total: u64 },

    /// A single mask enumerates more words than a 64-bit counter can hold.
    #[error("the length of the mask would overflow a 64-bit integer")]
    MaskLengthOverflow,

    /// The run as a whole enumerates more words than a 64-bit counter can hold.
    #[error("the total number of words would overflow a 64-bit integer")]
    TotalLengthOverflow,

    /// A word wider than the output working buffer.
    #[error("words of width {width} exceed the output buffer ({max} codepoints)")]
    OversizedWord { width: usize, max: usize },

    /// Attaches file and line context to an underlying error.
    #[error("{path}:{line}: {source}")]
    AtLine {
        path: String,
        line: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the file and line it was detected on.
    pub fn at_line(self, path: &str, line: u32) -> Self {
        Error::AtLine {
            path: path.to_string(),
            line,
            source: Box::new(self),
        }
    }
}

/// A convenience `Result` type alias using the crate's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;
