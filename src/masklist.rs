//! Mask parsing: single masks, mask-file lines, and the file/inline generator.
//!
//! A mask file holds one mask per non-empty, non-`#` line. A line may open
//! with up to nine comma-separated charset definitions that bind the
//! ephemeral names `'1'..'9'` for that line only; the last field is the mask
//! itself. The backslash protects a comma (or another backslash) from the
//! field split, while `?` escapes stay a charset-body concern.

use log::info;

use crate::alphabet::Alphabet;
use crate::charset::Charset;
use crate::error::{Error, Result};
use crate::generator::MaskGenerator;
use crate::mask::Mask;
use crate::registry::Registry;

/// Parse a mask body (no field splitting, no inline charset definitions).
///
/// Outside `?`-escapes every codepoint is a literal, one-choice position.
/// `?K` places the charset bound to `K` by reference; `??` and `?,` are
/// literal; a trailing lone `?` is literal.
pub fn parse_mask<A: Alphabet>(body: &[A::Cp], registry: &Registry<A>) -> Result<Mask<A>> {
    let esc = A::ascii(b'?');
    let comma = A::ascii(b',');
    let mut mask = Mask::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let c = body[i];
        if c == esc && i + 1 < body.len() {
            let key = body[i + 1];
            if key == esc || key == comma {
                mask.push_right(Charset::new(&[key])?)?;
            } else {
                mask.push_right(registry.charset(key)?)?;
            }
            i += 2;
        } else {
            mask.push_right(Charset::new(&[c])?)?;
            i += 1;
        }
    }
    if mask.is_empty() {
        return Err(Error::EmptyMask);
    }
    Ok(mask)
}

/// Split a mask-file line into fields on unescaped commas.
///
/// `\,` keeps the comma, `\\` keeps one backslash, any other `\x` passes
/// both codepoints through untouched.
fn split_fields<A: Alphabet>(line: &[A::Cp]) -> Vec<Vec<A::Cp>> {
    let bs = A::ascii(b'\\');
    let comma = A::ascii(b',');
    let mut fields = Vec::new();
    let mut field = Vec::new();
    let mut i = 0;
    while i < line.len() {
        let c = line[i];
        if c == bs && i + 1 < line.len() {
            let next = line[i + 1];
            if next != comma && next != bs {
                field.push(bs);
            }
            field.push(next);
            i += 2;
        } else if c == comma {
            fields.push(std::mem::take(&mut field));
            i += 1;
        } else {
            field.push(c);
            i += 1;
        }
    }
    fields.push(field);
    fields
}

/// Parse one mask-file line into a mask.
///
/// Returns `Ok(None)` for comment and empty lines. Leading fields bind the
/// ephemeral charsets `'1'..'9'` into a per-line copy of the registry; they
/// shadow same-named bindings but keep them reachable for self-references.
pub fn parse_mask_line<A: Alphabet>(
    line: &[A::Cp],
    registry: &Registry<A>,
) -> Result<Option<Mask<A>>> {
    if line.is_empty() || line[0] == A::ascii(b'#') {
        return Ok(None);
    }

    let fields = split_fields::<A>(line);
    if fields.len() > 10 {
        return Err(Error::TooManyCustomCharsets);
    }
    let Some((mask_field, defs)) = fields.split_last() else {
        return Err(Error::EmptyMask);
    };

    let effective;
    let registry = if defs.is_empty() {
        registry
    } else {
        let mut reg = registry.clone();
        // register every definition first: a line charset may reference a
        // later one, or shadow and extend a command-line binding
        for (n, field) in defs.iter().enumerate() {
            let name = A::ascii(b'1' + n as u8);
            if field.is_empty() {
                return Err(Error::EmptyCharset {
                    name: A::display(name),
                });
            }
            reg.define(name, field.clone(), false);
        }
        for n in 0..defs.len() {
            reg.expand(A::ascii(b'1' + n as u8))?;
        }
        effective = reg;
        &effective
    };

    parse_mask(mask_field, registry).map(Some)
}

enum Source {
    /// Snapshot of a mask file, split into lines with the terminator
    /// stripped. Line numbers are the index plus one.
    File { path: String, lines: Vec<Vec<u8>> },
    /// The command-line argument itself, parsed with the mask-only grammar.
    Inline { arg: String },
}

/// Streams masks from a mask file, or yields a single inline mask.
///
/// The file is read whole at construction, freezing its content against
/// concurrent modification; lines are decoded and parsed on demand so the
/// counting and emission passes both walk the same snapshot.
pub struct MaskList<A: Alphabet> {
    source: Source,
    registry: Registry<A>,
    next_line: usize,
    inline_done: bool,
}

impl<A: Alphabet> MaskList<A> {
    /// Open `spec` as a mask file if it names a regular file, otherwise
    /// treat it as one inline mask.
    pub fn open(spec: &str, registry: Registry<A>) -> Result<Self> {
        let is_file = std::fs::metadata(spec)
            .map(|m| m.is_file())
            .unwrap_or(false);
        let source = if is_file {
            let content = std::fs::read(spec).map_err(|e| Error::Io {
                path: spec.to_string(),
                source: e,
            })?;
            let lines = split_lines(&content);
            info!("read {} mask file lines from '{}'", lines.len(), spec);
            Source::File {
                path: spec.to_string(),
                lines,
            }
        } else {
            Source::Inline {
                arg: spec.to_string(),
            }
        };
        Ok(Self {
            source,
            registry,
            next_line: 0,
            inline_done: false,
        })
    }
}

impl<A: Alphabet> MaskGenerator<A> for MaskList<A> {
    fn next_mask(&mut self) -> Result<Option<Mask<A>>> {
        match &self.source {
            Source::Inline { arg } => {
                if self.inline_done {
                    return Ok(None);
                }
                self.inline_done = true;
                let cps = A::decode(arg.as_bytes(), &format!("the mask '{arg}'"))?;
                parse_mask(&cps, &self.registry).map(Some)
            }
            Source::File { path, lines } => {
                while self.next_line < lines.len() {
                    let lineno = (self.next_line + 1) as u32;
                    let raw = &lines[self.next_line];
                    self.next_line += 1;

                    let cps =
                        A::decode(raw, "mask line").map_err(|e| e.at_line(path, lineno))?;
                    match parse_mask_line(&cps, &self.registry) {
                        Ok(Some(mask)) => return Ok(Some(mask)),
                        Ok(None) => continue,
                        Err(e) => return Err(e.at_line(path, lineno)),
                    }
                }
                Ok(None)
            }
        }
    }

    fn reset(&mut self) {
        self.next_line = 0;
        self.inline_done = false;
    }
}

/// Split file content into lines, stripping LF or CRLF terminators but
/// keeping empty lines so indexes map to file line numbers.
pub(crate) fn split_lines(content: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    // the split after a final newline is not a line
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
