//! The range driver: count the word space, resolve the requested window,
//! stream exactly that window to a sink.

use std::io::Write;

use log::{debug, info};

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};
use crate::generator::MaskGenerator;
use crate::mask::Mask;

/// Working buffer size, in codepoints. Words are batched here and flushed
/// to the sink whenever the next word might not fit.
pub const OUT_BUF_CODEPOINTS: usize = 8192;

/// The requested slice of the enumeration, as given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeSpec {
    /// `(J, N)`: emit the J-th of N equal parts, 1-based. Takes precedence
    /// over `begin`/`end`.
    pub job: Option<(u64, u64)>,
    /// First word index, inclusive, counting from 0.
    pub begin: Option<u64>,
    /// Last word index, inclusive.
    pub end: Option<u64>,
}

/// A resolved emission window over a counted generator.
#[derive(Debug, Clone, Copy)]
pub struct Plan {
    /// Total number of words the generator enumerates.
    pub total: u64,
    /// Index of the first word to emit.
    pub start: u64,
    /// Number of words to emit.
    pub count: u64,
    /// Widest mask seen, in codepoints.
    pub max_width: usize,
}

/// Counting pass: walk the generator once, sum the word counts with
/// overflow checking, and resolve `range` against the total.
///
/// Jobs split the index space into `N` contiguous parts whose sizes differ
/// by at most one; the remainder goes to the first jobs, so concatenating
/// the output of jobs `1..=N` reproduces a whole run exactly.
pub fn prepare<A: Alphabet, G: MaskGenerator<A>>(gen: &mut G, range: &RangeSpec) -> Result<Plan> {
    let mut total: u64 = 0;
    let mut max_width = 0usize;
    while let Some((len, width)) = gen.next_len()? {
        total = total
            .checked_add(len)
            .ok_or(Error::TotalLengthOverflow)?;
        max_width = max_width.max(width);
    }
    debug!("counting pass: {total} words, max width {max_width}");

    let (start, count) = match range.job {
        Some((j, n)) => {
            let q = total / n;
            let r = total % n;
            let start = q * (j - 1) + (j - 1).min(r);
            let count = q + u64::from(j <= r);
            (start, count)
        }
        None => {
            let start = range.begin.unwrap_or(0);
            let end_excl = match range.end {
                Some(e) => e.checked_add(1).ok_or(Error::InvalidRange {
                    start,
                    end: u64::MAX,
                    total,
                })?,
                None => total,
            };
            if start > end_excl || end_excl > total {
                return Err(Error::InvalidRange {
                    start,
                    end: end_excl,
                    total,
                });
            }
            (start, end_excl - start)
        }
    };

    info!("selected {count} of {total} words starting at {start}");
    Ok(Plan {
        total,
        start,
        count,
        max_width,
    })
}

/// Batches words in codepoint space and writes them out encoded.
struct WordSink<'a, A: Alphabet, W: Write> {
    buf: Vec<A::Cp>,
    bytes: Vec<u8>,
    delim: Option<A::Cp>,
    out: &'a mut W,
}

impl<'a, A: Alphabet, W: Write> WordSink<'a, A, W> {
    fn new(delim: Option<A::Cp>, out: &'a mut W) -> Self {
        Self {
            buf: Vec::with_capacity(OUT_BUF_CODEPOINTS),
            bytes: Vec::new(),
            delim,
            out,
        }
    }

    #[inline]
    fn push(&mut self, word: &[A::Cp]) -> Result<()> {
        let needed = word.len() + usize::from(self.delim.is_some());
        if self.buf.len() + needed > OUT_BUF_CODEPOINTS {
            self.flush()?;
        }
        self.buf.extend_from_slice(word);
        if let Some(d) = self.delim {
            self.buf.push(d);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.bytes.clear();
        A::extend_bytes(&self.buf, &mut self.bytes);
        self.out.write_all(&self.bytes).map_err(Error::Output)?;
        self.buf.clear();
        Ok(())
    }
}

/// Emission pass: replay the generator and stream `plan.count` words
/// starting at index `plan.start` into `out`.
///
/// Leading masks are skipped whole; the boundary mask is entered with
/// `set_position`, after which every word costs one odometer tick.
pub fn emit<A: Alphabet, G: MaskGenerator<A>, W: Write>(
    gen: &mut G,
    plan: &Plan,
    delim: Option<A::Cp>,
    out: &mut W,
) -> Result<()> {
    let delim_width = usize::from(delim.is_some());
    if plan.max_width + delim_width > OUT_BUF_CODEPOINTS {
        return Err(Error::OversizedWord {
            width: plan.max_width,
            max: OUT_BUF_CODEPOINTS,
        });
    }
    let mut todo = plan.count;
    if todo == 0 {
        return Ok(());
    }

    gen.reset();

    // consume whole masks in front of the window
    let mut start = plan.start;
    let mut current: Option<Mask<A>> = None;
    while start > 0 {
        match gen.next_mask()? {
            Some(mask) if start >= mask.len() => start -= mask.len(),
            Some(mask) => {
                current = Some(mask);
                break;
            }
            None => return Ok(()),
        }
    }
    let mut mask = match current {
        Some(mask) => mask,
        None => match gen.next_mask()? {
            Some(mask) => mask,
            None => return Ok(()),
        },
    };

    let mut word = vec![A::ascii(0); plan.max_width];
    let mut sink = WordSink::<A, W>::new(delim, out);

    loop {
        mask.set_position(start);
        let chunk = todo.min(mask.len().saturating_sub(start));
        let w = mask.width();

        // the first word of each mask materialises every position
        if chunk >= 1 {
            mask.current(&mut word[..w]);
            sink.push(&word[..w])?;
        }
        for _ in 1..chunk {
            mask.advance(&mut word[..w]);
            sink.push(&word[..w])?;
        }

        todo -= chunk;
        if todo == 0 {
            break;
        }
        match gen.next_mask()? {
            Some(next) => {
                mask = next;
                start = 0;
            }
            None => break,
        }
    }

    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Bytes;
    use crate::masklist::MaskList;
    use crate::registry::Registry;
    use std::io::Write as _;

    fn registry() -> Registry<Bytes> {
        let mut reg = Registry::<Bytes>::with_builtins();
        reg.expand_all().unwrap();
        reg
    }

    fn gen_for(spec: &str) -> MaskList<Bytes> {
        MaskList::open(spec, registry()).unwrap()
    }

    fn output(gen: &mut MaskList<Bytes>, range: RangeSpec, delim: Option<u8>) -> Vec<u8> {
        let plan = prepare(gen, &range).unwrap();
        let mut out = Vec::new();
        emit(gen, &plan, delim, &mut out).unwrap();
        out
    }

    #[test]
    fn emits_a_whole_mask_in_order() {
        let mut gen = gen_for("?d");
        let out = output(&mut gen, RangeSpec::default(), Some(b'\n'));
        assert_eq!(out, b"0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n");
    }

    #[test]
    fn begin_end_select_an_inclusive_window() {
        let mut gen = gen_for("?d");
        let range = RangeSpec {
            begin: Some(5),
            end: Some(7),
            ..Default::default()
        };
        assert_eq!(output(&mut gen, range, Some(b'\n')), b"5\n6\n7\n");
    }

    #[test]
    fn delimiter_variants() {
        let mut gen = gen_for("?d");
        let range = RangeSpec {
            begin: Some(0),
            end: Some(1),
            ..Default::default()
        };
        assert_eq!(output(&mut gen, range, Some(0)), b"0\x001\x00");
        let mut gen = gen_for("?d");
        assert_eq!(output(&mut gen, range, None), b"01");
    }

    #[test]
    fn out_of_bounds_ranges_are_rejected() {
        let mut gen = gen_for("?d");
        let range = RangeSpec {
            end: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            prepare(&mut gen, &range).unwrap_err(),
            Error::InvalidRange { .. }
        ));

        let mut gen = gen_for("?d");
        let range = RangeSpec {
            begin: Some(7),
            end: Some(3),
            ..Default::default()
        };
        assert!(prepare(&mut gen, &range).is_err());
    }

    #[test]
    fn windows_cross_mask_boundaries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "?d\nx?d\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        // words 0..9 are "0".."9", 10..19 are "x0".."x9"
        let mut gen = gen_for(&path);
        let range = RangeSpec {
            begin: Some(8),
            end: Some(11),
            ..Default::default()
        };
        assert_eq!(output(&mut gen, range, Some(b'\n')), b"8\n9\nx0\nx1\n");
    }

    #[test]
    fn job_outputs_concatenate_to_the_whole_run() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "?d?l\nab\n?d\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let mut gen = gen_for(&path);
        let whole = output(&mut gen, RangeSpec::default(), Some(b'\n'));

        for n in [1u64, 3, 5, 7] {
            let mut stitched = Vec::new();
            let mut sizes = Vec::new();
            for j in 1..=n {
                let mut gen = gen_for(&path);
                let range = RangeSpec {
                    job: Some((j, n)),
                    ..Default::default()
                };
                let plan = prepare(&mut gen, &range).unwrap();
                sizes.push(plan.count);
                let mut part = Vec::new();
                emit(&mut gen, &plan, Some(b'\n'), &mut part).unwrap();
                stitched.extend_from_slice(&part);
            }
            assert_eq!(stitched, whole, "N={n}");
            // parts differ in size by at most one word
            let min = sizes.iter().min().unwrap();
            let max = sizes.iter().max().unwrap();
            assert!(max - min <= 1, "uneven split for N={n}: {sizes:?}");
        }
    }

    #[test]
    fn size_zero_window_emits_nothing() {
        let mut gen = gen_for("?d");
        let range = RangeSpec {
            job: Some((3, 20)),
            ..Default::default()
        };
        // 10 words over 20 jobs: jobs 11.. get nothing
        let range_late = RangeSpec {
            job: Some((11, 20)),
            ..Default::default()
        };
        assert_eq!(output(&mut gen, range, Some(b'\n')), b"2\n");
        let mut gen = gen_for("?d");
        assert_eq!(output(&mut gen, range_late, Some(b'\n')), b"");
    }

    #[test]
    fn oversized_words_are_refused() {
        let mut gen = gen_for("?d");
        let plan = Plan {
            total: 10,
            start: 0,
            count: 10,
            max_width: OUT_BUF_CODEPOINTS,
        };
        let mut out = Vec::new();
        assert!(matches!(
            emit(&mut gen, &plan, Some(b'\n'), &mut out).unwrap_err(),
            Error::OversizedWord { .. }
        ));
    }
}
