//! Bruteforce mode: enumerate every mask matching occurrence constraints.
//!
//! A bruteforce file gives a word width and, per line, how often a charset
//! may occur:
//!
//! ```text
//! 8
//! 0 2 ?d
//! 0 8 ?l
//! 1 2 ?u
//! ```
//!
//! The generator emits every mask of that width whose per-charset position
//! counts fall within the given ranges, exactly once, in a fixed order:
//! occurrence distributions are enumerated odometer-style (first charset
//! varying fastest), and within a distribution the charsets are placed
//! depth-first, lowest constraint index first. Both stages are resumable
//! state machines, so the driver's counting and emission passes never
//! buffer a mask list.

use log::info;

use crate::alphabet::Alphabet;
use crate::charset::Charset;
use crate::error::{Error, Result};
use crate::generator::MaskGenerator;
use crate::mask::Mask;
use crate::masklist::split_lines;
use crate::registry::Registry;

/// Stage 1: occurrence-count vectors `n` with `min_k <= n_k <= max_k` and
/// `sum(n) = width`.
#[derive(Debug)]
struct Distributions {
    mins: Vec<u32>,
    maxs: Vec<u32>,
    width: u32,
    counts: Vec<u32>,
    total: u32,
    started: bool,
    done: bool,
}

impl Distributions {
    fn new(mins: Vec<u32>, maxs: Vec<u32>, width: u32) -> Self {
        let mut d = Self {
            counts: Vec::new(),
            total: 0,
            started: false,
            done: false,
            mins,
            maxs,
            width,
        };
        d.reset();
        d
    }

    fn reset(&mut self) {
        self.counts = self.mins.clone();
        self.total = self.mins.iter().sum();
        self.started = false;
        // an empty range anywhere empties the whole product
        self.done = self.mins.iter().zip(&self.maxs).any(|(lo, hi)| lo > hi);
    }

    fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Move to the next valid distribution. False when exhausted.
    fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }
        loop {
            if self.started && !self.step() {
                self.done = true;
                return false;
            }
            self.started = true;

            // under-shoot: close the gap with the fastest wheel in one move
            if self.total < self.width {
                let diff = (self.width - self.total).min(self.maxs[0] - self.counts[0]);
                self.counts[0] += diff;
                self.total += diff;
            }
            if self.total == self.width {
                return true;
            }
        }
    }

    /// Odometer increment with carry. False once every wheel wrapped.
    fn step(&mut self) -> bool {
        for k in 0..self.counts.len() {
            self.counts[k] += 1;
            self.total += 1;
            if self.counts[k] > self.maxs[k] || self.total > self.width {
                self.total -= self.counts[k];
                self.counts[k] = self.mins[k];
                self.total += self.counts[k];
            } else {
                return true;
            }
        }
        false
    }
}

/// Stage 2: every arrangement of the current distribution over `width`
/// positions, depth-first with the lowest charset index tried first.
#[derive(Debug)]
struct Placements {
    width: usize,
    remaining: Vec<u32>,
    choice: Vec<usize>,
    primed: bool,
}

impl Placements {
    fn new() -> Self {
        Self {
            width: 0,
            remaining: Vec::new(),
            choice: Vec::new(),
            primed: false,
        }
    }

    fn init(&mut self, counts: &[u32], width: usize) {
        self.width = width;
        self.remaining = counts.to_vec();
        self.choice.clear();
        self.primed = false;
    }

    /// The arrangement produced by the last successful [`next`](Self::next).
    fn choice(&self) -> &[usize] {
        &self.choice
    }

    fn next(&mut self) -> bool {
        if !self.primed {
            self.primed = true;
            self.descend();
            return self.choice.len() == self.width;
        }
        while let Some(k) = self.choice.pop() {
            self.remaining[k] += 1;
            let next_k = (k + 1..self.remaining.len()).find(|&k2| self.remaining[k2] > 0);
            if let Some(k2) = next_k {
                self.remaining[k2] -= 1;
                self.choice.push(k2);
                self.descend();
                return true;
            }
        }
        false
    }

    /// Fill the remaining positions greedily with the lowest available
    /// index. The remaining counts always sum to the open positions.
    fn descend(&mut self) {
        while self.choice.len() < self.width {
            match (0..self.remaining.len()).find(|&k| self.remaining[k] > 0) {
                Some(k) => {
                    self.remaining[k] -= 1;
                    self.choice.push(k);
                }
                None => break,
            }
        }
    }
}

/// Lazy generator over every mask satisfying a bruteforce description.
#[derive(Debug)]
pub struct Bruteforce<A: Alphabet> {
    charsets: Vec<Charset<A>>,
    width: u32,
    dists: Distributions,
    places: Placements,
    in_distribution: bool,
    /// Word count of each mask of the active distribution.
    dist_mask_len: u64,
}

impl<A: Alphabet> Bruteforce<A> {
    /// Read and parse a bruteforce description file.
    ///
    /// Grammar: the first non-empty line is the word width; every further
    /// non-empty line is `MIN MAX CHARSET`. No comments, no escapes.
    /// Charsets are expanded against `registry` without being named;
    /// `MAX` is clamped to the width.
    pub fn open(spec: &str, registry: &Registry<A>) -> Result<Self> {
        let content = std::fs::read(spec).map_err(|e| Error::Io {
            path: spec.to_string(),
            source: e,
        })?;

        let mut width: Option<u32> = None;
        let mut charsets = Vec::new();
        let mut mins = Vec::new();
        let mut maxs = Vec::new();

        for (idx, raw) in split_lines(&content).iter().enumerate() {
            let lineno = (idx + 1) as u32;
            if raw.is_empty() {
                continue;
            }
            let Some(w) = width else {
                width = Some(parse_width(raw).map_err(|e| e.at_line(spec, lineno))?);
                continue;
            };

            let (min, max, cset) =
                parse_constraint(raw).map_err(|e| e.at_line(spec, lineno))?;
            let cps = A::decode(cset, "the charset").map_err(|e| e.at_line(spec, lineno))?;
            let expanded = registry
                .expand_detached(&cps)
                .map_err(|e| e.at_line(spec, lineno))?;
            let charset = Charset::new(&expanded).map_err(|e| e.at_line(spec, lineno))?;

            charsets.push(charset);
            mins.push(min);
            maxs.push(max.min(w));
        }

        let Some(width) = width else {
            return Err(Error::Syntax(format!(
                "expected at least a word width and a charset in '{spec}'"
            )));
        };
        if charsets.is_empty() {
            return Err(Error::Syntax(format!(
                "expected at least a word width and a charset in '{spec}'"
            )));
        }
        info!(
            "bruteforce: width {width}, {} constrained charsets",
            charsets.len()
        );

        Ok(Self {
            dists: Distributions::new(mins, maxs, width),
            places: Placements::new(),
            in_distribution: false,
            dist_mask_len: 0,
            charsets,
            width,
        })
    }

    /// Step to the next arrangement, crossing distribution boundaries.
    fn step(&mut self) -> Result<bool> {
        loop {
            if self.in_distribution && self.places.next() {
                return Ok(true);
            }
            if !self.dists.advance() {
                self.in_distribution = false;
                return Ok(false);
            }
            self.in_distribution = true;
            self.dist_mask_len = self.distribution_len()?;
            self.places.init(self.dists.counts(), self.width as usize);
        }
    }

    /// Words per mask for the active distribution: prod |s_k| ^ n_k.
    fn distribution_len(&self) -> Result<u64> {
        let mut len: u64 = 1;
        for (cs, &n) in self.charsets.iter().zip(self.dists.counts()) {
            let factor = cs.len().checked_pow(n).ok_or(Error::MaskLengthOverflow)?;
            len = len.checked_mul(factor).ok_or(Error::MaskLengthOverflow)?;
        }
        Ok(len)
    }
}

impl<A: Alphabet> MaskGenerator<A> for Bruteforce<A> {
    fn next_mask(&mut self) -> Result<Option<Mask<A>>> {
        if !self.step()? {
            return Ok(None);
        }
        let mut mask = Mask::with_capacity(self.width as usize);
        for &k in self.places.choice().iter().rev() {
            mask.push_left(self.charsets[k].clone())?;
        }
        Ok(Some(mask))
    }

    fn next_len(&mut self) -> Result<Option<(u64, usize)>> {
        if !self.step()? {
            return Ok(None);
        }
        Ok(Some((self.dist_mask_len, self.width as usize)))
    }

    fn reset(&mut self) {
        self.dists.reset();
        self.in_distribution = false;
    }
}

fn parse_width(raw: &[u8]) -> Result<u32> {
    let text = std::str::from_utf8(raw).map_err(|_| {
        Error::Syntax("expected an unsigned decimal word width".to_string())
    })?;
    let w: u32 = text
        .trim()
        .parse()
        .map_err(|_| Error::Syntax("expected an unsigned decimal word width".to_string()))?;
    if w == 0 {
        return Err(Error::Syntax("the word width must be positive".to_string()));
    }
    Ok(w)
}

/// Parse `MIN MAX CHARSET` where MIN and MAX are decimal and CHARSET is the
/// raw remainder of the line (it may itself contain blanks).
fn parse_constraint(raw: &[u8]) -> Result<(u32, u32, &[u8])> {
    let err = || Error::Syntax("expected 'MIN MAX CHARSET'".to_string());

    let mut i = 0;
    let num = |i: &mut usize| -> Result<u32> {
        while *i < raw.len() && (raw[*i] == b' ' || raw[*i] == b'\t') {
            *i += 1;
        }
        let start = *i;
        while *i < raw.len() && raw[*i].is_ascii_digit() {
            *i += 1;
        }
        if start == *i {
            return Err(err());
        }
        std::str::from_utf8(&raw[start..*i])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(err)
    };

    let min = num(&mut i)?;
    let max = num(&mut i)?;
    while i < raw.len() && (raw[i] == b' ' || raw[i] == b'\t') {
        i += 1;
    }
    Ok((min, max, &raw[i..]))
}
