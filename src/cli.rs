//! Command-line surface and the top-level run orchestration.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::info;

use crate::alphabet::{Alphabet, Bytes, Unicode};
use crate::bruteforce::Bruteforce;
use crate::driver::{self, RangeSpec};
use crate::error::{Error, Result};
use crate::generator::MaskGenerator;
use crate::masklist::MaskList;
use crate::registry::Registry;

/// Generate words from templates (masks) describing each position's charset.
#[derive(Debug, Parser)]
#[command(
    name = "maskmill",
    version,
    about = "Generate words from templates (masks) describing each position's charset",
    after_help = "\
Charset references use '?' followed by a one-character name: ?l ?u ?d ?s ?a \
?h ?H ?n ?r (?b without --unicode). '??' is a literal '?'. Custom names are \
bound with -1..-4, -c, or inline on mask file lines as \
'CHARSET1,...,MASK'."
)]
pub struct Cli {
    /// Iterate through a single mask or a list of masks read from a file [default]
    #[arg(short = 'm', long = "mask", conflicts_with = "bruteforce")]
    pub mask: bool,

    /// Generate the masks from a file describing the word width and
    /// occurrence ranges per charset
    #[arg(short = 'B', long = "bruteforce")]
    pub bruteforce: bool,

    /// Allow UTF-8 in charsets; disables the '?b' built-in
    #[arg(short = 'u', long = "unicode")]
    pub unicode: bool,

    /// Divide the generation in N equal parts and produce the J-th (1-based)
    #[arg(short = 'j', long = "job", value_name = "J/N")]
    pub job: Option<String>,

    /// Start the generation at the N-th word, counting from 0
    #[arg(short = 'b', long = "begin", value_name = "N")]
    pub begin: Option<u64>,

    /// Stop after the N-th word, counting from 0
    #[arg(short = 'e', long = "end", value_name = "N")]
    pub end: Option<u64>,

    /// Write the words into FILE instead of standard output
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Use the null character as the word delimiter instead of newline
    #[arg(short = 'z', long = "zero")]
    pub zero: bool,

    /// Don't use a word delimiter
    #[arg(short = 'n', long = "no-delim")]
    pub no_delim: bool,

    /// Show the number of words that would be generated and exit
    #[arg(short = 's', long = "size")]
    pub size: bool,

    /// Define the custom charset '1' (inline content or a file to read)
    #[arg(short = '1', long = "custom-charset1", value_name = "CS")]
    pub custom1: Option<String>,

    /// Define the custom charset '2'
    #[arg(short = '2', long = "custom-charset2", value_name = "CS")]
    pub custom2: Option<String>,

    /// Define the custom charset '3'
    #[arg(short = '3', long = "custom-charset3", value_name = "CS")]
    pub custom3: Option<String>,

    /// Define the custom charset '4'
    #[arg(short = '4', long = "custom-charset4", value_name = "CS")]
    pub custom4: Option<String>,

    /// Define a charset named K: 'K:content' or 'K:file'
    #[arg(short = 'c', long = "charset", value_name = "K:CS", action = ArgAction::Append)]
    pub charsets: Vec<String>,

    /// A mask, a mask file, or (with --bruteforce) a constraints file
    pub spec: String,
}

/// Run a fully parsed command. Words (or the `--size` count) that are not
/// redirected with `-o` go to `stdout`.
pub fn execute<W: Write>(cli: &Cli, stdout: &mut W) -> Result<()> {
    let range = RangeSpec {
        job: cli.job.as_deref().map(parse_job).transpose()?,
        begin: cli.begin,
        end: cli.end,
    };
    if cli.unicode {
        run::<Unicode, W>(cli, range, stdout)
    } else {
        run::<Bytes, W>(cli, range, stdout)
    }
}

fn run<A: Alphabet, W: Write>(cli: &Cli, range: RangeSpec, stdout: &mut W) -> Result<()> {
    let mut registry = Registry::<A>::with_builtins();
    registry.expand_all()?;

    let numbered = [
        (b'1', &cli.custom1),
        (b'2', &cli.custom2),
        (b'3', &cli.custom3),
        (b'4', &cli.custom4),
    ];
    for (name, spec) in numbered {
        if let Some(spec) = spec {
            let body = read_charset_value::<A>(spec)?;
            let name = A::ascii(name);
            registry.define(name, body, false);
            registry.expand(name)?;
        }
    }
    for spec in &cli.charsets {
        let (name, body) = parse_charset_binding::<A>(spec)?;
        registry.define(name, body, false);
        registry.expand(name)?;
    }

    let delim: Option<A::Cp> = if cli.no_delim {
        None
    } else if cli.zero {
        Some(A::ascii(0))
    } else {
        Some(A::ascii(b'\n'))
    };

    info!("{} mode, spec '{}'", A::NAME, cli.spec);
    if cli.bruteforce {
        let gen = Bruteforce::<A>::open(&cli.spec, &registry)?;
        finish(cli, range, gen, delim, stdout)
    } else {
        let gen = MaskList::<A>::open(&cli.spec, registry)?;
        finish(cli, range, gen, delim, stdout)
    }
}

fn finish<A: Alphabet, G: MaskGenerator<A>, W: Write>(
    cli: &Cli,
    range: RangeSpec,
    mut gen: G,
    delim: Option<A::Cp>,
    stdout: &mut W,
) -> Result<()> {
    let plan = driver::prepare(&mut gen, &range)?;

    if cli.size {
        writeln!(stdout, "{}", plan.count).map_err(Error::Output)?;
        return Ok(());
    }

    match &cli.output {
        Some(path) => {
            // created only now, after all parsing and counting succeeded, so
            // a diagnosed run never truncates an existing output file
            let file = File::create(path).map_err(|e| Error::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let mut out = BufWriter::new(file);
            driver::emit(&mut gen, &plan, delim, &mut out)?;
            out.flush().map_err(Error::Output)
        }
        None => {
            driver::emit(&mut gen, &plan, delim, stdout)?;
            stdout.flush().map_err(Error::Output)
        }
    }
}

/// Read a `-1..-4`/`-c` charset value: the content of the named file if the
/// value is a path to a regular file (trailing newlines included), the
/// value itself otherwise.
fn read_charset_value<A: Alphabet>(spec: &str) -> Result<Vec<A::Cp>> {
    let is_file = std::fs::metadata(spec)
        .map(|m| m.is_file())
        .unwrap_or(false);
    let body = if is_file {
        let bytes = std::fs::read(spec).map_err(|e| Error::Io {
            path: spec.to_string(),
            source: e,
        })?;
        A::decode(&bytes, &format!("the charset file '{spec}'"))?
    } else {
        A::decode(spec.as_bytes(), &format!("the charset '{spec}'"))?
    };
    if body.is_empty() {
        return Err(Error::EmptyCharset {
            name: spec.to_string(),
        });
    }
    Ok(body)
}

/// Parse a `-c K:VAL` binding. The key is one codepoint (one byte, or one
/// UTF-8 scalar with `--unicode`) followed by an ASCII colon.
fn parse_charset_binding<A: Alphabet>(spec: &str) -> Result<(A::Cp, Vec<A::Cp>)> {
    let bytes = spec.as_bytes();
    let bad = || Error::BadCharsetSpec {
        spec: spec.to_string(),
    };
    let (key, consumed) = A::decode_first(bytes, "the charset key").map_err(|_| bad())?;
    if bytes.get(consumed) != Some(&b':') || consumed + 1 >= bytes.len() {
        return Err(bad());
    }
    Ok((key, read_charset_value::<A>(&spec[consumed + 1..])?))
}

fn parse_job(spec: &str) -> Result<(u64, u64)> {
    let parsed = spec
        .split_once('/')
        .and_then(|(j, n)| Some((j.parse::<u64>().ok()?, n.parse::<u64>().ok()?)));
    match parsed {
        Some((j, n)) if j >= 1 && j <= n => Ok((j, n)),
        _ => Err(Error::BadJobSpec {
            spec: spec.to_string(),
        }),
    }
}
