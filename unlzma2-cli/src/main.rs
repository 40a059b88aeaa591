//! test-unlzma2 — exercise the one-shot LZMA2 decoder from the shell.
//!
//! Reads a compressed file (or stdin), decompresses it into a single output
//! buffer, and writes the result to stdout. XZ containers are detected and
//! stripped automatically; `-r`/`-x` pin the input format instead.
//!
//! Exit codes: 0 success, 1 decode or I/O error, 2 bad usage, 3 the decoder
//! reported cursors outside its buffers (which would be a decoder bug).

use clap::{ArgAction, Parser};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use unlzma2::{decompress_into, Status};
use unlzma2_core::UnlzmaError;
use unlzma2_xz::{is_xz, strip, CheckType, RawStream};

#[derive(Parser, Debug)]
#[command(name = "test-unlzma2")]
#[command(version, about = "Decompress an LZMA2 or XZ stream to standard output")]
struct Cli {
    /// Increase verbosity (repeat for more detail)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Treat the input as a raw LZMA2 stream (no container detection)
    #[arg(short = 'r', conflicts_with_all = ["xz", "require_crc"])]
    raw: bool,

    /// Require an XZ container
    #[arg(short = 'x')]
    xz: bool,

    /// Require the container to carry a CRC-32 content check
    #[arg(short = 'c')]
    require_crc: bool,

    /// Output buffer size, with optional K/M/G suffix (default: 4x input size)
    #[arg(short = 'b', value_name = "SIZE", value_parser = parse_size)]
    buffer_size: Option<usize>,

    /// Input file, or "-" for standard input
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

/// Parse a size argument like `65536`, `64K`, `16M` or `1G`.
fn parse_size(arg: &str) -> Result<usize, String> {
    let text = arg.trim();
    let digits = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let number: usize = text[..digits]
        .parse()
        .map_err(|_| format!("invalid size `{arg}`"))?;
    let unit: usize = match text[digits..].trim_start() {
        "" => 1,
        "K" => 1024,
        "M" => 1024 * 1024,
        "G" => 1024 * 1024 * 1024,
        suffix => return Err(format!("unknown size suffix `{suffix}` in `{arg}`")),
    };
    number
        .checked_mul(unit)
        .ok_or_else(|| format!("size argument `{arg}` overflows"))
}

/// Input bytes, either memory-mapped or buffered.
enum InputData {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl InputData {
    fn bytes(&self) -> &[u8] {
        match self {
            InputData::Mapped(map) => map,
            InputData::Buffered(buf) => buf,
        }
    }
}

/// Read the input: regular files are memory-mapped, everything else (stdin,
/// pipes, special files) is read into a growing buffer.
fn read_input(file: Option<&PathBuf>) -> io::Result<InputData> {
    let path = match file {
        Some(path) if path.as_os_str() != "-" => path,
        _ => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            return Ok(InputData::Buffered(buf));
        }
    };
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if metadata.is_file() && metadata.len() > 0 {
        let map = unsafe { Mmap::map(&file)? };
        Ok(InputData::Mapped(map))
    } else {
        let mut buf = Vec::new();
        io::BufReader::new(file).read_to_end(&mut buf)?;
        Ok(InputData::Buffered(buf))
    }
}

fn main() {
    let cli = Cli::parse();
    process::exit(match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("test-unlzma2: {err}");
            1
        }
    });
}

fn run(cli: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let input = read_input(cli.file.as_ref())?;
    let data = input.bytes();
    if data.is_empty() {
        return Err("input is empty".into());
    }

    let buffer_size = match cli.buffer_size {
        Some(size) => size,
        None => data
            .len()
            .checked_mul(4)
            .ok_or("default output buffer size overflows; use -b")?,
    };

    // Container handling: -r skips detection, -x (and -c) demand it, and by
    // default anything that probes as XZ gets stripped.
    let container: Option<RawStream<'_>> = if cli.raw {
        None
    } else if cli.xz || cli.require_crc || is_xz(data) {
        Some(strip(data)?)
    } else {
        None
    };
    if cli.require_crc {
        if let Some(raw) = &container {
            if raw.check_type != CheckType::Crc32 {
                return Err(format!(
                    "container carries a {:?} check, not CRC-32",
                    raw.check_type
                )
                .into());
            }
        }
    }
    let payload = container.as_ref().map_or(data, |raw| raw.payload);

    if cli.verbose > 1 {
        match &container {
            Some(raw) => eprintln!(
                "container: XZ, check type {:?}, {} payload bytes",
                raw.check_type,
                raw.payload.len()
            ),
            None => eprintln!("container: none (raw LZMA2)"),
        }
    }

    let mut output = vec![0u8; buffer_size];
    let outcome = decompress_into(payload, &mut output);

    if cli.verbose > 0 {
        eprintln!(
            "decompress: {:?}, consumed {} of {} input bytes, produced {} of {} output bytes",
            outcome.status,
            outcome.consumed,
            payload.len(),
            outcome.produced,
            buffer_size,
        );
    }

    // A cursor outside its buffer would mean the decoder itself is broken;
    // don't trust the output at all in that case.
    if outcome.consumed > payload.len() || outcome.produced > output.len() {
        eprintln!(
            "test-unlzma2: decoder cursors out of bounds ({} of {} in, {} of {} out)",
            outcome.consumed,
            payload.len(),
            outcome.produced,
            output.len(),
        );
        return Ok(3);
    }

    let produced = &output[..outcome.produced];
    let mut stdout = io::stdout().lock();
    stdout.write_all(produced)?;
    stdout.flush()?;

    match outcome.status {
        Status::Ok => {}
        Status::DataError | Status::NoMemory => {
            return Err(UnlzmaError::corrupted(outcome.consumed, "malformed LZMA2 stream").into())
        }
        Status::InputLimit => return Err(UnlzmaError::truncated(outcome.consumed).into()),
        Status::OutputLimit => {
            return Err(format!(
                "output buffer of {buffer_size} bytes is too small; use -b to raise it"
            )
            .into())
        }
    }

    if let Some(raw) = &container {
        raw.verify(outcome.consumed, produced)?;
    }
    Ok(0)
}
