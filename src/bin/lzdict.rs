use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use lzdict::{decompress, Compressor, HEADER_SIZE};

#[derive(Parser, Debug)]
#[command(name = "lzdict")]
#[command(about = "Dictionary-assisted LZSS compression")]
#[command(version)]
struct Args {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long)]
    output: PathBuf,

    /// Shared dictionary file (both ends must use the same bytes)
    #[arg(short, long)]
    dict: Option<PathBuf>,

    /// Decompress instead of compressing
    #[arg(short = 'x', long)]
    extract: bool,

    /// Never emit a stream larger than the input plus the header
    #[arg(long)]
    bypass_if_larger: bool,

    /// Show statistics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let dict = match &args.dict {
        Some(path) => std::fs::read(path)?,
        None => Vec::new(),
    };
    let input = read_input(&args.input)?;

    let start = Instant::now();
    let output = if args.extract {
        decompress(&input, &dict)?
    } else {
        let mut compressor = Compressor::new(&dict)?;
        compressor.write(&input)?;
        if args.bypass_if_larger && compressor.consider_bypassing() && args.verbose {
            eprintln!("compression was a net loss; stream bypassed");
        }
        compressor.bytes().to_vec()
    };
    let elapsed = start.elapsed();

    write_output(&args.output, &output)?;

    if args.verbose {
        let (action, from, to) = if args.extract {
            ("Decompressed", input.len(), output.len())
        } else {
            ("Compressed", input.len(), output.len())
        };
        eprintln!("{}:", action);
        eprintln!("  Input bytes:   {}", from);
        eprintln!("  Output bytes:  {}", to);
        if !args.extract && to > HEADER_SIZE {
            eprintln!("  Ratio:         {:.3}", from as f64 / to as f64);
        }
        eprintln!("  Time:          {:.2?}", elapsed);
    }

    Ok(())
}

fn read_input(path: &PathBuf) -> io::Result<Vec<u8>> {
    if path.to_str() == Some("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(path)
    }
}

fn write_output(path: &PathBuf, data: &[u8]) -> io::Result<()> {
    if path.to_str() == Some("-") {
        io::stdout().lock().write_all(data)
    } else {
        File::create(path)?.write_all(data)
    }
}
