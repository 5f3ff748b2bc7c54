use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use colored::*;
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diskmap::{Builder, Map, StreamBuilder, DEFAULT_BLOCK_SIZE};

#[derive(Parser, Debug)]
#[command(name = "diskmap", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a diskmap from a file of `key<TAB>value` lines
    #[command(alias = "b")]
    Build {
        input: PathBuf,
        output: PathBuf,

        /// Number of records between sparse index entries
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Write records as they are read; the input must already be sorted by key
        #[arg(short, long)]
        stream: bool,
    },

    /// Get the value stored for a key
    #[command(alias = "g")]
    Get { file: PathBuf, key: String },

    /// List every key in file order
    #[command(alias = "k")]
    Keys { file: PathBuf },

    /// Show record count and index layout
    Info { file: PathBuf },
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            block_size,
            stream,
        } => {
            let (count, bytes) = if stream {
                build_streaming(&input, &output, block_size)?
            } else {
                build_batch(&input, &output, block_size)?
            };
            success(&format!(
                "wrote {count} records ({bytes} bytes) to {}",
                output.display()
            ));
        }
        Command::Get { file, key } => {
            let map = open(&file)?;
            match map.get(&key) {
                Ok(value) => info(&format!("{key} = {}", String::from_utf8_lossy(&value))),
                Err(e) if e.is_not_found() => warn(&format!("key not found: {key}")),
                Err(e) => return Err(e).wrap_err_with(|| format!("failed to get key={key}")),
            }
        }
        Command::Keys { file } => {
            let map = open(&file)?;
            for key in map.keys()? {
                println!("{key}");
            }
        }
        Command::Info { file } => {
            let map = open(&file)?;
            info(&format!("records:    {}", map.len()));
            info(&format!("block size: {}", map.block_size()));
            info(&format!("index:      {} entries", map.footer().index.len()));
        }
    }

    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open(path: &Path) -> Result<Map> {
    Map::open(path).wrap_err_with(|| format!("could not open diskmap {:?}", path))
}

/// Yields `(key, value)` pairs from a tab-separated input file.
fn read_pairs(input: &Path) -> Result<impl Iterator<Item = Result<(String, String)>>> {
    let file = File::open(input)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not open input {:?}", input))?;

    let pairs = BufReader::new(file)
        .lines()
        .enumerate()
        .filter(|(_, line)| !matches!(line, Ok(l) if l.is_empty()))
        .map(|(n, line)| {
            let line = line.into_diagnostic()?;
            let (key, value) = line
                .split_once('\t')
                .ok_or_else(|| miette!("line {}: expected key<TAB>value", n + 1))?;
            Ok((key.to_owned(), value.to_owned()))
        });

    Ok(pairs)
}

fn build_batch(input: &Path, output: &Path, block_size: usize) -> Result<(usize, u64)> {
    let mut builder = Builder::with_block_size(block_size);
    for pair in read_pairs(input)? {
        let (key, value) = pair?;
        builder.add(key, value);
    }

    let bytes = builder
        .write_to_file(output)
        .wrap_err_with(|| format!("failed to write {:?}", output))?;
    Ok((builder.len(), bytes))
}

fn build_streaming(input: &Path, output: &Path, block_size: usize) -> Result<(usize, u64)> {
    let mut stream = StreamBuilder::create_with_block_size(output, block_size)?;
    for pair in read_pairs(input)? {
        let (key, value) = pair?;
        stream.add(&key, value.as_bytes())?;
    }

    let count = stream.len();
    let bytes = stream
        .close()
        .wrap_err_with(|| format!("failed to seal {:?}", output))?;
    Ok((count, bytes))
}

fn success(msg: &str) {
    println!("{} {}", "✔".bright_green().bold(), msg.normal());
}

fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".bright_yellow().bold(), msg.yellow());
}

fn info(msg: &str) {
    println!("{} {}", "➤".bright_cyan().bold(), msg.cyan());
}
