use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;

use fmindex::{
    find_seeds, invert, load_sequence, transform_with, BuildOptions, Bwt, FmIndex,
    SequenceFormat, SortStrategy,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Burrows-Wheeler transform and FM-index search", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Input format for sequence files (plain or gzip); detected from the extension if omitted
    #[arg(short, long, global = true)]
    format: Option<SequenceFormat>,

    /// Log construction phases and timings
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Burrows-Wheeler transform of a sequence file
    Transform {
        input: PathBuf,

        /// Rotation sort strategy (naive or doubling)
        #[arg(short, long, default_value = "doubling")]
        strategy: SortStrategy,
    },

    /// Reconstruct the sentinel-terminated text from a transformed sequence file
    Invert { input: PathBuf },

    /// Build an index over a sequence file and write it to disk
    Build {
        input: PathBuf,

        /// Path of the index file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Rotation sort strategy (naive or doubling)
        #[arg(short, long, default_value = "doubling")]
        strategy: SortStrategy,
    },

    /// Count occurrences of each pattern
    Count {
        /// Index file written by `build`
        #[arg(short, long)]
        index: PathBuf,

        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Count and locate occurrences of each pattern
    Locate {
        /// Index file written by `build`
        #[arg(short, long)]
        index: PathBuf,

        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Find exact k-mer seeds of a query sequence
    Seeds {
        /// Index file written by `build`
        #[arg(short, long)]
        index: PathBuf,

        /// Seed length
        #[arg(short, default_value_t = 11)]
        k: usize,

        query: String,
    },
}

fn run(args: Args) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Transform { input, strategy } => {
            let text = load_sequence(&input, args.format)?;
            let bwt = transform_with(&text, strategy)?;
            writeln!(out, "{}", bwt)?;
        }
        Command::Invert { input } => {
            let bwt = Bwt::from_bytes(load_sequence(&input, args.format)?)?;
            out.write_all(&invert(&bwt))?;
            writeln!(out)?;
        }
        Command::Build {
            input,
            output,
            strategy,
        } => {
            let text = load_sequence(&input, args.format)?;
            let index = FmIndex::build_with(&text, &BuildOptions { strategy })?;
            index.save(&output)?;
        }
        Command::Count { index, patterns } => {
            let index = FmIndex::load(&index)?;
            let queries: Vec<Vec<u8>> = patterns.iter().map(|p| p.as_bytes().to_vec()).collect();
            for (pattern, count) in patterns.iter().zip(index.batch_count(&queries)) {
                writeln!(out, "{}", json!({ "pattern": pattern, "count": count }))?;
            }
        }
        Command::Locate { index, patterns } => {
            let index = FmIndex::load(&index)?;
            for pattern in &patterns {
                writeln!(out, "{}", serde_json::to_string(&index.search(pattern.as_bytes()))?)?;
            }
        }
        Command::Seeds { index, k, query } => {
            let index = FmIndex::load(&index)?;
            let seeds = find_seeds(&index, query.as_bytes(), k);
            writeln!(out, "{}", serde_json::to_string(&seeds)?)?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = run(args) {
        log::error!("{:#}", e);
        process::exit(1);
    }
}
