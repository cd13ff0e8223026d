//! Protomix CLI
//!
//! Batch mixin expansion over Buf descriptor sets:
//! 1. Run `buf build --as-file-descriptor-set -o descriptor.json`
//! 2. `protomix expand descriptor.json --out .gen/proto`
//!
//! Any load failure, unresolved mixin, or field-number conflict aborts the
//! whole run with a non-zero exit; files already flushed before the failure
//! stay on disk.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use protomix_expand::expand_proto_files;

#[derive(Parser)]
#[command(name = "protomix")]
#[command(author, version, about = "Protomix: static mixin expansion for protobuf schemas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand mixin-bearing messages from descriptor set JSON files into
    /// standalone `.proto` files under the output directory.
    Expand {
        /// Input descriptor set JSON files (`buf build --as-file-descriptor-set`).
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output directory for expanded `.proto` files.
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Expand { files, out } => cmd_expand(&files, &out),
    }
}

fn cmd_expand(files: &[PathBuf], out: &PathBuf) -> Result<()> {
    println!("{} {}", "Expanding mixins".green().bold(), out.display());

    let result = expand_proto_files(files, out).context("mixin expansion failed")?;

    for path in &result.written {
        println!("  {} {}", "→".cyan(), path.display());
    }
    println!(
        "{} {} file(s), {} message(s), {} expanded",
        "Done:".green(),
        result.stats.files,
        result.stats.messages,
        result.stats.expanded
    );
    Ok(())
}
