// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bloark — a thin CLI front door over the builder, modifier, glimpse,
//! and decompressor pipelines. Every subcommand exits 0 on success and
//! 1 with an `Error: ...` line on the way out.

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{build, decompress, glimpse, modify};

#[derive(Parser)]
#[command(
    name = "bloark",
    version,
    about = "Turn XML edit-history dumps into content-addressable JSONL warehouses"
)]
struct Cli {
    /// Number of concurrent workers
    #[arg(short = 'w', long, global = true, default_value_t = 1)]
    workers: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build warehouses from 7z/bz2 dump archives
    Build(build::BuildArgs),
    /// Replay existing warehouses through a modifier chain
    Modify(modify::ModifyArgs),
    /// Batch-decompress archives or warehouse payloads
    Decompress(decompress::DecompressArgs),
    /// Peek at a random warehouse record and its shape
    Glimpse(glimpse::GlimpseArgs),
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build(args) => build::handle(args, cli.workers).await,
        Commands::Modify(args) => modify::handle(args, cli.workers).await,
        Commands::Decompress(args) => decompress::handle(args, cli.workers).await,
        Commands::Glimpse(args) => glimpse::handle(args, cli.workers),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
