// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bloark build` — decompress 7z/bz2 dump archives and pack their
//! articles into zstd-compressed warehouses.

use anyhow::{Context, Result};
use bloark_engine::Builder;
use clap::Args;
use std::path::PathBuf;

const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Args)]
pub struct BuildArgs {
    /// Archive file, or directory of archives, to build from
    pub input: PathBuf,
    /// Output directory for warehouses
    pub output: PathBuf,
    /// Maximum uncompressed warehouse payload size, in bytes, before it
    /// is sealed
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: u64,
    /// Leave sealed payloads as plain `.jsonl` instead of zstd-compressing them
    #[arg(long)]
    pub no_compress: bool,
}

pub async fn handle(args: BuildArgs, workers: usize) -> Result<()> {
    let mut builder = Builder::new(&args.output)
        .with_workers(workers)
        .with_max_size(args.max_size)
        .with_compress(!args.no_compress);
    builder
        .preload(&args.input)
        .context("preloading input archives")?;

    let report = builder.build().await.context("build failed")?;
    println!(
        "processed {} archive(s), sealed {} warehouse(s)",
        report.archives_processed, report.warehouses_sealed
    );
    Ok(())
}
