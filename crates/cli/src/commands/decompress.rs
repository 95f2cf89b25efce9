// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bloark decompress` — expand 7z/bz2/zstd archives into plain files,
//! without building warehouses. A standalone utility over
//! [`bloark_engine::Decompressor`].

use anyhow::{Context, Result};
use bloark_engine::Decompressor;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct DecompressArgs {
    /// Archive file, or directory of archives, to decompress
    pub input: PathBuf,
    /// Output directory for the decompressed contents
    pub output: PathBuf,
}

pub async fn handle(args: DecompressArgs, workers: usize) -> Result<()> {
    let mut decompressor = Decompressor::new().with_workers(workers);
    decompressor
        .preload(&args.input)
        .context("preloading input archives")?;

    let count = decompressor
        .start(&args.output)
        .await
        .context("decompress failed")?;
    println!("decompressed {count} archive(s)");
    Ok(())
}
