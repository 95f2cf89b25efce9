// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bloark modify` — replay existing warehouses into a fresh set under a
//! (possibly different) size cap. `ModifierProfile`s are Rust closures,
//! so there is no CLI surface to author one; this subcommand registers
//! no profiles and runs the identity chain, which is still useful on
//! its own for repacking or recompressing a warehouse directory at a
//! new `max_size`.

use anyhow::{Context, Result};
use bloark_engine::Modifier;
use clap::Args;
use std::path::PathBuf;

const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Args)]
pub struct ModifyArgs {
    /// Warehouse payload (`*.jsonl.zst`), or directory of them, to replay
    pub input: PathBuf,
    /// Output directory for the rewritten warehouses
    pub output: PathBuf,
    /// Maximum uncompressed warehouse payload size, in bytes, before it
    /// is sealed
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: u64,
}

pub async fn handle(args: ModifyArgs, workers: usize) -> Result<()> {
    let mut modifier = Modifier::new(&args.output)
        .with_workers(workers)
        .with_max_size(args.max_size);
    modifier
        .preload(&args.input)
        .context("preloading input warehouses")?;

    let report = modifier.start().await.context("modify failed")?;
    println!(
        "replayed {} warehouse(s), sealed {} warehouse(s)",
        report.warehouses_processed, report.warehouses_sealed
    );
    Ok(())
}
