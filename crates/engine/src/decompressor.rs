// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decompressor: a thin standalone batch job that expands N preloaded
//! archives (7z, bz2, or zstd) into a shared output directory, driven by
//! the same worker pool the builder and modifier pipelines use. It has
//! no warehouse-building side effects of its own —
//! `Decompressor{workers}.preload(path).start(output_dir)` just expands
//! archives in place.

use crate::worker_pool::WorkerPool;
use bloark_codecs::{decompress_7z, decompress_bz2, decompress_zstd};
use bloark_core::{list_files, FsError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecompressorError {
    #[error("no input files were preloaded")]
    NoInputFiles,
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
}

pub struct Decompressor {
    workers: usize,
    files: Vec<PathBuf>,
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            workers: 1,
            files: Vec::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Preload an archive or a directory of them (7z/bz2/zst). May be
    /// called multiple times.
    pub fn preload(&mut self, path: &Path) -> Result<(), DecompressorError> {
        if !path.exists() {
            return Err(DecompressorError::Filesystem(FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
            }));
        }
        if path.is_dir() {
            self.files
                .extend(list_files(path, Some(&["7z", "bz2", "zst"]))?);
        } else {
            self.files.push(path.to_path_buf());
        }
        Ok(())
    }

    /// Decompress every preloaded archive into `output_dir`. Returns the
    /// number of archives preloaded; a per-file codec failure is logged
    /// and otherwise skipped rather than aborting the whole batch.
    pub async fn start(&self, output_dir: &Path) -> Result<usize, DecompressorError> {
        if self.files.is_empty() {
            return Err(DecompressorError::NoInputFiles);
        }
        fs::create_dir_all(output_dir).map_err(|source| FsError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let output_dir = output_dir.to_path_buf();
        let run = Arc::new(move |file: PathBuf| -> Vec<PathBuf> {
            decompress_one(&file, &output_dir);
            Vec::new()
        });

        let pool = WorkerPool::new(self.workers);
        pool.drive(self.files.clone(), run).await;

        Ok(self.files.len())
    }
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

fn decompress_one(file: &Path, output_dir: &Path) {
    let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
        tracing::warn!(file = %file.display(), "file has no name, skipped");
        return;
    };
    let extension = file.extension().and_then(|e| e.to_str()).unwrap_or("");
    match extension {
        "7z" => {
            let dst_dir = output_dir.join(file.file_stem().unwrap_or_default());
            if let Err(err) = decompress_7z(file, &dst_dir) {
                tracing::error!(file = %file.display(), error = %err, "7z decompression failed");
            }
        }
        "bz2" => {
            let stem = name.strip_suffix(".bz2").unwrap_or(name);
            let dst_path = output_dir.join(stem);
            if let Err(err) = decompress_bz2(file, &dst_path) {
                tracing::error!(file = %file.display(), error = %err, "bz2 decompression failed");
            }
        }
        "zst" => {
            let stem = name.strip_suffix(".zst").unwrap_or(name);
            let dst_path = output_dir.join(stem);
            if let Err(err) = decompress_zstd(file, &dst_path) {
                tracing::error!(file = %file.display(), error = %err, "zstd decompression failed");
            }
        }
        other => {
            tracing::warn!(file = %file.display(), extension = other, "unsupported archive type, skipped");
        }
    }
}

#[cfg(test)]
#[path = "decompressor_tests.rs"]
mod tests;
