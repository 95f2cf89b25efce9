// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Modifier pipeline: replays existing warehouses through a
//! user-registered chain of [`ModifierProfile`]s and writes the result into
//! a fresh set of warehouses, segment by segment.
//!
//! A profile may drop a single record (return `None` content) or drop the
//! whole segment (return `None` metadata). Dropping a record only skips
//! that record and moves on to the next one in the segment; dropping a
//! record breaks that record's own profile chain immediately (later
//! profiles never see it), but later records are unaffected. Dropping a
//! segment truncates the new warehouse back to the byte offset it started
//! at, so a mid-segment profile rejection never leaves a partial segment
//! behind.

use crate::error::ModifierError;
use crate::worker_pool::WorkerPool;
use bloark_codecs::{compress_zstd, decompress_zstd};
use bloark_core::{file_size, line_offsets, list_files, read_line_at, Metadata};
use bloark_storage::{
    compressed_payload_path, metadata_path as new_metadata_path, payload_path as new_payload_path,
    Base, WarehouseAllocator,
};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;
const ZSTD_LEVEL: i32 = 3;

/// A single step in a modifier chain. Implemented for `Fn(Value, &Metadata)
/// -> (Option<Value>, Option<Metadata>)` closures, so most callers never
/// need to name a type.
pub trait ModifierProfile: Send + Sync {
    /// Transform one record against the segment metadata accumulated so
    /// far. Returning `None` content drops the record (and ends the
    /// segment); returning `None` metadata drops the whole segment.
    fn block(&self, content: Value, metadata: &Metadata) -> (Option<Value>, Option<Metadata>);
}

impl<F> ModifierProfile for F
where
    F: Fn(Value, &Metadata) -> (Option<Value>, Option<Metadata>) + Send + Sync,
{
    fn block(&self, content: Value, metadata: &Metadata) -> (Option<Value>, Option<Metadata>) {
        self(content, metadata)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModifyReport {
    pub warehouses_processed: usize,
    pub warehouses_sealed: usize,
}

pub struct Modifier {
    output_dir: PathBuf,
    workers: usize,
    max_size: u64,
    compress: bool,
    files: Vec<PathBuf>,
    profiles: Vec<Arc<dyn ModifierProfile>>,
}

impl Modifier {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: 1,
            max_size: DEFAULT_MAX_SIZE,
            compress: true,
            files: Vec::new(),
            profiles: Vec::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Register the next profile in the chain. Profiles run in the order
    /// they were added.
    pub fn add_profile<P>(&mut self, profile: P)
    where
        P: ModifierProfile + 'static,
    {
        self.profiles.push(Arc::new(profile));
    }

    /// Preload a warehouse payload (`*.jsonl.zst`) or a directory of them
    /// to modify. May be called multiple times.
    pub fn preload(&mut self, path: &Path) -> Result<(), ModifierError> {
        if !path.exists() {
            return Err(ModifierError::Filesystem(bloark_core::FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
            }));
        }
        if path.is_dir() {
            self.files.extend(list_files(path, Some(&["zst"]))?);
        } else {
            self.files.push(path.to_path_buf());
        }
        Ok(())
    }

    pub async fn start(&self) -> Result<ModifyReport, ModifierError> {
        if self.files.is_empty() {
            return Err(ModifierError::NoInputFiles);
        }

        bloark_core::prepare_output_dir(&self.output_dir)?;
        let temp_dir = self.output_dir.join("temp");
        fs::create_dir_all(&temp_dir).map_err(|source| bloark_core::FsError::Io {
            path: temp_dir.clone(),
            source,
        })?;

        let ctx = Arc::new(ModifyContext {
            output_dir: self.output_dir.clone(),
            temp_dir: temp_dir.clone(),
            allocator: Arc::new(WarehouseAllocator::new(
                &self.output_dir,
                self.max_size,
                self.compress,
            )),
            compress: self.compress,
            profiles: self.profiles.clone(),
        });

        let mut initial = Vec::new();
        for payload in &self.files {
            let Some(metadata_path) = sibling_metadata_path(payload) else {
                tracing::warn!(payload = %payload.display(), "no matching metadata sidecar, skipped");
                continue;
            };
            if !metadata_path.exists() {
                tracing::warn!(payload = %payload.display(), "no matching metadata sidecar, skipped");
                continue;
            }
            initial.push(ModifyTask::Modify(payload.clone(), metadata_path));
        }
        let warehouses_processed = initial.len();

        let pool = WorkerPool::new(self.workers);
        let run_ctx = Arc::clone(&ctx);
        let run = Arc::new(move |task: ModifyTask| run_modify_task(task, &run_ctx));
        pool.drive(initial, run).await;

        let finalize_tasks: Vec<ModifyTask> = ctx
            .allocator
            .available_bases()
            .into_iter()
            .filter_map(|base| match ctx.allocator.finalize(base) {
                Ok(()) if ctx.compress => {
                    Some(ModifyTask::Cleanup(new_payload_path(&ctx.output_dir, base)))
                }
                Ok(()) => None,
                Err(err) => {
                    tracing::error!(warehouse = %base, error = %err, "finalize failed");
                    None
                }
            })
            .collect();
        let warehouses_sealed = finalize_tasks.len();

        let run_ctx = Arc::clone(&ctx);
        let run = Arc::new(move |task: ModifyTask| run_modify_task(task, &run_ctx));
        pool.drive(finalize_tasks, run).await;

        bloark_core::cleanup_dir(&temp_dir, |path, err| {
            tracing::warn!(path = %path.display(), error = %err, "temp cleanup failed");
        });

        Ok(ModifyReport {
            warehouses_processed,
            warehouses_sealed,
        })
    }
}

/// `warehouse_00007.jsonl.zst` -> `warehouse_00007.metadata`.
fn sibling_metadata_path(payload: &Path) -> Option<PathBuf> {
    let file_name = payload.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(".jsonl.zst")?;
    Some(payload.with_file_name(format!("{stem}.metadata")))
}

struct ModifyContext {
    output_dir: PathBuf,
    temp_dir: PathBuf,
    allocator: Arc<WarehouseAllocator>,
    compress: bool,
    profiles: Vec<Arc<dyn ModifierProfile>>,
}

enum ModifyTask {
    Modify(PathBuf, PathBuf),
    Cleanup(PathBuf),
}

fn run_modify_task(task: ModifyTask, ctx: &ModifyContext) -> Vec<ModifyTask> {
    match task {
        ModifyTask::Modify(payload, metadata) => run_modify(&payload, &metadata, ctx),
        ModifyTask::Cleanup(payload) => run_cleanup(&payload, ctx),
    }
}

fn run_modify(old_payload: &Path, old_metadata: &Path, ctx: &ModifyContext) -> Vec<ModifyTask> {
    let decompressed_path = ctx.temp_dir.join(uuid::Uuid::new_v4().to_string());
    if let Err(err) = decompress_zstd(old_payload, &decompressed_path) {
        tracing::error!(payload = %old_payload.display(), error = %err, "decompression failed");
        return Vec::new();
    }

    let offsets = match line_offsets(old_metadata) {
        Ok(offsets) => offsets,
        Err(err) => {
            tracing::error!(metadata = %old_metadata.display(), error = %err, "failed to index metadata");
            let _ = fs::remove_file(&decompressed_path);
            return Vec::new();
        }
    };

    let mut sealed = Vec::new();
    for offset in offsets {
        match replay_segment(&decompressed_path, old_metadata, offset, ctx) {
            Ok(Some(sealed_path)) => sealed.push(sealed_path),
            Ok(None) => {}
            Err(err) => tracing::error!(error = %err, "segment replay failed"),
        }
    }

    let _ = fs::remove_file(&decompressed_path);
    let _ = fs::remove_file(old_payload);
    let _ = fs::remove_file(old_metadata);
    if let Some(parent) = old_payload.parent() {
        let _ = fs::remove_dir(parent);
    }

    sealed.into_iter().map(ModifyTask::Cleanup).collect()
}

fn replay_segment(
    decompressed_path: &Path,
    old_metadata_path: &Path,
    metadata_offset: u64,
    ctx: &ModifyContext,
) -> Result<Option<PathBuf>, ModifierError> {
    let line = read_line_at(old_metadata_path, metadata_offset)?;
    let old_metadata = Metadata::parse_line(&line)?;

    let base = ctx.allocator.assign()?;

    // `base` must be released no matter how the segment replay below turns
    // out — an early `?` return from the body would otherwise strand it in
    // the allocator's `occupied` set forever, so the fallible work runs in
    // a helper and `release` always runs on the way out.
    let outcome = replay_segment_body(decompressed_path, base, old_metadata, ctx);
    let release_result = ctx.allocator.release(base);
    match outcome {
        Ok(()) => Ok(release_result?),
        Err(err) => {
            if let Err(release_err) = release_result {
                tracing::error!(
                    error = %release_err,
                    warehouse = %base,
                    "failed to release warehouse after segment replay error"
                );
            }
            Err(err)
        }
    }
}

fn replay_segment_body(
    decompressed_path: &Path,
    base: Base,
    old_metadata: Metadata,
    ctx: &ModifyContext,
) -> Result<(), ModifierError> {
    let payload = new_payload_path(&ctx.output_dir, base);
    let byte_start = file_size(&payload)?;

    let mut reader = BufReader::new(File::open(decompressed_path).map_err(|source| {
        bloark_core::FsError::Io {
            path: decompressed_path.to_path_buf(),
            source,
        }
    })?);
    reader
        .seek(SeekFrom::Start(old_metadata.byte_start))
        .map_err(|source| bloark_core::FsError::Io {
            path: decompressed_path.to_path_buf(),
            source,
        })?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&payload)
        .map_err(|source| bloark_core::FsError::Io {
            path: payload.clone(),
            source,
        })?;

    let segment_end = old_metadata.byte_end;
    let mut pos = old_metadata.byte_start;
    let mut current_metadata = old_metadata;
    let mut bytes_written: u64 = 0;
    let mut dropped = false;

    while pos < segment_end {
        let mut raw = Vec::new();
        let n = reader.read_until(b'\n', &mut raw).map_err(|source| bloark_core::FsError::Io {
            path: decompressed_path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        pos += n as u64;
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        if raw.is_empty() {
            continue;
        }

        let Ok(mut content) = serde_json::from_slice::<Value>(&raw) else {
            continue;
        };

        let mut record_dropped = false;
        for profile in &ctx.profiles {
            // A panicking profile is isolated to the record it was handling:
            // the record is dropped and the segment carries on with the next
            // one, rather than the panic unwinding out of this worker task.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                profile.block(content, &current_metadata)
            }));
            let (next_content, next_metadata) = match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic payload".to_string());
                    tracing::error!(
                        panic = %message,
                        article_id = %current_metadata.id,
                        "modifier profile panicked, record dropped"
                    );
                    record_dropped = true;
                    break;
                }
            };
            let Some(next_metadata) = next_metadata else {
                dropped = true;
                break;
            };
            current_metadata = next_metadata;
            match next_content {
                Some(next_content) => content = next_content,
                None => {
                    record_dropped = true;
                    break;
                }
            }
        }
        if dropped {
            break;
        }
        if record_dropped {
            continue;
        }

        let serialized = content.to_string();
        writeln!(file, "{serialized}").map_err(|source| bloark_core::FsError::Io {
            path: payload.clone(),
            source,
        })?;
        bytes_written += serialized.len() as u64 + 1;
    }

    if dropped {
        drop(file);
        let truncator = OpenOptions::new()
            .write(true)
            .open(&payload)
            .map_err(|source| bloark_core::FsError::Io {
                path: payload.clone(),
                source,
            })?;
        truncator.set_len(byte_start).map_err(|source| bloark_core::FsError::Io {
            path: payload.clone(),
            source,
        })?;
        Ok(())
    } else {
        current_metadata.byte_start = byte_start;
        current_metadata.byte_end = byte_start + bytes_written;
        append_metadata_line(&ctx.output_dir, base, &current_metadata)
    }
}

fn append_metadata_line(output_dir: &Path, base: Base, metadata: &Metadata) -> Result<(), ModifierError> {
    let path = new_metadata_path(output_dir, base);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| bloark_core::FsError::Io {
            path: path.clone(),
            source,
        })?;
    writeln!(file, "{}", metadata.to_line()?).map_err(|source| bloark_core::FsError::Io { path, source })?;
    Ok(())
}

fn run_cleanup(payload: &Path, ctx: &ModifyContext) -> Vec<ModifyTask> {
    if !payload.exists() {
        tracing::warn!(payload = %payload.display(), "cleanup skipped: payload missing");
        return Vec::new();
    }
    let base = base_from_payload_path(payload);
    let compressed = base
        .map(|b| compressed_payload_path(&ctx.output_dir, b))
        .unwrap_or_else(|| payload.with_extension("jsonl.zst"));
    match compress_zstd(payload, &compressed, ZSTD_LEVEL) {
        Ok(()) => {
            let _ = fs::remove_file(payload);
            tracing::info!(payload = %payload.display(), "warehouse packed");
        }
        Err(err) => tracing::error!(payload = %payload.display(), error = %err, "compression failed"),
    }
    Vec::new()
}

fn base_from_payload_path(payload: &Path) -> Option<Base> {
    let stem = payload.file_stem()?.to_str()?;
    stem.strip_prefix("warehouse_")?.parse::<u64>().ok().map(Base)
}

#[cfg(test)]
#[path = "modifier_tests.rs"]
mod tests;
