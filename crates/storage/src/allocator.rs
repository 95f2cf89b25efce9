// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warehouse allocator: assigns concurrent producers to a small pool
//! of append-only output files under a maximum-size contract, and emits
//! sealed payload paths for downstream compression.
//!
//! All state transitions are taken under a single mutex; the mutex is
//! held only across in-memory bookkeeping and file creation/truncation,
//! never across append I/O (writers borrow exclusive access between
//! `assign` and `release`, but the actual appends happen outside the
//! lock).

use crate::warehouse::{payload_path, Base};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("warehouse {0} was already released")]
    DoubleRelease(Base),
    #[error("warehouse {0} is unknown to this allocator")]
    UnknownWarehouse(Base),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct Inner {
    next_index: u64,
    available: BTreeSet<u64>,
    occupied: HashSet<u64>,
}

pub struct WarehouseAllocator {
    output_dir: PathBuf,
    max_size: u64,
    compress: bool,
    inner: parking_lot::Mutex<Inner>,
}

impl WarehouseAllocator {
    pub fn new(output_dir: impl Into<PathBuf>, max_size: u64, compress: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_size,
            compress,
            inner: parking_lot::Mutex::new(Inner {
                next_index: 0,
                available: BTreeSet::new(),
                occupied: HashSet::new(),
            }),
        }
    }

    fn create_warehouse(&self, inner: &mut Inner) -> Result<Base, AllocatorError> {
        let base = Base(inner.next_index);
        inner.next_index += 1;
        truncate_pair(&self.output_dir, base)?;
        inner.available.insert(base.index());
        debug!(warehouse = %base, "created new warehouse");
        Ok(base)
    }

    /// Pick the smallest-index available-and-unoccupied warehouse, or
    /// create a new one. Marks it occupied before returning.
    pub fn assign(&self) -> Result<Base, AllocatorError> {
        let mut inner = self.inner.lock();
        let free = inner
            .available
            .iter()
            .copied()
            .find(|idx| !inner.occupied.contains(idx));
        let base = match free {
            Some(idx) => Base(idx),
            None => self.create_warehouse(&mut inner)?,
        };
        inner.occupied.insert(base.index());
        debug!(warehouse = %base, "assigned warehouse");
        Ok(base)
    }

    /// First-fit-decreasing-by-remaining-capacity packing: each candidate
    /// keeps `max_size - current_size` remaining; every input file goes to
    /// the warehouse with the largest remaining capacity that still
    /// strictly admits it (`remaining >= file_size`), creating a new
    /// warehouse when none do. Inputs assigned to the same warehouse keep
    /// their input order. All chosen warehouses are marked occupied before
    /// this returns.
    // Allow expect here: `idx` above is always either just-inserted via
    // `create_warehouse` or read from `remaining` itself the line before,
    // never a key absent from the map.
    #[allow(clippy::expect_used)]
    pub fn bulk_assign(
        &self,
        files: &[PathBuf],
    ) -> Result<BTreeMap<Base, Vec<PathBuf>>, AllocatorError> {
        let mut inner = self.inner.lock();
        let mut remaining: BTreeMap<u64, u64> = BTreeMap::new();
        for idx in inner.available.iter().copied() {
            if inner.occupied.contains(&idx) {
                continue;
            }
            let size = file_size(&payload_path(&self.output_dir, Base(idx)))?;
            remaining.insert(idx, self.max_size.saturating_sub(size));
        }

        let mut assignments: BTreeMap<Base, Vec<PathBuf>> = BTreeMap::new();
        for file in files {
            let file_size_bytes = file_size(file)?;
            let pick = remaining
                .iter()
                .filter(|(_, cap)| **cap >= file_size_bytes)
                .max_by_key(|(_, cap)| **cap)
                .map(|(idx, _)| *idx);
            let idx = match pick {
                Some(idx) => idx,
                None => {
                    let base = self.create_warehouse(&mut inner)?;
                    remaining.insert(base.index(), self.max_size);
                    base.index()
                }
            };
            *remaining.get_mut(&idx).expect("just inserted or present") -=
                file_size_bytes.min(*remaining.get(&idx).expect("present"));
            assignments
                .entry(Base(idx))
                .or_default()
                .push(file.clone());
        }

        for base in assignments.keys() {
            inner.occupied.insert(base.index());
            debug!(warehouse = %base, "bulk assigned warehouse");
        }
        Ok(assignments)
    }

    /// Release a warehouse held by a writer. If the payload's current
    /// length has crossed `max_size`, it is also sealed (removed from
    /// `available`); when `compress` is set, the sealed payload path is
    /// returned so the caller can schedule compression.
    pub fn release(&self, base: Base) -> Result<Option<PathBuf>, AllocatorError> {
        let mut inner = self.inner.lock();
        if !inner.occupied.remove(&base.index()) {
            error!(warehouse = %base, "double release");
            return Err(AllocatorError::DoubleRelease(base));
        }
        let path = payload_path(&self.output_dir, base);
        let size = file_size(&path)?;
        if size >= self.max_size {
            inner.available.remove(&base.index());
            debug!(warehouse = %base, bytes = size, "sealed warehouse");
            if self.compress {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Force-seal a warehouse, used at end-of-run to flush any still-open
    /// warehouse that never crossed `max_size` on its own.
    pub fn finalize(&self, base: Base) -> Result<(), AllocatorError> {
        let mut inner = self.inner.lock();
        if !inner.available.remove(&base.index()) {
            return Err(AllocatorError::UnknownWarehouse(base));
        }
        debug!(warehouse = %base, "finalized warehouse");
        Ok(())
    }

    /// Bases still open for writers, smallest index first. Used at
    /// end-of-run to force-seal whatever never crossed `max_size` on its
    /// own.
    pub fn available_bases(&self) -> Vec<Base> {
        self.inner
            .lock()
            .available
            .iter()
            .copied()
            .map(Base)
            .collect()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}

fn truncate_pair(output_dir: &Path, base: Base) -> Result<(), AllocatorError> {
    fs::create_dir_all(output_dir).map_err(|source| AllocatorError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    for path in [
        payload_path(output_dir, base),
        crate::warehouse::metadata_path(output_dir, base),
    ] {
        File::create(&path).map_err(|source| AllocatorError::Io {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

fn file_size(path: &Path) -> Result<u64, AllocatorError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(source) => Err(AllocatorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
