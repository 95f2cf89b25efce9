// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk warehouse naming contract: `warehouse_NNNNN` bases, paired
//! `.jsonl` payload and `.metadata` sidecar, with `.jsonl.zst` as the
//! post-compression payload extension.

use std::fmt;
use std::path::{Path, PathBuf};

/// A warehouse's zero-padded monotonic index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Base(pub u64);

impl Base {
    pub fn index(self) -> u64 {
        self.0
    }

    pub fn basename(self) -> String {
        format!("warehouse_{:05}", self.0)
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.basename())
    }
}

/// Path of the uncompressed payload file for `base` under `output_dir`.
pub fn payload_path(output_dir: &Path, base: Base) -> PathBuf {
    output_dir.join(format!("{}.jsonl", base.basename()))
}

/// Path of the compressed payload file for `base` under `output_dir`.
pub fn compressed_payload_path(output_dir: &Path, base: Base) -> PathBuf {
    output_dir.join(format!("{}.jsonl.zst", base.basename()))
}

/// Path of the metadata sidecar for `base` under `output_dir`.
pub fn metadata_path(output_dir: &Path, base: Base) -> PathBuf {
    output_dir.join(format!("{}.metadata", base.basename()))
}

#[cfg(test)]
#[path = "warehouse_tests.rs"]
mod tests;
