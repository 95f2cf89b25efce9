// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-segment metadata entry shared by the builder and modifier
//! pipelines. Payload records themselves travel as plain
//! `serde_json::Value`s end to end, matching the original implementation's
//! untyped-dict records; only the sidecar entry addressing a segment has a
//! fixed shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when decoding a metadata line.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Addresses the contiguous run of records belonging to one article within
/// one warehouse payload, as a half-open byte range `[byte_start, byte_end)`
/// into the *uncompressed* payload file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_revision: Option<String>,
    pub categories: Vec<String>,
    pub byte_start: u64,
    pub byte_end: u64,
}

impl Metadata {
    /// Number of payload bytes this segment spans.
    pub fn len(&self) -> u64 {
        self.byte_end.saturating_sub(self.byte_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parse_line(line: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn to_line(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
