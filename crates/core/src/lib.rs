// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloark-core: shared data model and file utilities for the bloark pipeline.

pub mod category;
pub mod fs_utils;
pub mod record;
pub mod redirect;

pub use category::extract_categories;
pub use fs_utils::{
    cleanup_dir, file_size, line_offsets, list_files, prepare_output_dir, read_line_at, FsError,
};
pub use record::{Metadata, RecordError};
pub use redirect::is_redirect;
