// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure text scan for `[[Category:NAME]]` tokens.

use regex::Regex;
use std::sync::OnceLock;

// Allow expect here as the regex is compile-time verified to be valid.
#[allow(clippy::expect_used)]
fn category_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\[\[Category:(.+?)\]\]$").expect("category pattern is valid")
    })
}

/// Find every `[[Category:NAME]]` line in `text` and return the `NAME`s in
/// textual order, duplicates preserved.
pub fn extract_categories(text: &str) -> Vec<String> {
    category_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
