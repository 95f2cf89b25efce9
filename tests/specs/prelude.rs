//! Test helpers for the black-box `bloark` CLI specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// A small single-page, single-revision MediaWiki-shaped XML fixture.
pub const SINGLE_ARTICLE_XML: &str = r#"<mediawiki>
  <page>
    <title>Alpha</title>
    <id>42</id>
    <revision>
      <id>1</id>
      <timestamp>2020-01-01T00:00:00Z</timestamp>
      <text>hello world
[[Category:Greeting]]</text>
    </revision>
  </page>
</mediawiki>"#;

/// A three-page XML fixture, used for size-cap and multi-warehouse specs.
pub const MULTI_ARTICLE_XML: &str = r#"<mediawiki>
  <page><title>A</title><id>1</id>
    <revision><id>1</id><text>a text</text></revision></page>
  <page><title>B</title><id>2</id>
    <revision><id>1</id><text>b text</text></revision></page>
  <page><title>C</title><id>3</id>
    <revision><id>1</id><text>c text</text></revision></page>
</mediawiki>"#;

/// Write `xml` as a bz2-compressed archive at `dst` (the format the
/// builder's `decompress_bz2` stage consumes for single-file archives).
pub fn write_bz2_fixture(dst: &Path, xml: &str) {
    let mut encoder = bzip2::write::BzEncoder::new(
        std::fs::File::create(dst).expect("create bz2 fixture"),
        bzip2::Compression::fast(),
    );
    encoder.write_all(xml.as_bytes()).expect("write bz2 fixture");
    encoder.finish().expect("finish bz2 fixture");
}

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

fn bloark_binary() -> PathBuf {
    binary_path("bloark")
}

/// Create a CLI builder for `bloark` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
}

impl CliBuilder {
    fn new() -> Self {
        Self { args: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(bloark_binary());
        cmd.args(&self.args);
        cmd
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("bloark should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("bloark should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Assert stdout equals `expected` exactly, with a diff on failure.
    /// Prefer this over `stdout_has` when the whole output is pinned down.
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}
