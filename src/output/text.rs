//! Plain-text reporter.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::DuplicateSet;
use crate::pool::lock;
use crate::scanner::ExclusionSet;

/// Number of hex digits of the content digest shown in set headers.
const DIGEST_PREFIX: usize = 16;

/// Pending lines for one duplicate set.
///
/// Built up by a single worker and handed to [`Reporter::flush`], which
/// writes it without interleaving.
#[derive(Debug, Default)]
pub struct SetBlock {
    lines: Vec<String>,
}

impl SetBlock {
    /// Pending lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Writes the result stream.
pub struct Reporter {
    root: PathBuf,
    color: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("root", &self.root)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Create a reporter writing to `out`. Paths are shown relative to `root`.
    #[must_use]
    pub fn new(root: &Path, out: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            color,
            out: Mutex::new(out),
        }
    }

    /// Create a reporter on standard output.
    #[must_use]
    pub fn stdout(root: &Path, color: bool) -> Self {
        Self::new(root, Box::new(io::stdout()), color)
    }

    /// Display form of a path: relative to the root when it lies beneath it.
    #[must_use]
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn paint(&self, text: String, style: fn(&String) -> yansi::Painted<&String>) -> String {
        if self.color {
            style(&text).to_string()
        } else {
            text
        }
    }

    /// Start a block with the set header, keeper and targets.
    ///
    /// Members in `protected` are listed as `protected:` instead of `delete:`.
    #[must_use]
    pub fn open_block(&self, set: &DuplicateSet, protected: &ExclusionSet) -> SetBlock {
        let digest = set.digest_hex();
        let header = format!(
            "[{} files | {} | {}]",
            set.len(),
            ByteSize::b(set.size()),
            &digest[..DIGEST_PREFIX.min(digest.len())]
        );
        let mut block = SetBlock::default();
        block.lines.push(self.paint(header, |s| s.bold()));
        block.lines.push(self.paint(
            format!("  keep: {}", self.relative(set.keeper())),
            |s| s.green(),
        ));
        for target in set.removals() {
            let verb = if protected.contains(target) {
                "protected"
            } else {
                "delete"
            };
            block
                .lines
                .push(format!("  {verb}: {}", self.relative(target)));
        }
        block
    }

    /// Record a successful removal.
    pub fn deleted(&self, block: &mut SetBlock, path: &Path) {
        let line = format!("  deleted: {}", self.relative(path));
        block.lines.push(self.paint(line, |s| s.red()));
    }

    /// Record a removal that `--dry-run` suppressed.
    pub fn would_delete(&self, block: &mut SetBlock, path: &Path) {
        let line = format!("  would delete: {}", self.relative(path));
        block.lines.push(self.paint(line, |s| s.dim()));
    }

    /// Record a failed removal.
    pub fn failed(&self, block: &mut SetBlock, path: &Path, reason: &str) {
        let line = format!("  failed: {}: {}", self.relative(path), reason);
        block.lines.push(self.paint(line, |s| s.yellow()));
    }

    /// Record that the set was left untouched.
    pub fn skipped(&self, block: &mut SetBlock, reason: &str) {
        let line = format!("  skipped: {reason}");
        block.lines.push(self.paint(line, |s| s.yellow()));
    }

    /// Write and clear the pending lines of a block.
    pub fn flush(&self, block: &mut SetBlock) {
        if block.lines.is_empty() {
            return;
        }
        let mut out = lock(&self.out);
        let result = block
            .lines
            .drain(..)
            .try_for_each(|line| writeln!(out, "{line}"))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            log::warn!("Failed to write report: {}", e);
        }
    }

    /// Write a single line.
    pub fn line(&self, text: &str) {
        let mut out = lock(&self.out);
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            log::warn!("Failed to write report: {}", e);
        }
    }
}

/// In-memory sink, cloneable so a test can read what a reporter wrote.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.inner)).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
