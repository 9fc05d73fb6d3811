//! Line-level diff computation for text content
//!
//! This module classifies every line of two texts as unchanged, added or
//! removed, based on the Longest Common Subsequence (LCS) of their lines.
//!
//! ## Overview
//!
//! Both texts are split into lines and a dynamic programming table of LCS
//! lengths is built over their suffixes. Lines are compared with their
//! terminators, so adding a final newline or switching to CRLF shows up as
//! a change; the terminators are stripped from the reported lines. Walking that table from the top
//! yields the edit script: common lines are matched as early as possible,
//! and where two edit scripts are equally short, removals come before
//! additions. Runs of lines with the same classification are coalesced
//! into a single [`DiffPart`].
//!
//! The algorithm is O(n·m) in time and space on the line counts, which is
//! fine for the source-sized files a repository like this holds.
//!
//! ## Examples
//!
//! ```rust
//! use verx::diff::{diff_lines, DiffKind};
//!
//! let parts = diff_lines("a\nb\nc", "a\nx\nc");
//! let kinds: Vec<DiffKind> = parts.iter().map(|p| p.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![DiffKind::Unchanged, DiffKind::Removed, DiffKind::Added, DiffKind::Unchanged]
//! );
//! assert_eq!(parts[1].text(), "b");
//! ```

use serde::{Deserialize, Serialize};

/// Number of leading bytes inspected by [`is_binary_content`]
const BINARY_SNIFF_LEN: usize = 8192;

/// Classification of a run of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// Present on both sides
    Unchanged,
    /// Only in the new text
    Added,
    /// Only in the old text
    Removed,
}

/// A maximal run of consecutive lines with the same classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPart {
    /// How these lines changed
    pub kind: DiffKind,
    /// The lines, without terminators
    pub lines: Vec<String>,
}

impl DiffPart {
    /// The lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Options controlling line comparison
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Compare lines with leading and trailing whitespace trimmed
    pub ignore_whitespace: bool,
}

/// Line counts for a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Lines only in the new text
    pub lines_added: usize,
    /// Lines only in the old text
    pub lines_removed: usize,
}

impl DiffStats {
    /// Count added and removed lines across `parts`
    pub fn from_parts(parts: &[DiffPart]) -> Self {
        parts.iter().fold(Self::default(), |mut stats, part| {
            match part.kind {
                DiffKind::Added => stats.lines_added += part.lines.len(),
                DiffKind::Removed => stats.lines_removed += part.lines.len(),
                DiffKind::Unchanged => {}
            }
            stats
        })
    }

    /// Whether any line changed
    pub fn has_changes(&self) -> bool {
        self.lines_added > 0 || self.lines_removed > 0
    }
}

/// Compute the line diff from `old_text` to `new_text`
///
/// Equivalent to [`diff_lines_with`] with default options.
pub fn diff_lines(old_text: &str, new_text: &str) -> Vec<DiffPart> {
    diff_lines_with(old_text, new_text, &DiffOptions::default())
}

/// Compute the line diff from `old_text` to `new_text` with explicit options
///
/// The output is deterministic: identical inputs always yield identical
/// parts. Two empty inputs yield no parts. When whitespace is ignored,
/// unchanged lines are reported as they appear in the new text.
pub fn diff_lines_with(old_text: &str, new_text: &str, options: &DiffOptions) -> Vec<DiffPart> {
    let old_lines: Vec<&str> = old_text.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new_text.split_inclusive('\n').collect();

    let mut builder = PartsBuilder::default();

    // Special cases
    if old_lines.is_empty() {
        new_lines.iter().for_each(|line| builder.push(DiffKind::Added, line));
        return builder.finish();
    }
    if new_lines.is_empty() {
        old_lines.iter().for_each(|line| builder.push(DiffKind::Removed, line));
        return builder.finish();
    }

    let table = compute_lcs_table(&old_lines, &new_lines, options.ignore_whitespace);

    let (m, n) = (old_lines.len(), new_lines.len());
    let (mut i, mut j) = (0, 0);
    while i < m && j < n {
        if lines_equal(old_lines[i], new_lines[j], options.ignore_whitespace) {
            builder.push(DiffKind::Unchanged, new_lines[j]);
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            builder.push(DiffKind::Removed, old_lines[i]);
            i += 1;
        } else {
            builder.push(DiffKind::Added, new_lines[j]);
            j += 1;
        }
    }
    old_lines[i..].iter().for_each(|line| builder.push(DiffKind::Removed, line));
    new_lines[j..].iter().for_each(|line| builder.push(DiffKind::Added, line));

    builder.finish()
}

/// Build the suffix LCS table
///
/// `table[i][j]` is the LCS length of `old_lines[i..]` and `new_lines[j..]`.
fn compute_lcs_table(old_lines: &[&str], new_lines: &[&str], ignore_whitespace: bool) -> Vec<Vec<usize>> {
    let m = old_lines.len();
    let n = new_lines.len();

    let mut table = vec![vec![0usize; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            table[i][j] = if lines_equal(old_lines[i], new_lines[j], ignore_whitespace) {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table
}

/// Check if two lines are equal, optionally ignoring whitespace
fn lines_equal(a: &str, b: &str, ignore_whitespace: bool) -> bool {
    if ignore_whitespace {
        a.trim() == b.trim()
    } else {
        a == b
    }
}

/// Accumulates lines into coalesced parts
#[derive(Default)]
struct PartsBuilder {
    parts: Vec<DiffPart>,
}

impl PartsBuilder {
    fn push(&mut self, kind: DiffKind, line: &str) {
        let line = strip_terminator(line);
        match self.parts.last_mut() {
            Some(last) if last.kind == kind => last.lines.push(line.to_string()),
            _ => self.parts.push(DiffPart {
                kind,
                lines: vec![line.to_string()],
            }),
        }
    }

    fn finish(self) -> Vec<DiffPart> {
        self.parts
    }
}

/// Drop a trailing `\n` or `\r\n`
fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(line) => line.strip_suffix('\r').unwrap_or(line),
        None => line,
    }
}

/// Check if content appears to be binary
pub fn is_binary_content(content: &[u8]) -> bool {
    // Simple heuristic: check for null bytes in the first 8KB
    let check_len = content.len().min(BINARY_SNIFF_LEN);
    content[..check_len].contains(&0)
}
