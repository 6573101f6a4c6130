//! Source files, byte ranges, and locations.
//!
//! All positions in a snapshot are byte offsets into immutable file text.
//! Line/column pairs are derived on demand for reporting only; edits and
//! usage sites always work in offsets so that concurrent analysis never
//! depends on line-table state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a source file within one project snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Half-open byte range `[start, end)` into a file's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if `other` lies entirely within this range.
    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the two ranges share at least one byte.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A position in the project: file plus byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: FileId,
    pub range: TextRange,
}

impl Location {
    pub fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }
}

/// One source file held by the snapshot. The text is immutable for the
/// lifetime of the snapshot; committed transactions publish new files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(id: FileId, path: &str, text: &str) -> Self {
        Self {
            id,
            path: path.to_string(),
            text: text.to_string(),
        }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    ///
    /// Columns count bytes from the line start; the reporter is responsible
    /// for display-width adjustments.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let mut line = 1;
        let mut line_start = 0;
        for (idx, byte) in self.text.bytes().enumerate() {
            if idx >= offset {
                break;
            }
            if byte == b'\n' {
                line += 1;
                line_start = idx + 1;
            }
        }
        (line, offset - line_start + 1)
    }

    /// The full text of the line containing `offset`, without the newline.
    pub fn line_text(&self, offset: usize) -> &str {
        let offset = offset.min(self.text.len());
        let start = self.text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = self.text[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(self.text.len());
        &self.text[start..end]
    }

    /// Slice of the file text covered by `range`.
    pub fn slice(&self, range: TextRange) -> &str {
        &self.text[range.start.min(self.text.len())..range.end.min(self.text.len())]
    }
}
