//! Source location tracking for error reporting.
//!
//! # Design
//!
//! - `Span` — compact byte range into a source file, tagged with the
//!   file it came from
//! - `SourceMap` — manages all source files of a compilation and
//!   resolves spans to paths, snippets, and line/col positions
//! - `SourceFile` — a single script with line indexing

use std::fmt;
use std::path::{Path, PathBuf};

/// Compact source location reference.
///
/// Points to a byte range in a source file. Line and column are computed
/// on demand through [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Index into `SourceMap` files
    pub file_id: u16,
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// A zero-length span at the start of a file.
    pub fn zero(file_id: u16) -> Self {
        Self::new(file_id, 0, 0)
    }

    /// Span covering both `self` and `other`.
    ///
    /// # Panics
    /// Panics if the spans come from different files.
    pub fn merge(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot merge spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Collection of all source files in a compilation.
///
/// Provides lookup operations for converting spans into human-readable
/// locations and snippets.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source file and return its id.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    /// Get a source file by id.
    pub fn get(&self, file_id: u16) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    /// Get the source file for a span.
    pub fn file(&self, span: &Span) -> &SourceFile {
        &self.files[span.file_id as usize]
    }

    /// Get the file path for a span.
    pub fn file_path(&self, span: &Span) -> &Path {
        &self.files[span.file_id as usize].path
    }

    /// Get the source snippet for a span.
    pub fn snippet(&self, span: &Span) -> &str {
        self.file(span).snippet(span)
    }

    /// Get the 1-based (line, column) position for a span's start.
    pub fn line_col(&self, span: &Span) -> (u32, u32) {
        self.file(span).line_col(span.start)
    }

    /// Render `path:line:col` for the start of a span.
    pub fn location(&self, span: &Span) -> String {
        let (line, col) = self.line_col(span);
        format!("{}:{}:{}", self.file_path(span).display(), line, col)
    }

    /// The number of files in this map.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// A single source file with line indexing.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path or display name of this script
    pub path: PathBuf,
    /// Original source text
    pub source: String,
    /// Byte offsets of each line start; always begins with 0 and ends
    /// with an EOF sentinel.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// Get 1-based (line, column) for a byte offset.
    ///
    /// Offsets beyond EOF clamp to the last position.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// The source text covered by a span.
    pub fn snippet(&self, span: &Span) -> &str {
        &self.source[span.start as usize..span.end as usize]
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }
    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 10, 20);
        let b = Span::new(0, 15, 30);
        assert_eq!(a.merge(&b), Span::new(0, 10, 30));
    }

    #[test]
    #[should_panic(expected = "cannot merge spans from different files")]
    fn test_span_merge_panics_on_different_files() {
        let a = Span::new(0, 0, 1);
        let b = Span::new(1, 0, 1);
        let _ = a.merge(&b);
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new(PathBuf::from("test.pansql"), "hello\nworld\n".to_string());
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(5), (1, 6));
        assert_eq!(file.line_col(6), (2, 1));
        assert_eq!(file.line_col(11), (2, 6));
    }

    #[test]
    fn test_line_col_clamps_past_eof() {
        let file = SourceFile::new(PathBuf::from("test.pansql"), "abc".to_string());
        assert_eq!(file.line_col(100), (1, 4));
    }

    #[test]
    fn test_source_map_lookup() {
        let mut map = SourceMap::new();
        let first = map.add_file(PathBuf::from("a.pansql"), "sync r to w".to_string());
        let second = map.add_file(PathBuf::from("b.pansql"), "load d 'x'\nabort 'y'".to_string());
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(map.file_count(), 2);

        let span = Span::new(second, 5, 6);
        assert_eq!(map.snippet(&span), "d");
        assert_eq!(map.file_path(&span).to_str(), Some("b.pansql"));
        assert_eq!(map.line_col(&span), (1, 6));
    }

    #[test]
    fn test_source_map_location_names_the_right_file() {
        let mut map = SourceMap::new();
        map.add_file(PathBuf::from("writer.pansql"), "sync r to w".to_string());
        let reader = map.add_file(PathBuf::from("reader.pansql"), "a\nbc".to_string());
        assert_eq!(map.location(&Span::new(reader, 3, 4)), "reader.pansql:2:2");
    }

    #[test]
    fn test_get_by_file_id() {
        let mut map = SourceMap::new();
        let id = map.add_file(PathBuf::from("test.pansql"), "select".to_string());
        assert!(map.get(id).is_some());
        assert!(map.get(7).is_none());
    }
}
