//! Source positions and the source map that resolves them to line/column.

use crate::error::{SourceMapError, SourceMapResult};
use crate::define_idx;

define_idx!(FileId);

/// A half-open byte range into a single source file, plus the line/column
/// of its start (1-based, matching the lexer's own counters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    /// A sentinel span for synthesized nodes (e.g. the implicit `true`
    /// condition a conditionless `for` desugars to).
    pub const DUMMY: Span = Span { file: FileId(u32::MAX), start: 0, end: 0, line: 0, column: 0 };

    pub fn is_dummy(self) -> bool {
        self.file == FileId(u32::MAX)
    }

    pub fn to(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        Span { file: self.file, start: self.start, end: other.end, line: self.line, column: self.column }
    }
}

struct SourceFile {
    name: String,
    content: String,
    /// Byte offset of the start of each line.
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(name: String, content: String) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { name, content, line_starts }
    }

    fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        (line_idx as u32 + 1, offset - line_start + 1)
    }
}

/// Owns every source file fed into a pipeline run and answers line/column
/// queries for diagnostic rendering and snippet extraction.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        self.files.push(SourceFile::new(name.into(), content.into()));
        FileId((self.files.len() - 1) as u32)
    }

    pub fn file_name(&self, id: FileId) -> SourceMapResult<&str> {
        self.files
            .get(id.0 as usize)
            .map(|f| f.name.as_str())
            .ok_or_else(|| SourceMapError::FileNotFound(format!("{:?}", id)))
    }

    pub fn source(&self, id: FileId) -> SourceMapResult<&str> {
        self.files
            .get(id.0 as usize)
            .map(|f| f.content.as_str())
            .ok_or_else(|| SourceMapError::FileNotFound(format!("{:?}", id)))
    }

    pub fn line_col(&self, id: FileId, offset: u32) -> SourceMapResult<(u32, u32)> {
        let file = self
            .files
            .get(id.0 as usize)
            .ok_or_else(|| SourceMapError::FileNotFound(format!("{:?}", id)))?;
        if offset as usize > file.content.len() {
            return Err(SourceMapError::OffsetOutOfBounds { offset: offset as usize, len: file.content.len() });
        }
        Ok(file.line_col(offset))
    }

    pub fn snippet(&self, span: Span) -> SourceMapResult<&str> {
        let file = self
            .files
            .get(span.file.0 as usize)
            .ok_or_else(|| SourceMapError::FileNotFound(format!("{:?}", span.file)))?;
        file.content
            .get(span.start as usize..span.end as usize)
            .ok_or(SourceMapError::OffsetOutOfBounds { offset: span.end as usize, len: file.content.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_newlines() {
        let mut map = SourceMap::new();
        let id = map.add_file("t.lk", "var x = 1;\nvar y = 2;\n");
        assert_eq!(map.line_col(id, 0).unwrap(), (1, 1));
        assert_eq!(map.line_col(id, 11).unwrap(), (2, 1));
    }

    #[test]
    fn dummy_span_is_recognized() {
        assert!(Span::DUMMY.is_dummy());
    }
}
