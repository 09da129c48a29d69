//! Line-indexed view over source text
//!
//! Statements are removed from a file by deleting whole inclusive line
//! ranges. Working on line numbers instead of searching for statement text
//! keeps lookalike text inside strings and comments untouched.

use ruff_text_size::{TextRange, TextSize};

/// Inclusive, 1-based range of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; the first entry is always 0
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn from_source(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(offset, _)| offset + 1),
        );
        Self { line_starts }
    }

    /// 1-based line number containing `offset`
    pub fn line_number(&self, offset: TextSize) -> usize {
        let offset = usize::from(offset);
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Lines covered by `range`, both ends inclusive
    pub fn line_span(&self, range: TextRange) -> LineSpan {
        let start = self.line_number(range.start());
        // The end offset is exclusive, so the last covered byte sits one before it
        let last = if range.is_empty() {
            range.start()
        } else {
            range.end() - TextSize::from(1)
        };
        LineSpan::new(start, self.line_number(last))
    }

    /// Rebuild `source` without the lines covered by `spans`.
    ///
    /// Line terminators of kept lines are preserved as-is.
    pub fn remove_lines(&self, source: &str, spans: &[LineSpan]) -> String {
        if spans.is_empty() {
            return source.to_owned();
        }
        source
            .split_inclusive('\n')
            .enumerate()
            .filter(|(index, _)| !spans.iter().any(|span| span.contains(index + 1)))
            .map(|(_, line)| line)
            .collect()
    }
}
