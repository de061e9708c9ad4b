//! Source model builder
//!
//! Turns raw text into a `SourceUnit`: the `syn` syntax tree plus what the
//! tree loses (ordinary comments, exact line text). Parsing is a pure
//! function of its input; a `SourceUnit` belongs to one analysis pass.

pub mod comments;

use crate::domain::violations::{Location, SyntaxError};
use proc_macro2::Span;
use std::ops::Range;
use std::path::{Path, PathBuf};

pub use comments::{Comment, CommentKind};

/// One parsed source file
#[derive(Debug)]
pub struct SourceUnit {
    path: PathBuf,
    text: String,
    syntax: syn::File,
    comments: Vec<Comment>,
    line_ranges: Vec<Range<usize>>,
}

impl SourceUnit {
    /// Parse `text` as a Rust source file
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self, SyntaxError> {
        let path = path.into();
        let text = text.into();

        let syntax = syn::parse_file(&text).map_err(|e| {
            let start = e.span().start();
            SyntaxError {
                path: path.clone(),
                line: start.line.max(1) as u32,
                column: start.column as u32 + 1,
                message: e.to_string(),
            }
        })?;

        let comments = comments::extract_comments(&text);
        let line_ranges = line_ranges(&text);

        tracing::debug!(
            "Parsed {}: {} items, {} comments, {} lines",
            path.display(),
            syntax.items.len(),
            comments.len(),
            line_ranges.len()
        );

        Ok(Self { path, text, syntax, comments, line_ranges })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed syntax tree
    pub fn syntax(&self) -> &syn::File {
        &self.syntax
    }

    /// All comments in source order
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of lines in the file
    pub fn line_count(&self) -> u32 {
        self.line_ranges.len() as u32
    }

    /// Text of a 1-indexed line, without its line terminator
    pub fn line(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        self.line_ranges.get(index).map(|range| &self.text[range.clone()])
    }

    /// Iterate over `(line_number, text)` pairs
    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.line_ranges
            .iter()
            .enumerate()
            .map(|(i, range)| (i as u32 + 1, &self.text[range.clone()]))
    }

    /// Convert a token span into a 1-indexed location
    pub fn location_of(&self, span: Span) -> Location {
        let start = span.start();
        let end = span.end();
        Location::span(
            start.line as u32,
            start.column as u32 + 1,
            end.line as u32,
            end.column as u32 + 1,
        )
    }

    /// Whether a location points inside this file
    pub fn contains(&self, location: &Location) -> bool {
        let last_line = self.line_count().max(1);
        location.line >= 1
            && location.column >= 1
            && location.line <= last_line
            && location.end_line >= location.line
            && location.end_line <= last_line
    }

    /// Comments that start on a line within `lines` (inclusive)
    pub fn comments_between(&self, first: u32, last: u32) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .filter(move |c| c.location.line >= first && c.location.line <= last)
    }

    /// Trimmed text of the line a location starts on
    pub fn context_for(&self, location: &Location) -> Option<String> {
        self.line(location.line).map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
    }
}

fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for segment in text.split_inclusive('\n') {
        let mut end = start + segment.len();
        let full_end = end;
        if segment.ends_with('\n') {
            end -= 1;
            if text[start..end].ends_with('\r') {
                end -= 1;
            }
        }
        ranges.push(start..end);
        start = full_end;
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let unit = SourceUnit::parse("lib.rs", "// hello\nfn main() {\n    let x = 1;\n}\n").unwrap();

        assert_eq!(unit.path(), Path::new("lib.rs"));
        assert_eq!(unit.syntax().items.len(), 1);
        assert_eq!(unit.line_count(), 4);
        assert_eq!(unit.line(3), Some("    let x = 1;"));
        assert_eq!(unit.line(0), None);
        assert_eq!(unit.line(5), None);
        assert_eq!(unit.comments().len(), 1);
    }

    #[test]
    fn test_empty_file() {
        let unit = SourceUnit::parse("empty.rs", "").unwrap();
        assert!(unit.syntax().items.is_empty());
        assert_eq!(unit.line_count(), 0);
        assert!(unit.contains(&Location::point(1, 1)));
    }

    #[test]
    fn test_syntax_error_carries_location() {
        let err = SourceUnit::parse("bad.rs", "fn main() {\n    let x = ;\n}\n").unwrap_err();

        assert_eq!(err.path, PathBuf::from("bad.rs"));
        assert_eq!(err.line, 2);
        assert!(err.column > 1);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_location_of_span() {
        let unit = SourceUnit::parse("a.rs", "\n\n    fn spaced() {}\n").unwrap();
        let syn::Item::Fn(func) = &unit.syntax().items[0] else {
            panic!("expected a function");
        };
        let location = unit.location_of(func.sig.ident.span());

        assert_eq!(location.line, 3);
        assert_eq!(location.column, 8);
        assert_eq!(unit.context_for(&location).as_deref(), Some("fn spaced() {}"));
    }

    #[test]
    fn test_crlf_lines() {
        let unit = SourceUnit::parse("a.rs", "fn a() {}\r\nfn b() {}\r\n").unwrap();
        assert_eq!(unit.line(1), Some("fn a() {}"));
        assert_eq!(unit.line(2), Some("fn b() {}"));
    }

    #[test]
    fn test_contains_rejects_out_of_range() {
        let unit = SourceUnit::parse("a.rs", "fn a() {}\n").unwrap();
        assert!(unit.contains(&Location::point(1, 4)));
        assert!(!unit.contains(&Location::point(0, 1)));
        assert!(!unit.contains(&Location::point(2, 1)));
    }
}
