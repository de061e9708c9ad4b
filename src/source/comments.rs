//! Comment extraction
//!
//! `syn` keeps doc comments as attributes but throws ordinary comments away,
//! and several disciplines are about exactly those (`// SAFETY:`, `// TODO`).
//! This scanner walks the raw text once, skipping string, raw-string and
//! char literals, and records every comment with its position.

use crate::domain::violations::Location;

/// Line (`//`) or block (`/* */`) comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// A comment found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    /// `///`, `//!`, `/** */` or `/*! */`
    pub is_doc: bool,
    /// Comment body without the delimiters
    pub text: String,
    pub location: Location,
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self { chars: text.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn is_ident_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn previous_is_ident(&self) -> bool {
        self.pos > 0 && Self::is_ident_char(self.chars[self.pos - 1])
    }

    fn line_comment(&mut self) -> Comment {
        let (line, column) = (self.line, self.column);
        self.bump_n(2);

        let is_doc = matches!((self.peek(0), self.peek(1)), (Some('/'), c) if c != Some('/'))
            || self.peek(0) == Some('!');
        if is_doc {
            self.bump();
        }

        let mut text = String::new();
        while let Some(ch) = self.peek(0) {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.bump();
        }
        let text = text.trim_end_matches('\r').to_string();
        let end_column = self.column;

        Comment {
            kind: CommentKind::Line,
            is_doc,
            text,
            location: Location::span(line, column, line, end_column),
        }
    }

    fn block_comment(&mut self) -> Comment {
        let (line, column) = (self.line, self.column);
        self.bump_n(2);

        let is_doc = (self.peek(0) == Some('*') && !matches!(self.peek(1), Some('*') | Some('/')))
            || self.peek(0) == Some('!');
        if is_doc {
            self.bump();
        }

        let mut depth = 1usize;
        let mut text = String::new();
        while let Some(ch) = self.peek(0) {
            if ch == '/' && self.peek(1) == Some('*') {
                depth += 1;
                text.push_str("/*");
                self.bump_n(2);
            } else if ch == '*' && self.peek(1) == Some('/') {
                depth -= 1;
                self.bump_n(2);
                if depth == 0 {
                    break;
                }
                text.push_str("*/");
            } else {
                text.push(ch);
                self.bump();
            }
        }

        Comment {
            kind: CommentKind::Block,
            is_doc,
            text,
            location: Location::span(line, column, self.line, self.column),
        }
    }

    fn skip_string(&mut self) {
        self.bump();
        while let Some(ch) = self.bump() {
            match ch {
                '\\' => {
                    self.bump();
                }
                '"' => break,
                _ => {}
            }
        }
    }

    /// Raw string starting at the current `r`; returns false if this `r` does
    /// not begin one.
    fn try_skip_raw_string(&mut self) -> bool {
        let mut hashes = 0;
        while self.peek(1 + hashes) == Some('#') {
            hashes += 1;
        }
        if self.peek(1 + hashes) != Some('"') {
            return false;
        }
        self.bump_n(2 + hashes);

        while let Some(ch) = self.bump() {
            if ch == '"' && (0..hashes).all(|i| self.peek(i) == Some('#')) {
                self.bump_n(hashes);
                break;
            }
        }
        true
    }

    fn skip_quote(&mut self) {
        // char literal, byte literal body, or lifetime
        if self.peek(1) == Some('\\') {
            self.bump_n(3);
            while let Some(ch) = self.bump() {
                if ch == '\'' {
                    break;
                }
            }
        } else if self.peek(2) == Some('\'') {
            self.bump_n(3);
        } else {
            self.bump();
        }
    }
}

/// Extract every comment in `text`, in source order
pub fn extract_comments(text: &str) -> Vec<Comment> {
    let mut scanner = Scanner::new(text);
    let mut comments = Vec::new();

    while let Some(ch) = scanner.peek(0) {
        match ch {
            '/' if scanner.peek(1) == Some('/') => comments.push(scanner.line_comment()),
            '/' if scanner.peek(1) == Some('*') => comments.push(scanner.block_comment()),
            '"' => scanner.skip_string(),
            '\'' => scanner.skip_quote(),
            'r' if !scanner.previous_is_ident() => {
                if !scanner.try_skip_raw_string() {
                    scanner.bump();
                }
            }
            'b' if !scanner.previous_is_ident() && scanner.peek(1) == Some('r') => {
                scanner.bump();
                if !scanner.try_skip_raw_string() {
                    scanner.bump();
                }
            }
            _ => {
                scanner.bump();
            }
        }
    }

    comments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_doc_comments() {
        let text = "//! crate docs\n/// item docs\n// plain\n//// not doc\nfn f() {}\n";
        let comments = extract_comments(text);

        assert_eq!(comments.len(), 4);
        assert!(comments[0].is_doc);
        assert_eq!(comments[0].text, " crate docs");
        assert!(comments[1].is_doc);
        assert!(!comments[2].is_doc);
        assert_eq!(comments[2].text, " plain");
        assert_eq!(comments[2].location.line, 3);
        assert!(!comments[3].is_doc);
    }

    #[test]
    fn test_block_comments_nest() {
        let text = "fn f() { /* outer /* inner */ still outer */ }\n/** doc */\n/**/";
        let comments = extract_comments(text);

        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].kind, CommentKind::Block);
        assert_eq!(comments[0].text, " outer /* inner */ still outer ");
        assert_eq!(comments[0].location.column, 10);
        assert!(comments[1].is_doc);
        assert!(!comments[2].is_doc);
    }

    #[test]
    fn test_literals_are_not_comments() {
        let text = r###"
let a = "// not a comment";
let b = r#"/* nor "this" */"#;
let c = '/';
let d = '\'';
fn e<'a>(x: &'a str) {} // real
let f = br"//";
"###;
        let comments = extract_comments(text);

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, " real");
        assert_eq!(comments[0].location.line, 6);
    }

    #[test]
    fn test_identifier_ending_in_r_is_not_raw_string() {
        let text = "let bar = 1; // trailing\nlet s = \"x\";";
        let comments = extract_comments(text);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, " trailing");
    }
}
