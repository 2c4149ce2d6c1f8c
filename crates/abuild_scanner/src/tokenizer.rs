//! Lazy lexical analyzer for C++ source text.
//!
//! The [`Tokenizer`] is an [`Iterator`] over [`Token`]s. It skips whitespace,
//! line comments (including backslash-continued ones) and block comments, and
//! treats string, raw string and character literals as single opaque tokens.
//! Angle-bracket header names are only recognised right after `include` or
//! `import`, everywhere else `<` is plain punctuation.
//!
//! Malformed input never loops: a literal cut by a newline becomes an
//! [`TokenKind::UnterminatedLiteral`] token and lexing continues on the next
//! line, while a block comment or raw string cut by the end of input becomes a
//! final [`TokenKind::UnterminatedComment`] token.

use crate::token::{Token, TokenKind};

/// Encoding prefixes that turn a following `"` into a raw string literal.
const RAW_STRING_PREFIXES: [&str; 5] = ["R", "LR", "uR", "UR", "u8R"];

/// Maximum length of a raw string delimiter.
const MAX_RAW_DELIMITER: usize = 16;

/// UTF-8 byte order mark, skipped at the start of a file.
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Starts tokenizing `source`. Each call yields a fresh, independent stream.
pub fn tokenize(source: &str) -> Tokenizer<'_> {
    Tokenizer::new(source)
}

/// A forward-only token stream over one file's content.
pub struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    at_line_start: bool,
    header_name_allowed: bool,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer positioned at the start of `source`, past a
    /// leading byte order mark if there is one.
    pub fn new(source: &'a str) -> Self {
        let pos = if source.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Self {
            source,
            bytes: source.as_bytes(),
            pos,
            line: 1,
            at_line_start: true,
            header_name_allowed: false,
            finished: false,
        }
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    /// Length of a line break (`\n` or `\r\n`) starting at `pos + offset`, or 0.
    fn newline_len_at(&self, offset: usize) -> usize {
        match (self.peek_at(offset), self.peek_at(offset + 1)) {
            (b'\n', _) => 1,
            (b'\r', b'\n') => 2,
            _ => 0,
        }
    }

    /// Skips whitespace and comments. Returns a token only when a block
    /// comment runs into the end of input.
    fn skip_whitespace_and_comments(&mut self) -> Option<Token<'a>> {
        loop {
            if self.pos >= self.bytes.len() {
                return None;
            }
            let b = self.peek();
            if b == b'\n' {
                self.pos += 1;
                self.line += 1;
                self.at_line_start = true;
                continue;
            }
            if b == b'\\' {
                let nl = self.newline_len_at(1);
                if nl > 0 {
                    // Line splice: the next physical line continues this one.
                    self.pos += 1 + nl;
                    self.line += 1;
                    continue;
                }
            }
            if b.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }
            if b == b'/' && self.peek_at(1) == b'/' {
                self.skip_line_comment();
                continue;
            }
            if b == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                let line = self.line;
                self.pos += 2;
                loop {
                    if self.pos >= self.bytes.len() {
                        let source = self.source;
                        return Some(Token {
                            kind: TokenKind::UnterminatedComment,
                            text: &source[start..],
                            line,
                            starts_line: self.at_line_start,
                        });
                    }
                    if self.peek() == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    if self.peek() == b'\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
                continue;
            }
            return None;
        }
    }

    fn skip_line_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.bytes.len() {
            match self.peek() {
                b'\n' => return,
                b'\\' => {
                    let nl = self.newline_len_at(1);
                    if nl > 0 {
                        self.pos += 1 + nl;
                        self.line += 1;
                    } else {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_token(&mut self) -> TokenKind {
        let b = self.peek();

        if b == b'<' && self.header_name_allowed {
            if let Some(kind) = self.lex_header_name() {
                return kind;
            }
        }

        if is_ident_start(b) {
            return self.lex_identifier_or_raw_string();
        }

        if b.is_ascii_digit() || (b == b'.' && self.peek_at(1).is_ascii_digit()) {
            return self.lex_number();
        }

        match b {
            b'"' => self.lex_quoted(b'"', TokenKind::StringLiteral),
            b'\'' => self.lex_quoted(b'\'', TokenKind::CharLiteral),
            b':' if self.peek_at(1) == b':' => {
                self.pos += 2;
                TokenKind::Scope
            }
            _ => {
                self.pos += 1;
                match b {
                    b'#' => TokenKind::Hash,
                    b':' => TokenKind::Colon,
                    b';' => TokenKind::Semicolon,
                    b'.' => TokenKind::Dot,
                    b'{' => TokenKind::LeftBrace,
                    b'}' => TokenKind::RightBrace,
                    _ => TokenKind::Punct,
                }
            }
        }
    }

    /// Lexes `<...>` on the current line. Returns `None` (consuming nothing)
    /// when no closing `>` exists before the end of the line.
    fn lex_header_name(&mut self) -> Option<TokenKind> {
        let rest = &self.bytes[self.pos + 1..];
        for (offset, &b) in rest.iter().enumerate() {
            match b {
                b'>' => {
                    self.pos += offset + 2;
                    return Some(TokenKind::HeaderName);
                }
                b'\n' => return None,
                _ => {}
            }
        }
        None
    }

    fn lex_identifier_or_raw_string(&mut self) -> TokenKind {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_char(self.peek()) {
            self.pos += 1;
        }
        if self.peek() == b'"' && RAW_STRING_PREFIXES.contains(&&self.source[start..self.pos]) {
            return self.lex_raw_string();
        }
        TokenKind::Identifier
    }

    /// Lexes `"delim( ... )delim"` with `pos` on the opening quote.
    fn lex_raw_string(&mut self) -> TokenKind {
        let quote = self.pos;
        self.pos += 1;
        let delim_start = self.pos;
        loop {
            if self.pos >= self.bytes.len() {
                return TokenKind::UnterminatedComment;
            }
            let b = self.peek();
            if b == b'(' {
                break;
            }
            if b.is_ascii_whitespace()
                || matches!(b, b')' | b'\\' | b'"')
                || self.pos - delim_start >= MAX_RAW_DELIMITER
            {
                // Not a valid raw string opener: lex it as an ordinary string.
                self.pos = quote;
                return self.lex_quoted(b'"', TokenKind::StringLiteral);
            }
            self.pos += 1;
        }
        let delimiter = &self.bytes[delim_start..self.pos];
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() {
                return TokenKind::UnterminatedComment;
            }
            let b = self.peek();
            if b == b')' {
                let after = self.pos + 1;
                let close = after + delimiter.len();
                if self.bytes[after..].starts_with(delimiter)
                    && self.bytes.get(close) == Some(&b'"')
                {
                    self.pos = close + 1;
                    return TokenKind::StringLiteral;
                }
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn lex_quoted(&mut self, quote: u8, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() {
                return TokenKind::UnterminatedLiteral;
            }
            let b = self.peek();
            if b == b'\\' {
                let nl = self.newline_len_at(1);
                if nl > 0 {
                    self.line += 1;
                }
                self.pos = (self.pos + 1 + nl.max(1)).min(self.bytes.len());
                continue;
            }
            if b == b'\n' || (b == b'\r' && self.peek_at(1) == b'\n') {
                return TokenKind::UnterminatedLiteral;
            }
            self.pos += 1;
            if b == quote {
                return kind;
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            let b = self.peek();
            let prev = self.bytes[self.pos - 1];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else if b == b'\'' && self.peek_at(1).is_ascii_alphanumeric() {
                // Digit separator, as in 1'000'000.
                self.pos += 1;
            } else if matches!(b, b'+' | b'-') && matches!(prev, b'e' | b'E' | b'p' | b'P') {
                self.pos += 1;
            } else {
                break;
            }
        }
        TokenKind::Number
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.finished {
            return None;
        }
        if let Some(token) = self.skip_whitespace_and_comments() {
            self.finished = true;
            return Some(token);
        }
        if self.pos >= self.bytes.len() {
            self.finished = true;
            return None;
        }

        let start = self.pos;
        let line = self.line;
        let starts_line = std::mem::replace(&mut self.at_line_start, false);
        let kind = self.lex_token();
        let source = self.source;
        let text = &source[start..self.pos];

        self.header_name_allowed = kind == TokenKind::Identifier
            && matches!(text, "include" | "include_next" | "import");
        if kind == TokenKind::UnterminatedComment {
            self.finished = true;
        }

        Some(Token {
            kind,
            text,
            line,
            starts_line,
        })
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<&str> {
        tokenize(source).map(|t| t.text).collect()
    }

    #[test]
    fn empty_source() {
        assert!(kinds("").is_empty());
        assert!(kinds("   \n\t  \n").is_empty());
    }

    #[test]
    fn module_declaration_tokens() {
        assert_eq!(
            kinds("export module Foo:Bar;"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn scope_is_not_a_colon() {
        assert_eq!(
            kinds("std::vector"),
            vec![TokenKind::Identifier, TokenKind::Scope, TokenKind::Identifier]
        );
    }

    #[test]
    fn include_header_names() {
        let toks: Vec<_> = tokenize("#include <vector>\n#include \"a/b.hpp\"").collect();
        assert_eq!(toks[0].kind, TokenKind::Hash);
        assert!(toks[1].is_ident("include"));
        assert_eq!(toks[2].kind, TokenKind::HeaderName);
        assert_eq!(toks[2].text, "<vector>");
        assert_eq!(toks[5].kind, TokenKind::StringLiteral);
        assert_eq!(toks[5].text, "\"a/b.hpp\"");
        assert_eq!(toks[5].line, 2);
    }

    #[test]
    fn less_than_outside_include_is_punct() {
        assert_eq!(
            kinds("a < b > c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Identifier,
                TokenKind::Punct,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let source = "// export module Hidden;\n/* import Gone; */ import Seen;";
        assert_eq!(texts(source), vec!["import", "Seen", ";"]);
    }

    #[test]
    fn line_comment_continuation() {
        let source = "// comment \\\nstill comment\nimport A;";
        assert_eq!(texts(source), vec!["import", "A", ";"]);
    }

    #[test]
    fn string_literals_are_opaque() {
        let source = r##"auto s = "#include <vector> // not a comment";"##;
        let toks: Vec<_> = tokenize(source).collect();
        let strings: Vec<_> = toks
            .iter()
            .filter(|t| t.kind == TokenKind::StringLiteral)
            .collect();
        assert_eq!(strings.len(), 1);
        assert!(!toks.iter().any(|t| t.kind == TokenKind::Hash));
    }

    #[test]
    fn escaped_quote_in_string() {
        let source = r#""a\"b" x"#;
        assert_eq!(texts(source), vec![r#""a\"b""#, "x"]);
    }

    #[test]
    fn char_literals_and_digit_separators() {
        assert_eq!(
            kinds("'a' 1'000'000 '\\''"),
            vec![TokenKind::CharLiteral, TokenKind::Number, TokenKind::CharLiteral]
        );
        assert_eq!(texts("1'000'000"), vec!["1'000'000"]);
    }

    #[test]
    fn numbers_with_exponents() {
        assert_eq!(texts("1.5e-3 0x1F .5"), vec!["1.5e-3", "0x1F", ".5"]);
    }

    #[test]
    fn raw_string_literal() {
        let source = "auto s = R\"x(import Fake; )\" still)x\"; import Real;";
        let toks: Vec<_> = tokenize(source).collect();
        let raw = toks
            .iter()
            .find(|t| t.kind == TokenKind::StringLiteral)
            .unwrap();
        assert_eq!(raw.text, "R\"x(import Fake; )\" still)x\"");
        assert!(toks.iter().any(|t| t.is_ident("Real")));
        assert!(!toks.iter().any(|t| t.is_ident("Fake")));
    }

    #[test]
    fn raw_string_tracks_lines() {
        let source = "R\"(a\nb\nc)\" x";
        let toks: Vec<_> = tokenize(source).collect();
        assert_eq!(toks[1].text, "x");
        assert_eq!(toks[1].line, 3);
    }

    #[test]
    fn line_numbers() {
        let toks: Vec<_> = tokenize("a\n\nb\r\nc").collect();
        let lines: Vec<u32> = toks.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 3, 4]);
    }

    #[test]
    fn starts_line_respects_splices() {
        let toks: Vec<_> = tokenize("#define X \\\n  1\ny").collect();
        let one = toks.iter().find(|t| t.text == "1").unwrap();
        assert!(!one.starts_line);
        assert_eq!(one.line, 2);
        let y = toks.iter().find(|t| t.text == "y").unwrap();
        assert!(y.starts_line);
        assert!(toks[0].starts_line);
    }

    #[test]
    fn unterminated_block_comment_ends_stream() {
        let toks: Vec<_> = tokenize("import A; /* never closed\nimport B;").collect();
        let last = toks.last().unwrap();
        assert_eq!(last.kind, TokenKind::UnterminatedComment);
        assert!(!toks.iter().any(|t| t.is_ident("B")));
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let toks: Vec<_> = tokenize("#error don't\nimport B;").collect();
        assert!(toks.iter().any(|t| t.kind == TokenKind::UnterminatedLiteral));
        assert!(toks.iter().any(|t| t.is_ident("B")));
    }

    #[test]
    fn unterminated_raw_string_ends_stream() {
        let toks: Vec<_> = tokenize("R\"abc(never closed").collect();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::UnterminatedComment);
    }

    #[test]
    fn leading_byte_order_mark_is_skipped() {
        assert_eq!(texts("\u{FEFF}export module A;"), vec!["export", "module", "A", ";"]);
        let toks: Vec<_> = tokenize("\u{FEFF}#include <a>").collect();
        assert_eq!(toks[0].kind, TokenKind::Hash);
        assert!(toks[0].starts_line);
        assert_eq!(toks[0].line, 1);
    }

    #[test]
    fn non_ascii_identifiers() {
        assert_eq!(texts("größe = 1;"), vec!["größe", "=", "1", ";"]);
    }

    #[test]
    fn every_truncation_terminates() {
        let source = concat!(
            "export module A:B;\n#include \"x.h\"\n",
            "auto s = R\"d(raw)d\"; /* c */ 'q' // t\nimport <vector>;",
        );
        for end in 0..=source.len() {
            if !source.is_char_boundary(end) {
                continue;
            }
            let count = tokenize(&source[..end]).count();
            assert!(count <= end);
        }
    }

    #[test]
    fn restart_yields_same_stream() {
        let source = "import A;";
        let first: Vec<_> = tokenize(source).collect();
        let second: Vec<_> = tokenize(source).collect();
        assert_eq!(first, second);
    }
}
