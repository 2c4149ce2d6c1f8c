//! Token types produced by the [`Tokenizer`](crate::Tokenizer).
//!
//! Only the punctuation that matters for module and include detection gets its
//! own kind; everything else collapses into [`TokenKind::Punct`].

use serde::{Deserialize, Serialize};

/// The kind of a lexical token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    /// Identifier or keyword (`export`, `module`, `import`, `include`, ...).
    Identifier,
    /// A preprocessing number (`42`, `0x1F`, `1'000'000`, `1.5e-3`).
    Number,
    /// A string literal including its quotes (`"a.hpp"`, `R"(raw)"`).
    StringLiteral,
    /// A character literal including its quotes (`'a'`).
    CharLiteral,
    /// An angle-bracket header name (`<vector>`), only produced after
    /// `include` or `import`.
    HeaderName,
    /// `#`
    Hash,
    /// `:`
    Colon,
    /// `::`
    Scope,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// Any other single punctuation character.
    Punct,
    /// A string or character literal cut short by the end of its line.
    UnterminatedLiteral,
    /// A block comment or raw string cut short by the end of input. Always the
    /// last token of the stream.
    UnterminatedComment,
}

impl TokenKind {
    /// Returns `true` for the two unterminated kinds.
    pub fn is_unterminated(self) -> bool {
        matches!(
            self,
            TokenKind::UnterminatedLiteral | TokenKind::UnterminatedComment
        )
    }
}

/// A token: its kind, the raw text it spans, and where it starts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    /// The token kind.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: &'a str,
    /// The 1-based line the token starts on.
    pub line: u32,
    /// `true` if this is the first token of a logical line (a line not joined
    /// to the previous one by a trailing backslash).
    pub starts_line: bool,
}

impl Token<'_> {
    /// Returns `true` if this is an identifier with the given text.
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_ident_matches_text_and_kind() {
        let tok = Token {
            kind: TokenKind::Identifier,
            text: "module",
            line: 1,
            starts_line: true,
        };
        assert!(tok.is_ident("module"));
        assert!(!tok.is_ident("import"));

        let lit = Token {
            kind: TokenKind::StringLiteral,
            text: "module",
            line: 1,
            starts_line: false,
        };
        assert!(!lit.is_ident("module"));
    }

    #[test]
    fn unterminated_kinds() {
        assert!(TokenKind::UnterminatedLiteral.is_unterminated());
        assert!(TokenKind::UnterminatedComment.is_unterminated());
        assert!(!TokenKind::StringLiteral.is_unterminated());
    }
}
