//! Extraction of include, module and import facts from a token stream.
//!
//! Scanning is statement oriented and tolerant: module and import
//! declarations are only recognised at the start of a statement, `#include`
//! only at the start of a logical line, and anything else is skipped. The
//! preprocessor is not evaluated, so includes under `#if 0` are reported too.

use crate::facts::{FileFacts, Import, ImportKind, Include, ModuleDeclaration, Visibility};
use crate::token::{Token, TokenKind};
use crate::tokenizer::{tokenize, Tokenizer};
use abuild_diagnostics::{Diagnostic, DiagnosticCode, Location};
use std::iter::Peekable;
use std::path::Path;
use tracing::trace;

/// The facts of one file plus the diagnostics raised while scanning it.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Includes, imports and the module declaration.
    pub facts: FileFacts,
    /// Warnings for malformed text and errors for conflicting declarations,
    /// located in `path`.
    pub diagnostics: Vec<Diagnostic>,
}

/// Scans the content of one file. `path` is only used to locate diagnostics.
pub fn scan_source(source: &str, path: &Path) -> ScanResult {
    let mut scanner = CodeScanner {
        tokens: tokenize(source).peekable(),
        path,
        result: ScanResult::default(),
    };
    scanner.scan_all();
    trace!(
        path = %path.display(),
        includes = scanner.result.facts.includes.len(),
        imports = scanner.result.facts.imports.len(),
        "scanned file"
    );
    scanner.result
}

struct CodeScanner<'a> {
    tokens: Peekable<Tokenizer<'a>>,
    path: &'a Path,
    result: ScanResult,
}

impl<'a> CodeScanner<'a> {
    fn scan_all(&mut self) {
        let mut at_statement_start = true;
        while let Some(token) = self.tokens.next() {
            match token.kind {
                // Directives are transparent to the statement structure.
                TokenKind::Hash if token.starts_line => self.directive(token.line),
                TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace => {
                    at_statement_start = true;
                }
                TokenKind::UnterminatedLiteral | TokenKind::UnterminatedComment => {
                    self.unterminated(&token);
                    at_statement_start = false;
                }
                TokenKind::Identifier if at_statement_start => {
                    at_statement_start = self.statement(token);
                }
                _ => at_statement_start = false,
            }
        }
    }

    /// Handles an identifier at the start of a statement. Returns whether the
    /// next token starts a new statement.
    fn statement(&mut self, token: Token<'a>) -> bool {
        let exported = token.is_ident("export");
        let keyword = if exported {
            match self
                .tokens
                .next_if(|t| t.is_ident("module") || t.is_ident("import"))
            {
                Some(keyword) => keyword,
                None => return false,
            }
        } else {
            token
        };

        if keyword.is_ident("module") {
            self.module_declaration(keyword.line, exported)
        } else if keyword.is_ident("import") {
            self.import_declaration(keyword.line, exported)
        } else {
            false
        }
    }

    fn module_declaration(&mut self, line: u32, exported: bool) -> bool {
        // Global module fragment: `module;`
        if self.eat(TokenKind::Semicolon) {
            return true;
        }
        // Private module fragment: `module :private;`
        if self.eat(TokenKind::Colon) {
            if self.tokens.next_if(|t| t.is_ident("private")).is_some()
                && self.eat(TokenKind::Semicolon)
            {
                return true;
            }
            self.incomplete(line, "module");
            return false;
        }
        // `module` used as an ordinary identifier.
        if !self.at(TokenKind::Identifier) {
            return false;
        }

        let Some(module) = self.dotted_name() else {
            self.incomplete(line, "module");
            return false;
        };
        let partition = if self.eat(TokenKind::Colon) {
            match self.dotted_name() {
                Some(partition) => Some(partition),
                None => {
                    self.incomplete(line, "module");
                    return false;
                }
            }
        } else {
            None
        };
        if !self.eat(TokenKind::Semicolon) {
            self.incomplete(line, "module");
            return false;
        }

        let visibility = if exported {
            Visibility::Exported
        } else {
            Visibility::Internal
        };
        self.record_declaration(ModuleDeclaration {
            module,
            partition,
            visibility,
            line,
        });
        true
    }

    fn import_declaration(&mut self, line: u32, exported: bool) -> bool {
        let (name, kind) = if self.eat(TokenKind::Colon) {
            match self.dotted_name() {
                Some(name) => (name, ImportKind::Partition),
                None => {
                    self.incomplete(line, "import");
                    return false;
                }
            }
        } else if let Some(header) = self
            .tokens
            .next_if(|t| matches!(t.kind, TokenKind::StringLiteral | TokenKind::HeaderName))
        {
            let is_system = header.kind == TokenKind::HeaderName;
            (strip_delimiters(header.text).to_string(), ImportKind::Header { is_system })
        } else if self.at(TokenKind::Identifier) {
            match self.dotted_name() {
                Some(name) => (name, ImportKind::Module),
                None => {
                    self.incomplete(line, "import");
                    return false;
                }
            }
        } else {
            // `import` used as an ordinary identifier.
            return false;
        };

        if !self.eat(TokenKind::Semicolon) {
            self.incomplete(line, "import");
            return false;
        }
        self.result.facts.imports.push(Import {
            name,
            kind,
            exported,
            line,
        });
        true
    }

    /// Consumes a preprocessor directive up to the end of its logical line,
    /// recording it when it is an `#include`.
    fn directive(&mut self, line: u32) {
        let Some(name) = self.tokens.next_if(|t| !t.starts_line) else {
            return;
        };
        if name.kind == TokenKind::UnterminatedComment {
            self.unterminated(&name);
            return;
        }
        if name.is_ident("include") || name.is_ident("include_next") {
            if let Some(header) = self.tokens.next_if(|t| {
                !t.starts_line && matches!(t.kind, TokenKind::StringLiteral | TokenKind::HeaderName)
            }) {
                self.result.facts.includes.push(Include {
                    header: strip_delimiters(header.text).to_string(),
                    is_system: header.kind == TokenKind::HeaderName,
                    line,
                });
            }
        }
        // Stray quotes are legal in directives such as `#error don't`, so only
        // a comment running off the end of the file is worth reporting here.
        while let Some(token) = self.tokens.next_if(|t| !t.starts_line) {
            if token.kind == TokenKind::UnterminatedComment {
                self.unterminated(&token);
            }
        }
    }

    fn dotted_name(&mut self) -> Option<String> {
        let first = self.tokens.next_if(|t| t.kind == TokenKind::Identifier)?;
        let mut name = first.text.to_string();
        while self.eat(TokenKind::Dot) {
            let part = self.tokens.next_if(|t| t.kind == TokenKind::Identifier)?;
            name.push('.');
            name.push_str(part.text);
        }
        Some(name)
    }

    fn at(&mut self, kind: TokenKind) -> bool {
        self.tokens.peek().is_some_and(|t| t.kind == kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        self.tokens.next_if(|t| t.kind == kind).is_some()
    }

    fn record_declaration(&mut self, declaration: ModuleDeclaration) {
        match &self.result.facts.declaration {
            Some(first) => {
                let message = format!(
                    "module declaration '{}' conflicts with '{}' declared on line {}",
                    qualified_name(&declaration),
                    qualified_name(first),
                    first.line
                );
                self.result.diagnostics.push(
                    Diagnostic::error(DiagnosticCode::CONFLICTING_DECLARATION, message)
                        .at(Location::line(self.path, declaration.line)),
                );
            }
            None => self.result.facts.declaration = Some(declaration),
        }
    }

    fn unterminated(&mut self, token: &Token<'_>) {
        let what = if token.kind == TokenKind::UnterminatedComment {
            "unterminated comment or raw string at end of file"
        } else {
            "unterminated literal"
        };
        self.result.diagnostics.push(
            Diagnostic::warning(DiagnosticCode::UNTERMINATED, what)
                .at(Location::line(self.path, token.line)),
        );
    }

    fn incomplete(&mut self, line: u32, what: &str) {
        self.result.diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::INCOMPLETE_DECLARATION,
                format!("incomplete {what} declaration ignored"),
            )
            .at(Location::line(self.path, line)),
        );
    }
}

fn qualified_name(declaration: &ModuleDeclaration) -> String {
    match &declaration.partition {
        Some(partition) => format!("{}:{}", declaration.module, partition),
        None => declaration.module.clone(),
    }
}

/// Strips the surrounding quotes or angle brackets from a header name.
fn strip_delimiters(text: &str) -> &str {
    let bytes = text.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(b'"'), Some(b'"')) | (Some(b'<'), Some(b'>')) if text.len() >= 2 => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}
