mod decl;
mod expr;

use std::sync::Arc;

use typelens_common::{DiagnosticBag, Span, TypeAlias, TypeExpr, TypeParam};

use crate::lexer::{Token, TokenKind};
use decl::AliasTable;

/// A parsed annotation input: zero or more `type` alias declarations
/// followed by at most one annotation expression.
#[derive(Debug)]
pub struct Module {
    pub aliases: Vec<Arc<TypeAlias>>,
    pub expr: Option<TypeExpr>,
}

/// Recursive descent parser for the annotation syntax.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: DiagnosticBag,
    aliases: AliasTable,
    /// Type parameters in scope while parsing an alias body or default.
    type_params: Vec<TypeParam>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: DiagnosticBag::new(),
            aliases: AliasTable::default(),
            type_params: Vec::new(),
        }
    }

    /// Parse the entire token stream.
    pub fn parse(mut self) -> (Module, DiagnosticBag) {
        let mut aliases = Vec::new();
        let mut expr = None;

        while !self.is_at_end() {
            if self.peek() == TokenKind::Type {
                match self.parse_alias_decl() {
                    Some(alias) => aliases.push(alias),
                    None => self.synchronize(),
                }
            } else {
                self.type_params.clear();
                match self.parse_expr() {
                    Some(parsed) => {
                        if expr.is_some() {
                            let span = self.current_span();
                            self.diagnostics.error(
                                "only one annotation expression is allowed per input",
                                span,
                            );
                        }
                        expr = Some(parsed);
                        self.eat(TokenKind::Semicolon);
                    }
                    None => self.synchronize(),
                }
            }
        }

        (Module { aliases, expr }, self.diagnostics)
    }

    // ========================================================================
    // Token manipulation helpers
    // ========================================================================

    /// Peek at the current token kind.
    fn peek(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Get the current token.
    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    /// Get the previous token (the one just consumed).
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Advance past the current token and return it.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Consume a token of the expected kind, or report an error.
    fn expect(&mut self, kind: TokenKind) -> Option<&Token> {
        if self.peek() == kind {
            self.advance();
            Some(self.previous())
        } else {
            let span = self.current_span();
            self.diagnostics
                .error(format!("expected {:?}, found {:?}", kind, self.peek()), span);
            None
        }
    }

    /// Consume if the current token matches, otherwise do nothing.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek() == TokenKind::Eof
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    /// Error recovery: skip tokens until the next declaration or expression
    /// boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            if self.peek() == TokenKind::Type {
                return;
            }
            self.advance();
        }
    }
}
