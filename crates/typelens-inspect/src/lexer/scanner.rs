use typelens_common::{DiagnosticBag, Position, Span};

use super::token::{Token, TokenKind};

/// Low-level character reader tracking line/column/byte-offset.
struct Cursor<'src> {
    chars: std::str::Chars<'src>,
    /// Byte offset of the *next* character to be consumed.
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.offset += ch.len_utf8() as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.position())
    }
}

/// Hand-written lexer for the annotation syntax.
///
/// Supports quoted strings (single or double), `b"..."` bytes literals,
/// signed ints and floats, `...`, and `#` line comments.
pub struct Lexer<'src> {
    source: &'src str,
    cursor: Cursor<'src>,
    diagnostics: DiagnosticBag,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Tokenize the entire input, returning all tokens and diagnostics.
    pub fn tokenize(mut self) -> (Vec<Token>, DiagnosticBag) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        if self.cursor.is_eof() {
            let pos = self.cursor.position();
            return Token::eof(self.cursor.span_from(pos));
        }

        let start = self.cursor.position();
        let ch = self.cursor.advance().unwrap();

        match ch {
            '[' => self.make_token(TokenKind::LeftBracket, start),
            ']' => self.make_token(TokenKind::RightBracket, start),
            ',' => self.make_token(TokenKind::Comma, start),
            ';' => self.make_token(TokenKind::Semicolon, start),
            '=' => self.make_token(TokenKind::Equal, start),
            '|' => self.make_token(TokenKind::Pipe, start),
            '*' => {
                if self.cursor.eat('*') {
                    self.make_token(TokenKind::StarStar, start)
                } else {
                    self.make_token(TokenKind::Star, start)
                }
            }
            '.' => {
                if self.cursor.peek() == Some('.') && self.cursor.peek_second() == Some('.') {
                    self.cursor.advance();
                    self.cursor.advance();
                    self.make_token(TokenKind::Ellipsis, start)
                } else {
                    self.make_token(TokenKind::Dot, start)
                }
            }
            '"' | '\'' => self.scan_string(start, ch, false),
            '-' => {
                if matches!(self.cursor.peek(), Some(c) if c.is_ascii_digit()) {
                    self.scan_number(start)
                } else {
                    self.diagnostics
                        .error("expected a digit after '-'", self.cursor.span_from(start));
                    self.next_token()
                }
            }
            'b' if matches!(self.cursor.peek(), Some('"') | Some('\'')) => {
                let delim = self.cursor.advance().unwrap();
                self.scan_string(start, delim, true)
            }
            c if c.is_ascii_digit() => self.scan_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(start),
            c => {
                self.diagnostics.error(
                    format!("unexpected character '{}'", c),
                    self.cursor.span_from(start),
                );
                self.next_token()
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());
            if self.cursor.peek() == Some('#') {
                self.cursor.eat_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    fn make_token(&self, kind: TokenKind, start: Position) -> Token {
        Token::new(kind, self.lexeme_from(start), self.cursor.span_from(start))
    }

    fn lexeme_from(&self, start: Position) -> &'src str {
        &self.source[start.offset as usize..self.cursor.offset as usize]
    }

    fn scan_number(&mut self, start: Position) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::IntLiteral;
        if self.cursor.peek() == Some('.')
            && matches!(self.cursor.peek_second(), Some(c) if c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }
        self.make_token(kind, start)
    }

    fn scan_identifier(&mut self, start: Position) -> Token {
        self.cursor
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.lexeme_from(start);
        let kind = TokenKind::keyword_from_str(text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, self.cursor.span_from(start))
    }

    fn scan_string(&mut self, start: Position, delimiter: char, is_bytes: bool) -> Token {
        let mut content = String::new();
        loop {
            match self.cursor.advance() {
                Option::None | Some('\n') => {
                    self.diagnostics
                        .error("unterminated string literal", self.cursor.span_from(start));
                    break;
                }
                Some(c) if c == delimiter => break,
                Some('\\') => match self.cursor.advance() {
                    Some('n') => content.push('\n'),
                    Some('t') => content.push('\t'),
                    Some('r') => content.push('\r'),
                    Some('\\') => content.push('\\'),
                    Some('\'') => content.push('\''),
                    Some('"') => content.push('"'),
                    Some(other) => {
                        self.diagnostics.error(
                            format!("unknown escape sequence '\\{}'", other),
                            self.cursor.span_from(start),
                        );
                        content.push(other);
                    }
                    Option::None => {
                        self.diagnostics
                            .error("unterminated string literal", self.cursor.span_from(start));
                        break;
                    }
                },
                Some(c) => content.push(c),
            }
        }
        let kind = if is_bytes {
            TokenKind::BytesLiteral
        } else {
            TokenKind::StringLiteral
        };
        Token::new(kind, content, self.cursor.span_from(start))
    }
}
