//! Tokenizer for override scripts.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Name(String),
    /// Magnitude only; a leading minus is a separate token.
    Int(u64),
    Float(f64),
    Str(String),
    Dot,
    Comma,
    Colon,
    Equals,
    Minus,
    Plus,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Newline,
    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Name(name) => format!("name '{name}'"),
            Self::Int(i) => format!("number {i}"),
            Self::Float(x) => format!("number {x:?}"),
            Self::Str(_) => "string".to_string(),
            Self::Dot => "'.'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Colon => "':'".to_string(),
            Self::Equals => "'='".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Plus => "'+'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::Newline => "end of line".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    depth: usize,
    tokens: Vec<Token>,
}

/// Splits `source` into tokens. Newlines inside brackets are dropped, and
/// consecutive logical newlines are collapsed.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
        depth: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

fn syntax(line: usize, column: usize, message: impl Into<String>) -> Error {
    Error::Syntax {
        line,
        column,
        message: message.into(),
    }
}

impl Lexer<'_> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, line: usize, column: usize) {
        self.tokens.push(Token { kind, line, column });
    }

    fn newline(&mut self, line: usize, column: usize) {
        let last_is_break = self
            .tokens
            .last()
            .map_or(true, |token| token.kind == TokenKind::Newline);
        if !last_is_break {
            self.push(TokenKind::Newline, line, column);
        }
    }

    fn run(&mut self) -> Result<()> {
        while let Some(&c) = self.chars.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                '\n' => {
                    self.bump();
                    if self.depth == 0 {
                        self.newline(line, column);
                    }
                }
                ';' => {
                    self.bump();
                    self.newline(line, column);
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' => {
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.bump();
                    }
                }
                '\\' => {
                    self.bump();
                    if self.bump() != Some('\n') {
                        return Err(syntax(line, column, "unexpected character after line continuation"));
                    }
                }
                '\'' | '"' => {
                    let text = self.string(line, column)?;
                    self.push(TokenKind::Str(text), line, column);
                }
                c if c.is_ascii_digit() => {
                    let kind = self.number(line, column)?;
                    self.push(kind, line, column);
                }
                '.' => {
                    self.bump();
                    if self.chars.peek().is_some_and(char::is_ascii_digit) {
                        let kind = self.fraction(String::from("0."), line, column)?;
                        self.push(kind, line, column);
                    } else {
                        self.push(TokenKind::Dot, line, column);
                    }
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut name = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            name.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    self.push(TokenKind::Name(name), line, column);
                }
                _ => {
                    self.bump();
                    let kind = match c {
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        '=' => TokenKind::Equals,
                        '-' => TokenKind::Minus,
                        '+' => TokenKind::Plus,
                        '(' | '[' | '{' => {
                            self.depth += 1;
                            match c {
                                '(' => TokenKind::LParen,
                                '[' => TokenKind::LBracket,
                                _ => TokenKind::LBrace,
                            }
                        }
                        ')' | ']' | '}' => {
                            self.depth = self.depth.saturating_sub(1);
                            match c {
                                ')' => TokenKind::RParen,
                                ']' => TokenKind::RBracket,
                                _ => TokenKind::RBrace,
                            }
                        }
                        other => {
                            return Err(syntax(line, column, format!("invalid character '{other}'")));
                        }
                    };
                    self.push(kind, line, column);
                }
            }
        }
        if self.depth > 0 {
            return Err(syntax(self.line, self.column, "unexpected end of input inside brackets"));
        }
        let (line, column) = (self.line, self.column);
        self.newline(line, column);
        self.push(TokenKind::Eof, line, column);
        Ok(())
    }

    fn string(&mut self, line: usize, column: usize) -> Result<String> {
        let quote = self.bump().unwrap_or('\'');
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(syntax(line, column, "unterminated string literal"));
            };
            match c {
                c if c == quote => return Ok(text),
                '\n' => return Err(syntax(line, column, "unterminated string literal")),
                '\\' => {
                    let (esc_line, esc_column) = (self.line, self.column);
                    let Some(escaped) = self.bump() else {
                        return Err(syntax(line, column, "unterminated string literal"));
                    };
                    match escaped {
                        'n' => text.push('\n'),
                        't' => text.push('\t'),
                        'r' => text.push('\r'),
                        '0' => text.push('\0'),
                        '\\' => text.push('\\'),
                        '\'' => text.push('\''),
                        '"' => text.push('"'),
                        '\n' => {}
                        'x' => text.push(self.hex_escape(2, esc_line, esc_column)?),
                        'u' => text.push(self.hex_escape(4, esc_line, esc_column)?),
                        'U' => text.push(self.hex_escape(8, esc_line, esc_column)?),
                        other => {
                            text.push('\\');
                            text.push(other);
                        }
                    }
                }
                c => text.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize, line: usize, column: usize) -> Result<char> {
        let mut code = 0_u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| syntax(line, column, "truncated escape sequence"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| syntax(line, column, "invalid escape sequence"))
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else if c == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn number(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let mut text = String::new();
        self.digits(&mut text);
        match self.chars.peek() {
            Some('.') => {
                self.bump();
                text.push('.');
                self.fraction(text, line, column)
            }
            Some('e' | 'E') => self.exponent(text, line, column),
            _ => text
                .parse::<u64>()
                .map(TokenKind::Int)
                .map_err(|_| syntax(line, column, format!("integer literal {text} is too large"))),
        }
    }

    fn fraction(&mut self, mut text: String, line: usize, column: usize) -> Result<TokenKind> {
        self.digits(&mut text);
        if matches!(self.chars.peek(), Some('e' | 'E')) {
            return self.exponent(text, line, column);
        }
        parse_float(&text, line, column)
    }

    fn exponent(&mut self, mut text: String, line: usize, column: usize) -> Result<TokenKind> {
        self.bump();
        text.push('e');
        if let Some(&sign @ ('+' | '-')) = self.chars.peek() {
            text.push(sign);
            self.bump();
        }
        if !self.chars.peek().is_some_and(char::is_ascii_digit) {
            return Err(syntax(line, column, "invalid float literal"));
        }
        self.digits(&mut text);
        parse_float(&text, line, column)
    }
}

fn parse_float(text: &str, line: usize, column: usize) -> Result<TokenKind> {
    text.parse::<f64>()
        .map(TokenKind::Float)
        .map_err(|_| syntax(line, column, format!("invalid float literal {text}")))
}
