//! Scanner splitting template source into text and action segments.

use serde_json::Number;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";

/// A lexical token inside an action.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    /// `.`
    Dot,
    /// `.A.B.C`
    Chain(Vec<String>),
    Ident(String),
    Str(String),
    Number(Number),
    Bool(bool),
    Nil,
    Pipe,
    LParen,
    RParen,
}

/// A token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Segment<'s> {
    Text(&'s str),
    Action {
        tokens: Vec<Spanned>,
        offset: usize,
        trim_left: bool,
        trim_right: bool,
    },
    Comment {
        trim_left: bool,
        trim_right: bool,
    },
}

/// Scan failure: byte offset and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LexError {
    pub offset: usize,
    pub message: String,
}

impl LexError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

/// Split `src` into segments.
pub(super) fn scan(src: &str) -> Result<Vec<Segment<'_>>, LexError> {
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
    };
    let mut segments = Vec::new();

    while lexer.pos < src.len() {
        let Some(found) = src[lexer.pos..].find(LEFT_DELIM) else {
            segments.push(Segment::Text(&src[lexer.pos..]));
            break;
        };
        let start = lexer.pos + found;
        if start > lexer.pos {
            segments.push(Segment::Text(&src[lexer.pos..start]));
        }
        lexer.pos = start + LEFT_DELIM.len();
        segments.push(lexer.action(start)?);
    }

    Ok(segments)
}

impl<'s> Lexer<'s> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Skip whitespace, reporting whether any was skipped.
    fn skip_space(&mut self) -> bool {
        let before = self.pos;
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
        self.pos > before
    }

    /// Consume a closing delimiter if one is next. Returns `Some(trim_right)`.
    fn close(&mut self, after_space: bool) -> Option<bool> {
        if self.rest().starts_with(RIGHT_DELIM) {
            self.pos += RIGHT_DELIM.len();
            return Some(false);
        }
        if after_space && self.rest().starts_with("-}}") {
            self.pos += 1 + RIGHT_DELIM.len();
            return Some(true);
        }
        None
    }

    fn action(&mut self, offset: usize) -> Result<Segment<'s>, LexError> {
        let trim_left = self.peek() == Some(b'-') && self.peek_at(1).is_some_and(is_space);
        if trim_left {
            self.pos += 1;
        }

        let mut after_space = self.skip_space();
        if self.rest().starts_with("/*") {
            return self.comment(offset, trim_left);
        }

        let mut tokens = Vec::new();
        loop {
            if self.pos >= self.src.len() {
                return Err(LexError::new(offset, "unclosed action"));
            }
            if let Some(trim_right) = self.close(after_space) {
                return Ok(Segment::Action {
                    tokens,
                    offset,
                    trim_left,
                    trim_right,
                });
            }
            tokens.push(self.token()?);
            after_space = self.skip_space();
        }
    }

    fn comment(&mut self, offset: usize, trim_left: bool) -> Result<Segment<'s>, LexError> {
        let body = self.pos + 2;
        let Some(end) = self.src[body..].find("*/") else {
            return Err(LexError::new(offset, "unclosed comment"));
        };
        self.pos = body + end + 2;
        let after_space = self.skip_space();
        match self.close(after_space) {
            Some(trim_right) => Ok(Segment::Comment {
                trim_left,
                trim_right,
            }),
            None => Err(LexError::new(
                offset,
                "comment ends before closing delimiter",
            )),
        }
    }

    fn token(&mut self) -> Result<Spanned, LexError> {
        let offset = self.pos;
        let Some(b) = self.peek() else {
            return Err(LexError::new(offset, "unclosed action"));
        };

        let token = match b {
            b'.' => self.chain(),
            b'"' => self.quoted()?,
            b'`' => self.raw()?,
            b'|' => {
                self.pos += 1;
                Token::Pipe
            }
            b'(' => {
                self.pos += 1;
                Token::LParen
            }
            b')' => {
                self.pos += 1;
                Token::RParen
            }
            b'0'..=b'9' => self.number()?,
            b'-' | b'+' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
            _ if self.peek_char().is_some_and(is_ident_start) => match self.ident() {
                "true" => Token::Bool(true),
                "false" => Token::Bool(false),
                "nil" => Token::Nil,
                name => Token::Ident(name.to_string()),
            },
            _ => {
                let c = self.rest().chars().next().unwrap_or('?');
                return Err(LexError::new(
                    offset,
                    format!("unexpected {c:?} in action"),
                ));
            }
        };

        Ok(Spanned { token, offset })
    }

    fn ident(&mut self) -> &'s str {
        let start = self.pos;
        while let Some(c) = self.peek_char().filter(|&c| is_ident_continue(c)) {
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn chain(&mut self) -> Token {
        let mut names = Vec::new();
        while self.peek() == Some(b'.')
            && self.src[self.pos + 1..]
                .chars()
                .next()
                .is_some_and(is_ident_start)
        {
            self.pos += 1;
            names.push(self.ident().to_string());
        }
        if names.is_empty() {
            self.pos += 1;
            Token::Dot
        } else {
            Token::Chain(names)
        }
    }

    fn quoted(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.rest().chars().next() else {
                return Err(LexError::new(start, "unterminated quoted string"));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(Token::Str(out)),
                '\n' => return Err(LexError::new(start, "unterminated quoted string")),
                '\\' => {
                    let escaped = match self.peek() {
                        Some(b'n') => '\n',
                        Some(b't') => '\t',
                        Some(b'r') => '\r',
                        Some(b'\\') => '\\',
                        Some(b'"') => '"',
                        Some(b'\'') => '\'',
                        _ => {
                            return Err(LexError::new(
                                self.pos - 1,
                                "unknown escape sequence in quoted string",
                            ))
                        }
                    };
                    self.pos += 1;
                    out.push(escaped);
                }
                c => out.push(c),
            }
        }
    }

    fn raw(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let body = start + 1;
        let Some(end) = self.src[body..].find('`') else {
            return Err(LexError::new(start, "unterminated raw quoted string"));
        };
        self.pos = body + end + 1;
        Ok(Token::Str(self.src[body..body + end].to_string()))
    }

    fn number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {}
                b'.' | b'e' | b'E' => is_float = true,
                b'-' | b'+' if matches!(self.bytes[self.pos - 1], b'e' | b'E') => {}
                _ => break,
            }
            self.pos += 1;
        }

        let text = &self.src[start..self.pos];
        let bad = || LexError::new(start, format!("bad number syntax: {text:?}"));
        let number = if is_float {
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(bad)?
        } else {
            Number::from(text.parse::<i64>().map_err(|_| bad())?)
        };
        Ok(Token::Number(number))
    }
}
