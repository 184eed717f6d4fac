//! Template syntax tree and parser.

use serde_json::Value;

use super::lex::{self, Segment, Spanned, Token};
use super::TemplateError;

/// Functions callable from an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Func {
    /// `field <value> <name>`
    Field,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "field" => Some(Func::Field),
            _ => None,
        }
    }

    pub(super) fn name(self) -> &'static str {
        match self {
            Func::Field => "field",
        }
    }

    fn arity(self) -> usize {
        match self {
            Func::Field => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Operand {
    Dot,
    Chain(Vec<String>),
    Literal(Value),
    Sub(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Command {
    Operand(Operand),
    Call { func: Func, args: Vec<Operand> },
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    Text(String),
    Action { pipeline: Pipeline, offset: usize },
}

/// 1-based line of a byte offset.
pub(super) fn line_of(src: &str, offset: usize) -> usize {
    src.as_bytes()[..offset.min(src.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Parse template source into nodes, applying trim markers.
pub(super) fn parse(name: &str, src: &str) -> Result<Vec<Node>, TemplateError> {
    let segments = lex::scan(src).map_err(|e| TemplateError::Parse {
        name: name.to_string(),
        line: line_of(src, e.offset),
        message: e.message,
    })?;

    let mut nodes: Vec<Node> = Vec::new();
    let mut trim_next = false;

    for segment in segments {
        match segment {
            Segment::Text(text) => {
                let text = if trim_next { text.trim_start() } else { text };
                trim_next = false;
                if !text.is_empty() {
                    nodes.push(Node::Text(text.to_string()));
                }
            }
            Segment::Comment {
                trim_left,
                trim_right,
            } => {
                if trim_left {
                    trim_last_text(&mut nodes);
                }
                trim_next = trim_right;
            }
            Segment::Action {
                tokens,
                offset,
                trim_left,
                trim_right,
            } => {
                if trim_left {
                    trim_last_text(&mut nodes);
                }
                let mut parser = Parser {
                    name,
                    src,
                    tokens,
                    pos: 0,
                    offset,
                };
                let pipeline = parser.pipeline(false)?;
                nodes.push(Node::Action { pipeline, offset });
                trim_next = trim_right;
            }
        }
    }

    Ok(nodes)
}

fn trim_last_text(nodes: &mut Vec<Node>) {
    if let Some(Node::Text(text)) = nodes.last_mut() {
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
        if text.is_empty() {
            nodes.pop();
        }
    }
}

struct Parser<'a> {
    name: &'a str,
    src: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    /// Offset of the enclosing action, used when a token offset is unavailable.
    offset: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Parse {
            name: self.name.to_string(),
            line: line_of(self.src, offset),
            message: message.into(),
        }
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.offset)
    }

    /// `command ('|' command)*`, optionally closed by `)`.
    fn pipeline(&mut self, in_paren: bool) -> Result<Pipeline, TemplateError> {
        let start = self.current_offset();
        let mut commands = Vec::new();

        loop {
            commands.push(self.command()?);
            match self.next() {
                Some(Spanned {
                    token: Token::Pipe, ..
                }) => continue,
                Some(Spanned {
                    token: Token::RParen,
                    ..
                }) if in_paren => break,
                None if !in_paren => break,
                None => return Err(self.error(start, "unclosed left paren")),
                Some(Spanned { offset, .. }) => {
                    return Err(self.error(offset, "unexpected \")\" in operand"))
                }
            }
        }

        for (i, command) in commands.iter().enumerate() {
            match command {
                Command::Call { func, args } => {
                    let got = args.len() + usize::from(i > 0);
                    if got != func.arity() {
                        return Err(TemplateError::Arity {
                            name: self.name.to_string(),
                            function: func.name().to_string(),
                            want: func.arity(),
                            got,
                        });
                    }
                }
                Command::Operand(_) if i > 0 => {
                    return Err(self.error(start, "non-function in pipeline"));
                }
                Command::Operand(_) => {}
            }
        }

        Ok(Pipeline { commands })
    }

    fn command(&mut self) -> Result<Command, TemplateError> {
        if !self.at_operand() {
            return Err(self.error(self.current_offset(), "missing value for command"));
        }

        if let Some(Token::Ident(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            let func = self.function(&name)?;
            let mut args = Vec::new();
            while self.at_operand() {
                args.push(self.operand()?);
            }
            return Ok(Command::Call { func, args });
        }

        let operand = self.operand()?;
        if self.at_operand() {
            return Err(self.error(
                self.current_offset(),
                "can't give argument to non-function",
            ));
        }
        Ok(Command::Operand(operand))
    }

    fn function(&self, name: &str) -> Result<Func, TemplateError> {
        Func::lookup(name).ok_or_else(|| TemplateError::UnknownFunction {
            name: self.name.to_string(),
            function: name.to_string(),
        })
    }

    fn at_operand(&self) -> bool {
        !matches!(self.peek(), None | Some(Token::Pipe) | Some(Token::RParen))
    }

    fn operand(&mut self) -> Result<Operand, TemplateError> {
        let Some(Spanned { token, offset }) = self.next() else {
            return Err(self.error(self.offset, "missing value for command"));
        };
        let operand = match token {
            Token::Dot => Operand::Dot,
            Token::Chain(names) => Operand::Chain(names),
            Token::Str(s) => Operand::Literal(Value::String(s)),
            Token::Number(n) => Operand::Literal(Value::Number(n)),
            Token::Bool(b) => Operand::Literal(Value::Bool(b)),
            Token::Nil => Operand::Literal(Value::Null),
            Token::LParen => Operand::Sub(self.pipeline(true)?),
            Token::Ident(name) => {
                // A bare function name as an argument is a call with no arguments.
                let func = self.function(&name)?;
                return Err(TemplateError::Arity {
                    name: self.name.to_string(),
                    function: func.name().to_string(),
                    want: func.arity(),
                    got: 0,
                });
            }
            Token::Pipe | Token::RParen => {
                return Err(self.error(offset, "missing value for command"));
            }
        };
        Ok(operand)
    }
}
