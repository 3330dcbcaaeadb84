use std::fmt::Display;

use miette::{NamedSource, SourceSpan};

use crate::error::{Illegal, ScriptError, named_source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    /// Present exactly when `kind` is [`TokenKind::Number`].
    pub value: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Placeholder held by the parser before it pulls its first token.
    None,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Number,
    EndOfInput,
}

impl<'de> Token<'de> {
    pub(crate) fn none() -> Self {
        Token {
            kind: TokenKind::None,
            literal: "",
            value: None,
        }
    }

    fn end() -> Self {
        Token {
            kind: TokenKind::EndOfInput,
            literal: "",
            value: None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::None => "NONE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Number => "NUMBER",
            TokenKind::EndOfInput => "EOF",
        };
        f.write_str(name)
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.value {
            Some(n) => write!(f, "{} {lit} {n}", self.kind),
            None => write!(f, "{} {lit} null", self.kind),
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Pull-based tokenizer: every [`Lexer::next_token`] call scans exactly one
/// token, and keeps answering [`TokenKind::EndOfInput`] once the source is
/// exhausted.
pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
    fused: bool,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
            fused: false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'de>, ScriptError> {
        loop {
            let mut chars = self.rest.chars();
            let Some(c) = chars.next() else {
                return Ok(Token::end());
            };
            let literal = &self.rest[..c.len_utf8()];
            let cur = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            let process = |kind: TokenKind| {
                Ok(Token {
                    kind,
                    literal,
                    value: None,
                })
            };

            match c {
                '+' => return process(TokenKind::Plus),
                '-' => return process(TokenKind::Minus),
                '*' => return process(TokenKind::Star),
                '/' => return process(TokenKind::Slash),
                '(' => return process(TokenKind::LParen),
                ')' => return process(TokenKind::RParen),
                '0' => return Err(self.illegal(Illegal::LeadingZero, c)),
                c if is_digit(c) => return self.number(cur, c),
                c if is_blank(c) => continue,
                c => return Err(self.illegal(Illegal::Char(c), c)),
            }
        }
    }

    fn number(&mut self, cur: &'de str, first: char) -> Result<Token<'de>, ScriptError> {
        let first_non_digit = cur.find(|c: char| !is_digit(c)).unwrap_or(cur.len());
        let literal = &cur[..first_non_digit];

        let extra_bytes = literal.len() - first.len_utf8();
        self.byte += extra_bytes;
        self.rest = &self.rest[extra_bytes..];

        match literal.parse::<i32>() {
            Ok(n) => Ok(Token {
                kind: TokenKind::Number,
                literal,
                value: Some(n),
            }),
            Err(_) => Err(ScriptError::NumberOverflow {
                literal: literal.to_string(),
                src: self.source(),
                span: SourceSpan::from(self.byte - literal.len()..self.byte),
            }),
        }
    }

    fn illegal(&self, reason: Illegal, c: char) -> ScriptError {
        ScriptError::IllegalCharacter {
            reason,
            src: self.source(),
            span: SourceSpan::from(self.byte - c.len_utf8()..self.byte),
        }
    }

    pub(crate) fn source(&self) -> NamedSource<String> {
        named_source(self.filename, self.whole)
    }

    /// Span of `token`, which must be the last token this lexer produced.
    pub(crate) fn span_of(&self, token: &Token<'de>) -> SourceSpan {
        SourceSpan::from(self.byte - token.literal.len()..self.byte)
    }
}

impl<'de> From<&'de str> for Lexer<'de> {
    fn from(source: &'de str) -> Self {
        Lexer::new(None, source)
    }
}

/// Yields every token before the end of input, and nothing after an error.
impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.next_token() {
            Ok(Token {
                kind: TokenKind::EndOfInput,
                ..
            }) => {
                self.fused = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.fused = true;
                Some(Err(e))
            }
        }
    }
}
