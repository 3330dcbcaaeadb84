use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::lex::TokenKind;

/// Why the lexer refused a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Illegal {
    Char(char),
    LeadingZero,
}

impl Display for Illegal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Illegal::Char(c) => write!(f, "'{}'", c.escape_debug()),
            Illegal::LeadingZero => write!(f, "leading zero"),
        }
    }
}

/// Everything that can stop a script from producing a value.
///
/// Lexing and parsing failures keep the whole source around so they can be
/// rendered as a labelled [`miette::Report`]. Runtime failures happen after
/// the tree is built and only describe the arithmetic that went wrong.
#[derive(Error, Debug, Diagnostic)]
pub enum ScriptError {
    #[error("{}: {}", self.name(), self.description())]
    #[diagnostic(
        code(script::illegal_character),
        help("scripts may only contain digits, `+ - * / ( )`, spaces and tabs; numbers cannot start with `0`")
    )]
    IllegalCharacter {
        reason: Illegal,

        #[source_code]
        src: NamedSource<String>,

        #[label("this character")]
        span: SourceSpan,
    },

    #[error("{}: {}", self.name(), self.description())]
    #[diagnostic(code(script::number_overflow), help("the largest literal is 2147483647"))]
    NumberOverflow {
        literal: String,

        #[source_code]
        src: NamedSource<String>,

        #[label("this numeric literal")]
        span: SourceSpan,
    },

    #[error("{}: {}", self.name(), self.description())]
    #[diagnostic(code(script::unexpected_token))]
    UnexpectedToken {
        expected: Vec<TokenKind>,
        got: TokenKind,

        #[source_code]
        src: NamedSource<String>,

        #[label("here")]
        span: SourceSpan,
    },

    #[error("{}: {}", self.name(), self.description())]
    #[diagnostic(code(script::nesting_too_deep), help("split the expression or remove redundant signs"))]
    NestingTooDeep {
        limit: usize,

        #[source_code]
        src: NamedSource<String>,

        #[label("nesting limit reached here")]
        span: SourceSpan,
    },

    #[error("{}: {}", self.name(), self.description())]
    #[diagnostic(code(script::division_by_zero))]
    DivisionByZero { dividend: i32 },

    #[error("{}: {}", self.name(), self.description())]
    #[diagnostic(code(script::arithmetic_overflow))]
    ArithmeticOverflow { operation: String },
}

impl ScriptError {
    /// Human-readable category of the error.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptError::IllegalCharacter { .. } => "Illegal Character",
            ScriptError::NumberOverflow { .. } => "Number Overflow",
            ScriptError::UnexpectedToken { .. } => "Unexpected Token",
            ScriptError::NestingTooDeep { .. } => "Nesting Too Deep",
            ScriptError::DivisionByZero { .. } => "Division By Zero",
            ScriptError::ArithmeticOverflow { .. } => "Arithmetic Overflow",
        }
    }

    /// The details that follow the name in the rendered message.
    pub fn description(&self) -> String {
        match self {
            ScriptError::IllegalCharacter { reason, .. } => reason.to_string(),
            ScriptError::NumberOverflow { literal, .. } => {
                format!("{literal} does not fit in a 32-bit signed integer")
            }
            ScriptError::UnexpectedToken { expected, got, .. } => {
                format!("expected {}, got {got}", kinds(expected))
            }
            ScriptError::NestingTooDeep { limit, .. } => {
                format!("more than {limit} nested signs or parentheses")
            }
            ScriptError::DivisionByZero { dividend } => format!("{dividend} / 0"),
            ScriptError::ArithmeticOverflow { operation } => operation.clone(),
        }
    }

    /// Raised while walking a tree that already parsed.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            ScriptError::DivisionByZero { .. } | ScriptError::ArithmeticOverflow { .. }
        )
    }
}

pub(crate) fn named_source(filename: Option<&str>, whole: &str) -> NamedSource<String> {
    NamedSource::new(filename.unwrap_or("<input>"), whole.to_string())
}

fn kinds(kinds: &[TokenKind]) -> String {
    let names: Vec<String> = kinds.iter().map(ToString::to_string).collect();
    match names.as_slice() {
        [] => "nothing".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_joins_name_and_description() {
        let error = ScriptError::DivisionByZero { dividend: 7 };
        assert_eq!(error.name(), "Division By Zero");
        assert_eq!(error.description(), "7 / 0");
        assert_eq!(error.to_string(), "Division By Zero: 7 / 0");
        assert!(error.is_runtime());
    }

    #[test]
    fn expected_kinds_are_listed() {
        let error = ScriptError::UnexpectedToken {
            expected: vec![TokenKind::LParen, TokenKind::Number],
            got: TokenKind::EndOfInput,
            src: named_source(None, ""),
            span: SourceSpan::from(0..0),
        };
        assert_eq!(error.name(), "Unexpected Token");
        assert_eq!(error.description(), "expected LPAREN or NUMBER, got EOF");
        assert!(!error.is_runtime());
    }

    #[test]
    fn illegal_reason_is_described() {
        let error = ScriptError::IllegalCharacter {
            reason: Illegal::LeadingZero,
            src: named_source(Some("demo"), "0123"),
            span: SourceSpan::from(0..1),
        };
        assert_eq!(error.description(), "leading zero");
        assert_eq!(Illegal::Char('a').to_string(), "'a'");
    }

    #[test]
    fn description_survives_colons_in_details() {
        let error = ScriptError::IllegalCharacter {
            reason: Illegal::Char(':'),
            src: named_source(None, "1 : 2"),
            span: SourceSpan::from(2..3),
        };
        assert_eq!(error.description(), "':'");
        assert_eq!(error.to_string(), "Illegal Character: ':'");

        let error = ScriptError::NumberOverflow {
            literal: "99999999999".to_string(),
            src: named_source(None, "99999999999"),
            span: SourceSpan::from(0..11),
        };
        assert_eq!(
            error.to_string(),
            format!("{}: {}", error.name(), error.description())
        );
    }
}
