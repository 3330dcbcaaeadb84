//! Lexer, recursive-descent parser and tree-walking interpreter for a small
//! integer arithmetic scripting language.
//!
//! ```
//! assert_eq!(pgex_script::evaluate("2 * (5 + 5)").unwrap(), 20);
//! ```

pub mod error;
pub mod eval;
pub mod lex;
pub mod parse;

pub use error::ScriptError;
pub use eval::{Interpreter, interpret};
pub use lex::{Lexer, Token, TokenKind};
pub use parse::{Ast, BinaryOperator, DEFAULT_MAX_DEPTH, Parser, UnaryOperator};

/// Lexes, parses and evaluates `source`.
pub fn evaluate(source: &str) -> Result<i32, ScriptError> {
    evaluate_named(None, source)
}

/// Like [`evaluate`], with `filename` shown in rendered diagnostics.
pub fn evaluate_named(filename: Option<&str>, source: &str) -> Result<i32, ScriptError> {
    Interpreter::new(filename, source).run()
}
