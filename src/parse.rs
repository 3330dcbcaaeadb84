use std::fmt::Display;

use crate::{
    Lexer,
    error::ScriptError,
    lex::{Token, TokenKind},
};

/// How many signs and parentheses may nest before parsing gives up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Number(i32),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Ast>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Ast>,
        right: Box<Ast>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Star,
    Slash,
}

/// Recursive-descent parser over
///
/// ```text
/// expr   := term ( (PLUS|MINUS) term )*
/// term   := factor ( (STAR|SLASH) factor )*
/// factor := (PLUS|MINUS) factor | NUMBER | LPAREN expr RPAREN
/// ```
///
/// with a single token of lookahead.
pub struct Parser<'de> {
    lexer: Lexer<'de>,
    current: Token<'de>,
    depth: usize,
    max_depth: usize,
}

impl<'de> Parser<'de> {
    pub fn new(lexer: Lexer<'de>) -> Self {
        Self::with_max_depth(lexer, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(lexer: Lexer<'de>, max_depth: usize) -> Self {
        Parser {
            lexer,
            current: Token::none(),
            depth: 0,
            max_depth,
        }
    }

    pub fn parse(mut self) -> Result<Ast, ScriptError> {
        self.eat(TokenKind::None)?;
        let root = self.expr()?;
        self.eat(TokenKind::EndOfInput)?;
        Ok(root)
    }

    fn eat(&mut self, expected: TokenKind) -> Result<Token<'de>, ScriptError> {
        if self.current.kind != expected {
            return Err(self.unexpected(vec![expected]));
        }
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expr(&mut self) -> Result<Ast, ScriptError> {
        let mut left = self.term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Plus,
                TokenKind::Minus => BinaryOperator::Minus,
                _ => break,
            };
            self.eat(self.current.kind)?;
            let right = self.term()?;
            left = Ast::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Ast, ScriptError> {
        let mut left = self.factor()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOperator::Star,
                TokenKind::Slash => BinaryOperator::Slash,
                _ => break,
            };
            self.eat(self.current.kind)?;
            let right = self.factor()?;
            left = Ast::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Ast, ScriptError> {
        if self.depth >= self.max_depth {
            return Err(ScriptError::NestingTooDeep {
                limit: self.max_depth,
                src: self.lexer.source(),
                span: self.lexer.span_of(&self.current),
            });
        }
        self.depth += 1;
        let node = match self.current.kind {
            TokenKind::Plus | TokenKind::Minus => self.unary(),
            TokenKind::Number => self.number(),
            TokenKind::LParen => self.group(),
            _ => Err(self.unexpected(vec![TokenKind::LParen, TokenKind::Number])),
        };
        self.depth -= 1;
        node
    }

    fn unary(&mut self) -> Result<Ast, ScriptError> {
        let op = match self.current.kind {
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Minus,
            _ => unreachable!(),
        };
        self.eat(self.current.kind)?;
        let operand = self.factor()?;
        Ok(Ast::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn number(&mut self) -> Result<Ast, ScriptError> {
        let token = self.eat(TokenKind::Number)?;
        match token.value {
            Some(n) => Ok(Ast::Number(n)),
            None => unreachable!("number tokens always carry a value"),
        }
    }

    fn group(&mut self) -> Result<Ast, ScriptError> {
        self.eat(TokenKind::LParen)?;
        let inner = self.expr()?;
        self.eat(TokenKind::RParen)?;
        Ok(inner)
    }

    fn unexpected(&self, expected: Vec<TokenKind>) -> ScriptError {
        ScriptError::UnexpectedToken {
            expected,
            got: self.current.kind,
            src: self.lexer.source(),
            span: self.lexer.span_of(&self.current),
        }
    }
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Star => "*",
            BinaryOperator::Slash => "/",
        }
    }
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// S-expression form, e.g. `(- 5 (- (- 2)))`.
impl Display for Ast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        enum Piece<'a> {
            Node(&'a Ast),
            Text(&'static str),
        }

        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(Ast::Number(n)) => write!(f, "{n}")?,
                Piece::Node(Ast::UnaryOp { op, operand }) => {
                    write!(f, "({op} ")?;
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Node(operand));
                }
                Piece::Node(Ast::BinaryOp { op, left, right }) => {
                    write!(f, "({op} ")?;
                    pieces.push(Piece::Text(")"));
                    pieces.push(Piece::Node(right));
                    pieces.push(Piece::Text(" "));
                    pieces.push(Piece::Node(left));
                }
            }
        }
        Ok(())
    }
}

impl Ast {
    fn detach_children(&mut self, into: &mut Vec<Ast>) {
        match self {
            Ast::Number(_) => {}
            Ast::UnaryOp { operand, .. } => {
                into.push(std::mem::replace(&mut **operand, Ast::Number(0)));
            }
            Ast::BinaryOp { left, right, .. } => {
                into.push(std::mem::replace(&mut **left, Ast::Number(0)));
                into.push(std::mem::replace(&mut **right, Ast::Number(0)));
            }
        }
    }
}

/// Tears the tree down through a worklist, so dropping a long chain never
/// recurses more than one level.
impl Drop for Ast {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Ast, ScriptError> {
        Parser::new(Lexer::new(None, source)).parse()
    }

    fn tree(source: &str) -> String {
        parse(source).unwrap().to_string()
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(tree("2 * 5 + 5"), "(+ (* 2 5) 5)");
        assert_eq!(tree("5 + 2 * 5"), "(+ 5 (* 2 5))");
    }

    #[test]
    fn same_precedence_folds_left() {
        assert_eq!(tree("5 + 5 - 2"), "(- (+ 5 5) 2)");
        assert_eq!(tree("10 / 5 / 2"), "(/ (/ 10 5) 2)");
        assert_eq!(tree("10 / (5 + 5) * 20"), "(* (/ 10 (+ 5 5)) 20)");
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(tree("2 * (5 + 5)"), "(* 2 (+ 5 5))");
        assert_eq!(tree("((7))"), "7");
    }

    #[test]
    fn signs_after_an_operand_are_binary() {
        assert_eq!(tree("5---2"), "(- 5 (- (- 2)))");
        assert_eq!(tree("-+3"), "(- (+ 3))");
        assert_eq!(tree("2*-3"), "(* 2 (- 3))");
    }

    #[test]
    fn builds_owned_tree() {
        assert_eq!(
            parse("-1 + 2").unwrap(),
            Ast::BinaryOp {
                op: BinaryOperator::Plus,
                left: Box::new(Ast::UnaryOp {
                    op: UnaryOperator::Minus,
                    operand: Box::new(Ast::Number(1)),
                }),
                right: Box::new(Ast::Number(2)),
            }
        );
    }

    #[test]
    fn empty_source_expects_a_factor() {
        match parse("").unwrap_err() {
            ScriptError::UnexpectedToken { expected, got, .. } => {
                assert_eq!(expected, vec![TokenKind::LParen, TokenKind::Number]);
                assert_eq!(got, TokenKind::EndOfInput);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_close_paren() {
        match parse("(1 + 2").unwrap_err() {
            ScriptError::UnexpectedToken { expected, got, .. } => {
                assert_eq!(expected, vec![TokenKind::RParen]);
                assert_eq!(got, TokenKind::EndOfInput);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        match parse("1 2").unwrap_err() {
            ScriptError::UnexpectedToken {
                expected,
                got,
                span,
                ..
            } => {
                assert_eq!(expected, vec![TokenKind::EndOfInput]);
                assert_eq!(got, TokenKind::Number);
                assert_eq!(span, miette::SourceSpan::from(2..3));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            parse("(1))"),
            Err(ScriptError::UnexpectedToken {
                got: TokenKind::RParen,
                ..
            })
        ));
    }

    #[test]
    fn operator_without_operand() {
        assert!(matches!(
            parse("1 +"),
            Err(ScriptError::UnexpectedToken {
                got: TokenKind::EndOfInput,
                ..
            })
        ));
        assert!(matches!(
            parse("* 2"),
            Err(ScriptError::UnexpectedToken {
                got: TokenKind::Star,
                ..
            })
        ));
    }

    #[test]
    fn lexer_errors_short_circuit() {
        assert!(matches!(
            parse("1 + 2 $ 3"),
            Err(ScriptError::IllegalCharacter { .. })
        ));
        assert!(matches!(
            parse("(0)"),
            Err(ScriptError::IllegalCharacter { .. })
        ));
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(Parser::with_max_depth(Lexer::new(None, &deep), 11).parse().is_ok());
        assert!(matches!(
            Parser::with_max_depth(Lexer::new(None, &deep), 10).parse(),
            Err(ScriptError::NestingTooDeep { limit: 10, .. })
        ));

        let signs = format!("{}1", "-".repeat(DEFAULT_MAX_DEPTH * 4));
        assert!(matches!(
            parse(&signs),
            Err(ScriptError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn long_flat_chains_do_not_count_as_nesting() {
        let chain = vec!["1"; 200_000].join(" + ");
        let tree = parse(&chain).unwrap();
        let printed = tree.to_string();
        assert!(printed.starts_with("(+ (+ (+ "));
        assert!(printed.ends_with(" 1) 1) 1)"));
        drop(tree);
    }

    #[test]
    fn dropping_a_deep_tree_is_iterative() {
        let mut tree = Ast::Number(1);
        for _ in 0..200_000 {
            tree = Ast::UnaryOp {
                op: UnaryOperator::Minus,
                operand: Box::new(tree),
            };
        }
        drop(tree);
    }
}
