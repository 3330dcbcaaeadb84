use crate::{
    Lexer, Parser,
    error::ScriptError,
    parse::{Ast, BinaryOperator, UnaryOperator},
};

enum Step<'a> {
    Visit(&'a Ast),
    Negate,
    Apply(BinaryOperator),
}

/// Walks a parsed tree bottom-up, left operand before right.
///
/// Arithmetic is checked: dividing by zero and leaving the `i32` range are
/// reported instead of trapping or wrapping. Division truncates toward zero.
/// The walk keeps its own work stack, so chains of any length evaluate
/// without deep recursion.
pub fn interpret(node: &Ast) -> Result<i32, ScriptError> {
    let mut steps = vec![Step::Visit(node)];
    let mut values: Vec<i32> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Visit(Ast::Number(n)) => values.push(*n),
            Step::Visit(Ast::UnaryOp { op, operand }) => {
                if *op == UnaryOperator::Minus {
                    steps.push(Step::Negate);
                }
                steps.push(Step::Visit(operand));
            }
            Step::Visit(Ast::BinaryOp { op, left, right }) => {
                steps.push(Step::Apply(*op));
                steps.push(Step::Visit(right));
                steps.push(Step::Visit(left));
            }
            Step::Negate => {
                let value = pop(&mut values);
                let negated = value
                    .checked_neg()
                    .ok_or_else(|| ScriptError::ArithmeticOverflow {
                        operation: format!("-({value})"),
                    })?;
                values.push(negated);
            }
            Step::Apply(op) => {
                let rhs = pop(&mut values);
                let lhs = pop(&mut values);
                values.push(apply(op, lhs, rhs)?);
            }
        }
    }

    Ok(pop(&mut values))
}

fn pop(values: &mut Vec<i32>) -> i32 {
    match values.pop() {
        Some(value) => value,
        None => unreachable!("every visited node leaves one value behind"),
    }
}

fn apply(op: BinaryOperator, lhs: i32, rhs: i32) -> Result<i32, ScriptError> {
    let result = match op {
        BinaryOperator::Plus => lhs.checked_add(rhs),
        BinaryOperator::Minus => lhs.checked_sub(rhs),
        BinaryOperator::Star => lhs.checked_mul(rhs),
        BinaryOperator::Slash => {
            if rhs == 0 {
                return Err(ScriptError::DivisionByZero { dividend: lhs });
            }
            lhs.checked_div(rhs)
        }
    };
    result.ok_or_else(|| ScriptError::ArithmeticOverflow {
        operation: format!("{lhs} {op} {rhs}"),
    })
}

/// One lex, parse and evaluate cycle over a single script.
pub struct Interpreter<'de> {
    parser: Parser<'de>,
}

impl<'de> Interpreter<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str) -> Self {
        Self {
            parser: Parser::new(Lexer::new(filename, whole)),
        }
    }

    pub fn run(self) -> Result<i32, ScriptError> {
        let tree = self.parser.parse()?;
        interpret(&tree)
    }
}

impl<'de> From<Parser<'de>> for Interpreter<'de> {
    fn from(parser: Parser<'de>) -> Self {
        Self { parser }
    }
}
