//! Parsed formula tokens
//!
//! A parsed formula is a flat token sequence in post-order (reverse Polish):
//! operands come before the operator or function call that consumes them, so
//! `=SUM(A1,2)*3` becomes `A1 2 SUM/2 3 *`.

use sheetcalc_core::{ErrorCode, Reference};

use crate::value::FormulaValue;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    /// Postfix `%`
    Percent,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,

    // Reference
    /// `:` between two non-literal operands, e.g. `A1:INDIRECT("B5")`
    Range,
    /// `,` inside parentheses, e.g. `(A1,C3)`
    Union,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
            BinaryOperator::Range => ":",
            BinaryOperator::Union => ",",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }
}

/// One element of a parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),

    /// Single-cell reference
    Ref(Reference),
    /// Area, whole-row or whole-column reference
    Area(Reference),
    /// Defined name, resolved at evaluation time
    Name(String),
    /// Array constant `{1,2;3,4}`
    Array(Vec<Vec<FormulaValue>>),

    Unary(UnaryOperator),
    Binary(BinaryOperator),
    /// Function call consuming the preceding `arity` operands
    Function { name: String, arity: usize },
    /// Grouping marker; evaluates as a no-op
    Paren,
    /// Omitted function argument, as in `IF(A1,,2)`
    Missing,
}

impl Token {
    /// Whether the token pushes an operand without consuming any
    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Text(_)
                | Token::Boolean(_)
                | Token::Error(_)
                | Token::Ref(_)
                | Token::Area(_)
                | Token::Name(_)
                | Token::Array(_)
                | Token::Missing
        )
    }
}
