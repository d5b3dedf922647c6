//! Target operators
//!
//! Every operator variant spells exactly one token. The translator picks a
//! variant by IR node kind and never builds tokens from strings.

use crate::ir::{IrBinaryOp, IrUnaryOp};
use std::fmt;

/// Binding strength, higher binds tighter.
pub type Precedence = u8;

pub mod precedence {
    use super::Precedence;

    pub const NONE: Precedence = 0;
    pub const ASSIGNMENT: Precedence = 1;
    pub const CONDITIONAL: Precedence = 2;
    pub const IF_NULL: Precedence = 3;
    pub const LOGICAL_OR: Precedence = 4;
    pub const LOGICAL_AND: Precedence = 5;
    pub const EQUALITY: Precedence = 6;
    pub const RELATIONAL: Precedence = 7;
    pub const BITWISE_OR: Precedence = 8;
    pub const BITWISE_XOR: Precedence = 9;
    pub const BITWISE_AND: Precedence = 10;
    pub const SHIFT: Precedence = 11;
    pub const ADDITIVE: Precedence = 12;
    pub const MULTIPLICATIVE: Precedence = 13;
    pub const PREFIX: Precedence = 14;
    pub const POSTFIX: Precedence = 15;
    pub const PRIMARY: Precedence = 16;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DartBinaryOperator {
    LogicalAnd,
    LogicalOr,
    Equals,
    NotEquals,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    IntegerDivide,
    Modulo,
    IfNull,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
}

impl DartBinaryOperator {
    pub fn token(self) -> &'static str {
        match self {
            DartBinaryOperator::LogicalAnd => "&&",
            DartBinaryOperator::LogicalOr => "||",
            DartBinaryOperator::Equals => "==",
            DartBinaryOperator::NotEquals => "!=",
            DartBinaryOperator::Less => "<",
            DartBinaryOperator::Greater => ">",
            DartBinaryOperator::LessOrEqual => "<=",
            DartBinaryOperator::GreaterOrEqual => ">=",
            DartBinaryOperator::Add => "+",
            DartBinaryOperator::Subtract => "-",
            DartBinaryOperator::Multiply => "*",
            DartBinaryOperator::Divide => "/",
            DartBinaryOperator::IntegerDivide => "~/",
            DartBinaryOperator::Modulo => "%",
            DartBinaryOperator::IfNull => "??",
            DartBinaryOperator::BitwiseAnd => "&",
            DartBinaryOperator::BitwiseOr => "|",
            DartBinaryOperator::BitwiseXor => "^",
            DartBinaryOperator::ShiftLeft => "<<",
            DartBinaryOperator::ShiftRight => ">>",
            DartBinaryOperator::UnsignedShiftRight => ">>>",
        }
    }

    pub fn precedence(self) -> Precedence {
        use precedence::*;
        match self {
            DartBinaryOperator::IfNull => IF_NULL,
            DartBinaryOperator::LogicalOr => LOGICAL_OR,
            DartBinaryOperator::LogicalAnd => LOGICAL_AND,
            DartBinaryOperator::Equals | DartBinaryOperator::NotEquals => EQUALITY,
            DartBinaryOperator::Less
            | DartBinaryOperator::Greater
            | DartBinaryOperator::LessOrEqual
            | DartBinaryOperator::GreaterOrEqual => RELATIONAL,
            DartBinaryOperator::BitwiseOr => BITWISE_OR,
            DartBinaryOperator::BitwiseXor => BITWISE_XOR,
            DartBinaryOperator::BitwiseAnd => BITWISE_AND,
            DartBinaryOperator::ShiftLeft | DartBinaryOperator::ShiftRight | DartBinaryOperator::UnsignedShiftRight => {
                SHIFT
            }
            DartBinaryOperator::Add | DartBinaryOperator::Subtract => ADDITIVE,
            DartBinaryOperator::Multiply
            | DartBinaryOperator::Divide
            | DartBinaryOperator::IntegerDivide
            | DartBinaryOperator::Modulo => MULTIPLICATIVE,
        }
    }

    /// Equality and relational operators cannot be chained without
    /// parentheses.
    pub fn is_non_associative(self) -> bool {
        matches!(
            self.precedence(),
            precedence::EQUALITY | precedence::RELATIONAL
        )
    }
}

impl From<IrBinaryOp> for DartBinaryOperator {
    fn from(op: IrBinaryOp) -> Self {
        match op {
            IrBinaryOp::AndAnd => DartBinaryOperator::LogicalAnd,
            IrBinaryOp::OrOr => DartBinaryOperator::LogicalOr,
            IrBinaryOp::Eq => DartBinaryOperator::Equals,
            IrBinaryOp::NotEq => DartBinaryOperator::NotEquals,
            IrBinaryOp::Lt => DartBinaryOperator::Less,
            IrBinaryOp::Gt => DartBinaryOperator::Greater,
            IrBinaryOp::LtEq => DartBinaryOperator::LessOrEqual,
            IrBinaryOp::GtEq => DartBinaryOperator::GreaterOrEqual,
            IrBinaryOp::Plus => DartBinaryOperator::Add,
            IrBinaryOp::Minus => DartBinaryOperator::Subtract,
            IrBinaryOp::Mul => DartBinaryOperator::Multiply,
            IrBinaryOp::Div => DartBinaryOperator::Divide,
            IrBinaryOp::IntDiv => DartBinaryOperator::IntegerDivide,
            IrBinaryOp::Rem => DartBinaryOperator::Modulo,
            IrBinaryOp::IfNull => DartBinaryOperator::IfNull,
            IrBinaryOp::BitAnd => DartBinaryOperator::BitwiseAnd,
            IrBinaryOp::BitOr => DartBinaryOperator::BitwiseOr,
            IrBinaryOp::BitXor => DartBinaryOperator::BitwiseXor,
            IrBinaryOp::Shl => DartBinaryOperator::ShiftLeft,
            IrBinaryOp::Shr => DartBinaryOperator::ShiftRight,
            IrBinaryOp::UShr => DartBinaryOperator::UnsignedShiftRight,
        }
    }
}

impl fmt::Display for DartBinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DartPrefixOperator {
    Not,
    Negate,
    BitwiseNot,
    Increment,
    Decrement,
}

impl DartPrefixOperator {
    pub fn token(self) -> &'static str {
        match self {
            DartPrefixOperator::Not => "!",
            DartPrefixOperator::Negate => "-",
            DartPrefixOperator::BitwiseNot => "~",
            DartPrefixOperator::Increment => "++",
            DartPrefixOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DartPostfixOperator {
    NotNull,
    Increment,
    Decrement,
}

impl DartPostfixOperator {
    pub fn token(self) -> &'static str {
        match self {
            DartPostfixOperator::NotNull => "!",
            DartPostfixOperator::Increment => "++",
            DartPostfixOperator::Decrement => "--",
        }
    }
}

/// Target spelling of an IR unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DartUnaryOperator {
    Prefix(DartPrefixOperator),
    Postfix(DartPostfixOperator),
}

impl From<IrUnaryOp> for DartUnaryOperator {
    fn from(op: IrUnaryOp) -> Self {
        match op {
            IrUnaryOp::Not => DartUnaryOperator::Prefix(DartPrefixOperator::Not),
            IrUnaryOp::Negate => DartUnaryOperator::Prefix(DartPrefixOperator::Negate),
            IrUnaryOp::BitNot => DartUnaryOperator::Prefix(DartPrefixOperator::BitwiseNot),
            IrUnaryOp::PrefixIncrement => DartUnaryOperator::Prefix(DartPrefixOperator::Increment),
            IrUnaryOp::PrefixDecrement => DartUnaryOperator::Prefix(DartPrefixOperator::Decrement),
            IrUnaryOp::NotNull => DartUnaryOperator::Postfix(DartPostfixOperator::NotNull),
            IrUnaryOp::PostfixIncrement => DartUnaryOperator::Postfix(DartPostfixOperator::Increment),
            IrUnaryOp::PostfixDecrement => DartUnaryOperator::Postfix(DartPostfixOperator::Decrement),
        }
    }
}

/// Token of a user-definable operator method, by source operator name.
pub fn operator_method_token(name: &str) -> Option<&'static str> {
    Some(match name {
        "plus" => "+",
        "minus" => "-",
        "times" => "*",
        "div" => "/",
        "rem" => "%",
        "unaryMinus" => "unary-",
        "inv" => "~",
        "get" => "[]",
        "set" => "[]=",
        "equals" => "==",
        "and" => "&",
        "or" => "|",
        "xor" => "^",
        "shl" => "<<",
        "shr" => ">>",
        "ushr" => ">>>",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_ir_operator_has_distinct_token() {
        let mut tokens: Vec<&str> = IrBinaryOp::ALL
            .iter()
            .map(|op| DartBinaryOperator::from(*op).token())
            .collect();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), IrBinaryOp::ALL.len());
    }

    #[test]
    fn test_precedence_order() {
        assert!(DartBinaryOperator::Multiply.precedence() > DartBinaryOperator::Add.precedence());
        assert!(DartBinaryOperator::LogicalAnd.precedence() > DartBinaryOperator::LogicalOr.precedence());
        assert!(DartBinaryOperator::LogicalOr.precedence() > DartBinaryOperator::IfNull.precedence());
        assert!(DartBinaryOperator::Less.is_non_associative());
        assert!(!DartBinaryOperator::Add.is_non_associative());
    }

    #[test]
    fn test_operator_methods() {
        assert_eq!(operator_method_token("get"), Some("[]"));
        assert_eq!(operator_method_token("set"), Some("[]="));
        assert_eq!(operator_method_token("unaryMinus"), Some("unary-"));
        assert_eq!(operator_method_token("invoke"), None);
    }
}
