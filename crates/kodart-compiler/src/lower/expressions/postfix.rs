//! Increments and decrements
//!
//! `x++` arrives as `{ val tmp = x; x = tmp.inc(); tmp }` and `++x` as
//! `{ x = x.inc(); x }`. On numbers they become the target's own `++`/`--`.
//! Other types overload `inc()`/`dec()`, which the target operators do not
//! call, so the block runs as an immediately invoked closure instead.

use super::invoke_immediately;
use crate::ir::{BlockOrigin, IrExpr, IrExprKind, IrStatement, IrUnaryOp};
use crate::lower::{take_expr, ExpressionTransformer, LoweringContext};

pub struct PostfixIncrementsDecrements;

impl ExpressionTransformer for PostfixIncrementsDecrements {
    fn name(&self) -> &'static str {
        "postfix-increments-decrements"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        let op = match &expr.kind {
            IrExprKind::Block(block) => match block.origin {
                Some(BlockOrigin::PostfixIncr) => IrUnaryOp::PostfixIncrement,
                Some(BlockOrigin::PostfixDecr) => IrUnaryOp::PostfixDecrement,
                Some(BlockOrigin::PrefixIncr) => IrUnaryOp::PrefixIncrement,
                Some(BlockOrigin::PrefixDecr) => IrUnaryOp::PrefixDecrement,
                _ => return,
            },
            _ => return,
        };
        let ty = expr.ty.clone();
        let IrExprKind::Block(block) = take_expr(expr).kind else {
            return;
        };

        let operand = if ty.is_numeric() { target_of(op, &block.statements).cloned() } else { None };
        *expr = match operand {
            Some(operand) => cx.builder.unary(op, ty, operand),
            None => invoke_immediately(&mut cx.builder, ty, block.statements),
        };
    }
}

/// The variable, property or field being stepped.
fn target_of(op: IrUnaryOp, statements: &[IrStatement]) -> Option<&IrExpr> {
    let read = match op {
        IrUnaryOp::PostfixIncrement | IrUnaryOp::PostfixDecrement => match statements.first()? {
            IrStatement::Variable(tmp) => tmp.initializer.as_ref()?,
            _ => return None,
        },
        _ => match statements.last()? {
            IrStatement::Expr(read) => read,
            _ => return None,
        },
    };
    let assignable = match &read.kind {
        IrExprKind::GetValue { .. } | IrExprKind::GetField { .. } | IrExprKind::Index { .. } => true,
        IrExprKind::GetProperty { null_aware, .. } => !null_aware,
        _ => false,
    };
    assignable.then_some(read)
}
