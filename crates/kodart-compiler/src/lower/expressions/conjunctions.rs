use crate::ir::{IrBinaryOp, IrExpr, IrExprKind, WhenOrigin};
use crate::lower::{take_expr, ExpressionTransformer, LoweringContext};

/// `&&` and `||` reach the IR as two-branch `when`s:
///
/// - `a && b` is `when { a -> b; else -> false }`
/// - `a || b` is `when { a -> true; else -> b }`
pub struct ConjunctionsDisjunctions;

impl ExpressionTransformer for ConjunctionsDisjunctions {
    fn name(&self) -> &'static str {
        "conjunctions-disjunctions"
    }

    fn transform_expression(&self, expr: &mut IrExpr, _cx: &mut LoweringContext<'_>) {
        let op = match &expr.kind {
            IrExprKind::When(when) if when.branches.len() == 2 && when.branches[0].condition.is_some() => {
                match when.origin {
                    Some(WhenOrigin::AndAnd) => IrBinaryOp::AndAnd,
                    Some(WhenOrigin::OrOr) => IrBinaryOp::OrOr,
                    _ => return,
                }
            }
            _ => return,
        };
        let ty = expr.ty.clone();
        let IrExprKind::When(when) = take_expr(expr).kind else {
            return;
        };
        let mut branches = when.branches.into_iter();
        let (Some(first), Some(last)) = (branches.next(), branches.next()) else {
            return;
        };
        let Some(left) = first.condition else {
            return;
        };
        let right = match op {
            IrBinaryOp::AndAnd => first.result,
            _ => last.result,
        };
        expr.ty = ty;
        expr.kind = IrExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
}
