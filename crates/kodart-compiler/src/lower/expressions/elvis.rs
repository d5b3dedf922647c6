use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{BlockOrigin, IrBinaryOp, IrBlock, IrExpr, IrExprKind, IrStatement};
use crate::lower::{take_expr, ExpressionTransformer, LoweringContext};

/// `a ?: b` arrives as `{ val tmp = a; when { tmp == null -> b; else -> tmp } }`
/// and becomes the target's `a ?? b`.
pub struct Elvis;

impl ExpressionTransformer for Elvis {
    fn name(&self) -> &'static str {
        "elvis"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        match &expr.kind {
            IrExprKind::Block(block) if block.origin == Some(BlockOrigin::Elvis) => {
                if !is_elvis_shape(block) {
                    cx.report(Diagnostic::new(
                        DiagnosticKind::UnsupportedConstruct,
                        "elvis expression with an unexpected shape",
                    ));
                    return;
                }
            }
            _ => return,
        }
        let ty = expr.ty.clone();
        let IrExprKind::Block(block) = take_expr(expr).kind else {
            return;
        };
        let mut statements = block.statements.into_iter();
        let (Some(IrStatement::Variable(tmp)), Some(IrStatement::Expr(when))) = (statements.next(), statements.next())
        else {
            return;
        };
        let (Some(left), IrExprKind::When(when)) = (tmp.initializer, when.kind) else {
            return;
        };
        let Some(right) = when.branches.into_iter().next().map(|b| b.result) else {
            return;
        };
        expr.ty = ty;
        expr.kind = IrExprKind::Binary {
            op: IrBinaryOp::IfNull,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
}

fn is_elvis_shape(block: &IrBlock) -> bool {
    match block.statements.as_slice() {
        [IrStatement::Variable(tmp), IrStatement::Expr(when)] => {
            tmp.initializer.is_some() && matches!(&when.kind, IrExprKind::When(w) if !w.branches.is_empty())
        }
        _ => false,
    }
}
