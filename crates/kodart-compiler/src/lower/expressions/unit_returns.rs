use crate::ir::{IrExpr, IrExprKind, IrStatement, TypeOperator};
use crate::lower::{ExpressionTransformer, LoweringContext, Transformation};

/// `return Unit` becomes a bare `return`, and a standalone `Unit` statement
/// is dropped: the target has no value for it.
pub struct UnitReturns;

impl ExpressionTransformer for UnitReturns {
    fn name(&self) -> &'static str {
        "unit-returns"
    }

    fn transform_statement(&self, stmt: &mut IrStatement, _cx: &mut LoweringContext<'_>) -> Transformation<IrStatement> {
        match stmt {
            IrStatement::Return(Some(value)) if is_unit_value(value) => Transformation::Replace(IrStatement::Return(None)),
            IrStatement::Expr(value) if matches!(value.kind, IrExprKind::Unit) => Transformation::remove(),
            _ => Transformation::NoChange,
        }
    }
}

fn is_unit_value(expr: &IrExpr) -> bool {
    match &expr.kind {
        IrExprKind::Unit => true,
        IrExprKind::TypeOp {
            operator: TypeOperator::ImplicitCoercionToUnit,
            operand,
            ..
        } => is_unit_value(operand),
        _ => false,
    }
}
