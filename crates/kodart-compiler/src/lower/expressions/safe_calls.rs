use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{BlockOrigin, IrBlock, IrExpr, IrExprKind, IrStatement, NodeId};
use crate::lower::{take_expr, ExpressionTransformer, LoweringContext};

/// `a?.f()` arrives as
/// `{ val tmp = a; when { tmp == null -> null; else -> tmp.f() } }`.
/// The member access gets `a` back as its receiver and is made null-aware.
/// Property writes `a?.x = v` take the same shape and become `a?.x = v`.
pub struct SafeCalls;

impl ExpressionTransformer for SafeCalls {
    fn name(&self) -> &'static str {
        "safe-calls"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        match &expr.kind {
            IrExprKind::Block(block) if block.origin == Some(BlockOrigin::SafeCall) => {
                if safe_access(block).is_none() {
                    cx.report(Diagnostic::new(
                        DiagnosticKind::UnsupportedConstruct,
                        "safe call on something other than a call or property access",
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
        let (Some(receiver), IrExprKind::When(when)) = (tmp.initializer, when.kind) else {
            return;
        };
        let Some(mut access) = when.branches.into_iter().last().map(|b| b.result) else {
            return;
        };
        if !rebind_receiver(&mut access, tmp.id, receiver) {
            return;
        }
        tracing::trace!(id = %access.id, "null-aware access");
        access.ty = ty;
        *expr = access;
    }
}

/// The member access of the non-null branch, when the block has the
/// expected shape.
fn safe_access(block: &IrBlock) -> Option<&IrExpr> {
    let [IrStatement::Variable(tmp), IrStatement::Expr(when)] = block.statements.as_slice() else {
        return None;
    };
    tmp.initializer.as_ref()?;
    let IrExprKind::When(when) = &when.kind else {
        return None;
    };
    let access = &when.branches.last()?.result;
    match &access.kind {
        IrExprKind::Call(call)
            if call.dispatch_receiver.as_deref().is_some_and(|r| r.is_get_value(tmp.id))
                || call.extension_receiver.as_deref().is_some_and(|r| r.is_get_value(tmp.id)) =>
        {
            Some(access)
        }
        IrExprKind::GetProperty {
            receiver: Some(receiver),
            ..
        }
        | IrExprKind::SetProperty {
            receiver: Some(receiver),
            ..
        } if receiver.is_get_value(tmp.id) => Some(access),
        _ => None,
    }
}

fn rebind_receiver(access: &mut IrExpr, tmp: NodeId, receiver: IrExpr) -> bool {
    match &mut access.kind {
        IrExprKind::Call(call) => {
            let slot = if call.dispatch_receiver.as_deref().is_some_and(|r| r.is_get_value(tmp)) {
                &mut call.dispatch_receiver
            } else {
                &mut call.extension_receiver
            };
            *slot = Some(Box::new(receiver));
            call.null_aware = true;
            true
        }
        IrExprKind::GetProperty {
            receiver: slot,
            null_aware,
            ..
        }
        | IrExprKind::SetProperty {
            receiver: slot,
            null_aware,
            ..
        } => {
            *slot = Some(Box::new(receiver));
            *null_aware = true;
            true
        }
        _ => false,
    }
}
