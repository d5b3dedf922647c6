//! Operators
//!
//! Operator calls become the lowered operator kinds, each with one fixed
//! target token. Identity comparison has no operator in the target and
//! becomes a call of `identical`.

use super::intrinsics;
use crate::ir::{CallOrigin, Callee, IrBinaryOp, IrCall, IrExpr, IrExprKind, IrType, IrUnaryOp};
use crate::lower::{take_expr, ExpressionTransformer, LoweringContext};

pub struct Operators;

impl ExpressionTransformer for Operators {
    fn name(&self) -> &'static str {
        "operators"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        let IrExprKind::Call(call) = &expr.kind else {
            return;
        };
        if !is_operator_call(call, cx) {
            return;
        }
        let Some(rewrite) = rewrite_for(call) else {
            return;
        };
        if operand_count(call) != rewrite.arity() {
            return;
        }
        let ty = expr.ty.clone();
        let IrExprKind::Call(call) = take_expr(expr).kind else {
            return;
        };
        let mut operands = operands(call);
        let kind = match rewrite {
            Rewrite::Binary(op) => match (operands.pop(), operands.pop()) {
                (Some(right), Some(left)) => IrExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                _ => return,
            },
            Rewrite::Unary(op) => match operands.pop() {
                Some(operand) => {
                    // `!(a == b)` is spelled `a != b`.
                    match (op, operand.kind) {
                        (IrUnaryOp::Not, IrExprKind::Binary { op: IrBinaryOp::Eq, left, right }) => {
                            IrExprKind::Binary {
                                op: IrBinaryOp::NotEq,
                                left,
                                right,
                            }
                        }
                        (op, kind) => IrExprKind::Unary {
                            op,
                            operand: Box::new(IrExpr::new(operand.id, operand.ty, kind)),
                        },
                    }
                }
                None => return,
            },
            Rewrite::Identity => {
                let mut call = IrCall::new(Callee::Builtin(intrinsics::IDENTICAL.to_string()));
                call.arguments = operands.into_iter().map(Some).collect();
                IrExprKind::Call(call)
            }
            Rewrite::NotIdentity => {
                let mut call = IrCall::new(Callee::Builtin(intrinsics::IDENTICAL.to_string()));
                call.arguments = operands.into_iter().map(Some).collect();
                let identical = IrExpr::new(cx.builder.fresh(), IrType::boolean(), IrExprKind::Call(call));
                IrExprKind::Unary {
                    op: IrUnaryOp::Not,
                    operand: Box::new(identical),
                }
            }
            Rewrite::UnaryPlus => match operands.pop() {
                Some(operand) => operand.kind,
                None => return,
            },
            Rewrite::Index => match (operands.pop(), operands.pop()) {
                (Some(index), Some(receiver)) => IrExprKind::Index {
                    receiver: Box::new(receiver),
                    index: Box::new(index),
                },
                _ => return,
            },
            Rewrite::IndexSet => match (operands.pop(), operands.pop(), operands.pop()) {
                (Some(value), Some(index), Some(receiver)) => IrExprKind::IndexSet {
                    receiver: Box::new(receiver),
                    index: Box::new(index),
                    value: Box::new(value),
                },
                _ => return,
            },
        };
        tracing::trace!(id = %expr.id, "lowered operator call");
        expr.ty = ty;
        expr.kind = kind;
    }
}

enum Rewrite {
    Binary(IrBinaryOp),
    Unary(IrUnaryOp),
    /// `===`
    Identity,
    /// `!==`
    NotIdentity,
    /// Unary plus, the operand itself
    UnaryPlus,
    Index,
    IndexSet,
}

impl Rewrite {
    fn arity(&self) -> usize {
        match self {
            Rewrite::Unary(_) | Rewrite::UnaryPlus => 1,
            Rewrite::Binary(_) | Rewrite::Identity | Rewrite::NotIdentity | Rewrite::Index => 2,
            Rewrite::IndexSet => 3,
        }
    }
}

/// Builtins always lower; declared functions only when they are operators.
fn is_operator_call(call: &IrCall, cx: &LoweringContext<'_>) -> bool {
    match &call.callee {
        Callee::Builtin(_) => true,
        Callee::Function(id) => call.origin.is_some() && cx.index.get(*id).is_some_and(|info| info.is_operator),
    }
}

fn rewrite_for(call: &IrCall) -> Option<Rewrite> {
    if let Some(origin) = call.origin {
        return by_origin(origin, call);
    }
    // Infix functions and `inv()` on integers are written as calls.
    let name = call.builtin_name()?;
    let (owner, member) = name.rsplit_once('.')?;
    if !crate::ir::builtins::INTEGRAL.contains(&owner) {
        return None;
    }
    Some(match member {
        "and" => Rewrite::Binary(IrBinaryOp::BitAnd),
        "or" => Rewrite::Binary(IrBinaryOp::BitOr),
        "xor" => Rewrite::Binary(IrBinaryOp::BitXor),
        "shl" => Rewrite::Binary(IrBinaryOp::Shl),
        "shr" => Rewrite::Binary(IrBinaryOp::Shr),
        "ushr" => Rewrite::Binary(IrBinaryOp::UShr),
        "inv" => Rewrite::Unary(IrUnaryOp::BitNot),
        _ => return None,
    })
}

fn by_origin(origin: CallOrigin, call: &IrCall) -> Option<Rewrite> {
    Some(match origin {
        CallOrigin::Plus => Rewrite::Binary(IrBinaryOp::Plus),
        CallOrigin::Minus => Rewrite::Binary(IrBinaryOp::Minus),
        CallOrigin::Mul => Rewrite::Binary(IrBinaryOp::Mul),
        CallOrigin::Div => {
            if integral_operands(call) {
                Rewrite::Binary(IrBinaryOp::IntDiv)
            } else {
                Rewrite::Binary(IrBinaryOp::Div)
            }
        }
        CallOrigin::Perc => Rewrite::Binary(IrBinaryOp::Rem),
        CallOrigin::UPlus => Rewrite::UnaryPlus,
        CallOrigin::UMinus => Rewrite::Unary(IrUnaryOp::Negate),
        CallOrigin::Excl => Rewrite::Unary(IrUnaryOp::Not),
        // `a != b` arrives as `!(a == b)`; a direct two-operand form is
        // also accepted.
        CallOrigin::ExclEq => {
            if operand_count(call) == 2 {
                Rewrite::Binary(IrBinaryOp::NotEq)
            } else {
                Rewrite::Unary(IrUnaryOp::Not)
            }
        }
        CallOrigin::EqEq => Rewrite::Binary(IrBinaryOp::Eq),
        CallOrigin::EqEqEq => Rewrite::Identity,
        CallOrigin::ExclEqEq => {
            if operand_count(call) == 2 {
                Rewrite::NotIdentity
            } else {
                Rewrite::Unary(IrUnaryOp::Not)
            }
        }
        CallOrigin::Lt => Rewrite::Binary(IrBinaryOp::Lt),
        CallOrigin::Gt => Rewrite::Binary(IrBinaryOp::Gt),
        CallOrigin::LtEq => Rewrite::Binary(IrBinaryOp::LtEq),
        CallOrigin::GtEq => Rewrite::Binary(IrBinaryOp::GtEq),
        CallOrigin::GetArrayElement => Rewrite::Index,
        CallOrigin::SetArrayElement => Rewrite::IndexSet,
        CallOrigin::Invoke => return None,
    })
}

fn operand_count(call: &IrCall) -> usize {
    usize::from(call.dispatch_receiver.is_some())
        + usize::from(call.extension_receiver.is_some())
        + call.present_arguments().count()
}

fn integral_operands(call: &IrCall) -> bool {
    let receiver = call.dispatch_receiver.as_deref().or(call.extension_receiver.as_deref());
    receiver
        .into_iter()
        .chain(call.present_arguments())
        .all(|e| e.ty.is_integral())
}

/// Receiver first, then the passed arguments.
fn operands(call: IrCall) -> Vec<IrExpr> {
    call.dispatch_receiver
        .into_iter()
        .chain(call.extension_receiver)
        .map(|e| *e)
        .chain(call.arguments.into_iter().flatten())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::IrStatement;
    use crate::lower::expressions::test_support::{expr_at, function_module, transform};

    fn lowered(build: impl FnOnce(&mut IrBuilder) -> IrExpr) -> IrExprKind {
        let mut b = IrBuilder::new();
        let expr = build(&mut b);
        let mut module = function_module(&mut b, vec![IrStatement::Expr(expr)]);
        transform(Operators, &mut module);
        expr_at(&module, 0).kind.clone()
    }

    fn binary_op(kind: &IrExprKind) -> Option<IrBinaryOp> {
        match kind {
            IrExprKind::Binary { op, .. } => Some(*op),
            _ => None,
        }
    }

    #[test]
    fn test_arithmetic() {
        let kind = lowered(|b| {
            let (one, two) = (b.int(1), b.int(2));
            b.builtin_call("kotlin.Int.plus", IrType::int(), Some(one), vec![two], Some(CallOrigin::Plus))
        });
        assert_eq!(binary_op(&kind), Some(IrBinaryOp::Plus));
    }

    #[test]
    fn test_integer_division() {
        let kind = lowered(|b| {
            let (one, two) = (b.int(1), b.int(2));
            b.builtin_call("kotlin.Int.div", IrType::int(), Some(one), vec![two], Some(CallOrigin::Div))
        });
        assert_eq!(binary_op(&kind), Some(IrBinaryOp::IntDiv));

        let kind = lowered(|b| {
            let (one, two) = (b.double(1.0), b.double(2.0));
            b.builtin_call("kotlin.Double.div", IrType::double(), Some(one), vec![two], Some(CallOrigin::Div))
        });
        assert_eq!(binary_op(&kind), Some(IrBinaryOp::Div));
    }

    #[test]
    fn test_not_equals() {
        let kind = lowered(|b| {
            let (one, two) = (b.int(1), b.int(2));
            let eq = b.eqeq(one, two);
            b.builtin_call("kotlin.Boolean.not", IrType::boolean(), Some(eq), vec![], Some(CallOrigin::ExclEq))
        });
        assert_eq!(binary_op(&kind), Some(IrBinaryOp::NotEq));
    }

    #[test]
    fn test_identity() {
        let kind = lowered(|b| {
            let (one, two) = (b.string("a"), b.string("b"));
            b.builtin_call(intrinsics::EQEQEQ, IrType::boolean(), None, vec![one, two], Some(CallOrigin::EqEqEq))
        });
        let IrExprKind::Call(call) = kind else {
            panic!("expected call");
        };
        assert_eq!(call.builtin_name(), Some(intrinsics::IDENTICAL));
        assert_eq!(call.arguments.len(), 2);
    }

    #[test]
    fn test_infix_bitwise() {
        let kind = lowered(|b| {
            let (one, two) = (b.int(1), b.int(2));
            b.builtin_call("kotlin.Int.shl", IrType::int(), Some(one), vec![two], None)
        });
        assert_eq!(binary_op(&kind), Some(IrBinaryOp::Shl));
    }

    #[test]
    fn test_indexing() {
        let kind = lowered(|b| {
            let list_type = IrType::builtin("kotlin.collections.List").with_arguments(vec![IrType::int()]);
            let list = b.get_value(crate::ir::NodeId(9_999), list_type);
            let zero = b.int(0);
            b.builtin_call(
                "kotlin.collections.List.get",
                IrType::int(),
                Some(list),
                vec![zero],
                Some(CallOrigin::GetArrayElement),
            )
        });
        assert!(matches!(kind, IrExprKind::Index { .. }));
    }

    #[test]
    fn test_plain_calls_untouched() {
        let kind = lowered(|b| {
            let one = b.int(1);
            b.builtin_call("kotlin.Int.toString", IrType::string(), Some(one), vec![], None)
        });
        assert!(matches!(kind, IrExprKind::Call(_)));
    }
}
