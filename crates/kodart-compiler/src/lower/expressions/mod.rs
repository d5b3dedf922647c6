//! Expression and statement transformers
//!
//! These run bottom-up over every body once the declaration lowerings are
//! done. Each rewrites one family of source constructs into the lowered-only
//! kinds the translator maps directly.

mod conjunctions;
mod const_calls;
mod const_inline_calls;
mod elvis;
mod external_iterators;
mod object_references;
mod operators;
mod postfix;
mod safe_calls;
mod unit_returns;
mod whens;

pub use conjunctions::ConjunctionsDisjunctions;
pub use const_calls::ConstCalls;
pub use const_inline_calls::ConstInlineCalls;
pub use elvis::Elvis;
pub use external_iterators::ExternalIterators;
pub use object_references::ObjectReferences;
pub use operators::Operators;
pub use postfix::PostfixIncrementsDecrements;
pub use safe_calls::SafeCalls;
pub use unit_returns::UnitReturns;
pub use whens::Whens;

use crate::ir::builder::IrBuilder;
use crate::ir::{CallOrigin, DeclOrigin, IrExpr, IrExprKind, IrFunction, IrStatement, IrType};

/// Builtin callees produced or consumed by the transformers.
pub mod intrinsics {
    pub const EQEQ: &str = "kotlin.internal.ir.EQEQ";
    pub const EQEQEQ: &str = "kotlin.internal.ir.EQEQEQ";
    /// The target's top-level `identical(a, b)`
    pub const IDENTICAL: &str = "dart.core.identical";
    /// Calling a function value
    pub const INVOKE: &str = "kotlin.Function.invoke";
    pub const ITERATOR_MOVE_NEXT: &str = "dart.core.Iterator.moveNext";
    pub const ITERATOR_CURRENT: &str = "dart.core.Iterator.<get-current>";
}

/// `(() { statements })()`, with the value of the last statement returned.
///
/// Used where a composite expression has no target expression form. The
/// statements must not `return`, `break` or `continue` out of the closure.
pub(crate) fn invoke_immediately(b: &mut IrBuilder, ty: IrType, mut statements: Vec<IrStatement>) -> IrExpr {
    if !ty.is_unit() {
        with_last_as_return(&mut statements);
    }
    let mut lambda: IrFunction = b.function("<anonymous>", ty.clone()).body(statements).build();
    lambda.origin = DeclOrigin::Generated;
    let lambda_type = IrType::function(Vec::new(), ty.clone());
    let lambda = b.expr(lambda_type, IrExprKind::Lambda(Box::new(lambda)));
    b.builtin_call(intrinsics::INVOKE, ty, Some(lambda), Vec::new(), Some(CallOrigin::Invoke))
}

/// Turn the value of a statement list into a `return`, following `if`
/// branches and nested blocks.
pub(crate) fn with_last_as_return(statements: &mut Vec<IrStatement>) {
    with_last_as(statements, &mut |value| IrStatement::Return(Some(value)));
}

/// Replace the value of a statement list by `wrap(value)`, following `if`
/// branches and nested blocks. Jumps and `throw` stay as they are.
pub(crate) fn with_last_as(statements: &mut Vec<IrStatement>, wrap: &mut dyn FnMut(IrExpr) -> IrStatement) {
    let Some(last) = statements.pop() else {
        return;
    };
    let last = match last {
        IrStatement::Expr(value) if !matches!(value.kind, IrExprKind::Throw(_)) => wrap(value),
        IrStatement::If {
            condition,
            mut then_branch,
            else_branch,
        } => {
            with_last_as(&mut then_branch, wrap);
            let else_branch = else_branch.map(|mut statements| {
                with_last_as(&mut statements, wrap);
                statements
            });
            IrStatement::If {
                condition,
                then_branch,
                else_branch,
            }
        }
        IrStatement::Block(mut inner) => {
            with_last_as(&mut inner, wrap);
            IrStatement::Block(inner)
        }
        other => other,
    };
    statements.push(last);
}
