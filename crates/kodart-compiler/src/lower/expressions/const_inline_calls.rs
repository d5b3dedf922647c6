use crate::attributes::keys::{self, ConstInlineBody};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::builder::IrBuilder;
use crate::ir::copy::copy_expr;
use crate::ir::visit::{self, VisitorMut};
use crate::ir::{IrCall, IrExpr, IrExprKind, NodeId};
use crate::lower::{ExpressionTransformer, LoweringContext};
use rustc_hash::FxHashMap;

/// Nested expansion stops here; deeper chains are usually recursion.
const MAX_DEPTH: usize = 32;

/// A call of a `@const inline` function whose arguments are all constant
/// becomes the function's returned value, with parameters and locals
/// replaced by what they stand for. Other calls stay ordinary calls.
pub struct ConstInlineCalls;

impl ExpressionTransformer for ConstInlineCalls {
    fn name(&self) -> &'static str {
        "const-inline-calls"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        Expander { cx, depth: 0 }.expand(expr);
    }
}

struct Expander<'c, 'a> {
    cx: &'c mut LoweringContext<'a>,
    depth: usize,
}

impl Expander<'_, '_> {
    fn expand(&mut self, expr: &mut IrExpr) {
        let IrExprKind::Call(call) = &expr.kind else {
            return;
        };
        let Some(function) = call.function() else {
            return;
        };
        let Some(body) = self.cx.attributes.get(&function, keys::CONST_INLINE_BODY).cloned() else {
            return;
        };
        if !self.cx.constness().is_dart_const(expr, true) {
            return;
        }
        if self.depth >= MAX_DEPTH {
            let name = self.cx.index.get(function).map(|info| info.name.clone()).unwrap_or_default();
            self.cx.report(Diagnostic::new(
                DiagnosticKind::UnsupportedConstruct,
                format!("Const inline expansion of '{}' does not terminate", name),
            ));
            return;
        }

        let mut value = expanded(call, &body, &mut self.cx.builder);
        self.depth += 1;
        self.visit_expr_mut(&mut value);
        self.depth -= 1;
        *expr = value;
    }
}

impl VisitorMut for Expander<'_, '_> {
    fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
        visit::walk_expr_mut(self, expr);
        self.expand(expr);
    }
}

/// The returned value of `body` for the arguments of `call`.
fn expanded(call: &IrCall, body: &ConstInlineBody, builder: &mut IrBuilder) -> IrExpr {
    let mut values = FxHashMap::default();
    for (i, (parameter, default)) in body.parameters.iter().enumerate() {
        let value = match (call.arguments.get(i).and_then(Option::as_ref), default) {
            (Some(argument), _) => copy_expr(builder, argument),
            (None, Some(default)) => substituted(default, &values, builder),
            (None, None) => continue,
        };
        values.insert(*parameter, value);
    }
    for (local, initializer) in &body.locals {
        let value = substituted(initializer, &values, builder);
        values.insert(*local, value);
    }
    substituted(&body.value, &values, builder)
}

/// Copy of `expr` with every read of a key of `values` replaced.
fn substituted(expr: &IrExpr, values: &FxHashMap<NodeId, IrExpr>, builder: &mut IrBuilder) -> IrExpr {
    struct Substitute<'v, 'b> {
        values: &'v FxHashMap<NodeId, IrExpr>,
        builder: &'b mut IrBuilder,
    }

    impl VisitorMut for Substitute<'_, '_> {
        fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
            if let IrExprKind::GetValue { target } = &expr.kind {
                if let Some(value) = self.values.get(target) {
                    *expr = copy_expr(self.builder, value);
                    return;
                }
            }
            visit::walk_expr_mut(self, expr);
        }
    }

    let mut copy = copy_expr(builder, expr);
    Substitute { values, builder }.visit_expr_mut(&mut copy);
    copy
}
