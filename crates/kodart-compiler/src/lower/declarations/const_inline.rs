use crate::attributes::keys::{self, ConstInlineBody};
use crate::ir::visit::{self, Visitor};
use crate::ir::{IrDeclaration, IrExpr, IrExprKind, IrStatement, NodeId};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use rustc_hash::FxHashSet;

/// `@const inline` functions stay callable from non-constant code, where
/// their parameters are ordinary values. A local constant computed from a
/// parameter therefore loses `const` in the emitted function.
///
/// The body is also recorded so that calls with constant arguments can be
/// replaced by the returned value.
pub struct ConstInlineFunctions;

impl DeclarationLowering for ConstInlineFunctions {
    fn name(&self) -> &'static str {
        "const-inline-functions"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Function(function) = decl else {
            return Transformation::NoChange;
        };
        if !function.is_const_inline() {
            return Transformation::NoChange;
        }
        let Some(body) = &mut function.body else {
            return Transformation::NoChange;
        };

        let constness = cx.constness();
        let mut demoted = FxHashSet::default();
        for stmt in &mut body.statements {
            let IrStatement::Variable(variable) = stmt else {
                continue;
            };
            if !variable.is_const {
                continue;
            }
            let constant = variable
                .initializer
                .as_ref()
                .is_some_and(|init| constness.is_dart_const(init, true) && !reads_any(init, &demoted));
            if !constant {
                tracing::trace!(function = %function.name, local = %variable.name, "local loses const");
                variable.is_const = false;
                demoted.insert(variable.id);
            }
        }

        if let Some(recorded) = recorded_body(function) {
            cx.attributes.set(&*function, keys::CONST_INLINE_BODY, recorded);
        }
        Transformation::NoChange
    }
}

/// Parameters, locals and value of a body made of local declarations
/// followed by one `return`.
fn recorded_body(function: &crate::ir::IrFunction) -> Option<ConstInlineBody> {
    let (last, rest) = function.body.as_ref()?.statements.split_last()?;
    let IrStatement::Return(Some(value)) = last else {
        return None;
    };
    let mut locals = Vec::with_capacity(rest.len());
    for stmt in rest {
        let IrStatement::Variable(variable) = stmt else {
            return None;
        };
        locals.push((variable.id, variable.initializer.clone()?));
    }
    Some(ConstInlineBody {
        parameters: function
            .parameters
            .iter()
            .map(|p| (p.id, p.default_value.clone()))
            .collect(),
        locals,
        value: value.clone(),
    })
}

fn reads_any(expr: &IrExpr, targets: &FxHashSet<NodeId>) -> bool {
    struct Reads<'t> {
        targets: &'t FxHashSet<NodeId>,
        found: bool,
    }

    impl Visitor for Reads<'_> {
        fn visit_expr(&mut self, expr: &IrExpr) {
            if let IrExprKind::GetValue { target } = &expr.kind {
                self.found |= self.targets.contains(target);
            }
            visit::walk_expr(self, expr);
        }
    }

    if targets.is_empty() {
        return false;
    }
    let mut reads = Reads { targets, found: false };
    reads.visit_expr(expr);
    reads.found
}
