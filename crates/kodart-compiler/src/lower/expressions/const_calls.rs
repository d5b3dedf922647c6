use crate::attributes::keys;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{IrExpr, IrExprKind};
use crate::lower::{ExpressionTransformer, LoweringContext};

/// Constructor calls written `@const`, and calls of always-const classes,
/// must be target-const; the ones that are get an explicit `const` at the
/// call site.
pub struct ConstCalls;

impl ExpressionTransformer for ConstCalls {
    fn name(&self) -> &'static str {
        "const-calls"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        let IrExprKind::ConstructorCall(call) = &expr.kind else {
            return;
        };
        let constness = cx.constness();
        let is_const = constness.is_dart_const(expr, false);
        let required = call.const_annotated || constness.is_always_const_constructor(call.constructor);
        if required && !is_const {
            let class = cx
                .index
                .get(call.constructor)
                .and_then(|info| info.parent)
                .and_then(|class| cx.index.get(class))
                .map(|info| info.name.clone())
                .unwrap_or_default();
            cx.report(Diagnostic::new(
                DiagnosticKind::ConstWithNonConst,
                format!("`{}` cannot be constructed as a constant", class),
            ));
            return;
        }
        if is_const {
            cx.attributes.set(&*expr, keys::DART_CONST_CALL, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::kind_names;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{annotations, IrAnnotation, IrDeclaration, IrModule, IrStatement, IrType};
    use crate::lower::declarations::AnnotateDartConst;
    use crate::lower::Pass;
    use crate::lower::declarations::test_support::module_with;
    use crate::lower::expressions::test_support::{expr_at, transform, transform_after};

    /// `@const class Marker(val x: Int)` constructed from `y`
    fn always_const_module(b: &mut IrBuilder, from_parameter: bool) -> IrModule {
        let mut class = b.class("app.Marker");
        class.annotations.push(IrAnnotation::new(annotations::CONST));
        let x = b.value_parameter("x", IrType::int());
        let constructor = b.constructor(class.id).primary().with_parameter(x).build();
        let ty = class.default_type();
        let y = b.value_parameter("y", IrType::int());
        let argument = if from_parameter { b.get_param(&y) } else { b.int(1) };
        let call = b.constructor_call(constructor.id, ty, vec![Some(argument)]);
        class.declarations.push(IrDeclaration::Constructor(constructor));
        let function = b
            .function("test", IrType::unit())
            .with_parameter(y)
            .body(vec![IrStatement::Expr(call)])
            .build();
        module_with(b, vec![IrDeclaration::Class(class), IrDeclaration::Function(function)])
    }

    fn module(b: &mut IrBuilder, const_constructor: bool) -> IrModule {
        let mut class = b.class("app.Color");
        let constructor = if const_constructor {
            b.constructor(class.id).primary().const_().build()
        } else {
            b.constructor(class.id).primary().build()
        };
        let ty = class.default_type();
        let mut call = b.constructor_call(constructor.id, ty, vec![]);
        if let IrExprKind::ConstructorCall(c) = &mut call.kind {
            c.const_annotated = true;
        }
        class.declarations.push(IrDeclaration::Constructor(constructor));
        let function = b
            .function("test", IrType::unit())
            .body(vec![IrStatement::Expr(call)])
            .build();
        module_with(b, vec![IrDeclaration::Class(class), IrDeclaration::Function(function)])
    }

    #[test]
    fn test_const_call_marked() {
        let mut b = IrBuilder::new();
        let mut module = module(&mut b, true);

        let lowered = transform(ConstCalls, &mut module);

        assert!(lowered.diagnostics.is_empty());
        let call = expr_at(&module, 0);
        assert!(lowered.attributes.flag(call, keys::DART_CONST_CALL));
    }

    #[test]
    fn test_non_const_constructor_reported() {
        let mut b = IrBuilder::new();
        let mut module = module(&mut b, false);

        let lowered = transform(ConstCalls, &mut module);

        assert!(kind_names(&lowered.diagnostics).contains("CONST_WITH_NON_CONST"));
        assert!(!lowered.attributes.flag(expr_at(&module, 0), keys::DART_CONST_CALL));
    }

    #[test]
    fn test_always_const_class_with_parameter_argument_reported() {
        let mut b = IrBuilder::new();
        let mut module = always_const_module(&mut b, true);

        let lowered = transform_after(vec![Pass::Declaration(Box::new(AnnotateDartConst))], ConstCalls, &mut module);

        assert!(kind_names(&lowered.diagnostics).contains("CONST_WITH_NON_CONST"));
        assert!(!lowered.attributes.flag(expr_at(&module, 0), keys::DART_CONST_CALL));
    }

    #[test]
    fn test_always_const_class_with_literal_argument_marked() {
        let mut b = IrBuilder::new();
        let mut module = always_const_module(&mut b, false);

        let lowered = transform_after(vec![Pass::Declaration(Box::new(AnnotateDartConst))], ConstCalls, &mut module);

        assert!(lowered.diagnostics.is_empty());
        assert!(lowered.attributes.flag(expr_at(&module, 0), keys::DART_CONST_CALL));
    }
}
