//! Iterator implementations
//!
//! A class implementing `hasNext()`/`next()` also gets the target protocol:
//! a `current` property that `next()` keeps up to date, and `moveNext()`.

use crate::ir::builder::IrBuilder;
use crate::ir::visit::{self, VisitorMut};
use crate::ir::{
    builtins, IrClass, IrDeclaration, IrFunction, IrStatement, IrSuperType, IrType, NodeId, SuperTypeKind,
};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

pub struct IteratorImplementations;

impl DeclarationLowering for IteratorImplementations {
    fn name(&self) -> &'static str {
        "iterator-implementations"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        let Some(position) = class.super_types.iter().position(|s| s.ty.is(builtins::ITERATOR)) else {
            return Transformation::NoChange;
        };

        let element_type = class.super_types[position]
            .ty
            .arguments()
            .first()
            .cloned()
            .unwrap_or_else(IrType::any);
        let mut super_type = IrSuperType::new(
            IrType::builtin(builtins::DART_ITERATOR).with_arguments(vec![element_type.clone()]),
        );
        super_type.kind = Some(SuperTypeKind::Implements);
        class.super_types[position] = super_type;

        let (Some(has_next), Some(next)) = (
            class.function_named("hasNext").map(|f| f.id),
            class.function_named("next").map(|f| f.id),
        ) else {
            return Transformation::NoChange;
        };
        tracing::trace!(class = %class.fq_name, "adding target iterator protocol");

        let current = cx
            .builder
            .property("current", element_type.clone())
            .lateinit()
            .override_()
            .build();
        let current_id = current.id;

        let this_type = class.default_type();
        let class_id = class.id;
        for member in &mut class.declarations {
            if let IrDeclaration::Function(function) = member {
                if function.id == next {
                    if let Some(body) = &mut function.body {
                        let mut updater = CurrentUpdater {
                            builder: &mut cx.builder,
                            class: class_id,
                            this_type: this_type.clone(),
                            current: current_id,
                        };
                        updater.visit_statements_mut(&mut body.statements);
                    }
                }
            }
        }

        let move_next = move_next(&mut cx.builder, class, has_next, next, element_type);
        class.declarations.push(IrDeclaration::Property(current));
        class.declarations.push(IrDeclaration::Function(move_next));
        Transformation::NoChange
    }
}

/// `return e` becomes `val tmp = e; this.current = tmp; return tmp`.
struct CurrentUpdater<'b> {
    builder: &'b mut IrBuilder,
    class: NodeId,
    this_type: IrType,
    current: NodeId,
}

impl VisitorMut for CurrentUpdater<'_> {
    fn visit_function_mut(&mut self, _function: &mut IrFunction) {
        // Returns of lambdas and local functions are not returns of next().
    }

    fn visit_statements_mut(&mut self, stmts: &mut Vec<IrStatement>) {
        let mut rewritten = Vec::with_capacity(stmts.len());
        for mut stmt in stmts.drain(..) {
            visit::walk_statement_mut(self, &mut stmt);
            match stmt {
                IrStatement::Return(Some(value)) => {
                    let tmp = self.builder.temporary(value);
                    let this = self.builder.this_of(self.class, self.this_type.clone());
                    let read = self.builder.get_variable(&tmp);
                    let assign = self.builder.set_property(self.current, Some(this), read);
                    let result = self.builder.get_variable(&tmp);
                    rewritten.push(IrStatement::Variable(tmp));
                    rewritten.push(IrStatement::Expr(assign));
                    rewritten.push(IrStatement::Return(Some(result)));
                }
                other => rewritten.push(other),
            }
        }
        *stmts = rewritten;
    }
}

/// `override fun moveNext(): Boolean { if (hasNext()) { next(); return true }; return false }`
fn move_next(b: &mut IrBuilder, class: &IrClass, has_next: NodeId, next: NodeId, element: IrType) -> IrFunction {
    let this = b.this(class);
    let condition = b.method_call(has_next, IrType::boolean(), this, vec![]);
    let this = b.this(class);
    let advance = b.method_call(next, element, this, vec![]);
    let yes = b.boolean(true);
    let no = b.boolean(false);
    b.function("moveNext", IrType::boolean())
        .override_()
        .body(vec![
            IrStatement::If {
                condition,
                then_branch: vec![IrStatement::Expr(advance), IrStatement::Return(Some(yes))],
                else_branch: None,
            },
            IrStatement::Return(Some(no)),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrExprKind, VariableOrigin};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    #[test]
    fn test_iterator_gets_target_protocol() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Countdown");
        class.super_types.push(IrSuperType::new(
            IrType::builtin(builtins::ITERATOR).with_arguments(vec![IrType::int()]),
        ));
        let yes = b.boolean(true);
        let has_next = b
            .function("hasNext", IrType::boolean())
            .override_()
            .body(vec![IrStatement::Return(Some(yes))])
            .build();
        let zero = b.int(0);
        let next = b
            .function("next", IrType::int())
            .override_()
            .body(vec![IrStatement::Return(Some(zero))])
            .build();
        class.declarations.push(IrDeclaration::Function(has_next));
        class.declarations.push(IrDeclaration::Function(next));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        run(vec![Pass::Declaration(Box::new(IteratorImplementations))], &mut module);

        let IrDeclaration::Class(class) = &module.files[0].declarations[0] else {
            panic!("expected class");
        };
        assert!(class.super_types[0].ty.is(builtins::DART_ITERATOR));
        assert_eq!(class.super_types[0].kind, Some(SuperTypeKind::Implements));

        let current = class.properties().find(|p| p.name == "current").unwrap();
        assert!(current.is_lateinit);
        assert!(class.function_named("moveNext").is_some());

        let next = class.function_named("next").unwrap();
        let stmts = &next.body.as_ref().unwrap().statements;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], IrStatement::Variable(v) if v.origin == Some(VariableOrigin::Temporary)));
        assert!(matches!(
            &stmts[1],
            IrStatement::Expr(e) if matches!(e.kind, IrExprKind::SetProperty { property, .. } if property == current.id)
        ));
        assert!(matches!(&stmts[2], IrStatement::Return(Some(_))));
        assert!(module.validate().is_ok());
    }

    #[test]
    fn test_other_classes_untouched() {
        let mut b = IrBuilder::new();
        let class = b.class("app.Plain");
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class.clone())]);
        run(vec![Pass::Declaration(Box::new(IteratorImplementations))], &mut module);
        assert_eq!(module.files[0].declarations[0], IrDeclaration::Class(class));
    }
}
