use super::field_initializers::initializing_constructors_mut;
use crate::attributes::keys;
use crate::ir::copy::copy_statements;
use crate::ir::{IrConstructor, IrDeclaration, IrExpr, IrExprKind, IrStatement, NodeId};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

/// `init { }` blocks run as part of the constructor body.
///
/// Runs after field initializer placement. Each block lands between the
/// body assignments of the properties declared around it, so the body
/// follows declaration order. Without a primary constructor the statements
/// go to every constructor that does not delegate to another one of the
/// same class.
pub struct InitBlocks;

enum Segment {
    /// A property assigned in the body
    Assigned(NodeId),
    Block(Vec<IrStatement>),
}

impl DeclarationLowering for InitBlocks {
    fn name(&self) -> &'static str {
        "init-blocks"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        if !class
            .declarations
            .iter()
            .any(|d| matches!(d, IrDeclaration::AnonymousInitializer(_)))
        {
            return Transformation::NoChange;
        }

        let mut segments = Vec::new();
        class.declarations.retain_mut(|d| match d {
            IrDeclaration::AnonymousInitializer(init) => {
                segments.push(Segment::Block(std::mem::take(&mut init.body.statements)));
                false
            }
            IrDeclaration::Property(property) => {
                if cx.attributes.flag(&*property, keys::INITIALIZED_IN_CONSTRUCTOR_BODY) {
                    segments.push(Segment::Assigned(property.id));
                }
                true
            }
            _ => true,
        });
        tracing::trace!(class = %class.fq_name, segments = segments.len(), "moving init blocks");

        let class_id = class.id;
        let mut targets = initializing_constructors_mut(class);
        if targets.is_empty() {
            if class.declarations.iter().any(|d| matches!(d, IrDeclaration::Constructor(_))) {
                return Transformation::NoChange;
            }
            let statements = segments
                .into_iter()
                .flat_map(|s| match s {
                    Segment::Block(statements) => statements,
                    Segment::Assigned(_) => Vec::new(),
                })
                .collect();
            let constructor = cx.builder.constructor(class_id).primary().body(statements).build();
            class.declarations.insert(0, IrDeclaration::Constructor(constructor));
            return Transformation::NoChange;
        }

        let last = targets.len() - 1;
        for (i, constructor) in targets.iter_mut().enumerate() {
            let start = cx
                .attributes
                .get(&**constructor, keys::PARAMETER_PROLOGUE_LEN)
                .copied()
                .unwrap_or(0);
            let mut cursor = start.min(constructor.body.statements.len());
            for segment in &mut segments {
                match segment {
                    Segment::Assigned(property) => {
                        if let Some(position) = assignment_position(constructor, *property, cursor) {
                            cursor = position + 1;
                        }
                    }
                    Segment::Block(statements) => {
                        let block = if i == last {
                            std::mem::take(statements)
                        } else {
                            copy_statements(&mut cx.builder, statements)
                        };
                        let count = block.len();
                        constructor.body.statements.splice(cursor..cursor, block);
                        cursor += count;
                    }
                }
            }
        }
        Transformation::NoChange
    }
}

/// Index of the body statement at or after `from` assigning `property`.
fn assignment_position(constructor: &IrConstructor, property: NodeId, from: usize) -> Option<usize> {
    constructor.body.statements[from..]
        .iter()
        .position(|s| {
            matches!(
                s,
                IrStatement::Expr(IrExpr {
                    kind: IrExprKind::SetProperty { property: p, receiver: Some(receiver), .. },
                    ..
                }) if *p == property && matches!(receiver.kind, IrExprKind::This { .. })
            )
        })
        .map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrAnonymousInitializer, IrBody, IrType};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    fn init_block(b: &mut IrBuilder, value: i64) -> IrDeclaration {
        let expr = b.int(value);
        IrDeclaration::AnonymousInitializer(IrAnonymousInitializer {
            id: b.fresh(),
            body: IrBody::new(vec![IrStatement::Expr(expr)]),
        })
    }

    #[test]
    fn test_blocks_append_to_primary_in_order() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Counter");
        let ctor = b.constructor(class.id).primary().parameter("start", IrType::int()).build();
        let first = init_block(&mut b, 1);
        let second = init_block(&mut b, 2);
        class.declarations = vec![first, IrDeclaration::Constructor(ctor), second];
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        run(vec![Pass::Declaration(Box::new(InitBlocks))], &mut module);

        let IrDeclaration::Class(class) = &module.files[0].declarations[0] else {
            panic!("expected class");
        };
        assert_eq!(class.declarations.len(), 1);
        let body = &class.primary_constructor().unwrap().body.statements;
        let values: Vec<_> = body
            .iter()
            .filter_map(|s| match s {
                IrStatement::Expr(e) => e.as_const().cloned(),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![crate::ir::IrConst::Int(1), crate::ir::IrConst::Int(2)]);
    }

    #[test]
    fn test_class_without_constructor_gets_primary() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Greeter");
        let block = init_block(&mut b, 7);
        class.declarations.push(block);
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        run(vec![Pass::Declaration(Box::new(InitBlocks))], &mut module);

        let IrDeclaration::Class(class) = &module.files[0].declarations[0] else {
            panic!("expected class");
        };
        let primary = class.primary_constructor().unwrap();
        assert_eq!(primary.body.statements.len(), 1);
    }

    /// `class C(p: Int) { val a = p; init { 1 }; val b = p }`
    #[test]
    fn test_blocks_interleave_with_body_assignments() {
        use crate::lower::declarations::FieldInitializerPlacement;

        let mut b = IrBuilder::new();
        let mut class = b.class("app.C");
        let p = b.value_parameter("p", IrType::int());
        let read = b.get_param(&p);
        let a = b.property("a", IrType::int()).initializer(read).build();
        let block = init_block(&mut b, 1);
        let read = b.get_param(&p);
        let second = b.property("b", IrType::int()).initializer(read).build();
        let ids = (a.id, second.id);
        let ctor = b.constructor(class.id).primary().with_parameter(p).build();
        class.declarations = vec![
            IrDeclaration::Constructor(ctor),
            IrDeclaration::Property(a),
            block,
            IrDeclaration::Property(second),
        ];
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        run(
            vec![
                Pass::Declaration(Box::new(FieldInitializerPlacement)),
                Pass::Declaration(Box::new(InitBlocks)),
            ],
            &mut module,
        );

        let IrDeclaration::Class(class) = &module.files[0].declarations[0] else {
            panic!("expected class");
        };
        let body = &class.primary_constructor().unwrap().body.statements;
        assert_eq!(body.len(), 3);
        let assigned = |s: &IrStatement| match s {
            IrStatement::Expr(e) => match &e.kind {
                IrExprKind::SetProperty { property, .. } => Some(*property),
                _ => None,
            },
            _ => None,
        };
        assert_eq!(assigned(&body[0]), Some(ids.0));
        assert!(matches!(&body[1], IrStatement::Expr(e) if e.as_const() == Some(&crate::ir::IrConst::Int(1))));
        assert_eq!(assigned(&body[2]), Some(ids.1));
    }
}
