//! Field initializer placement
//!
//! A target field initializer cannot read `this` or constructor parameters.
//! Such initializers move to the constructor body, after any parameter
//! prologue, and the field becomes `late`.
//!
//! Field initializers all run before the constructor body. Once one
//! initializer (or an `init` block) has to run in the body, every later
//! initializer that is not a constant follows it there, so initialization
//! keeps declaration order.

use crate::attributes::keys;
use crate::ir::copy::copy_expr;
use crate::ir::visit::any_expr;
use crate::ir::{DelegationKind, IrClass, IrConstructor, IrDeclaration, IrExpr, IrExprKind, IrStatement, IrType, NodeId};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use rustc_hash::FxHashSet;

pub struct FieldInitializerPlacement;

/// Why an initializer has to run in the constructor body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    ReadsInstance,
    ReadsParameter,
    /// Something earlier in the class already runs in the body
    Ordering,
}

impl DeclarationLowering for FieldInitializerPlacement {
    fn name(&self) -> &'static str {
        "field-initializer-placement"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        let has_body_target = class.declarations.iter().any(|d| {
            matches!(d, IrDeclaration::Constructor(c)
                if !c.delegation.as_ref().is_some_and(|d| d.kind == DelegationKind::This))
        });
        if !has_body_target {
            return Transformation::NoChange;
        }

        let constructor_params: FxHashSet<NodeId> = initializing_constructors(class)
            .iter()
            .flat_map(|c| c.parameters.iter().map(|p| p.id))
            .collect();
        let declaring: Vec<(NodeId, NodeId)> = class
            .primary_constructor()
            .map(|c| {
                c.parameters
                    .iter()
                    .filter_map(|p| p.corresponding_property.map(|prop| (prop, p.id)))
                    .collect()
            })
            .unwrap_or_default();
        let class_id = class.id;

        let mut in_body = false;
        let mut moves: Vec<(NodeId, IrExpr)> = Vec::new();
        for decl in &mut class.declarations {
            let property = match decl {
                IrDeclaration::AnonymousInitializer(_) => {
                    in_body = true;
                    continue;
                }
                IrDeclaration::Property(property) => property,
                _ => continue,
            };
            if property.is_const
                || cx.attributes.flag(&*property, keys::INITIALIZED_IN_FIELD_INITIALIZER_LIST)
                || cx.attributes.flag(&*property, keys::INITIALIZED_IN_CONSTRUCTOR_BODY)
            {
                continue;
            }
            let Some(field) = &mut property.backing_field else {
                continue;
            };
            if field.is_static {
                continue;
            }
            let Some(initializer) = &field.initializer else {
                continue;
            };
            let field_formal = declaring
                .iter()
                .any(|(prop, param)| *prop == property.id && initializer.is_get_value(*param));
            if field_formal {
                continue;
            }

            let reason = body_reason(initializer, class_id, &constructor_params, cx).or_else(|| {
                (in_body && !cx.constness().is_dart_const(initializer, false)).then_some(Reason::Ordering)
            });
            let Some(reason) = reason else {
                continue;
            };
            if let Some(initializer) = field.initializer.take() {
                tracing::trace!(property = %property.name, ?reason, "moving field initializer to constructor body");
                in_body = true;
                moves.push((property.id, initializer));
            }
        }
        if moves.is_empty() {
            return Transformation::NoChange;
        }

        for (property, _) in &moves {
            cx.attributes.set(property, keys::INITIALIZED_IN_CONSTRUCTOR_BODY, true);
        }
        let this_type = class.default_type();
        move_to_bodies(class, class_id, this_type, moves, cx);
        Transformation::NoChange
    }
}

fn body_reason(
    initializer: &IrExpr,
    class: NodeId,
    constructor_params: &FxHashSet<NodeId>,
    cx: &LoweringContext<'_>,
) -> Option<Reason> {
    let reads_instance = any_expr(initializer, |e| match &e.kind {
        IrExprKind::This { class: c } => *c == class,
        IrExprKind::GetProperty { property: target, receiver: None, .. }
        | IrExprKind::GetField { field: target, receiver: None } => is_instance_member(*target, class, cx),
        IrExprKind::Call(call) if call.dispatch_receiver.is_none() => {
            call.function().is_some_and(|f| is_instance_member(f, class, cx))
        }
        _ => false,
    });
    if reads_instance {
        return Some(Reason::ReadsInstance);
    }
    let reads_parameters = any_expr(initializer, |e| match e.kind {
        IrExprKind::GetValue { target } => constructor_params.contains(&target),
        _ => false,
    });
    reads_parameters.then_some(Reason::ReadsParameter)
}

fn is_instance_member(id: NodeId, class: NodeId, cx: &LoweringContext<'_>) -> bool {
    cx.index.get(id).is_some_and(|info| {
        !info.is_static && cx.index.enclosing_class(id).is_some_and(|c| c.id == class)
    })
}

/// Constructors that run field initialization: the primary one, or without
/// a primary every constructor that does not delegate within the class.
pub(super) fn initializing_constructors(class: &IrClass) -> Vec<&IrConstructor> {
    let has_primary = class.primary_constructor().is_some();
    class
        .declarations
        .iter()
        .filter_map(|d| match d {
            IrDeclaration::Constructor(c) => Some(c),
            _ => None,
        })
        .filter(|c| runs_initialization(c, has_primary))
        .collect()
}

pub(super) fn initializing_constructors_mut(class: &mut IrClass) -> Vec<&mut IrConstructor> {
    let has_primary = class.primary_constructor().is_some();
    super::constructors_mut(&mut class.declarations)
        .filter(|c| runs_initialization(c, has_primary))
        .collect()
}

fn runs_initialization(constructor: &IrConstructor, has_primary: bool) -> bool {
    if has_primary {
        constructor.is_primary
    } else {
        !constructor.delegation.as_ref().is_some_and(|d| d.kind == DelegationKind::This)
    }
}

fn move_to_bodies(
    class: &mut IrClass,
    class_id: NodeId,
    this_type: IrType,
    inits: Vec<(NodeId, IrExpr)>,
    cx: &mut LoweringContext<'_>,
) {
    let mut targets = initializing_constructors_mut(class);
    let Some(last) = targets.len().checked_sub(1) else {
        return;
    };
    for (i, constructor) in targets.iter_mut().enumerate() {
        let start = cx
            .attributes
            .get(&**constructor, keys::PARAMETER_PROLOGUE_LEN)
            .copied()
            .unwrap_or(0)
            .min(constructor.body.statements.len());
        let statements: Vec<IrStatement> = inits
            .iter()
            .map(|(property, value)| {
                let value = if i == last { value.clone() } else { copy_expr(&mut cx.builder, value) };
                let this = cx.builder.this_of(class_id, this_type.clone());
                IrStatement::Expr(cx.builder.set_property(*property, Some(this), value))
            })
            .collect();
        constructor.body.statements.splice(start..start, statements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrAnonymousInitializer, IrBody, IrModule};
    use crate::lower::declarations::test_support::{module_with, run, Lowered};
    use crate::lower::Pass;

    fn lower(module: &mut IrModule) -> Lowered {
        run(vec![Pass::Declaration(Box::new(FieldInitializerPlacement))], module)
    }

    fn class(module: &IrModule) -> &IrClass {
        match &module.files[0].declarations[0] {
            IrDeclaration::Class(c) => c,
            _ => panic!("expected class"),
        }
    }

    /// Properties assigned by the primary constructor body, in order.
    fn assigned(class: &IrClass) -> Vec<NodeId> {
        class
            .primary_constructor()
            .unwrap()
            .body
            .statements
            .iter()
            .filter_map(|s| match s {
                IrStatement::Expr(IrExpr {
                    kind: IrExprKind::SetProperty { property, .. },
                    ..
                }) => Some(*property),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parameter_read_moves_to_body() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Box");
        let width = b.value_parameter("width", IrType::int());
        let read = b.get_param(&width);
        let two = b.int(2);
        let doubled = b.binary(crate::ir::IrBinaryOp::Mul, IrType::int(), read, two);
        let area = b.property("area", IrType::int()).initializer(doubled).build();
        let area_id = area.id;
        let ctor = b.constructor(class.id).primary().with_parameter(width).build();
        class.declarations.push(IrDeclaration::Constructor(ctor));
        class.declarations.push(IrDeclaration::Property(area));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        let lowered = lower(&mut module);

        let class = self::class(&module);
        assert!(class.primary_constructor().unwrap().initializer_list.is_empty());
        assert_eq!(assigned(class), vec![area_id]);
        assert!(class.properties().next().unwrap().initializer().is_none());
        assert!(lowered.attributes.flag(&area_id, keys::INITIALIZED_IN_CONSTRUCTOR_BODY));
    }

    #[test]
    fn test_instance_read_moves_to_body() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Counter");
        let zero = b.int(0);
        let start = b.property("start", IrType::int()).initializer(zero).build();
        let this = b.this(&class);
        let read_start = b.get_property(start.id, IrType::int(), Some(this));
        let current = b.property("current", IrType::int()).var().initializer(read_start).build();
        let current_id = current.id;
        let ctor = b.constructor(class.id).primary().build();
        class.declarations.push(IrDeclaration::Constructor(ctor));
        class.declarations.push(IrDeclaration::Property(start));
        class.declarations.push(IrDeclaration::Property(current));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        let lowered = lower(&mut module);

        let class = self::class(&module);
        assert_eq!(assigned(class), vec![current_id]);
        let start = class.properties().find(|p| p.name == "start").unwrap();
        assert!(start.initializer().is_some());
        assert!(lowered.attributes.flag(&current_id, keys::INITIALIZED_IN_CONSTRUCTOR_BODY));
    }

    /// `class C(p: Int) { fun next(): Int; val a = next(); val b = log(p); val c = 1 }`
    #[test]
    fn test_body_assignments_keep_declaration_order() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.C");
        let log = b.function("log", IrType::int()).parameter("x", IrType::int()).build();
        let next = b.function("next", IrType::int()).build();
        let p = b.value_parameter("p", IrType::int());

        let this = b.this(&class);
        let call_next = b.method_call(next.id, IrType::int(), this, vec![]);
        let a = b.property("a", IrType::int()).initializer(call_next).build();
        let read_p = b.get_param(&p);
        let call_log = b.call(log.id, IrType::int(), vec![read_p]);
        let b_prop = b.property("b", IrType::int()).initializer(call_log).build();
        let one = b.int(1);
        let c = b.property("c", IrType::int()).initializer(one).build();
        let ids = (a.id, b_prop.id, c.id);

        let ctor = b.constructor(class.id).primary().with_parameter(p).build();
        class.declarations.push(IrDeclaration::Constructor(ctor));
        class.declarations.push(IrDeclaration::Function(next));
        class.declarations.push(IrDeclaration::Property(a));
        class.declarations.push(IrDeclaration::Property(b_prop));
        class.declarations.push(IrDeclaration::Property(c));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class), IrDeclaration::Function(log)]);

        lower(&mut module);

        let class = self::class(&module);
        assert_eq!(assigned(class), vec![ids.0, ids.1]);
        let c = class.properties().find(|p| p.id == ids.2).unwrap();
        assert!(c.initializer().is_some());
    }

    /// `class C { init { f() }; val x = g() }`
    #[test]
    fn test_initializer_after_init_block_follows_it() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.C");
        let f = b.function("f", IrType::unit()).build();
        let g = b.function("g", IrType::int()).build();
        let call_f = b.call(f.id, IrType::unit(), vec![]);
        let init = IrDeclaration::AnonymousInitializer(IrAnonymousInitializer {
            id: b.fresh(),
            body: IrBody::new(vec![IrStatement::Expr(call_f)]),
        });
        let call_g = b.call(g.id, IrType::int(), vec![]);
        let x = b.property("x", IrType::int()).initializer(call_g).build();
        let x_id = x.id;
        let ctor = b.constructor(class.id).primary().build();
        class.declarations = vec![IrDeclaration::Constructor(ctor), init, IrDeclaration::Property(x)];
        let mut module = module_with(
            &mut b,
            vec![IrDeclaration::Class(class), IrDeclaration::Function(f), IrDeclaration::Function(g)],
        );

        let lowered = lower(&mut module);

        assert_eq!(assigned(self::class(&module)), vec![x_id]);
        assert!(lowered.attributes.flag(&x_id, keys::INITIALIZED_IN_CONSTRUCTOR_BODY));
    }

    #[test]
    fn test_field_formal_stays() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Point");
        let mut x = b.value_parameter("x", IrType::int());
        let property = b.property("x", IrType::int()).declared_by(&mut x).build();
        let ctor = b.constructor(class.id).primary().with_parameter(x).build();
        class.declarations.push(IrDeclaration::Constructor(ctor));
        class.declarations.push(IrDeclaration::Property(property));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);
        let before = module.clone();

        lower(&mut module);

        assert_eq!(module, before);
    }
}
