//! Objects and companion objects
//!
//! The target has no singletons. An object becomes a class holding its only
//! instance in a static `$instance` property, and references to the object
//! read that property.
//!
//! A companion object is lowered with its owner: it is renamed
//! `$<Owner>Companion`, and the owner gets a static function per public
//! companion function that calls it on the instance, so `Owner.create()`
//! keeps working from target code.

use crate::attributes::keys;
use crate::ir::{ClassKind, IrClass, IrDeclaration, IrExprKind, IrFunction, IrStatement, IrType, NodeId};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use rustc_hash::FxHashSet;

const INSTANCE: &str = "$instance";

pub struct Objects;

impl DeclarationLowering for Objects {
    fn name(&self) -> &'static str {
        "objects"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        if class.kind == ClassKind::Object {
            make_singleton(class, cx);
        }

        let taken: FxHashSet<String> = class
            .declarations
            .iter()
            .filter_map(IrDeclaration::name)
            .map(str::to_owned)
            .collect();
        let owner = class.name.clone();
        let mut redirects = Vec::new();
        for nested in &mut class.declarations {
            let IrDeclaration::Class(companion) = nested else {
                continue;
            };
            if companion.kind != ClassKind::CompanionObject {
                continue;
            }
            companion.name = format!("${}Companion", owner);
            let instance = make_singleton(companion, cx);
            for function in companion.functions() {
                if is_redirectable(function) && !taken.contains(&function.name) {
                    redirects.push(redirect(function, companion, instance, cx));
                }
            }
        }
        class
            .declarations
            .extend(redirects.into_iter().map(IrDeclaration::Function));
        Transformation::NoChange
    }
}

/// Turn `class` into a plain class with a static instance property; returns
/// the property's id.
fn make_singleton(class: &mut IrClass, cx: &mut LoweringContext<'_>) -> NodeId {
    tracing::trace!(class = %class.fq_name, "lowering object");
    class.kind = ClassKind::Class;
    let constructor = match class.primary_constructor() {
        Some(constructor) => constructor.id,
        None => {
            let constructor = cx.builder.constructor(class.id).primary().build();
            let id = constructor.id;
            class.declarations.insert(0, IrDeclaration::Constructor(constructor));
            id
        }
    };
    let ty = class.default_type();
    let value = cx.builder.constructor_call(constructor, ty.clone(), Vec::new());
    let instance = cx.builder.property(INSTANCE, ty).static_().initializer(value).build();
    let id = instance.id;
    cx.attributes.set(&class.id, keys::OBJECT_INSTANCE, id);
    class.declarations.insert(0, IrDeclaration::Property(instance));
    id
}

/// Parameter defaults can read earlier parameters, which a copied
/// signature would not see, so functions with defaults are left out.
fn is_redirectable(function: &IrFunction) -> bool {
    !function.is_static
        && !function.is_override
        && !function.is_extension()
        && !function.visibility.is_private()
        && function.parameters.iter().all(|p| p.default_value.is_none())
}

/// `static R name(params) => Companion.$instance.name(params)`
fn redirect(function: &IrFunction, companion: &IrClass, instance: NodeId, cx: &mut LoweringContext<'_>) -> IrFunction {
    let b = &mut cx.builder;
    let parameters: Vec<_> = function
        .parameters
        .iter()
        .map(|p| {
            let mut param = b.value_parameter(&p.name, p.ty.clone());
            param.annotations = p.annotations.clone();
            param
        })
        .collect();
    let arguments = parameters.iter().map(|p| b.get_param(p)).collect();
    let receiver = b.get_property(instance, companion.default_type(), None);
    let mut call = b.method_call(function.id, function.return_type.clone(), receiver, arguments);
    if let IrExprKind::Call(call) = &mut call.kind {
        call.type_arguments = function
            .type_parameters
            .iter()
            .map(|tp| IrType::type_parameter(tp.name.clone()))
            .collect();
    }
    let statement = if function.return_type.is_unit() {
        IrStatement::Expr(call)
    } else {
        IrStatement::Return(Some(call))
    };

    let mut redirect = b.function(&function.name, function.return_type.clone()).body(vec![statement]).build();
    redirect.is_static = true;
    redirect.parameters = parameters;
    redirect.type_parameters = function
        .type_parameters
        .iter()
        .map(|tp| {
            let mut copy = tp.clone();
            copy.id = b.fresh();
            copy
        })
        .collect();
    redirect.annotations = function.annotations.clone();
    redirect
}
