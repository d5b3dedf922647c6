//! Complex parameters
//!
//! Target default values must be constants. A parameter with any other
//! default gets a constant placeholder instead, and the real default is
//! computed on entry:
//!
//! - non-nullable `x: T = e` becomes `T? x = null`, resolved as `x ?? e`
//! - nullable `x: T? = e` becomes `dynamic x = const _$DefaultValue()`,
//!   resolved as `x is _$DefaultValue ? e : x as T?`
//!
//! A constructor parameter that declares a property initializes it from the
//! initializer list when `e` does not need `this`, and from the body
//! otherwise.

use crate::attributes::keys::{self, GeneratedHelper};
use crate::ir::builder::IrBuilder;
use crate::ir::visit::any_expr;
use crate::ir::{
    DeclOrigin, IrBinaryOp, IrClass, IrConstructor, IrDeclaration, IrExpr, IrExprKind, IrFieldInitializer,
    IrStatement, IrType, IrValueParameter, NodeId, TypeOperator, Visibility,
};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

pub struct ComplexParameters;

const DEFAULT_VALUE_HELPER: &str = "DefaultValue";

impl DeclarationLowering for ComplexParameters {
    fn name(&self) -> &'static str {
        "complex-parameters"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        match decl {
            IrDeclaration::Function(function) => {
                let mut prologue = Vec::new();
                for param in &mut function.parameters {
                    if let Some(lowered) = lower_parameter(param, cx) {
                        prologue.push(assign_resolved(&mut cx.builder, param, lowered.resolved));
                    }
                }
                if let Some(body) = &mut function.body {
                    body.statements.splice(0..0, prologue);
                }
            }
            IrDeclaration::Class(class) => {
                for decl in &mut class.declarations {
                    if let IrDeclaration::Constructor(constructor) = decl {
                        lower_constructor(constructor, cx);
                    }
                }
                clear_moved_initializers(class, cx);
            }
            _ => {}
        }
        Transformation::NoChange
    }
}

/// Constructors are lowered with their class, so the properties they take
/// over can be updated in the same step.
fn lower_constructor(constructor: &mut IrConstructor, cx: &mut LoweringContext<'_>) {
    let class = constructor.class;
    let this_type = cx.index.get(class).and_then(|i| i.ty.clone()).unwrap_or_else(IrType::any);
    let mut prologue = Vec::new();
    let mut assignments = Vec::new();
    for param in &mut constructor.parameters {
        let Some(lowered) = lower_parameter(param, cx) else {
            continue;
        };
        let Some(property) = param.corresponding_property else {
            prologue.push(assign_resolved(&mut cx.builder, param, lowered.resolved));
            continue;
        };

        // The property no longer comes from a field formal.
        param.corresponding_property = None;
        if lowered.needs_this {
            prologue.push(assign_resolved(&mut cx.builder, param, lowered.resolved));
            let this = cx.builder.this_of(class, this_type.clone());
            let value = cx.builder.get_param(param);
            assignments.push(IrStatement::Expr(cx.builder.set_property(property, Some(this), value)));
            cx.attributes.set(&property, keys::INITIALIZED_IN_CONSTRUCTOR_BODY, true);
        } else {
            constructor.initializer_list.push(IrFieldInitializer {
                property,
                value: lowered.resolved,
            });
            cx.attributes.set(&property, keys::INITIALIZED_IN_FIELD_INITIALIZER_LIST, true);
        }
        tracing::trace!(param = %param.name, property = %property, "property parameter with complex default");
    }
    prologue.append(&mut assignments);
    if !prologue.is_empty() {
        cx.attributes.set(&*constructor, keys::PARAMETER_PROLOGUE_LEN, prologue.len());
        constructor.body.statements.splice(0..0, prologue);
    }
}

struct LoweredParameter {
    /// The parameter's value after applying the real default
    resolved: IrExpr,
    needs_this: bool,
}

/// Replace a non-constant default by its placeholder. Returns `None` when
/// the parameter needs nothing.
fn lower_parameter(param: &mut IrValueParameter, cx: &mut LoweringContext<'_>) -> Option<LoweredParameter> {
    let default = param.default_value.as_ref()?;
    if cx.constness().is_dart_const(default, true) {
        return None;
    }
    let real = param.default_value.take()?;
    let needs_this = any_expr(&real, |e| matches!(e.kind, IrExprKind::This { .. }));
    let original_type = param.ty.clone();
    tracing::trace!(param = %param.name, ty = %original_type, "complex default value");

    let resolved = if !original_type.nullable {
        param.ty = original_type.make_nullable();
        param.default_value = Some(cx.builder.null(original_type.clone()));
        let current = cx.builder.get_param(param);
        cx.builder.binary(IrBinaryOp::IfNull, original_type, current, real)
    } else {
        let helper = default_value_helper(cx);
        let marker_type = IrType::class(helper.fq_name.clone(), helper.class);
        let mut placeholder = cx.builder.constructor_call(helper.constructor, marker_type.clone(), Vec::new());
        if let IrExprKind::ConstructorCall(call) = &mut placeholder.kind {
            call.const_annotated = true;
        }
        param.ty = IrType::dynamic();
        param.default_value = Some(placeholder);

        let current = cx.builder.get_param(param);
        let check = cx.builder.type_op(TypeOperator::InstanceOf, IrType::boolean(), current, marker_type);
        let current = cx.builder.get_param(param);
        let cast = cx
            .builder
            .type_op(TypeOperator::Cast, original_type.clone(), current, original_type.clone());
        cx.builder.conditional(original_type, check, real, cast)
    };
    Some(LoweredParameter { resolved, needs_this })
}

fn assign_resolved(b: &mut IrBuilder, param: &IrValueParameter, resolved: IrExpr) -> IrStatement {
    IrStatement::Expr(b.set_value(param.id, resolved))
}

/// The per-file `_$DefaultValue` class with a const constructor.
fn default_value_helper(cx: &mut LoweringContext<'_>) -> GeneratedHelper {
    let helper = cx.helper(DEFAULT_VALUE_HELPER, |b, fq_name| {
        let mut class = b.class(fq_name);
        class.visibility = Visibility::Private;
        class.origin = DeclOrigin::Generated;
        let constructor = b.constructor(class.id).primary().const_().build();
        class.declarations.push(IrDeclaration::Constructor(constructor));
        class
    });
    cx.attributes.set(&helper.class, keys::DART_CONST, true);
    helper
}

/// Drop the field initializers of properties whose parameter no longer
/// declares them.
fn clear_moved_initializers(class: &mut IrClass, cx: &LoweringContext<'_>) {
    let moved: Vec<NodeId> = class
        .properties()
        .filter(|p| {
            cx.attributes.flag(*p, keys::INITIALIZED_IN_FIELD_INITIALIZER_LIST)
                || cx.attributes.flag(*p, keys::INITIALIZED_IN_CONSTRUCTOR_BODY)
        })
        .map(|p| p.id)
        .collect();
    for decl in &mut class.declarations {
        if let IrDeclaration::Property(property) = decl {
            if moved.contains(&property.id) {
                if let Some(field) = &mut property.backing_field {
                    field.initializer = None;
                }
            }
        }
    }
}
