use crate::ir::{
    builtins, ClassKind, DeclIndex, DeclKind, DeclOrigin, IrDeclaration, IrType, Modality, SuperTypeKind,
};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

/// Interfaces become abstract classes, and every supertype gets the clause
/// it is rendered in.
pub struct InterfaceToAbstractClass;

impl DeclarationLowering for InterfaceToAbstractClass {
    fn name(&self) -> &'static str {
        "interface-to-abstract-class"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };

        class.super_types.retain(|s| !s.ty.is(builtins::ANY));
        for super_type in &mut class.super_types {
            if super_type.kind.is_none() {
                super_type.kind = Some(composition_of(&super_type.ty, &cx.index));
            }
        }

        if !class.is_interface() {
            return Transformation::NoChange;
        }
        tracing::trace!(class = %class.fq_name, "interface to abstract class");
        class.kind = ClassKind::Class;
        class.modality = Modality::Abstract;
        for member in &mut class.declarations {
            match member {
                IrDeclaration::Function(function) if function.body.is_none() && !function.is_external => {
                    function.modality = Modality::Abstract;
                }
                IrDeclaration::Property(property) if is_declared_only(property) => {
                    property.modality = Modality::Abstract;
                }
                _ => {}
            }
        }
        Transformation::NoChange
    }
}

/// Superclasses are extended, everything else is implemented.
fn composition_of(ty: &IrType, index: &DeclIndex) -> SuperTypeKind {
    match ty.class_id().and_then(|id| index.get(id)) {
        Some(info) if info.kind == DeclKind::Class => SuperTypeKind::Extends,
        _ => SuperTypeKind::Implements,
    }
}

/// An interface property without a field or custom accessors.
fn is_declared_only(property: &crate::ir::IrProperty) -> bool {
    let default = |f: &Option<crate::ir::IrFunction>| {
        f.as_ref()
            .map_or(true, |f| f.origin == DeclOrigin::DefaultAccessor || f.body.is_none())
    };
    property.backing_field.is_none() && default(&property.getter) && default(&property.setter)
}
