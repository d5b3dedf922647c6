use crate::ir::{builtins, ClassKind, DelegationKind, IrDeclaration, IrDelegation, IrType};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

/// Enum classes become plain classes with a const constructor and one
/// `static const` property per entry.
///
/// The constructor takes the entry's `name` and `ordinal` ahead of the
/// declared parameters, and each entry property keeps the entry's id, so
/// references to the entry resolve to the property.
pub struct EnumClasses;

impl DeclarationLowering for EnumClasses {
    fn name(&self) -> &'static str {
        "enum-classes"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        if class.kind != ClassKind::Enum {
            return Transformation::NoChange;
        }
        tracing::trace!(class = %class.fq_name, entries = class.enum_entries.len(), "lowering enum");
        class.kind = ClassKind::Class;
        class.super_types.retain(|s| !s.ty.is(builtins::ENUM));

        let b = &mut cx.builder;
        let mut name = b.value_parameter("name", IrType::string());
        let mut ordinal = b.value_parameter("ordinal", IrType::int());
        let name_property = b.property("name", IrType::string()).declared_by(&mut name).build();
        let ordinal_property = b.property("ordinal", IrType::int()).declared_by(&mut ordinal).build();
        let constructor = match class.primary_constructor_mut() {
            Some(constructor) => {
                constructor.is_const = true;
                constructor.parameters.splice(0..0, [name, ordinal]);
                constructor.delegation = Some(root_delegation());
                constructor.id
            }
            None => {
                let constructor = b
                    .constructor(class.id)
                    .primary()
                    .const_()
                    .with_parameter(name)
                    .with_parameter(ordinal)
                    .build();
                let id = constructor.id;
                class.declarations.insert(0, IrDeclaration::Constructor(constructor));
                id
            }
        };

        let ty = class.default_type();
        let mut entries = Vec::with_capacity(class.enum_entries.len() + 2);
        for (ordinal, entry) in std::mem::take(&mut class.enum_entries).into_iter().enumerate() {
            let mut arguments = vec![Some(b.string(&entry.name)), Some(b.int(ordinal as i64))];
            arguments.extend(entry.arguments);
            let value = b.constructor_call(constructor, ty.clone(), arguments);
            let property = b
                .property(&entry.name, ty.clone())
                .id(entry.id)
                .const_()
                .static_()
                .initializer(value)
                .build();
            entries.push(IrDeclaration::Property(property));
        }
        entries.push(IrDeclaration::Property(name_property));
        entries.push(IrDeclaration::Property(ordinal_property));
        class.declarations.splice(0..0, entries);
        Transformation::NoChange
    }
}

/// The implicit `super()` of a class without a superclass.
fn root_delegation() -> IrDelegation {
    IrDelegation {
        kind: DelegationKind::Super,
        constructor: None,
        arguments: Vec::new(),
    }
}
