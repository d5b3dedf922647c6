use crate::attributes::keys;
use crate::ir::{annotations, IrDeclaration};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

/// Records which declarations are emitted with the target's `const`.
///
/// A class annotated `@const` is always const-constructed. Its constructors
/// follow from that, so classes are marked before their members are seen.
pub struct AnnotateDartConst;

impl DeclarationLowering for AnnotateDartConst {
    fn name(&self) -> &'static str {
        "annotate-dart-const"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        match decl {
            IrDeclaration::Class(class) => {
                let annotated = class.annotations.iter().any(|a| a.fq_name == annotations::CONST);
                if annotated {
                    cx.attributes.set(&*class, keys::DART_CONST, true);
                }
            }
            IrDeclaration::Constructor(constructor) => {
                if cx.constness().is_const_declaration(constructor.id) {
                    cx.attributes.set(&*constructor, keys::DART_CONST, true);
                }
            }
            IrDeclaration::Property(property) => {
                if cx.constness().is_const_declaration(property.id) {
                    cx.attributes.set(&*property, keys::DART_CONST, true);
                    if let Some(field) = &property.backing_field {
                        cx.attributes.set(field, keys::DART_CONST, true);
                    }
                }
            }
            _ => {}
        }
        Transformation::NoChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrAnnotation, IrType};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    #[test]
    fn test_const_declarations_marked() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Color");
        let const_ctor = b.constructor(class.id).primary().const_().build();
        let plain_ctor = b.constructor(class.id).build();
        let ids = (class.id, const_ctor.id, plain_ctor.id);
        class.declarations = vec![IrDeclaration::Constructor(const_ctor), IrDeclaration::Constructor(plain_ctor)];
        let answer = b.int(42);
        let property = b.property("answer", IrType::int()).const_().initializer(answer).build();
        let property_id = property.id;
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class), IrDeclaration::Property(property)]);

        let lowered = run(vec![Pass::Declaration(Box::new(AnnotateDartConst))], &mut module);

        assert!(!lowered.attributes.flag(&ids.0, keys::DART_CONST));
        assert!(lowered.attributes.flag(&ids.1, keys::DART_CONST));
        assert!(!lowered.attributes.flag(&ids.2, keys::DART_CONST));
        assert!(lowered.attributes.flag(&property_id, keys::DART_CONST));
    }

    #[test]
    fn test_annotated_class_makes_every_constructor_const() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Marker");
        class.annotations.push(IrAnnotation::new(annotations::CONST));
        let ctor = b.constructor(class.id).primary().build();
        let ctor_id = ctor.id;
        class.declarations.push(IrDeclaration::Constructor(ctor));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        let lowered = run(vec![Pass::Declaration(Box::new(AnnotateDartConst))], &mut module);

        assert!(lowered.attributes.flag(&ctor_id, keys::DART_CONST));
    }
}
