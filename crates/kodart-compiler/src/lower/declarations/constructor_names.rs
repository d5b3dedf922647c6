use crate::dart::DartSimpleIdentifier;
use crate::ir::{annotations, find_annotation, IrDeclaration};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

/// The target has no constructor overloading: every secondary constructor
/// becomes a named one, `@DartName` or `$constructor$<n>` where `n` is its
/// position among the class's constructors.
pub struct SecondaryConstructorNames;

impl DeclarationLowering for SecondaryConstructorNames {
    fn name(&self) -> &'static str {
        "secondary-constructor-names"
    }

    fn lower(&self, decl: &mut IrDeclaration, _cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        let constructors = class.declarations.iter_mut().filter_map(|d| match d {
            IrDeclaration::Constructor(c) => Some(c),
            _ => None,
        });
        for (position, constructor) in constructors.enumerate() {
            if constructor.is_primary || constructor.dart_name.is_some() {
                continue;
            }
            let explicit = find_annotation(&constructor.annotations, annotations::DART_NAME)
                .and_then(|a| a.arguments.first())
                .cloned();
            let name = match explicit {
                Some(name) => DartSimpleIdentifier::new(name),
                None => DartSimpleIdentifier::new(format!("constructor${}", position)).as_generated(),
            };
            let name = name.private_if(constructor.visibility.is_private()).value();
            tracing::trace!(class = %class.fq_name, constructor = %name, "named secondary constructor");
            constructor.dart_name = Some(name);
        }
        Transformation::NoChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrAnnotation, IrType, Visibility};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    #[test]
    fn test_secondary_constructors_are_named() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Size");
        let primary = b.constructor(class.id).primary().parameter("w", IrType::int()).build();
        let primary_id = primary.id;
        let from_int = b.constructor(class.id).this_call(primary_id, vec![]).build();
        let mut square = b
            .constructor(class.id)
            .this_call(primary_id, vec![])
            .annotation(IrAnnotation::new(annotations::DART_NAME).with_argument("square"))
            .build();
        square.visibility = Visibility::Private;
        class.declarations = vec![
            IrDeclaration::Constructor(primary),
            IrDeclaration::Constructor(from_int),
            IrDeclaration::Constructor(square),
        ];
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        run(vec![Pass::Declaration(Box::new(SecondaryConstructorNames))], &mut module);

        let IrDeclaration::Class(class) = &module.files[0].declarations[0] else {
            panic!("expected class");
        };
        let names: Vec<Option<&str>> = class
            .declarations
            .iter()
            .filter_map(|d| match d {
                IrDeclaration::Constructor(c) => Some(c.dart_name.as_deref()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec![None, Some("$constructor$1"), Some("_square")]);
    }
}
