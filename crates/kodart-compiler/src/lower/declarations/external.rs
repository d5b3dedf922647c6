use crate::ir::IrDeclaration;
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

/// Declarations implemented by target code are not emitted. They move to a
/// dependency stub so references to them still resolve.
pub struct ExternalDeclarations;

impl DeclarationLowering for ExternalDeclarations {
    fn name(&self) -> &'static str {
        "external-declarations"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        if !decl.is_external() {
            return Transformation::NoChange;
        }
        tracing::trace!(id = %decl.id(), name = ?decl.name(), "retiring external declaration");
        cx.retire(decl.clone());
        Transformation::remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{DeclIndex, IrType};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    #[test]
    fn test_external_moves_to_dependency_stub() {
        let mut b = IrBuilder::new();
        let external = b.function("native", IrType::int()).external().build();
        let external_id = external.id;
        let kept = b.function("f", IrType::unit()).build();
        let mut module = module_with(&mut b, vec![IrDeclaration::Function(external), IrDeclaration::Function(kept)]);

        let lowered = run(vec![Pass::Declaration(Box::new(ExternalDeclarations))], &mut module);

        assert!(lowered.diagnostics.is_empty());
        assert_eq!(module.files[0].declarations.len(), 1);
        assert_eq!(module.dependency_files.len(), 1);
        assert_eq!(module.dependency_files[0].path, "app/Test.kt");

        let index = DeclIndex::build(&module);
        assert!(index.file_of(external_id).is_some_and(|f| f.is_dependency));
        assert!(module.validate().is_ok());
    }

    #[test]
    fn test_external_member_is_removed_from_class() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Widget");
        let method = b.function("render", IrType::unit()).external().build();
        class.declarations.push(IrDeclaration::Function(method));
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);

        run(vec![Pass::Declaration(Box::new(ExternalDeclarations))], &mut module);

        let IrDeclaration::Class(class) = &module.files[0].declarations[0] else {
            panic!("expected class");
        };
        assert!(class.declarations.is_empty());
    }
}
