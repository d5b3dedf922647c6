//! Checker: const-val-initializer
//!
//! A `const` property or local must be initialized with a value the target
//! can evaluate at compile time. The upstream check is suppressed because it
//! knows nothing about target constructors, so it is redone here.

use crate::analyze::checker::*;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{IrDeclaration, IrStatement};

pub struct ConstValInitializer;

static META: CheckerMeta = CheckerMeta {
    name: "const-val-initializer",
    description: "Const declarations need a target-constant initializer",
    kind: DiagnosticKind::ConstInitializedWithNonConstantValue,
};

impl Checker for ConstValInitializer {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let IrDeclaration::Property(property) = decl else {
            return vec![];
        };
        if !property.is_const {
            return vec![];
        }
        match property.initializer() {
            Some(init) if !ctx.constness().is_dart_const(init, true) => vec![ctx.report(
                &META,
                format!("Const property '{}' is initialized with a non-constant value", property.name),
            )],
            _ => vec![],
        }
    }

    fn check_statement(&self, stmt: &IrStatement, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let IrStatement::Variable(variable) = stmt else {
            return vec![];
        };
        if !variable.is_const {
            return vec![];
        }
        match &variable.initializer {
            Some(init) if !ctx.constness().is_dart_const(init, true) => vec![ctx.report(
                &META,
                format!("Const variable '{}' is initialized with a non-constant value", variable.name),
            )],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::checkers::test_support::check;
    use crate::config::CompilerConfig;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrModule, IrType};

    fn module_with(b: &mut IrBuilder, const_ctor: bool) -> IrModule {
        let mut class = b.class("app.Test");
        let ctor = if const_ctor {
            b.constructor(class.id).primary().const_().build()
        } else {
            b.constructor(class.id).primary().build()
        };
        let ctor_id = ctor.id;
        let ty = class.default_type();
        class.declarations.push(IrDeclaration::Constructor(ctor));

        let call = b.constructor_call(ctor_id, ty.clone(), vec![]);
        let property = b.property("test", ty).const_().initializer(call).build();

        let mut file = b.file("app/Test.kt", "app");
        file.declarations.push(IrDeclaration::Class(class));
        file.declarations.push(IrDeclaration::Property(property));
        let mut module = IrModule::new("test");
        module.add_file(file);
        module
    }

    #[test]
    fn test_non_const_constructor_flagged() {
        let mut b = IrBuilder::new();
        let module = module_with(&mut b, false);
        let diags = check(Box::new(ConstValInitializer), &module, &CompilerConfig::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind.name(), "CONST_INITIALIZED_WITH_NON_CONSTANT_VALUE");
    }

    #[test]
    fn test_const_constructor_ok() {
        let mut b = IrBuilder::new();
        let module = module_with(&mut b, true);
        let diags = check(Box::new(ConstValInitializer), &module, &CompilerConfig::default());
        assert!(diags.is_empty(), "got: {:?}", diags);
    }

    #[test]
    fn test_const_local_variable() {
        let mut b = IrBuilder::new();
        let one = b.int(1);
        let mut ok = b.variable("a", IrType::int(), Some(one));
        ok.is_const = true;
        let read = b.get_variable(&ok);
        let mut alias = b.variable("b", IrType::int(), Some(read));
        alias.is_const = true;
        let mut from_var = b.variable("c", IrType::int(), None);
        from_var.is_var = true;
        let read_var = b.get_variable(&from_var);
        let mut bad = b.variable("d", IrType::int(), Some(read_var));
        bad.is_const = true;

        let function = b
            .function("f", IrType::unit())
            .body(vec![
                IrStatement::Variable(ok),
                IrStatement::Variable(alias),
                IrStatement::Variable(from_var),
                IrStatement::Variable(bad),
            ])
            .build();
        let mut file = b.file("app/F.kt", "app");
        file.declarations.push(IrDeclaration::Function(function));
        let mut module = IrModule::new("test");
        module.add_file(file);

        let diags = check(Box::new(ConstValInitializer), &module, &CompilerConfig::default());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'d'"));
    }
}
