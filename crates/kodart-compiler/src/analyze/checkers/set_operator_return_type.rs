//! Checker: set-operator-return-type
//!
//! The target's `[]=` operator returns `void`.

use crate::analyze::checker::*;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::IrDeclaration;

pub struct SetOperatorReturnType;

static META: CheckerMeta = CheckerMeta {
    name: "set-operator-return-type",
    description: "`set` operators must return Unit",
    kind: DiagnosticKind::WrongSetOperatorReturnType,
};

impl Checker for SetOperatorReturnType {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        match decl {
            IrDeclaration::Function(f) if f.is_operator && f.name == "set" && !f.return_type.is_unit() => {
                vec![ctx.report(
                    &META,
                    format!("Operator 'set' must return Unit, found '{}'", f.return_type),
                )]
            }
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

    #[test]
    fn test_set_returning_value_flagged() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Grid");
        let bad = b
            .function("set", IrType::int())
            .operator()
            .parameter("i", IrType::int())
            .parameter("v", IrType::int())
            .build();
        let good = b
            .function("set", IrType::unit())
            .operator()
            .parameter("i", IrType::string())
            .parameter("v", IrType::int())
            .build();
        let not_operator = b.function("set", IrType::int()).build();
        class.declarations.push(IrDeclaration::Function(bad));
        class.declarations.push(IrDeclaration::Function(good));
        class.declarations.push(IrDeclaration::Function(not_operator));
        let mut file = b.file("app/Grid.kt", "app");
        file.declarations.push(IrDeclaration::Class(class));
        let mut module = IrModule::new("test");
        module.add_file(file);

        let diags = check(Box::new(SetOperatorReturnType), &module, &CompilerConfig::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind.name(), "WRONG_SET_OPERATOR_RETURN_TYPE");
    }
}
