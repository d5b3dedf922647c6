//! Checker: const-constructor-default-value
//!
//! Default values of a const constructor's parameters must be target
//! constants.

use crate::analyze::checker::*;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::IrDeclaration;

pub struct ConstConstructorParameterDefaultValue;

static META: CheckerMeta = CheckerMeta {
    name: "const-constructor-default-value",
    description: "Const constructors need constant parameter defaults",
    kind: DiagnosticKind::NonConstantDefaultValueInConstConstructor,
};

impl Checker for ConstConstructorParameterDefaultValue {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let IrDeclaration::Constructor(constructor) = decl else {
            return vec![];
        };
        let constness = ctx.constness();
        if !constness.is_const_declaration(constructor.id) {
            return vec![];
        }

        constructor
            .parameters
            .iter()
            .filter(|p| {
                p.default_value
                    .as_ref()
                    .is_some_and(|value| !constness.is_dart_const(value, true))
            })
            .map(|p| {
                ctx.report(
                    &META,
                    format!("Default value of '{}' in a const constructor is not constant", p.name),
                )
            })
            .collect()
    }
}
