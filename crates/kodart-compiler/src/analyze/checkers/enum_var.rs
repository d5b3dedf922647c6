//! Checker: var-in-enum
//!
//! Enum entries become target constants, so an enum class cannot hold
//! mutable state.

use crate::analyze::checker::*;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{ClassKind, IrDeclaration};

pub struct VarInEnum;

static META: CheckerMeta = CheckerMeta {
    name: "var-in-enum",
    description: "Enum classes only declare read-only properties",
    kind: DiagnosticKind::VarInEnum,
};

impl Checker for VarInEnum {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let IrDeclaration::Class(class) = decl else {
            return vec![];
        };
        if class.kind != ClassKind::Enum {
            return vec![];
        }
        class
            .properties()
            .filter(|p| p.is_var)
            .map(|p| {
                ctx.report(
                    &META,
                    format!("Property '{}' of enum class '{}' cannot be a var", p.name, class.name),
                )
            })
            .collect()
    }
}
