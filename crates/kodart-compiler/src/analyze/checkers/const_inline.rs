//! Checker: const-inline-function
//!
//! A `@const inline` function is replaced by its returned value wherever it
//! is called with constant arguments. Its body may only declare constants
//! and return once, and the returned value must be constant once the
//! parameters are.

use crate::analyze::checker::*;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{IrDeclaration, IrFunction, IrStatement};

pub struct ConstInlineFunction;

static META: CheckerMeta = CheckerMeta {
    name: "const-inline-function",
    description: "Const inline functions hold const locals and a single constant return",
    kind: DiagnosticKind::ConstInlineFunctionHasInvalidStatement,
};

static MULTIPLE_RETURNS: CheckerMeta = CheckerMeta {
    name: "const-inline-function",
    description: "Const inline functions return once",
    kind: DiagnosticKind::ConstInlineFunctionWithMultipleReturns,
};

static RETURNS_NON_CONST: CheckerMeta = CheckerMeta {
    name: "const-inline-function",
    description: "Const inline functions return a constant",
    kind: DiagnosticKind::ConstInlineFunctionReturnsNonConst,
};

impl Checker for ConstInlineFunction {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        match decl {
            IrDeclaration::Function(function) if function.is_const_inline() => check_function(function, ctx),
            _ => vec![],
        }
    }
}

fn check_function(function: &IrFunction, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
    let Some(body) = &function.body else {
        return vec![];
    };
    let constness = ctx.constness().in_const_inline();
    let mut diagnostics = Vec::new();
    let mut returns = 0;
    for stmt in &body.statements {
        match stmt {
            IrStatement::Return(value) => {
                returns += 1;
                if returns == 2 {
                    diagnostics.push(ctx.report(
                        &MULTIPLE_RETURNS,
                        format!("Const inline function '{}' returns more than once", function.name),
                    ));
                }
                let constant = value.as_ref().is_some_and(|v| constness.is_dart_const(v, true));
                if !constant {
                    diagnostics.push(ctx.report(
                        &RETURNS_NON_CONST,
                        format!("Const inline function '{}' returns a non-constant value", function.name),
                    ));
                }
            }
            IrStatement::Variable(variable) if variable.is_const => {}
            _ => diagnostics.push(ctx.report(
                &META,
                format!(
                    "Const inline function '{}' may only declare constants and return",
                    function.name
                ),
            )),
        }
    }
    if returns == 0 {
        diagnostics.push(ctx.report(
            &RETURNS_NON_CONST,
            format!("Const inline function '{}' does not return a value", function.name),
        ));
    }
    for param in &function.parameters {
        if let Some(default) = &param.default_value {
            if !constness.is_dart_const(default, true) {
                diagnostics.push(ctx.report(
                    &RETURNS_NON_CONST,
                    format!("Default value of '{}' is not a constant", param.name),
                ));
            }
        }
    }
    diagnostics
}
