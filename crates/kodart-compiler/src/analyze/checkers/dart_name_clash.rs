//! Checker: dart-name-clash
//!
//! The target has no overloading: two declarations in one scope (file top
//! level or class body) must not map to the same target name. Named
//! constructors share the member namespace.

use crate::analyze::checker::*;
use crate::dart::DartSimpleIdentifier;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{annotations, find_annotation, DeclOrigin, IrAnnotation, IrDeclaration, IrFile, Visibility};
use std::collections::BTreeMap;

pub struct DartNameClash;

static META: CheckerMeta = CheckerMeta {
    name: "dart-name-clash",
    description: "Declarations in one scope must have distinct target names",
    kind: DiagnosticKind::DartNameClash,
};

/// Target name of a declaration, `None` for anonymous ones.
fn target_name(decl: &IrDeclaration) -> Option<String> {
    let (name, visibility, annotations): (&str, Visibility, &[IrAnnotation]) = match decl {
        IrDeclaration::Class(c) => (&c.name, c.visibility, &c.annotations),
        IrDeclaration::Function(f) if f.origin != DeclOrigin::DefaultAccessor => {
            (&f.name, f.visibility, &f.annotations)
        }
        IrDeclaration::Property(p) => (&p.name, p.visibility, &p.annotations),
        IrDeclaration::Extension(e) => return Some(e.name.clone()),
        IrDeclaration::Constructor(c) => return c.dart_name.clone(),
        _ => return None,
    };
    let base = find_annotation(annotations, annotations::DART_NAME)
        .and_then(|a| a.arguments.first())
        .map(String::as_str)
        .unwrap_or(name);
    Some(DartSimpleIdentifier::new(base).private_if(visibility.is_private()).value())
}

fn clashes(decls: &[IrDeclaration], scope: &str, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for decl in decls {
        if decl.is_external() {
            continue;
        }
        if let Some(name) = target_name(decl) {
            *seen.entry(name).or_default() += 1;
        }
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, count)| {
            ctx.report(
                &META,
                format!("{} declarations in {} are all named '{}' in the target", count, scope, name),
            )
            .with_note("use @DartName to give one of them a distinct name")
        })
        .collect()
}

impl Checker for DartNameClash {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_file(&self, file: &IrFile, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        clashes(&file.declarations, "the file", ctx)
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        match decl {
            IrDeclaration::Class(class) => clashes(&class.declarations, &format!("class '{}'", class.name), ctx),
            IrDeclaration::Extension(ext) => clashes(&ext.members, &format!("extension '{}'", ext.name), ctx),
            _ => vec![],
        }
    }
}
