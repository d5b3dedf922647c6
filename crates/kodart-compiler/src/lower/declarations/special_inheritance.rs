//! Special inheritance markers
//!
//! `class A : Widget(Interface)` inherits from a target class without
//! calling its constructor. The marker argument decides the clause the
//! supertype ends up in; the marker call itself disappears.

use super::constructors_mut;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{builtins, DelegationKind, IrDeclaration, IrDelegation, IrExpr, NodeId, SuperTypeKind};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

pub struct SpecialInheritance;

impl DeclarationLowering for SpecialInheritance {
    fn name(&self) -> &'static str {
        "special-inheritance"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };

        let mut misused = false;
        for super_type in &class.super_types {
            if !super_type.arguments.iter().any(|a| marker_of(a).is_some()) {
                continue;
            }
            if super_type.ty.class_id().is_some_and(|id| is_source_declaration(id, cx)) {
                cx.report(Diagnostic::new(
                    DiagnosticKind::SpecialInheritanceConstructorMisuse,
                    format!(
                        "'{}' is not a target class; special inheritance only applies to external supertypes",
                        super_type.ty
                    ),
                ));
                misused = true;
            }
        }
        if misused {
            return Transformation::NoChange;
        }

        let mut special: Vec<NodeId> = Vec::new();
        for super_type in &mut class.super_types {
            let Some(marker) = super_type.arguments.iter().find_map(marker_of) else {
                continue;
            };
            let target = super_type.ty.class_id();
            let kind = match marker {
                builtins::INTERFACE_MARKER => SuperTypeKind::Implements,
                builtins::MIXIN_MARKER => SuperTypeKind::Mixin,
                _ => {
                    if target.is_some_and(|id| is_target_mixin(id, cx)) {
                        SuperTypeKind::Mixin
                    } else {
                        SuperTypeKind::Implements
                    }
                }
            };
            tracing::trace!(class = %class.fq_name, super_type = %super_type.ty, ?kind, "special inheritance");
            super_type.kind = Some(kind);
            super_type.arguments.clear();
            special.extend(target);
        }

        for constructor in constructors_mut(&mut class.declarations) {
            let Some(delegation) = &constructor.delegation else {
                continue;
            };
            if delegation.kind != DelegationKind::Super {
                continue;
            }
            let carries_marker = delegation.arguments.iter().flatten().any(|a| marker_of(a).is_some());
            let targets_special = delegation
                .constructor
                .and_then(|c| cx.index.get(c))
                .and_then(|info| info.parent)
                .is_some_and(|parent| special.contains(&parent));
            if carries_marker || targets_special {
                constructor.delegation = Some(IrDelegation {
                    kind: DelegationKind::Super,
                    constructor: None,
                    arguments: Vec::new(),
                });
            }
        }
        Transformation::NoChange
    }
}

fn marker_of(expr: &IrExpr) -> Option<&'static str> {
    [
        builtins::INTERFACE_MARKER,
        builtins::MIXIN_MARKER,
        builtins::INTERFACE_OR_MIXIN_MARKER,
    ]
    .into_iter()
    .find(|m| expr.ty.is(m))
}

fn is_target_mixin(class: NodeId, cx: &LoweringContext<'_>) -> bool {
    cx.index
        .get(class)
        .and_then(|info| info.element.as_ref())
        .and_then(|loc| cx.elements.class(loc).ok())
        .is_some_and(|element| element.is_mixin)
}

fn is_source_declaration(class: NodeId, cx: &LoweringContext<'_>) -> bool {
    let Some(info) = cx.index.get(class) else {
        return false;
    };
    let in_dependency = cx.index.file(info.file).is_some_and(|f| f.is_dependency);
    !in_dependency && !info.is_external
}
