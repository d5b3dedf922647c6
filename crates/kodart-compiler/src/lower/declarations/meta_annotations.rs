//! `package:meta` annotations
//!
//! The target has no `final` classes or members, no `internal` and no
//! `protected`. With `dialect.meta-annotations` enabled they are expressed
//! through the analyzer annotations of `package:meta` instead.

use crate::ir::{DeclKind, DeclOrigin, IrAnnotation, IrDeclaration, Modality, Visibility};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};

pub const META_IMPORT: &str = "package:meta/meta.dart";

/// Qualified names of the emitted annotations; the translator renders the
/// last segment.
pub mod meta {
    pub const SEALED: &str = "dart.meta.sealed";
    pub const NON_VIRTUAL: &str = "dart.meta.nonVirtual";
    pub const INTERNAL: &str = "dart.meta.internal";
    pub const PROTECTED: &str = "dart.meta.protected";
}

pub struct MetaAnnotations;

struct Shape {
    is_class: bool,
    visibility: Visibility,
    modality: Option<Modality>,
    is_static: bool,
}

fn shape(decl: &IrDeclaration) -> Option<Shape> {
    Some(match decl {
        IrDeclaration::Class(c) if c.origin != DeclOrigin::Generated => Shape {
            is_class: true,
            visibility: c.visibility,
            modality: Some(c.modality),
            is_static: false,
        },
        IrDeclaration::Function(f) if f.origin == DeclOrigin::Source => Shape {
            is_class: false,
            visibility: f.visibility,
            modality: Some(f.modality),
            is_static: f.is_static,
        },
        IrDeclaration::Property(p) => Shape {
            is_class: false,
            visibility: p.visibility,
            modality: Some(p.modality),
            is_static: false,
        },
        IrDeclaration::Constructor(c) => Shape {
            is_class: false,
            visibility: c.visibility,
            modality: None,
            is_static: false,
        },
        _ => return None,
    })
}

fn annotations_mut(decl: &mut IrDeclaration) -> Option<&mut Vec<IrAnnotation>> {
    match decl {
        IrDeclaration::Class(c) => Some(&mut c.annotations),
        IrDeclaration::Function(f) => Some(&mut f.annotations),
        IrDeclaration::Property(p) => Some(&mut p.annotations),
        IrDeclaration::Constructor(c) => Some(&mut c.annotations),
        _ => None,
    }
}

impl DeclarationLowering for MetaAnnotations {
    fn name(&self) -> &'static str {
        "meta-annotations"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        if !cx.config.dialect.meta_annotations {
            return Transformation::NoChange;
        }
        let Some(shape) = shape(decl) else {
            return Transformation::NoChange;
        };
        let in_extension = cx
            .index
            .get(decl.id())
            .and_then(|info| info.parent)
            .and_then(|parent| cx.index.get(parent))
            .is_some_and(|parent| parent.kind == DeclKind::Extension);

        let mut added = Vec::new();
        match shape.visibility {
            Visibility::Internal => added.push(meta::INTERNAL),
            Visibility::Protected if !in_extension => added.push(meta::PROTECTED),
            _ => {}
        }
        let is_final = matches!(shape.modality, Some(Modality::Final | Modality::Sealed));
        if is_final && !in_extension {
            if shape.is_class {
                added.push(meta::SEALED);
            } else if !cx.is_top_level() && !shape.is_static {
                added.push(meta::NON_VIRTUAL);
            }
        }
        if added.is_empty() {
            return Transformation::NoChange;
        }

        if let Some(annotations) = annotations_mut(decl) {
            for name in added {
                if !annotations.iter().any(|a| a.fq_name == name) {
                    annotations.push(IrAnnotation::new(name));
                }
            }
        }
        let file = cx.file_id();
        cx.attributes.add_import(file, META_IMPORT);
        Transformation::NoChange
    }
}
