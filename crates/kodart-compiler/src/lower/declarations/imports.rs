//! Imports
//!
//! Every file-level declaration is scanned for the declarations it names.
//! A name from another source file is imported by relative path; a name
//! from a dependency is imported through the library of its target element.

use crate::ir::visit::{self, Visitor};
use crate::ir::{
    Callee, DeclKind, IrClass, IrDeclaration, IrExpr, IrExprKind, IrField, IrFunction, IrProperty, IrType,
    IrTypeKind, IrValueParameter, IrVariable, NodeId,
};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use crate::translate::names::{output_path_for, relative_import};
use std::collections::BTreeSet;

/// Libraries every target file sees without an import.
const IMPLICIT_LIBRARIES: &[&str] = &["dart:core"];

pub struct Imports;

impl DeclarationLowering for Imports {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        if !cx.is_top_level() {
            return Transformation::NoChange;
        }
        let mut references = References::default();
        references.visit_declaration(decl);

        let current = output_path_for(cx.file_path());
        let file = cx.file_id();
        let mut uris = BTreeSet::new();
        for id in references.ids {
            let Some(owner) = importable_owner(id, cx) else {
                continue;
            };
            let Some(info) = cx.index.get(owner) else {
                continue;
            };
            if info.file == file {
                continue;
            }
            let Some(target) = cx.index.file(info.file) else {
                continue;
            };
            let uri = if target.is_dependency {
                match &info.element {
                    Some(element) => element.library_uri().to_string(),
                    None => continue,
                }
            } else {
                relative_import(&current, &output_path_for(&target.path))
            };
            if !IMPLICIT_LIBRARIES.contains(&uri.as_str()) {
                uris.insert(uri);
            }
        }
        for uri in uris {
            tracing::trace!(file = %cx.file_path(), %uri, "import");
            cx.attributes.add_import(file, uri);
        }
        Transformation::NoChange
    }
}

/// The declaration whose library has to be imported to use `id`: itself for
/// classes and file-level declarations, the enclosing class or extension for
/// constructors and extension members. Instance members need no import.
fn importable_owner(id: NodeId, cx: &LoweringContext<'_>) -> Option<NodeId> {
    let info = cx.index.get(id)?;
    match info.kind {
        DeclKind::Class | DeclKind::Interface | DeclKind::Extension => Some(id),
        DeclKind::Constructor | DeclKind::EnumEntry => info.parent,
        DeclKind::Function | DeclKind::Property | DeclKind::Field => match info.parent {
            None => Some(id),
            Some(parent) => {
                let parent = cx.index.get(parent)?;
                match parent.kind {
                    DeclKind::Extension => Some(parent.id),
                    // Accessors and backing fields of file-level properties.
                    DeclKind::Property if parent.parent.is_none() => Some(parent.id),
                    // Static members are reached through their class.
                    DeclKind::Class if info.is_static => Some(parent.id),
                    _ => None,
                }
            }
        },
        _ => None,
    }
}

#[derive(Default)]
struct References {
    ids: BTreeSet<NodeId>,
}

impl References {
    fn add_type(&mut self, ty: &IrType) {
        match &ty.kind {
            IrTypeKind::Class { class, arguments, .. } => {
                if let Some(class) = class {
                    self.ids.insert(*class);
                }
                for arg in arguments {
                    self.add_type(arg);
                }
            }
            IrTypeKind::Function {
                parameters,
                return_type,
            } => {
                for p in parameters {
                    self.add_type(p);
                }
                self.add_type(return_type);
            }
            IrTypeKind::TypeParameter { .. } | IrTypeKind::Dynamic => {}
        }
    }
}

impl Visitor for References {
    fn visit_class(&mut self, class: &IrClass) {
        for super_type in &class.super_types {
            self.add_type(&super_type.ty);
        }
        for tp in &class.type_parameters {
            for bound in &tp.bounds {
                self.add_type(bound);
            }
        }
        visit::walk_class(self, class);
    }

    fn visit_function(&mut self, function: &IrFunction) {
        self.add_type(&function.return_type);
        for tp in &function.type_parameters {
            for bound in &tp.bounds {
                self.add_type(bound);
            }
        }
        visit::walk_function(self, function);
    }

    fn visit_property(&mut self, property: &IrProperty) {
        self.add_type(&property.ty);
        visit::walk_property(self, property);
    }

    fn visit_field(&mut self, field: &IrField) {
        self.add_type(&field.ty);
        visit::walk_field(self, field);
    }

    fn visit_value_parameter(&mut self, param: &IrValueParameter) {
        self.add_type(&param.ty);
        visit::walk_value_parameter(self, param);
    }

    fn visit_variable(&mut self, variable: &IrVariable) {
        self.add_type(&variable.ty);
        visit::walk_variable(self, variable);
    }

    fn visit_declaration(&mut self, decl: &IrDeclaration) {
        if let IrDeclaration::Extension(extension) = decl {
            self.add_type(&extension.on);
        }
        visit::walk_declaration(self, decl);
    }

    fn visit_expr(&mut self, expr: &IrExpr) {
        match &expr.kind {
            IrExprKind::GetProperty { property, .. } | IrExprKind::SetProperty { property, .. } => {
                self.ids.insert(*property);
            }
            IrExprKind::GetField { field, .. } | IrExprKind::SetField { field, .. } => {
                self.ids.insert(*field);
            }
            IrExprKind::Call(call) => {
                if let Callee::Function(id) = &call.callee {
                    self.ids.insert(*id);
                }
                for ty in &call.type_arguments {
                    self.add_type(ty);
                }
            }
            IrExprKind::ConstructorCall(call) => {
                self.ids.insert(call.constructor);
                self.add_type(&expr.ty);
            }
            IrExprKind::TypeOp { argument, .. } => self.add_type(argument),
            IrExprKind::GetObject { class } => {
                self.ids.insert(*class);
            }
            IrExprKind::GetEnumEntry { entry } => {
                self.ids.insert(*entry);
            }
            _ => {}
        }
        visit::walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::keys;
    use crate::element::ElementLocation;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrFile, IrModule, IrStatement};
    use crate::lower::declarations::test_support::run;
    use crate::lower::Pass;

    #[test]
    fn test_source_and_dependency_imports() {
        let mut b = IrBuilder::new();

        let shape = b.class("geometry.Shape");
        let shape_type = shape.default_type();
        let mut geometry: IrFile = b.file("geometry/Shape.kt", "geometry");
        geometry.declarations.push(IrDeclaration::Class(shape));

        let mut immutable = b.class("meta.Immutable");
        immutable.element = ElementLocation::parse("package:meta/meta.dart;meta.dart;Immutable");
        let immutable_type = immutable.default_type();
        let mut meta = b.file("meta/Meta.kt", "meta");
        meta.declarations.push(IrDeclaration::Class(immutable));

        let user = b
            .function("draw", IrType::unit())
            .parameter("shape", shape_type)
            .parameter("tag", immutable_type)
            .body(vec![IrStatement::Return(None)])
            .build();
        let local = b.function("local", IrType::unit()).body(vec![]).build();
        let mut app = b.file("app/Main.kt", "app");
        app.declarations = vec![IrDeclaration::Function(user), IrDeclaration::Function(local)];
        let app_id = app.id;

        let mut module = IrModule::new("test");
        module.add_file(app);
        module.add_file(geometry);
        module.add_dependency_file(meta);

        let lowered = run(vec![Pass::Declaration(Box::new(Imports))], &mut module);

        let imports: Vec<&str> = lowered
            .attributes
            .get(&app_id, keys::DART_IMPORTS)
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(imports, vec!["../geometry/shape.dart", "package:meta/meta.dart"]);
    }

    #[test]
    fn test_same_file_needs_no_import() {
        let mut b = IrBuilder::new();
        let class = b.class("app.Point");
        let ty = class.default_type();
        let user = b.function("origin", ty).body(vec![]).build();
        let mut file = b.file("app/Point.kt", "app");
        file.declarations = vec![IrDeclaration::Class(class), IrDeclaration::Function(user)];
        let file_id = file.id;
        let mut module = IrModule::new("test");
        module.add_file(file);

        let lowered = run(vec![Pass::Declaration(Box::new(Imports))], &mut module);

        assert!(lowered.attributes.get(&file_id, keys::DART_IMPORTS).is_none());
    }
}
