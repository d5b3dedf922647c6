//! Declaration index
//!
//! Id-keyed summaries of every declaration, parameter and local variable in
//! a module, so passes and the translator can resolve references without
//! holding borrows into the tree they are rewriting.

use super::decl::*;
use super::expr::{IrExpr, IrExprKind, IrStatement, IrVariable};
use super::module::{IrFile, IrModule};
use super::types::IrType;
use super::visit::{self, Visitor};
use super::NodeId;
use crate::element::ElementLocation;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Interface,
    Function,
    Constructor,
    Property,
    Field,
    ValueParameter,
    Variable,
    TypeParameter,
    Extension,
    AnonymousInitializer,
    EnumEntry,
}

/// Summary of one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclInfo {
    pub id: NodeId,
    pub original: Option<NodeId>,
    pub name: String,
    pub kind: DeclKind,
    /// Enclosing declaration; `None` at file level
    pub parent: Option<NodeId>,
    pub file: NodeId,
    pub visibility: Visibility,
    pub modality: Modality,
    pub is_external: bool,
    pub is_const: bool,
    pub is_static: bool,
    pub is_var: bool,
    pub is_operator: bool,
    /// Function declared `inline`
    pub is_inline: bool,
    /// Stored property with default accessors
    pub is_simple_property: bool,
    /// Parameter declares a default value
    pub has_default: bool,
    pub element: Option<ElementLocation>,
    pub annotations: Vec<IrAnnotation>,
    /// Declared or value type; return type for functions
    pub ty: Option<IrType>,
    /// Parameters of functions and constructors, in order
    pub parameters: Vec<NodeId>,
    /// Property owning a backing field, or declared by a parameter
    pub property: Option<NodeId>,
    /// Named constructor name
    pub dart_name: Option<String>,
    /// Qualified name of classes
    pub fq_name: Option<String>,
    pub origin: DeclOrigin,
}

impl DeclInfo {
    /// Function declared `@const inline`.
    pub fn is_const_inline(&self) -> bool {
        self.kind == DeclKind::Function && self.is_inline && self.has_annotation(annotations::CONST)
    }

    fn new(id: NodeId, name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            id,
            original: None,
            name: name.into(),
            kind,
            parent: None,
            file: NodeId(0),
            visibility: Visibility::Public,
            modality: Modality::Final,
            is_external: false,
            is_const: false,
            is_static: false,
            is_var: false,
            is_operator: false,
            is_inline: false,
            is_simple_property: false,
            has_default: false,
            element: None,
            annotations: Vec::new(),
            ty: None,
            parameters: Vec::new(),
            property: None,
            dart_name: None,
            fq_name: None,
            origin: DeclOrigin::Source,
        }
    }

    pub fn has_annotation(&self, fq_name: &str) -> bool {
        find_annotation(&self.annotations, fq_name).is_some()
    }

    pub fn annotation_argument(&self, fq_name: &str) -> Option<&str> {
        find_annotation(&self.annotations, fq_name)
            .and_then(|a| a.arguments.first())
            .map(String::as_str)
    }

    pub fn is_class_like(&self) -> bool {
        matches!(self.kind, DeclKind::Class | DeclKind::Interface)
    }
}

/// Where a file lives.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub path: String,
    pub package: String,
    pub is_dependency: bool,
}

/// Index over every declaration of a module.
#[derive(Debug, Default)]
pub struct DeclIndex {
    decls: FxHashMap<NodeId, DeclInfo>,
    files: FxHashMap<NodeId, FileInfo>,
}

impl DeclIndex {
    /// Index source files and dependency stubs.
    pub fn build(module: &IrModule) -> Self {
        let mut index = Self::default();
        for file in &module.files {
            index.add_file(file, false);
        }
        for file in &module.dependency_files {
            index.add_file(file, true);
        }
        tracing::trace!(declarations = index.decls.len(), "built declaration index");
        index
    }

    fn add_file(&mut self, file: &IrFile, is_dependency: bool) {
        self.files.insert(
            file.id,
            FileInfo {
                path: file.path.clone(),
                package: file.package.clone(),
                is_dependency,
            },
        );
        let mut indexer = Indexer {
            index: self,
            file: file.id,
            parents: Vec::new(),
        };
        for decl in &file.declarations {
            indexer.visit_declaration(decl);
        }
    }

    /// Add a declaration created after the index was built.
    pub fn insert(&mut self, info: DeclInfo) {
        self.decls.insert(info.id, info);
    }

    pub fn get(&self, id: NodeId) -> Option<&DeclInfo> {
        self.decls.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.decls.contains_key(&id)
    }

    pub fn file(&self, id: NodeId) -> Option<&FileInfo> {
        self.files.get(&id)
    }

    /// File the declaration is in.
    pub fn file_of(&self, id: NodeId) -> Option<&FileInfo> {
        self.get(id).and_then(|info| self.file(info.file))
    }

    /// Canonical identity of a declaration.
    pub fn canonical(&self, id: NodeId) -> NodeId {
        self.get(id).and_then(|info| info.original).unwrap_or(id)
    }

    /// Closest enclosing class or extension.
    pub fn enclosing_class(&self, id: NodeId) -> Option<&DeclInfo> {
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            let info = self.get(parent)?;
            if info.is_class_like() || info.kind == DeclKind::Extension {
                return Some(info);
            }
            current = info.parent;
        }
        None
    }

    pub fn parameters(&self, id: NodeId) -> impl Iterator<Item = &DeclInfo> {
        self.get(id)
            .map(|info| info.parameters.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |p| self.get(*p))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

struct Indexer<'a> {
    index: &'a mut DeclIndex,
    file: NodeId,
    parents: Vec<NodeId>,
}

impl Indexer<'_> {
    fn add(&mut self, mut info: DeclInfo) {
        info.parent = self.parents.last().copied();
        info.file = self.file;
        self.index.decls.insert(info.id, info);
    }

    fn nested(&mut self, id: NodeId, f: impl FnOnce(&mut Self)) {
        self.parents.push(id);
        f(self);
        self.parents.pop();
    }

    fn add_type_parameters(&mut self, params: &[IrTypeParameter]) {
        for tp in params {
            self.add(DeclInfo::new(tp.id, tp.name.clone(), DeclKind::TypeParameter));
        }
    }

    fn add_function(&mut self, function: &IrFunction) {
        let mut info = DeclInfo::new(function.id, function.name.clone(), DeclKind::Function);
        info.original = function.original;
        info.visibility = function.visibility;
        info.modality = function.modality;
        info.is_external = function.is_external;
        info.is_static = function.is_static;
        info.is_operator = function.is_operator;
        info.is_inline = function.is_inline;
        info.element = function.element.clone();
        info.annotations = function.annotations.clone();
        info.ty = Some(function.return_type.clone());
        info.parameters = function.parameters.iter().map(|p| p.id).collect();
        info.origin = function.origin;
        self.add(info);
    }
}

impl Visitor for Indexer<'_> {
    fn visit_declaration(&mut self, decl: &IrDeclaration) {
        match decl {
            IrDeclaration::Class(class) => {
                let kind = if class.is_interface() {
                    DeclKind::Interface
                } else {
                    DeclKind::Class
                };
                let mut info = DeclInfo::new(class.id, class.name.clone(), kind);
                info.original = class.original;
                info.visibility = class.visibility;
                info.modality = class.modality;
                info.is_external = class.is_external;
                info.element = class.element.clone();
                info.annotations = class.annotations.clone();
                info.fq_name = Some(class.fq_name.clone());
                info.origin = class.origin;
                info.ty = Some(class.default_type());
                self.add(info);
                self.nested(class.id, |this| {
                    this.add_type_parameters(&class.type_parameters);
                    for entry in &class.enum_entries {
                        let mut info = DeclInfo::new(entry.id, entry.name.clone(), DeclKind::EnumEntry);
                        info.is_const = true;
                        info.is_static = true;
                        info.ty = Some(class.default_type());
                        this.add(info);
                    }
                    visit::walk_class(this, class);
                });
            }
            IrDeclaration::Function(function) => self.visit_function(function),
            IrDeclaration::Constructor(constructor) => {
                let mut info = DeclInfo::new(constructor.id, "<init>", DeclKind::Constructor);
                info.original = constructor.original;
                info.visibility = constructor.visibility;
                info.is_const = constructor.is_const;
                info.is_external = constructor.is_external;
                info.element = constructor.element.clone();
                info.annotations = constructor.annotations.clone();
                info.parameters = constructor.parameters.iter().map(|p| p.id).collect();
                info.dart_name = constructor.dart_name.clone();
                self.add(info);
                self.nested(constructor.id, |this| visit::walk_constructor(this, constructor));
            }
            IrDeclaration::Property(property) => {
                let mut info = DeclInfo::new(property.id, property.name.clone(), DeclKind::Property);
                info.original = property.original;
                info.visibility = property.visibility;
                info.modality = property.modality;
                info.is_external = property.is_external;
                info.is_const = property.is_const;
                info.is_var = property.is_var;
                info.is_static = property.backing_field.as_ref().is_some_and(|f| f.is_static);
                info.is_simple_property = property.is_simple();
                info.element = property.element.clone();
                info.annotations = property.annotations.clone();
                info.ty = Some(property.ty.clone());
                self.add(info);
                self.nested(property.id, |this| visit::walk_property(this, property));
            }
            IrDeclaration::Field(field) => self.visit_field(field),
            IrDeclaration::AnonymousInitializer(init) => {
                self.add(DeclInfo::new(init.id, "<init-block>", DeclKind::AnonymousInitializer));
                self.nested(init.id, |this| visit::walk_declaration(this, decl));
            }
            IrDeclaration::Extension(extension) => {
                let mut info = DeclInfo::new(extension.id, extension.name.clone(), DeclKind::Extension);
                info.visibility = extension.visibility;
                info.ty = Some(extension.on.clone());
                self.add(info);
                self.nested(extension.id, |this| {
                    this.add_type_parameters(&extension.type_parameters);
                    visit::walk_declaration(this, decl);
                });
            }
        }
    }

    fn visit_function(&mut self, function: &IrFunction) {
        self.add_function(function);
        self.nested(function.id, |this| {
            this.add_type_parameters(&function.type_parameters);
            visit::walk_function(this, function);
        });
    }

    fn visit_field(&mut self, field: &IrField) {
        let mut info = DeclInfo::new(field.id, field.name.clone(), DeclKind::Field);
        info.original = field.original;
        info.visibility = field.visibility;
        info.is_static = field.is_static;
        info.is_var = !field.is_final;
        info.property = field.property.or_else(|| self.parents.last().copied());
        info.ty = Some(field.ty.clone());
        self.add(info);
        visit::walk_field(self, field);
    }

    fn visit_value_parameter(&mut self, param: &IrValueParameter) {
        let mut info = DeclInfo::new(param.id, param.name.clone(), DeclKind::ValueParameter);
        info.original = param.original;
        info.has_default = param.default_value.is_some();
        info.property = param.corresponding_property;
        info.element = param.element.clone();
        info.annotations = param.annotations.clone();
        info.ty = Some(param.ty.clone());
        self.add(info);
        visit::walk_value_parameter(self, param);
    }

    fn visit_variable(&mut self, variable: &IrVariable) {
        let mut info = DeclInfo::new(variable.id, variable.name.clone(), DeclKind::Variable);
        info.is_const = variable.is_const;
        info.is_var = variable.is_var;
        info.ty = Some(variable.ty.clone());
        self.add(info);
        visit::walk_variable(self, variable);
    }

    fn visit_statement(&mut self, stmt: &IrStatement) {
        visit::walk_statement(self, stmt);
    }

    fn visit_expr(&mut self, expr: &IrExpr) {
        if let IrExprKind::Lambda(function) = &expr.kind {
            self.visit_function(function);
            return;
        }
        visit::walk_expr(self, expr);
    }
}
