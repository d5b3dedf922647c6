//! IR to target AST translation
//!
//! A total mapping from lowered IR to [`crate::dart`] nodes, one file at a
//! time. Every shape the lowering pipeline can leave behind has exactly one
//! translation; anything else is an [`InternalError`], never a diagnostic.
//!
//! # Structure
//!
//! - `declarations` - Classes, members, properties and extensions
//! - `statements` - Statement lists and local variables
//! - `expressions` - Expressions, calls and argument lists
//! - `types` - Type annotations and the builtin type table
//! - `names` - Output paths and declaration names

mod declarations;
mod expressions;
pub mod names;
mod statements;
mod types;

use crate::attributes::{keys, AttributeStore};
use crate::dart::{DartAnnotation, DartCompilationUnit, DartDirective, DartImportDirective, DartSimpleIdentifier};
use crate::element::ElementIndex;
use crate::error::InternalError;
use crate::ir::visit::{self, Visitor};
use crate::ir::{
    DeclIndex, DeclInfo, DeclKind, IrAnnotation, IrExpr, IrFile, IrModule, IrValueParameter, IrVariable, NodeId,
    VariableOrigin,
};
use names::declaration_name;
use rustc_hash::FxHashMap;

pub type Translation<T> = Result<T, InternalError>;

/// Annotations rendered as target metadata, by qualified-name prefix.
const META_ANNOTATION_PREFIX: &str = "dart.meta.";

/// Translates the files of one lowered module.
pub struct Translator<'a> {
    index: &'a DeclIndex,
    attributes: &'a AttributeStore,
    elements: &'a ElementIndex<'a>,
    /// Parameter defaults, for filling skipped positional arguments
    defaults: FxHashMap<NodeId, IrExpr>,
    /// Target names of compiler temporaries
    temporaries: FxHashMap<NodeId, DartSimpleIdentifier>,
    /// Depth of enclosing const contexts
    const_depth: usize,
}

impl<'a> Translator<'a> {
    pub fn new(
        module: &'a IrModule,
        index: &'a DeclIndex,
        attributes: &'a AttributeStore,
        elements: &'a ElementIndex<'a>,
    ) -> Self {
        let mut locals = LocalCollector::default();
        for file in module.all_files() {
            for decl in &file.declarations {
                locals.visit_declaration(decl);
            }
        }
        Self {
            index,
            attributes,
            elements,
            defaults: locals.defaults,
            temporaries: locals.temporaries,
            const_depth: 0,
        }
    }

    /// Translate one source file.
    pub fn translate_file(&mut self, file: &IrFile) -> Translation<DartCompilationUnit> {
        let _span = tracing::debug_span!("translate", file = %file.path).entered();
        let directives = self
            .attributes
            .get(file, keys::DART_IMPORTS)
            .map(|uris| {
                uris.iter()
                    .map(|uri| {
                        DartDirective::Import(DartImportDirective {
                            uri: uri.clone(),
                            prefix: None,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut declarations = Vec::with_capacity(file.declarations.len());
        for decl in &file.declarations {
            self.translate_top_level(decl, &mut declarations)?;
        }
        tracing::debug!(declarations = declarations.len(), "translated file");
        Ok(DartCompilationUnit {
            directives,
            declarations,
        })
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn info(&self, id: NodeId) -> Translation<&'a DeclInfo> {
        self.index.get(id).ok_or(InternalError::UnresolvedReference { id })
    }

    /// Whether the declaration lives in a dependency stub.
    fn is_dependency(&self, info: &DeclInfo) -> bool {
        self.index.file(info.file).is_some_and(|f| f.is_dependency)
    }

    /// Target name of a referenced declaration. Element-backed dependency
    /// declarations use the element's own name.
    fn member_name(&self, info: &DeclInfo) -> DartSimpleIdentifier {
        match &info.element {
            Some(element) if self.is_dependency(info) && !element.name().is_empty() => {
                DartSimpleIdentifier::parse(element.name())
            }
            _ => declaration_name(info),
        }
    }

    /// Name of the storage behind a property: the property itself when it
    /// is a plain field, its `_$name` backing field otherwise.
    fn storage_name(&self, property: &DeclInfo) -> DartSimpleIdentifier {
        let name = self.member_name(property);
        if property.is_simple_property {
            name
        } else {
            backing_field_name(&name)
        }
    }

    fn field_storage_name(&self, field: &DeclInfo) -> DartSimpleIdentifier {
        match field.property.and_then(|p| self.index.get(p)) {
            Some(property) if property.kind == DeclKind::Property => self.storage_name(property),
            _ => declaration_name(field),
        }
    }

    fn local_name(&self, info: &DeclInfo) -> DartSimpleIdentifier {
        match self.temporaries.get(&info.id) {
            Some(name) => name.clone(),
            None => DartSimpleIdentifier::new(info.name.as_str()),
        }
    }

    /// Named constructor suffix of a constructor, if any.
    fn constructor_name(&self, info: &DeclInfo) -> Option<DartSimpleIdentifier> {
        if let Some(name) = &info.dart_name {
            return Some(DartSimpleIdentifier::parse(name));
        }
        match &info.element {
            Some(element) if self.is_dependency(info) && !element.name().is_empty() => {
                Some(DartSimpleIdentifier::parse(element.name()))
            }
            _ => None,
        }
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Run `f` inside a const context when `enabled`.
    fn in_const_context<T>(&mut self, enabled: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        if enabled {
            self.const_depth += 1;
        }
        let result = f(self);
        if enabled {
            self.const_depth -= 1;
        }
        result
    }

    fn is_const_context(&self) -> bool {
        self.const_depth > 0
    }

    fn annotations(&self, annotations: &[IrAnnotation], is_override: bool) -> Vec<DartAnnotation> {
        let mut out = Vec::new();
        if is_override {
            out.push(DartAnnotation::marker("override"));
        }
        out.extend(
            annotations
                .iter()
                .filter_map(|a| a.fq_name.strip_prefix(META_ANNOTATION_PREFIX))
                .map(DartAnnotation::marker),
        );
        out
    }
}

/// `_$name`: the private, generated storage of a property with custom
/// accessors.
pub fn backing_field_name(property: &DartSimpleIdentifier) -> DartSimpleIdentifier {
    DartSimpleIdentifier::new(property.base_value()).as_generated().as_private()
}

/// Collects what the translator needs about locals before translating.
#[derive(Default)]
struct LocalCollector {
    defaults: FxHashMap<NodeId, IrExpr>,
    temporaries: FxHashMap<NodeId, DartSimpleIdentifier>,
}

impl Visitor for LocalCollector {
    fn visit_value_parameter(&mut self, param: &IrValueParameter) {
        if let Some(default) = &param.default_value {
            self.defaults.insert(param.id, default.clone());
        }
        visit::walk_value_parameter(self, param);
    }

    fn visit_variable(&mut self, variable: &IrVariable) {
        if variable.origin == Some(VariableOrigin::Temporary) {
            let name = DartSimpleIdentifier::new(format!("{}{}", variable.name, variable.id.as_u32())).as_generated();
            self.temporaries.insert(variable.id, name);
        }
        visit::walk_variable(self, variable);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Translator;
    use crate::attributes::AttributeStore;
    use crate::element::ElementIndex;
    use crate::ir::{DeclIndex, IrModule};

    /// Run `f` with a translator over `module` and no target elements.
    pub fn with_translator<T>(module: &IrModule, f: impl FnOnce(&mut Translator<'_>) -> T) -> T {
        with_attributes(module, &AttributeStore::new(), f)
    }

    pub fn with_attributes<T>(
        module: &IrModule,
        attributes: &AttributeStore,
        f: impl FnOnce(&mut Translator<'_>) -> T,
    ) -> T {
        let index = DeclIndex::build(module);
        let elements = ElementIndex::from_packages(&[]).expect("empty element index");
        let mut translator = Translator::new(module, &index, attributes, &elements);
        f(&mut translator)
    }
}
