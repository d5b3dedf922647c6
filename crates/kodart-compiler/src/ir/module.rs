//! IR Module
//!
//! Top-level container for one compilation.

use super::decl::{IrDeclaration, IrFunction, IrValueParameter};
use super::expr::{IrStatement, IrVariable};
use super::visit::{self, Visitor};
use super::{IdGen, NodeId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// An IR module: the source files being compiled plus declaration stubs of
/// the dependencies they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrModule {
    /// Module name
    pub name: String,
    /// Files to translate
    #[serde(default)]
    pub files: Vec<IrFile>,
    /// Dependency stubs; indexed, never emitted
    #[serde(default)]
    pub dependency_files: Vec<IrFile>,
}

/// Declarations of one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrFile {
    pub id: NodeId,
    /// Path relative to the source root, e.g. `app/Test.kt`
    pub path: String,
    /// Package, e.g. `app`
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub declarations: Vec<IrDeclaration>,
}

impl IrFile {
    pub fn new(id: NodeId, path: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            package: package.into(),
            declarations: Vec::new(),
        }
    }

    /// File name without directory and extension.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.split('.').next().unwrap_or(name)
    }

    /// Directory part of the path, without trailing slash.
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(i) => &self.path[..i],
            None => "",
        }
    }
}

impl IrModule {
    /// Create a new empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            dependency_files: Vec::new(),
        }
    }

    /// Add a source file
    pub fn add_file(&mut self, file: IrFile) {
        self.files.push(file);
    }

    /// Add a dependency stub file
    pub fn add_dependency_file(&mut self, file: IrFile) {
        self.dependency_files.push(file);
    }

    /// Get a source file by id
    pub fn file(&self, id: NodeId) -> Option<&IrFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Get a source file by path
    pub fn file_by_path(&self, path: &str) -> Option<&IrFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Source files followed by dependency stubs
    pub fn all_files(&self) -> impl Iterator<Item = &IrFile> {
        self.files.iter().chain(self.dependency_files.iter())
    }

    /// Number of top-level declarations across source files
    pub fn declaration_count(&self) -> usize {
        self.files.iter().map(|f| f.declarations.len()).sum()
    }

    /// Id allocator continuing after the largest id in the module
    pub fn id_gen(&self) -> IdGen {
        let mut collector = IdCollector::default();
        for file in self.all_files() {
            collector.record(file.id);
            for decl in &file.declarations {
                collector.visit_declaration(decl);
            }
        }
        let mut ids = IdGen::new();
        if let Some(max) = collector.seen.iter().max() {
            ids.reserve(*max);
        }
        ids
    }

    /// Validate that every node id is used once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut collector = IdCollector::default();
        for file in self.all_files() {
            collector.record(file.id);
            for decl in &file.declarations {
                collector.visit_declaration(decl);
            }
        }

        if collector.duplicates.is_empty() {
            Ok(())
        } else {
            let mut errors: Vec<String> = collector
                .duplicates
                .iter()
                .map(|id| format!("Node id {} is used more than once", id))
                .collect();
            errors.sort();
            Err(errors)
        }
    }
}

#[derive(Default)]
struct IdCollector {
    seen: FxHashSet<NodeId>,
    duplicates: FxHashSet<NodeId>,
}

impl IdCollector {
    fn record(&mut self, id: NodeId) {
        if !self.seen.insert(id) {
            self.duplicates.insert(id);
        }
    }
}

impl Visitor for IdCollector {
    fn visit_declaration(&mut self, decl: &IrDeclaration) {
        self.record(decl.id());
        match decl {
            IrDeclaration::Class(class) => {
                for tp in &class.type_parameters {
                    self.record(tp.id);
                }
            }
            IrDeclaration::Property(property) => {
                if let Some(field) = &property.backing_field {
                    self.record(field.id);
                }
            }
            _ => {}
        }
        visit::walk_declaration(self, decl);
    }

    fn visit_function(&mut self, function: &IrFunction) {
        // Top-level functions were recorded as declarations already.
        self.seen.insert(function.id);
        for tp in &function.type_parameters {
            self.record(tp.id);
        }
        visit::walk_function(self, function);
    }

    fn visit_value_parameter(&mut self, param: &IrValueParameter) {
        self.record(param.id);
        visit::walk_value_parameter(self, param);
    }

    fn visit_variable(&mut self, variable: &IrVariable) {
        self.record(variable.id);
        visit::walk_variable(self, variable);
    }

    fn visit_statement(&mut self, stmt: &IrStatement) {
        if let IrStatement::LocalFunction(function) = stmt {
            self.record(function.id);
        }
        visit::walk_statement(self, stmt);
    }

    fn visit_expr(&mut self, expr: &super::IrExpr) {
        self.record(expr.id);
        if let super::IrExprKind::Lambda(function) = &expr.kind {
            self.record(function.id);
        }
        visit::walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;

    #[test]
    fn test_stem_and_directory() {
        let file = IrFile::new(NodeId(0), "app/model/Test.kt", "app.model");
        assert_eq!(file.stem(), "Test");
        assert_eq!(file.directory(), "app/model");

        let root = IrFile::new(NodeId(1), "Main.kt", "");
        assert_eq!(root.directory(), "");
    }

    #[test]
    fn test_id_gen_continues_after_max() {
        let mut b = IrBuilder::new();
        let mut file = b.file("Test.kt", "");
        let f = b.function("f", crate::ir::IrType::unit()).build();
        file.declarations.push(IrDeclaration::Function(f));
        let mut module = IrModule::new("test");
        module.add_file(file);

        let mut ids = module.id_gen();
        let fresh = ids.fresh();
        assert!(module.validate().is_ok());
        assert!(fresh > NodeId(0));
        assert!(b.peek_next() <= fresh);
    }
}
