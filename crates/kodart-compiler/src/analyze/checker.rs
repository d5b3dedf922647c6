//! Checker trait and runner.
//!
//! Each checker implements [`Checker`], provides static metadata
//! ([`CheckerMeta`]) and overrides the `check_*` methods for the nodes it
//! inspects. [`CheckRunner`] walks one file and dispatches every node to
//! every checker.

use super::constness::ConstEvaluator;
use crate::attributes::AttributeStore;
use crate::config::CompilerConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::element::ElementIndex;
use crate::ir::visit::{self, Visitor};
use crate::ir::{DeclIndex, IrDeclaration, IrExpr, IrFile, IrStatement};

/// Static metadata for a checker.
pub struct CheckerMeta {
    /// Checker name, e.g. "const-val-initializer".
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Kind of the diagnostics it reports.
    pub kind: DiagnosticKind,
}

/// What a checker can see while inspecting a file.
pub struct CheckContext<'a> {
    pub index: &'a DeclIndex,
    pub elements: &'a ElementIndex<'a>,
    pub attributes: &'a AttributeStore,
    pub config: &'a CompilerConfig,
    /// Path of the file being checked.
    pub file_path: &'a str,
}

impl CheckContext<'_> {
    pub fn constness(&self) -> ConstEvaluator<'_> {
        ConstEvaluator::new(self.index, self.elements, self.attributes)
    }

    /// A diagnostic of the checker's kind, located in the current file.
    pub fn report(&self, meta: &CheckerMeta, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(meta.kind.clone(), message).in_file(self.file_path)
    }
}

/// Analysis that runs between lowerings and reports diagnostics.
///
/// Default implementations report nothing, so checkers only override the
/// methods relevant to them.
pub trait Checker: Send + Sync {
    fn meta(&self) -> &CheckerMeta;

    /// Check a whole file.
    fn check_file(&self, _file: &IrFile, _ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        vec![]
    }

    /// Check a declaration at any nesting depth.
    fn check_declaration(&self, _decl: &IrDeclaration, _ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        vec![]
    }

    fn check_statement(&self, _stmt: &IrStatement, _ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        vec![]
    }

    fn check_expression(&self, _expr: &IrExpr, _ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        vec![]
    }
}

/// Runs checkers over a file in a single traversal.
pub struct CheckRunner<'a> {
    checkers: &'a [Box<dyn Checker>],
    ctx: CheckContext<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CheckRunner<'a> {
    pub fn new(checkers: &'a [Box<dyn Checker>], ctx: CheckContext<'a>) -> Self {
        Self {
            checkers,
            ctx,
            diagnostics: Vec::new(),
        }
    }

    pub fn run(mut self, file: &IrFile) -> Vec<Diagnostic> {
        for checker in self.checkers {
            self.diagnostics.extend(checker.check_file(file, &self.ctx));
        }
        for decl in &file.declarations {
            self.visit_declaration(decl);
        }
        self.diagnostics
    }
}

impl Visitor for CheckRunner<'_> {
    fn visit_declaration(&mut self, decl: &IrDeclaration) {
        for checker in self.checkers {
            self.diagnostics.extend(checker.check_declaration(decl, &self.ctx));
        }
        visit::walk_declaration(self, decl);
    }

    fn visit_statement(&mut self, stmt: &IrStatement) {
        for checker in self.checkers {
            self.diagnostics.extend(checker.check_statement(stmt, &self.ctx));
        }
        visit::walk_statement(self, stmt);
    }

    fn visit_expr(&mut self, expr: &IrExpr) {
        for checker in self.checkers {
            self.diagnostics.extend(checker.check_expression(expr, &self.ctx));
        }
        visit::walk_expr(self, expr);
    }
}
