//! Lowering context
//!
//! Shared state every pass gets: fresh ids, the attribute store, the
//! diagnostic collector and a declaration index of the module as it was
//! when the current pass started.

use crate::analyze::ConstEvaluator;
use crate::attributes::keys::{self, GeneratedHelper};
use crate::attributes::AttributeStore;
use crate::config::CompilerConfig;
use crate::diagnostic::{Diagnostic, DiagnosticCollector};
use crate::element::ElementIndex;
use crate::ir::builder::IrBuilder;
use crate::ir::{DeclIndex, IrClass, IrDeclaration, IrFile, IrModule, NodeId};

#[derive(Debug, Clone)]
struct CurrentFile {
    id: NodeId,
    path: String,
    package: String,
}

pub struct LoweringContext<'a> {
    pub builder: IrBuilder,
    pub attributes: &'a mut AttributeStore,
    pub diagnostics: &'a mut DiagnosticCollector,
    pub index: DeclIndex,
    pub elements: &'a ElementIndex<'a>,
    pub config: &'a CompilerConfig,
    file: Option<CurrentFile>,
    depth: usize,
    /// File-level declarations to append once the current file is done
    pending: Vec<IrDeclaration>,
    /// Declarations moved out of source files, by file
    retired: Vec<(NodeId, IrDeclaration)>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(
        module: &IrModule,
        attributes: &'a mut AttributeStore,
        diagnostics: &'a mut DiagnosticCollector,
        elements: &'a ElementIndex<'a>,
        config: &'a CompilerConfig,
    ) -> Self {
        Self {
            builder: IrBuilder::with_ids(module.id_gen()),
            attributes,
            diagnostics,
            index: DeclIndex::build(module),
            elements,
            config,
            file: None,
            depth: 0,
            pending: Vec::new(),
            retired: Vec::new(),
        }
    }

    pub(crate) fn reindex(&mut self, module: &IrModule) {
        self.index = DeclIndex::build(module);
    }

    pub(crate) fn enter_file(&mut self, file: &IrFile) {
        self.file = Some(CurrentFile {
            id: file.id,
            path: file.path.clone(),
            package: file.package.clone(),
        });
        self.depth = 0;
    }

    /// Finish the current file, returning the declarations to append to it.
    pub(crate) fn leave_file(&mut self) -> Vec<IrDeclaration> {
        self.file = None;
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn descend(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether the declaration being lowered sits at file level.
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }

    /// Id of the file being lowered.
    pub fn file_id(&self) -> NodeId {
        self.file.as_ref().map(|f| f.id).unwrap_or(NodeId(0))
    }

    pub fn file_path(&self) -> &str {
        self.file.as_ref().map(|f| f.path.as_str()).unwrap_or("")
    }

    pub fn package(&self) -> &str {
        self.file.as_ref().map(|f| f.package.as_str()).unwrap_or("")
    }

    /// Report a diagnostic located in the current file.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let diagnostic = match &self.file {
            Some(file) if diagnostic.location.is_none() => diagnostic.in_file(file.path.clone()),
            _ => diagnostic,
        };
        self.diagnostics.report(diagnostic);
    }

    pub fn constness(&self) -> ConstEvaluator<'_> {
        ConstEvaluator::new(&self.index, self.elements, self.attributes)
    }

    /// Append a declaration to the current file once it is lowered.
    pub fn add_file_declaration(&mut self, decl: IrDeclaration) {
        self.pending.push(decl);
    }

    /// Declarations queued for the current file.
    pub fn pending_mut(&mut self) -> &mut Vec<IrDeclaration> {
        &mut self.pending
    }

    /// Move a declaration out of the emitted files. It stays visible to the
    /// index as a dependency stub.
    pub fn retire(&mut self, decl: IrDeclaration) {
        let file = self.file_id();
        self.retired.push((file, decl));
    }

    pub(crate) fn take_retired(&mut self) -> Vec<(NodeId, IrDeclaration)> {
        std::mem::take(&mut self.retired)
    }

    /// The helper class `name` of the current file, created by `create` the
    /// first time it is asked for.
    pub fn helper(
        &mut self,
        name: &'static str,
        create: impl FnOnce(&mut IrBuilder, &str) -> IrClass,
    ) -> GeneratedHelper {
        let file = self.file_id();
        let existing = self
            .attributes
            .get(&file, keys::GENERATED_HELPERS)
            .and_then(|helpers| helpers.iter().find(|h| h.name == name))
            .cloned();
        if let Some(helper) = existing {
            return helper;
        }

        let fq_name = if self.package().is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.package(), name)
        };
        let class = create(&mut self.builder, &fq_name);
        let constructor = class.primary_constructor().map(|c| c.id).unwrap_or(class.id);
        let helper = GeneratedHelper {
            name,
            class: class.id,
            constructor,
            fq_name,
        };
        tracing::trace!(helper = name, file = %self.file_path(), "generated helper class");
        self.attributes
            .get_or_create(&file, keys::GENERATED_HELPERS, Vec::new)
            .push(helper.clone());
        self.pending.push(IrDeclaration::Class(class));
        helper
    }
}
