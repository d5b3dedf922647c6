//! The fixed pass list and its driver

use super::context::LoweringContext;
use super::declarations::*;
use super::expressions::*;
use super::{DeclarationLowering, ExpressionTransformer, Transformation};
use crate::analyze::checkers;
use crate::analyze::{CheckContext, CheckRunner, Checker};
use crate::ir::visit::{self, VisitorMut};
use crate::ir::{IrDeclaration, IrExpr, IrFile, IrModule, IrStatement};

/// One step of the pipeline.
pub enum Pass {
    Declaration(Box<dyn DeclarationLowering>),
    /// A group of checkers sharing one traversal
    Check(&'static str, Vec<Box<dyn Checker>>),
    Transform(Box<dyn ExpressionTransformer>),
}

impl Pass {
    pub fn name(&self) -> &'static str {
        match self {
            Pass::Declaration(lowering) => lowering.name(),
            Pass::Check(name, _) => name,
            Pass::Transform(transformer) => transformer.name(),
        }
    }
}

/// Ordered passes, each run exactly once per compilation.
pub struct Pipeline {
    passes: Vec<Pass>,
}

impl Pipeline {
    pub fn new(passes: Vec<Pass>) -> Self {
        Self { passes }
    }

    /// The standard pass list.
    pub fn standard() -> Self {
        let declaration = |l: Box<dyn DeclarationLowering>| Pass::Declaration(l);
        let transform = |t: Box<dyn ExpressionTransformer>| Pass::Transform(t);
        Self::new(vec![
            declaration(Box::new(ExternalDeclarations)),
            declaration(Box::new(InterfaceToAbstractClass)),
            declaration(Box::new(SpecialInheritance)),
            declaration(Box::new(IteratorImplementations)),
            Pass::Check("source-checks", checkers::source_checkers()),
            declaration(Box::new(ConstInlineFunctions)),
            declaration(Box::new(EnumClasses)),
            declaration(Box::new(Objects)),
            declaration(Box::new(DataClasses)),
            declaration(Box::new(DefaultValueRemapping)),
            Pass::Check("parameter-checks", checkers::pre_parameter_checkers()),
            declaration(Box::new(ComplexParameters)),
            declaration(Box::new(FieldInitializerPlacement)),
            declaration(Box::new(InitBlocks)),
            declaration(Box::new(Extensions)),
            declaration(Box::new(SecondaryConstructorNames)),
            declaration(Box::new(AnnotateDartConst)),
            declaration(Box::new(MetaAnnotations)),
            declaration(Box::new(Imports)),
            Pass::Check("declaration-checks", checkers::post_declaration_checkers()),
            transform(Box::new(ObjectReferences)),
            transform(Box::new(ConstInlineCalls)),
            transform(Box::new(ConstCalls)),
            transform(Box::new(ExternalIterators)),
            transform(Box::new(Operators)),
            transform(Box::new(ConjunctionsDisjunctions)),
            transform(Box::new(Elvis)),
            transform(Box::new(SafeCalls)),
            transform(Box::new(PostfixIncrementsDecrements)),
            transform(Box::new(UnitReturns)),
            transform(Box::new(Whens)),
        ])
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(Pass::name).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass over the module's source files.
    pub fn run(&self, module: &mut IrModule, cx: &mut LoweringContext<'_>) {
        let _span = tracing::info_span!("lower", module = %module.name).entered();
        for pass in &self.passes {
            tracing::debug!(pass = pass.name(), "running pass");
            cx.reindex(module);
            match pass {
                Pass::Declaration(lowering) => run_declaration_pass(lowering.as_ref(), module, cx),
                Pass::Check(_, checkers) => run_checks(checkers, module, cx),
                Pass::Transform(transformer) => run_transformer(transformer.as_ref(), module, cx),
            }
        }
        cx.reindex(module);
    }
}

fn run_declaration_pass(lowering: &dyn DeclarationLowering, module: &mut IrModule, cx: &mut LoweringContext<'_>) {
    for file in &mut module.files {
        cx.enter_file(file);
        lower_declarations(lowering, &mut file.declarations, cx);
        let added = cx.leave_file();
        file.declarations.extend(added);
    }

    let mut retired = cx.take_retired();
    if retired.is_empty() {
        return;
    }
    for file in &module.files {
        let declarations: Vec<IrDeclaration> = extract_where(&mut retired, |(owner, _)| *owner == file.id)
            .into_iter()
            .map(|(_, decl)| decl)
            .collect();
        if declarations.is_empty() {
            continue;
        }
        let mut stub = IrFile::new(cx.builder.fresh(), file.path.clone(), file.package.clone());
        stub.declarations = declarations;
        tracing::trace!(file = %file.path, count = stub.declarations.len(), "retired declarations");
        module.dependency_files.push(stub);
    }
}

fn extract_where<T>(items: &mut Vec<T>, predicate: impl Fn(&T) -> bool) -> Vec<T> {
    let (matching, rest) = std::mem::take(items).into_iter().partition(|item| predicate(item));
    *items = rest;
    matching
}

/// Apply `lowering` to each declaration, then to the children of whatever
/// it was replaced with.
fn lower_declarations(lowering: &dyn DeclarationLowering, decls: &mut Vec<IrDeclaration>, cx: &mut LoweringContext<'_>) {
    let mut lowered = Vec::with_capacity(decls.len());
    for mut decl in decls.drain(..) {
        let results = match lowering.lower(&mut decl, cx) {
            Transformation::NoChange => vec![decl],
            Transformation::Replace(replacement) => {
                tracing::trace!(pass = lowering.name(), id = %decl.id(), "replaced declaration");
                vec![replacement]
            }
            Transformation::ReplaceMany(replacements) => {
                tracing::trace!(
                    pass = lowering.name(),
                    id = %decl.id(),
                    count = replacements.len(),
                    "expanded declaration"
                );
                replacements
            }
        };
        for mut result in results {
            if let Some(children) = result.children_mut() {
                cx.descend();
                lower_declarations(lowering, children, cx);
                cx.ascend();
            }
            lowered.push(result);
        }
    }
    *decls = lowered;
}

fn run_checks(checkers: &[Box<dyn Checker>], module: &IrModule, cx: &mut LoweringContext<'_>) {
    let mut diagnostics = Vec::new();
    for file in &module.files {
        let ctx = CheckContext {
            index: &cx.index,
            elements: cx.elements,
            attributes: cx.attributes,
            config: cx.config,
            file_path: &file.path,
        };
        diagnostics.extend(CheckRunner::new(checkers, ctx).run(file));
    }
    for diagnostic in diagnostics {
        cx.diagnostics.report(diagnostic);
    }
}

fn run_transformer(transformer: &dyn ExpressionTransformer, module: &mut IrModule, cx: &mut LoweringContext<'_>) {
    for file in &mut module.files {
        cx.enter_file(file);
        let mut runner = TransformRunner { transformer, cx };
        for decl in &mut file.declarations {
            runner.visit_declaration_mut(decl);
        }
        let added = cx.leave_file();
        file.declarations.extend(added);
    }
}

struct TransformRunner<'t, 'c, 'a> {
    transformer: &'t dyn ExpressionTransformer,
    cx: &'c mut LoweringContext<'a>,
}

impl VisitorMut for TransformRunner<'_, '_, '_> {
    fn visit_statements_mut(&mut self, stmts: &mut Vec<IrStatement>) {
        let mut transformed = Vec::with_capacity(stmts.len());
        for mut stmt in stmts.drain(..) {
            self.visit_statement_mut(&mut stmt);
            match self.transformer.transform_statement(&mut stmt, self.cx) {
                Transformation::NoChange => transformed.push(stmt),
                Transformation::Replace(replacement) => transformed.push(replacement),
                Transformation::ReplaceMany(replacements) => transformed.extend(replacements),
            }
        }
        *stmts = transformed;
    }

    fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
        visit::walk_expr_mut(self, expr);
        self.transformer.transform_expression(expr, self.cx);
    }
}
