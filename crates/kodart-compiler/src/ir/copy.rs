//! Deep copies with fresh identities
//!
//! A subtree placed in a second location must not share node ids with the
//! first. Locals declared inside the copy are renumbered too, and reads and
//! writes of them follow.

use super::builder::IrBuilder;
use super::decl::IrFunction;
use super::expr::{IrExpr, IrExprKind, IrStatement};
use super::visit::{self, VisitorMut};
use super::NodeId;
use rustc_hash::FxHashMap;

struct Renumber<'b> {
    builder: &'b mut IrBuilder,
    remap: FxHashMap<NodeId, NodeId>,
}

impl Renumber<'_> {
    fn rename(&mut self, id: &mut NodeId) {
        let fresh = self.builder.fresh();
        self.remap.insert(*id, fresh);
        *id = fresh;
    }
}

impl VisitorMut for Renumber<'_> {
    fn visit_function_mut(&mut self, function: &mut IrFunction) {
        function.original.get_or_insert(function.id);
        self.rename(&mut function.id);
        for tp in &mut function.type_parameters {
            self.rename(&mut tp.id);
        }
        if let Some(receiver) = &mut function.extension_receiver {
            receiver.original.get_or_insert(receiver.id);
            self.rename(&mut receiver.id);
        }
        for param in &mut function.parameters {
            param.original.get_or_insert(param.id);
            self.rename(&mut param.id);
        }
        visit::walk_function_mut(self, function);
    }

    fn visit_statement_mut(&mut self, stmt: &mut IrStatement) {
        match stmt {
            IrStatement::Variable(variable) => self.rename(&mut variable.id),
            IrStatement::Try(try_) => {
                for catch in &mut try_.catches {
                    self.rename(&mut catch.parameter.id);
                }
            }
            _ => {}
        }
        visit::walk_statement_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
        expr.id = self.builder.fresh();
        visit::walk_expr_mut(self, expr);
        match &mut expr.kind {
            IrExprKind::GetValue { target } | IrExprKind::SetValue { target, .. } => {
                if let Some(fresh) = self.remap.get(target) {
                    *target = *fresh;
                }
            }
            _ => {}
        }
    }
}

/// Copy of `expr` with fresh ids throughout.
pub fn copy_expr(builder: &mut IrBuilder, expr: &IrExpr) -> IrExpr {
    let mut copy = expr.clone();
    Renumber {
        builder,
        remap: FxHashMap::default(),
    }
    .visit_expr_mut(&mut copy);
    copy
}

/// Copy of `stmts` with fresh ids throughout.
pub fn copy_statements(builder: &mut IrBuilder, stmts: &[IrStatement]) -> Vec<IrStatement> {
    let mut copy = stmts.to_vec();
    Renumber {
        builder,
        remap: FxHashMap::default(),
    }
    .visit_statements_mut(&mut copy);
    copy
}
