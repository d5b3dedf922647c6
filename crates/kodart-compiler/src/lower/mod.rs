//! IR lowering
//!
//! Rewrites the resolved IR until every construct left has a direct target
//! equivalent. The [`Pipeline`] runs a fixed list of passes:
//!
//! - [`DeclarationLowering`] - applied top-down to every declaration
//! - checker groups - analysis that reports diagnostics between lowerings
//! - [`ExpressionTransformer`] - bottom-up rewrite of bodies, after all
//!   declaration lowerings have finished
//!
//! A pass that meets a construct it cannot handle reports a diagnostic and
//! leaves the node unchanged. Whether compilation failed is decided once,
//! after the whole pipeline ran.

pub mod context;
pub mod declarations;
pub mod expressions;
mod pipeline;

pub use context::LoweringContext;
pub use pipeline::{Pass, Pipeline};

use crate::ir::{IrDeclaration, IrExpr, IrExprKind, IrStatement, IrType};

/// What a pass does with the node it was given.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation<T> {
    /// Keep the (possibly mutated in place) node
    NoChange,
    Replace(T),
    /// Splice any number of nodes, including none, in its place
    ReplaceMany(Vec<T>),
}

impl<T> Transformation<T> {
    pub fn remove() -> Self {
        Transformation::ReplaceMany(Vec::new())
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, Transformation::NoChange)
    }
}

/// A declaration-level lowering.
pub trait DeclarationLowering: Send + Sync {
    fn name(&self) -> &'static str;

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration>;
}

/// A bottom-up rewrite of statements and expressions.
///
/// Children are transformed before their parents, so a transformer sees
/// already-rewritten operands.
pub trait ExpressionTransformer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite an expression in place.
    fn transform_expression(&self, _expr: &mut IrExpr, _cx: &mut LoweringContext<'_>) {}

    fn transform_statement(&self, _stmt: &mut IrStatement, _cx: &mut LoweringContext<'_>) -> Transformation<IrStatement> {
        Transformation::NoChange
    }
}

/// Move the expression out, leaving a placeholder with the same id.
pub(crate) fn take_expr(expr: &mut IrExpr) -> IrExpr {
    let placeholder = IrExpr::new(expr.id, IrType::unit(), IrExprKind::Unit);
    std::mem::replace(expr, placeholder)
}
