//! `when` and `if`
//!
//! The target separates statement `if` from the `?:` expression. A `when`
//! used as a statement becomes an `if`/`else if` chain. One used as a value
//! becomes nested conditionals when it has an `else` and every branch is a
//! plain expression. Anything else in value position runs as an immediately
//! invoked closure around the `if` chain.
//!
//! A closure cannot `return`, `break` or `continue` on behalf of the
//! enclosing function. Values containing such jumps are only supported as
//! the whole initializer of a local, the whole value of an assignment or
//! `return`, or as an expression statement; there the `if` chain is spliced
//! in place and assigns the local. Anywhere else they are reported.

use super::{invoke_immediately, with_last_as, with_last_as_return};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::visit::{self, Visitor, VisitorMut};
use crate::ir::{IrBranch, IrExpr, IrExprKind, IrFunction, IrStatement, NodeId, WhenOrigin};
use crate::lower::{take_expr, ExpressionTransformer, LoweringContext, Transformation};

pub struct Whens;

impl ExpressionTransformer for Whens {
    fn name(&self) -> &'static str {
        "whens"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        match &expr.kind {
            IrExprKind::When(when) if is_conditional_shape(&when.branches, when.origin) => {}
            _ => return,
        }
        let (id, ty) = (expr.id, expr.ty.clone());
        let IrExprKind::When(when) = take_expr(expr).kind else {
            return;
        };
        let mut branches = when.branches.into_iter().rev();
        let Some(mut folded) = branches.next().map(|b| b.result) else {
            return;
        };
        for branch in branches {
            let Some(condition) = branch.condition else {
                continue;
            };
            folded = cx.builder.conditional(ty.clone(), condition, branch.result, folded);
        }
        folded.id = id;
        *expr = folded;
    }

    fn transform_statement(&self, stmt: &mut IrStatement, cx: &mut LoweringContext<'_>) -> Transformation<IrStatement> {
        match stmt {
            IrStatement::Expr(value) if is_composite(value) => {
                let scoped = is_plain_block(value);
                let mut statements = statements_of(take_expr(value));
                Lift { cx }.visit_statements_mut(&mut statements);
                if scoped {
                    Transformation::Replace(IrStatement::Block(statements))
                } else {
                    Transformation::ReplaceMany(statements)
                }
            }
            IrStatement::Return(Some(value)) if is_composite(value) && !matches!(value.kind, IrExprKind::Conditional { .. }) => {
                let mut statements = statements_of(take_expr(value));
                with_last_as_return(&mut statements);
                Lift { cx }.visit_statements_mut(&mut statements);
                Transformation::ReplaceMany(statements)
            }
            IrStatement::Variable(variable)
                if variable.initializer.as_ref().is_some_and(|v| is_composite(v) && contains_jump(v)) =>
            {
                let Some(value) = variable.initializer.take() else {
                    return Transformation::NoChange;
                };
                let mut statements = vec![IrStatement::Variable(variable.clone())];
                statements.extend(assigning(variable.id, value, cx));
                Transformation::ReplaceMany(statements)
            }
            IrStatement::Expr(IrExpr {
                kind: IrExprKind::SetValue { target, value },
                ..
            }) if is_composite(value.as_ref()) && contains_jump(value.as_ref()) => {
                let target = *target;
                Transformation::ReplaceMany(assigning(target, take_expr(value.as_mut()), cx))
            }
            _ => {
                lift_direct(stmt, cx);
                Transformation::NoChange
            }
        }
    }
}

/// Every branch but the last has a condition, the last is `else`, and no
/// result needs statements.
fn is_conditional_shape(branches: &[IrBranch], origin: Option<WhenOrigin>) -> bool {
    if matches!(origin, Some(WhenOrigin::AndAnd | WhenOrigin::OrOr)) {
        return false;
    }
    let Some((last, rest)) = branches.split_last() else {
        return false;
    };
    last.condition.is_none()
        && !rest.is_empty()
        && rest.iter().all(|b| b.condition.is_some())
        && branches.iter().all(|b| !matches!(b.result.kind, IrExprKind::Block(_) | IrExprKind::When(_)))
}

fn is_plain_block(expr: &IrExpr) -> bool {
    matches!(&expr.kind, IrExprKind::Block(block) if block.origin.is_none())
}

fn is_composite(expr: &IrExpr) -> bool {
    matches!(expr.kind, IrExprKind::When(_) | IrExprKind::Conditional { .. }) || is_plain_block(expr)
}

/// The statements computing `expr`, with the value as the last one.
fn statements_of(expr: IrExpr) -> Vec<IrStatement> {
    match expr.kind {
        IrExprKind::Block(block) if block.origin.is_none() => block.statements,
        IrExprKind::When(when) => if_chain(when.branches),
        IrExprKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => if_chain(vec![
            IrBranch {
                condition: Some(*condition),
                result: *then_branch,
            },
            IrBranch {
                condition: None,
                result: *else_branch,
            },
        ]),
        IrExprKind::Unit => Vec::new(),
        kind => vec![IrStatement::Expr(IrExpr::new(expr.id, expr.ty, kind))],
    }
}

fn if_chain(branches: Vec<IrBranch>) -> Vec<IrStatement> {
    let mut tail: Option<Vec<IrStatement>> = None;
    for branch in branches.into_iter().rev() {
        let statements = statements_of(branch.result);
        tail = Some(match branch.condition {
            None => statements,
            Some(condition) => vec![IrStatement::If {
                condition,
                then_branch: statements,
                else_branch: tail.filter(|t| !t.is_empty()),
            }],
        });
    }
    tail.unwrap_or_default()
}

/// `target = value` as statements, with the assignment at the end of
/// every branch that completes normally.
fn assigning(target: NodeId, value: IrExpr, cx: &mut LoweringContext<'_>) -> Vec<IrStatement> {
    tracing::trace!(%target, "splicing value with jumps");
    let mut statements = statements_of(value);
    let builder = &mut cx.builder;
    with_last_as(&mut statements, &mut |value| IrStatement::Expr(builder.set_value(target, value)));
    Lift { cx }.visit_statements_mut(&mut statements);
    statements
}

/// Whether `expr` holds a `return`, or a `break`/`continue` leaving it,
/// outside of nested functions.
fn contains_jump(expr: &IrExpr) -> bool {
    let mut finder = JumpFinder::default();
    finder.visit_expr(expr);
    finder.found
}

#[derive(Default)]
struct JumpFinder {
    /// Labels of the loops entered so far
    loops: Vec<Option<String>>,
    found: bool,
}

impl JumpFinder {
    fn escapes(&self, label: Option<&String>) -> bool {
        match label {
            Some(label) => !self.loops.iter().flatten().any(|l| l == label),
            None => self.loops.is_empty(),
        }
    }
}

impl Visitor for JumpFinder {
    fn visit_function(&mut self, _function: &IrFunction) {}

    fn visit_statement(&mut self, stmt: &IrStatement) {
        match stmt {
            IrStatement::Return(_) => self.found = true,
            IrStatement::Break { label } | IrStatement::Continue { label } => {
                if self.escapes(label.as_ref()) {
                    self.found = true;
                }
            }
            IrStatement::While { label, .. } | IrStatement::DoWhile { label, .. } => {
                self.loops.push(label.clone());
                visit::walk_statement(self, stmt);
                self.loops.pop();
            }
            _ => visit::walk_statement(self, stmt),
        }
    }
}

/// Lift composite expressions out of the statement's own expressions.
/// Nested statement lists were handled when they were visited.
fn lift_direct(stmt: &mut IrStatement, cx: &mut LoweringContext<'_>) {
    let mut lift = Lift { cx };
    match stmt {
        IrStatement::Expr(value) | IrStatement::Return(Some(value)) => lift.visit_expr_mut(value),
        IrStatement::Variable(variable) => {
            if let Some(init) = &mut variable.initializer {
                lift.visit_expr_mut(init);
            }
        }
        IrStatement::While { condition, .. }
        | IrStatement::DoWhile { condition, .. }
        | IrStatement::If { condition, .. } => lift.visit_expr_mut(condition),
        _ => {}
    }
}

/// Replaces `when`s and blocks left in value position by invoked closures.
struct Lift<'c, 'a> {
    cx: &'c mut LoweringContext<'a>,
}

impl VisitorMut for Lift<'_, '_> {
    // Function bodies are transformed on their own.
    fn visit_function_mut(&mut self, _function: &mut IrFunction) {}

    fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
        if !matches!(expr.kind, IrExprKind::When(_)) && !is_plain_block(expr) {
            visit::walk_expr_mut(self, expr);
            return;
        }
        if contains_jump(expr) {
            self.cx.report(Diagnostic::new(
                DiagnosticKind::UnsupportedConstruct,
                "`return`, `break` or `continue` inside a nested expression",
            ));
            return;
        }
        let ty = expr.ty.clone();
        let mut statements = statements_of(take_expr(expr));
        self.visit_statements_mut(&mut statements);
        *expr = invoke_immediately(&mut self.cx.builder, ty, statements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{CallOrigin, IrType, NodeId};
    use crate::lower::expressions::intrinsics;
    use crate::lower::expressions::test_support::{body, expr_at, function_module, transform};

    fn flag(b: &mut IrBuilder, id: u32) -> IrExpr {
        b.get_value(NodeId(id), IrType::boolean())
    }

    #[test]
    fn test_statement_when_becomes_if_chain() {
        let mut b = IrBuilder::new();
        let first = flag(&mut b, 9_000);
        let second = flag(&mut b, 9_001);
        let one = b.int(1);
        let two = b.int(2);
        let when = b.when(
            IrType::unit(),
            Some(WhenOrigin::When),
            vec![
                IrBranch {
                    condition: Some(first),
                    result: one,
                },
                IrBranch {
                    condition: Some(second),
                    result: two,
                },
            ],
        );
        let mut module = function_module(&mut b, vec![IrStatement::Expr(when)]);

        transform(Whens, &mut module);

        let [IrStatement::If {
            condition,
            else_branch: Some(else_branch),
            ..
        }] = body(&module)
        else {
            panic!("expected if chain, got {:?}", body(&module));
        };
        assert!(condition.is_get_value(NodeId(9_000)));
        assert!(matches!(else_branch.as_slice(), [IrStatement::If { else_branch: None, .. }]));
    }

    #[test]
    fn test_value_when_becomes_conditional() {
        let mut b = IrBuilder::new();
        let condition = flag(&mut b, 9_000);
        let one = b.int(1);
        let two = b.int(2);
        let when = b.when(
            IrType::int(),
            Some(WhenOrigin::If),
            vec![
                IrBranch {
                    condition: Some(condition),
                    result: one,
                },
                IrBranch {
                    condition: None,
                    result: two,
                },
            ],
        );
        let variable = b.variable("x", IrType::int(), Some(when));
        let mut module = function_module(&mut b, vec![IrStatement::Variable(variable)]);

        transform(Whens, &mut module);

        let IrExprKind::Conditional { condition, .. } = &expr_at(&module, 0).kind else {
            panic!("expected conditional");
        };
        assert!(condition.is_get_value(NodeId(9_000)));
    }

    #[test]
    fn test_value_when_with_statements_is_invoked_closure() {
        let mut b = IrBuilder::new();
        let condition = flag(&mut b, 9_000);
        let side_effect = b.call(NodeId(9_100), IrType::unit(), vec![]);
        let one = b.int(1);
        let block = b.block(IrType::int(), None, vec![IrStatement::Expr(side_effect), IrStatement::Expr(one)]);
        let two = b.int(2);
        let when = b.when(
            IrType::int(),
            Some(WhenOrigin::If),
            vec![
                IrBranch {
                    condition: Some(condition),
                    result: block,
                },
                IrBranch {
                    condition: None,
                    result: two,
                },
            ],
        );
        let variable = b.variable("x", IrType::int(), Some(when));
        let mut module = function_module(&mut b, vec![IrStatement::Variable(variable)]);

        transform(Whens, &mut module);

        let IrExprKind::Call(call) = &expr_at(&module, 0).kind else {
            panic!("expected call");
        };
        assert_eq!(call.builtin_name(), Some(intrinsics::INVOKE));
        assert_eq!(call.origin, Some(CallOrigin::Invoke));
        let Some(IrExprKind::Lambda(lambda)) = call.dispatch_receiver.as_deref().map(|r| &r.kind) else {
            panic!("expected closure");
        };
        let statements = &lambda.body.as_ref().unwrap().statements;
        let [IrStatement::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        }] = statements.as_slice()
        else {
            panic!("expected if, got {:?}", statements);
        };
        assert!(matches!(then_branch.last(), Some(IrStatement::Return(Some(_)))));
        assert!(matches!(else_branch.as_slice(), [IrStatement::Return(Some(_))]));
    }

    #[test]
    fn test_returned_when_returns_from_each_branch() {
        let mut b = IrBuilder::new();
        let condition = flag(&mut b, 9_000);
        let one = b.int(1);
        let when = b.when(
            IrType::unit(),
            Some(WhenOrigin::If),
            vec![IrBranch {
                condition: Some(condition),
                result: one,
            }],
        );
        let mut module = function_module(&mut b, vec![IrStatement::Return(Some(when))]);

        transform(Whens, &mut module);

        let [IrStatement::If { then_branch, .. }] = body(&module) else {
            panic!("expected if");
        };
        assert!(matches!(then_branch.as_slice(), [IrStatement::Return(Some(_))]));
    }

    /// `val x = if (c) { g(); 1 } else { return 0 }; return x`
    fn early_return_module(b: &mut IrBuilder, as_argument: bool) -> crate::ir::IrModule {
        let condition = flag(b, 9_000);
        let side_effect = b.call(NodeId(9_100), IrType::unit(), vec![]);
        let one = b.int(1);
        let then_block = b.block(IrType::int(), None, vec![IrStatement::Expr(side_effect), IrStatement::Expr(one)]);
        let zero = b.int(0);
        let else_block = b.block(IrType::int(), None, vec![IrStatement::Return(Some(zero))]);
        let when = b.when(
            IrType::int(),
            Some(WhenOrigin::If),
            vec![
                IrBranch {
                    condition: Some(condition),
                    result: then_block,
                },
                IrBranch {
                    condition: None,
                    result: else_block,
                },
            ],
        );
        if as_argument {
            let call = b.call(NodeId(9_101), IrType::unit(), vec![when]);
            return function_module(b, vec![IrStatement::Expr(call)]);
        }
        let variable = b.variable("x", IrType::int(), Some(when));
        let read = b.get_variable(&variable);
        function_module(b, vec![IrStatement::Variable(variable), IrStatement::Return(Some(read))])
    }

    #[test]
    fn test_value_with_return_is_spliced() {
        let mut b = IrBuilder::new();
        let mut module = early_return_module(&mut b, false);

        let lowered = transform(Whens, &mut module);

        assert!(lowered.diagnostics.is_empty());
        let [IrStatement::Variable(x), IrStatement::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        }, IrStatement::Return(Some(result))] = body(&module)
        else {
            panic!("expected spliced if, got {:?}", body(&module));
        };
        assert!(x.initializer.is_none());
        assert!(result.is_get_value(x.id));
        let [IrStatement::Expr(_), IrStatement::Expr(assignment)] = then_branch.as_slice() else {
            panic!("expected assignment, got {:?}", then_branch);
        };
        let IrExprKind::SetValue { target, value } = &assignment.kind else {
            panic!("expected assignment, got {:?}", assignment);
        };
        assert_eq!(*target, x.id);
        assert_eq!(value.as_const(), Some(&crate::ir::IrConst::Int(1)));
        let [IrStatement::Return(Some(zero))] = else_branch.as_slice() else {
            panic!("expected return, got {:?}", else_branch);
        };
        assert_eq!(zero.as_const(), Some(&crate::ir::IrConst::Int(0)));
    }

    #[test]
    fn test_nested_value_with_return_reported() {
        let mut b = IrBuilder::new();
        let mut module = early_return_module(&mut b, true);

        let lowered = transform(Whens, &mut module);

        assert!(crate::diagnostic::kind_names(&lowered.diagnostics).contains("UNSUPPORTED_CONSTRUCT"));
        let IrExprKind::Call(call) = &expr_at(&module, 0).kind else {
            panic!("expected call");
        };
        assert!(matches!(call.arguments[0].as_ref().map(|a| &a.kind), Some(IrExprKind::When(_))));
    }

    #[test]
    fn test_break_of_inner_loop_stays_inside() {
        let mut b = IrBuilder::new();
        let condition = flag(&mut b, 9_000);
        let one = b.int(1);
        let block = b.block(
            IrType::int(),
            None,
            vec![
                IrStatement::While {
                    label: None,
                    condition,
                    body: vec![IrStatement::Break { label: None }],
                },
                IrStatement::Expr(one),
            ],
        );
        assert!(!contains_jump(&block));

        let outer = b.block(IrType::int(), None, vec![IrStatement::Continue { label: None }]);
        assert!(contains_jump(&outer));
    }
}
