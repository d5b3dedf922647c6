//! IR traversal
//!
//! [`Visitor`] walks the tree by shared reference, [`VisitorMut`] by mutable
//! reference. Each visit method defaults to the matching `walk_*` function,
//! so implementors override only the nodes they care about and call the walk
//! function to keep descending.
//!
//! `walk_*_mut` functions visit children before returning, which makes a
//! visitor that transforms after walking a bottom-up rewrite.

use super::decl::*;
use super::expr::*;

// ============================================================================
// Shared-reference traversal
// ============================================================================

pub trait Visitor: Sized {
    fn visit_declaration(&mut self, decl: &IrDeclaration) {
        walk_declaration(self, decl);
    }

    fn visit_class(&mut self, class: &IrClass) {
        walk_class(self, class);
    }

    fn visit_function(&mut self, function: &IrFunction) {
        walk_function(self, function);
    }

    fn visit_constructor(&mut self, constructor: &IrConstructor) {
        walk_constructor(self, constructor);
    }

    fn visit_property(&mut self, property: &IrProperty) {
        walk_property(self, property);
    }

    fn visit_field(&mut self, field: &IrField) {
        walk_field(self, field);
    }

    fn visit_value_parameter(&mut self, param: &IrValueParameter) {
        walk_value_parameter(self, param);
    }

    fn visit_variable(&mut self, variable: &IrVariable) {
        walk_variable(self, variable);
    }

    fn visit_statement(&mut self, stmt: &IrStatement) {
        walk_statement(self, stmt);
    }

    fn visit_expr(&mut self, expr: &IrExpr) {
        walk_expr(self, expr);
    }
}

pub fn walk_declaration<V: Visitor>(visitor: &mut V, decl: &IrDeclaration) {
    match decl {
        IrDeclaration::Class(class) => visitor.visit_class(class),
        IrDeclaration::Function(function) => visitor.visit_function(function),
        IrDeclaration::Constructor(constructor) => visitor.visit_constructor(constructor),
        IrDeclaration::Property(property) => visitor.visit_property(property),
        IrDeclaration::Field(field) => visitor.visit_field(field),
        IrDeclaration::AnonymousInitializer(init) => walk_statements(visitor, &init.body.statements),
        IrDeclaration::Extension(extension) => {
            for member in &extension.members {
                visitor.visit_declaration(member);
            }
        }
    }
}

pub fn walk_class<V: Visitor>(visitor: &mut V, class: &IrClass) {
    for argument in class.enum_entries.iter().flat_map(|e| e.arguments.iter().flatten()) {
        visitor.visit_expr(argument);
    }
    for decl in &class.declarations {
        visitor.visit_declaration(decl);
    }
}

pub fn walk_function<V: Visitor>(visitor: &mut V, function: &IrFunction) {
    if let Some(receiver) = &function.extension_receiver {
        visitor.visit_value_parameter(receiver);
    }
    for param in &function.parameters {
        visitor.visit_value_parameter(param);
    }
    if let Some(body) = &function.body {
        walk_statements(visitor, &body.statements);
    }
}

pub fn walk_constructor<V: Visitor>(visitor: &mut V, constructor: &IrConstructor) {
    for param in &constructor.parameters {
        visitor.visit_value_parameter(param);
    }
    if let Some(delegation) = &constructor.delegation {
        for arg in delegation.arguments.iter().flatten() {
            visitor.visit_expr(arg);
        }
    }
    for init in &constructor.initializer_list {
        visitor.visit_expr(&init.value);
    }
    walk_statements(visitor, &constructor.body.statements);
}

pub fn walk_property<V: Visitor>(visitor: &mut V, property: &IrProperty) {
    if let Some(field) = &property.backing_field {
        visitor.visit_field(field);
    }
    if let Some(getter) = &property.getter {
        visitor.visit_function(getter);
    }
    if let Some(setter) = &property.setter {
        visitor.visit_function(setter);
    }
}

pub fn walk_field<V: Visitor>(visitor: &mut V, field: &IrField) {
    if let Some(init) = &field.initializer {
        visitor.visit_expr(init);
    }
}

pub fn walk_value_parameter<V: Visitor>(visitor: &mut V, param: &IrValueParameter) {
    if let Some(default) = &param.default_value {
        visitor.visit_expr(default);
    }
}

pub fn walk_variable<V: Visitor>(visitor: &mut V, variable: &IrVariable) {
    if let Some(init) = &variable.initializer {
        visitor.visit_expr(init);
    }
}

pub fn walk_statements<V: Visitor>(visitor: &mut V, stmts: &[IrStatement]) {
    for stmt in stmts {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement<V: Visitor>(visitor: &mut V, stmt: &IrStatement) {
    match stmt {
        IrStatement::Expr(expr) => visitor.visit_expr(expr),
        IrStatement::Variable(variable) => visitor.visit_variable(variable),
        IrStatement::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        IrStatement::While { condition, body, .. } | IrStatement::DoWhile { condition, body, .. } => {
            visitor.visit_expr(condition);
            walk_statements(visitor, body);
        }
        IrStatement::Break { .. } | IrStatement::Continue { .. } => {}
        IrStatement::Block(stmts) => walk_statements(visitor, stmts),
        IrStatement::Try(try_) => {
            walk_statements(visitor, &try_.body);
            for catch in &try_.catches {
                visitor.visit_variable(&catch.parameter);
                walk_statements(visitor, &catch.body);
            }
            if let Some(finally) = &try_.finally {
                walk_statements(visitor, finally);
            }
        }
        IrStatement::LocalFunction(function) => visitor.visit_function(function),
        IrStatement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(condition);
            walk_statements(visitor, then_branch);
            if let Some(else_branch) = else_branch {
                walk_statements(visitor, else_branch);
            }
        }
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &IrExpr) {
    match &expr.kind {
        IrExprKind::Const(_)
        | IrExprKind::GetValue { .. }
        | IrExprKind::This { .. }
        | IrExprKind::GetObject { .. }
        | IrExprKind::GetEnumEntry { .. }
        | IrExprKind::Unit => {}
        IrExprKind::SetValue { value, .. } => visitor.visit_expr(value),
        IrExprKind::GetProperty { receiver, .. } | IrExprKind::GetField { receiver, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
        }
        IrExprKind::SetProperty { receiver, value, .. } | IrExprKind::SetField { receiver, value, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
            visitor.visit_expr(value);
        }
        IrExprKind::Call(call) => {
            if let Some(receiver) = &call.dispatch_receiver {
                visitor.visit_expr(receiver);
            }
            if let Some(receiver) = &call.extension_receiver {
                visitor.visit_expr(receiver);
            }
            for arg in call.arguments.iter().flatten() {
                visitor.visit_expr(arg);
            }
        }
        IrExprKind::ConstructorCall(call) => {
            for arg in call.arguments.iter().flatten() {
                visitor.visit_expr(arg);
            }
        }
        IrExprKind::TypeOp { operand, .. } => visitor.visit_expr(operand),
        IrExprKind::When(when) => {
            for branch in &when.branches {
                if let Some(condition) = &branch.condition {
                    visitor.visit_expr(condition);
                }
                visitor.visit_expr(&branch.result);
            }
        }
        IrExprKind::Block(block) => walk_statements(visitor, &block.statements),
        IrExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr(part);
            }
        }
        IrExprKind::Lambda(function) => visitor.visit_function(function),
        IrExprKind::Throw(value) => visitor.visit_expr(value),
        IrExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        IrExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        IrExprKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_branch);
            visitor.visit_expr(else_branch);
        }
        IrExprKind::Index { receiver, index } => {
            visitor.visit_expr(receiver);
            visitor.visit_expr(index);
        }
        IrExprKind::IndexSet { receiver, index, value } => {
            visitor.visit_expr(receiver);
            visitor.visit_expr(index);
            visitor.visit_expr(value);
        }
    }
}

// ============================================================================
// Mutable traversal
// ============================================================================

pub trait VisitorMut: Sized {
    fn visit_declaration_mut(&mut self, decl: &mut IrDeclaration) {
        walk_declaration_mut(self, decl);
    }

    fn visit_function_mut(&mut self, function: &mut IrFunction) {
        walk_function_mut(self, function);
    }

    /// A statement list; overriding this allows splicing.
    fn visit_statements_mut(&mut self, stmts: &mut Vec<IrStatement>) {
        walk_statements_mut(self, stmts);
    }

    fn visit_statement_mut(&mut self, stmt: &mut IrStatement) {
        walk_statement_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_declaration_mut<V: VisitorMut>(visitor: &mut V, decl: &mut IrDeclaration) {
    match decl {
        IrDeclaration::Class(class) => {
            for argument in class.enum_entries.iter_mut().flat_map(|e| e.arguments.iter_mut().flatten()) {
                visitor.visit_expr_mut(argument);
            }
            for decl in &mut class.declarations {
                visitor.visit_declaration_mut(decl);
            }
        }
        IrDeclaration::Function(function) => visitor.visit_function_mut(function),
        IrDeclaration::Constructor(constructor) => {
            for param in &mut constructor.parameters {
                walk_value_parameter_mut(visitor, param);
            }
            if let Some(delegation) = &mut constructor.delegation {
                for arg in delegation.arguments.iter_mut().flatten() {
                    visitor.visit_expr_mut(arg);
                }
            }
            for init in &mut constructor.initializer_list {
                visitor.visit_expr_mut(&mut init.value);
            }
            visitor.visit_statements_mut(&mut constructor.body.statements);
        }
        IrDeclaration::Property(property) => {
            if let Some(field) = &mut property.backing_field {
                if let Some(init) = &mut field.initializer {
                    visitor.visit_expr_mut(init);
                }
            }
            if let Some(getter) = &mut property.getter {
                visitor.visit_function_mut(getter);
            }
            if let Some(setter) = &mut property.setter {
                visitor.visit_function_mut(setter);
            }
        }
        IrDeclaration::Field(field) => {
            if let Some(init) = &mut field.initializer {
                visitor.visit_expr_mut(init);
            }
        }
        IrDeclaration::AnonymousInitializer(init) => visitor.visit_statements_mut(&mut init.body.statements),
        IrDeclaration::Extension(extension) => {
            for member in &mut extension.members {
                visitor.visit_declaration_mut(member);
            }
        }
    }
}

pub fn walk_function_mut<V: VisitorMut>(visitor: &mut V, function: &mut IrFunction) {
    for param in &mut function.parameters {
        walk_value_parameter_mut(visitor, param);
    }
    if let Some(body) = &mut function.body {
        visitor.visit_statements_mut(&mut body.statements);
    }
}

pub fn walk_value_parameter_mut<V: VisitorMut>(visitor: &mut V, param: &mut IrValueParameter) {
    if let Some(default) = &mut param.default_value {
        visitor.visit_expr_mut(default);
    }
}

pub fn walk_statements_mut<V: VisitorMut>(visitor: &mut V, stmts: &mut Vec<IrStatement>) {
    for stmt in stmts {
        visitor.visit_statement_mut(stmt);
    }
}

pub fn walk_statement_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut IrStatement) {
    match stmt {
        IrStatement::Expr(expr) => visitor.visit_expr_mut(expr),
        IrStatement::Variable(variable) => {
            if let Some(init) = &mut variable.initializer {
                visitor.visit_expr_mut(init);
            }
        }
        IrStatement::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr_mut(value);
            }
        }
        IrStatement::While { condition, body, .. } | IrStatement::DoWhile { condition, body, .. } => {
            visitor.visit_expr_mut(condition);
            visitor.visit_statements_mut(body);
        }
        IrStatement::Break { .. } | IrStatement::Continue { .. } => {}
        IrStatement::Block(stmts) => visitor.visit_statements_mut(stmts),
        IrStatement::Try(try_) => {
            visitor.visit_statements_mut(&mut try_.body);
            for catch in &mut try_.catches {
                visitor.visit_statements_mut(&mut catch.body);
            }
            if let Some(finally) = &mut try_.finally {
                visitor.visit_statements_mut(finally);
            }
        }
        IrStatement::LocalFunction(function) => visitor.visit_function_mut(function),
        IrStatement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr_mut(condition);
            visitor.visit_statements_mut(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_statements_mut(else_branch);
            }
        }
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut IrExpr) {
    match &mut expr.kind {
        IrExprKind::Const(_)
        | IrExprKind::GetValue { .. }
        | IrExprKind::This { .. }
        | IrExprKind::GetObject { .. }
        | IrExprKind::GetEnumEntry { .. }
        | IrExprKind::Unit => {}
        IrExprKind::SetValue { value, .. } => visitor.visit_expr_mut(value),
        IrExprKind::GetProperty { receiver, .. } | IrExprKind::GetField { receiver, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr_mut(receiver);
            }
        }
        IrExprKind::SetProperty { receiver, value, .. } | IrExprKind::SetField { receiver, value, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr_mut(receiver);
            }
            visitor.visit_expr_mut(value);
        }
        IrExprKind::Call(call) => {
            if let Some(receiver) = &mut call.dispatch_receiver {
                visitor.visit_expr_mut(receiver);
            }
            if let Some(receiver) = &mut call.extension_receiver {
                visitor.visit_expr_mut(receiver);
            }
            for arg in call.arguments.iter_mut().flatten() {
                visitor.visit_expr_mut(arg);
            }
        }
        IrExprKind::ConstructorCall(call) => {
            for arg in call.arguments.iter_mut().flatten() {
                visitor.visit_expr_mut(arg);
            }
        }
        IrExprKind::TypeOp { operand, .. } => visitor.visit_expr_mut(operand),
        IrExprKind::When(when) => {
            for branch in &mut when.branches {
                if let Some(condition) = &mut branch.condition {
                    visitor.visit_expr_mut(condition);
                }
                visitor.visit_expr_mut(&mut branch.result);
            }
        }
        IrExprKind::Block(block) => visitor.visit_statements_mut(&mut block.statements),
        IrExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr_mut(part);
            }
        }
        IrExprKind::Lambda(function) => visitor.visit_function_mut(function),
        IrExprKind::Throw(value) => visitor.visit_expr_mut(value),
        IrExprKind::Binary { left, right, .. } => {
            visitor.visit_expr_mut(left);
            visitor.visit_expr_mut(right);
        }
        IrExprKind::Unary { operand, .. } => visitor.visit_expr_mut(operand),
        IrExprKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr_mut(condition);
            visitor.visit_expr_mut(then_branch);
            visitor.visit_expr_mut(else_branch);
        }
        IrExprKind::Index { receiver, index } => {
            visitor.visit_expr_mut(receiver);
            visitor.visit_expr_mut(index);
        }
        IrExprKind::IndexSet { receiver, index, value } => {
            visitor.visit_expr_mut(receiver);
            visitor.visit_expr_mut(index);
            visitor.visit_expr_mut(value);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct AnyExpr<F> {
    predicate: F,
    found: bool,
}

impl<F: FnMut(&IrExpr) -> bool> Visitor for AnyExpr<F> {
    fn visit_expr(&mut self, expr: &IrExpr) {
        if self.found {
            return;
        }
        if (self.predicate)(expr) {
            self.found = true;
            return;
        }
        walk_expr(self, expr);
    }
}

/// Whether `expr` or any expression nested in it satisfies `predicate`.
pub fn any_expr(expr: &IrExpr, predicate: impl FnMut(&IrExpr) -> bool) -> bool {
    let mut visitor = AnyExpr {
        predicate,
        found: false,
    };
    visitor.visit_expr(expr);
    visitor.found
}

/// Whether any expression in `stmts` satisfies `predicate`.
pub fn any_expr_in_statements(stmts: &[IrStatement], predicate: impl FnMut(&IrExpr) -> bool) -> bool {
    let mut visitor = AnyExpr {
        predicate,
        found: false,
    };
    walk_statements(&mut visitor, stmts);
    visitor.found
}

struct ForEachExprMut<F> {
    f: F,
}

impl<F: FnMut(&mut IrExpr)> VisitorMut for ForEachExprMut<F> {
    fn visit_expr_mut(&mut self, expr: &mut IrExpr) {
        walk_expr_mut(self, expr);
        (self.f)(expr);
    }
}

/// Apply `f` bottom-up to `expr` and every expression nested in it.
pub fn for_each_expr_mut(expr: &mut IrExpr, f: impl FnMut(&mut IrExpr)) {
    ForEachExprMut { f }.visit_expr_mut(expr);
}

/// Apply `f` bottom-up to every expression in `stmts`.
pub fn for_each_expr_in_statements_mut(stmts: &mut Vec<IrStatement>, f: impl FnMut(&mut IrExpr)) {
    walk_statements_mut(&mut ForEachExprMut { f }, stmts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrType, NodeId};

    fn get(id: u32, target: u32) -> IrExpr {
        IrExpr::new(NodeId(id), IrType::int(), IrExprKind::GetValue { target: NodeId(target) })
    }

    fn plus(id: u32, left: IrExpr, right: IrExpr) -> IrExpr {
        IrExpr::new(
            NodeId(id),
            IrType::int(),
            IrExprKind::Binary {
                op: IrBinaryOp::Plus,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    #[test]
    fn test_any_expr_finds_nested() {
        let expr = plus(10, get(11, 1), plus(12, get(13, 2), get(14, 3)));
        assert!(any_expr(&expr, |e| e.is_get_value(NodeId(3))));
        assert!(!any_expr(&expr, |e| e.is_get_value(NodeId(4))));
    }

    #[test]
    fn test_for_each_is_bottom_up() {
        let mut expr = plus(10, get(11, 1), get(12, 2));
        let mut order = Vec::new();
        for_each_expr_mut(&mut expr, |e| order.push(e.id.as_u32()));
        assert_eq!(order, vec![11, 12, 10]);
    }
}
