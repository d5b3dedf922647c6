use super::{DartRenderer, Delimiters, Parent, Position};
use crate::dart::operators::{precedence, Precedence};
use crate::dart::{
    DartArgumentList, DartBinaryOperator, DartExpression, DartFunctionBody, DartInterpolationElement, DartLiteral,
};

impl DartRenderer {
    /// Render `expr`, parenthesized if the enclosing operator needs it.
    pub(super) fn expression(&mut self, expr: &DartExpression) {
        let parenthesize = self.parents.last().is_some_and(|parent| needs_parentheses(expr, *parent));
        if parenthesize {
            self.write("(");
            self.top_level().bare_expression(expr);
            self.write(")");
        } else {
            self.bare_expression(expr);
        }
    }

    fn bare_expression(&mut self, expr: &DartExpression) {
        match expr {
            DartExpression::Literal(literal) => self.literal(literal),
            DartExpression::StringInterpolation(elements) => self.interpolation(elements),
            DartExpression::Identifier { prefix, name } => {
                if let Some(prefix) = prefix {
                    self.write(prefix);
                    self.write(".");
                }
                self.write(&name.value());
            }
            DartExpression::This => self.write("this"),
            DartExpression::Super => self.write("super"),
            DartExpression::PropertyAccess {
                target,
                name,
                null_aware,
            } => {
                self.with_parent(precedence::POSTFIX, Position::Operand).expression(target);
                self.write(if *null_aware { "?." } else { "." });
                self.write(&name.value());
            }
            DartExpression::MethodInvocation {
                target,
                name,
                type_arguments,
                arguments,
                null_aware,
            } => {
                if let Some(target) = target {
                    self.with_parent(precedence::POSTFIX, Position::Operand).expression(target);
                    self.write(if *null_aware { "?." } else { "." });
                }
                self.write(&name.value());
                self.join(type_arguments, Delimiters::ANGLE, |r, t| r.type_annotation(t));
                self.argument_list(arguments);
            }
            DartExpression::FunctionInvocation { function, arguments } => {
                self.with_parent(precedence::POSTFIX, Position::Operand).expression(function);
                self.argument_list(arguments);
            }
            DartExpression::InstanceCreation {
                is_const,
                ty,
                constructor_name,
                arguments,
            } => {
                if *is_const {
                    self.write("const ");
                }
                self.type_annotation(ty);
                if let Some(name) = constructor_name {
                    self.write(".");
                    self.write(&name.value());
                }
                self.argument_list(arguments);
            }
            DartExpression::Assignment { target, value } => {
                self.with_parent(precedence::POSTFIX, Position::Operand).expression(target);
                self.write(" = ");
                self.top_level().expression(value);
            }
            DartExpression::Binary { operator, left, right } => {
                self.with_parent(operator.precedence(), Position::Left).expression(left);
                self.write(" ");
                self.write(operator.token());
                self.write(" ");
                self.with_parent(operator.precedence(), Position::Right).expression(right);
            }
            DartExpression::Prefix { operator, operand } => {
                self.write(operator.token());
                self.with_parent(precedence::PREFIX, Position::PrefixOperand).expression(operand);
            }
            DartExpression::Postfix { operator, operand } => {
                self.with_parent(precedence::POSTFIX, Position::Operand).expression(operand);
                self.write(operator.token());
            }
            DartExpression::Conditional {
                condition,
                then_expression,
                else_expression,
            } => {
                self.with_parent(precedence::CONDITIONAL, Position::Right).expression(condition);
                self.write(" ? ");
                self.top_level().expression(then_expression);
                self.write(" : ");
                self.top_level().expression(else_expression);
            }
            DartExpression::As { expression, ty } => {
                self.with_parent(precedence::RELATIONAL, Position::Left).expression(expression);
                self.write(" as ");
                self.type_annotation(ty);
            }
            DartExpression::Is { expression, ty, negated } => {
                self.with_parent(precedence::RELATIONAL, Position::Left).expression(expression);
                self.write(if *negated { " is! " } else { " is " });
                self.type_annotation(ty);
            }
            DartExpression::Index { target, index } => {
                self.with_parent(precedence::POSTFIX, Position::Operand).expression(target);
                self.write("[");
                self.top_level().expression(index);
                self.write("]");
            }
            DartExpression::Throw(value) => {
                self.write("throw ");
                self.top_level().expression(value);
            }
            DartExpression::FunctionExpression { parameters, body } => {
                self.formal_parameters(parameters);
                match body {
                    DartFunctionBody::Expression(value) => {
                        self.write(" => ");
                        self.top_level().expression(value);
                    }
                    DartFunctionBody::Block(statements) => {
                        self.write(" ");
                        self.block(statements);
                    }
                    DartFunctionBody::Empty => self.write(" {}"),
                }
            }
        }
    }

    pub(super) fn argument_list(&mut self, arguments: &DartArgumentList) {
        self.write("(");
        let mut scope = self.top_level();
        scope.join(&arguments.positional, Delimiters::COMMA, |r, a| r.expression(a));
        if !arguments.positional.is_empty() && !arguments.named.is_empty() {
            scope.write(", ");
        }
        scope.join(&arguments.named, Delimiters::COMMA, |r, (name, value)| {
            r.write(&name.value());
            r.write(": ");
            r.expression(value);
        });
        drop(scope);
        self.write(")");
    }

    fn literal(&mut self, literal: &DartLiteral) {
        match literal {
            DartLiteral::Null => self.write("null"),
            DartLiteral::Bool(b) => self.write(if *b { "true" } else { "false" }),
            DartLiteral::Int(i) => self.write(&i.to_string()),
            DartLiteral::Double(d) => self.write(&double_literal(*d)),
            DartLiteral::String(s) => {
                self.write("'");
                self.write(&escape(s));
                self.write("'");
            }
        }
    }

    /// `'text $name ${expression}'`
    fn interpolation(&mut self, elements: &[DartInterpolationElement]) {
        self.write("'");
        for (i, element) in elements.iter().enumerate() {
            match element {
                DartInterpolationElement::Text(text) => self.write(&escape(text)),
                DartInterpolationElement::Expression(expr) => {
                    let next_text = match elements.get(i + 1) {
                        Some(DartInterpolationElement::Text(text)) => text.as_str(),
                        _ => "",
                    };
                    match expr {
                        DartExpression::Identifier { prefix: None, name } if !continues_identifier(next_text) => {
                            self.write("$");
                            self.write(&name.value());
                        }
                        _ => {
                            self.write("${");
                            self.top_level().expression(expr);
                            self.write("}");
                        }
                    }
                }
            }
        }
        self.write("'");
    }
}

/// Whether `expr` must be parenthesized as an operand of `parent`.
fn needs_parentheses(expr: &DartExpression, parent: Parent) -> bool {
    let child = effective_precedence(expr);
    match parent.position {
        Position::Left => child < parent.precedence || (child == parent.precedence && is_non_associative(expr)),
        Position::Right => child <= parent.precedence,
        Position::PrefixOperand => child < parent.precedence || is_prefix_like(expr),
        Position::Operand => child < parent.precedence,
    }
}

/// Negative number literals bind like a prefix minus.
fn effective_precedence(expr: &DartExpression) -> Precedence {
    if is_negative_literal(expr) {
        precedence::PREFIX
    } else {
        expr.precedence()
    }
}

fn is_prefix_like(expr: &DartExpression) -> bool {
    matches!(expr, DartExpression::Prefix { .. }) || is_negative_literal(expr)
}

fn is_negative_literal(expr: &DartExpression) -> bool {
    match expr {
        DartExpression::Literal(DartLiteral::Int(i)) => *i < 0,
        DartExpression::Literal(DartLiteral::Double(d)) => d.is_sign_negative() && !d.is_nan(),
        _ => false,
    }
}

/// Equality, relational and type test operators do not chain.
fn is_non_associative(expr: &DartExpression) -> bool {
    match expr {
        DartExpression::Binary { operator, .. } => DartBinaryOperator::is_non_associative(*operator),
        DartExpression::As { .. } | DartExpression::Is { .. } => true,
        _ => false,
    }
}

fn continues_identifier(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn double_literal(value: f64) -> String {
    if value.is_nan() {
        "double.nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "double.infinity".to_string()
        } else {
            "-double.infinity".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Escape for a single-quoted literal.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
