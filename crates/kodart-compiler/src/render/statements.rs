use super::{DartRenderer, Delimiters};
use crate::dart::{
    DartCatchClause, DartExpression, DartFunctionBody, DartFunctionDeclaration, DartStatement,
    DartVariableDeclarationList, DartVariableKeyword,
};

impl DartRenderer {
    /// `{ ... }` with each statement on its own line. Leaves the cursor
    /// right after the closing brace.
    pub(super) fn block(&mut self, statements: &[DartStatement]) {
        if statements.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.indented(|r| {
            for stmt in statements {
                r.newline();
                r.statement(stmt);
            }
        });
        self.newline();
        self.write("}");
    }

    /// Body following a parameter list: `;`, ` => e;` or ` { ... }`.
    pub(super) fn function_body(&mut self, body: &DartFunctionBody) {
        match body {
            DartFunctionBody::Empty => self.write(";"),
            DartFunctionBody::Expression(value) => {
                self.write(" => ");
                self.top_level().expression(value);
                self.write(";");
            }
            DartFunctionBody::Block(statements) => {
                self.write(" ");
                self.block(statements);
            }
        }
    }

    /// `final int a = 1, b` without the trailing semicolon.
    pub(super) fn variable_list(&mut self, list: &DartVariableDeclarationList) {
        if list.is_late {
            self.write("late ");
        }
        match (list.keyword, &list.ty) {
            (Some(keyword), _) => {
                self.write(keyword.as_str());
                self.write(" ");
            }
            (None, None) => {
                self.write(DartVariableKeyword::Var.as_str());
                self.write(" ");
            }
            (None, Some(_)) => {}
        }
        if let Some(ty) = &list.ty {
            self.type_annotation(ty);
            self.write(" ");
        }
        self.join(&list.variables, Delimiters::COMMA, |r, variable| {
            r.write(&variable.name.value());
            if let Some(value) = &variable.initializer {
                r.write(" = ");
                r.top_level().expression(value);
            }
        });
    }

    pub(super) fn function_declaration(&mut self, function: &DartFunctionDeclaration) {
        self.documentation(function.documentation.as_deref());
        self.annotations(&function.annotations);
        if let Some(ty) = &function.return_type {
            self.type_annotation(ty);
            self.write(" ");
        }
        self.write(&function.name.value());
        self.type_parameters(&function.type_parameters);
        self.formal_parameters(&function.parameters);
        self.function_body(&function.body);
    }

    fn statement(&mut self, stmt: &DartStatement) {
        match stmt {
            DartStatement::Expression(expr) => {
                self.top_level().expression(expr);
                self.write(";");
            }
            DartStatement::Variable(list) => {
                self.variable_list(list);
                self.write(";");
            }
            DartStatement::Return(value) => match value {
                Some(value) => {
                    self.write("return ");
                    self.top_level().expression(value);
                    self.write(";");
                }
                None => self.write("return;"),
            },
            DartStatement::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_statement(condition, then_branch, else_branch.as_deref()),
            DartStatement::Block(statements) => self.block(statements),
            DartStatement::While { label, condition, body } => {
                self.label(label.as_deref());
                self.write("while (");
                self.top_level().expression(condition);
                self.write(") ");
                self.block(body);
            }
            DartStatement::Do { label, body, condition } => {
                self.label(label.as_deref());
                self.write("do ");
                self.block(body);
                self.write(" while (");
                self.top_level().expression(condition);
                self.write(");");
            }
            DartStatement::Break { label } => self.jump("break", label.as_deref()),
            DartStatement::Continue { label } => self.jump("continue", label.as_deref()),
            DartStatement::Try { body, catches, finally } => {
                self.write("try ");
                self.block(body);
                for catch in catches {
                    self.catch_clause(catch);
                }
                if let Some(finally) = finally {
                    self.write(" finally ");
                    self.block(finally);
                }
            }
            DartStatement::LocalFunction(function) => self.function_declaration(function),
        }
    }

    fn if_statement(
        &mut self,
        condition: &DartExpression,
        then_branch: &[DartStatement],
        else_branch: Option<&[DartStatement]>,
    ) {
        self.write("if (");
        self.top_level().expression(condition);
        self.write(") ");
        self.block(then_branch);
        match else_branch {
            None => {}
            Some(
                [DartStatement::If {
                    condition,
                    then_branch,
                    else_branch,
                }],
            ) => {
                self.write(" else ");
                self.if_statement(condition, then_branch, else_branch.as_deref());
            }
            Some(statements) => {
                self.write(" else ");
                self.block(statements);
            }
        }
    }

    fn catch_clause(&mut self, catch: &DartCatchClause) {
        if let Some(on) = &catch.on {
            self.write(" on ");
            self.type_annotation(on);
        }
        self.write(" catch (");
        self.write(&catch.exception.value());
        self.write(") ");
        self.block(&catch.body);
    }

    fn label(&mut self, label: Option<&str>) {
        if let Some(label) = label {
            self.write(label);
            self.write(": ");
        }
    }

    fn jump(&mut self, keyword: &str, label: Option<&str>) {
        self.write(keyword);
        if let Some(label) = label {
            self.write(" ");
            self.write(label);
        }
        self.write(";");
    }
}
