use super::{Translation, Translator};
use crate::dart::{
    DartCatchClause, DartFunctionDeclaration, DartStatement, DartVariableDeclaration, DartVariableDeclarationList,
    DartVariableKeyword,
};
use crate::ir::{builtins, IrCatch, IrExprKind, IrFunction, IrStatement, IrVariable};

impl Translator<'_> {
    pub(super) fn translate_statements(&mut self, statements: &[IrStatement]) -> Translation<Vec<DartStatement>> {
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            if let Some(translated) = self.translate_statement(stmt)? {
                out.push(translated);
            }
        }
        Ok(out)
    }

    /// `None` for statements with nothing to emit.
    fn translate_statement(&mut self, stmt: &IrStatement) -> Translation<Option<DartStatement>> {
        let translated = match stmt {
            IrStatement::Expr(expr) if matches!(expr.kind, IrExprKind::Unit) => return Ok(None),
            IrStatement::Expr(expr) => DartStatement::Expression(self.translate_expr(expr)?),
            IrStatement::Variable(variable) => DartStatement::Variable(self.translate_variable(variable)?),
            IrStatement::Return(value) => DartStatement::Return(match value {
                Some(value) => Some(self.translate_expr(value)?),
                None => None,
            }),
            IrStatement::While { label, condition, body } => DartStatement::While {
                label: label.clone(),
                condition: self.translate_expr(condition)?,
                body: self.translate_statements(body)?,
            },
            IrStatement::DoWhile { label, body, condition } => DartStatement::Do {
                label: label.clone(),
                body: self.translate_statements(body)?,
                condition: self.translate_expr(condition)?,
            },
            IrStatement::Break { label } => DartStatement::Break { label: label.clone() },
            IrStatement::Continue { label } => DartStatement::Continue { label: label.clone() },
            IrStatement::Block(statements) => DartStatement::Block(self.translate_statements(statements)?),
            IrStatement::Try(try_) => DartStatement::Try {
                body: self.translate_statements(&try_.body)?,
                catches: try_
                    .catches
                    .iter()
                    .map(|c| self.translate_catch(c))
                    .collect::<Translation<_>>()?,
                finally: match &try_.finally {
                    Some(statements) => Some(self.translate_statements(statements)?),
                    None => None,
                },
            },
            IrStatement::LocalFunction(function) => DartStatement::LocalFunction(self.translate_local_function(function)?),
            IrStatement::If {
                condition,
                then_branch,
                else_branch,
            } => DartStatement::If {
                condition: self.translate_expr(condition)?,
                then_branch: self.translate_statements(then_branch)?,
                else_branch: match else_branch {
                    Some(statements) => Some(self.translate_statements(statements)?),
                    None => None,
                },
            },
        };
        Ok(Some(translated))
    }

    fn translate_variable(&mut self, variable: &IrVariable) -> Translation<DartVariableDeclarationList> {
        let keyword = if variable.is_const {
            Some(DartVariableKeyword::Const)
        } else if variable.is_var {
            None
        } else {
            Some(DartVariableKeyword::Final)
        };
        let initializer = match &variable.initializer {
            Some(value) => Some(self.in_const_context(variable.is_const, |t| t.translate_expr(value))?),
            None => None,
        };
        Ok(DartVariableDeclarationList {
            keyword,
            is_late: false,
            ty: Some(self.dart_type(&variable.ty)),
            variables: vec![DartVariableDeclaration {
                name: self.local_name(self.info(variable.id)?),
                initializer,
            }],
        })
    }

    /// `catch (e)` for catch-alls, `on T catch (e)` otherwise.
    fn translate_catch(&mut self, catch: &IrCatch) -> Translation<DartCatchClause> {
        let ty = &catch.parameter.ty;
        let on = if ty.is(builtins::THROWABLE) || ty.is(builtins::ANY) {
            None
        } else {
            Some(self.dart_type(&ty.make_not_null()))
        };
        Ok(DartCatchClause {
            on,
            exception: self.local_name(self.info(catch.parameter.id)?),
            body: self.translate_statements(&catch.body)?,
        })
    }

    fn translate_local_function(&mut self, function: &IrFunction) -> Translation<DartFunctionDeclaration> {
        Ok(DartFunctionDeclaration {
            name: self.local_name(self.info(function.id)?),
            return_type: Some(self.dart_type(&function.return_type)),
            type_parameters: self.type_parameters(&function.type_parameters),
            parameters: self.function_parameters(function)?,
            body: self.function_body(function.body.as_ref())?,
            annotations: Vec::new(),
            documentation: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dart::DartExpression;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrDeclaration, IrModule, IrTry, IrType};
    use crate::translate::test_support::with_translator;

    fn body_of(b: &mut IrBuilder, statements: Vec<IrStatement>) -> Vec<DartStatement> {
        let function = b.function("test", IrType::unit()).body(statements).build();
        let mut file = b.file("app/Test.kt", "app");
        file.declarations.push(IrDeclaration::Function(function));
        let mut module = IrModule::new("test");
        module.add_file(file);
        let unit = with_translator(&module, |t| t.translate_file(&module.files[0])).unwrap();
        match unit.declarations.into_iter().next() {
            Some(crate::dart::DartDeclaration::Function(f)) => match f.body {
                crate::dart::DartFunctionBody::Block(statements) => statements,
                other => panic!("expected block body, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_keywords() {
        let mut b = IrBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let fixed = b.variable("a", IrType::int(), Some(one));
        let mut mutable = b.variable("b", IrType::int(), Some(two));
        mutable.is_var = true;
        let statements = body_of(&mut b, vec![IrStatement::Variable(fixed), IrStatement::Variable(mutable)]);

        let keywords: Vec<Option<DartVariableKeyword>> = statements
            .iter()
            .map(|s| match s {
                DartStatement::Variable(list) => list.keyword,
                other => panic!("expected variable, got {:?}", other),
            })
            .collect();
        assert_eq!(keywords, vec![Some(DartVariableKeyword::Final), None]);
    }

    #[test]
    fn test_temporaries_get_generated_names() {
        let mut b = IrBuilder::new();
        let one = b.int(1);
        let tmp = b.temporary(one);
        let read = b.get_variable(&tmp);
        let statements = body_of(&mut b, vec![IrStatement::Variable(tmp.clone()), IrStatement::Return(Some(read))]);

        let DartStatement::Variable(list) = &statements[0] else {
            panic!("expected variable");
        };
        let name = list.variables[0].name.clone();
        assert!(name.is_generated());
        assert_eq!(
            statements[1],
            DartStatement::Return(Some(DartExpression::identifier(name)))
        );
    }

    #[test]
    fn test_catch_all_has_no_on_clause() {
        let mut b = IrBuilder::new();
        let any = b.variable("e", IrType::builtin(builtins::THROWABLE), None);
        let specific = b.variable("e", IrType::builtin("app.MyError"), None);
        let try_ = IrTry {
            body: Vec::new(),
            catches: vec![
                IrCatch {
                    parameter: specific,
                    body: Vec::new(),
                },
                IrCatch {
                    parameter: any,
                    body: Vec::new(),
                },
            ],
            finally: None,
        };
        let statements = body_of(&mut b, vec![IrStatement::Try(try_)]);

        let DartStatement::Try { catches, .. } = &statements[0] else {
            panic!("expected try");
        };
        assert!(catches[0].on.is_some());
        assert!(catches[1].on.is_none());
    }

    #[test]
    fn test_unit_statement_dropped() {
        let mut b = IrBuilder::new();
        let unit = b.unit();
        let statements = body_of(&mut b, vec![IrStatement::Expr(unit), IrStatement::Return(None)]);
        assert_eq!(statements, vec![DartStatement::Return(None)]);
    }
}
