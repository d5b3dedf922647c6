use super::{DartRenderer, Delimiters};
use crate::dart::{
    DartAnnotation, DartClassDeclaration, DartClassMember, DartCompilationUnit, DartConstructorDeclaration,
    DartConstructorInitializer, DartDeclaration, DartDirective, DartExtensionDeclaration, DartFieldDeclaration,
    DartMethodDeclaration, DartMethodKind, DartTypeAnnotation,
};

impl DartRenderer {
    pub(super) fn compilation_unit(&mut self, unit: &DartCompilationUnit) {
        for directive in &unit.directives {
            match directive {
                DartDirective::Import(import) => {
                    self.write("import '");
                    self.write(&import.uri);
                    self.write("'");
                    if let Some(prefix) = &import.prefix {
                        self.write(" as ");
                        self.write(prefix);
                    }
                    self.write(";");
                    self.newline();
                }
            }
        }
        for declaration in &unit.declarations {
            self.blank_line();
            self.declaration(declaration);
        }
        self.newline();
    }

    fn declaration(&mut self, declaration: &DartDeclaration) {
        match declaration {
            DartDeclaration::Class(class) => self.class(class),
            DartDeclaration::Function(function) => self.function_declaration(function),
            DartDeclaration::Variable(variable) => {
                self.documentation(variable.documentation.as_deref());
                self.annotations(&variable.annotations);
                self.variable_list(&variable.variables);
                self.write(";");
            }
            DartDeclaration::Accessor(accessor) => self.method(accessor),
            DartDeclaration::Extension(extension) => self.extension(extension),
        }
    }

    pub(super) fn documentation(&mut self, documentation: Option<&str>) {
        let Some(documentation) = documentation else {
            return;
        };
        for line in documentation.lines() {
            if line.is_empty() {
                self.write("///");
            } else {
                self.write("/// ");
                self.write(line);
            }
            self.newline();
        }
    }

    /// One annotation per line.
    pub(super) fn annotations(&mut self, annotations: &[DartAnnotation]) {
        for annotation in annotations {
            self.write("@");
            self.write(&annotation.name);
            if let Some(arguments) = &annotation.arguments {
                self.argument_list(arguments);
            }
            self.newline();
        }
    }

    fn class(&mut self, class: &DartClassDeclaration) {
        self.documentation(class.documentation.as_deref());
        self.annotations(&class.annotations);
        if class.is_abstract {
            self.write("abstract ");
        }
        self.write("class ");
        self.write(&class.name.value());
        self.type_parameters(&class.type_parameters);
        if let Some(extends) = &class.extends {
            self.write(" extends ");
            self.type_annotation(extends);
        }
        self.type_clause("with", &class.with);
        self.type_clause("implements", &class.implements);
        self.write(" ");
        self.members(&class.members);
    }

    fn type_clause(&mut self, keyword: &str, types: &[DartTypeAnnotation]) {
        let prefix = format!(" {} ", keyword);
        self.join(types, Delimiters::enclosed(&prefix, ""), |r, t| r.type_annotation(t));
    }

    /// Class or extension body. Consecutive fields stay together; every
    /// other member is set off by an empty line.
    fn members(&mut self, members: &[DartClassMember]) {
        if members.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.indented(|r| {
            let mut previous_was_field = None;
            for member in members {
                let is_field = matches!(member, DartClassMember::Field(_));
                match previous_was_field {
                    Some(true) if is_field => r.newline(),
                    Some(_) => r.blank_line(),
                    None => r.newline(),
                }
                previous_was_field = Some(is_field);
                r.member(member);
            }
        });
        self.newline();
        self.write("}");
    }

    fn member(&mut self, member: &DartClassMember) {
        match member {
            DartClassMember::Constructor(constructor) => self.constructor(constructor),
            DartClassMember::Method(method) => self.method(method),
            DartClassMember::Field(field) => self.field(field),
        }
    }

    fn field(&mut self, field: &DartFieldDeclaration) {
        self.documentation(field.documentation.as_deref());
        self.annotations(&field.annotations);
        if field.is_static {
            self.write("static ");
        }
        self.variable_list(&field.variables);
        self.write(";");
    }

    fn constructor(&mut self, constructor: &DartConstructorDeclaration) {
        self.documentation(constructor.documentation.as_deref());
        self.annotations(&constructor.annotations);
        if constructor.is_const {
            self.write("const ");
        }
        self.write(&constructor.class_name.value());
        if let Some(name) = &constructor.name {
            self.write(".");
            self.write(&name.value());
        }
        self.formal_parameters(&constructor.parameters);
        self.join(&constructor.initializers, Delimiters::enclosed(" : ", ""), |r, init| {
            r.initializer(init)
        });
        self.function_body(&constructor.body);
    }

    fn initializer(&mut self, initializer: &DartConstructorInitializer) {
        let (keyword, name, arguments) = match initializer {
            DartConstructorInitializer::Field { name, value } => {
                self.write(&name.value());
                self.write(" = ");
                self.top_level().expression(value);
                return;
            }
            DartConstructorInitializer::Super { name, arguments } => ("super", name, arguments),
            DartConstructorInitializer::Redirecting { name, arguments } => ("this", name, arguments),
        };
        self.write(keyword);
        if let Some(name) = name {
            self.write(".");
            self.write(&name.value());
        }
        self.argument_list(arguments);
    }

    fn method(&mut self, method: &DartMethodDeclaration) {
        self.documentation(method.documentation.as_deref());
        self.annotations(&method.annotations);
        if method.is_static {
            self.write("static ");
        }
        if let Some(ty) = &method.return_type {
            self.type_annotation(ty);
            self.write(" ");
        }
        match method.kind {
            DartMethodKind::Method => self.write(&method.name.value()),
            DartMethodKind::Getter => {
                self.write("get ");
                self.write(&method.name.value());
            }
            DartMethodKind::Setter => {
                self.write("set ");
                self.write(&method.name.value());
            }
            DartMethodKind::Operator(token) => {
                self.write("operator ");
                self.write(token);
            }
        }
        self.type_parameters(&method.type_parameters);
        if let Some(parameters) = &method.parameters {
            self.formal_parameters(parameters);
        }
        self.function_body(&method.body);
    }

    fn extension(&mut self, extension: &DartExtensionDeclaration) {
        self.documentation(extension.documentation.as_deref());
        self.annotations(&extension.annotations);
        self.write("extension");
        if let Some(name) = &extension.name {
            self.write(" ");
            self.write(&name.value());
        }
        self.type_parameters(&extension.type_parameters);
        self.write(" on ");
        self.type_annotation(&extension.on);
        self.write(" ");
        self.members(&extension.members);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dart::{
        DartArgumentList, DartExpression, DartFormalParameter, DartFormalParameterList, DartFunctionBody,
        DartImportDirective, DartLiteral, DartParameterKind, DartVariableDeclaration, DartVariableDeclarationList,
        DartVariableKeyword,
    };
    use crate::render::render;

    fn field(name: &str) -> DartClassMember {
        DartClassMember::Field(DartFieldDeclaration {
            is_static: false,
            variables: DartVariableDeclarationList {
                keyword: Some(DartVariableKeyword::Final),
                is_late: false,
                ty: Some(DartTypeAnnotation::named("int")),
                variables: vec![DartVariableDeclaration {
                    name: name.into(),
                    initializer: None,
                }],
            },
            annotations: Vec::new(),
            documentation: None,
        })
    }

    fn getter(name: &str, value: i64) -> DartMethodDeclaration {
        DartMethodDeclaration {
            name: name.into(),
            kind: DartMethodKind::Getter,
            is_static: false,
            return_type: Some(DartTypeAnnotation::named("int")),
            type_parameters: Vec::new(),
            parameters: None,
            body: DartFunctionBody::Expression(Box::new(DartExpression::Literal(DartLiteral::Int(value)))),
            annotations: vec![DartAnnotation::marker("override")],
            documentation: None,
        }
    }

    #[test]
    fn test_class_layout() {
        let constructor = DartConstructorDeclaration {
            class_name: "Point".into(),
            name: None,
            is_const: true,
            parameters: DartFormalParameterList::new(vec![DartFormalParameter {
                kind: DartParameterKind::Required,
                name: "x".into(),
                ty: None,
                is_field_formal: true,
                default_value: None,
            }]),
            initializers: vec![
                DartConstructorInitializer::Field {
                    name: "y".into(),
                    value: DartExpression::Literal(DartLiteral::Int(0)),
                },
                DartConstructorInitializer::Super {
                    name: None,
                    arguments: DartArgumentList::positional(vec![DartExpression::identifier("x")]),
                },
            ],
            body: DartFunctionBody::Empty,
            annotations: Vec::new(),
            documentation: None,
        };
        let class = DartClassDeclaration {
            name: "Point".into(),
            is_abstract: false,
            type_parameters: Vec::new(),
            extends: Some(DartTypeAnnotation::named("Base")),
            with: Vec::new(),
            implements: vec![DartTypeAnnotation::named("A"), DartTypeAnnotation::named("B")],
            members: vec![
                field("x"),
                field("y"),
                DartClassMember::Constructor(constructor),
                DartClassMember::Method(getter("sum", 3)),
            ],
            annotations: Vec::new(),
            documentation: Some("A point.".into()),
        };
        let unit = DartCompilationUnit {
            directives: vec![DartDirective::Import(DartImportDirective {
                uri: "package:app/base.dart".into(),
                prefix: None,
            })],
            declarations: vec![DartDeclaration::Class(class)],
        };
        let expected = "\
import 'package:app/base.dart';

/// A point.
class Point extends Base implements A, B {
  final int x;
  final int y;

  const Point(this.x) : y = 0, super(x);

  @override
  int get sum => 3;
}
";
        assert_eq!(render(&unit), expected);
    }

    #[test]
    fn test_operator_and_top_level_accessor() {
        let mut op = getter("plus", 1);
        op.kind = DartMethodKind::Operator("+");
        op.annotations.clear();
        op.parameters = Some(DartFormalParameterList::new(vec![DartFormalParameter {
            kind: DartParameterKind::Required,
            name: "other".into(),
            ty: Some(DartTypeAnnotation::named("V")),
            is_field_formal: false,
            default_value: None,
        }]));
        let mut accessor = getter("answer", 42);
        accessor.annotations.clear();
        let unit = DartCompilationUnit {
            directives: Vec::new(),
            declarations: vec![
                DartDeclaration::Extension(DartExtensionDeclaration {
                    name: Some("VOps".into()),
                    type_parameters: Vec::new(),
                    on: DartTypeAnnotation::named("V"),
                    members: vec![DartClassMember::Method(op)],
                    annotations: Vec::new(),
                    documentation: None,
                }),
                DartDeclaration::Accessor(accessor),
            ],
        };
        let expected = "\
extension VOps on V {
  int operator +(V other) => 1;
}

int get answer => 42;
";
        assert_eq!(render(&unit), expected);
    }
}
