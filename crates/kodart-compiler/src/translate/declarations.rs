//! Declarations
//!
//! Nested classes are hoisted to the top level after their outer class; the
//! target has no nesting. A property with default accessors becomes a plain
//! field. Any other property is stored in a private `_$name` field behind a
//! getter and, when mutable, a setter.

use super::{backing_field_name, Translation, Translator};
use crate::attributes::keys;
use crate::dart::operators::operator_method_token;
use crate::dart::{
    DartClassDeclaration, DartClassMember, DartConstructorDeclaration, DartConstructorInitializer, DartDeclaration,
    DartExpression, DartExtensionDeclaration, DartFieldDeclaration, DartFormalParameter, DartFormalParameterList,
    DartFunctionBody, DartFunctionDeclaration, DartMethodDeclaration, DartMethodKind, DartParameterKind,
    DartSimpleIdentifier, DartStatement, DartTopLevelVariableDeclaration, DartVariableDeclaration,
    DartVariableDeclarationList, DartVariableKeyword,
};
use crate::error::InternalError;
use crate::ir::{
    annotations, builtins, DeclOrigin, DelegationKind, IrBody, IrClass, IrConstructor, IrDeclaration, IrExtension,
    IrField, IrFunction, IrProperty, IrValueParameter, SuperTypeKind,
};

/// Where a property is declared; decides between `const` and `final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    Member,
}

impl Translator<'_> {
    pub(super) fn translate_top_level(
        &mut self,
        decl: &IrDeclaration,
        out: &mut Vec<DartDeclaration>,
    ) -> Translation<()> {
        match decl {
            IrDeclaration::Class(class) => self.translate_class(class, out)?,
            IrDeclaration::Function(function) => {
                out.push(DartDeclaration::Function(self.translate_function(function)?));
            }
            IrDeclaration::Property(property) => {
                let (variables, accessors) = self.translate_property(property, Scope::TopLevel)?;
                if let Some(variables) = variables {
                    out.push(DartDeclaration::Variable(DartTopLevelVariableDeclaration {
                        variables,
                        annotations: self.annotations(&property.annotations, false),
                        documentation: property.documentation.clone(),
                    }));
                }
                out.extend(accessors.into_iter().map(DartDeclaration::Accessor));
            }
            IrDeclaration::Field(field) => {
                out.push(DartDeclaration::Variable(DartTopLevelVariableDeclaration {
                    variables: self.field_variables(field)?,
                    annotations: Vec::new(),
                    documentation: None,
                }));
            }
            IrDeclaration::Extension(extension) => {
                out.push(DartDeclaration::Extension(self.translate_extension(extension)?));
            }
            IrDeclaration::Constructor(_) => return Err(InternalError::no_mapping("top-level constructor")),
            IrDeclaration::AnonymousInitializer(_) => {
                return Err(InternalError::no_mapping("anonymous initializer"))
            }
        }
        Ok(())
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn translate_class(&mut self, class: &IrClass, out: &mut Vec<DartDeclaration>) -> Translation<()> {
        let name = self.member_name(self.info(class.id)?);
        let mut extends = None;
        let mut with = Vec::new();
        let mut implements = Vec::new();
        for super_type in &class.super_types {
            if super_type.ty.is(builtins::ANY) {
                continue;
            }
            let ty = self.dart_type(&super_type.ty).with_nullable(false);
            match super_type.kind.unwrap_or(SuperTypeKind::Extends) {
                SuperTypeKind::Extends if extends.is_none() => extends = Some(ty),
                SuperTypeKind::Extends => {
                    return Err(InternalError::no_mapping(format!("second superclass of {}", class.fq_name)))
                }
                SuperTypeKind::Implements => implements.push(ty),
                SuperTypeKind::Mixin => with.push(ty),
            }
        }

        let mut members = Vec::new();
        let mut nested = Vec::new();
        for decl in &class.declarations {
            match decl {
                IrDeclaration::Class(inner) => nested.push(inner),
                IrDeclaration::Constructor(constructor) => {
                    members.push(DartClassMember::Constructor(self.translate_constructor(constructor, &name)?));
                }
                IrDeclaration::Function(function) => {
                    members.push(DartClassMember::Method(self.translate_method(function)?));
                }
                IrDeclaration::Property(property) => self.translate_member_property(property, &mut members)?,
                IrDeclaration::Field(field) => members.push(DartClassMember::Field(DartFieldDeclaration {
                    is_static: field.is_static,
                    variables: self.field_variables(field)?,
                    annotations: Vec::new(),
                    documentation: None,
                })),
                IrDeclaration::AnonymousInitializer(_) => {
                    return Err(InternalError::no_mapping("anonymous initializer"))
                }
                IrDeclaration::Extension(_) => return Err(InternalError::no_mapping("extension inside class")),
            }
        }

        out.push(DartDeclaration::Class(DartClassDeclaration {
            name,
            is_abstract: class.is_abstract(),
            type_parameters: self.type_parameters(&class.type_parameters),
            extends,
            with,
            implements,
            members,
            annotations: self.annotations(&class.annotations, false),
            documentation: class.documentation.clone(),
        }));
        for inner in nested {
            self.translate_class(inner, out)?;
        }
        Ok(())
    }

    fn translate_constructor(
        &mut self,
        constructor: &IrConstructor,
        class_name: &DartSimpleIdentifier,
    ) -> Translation<DartConstructorDeclaration> {
        let info = self.info(constructor.id)?;
        let is_const = constructor.is_const || self.attributes.flag(constructor, keys::DART_CONST);
        let positional = constructor.has_annotation(annotations::DART_POSITIONAL);
        let parameters = self.formal_parameters(&constructor.parameters, positional, true)?;

        let mut initializers = Vec::new();
        for init in &constructor.initializer_list {
            let property = self.info(init.property)?;
            let name = self.storage_name(property);
            let value = self.in_const_context(is_const, |t| t.translate_expr(&init.value))?;
            initializers.push(DartConstructorInitializer::Field { name, value });
        }
        if let Some(delegation) = &constructor.delegation {
            let (name, arguments) = match delegation.constructor {
                Some(target) => {
                    let name = self.constructor_name(self.info(target)?);
                    let arguments =
                        self.in_const_context(is_const, |t| t.argument_list(target, &delegation.arguments))?;
                    (name, arguments)
                }
                None => (None, Default::default()),
            };
            // The implicit `super()` is left out.
            if delegation.kind == DelegationKind::This || name.is_some() || !arguments.is_empty() {
                initializers.push(match delegation.kind {
                    DelegationKind::Super => DartConstructorInitializer::Super { name, arguments },
                    DelegationKind::This => DartConstructorInitializer::Redirecting { name, arguments },
                });
            }
        }

        let body = if constructor.body.is_empty() {
            DartFunctionBody::Empty
        } else {
            DartFunctionBody::Block(self.translate_statements(&constructor.body.statements)?)
        };

        Ok(DartConstructorDeclaration {
            class_name: class_name.clone(),
            name: self.constructor_name(info),
            is_const,
            parameters,
            initializers,
            body,
            annotations: self.annotations(&constructor.annotations, false),
            documentation: constructor.documentation.clone(),
        })
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn translate_function(&mut self, function: &IrFunction) -> Translation<DartFunctionDeclaration> {
        let name = self.member_name(self.info(function.id)?);
        Ok(DartFunctionDeclaration {
            name,
            return_type: Some(self.dart_type(&function.return_type)),
            type_parameters: self.type_parameters(&function.type_parameters),
            parameters: self.function_parameters(function)?,
            body: self.function_body(function.body.as_ref())?,
            annotations: self.annotations(&function.annotations, false),
            documentation: function.documentation.clone(),
        })
    }

    pub(super) fn function_parameters(&mut self, function: &IrFunction) -> Translation<DartFormalParameterList> {
        let positional = function.has_annotation(annotations::DART_POSITIONAL);
        self.formal_parameters(&function.parameters, positional, false)
    }

    pub(super) fn function_body(&mut self, body: Option<&IrBody>) -> Translation<DartFunctionBody> {
        match body {
            None => Ok(DartFunctionBody::Empty),
            Some(body) => Ok(DartFunctionBody::Block(self.translate_statements(&body.statements)?)),
        }
    }

    fn translate_method(&mut self, function: &IrFunction) -> Translation<DartMethodDeclaration> {
        let name = self.member_name(self.info(function.id)?);
        let kind = match function.is_operator.then(|| operator_method_token(&function.name)).flatten() {
            Some(token) => DartMethodKind::Operator(token),
            None => DartMethodKind::Method,
        };
        let return_type = match kind {
            DartMethodKind::Operator("[]=") => None,
            _ => Some(self.dart_type(&function.return_type)),
        };
        Ok(DartMethodDeclaration {
            name,
            kind,
            is_static: function.is_static,
            return_type,
            type_parameters: self.type_parameters(&function.type_parameters),
            parameters: Some(self.function_parameters(function)?),
            body: self.function_body(function.body.as_ref())?,
            annotations: self.annotations(&function.annotations, function.is_override),
            documentation: function.documentation.clone(),
        })
    }

    /// Formal parameters. A parameter with a default is optional: named
    /// unless `@DartPositional` is on the function or the parameter.
    /// Constructor parameters declaring a property become `this.x`.
    fn formal_parameters(
        &mut self,
        params: &[IrValueParameter],
        positional: bool,
        field_formals: bool,
    ) -> Translation<DartFormalParameterList> {
        // An optional positional parameter cannot precede a required one.
        // Such a parameter stays required and call sites pass its default.
        let last_required = params.iter().rposition(|p| p.default_value.is_none());
        let mut out = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let kind = match &param.default_value {
                None => DartParameterKind::Required,
                Some(_) if positional || param.has_annotation(annotations::DART_POSITIONAL) => {
                    if last_required.is_some_and(|last| last > i) {
                        DartParameterKind::Required
                    } else {
                        DartParameterKind::OptionalPositional
                    }
                }
                Some(_) => DartParameterKind::OptionalNamed,
            };
            let default_value = match &param.default_value {
                Some(value) if kind != DartParameterKind::Required => {
                    Some(self.in_const_context(true, |t| t.translate_expr(value))?)
                }
                _ => None,
            };
            let property = match param.corresponding_property {
                Some(property) if field_formals => Some(self.info(property)?),
                _ => None,
            };
            out.push(match property {
                Some(property) => DartFormalParameter {
                    kind,
                    name: self.storage_name(property),
                    ty: None,
                    is_field_formal: true,
                    default_value,
                },
                None => DartFormalParameter {
                    kind,
                    name: DartSimpleIdentifier::new(param.name.as_str()),
                    ty: Some(self.dart_type(&param.ty)),
                    is_field_formal: false,
                    default_value,
                },
            });
        }
        Ok(DartFormalParameterList::new(out))
    }

    // ========================================================================
    // Properties and fields
    // ========================================================================

    fn translate_member_property(
        &mut self,
        property: &IrProperty,
        members: &mut Vec<DartClassMember>,
    ) -> Translation<()> {
        let (variables, accessors) = self.translate_property(property, Scope::Member)?;
        let is_static = property.backing_field.as_ref().is_some_and(|f| f.is_static);
        if let Some(variables) = variables {
            members.push(DartClassMember::Field(DartFieldDeclaration {
                is_static,
                variables,
                annotations: self.annotations(&property.annotations, property.is_override),
                documentation: property.documentation.clone(),
            }));
        }
        members.extend(accessors.into_iter().map(DartClassMember::Method));
        Ok(())
    }

    /// The storage and the accessors of a property.
    fn translate_property(
        &mut self,
        property: &IrProperty,
        scope: Scope,
    ) -> Translation<(Option<DartVariableDeclarationList>, Vec<DartMethodDeclaration>)> {
        let info = self.info(property.id)?;
        let name = self.member_name(info);
        let is_const = property.is_const || self.attributes.flag(property, keys::DART_CONST);
        let deferred = self.attributes.flag(property, keys::INITIALIZED_IN_CONSTRUCTOR_BODY);
        let in_initializer_list = self.attributes.flag(property, keys::INITIALIZED_IN_FIELD_INITIALIZER_LIST);

        if property.is_simple() {
            let Some(field) = &property.backing_field else {
                return Err(InternalError::no_mapping(format!("property {} without storage", property.name)));
            };
            let keyword = if is_const && (scope == Scope::TopLevel || field.is_static) {
                Some(DartVariableKeyword::Const)
            } else if !property.is_var {
                Some(DartVariableKeyword::Final)
            } else {
                None
            };
            let initializer = match &field.initializer {
                Some(value) if !deferred && !in_initializer_list => {
                    let is_const = keyword == Some(DartVariableKeyword::Const);
                    Some(self.in_const_context(is_const, |t| t.translate_expr(value))?)
                }
                _ => None,
            };
            let variables = DartVariableDeclarationList {
                keyword,
                is_late: property.is_lateinit || deferred,
                ty: Some(self.dart_type(&property.ty)),
                variables: vec![DartVariableDeclaration { name, initializer }],
            };
            return Ok((Some(variables), Vec::new()));
        }

        let storage = backing_field_name(&name);
        let is_static = property.backing_field.as_ref().is_some_and(|f| f.is_static);
        let variables = match &property.backing_field {
            Some(field) => {
                let initializer = match &field.initializer {
                    Some(value) if !deferred && !in_initializer_list => Some(self.translate_expr(value)?),
                    _ => None,
                };
                Some(DartVariableDeclarationList {
                    keyword: field.is_final.then_some(DartVariableKeyword::Final),
                    is_late: property.is_lateinit || deferred,
                    ty: Some(self.dart_type(&field.ty)),
                    variables: vec![DartVariableDeclaration {
                        name: storage.clone(),
                        initializer,
                    }],
                })
            }
            None => None,
        };

        let mut accessors = Vec::new();
        if let Some(getter) = &property.getter {
            let body = if getter.origin == DeclOrigin::DefaultAccessor {
                DartFunctionBody::Expression(Box::new(DartExpression::identifier(storage.clone())))
            } else {
                self.function_body(getter.body.as_ref())?
            };
            accessors.push(DartMethodDeclaration {
                name: name.clone(),
                kind: DartMethodKind::Getter,
                is_static,
                return_type: Some(self.dart_type(&property.ty)),
                type_parameters: Vec::new(),
                parameters: None,
                body,
                annotations: self.annotations(&property.annotations, property.is_override),
                documentation: property.documentation.clone(),
            });
        }
        if let Some(setter) = &property.setter {
            let value = setter
                .parameters
                .first()
                .map(|p| DartSimpleIdentifier::new(p.name.as_str()))
                .unwrap_or_else(|| DartSimpleIdentifier::new("value"));
            let body = if setter.origin == DeclOrigin::DefaultAccessor {
                DartFunctionBody::Block(vec![DartStatement::Expression(DartExpression::Assignment {
                    target: Box::new(DartExpression::identifier(storage.clone())),
                    value: Box::new(DartExpression::identifier(value.clone())),
                })])
            } else {
                self.function_body(setter.body.as_ref())?
            };
            accessors.push(DartMethodDeclaration {
                name,
                kind: DartMethodKind::Setter,
                is_static,
                return_type: None,
                type_parameters: Vec::new(),
                parameters: Some(DartFormalParameterList::new(vec![DartFormalParameter {
                    kind: DartParameterKind::Required,
                    name: value,
                    ty: Some(self.dart_type(&property.ty)),
                    is_field_formal: false,
                    default_value: None,
                }])),
                body,
                annotations: self.annotations(&[], property.is_override),
                documentation: None,
            });
        }
        Ok((variables, accessors))
    }

    fn field_variables(&mut self, field: &IrField) -> Translation<DartVariableDeclarationList> {
        let name = self.field_storage_name(self.info(field.id)?);
        let initializer = match &field.initializer {
            Some(value) => Some(self.translate_expr(value)?),
            None => None,
        };
        Ok(DartVariableDeclarationList {
            keyword: field.is_final.then_some(DartVariableKeyword::Final),
            is_late: false,
            ty: Some(self.dart_type(&field.ty)),
            variables: vec![DartVariableDeclaration { name, initializer }],
        })
    }

    // ========================================================================
    // Extensions
    // ========================================================================

    fn translate_extension(&mut self, extension: &IrExtension) -> Translation<DartExtensionDeclaration> {
        let name = DartSimpleIdentifier::new(extension.name.as_str());
        let name = if extension.is_generated_name { name.as_generated() } else { name };
        let name = name.private_if(extension.visibility.is_private());

        let mut members = Vec::new();
        for member in &extension.members {
            match member {
                IrDeclaration::Function(function) => {
                    members.push(DartClassMember::Method(self.translate_method(function)?));
                }
                IrDeclaration::Property(property) => {
                    let (variables, accessors) = self.translate_property(property, Scope::Member)?;
                    if variables.is_some() {
                        return Err(InternalError::no_mapping(format!(
                            "extension property {} with storage",
                            property.name
                        )));
                    }
                    members.extend(accessors.into_iter().map(DartClassMember::Method));
                }
                other => {
                    return Err(InternalError::no_mapping(format!("extension member {:?}", other.name())))
                }
            }
        }

        Ok(DartExtensionDeclaration {
            name: Some(name),
            type_parameters: self.type_parameters(&extension.type_parameters),
            on: self.dart_type(&extension.on),
            members,
            annotations: Vec::new(),
            documentation: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeStore;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrModule, IrType, Visibility};
    use crate::translate::test_support::{with_attributes, with_translator};

    fn module_of(b: &mut IrBuilder, declarations: Vec<IrDeclaration>) -> IrModule {
        let mut file = b.file("app/Test.kt", "app");
        file.declarations = declarations;
        let mut module = IrModule::new("test");
        module.add_file(file);
        module
    }

    fn class_of(declarations: &[DartDeclaration]) -> &DartClassDeclaration {
        match declarations.first() {
            Some(DartDeclaration::Class(class)) => class,
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_method_token() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Vec");
        let other = b.value_parameter("other", class.default_type());
        let plus = b
            .function("plus", class.default_type())
            .with_parameter(other)
            .operator()
            .build();
        class.declarations.push(IrDeclaration::Function(plus));
        let module = module_of(&mut b, vec![IrDeclaration::Class(class)]);

        let unit = with_translator(&module, |t| t.translate_file(&module.files[0])).unwrap();
        let DartClassMember::Method(method) = &class_of(&unit.declarations).members[0] else {
            panic!("expected method");
        };
        assert_eq!(method.kind, DartMethodKind::Operator("+"));
    }

    #[test]
    fn test_defaults_are_named_unless_positional() {
        let mut b = IrBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let named = b
            .function("named", IrType::unit())
            .parameter("a", IrType::int())
            .parameter_with_default("b", IrType::int(), one)
            .build();
        let positional = b
            .function("positional", IrType::unit())
            .parameter_with_default("c", IrType::int(), two)
            .annotation(crate::ir::IrAnnotation::new(annotations::DART_POSITIONAL))
            .build();
        let module = module_of(
            &mut b,
            vec![IrDeclaration::Function(named), IrDeclaration::Function(positional)],
        );

        let unit = with_translator(&module, |t| t.translate_file(&module.files[0])).unwrap();
        let kinds: Vec<Vec<DartParameterKind>> = unit
            .declarations
            .iter()
            .map(|d| match d {
                DartDeclaration::Function(f) => f.parameters.parameters.iter().map(|p| p.kind).collect(),
                other => panic!("expected function, got {:?}", other),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                vec![DartParameterKind::Required, DartParameterKind::OptionalNamed],
                vec![DartParameterKind::OptionalPositional],
            ]
        );
    }

    #[test]
    fn test_positional_default_before_required_stays_required() {
        let mut b = IrBuilder::new();
        let five = b.int(5);
        let function = b
            .function("range", IrType::unit())
            .parameter_with_default("start", IrType::int(), five)
            .parameter("end", IrType::int())
            .annotation(crate::ir::IrAnnotation::new(annotations::DART_POSITIONAL))
            .build();
        let module = module_of(&mut b, vec![IrDeclaration::Function(function)]);

        let unit = with_translator(&module, |t| t.translate_file(&module.files[0])).unwrap();
        let DartDeclaration::Function(f) = &unit.declarations[0] else {
            panic!("expected function");
        };
        let params = &f.parameters.parameters;
        assert_eq!(params[0].kind, DartParameterKind::Required);
        assert!(params[0].default_value.is_none());
        assert_eq!(params[1].kind, DartParameterKind::Required);
    }

    #[test]
    fn test_deferred_field_is_late_without_initializer() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Lazy");
        let value = b.int(3);
        let property = b.property("x", IrType::int()).initializer(value).build();
        let mut attributes = AttributeStore::new();
        attributes.set(&property, keys::INITIALIZED_IN_CONSTRUCTOR_BODY, true);
        class.declarations.push(IrDeclaration::Property(property));
        let module = module_of(&mut b, vec![IrDeclaration::Class(class)]);

        let unit = with_attributes(&module, &attributes, |t| t.translate_file(&module.files[0])).unwrap();
        let DartClassMember::Field(field) = &class_of(&unit.declarations).members[0] else {
            panic!("expected field");
        };
        assert!(field.variables.is_late);
        assert_eq!(field.variables.keyword, Some(DartVariableKeyword::Final));
        assert_eq!(field.variables.variables[0].initializer, None);
    }

    #[test]
    fn test_custom_getter_uses_backing_field() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Counter");
        let zero = b.int(0);
        let read = b.int(1);
        let property = b
            .property("count", IrType::int())
            .var()
            .initializer(zero)
            .getter(vec![crate::ir::IrStatement::Return(Some(read))])
            .build();
        class.declarations.push(IrDeclaration::Property(property));
        let module = module_of(&mut b, vec![IrDeclaration::Class(class)]);

        let unit = with_translator(&module, |t| t.translate_file(&module.files[0])).unwrap();
        let members = &class_of(&unit.declarations).members;
        let DartClassMember::Field(field) = &members[0] else {
            panic!("expected backing field, got {:?}", members);
        };
        assert_eq!(field.variables.variables[0].name.value(), "_$count");
        let accessors: Vec<(String, DartMethodKind)> = members[1..]
            .iter()
            .map(|m| match m {
                DartClassMember::Method(m) => (m.name.value(), m.kind),
                other => panic!("expected accessor, got {:?}", other),
            })
            .collect();
        assert_eq!(
            accessors,
            vec![
                ("count".to_string(), DartMethodKind::Getter),
                ("count".to_string(), DartMethodKind::Setter),
            ]
        );
    }

    #[test]
    fn test_nested_class_hoisted_after_outer() {
        let mut b = IrBuilder::new();
        let mut outer = b.class("app.Outer");
        let mut inner = b.class("app.Outer.Inner");
        inner.visibility = Visibility::Private;
        outer.declarations.push(IrDeclaration::Class(inner));
        let module = module_of(&mut b, vec![IrDeclaration::Class(outer)]);

        let unit = with_translator(&module, |t| t.translate_file(&module.files[0])).unwrap();
        let names: Vec<String> = unit
            .declarations
            .iter()
            .map(|d| match d {
                DartDeclaration::Class(c) => c.name.value(),
                other => panic!("expected class, got {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["Outer", "_Inner"]);
    }

    #[test]
    fn test_top_level_constructor_has_no_mapping() {
        let mut b = IrBuilder::new();
        let class = b.class("app.Orphan");
        let constructor = b.constructor(class.id).build();
        let module = module_of(&mut b, vec![IrDeclaration::Constructor(constructor)]);

        let result = with_translator(&module, |t| t.translate_file(&module.files[0]));
        assert!(matches!(result, Err(InternalError::NoMapping { .. })));
    }
}
