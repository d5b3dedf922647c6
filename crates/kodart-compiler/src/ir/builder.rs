//! IR construction helpers
//!
//! Used by lowerings to synthesize nodes with fresh identities, and by tests
//! to write IR programs compactly.

use super::decl::*;
use super::expr::*;
use super::module::IrFile;
use super::types::IrType;
use super::{IdGen, NodeId};

/// Allocates ids and builds IR nodes.
#[derive(Debug, Default)]
pub struct IrBuilder {
    ids: IdGen,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder continuing an existing id sequence.
    pub fn with_ids(ids: IdGen) -> Self {
        Self { ids }
    }

    pub fn fresh(&mut self) -> NodeId {
        self.ids.fresh()
    }

    /// The id the next call to [`fresh`](Self::fresh) returns.
    pub fn peek_next(&self) -> NodeId {
        self.ids.clone().fresh()
    }

    pub fn into_ids(self) -> IdGen {
        self.ids
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub fn file(&mut self, path: &str, package: &str) -> IrFile {
        IrFile::new(self.fresh(), path, package)
    }

    /// A final public class named after the last segment of `fq_name`.
    pub fn class(&mut self, fq_name: &str) -> IrClass {
        IrClass {
            id: self.fresh(),
            original: None,
            name: fq_name.rsplit('.').next().unwrap_or(fq_name).to_string(),
            fq_name: fq_name.to_string(),
            kind: ClassKind::Class,
            modality: Modality::Final,
            visibility: Visibility::Public,
            is_external: false,
            is_data: false,
            element: None,
            type_parameters: Vec::new(),
            enum_entries: Vec::new(),
            super_types: Vec::new(),
            declarations: Vec::new(),
            annotations: Vec::new(),
            documentation: None,
            origin: DeclOrigin::Source,
        }
    }

    pub fn interface(&mut self, fq_name: &str) -> IrClass {
        let mut class = self.class(fq_name);
        class.kind = ClassKind::Interface;
        class.modality = Modality::Abstract;
        class
    }

    pub fn type_parameter(&mut self, name: &str) -> IrTypeParameter {
        IrTypeParameter {
            id: self.fresh(),
            name: name.to_string(),
            bounds: Vec::new(),
        }
    }

    pub fn value_parameter(&mut self, name: &str, ty: IrType) -> IrValueParameter {
        IrValueParameter {
            id: self.fresh(),
            original: None,
            name: name.to_string(),
            ty,
            default_value: None,
            is_vararg: false,
            corresponding_property: None,
            annotations: Vec::new(),
            element: None,
        }
    }

    pub fn function(&mut self, name: &str, return_type: IrType) -> FunctionBuilder<'_> {
        let function = IrFunction {
            id: self.fresh(),
            original: None,
            name: name.to_string(),
            visibility: Visibility::Public,
            modality: Modality::Final,
            is_external: false,
            is_static: false,
            is_operator: false,
            is_override: false,
            is_inline: false,
            element: None,
            type_parameters: Vec::new(),
            extension_receiver: None,
            parameters: Vec::new(),
            return_type,
            body: Some(IrBody::default()),
            annotations: Vec::new(),
            documentation: None,
            origin: DeclOrigin::Source,
        };
        FunctionBuilder { b: self, function }
    }

    pub fn constructor(&mut self, class: NodeId) -> ConstructorBuilder<'_> {
        let constructor = IrConstructor {
            id: self.fresh(),
            original: None,
            class,
            is_primary: false,
            visibility: Visibility::Public,
            is_const: false,
            is_external: false,
            element: None,
            parameters: Vec::new(),
            delegation: Some(IrDelegation {
                kind: DelegationKind::Super,
                constructor: None,
                arguments: Vec::new(),
            }),
            initializer_list: Vec::new(),
            body: IrBody::default(),
            annotations: Vec::new(),
            documentation: None,
            dart_name: None,
        };
        ConstructorBuilder { b: self, constructor }
    }

    pub fn property(&mut self, name: &str, ty: IrType) -> PropertyBuilder<'_> {
        let property = IrProperty {
            id: self.fresh(),
            original: None,
            name: name.to_string(),
            ty,
            visibility: Visibility::Public,
            modality: Modality::Final,
            is_var: false,
            is_const: false,
            is_lateinit: false,
            is_external: false,
            is_override: false,
            element: None,
            backing_field: None,
            getter: None,
            setter: None,
            annotations: Vec::new(),
            documentation: None,
        };
        PropertyBuilder {
            b: self,
            property,
            has_field: true,
            is_static: false,
            initializer: None,
        }
    }

    /// Default accessor of a property; the translator supplies its body.
    fn default_accessor(&mut self, property: &IrProperty, setter: bool) -> IrFunction {
        let (name, return_type, parameters) = if setter {
            let value = self.value_parameter("value", property.ty.clone());
            (format!("<set-{}>", property.name), IrType::unit(), vec![value])
        } else {
            (format!("<get-{}>", property.name), property.ty.clone(), Vec::new())
        };
        let mut accessor = self.function(&name, return_type).build();
        accessor.parameters = parameters;
        accessor.visibility = property.visibility;
        accessor.body = None;
        accessor.origin = DeclOrigin::DefaultAccessor;
        accessor
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn expr(&mut self, ty: IrType, kind: IrExprKind) -> IrExpr {
        IrExpr::new(self.fresh(), ty, kind)
    }

    pub fn int(&mut self, value: i64) -> IrExpr {
        self.expr(IrType::int(), IrExprKind::Const(IrConst::Int(value)))
    }

    pub fn double(&mut self, value: f64) -> IrExpr {
        self.expr(IrType::double(), IrExprKind::Const(IrConst::Double(value)))
    }

    pub fn string(&mut self, value: &str) -> IrExpr {
        self.expr(IrType::string(), IrExprKind::Const(IrConst::String(value.to_string())))
    }

    pub fn boolean(&mut self, value: bool) -> IrExpr {
        self.expr(IrType::boolean(), IrExprKind::Const(IrConst::Boolean(value)))
    }

    pub fn null(&mut self, ty: IrType) -> IrExpr {
        self.expr(ty.make_nullable(), IrExprKind::Const(IrConst::Null))
    }

    pub fn unit(&mut self) -> IrExpr {
        self.expr(IrType::unit(), IrExprKind::Unit)
    }

    pub fn get_value(&mut self, target: NodeId, ty: IrType) -> IrExpr {
        self.expr(ty, IrExprKind::GetValue { target })
    }

    pub fn get_param(&mut self, param: &IrValueParameter) -> IrExpr {
        self.get_value(param.id, param.ty.clone())
    }

    pub fn get_variable(&mut self, variable: &IrVariable) -> IrExpr {
        self.get_value(variable.id, variable.ty.clone())
    }

    pub fn set_value(&mut self, target: NodeId, value: IrExpr) -> IrExpr {
        self.expr(
            IrType::unit(),
            IrExprKind::SetValue {
                target,
                value: Box::new(value),
            },
        )
    }

    pub fn this(&mut self, class: &IrClass) -> IrExpr {
        let ty = class.default_type();
        self.expr(ty, IrExprKind::This { class: class.id })
    }

    pub fn this_of(&mut self, class: NodeId, ty: IrType) -> IrExpr {
        self.expr(ty, IrExprKind::This { class })
    }

    pub fn get_property(&mut self, property: NodeId, ty: IrType, receiver: Option<IrExpr>) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::GetProperty {
                property,
                receiver: receiver.map(Box::new),
                null_aware: false,
            },
        )
    }

    pub fn set_property(&mut self, property: NodeId, receiver: Option<IrExpr>, value: IrExpr) -> IrExpr {
        self.expr(
            IrType::unit(),
            IrExprKind::SetProperty {
                property,
                receiver: receiver.map(Box::new),
                value: Box::new(value),
                null_aware: false,
            },
        )
    }

    pub fn get_field(&mut self, field: NodeId, ty: IrType, receiver: Option<IrExpr>) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::GetField {
                field,
                receiver: receiver.map(Box::new),
            },
        )
    }

    pub fn set_field(&mut self, field: NodeId, receiver: Option<IrExpr>, value: IrExpr) -> IrExpr {
        self.expr(
            IrType::unit(),
            IrExprKind::SetField {
                field,
                receiver: receiver.map(Box::new),
                value: Box::new(value),
            },
        )
    }

    /// Call of a declared function.
    pub fn call(&mut self, function: NodeId, return_type: IrType, arguments: Vec<IrExpr>) -> IrExpr {
        let mut call = IrCall::new(Callee::Function(function));
        call.arguments = arguments.into_iter().map(Some).collect();
        self.expr(return_type, IrExprKind::Call(call))
    }

    /// Method call on `receiver`.
    pub fn method_call(
        &mut self,
        function: NodeId,
        return_type: IrType,
        receiver: IrExpr,
        arguments: Vec<IrExpr>,
    ) -> IrExpr {
        let mut call = IrCall::new(Callee::Function(function));
        call.dispatch_receiver = Some(Box::new(receiver));
        call.arguments = arguments.into_iter().map(Some).collect();
        self.expr(return_type, IrExprKind::Call(call))
    }

    /// Call of a builtin, e.g. `kotlin.Int.plus` with `receiver` as `this`.
    pub fn builtin_call(
        &mut self,
        name: &str,
        return_type: IrType,
        receiver: Option<IrExpr>,
        arguments: Vec<IrExpr>,
        origin: Option<CallOrigin>,
    ) -> IrExpr {
        let mut call = IrCall::new(Callee::Builtin(name.to_string()));
        call.dispatch_receiver = receiver.map(Box::new);
        call.arguments = arguments.into_iter().map(Some).collect();
        call.origin = origin;
        self.expr(return_type, IrExprKind::Call(call))
    }

    pub fn constructor_call(&mut self, constructor: NodeId, ty: IrType, arguments: Vec<Option<IrExpr>>) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::ConstructorCall(IrConstructorCall {
                constructor,
                arguments,
                type_arguments: Vec::new(),
                const_annotated: false,
            }),
        )
    }

    pub fn binary(&mut self, op: IrBinaryOp, ty: IrType, left: IrExpr, right: IrExpr) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    pub fn unary(&mut self, op: IrUnaryOp, ty: IrType, operand: IrExpr) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    /// `left == right` through the builtin equality intrinsic.
    pub fn eqeq(&mut self, left: IrExpr, right: IrExpr) -> IrExpr {
        self.builtin_call(
            "kotlin.internal.ir.EQEQ",
            IrType::boolean(),
            None,
            vec![left, right],
            Some(CallOrigin::EqEq),
        )
    }

    pub fn conditional(&mut self, ty: IrType, condition: IrExpr, then_branch: IrExpr, else_branch: IrExpr) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        )
    }

    pub fn when(&mut self, ty: IrType, origin: Option<WhenOrigin>, branches: Vec<IrBranch>) -> IrExpr {
        self.expr(ty, IrExprKind::When(IrWhen { branches, origin }))
    }

    pub fn block(&mut self, ty: IrType, origin: Option<BlockOrigin>, statements: Vec<IrStatement>) -> IrExpr {
        self.expr(ty, IrExprKind::Block(IrBlock { statements, origin }))
    }

    pub fn type_op(&mut self, operator: TypeOperator, ty: IrType, operand: IrExpr, argument: IrType) -> IrExpr {
        self.expr(
            ty,
            IrExprKind::TypeOp {
                operator,
                operand: Box::new(operand),
                argument,
            },
        )
    }

    pub fn string_concat(&mut self, parts: Vec<IrExpr>) -> IrExpr {
        self.expr(IrType::string(), IrExprKind::StringConcat(parts))
    }

    pub fn throw(&mut self, value: IrExpr) -> IrExpr {
        self.expr(IrType::nothing(), IrExprKind::Throw(Box::new(value)))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn variable(&mut self, name: &str, ty: IrType, initializer: Option<IrExpr>) -> IrVariable {
        IrVariable {
            id: self.fresh(),
            name: name.to_string(),
            ty,
            initializer,
            is_var: false,
            is_const: false,
            origin: None,
        }
    }

    /// A `val tmp = value` temporary.
    pub fn temporary(&mut self, value: IrExpr) -> IrVariable {
        let ty = value.ty.clone();
        let mut variable = self.variable("tmp", ty, Some(value));
        variable.origin = Some(VariableOrigin::Temporary);
        variable
    }
}

// ============================================================================
// Declaration builders
// ============================================================================

pub struct FunctionBuilder<'a> {
    b: &'a mut IrBuilder,
    function: IrFunction,
}

impl FunctionBuilder<'_> {
    pub fn parameter(mut self, name: &str, ty: IrType) -> Self {
        let param = self.b.value_parameter(name, ty);
        self.function.parameters.push(param);
        self
    }

    pub fn parameter_with_default(mut self, name: &str, ty: IrType, default: IrExpr) -> Self {
        let mut param = self.b.value_parameter(name, ty);
        param.default_value = Some(default);
        self.function.parameters.push(param);
        self
    }

    pub fn with_parameter(mut self, param: IrValueParameter) -> Self {
        self.function.parameters.push(param);
        self
    }

    pub fn extension_receiver(mut self, ty: IrType) -> Self {
        let receiver = self.b.value_parameter("<this>", ty);
        self.function.extension_receiver = Some(receiver);
        self
    }

    pub fn with_extension_receiver(mut self, receiver: IrValueParameter) -> Self {
        self.function.extension_receiver = Some(receiver);
        self
    }

    pub fn type_parameter(mut self, name: &str) -> Self {
        let tp = self.b.type_parameter(name);
        self.function.type_parameters.push(tp);
        self
    }

    pub fn body(mut self, statements: Vec<IrStatement>) -> Self {
        self.function.body = Some(IrBody::new(statements));
        self
    }

    /// No body: abstract, or implemented elsewhere.
    pub fn abstract_(mut self) -> Self {
        self.function.body = None;
        self.function.modality = Modality::Abstract;
        self
    }

    pub fn modality(mut self, modality: Modality) -> Self {
        self.function.modality = modality;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.function.visibility = visibility;
        self
    }

    pub fn external(mut self) -> Self {
        self.function.is_external = true;
        self.function.body = None;
        self
    }

    pub fn operator(mut self) -> Self {
        self.function.is_operator = true;
        self
    }

    pub fn inline(mut self) -> Self {
        self.function.is_inline = true;
        self
    }

    pub fn override_(mut self) -> Self {
        self.function.is_override = true;
        self
    }

    pub fn annotation(mut self, annotation: IrAnnotation) -> Self {
        self.function.annotations.push(annotation);
        self
    }

    pub fn documentation(mut self, doc: &str) -> Self {
        self.function.documentation = Some(doc.to_string());
        self
    }

    pub fn build(self) -> IrFunction {
        self.function
    }
}

pub struct ConstructorBuilder<'a> {
    b: &'a mut IrBuilder,
    constructor: IrConstructor,
}

impl ConstructorBuilder<'_> {
    pub fn primary(mut self) -> Self {
        self.constructor.is_primary = true;
        self
    }

    pub fn const_(mut self) -> Self {
        self.constructor.is_const = true;
        self
    }

    pub fn external(mut self) -> Self {
        self.constructor.is_external = true;
        self
    }

    pub fn parameter(mut self, name: &str, ty: IrType) -> Self {
        let param = self.b.value_parameter(name, ty);
        self.constructor.parameters.push(param);
        self
    }

    pub fn with_parameter(mut self, param: IrValueParameter) -> Self {
        self.constructor.parameters.push(param);
        self
    }

    /// Delegate to `constructor` of the superclass.
    pub fn super_call(mut self, constructor: NodeId, arguments: Vec<Option<IrExpr>>) -> Self {
        self.constructor.delegation = Some(IrDelegation {
            kind: DelegationKind::Super,
            constructor: Some(constructor),
            arguments,
        });
        self
    }

    /// Delegate to another constructor of the same class.
    pub fn this_call(mut self, constructor: NodeId, arguments: Vec<Option<IrExpr>>) -> Self {
        self.constructor.delegation = Some(IrDelegation {
            kind: DelegationKind::This,
            constructor: Some(constructor),
            arguments,
        });
        self
    }

    pub fn body(mut self, statements: Vec<IrStatement>) -> Self {
        self.constructor.body = IrBody::new(statements);
        self
    }

    pub fn annotation(mut self, annotation: IrAnnotation) -> Self {
        self.constructor.annotations.push(annotation);
        self
    }

    pub fn build(self) -> IrConstructor {
        self.constructor
    }
}

pub struct PropertyBuilder<'a> {
    b: &'a mut IrBuilder,
    property: IrProperty,
    has_field: bool,
    is_static: bool,
    initializer: Option<IrExpr>,
}

impl PropertyBuilder<'_> {
    /// Take over an id allocated earlier, e.g. the declaration it replaces.
    pub fn id(mut self, id: NodeId) -> Self {
        self.property.id = id;
        self
    }

    /// Stored in a static field.
    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn var(mut self) -> Self {
        self.property.is_var = true;
        self
    }

    pub fn const_(mut self) -> Self {
        self.property.is_const = true;
        self
    }

    pub fn lateinit(mut self) -> Self {
        self.property.is_lateinit = true;
        self.property.is_var = true;
        self
    }

    pub fn external(mut self) -> Self {
        self.property.is_external = true;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.property.visibility = visibility;
        self
    }

    pub fn modality(mut self, modality: Modality) -> Self {
        self.property.modality = modality;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.property.modality = Modality::Abstract;
        self.has_field = false;
        self
    }

    pub fn override_(mut self) -> Self {
        self.property.is_override = true;
        self
    }

    /// No backing field (computed property).
    pub fn without_field(mut self) -> Self {
        self.has_field = false;
        self
    }

    pub fn initializer(mut self, value: IrExpr) -> Self {
        self.initializer = Some(value);
        self
    }

    /// Property declared by a primary constructor parameter.
    pub fn declared_by(mut self, param: &mut IrValueParameter) -> Self {
        param.corresponding_property = Some(self.property.id);
        let value = self.b.get_param(param);
        self.initializer = Some(value);
        self
    }

    pub fn getter(mut self, statements: Vec<IrStatement>) -> Self {
        let name = format!("<get-{}>", self.property.name);
        let getter = self.b.function(&name, self.property.ty.clone()).body(statements).build();
        self.property.getter = Some(getter);
        self
    }

    pub fn setter(mut self, value: IrValueParameter, statements: Vec<IrStatement>) -> Self {
        let name = format!("<set-{}>", self.property.name);
        let setter = self
            .b
            .function(&name, IrType::unit())
            .with_parameter(value)
            .body(statements)
            .build();
        self.property.is_var = true;
        self.property.setter = Some(setter);
        self
    }

    pub fn annotation(mut self, annotation: IrAnnotation) -> Self {
        self.property.annotations.push(annotation);
        self
    }

    pub fn documentation(mut self, doc: &str) -> Self {
        self.property.documentation = Some(doc.to_string());
        self
    }

    /// Id the backing field will get.
    pub fn field_id(&self) -> Option<NodeId> {
        self.property.backing_field.as_ref().map(|f| f.id)
    }

    pub fn build(mut self) -> IrProperty {
        if self.has_field {
            let field = IrField {
                id: self.b.fresh(),
                original: None,
                name: self.property.name.clone(),
                ty: self.property.ty.clone(),
                initializer: self.initializer.take(),
                is_final: !self.property.is_var,
                is_static: self.is_static,
                visibility: Visibility::Private,
                property: Some(self.property.id),
            };
            self.property.backing_field = Some(field);
        }
        if self.property.getter.is_none() {
            let getter = self.b.default_accessor(&self.property, false);
            self.property.getter = Some(getter);
        }
        if self.property.is_var && self.property.setter.is_none() {
            let setter = self.b.default_accessor(&self.property, true);
            self.property.setter = Some(setter);
        }
        self.property
    }
}
