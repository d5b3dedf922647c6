//! Expressions
//!
//! By the time an expression gets here every composite form has been
//! lowered away: `when` and blocks in value position are an internal error.

use super::names::accessor_property_name;
use super::{Translation, Translator};
use crate::attributes::keys;
use crate::dart::{
    DartArgumentList, DartBinaryOperator, DartExpression, DartInterpolationElement, DartLiteral, DartPrefixOperator,
    DartSimpleIdentifier, DartTypeAnnotation, DartUnaryOperator,
};
use crate::error::InternalError;
use crate::ir::{
    annotations, Callee, DeclInfo, DeclKind, IrCall, IrConst, IrConstructorCall, IrExpr, IrExprKind, NodeId,
    TypeOperator,
};
use crate::lower::expressions::intrinsics;

const PRINT: &str = "print";

impl Translator<'_> {
    fn boxed(&mut self, expr: &IrExpr) -> Translation<Box<DartExpression>> {
        self.translate_expr(expr).map(Box::new)
    }

    pub(super) fn translate_expr(&mut self, expr: &IrExpr) -> Translation<DartExpression> {
        Ok(match &expr.kind {
            IrExprKind::Const(value) => DartExpression::Literal(literal(value)),
            IrExprKind::GetValue { target } => DartExpression::identifier(self.local_name(self.info(*target)?)),
            IrExprKind::SetValue { target, value } => DartExpression::Assignment {
                target: Box::new(DartExpression::identifier(self.local_name(self.info(*target)?))),
                value: self.boxed(value)?,
            },
            IrExprKind::This { .. } => DartExpression::This,
            IrExprKind::GetObject { .. } | IrExprKind::GetEnumEntry { .. } => {
                return Err(InternalError::no_mapping("object or enum entry reference"))
            }
            IrExprKind::GetProperty {
                property,
                receiver,
                null_aware,
            } => {
                let info = self.info(*property)?;
                let name = self.member_name(info);
                let receiver = self.translate_member_receiver(receiver.as_deref(), *property)?;
                member_access(receiver, name, *null_aware)
            }
            IrExprKind::SetProperty {
                property,
                receiver,
                value,
                null_aware,
            } => {
                let name = self.member_name(self.info(*property)?);
                let receiver = self.translate_member_receiver(receiver.as_deref(), *property)?;
                DartExpression::Assignment {
                    target: Box::new(member_access(receiver, name, *null_aware)),
                    value: self.boxed(value)?,
                }
            }
            IrExprKind::GetField { field, receiver } => {
                let name = self.field_storage_name(self.info(*field)?);
                let receiver = self.translate_member_receiver(receiver.as_deref(), *field)?;
                member_access(receiver, name, false)
            }
            IrExprKind::SetField { field, receiver, value } => {
                let name = self.field_storage_name(self.info(*field)?);
                let receiver = self.translate_member_receiver(receiver.as_deref(), *field)?;
                DartExpression::Assignment {
                    target: Box::new(member_access(receiver, name, false)),
                    value: self.boxed(value)?,
                }
            }
            IrExprKind::Call(call) => self.translate_call(call)?,
            IrExprKind::ConstructorCall(call) => self.translate_constructor_call(expr, call)?,
            IrExprKind::TypeOp {
                operator,
                operand,
                argument,
            } => self.translate_type_op(*operator, operand, argument)?,
            IrExprKind::When(_) => return Err(InternalError::no_mapping("when in expression position")),
            IrExprKind::Block(_) => return Err(InternalError::no_mapping("block in expression position")),
            IrExprKind::StringConcat(parts) => {
                let mut elements = Vec::with_capacity(parts.len());
                for part in parts {
                    elements.push(match &part.kind {
                        IrExprKind::Const(IrConst::String(text)) => DartInterpolationElement::Text(text.clone()),
                        IrExprKind::Const(IrConst::Char(c)) => DartInterpolationElement::Text(c.to_string()),
                        _ => DartInterpolationElement::Expression(self.translate_expr(part)?),
                    });
                }
                DartExpression::StringInterpolation(elements)
            }
            IrExprKind::Lambda(function) => DartExpression::FunctionExpression {
                parameters: self.function_parameters(function)?,
                body: self.function_body(function.body.as_ref())?,
            },
            IrExprKind::Throw(value) => DartExpression::Throw(self.boxed(value)?),
            IrExprKind::Unit => DartExpression::null(),
            IrExprKind::Binary { op, left, right } => DartExpression::Binary {
                operator: (*op).into(),
                left: self.boxed(left)?,
                right: self.boxed(right)?,
            },
            IrExprKind::Unary { op, operand } => {
                let operand = self.boxed(operand)?;
                match DartUnaryOperator::from(*op) {
                    DartUnaryOperator::Prefix(operator) => DartExpression::Prefix { operator, operand },
                    DartUnaryOperator::Postfix(operator) => DartExpression::Postfix { operator, operand },
                }
            }
            IrExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => DartExpression::Conditional {
                condition: self.boxed(condition)?,
                then_expression: self.boxed(then_branch)?,
                else_expression: self.boxed(else_branch)?,
            },
            IrExprKind::Index { receiver, index } => DartExpression::Index {
                target: self.boxed(receiver)?,
                index: self.boxed(index)?,
            },
            IrExprKind::IndexSet { receiver, index, value } => DartExpression::Assignment {
                target: Box::new(DartExpression::Index {
                    target: self.boxed(receiver)?,
                    index: self.boxed(index)?,
                }),
                value: self.boxed(value)?,
            },
        })
    }

    fn translate_receiver(&mut self, receiver: Option<&IrExpr>) -> Translation<Option<DartExpression>> {
        receiver.map(|r| self.translate_expr(r)).transpose()
    }

    /// The receiver of a property or field access; the class for a static
    /// member accessed without one.
    fn translate_member_receiver(
        &mut self,
        receiver: Option<&IrExpr>,
        member: NodeId,
    ) -> Translation<Option<DartExpression>> {
        match receiver {
            Some(receiver) => self.translate_expr(receiver).map(Some),
            None => Ok(self.static_target(self.info(member)?)),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn translate_call(&mut self, call: &IrCall) -> Translation<DartExpression> {
        let receiver = if call.is_super {
            Some(DartExpression::Super)
        } else {
            self.translate_receiver(call.extension_receiver.as_deref().or(call.dispatch_receiver.as_deref()))?
        };
        let id = match &call.callee {
            Callee::Builtin(name) => return self.translate_builtin_call(name, receiver, call),
            Callee::Function(id) => *id,
        };

        let info = self.info(id)?;
        if let Some(property) = accessor_property_name(&info.name) {
            let name = match info.parent.and_then(|p| self.index.get(p)) {
                Some(parent) if parent.kind == DeclKind::Property => self.member_name(parent),
                _ => DartSimpleIdentifier::new(property),
            };
            let access = member_access(receiver, name, call.null_aware);
            return self.accessor_call(&info.name, access, call);
        }
        if info.is_operator {
            if let Some(operator) = self.operator_call(info, receiver.clone(), call)? {
                return Ok(operator);
            }
        }

        let target = match receiver {
            Some(receiver) => Some(receiver),
            None => self.static_target(info),
        };
        Ok(DartExpression::MethodInvocation {
            target: target.map(Box::new),
            name: self.member_name(info),
            type_arguments: call.type_arguments.iter().map(|t| self.dart_type(t)).collect(),
            arguments: self.argument_list(id, &call.arguments)?,
            null_aware: call.null_aware,
        })
    }

    /// `<get-x>` reads `x`; `<set-x>` assigns its argument to it.
    fn accessor_call(&mut self, accessor: &str, access: DartExpression, call: &IrCall) -> Translation<DartExpression> {
        if !accessor.starts_with("<set-") {
            return Ok(access);
        }
        let value = call
            .present_arguments()
            .next()
            .ok_or_else(|| InternalError::no_mapping(format!("{} without a value", accessor)))?;
        Ok(DartExpression::Assignment {
            target: Box::new(access),
            value: self.boxed(value)?,
        })
    }

    /// Explicit calls of declared operators, `a.plus(b)`, use the operator
    /// syntax: the target method is named by its token.
    fn operator_call(
        &mut self,
        info: &DeclInfo,
        receiver: Option<DartExpression>,
        call: &IrCall,
    ) -> Translation<Option<DartExpression>> {
        let Some(receiver) = receiver.map(Box::new) else {
            return Ok(None);
        };
        let mut arguments = Vec::new();
        for arg in call.present_arguments() {
            arguments.push(self.translate_expr(arg)?);
        }
        let mut arguments = arguments.into_iter();
        let mut next = || arguments.next().map(Box::new);
        let operator = match info.name.as_str() {
            "unaryMinus" => {
                return Ok(Some(DartExpression::Prefix {
                    operator: DartPrefixOperator::Negate,
                    operand: receiver,
                }))
            }
            "inv" => {
                return Ok(Some(DartExpression::Prefix {
                    operator: DartPrefixOperator::BitwiseNot,
                    operand: receiver,
                }))
            }
            "get" => {
                return Ok(next().map(|index| DartExpression::Index { target: receiver, index }));
            }
            "set" => {
                let (Some(index), Some(value)) = (next(), next()) else {
                    return Ok(None);
                };
                return Ok(Some(DartExpression::Assignment {
                    target: Box::new(DartExpression::Index { target: receiver, index }),
                    value,
                }));
            }
            "plus" => DartBinaryOperator::Add,
            "minus" => DartBinaryOperator::Subtract,
            "times" => DartBinaryOperator::Multiply,
            "div" => DartBinaryOperator::Divide,
            "rem" => DartBinaryOperator::Modulo,
            "equals" => DartBinaryOperator::Equals,
            "and" => DartBinaryOperator::BitwiseAnd,
            "or" => DartBinaryOperator::BitwiseOr,
            "xor" => DartBinaryOperator::BitwiseXor,
            "shl" => DartBinaryOperator::ShiftLeft,
            "shr" => DartBinaryOperator::ShiftRight,
            "ushr" => DartBinaryOperator::UnsignedShiftRight,
            _ => return Ok(None),
        };
        Ok(next().map(|right| DartExpression::Binary {
            operator,
            left: receiver,
            right,
        }))
    }

    /// `Class.member` for static members called without a receiver.
    fn static_target(&self, info: &DeclInfo) -> Option<DartExpression> {
        if !info.is_static {
            return None;
        }
        let class = info.parent.and_then(|p| self.index.get(p)).filter(|p| p.is_class_like())?;
        Some(DartExpression::identifier(self.member_name(class)))
    }

    fn translate_builtin_call(
        &mut self,
        name: &str,
        receiver: Option<DartExpression>,
        call: &IrCall,
    ) -> Translation<DartExpression> {
        let mut arguments = Vec::with_capacity(call.arguments.len());
        for arg in call.present_arguments() {
            arguments.push(self.translate_expr(arg)?);
        }

        if name == intrinsics::INVOKE || name.ends_with(".invoke") {
            let function = receiver.ok_or_else(|| InternalError::no_mapping("function call without a function"))?;
            return Ok(DartExpression::FunctionInvocation {
                function: Box::new(function),
                arguments: DartArgumentList::positional(arguments),
            });
        }

        let member = name.rsplit_once('.').map_or(name, |(_, member)| member);
        match (name, receiver) {
            ("kotlin.Any.equals", Some(left)) if arguments.len() == 1 => Ok(DartExpression::Binary {
                operator: DartBinaryOperator::Equals,
                left: Box::new(left),
                right: Box::new(arguments.remove(0)),
            }),
            ("kotlin.Any.hashCode", Some(target)) => Ok(member_access(Some(target), "hashCode".into(), false)),
            (_, receiver) if member.starts_with("<get-") || member.starts_with("<set-") => {
                let property = accessor_property_name(member).unwrap_or(member);
                let access = member_access(receiver, DartSimpleIdentifier::new(property), call.null_aware);
                if member.starts_with("<get-") {
                    return Ok(access);
                }
                let value = arguments
                    .pop()
                    .ok_or_else(|| InternalError::no_mapping(format!("{} without a value", name)))?;
                Ok(DartExpression::Assignment {
                    target: Box::new(access),
                    value: Box::new(value),
                })
            }
            (_, None) if member == "println" => Ok(DartExpression::MethodInvocation {
                target: None,
                name: PRINT.into(),
                type_arguments: Vec::new(),
                arguments: DartArgumentList::positional(arguments),
                null_aware: false,
            }),
            (_, receiver) => Ok(DartExpression::MethodInvocation {
                target: receiver.map(Box::new),
                name: DartSimpleIdentifier::new(member),
                type_arguments: call.type_arguments.iter().map(|t| self.dart_type(t)).collect(),
                arguments: DartArgumentList::positional(arguments),
                null_aware: call.null_aware,
            }),
        }
    }

    /// Arguments of a call to a declared function or constructor.
    ///
    /// A parameter is passed by name when its target declaration makes it
    /// named: per the element for target library callees, and for defaulted
    /// parameters without `@DartPositional` otherwise. A skipped positional
    /// argument followed by a passed one is filled with its default.
    pub(super) fn argument_list(
        &mut self,
        callee: NodeId,
        arguments: &[Option<IrExpr>],
    ) -> Translation<DartArgumentList> {
        let callee_info = self.info(callee)?;
        let element_parameters = match &callee_info.element {
            Some(location) if self.is_dependency(callee_info) => {
                self.elements.lookup(location).ok().map(|e| e.parameters())
            }
            _ => None,
        };
        let positional_callee = callee_info.has_annotation(annotations::DART_POSITIONAL);
        let parameters: Vec<&DeclInfo> = self.index.parameters(callee).collect();

        let mut list = DartArgumentList::default();
        let mut skipped = Vec::new();
        for (i, argument) in arguments.iter().enumerate() {
            let parameter = parameters.get(i).copied();
            let named = match (element_parameters, parameter) {
                (Some(elements), Some(p)) => elements
                    .iter()
                    .find(|e| e.name == p.name)
                    .or_else(|| elements.get(i))
                    .is_some_and(|e| e.is_named),
                (None, Some(p)) => {
                    p.has_default && !positional_callee && !p.has_annotation(annotations::DART_POSITIONAL)
                }
                (_, None) => false,
            };
            match (argument, parameter) {
                (Some(value), Some(p)) if named => {
                    let value = self.translate_expr(value)?;
                    list.named.push((DartSimpleIdentifier::new(p.name.as_str()), value));
                }
                (Some(value), _) => {
                    let value = self.translate_expr(value)?;
                    list.positional.append(&mut skipped);
                    list.positional.push(value);
                }
                (None, Some(p)) if !named => {
                    let filler = self.default_argument(p.id)?;
                    skipped.push(filler);
                }
                (None, _) => {}
            }
        }
        Ok(list)
    }

    fn default_argument(&mut self, parameter: NodeId) -> Translation<DartExpression> {
        match self.defaults.get(&parameter).cloned() {
            Some(value) => self.in_const_context(true, |t| t.translate_expr(&value)),
            None => Ok(DartExpression::null()),
        }
    }

    fn translate_constructor_call(&mut self, expr: &IrExpr, call: &IrConstructorCall) -> Translation<DartExpression> {
        let info = self.info(call.constructor)?;
        let class = match info.parent {
            Some(parent) => self.info(parent)?,
            None => return Err(InternalError::no_mapping("constructor outside a class")),
        };
        let class_name = match &class.fq_name {
            Some(fq_name) => self.class_type_name(fq_name, Some(class.id)),
            None => self.member_name(class).value(),
        };
        let ty = DartTypeAnnotation::Named {
            name: class_name,
            type_arguments: call.type_arguments.iter().map(|t| self.dart_type(t)).collect(),
            nullable: false,
        };
        let const_call = self.attributes.flag(expr, keys::DART_CONST_CALL);
        let is_const = const_call && !self.is_const_context();
        let arguments = self.in_const_context(const_call, |t| t.argument_list(call.constructor, &call.arguments))?;
        Ok(DartExpression::InstanceCreation {
            is_const,
            ty,
            constructor_name: self.constructor_name(info),
            arguments,
        })
    }

    fn translate_type_op(
        &mut self,
        operator: TypeOperator,
        operand: &IrExpr,
        argument: &crate::ir::IrType,
    ) -> Translation<DartExpression> {
        let ty = self.dart_type(argument);
        Ok(match operator {
            TypeOperator::Cast => DartExpression::As {
                expression: self.boxed(operand)?,
                ty,
            },
            TypeOperator::SafeCast => {
                let value = self.boxed(operand)?;
                let checked = ty.clone().with_nullable(false);
                DartExpression::Conditional {
                    condition: Box::new(DartExpression::Is {
                        expression: value.clone(),
                        ty: checked.clone(),
                        negated: false,
                    }),
                    then_expression: Box::new(DartExpression::As {
                        expression: value,
                        ty: checked,
                    }),
                    else_expression: Box::new(DartExpression::null()),
                }
            }
            TypeOperator::InstanceOf | TypeOperator::NotInstanceOf => DartExpression::Is {
                expression: self.boxed(operand)?,
                ty,
                negated: operator == TypeOperator::NotInstanceOf,
            },
            TypeOperator::ImplicitCast | TypeOperator::ImplicitCoercionToUnit => self.translate_expr(operand)?,
        })
    }
}

fn literal(value: &IrConst) -> DartLiteral {
    match value {
        IrConst::Null => DartLiteral::Null,
        IrConst::Boolean(b) => DartLiteral::Bool(*b),
        IrConst::Int(i) => DartLiteral::Int(*i),
        IrConst::Double(d) => DartLiteral::Double(*d),
        IrConst::String(s) => DartLiteral::String(s.clone()),
        IrConst::Char(c) => DartLiteral::String(c.to_string()),
    }
}

/// `target.name`, or the bare `name` without a target.
fn member_access(target: Option<DartExpression>, name: DartSimpleIdentifier, null_aware: bool) -> DartExpression {
    match target {
        Some(target) => DartExpression::PropertyAccess {
            target: Box::new(target),
            name,
            null_aware,
        },
        None => DartExpression::identifier(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeStore;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrBinaryOp, IrCall, IrDeclaration, IrModule, IrStatement, IrType};
    use crate::translate::test_support::{with_attributes, with_translator};

    /// Module with the given declarations plus a function `test` returning
    /// `value`; yields the translation of `value`.
    fn translate_value(
        b: &mut IrBuilder,
        mut declarations: Vec<IrDeclaration>,
        value: IrExpr,
        attributes: &AttributeStore,
    ) -> DartExpression {
        let function = b.function("test", value.ty.clone()).body(vec![IrStatement::Return(Some(value))]).build();
        declarations.push(IrDeclaration::Function(function));
        let mut file = b.file("app/Test.kt", "app");
        file.declarations = declarations;
        let mut module = IrModule::new("test");
        module.add_file(file);

        with_attributes(&module, attributes, |t| {
            let IrDeclaration::Function(function) = module.files[0].declarations.last().unwrap() else {
                unreachable!();
            };
            let Some(IrStatement::Return(Some(value))) = function.body.as_ref().unwrap().statements.first() else {
                unreachable!();
            };
            t.translate_expr(value).unwrap()
        })
    }

    #[test]
    fn test_binary_operator_token() {
        let mut b = IrBuilder::new();
        let left = b.int(7);
        let right = b.int(2);
        let value = b.binary(IrBinaryOp::IntDiv, IrType::int(), left, right);
        let DartExpression::Binary { operator, .. } = translate_value(&mut b, vec![], value, &AttributeStore::new())
        else {
            panic!("expected binary");
        };
        assert_eq!(operator.token(), "~/");
    }

    #[test]
    fn test_defaulted_argument_is_named() {
        let mut b = IrBuilder::new();
        let zero = b.int(0);
        let callee = b
            .function("greet", IrType::unit())
            .parameter("name", IrType::string())
            .parameter_with_default("times", IrType::int(), zero)
            .build();
        let name = b.string("bob");
        let times = b.int(3);
        let call = b.call(callee.id, IrType::unit(), vec![name, times]);
        let DartExpression::MethodInvocation { arguments, .. } =
            translate_value(&mut b, vec![IrDeclaration::Function(callee)], call, &AttributeStore::new())
        else {
            panic!("expected invocation");
        };
        assert_eq!(arguments.positional.len(), 1);
        assert_eq!(arguments.named.len(), 1);
        assert_eq!(arguments.named[0].0.value(), "times");
    }

    #[test]
    fn test_skipped_positional_filled_with_default() {
        let mut b = IrBuilder::new();
        let five = b.int(5);
        let callee = b
            .function("range", IrType::unit())
            .parameter_with_default("start", IrType::int(), five)
            .parameter("end", IrType::int())
            .annotation(crate::ir::IrAnnotation::new(annotations::DART_POSITIONAL))
            .build();
        let end = b.int(9);
        let mut call = IrCall::new(Callee::Function(callee.id));
        call.arguments = vec![None, Some(end)];
        let call = b.expr(IrType::unit(), IrExprKind::Call(call));
        let DartExpression::MethodInvocation { arguments, .. } =
            translate_value(&mut b, vec![IrDeclaration::Function(callee)], call, &AttributeStore::new())
        else {
            panic!("expected invocation");
        };
        assert_eq!(
            arguments.positional,
            vec![
                DartExpression::Literal(DartLiteral::Int(5)),
                DartExpression::Literal(DartLiteral::Int(9)),
            ]
        );
    }

    #[test]
    fn test_const_call_not_repeated_inside_const_context() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Point");
        let constructor = b.constructor(class.id).const_().build();
        let constructor_id = constructor.id;
        class.declarations.push(IrDeclaration::Constructor(constructor));
        let inner = b.constructor_call(constructor_id, class.default_type(), vec![]);
        let mut attributes = AttributeStore::new();
        attributes.set(&inner, keys::DART_CONST_CALL, true);

        let translated = translate_value(&mut b, vec![IrDeclaration::Class(class)], inner, &attributes);
        let DartExpression::InstanceCreation { is_const, ty, .. } = &translated else {
            panic!("expected instance creation");
        };
        assert!(is_const);
        assert_eq!(ty, &DartTypeAnnotation::named("Point"));
    }

    #[test]
    fn test_null_aware_property_write() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Box");
        let x = b.property("x", IrType::int()).var().build();
        let x_id = x.id;
        let box_ty = class.default_type().make_nullable();
        class.declarations.push(IrDeclaration::Property(x));
        let holder = b.property("current", box_ty.clone()).var().build();
        let receiver = b.get_property(holder.id, box_ty, None);
        let five = b.int(5);
        let mut write = b.set_property(x_id, Some(receiver), five);
        if let IrExprKind::SetProperty { null_aware, .. } = &mut write.kind {
            *null_aware = true;
        }

        let translated = translate_value(
            &mut b,
            vec![IrDeclaration::Class(class), IrDeclaration::Property(holder)],
            write,
            &AttributeStore::new(),
        );
        let DartExpression::Assignment { target, .. } = &translated else {
            panic!("expected assignment");
        };
        let DartExpression::PropertyAccess { name, null_aware, .. } = target.as_ref() else {
            panic!("expected property access");
        };
        assert_eq!(name.value(), "x");
        assert!(*null_aware);
    }

    #[test]
    fn test_println_becomes_print() {
        let mut b = IrBuilder::new();
        let text = b.string("hi");
        let call = b.builtin_call("kotlin.io.println", IrType::unit(), None, vec![text], None);
        let DartExpression::MethodInvocation { target, name, .. } =
            translate_value(&mut b, vec![], call, &AttributeStore::new())
        else {
            panic!("expected invocation");
        };
        assert!(target.is_none());
        assert_eq!(name.value(), "print");
    }

    #[test]
    fn test_safe_cast_is_checked_conditional() {
        let mut b = IrBuilder::new();
        let value = b.string("x");
        let cast = b.type_op(
            TypeOperator::SafeCast,
            IrType::string().make_nullable(),
            value,
            IrType::string(),
        );
        let translated = translate_value(&mut b, vec![], cast, &AttributeStore::new());
        let DartExpression::Conditional { condition, else_expression, .. } = translated else {
            panic!("expected conditional");
        };
        assert!(matches!(*condition, DartExpression::Is { negated: false, .. }));
        assert_eq!(*else_expression, DartExpression::null());
    }

    #[test]
    fn test_when_has_no_mapping() {
        let mut b = IrBuilder::new();
        let when = b.when(IrType::int(), None, vec![]);
        let module = IrModule::new("test");
        let result = with_translator(&module, |t| t.translate_expr(&when));
        assert!(matches!(result, Err(InternalError::NoMapping { .. })));
    }
}
