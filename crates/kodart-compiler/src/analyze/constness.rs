//! Target constness
//!
//! Decides whether an expression can be evaluated by the target at compile
//! time. A constructor call is only const where the context demands it
//! (`implicit`, e.g. the initializer of a `const val`) or the call site is
//! annotated; otherwise only classes that are always const-constructed
//! qualify. Either way every argument must itself be const, and arguments
//! are evaluated in a const context.

use crate::attributes::{keys, AttributeStore};
use crate::element::ElementIndex;
use crate::ir::{
    annotations, CallOrigin, DeclIndex, DeclKind, IrCall, IrExpr, IrExprKind, IrType, NodeId,
};
use crate::ir::visit::{self, Visitor};

#[derive(Clone, Copy)]
pub struct ConstEvaluator<'a> {
    index: &'a DeclIndex,
    elements: &'a ElementIndex<'a>,
    attributes: &'a AttributeStore,
    /// Parameter and local reads count as const (bodies of const inline
    /// functions)
    inline_body: bool,
}

impl<'a> ConstEvaluator<'a> {
    pub fn new(index: &'a DeclIndex, elements: &'a ElementIndex<'a>, attributes: &'a AttributeStore) -> Self {
        Self {
            index,
            elements,
            attributes,
            inline_body: false,
        }
    }

    /// Evaluator for the body of a const inline function. Parameters are
    /// replaced by constant arguments at every inlined call, and the only
    /// locals are constants.
    pub fn in_const_inline(self) -> Self {
        Self {
            inline_body: true,
            ..self
        }
    }

    /// Whether the declaration is const in the target.
    pub fn is_const_declaration(&self, id: NodeId) -> bool {
        let Some(info) = self.index.get(id) else {
            return false;
        };
        let element_const = info
            .element
            .as_ref()
            .and_then(|loc| self.elements.lookup(loc).ok())
            .is_some_and(|e| e.is_const());

        match info.kind {
            DeclKind::Constructor => {
                info.is_const
                    || element_const
                    || info.has_annotation(annotations::CONST)
                    || info.parent.is_some_and(|class| self.is_always_const_class(class))
            }
            DeclKind::Property => info.is_const || element_const,
            DeclKind::Field => info.property.is_some_and(|p| p != id && self.is_const_declaration(p)),
            DeclKind::Variable => info.is_const || self.inline_body,
            DeclKind::ValueParameter => self.inline_body,
            DeclKind::Class | DeclKind::Interface => self.is_always_const_class(id),
            _ => false,
        }
    }

    /// Classes whose every construction is const.
    fn is_always_const_class(&self, class: NodeId) -> bool {
        self.attributes.flag(&class, keys::DART_CONST)
    }

    /// Whether calls of `constructor` are const without a call-site marker.
    pub fn is_always_const_constructor(&self, constructor: NodeId) -> bool {
        self.index
            .get(constructor)
            .and_then(|info| info.parent)
            .is_some_and(|class| self.is_always_const_class(class))
    }

    /// Whether `expr` is a target compile-time constant.
    pub fn is_dart_const(&self, expr: &IrExpr, implicit: bool) -> bool {
        match &expr.kind {
            IrExprKind::Const(_) => true,
            IrExprKind::When(_) | IrExprKind::Conditional { .. } => self.children_const(expr, implicit),
            IrExprKind::Binary {
                op: crate::ir::IrBinaryOp::IfNull,
                ..
            } => self.children_const(expr, implicit),
            IrExprKind::ConstructorCall(call) => {
                let const_context =
                    implicit || call.const_annotated || self.is_always_const_constructor(call.constructor);
                const_context
                    && self.is_const_declaration(call.constructor)
                    && call.arguments.iter().flatten().all(|a| self.is_dart_const(a, true))
            }
            IrExprKind::Call(call) => {
                self.is_const_inline_call(call) || self.is_operator_call_on_const_primitives(call, implicit)
            }
            IrExprKind::GetProperty { property, .. } => self.is_const_declaration(*property),
            IrExprKind::GetField { field, .. } => self.is_const_declaration(*field),
            IrExprKind::TypeOp { operand, .. } => self.is_dart_const(operand, implicit),
            IrExprKind::StringConcat(parts) => parts.iter().all(|p| self.is_dart_const(p, implicit)),
            IrExprKind::GetValue { target } => self.is_const_declaration(*target),
            IrExprKind::GetEnumEntry { .. } => true,
            _ => false,
        }
    }

    fn children_const(&self, expr: &IrExpr, implicit: bool) -> bool {
        let mut children = Children {
            evaluator: *self,
            implicit,
            all_const: true,
        };
        visit::walk_expr(&mut children, expr);
        children.all_const
    }

    /// A top-level const inline function called with constant arguments.
    pub fn is_const_inline_call(&self, call: &IrCall) -> bool {
        let Some(function) = call.function() else {
            return false;
        };
        call.dispatch_receiver.is_none()
            && call.extension_receiver.is_none()
            && self.index.get(function).is_some_and(|info| info.is_const_inline())
            && call.present_arguments().all(|a| self.is_dart_const(a, true))
    }

    fn is_operator_call_on_const_primitives(&self, call: &IrCall, implicit: bool) -> bool {
        if call.function().is_some() {
            return false;
        }
        let Some(origin) = call.origin else {
            return false;
        };
        let operands: Vec<&IrExpr> = call
            .dispatch_receiver
            .iter()
            .map(|r| r.as_ref())
            .chain(call.present_arguments())
            .collect();
        if !operands.iter().all(|e| self.is_dart_const(e, implicit)) {
            return false;
        }

        let all = |pred: fn(&IrType) -> bool| operands.iter().all(|e| pred(&e.ty));
        if all(IrType::is_numeric) {
            matches!(
                origin,
                CallOrigin::EqEq
                    | CallOrigin::Plus
                    | CallOrigin::UPlus
                    | CallOrigin::Minus
                    | CallOrigin::UMinus
                    | CallOrigin::Mul
                    | CallOrigin::Div
            )
        } else if all(IrType::is_string) {
            matches!(origin, CallOrigin::EqEq | CallOrigin::Plus)
        } else if all(IrType::is_boolean) {
            matches!(origin, CallOrigin::EqEq)
        } else {
            false
        }
    }
}

struct Children<'a> {
    evaluator: ConstEvaluator<'a>,
    implicit: bool,
    all_const: bool,
}

impl Visitor for Children<'_> {
    fn visit_expr(&mut self, expr: &IrExpr) {
        if self.all_const && !self.evaluator.is_dart_const(expr, self.implicit) {
            self.all_const = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrDeclaration, IrModule};

    struct Fixture {
        module: IrModule,
        const_ctor: NodeId,
        plain_ctor: NodeId,
        class_ty: IrType,
    }

    fn fixture(b: &mut IrBuilder) -> Fixture {
        let mut class = b.class("app.Point");
        let const_ctor = b.constructor(class.id).const_().build();
        let plain_ctor = b.constructor(class.id).build();
        let ids = (const_ctor.id, plain_ctor.id);
        class.declarations.push(IrDeclaration::Constructor(const_ctor));
        class.declarations.push(IrDeclaration::Constructor(plain_ctor));
        let class_ty = class.default_type();
        let mut file = b.file("app/Point.kt", "app");
        file.declarations.push(IrDeclaration::Class(class));
        let mut module = IrModule::new("test");
        module.add_file(file);
        Fixture {
            module,
            const_ctor: ids.0,
            plain_ctor: ids.1,
            class_ty,
        }
    }

    #[test]
    fn test_constructor_calls_need_context() {
        let mut b = IrBuilder::new();
        let f = fixture(&mut b);
        let index = DeclIndex::build(&f.module);
        let elements = ElementIndex::default();
        let attributes = AttributeStore::new();
        let eval = ConstEvaluator::new(&index, &elements, &attributes);

        let call = b.constructor_call(f.const_ctor, f.class_ty.clone(), vec![]);
        assert!(eval.is_dart_const(&call, true));
        assert!(!eval.is_dart_const(&call, false));

        let plain = b.constructor_call(f.plain_ctor, f.class_ty, vec![]);
        assert!(!eval.is_dart_const(&plain, true));
    }

    #[test]
    fn test_operators_on_primitives() {
        let index = DeclIndex::default();
        let elements = ElementIndex::default();
        let attributes = AttributeStore::new();
        let eval = ConstEvaluator::new(&index, &elements, &attributes);
        let mut b = IrBuilder::new();

        let one = b.int(1);
        let two = b.int(2);
        let sum = b.builtin_call("kotlin.Int.plus", IrType::int(), Some(one), vec![two], Some(CallOrigin::Plus));
        assert!(eval.is_dart_const(&sum, false));

        let a = b.string("a");
        let c = b.string("b");
        let minus = b.builtin_call("kotlin.String.minus", IrType::string(), Some(a), vec![c], Some(CallOrigin::Minus));
        assert!(!eval.is_dart_const(&minus, false));

        let text = b.string("x");
        let n = b.int(3);
        let concat = b.string_concat(vec![text, n]);
        assert!(eval.is_dart_const(&concat, false));
    }

    #[test]
    fn test_always_const_class() {
        let mut b = IrBuilder::new();
        let f = fixture(&mut b);
        let index = DeclIndex::build(&f.module);
        let elements = ElementIndex::default();
        let mut attributes = AttributeStore::new();
        let class_id = f.class_ty.class_id().unwrap();
        attributes.set(&class_id, keys::DART_CONST, true);
        let eval = ConstEvaluator::new(&index, &elements, &attributes);

        let plain = b.constructor_call(f.plain_ctor, f.class_ty, vec![]);
        assert!(eval.is_dart_const(&plain, false));
    }

    #[test]
    fn test_always_const_class_needs_const_arguments() {
        let mut b = IrBuilder::new();
        let f = fixture(&mut b);
        let index = DeclIndex::build(&f.module);
        let elements = ElementIndex::default();
        let mut attributes = AttributeStore::new();
        let class_id = f.class_ty.class_id().unwrap();
        attributes.set(&class_id, keys::DART_CONST, true);
        let eval = ConstEvaluator::new(&index, &elements, &attributes);

        let y = b.value_parameter("y", IrType::int());
        let read = b.get_param(&y);
        let with_param = b.constructor_call(f.plain_ctor, f.class_ty.clone(), vec![Some(read)]);
        assert!(!eval.is_dart_const(&with_param, false));
        assert!(!eval.is_dart_const(&with_param, true));

        let one = b.int(1);
        let with_literal = b.constructor_call(f.plain_ctor, f.class_ty, vec![Some(one)]);
        assert!(eval.is_dart_const(&with_literal, false));
    }

    #[test]
    fn test_parameters_const_inside_const_inline() {
        let elements = ElementIndex::default();
        let attributes = AttributeStore::new();
        let mut b = IrBuilder::new();
        let x = b.value_parameter("x", IrType::int());
        let read = b.get_param(&x);
        let function = b.function("twice", IrType::int()).with_parameter(x).build();
        let mut file = b.file("app/twice.kt", "app");
        file.declarations.push(IrDeclaration::Function(function));
        let mut module = IrModule::new("test");
        module.add_file(file);
        let index = DeclIndex::build(&module);

        let eval = ConstEvaluator::new(&index, &elements, &attributes);
        assert!(!eval.is_dart_const(&read, false));
        assert!(eval.in_const_inline().is_dart_const(&read, false));
    }

    #[test]
    fn test_const_inline_call_with_constant_arguments() {
        let elements = ElementIndex::default();
        let attributes = AttributeStore::new();
        let mut b = IrBuilder::new();
        let function = b
            .function("twice", IrType::int())
            .parameter("x", IrType::int())
            .inline()
            .annotation(crate::ir::IrAnnotation::new(annotations::CONST))
            .build();
        let twice = function.id;
        let mut file = b.file("app/twice.kt", "app");
        file.declarations.push(IrDeclaration::Function(function));
        let mut module = IrModule::new("test");
        module.add_file(file);
        let index = DeclIndex::build(&module);
        let eval = ConstEvaluator::new(&index, &elements, &attributes);

        let two = b.int(2);
        let constant = b.call(twice, IrType::int(), vec![two]);
        assert!(eval.is_dart_const(&constant, false));

        let unknown = b.get_value(NodeId(9_000), IrType::int());
        let variable = b.call(twice, IrType::int(), vec![unknown]);
        assert!(!eval.is_dart_const(&variable, false));
    }
}
