//! External iterators
//!
//! Loops drive iterators with `hasNext()`/`next()`. Iterators that come
//! from the target's own libraries only offer `moveNext()`/`current`, so a
//! loop over one wraps it in the per-file `_$PeekingIterator`, which looks
//! one element ahead.

use super::intrinsics;
use crate::attributes::keys::GeneratedHelper;
use crate::ir::builder::IrBuilder;
use crate::ir::{
    builtins, DeclOrigin, IrClass, IrDeclaration, IrExpr, IrExprKind, IrStatement, IrType, IrUnaryOp, NodeId,
    VariableOrigin, Visibility,
};
use crate::lower::{ExpressionTransformer, LoweringContext, Transformation};

const PEEKING_ITERATOR_HELPER: &str = "PeekingIterator";

pub struct ExternalIterators;

impl ExpressionTransformer for ExternalIterators {
    fn name(&self) -> &'static str {
        "external-iterators"
    }

    fn transform_statement(&self, stmt: &mut IrStatement, cx: &mut LoweringContext<'_>) -> Transformation<IrStatement> {
        let IrStatement::Variable(variable) = stmt else {
            return Transformation::NoChange;
        };
        if variable.origin != Some(VariableOrigin::ForLoopIterator) || !is_external_iterator(&variable.ty, cx) {
            return Transformation::NoChange;
        }
        let Some(source) = variable.initializer.take() else {
            return Transformation::NoChange;
        };

        let helper = peeking_iterator_helper(cx);
        let element = variable.ty.arguments().first().cloned().unwrap_or_else(IrType::any);
        let ty = IrType::class(helper.fq_name.clone(), helper.class).with_arguments(vec![element.clone()]);
        let mut wrapped = cx.builder.constructor_call(helper.constructor, ty.clone(), vec![Some(source)]);
        if let IrExprKind::ConstructorCall(call) = &mut wrapped.kind {
            call.type_arguments = vec![element];
        }
        tracing::trace!(variable = %variable.name, "wrapped external iterator");
        variable.ty = ty;
        variable.initializer = Some(wrapped);
        Transformation::NoChange
    }
}

fn is_external_iterator(ty: &IrType, cx: &LoweringContext<'_>) -> bool {
    if !(ty.is(builtins::ITERATOR) || ty.is(builtins::DART_ITERATOR)) {
        return false;
    }
    match ty.class_id() {
        None => true,
        Some(class) => cx.index.file_of(class).map_or(true, |file| file.is_dependency),
    }
}

fn peeking_iterator_helper(cx: &mut LoweringContext<'_>) -> GeneratedHelper {
    cx.helper(PEEKING_ITERATOR_HELPER, build_peeking_iterator)
}

/// ```text
/// class _$PeekingIterator<T> {
///   _$PeekingIterator(this._iterator);
///   final Iterator<T> _iterator;
///   var _peeked = false;
///   var _hasNextValue = false;
///   bool hasNext() { if (!_peeked) { _hasNextValue = _iterator.moveNext(); _peeked = true; } return _hasNextValue; }
///   T next() { hasNext(); _peeked = false; return _iterator.current; }
/// }
/// ```
fn build_peeking_iterator(b: &mut IrBuilder, fq_name: &str) -> IrClass {
    let mut class = b.class(fq_name);
    class.visibility = Visibility::Private;
    class.origin = DeclOrigin::Generated;
    let t = b.type_parameter("T");
    class.type_parameters.push(t);
    let this = This {
        class: class.id,
        ty: class.default_type(),
    };

    let element = IrType::type_parameter("T");
    let source_type = IrType::builtin(builtins::DART_ITERATOR).with_arguments(vec![element.clone()]);
    let mut source_param = b.value_parameter("iterator", source_type.clone());
    let iterator = b
        .property("iterator", source_type.clone())
        .visibility(Visibility::Private)
        .declared_by(&mut source_param)
        .build();
    let constructor = b.constructor(class.id).primary().with_parameter(source_param).build();
    let no = b.boolean(false);
    let peeked = b
        .property("peeked", IrType::boolean())
        .var()
        .visibility(Visibility::Private)
        .initializer(no)
        .build();
    let no = b.boolean(false);
    let has_next_value = b
        .property("hasNextValue", IrType::boolean())
        .var()
        .visibility(Visibility::Private)
        .initializer(no)
        .build();

    let has_next = {
        let was_peeked = this.get(b, peeked.id, IrType::boolean());
        let not_peeked = b.unary(IrUnaryOp::Not, IrType::boolean(), was_peeked);
        let source = this.get(b, iterator.id, source_type.clone());
        let advanced = b.builtin_call(intrinsics::ITERATOR_MOVE_NEXT, IrType::boolean(), Some(source), vec![], None);
        let store = this.set(b, has_next_value.id, advanced);
        let yes = b.boolean(true);
        let mark = this.set(b, peeked.id, yes);
        let result = this.get(b, has_next_value.id, IrType::boolean());
        b.function("hasNext", IrType::boolean())
            .body(vec![
                IrStatement::If {
                    condition: not_peeked,
                    then_branch: vec![IrStatement::Expr(store), IrStatement::Expr(mark)],
                    else_branch: None,
                },
                IrStatement::Return(Some(result)),
            ])
            .build()
    };

    let next = {
        let receiver = this.expr(b);
        let peek = b.method_call(has_next.id, IrType::boolean(), receiver, vec![]);
        let no = b.boolean(false);
        let reset = this.set(b, peeked.id, no);
        let source = this.get(b, iterator.id, source_type);
        let current = b.builtin_call(intrinsics::ITERATOR_CURRENT, element.clone(), Some(source), vec![], None);
        b.function("next", element)
            .body(vec![
                IrStatement::Expr(peek),
                IrStatement::Expr(reset),
                IrStatement::Return(Some(current)),
            ])
            .build()
    };

    class.declarations = vec![
        IrDeclaration::Constructor(constructor),
        IrDeclaration::Property(iterator),
        IrDeclaration::Property(peeked),
        IrDeclaration::Property(has_next_value),
        IrDeclaration::Function(has_next),
        IrDeclaration::Function(next),
    ];
    class
}

/// Member access on the helper's `this`.
struct This {
    class: NodeId,
    ty: IrType,
}

impl This {
    fn expr(&self, b: &mut IrBuilder) -> IrExpr {
        b.this_of(self.class, self.ty.clone())
    }

    fn get(&self, b: &mut IrBuilder, property: NodeId, ty: IrType) -> IrExpr {
        let this = self.expr(b);
        b.get_property(property, ty, Some(this))
    }

    fn set(&self, b: &mut IrBuilder, property: NodeId, value: IrExpr) -> IrExpr {
        let this = self.expr(b);
        b.set_property(property, Some(this), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrVariable;
    use crate::lower::expressions::test_support::{body, function_module, transform};

    fn loop_iterator(b: &mut IrBuilder) -> IrVariable {
        let list_type = IrType::builtin("kotlin.collections.List").with_arguments(vec![IrType::int()]);
        let list = b.get_value(NodeId(10_000), list_type);
        let iterator_type = IrType::builtin(builtins::ITERATOR).with_arguments(vec![IrType::int()]);
        let call = b.builtin_call(
            "kotlin.collections.List.iterator",
            iterator_type.clone(),
            Some(list),
            vec![],
            None,
        );
        let mut variable = b.variable("it", iterator_type, Some(call));
        variable.origin = Some(VariableOrigin::ForLoopIterator);
        variable
    }

    #[test]
    fn test_wraps_once_per_file() {
        let mut b = IrBuilder::new();
        let first = loop_iterator(&mut b);
        let second = loop_iterator(&mut b);
        let mut module = function_module(&mut b, vec![IrStatement::Variable(first), IrStatement::Variable(second)]);

        transform(ExternalIterators, &mut module);

        let helpers: Vec<&IrClass> = module.files[0]
            .declarations
            .iter()
            .filter_map(|d| match d {
                IrDeclaration::Class(c) if c.name == PEEKING_ITERATOR_HELPER => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(helpers.len(), 1);
        let helper = helpers[0];
        assert!(helper.function_named("hasNext").is_some());
        assert!(helper.function_named("next").is_some());

        for stmt in body(&module) {
            let IrStatement::Variable(variable) = stmt else {
                panic!("expected variable");
            };
            assert_eq!(variable.ty.class_id(), Some(helper.id));
            let Some(IrExprKind::ConstructorCall(call)) = variable.initializer.as_ref().map(|e| &e.kind) else {
                panic!("expected wrapping constructor call");
            };
            assert_eq!(call.arguments.len(), 1);
        }
    }

    #[test]
    fn test_plain_variables_untouched() {
        let mut b = IrBuilder::new();
        let mut variable = loop_iterator(&mut b);
        variable.origin = None;
        let mut module = function_module(&mut b, vec![IrStatement::Variable(variable)]);
        let before = module.clone();

        transform(ExternalIterators, &mut module);

        assert_eq!(module, before);
    }
}
