use crate::ir::builder::IrBuilder;
use crate::ir::{
    ClassKind, IrBinaryOp, IrClass, IrDeclaration, IrExpr, IrFunction, IrProperty, IrStatement, IrType, IrValueParameter,
    NodeId, TypeOperator,
};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use rustc_hash::FxHashSet;

/// Data classes get the members the compiler generates for them: `==`,
/// `hashCode`, `toString` and `copy`, all over the properties declared in
/// the primary constructor. A member the class declares itself is kept.
pub struct DataClasses;

impl DeclarationLowering for DataClasses {
    fn name(&self) -> &'static str {
        "data-classes"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Class(class) = decl else {
            return Transformation::NoChange;
        };
        if !class.is_data || class.kind != ClassKind::Class {
            return Transformation::NoChange;
        }
        let Some(components) = components(class) else {
            return Transformation::NoChange;
        };
        tracing::trace!(class = %class.fq_name, components = components.len(), "lowering data class");

        let declared: FxHashSet<&str> = class.declarations.iter().filter_map(IrDeclaration::name).collect();
        let b = &mut cx.builder;
        let mut generated = Vec::new();
        if !declared.contains("equals") {
            generated.push(IrDeclaration::Function(equals(class, &components, b)));
        }
        if !declared.contains("hashCode") {
            generated.push(IrDeclaration::Property(hash_code(class, &components, b)));
        }
        if !declared.contains("toString") {
            generated.push(IrDeclaration::Function(to_string(class, &components, b)));
        }
        if !declared.contains("copy") {
            generated.push(IrDeclaration::Function(copy(class, &components, b)));
        }
        class.declarations.extend(generated);
        Transformation::NoChange
    }
}

/// A property declared by a primary constructor parameter.
struct Component {
    parameter: IrValueParameter,
    property: NodeId,
}

impl Component {
    fn name(&self) -> &str {
        &self.parameter.name
    }

    fn ty(&self) -> IrType {
        self.parameter.ty.clone()
    }

    fn read(&self, receiver: IrExpr, b: &mut IrBuilder) -> IrExpr {
        b.get_property(self.property, self.ty(), Some(receiver))
    }
}

fn components(class: &IrClass) -> Option<Vec<Component>> {
    let constructor = class.primary_constructor()?;
    Some(
        constructor
            .parameters
            .iter()
            .filter_map(|p| {
                let property = p.corresponding_property?;
                Some(Component {
                    parameter: p.clone(),
                    property,
                })
            })
            .collect(),
    )
}

/// `operator fun equals(other: Any?) = other is T && other.a == a && ...`
fn equals(class: &IrClass, components: &[Component], b: &mut IrBuilder) -> IrFunction {
    let ty = class.default_type();
    let other = b.value_parameter("other", IrType::any().make_nullable());
    let read_other = b.get_param(&other);
    let mut value = b.type_op(TypeOperator::InstanceOf, IrType::boolean(), read_other, ty.clone());
    for component in components {
        let other_value = b.get_param(&other);
        let cast = b.type_op(TypeOperator::ImplicitCast, ty.clone(), other_value, ty.clone());
        let theirs = component.read(cast, b);
        let this = b.this(class);
        let ours = component.read(this, b);
        let same = b.eqeq(theirs, ours);
        value = b.binary(IrBinaryOp::AndAnd, IrType::boolean(), value, same);
    }
    b.function("equals", IrType::boolean())
        .with_parameter(other)
        .operator()
        .override_()
        .body(vec![IrStatement::Return(Some(value))])
        .build()
}

/// `override val hashCode get() = ((0 * 31 + a.hashCode) * 31 + b.hashCode)...`
fn hash_code(class: &IrClass, components: &[Component], b: &mut IrBuilder) -> IrProperty {
    let mut value = b.int(0);
    for component in components {
        let thirty_one = b.int(31);
        let scaled = b.binary(IrBinaryOp::Mul, IrType::int(), value, thirty_one);
        let this = b.this(class);
        let read = component.read(this, b);
        let hash = b.builtin_call("kotlin.Any.hashCode", IrType::int(), Some(read), vec![], None);
        value = b.binary(IrBinaryOp::Plus, IrType::int(), scaled, hash);
    }
    b.property("hashCode", IrType::int())
        .without_field()
        .override_()
        .getter(vec![IrStatement::Return(Some(value))])
        .build()
}

/// `override fun toString() = "Name(a=$a, b=$b)"`
fn to_string(class: &IrClass, components: &[Component], b: &mut IrBuilder) -> IrFunction {
    let mut parts = Vec::with_capacity(components.len() * 2 + 1);
    for (i, component) in components.iter().enumerate() {
        let separator = if i == 0 { "(" } else { ", " };
        let label = match i {
            0 => format!("{}{}{}=", class.name, separator, component.name()),
            _ => format!("{}{}=", separator, component.name()),
        };
        parts.push(b.string(&label));
        let this = b.this(class);
        parts.push(component.read(this, b));
    }
    let closing = if components.is_empty() {
        format!("{}()", class.name)
    } else {
        ")".to_string()
    };
    parts.push(b.string(&closing));
    let value = b.string_concat(parts);
    b.function("toString", IrType::string())
        .override_()
        .body(vec![IrStatement::Return(Some(value))])
        .build()
}

/// `fun copy(a: A = this.a, ...) = T(a, ...)`; the defaults are lowered later
/// like any other non-constant default.
fn copy(class: &IrClass, components: &[Component], b: &mut IrBuilder) -> IrFunction {
    let ty = class.default_type();
    let mut parameters = Vec::with_capacity(components.len());
    let mut arguments = Vec::with_capacity(components.len());
    for component in components {
        let this = b.this(class);
        let default = component.read(this, b);
        let mut parameter = b.value_parameter(component.name(), component.ty());
        parameter.default_value = Some(default);
        arguments.push(Some(b.get_param(&parameter)));
        parameters.push(parameter);
    }
    let body = class
        .primary_constructor()
        .map(|constructor| IrStatement::Return(Some(b.constructor_call(constructor.id, ty.clone(), arguments))));
    let mut function = b.function("copy", ty).body(body.into_iter().collect()).build();
    function.parameters = parameters;
    function
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrConst, IrExprKind};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    /// `data class Point(val x: Int, val y: Int) { override fun toString() = "point" }`
    fn point(b: &mut IrBuilder, declares_to_string: bool) -> IrClass {
        let mut class = b.class("app.Point");
        class.is_data = true;
        let mut x = b.value_parameter("x", IrType::int());
        let mut y = b.value_parameter("y", IrType::int());
        let x_property = b.property("x", IrType::int()).declared_by(&mut x).build();
        let y_property = b.property("y", IrType::int()).declared_by(&mut y).build();
        let constructor = b.constructor(class.id).primary().with_parameter(x).with_parameter(y).build();
        class.declarations = vec![
            IrDeclaration::Constructor(constructor),
            IrDeclaration::Property(x_property),
            IrDeclaration::Property(y_property),
        ];
        if declares_to_string {
            let text = b.string("point");
            let to_string = b
                .function("toString", IrType::string())
                .override_()
                .body(vec![IrStatement::Return(Some(text))])
                .build();
            class.declarations.push(IrDeclaration::Function(to_string));
        }
        class
    }

    fn lowered(declares_to_string: bool) -> IrClass {
        let mut b = IrBuilder::new();
        let class = point(&mut b, declares_to_string);
        let mut module = module_with(&mut b, vec![IrDeclaration::Class(class)]);
        run(vec![Pass::Declaration(Box::new(DataClasses))], &mut module);
        match module.files[0].declarations.remove(0) {
            IrDeclaration::Class(class) => class,
            _ => panic!("expected class"),
        }
    }

    fn returned(function: &IrFunction) -> &IrExpr {
        match function.body.as_ref().map(|b| &b.statements[..]) {
            Some([IrStatement::Return(Some(value))]) => value,
            _ => panic!("expected a single return"),
        }
    }

    #[test]
    fn test_generated_members() {
        let class = lowered(false);
        let names: Vec<&str> = class.declarations.iter().filter_map(IrDeclaration::name).collect();
        assert_eq!(names, vec!["x", "y", "equals", "hashCode", "toString", "copy"]);

        let equals = class.function_named("equals").unwrap();
        assert!(equals.is_operator && equals.is_override);
        let IrExprKind::Binary { op, left, .. } = &returned(equals).kind else {
            panic!("expected conjunction");
        };
        assert_eq!(*op, IrBinaryOp::AndAnd);
        let IrExprKind::Binary { left: first, .. } = &left.kind else {
            panic!("expected nested conjunction");
        };
        assert!(matches!(
            first.kind,
            IrExprKind::TypeOp {
                operator: TypeOperator::InstanceOf,
                ..
            }
        ));

        let hash_code = class.properties().find(|p| p.name == "hashCode").unwrap();
        assert!(hash_code.backing_field.is_none());
        assert!(hash_code.is_override);
    }

    #[test]
    fn test_to_string_lists_components() {
        let class = lowered(false);
        let IrExprKind::StringConcat(parts) = &returned(class.function_named("toString").unwrap()).kind else {
            panic!("expected concatenation");
        };
        let literals: Vec<&IrConst> = parts.iter().filter_map(IrExpr::as_const).collect();
        assert_eq!(
            literals,
            vec![
                &IrConst::String("Point(x=".to_string()),
                &IrConst::String(", y=".to_string()),
                &IrConst::String(")".to_string()),
            ]
        );
    }

    #[test]
    fn test_copy_defaults_to_current_values() {
        let class = lowered(false);
        let copy = class.function_named("copy").unwrap();
        assert_eq!(copy.parameters.len(), 2);
        assert!(copy
            .parameters
            .iter()
            .all(|p| matches!(p.default_value.as_ref().map(|d| &d.kind), Some(IrExprKind::GetProperty { .. }))));
        let IrExprKind::ConstructorCall(call) = &returned(copy).kind else {
            panic!("expected constructor call");
        };
        assert_eq!(Some(call.constructor), class.primary_constructor().map(|c| c.id));
        assert!(call.arguments[1].as_ref().unwrap().is_get_value(copy.parameters[1].id));
    }

    #[test]
    fn test_declared_member_kept() {
        let class = lowered(true);
        let to_strings: Vec<&IrFunction> = class.functions().filter(|f| f.name == "toString").collect();
        assert_eq!(to_strings.len(), 1);
        assert_eq!(
            returned(to_strings[0]).as_const(),
            Some(&IrConst::String("point".to_string()))
        );
    }
}
