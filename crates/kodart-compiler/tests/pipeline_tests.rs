//! End-to-end compilation scenarios

mod common;

use common::{compile, compile_failure, compile_single, module_of};
use kodart_compiler::ir::builder::IrBuilder;
use kodart_compiler::ir::{
    annotations, ClassKind, IrAnnotation, IrBinaryOp, IrDeclaration, IrEnumEntry, IrExprKind, IrModule, IrStatement,
    IrType,
};
use kodart_compiler::write_output;

/// `class Counter { val start = 0; var current = start }`
fn counter_module(b: &mut IrBuilder) -> IrModule {
    let mut class = b.class("app.Counter");
    let zero = b.int(0);
    let start = b.property("start", IrType::int()).initializer(zero).build();
    let this = b.this(&class);
    let read_start = b.get_property(start.id, IrType::int(), Some(this));
    let current = b.property("current", IrType::int()).var().initializer(read_start).build();
    let ctor = b.constructor(class.id).primary().build();
    class.declarations.push(IrDeclaration::Constructor(ctor));
    class.declarations.push(IrDeclaration::Property(start));
    class.declarations.push(IrDeclaration::Property(current));
    module_of(b, "app/Counter.kt", vec![IrDeclaration::Class(class)])
}

/// `class Thing(); const val thing = Thing()`
fn non_const_constructor_module(b: &mut IrBuilder) -> IrModule {
    let mut class = b.class("app.Thing");
    let ctor = b.constructor(class.id).primary().build();
    let ctor_id = ctor.id;
    let ty = class.default_type();
    class.declarations.push(IrDeclaration::Constructor(ctor));
    let call = b.constructor_call(ctor_id, ty.clone(), vec![]);
    let property = b.property("thing", ty).const_().initializer(call).build();
    module_of(
        b,
        "app/Thing.kt",
        vec![IrDeclaration::Class(class), IrDeclaration::Property(property)],
    )
}

#[test]
fn test_field_initializer_deferred_to_constructor_body() {
    let mut b = IrBuilder::new();
    let text = compile_single(counter_module(&mut b));

    assert!(text.contains("final int start = 0;"), "{}", text);
    assert!(text.contains("late int current;"), "{}", text);
    assert!(text.contains("  Counter() {\n    this.current = this.start;\n  }"), "{}", text);
}

#[test]
fn test_const_initialized_with_non_constant_value() {
    let mut b = IrBuilder::new();
    let error = compile_failure(non_const_constructor_module(&mut b));
    assert!(
        error.kind_names().contains("CONST_INITIALIZED_WITH_NON_CONSTANT_VALUE"),
        "got {:?}",
        error.kind_names()
    );
}

#[test]
fn test_failed_compilation_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut b = IrBuilder::new();
    match compile(non_const_constructor_module(&mut b)) {
        Ok(output) => {
            write_output(dir.path(), &output).unwrap();
            panic!("expected failure");
        }
        Err(error) => assert!(error.to_string().starts_with("Compilation failed")),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_compilation_is_deterministic() {
    let mut b = IrBuilder::new();
    let mut module = counter_module(&mut b);
    let x = b.value_parameter("x", IrType::int());
    let read = b.get_param(&x);
    let one = b.int(1);
    let sum = b.binary(IrBinaryOp::Plus, IrType::int(), read, one);
    let function = b
        .function("increment", IrType::int())
        .with_parameter(x)
        .body(vec![IrStatement::Return(Some(sum))])
        .build();
    let mut other = b.file("app/util/Math.kt", "app.util");
    other.declarations.push(IrDeclaration::Function(function));
    module.add_file(other);

    let first = compile(module.clone()).unwrap();
    let second = compile(module).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        common::file_text(&first, "lib/app/util/math.dart"),
        "int increment(int x) {\n  return x + 1;\n}\n"
    );
}

#[test]
fn test_failure_diagnostics_are_deterministic() {
    let mut b = IrBuilder::new();
    let module = non_const_constructor_module(&mut b);
    let first = compile_failure(module.clone());
    let second = compile_failure(module);
    assert_eq!(first, second);
}

/// `@const class Marker(x: Int)` and `fun make(y: Int) { Marker(y) }`
#[test]
fn test_always_const_class_with_runtime_argument_fails() {
    let mut b = IrBuilder::new();
    let mut class = b.class("app.Marker");
    class.annotations.push(IrAnnotation::new(annotations::CONST));
    let x = b.value_parameter("x", IrType::int());
    let constructor = b.constructor(class.id).primary().with_parameter(x).build();
    let y = b.value_parameter("y", IrType::int());
    let read_y = b.get_param(&y);
    let call = b.constructor_call(constructor.id, class.default_type(), vec![Some(read_y)]);
    class.declarations.push(IrDeclaration::Constructor(constructor));
    let make = b
        .function("make", IrType::unit())
        .with_parameter(y)
        .body(vec![IrStatement::Expr(call)])
        .build();
    let module = module_of(
        &mut b,
        "app/Marker.kt",
        vec![IrDeclaration::Class(class), IrDeclaration::Function(make)],
    );

    let error = compile_failure(module);
    assert!(error.kind_names().contains("CONST_WITH_NON_CONST"), "got {:?}", error.kind_names());
}

/// `enum class Level(val weight: Int) { low(1), high(10) }`
#[test]
fn test_enum_entries_are_static_constants() {
    let mut b = IrBuilder::new();
    let mut class = b.class("app.Level");
    class.kind = ClassKind::Enum;
    let mut weight = b.value_parameter("weight", IrType::int());
    let property = b.property("weight", IrType::int()).declared_by(&mut weight).build();
    let constructor = b.constructor(class.id).primary().with_parameter(weight).build();
    for (name, value) in [("low", 1), ("high", 10)] {
        let argument = b.int(value);
        class.enum_entries.push(IrEnumEntry {
            id: b.fresh(),
            name: name.to_string(),
            arguments: vec![Some(argument)],
        });
    }
    class.declarations = vec![IrDeclaration::Constructor(constructor), IrDeclaration::Property(property)];
    let text = compile_single(module_of(&mut b, "app/Level.kt", vec![IrDeclaration::Class(class)]));

    assert!(text.contains("static const Level low = "), "{}", text);
    assert!(text.contains("static const Level high = "), "{}", text);
}

/// `object Registry { fun size() = 0 }` and `fun count() = Registry.size()`
#[test]
fn test_object_members_reached_through_instance() {
    let mut b = IrBuilder::new();
    let mut object = b.class("app.Registry");
    object.kind = ClassKind::Object;
    let zero = b.int(0);
    let size = b
        .function("size", IrType::int())
        .body(vec![IrStatement::Return(Some(zero))])
        .build();
    let registry = b.expr(object.default_type(), IrExprKind::GetObject { class: object.id });
    let call = b.method_call(size.id, IrType::int(), registry, vec![]);
    object.declarations.push(IrDeclaration::Function(size));
    let count = b
        .function("count", IrType::int())
        .body(vec![IrStatement::Return(Some(call))])
        .build();
    let module = module_of(
        &mut b,
        "app/Registry.kt",
        vec![IrDeclaration::Class(object), IrDeclaration::Function(count)],
    );

    let text = compile_single(module);
    assert!(text.contains("static final Registry $instance = "), "{}", text);
    assert!(text.contains("Registry.$instance.size()"), "{}", text);
}
