//! Translation and rendering of lowered IR

mod common;

use common::{compile_single, module_of};
use kodart_compiler::attributes::AttributeStore;
use kodart_compiler::ir::builder::IrBuilder;
use kodart_compiler::ir::{annotations, DeclIndex, IrAnnotation, IrBinaryOp, IrDeclaration, IrStatement, IrType};
use kodart_compiler::render;
use kodart_compiler::translate::Translator;
use kodart_compiler::ElementIndex;

const OPERATOR_TOKENS: &[(IrBinaryOp, &str)] = &[
    (IrBinaryOp::AndAnd, "&&"),
    (IrBinaryOp::OrOr, "||"),
    (IrBinaryOp::Eq, "=="),
    (IrBinaryOp::NotEq, "!="),
    (IrBinaryOp::Lt, "<"),
    (IrBinaryOp::Gt, ">"),
    (IrBinaryOp::LtEq, "<="),
    (IrBinaryOp::GtEq, ">="),
    (IrBinaryOp::Plus, "+"),
    (IrBinaryOp::Minus, "-"),
    (IrBinaryOp::Mul, "*"),
    (IrBinaryOp::Div, "/"),
    (IrBinaryOp::IntDiv, "~/"),
    (IrBinaryOp::Rem, "%"),
    (IrBinaryOp::IfNull, "??"),
    (IrBinaryOp::BitAnd, "&"),
    (IrBinaryOp::BitOr, "|"),
    (IrBinaryOp::BitXor, "^"),
    (IrBinaryOp::Shl, "<<"),
    (IrBinaryOp::Shr, ">>"),
    (IrBinaryOp::UShr, ">>>"),
];

#[test]
fn test_every_binary_operator_renders_its_token() {
    assert_eq!(OPERATOR_TOKENS.len(), IrBinaryOp::ALL.len());

    let mut b = IrBuilder::new();
    let mut declarations = Vec::new();
    for (i, (op, _)) in OPERATOR_TOKENS.iter().enumerate() {
        let left = b.value_parameter("a", IrType::int());
        let right = b.value_parameter("b", IrType::int());
        let read_left = b.get_param(&left);
        let read_right = b.get_param(&right);
        let value = b.binary(*op, IrType::int(), read_left, read_right);
        let function = b
            .function(&format!("f{}", i), IrType::int())
            .with_parameter(left)
            .with_parameter(right)
            .body(vec![IrStatement::Return(Some(value))])
            .build();
        declarations.push(IrDeclaration::Function(function));
    }
    let module = module_of(&mut b, "app/Ops.kt", declarations);

    let index = DeclIndex::build(&module);
    let attributes = AttributeStore::new();
    let elements = ElementIndex::from_packages(&[]).unwrap();
    let mut translator = Translator::new(&module, &index, &attributes, &elements);
    let unit = translator.translate_file(&module.files[0]).unwrap();
    let text = render(&unit);

    for (i, (op, token)) in OPERATOR_TOKENS.iter().enumerate() {
        let expected = format!("int f{}(int a, int b) {{\n  return a {} b;\n}}", i, token);
        assert!(text.contains(&expected), "{:?}: missing `{}` in\n{}", op, expected, text);
    }
}

#[test]
fn test_default_parameter_is_named() {
    let mut b = IrBuilder::new();
    let one = b.int(1);
    let function = b
        .function("f", IrType::unit())
        .parameter("a", IrType::int())
        .parameter_with_default("b", IrType::int(), one)
        .body(Vec::new())
        .build();
    let text = compile_single(module_of(&mut b, "app/F.kt", vec![IrDeclaration::Function(function)]));
    assert_eq!(text, "void f(int a, {int b = 1}) {}\n");
}

#[test]
fn test_positional_annotation_keeps_parameter_positional() {
    let mut b = IrBuilder::new();
    let one = b.int(1);
    let function = b
        .function("f", IrType::unit())
        .parameter("a", IrType::int())
        .parameter_with_default("b", IrType::int(), one)
        .annotation(IrAnnotation::new(annotations::DART_POSITIONAL))
        .body(Vec::new())
        .build();
    let text = compile_single(module_of(&mut b, "app/F.kt", vec![IrDeclaration::Function(function)]));
    assert_eq!(text, "void f(int a, [int b = 1]) {}\n");
}

#[test]
fn test_call_site_names_defaulted_argument() {
    let mut b = IrBuilder::new();
    let one = b.int(1);
    let callee = b
        .function("f", IrType::unit())
        .parameter("a", IrType::int())
        .parameter_with_default("b", IrType::int(), one)
        .body(Vec::new())
        .build();
    let two = b.int(2);
    let three = b.int(3);
    let call = b.call(callee.id, IrType::unit(), vec![two, three]);
    let caller = b
        .function("g", IrType::unit())
        .body(vec![IrStatement::Expr(call)])
        .build();
    let text = compile_single(module_of(
        &mut b,
        "app/F.kt",
        vec![IrDeclaration::Function(callee), IrDeclaration::Function(caller)],
    ));
    assert!(text.contains("void g() {\n  f(2, b: 3);\n}"), "{}", text);
}
