//! Checker registry

pub mod const_constructor_default_value;
pub mod const_inline;
pub mod const_val_initializer;
pub mod dart_name_clash;
pub mod enum_var;
pub mod extension_name;
pub mod set_operator_return_type;

use super::checker::Checker;

/// Checkers that need declarations as written: const inline bodies before
/// their locals lose `const`, enum classes before they become classes.
pub fn source_checkers() -> Vec<Box<dyn Checker>> {
    vec![Box::new(const_inline::ConstInlineFunction), Box::new(enum_var::VarInEnum)]
}

/// Checkers that inspect default values before parameter lowering rewrites
/// them.
pub fn pre_parameter_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(const_val_initializer::ConstValInitializer),
        Box::new(const_constructor_default_value::ConstConstructorParameterDefaultValue),
    ]
}

/// Checkers that need final declaration shapes.
pub fn post_declaration_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(extension_name::ExtensionName),
        Box::new(set_operator_return_type::SetOperatorReturnType),
        Box::new(dart_name_clash::DartNameClash),
    ]
}

/// Returns every checker.
pub fn all_checkers() -> Vec<Box<dyn Checker>> {
    let mut checkers = source_checkers();
    checkers.extend(pre_parameter_checkers());
    checkers.extend(post_declaration_checkers());
    checkers
}
