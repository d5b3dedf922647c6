use super::Translator;
use crate::dart::{DartTypeAnnotation, DartTypeParameter};
use crate::ir::{builtins, IrType, IrTypeKind, IrTypeParameter, NodeId};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Source builtin classes and the target core type each one is spelled as.
static BUILTIN_TYPES: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        (builtins::ANY, "Object"),
        (builtins::UNIT, "void"),
        (builtins::NOTHING, "Never"),
        (builtins::BOOLEAN, "bool"),
        (builtins::STRING, "String"),
        (builtins::CHAR, "String"),
        (builtins::BYTE, "int"),
        (builtins::SHORT, "int"),
        (builtins::INT, "int"),
        (builtins::LONG, "int"),
        (builtins::FLOAT, "double"),
        (builtins::DOUBLE, "double"),
        (builtins::NUMBER, "num"),
        (builtins::THROWABLE, "Object"),
        ("kotlin.Comparable", "Comparable"),
        ("kotlin.Function", "Function"),
        ("kotlin.Array", "List"),
        ("kotlin.collections.List", "List"),
        ("kotlin.collections.MutableList", "List"),
        ("kotlin.collections.ArrayList", "List"),
        ("kotlin.collections.Set", "Set"),
        ("kotlin.collections.MutableSet", "Set"),
        ("kotlin.collections.Map", "Map"),
        ("kotlin.collections.MutableMap", "Map"),
        ("kotlin.collections.Collection", "Iterable"),
        ("kotlin.collections.Iterable", "Iterable"),
        ("kotlin.collections.MutableIterable", "Iterable"),
        (builtins::ITERATOR, "Iterator"),
        ("kotlin.collections.MutableIterator", "Iterator"),
    ]
    .into_iter()
    .collect()
});

/// Qualified-name prefix of classes that already are target core types.
const TARGET_CORE_PREFIX: &str = "dart.core.";

/// Target spelling of a builtin class, if it has one.
pub fn builtin_type_name(fq_name: &str) -> Option<&'static str> {
    BUILTIN_TYPES.get(fq_name).copied()
}

impl Translator<'_> {
    pub(super) fn dart_type(&self, ty: &IrType) -> DartTypeAnnotation {
        let annotation = match &ty.kind {
            IrTypeKind::Class {
                fq_name,
                class,
                arguments,
            } => DartTypeAnnotation::Named {
                name: self.class_type_name(fq_name, *class),
                type_arguments: arguments.iter().map(|a| self.dart_type(a)).collect(),
                nullable: false,
            },
            IrTypeKind::TypeParameter { name } => DartTypeAnnotation::named(name.as_str()),
            IrTypeKind::Function {
                parameters,
                return_type,
            } => DartTypeAnnotation::Function {
                return_type: Box::new(self.dart_type(return_type)),
                parameters: parameters.iter().map(|p| self.dart_type(p)).collect(),
                nullable: false,
            },
            IrTypeKind::Dynamic => return DartTypeAnnotation::named("dynamic"),
        };
        if annotation.is_void() {
            annotation
        } else {
            annotation.with_nullable(ty.nullable)
        }
    }

    pub(super) fn class_type_name(&self, fq_name: &str, class: Option<NodeId>) -> String {
        if let Some(name) = builtin_type_name(fq_name) {
            return name.to_string();
        }
        if let Some(name) = fq_name.strip_prefix(TARGET_CORE_PREFIX) {
            return name.to_string();
        }
        match class.and_then(|id| self.index.get(id)) {
            Some(info) => self.member_name(info).value(),
            None => fq_name.rsplit('.').next().unwrap_or(fq_name).to_string(),
        }
    }

    /// Type parameters with their first bound. The implicit `Any?` bound is
    /// left out.
    pub(super) fn type_parameters(&self, params: &[IrTypeParameter]) -> Vec<DartTypeParameter> {
        params
            .iter()
            .map(|tp| DartTypeParameter {
                name: tp.name.clone(),
                bound: tp
                    .bounds
                    .first()
                    .filter(|bound| !(bound.is(builtins::ANY) && bound.nullable))
                    .map(|bound| self.dart_type(bound)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrDeclaration, IrModule};
    use crate::translate::test_support::with_translator;

    fn named(ty: &DartTypeAnnotation) -> (&str, bool) {
        match ty {
            DartTypeAnnotation::Named { name, nullable, .. } => (name, *nullable),
            other => panic!("expected named type, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_types() {
        let module = IrModule::new("test");
        with_translator(&module, |t| {
            assert_eq!(named(&t.dart_type(&IrType::int())), ("int", false));
            assert_eq!(named(&t.dart_type(&IrType::builtin(builtins::LONG))), ("int", false));
            assert_eq!(named(&t.dart_type(&IrType::string().make_nullable())), ("String", true));
            assert_eq!(named(&t.dart_type(&IrType::any().make_nullable())), ("Object", true));
            assert_eq!(named(&t.dart_type(&IrType::nothing())), ("Never", false));
        });
    }

    #[test]
    fn test_unit_is_never_nullable() {
        let module = IrModule::new("test");
        with_translator(&module, |t| {
            assert!(t.dart_type(&IrType::unit().make_nullable()).is_void());
            assert_eq!(named(&t.dart_type(&IrType::dynamic())), ("dynamic", false));
        });
    }

    #[test]
    fn test_declared_class_uses_target_name() {
        let mut b = IrBuilder::new();
        let mut class = b.class("app.Secret");
        class.visibility = crate::ir::Visibility::Private;
        let ty = class.default_type();
        let mut file = b.file("app/Secret.kt", "app");
        file.declarations.push(IrDeclaration::Class(class));
        let mut module = IrModule::new("test");
        module.add_file(file);

        with_translator(&module, |t| {
            assert_eq!(named(&t.dart_type(&ty)), ("_Secret", false));
        });
    }

    #[test]
    fn test_generic_and_function_types() {
        let module = IrModule::new("test");
        let list = IrType::builtin("kotlin.collections.List").with_arguments(vec![IrType::int().make_nullable()]);
        let callback = IrType::function(vec![IrType::string()], IrType::unit());
        with_translator(&module, |t| {
            let DartTypeAnnotation::Named { type_arguments, .. } = t.dart_type(&list) else {
                panic!("expected named type");
            };
            assert_eq!(type_arguments.len(), 1);
            assert_eq!(named(&type_arguments[0]), ("int", true));

            let DartTypeAnnotation::Function { return_type, parameters, .. } = t.dart_type(&callback) else {
                panic!("expected function type");
            };
            assert!(return_type.is_void());
            assert_eq!(parameters.len(), 1);
        });
    }
}
