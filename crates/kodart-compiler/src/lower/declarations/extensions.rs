//! Extensions
//!
//! File-level extension functions and extension properties are grouped into
//! target extension declarations, one per receiver type and visibility.
//! `@DartExtensionName` picks the extension's name; otherwise it gets a
//! generated one that is stable for the same file and receiver.

use crate::ir::visit::for_each_expr_in_statements_mut;
use crate::ir::{
    annotations, find_annotation, IrDeclaration, IrExpr, IrExprKind, IrExtension, IrFunction, IrType, IrTypeKind,
    IrTypeParameter, NodeId, Visibility,
};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use sha2::{Digest, Sha256};

pub struct Extensions;

const GENERATED_PREFIX: &str = "Extensions$";
const HASH_LEN: usize = 16;

impl DeclarationLowering for Extensions {
    fn name(&self) -> &'static str {
        "extensions"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        if !cx.is_top_level() {
            return Transformation::NoChange;
        }
        let (receiver, visibility, explicit) = match decl {
            IrDeclaration::Function(f) => match &f.extension_receiver {
                Some(r) => (r.ty.clone(), f.visibility, explicit_name(&f.annotations)),
                None => return Transformation::NoChange,
            },
            IrDeclaration::Property(p) => match p.getter.as_ref().and_then(|g| g.extension_receiver.as_ref()) {
                Some(r) => (r.ty.clone(), p.visibility, explicit_name(&p.annotations)),
                None => return Transformation::NoChange,
            },
            _ => return Transformation::NoChange,
        };

        let (name, is_generated_name) = match explicit {
            Some(name) => (name, false),
            None => (generated_name(cx.file_path(), &receiver, visibility), true),
        };
        let extension_id = match find_extension(cx.pending_mut(), &name) {
            Some(id) => id,
            None => {
                let id = cx.builder.fresh();
                tracing::trace!(extension = %name, on = %receiver, "new extension");
                cx.add_file_declaration(IrDeclaration::Extension(IrExtension {
                    id,
                    name: name.clone(),
                    is_generated_name,
                    visibility: if visibility.is_private() { Visibility::Private } else { Visibility::Public },
                    type_parameters: Vec::new(),
                    on: receiver.clone(),
                    members: Vec::new(),
                }));
                id
            }
        };

        let mut member = std::mem::replace(decl, placeholder(extension_id));
        let mut moved_type_parameters = Vec::new();
        match &mut member {
            IrDeclaration::Function(function) => {
                moved_type_parameters = take_receiver_type_parameters(function, &receiver);
                into_member(function, extension_id);
            }
            IrDeclaration::Property(property) => {
                for accessor in [&mut property.getter, &mut property.setter].into_iter().flatten() {
                    into_member(accessor, extension_id);
                }
            }
            _ => {}
        }

        if let Some(extension) = extension_mut(cx.pending_mut(), extension_id) {
            for tp in moved_type_parameters {
                if !extension.type_parameters.iter().any(|t| t.name == tp.name) {
                    extension.type_parameters.push(tp);
                }
            }
            extension.members.push(member);
        }
        Transformation::remove()
    }
}

fn explicit_name(annotations: &[crate::ir::IrAnnotation]) -> Option<String> {
    find_annotation(annotations, annotations::DART_EXTENSION_NAME)
        .and_then(|a| a.arguments.first())
        .cloned()
}

/// `Extensions$<hash>`, hashed over the file, receiver and privacy.
fn generated_name(file_path: &str, receiver: &IrType, visibility: Visibility) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update([0]);
    hasher.update(receiver.to_string().as_bytes());
    hasher.update([u8::from(visibility.is_private())]);
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", GENERATED_PREFIX, &digest[..HASH_LEN])
}

fn find_extension(pending: &[IrDeclaration], name: &str) -> Option<NodeId> {
    pending.iter().find_map(|d| match d {
        IrDeclaration::Extension(e) if e.name == name => Some(e.id),
        _ => None,
    })
}

fn extension_mut(pending: &mut [IrDeclaration], id: NodeId) -> Option<&mut IrExtension> {
    pending.iter_mut().find_map(|d| match d {
        IrDeclaration::Extension(e) if e.id == id => Some(e),
        _ => None,
    })
}

fn placeholder(id: NodeId) -> IrDeclaration {
    IrDeclaration::AnonymousInitializer(crate::ir::IrAnonymousInitializer {
        id,
        body: Default::default(),
    })
}

/// Type parameters the receiver type mentions belong to the extension.
fn take_receiver_type_parameters(function: &mut IrFunction, receiver: &IrType) -> Vec<IrTypeParameter> {
    let mut used = Vec::new();
    collect_type_parameter_names(receiver, &mut used);
    let (moved, kept) = std::mem::take(&mut function.type_parameters)
        .into_iter()
        .partition(|tp| used.contains(&tp.name));
    function.type_parameters = kept;
    moved
}

fn collect_type_parameter_names(ty: &IrType, out: &mut Vec<String>) {
    match &ty.kind {
        IrTypeKind::TypeParameter { name } => out.push(name.clone()),
        IrTypeKind::Class { arguments, .. } => {
            for arg in arguments {
                collect_type_parameter_names(arg, out);
            }
        }
        IrTypeKind::Function {
            parameters,
            return_type,
        } => {
            for p in parameters {
                collect_type_parameter_names(p, out);
            }
            collect_type_parameter_names(return_type, out);
        }
        IrTypeKind::Dynamic => {}
    }
}

/// Reads of the receiver parameter become `this`.
fn into_member(function: &mut IrFunction, extension: NodeId) {
    let Some(receiver) = function.extension_receiver.take() else {
        return;
    };
    let Some(body) = &mut function.body else {
        return;
    };
    for_each_expr_in_statements_mut(&mut body.statements, |expr: &mut IrExpr| {
        if expr.is_get_value(receiver.id) {
            expr.kind = IrExprKind::This { class: extension };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrAnnotation, IrStatement};
    use crate::lower::declarations::test_support::{module_with, run};
    use crate::lower::Pass;

    fn pass() -> Vec<Pass> {
        vec![Pass::Declaration(Box::new(Extensions))]
    }

    fn extension_function(b: &mut IrBuilder, name: &str, receiver: IrType) -> IrFunction {
        let receiver_param = b.value_parameter("<this>", receiver.clone());
        let read = b.get_param(&receiver_param);
        b.function(name, receiver)
            .with_extension_receiver(receiver_param)
            .body(vec![IrStatement::Return(Some(read))])
            .build()
    }

    fn extensions(module: &crate::ir::IrModule) -> Vec<&IrExtension> {
        module.files[0]
            .declarations
            .iter()
            .filter_map(|d| match d {
                IrDeclaration::Extension(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_functions_on_same_receiver_share_extension() {
        let mut b = IrBuilder::new();
        let first = extension_function(&mut b, "shout", IrType::string());
        let second = extension_function(&mut b, "whisper", IrType::string());
        let other = extension_function(&mut b, "twice", IrType::int());
        let mut module = module_with(
            &mut b,
            vec![
                IrDeclaration::Function(first),
                IrDeclaration::Function(second),
                IrDeclaration::Function(other),
            ],
        );

        run(pass(), &mut module);

        let extensions = extensions(&module);
        assert_eq!(module.files[0].declarations.len(), 2);
        assert_eq!(extensions.len(), 2);
        let on_string = extensions.iter().find(|e| e.on.is_string()).unwrap();
        assert_eq!(on_string.members.len(), 2);
        assert!(on_string.is_generated_name);
        assert!(on_string.name.starts_with(GENERATED_PREFIX));

        let IrDeclaration::Function(shout) = &on_string.members[0] else {
            panic!("expected function");
        };
        assert!(shout.extension_receiver.is_none());
        let IrStatement::Return(Some(value)) = &shout.body.as_ref().unwrap().statements[0] else {
            panic!("expected return");
        };
        assert_eq!(value.kind, IrExprKind::This { class: on_string.id });
    }

    #[test]
    fn test_explicit_name() {
        let mut b = IrBuilder::new();
        let mut function = extension_function(&mut b, "shout", IrType::string());
        function
            .annotations
            .push(IrAnnotation::new(annotations::DART_EXTENSION_NAME).with_argument("Loud"));
        let mut module = module_with(&mut b, vec![IrDeclaration::Function(function)]);

        run(pass(), &mut module);

        let extensions = extensions(&module);
        assert_eq!(extensions[0].name, "Loud");
        assert!(!extensions[0].is_generated_name);
    }

    #[test]
    fn test_generated_name_is_stable() {
        let a = generated_name("app/Test.kt", &IrType::string(), Visibility::Public);
        let b = generated_name("app/Test.kt", &IrType::string(), Visibility::Public);
        let private = generated_name("app/Test.kt", &IrType::string(), Visibility::Private);
        assert_eq!(a, b);
        assert_ne!(a, private);
        assert_eq!(a.len(), GENERATED_PREFIX.len() + HASH_LEN);
    }

    #[test]
    fn test_receiver_type_parameter_moves() {
        let mut b = IrBuilder::new();
        let receiver = IrType::builtin("kotlin.collections.List").with_arguments(vec![IrType::type_parameter("T")]);
        let mut function = extension_function(&mut b, "second", receiver);
        let t = b.type_parameter("T");
        let r = b.type_parameter("R");
        function.type_parameters = vec![t, r];
        let mut module = module_with(&mut b, vec![IrDeclaration::Function(function)]);

        run(pass(), &mut module);

        let extension = extensions(&module)[0];
        assert_eq!(extension.type_parameters.len(), 1);
        assert_eq!(extension.type_parameters[0].name, "T");
        let IrDeclaration::Function(member) = &extension.members[0] else {
            panic!("expected function");
        };
        assert_eq!(member.type_parameters.len(), 1);
        assert_eq!(member.type_parameters[0].name, "R");
    }
}
