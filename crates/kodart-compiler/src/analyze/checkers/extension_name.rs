//! Checker: extension-name
//!
//! Generated extension names are unstable across versions, so a public
//! package should name its public extensions explicitly.

use crate::analyze::checker::*;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::IrDeclaration;

pub struct ExtensionName;

static META: CheckerMeta = CheckerMeta {
    name: "extension-name",
    description: "Public extensions in public packages need an explicit name",
    kind: DiagnosticKind::ExtensionWithoutExplicitDartExtensionNameInPublicPackage,
};

impl Checker for ExtensionName {
    fn meta(&self) -> &CheckerMeta {
        &META
    }

    fn check_declaration(&self, decl: &IrDeclaration, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let IrDeclaration::Extension(extension) = decl else {
            return vec![];
        };
        if !ctx.config.package.public || !extension.is_generated_name || extension.visibility.is_private() {
            return vec![];
        }
        vec![ctx
            .report(
                &META,
                format!("Extension on '{}' has no explicit name in a public package", extension.on),
            )
            .with_note(format!("generated name: {}", extension.name))
            .with_note("add @DartExtensionName to keep the name stable")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::checkers::test_support::check;
    use crate::config::CompilerConfig;
    use crate::diagnostic::Severity;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrExtension, IrModule, IrType, Visibility};

    fn module(b: &mut IrBuilder, generated: bool, visibility: Visibility) -> IrModule {
        let extension = IrExtension {
            id: b.fresh(),
            name: if generated { "$Extensions$abc123".to_string() } else { "Strings".to_string() },
            is_generated_name: generated,
            visibility,
            type_parameters: vec![],
            on: IrType::string(),
            members: vec![],
        };
        let mut file = b.file("app/Ext.kt", "app");
        file.declarations.push(IrDeclaration::Extension(extension));
        let mut module = IrModule::new("test");
        module.add_file(file);
        module
    }

    fn public_config() -> CompilerConfig {
        let mut config = CompilerConfig::default();
        config.package.public = true;
        config
    }

    #[test]
    fn test_generated_public_warns() {
        let mut b = IrBuilder::new();
        let m = module(&mut b, true, Visibility::Public);
        let diags = check(Box::new(ExtensionName), &m, &public_config());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn test_silent_cases() {
        let mut b = IrBuilder::new();
        let explicit = module(&mut b, false, Visibility::Public);
        assert!(check(Box::new(ExtensionName), &explicit, &public_config()).is_empty());

        let private = module(&mut b, true, Visibility::Private);
        assert!(check(Box::new(ExtensionName), &private, &public_config()).is_empty());

        let not_public = module(&mut b, true, Visibility::Public);
        assert!(check(Box::new(ExtensionName), &not_public, &CompilerConfig::default()).is_empty());
    }
}
