use crate::attributes::keys;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{IrExpr, IrExprKind};
use crate::lower::{ExpressionTransformer, LoweringContext};

/// References to objects and enum entries become reads of the static
/// properties that hold them.
pub struct ObjectReferences;

impl ExpressionTransformer for ObjectReferences {
    fn name(&self) -> &'static str {
        "object-references"
    }

    fn transform_expression(&self, expr: &mut IrExpr, cx: &mut LoweringContext<'_>) {
        let property = match expr.kind {
            IrExprKind::GetObject { class } => match cx.attributes.get(&class, keys::OBJECT_INSTANCE) {
                Some(instance) => *instance,
                None => {
                    let name = cx.index.get(class).map(|info| info.name.clone()).unwrap_or_default();
                    cx.report(Diagnostic::new(
                        DiagnosticKind::UnsupportedConstruct,
                        format!("'{}' is referenced as an object but is not one", name),
                    ));
                    return;
                }
            },
            IrExprKind::GetEnumEntry { entry } => entry,
            _ => return,
        };
        expr.kind = IrExprKind::GetProperty {
            property,
            receiver: None,
            null_aware: false,
        };
    }
}
