use crate::ir::visit::for_each_expr_mut;
use crate::ir::{IrDeclaration, IrExprKind, IrType, NodeId};
use crate::lower::{DeclarationLowering, LoweringContext, Transformation};
use rustc_hash::FxHashMap;

/// In constructor default values, a parameter that declares a property is
/// read through the property instead.
pub struct DefaultValueRemapping;

impl DeclarationLowering for DefaultValueRemapping {
    fn name(&self) -> &'static str {
        "default-value-remapping"
    }

    fn lower(&self, decl: &mut IrDeclaration, cx: &mut LoweringContext<'_>) -> Transformation<IrDeclaration> {
        let IrDeclaration::Constructor(constructor) = decl else {
            return Transformation::NoChange;
        };
        let declared: FxHashMap<NodeId, NodeId> = constructor
            .parameters
            .iter()
            .filter_map(|p| p.corresponding_property.map(|prop| (p.id, prop)))
            .collect();
        if declared.is_empty() {
            return Transformation::NoChange;
        }

        let class = constructor.class;
        let this_type = cx
            .index
            .get(class)
            .and_then(|info| info.ty.clone())
            .unwrap_or_else(IrType::any);

        for param in &mut constructor.parameters {
            let Some(default) = &mut param.default_value else {
                continue;
            };
            for_each_expr_mut(default, |expr| {
                let IrExprKind::GetValue { target } = expr.kind else {
                    return;
                };
                let Some(property) = declared.get(&target).copied() else {
                    return;
                };
                let this = cx.builder.this_of(class, this_type.clone());
                expr.kind = IrExprKind::GetProperty {
                    property,
                    receiver: Some(Box::new(this)),
                    null_aware: false,
                };
            });
        }
        Transformation::NoChange
    }
}
