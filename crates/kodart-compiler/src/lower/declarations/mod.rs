//! Declaration lowerings
//!
//! Each lowering looks at one declaration at a time. The pipeline applies it
//! to every file-level declaration, then to the members of whatever it
//! returned.

mod const_annotations;
mod const_inline;
mod constructor_names;
mod data_classes;
mod default_values;
mod enums;
mod external;
mod extensions;
mod field_initializers;
mod imports;
mod init_blocks;
mod interfaces;
mod iterators;
mod meta_annotations;
mod objects;
mod parameters;
mod special_inheritance;

pub use const_annotations::AnnotateDartConst;
pub use const_inline::ConstInlineFunctions;
pub use constructor_names::SecondaryConstructorNames;
pub use data_classes::DataClasses;
pub use default_values::DefaultValueRemapping;
pub use enums::EnumClasses;
pub use external::ExternalDeclarations;
pub use extensions::Extensions;
pub use field_initializers::FieldInitializerPlacement;
pub use imports::Imports;
pub use init_blocks::InitBlocks;
pub use interfaces::InterfaceToAbstractClass;
pub use iterators::IteratorImplementations;
pub use meta_annotations::MetaAnnotations;
pub use objects::Objects;
pub use parameters::ComplexParameters;
pub use special_inheritance::SpecialInheritance;

use crate::ir::{IrConstructor, IrDeclaration};

/// Constructors of a class body, in order.
pub(crate) fn constructors_mut(declarations: &mut [IrDeclaration]) -> impl Iterator<Item = &mut IrConstructor> {
    declarations.iter_mut().filter_map(|d| match d {
        IrDeclaration::Constructor(c) => Some(c),
        _ => None,
    })
}
