//! Intermediate Representation (IR)
//!
//! The resolved, type-checked program as handed over by the front-end, plus
//! the handful of node kinds only lowerings produce.
//!
//! # Structure
//!
//! - `IrModule` - Source files and dependency stubs of one compilation
//! - `IrFile` - Top-level declarations of one source file
//! - `IrDeclaration` - Classes, functions, constructors, properties, fields
//! - `IrStatement` / `IrExpr` - Bodies
//! - `DeclIndex` - Id-keyed summaries of every declaration
//!
//! Every node carries a [`NodeId`]. Identity, not structure, is what
//! distinguishes nodes: two equal-looking nodes with different ids are
//! different entities.

pub mod builder;
pub mod copy;
pub mod decl;
pub mod expr;
pub mod index;
pub mod module;
pub mod types;
pub mod visit;

pub use decl::{
    annotations, ClassKind, DeclOrigin, DelegationKind, IrAnnotation, IrAnonymousInitializer, IrBody, IrClass,
    IrConstructor, IrDeclaration, IrDelegation, IrEnumEntry, IrExtension, IrField, IrFieldInitializer,
    IrFunction, IrProperty, IrSuperType, IrTypeParameter, IrValueParameter, Modality,
    SuperTypeKind, Visibility,
};
pub(crate) use decl::find_annotation;
pub use expr::{
    BlockOrigin, CallOrigin, Callee, IrBinaryOp, IrBlock, IrBranch, IrCall, IrCatch, IrConst,
    IrConstructorCall, IrExpr, IrExprKind, IrStatement, IrTry, IrUnaryOp, IrVariable, IrWhen,
    TypeOperator, VariableOrigin, WhenOrigin,
};
pub use index::{DeclIndex, DeclInfo, DeclKind, FileInfo};
pub use module::{IrFile, IrModule};
pub use types::{builtins, IrType, IrTypeKind};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an IR node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocator of fresh node ids for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue allocating after `id`.
    pub fn starting_after(id: NodeId) -> Self {
        Self { next: id.0 + 1 }
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Make sure ids handed out from now on are greater than `id`.
    pub fn reserve(&mut self, id: NodeId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }
}
