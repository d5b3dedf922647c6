//! IR types
//!
//! Source-language types as the front-end resolved them. Builtin classes are
//! identified by their fully qualified name; declared classes additionally
//! carry the id of their declaration.

use super::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified names of builtin classes the lowering cares about.
pub mod builtins {
    pub const ANY: &str = "kotlin.Any";
    pub const UNIT: &str = "kotlin.Unit";
    pub const NOTHING: &str = "kotlin.Nothing";
    pub const BOOLEAN: &str = "kotlin.Boolean";
    pub const STRING: &str = "kotlin.String";
    pub const CHAR: &str = "kotlin.Char";
    pub const BYTE: &str = "kotlin.Byte";
    pub const SHORT: &str = "kotlin.Short";
    pub const INT: &str = "kotlin.Int";
    pub const LONG: &str = "kotlin.Long";
    pub const FLOAT: &str = "kotlin.Float";
    pub const DOUBLE: &str = "kotlin.Double";
    pub const NUMBER: &str = "kotlin.Number";
    pub const THROWABLE: &str = "kotlin.Throwable";
    pub const ENUM: &str = "kotlin.Enum";
    pub const ITERATOR: &str = "kotlin.collections.Iterator";
    pub const DART_ITERATOR: &str = "dart.core.Iterator";

    /// Special inheritance markers
    pub const INTERFACE_MARKER: &str = "kodart.Interface";
    pub const MIXIN_MARKER: &str = "kodart.Mixin";
    pub const INTERFACE_OR_MIXIN_MARKER: &str = "kodart.InterfaceOrMixin";

    pub const INTEGRAL: &[&str] = &[BYTE, SHORT, INT, LONG];
    pub const NUMERIC: &[&str] = &[BYTE, SHORT, INT, LONG, FLOAT, DOUBLE, NUMBER];
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrType {
    pub kind: IrTypeKind,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrTypeKind {
    /// A class type, builtin or declared
    Class {
        fq_name: String,
        /// Declaration of the class, `None` for builtins
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<NodeId>,
        #[serde(default)]
        arguments: Vec<IrType>,
    },
    /// Reference to a type parameter in scope
    TypeParameter { name: String },
    Function {
        parameters: Vec<IrType>,
        return_type: Box<IrType>,
    },
    /// The target's `dynamic`; only introduced by lowerings
    Dynamic,
}

impl IrType {
    /// A builtin class type without arguments.
    pub fn builtin(fq_name: &str) -> Self {
        Self {
            kind: IrTypeKind::Class {
                fq_name: fq_name.to_string(),
                class: None,
                arguments: Vec::new(),
            },
            nullable: false,
        }
    }

    /// A declared class type.
    pub fn class(fq_name: impl Into<String>, class: NodeId) -> Self {
        Self {
            kind: IrTypeKind::Class {
                fq_name: fq_name.into(),
                class: Some(class),
                arguments: Vec::new(),
            },
            nullable: false,
        }
    }

    pub fn type_parameter(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::TypeParameter { name: name.into() },
            nullable: false,
        }
    }

    pub fn function(parameters: Vec<IrType>, return_type: IrType) -> Self {
        Self {
            kind: IrTypeKind::Function {
                parameters,
                return_type: Box::new(return_type),
            },
            nullable: false,
        }
    }

    pub fn dynamic() -> Self {
        Self {
            kind: IrTypeKind::Dynamic,
            nullable: true,
        }
    }

    pub fn int() -> Self {
        Self::builtin(builtins::INT)
    }

    pub fn double() -> Self {
        Self::builtin(builtins::DOUBLE)
    }

    pub fn boolean() -> Self {
        Self::builtin(builtins::BOOLEAN)
    }

    pub fn string() -> Self {
        Self::builtin(builtins::STRING)
    }

    pub fn unit() -> Self {
        Self::builtin(builtins::UNIT)
    }

    pub fn nothing() -> Self {
        Self::builtin(builtins::NOTHING)
    }

    pub fn any() -> Self {
        Self::builtin(builtins::ANY)
    }

    /// Add type arguments (class types only).
    pub fn with_arguments(mut self, args: Vec<IrType>) -> Self {
        if let IrTypeKind::Class { arguments, .. } = &mut self.kind {
            *arguments = args;
        }
        self
    }

    pub fn make_nullable(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            nullable: true,
        }
    }

    pub fn make_not_null(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            nullable: false,
        }
    }

    /// Fully qualified class name, if this is a class type.
    pub fn fq_name(&self) -> Option<&str> {
        match &self.kind {
            IrTypeKind::Class { fq_name, .. } => Some(fq_name),
            _ => None,
        }
    }

    /// Declaration of the class, if this is a declared class type.
    pub fn class_id(&self) -> Option<NodeId> {
        match &self.kind {
            IrTypeKind::Class { class, .. } => *class,
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[IrType] {
        match &self.kind {
            IrTypeKind::Class { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// Simple name of a class type (last segment of the qualified name).
    pub fn simple_name(&self) -> Option<&str> {
        self.fq_name().map(|fq| fq.rsplit('.').next().unwrap_or(fq))
    }

    pub fn is(&self, fq_name: &str) -> bool {
        self.fq_name() == Some(fq_name)
    }

    pub fn is_unit(&self) -> bool {
        self.is(builtins::UNIT)
    }

    pub fn is_nothing(&self) -> bool {
        self.is(builtins::NOTHING)
    }

    pub fn is_boolean(&self) -> bool {
        self.is(builtins::BOOLEAN)
    }

    pub fn is_string(&self) -> bool {
        self.is(builtins::STRING)
    }

    pub fn is_integral(&self) -> bool {
        self.fq_name().is_some_and(|n| builtins::INTEGRAL.contains(&n))
    }

    pub fn is_numeric(&self) -> bool {
        self.fq_name().is_some_and(|n| builtins::NUMERIC.contains(&n))
    }

    /// Types the target implements natively and which cannot be implemented
    /// by user classes.
    pub fn is_target_core_primitive(&self) -> bool {
        self.is_numeric() || self.is_boolean() || self.is_string() || self.is(builtins::CHAR)
    }

    pub fn is_special_inheritance_marker(&self) -> bool {
        matches!(
            self.fq_name(),
            Some(builtins::INTERFACE_MARKER | builtins::MIXIN_MARKER | builtins::INTERFACE_OR_MIXIN_MARKER)
        )
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, IrTypeKind::Dynamic)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IrTypeKind::Class { fq_name, arguments, .. } => {
                write!(f, "{}", fq_name)?;
                if !arguments.is_empty() {
                    let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
            }
            IrTypeKind::TypeParameter { name } => write!(f, "{}", name)?,
            IrTypeKind::Function {
                parameters,
                return_type,
            } => {
                let params: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
                write!(f, "({}) -> {}", params.join(", "), return_type)?;
            }
            IrTypeKind::Dynamic => return write!(f, "dynamic"),
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}
