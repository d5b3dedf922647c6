//! IR declarations

use super::expr::{IrExpr, IrStatement};
use super::types::IrType;
use super::NodeId;
use crate::element::ElementLocation;
use serde::{Deserialize, Serialize};

// ============================================================================
// Shared
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

impl Visibility {
    /// Private declarations get the target's private naming.
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    Final,
    Open,
    Abstract,
    Sealed,
}

/// Where a declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclOrigin {
    #[default]
    Source,
    /// Accessor synthesized by the front-end for a plain property
    DefaultAccessor,
    /// Created by a lowering
    Generated,
}

/// An annotation use, e.g. `@DartName("x")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrAnnotation {
    pub fq_name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl IrAnnotation {
    pub fn new(fq_name: impl Into<String>) -> Self {
        Self {
            fq_name: fq_name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }
}

/// Well-known dialect annotations.
pub mod annotations {
    pub const CONST: &str = "kodart.const";
    pub const DART_NAME: &str = "kodart.DartName";
    pub const DART_EXTENSION_NAME: &str = "kodart.DartExtensionName";
    pub const DART_POSITIONAL: &str = "kodart.DartPositional";
}

pub(crate) fn find_annotation<'a>(annotations: &'a [IrAnnotation], fq_name: &str) -> Option<&'a IrAnnotation> {
    annotations.iter().find(|a| a.fq_name == fq_name)
}

/// Statement list of a function or constructor body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrBody {
    pub statements: Vec<IrStatement>,
}

impl IrBody {
    pub fn new(statements: Vec<IrStatement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Any declaration that can appear in a file or class body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum IrDeclaration {
    Class(IrClass),
    Function(IrFunction),
    Constructor(IrConstructor),
    Property(IrProperty),
    Field(IrField),
    AnonymousInitializer(IrAnonymousInitializer),
    /// Target extension container; only produced by lowering
    Extension(IrExtension),
}

impl IrDeclaration {
    pub fn id(&self) -> NodeId {
        match self {
            IrDeclaration::Class(d) => d.id,
            IrDeclaration::Function(d) => d.id,
            IrDeclaration::Constructor(d) => d.id,
            IrDeclaration::Property(d) => d.id,
            IrDeclaration::Field(d) => d.id,
            IrDeclaration::AnonymousInitializer(d) => d.id,
            IrDeclaration::Extension(d) => d.id,
        }
    }

    /// Source name, if the declaration has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            IrDeclaration::Class(d) => Some(&d.name),
            IrDeclaration::Function(d) => Some(&d.name),
            IrDeclaration::Property(d) => Some(&d.name),
            IrDeclaration::Field(d) => Some(&d.name),
            IrDeclaration::Extension(d) => Some(&d.name),
            IrDeclaration::Constructor(_) | IrDeclaration::AnonymousInitializer(_) => None,
        }
    }

    pub fn is_external(&self) -> bool {
        match self {
            IrDeclaration::Class(d) => d.is_external,
            IrDeclaration::Function(d) => d.is_external,
            IrDeclaration::Constructor(d) => d.is_external,
            IrDeclaration::Property(d) => d.is_external,
            _ => false,
        }
    }

    /// Nested declarations, in source order.
    pub fn children_mut(&mut self) -> Option<&mut Vec<IrDeclaration>> {
        match self {
            IrDeclaration::Class(c) => Some(&mut c.declarations),
            IrDeclaration::Extension(e) => Some(&mut e.members),
            _ => None,
        }
    }
}

/// How a supertype is composed in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperTypeKind {
    /// `extends`
    Extends,
    /// `implements`
    Implements,
    /// `with`
    Mixin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrSuperType {
    pub ty: IrType,
    /// Decided by lowering; `None` until then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SuperTypeKind>,
    /// Arguments of a special inheritance marker, e.g. `Pigeon(Interface)`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<IrExpr>,
}

impl IrSuperType {
    pub fn new(ty: IrType) -> Self {
        Self {
            ty,
            kind: None,
            arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    /// `object Name`, a single instance
    Object,
    /// `companion object` nested in its owner class
    CompanionObject,
}

/// Entry of an enum class with its extra constructor arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrEnumEntry {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Option<IrExpr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrTypeParameter {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<IrType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrClass {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<NodeId>,
    pub name: String,
    /// Qualified name, e.g. `app.Test`
    pub fq_name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_external: bool,
    /// `data class`
    #[serde(default)]
    pub is_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementLocation>,
    #[serde(default)]
    pub type_parameters: Vec<IrTypeParameter>,
    /// Entries of an enum class, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_entries: Vec<IrEnumEntry>,
    #[serde(default)]
    pub super_types: Vec<IrSuperType>,
    #[serde(default)]
    pub declarations: Vec<IrDeclaration>,
    #[serde(default)]
    pub annotations: Vec<IrAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default)]
    pub origin: DeclOrigin,
}

impl IrClass {
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.modality == Modality::Abstract || self.is_interface()
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ClassKind::Object | ClassKind::CompanionObject)
    }

    pub fn primary_constructor(&self) -> Option<&IrConstructor> {
        self.declarations.iter().find_map(|d| match d {
            IrDeclaration::Constructor(c) if c.is_primary => Some(c),
            _ => None,
        })
    }

    pub fn primary_constructor_mut(&mut self) -> Option<&mut IrConstructor> {
        self.declarations.iter_mut().find_map(|d| match d {
            IrDeclaration::Constructor(c) if c.is_primary => Some(c),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &IrProperty> {
        self.declarations.iter().filter_map(|d| match d {
            IrDeclaration::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &IrFunction> {
        self.declarations.iter().filter_map(|d| match d {
            IrDeclaration::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn function_named(&self, name: &str) -> Option<&IrFunction> {
        self.functions().find(|f| f.name == name)
    }

    /// The class's own type, with its type parameters as arguments.
    pub fn default_type(&self) -> IrType {
        IrType::class(self.fq_name.clone(), self.id).with_arguments(
            self.type_parameters
                .iter()
                .map(|tp| IrType::type_parameter(tp.name.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrValueParameter {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<NodeId>,
    pub name: String,
    pub ty: IrType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<IrExpr>,
    #[serde(default)]
    pub is_vararg: bool,
    /// Property this constructor parameter declares (`class A(val x: Int)`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corresponding_property: Option<NodeId>,
    #[serde(default)]
    pub annotations: Vec<IrAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementLocation>,
}

impl IrValueParameter {
    pub fn has_annotation(&self, fq_name: &str) -> bool {
        find_annotation(&self.annotations, fq_name).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrFunction {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<NodeId>,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default)]
    pub is_override: bool,
    #[serde(default)]
    pub is_inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementLocation>,
    #[serde(default)]
    pub type_parameters: Vec<IrTypeParameter>,
    /// Receiver of an extension function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_receiver: Option<IrValueParameter>,
    #[serde(default)]
    pub parameters: Vec<IrValueParameter>,
    pub return_type: IrType,
    /// `None` for abstract and external functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<IrBody>,
    #[serde(default)]
    pub annotations: Vec<IrAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default)]
    pub origin: DeclOrigin,
}

impl IrFunction {
    pub fn has_annotation(&self, fq_name: &str) -> bool {
        find_annotation(&self.annotations, fq_name).is_some()
    }

    pub fn is_extension(&self) -> bool {
        self.extension_receiver.is_some()
    }

    /// `@const inline fun`: calls with constant arguments are replaced by
    /// the returned value.
    pub fn is_const_inline(&self) -> bool {
        self.is_inline && self.has_annotation(annotations::CONST)
    }
}

/// Target of the implicit or explicit `super(...)`/`this(...)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationKind {
    Super,
    This,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrDelegation {
    pub kind: DelegationKind,
    /// Constructor being delegated to; `None` for the root class's constructor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<NodeId>,
    #[serde(default)]
    pub arguments: Vec<Option<IrExpr>>,
}

/// Entry of the target's constructor initializer list (`: x = ...`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrFieldInitializer {
    pub property: NodeId,
    pub value: IrExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrConstructor {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<NodeId>,
    /// Class this constructor builds
    pub class: NodeId,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementLocation>,
    #[serde(default)]
    pub parameters: Vec<IrValueParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<IrDelegation>,
    #[serde(default)]
    pub initializer_list: Vec<IrFieldInitializer>,
    #[serde(default)]
    pub body: IrBody,
    #[serde(default)]
    pub annotations: Vec<IrAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Target named-constructor name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dart_name: Option<String>,
}

impl IrConstructor {
    pub fn has_annotation(&self, fq_name: &str) -> bool {
        find_annotation(&self.annotations, fq_name).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrField {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<NodeId>,
    pub name: String,
    pub ty: IrType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<IrExpr>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    /// Property this field backs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrProperty {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<NodeId>,
    pub name: String,
    pub ty: IrType,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub is_var: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_lateinit: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub is_override: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing_field: Option<IrField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<IrFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<IrFunction>,
    #[serde(default)]
    pub annotations: Vec<IrAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl IrProperty {
    /// Initializer of the backing field, if any.
    pub fn initializer(&self) -> Option<&IrExpr> {
        self.backing_field.as_ref().and_then(|f| f.initializer.as_ref())
    }

    /// A stored property whose accessors are the front-end defaults.
    pub fn is_simple(&self) -> bool {
        let default = |f: &Option<IrFunction>| f.as_ref().map_or(true, |f| f.origin == DeclOrigin::DefaultAccessor);
        self.backing_field.is_some() && default(&self.getter) && default(&self.setter)
    }

    pub fn is_abstract(&self) -> bool {
        self.modality == Modality::Abstract
    }
}

/// `init { ... }` block of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrAnonymousInitializer {
    pub id: NodeId,
    pub body: IrBody,
}

/// A target `extension Name on Type { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrExtension {
    pub id: NodeId,
    pub name: String,
    /// Whether `name` was synthesized rather than given explicitly
    #[serde(default)]
    pub is_generated_name: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub type_parameters: Vec<IrTypeParameter>,
    pub on: IrType,
    #[serde(default)]
    pub members: Vec<IrDeclaration>,
}
