//! Target element model
//!
//! A read-only schema mirror of already-compiled Dart libraries. Dependency
//! metadata is loaded once into these types and then only looked up, by
//! [`ElementLocation`], through an [`ElementIndex`].
//!
//! Every element is immutable and compares by value.

mod index;
mod location;

pub use index::{ElementError, ElementIndex};
pub use location::ElementLocation;

use serde::{Deserialize, Serialize};

// ============================================================================
// Containers
// ============================================================================

/// Root of a dependency's metadata: every library the package exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DartPackageElement {
    /// Package name, e.g. "meta"
    #[serde(default)]
    pub name: String,
    /// Exposed libraries
    #[serde(default)]
    pub libraries: Vec<DartLibraryElement>,
}

/// A Dart library, e.g. `package:meta/meta.dart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartLibraryElement {
    pub location: ElementLocation,
    /// Import URI of the library
    pub uri: String,
    #[serde(default)]
    pub units: Vec<DartCompilationUnitElement>,
}

/// A single compilation unit (part) of a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartCompilationUnitElement {
    pub location: ElementLocation,
    #[serde(default)]
    pub classes: Vec<DartClassElement>,
    #[serde(default)]
    pub functions: Vec<DartFunctionElement>,
}

// ============================================================================
// Declarations
// ============================================================================

/// A class (or implicit interface) declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartClassElement {
    pub location: ElementLocation,
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<DartTypeParameterElement>,
    #[serde(default)]
    pub is_abstract: bool,
    /// Whether the class can be used as a mixin
    #[serde(default)]
    pub is_mixin: bool,
    #[serde(default)]
    pub fields: Vec<DartFieldElement>,
    #[serde(default)]
    pub accessors: Vec<DartPropertyAccessorElement>,
    #[serde(default)]
    pub constructors: Vec<DartConstructorElement>,
    #[serde(default)]
    pub methods: Vec<DartFunctionElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartTypeParameterElement {
    pub location: ElementLocation,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<DartType>,
}

/// A field, either instance or static.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartFieldElement {
    pub location: ElementLocation,
    pub name: String,
    pub ty: DartType,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_covariant: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_late: bool,
    #[serde(default)]
    pub is_static: bool,
}

/// Getter or setter of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartPropertyAccessorElement {
    pub location: ElementLocation,
    pub name: String,
    pub ty: DartType,
    pub is_getter: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Location of the field this accessor reads or writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_location: Option<ElementLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartConstructorElement {
    pub location: ElementLocation,
    /// Empty for the unnamed constructor
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub parameters: Vec<DartParameterElement>,
}

/// A top-level function or a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartFunctionElement {
    pub location: ElementLocation,
    pub name: String,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_generator: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default)]
    pub parameters: Vec<DartParameterElement>,
    #[serde(default)]
    pub type_parameters: Vec<DartTypeParameterElement>,
    pub return_type: DartType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DartParameterElement {
    pub location: ElementLocation,
    /// Empty when the parameter belongs to a function type
    #[serde(default)]
    pub name: String,
    pub ty: DartType,
    #[serde(default)]
    pub is_covariant: bool,
    #[serde(default)]
    pub is_named: bool,
    #[serde(default)]
    pub is_required: bool,
    /// Set for initializing formals (`this.field`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_location: Option<ElementLocation>,
}

impl DartParameterElement {
    pub fn is_positional(&self) -> bool {
        !self.is_named
    }

    pub fn is_optional(&self) -> bool {
        !self.is_required
    }
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DartType {
    /// A class or interface type, e.g. `List<int>?`
    Interface {
        element: ElementLocation,
        #[serde(default)]
        type_arguments: Vec<DartType>,
        #[serde(default)]
        nullable: bool,
    },
    Function {
        return_type: Box<DartType>,
        #[serde(default)]
        parameters: Vec<DartType>,
        #[serde(default)]
        nullable: bool,
    },
    TypeParameter {
        name: String,
        #[serde(default)]
        nullable: bool,
    },
    Dynamic,
    Never,
    Void,
}

impl DartType {
    pub fn is_nullable(&self) -> bool {
        match self {
            DartType::Interface { nullable, .. }
            | DartType::Function { nullable, .. }
            | DartType::TypeParameter { nullable, .. } => *nullable,
            DartType::Dynamic | DartType::Void => true,
            DartType::Never => false,
        }
    }
}

/// Any element reachable by location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DartElement<'a> {
    Library(&'a DartLibraryElement),
    CompilationUnit(&'a DartCompilationUnitElement),
    Class(&'a DartClassElement),
    Field(&'a DartFieldElement),
    PropertyAccessor(&'a DartPropertyAccessorElement),
    Constructor(&'a DartConstructorElement),
    Function(&'a DartFunctionElement),
    Parameter(&'a DartParameterElement),
    TypeParameter(&'a DartTypeParameterElement),
}

impl<'a> DartElement<'a> {
    pub fn location(&self) -> &'a ElementLocation {
        match self {
            DartElement::Library(e) => &e.location,
            DartElement::CompilationUnit(e) => &e.location,
            DartElement::Class(e) => &e.location,
            DartElement::Field(e) => &e.location,
            DartElement::PropertyAccessor(e) => &e.location,
            DartElement::Constructor(e) => &e.location,
            DartElement::Function(e) => &e.location,
            DartElement::Parameter(e) => &e.location,
            DartElement::TypeParameter(e) => &e.location,
        }
    }

    /// Whether the element is a const declaration (constructors and fields).
    pub fn is_const(&self) -> bool {
        match self {
            DartElement::Constructor(c) => c.is_const,
            DartElement::Field(f) => f.is_const,
            _ => false,
        }
    }

    /// Parameters of an executable element, empty otherwise.
    pub fn parameters(&self) -> &'a [DartParameterElement] {
        match self {
            DartElement::Constructor(c) => &c.parameters,
            DartElement::Function(f) => &f.parameters,
            _ => &[],
        }
    }
}
