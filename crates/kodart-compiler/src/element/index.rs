//! Location-keyed lookup over dependency metadata.

use super::{DartClassElement, DartElement, DartFunctionElement, DartPackageElement, ElementLocation};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised while resolving target elements.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElementError {
    /// No dependency exposes an element at this location
    #[error("Target element not found: {location}")]
    NotFound { location: String },

    /// Two dependencies declare the same location
    #[error("Target element declared twice: {location}")]
    Duplicate { location: String },

    /// The element exists but is of a different kind than requested
    #[error("Target element {location} is a {found}, expected a {expected}")]
    WrongKind {
        location: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Flattened view of every element in a set of dependency packages.
#[derive(Debug, Default)]
pub struct ElementIndex<'a> {
    elements: FxHashMap<&'a ElementLocation, DartElement<'a>>,
}

impl<'a> ElementIndex<'a> {
    /// Index every element of the given packages.
    pub fn from_packages(packages: &'a [DartPackageElement]) -> Result<Self, ElementError> {
        let mut index = Self::default();
        for package in packages {
            for library in &package.libraries {
                index.insert(DartElement::Library(library))?;
                for unit in &library.units {
                    index.insert(DartElement::CompilationUnit(unit))?;
                    for class in &unit.classes {
                        index.insert_class(class)?;
                    }
                    for function in &unit.functions {
                        index.insert_function(function)?;
                    }
                }
            }
        }
        tracing::debug!(elements = index.len(), "indexed target elements");
        Ok(index)
    }

    fn insert_class(&mut self, class: &'a DartClassElement) -> Result<(), ElementError> {
        self.insert(DartElement::Class(class))?;
        for tp in &class.type_parameters {
            self.insert(DartElement::TypeParameter(tp))?;
        }
        for field in &class.fields {
            self.insert(DartElement::Field(field))?;
        }
        for accessor in &class.accessors {
            self.insert(DartElement::PropertyAccessor(accessor))?;
        }
        for constructor in &class.constructors {
            self.insert(DartElement::Constructor(constructor))?;
            for param in &constructor.parameters {
                self.insert(DartElement::Parameter(param))?;
            }
        }
        for method in &class.methods {
            self.insert_function(method)?;
        }
        Ok(())
    }

    fn insert_function(&mut self, function: &'a DartFunctionElement) -> Result<(), ElementError> {
        self.insert(DartElement::Function(function))?;
        for tp in &function.type_parameters {
            self.insert(DartElement::TypeParameter(tp))?;
        }
        for param in &function.parameters {
            self.insert(DartElement::Parameter(param))?;
        }
        Ok(())
    }

    fn insert(&mut self, element: DartElement<'a>) -> Result<(), ElementError> {
        let location = element.location();
        if self.elements.insert(location, element).is_some() {
            return Err(ElementError::Duplicate {
                location: location.to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the element at `location`.
    pub fn lookup(&self, location: &ElementLocation) -> Result<DartElement<'a>, ElementError> {
        self.elements
            .get(location)
            .copied()
            .ok_or_else(|| ElementError::NotFound {
                location: location.to_string(),
            })
    }

    /// Resolve a class element.
    pub fn class(&self, location: &ElementLocation) -> Result<&'a DartClassElement, ElementError> {
        match self.lookup(location)? {
            DartElement::Class(class) => Ok(class),
            other => Err(wrong_kind(location, "class", other)),
        }
    }

    /// Whether an element exists at `location`.
    pub fn contains(&self, location: &ElementLocation) -> bool {
        self.elements.contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn wrong_kind(location: &ElementLocation, expected: &'static str, found: DartElement<'_>) -> ElementError {
    let found = match found {
        DartElement::Library(_) => "library",
        DartElement::CompilationUnit(_) => "compilation unit",
        DartElement::Class(_) => "class",
        DartElement::Field(_) => "field",
        DartElement::PropertyAccessor(_) => "property accessor",
        DartElement::Constructor(_) => "constructor",
        DartElement::Function(_) => "function",
        DartElement::Parameter(_) => "parameter",
        DartElement::TypeParameter(_) => "type parameter",
    };
    ElementError::WrongKind {
        location: location.to_string(),
        expected,
        found,
    }
}
