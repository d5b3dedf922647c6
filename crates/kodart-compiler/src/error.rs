//! Compilation errors

use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::diagnostic::Diagnostic;
use crate::element::ElementError;
use crate::format::FormatError;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The program has error-severity diagnostics
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// Bug in the compiler
    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error("Target element error: {0}")]
    Element(#[from] ElementError),

    #[error("Formatter error: {0}")]
    Format(#[from] FormatError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compilation failed; carries every collected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Kind names of the error-severity diagnostics.
    pub fn kind_names(&self) -> BTreeSet<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.kind.name())
            .collect()
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.diagnostics.iter().filter(|d| d.is_error()).count();
        write!(
            f,
            "Compilation failed with {} error{}",
            errors,
            if errors == 1 { "" } else { "s" }
        )?;
        let names: Vec<&str> = self.kind_names().into_iter().collect();
        if !names.is_empty() {
            write!(f, ": {}", names.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilationError {}

/// An IR shape the translator has no mapping for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("Internal compiler error: no translation for {shape}")]
    NoMapping { shape: String },

    #[error("Internal compiler error: unresolved reference to {id}")]
    UnresolvedReference { id: crate::ir::NodeId },

    #[error("Internal compiler error: {message}")]
    Other { message: String },
}

impl InternalError {
    pub fn no_mapping(shape: impl Into<String>) -> Self {
        InternalError::NoMapping { shape: shape.into() }
    }
}
