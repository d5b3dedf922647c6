//! Kodart Compiler - Kotlin IR to Dart source
//!
//! Takes a resolved, type-checked IR module and produces Dart source files.
//!
//! # Pipeline
//!
//! - [`lower`] - semantics-preserving IR rewrites, interleaved with the
//!   [`analyze`] checkers
//! - [`translate`] - lowered IR to the target AST in [`dart`]
//! - [`render`] - target AST to text
//!
//! Lowering facts that have no place in the IR itself live in the
//! [`attributes`] store. Dependencies are described by the [`element`]
//! model. [`compiler::Compiler`] drives one compilation.

pub mod analyze;
pub mod archive;
pub mod attributes;
pub mod compiler;
pub mod config;
pub mod dart;
pub mod diagnostic;
pub mod element;
pub mod error;
pub mod format;
pub mod ir;
pub mod lower;
pub mod render;
pub mod translate;

pub use analyze::{DiagnosticParameter, UpstreamDiagnostic};
pub use archive::{read_archive, write_archive, ArchiveError};
pub use compiler::{format_output, write_output, CompileOutput, Compiler, CompilerInput};
pub use config::{CompilerConfig, ConfigError, CONFIG_FILE_NAME};
pub use diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticKind, Severity};
pub use element::{DartPackageElement, ElementError, ElementIndex, ElementLocation};
pub use error::{CompilationError, CompileError, CompileResult, InternalError};
pub use format::{DartFormatter, FormatError};
pub use ir::IrModule;
pub use render::render;
