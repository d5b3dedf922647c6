//! Compiler driver
//!
//! Runs one compilation end to end:
//!
//! 1. upstream diagnostics pass the suppressor table
//! 2. the archive is serialized, if configured, before the IR is rewritten
//! 3. the lowering pipeline runs to completion
//! 4. error diagnostics fail the whole compilation; otherwise every file is
//!    translated and rendered
//!
//! Nothing is written to disk by [`Compiler::compile`]. Callers write the
//! returned files and archive with [`write_output`], so a failed
//! compilation never leaves partial output behind.

use crate::analyze::{admit_upstream, UpstreamDiagnostic};
use crate::archive::{archive_to_string, write_archive_text};
use crate::attributes::AttributeStore;
use crate::config::CompilerConfig;
use crate::diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticKind};
use crate::element::{DartPackageElement, ElementIndex};
use crate::error::{CompilationError, CompileResult};
use crate::format::DartFormatter;
use crate::ir::{DeclIndex, IrModule};
use crate::lower::{LoweringContext, Pipeline};
use crate::render::render;
use crate::translate::names::output_path;
use crate::translate::Translator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one compilation reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerInput {
    /// The resolved module
    pub module: IrModule,
    /// Target element metadata of the dependencies
    #[serde(default)]
    pub packages: Vec<DartPackageElement>,
    /// Diagnostics reported by the front-end
    #[serde(default)]
    pub upstream: Vec<UpstreamDiagnostic>,
}

impl CompilerInput {
    pub fn new(module: IrModule) -> Self {
        Self {
            module,
            packages: Vec::new(),
            upstream: Vec::new(),
        }
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// Rendered source by output path, relative to the output directory
    pub files: BTreeMap<PathBuf, String>,
    /// Warnings and infos collected along the way
    pub diagnostics: Vec<Diagnostic>,
    /// Archive destination and the document taken before lowering
    pub archive: Option<(PathBuf, String)>,
}

pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a module into rendered target files.
    pub fn compile(&self, input: CompilerInput) -> CompileResult<CompileOutput> {
        let CompilerInput {
            mut module,
            packages,
            upstream,
        } = input;
        let _span = tracing::info_span!("compile", module = %module.name).entered();

        let elements = ElementIndex::from_packages(&packages)?;
        let mut diagnostics = DiagnosticCollector::with_config(self.config.diagnostics.clone());
        admit_upstream(upstream, &self.config.dialect, &mut diagnostics);

        let archive = match &self.config.output.archive {
            Some(path) => Some((path.clone(), archive_to_string(&module)?)),
            None => None,
        };

        let mut attributes = AttributeStore::new();
        {
            let mut cx = LoweringContext::new(&module, &mut attributes, &mut diagnostics, &elements, &self.config);
            Pipeline::standard().run(&mut module, &mut cx);
        }

        let paths = check_output_paths(&module, &mut diagnostics);
        if diagnostics.has_errors() {
            tracing::debug!(errors = diagnostics.error_count(), "compilation failed");
            return Err(CompilationError::new(diagnostics.into_diagnostics()).into());
        }

        let _span = tracing::info_span!("generate").entered();
        let index = DeclIndex::build(&module);
        let mut translator = Translator::new(&module, &index, &attributes, &elements);
        let mut files = BTreeMap::new();
        for (file, path) in module.files.iter().zip(paths) {
            let unit = translator.translate_file(file)?;
            let text = render(&unit);
            tracing::debug!(path = %path.display(), bytes = text.len(), "rendered file");
            files.insert(path, text);
        }

        Ok(CompileOutput {
            files,
            diagnostics: diagnostics.into_diagnostics(),
            archive,
        })
    }
}

/// Output path of every source file, in file order. Two files landing on
/// the same path is an error.
fn check_output_paths(module: &IrModule, diagnostics: &mut DiagnosticCollector) -> Vec<PathBuf> {
    let mut owners: BTreeMap<PathBuf, &str> = BTreeMap::new();
    let mut paths = Vec::with_capacity(module.files.len());
    for file in &module.files {
        let path = output_path(file);
        if let Some(previous) = owners.insert(path.clone(), &file.path) {
            diagnostics.report(
                Diagnostic::new(
                    DiagnosticKind::DuplicateOutputPath,
                    format!("`{}` and `{}` both compile to `{}`", previous, file.path, path.display()),
                )
                .in_file(file.path.clone()),
            );
        }
        paths.push(path);
    }
    paths
}

/// Write every file of `output` under `dir`, then the archive at its
/// configured path.
pub fn write_output(dir: &Path, output: &CompileOutput) -> CompileResult<()> {
    for (path, text) in &output.files {
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, text)?;
        tracing::debug!(path = %target.display(), "wrote file");
    }
    if let Some((path, text)) = &output.archive {
        write_archive_text(text, path)?;
    }
    Ok(())
}

/// Run the external formatter over `dir`.
pub fn format_output(dir: &Path) -> CompileResult<()> {
    DartFormatter::locate()?.format(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrDeclaration, IrType};

    fn module_with_files(paths: &[&str]) -> IrModule {
        let mut b = IrBuilder::new();
        let mut module = IrModule::new("app");
        for (i, path) in paths.iter().enumerate() {
            let function = b.function(&format!("f{}", i), IrType::unit()).body(Vec::new()).build();
            let mut file = b.file(path, "app");
            file.declarations.push(IrDeclaration::Function(function));
            module.add_file(file);
        }
        module
    }

    #[test]
    fn test_duplicate_output_path() {
        let compiler = Compiler::new(CompilerConfig::default());
        let module = module_with_files(&["app/MyThing.kt", "app/my_thing.kt"]);
        let err = compiler.compile(CompilerInput::new(module)).unwrap_err();
        let crate::error::CompileError::Compilation(err) = err else {
            panic!("expected compilation error, got {:?}", err);
        };
        assert!(err.kind_names().contains("DUPLICATE_OUTPUT_PATH"));
    }

    #[test]
    fn test_output_paths() {
        let compiler = Compiler::new(CompilerConfig::default());
        let module = module_with_files(&["app/MyThing.kt", "Main.kt"]);
        let output = compiler.compile(CompilerInput::new(module)).unwrap();
        let paths: Vec<&Path> = output.files.keys().map(PathBuf::as_path).collect();
        assert_eq!(paths, vec![Path::new("lib/app/my_thing.dart"), Path::new("lib/main.dart")]);
        assert_eq!(output.files[Path::new("lib/main.dart")], "void f1() {}\n");
    }

    #[test]
    fn test_archive_taken_before_lowering() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.klib.json");
        let mut config = CompilerConfig::default();
        config.output.archive = Some(archive.clone());
        let module = module_with_files(&["app/A.kt"]);
        let output = Compiler::new(config).compile(CompilerInput::new(module.clone())).unwrap();
        assert!(!archive.exists());

        write_output(&dir.path().join("out"), &output).unwrap();
        assert_eq!(crate::archive::read_archive(&archive).unwrap(), module);
    }

    #[test]
    fn test_failed_compilation_leaves_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.klib.json");
        let mut config = CompilerConfig::default();
        config.output.archive = Some(archive.clone());
        let module = module_with_files(&["app/MyThing.kt", "app/my_thing.kt"]);
        assert!(Compiler::new(config).compile(CompilerInput::new(module)).is_err());
        assert!(!archive.exists());
    }

    #[test]
    fn test_write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = CompileOutput {
            files: BTreeMap::from([(PathBuf::from("lib/a/b.dart"), "void main() {}\n".to_string())]),
            diagnostics: Vec::new(),
            archive: None,
        };
        write_output(dir.path(), &output).unwrap();
        let text = fs::read_to_string(dir.path().join("lib/a/b.dart")).unwrap();
        assert_eq!(text, "void main() {}\n");
    }
}
