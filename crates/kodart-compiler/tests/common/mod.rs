//! Shared helpers for integration tests

#![allow(dead_code)]

use kodart_compiler::ir::builder::IrBuilder;
use kodart_compiler::ir::{IrDeclaration, IrModule};
use kodart_compiler::{CompileError, CompileOutput, CompileResult, CompilationError, Compiler, CompilerConfig, CompilerInput};
use std::path::Path;

/// A module holding one source file with `declarations`.
pub fn module_of(b: &mut IrBuilder, path: &str, declarations: Vec<IrDeclaration>) -> IrModule {
    let mut file = b.file(path, "app");
    file.declarations = declarations;
    let mut module = IrModule::new("app");
    module.add_file(file);
    module
}

pub fn compile(module: IrModule) -> CompileResult<CompileOutput> {
    Compiler::new(CompilerConfig::default()).compile(CompilerInput::new(module))
}

/// Rendered text of the only output file.
pub fn compile_single(module: IrModule) -> String {
    let output = compile(module).expect("compilation failed");
    assert_eq!(output.files.len(), 1, "expected one file, got {:?}", output.files.keys());
    output.files.into_values().next().unwrap()
}

pub fn compile_failure(module: IrModule) -> CompilationError {
    match compile(module) {
        Err(CompileError::Compilation(error)) => error,
        Err(other) => panic!("expected diagnostics, got {}", other),
        Ok(output) => panic!("expected failure, got {:?}", output.files),
    }
}

pub fn file_text(output: &CompileOutput, path: &str) -> String {
    output.files.get(Path::new(path)).cloned().unwrap_or_default()
}
