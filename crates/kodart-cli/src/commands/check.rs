//! `kodart check` - Compile without writing output.

use super::{load_input, report_failure, CompileOptions};
use crate::output;
use kodart_compiler::Compiler;
use std::path::Path;
use termcolor::ColorChoice;

pub fn execute(input: &Path, options: CompileOptions, color: ColorChoice) -> anyhow::Result<bool> {
    let compiler = Compiler::new(options.load_config(input)?);
    match compiler.compile(load_input(input)?) {
        Ok(result) => {
            output::print_diagnostics(&result.diagnostics, color)?;
            output::print_success(&format!("{} file(s) OK", result.files.len()), color);
            Ok(true)
        }
        Err(error) => {
            report_failure(error, color)?;
            Ok(false)
        }
    }
}
