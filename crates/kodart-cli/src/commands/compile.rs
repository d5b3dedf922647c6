//! `kodart compile` - Compile an IR module and write the Dart files.

use super::{load_input, report_failure, CompileOptions};
use crate::output;
use kodart_compiler::{format_output, write_output, Compiler};
use std::path::{Path, PathBuf};
use termcolor::ColorChoice;

/// Returns whether compilation succeeded.
pub fn execute(
    input: &Path,
    options: CompileOptions,
    out: Option<PathBuf>,
    format: bool,
    archive: Option<PathBuf>,
    color: ColorChoice,
) -> anyhow::Result<bool> {
    let mut config = options.load_config(input)?;
    if let Some(out) = out {
        config.output.dir = out;
    }
    if format {
        config.output.format = true;
    }
    if archive.is_some() {
        config.output.archive = archive;
    }

    let compiler = Compiler::new(config);
    let result = match compiler.compile(load_input(input)?) {
        Ok(result) => result,
        Err(error) => {
            report_failure(error, color)?;
            return Ok(false);
        }
    };
    output::print_diagnostics(&result.diagnostics, color)?;

    let dir = &compiler.config().output.dir;
    write_output(dir, &result)?;
    if compiler.config().output.format {
        format_output(dir)?;
    }
    output::print_success(
        &format!("Wrote {} file(s) to {}", result.files.len(), dir.display()),
        color,
    );
    Ok(true)
}
