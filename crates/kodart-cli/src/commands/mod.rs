//! Subcommands and the option handling they share.

pub mod check;
pub mod compile;
pub mod elements;

use anyhow::Context;
use clap::Args;
use kodart_compiler::{CompileError, CompilerConfig, CompilerInput, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Options of every command that runs the compiler.
#[derive(Debug, Clone, Default, Args)]
pub struct CompileOptions {
    /// Configuration file (default: kodart.toml next to the input)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Treat the package as publicly distributed
    #[arg(long)]
    pub public: bool,

    /// Emit @sealed / @nonVirtual annotations
    #[arg(long)]
    pub meta_annotations: bool,
}

impl CompileOptions {
    /// Configuration file contents with flags applied on top.
    pub fn load_config(&self, input: &Path) -> anyhow::Result<CompilerConfig> {
        let mut config = match &self.config {
            Some(path) => CompilerConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                let path = input.parent().unwrap_or(Path::new(".")).join(CONFIG_FILE_NAME);
                CompilerConfig::load_or_default(&path)?
            }
        };
        if self.public {
            config.package.public = true;
        }
        if self.meta_annotations {
            config.dialect.meta_annotations = true;
        }
        Ok(config)
    }
}

/// Read a serialized compiler input. A bare IR module is accepted too.
pub fn load_input(path: &Path) -> anyhow::Result<CompilerInput> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let input = if value.get("module").is_some() {
        serde_json::from_value(value)?
    } else {
        CompilerInput::new(serde_json::from_value(value)?)
    };
    Ok(input)
}

/// Print what a failed compilation collected. Other errors propagate.
pub fn report_failure(error: CompileError, color: termcolor::ColorChoice) -> anyhow::Result<()> {
    match error {
        CompileError::Compilation(failure) => {
            crate::output::print_diagnostics(&failure.diagnostics, color)?;
            crate::output::print_failure(&failure.to_string(), color);
            Ok(())
        }
        other => Err(other.into()),
    }
}
