//! Kodart CLI
//!
//! Drives the compiler over a serialized IR module:
//! compile to Dart files, check without writing, and inspect dependency
//! element metadata.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kodart")]
#[command(about = "Kotlin IR to Dart compiler", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an IR module to Dart source files
    Compile {
        /// Serialized compiler input (IR module, dependency metadata, upstream diagnostics)
        input: PathBuf,
        #[command(flatten)]
        options: commands::CompileOptions,
        /// Output directory (overrides the config file)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Run the external formatter on the output
        #[arg(long)]
        format: bool,
        /// Write a library archive before generating code
        #[arg(long)]
        archive: Option<PathBuf>,
    },

    /// Compile without writing any output
    Check {
        /// Serialized compiler input
        input: PathBuf,
        #[command(flatten)]
        options: commands::CompileOptions,
    },

    /// Resolve one element of dependency metadata
    Elements {
        /// Package metadata (JSON)
        metadata: PathBuf,
        /// Element location, e.g. `package:meta/meta.dart;meta.dart;Immutable`
        location: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let color = output::resolve_color_choice(cli.color.as_deref());

    let success = match cli.command {
        Commands::Compile {
            input,
            options,
            out,
            format,
            archive,
        } => commands::compile::execute(&input, options, out, format, archive, color)?,
        Commands::Check { input, options } => commands::check::execute(&input, options, color)?,
        Commands::Elements { metadata, location } => commands::elements::execute(&metadata, &location)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
