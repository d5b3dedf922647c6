//! Colored terminal output.
//!
//! Uses `termcolor`. Respects `NO_COLOR` and the `--color` flag.

use kodart_compiler::diagnostic::emit;
use kodart_compiler::Diagnostic;
use rustc_hash::FxHashMap;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Every diagnostic to stderr, in collection order.
pub fn print_diagnostics(diagnostics: &[Diagnostic], choice: ColorChoice) -> anyhow::Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let mut stderr = StandardStream::stderr(choice);
    emit(&mut stderr, diagnostics, &FxHashMap::default())?;
    Ok(())
}

/// Green bold line on stdout.
pub fn print_success(text: &str, choice: ColorChoice) {
    let mut stdout = StandardStream::stdout(choice);
    styled_line(&mut stdout, text, Color::Green);
}

/// Red bold line on stderr.
pub fn print_failure(text: &str, choice: ColorChoice) {
    let mut stderr = StandardStream::stderr(choice);
    styled_line(&mut stderr, text, Color::Red);
}

fn styled_line<W: WriteColor>(out: &mut W, text: &str, color: Color) {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    let _ = out.set_color(&spec);
    let _ = writeln!(out, "{}", text);
    let _ = out.reset();
}
