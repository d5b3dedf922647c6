//! Diagnostics
//!
//! Every problem found during a compilation, whether reported upstream by the
//! front-end or by a lowering pass, ends up in one [`DiagnosticCollector`].
//! Whether the compilation failed is decided once, at the end, from the
//! collected severities.

use crate::config::{DiagnosticsConfig, SeverityOverride};
use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use termcolor::WriteColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Stable identifier of a kind of problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DiagnosticKind {
    /// `const val` whose initializer is not a target constant
    ConstInitializedWithNonConstantValue,
    /// `@const` call of a constructor that is not const
    ConstWithNonConst,
    /// Const constructor whose parameter default is not a target constant
    NonConstantDefaultValueInConstConstructor,
    /// Public extension without an explicit target name
    ExtensionWithoutExplicitDartExtensionNameInPublicPackage,
    /// `set` operator that does not return `Unit`
    WrongSetOperatorReturnType,
    /// Special inheritance marker used on a non-external supertype
    SpecialInheritanceConstructorMisuse,
    /// Const inline function with more than one `return`
    ConstInlineFunctionWithMultipleReturns,
    /// Const inline function whose returned value is not constant
    ConstInlineFunctionReturnsNonConst,
    /// Const inline function body with something besides const locals and `return`
    ConstInlineFunctionHasInvalidStatement,
    /// Mutable property in an enum class, whose entries are constants
    VarInEnum,
    /// Two declarations map to the same target name
    DartNameClash,
    /// Two source files map to the same output path
    DuplicateOutputPath,
    /// Construct the lowering cannot express in the target
    UnsupportedConstruct,
    /// Reported by the front-end
    Upstream(String),
}

/// Kind name, default severity.
const KIND_TABLE: &[(DiagnosticKind, &str, Severity)] = &[
    (
        DiagnosticKind::ConstInitializedWithNonConstantValue,
        "CONST_INITIALIZED_WITH_NON_CONSTANT_VALUE",
        Severity::Error,
    ),
    (DiagnosticKind::ConstWithNonConst, "CONST_WITH_NON_CONST", Severity::Error),
    (
        DiagnosticKind::NonConstantDefaultValueInConstConstructor,
        "NON_CONSTANT_DEFAULT_VALUE_IN_CONST_CONSTRUCTOR",
        Severity::Error,
    ),
    (
        DiagnosticKind::ExtensionWithoutExplicitDartExtensionNameInPublicPackage,
        "EXTENSION_WITHOUT_EXPLICIT_DART_EXTENSION_NAME_IN_PUBLIC_PACKAGE",
        Severity::Warning,
    ),
    (
        DiagnosticKind::WrongSetOperatorReturnType,
        "WRONG_SET_OPERATOR_RETURN_TYPE",
        Severity::Error,
    ),
    (
        DiagnosticKind::SpecialInheritanceConstructorMisuse,
        "SPECIAL_INHERITANCE_CONSTRUCTOR_MISUSE",
        Severity::Error,
    ),
    (
        DiagnosticKind::ConstInlineFunctionWithMultipleReturns,
        "CONST_INLINE_FUNCTION_WITH_MULTIPLE_RETURNS",
        Severity::Error,
    ),
    (
        DiagnosticKind::ConstInlineFunctionReturnsNonConst,
        "CONST_INLINE_FUNCTION_RETURNS_NON_CONST",
        Severity::Error,
    ),
    (
        DiagnosticKind::ConstInlineFunctionHasInvalidStatement,
        "CONST_INLINE_FUNCTION_HAS_INVALID_STATEMENT",
        Severity::Error,
    ),
    (DiagnosticKind::VarInEnum, "VAR_IN_ENUM", Severity::Error),
    (DiagnosticKind::DartNameClash, "DART_NAME_CLASH", Severity::Error),
    (DiagnosticKind::DuplicateOutputPath, "DUPLICATE_OUTPUT_PATH", Severity::Error),
    (DiagnosticKind::UnsupportedConstruct, "UNSUPPORTED_CONSTRUCT", Severity::Error),
];

impl DiagnosticKind {
    pub fn name(&self) -> &str {
        match self {
            DiagnosticKind::Upstream(name) => name,
            kind => KIND_TABLE
                .iter()
                .find(|(k, _, _)| k == kind)
                .map(|(_, name, _)| *name)
                .unwrap_or("UNKNOWN"),
        }
    }

    /// Severity before configuration overrides.
    pub fn default_severity(&self) -> Severity {
        KIND_TABLE
            .iter()
            .find(|(k, _, _)| k == self)
            .map(|(_, _, severity)| *severity)
            .unwrap_or(Severity::Error)
    }

    /// Kind for a name, falling back to an upstream kind.
    pub fn from_name(name: &str) -> Self {
        KIND_TABLE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(k, _, _)| k.clone())
            .unwrap_or_else(|| DiagnosticKind::Upstream(name.to_string()))
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<DiagnosticKind> for String {
    fn from(kind: DiagnosticKind) -> Self {
        kind.name().to_string()
    }
}

impl From<String> for DiagnosticKind {
    fn from(name: String) -> Self {
        DiagnosticKind::from_name(&name)
    }
}

/// Where a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path
    pub file: String,
    /// Byte range in the file, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
}

impl SourceLocation {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            span: None,
        }
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            message: message.into(),
            location: None,
            notes: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Point the diagnostic at a file
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.location = Some(SourceLocation::file(file));
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a note (additional context)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn to_codespan(&self, file_id: Option<usize>) -> CsDiagnostic<usize> {
        let severity = match self.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
            Severity::Info => CsSeverity::Note,
        };
        let mut diag = CsDiagnostic::new(severity)
            .with_message(&self.message)
            .with_code(self.kind.name());
        if let (Some(file_id), Some((start, end))) = (file_id, self.location.as_ref().and_then(|l| l.span)) {
            diag = diag.with_labels(vec![Label::primary(file_id, start..end)]);
        }
        let mut notes = self.notes.clone();
        if let Some(location) = &self.location {
            if location.span.is_none() || file_id.is_none() {
                notes.insert(0, format!("in {}", location.file));
            }
        }
        diag.with_notes(notes)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location.file)?;
        }
        Ok(())
    }
}

/// Accumulates diagnostics for a whole compilation.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    config: DiagnosticsConfig,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector applying per-kind severity overrides
    pub fn with_config(config: DiagnosticsConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
        }
    }

    /// Record a diagnostic; disabled kinds are dropped.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        match self.config.severity_override(diagnostic.kind.name()) {
            Some(SeverityOverride::Off) => {
                tracing::debug!(kind = %diagnostic.kind, "diagnostic disabled by configuration");
                return;
            }
            Some(SeverityOverride::Warning) => diagnostic.severity = Severity::Warning,
            Some(SeverityOverride::Error) => diagnostic.severity = Severity::Error,
            None => {}
        }
        tracing::debug!(kind = %diagnostic.kind, severity = %diagnostic.severity, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Render diagnostics through codespan, with source snippets for files whose
/// text is in `sources`.
pub fn emit<W: WriteColor>(
    writer: &mut W,
    diagnostics: &[Diagnostic],
    sources: &FxHashMap<String, String>,
) -> Result<(), codespan_reporting::files::Error> {
    let mut files = SimpleFiles::new();
    let mut ids = FxHashMap::default();
    let mut paths: Vec<&String> = sources.keys().collect();
    paths.sort();
    for path in paths {
        let id = files.add(path.clone(), sources[path].clone());
        ids.insert(path.clone(), id);
    }

    let config = term::Config::default();
    for diagnostic in diagnostics {
        let file_id = diagnostic
            .location
            .as_ref()
            .and_then(|l| ids.get(&l.file))
            .copied();
        term::emit(writer, &config, &files, &diagnostic.to_codespan(file_id))?;
    }
    Ok(())
}

/// Kind names of the given diagnostics.
pub fn kind_names(diagnostics: &[Diagnostic]) -> BTreeSet<&str> {
    diagnostics.iter().map(|d| d.kind.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(
            DiagnosticKind::ConstInitializedWithNonConstantValue.name(),
            "CONST_INITIALIZED_WITH_NON_CONSTANT_VALUE"
        );
        assert_eq!(
            DiagnosticKind::from_name("CONST_WITH_NON_CONST"),
            DiagnosticKind::ConstWithNonConst
        );
        assert_eq!(
            DiagnosticKind::from_name("TYPE_MISMATCH"),
            DiagnosticKind::Upstream("TYPE_MISMATCH".to_string())
        );
    }

    #[test]
    fn test_default_severity() {
        assert_eq!(
            DiagnosticKind::ExtensionWithoutExplicitDartExtensionNameInPublicPackage.default_severity(),
            Severity::Warning
        );
        assert_eq!(DiagnosticKind::DartNameClash.default_severity(), Severity::Error);
    }

    #[test]
    fn test_collector_overrides() {
        let mut config = DiagnosticsConfig::default();
        config.set_severity("DART_NAME_CLASH", SeverityOverride::Warning);
        config.set_severity("UNSUPPORTED_CONSTRUCT", SeverityOverride::Off);
        let mut collector = DiagnosticCollector::with_config(config);

        collector.report(Diagnostic::new(DiagnosticKind::DartNameClash, "clash"));
        collector.report(Diagnostic::new(DiagnosticKind::UnsupportedConstruct, "dropped"));

        assert_eq!(collector.len(), 1);
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_emit_with_and_without_source() {
        let diagnostics = vec![
            Diagnostic::new(DiagnosticKind::ConstWithNonConst, "not const").at(SourceLocation {
                file: "app/Test.kt".to_string(),
                span: Some((4, 8)),
            }),
            Diagnostic::new(DiagnosticKind::DartNameClash, "clash").in_file("app/Other.kt"),
        ];
        let mut sources = FxHashMap::default();
        sources.insert("app/Test.kt".to_string(), "val x = Test()\n".to_string());

        let mut out = NoColor::new(Vec::new());
        emit(&mut out, &diagnostics, &sources).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("error[CONST_WITH_NON_CONST]: not const"));
        assert!(text.contains("app/Test.kt"));
        assert!(text.contains("in app/Other.kt"));
    }

    #[test]
    fn test_serde_kind_as_name() {
        let diag = Diagnostic::new(DiagnosticKind::ConstWithNonConst, "x");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"CONST_WITH_NON_CONST\""));
    }
}
