//! Upstream diagnostic suppression.
//!
//! The front-end checks the source program against the upstream language,
//! which rejects a few things the dialect allows. Each exception is one row
//! of [`SUPPRESSION_RULES`]; a diagnostic is dropped only when a row names it.

use crate::config::{DialectConfig, ModifierTarget};
use crate::diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticKind, Severity, SourceLocation};
use crate::ir::types::builtins;
use serde::{Deserialize, Serialize};

/// Typed parameter of an upstream diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "parameter", content = "value", rename_all = "snake_case")]
pub enum DiagnosticParameter {
    /// Modifier keyword, e.g. `const`
    Modifier(String),
    /// Declaration kind a modifier was written on, e.g. `constructor`
    Target(String),
    /// Qualified name of the expected type
    ExpectedType(String),
    /// Qualified name of the actual type
    ActualType(String),
    /// Qualified name of the class owning a member
    Container(String),
}

/// A diagnostic as reported by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamDiagnostic {
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub parameters: Vec<DiagnosticParameter>,
}

impl UpstreamDiagnostic {
    pub fn new(kind: &str, severity: Severity) -> Self {
        Self {
            kind: kind.to_string(),
            severity,
            message: kind.to_string(),
            location: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: DiagnosticParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    fn modifier(&self) -> Option<&str> {
        self.parameters.iter().find_map(|p| match p {
            DiagnosticParameter::Modifier(m) => Some(m.as_str()),
            _ => None,
        })
    }

    fn target(&self) -> Option<&str> {
        self.parameters.iter().find_map(|p| match p {
            DiagnosticParameter::Target(t) => Some(t.as_str()),
            _ => None,
        })
    }

    fn expected_type(&self) -> Option<&str> {
        self.parameters.iter().find_map(|p| match p {
            DiagnosticParameter::ExpectedType(t) => Some(t.as_str()),
            _ => None,
        })
    }

    fn actual_type(&self) -> Option<&str> {
        self.parameters.iter().find_map(|p| match p {
            DiagnosticParameter::ActualType(t) => Some(t.as_str()),
            _ => None,
        })
    }

    fn container(&self) -> Option<&str> {
        self.parameters.iter().find_map(|p| match p {
            DiagnosticParameter::Container(c) => Some(c.as_str()),
            _ => None,
        })
    }

    fn into_diagnostic(self) -> Diagnostic {
        Diagnostic {
            kind: DiagnosticKind::Upstream(self.kind),
            severity: self.severity,
            message: self.message,
            location: self.location,
            notes: Vec::new(),
        }
    }
}

/// One auditable exception to upstream checking.
pub struct SuppressionRule {
    /// Rule name, used in logs
    pub name: &'static str,
    /// Upstream kind the rule applies to
    pub kind: &'static str,
    pub applies: fn(&UpstreamDiagnostic, &DialectConfig) -> bool,
}

pub static SUPPRESSION_RULES: &[SuppressionRule] = &[
    SuppressionRule {
        name: "const-modifier-target",
        kind: "WRONG_MODIFIER_TARGET",
        applies: |d, dialect| {
            d.modifier() == Some("const")
                && d.target()
                    .and_then(ModifierTarget::parse)
                    .is_some_and(|t| dialect.allows_const_on(t))
        },
    },
    SuppressionRule {
        name: "const-val-type",
        kind: "TYPE_CANT_BE_USED_FOR_CONST_VAL",
        applies: |_, _| true,
    },
    SuppressionRule {
        name: "const-val-initializer",
        kind: "CONST_VAL_WITH_NON_CONST_INITIALIZER",
        applies: |_, _| true,
    },
    SuppressionRule {
        name: "integer-literal-as-int",
        kind: "CONSTANT_EXPECTED_TYPE_MISMATCH",
        applies: |d, _| d.expected_type() == Some(builtins::INT),
    },
    SuppressionRule {
        name: "long-as-int",
        kind: "TYPE_MISMATCH",
        applies: |d, _| d.expected_type() == Some(builtins::INT) && d.actual_type() == Some(builtins::LONG),
    },
    SuppressionRule {
        name: "internal-long-member",
        kind: "INVISIBLE_MEMBER",
        applies: |d, _| d.container() == Some(builtins::LONG),
    },
    SuppressionRule {
        name: "throw-any-value",
        kind: "TYPE_MISMATCH",
        applies: |d, _| d.expected_type() == Some(builtins::THROWABLE),
    },
    SuppressionRule {
        name: "throw-any-constant",
        kind: "CONSTANT_EXPECTED_TYPE_MISMATCH",
        applies: |d, _| d.expected_type() == Some(builtins::THROWABLE),
    },
];

/// The rule suppressing `diagnostic`, if any.
pub fn suppressing_rule(diagnostic: &UpstreamDiagnostic, dialect: &DialectConfig) -> Option<&'static SuppressionRule> {
    SUPPRESSION_RULES
        .iter()
        .find(|rule| rule.kind == diagnostic.kind && (rule.applies)(diagnostic, dialect))
}

/// Pass upstream diagnostics through the rule table into the collector.
pub fn admit_upstream(
    diagnostics: Vec<UpstreamDiagnostic>,
    dialect: &DialectConfig,
    collector: &mut DiagnosticCollector,
) {
    for diagnostic in diagnostics {
        match suppressing_rule(&diagnostic, dialect) {
            Some(rule) => {
                tracing::warn!(rule = rule.name, kind = %diagnostic.kind, "suppressed upstream diagnostic");
            }
            None => collector.report(diagnostic.into_diagnostic()),
        }
    }
}
