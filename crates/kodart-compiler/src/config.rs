//! Compiler configuration (kodart.toml)
//!
//! Every table is optional; a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up next to the input.
pub const CONFIG_FILE_NAME: &str = "kodart.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Compiler configuration (kodart.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Package metadata
    #[serde(default)]
    pub package: PackageConfig,

    /// Where and how output is written
    #[serde(default)]
    pub output: OutputConfig,

    /// Deviations of the source dialect from the upstream language
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Per-kind diagnostic severity overrides
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Package information
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the package is published for others to depend on
    #[serde(default)]
    pub public: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory (default: "build")
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Run the external formatter on the output directory
    #[serde(default)]
    pub format: bool,

    /// Archive written before text generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: false,
            archive: None,
        }
    }
}

/// Declaration kinds a modifier can be written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierTarget {
    Class,
    Constructor,
    LocalVariable,
    TopLevelFunction,
    MemberFunction,
    Property,
}

impl ModifierTarget {
    /// Parse an upstream target name (`"local variable"`, `"local-variable"`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace(' ', "-").as_str() {
            "class" => Some(ModifierTarget::Class),
            "constructor" => Some(ModifierTarget::Constructor),
            "local-variable" => Some(ModifierTarget::LocalVariable),
            "top-level-function" => Some(ModifierTarget::TopLevelFunction),
            "member-function" => Some(ModifierTarget::MemberFunction),
            "property" | "member-property" | "top-level-property" => Some(ModifierTarget::Property),
            _ => None,
        }
    }
}

/// Source dialect settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DialectConfig {
    /// Emit `@sealed` and `@nonVirtual` from `package:meta`
    #[serde(default)]
    pub meta_annotations: bool,

    /// Targets on which the `const` modifier is legal in the dialect
    #[serde(default = "default_const_modifier_targets")]
    pub const_modifier_targets: Vec<ModifierTarget>,
}

fn default_const_modifier_targets() -> Vec<ModifierTarget> {
    vec![
        ModifierTarget::Constructor,
        ModifierTarget::LocalVariable,
        ModifierTarget::TopLevelFunction,
    ]
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            meta_annotations: false,
            const_modifier_targets: default_const_modifier_targets(),
        }
    }
}

impl DialectConfig {
    pub fn allows_const_on(&self, target: ModifierTarget) -> bool {
        self.const_modifier_targets.contains(&target)
    }
}

/// Severity a diagnostic kind is forced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityOverride {
    /// Drop the diagnostic
    Off,
    Warning,
    Error,
}

/// Per-kind severity overrides, keyed by kind name
/// (e.g. `DART_NAME_CLASH = "warning"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DiagnosticsConfig {
    overrides: BTreeMap<String, SeverityOverride>,
}

impl DiagnosticsConfig {
    /// Set the severity for a specific kind.
    pub fn set_severity(&mut self, kind: &str, severity: SeverityOverride) {
        self.overrides.insert(kind.to_string(), severity);
    }

    /// Configured override for a kind, if any.
    pub fn severity_override(&self, kind: &str) -> Option<SeverityOverride> {
        self.overrides.get(kind).copied()
    }

    /// Check if a kind is explicitly disabled.
    pub fn is_disabled(&self, kind: &str) -> bool {
        self.overrides.get(kind) == Some(&SeverityOverride::Off)
    }
}

impl CompilerConfig {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration");
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a config from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: CompilerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.package.name {
            if !is_valid_package_name(name) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid package name: {}. Must be a lowercase identifier (e.g., my_package)",
                    name
                )));
            }
        }

        if self.output.dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "Output directory cannot be empty".to_string(),
            ));
        }

        for kind in self.diagnostics.overrides.keys() {
            if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid diagnostic kind: {}. Kind names are SCREAMING_SNAKE_CASE",
                    kind
                )));
            }
        }

        Ok(())
    }
}

/// Target package names: lowercase letters, digits and underscores, not
/// starting with a digit.
fn is_valid_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = CompilerConfig::from_str("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.output.dir, PathBuf::from("build"));
        assert!(config.dialect.allows_const_on(ModifierTarget::Constructor));
        assert!(!config.dialect.allows_const_on(ModifierTarget::Class));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[package]
name = "my_app"
public = true

[output]
dir = "out"
format = true
archive = "out/my_app.klib.json"

[dialect]
meta-annotations = true
const-modifier-targets = ["constructor"]

[diagnostics]
DART_NAME_CLASH = "warning"
EXTENSION_WITHOUT_EXPLICIT_DART_EXTENSION_NAME_IN_PUBLIC_PACKAGE = "off"
"#;
        let config = CompilerConfig::from_str(toml).unwrap();
        assert!(config.package.public);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(config.output.format);
        assert!(config.dialect.meta_annotations);
        assert!(!config.dialect.allows_const_on(ModifierTarget::LocalVariable));
        assert_eq!(
            config.diagnostics.severity_override("DART_NAME_CLASH"),
            Some(SeverityOverride::Warning)
        );
        assert!(config
            .diagnostics
            .is_disabled("EXTENSION_WITHOUT_EXPLICIT_DART_EXTENSION_NAME_IN_PUBLIC_PACKAGE"));
    }

    #[test]
    fn test_invalid_package_name() {
        let result = CompilerConfig::from_str("[package]\nname = \"My-App\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = CompilerConfig::from_str("[output]\ndirectory = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_modifier_target_parse() {
        assert_eq!(ModifierTarget::parse("local variable"), Some(ModifierTarget::LocalVariable));
        assert_eq!(ModifierTarget::parse("top-level-function"), Some(ModifierTarget::TopLevelFunction));
        assert_eq!(ModifierTarget::parse("typealias"), None);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = CompilerConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, CompilerConfig::default());
    }
}
