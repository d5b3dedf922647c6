//! Target identifiers
//!
//! A simple name has two independent facets, private (`_` prefix) and
//! generated (`$` prefix). They compose as `_$name` regardless of the order
//! they were applied in, and the base name is always recoverable.

use serde::{Deserialize, Serialize};
use std::fmt;

const PRIVATE_PREFIX: char = '_';
const GENERATED_PREFIX: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DartSimpleIdentifier {
    base: String,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    is_generated: bool,
}

impl DartSimpleIdentifier {
    /// A public, non-generated name.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            is_private: false,
            is_generated: false,
        }
    }

    /// Parse an emitted name back into its facets.
    pub fn parse(text: &str) -> Self {
        let (is_private, rest) = match text.strip_prefix(PRIVATE_PREFIX) {
            Some(rest) if !rest.is_empty() => (true, rest),
            _ => (false, text),
        };
        let (is_generated, base) = match rest.strip_prefix(GENERATED_PREFIX) {
            Some(base) if !base.is_empty() => (true, base),
            _ => (false, rest),
        };
        Self {
            base: base.to_string(),
            is_private,
            is_generated,
        }
    }

    pub fn as_private(&self) -> Self {
        Self {
            is_private: true,
            ..self.clone()
        }
    }

    pub fn as_public(&self) -> Self {
        Self {
            is_private: false,
            ..self.clone()
        }
    }

    pub fn as_generated(&self) -> Self {
        Self {
            is_generated: true,
            ..self.clone()
        }
    }

    /// Private when `private` holds, unchanged otherwise.
    pub fn private_if(self, private: bool) -> Self {
        if private {
            self.as_private()
        } else {
            self
        }
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    /// The name without prefixes.
    pub fn base_value(&self) -> &str {
        &self.base
    }

    /// The emitted name.
    pub fn value(&self) -> String {
        let mut out = String::with_capacity(self.base.len() + 2);
        if self.is_private {
            out.push(PRIVATE_PREFIX);
        }
        if self.is_generated {
            out.push(GENERATED_PREFIX);
        }
        out.push_str(&self.base);
        out
    }
}

impl fmt::Display for DartSimpleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

impl From<&str> for DartSimpleIdentifier {
    fn from(base: &str) -> Self {
        Self::new(base)
    }
}

impl From<String> for DartSimpleIdentifier {
    fn from(base: String) -> Self {
        Self::new(base)
    }
}

/// Reserved words that cannot be used as identifiers in the target.
pub const RESERVED_WORDS: &[&str] = &[
    "assert", "break", "case", "catch", "class", "const", "continue", "default", "do", "else", "enum",
    "extends", "false", "final", "finally", "for", "if", "in", "is", "new", "null", "rethrow", "return",
    "super", "switch", "this", "throw", "true", "try", "var", "void", "while", "with",
];

/// Whether `name` must be escaped before use as an identifier.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// `camelCase`/`PascalCase` to `snake_case`, used for output file names.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}
