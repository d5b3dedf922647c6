//! Element locations: the join key between IR declarations and target elements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `;`-separated path uniquely identifying an element inside its library,
/// e.g. `package:meta/meta.dart;meta.dart;Immutable;new`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementLocation {
    parts: Vec<String>,
}

impl ElementLocation {
    /// Build a location from its parts. Returns `None` for an empty path.
    pub fn new<I, S>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
            None
        } else {
            Some(Self { parts })
        }
    }

    /// Parse a `;`-joined location string.
    pub fn parse(text: &str) -> Option<Self> {
        Self::new(text.split(';'))
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        // Non-empty by construction.
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Location of the library that contains this element.
    pub fn library(&self) -> ElementLocation {
        Self {
            parts: self.parts[..1].to_vec(),
        }
    }

    /// Library URI (first segment).
    pub fn library_uri(&self) -> &str {
        &self.parts[0]
    }

    /// Location of a child element.
    pub fn child(&self, name: impl Into<String>) -> ElementLocation {
        let mut parts = self.parts.clone();
        parts.push(name.into());
        Self { parts }
    }

    /// Location of the enclosing element, if any.
    pub fn parent(&self) -> Option<ElementLocation> {
        if self.parts.len() > 1 {
            Some(Self {
                parts: self.parts[..self.parts.len() - 1].to_vec(),
            })
        } else {
            None
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for ElementLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join(";"))
    }
}

impl TryFrom<String> for ElementLocation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid element location '{}'", value))
    }
}

impl From<ElementLocation> for String {
    fn from(location: ElementLocation) -> Self {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let loc = ElementLocation::parse("dart:core;core.dart;List;add").unwrap();
        assert_eq!(loc.name(), "add");
        assert_eq!(loc.library_uri(), "dart:core");
        assert_eq!(loc.library().to_string(), "dart:core");
        assert_eq!(loc.to_string(), "dart:core;core.dart;List;add");
    }

    #[test]
    fn test_empty_rejected() {
        assert!(ElementLocation::parse("").is_none());
        assert!(ElementLocation::parse("dart:core;;List").is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let loc = ElementLocation::parse("package:meta/meta.dart;meta.dart;sealed").unwrap();
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, "\"package:meta/meta.dart;meta.dart;sealed\"");
        let back: ElementLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }

    #[test]
    fn test_child_and_parent() {
        let class = ElementLocation::parse("dart:core;core.dart;Iterator").unwrap();
        let member = class.child("moveNext");
        assert_eq!(member.parent(), Some(class));
    }
}
