//! `kodart elements` - Resolve one element of dependency metadata.

use anyhow::Context;
use kodart_compiler::element::DartElement;
use kodart_compiler::{DartPackageElement, ElementIndex, ElementLocation};
use std::path::Path;

/// Metadata is one package or a list of packages.
fn load_packages(path: &Path) -> anyhow::Result<Vec<DartPackageElement>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    })
}

fn to_json(element: DartElement<'_>) -> serde_json::Result<String> {
    match element {
        DartElement::Library(e) => serde_json::to_string_pretty(e),
        DartElement::CompilationUnit(e) => serde_json::to_string_pretty(e),
        DartElement::Class(e) => serde_json::to_string_pretty(e),
        DartElement::Field(e) => serde_json::to_string_pretty(e),
        DartElement::PropertyAccessor(e) => serde_json::to_string_pretty(e),
        DartElement::Constructor(e) => serde_json::to_string_pretty(e),
        DartElement::Function(e) => serde_json::to_string_pretty(e),
        DartElement::Parameter(e) => serde_json::to_string_pretty(e),
        DartElement::TypeParameter(e) => serde_json::to_string_pretty(e),
    }
}

pub fn execute(metadata: &Path, location: &str) -> anyhow::Result<bool> {
    let packages = load_packages(metadata)?;
    let index = ElementIndex::from_packages(&packages)?;
    let location = ElementLocation::parse(location).with_context(|| format!("Invalid element location `{}`", location))?;
    match index.lookup(&location) {
        Ok(element) => {
            println!("{}", to_json(element)?);
            Ok(true)
        }
        Err(error) => {
            eprintln!("{}", error);
            Ok(false)
        }
    }
}
