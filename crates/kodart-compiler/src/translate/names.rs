//! Output paths and target names of declarations

use crate::dart::identifier::to_snake_case;
use crate::dart::DartSimpleIdentifier;
use crate::ir::{annotations, DeclInfo, DeclKind, DeclOrigin, IrFile, Visibility};
use std::path::{Path, PathBuf};

const OUTPUT_ROOT: &str = "lib";

/// `lib/<directory>/<snake_case stem>.dart` for a source path like
/// `app/MyThing.kt`.
pub fn output_path_for(source_path: &str) -> PathBuf {
    let (directory, file_name) = match source_path.rfind('/') {
        Some(i) => (&source_path[..i], &source_path[i + 1..]),
        None => ("", source_path),
    };
    let stem = file_name.split('.').next().unwrap_or(file_name);

    let mut path = PathBuf::from(OUTPUT_ROOT);
    for segment in directory.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(format!("{}.dart", to_snake_case(stem)));
    path
}

pub fn output_path(file: &IrFile) -> PathBuf {
    output_path_for(&file.path)
}

/// Relative import URI from one output file to another, with `/`
/// separators.
pub fn relative_import(from: &Path, to: &Path) -> String {
    let from_dir: Vec<_> = from.parent().map(|p| p.components().collect()).unwrap_or_default();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_dir
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        segments.push("..".to_string());
    }
    for part in &to_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }
    segments.join("/")
}

/// Target name of a declaration: the `@DartName` argument or the source
/// name, with the private facet from its visibility and the generated facet
/// for lowering-created declarations.
pub fn declaration_name(info: &DeclInfo) -> DartSimpleIdentifier {
    let base = info.annotation_argument(annotations::DART_NAME).unwrap_or(&info.name);
    let id = DartSimpleIdentifier::new(base);
    let id = if info.origin == DeclOrigin::Generated { id.as_generated() } else { id };
    id.private_if(is_private(info))
}

fn is_private(info: &DeclInfo) -> bool {
    match info.kind {
        // Parameters and locals are never library-private.
        DeclKind::ValueParameter | DeclKind::Variable | DeclKind::TypeParameter => false,
        _ => info.visibility == Visibility::Private,
    }
}

/// Name of a property's accessor function, `<get-x>` to `x`.
pub fn accessor_property_name(name: &str) -> Option<&str> {
    name.strip_prefix("<get-")
        .or_else(|| name.strip_prefix("<set-"))
        .and_then(|rest| rest.strip_suffix('>'))
}
