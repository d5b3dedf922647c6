//! Library archive
//!
//! A JSON snapshot of the IR module taken before lowering rewrites it:
//!
//! ```text
//! { "format_version": 1, "module": "app", "checksum": "<sha256 hex>", "ir": { ... } }
//! ```
//!
//! The checksum covers the canonical JSON encoding of `ir` (object keys in
//! sorted order), so it survives re-indentation of the file.

use crate::ir::IrModule;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current archive format version
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// Errors that can occur while writing or reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON or IR
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Archive written by an incompatible compiler
    #[error("Unsupported archive version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Content does not match the stored checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveDocument {
    format_version: u32,
    module: String,
    checksum: String,
    ir: serde_json::Value,
}

/// Hex SHA-256 of the canonical encoding of `ir`.
fn checksum(ir: &serde_json::Value) -> Result<String, ArchiveError> {
    let bytes = serde_json::to_vec(ir)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Serialize `module` into an archive document.
pub fn archive_to_string(module: &IrModule) -> Result<String, ArchiveError> {
    let ir = serde_json::to_value(module)?;
    let document = ArchiveDocument {
        format_version: ARCHIVE_FORMAT_VERSION,
        module: module.name.clone(),
        checksum: checksum(&ir)?,
        ir,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse an archive document, validating version and checksum.
pub fn archive_from_str(text: &str) -> Result<IrModule, ArchiveError> {
    let document: ArchiveDocument = serde_json::from_str(text)?;
    if document.format_version != ARCHIVE_FORMAT_VERSION {
        return Err(ArchiveError::UnsupportedVersion {
            found: document.format_version,
            expected: ARCHIVE_FORMAT_VERSION,
        });
    }
    let actual = checksum(&document.ir)?;
    if actual != document.checksum {
        return Err(ArchiveError::ChecksumMismatch {
            expected: document.checksum,
            actual,
        });
    }
    Ok(serde_json::from_value(document.ir)?)
}

/// Write the archive of `module` to `path`, creating parent directories.
pub fn write_archive(module: &IrModule, path: &Path) -> Result<(), ArchiveError> {
    write_archive_text(&archive_to_string(module)?, path)
}

/// Write an already serialized archive document to `path`.
pub fn write_archive_text(text: &str, path: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote archive");
    Ok(())
}

/// Read and validate the archive at `path`.
pub fn read_archive(path: &Path) -> Result<IrModule, ArchiveError> {
    let text = fs::read_to_string(path)?;
    archive_from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::{IrDeclaration, IrType};

    fn sample() -> IrModule {
        let mut b = IrBuilder::new();
        let one = b.int(1);
        let function = b.function("answer", IrType::int()).body(vec![crate::ir::IrStatement::Return(Some(one))]).build();
        let mut file = b.file("app/Answer.kt", "app");
        file.declarations.push(IrDeclaration::Function(function));
        let mut module = IrModule::new("app");
        module.add_file(file);
        module
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/app.klib.json");
        let module = sample();
        write_archive(&module, &path).unwrap();
        assert_eq!(read_archive(&path).unwrap(), module);
    }

    #[test]
    fn test_tampered_archive_is_rejected() {
        let text = archive_to_string(&sample()).unwrap();
        let tampered = text.replace("answer", "question");
        assert!(matches!(
            archive_from_str(&tampered),
            Err(ArchiveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_future_version_is_rejected() {
        let text = archive_to_string(&sample())
            .unwrap()
            .replace("\"format_version\": 1", "\"format_version\": 99");
        assert!(matches!(
            archive_from_str(&text),
            Err(ArchiveError::UnsupportedVersion { found: 99, expected: 1 })
        ));
    }
}
