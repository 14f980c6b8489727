//! Source ingestion: file discovery and per-file parsing.
//!
//! Parsing one file is a pure function with no store access, so both
//! pipeline modes (sequential batch, parallel streaming) share the same
//! entry point.

pub mod annotations;
pub mod imports;
pub mod package_scan;
pub mod symbols;
pub mod walker;

use crate::error::{JavelinError, Result};
use crate::model::TypeDecl;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Discover all Java source files under a root directory, sorted for
/// deterministic submission order.
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(JavelinError::Config(format!(
            "source root is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| JavelinError::Other(format!("walk error: {}", e)))?;
        if entry.file_type().is_file()
            && entry.path().extension().map(|ext| ext == "java").unwrap_or(false)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read and parse one source file into its flattened type declarations.
pub fn parse_source_file(path: &Path) -> Result<Vec<TypeDecl>> {
    let source = std::fs::read(path).map_err(|e| JavelinError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    walker::parse_compilation_unit(path, &source)
}
