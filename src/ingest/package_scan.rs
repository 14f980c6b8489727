//! Phase-0 package pre-scan.
//!
//! A lightweight line-prefix scan that recovers each file's package
//! declaration without building a syntax tree. The streaming pipeline runs
//! this over every file up front so package nodes can be upserted as one
//! batch instead of one query per file.

use crate::model::Package;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Extract the package name from raw source text by line prefix.
///
/// Scans until the first `package` line; leading blank lines and line
/// comments are tolerated. Returns `None` for default-package files.
pub fn scan_package_name(source: &str) -> Option<String> {
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('*') {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("package") {
            let name: String = rest
                .chars()
                .take_while(|c| *c != ';')
                .collect::<String>()
                .trim()
                .to_string();
            if name.is_empty() {
                return None;
            }
            return Some(name);
        }
        // Annotations and comments may precede the package declaration;
        // anything else means the file declares no package.
        if !trimmed.starts_with('@') && !trimmed.starts_with("/*") {
            return None;
        }
    }
    None
}

/// Pre-scan a file list and collect the distinct packages, sorted.
///
/// Unreadable files are skipped here; the parse phase reports them.
pub fn prescan_packages(files: &[PathBuf]) -> Vec<Package> {
    let mut names = BTreeSet::new();
    for path in files {
        if let Some(name) = scan_file(path) {
            names.insert(name);
        }
    }
    names.into_iter().map(|name| Package { name }).collect()
}

fn scan_file(path: &Path) -> Option<String> {
    let source = fs::read_to_string(path).ok()?;
    scan_package_name(&source)
}
