//! Java import table extraction.
//!
//! Builds the per-file import map used by call-target resolution: simple type
//! name → fully qualified name. Wildcard imports cannot attribute a simple
//! name to a concrete type without a type checker, so they are ignored;
//! unresolved qualifiers fall back to the current package.

use std::collections::HashMap;

/// Per-file import map: simple name → fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    entries: HashMap<String, String>,
}

impl ImportTable {
    /// Resolve a simple type name against the imports of this file.
    pub fn resolve(&self, simple_name: &str) -> Option<&str> {
        self.entries.get(simple_name).map(|s| s.as_str())
    }

    /// Number of single-type imports in this file.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the file has no single-type imports.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert one mapping; used by tests and by the collector below.
    pub fn insert(&mut self, simple_name: String, qualified_name: String) {
        self.entries.insert(simple_name, qualified_name);
    }
}

/// Collect the import table from a parsed compilation unit.
///
/// Walks the top-level `import_declaration` nodes. Static imports and
/// wildcard imports are skipped: neither maps a simple type name to a
/// qualified type.
pub fn collect_imports(root: tree_sitter::Node, source: &[u8]) -> ImportTable {
    let mut table = ImportTable::default();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() != "import_declaration" {
            continue;
        }

        let mut is_static = false;
        let mut is_glob = false;
        let mut path = String::new();

        let mut import_cursor = child.walk();
        for part in child.children(&mut import_cursor) {
            match part.kind() {
                "static" => is_static = true,
                "asterisk" => is_glob = true,
                "scoped_identifier" | "identifier" => {
                    if let Ok(text) = part.utf8_text(source) {
                        path = text.to_string();
                    }
                }
                _ => {}
            }
        }

        if is_static || is_glob || path.is_empty() {
            continue;
        }

        if let Some(simple) = path.rsplit('.').next() {
            table.insert(simple.to_string(), path.clone());
        }
    }

    table
}
