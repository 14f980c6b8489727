//! Per-method symbol table and heuristic call-target resolution.
//!
//! There is no full type checker: call targets are attributed by best-effort
//! name tracking. The table merges class fields, method parameters, and every
//! local declared anywhere in the method body, in that override order. Scope
//! is flow-insensitive: a local is visible to the whole method regardless of
//! where it is declared. Resolution never fails; an unattributable qualifier
//! produces a stub target carrying its literal source text.

use crate::ingest::imports::ImportTable;
use crate::model::{FieldDecl, ParamDecl};
use std::collections::HashMap;

/// Member names filtered out of the call graph: collection and stream
/// pipeline plumbing plus logging calls carry no architectural signal.
const CALL_DENYLIST: &[&str] = &[
    // stream pipeline
    "stream",
    "map",
    "filter",
    "collect",
    "forEach",
    "reduce",
    "flatMap",
    "sorted",
    "distinct",
    "limit",
    "anyMatch",
    "findFirst",
    "orElse",
    "orElseThrow",
    // collection plumbing
    "get",
    "put",
    "add",
    "remove",
    "size",
    "isEmpty",
    "contains",
    "of",
    "asList",
    "toList",
    "iterator",
    "keySet",
    "values",
    "entrySet",
    // object boilerplate and string building
    "equals",
    "hashCode",
    "toString",
    "append",
    "format",
    "valueOf",
    // logging
    "trace",
    "debug",
    "info",
    "warn",
    "error",
    "println",
    "print",
];

/// Literal qualifier rewrites for idioms that would otherwise resolve to a
/// nonsense type in the current package.
const LITERAL_REWRITES: &[(&str, &str)] = &[
    ("System.out", "java.io.PrintStream"),
    ("System.err", "java.io.PrintStream"),
    ("System.in", "java.io.InputStream"),
];

/// Name → declared-type lookup for one method.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, String>,
}

impl SymbolTable {
    /// Build the merged table for one method.
    ///
    /// Merge order is fields, then parameters, then locals: later entries
    /// shadow earlier ones, so a parameter or local named like a field wins.
    /// Locals are collected from the whole method body up front; visibility
    /// is deliberately flow-insensitive.
    pub fn build(
        fields: &[FieldDecl],
        parameters: &[ParamDecl],
        locals: &[(String, String)],
    ) -> Self {
        let mut symbols = HashMap::new();
        for field in fields {
            symbols.insert(field.name.clone(), field.type_name.clone());
        }
        for param in parameters {
            symbols.insert(param.name.clone(), param.type_name.clone());
        }
        for (name, type_name) in locals {
            symbols.insert(name.clone(), type_name.clone());
        }
        Self {
            symbols,
        }
    }

    /// Look up the declared type of a name.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.symbols.get(name).map(|s| s.as_str())
    }
}

/// Strip a generic argument list from a type reference
/// (`List<Foo>` → `List`, `Map<K, V>` → `Map`).
pub fn strip_generics(type_name: &str) -> &str {
    match type_name.find('<') {
        Some(idx) => type_name[..idx].trim_end(),
        None => type_name.trim(),
    }
}

/// Whether an invoked member name is filtered out of the call graph.
pub fn is_denylisted(member: &str) -> bool {
    CALL_DENYLIST.contains(&member)
}

/// Resolves invocation qualifiers to target types for one method.
pub struct CallResolver<'a> {
    table: &'a SymbolTable,
    imports: &'a ImportTable,
    enclosing_type: &'a str,
    package: &'a str,
}

impl<'a> CallResolver<'a> {
    /// Create a resolver for a method of `enclosing_type` in `package`.
    pub fn new(
        table: &'a SymbolTable,
        imports: &'a ImportTable,
        enclosing_type: &'a str,
        package: &'a str,
    ) -> Self {
        Self {
            table,
            imports,
            enclosing_type,
            package,
        }
    }

    /// Resolve an invocation to `(target_type, target_method)`.
    ///
    /// Returns `None` only for denylisted members. Resolution itself never
    /// fails: the fallthrough keeps the literal qualifier text as a stub
    /// target type so the graph is always constructible from partial
    /// information.
    pub fn resolve(&self, qualifier: Option<&str>, member: &str) -> Option<(String, String)> {
        if is_denylisted(member) {
            return None;
        }

        let qualifier = match qualifier {
            None | Some("this") => {
                return Some((self.enclosing_type.to_string(), member.to_string()))
            }
            Some(q) => q,
        };

        for (literal, owner) in LITERAL_REWRITES {
            if qualifier == *literal {
                return Some((owner.to_string(), member.to_string()));
            }
        }

        if let Some(declared) = self.table.lookup(qualifier) {
            return Some((strip_generics(declared).to_string(), member.to_string()));
        }

        // Not a known symbol: treat the qualifier as a type reference.
        if let Some(qualified) = self.imports.resolve(qualifier) {
            return Some((qualified.to_string(), member.to_string()));
        }

        if is_type_reference(qualifier) && !self.package.is_empty() {
            return Some((format!("{}.{}", self.package, qualifier), member.to_string()));
        }

        // Stub target: literal qualifier text stands in for the type.
        Some((qualifier.to_string(), member.to_string()))
    }
}

/// Heuristic: a plain capitalized identifier reads as a type reference and is
/// attributed to the current package; anything else (chained calls, lowercase
/// unknowns) stays literal.
fn is_type_reference(qualifier: &str) -> bool {
    let mut chars = qualifier.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
