//! Graph data model.
//!
//! Records emitted by the walker and the framework extractors. Structural
//! records (types, members, call edges) are immutable once emitted; framework
//! records (components, routes, persistence artifacts) are pure derivations of
//! a type batch and are discarded after persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A namespace container, keyed by its dotted name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Package {
    /// Dotted package name (e.g., `com.example.service`).
    pub name: String,
}

/// Kinds of declared types captured in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Class declaration.
    Class,
    /// Interface declaration.
    Interface,
}

impl TypeKind {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
        }
    }
}

/// A parsed annotation with its arguments normalized to one tagged map.
///
/// Java annotation arguments arrive in several shapes (marker, single value,
/// named pairs, arrays). They are normalized at ingestion: a single unnamed
/// value lands under the `value` key, array elements are comma-joined, so no
/// downstream code branches on shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Simple annotation name without the `@` (e.g., `Service`).
    pub name: String,
    /// Normalized argument map; string literals are stored unquoted.
    pub args: BTreeMap<String, String>,
}

impl Annotation {
    /// Construct a marker annotation with no arguments.
    pub fn marker(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: BTreeMap::new(),
        }
    }

    /// The default `value` argument, if present.
    pub fn value(&self) -> Option<&str> {
        self.args.get("value").map(|s| s.as_str())
    }

    /// A named argument, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(|s| s.as_str())
    }
}

/// One declared class or interface, including nested declarations.
///
/// Nested types get their own `TypeDecl` with qualified name
/// `package.Outer.Inner` and the outer type's package. Members and call edges
/// are owned exclusively by their declaring type, so a `Vec<TypeDecl>` is a
/// self-contained persistence unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Fully qualified name; the only identity key for a type.
    pub qualified_name: String,
    /// Simple name (innermost identifier).
    pub simple_name: String,
    /// Dotted package name; empty for the default package.
    pub package: String,
    /// Declaration kind.
    pub kind: TypeKind,
    /// Superclass as written in source, if any.
    pub superclass: Option<String>,
    /// Implemented (or extended, for interfaces) types as written.
    pub interfaces: Vec<String>,
    /// Path of the source file this type was declared in.
    pub declared_at: String,
    /// Source excerpt reconstructed by brace-depth scanning; enrichment only.
    pub excerpt: String,
    /// Annotations on the type declaration.
    pub annotations: Vec<Annotation>,
    /// Methods owned by this type.
    pub methods: Vec<MethodDecl>,
    /// Fields owned by this type.
    pub fields: Vec<FieldDecl>,
    /// Call edges whose source endpoint is a method of this type.
    pub calls: Vec<CallEdge>,
}

/// A method (or constructor) declaration owned by exactly one type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// Method name; constructors carry the type's simple name.
    pub name: String,
    /// Declared return type; constructors use the type's simple name.
    pub return_type: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParamDecl>,
    /// Modifier keywords (`public`, `static`, ...).
    pub modifiers: Vec<String>,
    /// Annotations on the method declaration.
    pub annotations: Vec<Annotation>,
    /// Source excerpt; empty for synthesized methods.
    pub excerpt: String,
    /// Whether this is a constructor.
    pub is_constructor: bool,
    /// Whether this method was synthesized from an accessor marker.
    pub generated: bool,
    /// Declaration line (1-based); 0 for synthesized methods.
    pub line: usize,
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Declared type as written.
    pub type_name: String,
}

/// A field declaration owned by exactly one type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared type as written.
    pub type_name: String,
    /// Modifier keywords.
    pub modifiers: Vec<String>,
    /// Annotations on the field declaration.
    pub annotations: Vec<Annotation>,
}

/// A directed method-invocation edge.
///
/// The source endpoint always references a method emitted in the same parse
/// unit. The target may be a stub: when the callee cannot be attributed, the
/// literal qualifier text stands in for the type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEdge {
    /// Qualified name of the calling type.
    pub source_type: String,
    /// Name of the calling method.
    pub source_method: String,
    /// Resolved or stub target type.
    pub target_type: String,
    /// Invoked member name.
    pub target_method: String,
    /// Source-order index of this invocation within the calling method.
    pub ordinal: usize,
    /// Invocation line (1-based).
    pub line: usize,
}

/// Kinds of framework-managed components, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Service-stereotyped component.
    Service,
    /// Repository-stereotyped component.
    Repository,
    /// Controller-stereotyped component (including REST controllers).
    Controller,
    /// Configuration-stereotyped component.
    Configuration,
    /// Generic managed component.
    Generic,
}

impl ComponentKind {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Service => "service",
            ComponentKind::Repository => "repository",
            ComponentKind::Controller => "controller",
            ComponentKind::Configuration => "configuration",
            ComponentKind::Generic => "generic",
        }
    }
}

/// A framework-managed component (bean) derived from a stereotype annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Bean name; annotation value when given, else the simple type name with
    /// a lower-cased first letter.
    pub name: String,
    /// Classified kind.
    pub kind: ComponentKind,
    /// Qualified name of the declaring type.
    pub owner_type: String,
    /// Bean scope; defaults to `singleton`.
    pub scope: String,
}

/// The mechanism by which a component receives a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    /// Annotated field injection.
    Field,
    /// Constructor parameter injection.
    Constructor,
    /// Annotated setter injection.
    Setter,
}

impl InjectionKind {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            InjectionKind::Field => "field",
            InjectionKind::Constructor => "constructor",
            InjectionKind::Setter => "setter",
        }
    }
}

/// A component-to-component dependency edge, keyed by
/// (source, target, kind, site).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDependency {
    /// Name of the depending component.
    pub source: String,
    /// Name of the depended-upon component.
    pub target: String,
    /// Injection mechanism.
    pub kind: InjectionKind,
    /// Injection site identifier (field name, parameter name, setter name).
    pub site: String,
}

/// An HTTP route derived from a controller type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// HTTP method (`GET`, `POST`, ...).
    pub http_method: String,
    /// Method-level path as written.
    pub path: String,
    /// Class-level prefix and method-level path joined with one separator.
    pub full_path: String,
    /// Qualified name of the controller type.
    pub owner_type: String,
    /// Handler method name.
    pub handler_method: String,
}

/// A MyBatis mapper interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperDecl {
    /// Qualified name of the mapper interface.
    pub name: String,
}

/// Kinds of mapped SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKind {
    /// SELECT statement.
    Select,
    /// INSERT statement.
    Insert,
    /// UPDATE statement.
    Update,
    /// DELETE statement.
    Delete,
}

impl SqlKind {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlKind::Select => "select",
            SqlKind::Insert => "insert",
            SqlKind::Update => "update",
            SqlKind::Delete => "delete",
        }
    }
}

/// A mapped SQL statement, keyed by (id, mapper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatementDecl {
    /// Statement id (the mapper method name).
    pub id: String,
    /// Qualified name of the owning mapper.
    pub mapper: String,
    /// Statement kind.
    pub kind: SqlKind,
    /// Raw SQL text as written in the annotation.
    pub raw_text: String,
    /// Table names referenced by FROM/JOIN/INTO/UPDATE clauses.
    pub referenced_tables: Vec<String>,
}

/// A JPA entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDecl {
    /// Qualified name of the entity class.
    pub qualified_name: String,
    /// Mapped table name, when declared.
    pub table_name: Option<String>,
}

/// A Spring Data repository interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDecl {
    /// Qualified name of the repository interface.
    pub qualified_name: String,
    /// Managed entity type from the repository supertype's first type
    /// argument, when recoverable.
    pub entity_type: Option<String>,
}

/// A declared query method on a repository interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryQuery {
    /// Qualified name of the owning repository.
    pub repository: String,
    /// Query method name.
    pub method: String,
    /// Declared query text.
    pub query: String,
}

/// Per-run statistics and outcome summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Source files discovered.
    pub total_files: usize,
    /// Files parsed and persisted.
    pub processed_files: usize,
    /// Files skipped after a parse error.
    pub error_files: usize,
    /// Distinct packages written.
    pub packages: usize,
    /// Types written.
    pub types: usize,
    /// Methods written.
    pub methods: usize,
    /// Fields written.
    pub fields: usize,
    /// Call edges written.
    pub call_edges: usize,
    /// Components written.
    pub components: usize,
    /// Routes written.
    pub routes: usize,
    /// Mapper interfaces written.
    pub mappers: usize,
    /// SQL statements written.
    pub sql_statements: usize,
    /// Entities written.
    pub entities: usize,
    /// Repositories written.
    pub repositories: usize,
    /// Repository query methods written.
    pub repository_queries: usize,
    /// Component dependency edges written by the resolver.
    pub dependencies: usize,
    /// Whether the run completed without unrecovered errors. Parse errors are
    /// recovered but still force `success = false` when any file was skipped.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
}

impl RunStats {
    /// Completion invariant: every discovered file was either processed or
    /// counted as an error.
    pub fn is_complete(&self) -> bool {
        self.processed_files + self.error_files == self.total_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_kind_as_str() {
        assert_eq!(ComponentKind::Service.as_str(), "service");
        assert_eq!(ComponentKind::Generic.as_str(), "generic");
    }

    #[test]
    fn test_annotation_value_lookup() {
        let mut args = BTreeMap::new();
        args.insert("value".to_string(), "/api".to_string());
        let ann = Annotation {
            name: "RequestMapping".to_string(),
            args,
        };
        assert_eq!(ann.value(), Some("/api"));
        assert_eq!(ann.get("method"), None);
    }

    #[test]
    fn test_run_stats_completion_invariant() {
        let stats = RunStats {
            total_files: 10,
            processed_files: 8,
            error_files: 2,
            ..Default::default()
        };
        assert!(stats.is_complete());
    }
}
