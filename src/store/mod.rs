//! SQLite-backed graph store.
//!
//! Batch-oriented, upsert-by-natural-key storage for the code graph. Every
//! record type merges on its natural key (qualified name, (owner, name),
//! (source, target, kind, site), ...), never on surrogate ids, so upserting
//! an identical batch twice yields the same node and edge counts as
//! upserting it once. WAL mode allows concurrent reads during writes; all
//! writes are issued from a single orchestrator thread.

use crate::error::Result;
use crate::extract::FrameworkRecords;
use crate::model::{
    Annotation, Component, ComponentDependency, EntityDecl, MapperDecl, Package, ParamDecl,
    RepositoryDecl, RepositoryQuery, Route, SqlStatementDecl, TypeDecl,
};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS packages (
    name TEXT PRIMARY KEY,
    project TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS types (
    qualified_name TEXT PRIMARY KEY,
    simple_name TEXT NOT NULL,
    package TEXT NOT NULL,
    kind TEXT NOT NULL,
    superclass TEXT,
    interfaces TEXT NOT NULL,
    declared_at TEXT NOT NULL,
    excerpt TEXT NOT NULL,
    project TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS methods (
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    return_type TEXT NOT NULL,
    parameters TEXT NOT NULL,
    modifiers TEXT NOT NULL,
    annotations TEXT NOT NULL,
    excerpt TEXT NOT NULL,
    is_constructor INTEGER NOT NULL DEFAULT 0,
    generated INTEGER NOT NULL DEFAULT 0,
    line INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (owner, name)
);

CREATE TABLE IF NOT EXISTS fields (
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    modifiers TEXT NOT NULL,
    annotations TEXT NOT NULL,
    PRIMARY KEY (owner, name)
);

CREATE TABLE IF NOT EXISTS calls (
    source_type TEXT NOT NULL,
    source_method TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_method TEXT NOT NULL,
    ordinal INTEGER NOT NULL,
    line INTEGER NOT NULL,
    PRIMARY KEY (source_type, source_method, target_type, target_method, ordinal)
);

CREATE TABLE IF NOT EXISTS components (
    name TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    owner_type TEXT NOT NULL,
    scope TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS component_deps (
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    kind TEXT NOT NULL,
    site TEXT NOT NULL,
    PRIMARY KEY (source, target, kind, site)
);

CREATE TABLE IF NOT EXISTS routes (
    path TEXT NOT NULL,
    http_method TEXT NOT NULL,
    full_path TEXT NOT NULL,
    owner_type TEXT NOT NULL,
    handler_method TEXT NOT NULL,
    PRIMARY KEY (full_path, http_method)
);

CREATE TABLE IF NOT EXISTS mappers (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS sql_statements (
    id TEXT NOT NULL,
    mapper TEXT NOT NULL,
    kind TEXT NOT NULL,
    raw_text TEXT NOT NULL,
    referenced_tables TEXT NOT NULL,
    PRIMARY KEY (id, mapper)
);

CREATE TABLE IF NOT EXISTS entities (
    qualified_name TEXT PRIMARY KEY,
    table_name TEXT
);

CREATE TABLE IF NOT EXISTS repositories (
    qualified_name TEXT PRIMARY KEY,
    entity_type TEXT
);

CREATE TABLE IF NOT EXISTS repository_queries (
    repository TEXT NOT NULL,
    method TEXT NOT NULL,
    query TEXT NOT NULL,
    PRIMARY KEY (repository, method)
);

CREATE INDEX IF NOT EXISTS idx_types_package ON types(package);
CREATE INDEX IF NOT EXISTS idx_methods_owner ON methods(owner);
CREATE INDEX IF NOT EXISTS idx_fields_owner ON fields(owner);
CREATE INDEX IF NOT EXISTS idx_calls_target ON calls(target_type);
CREATE INDEX IF NOT EXISTS idx_components_owner ON components(owner_type);
"#;

/// Node and edge counts, used for the run summary and idempotence checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreCounts {
    /// Packages stored.
    pub packages: usize,
    /// Types stored.
    pub types: usize,
    /// Methods stored.
    pub methods: usize,
    /// Fields stored.
    pub fields: usize,
    /// Call edges stored.
    pub call_edges: usize,
    /// Components stored.
    pub components: usize,
    /// Routes stored.
    pub routes: usize,
    /// Mapper interfaces stored.
    pub mappers: usize,
    /// SQL statements stored.
    pub sql_statements: usize,
    /// Entities stored.
    pub entities: usize,
    /// Repositories stored.
    pub repositories: usize,
    /// Repository queries stored.
    pub repository_queries: usize,
    /// Component dependency edges stored.
    pub dependencies: usize,
}

/// A candidate field-injection site: a field on a component-owning type.
#[derive(Debug, Clone)]
pub struct FieldSite {
    /// Qualified name of the owning type.
    pub owner_type: String,
    /// Field name (the dependency site identifier).
    pub field_name: String,
    /// Declared field type as written.
    pub field_type: String,
    /// Field annotations.
    pub annotations: Vec<Annotation>,
}

/// A candidate method-injection site: a constructor or setter on a
/// component-owning type.
#[derive(Debug, Clone)]
pub struct MethodSite {
    /// Qualified name of the owning type.
    pub owner_type: String,
    /// Method name.
    pub method_name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParamDecl>,
    /// Method annotations.
    pub annotations: Vec<Annotation>,
}

/// Graph store handle. All writes go through one owner; readers may open
/// their own read-only handles thanks to WAL.
pub struct GraphStore {
    conn: Connection,
    project: String,
}

impl GraphStore {
    /// Open or create a graph store at the given path.
    pub fn open(path: &Path, project: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;",
        )?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn,
            project: project.to_string(),
        })
    }

    /// Open an in-memory store; used by tests.
    pub fn open_in_memory(project: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            project: project.to_string(),
        })
    }

    /// Upsert a batch of packages in one transaction.
    pub fn upsert_packages(&mut self, packages: &[Package]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO packages (name, project) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET project = excluded.project",
            )?;
            for package in packages {
                stmt.execute(params![package.name, self.project])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of types with their members and call edges in one
    /// transaction, in dependency order: types first, then methods and
    /// fields, then call edges. The store never sees a member referencing a
    /// type it has not written in the same transaction.
    pub fn upsert_types(&mut self, types: &[TypeDecl]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut type_stmt = tx.prepare_cached(
                "INSERT INTO types (qualified_name, simple_name, package, kind, superclass,
                                    interfaces, declared_at, excerpt, project)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(qualified_name) DO UPDATE SET
                     simple_name = excluded.simple_name,
                     package = excluded.package,
                     kind = excluded.kind,
                     superclass = excluded.superclass,
                     interfaces = excluded.interfaces,
                     declared_at = excluded.declared_at,
                     excerpt = excluded.excerpt,
                     project = excluded.project",
            )?;
            for decl in types {
                type_stmt.execute(params![
                    decl.qualified_name,
                    decl.simple_name,
                    decl.package,
                    decl.kind.as_str(),
                    decl.superclass,
                    to_json(&decl.interfaces),
                    decl.declared_at,
                    decl.excerpt,
                    self.project,
                ])?;
            }

            let mut method_stmt = tx.prepare_cached(
                "INSERT INTO methods (owner, name, return_type, parameters, modifiers,
                                      annotations, excerpt, is_constructor, generated, line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(owner, name) DO UPDATE SET
                     return_type = excluded.return_type,
                     parameters = excluded.parameters,
                     modifiers = excluded.modifiers,
                     annotations = excluded.annotations,
                     excerpt = excluded.excerpt,
                     is_constructor = excluded.is_constructor,
                     generated = excluded.generated,
                     line = excluded.line",
            )?;
            let mut field_stmt = tx.prepare_cached(
                "INSERT INTO fields (owner, name, type, modifiers, annotations)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(owner, name) DO UPDATE SET
                     type = excluded.type,
                     modifiers = excluded.modifiers,
                     annotations = excluded.annotations",
            )?;
            for decl in types {
                for method in &decl.methods {
                    method_stmt.execute(params![
                        decl.qualified_name,
                        method.name,
                        method.return_type,
                        to_json(&method.parameters),
                        to_json(&method.modifiers),
                        to_json(&method.annotations),
                        method.excerpt,
                        method.is_constructor as i32,
                        method.generated as i32,
                        method.line,
                    ])?;
                }
                for field in &decl.fields {
                    field_stmt.execute(params![
                        decl.qualified_name,
                        field.name,
                        field.type_name,
                        to_json(&field.modifiers),
                        to_json(&field.annotations),
                    ])?;
                }
            }

            // Call edges are immutable once emitted: merge is insert-or-skip.
            let mut call_stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO calls
                     (source_type, source_method, target_type, target_method, ordinal, line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for decl in types {
                for call in &decl.calls {
                    call_stmt.execute(params![
                        call.source_type,
                        call.source_method,
                        call.target_type,
                        call.target_method,
                        call.ordinal,
                        call.line,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Upsert one batch of framework records in one transaction.
    pub fn upsert_framework(&mut self, records: &FrameworkRecords) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_components(&tx, &records.components)?;
        put_routes(&tx, &records.routes)?;
        put_mappers(&tx, &records.mappers)?;
        put_sql_statements(&tx, &records.sql_statements)?;
        put_entities(&tx, &records.entities)?;
        put_repositories(&tx, &records.repositories)?;
        put_repository_queries(&tx, &records.repository_queries)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of components by bean name.
    pub fn upsert_components(&mut self, components: &[Component]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_components(&tx, components)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of routes by (full_path, http_method). The full path
    /// carries the class-level prefix, so controllers sharing a method-level
    /// path stay distinct rows.
    pub fn upsert_routes(&mut self, routes: &[Route]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_routes(&tx, routes)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of mapper interfaces by qualified name.
    pub fn upsert_mappers(&mut self, mappers: &[MapperDecl]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_mappers(&tx, mappers)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of SQL statements by (id, mapper).
    pub fn upsert_sql_statements(&mut self, statements: &[SqlStatementDecl]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_sql_statements(&tx, statements)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of entities by qualified name.
    pub fn upsert_entities(&mut self, entities: &[EntityDecl]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_entities(&tx, entities)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of repositories by qualified name.
    pub fn upsert_repositories(&mut self, repositories: &[RepositoryDecl]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_repositories(&tx, repositories)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert a batch of repository query methods by (repository, method).
    pub fn upsert_repository_queries(&mut self, queries: &[RepositoryQuery]) -> Result<()> {
        let tx = self.conn.transaction()?;
        put_repository_queries(&tx, queries)?;
        tx.commit()?;
        Ok(())
    }

    /// All persisted components as (name, owner_type) pairs.
    pub fn component_index(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name, owner_type FROM components ORDER BY name")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut index = Vec::new();
        for row in rows {
            index.push(row?);
        }
        Ok(index)
    }

    /// Fields whose owning type is a persisted component.
    pub fn component_fields(&self) -> Result<Vec<FieldSite>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT f.owner, f.name, f.type, f.annotations
             FROM fields f
             JOIN components c ON c.owner_type = f.owner
             ORDER BY f.owner, f.name",
        )?;
        let rows = stmt.query_map([], |row| {
            let annotations: String = row.get(3)?;
            Ok(FieldSite {
                owner_type: row.get(0)?,
                field_name: row.get(1)?,
                field_type: row.get(2)?,
                annotations: from_json(&annotations),
            })
        })?;
        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?);
        }
        Ok(sites)
    }

    /// Constructors whose owning type is a persisted component.
    pub fn component_constructors(&self) -> Result<Vec<MethodSite>> {
        self.method_sites(
            "SELECT m.owner, m.name, m.parameters, m.annotations
             FROM methods m
             JOIN components c ON c.owner_type = m.owner
             WHERE m.is_constructor = 1
             ORDER BY m.owner, m.name",
        )
    }

    /// Setter-shaped methods whose owning type is a persisted component.
    pub fn component_setters(&self) -> Result<Vec<MethodSite>> {
        self.method_sites(
            "SELECT m.owner, m.name, m.parameters, m.annotations
             FROM methods m
             JOIN components c ON c.owner_type = m.owner
             WHERE m.is_constructor = 0 AND m.name LIKE 'set%'
             ORDER BY m.owner, m.name",
        )
    }

    fn method_sites(&self, sql: &str) -> Result<Vec<MethodSite>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map([], |row| {
            let parameters: String = row.get(2)?;
            let annotations: String = row.get(3)?;
            Ok(MethodSite {
                owner_type: row.get(0)?,
                method_name: row.get(1)?,
                parameters: from_json(&parameters),
                annotations: from_json(&annotations),
            })
        })?;
        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?);
        }
        Ok(sites)
    }

    /// Merge one dependency edge by its (source, target, kind, site) key.
    /// Returns whether a new edge was inserted.
    pub fn merge_dependency(&mut self, dep: &ComponentDependency) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO component_deps (source, target, kind, site)
             VALUES (?1, ?2, ?3, ?4)",
            params![dep.source, dep.target, dep.kind.as_str(), dep.site],
        )?;
        Ok(inserted > 0)
    }

    /// All dependency edges as (source, target, kind, site), sorted.
    pub fn dependencies(&self) -> Result<Vec<(String, String, String, String)>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source, target, kind, site FROM component_deps
             ORDER BY source, target, kind, site",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    /// Qualified names of all stored types, sorted; used by equivalence
    /// checks and downstream consumers.
    pub fn type_names(&self) -> Result<Vec<String>> {
        self.string_column("SELECT qualified_name FROM types ORDER BY qualified_name")
    }

    /// Names of all stored components, sorted.
    pub fn component_names(&self) -> Result<Vec<String>> {
        self.string_column("SELECT name FROM components ORDER BY name")
    }

    fn string_column(&self, sql: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }

    /// Current node and edge counts.
    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            packages: self.count("packages")?,
            types: self.count("types")?,
            methods: self.count("methods")?,
            fields: self.count("fields")?,
            call_edges: self.count("calls")?,
            components: self.count("components")?,
            routes: self.count("routes")?,
            mappers: self.count("mappers")?,
            sql_statements: self.count("sql_statements")?,
            entities: self.count("entities")?,
            repositories: self.count("repositories")?,
            repository_queries: self.count("repository_queries")?,
            dependencies: self.count("component_deps")?,
        })
    }

    fn count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: usize = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }
}

fn put_components(tx: &Transaction, components: &[Component]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO components (name, kind, owner_type, scope)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET
             kind = excluded.kind,
             owner_type = excluded.owner_type,
             scope = excluded.scope",
    )?;
    for component in components {
        stmt.execute(params![
            component.name,
            component.kind.as_str(),
            component.owner_type,
            component.scope,
        ])?;
    }
    Ok(())
}

fn put_routes(tx: &Transaction, routes: &[Route]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO routes (path, http_method, full_path, owner_type, handler_method)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(full_path, http_method) DO UPDATE SET
             path = excluded.path,
             owner_type = excluded.owner_type,
             handler_method = excluded.handler_method",
    )?;
    for route in routes {
        stmt.execute(params![
            route.path,
            route.http_method,
            route.full_path,
            route.owner_type,
            route.handler_method,
        ])?;
    }
    Ok(())
}

fn put_mappers(tx: &Transaction, mappers: &[MapperDecl]) -> Result<()> {
    let mut stmt = tx.prepare_cached("INSERT OR IGNORE INTO mappers (name) VALUES (?1)")?;
    for mapper in mappers {
        stmt.execute(params![mapper.name])?;
    }
    Ok(())
}

fn put_sql_statements(tx: &Transaction, statements: &[SqlStatementDecl]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO sql_statements (id, mapper, kind, raw_text, referenced_tables)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id, mapper) DO UPDATE SET
             kind = excluded.kind,
             raw_text = excluded.raw_text,
             referenced_tables = excluded.referenced_tables",
    )?;
    for sql in statements {
        stmt.execute(params![
            sql.id,
            sql.mapper,
            sql.kind.as_str(),
            sql.raw_text,
            to_json(&sql.referenced_tables),
        ])?;
    }
    Ok(())
}

fn put_entities(tx: &Transaction, entities: &[EntityDecl]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO entities (qualified_name, table_name) VALUES (?1, ?2)
         ON CONFLICT(qualified_name) DO UPDATE SET table_name = excluded.table_name",
    )?;
    for entity in entities {
        stmt.execute(params![entity.qualified_name, entity.table_name])?;
    }
    Ok(())
}

fn put_repositories(tx: &Transaction, repositories: &[RepositoryDecl]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO repositories (qualified_name, entity_type) VALUES (?1, ?2)
         ON CONFLICT(qualified_name) DO UPDATE SET entity_type = excluded.entity_type",
    )?;
    for repository in repositories {
        stmt.execute(params![repository.qualified_name, repository.entity_type])?;
    }
    Ok(())
}

fn put_repository_queries(tx: &Transaction, queries: &[RepositoryQuery]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO repository_queries (repository, method, query)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(repository, method) DO UPDATE SET query = excluded.query",
    )?;
    for query in queries {
        stmt.execute(params![query.repository, query.method, query.query])?;
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn from_json<T: serde::de::DeserializeOwned + Default>(text: &str) -> T {
    serde_json::from_str(text).unwrap_or_default()
}
