//! Persistence-artifact derivation: MyBatis mappers and SQL statements, JPA
//! entities, Spring Data repositories and their declared queries.

use crate::extract::FrameworkRecords;
use crate::ingest::symbols::strip_generics;
use crate::model::{
    EntityDecl, MapperDecl, RepositoryDecl, RepositoryQuery, SqlKind, SqlStatementDecl, TypeDecl,
    TypeKind,
};

/// Statement annotations with their SQL kind.
const STATEMENT_ANNOTATIONS: &[(&str, SqlKind)] = &[
    ("Select", SqlKind::Select),
    ("Insert", SqlKind::Insert),
    ("Update", SqlKind::Update),
    ("Delete", SqlKind::Delete),
];

/// Spring Data repository supertypes that mark an interface as a repository.
const REPOSITORY_SUPERTYPES: &[&str] = &[
    "JpaRepository",
    "CrudRepository",
    "PagingAndSortingRepository",
    "MongoRepository",
    "Repository",
];

/// Derive persistence artifacts from a batch of type declarations.
pub fn extract_persistence(types: &[TypeDecl], records: &mut FrameworkRecords) {
    for decl in types {
        extract_mapper(decl, records);
        extract_entity(decl, records);
        extract_repository(decl, records);
    }
}

/// A `Mapper`-annotated interface and its annotated statement methods.
fn extract_mapper(decl: &TypeDecl, records: &mut FrameworkRecords) {
    if decl.kind != TypeKind::Interface || !has_annotation(decl, "Mapper") {
        return;
    }

    records.mappers.push(MapperDecl {
        name: decl.qualified_name.clone(),
    });

    for method in &decl.methods {
        for annotation in &method.annotations {
            for (name, kind) in STATEMENT_ANNOTATIONS {
                if annotation.name == *name {
                    let raw_text = annotation.value().unwrap_or_default().to_string();
                    records.sql_statements.push(SqlStatementDecl {
                        id: method.name.clone(),
                        mapper: decl.qualified_name.clone(),
                        kind: *kind,
                        referenced_tables: referenced_tables(&raw_text),
                        raw_text,
                    });
                }
            }
        }
    }
}

/// An `Entity`-annotated class, with its mapped table when declared.
fn extract_entity(decl: &TypeDecl, records: &mut FrameworkRecords) {
    if decl.kind != TypeKind::Class || !has_annotation(decl, "Entity") {
        return;
    }

    let table_name = decl
        .annotations
        .iter()
        .find(|a| a.name == "Table")
        .and_then(|a| a.get("name").or_else(|| a.value()))
        .map(|s| s.to_string());

    records.entities.push(EntityDecl {
        qualified_name: decl.qualified_name.clone(),
        table_name,
    });
}

/// An interface extending a Spring Data repository supertype, with its
/// `Query`-annotated methods.
fn extract_repository(decl: &TypeDecl, records: &mut FrameworkRecords) {
    if decl.kind != TypeKind::Interface {
        return;
    }

    let Some(supertype) = decl.interfaces.iter().find(|reference| {
        let base = strip_generics(reference);
        let simple = base.rsplit('.').next().unwrap_or(base);
        REPOSITORY_SUPERTYPES.contains(&simple)
    }) else {
        return;
    };

    records.repositories.push(RepositoryDecl {
        qualified_name: decl.qualified_name.clone(),
        entity_type: first_type_argument(supertype),
    });

    for method in &decl.methods {
        if let Some(annotation) = method.annotations.iter().find(|a| a.name == "Query") {
            records.repository_queries.push(RepositoryQuery {
                repository: decl.qualified_name.clone(),
                method: method.name.clone(),
                query: annotation.value().unwrap_or_default().to_string(),
            });
        }
    }
}

fn has_annotation(decl: &TypeDecl, name: &str) -> bool {
    decl.annotations.iter().any(|a| a.name == name)
}

/// First generic argument of a supertype reference
/// (`JpaRepository<User, Long>` → `User`).
fn first_type_argument(reference: &str) -> Option<String> {
    let open = reference.find('<')?;
    let inner = &reference[open + 1..reference.rfind('>')?];
    let first = inner.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Table names referenced by FROM/JOIN/INTO/UPDATE clauses, deduplicated in
/// first-seen order. Best-effort token scan; subqueries and quoting are out
/// of reach without a SQL parser.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let mut tables = Vec::new();
    let tokens: Vec<&str> = sql.split_whitespace().collect();

    for window in tokens.windows(2) {
        let keyword = window[0].to_ascii_uppercase();
        if matches!(keyword.as_str(), "FROM" | "JOIN" | "INTO" | "UPDATE") {
            let table = window[1]
                .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .to_string();
            if !table.is_empty()
                && !table.eq_ignore_ascii_case("select")
                && !tables.contains(&table)
            {
                tables.push(table);
            }
        }
    }

    tables
}
