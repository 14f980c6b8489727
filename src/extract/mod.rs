//! Framework extractors.
//!
//! Pure, stateless, order-independent functions over a batch of type
//! declarations. Each record is derived from a single `TypeDecl`, so running
//! the extractors once over N types or N times over 1 type each yields the
//! identical aggregate result; the streaming pipeline relies on this to run
//! them per flush batch.

pub mod components;
pub mod persistence;
pub mod routes;

use crate::model::{
    Component, EntityDecl, MapperDecl, RepositoryDecl, RepositoryQuery, Route, SqlStatementDecl,
    TypeDecl,
};

/// Aggregate output of one extractor run over a type batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameworkRecords {
    /// Managed components.
    pub components: Vec<Component>,
    /// HTTP routes.
    pub routes: Vec<Route>,
    /// Mapper interfaces.
    pub mappers: Vec<MapperDecl>,
    /// Mapped SQL statements.
    pub sql_statements: Vec<SqlStatementDecl>,
    /// JPA entities.
    pub entities: Vec<EntityDecl>,
    /// Spring Data repositories.
    pub repositories: Vec<RepositoryDecl>,
    /// Declared repository query methods.
    pub repository_queries: Vec<RepositoryQuery>,
}

impl FrameworkRecords {
    /// Whether the batch produced no framework records at all.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.routes.is_empty()
            && self.mappers.is_empty()
            && self.sql_statements.is_empty()
            && self.entities.is_empty()
            && self.repositories.is_empty()
            && self.repository_queries.is_empty()
    }
}

/// Run all extractors over a batch of type declarations.
pub fn run_extractors(types: &[TypeDecl]) -> FrameworkRecords {
    let mut records = FrameworkRecords {
        components: components::extract_components(types),
        routes: routes::extract_routes(types),
        ..Default::default()
    };
    persistence::extract_persistence(types, &mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::walker::parse_compilation_unit;
    use std::path::Path;

    fn parse(source: &[u8]) -> Vec<TypeDecl> {
        parse_compilation_unit(Path::new("Test.java"), source).expect("parse")
    }

    #[test]
    fn test_batch_size_independence() {
        let source = b"package p;\n@Service\nclass A {}\n@RestController\nclass B {\n  @GetMapping(\"/x\")\n  String x() { return \"\"; }\n}\n@Entity\nclass C {}\n";
        let types = parse(source);

        let once = run_extractors(&types);
        let mut piecewise = FrameworkRecords::default();
        for decl in &types {
            let single = run_extractors(std::slice::from_ref(decl));
            piecewise.components.extend(single.components);
            piecewise.routes.extend(single.routes);
            piecewise.mappers.extend(single.mappers);
            piecewise.sql_statements.extend(single.sql_statements);
            piecewise.entities.extend(single.entities);
            piecewise.repositories.extend(single.repositories);
            piecewise.repository_queries.extend(single.repository_queries);
        }

        assert_eq!(once, piecewise);
    }

    #[test]
    fn test_idempotence() {
        let source = b"package p;\n@Service\nclass A {}\n";
        let types = parse(source);
        assert_eq!(run_extractors(&types), run_extractors(&types));
    }
}
