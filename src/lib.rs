//! Javelin: code-graph extractor for Java/Spring source trees.
//!
//! Parses a Java source tree with tree-sitter into a persisted, queryable
//! graph of packages, types, members, and heuristic call edges, plus
//! framework-derived records: managed components, HTTP routes, MyBatis
//! mappers and SQL statements, JPA entities, and Spring Data repositories.
//! Persistence runs in an in-memory batch mode or a bounded-memory streaming
//! mode; component wiring is resolved in a deferred pass over the committed
//! graph.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod cli;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod rules;
pub mod store;

/// Re-export common error types for convenience.
pub use error::{JavelinError, Result};

/// Re-export the store handle for convenience.
pub use store::GraphStore;

/// Javelin version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
