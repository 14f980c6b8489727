//! Javelin CLI binary.
//!
//! Thin adapter over the library APIs; no scanning or storage logic lives
//! here.

use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = javelin::cli::parse_args();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    let result = match cli.command {
        javelin::cli::Commands::Scan {
            root,
            db,
            project,
            streaming,
            workers,
            batch_size,
            json,
        } => execute_scan(&root, &db, &project, streaming, workers, batch_size, json),
        javelin::cli::Commands::Stats { db, json } => execute_stats(&db, json),
    };

    match result {
        Ok(msg) => {
            println!("{}", msg);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn execute_scan(
    root: &Path,
    db: &Path,
    project: &str,
    streaming: bool,
    workers: usize,
    batch_size: usize,
    json: bool,
) -> Result<String, javelin::JavelinError> {
    let options = javelin::pipeline::ScanOptions {
        root: root.to_path_buf(),
        db: db.to_path_buf(),
        project: project.to_string(),
        streaming,
        workers,
        batch_size,
    };

    let stats = javelin::pipeline::run_scan(&options)?;

    if json {
        return serde_json::to_string_pretty(&stats)
            .map_err(|e| javelin::JavelinError::Other(format!("serialize stats: {}", e)));
    }

    Ok(format!(
        "{}\n  types: {}, methods: {}, fields: {}, calls: {}\n  components: {}, routes: {}, dependencies: {}\n  mappers: {}, sql statements: {}, entities: {}, repositories: {}",
        stats.message,
        stats.types,
        stats.methods,
        stats.fields,
        stats.call_edges,
        stats.components,
        stats.routes,
        stats.dependencies,
        stats.mappers,
        stats.sql_statements,
        stats.entities,
        stats.repositories,
    ))
}

fn execute_stats(db: &Path, json: bool) -> Result<String, javelin::JavelinError> {
    if !db.is_file() {
        return Err(javelin::JavelinError::Config(format!(
            "graph database not found: {}",
            db.display()
        )));
    }

    let store = javelin::store::GraphStore::open(db, "")?;
    let counts = store.counts()?;

    if json {
        return serde_json::to_string_pretty(&counts)
            .map_err(|e| javelin::JavelinError::Other(format!("serialize counts: {}", e)));
    }

    Ok(format!(
        "packages: {}\ntypes: {}\nmethods: {}\nfields: {}\ncalls: {}\ncomponents: {}\ndependencies: {}\nroutes: {}\nmappers: {}\nsql statements: {}\nentities: {}\nrepositories: {}\nrepository queries: {}",
        counts.packages,
        counts.types,
        counts.methods,
        counts.fields,
        counts.call_edges,
        counts.components,
        counts.dependencies,
        counts.routes,
        counts.mappers,
        counts.sql_statements,
        counts.entities,
        counts.repositories,
        counts.repository_queries,
    ))
}
