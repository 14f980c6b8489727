//! Scan pipeline.
//!
//! Two persistence modes over the same parse and extract functions:
//!
//! * **Batch**: parse every file sequentially, hold all declarations in
//!   memory, write the whole graph in dependency order. Simple, and fine for
//!   small and medium trees.
//! * **Streaming**: bounded memory. A package pre-scan runs first, then a
//!   worker pool parses files in parallel and hands results over a bounded
//!   channel to a single orchestrator that buffers arrivals and flushes them
//!   to the store every `batch_size` files, with a tail flush for the
//!   remainder. A store failure flips a cancellation flag that stops the
//!   feeder and the workers.
//!
//! Both modes end with the dependency resolver running against the committed
//! graph, so both produce identical stores for the same tree.

use crate::error::{JavelinError, Result};
use crate::extract::run_extractors;
use crate::ingest::{self, package_scan};
use crate::model::{Package, RunStats, TypeDecl};
use crate::resolve::DependencyResolver;
use crate::rules::{NoRules, RuleProvider};
use crate::store::GraphStore;
use crossbeam_channel::bounded;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Scan configuration, validated before any work begins.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Root directory of the source tree.
    pub root: PathBuf,
    /// Path of the graph database file.
    pub db: PathBuf,
    /// Project label stored with every package and type.
    pub project: String,
    /// Use the bounded-memory streaming mode.
    pub streaming: bool,
    /// Parse worker count for streaming mode; 0 means one per CPU.
    pub workers: usize,
    /// Files per flush batch in streaming mode.
    pub batch_size: usize,
}

impl ScanOptions {
    /// Reject configurations that could not produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(JavelinError::Config("project name is empty".to_string()));
        }
        if self.streaming && self.batch_size == 0 {
            return Err(JavelinError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

/// Run a full scan: discover, parse, persist, resolve. Returns the run
/// summary; every discovered file is either processed or counted as an
/// error.
pub fn run_scan(options: &ScanOptions) -> Result<RunStats> {
    run_scan_with_rules(options, &NoRules)
}

/// Run a full scan with an extraction-rule provider. Rules enrich stored
/// excerpts only; they never affect what is extracted or resolved.
pub fn run_scan_with_rules(options: &ScanOptions, rules: &dyn RuleProvider) -> Result<RunStats> {
    options.validate()?;

    let files = ingest::discover_sources(&options.root)?;
    let mut store = GraphStore::open(&options.db, &options.project)?;

    info!(
        "scanning {} files under {} ({} mode)",
        files.len(),
        options.root.display(),
        if options.streaming { "streaming" } else { "batch" }
    );

    let mut stats = RunStats {
        total_files: files.len(),
        ..Default::default()
    };

    if options.streaming {
        run_streaming(options, rules, &files, &mut store, &mut stats)?;
    } else {
        run_batch(options, rules, &files, &mut store, &mut stats)?;
    }

    let mut resolver = DependencyResolver::new(&mut store);
    resolver.run()?;

    let counts = store.counts()?;
    stats.packages = counts.packages;
    stats.types = counts.types;
    stats.methods = counts.methods;
    stats.fields = counts.fields;
    stats.call_edges = counts.call_edges;
    stats.components = counts.components;
    stats.routes = counts.routes;
    stats.mappers = counts.mappers;
    stats.sql_statements = counts.sql_statements;
    stats.entities = counts.entities;
    stats.repositories = counts.repositories;
    stats.repository_queries = counts.repository_queries;
    stats.dependencies = counts.dependencies;

    stats.success = stats.error_files == 0;
    stats.message = if stats.success {
        format!("scanned {} files", stats.processed_files)
    } else {
        format!(
            "scanned {} files, skipped {} after parse errors",
            stats.processed_files, stats.error_files
        )
    };

    Ok(stats)
}

/// Sequential in-memory mode: everything parsed, then everything written.
fn run_batch(
    options: &ScanOptions,
    rules: &dyn RuleProvider,
    files: &[PathBuf],
    store: &mut GraphStore,
    stats: &mut RunStats,
) -> Result<()> {
    let mut all_types = Vec::new();

    for path in files {
        match ingest::parse_source_file(path) {
            Ok(types) => {
                all_types.extend(types);
                stats.processed_files += 1;
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                stats.error_files += 1;
            }
        }
    }

    let packages: BTreeSet<String> = all_types
        .iter()
        .filter(|t| !t.package.is_empty())
        .map(|t| t.package.clone())
        .collect();
    let packages: Vec<Package> = packages.into_iter().map(|name| Package { name }).collect();

    apply_rules(&options.project, rules, &mut all_types);
    store.upsert_packages(&packages)?;
    store.upsert_types(&all_types)?;
    store.upsert_framework(&run_extractors(&all_types))?;
    Ok(())
}

/// Bounded-memory mode: pre-scan packages, then parse in parallel and flush
/// arrival-order batches from a single writer.
fn run_streaming(
    options: &ScanOptions,
    rules: &dyn RuleProvider,
    files: &[PathBuf],
    store: &mut GraphStore,
    stats: &mut RunStats,
) -> Result<()> {
    let packages = package_scan::prescan_packages(files);
    store.upsert_packages(&packages)?;
    debug!("pre-scan found {} packages", packages.len());

    let workers = options.effective_workers();
    let capacity = workers * 2;
    let cancel = AtomicBool::new(false);
    let progress_step = (files.len() / 10).max(1);

    let (path_tx, path_rx) = bounded::<PathBuf>(capacity);
    let (result_tx, result_rx) = bounded::<(PathBuf, Result<Vec<TypeDecl>>)>(capacity);

    let mut failure: Option<JavelinError> = None;
    let mut buffer: Vec<TypeDecl> = Vec::new();
    let mut buffered_files = 0usize;

    std::thread::scope(|scope| {
        // Feeder owns its sender so the path channel closes once every file
        // is submitted (or cancellation hits).
        let cancel_ref = &cancel;
        scope.spawn(move || {
            for path in files {
                if cancel_ref.load(Ordering::Relaxed) {
                    break;
                }
                if path_tx.send(path.clone()).is_err() {
                    break;
                }
            }
        });

        for _ in 0..workers {
            let path_rx = path_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = &cancel;
            scope.spawn(move || {
                while let Ok(path) = path_rx.recv() {
                    if cancel.load(Ordering::Relaxed) {
                        continue;
                    }
                    let parsed = ingest::parse_source_file(&path);
                    if result_tx.send((path, parsed)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(path_rx);
        drop(result_tx);

        // Single writer: results arrive in completion order, which is fine
        // because every record merges on a natural key.
        for (path, parsed) in result_rx.iter() {
            if failure.is_some() {
                continue;
            }
            match parsed {
                Ok(types) => {
                    buffer.extend(types);
                    stats.processed_files += 1;
                }
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    stats.error_files += 1;
                }
            }

            buffered_files += 1;
            if buffered_files >= options.batch_size {
                if let Err(e) = flush_with_retry(store, &options.project, rules, &mut buffer) {
                    cancel.store(true, Ordering::Relaxed);
                    failure = Some(e);
                }
                buffered_files = 0;
            }

            let done = stats.processed_files + stats.error_files;
            if done % progress_step == 0 {
                info!("progress: {}/{} files", done, files.len());
            }
        }
    });

    if let Some(e) = failure {
        return Err(e);
    }

    flush_with_retry(store, &options.project, rules, &mut buffer)
}

/// Flush with one retry. Transient write failures (e.g. a briefly held lock)
/// should not kill the run; the buffer is only cleared on success, so the
/// retry re-submits the whole batch. Applies to the tail batch as well.
fn flush_with_retry(
    store: &mut GraphStore,
    project: &str,
    rules: &dyn RuleProvider,
    buffer: &mut Vec<TypeDecl>,
) -> Result<()> {
    if let Err(first) = flush(store, project, rules, buffer) {
        warn!("batch flush failed, retrying: {}", first);
        return flush(store, project, rules, buffer);
    }
    Ok(())
}

/// Write one buffered batch: types with members and calls, then the
/// framework records derived from exactly this batch.
fn flush(
    store: &mut GraphStore,
    project: &str,
    rules: &dyn RuleProvider,
    buffer: &mut Vec<TypeDecl>,
) -> Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    apply_rules(project, rules, buffer);
    store.upsert_types(buffer)?;
    store.upsert_framework(&run_extractors(buffer))?;
    buffer.clear();
    Ok(())
}

/// Append rule notes to matching excerpts. Idempotent, so a rescan does not
/// stack notes.
fn apply_rules(project: &str, rules: &dyn RuleProvider, types: &mut [TypeDecl]) {
    for decl in types {
        if let Some(rule) = rules.lookup(project, decl.kind.as_str()) {
            if !decl.excerpt.contains(&rule.note) {
                if !decl.excerpt.is_empty() {
                    decl.excerpt.push('\n');
                }
                decl.excerpt.push_str(&rule.note);
            }
        }
    }
}
