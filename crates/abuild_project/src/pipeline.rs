//! The incremental scan of a project tree.
//!
//! One run:
//!
//! 1. loads the previous [`CacheDocument`] of the tree, if any;
//! 2. discovers the tracked files with [`ProjectScanner`];
//! 3. reuses the stored facts of every file whose modified time is unchanged
//!    and tokenizes the rest in parallel;
//! 4. records everything, in discovery order, into a fresh [`BuildCache`];
//! 5. validates imports and computes the compile order;
//! 6. saves the new document.

use crate::classify::FileClass;
use crate::error::ProjectError;
use crate::scanner::{DiscoveredFile, ProjectScanner};
use abuild_cache::{detect_changes, BuildCache, CacheDocument, ChangeSet, Resolver};
use abuild_common::{InternalError, SourceId};
use abuild_config::{load_config, AbuildConfig};
use abuild_diagnostics::{Diagnostic, DiagnosticCode, Location};
use abuild_scanner::{scan_source, FileFacts, ScanResult};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What one scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of tracked files found on disk.
    pub discovered: usize,
    /// Files whose content was read and tokenized, in discovery order.
    pub tokenized: Vec<PathBuf>,
    /// Number of files whose stored facts were reused.
    pub reused: usize,
    /// Comparison of the tree against the previous document.
    pub changes: ChangeSet,
}

/// The result of a scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The populated cache, including its Error and Warning logs.
    pub cache: BuildCache,
    /// Counters describing the run.
    pub report: ScanReport,
    /// Sources ordered so that module units precede their importers, or
    /// `None` when imports form a cycle.
    pub compile_order: Option<Vec<SourceId>>,
}

/// Loads `abuild.toml` from `root` (defaults when absent) and scans the tree.
pub fn scan_project(root: &Path) -> Result<ScanOutcome, ProjectError> {
    let config = load_config(root)?;
    scan(root, &config)
}

/// Scans the tree under `root` incrementally and persists the result.
pub fn scan(root: &Path, config: &AbuildConfig) -> Result<ScanOutcome, ProjectError> {
    let document_path = CacheDocument::path_for_root(root);
    let previous = CacheDocument::load(&document_path)?.unwrap_or_default();
    let discovery = ProjectScanner::new(&config.settings).discover(root)?;

    let current: HashMap<PathBuf, i64> = discovery
        .files
        .iter()
        .map(|file| (file.path.clone(), file.modified))
        .collect();
    let changes = detect_changes(&current, &previous);

    let reused: Vec<Option<FileFacts>> = discovery
        .files
        .iter()
        .map(|file| reusable_facts(&previous, file))
        .collect();
    let stale: Vec<&DiscoveredFile> = discovery
        .files
        .iter()
        .zip(&reused)
        .filter(|(_, facts)| facts.is_none())
        .map(|(file, _)| file)
        .collect();
    let mut scanned = stale
        .par_iter()
        .map(|file| tokenize_file(&file.path))
        .collect::<Vec<_>>()
        .into_iter();

    let mut cache = BuildCache::new();
    for (name, toolchain) in &config.toolchains {
        cache.add_toolchain(name.clone(), toolchain.clone());
    }
    for diagnostic in discovery.diagnostics {
        cache.add_diagnostic(diagnostic);
    }

    let mut report = ScanReport {
        discovered: discovery.files.len(),
        changes,
        ..ScanReport::default()
    };

    for (file, stored) in discovery.files.iter().zip(reused) {
        let facts = match stored {
            Some(facts) => {
                debug!(path = %file.path.display(), "reusing stored facts");
                report.reused += 1;
                facts
            }
            None => match scanned.next() {
                Some(Ok(result)) => {
                    debug!(path = %file.path.display(), "tokenized");
                    report.tokenized.push(file.path.clone());
                    for diagnostic in result.diagnostics {
                        cache.add_diagnostic(diagnostic);
                    }
                    result.facts
                }
                Some(Err(e)) => {
                    warn!(path = %file.path.display(), error = %e, "skipping unreadable file");
                    cache.add_error(
                        Diagnostic::error(
                            DiagnosticCode::UNREADABLE,
                            format!("cannot read {}: {e}", file.path.display()),
                        )
                        .at(Location::file(&file.path)),
                    );
                    continue;
                }
                None => {
                    return Err(InternalError::new("fewer scan results than stale files").into())
                }
            },
        };

        match file.class {
            FileClass::Source => {
                cache.record_source(file.path.clone(), &file.project, file.modified, facts)?;
            }
            FileClass::Header => {
                cache.record_header(file.path.clone(), &file.project, file.modified, facts)?;
            }
        }
    }

    for warning in Resolver::new(&cache).validate_imports() {
        cache.add_warning(warning);
    }
    let order = Resolver::new(&cache).compile_order();
    let compile_order = match order {
        Ok(order) => Some(order),
        Err(cycle) => {
            warn!(reason = %cycle.message, "no compile order");
            cache.add_error(cycle);
            None
        }
    };

    cache.to_document().save(&document_path)?;

    info!(
        root = %root.display(),
        discovered = report.discovered,
        tokenized = report.tokenized.len(),
        reused = report.reused,
        errors = cache.errors().len(),
        warnings = cache.warnings().len(),
        "scan complete"
    );

    Ok(ScanOutcome {
        cache,
        report,
        compile_order,
    })
}

/// The stored facts of `file`, when the previous run recorded it with the
/// same class and modified time.
fn reusable_facts(previous: &CacheDocument, file: &DiscoveredFile) -> Option<FileFacts> {
    let entry = match file.class {
        FileClass::Source => previous.sources.get(&file.path),
        FileClass::Header => previous.headers.get(&file.path),
    }?;
    (entry.modified == file.modified).then(|| entry.facts())
}

fn tokenize_file(path: &Path) -> io::Result<ScanResult> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(scan_source(&text, path))
}
