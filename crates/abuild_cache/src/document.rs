//! Persisted form of the build cache.
//!
//! The document is stored as `.abuild/cache.json` under the project root. It
//! records every project, source and header with its modified time and
//! scanned facts, plus the derived module table and the toolchain records.
//! A later run compares modified times against it to decide which files need
//! to be tokenized again, then rebuilds the entity graph from the stored
//! facts.
//!
//! Loading is strict: unknown or missing fields are parse errors. Only a
//! missing file or a document written by another format version is treated
//! as "no previous state".

use crate::error::CacheError;
use crate::store::BuildCache;
use abuild_config::Toolchain;
use abuild_scanner::{FileFacts, Import, Include, ModuleDeclaration, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory holding the cache document, relative to the project root.
pub const CACHE_DIR: &str = ".abuild";

/// File name of the cache document within [`CACHE_DIR`].
pub const CACHE_FILE: &str = "cache.json";

/// Format version written into every document.
pub const DOCUMENT_VERSION: u32 = 1;

/// The persisted build cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheDocument {
    /// Format version of this document.
    pub version: u32,
    /// Projects by name.
    pub projects: BTreeMap<String, ProjectEntry>,
    /// Sources by path.
    pub sources: BTreeMap<PathBuf, FileEntry>,
    /// Headers by path.
    pub headers: BTreeMap<PathBuf, FileEntry>,
    /// Modules by name, derived from the source declarations.
    pub modules: BTreeMap<String, ModuleEntry>,
    /// Toolchain records by name.
    pub toolchains: BTreeMap<String, Toolchain>,
}

/// The members of one project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectEntry {
    /// Source paths in registration order.
    pub sources: Vec<PathBuf>,
    /// Header paths in registration order.
    pub headers: Vec<PathBuf>,
}

/// One source or header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Name of the owning project.
    pub project: String,
    /// Modified time in seconds since the Unix epoch.
    pub modified: i64,
    /// Include directives.
    pub includes: Vec<Include>,
    /// Import declarations.
    pub imports: Vec<Import>,
    /// The module declaration of a source, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<ModuleDeclaration>,
}

impl FileEntry {
    /// Reassembles the scanned facts of this file.
    pub fn facts(&self) -> FileFacts {
        FileFacts {
            includes: self.includes.clone(),
            imports: self.imports.clone(),
            declaration: self.declaration.clone(),
        }
    }
}

/// One module with its partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    /// Visibility of the interface declaration.
    pub visibility: Visibility,
    /// Path of the interface source, once declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Partitions by name.
    pub partitions: BTreeMap<String, PartitionEntry>,
}

/// One module partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionEntry {
    /// Visibility of the partition declaration.
    pub visibility: Visibility,
    /// Path of the declaring source.
    pub source: PathBuf,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl Default for CacheDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheDocument {
    /// Creates an empty document of the current version.
    pub fn new() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            projects: BTreeMap::new(),
            sources: BTreeMap::new(),
            headers: BTreeMap::new(),
            modules: BTreeMap::new(),
            toolchains: BTreeMap::new(),
        }
    }

    /// Returns where the document of the tree rooted at `root` lives.
    pub fn path_for_root(root: &Path) -> PathBuf {
        root.join(CACHE_DIR).join(CACHE_FILE)
    }

    /// Loads a document.
    ///
    /// Returns `Ok(None)` when the file does not exist or was written by a
    /// different format version. Any other read failure, malformed JSON,
    /// schema mismatch or inconsistent content is an error.
    pub fn load(path: &Path) -> Result<Option<Self>, CacheError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache document");
                return Ok(None);
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let parse_error = |e: serde_json::Error| CacheError::DocumentParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let probe: VersionProbe = serde_json::from_str(&content).map_err(parse_error)?;
        if probe.version != DOCUMENT_VERSION {
            warn!(
                path = %path.display(),
                found = probe.version,
                expected = DOCUMENT_VERSION,
                "discarding cache document written by another version"
            );
            return Ok(None);
        }

        let document: Self = serde_json::from_str(&content).map_err(parse_error)?;
        document.validate()?;
        Ok(Some(document))
    }

    /// Writes the document as pretty-printed JSON, creating the parent
    /// directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Returns the source or header entry recorded for `path`.
    pub fn file(&self, path: &Path) -> Option<&FileEntry> {
        self.sources.get(path).or_else(|| self.headers.get(path))
    }

    /// Checks that the project table and the file tables agree.
    pub fn validate(&self) -> Result<(), CacheError> {
        if let Some(path) = self.sources.keys().find(|p| self.headers.contains_key(*p)) {
            return Err(invalid(format!(
                "{} is recorded as both a source and a header",
                path.display()
            )));
        }
        for (kind, files) in [("source", &self.sources), ("header", &self.headers)] {
            for (path, entry) in files {
                let Some(project) = self.projects.get(&entry.project) else {
                    return Err(invalid(format!(
                        "{kind} {} belongs to unknown project '{}'",
                        path.display(),
                        entry.project
                    )));
                };
                let members = if kind == "source" {
                    &project.sources
                } else {
                    &project.headers
                };
                if !members.contains(path) {
                    return Err(invalid(format!(
                        "project '{}' does not list {kind} {}",
                        entry.project,
                        path.display()
                    )));
                }
            }
        }
        for (name, project) in &self.projects {
            let listed = project
                .sources
                .iter()
                .map(|p| (p, self.sources.contains_key(p)))
                .chain(project.headers.iter().map(|p| (p, self.headers.contains_key(p))));
            for (path, known) in listed {
                if !known {
                    return Err(invalid(format!(
                        "project '{name}' lists unrecorded file {}",
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> CacheError {
    CacheError::InvalidDocument { reason }
}

impl BuildCache {
    /// Captures the current state as a document.
    pub fn to_document(&self) -> CacheDocument {
        let mut document = CacheDocument::new();

        for project in self.projects().values() {
            document.projects.insert(
                project.name.clone(),
                ProjectEntry {
                    sources: project
                        .sources
                        .iter()
                        .map(|&id| self.sources()[id].path.clone())
                        .collect(),
                    headers: project
                        .headers
                        .iter()
                        .map(|&id| self.headers()[id].path.clone())
                        .collect(),
                },
            );
        }

        for source in self.sources().values() {
            let project = &self.projects()[source.project].name;
            let entry = file_entry(project, source.modified, &source.facts);
            document.sources.insert(source.path.clone(), entry);
        }
        for header in self.headers().values() {
            let project = &self.projects()[header.project].name;
            let entry = file_entry(project, header.modified, &header.facts);
            document.headers.insert(header.path.clone(), entry);
        }

        for module in self.modules().values() {
            let partitions = module
                .partitions
                .iter()
                .map(|&id| {
                    let partition = &self.partitions()[id];
                    (
                        partition.name.clone(),
                        PartitionEntry {
                            visibility: partition.visibility,
                            source: self.sources()[partition.source].path.clone(),
                        },
                    )
                })
                .collect();
            document.modules.insert(
                module.name.clone(),
                ModuleEntry {
                    visibility: module.visibility,
                    source: module.source.map(|id| self.sources()[id].path.clone()),
                    partitions,
                },
            );
        }

        document.toolchains = self.toolchains().clone();
        document
    }

    /// Rebuilds a cache from a document.
    ///
    /// Modules and partitions are derived again from the stored declarations,
    /// so conflicts are reported exactly as a fresh scan would report them.
    pub fn from_document(document: &CacheDocument) -> Result<BuildCache, CacheError> {
        document.validate()?;
        let mut cache = BuildCache::new();
        for (path, entry) in &document.sources {
            cache.record_source(path.clone(), &entry.project, entry.modified, entry.facts())?;
        }
        for (path, entry) in &document.headers {
            cache.record_header(path.clone(), &entry.project, entry.modified, entry.facts())?;
        }
        for (name, toolchain) in &document.toolchains {
            cache.add_toolchain(name.clone(), toolchain.clone());
        }
        Ok(cache)
    }
}

fn file_entry(project: &str, modified: i64, facts: &FileFacts) -> FileEntry {
    FileEntry {
        project: project.to_string(),
        modified,
        includes: facts.includes.clone(),
        imports: facts.imports.clone(),
        declaration: facts.declaration.clone(),
    }
}
