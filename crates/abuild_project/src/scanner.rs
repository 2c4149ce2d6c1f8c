//! Depth-first discovery of sources and headers.

use crate::classify::{classify_directory, classify_file, DirectoryClass, FileClass};
use crate::error::ProjectError;
use crate::project_name::project_name;
use abuild_cache::BuildCache;
use abuild_config::Settings;
use abuild_diagnostics::{Diagnostic, DiagnosticCode, Location};
use std::fs::{self, DirEntry, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

/// A tracked file found on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path below the scanned root.
    pub path: PathBuf,
    /// The project the file belongs to.
    pub project: String,
    /// Source or header.
    pub class: FileClass,
    /// Last modified time in seconds since the Unix epoch.
    pub modified: i64,
}

/// Everything one walk found.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Tracked files in discovery order.
    pub files: Vec<DiscoveredFile>,
    /// One [`UNREADABLE`](DiagnosticCode::UNREADABLE) error per directory or
    /// file that could not be inspected.
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks a directory tree and classifies what it finds.
///
/// Entries of each directory are visited in file name order, files and
/// subdirectories interleaved, so that discovery order is reproducible.
/// Symbolic links to files are followed; links to directories are not.
pub struct ProjectScanner<'a> {
    settings: &'a Settings,
}

impl<'a> ProjectScanner<'a> {
    /// Creates a scanner applying `settings`.
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Walks `root`.
    ///
    /// Only an unreadable root is an error. Unreadable subdirectories and
    /// files are reported in [`Discovery::diagnostics`] and skipped.
    pub fn discover(&self, root: &Path) -> Result<Discovery, ProjectError> {
        let entries = read_sorted(root).map_err(|e| ProjectError::Root {
            path: root.to_path_buf(),
            source: e,
        })?;
        let mut discovery = Discovery::default();
        self.walk(root, entries, &mut discovery);
        debug!(
            root = %root.display(),
            files = discovery.files.len(),
            "discovered files"
        );
        Ok(discovery)
    }

    /// Walks `root` and registers every tracked file with `cache`, without
    /// reading file content. Returns the number of files registered.
    pub fn register(&self, root: &Path, cache: &mut BuildCache) -> Result<usize, ProjectError> {
        let discovery = self.discover(root)?;
        for diagnostic in discovery.diagnostics {
            cache.add_diagnostic(diagnostic);
        }
        for file in &discovery.files {
            match file.class {
                FileClass::Source => {
                    cache.add_source(file.path.clone(), &file.project, file.modified)?;
                }
                FileClass::Header => {
                    cache.add_header(file.path.clone(), &file.project, file.modified)?;
                }
            }
        }
        Ok(discovery.files.len())
    }

    fn walk(&self, dir: &Path, entries: Vec<DirEntry>, discovery: &mut Discovery) {
        let project = project_name(self.settings, dir);
        debug!(dir = %dir.display(), project = %project, "scanning directory");

        for entry in entries {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    unreadable(discovery, &path, &e);
                    continue;
                }
            };

            if file_type.is_dir() {
                let name = entry.file_name();
                let class = classify_directory(self.settings, &name.to_string_lossy());
                if class == DirectoryClass::Ignore {
                    debug!(dir = %path.display(), "ignoring directory");
                    continue;
                }
                match read_sorted(&path) {
                    Ok(children) => self.walk(&path, children, discovery),
                    Err(e) => unreadable(discovery, &path, &e),
                }
                continue;
            }

            let Some(class) = classify_file(self.settings, &path) else {
                continue;
            };
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    unreadable(discovery, &path, &e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            match modified_seconds(&metadata) {
                Ok(modified) => discovery.files.push(DiscoveredFile {
                    path,
                    project: project.clone(),
                    class,
                    modified,
                }),
                Err(e) => unreadable(discovery, &path, &e),
            }
        }
    }
}

fn read_sorted(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

fn unreadable(discovery: &mut Discovery, path: &Path, error: &io::Error) {
    warn!(path = %path.display(), %error, "skipping unreadable entry");
    discovery.diagnostics.push(
        Diagnostic::error(
            DiagnosticCode::UNREADABLE,
            format!("cannot read {}: {error}", path.display()),
        )
        .at(Location::file(path)),
    );
}

/// Modified time in whole seconds relative to the Unix epoch, negative for
/// times before it.
fn modified_seconds(metadata: &Metadata) -> io::Result<i64> {
    let modified = metadata.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let err = ProjectScanner::new(&settings)
            .discover(&dir.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, ProjectError::Root { .. }));
    }

    #[test]
    fn files_are_attributed_to_projects() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        touch(&root.join("main.cpp"));
        touch(&root.join("foo/src/foo.cpp"));
        touch(&root.join("foo/include/foo.hpp"));
        touch(&root.join("foo/tests/foo_test.cpp"));
        touch(&root.join("foo/Tests/FooTest.cpp"));
        touch(&root.join("foo/notes.txt"));

        let settings = Settings::default();
        let discovery = ProjectScanner::new(&settings).discover(&root).unwrap();
        let found: Vec<(String, String)> = discovery
            .files
            .iter()
            .map(|f| {
                let name = f.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, f.project.clone())
            })
            .collect();

        assert!(found.contains(&("main.cpp".to_string(), "proj".to_string())));
        assert!(found.contains(&("foo.cpp".to_string(), "foo".to_string())));
        assert!(found.contains(&("foo.hpp".to_string(), "foo".to_string())));
        assert!(found.contains(&("foo_test.cpp".to_string(), "foo_tests".to_string())));
        assert!(found.contains(&("FooTest.cpp".to_string(), "fooTests".to_string())));
        assert_eq!(found.len(), 5);
        assert!(discovery.diagnostics.is_empty());
    }

    #[test]
    fn ignored_directories_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        touch(&root.join(".git/hooks/hook.cpp"));
        touch(&root.join("build/gen.cpp"));
        touch(&root.join("app/app.cpp"));

        let settings = Settings::default();
        let discovery = ProjectScanner::new(&settings).discover(&root).unwrap();
        assert_eq!(discovery.files.len(), 1);
        assert_eq!(discovery.files[0].project, "app");
    }

    #[test]
    fn discovery_order_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        touch(&root.join("c.cpp"));
        touch(&root.join("a.cpp"));
        touch(&root.join("b/b.cpp"));

        let settings = Settings::default();
        let discovery = ProjectScanner::new(&settings).discover(&root).unwrap();
        let names: Vec<_> = discovery
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.cpp", "b.cpp", "c.cpp"]);
    }

    #[test]
    fn modified_time_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        let path = root.join("a.cpp");
        touch(&path);
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(when)
            .unwrap();

        let settings = Settings::default();
        let discovery = ProjectScanner::new(&settings).discover(&root).unwrap();
        assert_eq!(discovery.files[0].modified, 1_700_000_000);
    }

    #[test]
    fn register_populates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        touch(&root.join("lib/src/lib.cpp"));
        touch(&root.join("lib/include/lib.hpp"));

        let settings = Settings::default();
        let mut cache = BuildCache::new();
        let count = ProjectScanner::new(&settings).register(&root, &mut cache).unwrap();
        assert_eq!(count, 2);
        let project = cache.project("lib").unwrap();
        assert_eq!(cache.projects()[project].sources.len(), 1);
        assert_eq!(cache.projects()[project].headers.len(), 1);

        ProjectScanner::new(&settings).register(&root, &mut cache).unwrap();
        assert_eq!(cache.sources().len(), 1);
        assert_eq!(cache.headers().len(), 1);
    }
}
