//! Secondary lookup structures over the build cache.
//!
//! The index owns no entities. It maps external keys to the IDs issued by the
//! store's arenas and is rebuilt together with them.
//!
//! Files are indexed twice: once by their full path, which guarantees one
//! entity per path, and once by base filename for lookups that only know a
//! trailing part of the path (`#include "db/query.hpp"`). Because several
//! projects may contain a `query.hpp`, candidates sharing a filename are kept
//! in insertion order and disambiguated as follows:
//!
//! 1. the requested path must match the candidate's trailing components;
//! 2. with a hint, the first candidate whose path starts with the hint wins;
//! 3. otherwise, or when no candidate matches the hint, the earliest inserted
//!    candidate wins.

use abuild_common::{BuildTaskId, EntityKey, HeaderId, ModuleId, PartitionId, ProjectId, SourceId};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Fast lookup from names, paths and entity keys to entity IDs.
#[derive(Debug, Default, Clone)]
pub struct BuildCacheIndex {
    projects: HashMap<String, ProjectId>,
    paths: HashMap<PathBuf, EntityKey>,
    source_names: HashMap<OsString, Vec<(PathBuf, SourceId)>>,
    header_names: HashMap<OsString, Vec<(PathBuf, HeaderId)>>,
    modules: HashMap<String, ModuleId>,
    partitions: HashMap<(ModuleId, String), PartitionId>,
    build_tasks: HashMap<EntityKey, BuildTaskId>,
}

impl BuildCacheIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a project name.
    pub fn insert_project(&mut self, name: &str, id: ProjectId) {
        self.projects.insert(name.to_string(), id);
    }

    /// Looks up a project by name.
    pub fn project(&self, name: &str) -> Option<ProjectId> {
        self.projects.get(name).copied()
    }

    /// Returns the entity registered for exactly this path.
    pub fn file(&self, path: &Path) -> Option<EntityKey> {
        self.paths.get(path).copied()
    }

    /// Records a source path.
    pub fn insert_source(&mut self, path: &Path, id: SourceId) {
        self.paths.insert(path.to_path_buf(), EntityKey::Source(id));
        if let Some(name) = path.file_name() {
            self.source_names
                .entry(name.to_os_string())
                .or_default()
                .push((path.to_path_buf(), id));
        }
    }

    /// Looks up a source by full or trailing path.
    pub fn source(&self, path: &Path, hint: Option<&Path>) -> Option<SourceId> {
        if let Some(EntityKey::Source(id)) = self.file(path) {
            return Some(id);
        }
        find_by_name(&self.source_names, path, hint)
    }

    /// Records a header path.
    pub fn insert_header(&mut self, path: &Path, id: HeaderId) {
        self.paths.insert(path.to_path_buf(), EntityKey::Header(id));
        if let Some(name) = path.file_name() {
            self.header_names
                .entry(name.to_os_string())
                .or_default()
                .push((path.to_path_buf(), id));
        }
    }

    /// Looks up a header by full or trailing path.
    pub fn header(&self, path: &Path, hint: Option<&Path>) -> Option<HeaderId> {
        if let Some(EntityKey::Header(id)) = self.file(path) {
            return Some(id);
        }
        find_by_name(&self.header_names, path, hint)
    }

    /// Records a module name.
    pub fn insert_module(&mut self, name: &str, id: ModuleId) {
        self.modules.insert(name.to_string(), id);
    }

    /// Looks up a module by name.
    pub fn module(&self, name: &str) -> Option<ModuleId> {
        self.modules.get(name).copied()
    }

    /// Records a partition of `module`.
    pub fn insert_partition(&mut self, module: ModuleId, name: &str, id: PartitionId) {
        self.partitions.insert((module, name.to_string()), id);
    }

    /// Looks up a partition by its module and name.
    pub fn partition(&self, module: ModuleId, name: &str) -> Option<PartitionId> {
        self.partitions.get(&(module, name.to_string())).copied()
    }

    /// Records the build task of an entity.
    pub fn insert_build_task(&mut self, entity: EntityKey, id: BuildTaskId) {
        self.build_tasks.insert(entity, id);
    }

    /// Looks up the build task of an entity.
    pub fn build_task(&self, entity: EntityKey) -> Option<BuildTaskId> {
        self.build_tasks.get(&entity).copied()
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.projects.clear();
        self.paths.clear();
        self.source_names.clear();
        self.header_names.clear();
        self.modules.clear();
        self.partitions.clear();
        self.build_tasks.clear();
    }
}

fn find_by_name<I: Copy>(
    names: &HashMap<OsString, Vec<(PathBuf, I)>>,
    path: &Path,
    hint: Option<&Path>,
) -> Option<I> {
    let candidates = names.get(path.file_name()?)?;
    let mut matching = candidates
        .iter()
        .filter(|(candidate, _)| candidate.ends_with(path));

    let first = matching.clone().next().map(|(_, id)| *id);
    match hint {
        Some(hint) => matching
            .find(|(candidate, _)| candidate.starts_with(hint))
            .map(|(_, id)| *id)
            .or(first),
        None => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with_duplicates() -> BuildCacheIndex {
        let mut index = BuildCacheIndex::new();
        index.insert_header(Path::new("/proj/alpha/include/query.hpp"), HeaderId::from_raw(0));
        index.insert_header(Path::new("/proj/beta/db/query.hpp"), HeaderId::from_raw(1));
        index.insert_header(Path::new("/proj/gamma/db/query.hpp"), HeaderId::from_raw(2));
        index
    }

    #[test]
    fn exact_path_lookup() {
        let index = index_with_duplicates();
        let id = index.header(Path::new("/proj/gamma/db/query.hpp"), None);
        assert_eq!(id, Some(HeaderId::from_raw(2)));
    }

    #[test]
    fn filename_without_hint_returns_first_inserted() {
        let index = index_with_duplicates();
        assert_eq!(index.header(Path::new("query.hpp"), None), Some(HeaderId::from_raw(0)));
    }

    #[test]
    fn trailing_components_must_match() {
        let index = index_with_duplicates();
        assert_eq!(index.header(Path::new("db/query.hpp"), None), Some(HeaderId::from_raw(1)));
        assert_eq!(index.header(Path::new("other/query.hpp"), None), None);
        assert_eq!(index.header(Path::new("b/query.hpp"), None), None);
    }

    #[test]
    fn hint_selects_candidate() {
        let index = index_with_duplicates();
        let hint = Path::new("/proj/gamma");
        assert_eq!(
            index.header(Path::new("db/query.hpp"), Some(hint)),
            Some(HeaderId::from_raw(2))
        );
    }

    #[test]
    fn unmatched_hint_falls_back_to_first() {
        let index = index_with_duplicates();
        let hint = Path::new("/elsewhere");
        assert_eq!(
            index.header(Path::new("db/query.hpp"), Some(hint)),
            Some(HeaderId::from_raw(1))
        );
    }

    #[test]
    fn sources_and_headers_are_separate() {
        let mut index = BuildCacheIndex::new();
        index.insert_source(Path::new("/p/a.cpp"), SourceId::from_raw(0));
        assert!(index.header(Path::new("/p/a.cpp"), None).is_none());
        assert_eq!(
            index.file(Path::new("/p/a.cpp")),
            Some(EntityKey::Source(SourceId::from_raw(0)))
        );
    }

    #[test]
    fn partitions_are_keyed_by_module() {
        let mut index = BuildCacheIndex::new();
        index.insert_partition(ModuleId::from_raw(0), "Part", PartitionId::from_raw(3));
        assert_eq!(index.partition(ModuleId::from_raw(0), "Part"), Some(PartitionId::from_raw(3)));
        assert_eq!(index.partition(ModuleId::from_raw(1), "Part"), None);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut index = index_with_duplicates();
        index.insert_project("foo", ProjectId::from_raw(0));
        index.insert_module("Foo", ModuleId::from_raw(0));
        index.clear();
        assert!(index.project("foo").is_none());
        assert!(index.module("Foo").is_none());
        assert!(index.header(Path::new("query.hpp"), None).is_none());
    }
}
