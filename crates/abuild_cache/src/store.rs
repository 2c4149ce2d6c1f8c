//! The owning store of all build cache entities.

use crate::entity::{BuildTask, Header, Module, ModulePartition, ModuleUnit, Project, Source};
use crate::index::BuildCacheIndex;
use abuild_common::{
    AbuildResult, Arena, BuildTaskId, EntityKey, HeaderId, InternalError, ModuleId, PartitionId,
    ProjectId, SourceId,
};
use abuild_config::Toolchain;
use abuild_diagnostics::{Diagnostic, DiagnosticCode, Location, Severity};
use abuild_scanner::{FileFacts, Visibility};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owner of every project, file, module, partition and build task found in a
/// tree, plus the Error and Warning logs.
///
/// Creation is idempotent by key: adding a path, module or partition that is
/// already known returns the existing ID. Conflicting definitions are never
/// overwritten; the first writer wins and the conflict is appended to
/// [`errors`](Self::errors). Entities are only removed all at once by
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct BuildCache {
    projects: Arena<ProjectId, Project>,
    sources: Arena<SourceId, Source>,
    headers: Arena<HeaderId, Header>,
    modules: Arena<ModuleId, Module>,
    partitions: Arena<PartitionId, ModulePartition>,
    build_tasks: Arena<BuildTaskId, BuildTask>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    toolchains: BTreeMap<String, Toolchain>,
    index: BuildCacheIndex,
}

impl BuildCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source file with the named project, creating the project
    /// on first reference.
    ///
    /// A path that is already registered keeps its original project and
    /// modified time; the existing ID is returned. A path registered as a
    /// header cannot also become a source.
    pub fn add_source(
        &mut self,
        path: impl Into<PathBuf>,
        project: &str,
        modified: i64,
    ) -> AbuildResult<SourceId> {
        let path = path.into();
        match self.index.file(&path) {
            Some(EntityKey::Source(id)) => return Ok(id),
            Some(other) => return Err(path_taken(&path, other)),
            None => {}
        }
        let project = self.project_or_create(project);
        let id = self.sources.alloc(Source {
            path: path.clone(),
            project,
            modified,
            facts: FileFacts::default(),
            unit: None,
        });
        self.projects[project].sources.push(id);
        self.index.insert_source(&path, id);
        Ok(id)
    }

    /// Registers a header file with the named project. Same rules as
    /// [`add_source`](Self::add_source).
    pub fn add_header(
        &mut self,
        path: impl Into<PathBuf>,
        project: &str,
        modified: i64,
    ) -> AbuildResult<HeaderId> {
        let path = path.into();
        match self.index.file(&path) {
            Some(EntityKey::Header(id)) => return Ok(id),
            Some(other) => return Err(path_taken(&path, other)),
            None => {}
        }
        let project = self.project_or_create(project);
        let id = self.headers.alloc(Header {
            path: path.clone(),
            project,
            modified,
            facts: FileFacts::default(),
        });
        self.projects[project].headers.push(id);
        self.index.insert_header(&path, id);
        Ok(id)
    }

    /// Registers a source together with its scanned facts and the module
    /// unit it declares.
    pub fn record_source(
        &mut self,
        path: impl Into<PathBuf>,
        project: &str,
        modified: i64,
        facts: FileFacts,
    ) -> AbuildResult<SourceId> {
        let id = self.add_source(path, project, modified)?;
        let declaration = facts.declaration.clone();
        self.set_source_facts(id, facts)?;
        if let Some(declaration) = declaration {
            match &declaration.partition {
                Some(partition) => {
                    self.add_module_partition(
                        &declaration.module,
                        partition,
                        declaration.visibility,
                        id,
                    )?;
                }
                None => {
                    self.add_module_interface(&declaration.module, declaration.visibility, id)?;
                }
            }
        }
        Ok(id)
    }

    /// Registers a header together with its scanned facts.
    pub fn record_header(
        &mut self,
        path: impl Into<PathBuf>,
        project: &str,
        modified: i64,
        facts: FileFacts,
    ) -> AbuildResult<HeaderId> {
        let id = self.add_header(path, project, modified)?;
        self.set_header_facts(id, facts)?;
        Ok(id)
    }

    /// Replaces the facts stored for a source.
    pub fn set_source_facts(&mut self, id: SourceId, facts: FileFacts) -> AbuildResult<()> {
        let source = self
            .sources
            .try_get_mut(id)
            .ok_or_else(|| foreign_handle("source", id))?;
        source.facts = facts;
        Ok(())
    }

    /// Replaces the facts stored for a header.
    pub fn set_header_facts(&mut self, id: HeaderId, facts: FileFacts) -> AbuildResult<()> {
        let header = self
            .headers
            .try_get_mut(id)
            .ok_or_else(|| foreign_handle("header", id))?;
        header.facts = facts;
        Ok(())
    }

    /// Makes `source` the interface unit of module `name`.
    ///
    /// If the module already has a different interface source, one
    /// [`DUPLICATE_MODULE`](DiagnosticCode::DUPLICATE_MODULE) error is
    /// recorded and the first source is kept.
    pub fn add_module_interface(
        &mut self,
        name: &str,
        visibility: Visibility,
        source: SourceId,
    ) -> AbuildResult<ModuleId> {
        let path = self.source_path(source)?.to_path_buf();
        let id = self.module_or_create(name);
        let current = self.modules[id].source;
        match current {
            Some(existing) if existing == source => {}
            Some(existing) => {
                let message = format!(
                    "module '{}' is already defined in {}",
                    name,
                    self.sources[existing].path.display()
                );
                warn!(module = name, path = %path.display(), "duplicate module interface");
                self.add_error(
                    Diagnostic::error(DiagnosticCode::DUPLICATE_MODULE, message)
                        .at(Location::file(path)),
                );
            }
            None => {
                let module = &mut self.modules[id];
                module.source = Some(source);
                module.visibility = visibility;
                self.sources[source].unit = Some(ModuleUnit::Interface(id));
            }
        }
        Ok(id)
    }

    /// Makes `source` the unit of partition `partition` of module `module`,
    /// creating the module on first reference.
    ///
    /// If the pair already has a different source, one
    /// [`DUPLICATE_PARTITION`](DiagnosticCode::DUPLICATE_PARTITION) error is
    /// recorded and the first source is kept.
    pub fn add_module_partition(
        &mut self,
        module: &str,
        partition: &str,
        visibility: Visibility,
        source: SourceId,
    ) -> AbuildResult<PartitionId> {
        let path = self.source_path(source)?.to_path_buf();
        let module_id = self.module_or_create(module);

        if let Some(existing) = self.index.partition(module_id, partition) {
            let first = self.partitions[existing].source;
            if first != source {
                let message = format!(
                    "partition '{}:{}' is already defined in {}",
                    module,
                    partition,
                    self.sources[first].path.display()
                );
                warn!(module, partition, path = %path.display(), "duplicate module partition");
                self.add_error(
                    Diagnostic::error(DiagnosticCode::DUPLICATE_PARTITION, message)
                        .at(Location::file(path)),
                );
            }
            return Ok(existing);
        }

        let id = self.partitions.alloc(ModulePartition {
            name: partition.to_string(),
            visibility,
            source,
            module: module_id,
        });
        self.modules[module_id].partitions.push(id);
        self.index.insert_partition(module_id, partition, id);
        self.sources[source].unit = Some(ModuleUnit::Partition(id));
        Ok(id)
    }

    /// Adds the build task of `task.entity`.
    ///
    /// An entity has at most one task: a second one is rejected with a
    /// [`DUPLICATE_BUILD_TASK`](DiagnosticCode::DUPLICATE_BUILD_TASK) error
    /// and the existing ID is returned.
    pub fn add_build_task(&mut self, task: BuildTask) -> AbuildResult<BuildTaskId> {
        let path = self.entity_path(task.entity)?.to_path_buf();
        if let Some(existing) = self.index.build_task(task.entity) {
            warn!(path = %path.display(), "duplicate build task");
            self.add_error(
                Diagnostic::error(
                    DiagnosticCode::DUPLICATE_BUILD_TASK,
                    format!("a build task already exists for {}", path.display()),
                )
                .at(Location::file(path)),
            );
            return Ok(existing);
        }
        let entity = task.entity;
        let id = self.build_tasks.alloc(task);
        self.index.insert_build_task(entity, id);
        Ok(id)
    }

    /// Appends to the Error log.
    pub fn add_error(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    /// Appends to the Warning log.
    pub fn add_warning(&mut self, diagnostic: Diagnostic) {
        self.warnings.push(diagnostic);
    }

    /// Appends to the Error or Warning log according to severity.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.add_error(diagnostic),
            Severity::Warning => self.add_warning(diagnostic),
        }
    }

    /// Stores a toolchain record under `name`, replacing any previous one.
    pub fn add_toolchain(&mut self, name: impl Into<String>, toolchain: Toolchain) {
        self.toolchains.insert(name.into(), toolchain);
    }

    /// Looks up a project by name.
    pub fn project(&self, name: &str) -> Option<ProjectId> {
        self.index.project(name)
    }

    /// Looks up a source by full or trailing path; see [`BuildCacheIndex`]
    /// for how `hint` disambiguates.
    pub fn source(&self, path: &Path, hint: Option<&Path>) -> Option<SourceId> {
        self.index.source(path, hint)
    }

    /// Looks up a header by full or trailing path.
    pub fn header(&self, path: &Path, hint: Option<&Path>) -> Option<HeaderId> {
        self.index.header(path, hint)
    }

    /// Looks up a module by name.
    pub fn cpp_module(&self, name: &str) -> Option<ModuleId> {
        self.index.module(name)
    }

    /// Looks up a partition by module and partition name.
    pub fn cpp_module_partition(&self, module: &str, partition: &str) -> Option<PartitionId> {
        let module = self.index.module(module)?;
        self.index.partition(module, partition)
    }

    /// Looks up the build task of an entity.
    pub fn build_task(&self, entity: impl Into<EntityKey>) -> Option<BuildTaskId> {
        self.index.build_task(entity.into())
    }

    /// All projects.
    pub fn projects(&self) -> &Arena<ProjectId, Project> {
        &self.projects
    }

    /// All sources.
    pub fn sources(&self) -> &Arena<SourceId, Source> {
        &self.sources
    }

    /// All headers.
    pub fn headers(&self) -> &Arena<HeaderId, Header> {
        &self.headers
    }

    /// All modules.
    pub fn modules(&self) -> &Arena<ModuleId, Module> {
        &self.modules
    }

    /// All partitions.
    pub fn partitions(&self) -> &Arena<PartitionId, ModulePartition> {
        &self.partitions
    }

    /// All build tasks.
    pub fn build_tasks(&self) -> &Arena<BuildTaskId, BuildTask> {
        &self.build_tasks
    }

    /// The Error log in insertion order.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// The Warning log in insertion order.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Toolchain records by name.
    pub fn toolchains(&self) -> &BTreeMap<String, Toolchain> {
        &self.toolchains
    }

    /// The secondary index.
    pub fn index(&self) -> &BuildCacheIndex {
        &self.index
    }

    /// Path of the source or header behind `entity`.
    pub fn entity_path(&self, entity: EntityKey) -> AbuildResult<&Path> {
        match entity {
            EntityKey::Source(id) => self.source_path(id),
            EntityKey::Header(id) => self
                .headers
                .try_get(id)
                .map(|h| h.path.as_path())
                .ok_or_else(|| foreign_handle("header", id)),
        }
    }

    /// Drops every entity, diagnostic and toolchain, invalidating all IDs.
    pub fn clear(&mut self) {
        self.projects.clear();
        self.sources.clear();
        self.headers.clear();
        self.modules.clear();
        self.partitions.clear();
        self.build_tasks.clear();
        self.errors.clear();
        self.warnings.clear();
        self.toolchains.clear();
        self.index.clear();
    }

    /// Returns the module or partition name a source produces, as written in
    /// its declaration (`M` or `M:P`).
    pub fn unit_name(&self, unit: ModuleUnit) -> String {
        match unit {
            ModuleUnit::Interface(id) => self.modules()[id].name.clone(),
            ModuleUnit::Partition(id) => {
                let partition = &self.partitions()[id];
                format!("{}:{}", self.modules()[partition.module].name, partition.name)
            }
        }
    }

    fn source_path(&self, id: SourceId) -> AbuildResult<&Path> {
        self.sources
            .try_get(id)
            .map(|s| s.path.as_path())
            .ok_or_else(|| foreign_handle("source", id))
    }

    fn project_or_create(&mut self, name: &str) -> ProjectId {
        if let Some(id) = self.index.project(name) {
            return id;
        }
        debug!(project = name, "creating project");
        let id = self.projects.alloc(Project {
            name: name.to_string(),
            sources: Vec::new(),
            headers: Vec::new(),
        });
        self.index.insert_project(name, id);
        id
    }

    fn module_or_create(&mut self, name: &str) -> ModuleId {
        if let Some(id) = self.index.module(name) {
            return id;
        }
        debug!(module = name, "creating module");
        let id = self.modules.alloc(Module {
            name: name.to_string(),
            visibility: Visibility::Internal,
            source: None,
            partitions: Vec::new(),
        });
        self.index.insert_module(name, id);
        id
    }
}

fn foreign_handle(kind: &str, id: impl std::fmt::Debug) -> InternalError {
    InternalError::new(format!("{kind} {id:?} does not belong to this build cache"))
}

fn path_taken(path: &Path, existing: EntityKey) -> InternalError {
    InternalError::new(format!("{} is already registered as {existing:?}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BuildTaskKind;
    use abuild_config::ToolchainKind;
    use abuild_scanner::ModuleDeclaration;

    fn interface_facts(module: &str, partition: Option<&str>) -> FileFacts {
        FileFacts {
            declaration: Some(ModuleDeclaration {
                module: module.to_string(),
                partition: partition.map(str::to_string),
                visibility: Visibility::Exported,
                line: 1,
            }),
            ..FileFacts::default()
        }
    }

    #[test]
    fn add_source_creates_project_lazily() {
        let mut cache = BuildCache::new();
        let id = cache.add_source("/p/foo/main.cpp", "foo", 10).unwrap();
        let project = cache.project("foo").unwrap();
        assert_eq!(cache.projects()[project].sources, vec![id]);
        assert_eq!(cache.sources()[id].project, project);
        assert_eq!(cache.sources()[id].modified, 10);
    }

    #[test]
    fn re_adding_a_path_does_not_duplicate() {
        let mut cache = BuildCache::new();
        let first = cache.add_source("/p/foo/main.cpp", "foo", 10).unwrap();
        let second = cache.add_source("/p/foo/main.cpp", "foo", 10).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.sources().len(), 1);
        assert_eq!(cache.projects()[cache.project("foo").unwrap()].sources.len(), 1);

        let h1 = cache.add_header("/p/foo/a.hpp", "foo", 1).unwrap();
        let h2 = cache.add_header("/p/foo/a.hpp", "bar", 2).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(cache.headers().len(), 1);
        assert!(cache.project("bar").is_none());
        assert_eq!(cache.headers()[h1].modified, 1);
    }

    #[test]
    fn path_keeps_its_first_kind() {
        let mut cache = BuildCache::new();
        let header = cache.add_header("/p/x.h", "p", 0).unwrap();
        assert!(cache.add_source("/p/x.h", "p", 0).is_err());
        assert!(cache.sources().is_empty());
        assert_eq!(cache.header(Path::new("/p/x.h"), None), Some(header));

        cache.add_source("/p/y.cpp", "p", 0).unwrap();
        assert!(cache.add_header("/p/y.cpp", "p", 0).is_err());
        assert_eq!(cache.headers().len(), 1);
    }

    #[test]
    fn module_interface_first_writer_wins() {
        let mut cache = BuildCache::new();
        let s1 = cache.add_source("/p/a.cpp", "p", 0).unwrap();
        let s2 = cache.add_source("/p/b.cpp", "p", 0).unwrap();

        let m1 = cache.add_module_interface("M", Visibility::Exported, s1).unwrap();
        let m2 = cache.add_module_interface("M", Visibility::Exported, s2).unwrap();
        assert_eq!(m1, m2);
        assert_eq!(cache.modules().len(), 1);
        assert_eq!(cache.modules()[m1].source, Some(s1));
        assert_eq!(cache.errors().len(), 1);
        assert_eq!(cache.errors()[0].code, DiagnosticCode::DUPLICATE_MODULE);
        assert_eq!(cache.sources()[s1].unit, Some(ModuleUnit::Interface(m1)));
        assert_eq!(cache.sources()[s2].unit, None);
    }

    #[test]
    fn same_source_re_declaring_is_not_a_conflict() {
        let mut cache = BuildCache::new();
        let s = cache.add_source("/p/a.cpp", "p", 0).unwrap();
        cache.add_module_interface("M", Visibility::Exported, s).unwrap();
        cache.add_module_interface("M", Visibility::Exported, s).unwrap();
        assert!(cache.errors().is_empty());
    }

    #[test]
    fn partition_creates_module_lazily() {
        let mut cache = BuildCache::new();
        let s = cache.add_source("/p/part.cpp", "p", 0).unwrap();
        let part = cache.add_module_partition("M", "P", Visibility::Internal, s).unwrap();

        let module = cache.cpp_module("M").unwrap();
        assert_eq!(cache.modules()[module].source, None);
        assert_eq!(cache.modules()[module].partitions, vec![part]);
        assert_eq!(cache.partitions()[part].module, module);
        assert_eq!(cache.cpp_module_partition("M", "P"), Some(part));
        assert_eq!(cache.cpp_module_partition("M", "Q"), None);
    }

    #[test]
    fn partition_first_writer_wins() {
        let mut cache = BuildCache::new();
        let s1 = cache.add_source("/p/a.cpp", "p", 0).unwrap();
        let s2 = cache.add_source("/p/b.cpp", "p", 0).unwrap();
        let p1 = cache.add_module_partition("Foo", "Part", Visibility::Internal, s1).unwrap();
        let p2 = cache.add_module_partition("Foo", "Part", Visibility::Internal, s2).unwrap();
        assert_eq!(p1, p2);
        assert_eq!(cache.partitions().len(), 1);
        assert_eq!(cache.partitions()[p1].source, s1);
        assert_eq!(cache.errors().len(), 1);
        assert_eq!(cache.errors()[0].code, DiagnosticCode::DUPLICATE_PARTITION);
        assert_eq!(cache.errors()[0].location, Some(Location::file("/p/b.cpp")));
    }

    #[test]
    fn build_task_once_per_entity() {
        let mut cache = BuildCache::new();
        let s = cache.add_source("/p/a.cpp", "p", 0).unwrap();
        let task = BuildTask {
            entity: s.into(),
            kind: BuildTaskKind::CompileSource,
            output: PathBuf::from("/out/a.o"),
        };
        let t1 = cache.add_build_task(task.clone()).unwrap();
        let t2 = cache.add_build_task(task).unwrap();
        assert_eq!(t1, t2);
        assert_eq!(cache.build_tasks().len(), 1);
        assert_eq!(cache.build_task(s), Some(t1));
        assert_eq!(cache.errors().len(), 1);
        assert_eq!(cache.errors()[0].code, DiagnosticCode::DUPLICATE_BUILD_TASK);
    }

    #[test]
    fn foreign_handles_are_internal_errors() {
        let mut cache = BuildCache::new();
        let bogus = SourceId::from_raw(7);
        assert!(cache.add_module_interface("M", Visibility::Exported, bogus).is_err());
        assert!(cache.set_source_facts(bogus, FileFacts::default()).is_err());
        let task = BuildTask {
            entity: HeaderId::from_raw(3).into(),
            kind: BuildTaskKind::CompileSource,
            output: PathBuf::new(),
        };
        assert!(cache.add_build_task(task).is_err());
    }

    #[test]
    fn record_source_registers_declaration() {
        let mut cache = BuildCache::new();
        let s = cache
            .record_source("/p/foo.cppm", "p", 5, interface_facts("Foo", None))
            .unwrap();
        let module = cache.cpp_module("Foo").unwrap();
        assert_eq!(cache.modules()[module].source, Some(s));
        assert_eq!(cache.modules()[module].visibility, Visibility::Exported);

        let part = cache
            .record_source("/p/part.cppm", "p", 5, interface_facts("Foo", Some("Part")))
            .unwrap();
        assert!(matches!(cache.sources()[part].unit, Some(ModuleUnit::Partition(_))));
    }

    #[test]
    fn diagnostics_keep_insertion_order() {
        let mut cache = BuildCache::new();
        cache.add_warning(Diagnostic::warning(DiagnosticCode::UNKNOWN_MODULE, "b"));
        cache.add_warning(Diagnostic::warning(DiagnosticCode::UNKNOWN_MODULE, "a"));
        cache.add_warning(Diagnostic::warning(DiagnosticCode::UNKNOWN_MODULE, "a"));
        cache.add_diagnostic(Diagnostic::error(DiagnosticCode::UNREADABLE, "x"));
        let messages: Vec<_> = cache.warnings().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "a", "a"]);
        assert_eq!(cache.errors().len(), 1);
    }

    #[test]
    fn filename_lookup_across_projects() {
        let mut cache = BuildCache::new();
        let a = cache.add_header("/root/alpha/db/query.hpp", "alpha", 0).unwrap();
        let b = cache.add_header("/root/beta/db/query.hpp", "beta", 0).unwrap();
        assert_eq!(cache.header(Path::new("query.hpp"), None), Some(a));
        assert_eq!(cache.header(Path::new("db/query.hpp"), Some(Path::new("/root/beta"))), Some(b));
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = BuildCache::new();
        let s = cache.add_source("/p/a.cpp", "p", 0).unwrap();
        cache.add_module_interface("M", Visibility::Exported, s).unwrap();
        cache.add_toolchain(
            "clang",
            Toolchain {
                kind: ToolchainKind::Clang,
                compiler: PathBuf::from("clang++"),
                linker: PathBuf::from("clang++"),
                archiver: PathBuf::from("llvm-ar"),
                compiler_flags: None,
                linker_flags: None,
                archiver_flags: None,
            },
        );
        cache.add_error(Diagnostic::error(DiagnosticCode::UNREADABLE, "x"));
        cache.clear();
        assert!(cache.sources().is_empty());
        assert!(cache.modules().is_empty());
        assert!(cache.errors().is_empty());
        assert!(cache.toolchains().is_empty());
        assert!(cache.project("p").is_none());
        assert!(cache.cpp_module("M").is_none());
    }

    #[test]
    fn unit_names() {
        let mut cache = BuildCache::new();
        let s = cache.add_source("/p/part.cppm", "p", 0).unwrap();
        let part = cache.add_module_partition("M", "P", Visibility::Internal, s).unwrap();
        assert_eq!(cache.unit_name(ModuleUnit::Partition(part)), "M:P");
    }
}
