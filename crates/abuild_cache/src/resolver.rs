//! Read-side queries over a populated [`BuildCache`].
//!
//! The cache maintains its relationships as facts arrive, so most questions
//! here are direct lookups. The exceptions are [`Resolver::validate_imports`],
//! which has to wait until the whole tree has been scanned, and
//! [`Resolver::compile_order`], which sorts sources so that every module unit
//! is built before the sources importing it.

use crate::entity::{BuildTask, BuildTaskKind, ModuleUnit};
use crate::store::BuildCache;
use abuild_common::{
    AbuildResult, BuildTaskId, EntityKey, HeaderId, ModuleId, PartitionId, ProjectId, SourceId,
};
use abuild_diagnostics::{Diagnostic, DiagnosticCode, Location};
use abuild_scanner::{Import, ImportKind, Include};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::path::Path;
use tracing::debug;

/// Borrowing view answering dependency questions about a [`BuildCache`].
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    cache: &'a BuildCache,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `cache`.
    pub fn new(cache: &'a BuildCache) -> Self {
        Self { cache }
    }

    /// The module or partition a source produces.
    pub fn unit_of(&self, source: SourceId) -> Option<ModuleUnit> {
        self.cache.sources().try_get(source)?.unit
    }

    /// The module a source belongs to, either as its interface or through
    /// one of its partitions.
    pub fn module_of(&self, source: SourceId) -> Option<ModuleId> {
        match self.unit_of(source)? {
            ModuleUnit::Interface(module) => Some(module),
            ModuleUnit::Partition(partition) => {
                Some(self.cache.partitions().try_get(partition)?.module)
            }
        }
    }

    /// The interface source of a module, once one has been declared.
    pub fn interface_of(&self, module: ModuleId) -> Option<SourceId> {
        self.cache.modules().try_get(module)?.source
    }

    /// The partitions of a module in declaration order.
    pub fn partitions_of(&self, module: ModuleId) -> &'a [PartitionId] {
        self.cache
            .modules()
            .try_get(module)
            .map(|m| m.partitions.as_slice())
            .unwrap_or_default()
    }

    /// The project owning a source or header.
    pub fn project_of(&self, entity: impl Into<EntityKey>) -> Option<ProjectId> {
        match entity.into() {
            EntityKey::Source(id) => Some(self.cache.sources().try_get(id)?.project),
            EntityKey::Header(id) => Some(self.cache.headers().try_get(id)?.project),
        }
    }

    /// The source that satisfies `import` when it appears in `importer`.
    ///
    /// Module imports resolve to the module's interface, partition imports to
    /// the partition of the importer's own module. Header units never resolve
    /// to a source.
    pub fn resolve_import(&self, importer: SourceId, import: &Import) -> Option<SourceId> {
        match import.kind {
            ImportKind::Module => self.interface_of(self.cache.cpp_module(&import.name)?),
            ImportKind::Partition => {
                let module = self.module_of(importer)?;
                let partition = self.cache.index().partition(module, &import.name)?;
                Some(self.cache.partitions()[partition].source)
            }
            ImportKind::Header { .. } => None,
        }
    }

    /// The header an include refers to, preferring headers under the
    /// including file's directory when the filename is ambiguous.
    pub fn resolve_include(&self, from: &Path, include: &Include) -> Option<HeaderId> {
        let hint = if include.is_system { None } else { from.parent() };
        self.cache.header(Path::new(&include.header), hint)
    }

    /// Checks that every module and partition import of every source names
    /// something declared in the tree.
    ///
    /// Returns one [`UNKNOWN_MODULE`](DiagnosticCode::UNKNOWN_MODULE) or
    /// [`UNKNOWN_PARTITION`](DiagnosticCode::UNKNOWN_PARTITION) warning per
    /// unresolved import, in source then import order.
    pub fn validate_imports(&self) -> Vec<Diagnostic> {
        let mut warnings = Vec::new();
        for (id, source) in self.cache.sources().iter() {
            for import in &source.facts.imports {
                if matches!(import.kind, ImportKind::Header { .. })
                    || self.resolve_import(id, import).is_some()
                {
                    continue;
                }
                let location = Location::line(&source.path, import.line);
                let warning = if import.is_partition() {
                    let message = match self.module_of(id) {
                        Some(module) => format!(
                            "module '{}' has no partition '{}'",
                            self.cache.modules()[module].name,
                            import.name
                        ),
                        None => format!(
                            "partition ':{}' imported outside of a module unit",
                            import.name
                        ),
                    };
                    Diagnostic::warning(DiagnosticCode::UNKNOWN_PARTITION, message)
                } else {
                    let message = match self.cache.cpp_module(&import.name) {
                        Some(_) => format!("module '{}' has no interface unit", import.name),
                        None => format!("unknown module '{}'", import.name),
                    };
                    Diagnostic::warning(DiagnosticCode::UNKNOWN_MODULE, message)
                };
                warnings.push(warning.at(location));
            }
        }
        warnings
    }

    /// Orders all sources so that each module unit precedes every source
    /// importing it. Sources without dependencies keep their relative
    /// registration order as far as the sort allows.
    ///
    /// A cycle of module imports yields an
    /// [`IMPORT_CYCLE`](DiagnosticCode::IMPORT_CYCLE) error naming one source
    /// on the cycle.
    pub fn compile_order(&self) -> Result<Vec<SourceId>, Diagnostic> {
        let mut graph: DiGraph<SourceId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = self
            .cache
            .sources()
            .iter()
            .map(|(id, _)| graph.add_node(id))
            .collect();

        for (id, source) in self.cache.sources().iter() {
            for import in &source.facts.imports {
                if let Some(dependency) = self.resolve_import(id, import) {
                    if dependency != id {
                        graph.add_edge(
                            nodes[dependency.as_raw() as usize],
                            nodes[id.as_raw() as usize],
                            (),
                        );
                    }
                }
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|node| graph[node]).collect()),
            Err(cycle) => {
                let path = &self.cache.sources()[graph[cycle.node_id()]].path;
                Err(Diagnostic::error(
                    DiagnosticCode::IMPORT_CYCLE,
                    format!("module imports form a cycle through {}", path.display()),
                )
                .at(Location::file(path)))
            }
        }
    }
}

/// Plans one build task per source, writing outputs under `output_dir`.
///
/// Interfaces produce `<project>/<module>.pcm`, partitions
/// `<project>/<module>-<partition>.pcm` and other sources
/// `<project>/<file name>.o`. Sources that already have a task are reported
/// as duplicates by the store.
pub fn plan_build_tasks(
    cache: &mut BuildCache,
    output_dir: &Path,
) -> AbuildResult<Vec<BuildTaskId>> {
    let planned: Vec<BuildTask> = cache
        .sources()
        .iter()
        .map(|(id, source)| {
            let project_dir = output_dir.join(&cache.projects()[source.project].name);
            let (kind, file_name) = match source.unit {
                Some(ModuleUnit::Interface(module)) => (
                    BuildTaskKind::CompileModuleInterface,
                    format!("{}.pcm", cache.modules()[module].name),
                ),
                Some(ModuleUnit::Partition(partition)) => {
                    let partition = &cache.partitions()[partition];
                    let module = &cache.modules()[partition.module].name;
                    (
                        BuildTaskKind::CompileModulePartition,
                        format!("{module}-{}.pcm", partition.name),
                    )
                }
                None => {
                    let name = source
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    (BuildTaskKind::CompileSource, format!("{name}.o"))
                }
            };
            BuildTask {
                entity: EntityKey::Source(id),
                kind,
                output: project_dir.join(file_name),
            }
        })
        .collect();

    debug!(tasks = planned.len(), "planning build tasks");
    planned
        .into_iter()
        .map(|task| cache.add_build_task(task))
        .collect()
}
