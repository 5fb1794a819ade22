//! Import discovery and transitive closure expansion

use crate::host::LanguageHost;
use arbor_core::{
    AnalysisEngine, HostResult, ImportEdge, ImportGraph, PathIdentity, PathInfo, SourcePosition,
};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

impl<E: AnalysisEngine> LanguageHost<E> {
    /// Import edges of `content` as if it lived at `from`.
    ///
    /// Empty and built-in specifiers are skipped; specifiers that do not
    /// resolve are dropped without error.
    pub fn imported_files_for_content(&mut self, content: &str, from: &Path) -> Vec<ImportEdge> {
        self.resolve_imports(content, from)
            .into_iter()
            .map(|(edge, _)| edge)
            .collect()
    }

    /// Import edges of a file, read from the store when it is tracked.
    pub fn imported_files_for_file(&mut self, name: &str) -> HostResult<Vec<ImportEdge>> {
        if let Some(record) = self.state.store.get(name) {
            let raw_content = record.raw_content.clone();
            return Ok(self.imported_files_for_content(&raw_content, Path::new(name)));
        }
        let info = self.get_path_info(name, None, None)?;
        let origin = info.resolved_path().to_string();
        Ok(self.imported_files_for_content(&info.raw_content, Path::new(&origin)))
    }

    /// Import edges of the file a position belongs to.
    pub fn imported_files_for_position(
        &mut self,
        position: &SourcePosition,
    ) -> HostResult<Vec<ImportEdge>> {
        self.imported_files_for_file(&position.file_name)
    }

    /// Track `path` and everything it imports, returning the edges followed.
    ///
    /// The root's imports are always walked. Dependencies are only walked
    /// when they were committed during this expansion.
    pub fn expand_closure(&mut self, path: &str, from: Option<&Path>) -> HostResult<ImportGraph> {
        let info = self.get_path_info(path, from, None)?;
        self.commit_path_info(&info)?;
        let mut graph = ImportGraph::new();
        self.walk_imports(&info, &mut graph);
        debug!(
            "Closure of {}: {} files, {} imports",
            info.normalized_path(),
            graph.file_count(),
            graph.import_count()
        );
        Ok(graph)
    }

    /// Breadth-first walk over imports starting at an already committed root.
    pub(crate) fn walk_imports(&mut self, root: &PathInfo, graph: &mut ImportGraph) {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<(Arc<PathIdentity>, String)> = VecDeque::new();

        visited.insert(root.normalized_path().to_string());
        graph.add_file(root.normalized_path());
        queue.push_back((Arc::new(root.identity.clone()), root.raw_content.clone()));

        while let Some((importer, raw_content)) = queue.pop_front() {
            let origin = Path::new(&importer.resolved_path);
            for (edge, identity) in self.resolve_imports(&raw_content, origin) {
                if self.state.exclusions.is_excluded(&edge.normalized_path) {
                    debug!("Excluded {}", edge.normalized_path);
                    continue;
                }
                graph.add_import(&importer.normalized_path, edge);
                if !visited.insert(identity.normalized_path.clone()) {
                    continue;
                }

                let info = match self.path_info_for(&identity, None) {
                    Ok(info) => info,
                    Err(e) => {
                        warn!("Skipping import {}: {}", identity.resolved_path, e);
                        continue;
                    }
                };
                match self.commit_path_info(&info) {
                    Ok(true) => queue.push_back((identity, info.raw_content)),
                    Ok(false) => debug!("{} is up to date", identity.normalized_path),
                    Err(e) => warn!("Skipping import {}: {}", identity.resolved_path, e),
                }
            }
        }
    }

    /// Scan, filter and resolve the imports of `content`.
    fn resolve_imports(
        &mut self,
        content: &str,
        from: &Path,
    ) -> Vec<(ImportEdge, Arc<PathIdentity>)> {
        let specifiers = self.scanner.scan(content);
        let mut edges = Vec::with_capacity(specifiers.len());
        for specifier in specifiers {
            let raw_path = specifier.name;
            if raw_path.trim().is_empty() || self.state.resolver.is_built_in(&raw_path) {
                continue;
            }
            match self.get_add_path(&raw_path, Some(from)) {
                Ok(identity) => edges.push((
                    ImportEdge {
                        raw_path,
                        resolved_path: identity.resolved_path.clone(),
                        normalized_path: identity.normalized_path.clone(),
                    },
                    identity,
                )),
                Err(e) => debug!("Dropping import '{}': {}", raw_path, e),
            }
        }
        edges
    }
}
