//! Import graph produced by closure expansion

use crate::model::ImportEdge;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Files reached during an expansion, and the import edges that reached them.
///
/// Nodes are normalized paths; each node is stored once.
pub struct ImportGraph {
    inner: StableDiGraph<String, ImportEdge>,
    indices: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for ImportGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportGraph")
            .field("file_count", &self.inner.node_count())
            .field("import_count", &self.inner.edge_count())
            .finish()
    }
}

impl ImportGraph {
    pub fn new() -> Self {
        ImportGraph {
            inner: StableDiGraph::new(),
            indices: HashMap::new(),
        }
    }

    /// Add a file, returning its index. Adding a known file is a no-op.
    pub fn add_file(&mut self, normalized_path: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(normalized_path) {
            return idx;
        }
        let idx = self.inner.add_node(normalized_path.to_string());
        self.indices.insert(normalized_path.to_string(), idx);
        idx
    }

    /// Record that `importer` imports `edge.normalized_path`.
    pub fn add_import(&mut self, importer: &str, edge: ImportEdge) {
        let source = self.add_file(importer);
        let target = self.add_file(&edge.normalized_path);
        self.inner.add_edge(source, target, edge);
    }

    pub fn contains(&self, normalized_path: &str) -> bool {
        self.indices.contains_key(normalized_path)
    }

    pub fn file_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn import_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx).map(String::as_str))
    }

    /// Import edges leaving a file, in the order they were recorded.
    pub fn imports_of(&self, normalized_path: &str) -> Vec<&ImportEdge> {
        self.edges_directed(normalized_path, Direction::Outgoing)
    }

    /// Import edges arriving at a file.
    pub fn importers_of(&self, normalized_path: &str) -> Vec<&ImportEdge> {
        self.edges_directed(normalized_path, Direction::Incoming)
    }

    /// Normalized paths of the files importing `normalized_path`.
    pub fn importer_paths(&self, normalized_path: &str) -> Vec<&str> {
        let Some(&idx) = self.indices.get(normalized_path) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|edge_ref| self.inner.node_weight(edge_ref.source()))
            .map(String::as_str)
            .collect()
    }

    fn edges_directed(&self, normalized_path: &str, direction: Direction) -> Vec<&ImportEdge> {
        let Some(&idx) = self.indices.get(normalized_path) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.inner.edges_directed(idx, direction).collect();
        edges.sort_by_key(|edge_ref| edge_ref.id());
        edges.into_iter().map(|edge_ref| edge_ref.weight()).collect()
    }
}

impl Default for ImportGraph {
    fn default() -> Self {
        Self::new()
    }
}
