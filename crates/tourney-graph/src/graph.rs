//! Version graph
//!
//! Append-only audit trail of one run: nodes and parent→child edges are added,
//! never removed. Edges are only accepted between nodes that are already
//! present, and the pipeline only ever connects an existing node to a node it
//! just created, which keeps the structure acyclic without a cycle check on
//! every insert. [`VersionGraph::is_acyclic`] verifies that after the fact.

use crate::error::GraphError;
use crate::id::IdFactory;
use crate::node::VersionNode;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Prefix for edge identifiers issued by [`VersionGraph::connect`]
pub const EDGE_PREFIX: &str = "edge";

/// Directed parent→child edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionEdge {
    /// Edge identifier
    pub id: String,
    /// Producing node
    pub source: String,
    /// Produced node
    pub target: String,
}

impl VersionEdge {
    /// Create an edge
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Full serializable copy of a graph, as streamed to observers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in insertion order
    pub nodes: Vec<VersionNode>,
    /// Edges in insertion order
    pub edges: Vec<VersionEdge>,
}

impl GraphSnapshot {
    /// Node lookup by id
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&VersionNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }
}

/// The exploration DAG
#[derive(Debug, Clone, Default)]
pub struct VersionGraph {
    nodes: Vec<VersionNode>,
    edges: Vec<VersionEdge>,
    index: HashMap<String, usize>,
    edge_ids: HashSet<String>,
}

impl VersionGraph {
    /// Create an empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node
    ///
    /// # Errors
    /// - `GraphError::DuplicateNode` if the id is already present
    pub fn add_node(&mut self, node: VersionNode) -> Result<&VersionNode, GraphError> {
        if self.index.contains_key(node.id()) {
            return Err(GraphError::DuplicateNode(node.id().to_string()));
        }
        let position = self.nodes.len();
        self.index.insert(node.id().to_string(), position);
        self.nodes.push(node);
        Ok(&self.nodes[position])
    }

    /// Add an edge between two present nodes
    ///
    /// # Errors
    /// - `GraphError::UnknownNode` if either endpoint is missing
    /// - `GraphError::SelfLoop` if source and target are the same node
    /// - `GraphError::DuplicateEdge` if the edge id is already present
    pub fn add_edge(&mut self, edge: VersionEdge) -> Result<&VersionEdge, GraphError> {
        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.source));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.index.contains_key(endpoint.as_str()) {
                return Err(GraphError::UnknownNode(endpoint.clone()));
            }
        }
        if !self.edge_ids.insert(edge.id.clone()) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        self.edges.push(edge);
        Ok(&self.edges[self.edges.len() - 1])
    }

    /// Add an edge with an identifier drawn from `ids`
    ///
    /// # Errors
    /// Same as [`VersionGraph::add_edge`]
    pub fn connect(
        &mut self,
        ids: &IdFactory,
        source: &str,
        target: &str,
    ) -> Result<&VersionEdge, GraphError> {
        let edge = VersionEdge::new(ids.new_id(EDGE_PREFIX), source, target);
        self.add_edge(edge)
    }

    /// Node lookup by id
    #[inline]
    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<&VersionNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether a node with this id is present
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Mutate a node in place
    ///
    /// Returns `None` without calling `f` when the id is absent.
    pub fn update_node<R>(&mut self, id: &str, f: impl FnOnce(&mut VersionNode) -> R) -> Option<R> {
        let position = *self.index.get(id)?;
        Some(f(&mut self.nodes[position]))
    }

    /// Nodes in insertion order
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[VersionNode] {
        &self.nodes
    }

    /// Edges in insertion order
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[VersionEdge] {
        &self.edges
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Direct children of a node, in edge insertion order
    #[must_use]
    pub fn children(&self, id: &str) -> Vec<&VersionNode> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .filter_map(|e| self.get_node(&e.target))
            .collect()
    }

    /// Nodes without incoming edges
    #[must_use]
    pub fn roots(&self) -> Vec<&VersionNode> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.target.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !targets.contains(n.id()))
            .collect()
    }

    /// Whether the edge set is free of cycles
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        let mut g: DiGraphMap<&str, ()> = DiGraphMap::new();
        for node in &self.nodes {
            g.add_node(node.id());
        }
        for edge in &self.edges {
            g.add_edge(edge.source.as_str(), edge.target.as_str(), ());
        }
        !petgraph::algo::is_cyclic_directed(&g)
    }

    /// Append every node and edge of `other` that is not already present
    ///
    /// Nodes whose id already exists here are skipped, which lets a scratch
    /// graph carry a copy of its anchor node. Edges are added after all nodes
    /// so they may reference nodes from either graph.
    ///
    /// # Errors
    /// - `GraphError::UnknownNode` if an edge endpoint is in neither graph
    /// - `GraphError::DuplicateEdge` if an edge id collides
    pub fn extend_from(&mut self, other: VersionGraph) -> Result<(), GraphError> {
        for node in other.nodes {
            if !self.contains(node.id()) {
                self.add_node(node)?;
            }
        }
        for edge in other.edges {
            self.add_edge(edge)?;
        }
        Ok(())
    }

    /// Serializable copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

impl TryFrom<GraphSnapshot> for VersionGraph {
    type Error = GraphError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut graph = VersionGraph::new();
        for node in snapshot.nodes {
            graph.add_node(node)?;
        }
        for edge in snapshot.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}

impl From<&VersionGraph> for GraphSnapshot {
    fn from(graph: &VersionGraph) -> Self {
        graph.snapshot()
    }
}

impl Serialize for VersionGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("VersionGraph", 2)?;
        state.serialize_field("nodes", &self.nodes)?;
        state.serialize_field("edges", &self.edges)?;
        state.end()
    }
}
