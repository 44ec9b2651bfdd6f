use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::graph::MapGraph;
use crate::models::{ClusterId, EdgeKind, HierNodeId, NodeId};
use crate::search::{self, PathResult, Scope, SearchGraph};

pub mod border_discovery;
pub mod cluster_builder;
pub mod executor;
pub mod inter_connector;
pub mod intra_connector;
pub mod query;
pub mod transition_builder;

pub use query::Route;

/// Square partition of the grid into clusters of `size` cells per side.
/// The last column/row of clusters may be partial.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ClusterLayout {
    pub size: usize,
    pub cols: usize,
    pub rows: usize,
}

impl ClusterLayout {
    pub fn new(grid_cols: usize, grid_rows: usize, size: usize) -> Self {
        Self { size, cols: grid_cols.div_ceil(size), rows: grid_rows.div_ceil(size) }
    }

    pub fn count(&self) -> usize {
        self.cols * self.rows
    }

    pub fn cluster_at(&self, i: i32, j: i32) -> ClusterId {
        let cx = i as usize / self.size;
        let cy = j as usize / self.size;
        ClusterId(cy * self.cols + cx)
    }
}

#[derive(Clone, Debug)]
pub struct Cluster {
    pub id: ClusterId,
    borders: BTreeMap<ClusterId, Vec<NodeId>>,
    transitions: Vec<HierNodeId>,
}

impl Cluster {
    pub fn new(id: ClusterId) -> Self {
        Self { id, borders: BTreeMap::new(), transitions: Vec::new() }
    }

    /// Registers `node` as facing `neighbor`. Consecutive repeats collapse.
    pub fn add_border_node(&mut self, neighbor: ClusterId, node: NodeId) {
        let border = self.borders.entry(neighbor).or_default();
        if border.last() != Some(&node) {
            border.push(node);
        }
    }

    pub fn border(&self, neighbor: ClusterId) -> Option<&[NodeId]> {
        self.borders.get(&neighbor).map(|v| v.as_slice())
    }

    pub fn borders(&self) -> impl Iterator<Item = (ClusterId, &[NodeId])> + '_ {
        self.borders.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn add_transition(&mut self, id: HierNodeId) {
        self.transitions.push(id);
    }

    pub fn transitions(&self) -> &[HierNodeId] {
        &self.transitions
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HierEdge {
    pub to: HierNodeId,
    pub cost: i64,
    pub kind: EdgeKind,
}

/// Abstraction node wrapping one grid node.
#[derive(Clone, Debug)]
pub struct HierNode {
    pub id: HierNodeId,
    pub node: NodeId,
    pub cluster: ClusterId,
    edges: Vec<HierEdge>,
}

impl HierNode {
    pub fn new(id: HierNodeId, node: NodeId, cluster: ClusterId) -> Self {
        Self { id, node, cluster, edges: Vec::new() }
    }

    pub fn edges(&self) -> &[HierEdge] {
        &self.edges
    }

    pub fn add_edge(&mut self, to: HierNodeId, cost: i64, kind: EdgeKind) {
        if to != self.id {
            self.edges.push(HierEdge { to, cost, kind });
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PreprocessStats {
    pub clusters: usize,
    pub border_nodes: usize,
    pub transitions: usize,
    pub inter_edges: usize,
    pub intra_edges: usize,
}

pub struct HierarchicalGraph {
    graph: Arc<MapGraph>,
    layout: ClusterLayout,
    clusters: Vec<Cluster>,
    nodes: Vec<HierNode>,
    stats: PreprocessStats,
}

impl HierarchicalGraph {
    pub fn build(graph: Arc<MapGraph>, cluster_size: usize) -> Result<Self> {
        executor::run_pipeline(graph, cluster_size)
    }

    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    pub fn layout(&self) -> ClusterLayout {
        self.layout
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    pub fn nodes(&self) -> &[HierNode] {
        &self.nodes
    }

    pub fn node(&self, id: HierNodeId) -> &HierNode {
        &self.nodes[id.0]
    }

    pub fn stats(&self) -> &PreprocessStats {
        &self.stats
    }

    pub fn cluster_of(&self, node: NodeId) -> ClusterId {
        let n = self.graph.get(node);
        self.layout.cluster_at(n.i, n.j)
    }

    pub fn transition_for(&self, cluster: ClusterId, node: NodeId) -> Option<HierNodeId> {
        self.cluster(cluster)
            .transitions()
            .iter()
            .copied()
            .find(|t| self.nodes[t.0].node == node)
    }

    pub fn abstract_edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    fn clustered(&self) -> ClusteredGrid<'_> {
        ClusteredGrid { graph: &self.graph, layout: self.layout }
    }
}

/// The low-level grid with each node's region set to its cluster.
#[derive(Copy, Clone)]
pub struct ClusteredGrid<'a> {
    pub graph: &'a MapGraph,
    pub layout: ClusterLayout,
}

impl ClusteredGrid<'_> {
    pub fn restricted_search(&self, from: NodeId, to: NodeId) -> PathResult<NodeId> {
        search::astar(self, from, to, Scope::StartRegion)
    }
}

impl SearchGraph for ClusteredGrid<'_> {
    type Node = NodeId;

    fn visit_edges<F: FnMut(NodeId, i64)>(&self, node: NodeId, f: F) {
        self.graph.visit_edges(node, f)
    }

    fn heuristic(&self, from: NodeId, to: NodeId) -> i64 {
        self.graph.manhattan(from, to)
    }

    fn region(&self, node: NodeId) -> usize {
        let n = self.graph.get(node);
        self.layout.cluster_at(n.i, n.j).0
    }
}
