use log::debug;

use super::{Cluster, ClusterLayout};
use crate::graph::MapGraph;

#[derive(Clone, Debug, Default)]
pub struct BorderStats {
    pub crossing_edges: usize,
    pub border_nodes: usize,
}

/// Registers the source of every cluster-crossing edge as a border node of
/// its own cluster, bucketed by the cluster on the other side. Nodes are
/// scanned row-major so each bucket lists its nodes in grid order.
pub fn discover_borders(graph: &MapGraph, layout: &ClusterLayout, clusters: &mut [Cluster]) -> BorderStats {
    let mut stats = BorderStats::default();

    for node in graph.nodes() {
        let from = layout.cluster_at(node.i, node.j);
        for edge in node.edges() {
            let target = graph.get(edge.to);
            let to = layout.cluster_at(target.i, target.j);
            if from != to {
                clusters[from.0].add_border_node(to, node.id);
                stats.crossing_edges += 1;
            }
        }
    }

    stats.border_nodes = clusters
        .iter()
        .flat_map(|c| c.borders().map(|(_, b)| b.len()))
        .sum();
    debug!(
        "borders: {} crossing edges, {} border registrations",
        stats.crossing_edges, stats.border_nodes
    );
    stats
}
