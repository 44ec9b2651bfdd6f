use log::debug;
use std::collections::HashMap;

use super::HierNode;
use crate::graph::MapGraph;
use crate::models::{EdgeKind, HierNodeId, NodeId};

#[derive(Clone, Debug, Default)]
pub struct InterStats {
    pub transitions_examined: usize,
    pub inter_edges_created: usize,
}

/// Links transitions in different clusters that share a low-level edge.
pub fn build_inter_edges(graph: &MapGraph, nodes: &mut [HierNode]) -> InterStats {
    let mut stats = InterStats::default();

    let mut by_node: HashMap<NodeId, Vec<HierNodeId>> = HashMap::new();
    for n in nodes.iter() {
        by_node.entry(n.node).or_default().push(n.id);
    }

    for idx in 0..nodes.len() {
        stats.transitions_examined += 1;
        let (from_node, from_cluster) = (nodes[idx].node, nodes[idx].cluster);

        let mut links: Vec<(HierNodeId, i64)> = Vec::new();
        for edge in graph.get(from_node).edges() {
            let Some(targets) = by_node.get(&edge.to) else { continue };
            for &t in targets {
                if nodes[t.0].cluster != from_cluster {
                    links.push((t, edge.cost as i64));
                }
            }
        }

        for (to, cost) in links {
            nodes[idx].add_edge(to, cost, EdgeKind::Inter);
            stats.inter_edges_created += 1;
        }
    }

    debug!(
        "inter: {} transitions examined -> {} inter edges",
        stats.transitions_examined, stats.inter_edges_created
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterId, Location};

    #[test]
    fn mirrors_only_existing_edges() {
        let mut g = MapGraph::new(4, 1, 1.0, Location::default());
        g.add_undirected_edge(NodeId(1), NodeId(2), 4);
        let mut nodes = vec![
            HierNode::new(HierNodeId(0), NodeId(1), ClusterId(0)),
            HierNode::new(HierNodeId(1), NodeId(2), ClusterId(1)),
            HierNode::new(HierNodeId(2), NodeId(3), ClusterId(1)),
        ];
        let stats = build_inter_edges(&g, &mut nodes);
        assert_eq!(stats.inter_edges_created, 2);
        assert_eq!(nodes[0].edges().len(), 1);
        assert_eq!(nodes[0].edges()[0].to, HierNodeId(1));
        assert_eq!(nodes[0].edges()[0].cost, 4);
        assert_eq!(nodes[0].edges()[0].kind, EdgeKind::Inter);
        assert_eq!(nodes[1].edges()[0].to, HierNodeId(0));
        assert!(nodes[2].edges().is_empty());
    }

    #[test]
    fn same_cluster_neighbours_are_left_to_intra() {
        let mut g = MapGraph::new(2, 1, 1.0, Location::default());
        g.add_undirected_edge(NodeId(0), NodeId(1), 1);
        let mut nodes = vec![
            HierNode::new(HierNodeId(0), NodeId(0), ClusterId(0)),
            HierNode::new(HierNodeId(1), NodeId(1), ClusterId(0)),
        ];
        let stats = build_inter_edges(&g, &mut nodes);
        assert_eq!(stats.inter_edges_created, 0);
    }
}
