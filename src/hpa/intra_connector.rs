use log::{debug, trace};
use rayon::prelude::*;

use super::{Cluster, ClusteredGrid, HierNode};
use crate::models::{EdgeKind, HierNodeId};

#[derive(Clone, Debug, Default)]
pub struct IntraStats {
    pub clusters_processed: usize,
    pub searches: usize,
    pub edges_created: usize,
}

/// For every ordered pair of distinct transitions in the same cluster, runs
/// A* confined to that cluster and stores the path cost as an abstraction
/// edge. Clusters are searched in parallel; edges are applied in cluster
/// order afterwards.
pub fn build_intra_edges(grid: ClusteredGrid<'_>, clusters: &[Cluster], nodes: &mut [HierNode]) -> IntraStats {
    let mut stats = IntraStats::default();

    let per_cluster: Vec<(usize, Vec<(HierNodeId, HierNodeId, i64)>)> = {
        let arena: &[HierNode] = nodes;
        clusters
            .par_iter()
            .map(|cluster| {
                let ts = cluster.transitions();
                let mut searches = 0usize;
                let mut found = Vec::new();
                for &a in ts {
                    for &b in ts {
                        if a == b {
                            continue;
                        }
                        searches += 1;
                        let result = grid.restricted_search(arena[a.0].node, arena[b.0].node);
                        if result.found() {
                            found.push((a, b, result.cost));
                        } else {
                            trace!(
                                "intra: no path inside cluster {:?} from {:?} to {:?}",
                                cluster.id,
                                a,
                                b
                            );
                        }
                    }
                }
                (searches, found)
            })
            .collect()
    };

    for (searches, found) in per_cluster {
        stats.clusters_processed += 1;
        stats.searches += searches;
        for (a, b, cost) in found {
            nodes[a.0].add_edge(b, cost, EdgeKind::Intra);
            stats.edges_created += 1;
        }
    }

    debug!(
        "intra: {} clusters, {} searches -> {} intra edges",
        stats.clusters_processed, stats.searches, stats.edges_created
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MapGraph;
    use crate::hpa::ClusterLayout;
    use crate::models::{ClusterId, Location, NodeId};

    /// 3x3 cluster whose left and right columns only meet through row 2.
    fn u_shaped() -> MapGraph {
        let mut g = MapGraph::new(3, 3, 1.0, Location::default());
        for (a, b) in [(0, 3), (3, 6), (6, 7), (7, 8), (8, 5), (5, 2)] {
            g.add_undirected_edge(NodeId(a), NodeId(b), 1);
        }
        g
    }

    #[test]
    fn costs_are_restricted_shortest_paths() {
        let g = u_shaped();
        let layout = ClusterLayout::new(3, 3, 3);
        let mut cluster = Cluster::new(ClusterId(0));
        cluster.add_transition(HierNodeId(0));
        cluster.add_transition(HierNodeId(1));
        let mut nodes = vec![
            HierNode::new(HierNodeId(0), NodeId(0), ClusterId(0)),
            HierNode::new(HierNodeId(1), NodeId(2), ClusterId(0)),
        ];
        let stats = build_intra_edges(ClusteredGrid { graph: &g, layout }, &[cluster], &mut nodes);
        assert_eq!(stats.searches, 2);
        assert_eq!(stats.edges_created, 2);
        assert_eq!(nodes[0].edges()[0].cost, 6);
        assert_eq!(nodes[0].edges()[0].kind, EdgeKind::Intra);
        assert_eq!(nodes[1].edges()[0].to, HierNodeId(0));
    }

    #[test]
    fn disconnected_pair_gets_no_edge() {
        // Cluster side 2 cuts row 2 off from the left and right columns.
        let g = u_shaped();
        let layout = ClusterLayout::new(3, 3, 2);
        let mut cluster = Cluster::new(ClusterId(0));
        cluster.add_transition(HierNodeId(0));
        cluster.add_transition(HierNodeId(1));
        let mut nodes = vec![
            HierNode::new(HierNodeId(0), NodeId(0), ClusterId(0)),
            HierNode::new(HierNodeId(1), NodeId(1), ClusterId(0)),
        ];
        let stats = build_intra_edges(ClusteredGrid { graph: &g, layout }, &[cluster], &mut nodes);
        assert_eq!(stats.searches, 2);
        assert_eq!(stats.edges_created, 0);
    }
}
