use anyhow::{bail, Result};
use log::{debug, info};
use std::sync::Arc;

use super::border_discovery;
use super::cluster_builder;
use super::inter_connector;
use super::intra_connector;
use super::transition_builder;
use super::{ClusterLayout, HierarchicalGraph, PreprocessStats};
use crate::graph::MapGraph;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    Clusters,
    Borders,
    Transitions,
    Inter,
    Intra,
    Validate,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Stage::Clusters => "hpa_stage_clusters",
            Stage::Borders => "hpa_stage_borders",
            Stage::Transitions => "hpa_stage_transitions",
            Stage::Inter => "hpa_stage_inter",
            Stage::Intra => "hpa_stage_intra",
            Stage::Validate => "hpa_stage_validate",
        }
    }

    pub fn all() -> &'static [Stage] {
        &[
            Stage::Clusters,
            Stage::Borders,
            Stage::Transitions,
            Stage::Inter,
            Stage::Intra,
            Stage::Validate,
        ]
    }
}

pub fn run_pipeline(graph: Arc<MapGraph>, cluster_size: usize) -> Result<HierarchicalGraph> {
    if cluster_size == 0 {
        bail!("hpa: cluster size must be at least 1");
    }
    let layout = ClusterLayout::new(graph.cols(), graph.rows(), cluster_size);
    let mut hg = HierarchicalGraph {
        graph,
        layout,
        clusters: Vec::new(),
        nodes: Vec::new(),
        stats: PreprocessStats::default(),
    };

    for &stage in Stage::all() {
        debug!("hpa: running {}", stage.key());
        match stage {
            Stage::Clusters => {
                let (clusters, s) = cluster_builder::build_clusters(&hg.layout);
                hg.clusters = clusters;
                hg.stats.clusters = s.clusters_created;
            }
            Stage::Borders => {
                let s = border_discovery::discover_borders(&hg.graph, &hg.layout, &mut hg.clusters);
                hg.stats.border_nodes = s.border_nodes;
            }
            Stage::Transitions => {
                let s = transition_builder::extract_transitions(
                    &hg.graph,
                    &hg.layout,
                    &mut hg.clusters,
                    &mut hg.nodes,
                );
                hg.stats.transitions = s.transitions_created;
            }
            Stage::Inter => {
                let s = inter_connector::build_inter_edges(&hg.graph, &mut hg.nodes);
                hg.stats.inter_edges = s.inter_edges_created;
            }
            Stage::Intra => {
                let grid = super::ClusteredGrid { graph: &hg.graph, layout: hg.layout };
                let s = intra_connector::build_intra_edges(grid, &hg.clusters, &mut hg.nodes);
                hg.stats.intra_edges = s.edges_created;
                // Arena order for every edge list, whatever stage produced it.
                for n in hg.nodes.iter_mut() {
                    n.edges.sort_by_key(|e| e.to);
                }
            }
            Stage::Validate => validate(&hg)?,
        }
    }

    info!(
        "hpa: clusters={} border_nodes={} transitions={} inter_edges={} intra_edges={}",
        hg.stats.clusters,
        hg.stats.border_nodes,
        hg.stats.transitions,
        hg.stats.inter_edges,
        hg.stats.intra_edges
    );
    Ok(hg)
}

/// Every abstraction node must be owned by the cluster containing its
/// wrapped node, and every edge must stay inside the arena.
pub fn validate(hg: &HierarchicalGraph) -> Result<()> {
    let arena = hg.nodes.len();

    for n in hg.nodes.iter() {
        let expected = hg.cluster_of(n.node);
        if n.cluster != expected {
            bail!(
                "validate: transition {:?} wraps {:?} in cluster {:?} but claims {:?}",
                n.id,
                n.node,
                expected,
                n.cluster
            );
        }
        let Some(cluster) = hg.clusters.get(n.cluster.0) else {
            bail!("validate: transition {:?} references missing cluster {:?}", n.id, n.cluster);
        };
        if !cluster.transitions().contains(&n.id) {
            bail!(
                "validate: transition {:?} is not referenced by cluster {:?}",
                n.id,
                n.cluster
            );
        }
        for e in n.edges() {
            if e.to.0 >= arena || e.to == n.id {
                bail!("validate: transition {:?} has bad edge to {:?}", n.id, e.to);
            }
        }
    }

    for c in hg.clusters.iter() {
        for t in c.transitions() {
            match hg.nodes.get(t.0) {
                Some(n) if n.cluster == c.id => {}
                _ => bail!("validate: cluster {:?} lists foreign transition {:?}", c.id, t),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpa::HierNode;
    use crate::models::{ClusterId, HierNodeId, Location, NodeId};

    fn open_grid(cols: usize, rows: usize) -> Arc<MapGraph> {
        let mut g = MapGraph::new(cols, rows, 1.0, Location::default());
        g.connect_grid(1);
        Arc::new(g)
    }

    #[test]
    fn pipeline_fills_stats() -> Result<()> {
        let hg = run_pipeline(open_grid(9, 9), 3)?;
        let s = hg.stats();
        assert_eq!(s.clusters, 9);
        assert_eq!(s.transitions, 24);
        // Each seam pairs two facing transitions in both directions.
        assert_eq!(s.inter_edges, 24);
        // Corner clusters hold 2 transitions, edges 4, center 4 -> 12 ordered pairs.
        assert_eq!(s.intra_edges, 4 * 2 + 4 * 6 + 12);
        assert_eq!(hg.abstract_edge_count(), s.inter_edges + s.intra_edges);
        Ok(())
    }

    #[test]
    fn edges_are_sorted_by_target() -> Result<()> {
        let hg = run_pipeline(open_grid(12, 12), 4)?;
        for n in hg.nodes() {
            assert!(n.edges().windows(2).all(|w| w[0].to <= w[1].to));
        }
        Ok(())
    }

    #[test]
    fn zero_cluster_size_is_rejected() {
        assert!(run_pipeline(open_grid(3, 3), 0).is_err());
    }

    #[test]
    fn validate_rejects_unreferenced_transition() -> Result<()> {
        let mut hg = run_pipeline(open_grid(6, 6), 3)?;
        let victim = hg.clusters[0].transitions()[0];
        hg.clusters[0].transitions.retain(|t| *t != victim);
        let err = validate(&hg).unwrap_err();
        assert!(err.to_string().contains("not referenced"));
        Ok(())
    }

    #[test]
    fn validate_rejects_misfiled_transition() -> Result<()> {
        let mut hg = run_pipeline(open_grid(6, 6), 3)?;
        let id = HierNodeId(hg.nodes.len());
        hg.nodes.push(HierNode::new(id, NodeId(0), ClusterId(3)));
        hg.clusters[3].add_transition(id);
        assert!(validate(&hg).is_err());
        Ok(())
    }

    #[test]
    fn stage_keys_are_unique() {
        let mut keys: Vec<&str> = Stage::all().iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Stage::all().len());
    }
}
