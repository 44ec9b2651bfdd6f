use log::debug;

use super::{Cluster, ClusterLayout};
use crate::models::ClusterId;

#[derive(Clone, Debug, Default)]
pub struct BuildStats {
    pub clusters_created: usize,
}

/// One empty cluster per layout cell, indexed `cy * cols + cx`.
pub fn build_clusters(layout: &ClusterLayout) -> (Vec<Cluster>, BuildStats) {
    let clusters: Vec<Cluster> = (0..layout.count()).map(|idx| Cluster::new(ClusterId(idx))).collect();
    debug!(
        "clusters: {}x{} clusters of side {}",
        layout.cols, layout.rows, layout.size
    );
    let stats = BuildStats { clusters_created: clusters.len() };
    (clusters, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_by_nine_with_side_three_gives_nine_clusters() {
        let (clusters, stats) = build_clusters(&ClusterLayout::new(9, 9, 3));
        assert_eq!(stats.clusters_created, 9);
        for (idx, c) in clusters.iter().enumerate() {
            assert_eq!(c.id, ClusterId(idx));
            assert!(c.transitions().is_empty());
        }
    }

    #[test]
    fn oversized_cluster_covers_grid() {
        let (clusters, _) = build_clusters(&ClusterLayout::new(5, 5, 8));
        assert_eq!(clusters.len(), 1);
    }
}
