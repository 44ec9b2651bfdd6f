use log::{debug, trace};
use std::collections::VecDeque;

use super::{Cluster, ClusterLayout, HierNode};
use crate::graph::MapGraph;
use crate::models::{ClusterId, HierNodeId, NodeId};
use crate::neighbor_policy::touches;

/// Low-level edge leaving one cluster: `(inside, outside)`.
pub type Crossing = (NodeId, NodeId);

#[derive(Clone, Debug, Default)]
pub struct TransitionStats {
    pub runs: usize,
    pub transitions_created: usize,
}

/// Labels every node with the id of its connected region inside its own
/// cluster. Two nodes share a label only if one reaches the other without
/// leaving the cluster.
pub fn region_labels(graph: &MapGraph, layout: &ClusterLayout) -> Vec<usize> {
    let mut labels = vec![usize::MAX; graph.len()];
    let mut next = 0usize;
    let mut queue = VecDeque::new();

    for seed in graph.nodes() {
        if labels[seed.id.0] != usize::MAX {
            continue;
        }
        let home = layout.cluster_at(seed.i, seed.j);
        labels[seed.id.0] = next;
        queue.push_back(seed.id);
        while let Some(id) = queue.pop_front() {
            for e in graph.get(id).edges() {
                let t = graph.get(e.to);
                if labels[e.to.0] == usize::MAX && layout.cluster_at(t.i, t.j) == home {
                    labels[e.to.0] = next;
                    queue.push_back(e.to);
                }
            }
        }
        next += 1;
    }
    labels
}

pub fn crossings(graph: &MapGraph, layout: &ClusterLayout, neighbor: ClusterId, border: &[NodeId]) -> Vec<Crossing> {
    border
        .iter()
        .filter_map(|&a| {
            graph
                .get(a)
                .edges()
                .iter()
                .find(|e| {
                    let t = graph.get(e.to);
                    layout.cluster_at(t.i, t.j) == neighbor
                })
                .map(|e| (a, e.to))
        })
        .collect()
}

/// Splits ordered crossings into maximal runs. A run breaks where cells stop
/// touching on either side, or where either side changes region.
pub fn split_runs<'c>(graph: &MapGraph, labels: &[usize], crossings: &'c [Crossing]) -> Vec<&'c [Crossing]> {
    let mut runs = Vec::new();
    let mut start = 0usize;
    for idx in 0..crossings.len() {
        let (a, b) = crossings[idx];
        let breaks = match crossings.get(idx + 1) {
            Some(&(na, nb)) => {
                !touches(graph.get(a).coords(), graph.get(na).coords())
                    || !touches(graph.get(b).coords(), graph.get(nb).coords())
                    || labels[a.0] != labels[na.0]
                    || labels[b.0] != labels[nb.0]
            }
            None => true,
        };
        if breaks {
            runs.push(&crossings[start..=idx]);
            start = idx + 1;
        }
    }
    runs
}

pub fn representative(run: &[Crossing]) -> Crossing {
    run[run.len() / 2]
}

/// One transition pair per run: the middle crossing gets an abstraction node
/// on each side, registered with its cluster and the global arena.
pub fn extract_transitions(
    graph: &MapGraph,
    layout: &ClusterLayout,
    clusters: &mut [Cluster],
    nodes: &mut Vec<HierNode>,
) -> TransitionStats {
    let mut stats = TransitionStats::default();
    let labels = region_labels(graph, layout);

    for idx in 0..clusters.len() {
        let own = clusters[idx].id;
        let mut picks: Vec<(Crossing, ClusterId)> = Vec::new();
        for (neighbor, border) in clusters[idx].borders() {
            // each seam is handled once, from the lower cluster unless only
            // the higher one has edges across it
            if neighbor < own && clusters[neighbor.0].border(own).is_some() {
                continue;
            }
            let pairs = crossings(graph, layout, neighbor, border);
            let runs = split_runs(graph, &labels, &pairs);
            trace!(
                "transitions: cluster {:?} -> {:?}: {} crossings in {} runs",
                own,
                neighbor,
                pairs.len(),
                runs.len()
            );
            picks.extend(runs.into_iter().map(|r| (representative(r), neighbor)));
        }

        stats.runs += picks.len();
        for ((inside, outside), neighbor) in picks {
            for (node, cluster) in [(inside, own), (outside, neighbor)] {
                let id = HierNodeId(nodes.len());
                nodes.push(HierNode::new(id, node, cluster));
                clusters[cluster.0].add_transition(id);
                stats.transitions_created += 1;
            }
        }
    }

    debug!(
        "transitions: {} runs -> {} transition nodes",
        stats.runs, stats.transitions_created
    );
    stats
}
