use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

use super::{HierEdge, HierNode, HierarchicalGraph};
use crate::models::{ClusterId, EdgeKind, HierNodeId, NodeId};
use crate::search::{self, Scope, SearchGraph};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Low-level nodes after the start, ending with the goal.
    pub nodes: Vec<NodeId>,
    pub cost: i64,
}

struct Overlay {
    base: usize,
    nodes: Vec<HierNode>,
    extra: HashMap<HierNodeId, Vec<HierEdge>>,
}

impl Overlay {
    fn new(base: usize) -> Self {
        Self { base, nodes: Vec::new(), extra: HashMap::new() }
    }

    fn add_node(&mut self, node: NodeId, cluster: ClusterId) -> HierNodeId {
        let id = HierNodeId(self.base + self.nodes.len());
        self.nodes.push(HierNode::new(id, node, cluster));
        id
    }

    fn add_edge(&mut self, from: HierNodeId, to: HierNodeId, cost: i64) {
        if from.0 >= self.base {
            self.nodes[from.0 - self.base].add_edge(to, cost, EdgeKind::Intra);
        } else if from != to {
            self.extra.entry(from).or_default().push(HierEdge { to, cost, kind: EdgeKind::Intra });
        }
    }
}

/// Permanent arena plus one query's overlay, searchable as one graph.
struct AbstractView<'a> {
    hg: &'a HierarchicalGraph,
    overlay: &'a Overlay,
}

impl AbstractView<'_> {
    fn hier(&self, id: HierNodeId) -> &HierNode {
        if id.0 >= self.overlay.base {
            &self.overlay.nodes[id.0 - self.overlay.base]
        } else {
            &self.hg.nodes[id.0]
        }
    }

    fn wrapped(&self, id: HierNodeId) -> NodeId {
        self.hier(id).node
    }
}

impl SearchGraph for AbstractView<'_> {
    type Node = HierNodeId;

    fn visit_edges<F: FnMut(HierNodeId, i64)>(&self, node: HierNodeId, mut f: F) {
        for e in self.hier(node).edges() {
            f(e.to, e.cost);
        }
        if let Some(extra) = self.overlay.extra.get(&node) {
            for e in extra {
                f(e.to, e.cost);
            }
        }
    }

    fn heuristic(&self, from: HierNodeId, to: HierNodeId) -> i64 {
        self.hg.graph.manhattan(self.wrapped(from), self.wrapped(to))
    }
}

impl HierarchicalGraph {
    /// Low-level path from `start` to `end`; empty when unreachable or when
    /// `start == end`.
    pub fn path(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        self.route(start, end).map(|r| r.nodes).unwrap_or_default()
    }

    pub fn distance(&self, start: NodeId, end: NodeId) -> Option<usize> {
        self.route(start, end).map(|r| r.nodes.len())
    }

    pub fn route(&self, start: NodeId, end: NodeId) -> Option<Route> {
        if start == end {
            return Some(Route::default());
        }
        let mut overlay = Overlay::new(self.nodes.len());
        let (hier_start, hier_end) = self.attach(start, end, &mut overlay);

        let view = AbstractView { hg: self, overlay: &overlay };
        let high = search::astar(&view, hier_start, hier_end, Scope::Unrestricted);
        if !high.found() {
            debug!("query: {:?} -> {:?} unreachable at abstract level", start, end);
            return None;
        }
        self.expand(&view, &high.path)
    }

    pub fn abstract_route(&self, start: NodeId, end: NodeId) -> Option<Vec<NodeId>> {
        let mut overlay = Overlay::new(self.nodes.len());
        let (hier_start, hier_end) = self.attach(start, end, &mut overlay);
        let view = AbstractView { hg: self, overlay: &overlay };
        let high = search::astar(&view, hier_start, hier_end, Scope::Unrestricted);
        high.found().then(|| high.path.iter().map(|&h| view.wrapped(h)).collect())
    }

    fn attach(&self, start: NodeId, end: NodeId, overlay: &mut Overlay) -> (HierNodeId, HierNodeId) {
        let grid = self.clustered();
        let start_cluster = self.cluster_of(start);
        let end_cluster = self.cluster_of(end);

        let hier_start = match self.transition_for(start_cluster, start) {
            Some(t) => t,
            None => {
                let id = overlay.add_node(start, start_cluster);
                for &t in self.cluster(start_cluster).transitions() {
                    let result = grid.restricted_search(start, self.nodes[t.0].node);
                    if result.found() {
                        overlay.add_edge(id, t, result.cost);
                    }
                }
                id
            }
        };

        let hier_end = match self.transition_for(end_cluster, end) {
            Some(t) => t,
            None => {
                let id = overlay.add_node(end, end_cluster);
                for &t in self.cluster(end_cluster).transitions() {
                    let result = grid.restricted_search(self.nodes[t.0].node, end);
                    if result.found() {
                        overlay.add_edge(t, id, result.cost);
                    }
                }
                id
            }
        };

        if start_cluster == end_cluster {
            let result = grid.restricted_search(start, end);
            if result.found() {
                overlay.add_edge(hier_start, hier_end, result.cost);
            }
        }
        (hier_start, hier_end)
    }

    fn expand(&self, view: &AbstractView<'_>, high: &[HierNodeId]) -> Option<Route> {
        let grid = self.clustered();
        let mut route = Route::default();

        for pair in high.windows(2) {
            let current = view.wrapped(pair[0]);
            let next = view.wrapped(pair[1]);
            if current == next {
                continue;
            }
            if let Some(edge) = self.graph.edge(current, next) {
                route.nodes.push(next);
                route.cost += edge.cost as i64;
                continue;
            }
            let sub = grid.restricted_search(current, next);
            if !sub.found() {
                warn!("query: lost in-cluster segment {:?} -> {:?}", current, next);
                return None;
            }
            route.nodes.extend_from_slice(&sub.path[1..]);
            route.cost += sub.cost;
        }
        Some(route)
    }
}
