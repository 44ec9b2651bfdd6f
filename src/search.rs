// The region filter compares against the start node's region, not the expanded node's.

use log::warn;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::heap::MinHeap;

pub const NO_PATH_COST: i64 = -1;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Scope {
    Unrestricted,
    /// Only expand neighbours whose region equals the start node's region.
    StartRegion,
}

pub trait SearchGraph {
    type Node: Copy + Eq + Hash + Debug;

    fn visit_edges<F: FnMut(Self::Node, i64)>(&self, node: Self::Node, f: F);

    fn heuristic(&self, from: Self::Node, to: Self::Node) -> i64;

    fn region(&self, _node: Self::Node) -> usize {
        0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult<N> {
    /// Start to goal inclusive; empty when unreachable.
    pub path: Vec<N>,
    pub cost: i64,
}

impl<N> PathResult<N> {
    pub fn unreachable() -> Self {
        Self { path: Vec::new(), cost: NO_PATH_COST }
    }

    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

pub fn astar<G: SearchGraph>(
    graph: &G,
    start: G::Node,
    goal: G::Node,
    scope: Scope,
) -> PathResult<G::Node> {
    let home = graph.region(start);

    let mut open: MinHeap<(G::Node, i64)> = MinHeap::new();
    let mut costs: HashMap<G::Node, i64> = HashMap::new();
    let mut parents: HashMap<G::Node, Option<G::Node>> = HashMap::new();

    open.enqueue((start, 0), 0);
    costs.insert(start, 0);
    parents.insert(start, None);

    while let Some((current, g)) = open.dequeue() {
        // superseded by a cheaper entry for the same node
        if costs.get(&current).is_some_and(|&best| g > best) {
            continue;
        }

        if current == goal {
            return PathResult { path: backtrack(goal, &parents), cost: g };
        }

        graph.visit_edges(current, |neighbour, cost| {
            if scope == Scope::StartRegion && graph.region(neighbour) != home {
                return;
            }
            let g_next = g + cost;
            let improves = costs.get(&neighbour).map_or(true, |&old| g_next < old);
            if improves {
                costs.insert(neighbour, g_next);
                parents.insert(neighbour, Some(current));
                open.enqueue((neighbour, g_next), g_next + graph.heuristic(neighbour, goal));
            }
        });
    }

    PathResult::unreachable()
}

pub fn backtrack<N: Copy + Eq + Hash + Debug>(goal: N, parents: &HashMap<N, Option<N>>) -> Vec<N> {
    if !parents.contains_key(&goal) {
        warn!("backtrack: no path recorded to {:?}", goal);
        return Vec::new();
    }
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&Some(prev)) = parents.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
