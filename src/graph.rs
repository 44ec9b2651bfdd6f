use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Location, NodeId, TileKind};
use crate::neighbor_policy::CARDINAL;
use crate::search::{self, PathResult, Scope, SearchGraph};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub cost: u32,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub i: i32,
    pub j: i32,
    pub kind: TileKind,
    edges: Vec<Edge>,
}

impl Node {
    fn new(id: NodeId, i: i32, j: i32, kind: TileKind) -> Self {
        Self { id, i, j, kind, edges: Vec::new() }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_to(&self, target: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.to == target)
    }

    pub fn is_ground(&self) -> bool {
        self.kind.is_traversable()
    }

    pub fn coords(&self) -> (i32, i32) {
        (self.i, self.j)
    }
}

#[derive(Clone, Debug)]
pub struct MapGraph {
    nodes: Vec<Node>,
    cols: usize,
    rows: usize,
    tile_size: f32,
    origin: Location,
    pub entrance: NodeId,
    pub exit: Option<NodeId>,
}

impl MapGraph {
    pub fn new(cols: usize, rows: usize, tile_size: f32, origin: Location) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(cols * rows),
            cols,
            rows,
            tile_size,
            origin,
            entrance: NodeId(0),
            exit: None,
        };
        graph.create_nodes();
        graph
    }

    fn create_nodes(&mut self) {
        for j in 0..self.rows {
            for i in 0..self.cols {
                let id = NodeId(self.nodes.len());
                self.nodes.push(Node::new(id, i as i32, j as i32, TileKind::Ground));
            }
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_at(&self, i: i32, j: i32) -> Option<NodeId> {
        if i < 0 || j < 0 || i as usize >= self.cols || j as usize >= self.rows {
            return None;
        }
        Some(NodeId(j as usize * self.cols + i as usize))
    }

    pub fn ground_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.is_ground())
    }

    /// Changing a node to a wall drops every edge touching it.
    pub fn set_kind(&mut self, id: NodeId, kind: TileKind) {
        self.nodes[id.0].kind = kind;
        if !kind.is_traversable() {
            let targets: Vec<NodeId> = self.nodes[id.0].edges.iter().map(|e| e.to).collect();
            for t in targets {
                self.nodes[t.0].edges.retain(|e| e.to != id);
            }
            self.nodes[id.0].edges.clear();
        }
    }

    pub fn grid_neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.get(id);
        CARDINAL
            .iter()
            .filter_map(|off| {
                let (ni, nj) = off.apply(node.i, node.j);
                self.get_at(ni, nj)
            })
            .collect()
    }

    // ---- edges ----

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, cost: u32) -> bool {
        if from == to || self.has_edge(from, to) {
            return false;
        }
        self.nodes[from.0].edges.push(Edge { to, cost });
        true
    }

    pub fn add_undirected_edge(&mut self, a: NodeId, b: NodeId, cost: u32) -> bool {
        let forward = self.add_edge(a, b, cost);
        let backward = self.add_edge(b, a, cost);
        forward && backward
    }

    pub fn remove_undirected_edge(&mut self, a: NodeId, b: NodeId) {
        self.nodes[a.0].edges.retain(|e| e.to != b);
        self.nodes[b.0].edges.retain(|e| e.to != a);
    }

    pub fn clear_edges(&mut self) {
        for node in self.nodes.iter_mut() {
            node.edges.clear();
        }
    }

    /// Connects every ground cell to each ground 4-neighbour.
    pub fn connect_grid(&mut self, cost: u32) {
        for idx in 0..self.nodes.len() {
            let id = NodeId(idx);
            if !self.get(id).is_ground() {
                continue;
            }
            for n in self.grid_neighbors(id) {
                if self.get(n).is_ground() {
                    self.add_edge(id, n, cost);
                }
            }
        }
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.get(from).edge_to(to)
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edge(from, to).is_some()
    }

    pub fn directed_edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    pub fn undirected_edge_count(&self) -> usize {
        self.directed_edge_count() / 2
    }

    pub fn reachable_from(&self, from: NodeId) -> HashSet<NodeId> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut q: VecDeque<NodeId> = VecDeque::new();
        seen.insert(from);
        q.push_back(from);
        while let Some(cur) = q.pop_front() {
            for e in self.get(cur).edges() {
                if seen.insert(e.to) {
                    q.push_back(e.to);
                }
            }
        }
        seen
    }

    // ---- world space ----

    /// Node whose cell contains `location`, if it lies on the grid.
    pub fn quantize(&self, location: Location) -> Option<NodeId> {
        let fi = ((location.x - self.origin.x) / self.tile_size).floor();
        let fj = ((location.z - self.origin.z) / self.tile_size).floor();
        if !fi.is_finite() || !fj.is_finite() || fi < 0.0 || fj < 0.0 {
            return None;
        }
        self.get_at(fi as i32, fj as i32)
    }

    pub fn localize(&self, id: NodeId) -> Location {
        let node = self.get(id);
        Location {
            x: self.origin.x + node.i as f32 * self.tile_size + self.tile_size / 2.0,
            z: self.origin.z + node.j as f32 * self.tile_size + self.tile_size / 2.0,
        }
    }

    // ---- search helpers ----

    pub fn manhattan(&self, a: NodeId, b: NodeId) -> i64 {
        let (a, b) = (self.get(a), self.get(b));
        ((a.i - b.i).abs() + (a.j - b.j).abs()) as i64
    }

    pub fn backtrack(&self, goal: NodeId, parents: &HashMap<NodeId, Option<NodeId>>) -> Vec<NodeId> {
        search::backtrack(goal, parents)
    }

    pub fn astar(&self, start: NodeId, goal: NodeId) -> PathResult<NodeId> {
        let result = search::astar(self, start, goal, Scope::Unrestricted);
        debug!(
            "grid astar {:?} -> {:?}: {} nodes, cost {}",
            start,
            goal,
            result.path.len(),
            result.cost
        );
        result
    }
}

impl SearchGraph for MapGraph {
    type Node = NodeId;

    fn visit_edges<F: FnMut(NodeId, i64)>(&self, node: NodeId, mut f: F) {
        for e in self.get(node).edges() {
            f(e.to, e.cost as i64);
        }
    }

    fn heuristic(&self, from: NodeId, to: NodeId) -> i64 {
        self.manhattan(from, to)
    }
}
