use anyhow::{bail, Result};
use log::{debug, info};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::MapGraph;
use crate::models::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MazeMode {
    Perfect,
    Braided { loop_probability: f64 },
    /// No carving: the grid stays fully connected.
    Empty,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MazeStats {
    pub cells_carved: usize,
    pub undirected_edges: usize,
    pub dead_ends_braided: usize,
}

struct Frame {
    node: NodeId,
    neighbors: Vec<NodeId>,
    next: usize,
}

impl Frame {
    fn open<R: Rng + ?Sized>(graph: &MapGraph, node: NodeId, rng: &mut R) -> Self {
        let mut neighbors = graph.grid_neighbors(node);
        neighbors.shuffle(rng);
        Self { node, neighbors, next: 0 }
    }
}

pub fn generate<R: Rng + ?Sized>(
    graph: &mut MapGraph,
    mode: MazeMode,
    seed: NodeId,
    step_cost: u32,
    rng: &mut R,
) -> Result<MazeStats> {
    let mut stats = MazeStats::default();
    match mode {
        MazeMode::Perfect => {
            stats.cells_carved = carve_perfect(graph, seed, step_cost, rng);
        }
        MazeMode::Braided { loop_probability } => {
            if !(0.0..=1.0).contains(&loop_probability) {
                bail!("maze: loop probability {} outside [0, 1]", loop_probability);
            }
            stats.cells_carved = carve_perfect(graph, seed, step_cost, rng);
            stats.dead_ends_braided = braid(graph, loop_probability, step_cost, rng);
        }
        MazeMode::Empty => {
            empty_room(graph, step_cost);
            stats.cells_carved = graph.ground_nodes().count();
        }
    }
    stats.undirected_edges = graph.undirected_edge_count();
    info!(
        "maze: {:?} over {}x{} -> cells={} edges={} braided={}",
        mode,
        graph.cols(),
        graph.rows(),
        stats.cells_carved,
        stats.undirected_edges,
        stats.dead_ends_braided
    );
    Ok(stats)
}

/// Replaces all edges with a random spanning tree over the ground cells
/// reachable from `seed`. Returns the number of cells in the tree.
pub fn carve_perfect<R: Rng + ?Sized>(graph: &mut MapGraph, seed: NodeId, cost: u32, rng: &mut R) -> usize {
    graph.clear_edges();
    if !graph.get(seed).is_ground() {
        return 0;
    }

    let mut visited = vec![false; graph.len()];
    visited[seed.0] = true;
    let mut carved = 1usize;
    let mut stack: Vec<Frame> = vec![Frame::open(graph, seed, rng)];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.neighbors.len() {
            stack.pop();
            continue;
        }
        let from = frame.node;
        let to = frame.neighbors[frame.next];
        frame.next += 1;

        if visited[to.0] || !graph.get(to).is_ground() {
            continue;
        }
        visited[to.0] = true;
        graph.add_undirected_edge(from, to, cost);
        carved += 1;
        stack.push(Frame::open(graph, to, rng));
    }

    debug!("maze: carved spanning tree of {} cells from {:?}", carved, seed);
    carved
}

/// For each dead end, with probability `p`, links it to a random adjacent
/// ground cell it is not yet connected to. Cells are examined in id order and
/// a cell only counts as a dead end if it still has one edge when reached.
pub fn braid<R: Rng + ?Sized>(graph: &mut MapGraph, p: f64, cost: u32, rng: &mut R) -> usize {
    let mut braided = 0usize;
    for idx in 0..graph.len() {
        let id = NodeId(idx);
        let node = graph.get(id);
        if !node.is_ground() || node.edges().len() != 1 {
            continue;
        }
        if !rng.random_bool(p) {
            continue;
        }
        let candidates: Vec<NodeId> = graph
            .grid_neighbors(id)
            .into_iter()
            .filter(|&n| graph.get(n).is_ground() && !graph.has_edge(id, n))
            .collect();
        if let Some(&pick) = candidates.choose(rng) {
            graph.add_undirected_edge(id, pick, cost);
            braided += 1;
        }
    }
    debug!("maze: braided {} dead ends (p={})", braided, p);
    braided
}

pub fn empty_room(graph: &mut MapGraph, cost: u32) {
    graph.clear_edges();
    graph.connect_grid(cost);
}

pub fn dead_ends(graph: &MapGraph) -> usize {
    graph.ground_nodes().filter(|n| n.edges().len() == 1).count()
}

pub fn verify_connected(graph: &MapGraph, from: NodeId) -> Result<()> {
    let reachable = graph.reachable_from(from);
    if let Some(n) = graph.ground_nodes().find(|n| !reachable.contains(&n.id)) {
        bail!(
            "maze: ground node {:?} at ({}, {}) is unreachable from {:?}",
            n.id,
            n.i,
            n.j,
            from
        );
    }
    Ok(())
}
