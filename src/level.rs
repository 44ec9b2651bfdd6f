use anyhow::{bail, Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::config::LevelConfig;
use crate::graph::MapGraph;
use crate::hpa::{HierarchicalGraph, Route};
use crate::maze::{self, MazeMode, MazeStats};
use crate::models::{Location, NodeId};

const EXIT_ATTEMPTS: usize = 64;

pub struct Level {
    config: LevelConfig,
    seed: u64,
    rng: StdRng,
    number: usize,
    maze_stats: MazeStats,
    graph: Arc<MapGraph>,
    hierarchy: HierarchicalGraph,
}

struct Layout {
    graph: Arc<MapGraph>,
    hierarchy: HierarchicalGraph,
    maze_stats: MazeStats,
}

impl Level {
    pub fn generate(config: LevelConfig) -> Result<Self> {
        config.validate()?;
        let seed = match config.seed {
            Some(seed) => {
                info!("level: using configured seed {}", seed);
                seed
            }
            None => {
                let seed = rand::rng().random::<u64>();
                info!("level: drew seed {}", seed);
                seed
            }
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = build_layout(&config, &mut rng, None, config.maze_mode(), true)
            .context("generating level 1")?;
        Ok(Self {
            config,
            seed,
            rng,
            number: 1,
            maze_stats: layout.maze_stats,
            graph: layout.graph,
            hierarchy: layout.hierarchy,
        })
    }

    /// Builds the next level. The entrance is placed across the grid from
    /// the previous exit.
    pub fn regenerate(&mut self) -> Result<()> {
        let entrance = self.next_entrance();
        let mode = self.config.maze_mode();
        let layout = build_layout(&self.config, &mut self.rng, entrance, mode, true)
            .with_context(|| format!("generating level {}", self.number + 1))?;
        self.install(layout);
        Ok(())
    }

    /// Open room with no exit, entered like a regular next level.
    pub fn boss_room(&mut self) -> Result<()> {
        let entrance = self.next_entrance();
        let layout = build_layout(&self.config, &mut self.rng, entrance, MazeMode::Empty, false)
            .with_context(|| format!("generating boss room {}", self.number + 1))?;
        self.install(layout);
        Ok(())
    }

    pub fn random_border_node(&mut self) -> NodeId {
        random_border_node(&self.graph, &mut self.rng)
    }

    fn next_entrance(&self) -> Option<NodeId> {
        self.graph.exit.and_then(|exit| opposite_side(&self.graph, exit))
    }

    fn install(&mut self, layout: Layout) {
        self.number += 1;
        self.maze_stats = layout.maze_stats;
        self.graph = layout.graph;
        self.hierarchy = layout.hierarchy;
        info!(
            "level {}: entrance {:?} exit {:?}",
            self.number, self.graph.entrance, self.graph.exit
        );
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn maze_stats(&self) -> &MazeStats {
        &self.maze_stats
    }

    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    pub fn shared_graph(&self) -> Arc<MapGraph> {
        Arc::clone(&self.graph)
    }

    pub fn hierarchy(&self) -> &HierarchicalGraph {
        &self.hierarchy
    }

    pub fn entrance(&self) -> NodeId {
        self.graph.entrance
    }

    pub fn exit(&self) -> Option<NodeId> {
        self.graph.exit
    }

    pub fn quantize(&self, location: Location) -> Option<NodeId> {
        self.graph.quantize(location)
    }

    pub fn localize(&self, id: NodeId) -> Location {
        self.graph.localize(id)
    }

    pub fn path(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        self.hierarchy.path(start, end)
    }

    pub fn distance(&self, start: NodeId, end: NodeId) -> Option<usize> {
        self.hierarchy.distance(start, end)
    }

    pub fn route(&self, start: NodeId, end: NodeId) -> Option<Route> {
        self.hierarchy.route(start, end)
    }
}

fn build_layout(
    config: &LevelConfig,
    rng: &mut StdRng,
    entrance: Option<NodeId>,
    mode: MazeMode,
    with_exit: bool,
) -> Result<Layout> {
    let mut graph = MapGraph::new(config.cols, config.rows, config.tile_size, config.origin());
    let entrance = match entrance {
        Some(e) => e,
        None => random_border_node(&graph, rng),
    };
    graph.entrance = entrance;
    graph.exit = if with_exit { pick_exit(&graph, entrance, rng) } else { None };

    let maze_stats = maze::generate(&mut graph, mode, entrance, config.step_cost, rng).context("carving maze")?;
    maze::verify_connected(&graph, entrance)?;

    let graph = Arc::new(graph);
    let hierarchy =
        HierarchicalGraph::build(Arc::clone(&graph), config.cluster_size).context("preprocessing hierarchy")?;
    if let Some(exit) = graph.exit {
        if hierarchy.route(entrance, exit).is_none() {
            bail!("level: exit {:?} unreachable from entrance {:?} through the hierarchy", exit, entrance);
        }
    }
    Ok(Layout { graph, hierarchy, maze_stats })
}

pub fn random_border_node<R: Rng + ?Sized>(graph: &MapGraph, rng: &mut R) -> NodeId {
    let cols = graph.cols() as i32;
    let rows = graph.rows() as i32;
    let (i, j) = match rng.random_range(0..4) {
        0 => (rng.random_range(0..cols), 0),
        1 => (cols - 1, rng.random_range(0..rows)),
        2 => (rng.random_range(0..cols), rows - 1),
        _ => (0, rng.random_range(0..rows)),
    };
    NodeId(j as usize * graph.cols() + i as usize)
}

/// Border cell sharing neither row nor column with `entrance`. `None` when
/// the grid is a single row or column.
fn pick_exit<R: Rng + ?Sized>(graph: &MapGraph, entrance: NodeId, rng: &mut R) -> Option<NodeId> {
    let (cols, rows) = (graph.cols() as i32, graph.rows() as i32);
    if cols < 2 || rows < 2 {
        warn!("level: {}x{} grid has no room for an exit", cols, rows);
        return None;
    }
    let e = graph.get(entrance);
    for _ in 0..EXIT_ATTEMPTS {
        let candidate = random_border_node(graph, rng);
        let c = graph.get(candidate);
        if c.i != e.i && c.j != e.j {
            return Some(candidate);
        }
    }
    let i = if e.i < cols / 2 { cols - 1 } else { 0 };
    let j = if e.j < rows / 2 { rows - 1 } else { 0 };
    graph.get_at(i, j)
}

fn opposite_side(graph: &MapGraph, node: NodeId) -> Option<NodeId> {
    let n = graph.get(node);
    let (cols, rows) = (graph.cols() as i32, graph.rows() as i32);
    let (i, j) = if n.i == 0 {
        (cols - 1, n.j)
    } else if n.i == cols - 1 {
        (0, n.j)
    } else if n.j == 0 {
        (n.i, rows - 1)
    } else if n.j == rows - 1 {
        (n.i, 0)
    } else {
        return None;
    };
    graph.get_at(i, j)
}
