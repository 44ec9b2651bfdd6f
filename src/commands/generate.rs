use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use super::{write_json, CellRef};
use crate::hpa::PreprocessStats;
use crate::level::Level;
use crate::maze::{MazeMode, MazeStats};

#[derive(Debug, Serialize)]
pub struct LevelSummary<'a> {
    pub level: usize,
    pub seed: u64,
    pub cols: usize,
    pub rows: usize,
    pub tile_size: f32,
    pub cluster_size: usize,
    pub cluster_extent: f32,
    pub mode: MazeMode,
    pub entrance: CellRef,
    pub exit: Option<CellRef>,
    pub maze: &'a MazeStats,
    pub hierarchy: &'a PreprocessStats,
    /// Undirected passages, each listed once with the lower id first.
    pub passages: Vec<[usize; 2]>,
}

pub fn summarize(level: &Level) -> LevelSummary<'_> {
    let graph = level.graph();
    let passages = graph
        .nodes()
        .iter()
        .flat_map(|n| n.edges().iter().filter(move |e| n.id < e.to).map(move |e| [n.id.0, e.to.0]))
        .collect();
    LevelSummary {
        level: level.number(),
        seed: level.seed(),
        cols: graph.cols(),
        rows: graph.rows(),
        tile_size: graph.tile_size(),
        cluster_size: level.config().cluster_size,
        cluster_extent: level.config().cluster_extent(),
        mode: level.config().maze_mode(),
        entrance: CellRef::of(graph, level.entrance()),
        exit: level.exit().map(|e| CellRef::of(graph, e)),
        maze: level.maze_stats(),
        hierarchy: level.hierarchy().stats(),
        passages,
    }
}

pub fn cmd_generate<W: Write>(level: &Level, out: &mut W) -> Result<()> {
    write_json(out, &summarize(level))
}
