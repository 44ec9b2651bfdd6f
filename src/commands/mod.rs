use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{LevelConfig, LevelOverrides, ModeKind};
use crate::graph::MapGraph;
use crate::level::Level;
use crate::logging;
use crate::models::NodeId;

pub mod generate;
pub mod route;
pub mod survey;

#[derive(Args, Debug, Clone, Default)]
pub struct CommonOpts {
    /// JSON level config; flags and MAZE_* variables override it
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Grid width in cells (default: 14 or MAZE_COLS)
    #[arg(long = "cols")]
    pub cols: Option<usize>,
    /// Grid height in cells (default: 14 or MAZE_ROWS)
    #[arg(long = "rows")]
    pub rows: Option<usize>,
    /// World units per cell
    #[arg(long = "tile-size")]
    pub tile_size: Option<f32>,
    /// Cluster side length in cells
    #[arg(long = "cluster-size")]
    pub cluster_size: Option<usize>,
    /// Maze layout
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeKind>,
    /// Chance of opening a loop at each dead end (braided mode)
    #[arg(long = "loop-probability")]
    pub loop_probability: Option<f64>,
    /// RNG seed; drawn at random when absent
    #[arg(long = "seed")]
    pub seed: Option<u64>,
    /// Number of worker threads (rayon)
    #[arg(long = "threads")]
    pub threads: Option<usize>,
    /// Log level (trace|debug|info|warn|error)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl CommonOpts {
    fn overrides(&self) -> LevelOverrides {
        LevelOverrides {
            cols: self.cols,
            rows: self.rows,
            tile_size: self.tile_size,
            cluster_size: self.cluster_size,
            mode: self.mode,
            loop_probability: self.loop_probability,
            seed: self.seed,
            threads: self.threads,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum LevelCommand {
    /// Generate a level and print its layout as JSON
    Generate,
    /// Route between two cells, given as i,j (defaults: entrance to exit)
    Route {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Distance from the entrance to every ground cell, in parallel
    Survey,
}

pub fn cmd_level(common: CommonOpts, sub: LevelCommand) -> Result<()> {
    let cfg = merge_config(
        common.config.as_deref(),
        &common.overrides(),
        &LevelOverrides::from_env_defaults(),
    )?;

    logging::init(cfg.log_level.as_deref());
    if let Some(n) = cfg.threads {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    }

    let level = Level::generate(cfg)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match sub {
        LevelCommand::Generate => generate::cmd_generate(&level, &mut out),
        LevelCommand::Route { from, to } => route::cmd_route(&level, from.as_deref(), to.as_deref(), &mut out),
        LevelCommand::Survey => survey::cmd_survey(&level, &mut out),
    }
}

/// Defaults, then the config file, then CLI flags, then environment.
pub fn merge_config(file: Option<&Path>, cli: &LevelOverrides, env: &LevelOverrides) -> Result<LevelConfig> {
    let mut cfg = match file {
        Some(path) => LevelConfig::from_file(path)?,
        None => LevelConfig::default(),
    };
    cfg.apply(cli);
    cfg.apply(env);
    cfg.validate()?;
    Ok(cfg)
}

/// Grid cell as printed by every subcommand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellRef {
    pub id: usize,
    pub i: i32,
    pub j: i32,
}

impl CellRef {
    pub fn of(graph: &MapGraph, id: NodeId) -> Self {
        let (i, j) = graph.get(id).coords();
        Self { id: id.0, i, j }
    }
}

fn parse_cell_cli(s: &str) -> Option<(i32, i32)> {
    let (i, j) = s.split_once(',')?;
    Some((i.trim().parse::<i32>().ok()?, j.trim().parse::<i32>().ok()?))
}

/// Resolves an `i,j` argument against the grid.
pub fn resolve_cell(graph: &MapGraph, arg: &str) -> Result<NodeId> {
    let (i, j) = parse_cell_cli(arg).ok_or_else(|| anyhow!("expected a cell as i,j, got {:?}", arg))?;
    graph
        .get_at(i, j)
        .ok_or_else(|| anyhow!("cell ({},{}) lies outside the {}x{} grid", i, j, graph.cols(), graph.rows()))
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_cell_accepts_spaces() {
        assert_eq!(parse_cell_cli("3,4"), Some((3, 4)));
        assert_eq!(parse_cell_cli(" 3 , 4 "), Some((3, 4)));
        assert_eq!(parse_cell_cli("3;4"), None);
        assert_eq!(parse_cell_cli("x,4"), None);
    }

    #[test]
    fn resolve_cell_checks_bounds() {
        let g = MapGraph::new(4, 3, 1.0, Location::default());
        assert_eq!(resolve_cell(&g, "1,2").unwrap(), NodeId(9));
        assert!(resolve_cell(&g, "4,0").is_err());
        assert!(resolve_cell(&g, "-1,0").is_err());
        assert!(resolve_cell(&g, "nope").is_err());
    }

    #[test]
    fn merge_precedence_is_file_then_cli_then_env() -> Result<()> {
        let mut f = NamedTempFile::new()?;
        write!(f, r#"{{"cols": 30, "rows": 20, "cluster_size": 5, "seed": 1}}"#)?;
        let cli = LevelOverrides { rows: Some(25), seed: Some(2), ..LevelOverrides::default() };
        let env = LevelOverrides { seed: Some(3), ..LevelOverrides::default() };

        let cfg = merge_config(Some(f.path()), &cli, &env)?;
        assert_eq!(cfg.cols, 30);
        assert_eq!(cfg.rows, 25);
        assert_eq!(cfg.cluster_size, 5);
        assert_eq!(cfg.seed, Some(3));
        Ok(())
    }

    #[test]
    fn merge_validates_result() {
        let cli = LevelOverrides { loop_probability: Some(-0.5), ..LevelOverrides::default() };
        assert!(merge_config(None, &cli, &LevelOverrides::default()).is_err());
    }
}
