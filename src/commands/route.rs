use anyhow::{anyhow, Result};
use log::info;
use serde::Serialize;
use std::io::Write;

use super::{resolve_cell, write_json, CellRef};
use crate::level::Level;

#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub from: CellRef,
    pub to: CellRef,
    pub reachable: bool,
    pub steps: Option<usize>,
    pub cost: Option<i64>,
    /// Cells after `from`, ending with `to`.
    pub path: Vec<CellRef>,
}

pub fn cmd_route<W: Write>(level: &Level, from: Option<&str>, to: Option<&str>, out: &mut W) -> Result<()> {
    let graph = level.graph();
    let start = match from {
        Some(arg) => resolve_cell(graph, arg)?,
        None => level.entrance(),
    };
    let goal = match to {
        Some(arg) => resolve_cell(graph, arg)?,
        None => level
            .exit()
            .ok_or_else(|| anyhow!("level has no exit; pass --to i,j"))?,
    };

    let route = level.route(start, goal);
    info!(
        "route: {:?} -> {:?} {}",
        start,
        goal,
        match &route {
            Some(r) => format!("in {} steps", r.nodes.len()),
            None => "unreachable".to_string(),
        }
    );
    let report = RouteReport {
        from: CellRef::of(graph, start),
        to: CellRef::of(graph, goal),
        reachable: route.is_some(),
        steps: route.as_ref().map(|r| r.nodes.len()),
        cost: route.as_ref().map(|r| r.cost),
        path: route
            .map(|r| r.nodes.iter().map(|&n| CellRef::of(graph, n)).collect())
            .unwrap_or_default(),
    };
    write_json(out, &report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LevelConfig, ModeKind};

    #[test]
    fn entrance_to_exit_by_default() -> Result<()> {
        let cfg = LevelConfig {
            cols: 6,
            rows: 6,
            cluster_size: 6,
            mode: ModeKind::Empty,
            seed: Some(9),
            ..LevelConfig::default()
        };
        let level = Level::generate(cfg)?;
        let mut buf = Vec::new();
        cmd_route(&level, None, None, &mut buf)?;
        let v: serde_json::Value = serde_json::from_slice(&buf)?;
        let exit = level.exit().unwrap();
        assert_eq!(v["reachable"], true);
        assert_eq!(v["to"]["id"], exit.0);
        let manhattan = level.graph().manhattan(level.entrance(), exit);
        assert_eq!(v["steps"], manhattan);
        assert_eq!(v["path"].as_array().unwrap().len() as i64, manhattan);
        Ok(())
    }

    #[test]
    fn explicit_cells() -> Result<()> {
        let cfg = LevelConfig {
            cols: 6,
            rows: 6,
            cluster_size: 6,
            mode: ModeKind::Empty,
            seed: Some(9),
            ..LevelConfig::default()
        };
        let level = Level::generate(cfg)?;
        let mut buf = Vec::new();
        cmd_route(&level, Some("0,0"), Some("2,1"), &mut buf)?;
        let v: serde_json::Value = serde_json::from_slice(&buf)?;
        assert_eq!(v["steps"], 3);
        assert_eq!(v["cost"], 3);
        assert_eq!(v["path"][2]["i"], 2);
        assert_eq!(v["path"][2]["j"], 1);
        Ok(())
    }

    #[test]
    fn bad_cell_is_an_error() -> Result<()> {
        let cfg = LevelConfig { cols: 4, rows: 4, seed: Some(1), ..LevelConfig::default() };
        let level = Level::generate(cfg)?;
        let mut buf = Vec::new();
        assert!(cmd_route(&level, Some("9,9"), None, &mut buf).is_err());
        assert!(buf.is_empty());
        Ok(())
    }
}
