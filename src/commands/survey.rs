use anyhow::Result;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;

use super::{write_json, CellRef};
use crate::level::Level;
use crate::models::NodeId;

#[derive(Debug, Serialize)]
pub struct SurveyReport {
    pub level: usize,
    pub entrance: CellRef,
    pub ground_nodes: usize,
    pub reachable: usize,
    pub unreachable: usize,
    pub max_distance: usize,
    pub farthest: Option<CellRef>,
    pub exit_distance: Option<usize>,
}

/// Queries the hierarchy from the entrance to every ground cell. Queries run
/// on the rayon pool and share the hierarchy read-only.
pub fn survey(level: &Level) -> SurveyReport {
    let graph = level.graph();
    let hierarchy = level.hierarchy();
    let entrance = level.entrance();

    let targets: Vec<NodeId> = graph.ground_nodes().map(|n| n.id).collect();
    let distances: Vec<(NodeId, Option<usize>)> = targets
        .par_iter()
        .map(|&n| (n, hierarchy.distance(entrance, n)))
        .collect();

    let reachable = distances.iter().filter(|(_, d)| d.is_some()).count();
    let farthest = distances
        .iter()
        .filter_map(|&(n, d)| d.map(|d| (n, d)))
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));
    let exit_distance = level
        .exit()
        .and_then(|x| distances.iter().find(|(n, _)| *n == x).and_then(|(_, d)| *d));

    let report = SurveyReport {
        level: level.number(),
        entrance: CellRef::of(graph, entrance),
        ground_nodes: distances.len(),
        reachable,
        unreachable: distances.len() - reachable,
        max_distance: farthest.map(|(_, d)| d).unwrap_or(0),
        farthest: farthest.map(|(n, _)| CellRef::of(graph, n)),
        exit_distance,
    };
    if report.unreachable > 0 {
        warn!(
            "survey: {} of {} ground cells unreachable through the hierarchy",
            report.unreachable, report.ground_nodes
        );
    }
    info!(
        "survey: reachable={} max_distance={}",
        report.reachable, report.max_distance
    );
    report
}

pub fn cmd_survey<W: Write>(level: &Level, out: &mut W) -> Result<()> {
    write_json(out, &survey(level))
}
