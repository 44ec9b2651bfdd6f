use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use maze_pathfinder::commands::{self, generate, survey};
use maze_pathfinder::config::{LevelConfig, LevelOverrides, ModeKind};
use maze_pathfinder::level::Level;
use maze_pathfinder::logging;

fn config_file(body: &str) -> Result<NamedTempFile> {
    let mut f = NamedTempFile::new()?;
    f.write_all(body.as_bytes())?;
    Ok(f)
}

#[test]
fn config_file_drives_generation() -> Result<()> {
    logging::init_for_tests();
    let f = config_file(r#"{"cols": 12, "rows": 9, "cluster_size": 4, "mode": "perfect", "seed": 404}"#)?;
    let cfg = commands::merge_config(Some(f.path()), &LevelOverrides::default(), &LevelOverrides::default())?;
    let level = Level::generate(cfg)?;

    assert_eq!(level.graph().cols(), 12);
    assert_eq!(level.graph().rows(), 9);
    assert_eq!(level.graph().undirected_edge_count(), 12 * 9 - 1);
    // 3 columns x 3 rows of clusters, the last row 1 cell tall.
    assert_eq!(level.hierarchy().clusters().len(), 9);
    assert_eq!(level.seed(), 404);
    Ok(())
}

#[test]
fn default_levels_reach_every_cell() -> Result<()> {
    for seed in 0..20 {
        let mut level = Level::generate(LevelConfig { seed: Some(seed), ..LevelConfig::default() })?;
        for _ in 0..2 {
            let entrance = level.entrance();
            let unreached: Vec<_> = level
                .graph()
                .ground_nodes()
                .filter(|n| n.id != entrance && level.path(entrance, n.id).is_empty())
                .map(|n| n.id)
                .collect();
            assert!(unreached.is_empty(), "seed {} level {}: unreached {:?}", seed, level.number(), unreached);
            let exit = level.exit().expect("default grid has an exit");
            assert!(level.distance(entrance, exit).is_some());
            level.regenerate()?;
        }
    }
    Ok(())
}

#[test]
fn level_sequence_stays_consistent() -> Result<()> {
    logging::init_for_tests();
    let cfg = LevelConfig { cols: 10, rows: 10, mode: ModeKind::Braided, seed: Some(6), ..LevelConfig::default() };
    let mut level = Level::generate(cfg)?;
    for round in 0..4 {
        if round == 2 {
            level.boss_room()?;
            assert!(level.exit().is_none());
        } else {
            level.regenerate()?;
            assert!(level.exit().is_some());
        }
        let g = level.graph();
        assert_eq!(g.reachable_from(level.entrance()).len(), g.len());
        maze_pathfinder::hpa::executor::validate(level.hierarchy())?;
    }
    assert_eq!(level.number(), 5);
    Ok(())
}

#[test]
fn hierarchy_shares_the_level_graph() -> Result<()> {
    let level = Level::generate(LevelConfig { seed: Some(12), ..LevelConfig::default() })?;
    let shared = level.shared_graph();
    assert!(std::ptr::eq(&*shared, level.hierarchy().graph()));
    assert!(std::ptr::eq(level.graph(), level.hierarchy().graph()));
    Ok(())
}

#[test]
fn generate_and_survey_agree_on_size() -> Result<()> {
    let cfg = LevelConfig { cols: 8, rows: 8, mode: ModeKind::Empty, seed: Some(2), ..LevelConfig::default() };
    let level = Level::generate(cfg)?;

    let summary = generate::summarize(&level);
    assert_eq!(summary.passages.len(), 2 * 8 * 8 - 16);

    let report = survey::survey(&level);
    assert_eq!(report.ground_nodes, 64);
    assert_eq!(report.reachable, 64);
    assert!(report.exit_distance.is_some());
    Ok(())
}

#[test]
fn same_seed_same_sequence() -> Result<()> {
    let cfg = LevelConfig { cols: 9, rows: 7, seed: Some(31), ..LevelConfig::default() };
    let mut a = Level::generate(cfg.clone())?;
    let mut b = Level::generate(cfg)?;
    a.regenerate()?;
    b.regenerate()?;
    assert_eq!(a.entrance(), b.entrance());
    assert_eq!(a.exit(), b.exit());
    assert_eq!(a.graph().undirected_edge_count(), b.graph().undirected_edge_count());
    Ok(())
}
