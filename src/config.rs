use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::maze::MazeMode;
use crate::models::Location;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Perfect,
    #[default]
    Braided,
    Empty,
}

/// Parameters for building one level. Defaults reproduce a 210x210 world
/// of 15-unit tiles centred on the origin with every dead end braided.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub cols: usize,
    pub rows: usize,
    pub tile_size: f32,
    pub origin_x: f32,
    pub origin_z: f32,
    // cluster side as a multiple of tile_size, i.e. in cells
    pub cluster_size: usize,
    pub step_cost: u32,
    pub mode: ModeKind,
    pub loop_probability: f64,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
    pub log_level: Option<String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            cols: 14,
            rows: 14,
            tile_size: 15.0,
            origin_x: -105.0,
            origin_z: -105.0,
            cluster_size: 3,
            step_cost: 1,
            mode: ModeKind::Braided,
            loop_probability: 1.0,
            seed: None,
            threads: None,
            log_level: None,
        }
    }
}

impl LevelConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading level config {}", path.display()))?;
        let cfg: LevelConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing level config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn apply(&mut self, o: &LevelOverrides) {
        if let Some(v) = o.cols { self.cols = v; }
        if let Some(v) = o.rows { self.rows = v; }
        if let Some(v) = o.tile_size { self.tile_size = v; }
        if let Some(v) = o.cluster_size { self.cluster_size = v; }
        if let Some(v) = o.mode { self.mode = v; }
        if let Some(v) = o.loop_probability { self.loop_probability = v; }
        if o.seed.is_some() { self.seed = o.seed; }
        if o.threads.is_some() { self.threads = o.threads; }
        if o.log_level.is_some() { self.log_level = o.log_level.clone(); }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            bail!("config: grid must have at least one row and column (got {}x{})", self.cols, self.rows);
        }
        if self.cluster_size == 0 {
            bail!("config: cluster_size must be at least 1");
        }
        if !(self.tile_size > 0.0 && self.tile_size.is_finite()) {
            bail!("config: tile_size must be positive (got {})", self.tile_size);
        }
        if self.step_cost == 0 {
            bail!("config: step_cost must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.loop_probability) {
            bail!("config: loop_probability must lie in [0, 1] (got {})", self.loop_probability);
        }
        if self.threads == Some(0) {
            bail!("config: threads must be at least 1");
        }
        Ok(())
    }

    pub fn maze_mode(&self) -> MazeMode {
        match self.mode {
            ModeKind::Perfect => MazeMode::Perfect,
            ModeKind::Braided => MazeMode::Braided { loop_probability: self.loop_probability },
            ModeKind::Empty => MazeMode::Empty,
        }
    }

    pub fn origin(&self) -> Location {
        Location::new(self.origin_x, self.origin_z)
    }

    /// World-space side length of one cluster.
    pub fn cluster_extent(&self) -> f32 {
        self.tile_size * self.cluster_size as f32
    }
}

/// Optional per-field overrides, filled from CLI flags or `MAZE_*`
/// environment variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelOverrides {
    pub cols: Option<usize>,
    pub rows: Option<usize>,
    pub tile_size: Option<f32>,
    pub cluster_size: Option<usize>,
    pub mode: Option<ModeKind>,
    pub loop_probability: Option<f64>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
    pub log_level: Option<String>,
}

impl LevelOverrides {
    pub fn from_env_defaults() -> Self {
        let cols = env::var("MAZE_COLS").ok().and_then(|s| s.trim().parse::<usize>().ok());
        let rows = env::var("MAZE_ROWS").ok().and_then(|s| s.trim().parse::<usize>().ok());
        let tile_size = env::var("MAZE_TILE_SIZE").ok().and_then(|s| s.trim().parse::<f32>().ok());
        let cluster_size = env::var("MAZE_CLUSTER_SIZE").ok().and_then(|s| s.trim().parse::<usize>().ok());
        let mode = env::var("MAZE_MODE").ok().and_then(|s| parse_mode(&s));
        let loop_probability = env::var("MAZE_LOOP_PROBABILITY").ok().and_then(|s| s.trim().parse::<f64>().ok());
        let seed = env::var("MAZE_SEED").ok().and_then(|s| s.trim().parse::<u64>().ok());
        let threads = env::var("MAZE_THREADS").ok().and_then(|s| s.trim().parse::<usize>().ok());
        let log_level = env::var("MAZE_LOG_LEVEL").ok();
        Self { cols, rows, tile_size, cluster_size, mode, loop_probability, seed, threads, log_level }
    }
}

fn parse_mode(input: &str) -> Option<ModeKind> {
    match input.trim().to_ascii_lowercase().as_str() {
        "perfect" | "dfs" => Some(ModeKind::Perfect),
        "braided" | "braid" => Some(ModeKind::Braided),
        "empty" | "room" => Some(ModeKind::Empty),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Perfect"), Some(ModeKind::Perfect));
        assert_eq!(parse_mode(" braided "), Some(ModeKind::Braided));
        assert_eq!(parse_mode("room"), Some(ModeKind::Empty));
        assert_eq!(parse_mode("spiral"), None);
    }

    #[test]
    fn test_defaults_validate() {
        let cfg = LevelConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.maze_mode(), MazeMode::Braided { loop_probability: 1.0 });
        assert_eq!(cfg.origin(), Location::new(-105.0, -105.0));
        assert_eq!(cfg.cluster_extent(), 45.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            LevelConfig { cols: 0, ..LevelConfig::default() },
            LevelConfig { cluster_size: 0, ..LevelConfig::default() },
            LevelConfig { tile_size: -1.0, ..LevelConfig::default() },
            LevelConfig { step_cost: 0, ..LevelConfig::default() },
            LevelConfig { loop_probability: 1.2, ..LevelConfig::default() },
            LevelConfig { threads: Some(0), ..LevelConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{:?} should be rejected", cfg);
        }
    }

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut cfg = LevelConfig::default();
        cfg.apply(&LevelOverrides { rows: Some(20), seed: Some(9), ..LevelOverrides::default() });
        assert_eq!(cfg.rows, 20);
        assert_eq!(cfg.cols, 14);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.mode, ModeKind::Braided);
    }

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() -> Result<()> {
        let mut f = NamedTempFile::new()?;
        write!(f, r#"{{"cols": 30, "rows": 24, "mode": "perfect", "seed": 42}}"#)?;
        let cfg = LevelConfig::from_file(f.path())?;
        assert_eq!(cfg.cols, 30);
        assert_eq!(cfg.rows, 24);
        assert_eq!(cfg.mode, ModeKind::Perfect);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.cluster_size, 3);
        Ok(())
    }

    #[test]
    fn test_from_file_reports_bad_json() -> Result<()> {
        let mut f = NamedTempFile::new()?;
        write!(f, "not json")?;
        let err = LevelConfig::from_file(f.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing level config"));
        Ok(())
    }

    #[test]
    fn test_from_env_defaults_reads_values() {
        std::env::set_var("MAZE_COLS", "40");
        std::env::set_var("MAZE_ROWS", "32");
        std::env::set_var("MAZE_TILE_SIZE", "2.5");
        std::env::set_var("MAZE_CLUSTER_SIZE", "8");
        std::env::set_var("MAZE_MODE", "empty");
        std::env::set_var("MAZE_LOOP_PROBABILITY", "0.25");
        std::env::set_var("MAZE_SEED", "1234");
        std::env::set_var("MAZE_THREADS", "4");
        std::env::set_var("MAZE_LOG_LEVEL", "debug");

        let o = LevelOverrides::from_env_defaults();
        assert_eq!(o.cols, Some(40));
        assert_eq!(o.rows, Some(32));
        assert_eq!(o.tile_size, Some(2.5));
        assert_eq!(o.cluster_size, Some(8));
        assert_eq!(o.mode, Some(ModeKind::Empty));
        assert_eq!(o.loop_probability, Some(0.25));
        assert_eq!(o.seed, Some(1234));
        assert_eq!(o.threads, Some(4));
        assert_eq!(o.log_level.as_deref(), Some("debug"));

        // cleanup
        for key in [
            "MAZE_COLS",
            "MAZE_ROWS",
            "MAZE_TILE_SIZE",
            "MAZE_CLUSTER_SIZE",
            "MAZE_MODE",
            "MAZE_LOOP_PROBABILITY",
            "MAZE_SEED",
            "MAZE_THREADS",
            "MAZE_LOG_LEVEL",
        ] {
            std::env::remove_var(key);
        }
    }
}
