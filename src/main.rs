use anyhow::Result;
use clap::Parser;
use maze_pathfinder::commands::{self, CommonOpts, LevelCommand};

#[derive(Parser, Debug)]
#[command(name = "maze_pathfinder", version, about = "Maze generation and hierarchical pathfinding")]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: LevelCommand,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::cmd_level(cli.common, cli.command)
}
