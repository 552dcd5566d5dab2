use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "postgate")]
#[command(about = "Human approval gate for agent-drafted social posts")]
pub struct Args {
    /// Workspace directory (defaults to the current directory)
    #[arg(long, short = 'w', global = true)]
    pub workspace: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: crate::Command,
}
