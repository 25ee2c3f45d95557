//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod block;
mod init;
mod keys;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a signing keypair
    Keygen(keys::KeygenArgs),
    /// Initialize a new chain with a genesis block
    Init(init::InitArgs),
    /// Block operations
    Block(block::BlockArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Keygen(args) => keys::run(args),
        Commands::Init(args) => init::run(args),
        Commands::Block(args) => block::run(args),
    }
}
