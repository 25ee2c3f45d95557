//! Chain initialization command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::Blockchain;
use powchain_consensus::CheckpointSet;
use powchain_core::Block;
use powchain_storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;

use super::keys;

#[derive(Args)]
pub struct InitArgs {
    /// Directory for the chain database
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Key file used to sign the genesis block
    #[arg(short, long)]
    key: PathBuf,
}

pub fn run(args: InitArgs) -> Result<()> {
    let keypair = keys::load_keypair(&args.key)?;
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("failed to open storage at {}", args.data_dir.display()))?;
    let chain = Blockchain::new(&storage, Arc::new(CheckpointSet::new()));

    let mut genesis = Block::genesis();
    genesis.commit_merkle_root();
    genesis.sign(&keypair).context("failed to sign genesis")?;

    let hash = chain.init_genesis(&genesis).context("failed to initialize chain")?;
    storage.flush()?;

    println!();
    println!("{}", "Chain initialized".bold().green());
    println!("  {} {}", "data dir:".bright_black(), args.data_dir.display());
    println!("  {} {}", "genesis hash:".bright_black(), hash.as_str().bright_yellow());
    println!();
    Ok(())
}
