//! Block operations command.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use powchain_chain::Blockchain;
use powchain_consensus::{CheckpointSet, CheckpointVerifier};
use powchain_core::{Block, CancelToken, Hash, Transaction};
use powchain_storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::keys;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// Assemble, sign, mine, and append a block
    Build {
        /// Directory for the chain database
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Key file used to sign the block
        #[arg(short, long)]
        key: PathBuf,

        /// Transaction payloads, in order (repeatable)
        #[arg(short, long = "tx")]
        transactions: Vec<String>,

        /// Leading-zero difficulty target
        #[arg(long, default_value = "2")]
        difficulty: u32,

        /// Give up mining after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Also write the block record to a JSON file
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Checkpoint table (JSON) to verify against
        #[arg(long)]
        checkpoints: Option<PathBuf>,
    },
    /// Verify a block file
    Verify {
        /// Block record file (JSON)
        file: PathBuf,

        /// Key file holding the signer's public key
        #[arg(short, long)]
        key: PathBuf,

        /// Checkpoint table (JSON) to verify against
        #[arg(long)]
        checkpoints: Option<PathBuf>,
    },
    /// List recent blocks
    List {
        /// Directory for the chain database
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: u64,
    },
    /// Show detailed block information
    Info {
        /// Directory for the chain database
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Block height or hash
        block_id: String,
    },
}

pub fn run(args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::Build {
            data_dir,
            key,
            transactions,
            difficulty,
            timeout,
            out,
            checkpoints,
        } => build_block(
            data_dir,
            key,
            transactions,
            difficulty,
            timeout,
            out,
            checkpoints,
        ),
        BlockCommand::Verify {
            file,
            key,
            checkpoints,
        } => verify_block(file, key, checkpoints),
        BlockCommand::List { data_dir, count } => list_blocks(data_dir, count),
        BlockCommand::Info { data_dir, block_id } => show_block_info(data_dir, block_id),
    }
}

fn load_checkpoints(path: Option<PathBuf>) -> Result<Arc<CheckpointSet>> {
    match path {
        Some(path) => Ok(Arc::new(
            CheckpointSet::load(&path).context("failed to load checkpoint table")?,
        )),
        None => Ok(Arc::new(CheckpointSet::new())),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_block(
    data_dir: PathBuf,
    key: PathBuf,
    transactions: Vec<String>,
    difficulty: u32,
    timeout: Option<u64>,
    out: Option<PathBuf>,
    checkpoints: Option<PathBuf>,
) -> Result<()> {
    let keypair = keys::load_keypair(&key)?;
    let storage = Storage::open(&data_dir)
        .with_context(|| "failed to open storage, did you run 'powchain init'?")?;
    let chain = Blockchain::new(&storage, load_checkpoints(checkpoints)?);

    let head = chain.latest_block().context("chain is not initialized")?;
    let head_height = chain.height()?;

    let mut block = Block::new(head.calculate_hash());
    for payload in transactions {
        block
            .add_transaction(Transaction::from(payload.as_str()))
            .context("too many transactions for one block")?;
    }
    block.commit_merkle_root();
    block.sign(&keypair).context("failed to sign block")?;

    let token = match timeout {
        Some(secs) => CancelToken::with_deadline(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    println!("mining at difficulty {}...", difficulty);
    let mined = block
        .mine(difficulty, &token)
        .context("mining did not finish")?;

    block.set_height(head_height + 1);
    chain
        .add_block(&block, &keypair.public_key)
        .context("chain rejected the block")?;
    storage.flush()?;

    if let Some(path) = &out {
        block
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!();
    println!("{}", "Block appended".bold().green());
    println!("  {} {}", "height:".bright_black(), block.height());
    println!("  {} {}", "hash:".bright_black(), mined.as_str().bright_yellow());
    println!("  {} {}", "nonce:".bright_black(), block.nonce());
    println!("  {} {}", "transactions:".bright_black(), block.tx_count());
    if let Some(path) = out {
        println!("  {} {}", "saved to:".bright_black(), path.display());
    }
    println!();
    Ok(())
}

fn verify_block(file: PathBuf, key: PathBuf, checkpoints: Option<PathBuf>) -> Result<()> {
    let public_key = keys::load_public_key(&key)?;
    let block =
        Block::load(&file).with_context(|| format!("failed to load {}", file.display()))?;
    let verifier = CheckpointVerifier::new(load_checkpoints(checkpoints)?);

    let structurally_valid = block.is_valid();
    let verified = verifier.verify_block(&block, &public_key);

    println!();
    println!("  {} {}", "hash:".bright_black(), block.calculate_hash());
    println!(
        "  {} {}",
        "structure:".bright_black(),
        if structurally_valid {
            "ok".green()
        } else {
            "invalid".red()
        }
    );
    println!(
        "  {} {}",
        "verification:".bright_black(),
        if verified { "ok".green() } else { "failed".red() }
    );
    println!();

    if !(structurally_valid && verified) {
        bail!("block verification failed");
    }
    Ok(())
}

fn list_blocks(data_dir: PathBuf, count: u64) -> Result<()> {
    let storage = Storage::open(&data_dir)
        .with_context(|| "failed to open storage, did you run 'powchain init'?")?;
    let chain = Blockchain::new(&storage, Arc::new(CheckpointSet::new()));

    let head_height = chain.height()?;
    let from_height = head_height.saturating_sub(count.saturating_sub(1));
    let mut blocks = chain.blocks_in_range(from_height, head_height)?;
    blocks.reverse();

    println!();
    println!("{}", "Recent blocks:".bold().cyan());
    println!();
    for block in blocks {
        let hash = block.calculate_hash();
        println!(
            "  {} {} {}",
            format!("#{}", block.height()).bright_black(),
            &hash.as_str()[..16.min(hash.as_str().len())].bright_yellow(),
            format!("({} txs)", block.tx_count()).bright_black()
        );
    }
    println!();
    Ok(())
}

fn show_block_info(data_dir: PathBuf, block_id: String) -> Result<()> {
    let storage = Storage::open(&data_dir)
        .with_context(|| "failed to open storage, did you run 'powchain init'?")?;
    let chain = Blockchain::new(&storage, Arc::new(CheckpointSet::new()));

    let block = if let Ok(height) = block_id.parse::<u64>() {
        chain.get_block_by_height(height)?
    } else {
        chain.get_block(&Hash::from_hex(block_id.as_str()))?
    }
    .context("block not found")?;

    println!();
    println!("{}", format!("Block #{}", block.height()).bold().cyan());
    println!("  {} {}", "hash:".bright_black(), block.calculate_hash());
    println!("  {} {}", "previous:".bright_black(), block.previous_hash());
    println!("  {} {}", "merkle root:".bright_black(), block.merkle_root());
    println!("  {} {}", "timestamp:".bright_black(), block.timestamp());
    println!("  {} {}", "nonce:".bright_black(), block.nonce());
    println!("  {} {}", "difficulty:".bright_black(), block.difficulty());
    println!("  {} {}", "transactions:".bright_black(), block.tx_count());
    for tx in block.transactions() {
        println!("    {}", tx.as_str().bright_black());
    }
    println!();
    Ok(())
}
