//! Keypair generation and key file handling.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk keypair format (hex-encoded keys).
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    pub private_key: String,
    pub public_key: String,
}

/// Load a keypair from a key file.
pub fn load_keypair(path: &Path) -> Result<Keypair> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    let file: KeyFile = serde_json::from_str(&json)
        .with_context(|| format!("malformed key file {}", path.display()))?;
    Keypair::from_private_key_hex(&file.private_key)
        .with_context(|| format!("invalid private key in {}", path.display()))
}

/// Load just the public key from a key file.
pub fn load_public_key(path: &Path) -> Result<PublicKey> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    let file: KeyFile = serde_json::from_str(&json)
        .with_context(|| format!("malformed key file {}", path.display()))?;
    PublicKey::from_hex(&file.public_key)
        .with_context(|| format!("invalid public key in {}", path.display()))
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Where to write the key file
    #[arg(short, long, default_value = "key.json")]
    out: PathBuf,
}

pub fn run(args: KeygenArgs) -> Result<()> {
    let keypair = Keypair::generate();
    let file = KeyFile {
        private_key: keypair.private_key_hex(),
        public_key: keypair.public_key.to_hex(),
    };

    let json = serde_json::to_string_pretty(&file)?;
    fs::write(&args.out, json)
        .with_context(|| format!("failed to write key file {}", args.out.display()))?;

    println!();
    println!("{}", "Keypair generated".bold().green());
    println!("  {} {}", "file:".bright_black(), args.out.display());
    println!(
        "  {} {}",
        "public key:".bright_black(),
        file.public_key.bright_yellow()
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");

        let keypair = Keypair::generate();
        let file = KeyFile {
            private_key: keypair.private_key_hex(),
            public_key: keypair.public_key.to_hex(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

        let loaded = load_keypair(&path).unwrap();
        assert_eq!(loaded.public_key, keypair.public_key);
        assert_eq!(load_public_key(&path).unwrap(), keypair.public_key);
    }

    #[test]
    fn missing_key_file_names_the_path() {
        let err = load_keypair(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/key.json"));
    }
}
