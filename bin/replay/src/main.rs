//! Standalone replay harness.
//!
//! Loads a recorded tape snapshot, runs one replay over it with a stub
//! execution backend, and prints the committed block hash and send root.
//! Any fatal replay condition surfaces as a nonzero exit.

mod backend;
mod tape;

use crate::{backend::HarnessExecution, tape::TapeFile};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vela_genesis::{chain_config_by_id, ChainConfig};
use vela_proof::{ReplayDriver, SystemState};

/// The replay harness CLI.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the recorded tape snapshot (JSON).
    tape: PathBuf,

    /// Path to the chain config served out of system state; defaults to
    /// the compiled-in config for `--chain-id`.
    #[arg(long)]
    chain_config: Option<PathBuf>,

    /// Chain id reported by system state.
    #[arg(long, default_value_t = 42161)]
    chain_id: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let raw = fs::read(&cli.tape)
        .with_context(|| format!("failed to read tape {}", cli.tape.display()))?;
    let tape: TapeFile = serde_json::from_slice(&raw).context("failed to parse tape")?;
    let oracle = Arc::new(tape.into_oracle());

    let system = system_state(&cli)?;
    let mut driver = ReplayDriver::new(oracle, HarnessExecution::new(system));
    let outcome = vela_proof::block_on(driver.run()).context("replay failed")?;

    info!(block_hash = %outcome.block_hash, send_root = %outcome.send_root, "replay complete");
    println!("block_hash: {}", outcome.block_hash);
    println!("send_root:  {}", outcome.send_root);
    Ok(())
}

/// Assembles the system state the stub backend reports: either the chain
/// config file verbatim, or an empty config that sends the driver to the
/// compiled-in table.
fn system_state(cli: &Cli) -> Result<SystemState> {
    match &cli.chain_config {
        Some(path) => {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read chain config {}", path.display()))?;
            let config: ChainConfig =
                serde_json::from_slice(&raw).context("failed to parse chain config")?;
            Ok(SystemState {
                chain_id: config.chain_id,
                genesis_block_num: config.arbitrum.genesis_block_num,
                chain_config_json: raw,
            })
        }
        None => {
            if chain_config_by_id(cli.chain_id).is_none() {
                bail!("no compiled-in chain config for chain id {}", cli.chain_id);
            }
            Ok(SystemState {
                chain_id: cli.chain_id,
                genesis_block_num: 0,
                chain_config_json: Vec::new(),
            })
        }
    }
}
