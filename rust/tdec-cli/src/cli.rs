//! Command-line surface: intentionally minimal (CLI ergonomics beyond a
//! thin wrapper around the library crates are out of scope). Each noun
//! groups the verbs that make sense against it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tdec_chain::{Address, BlockTag, ChainRpc, ReqwestChainRpc};
use tdec_config::load_config;

use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "tdec")]
#[command(about = "Threshold decryption client toolkit")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (defaults to ~/.config/tdec/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Chain RPC queries
    #[command(subcommand)]
    Chain(ChainCommand),
    /// Pending-transaction tracker state inspection
    #[command(subcommand)]
    Tracker(TrackerCommand),
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration (file + env overrides applied) as TOML
    Show,
}

#[derive(Subcommand)]
pub enum ChainCommand {
    /// Query the connected chain's id
    ChainId {
        /// Overrides the configured RPC endpoint
        #[arg(long)]
        rpc_url: Option<String>,
    },
    /// Query an account's transaction count (nonce)
    Nonce {
        address: String,
        #[arg(long)]
        rpc_url: Option<String>,
        /// Count pending transactions too, not just mined ones
        #[arg(long)]
        pending: bool,
    },
}

#[derive(Subcommand)]
pub enum TrackerCommand {
    /// Print the nonce -> tx-hash map persisted by a running tracker
    Status {
        /// Path to the tracker's persisted state file
        state_file: PathBuf,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config(ConfigCommand::Show) => {
            let config = load_config(cli.config)?;
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| CliError::InvalidArgument(format!("failed to render config: {e}")))?;
            println!("{rendered}");
            Ok(())
        }
        Commands::Chain(ChainCommand::ChainId { rpc_url }) => {
            let rpc = resolve_chain_rpc(cli.config, rpc_url)?;
            let id = rpc.chain_id().await?;
            println!("{id}");
            Ok(())
        }
        Commands::Chain(ChainCommand::Nonce { address, rpc_url, pending }) => {
            let rpc = resolve_chain_rpc(cli.config, rpc_url)?;
            let tag = if pending { BlockTag::Pending } else { BlockTag::Latest };
            let nonce = rpc.get_transaction_count(&Address(address), tag).await?;
            println!("{nonce}");
            Ok(())
        }
        Commands::Tracker(TrackerCommand::Status { state_file }) => {
            let entries = tdec_tracker::read_state_file(&state_file);
            if entries.is_empty() {
                println!("no pending transactions tracked");
            }
            let mut nonces: Vec<_> = entries.into_iter().collect();
            nonces.sort_by_key(|(nonce, _)| *nonce);
            for (nonce, tx_hash) in nonces {
                println!("{nonce}\t{tx_hash}");
            }
            Ok(())
        }
    }
}

fn resolve_chain_rpc(config_path: Option<PathBuf>, rpc_url: Option<String>) -> Result<ReqwestChainRpc> {
    let url = match rpc_url {
        Some(url) => url,
        None => load_config(config_path)?.chain.rpc_url,
    };
    Ok(ReqwestChainRpc::new(url))
}
