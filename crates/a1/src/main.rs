// A1 - autonomous single-transaction EVM exploit agent
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! A1: autonomous PoC generator
//!
//! Drives an LLM-backed agent through tool calls and forked-EVM executions to construct a
//! single-transaction exploit against a target smart contract.

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use eyre::Result;

mod cmd;
mod context;

/// Command-line interface for A1
#[derive(Debug, Parser)]
#[command(name = "a1")]
#[command(about = "A1: autonomous PoC generator for single-transaction EVM exploits")]
#[command(version)]
struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the agent on a target contract
    Run {
        /// Target contract address
        target: String,
        /// Chain ID (1=Ethereum, 56=BSC)
        #[arg(long, short = 'c', default_value_t = 1)]
        chain: u64,
        /// Block number to fork from
        #[arg(long, short = 'b')]
        block: Option<u64>,
        /// LLM model name (recorded in the run log; no concrete provider is wired up)
        #[arg(long, short = 'm', default_value = "null")]
        model: String,
        /// Maximum turns
        #[arg(long, short = 't', default_value_t = 5)]
        max_turns: u32,
        /// Output file for results
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Custom RPC URL
        #[arg(long)]
        rpc: Option<String>,
        /// Path to a `forge-std` checkout, seeded into every fork workspace
        #[arg(long, env = "FORGE_STD_PATH")]
        forge_std: Option<PathBuf>,
    },
    /// Fetch verified source code for a contract
    FetchSource {
        /// Contract address
        address: Address,
        /// Chain ID
        #[arg(long, short = 'c', default_value_t = 1)]
        chain: u64,
        /// Output directory
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Read state from a contract
    ReadState {
        /// Contract address
        address: Address,
        /// Chain ID
        #[arg(long, short = 'c', default_value_t = 1)]
        chain: u64,
        /// Query to run: code|balance
        #[arg(long, short = 'f', default_value = "code")]
        function: String,
        /// Block number
        #[arg(long, short = 'b')]
        block: Option<u64>,
        /// Custom RPC URL
        #[arg(long)]
        rpc: Option<String>,
    },
    /// Detect proxy patterns for a contract
    ResolveProxy {
        /// Contract address
        address: Address,
        /// Chain ID
        #[arg(long, short = 'c', default_value_t = 1)]
        chain: u64,
        /// Block number
        #[arg(long, short = 'b')]
        block: Option<u64>,
        /// Recurse into nested proxies
        #[arg(long, default_value_t = true)]
        nested: bool,
        /// Custom RPC URL
        #[arg(long)]
        rpc: Option<String>,
    },
    /// Decode a contract's constructor arguments
    ExtractConstructor {
        /// Contract address
        address: Address,
        /// Chain ID
        #[arg(long, short = 'c', default_value_t = 1)]
        chain: u64,
        /// Block number
        #[arg(long, short = 'b')]
        block: Option<u64>,
        /// Custom RPC URL
        #[arg(long)]
        rpc: Option<String>,
    },
    /// Parse and sanitize a Solidity source file
    AnalyzeCode {
        /// Source file to analyze
        file: PathBuf,
        /// Extract the minimal dependency closure of this entity instead of sanitizing
        #[arg(long)]
        extract: Option<String>,
    },
    /// Run a single named experiment, recorded to an explicit run log directory
    Experiment {
        /// Target contract address
        target: String,
        /// Chain ID
        #[arg(long, short = 'c', default_value_t = 1)]
        chain: u64,
        /// Block number to fork from
        #[arg(long, short = 'b')]
        block: Option<u64>,
        /// LLM model name
        #[arg(long, short = 'm', default_value = "null")]
        model: String,
        /// Maximum turns
        #[arg(long, short = 't', default_value_t = 5)]
        max_turns: u32,
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
        /// Custom RPC URL
        #[arg(long)]
        rpc: Option<String>,
        /// Path to a `forge-std` checkout
        #[arg(long, env = "FORGE_STD_PATH")]
        forge_std: Option<PathBuf>,
    },
    /// Run many targets concurrently from a JSON targets file
    Batch {
        /// JSON file: `[{"address": "0x..", "chain_id": 1, "block_number": 123}, ...]`
        targets_file: PathBuf,
        /// Number of concurrent runs
        #[arg(long, default_value_t = 1)]
        parallelism: usize,
        /// LLM model name
        #[arg(long, short = 'm', default_value = "null")]
        model: String,
        /// Maximum turns per target
        #[arg(long, short = 't', default_value_t = 5)]
        max_turns: u32,
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
        /// Custom RPC URL (applies to every target)
        #[arg(long)]
        rpc: Option<String>,
        /// Path to a `forge-std` checkout
        #[arg(long, env = "FORGE_STD_PATH")]
        forge_std: Option<PathBuf>,
    },
    /// Show aggregate statistics over a run log
    Metrics {
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
    },
    /// Inspect or move a run log
    Results {
        #[command(subcommand)]
        action: ResultsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ResultsCommand {
    /// List runs
    List {
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
        /// Filter by target
        #[arg(long)]
        target: Option<String>,
        /// Filter by model
        #[arg(long)]
        model: Option<String>,
        /// Filter by success
        #[arg(long)]
        success: Option<bool>,
        /// Max results
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show aggregate statistics
    Stats {
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
    },
    /// Export runs to a JSONL file
    Export {
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
        /// Output JSONL file
        output: PathBuf,
    },
    /// Import runs from a JSONL file
    Import {
        /// Run log directory
        #[arg(long, default_value = ".a1/runs")]
        run_log_dir: PathBuf,
        /// Input JSONL file
        input: PathBuf,
    },
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    a1_common::settings::Settings::load_dotenv();
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { target, chain, block, model, max_turns, output, rpc, forge_std } => {
            cmd::run(&target, chain, block, &model, max_turns, output, rpc, forge_std).await
        }
        Commands::FetchSource { address, chain, output } => cmd::fetch_source(address, chain, output).await,
        Commands::ReadState { address, chain, function, block, rpc } => {
            cmd::read_state(address, chain, &function, block, rpc).await
        }
        Commands::ResolveProxy { address, chain, block, nested, rpc } => {
            cmd::resolve_proxy(address, chain, block, nested, rpc).await
        }
        Commands::ExtractConstructor { address, chain, block, rpc } => {
            cmd::extract_constructor(address, chain, block, rpc).await
        }
        Commands::AnalyzeCode { file, extract } => cmd::analyze_code(file, extract),
        Commands::Experiment { target, chain, block, model, max_turns, run_log_dir, rpc, forge_std } => {
            cmd::experiment(&target, chain, block, &model, max_turns, run_log_dir, rpc, forge_std).await
        }
        Commands::Batch { targets_file, parallelism, model, max_turns, run_log_dir, rpc, forge_std } => {
            cmd::batch(targets_file, parallelism, model, max_turns, run_log_dir, rpc, forge_std).await
        }
        Commands::Metrics { run_log_dir } => cmd::metrics(run_log_dir),
        Commands::Results { action } => match action {
            ResultsCommand::List { run_log_dir, target, model, success, limit } => {
                cmd::results::list(run_log_dir, target, model, success, limit)
            }
            ResultsCommand::Stats { run_log_dir } => cmd::results::stats(run_log_dir),
            ResultsCommand::Export { run_log_dir, output } => cmd::results::export(run_log_dir, output),
            ResultsCommand::Import { run_log_dir, input } => cmd::results::import(run_log_dir, input),
        },
    }
}
