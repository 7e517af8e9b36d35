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

//! `a1 run`: drives a single target through the agent loop.
//!
//! Concrete LLM provider adapters are out of scope, so every invocation drives
//! [`a1_engine::NullReasoner`] -- `--model`/`--provider` are accepted and recorded for parity
//! with the rest of the CLI surface, but never dial out.

use std::path::PathBuf;

use a1_common::abi::AbiCodec;
use a1_common::settings::Settings;
use a1_engine::{
    AgentController, FileRunLog, ForkExecutor, ForkExecutorConfig, NullReasoner, Policy, PolicyMode, ToolRegistry,
};
use eyre::Result;

use crate::context;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    target: &str,
    chain_id: u64,
    block: Option<u64>,
    model: &str,
    max_turns: u32,
    output: Option<PathBuf>,
    rpc: Option<String>,
    forge_std: Option<PathBuf>,
) -> Result<()> {
    let settings = Settings::from_env();
    let clients = context::connect(chain_id, rpc.clone(), &settings).await?;
    let codec = AbiCodec::new();

    let executor_config = ForkExecutorConfig {
        rpc_url: rpc.or_else(|| Settings::rpc_url(chain_id)).expect("connect() already validated an RPC URL"),
        fork_block: block,
        forge_std_path: forge_std,
        timeout: settings.fork_timeout,
    };
    let executor = ForkExecutor::new(executor_config);

    let registry = ToolRegistry::new(&clients.chain, &clients.explorer, &clients.spec, &codec, &executor);
    let policy = Policy::new(PolicyMode::AgentChosen, settings.max_calls_per_turn);

    let run_log_dir = settings.cache_dir.clone().unwrap_or_else(|| PathBuf::from(".a1")).join("runs");
    let run_log = FileRunLog::new(&run_log_dir)?;

    let reasoner = NullReasoner::new(
        "No concrete LLM provider is wired up; configure LLM_PROVIDER/LLM_API_KEY to drive a real reasoner.",
    );

    let mut controller = AgentController::new(
        reasoner,
        registry,
        policy,
        &executor,
        clients.spec.base_token,
        chain_id,
        max_turns,
        &run_log,
        model,
    );

    println!("A1 Autonomous PoC Generator");
    println!("Target: {target}");
    println!("Chain: {chain_id}");
    println!("Model: {model}");
    println!();

    let result = controller.run(target, block).await;

    if result.success {
        println!("SUCCESS");
        println!("Profit: {} wei", result.final_profit);
    } else {
        println!("FAILED");
        if let Some(err) = &result.error {
            println!("Error: {err}");
        }
    }
    println!("\nTurns: {}", result.turns.len());
    println!("Tool calls: {}", result.total_tool_calls);
    println!("Tokens: {}", result.total_tokens);
    println!("Duration: {:.1}s", result.duration_seconds);

    if let Some(output) = output {
        let payload = serde_json::json!({
            "success": result.success,
            "final_profit": result.final_profit,
            "final_strategy": result.final_strategy,
            "turns": result.turns.len(),
            "total_tool_calls": result.total_tool_calls,
            "total_tokens": result.total_tokens,
            "duration_seconds": result.duration_seconds,
            "error": result.error,
        });
        let file = std::fs::File::create(&output)?;
        serde_json::to_writer_pretty(file, &payload)?;
        println!("\nResults saved to: {}", output.display());
    }

    if let Some(strategy) = &result.final_strategy {
        println!("\nFinal Strategy:");
        let preview: String = strategy.chars().take(2000).collect();
        println!("{preview}");
        if strategy.len() > 2000 {
            println!("... (truncated)");
        }
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
