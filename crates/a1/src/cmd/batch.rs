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

//! `a1 batch`: runs many targets concurrently, bounded by `--parallelism`.
//!
//! Targets are read from a JSON file: `[{"address": "0x..", "chain_id": 1, "block_number": 123}, ...]`.

use std::path::PathBuf;

use a1_common::abi::AbiCodec;
use a1_common::settings::Settings;
use a1_engine::{
    AgentController, BatchDriver, BatchTarget, FileRunLog, ForkExecutor, ForkExecutorConfig, LoopResult, NullReasoner,
    Policy, PolicyMode, ToolRegistry,
};
use eyre::Result;

use crate::context;

#[allow(clippy::too_many_arguments)]
pub async fn batch(
    targets_file: PathBuf,
    parallelism: usize,
    model: String,
    max_turns: u32,
    run_log_dir: PathBuf,
    rpc: Option<String>,
    forge_std: Option<PathBuf>,
) -> Result<()> {
    let raw = std::fs::read_to_string(&targets_file)?;
    let targets: Vec<BatchTarget> = serde_json::from_str(&raw)?;

    std::fs::create_dir_all(&run_log_dir)?;
    let driver = BatchDriver::new(targets, parallelism);

    let results = driver
        .run_all(|target| {
            let model = model.clone();
            let run_log_dir = run_log_dir.clone();
            let rpc = rpc.clone();
            let forge_std = forge_std.clone();
            async move { run_one_target(target, model, max_turns, run_log_dir, rpc, forge_std).await }
        })
        .await;

    let successful = results.iter().filter(|r| r.success).count();
    println!("Ran {} targets, {successful} succeeded", results.len());
    for (target, result) in results.iter().enumerate() {
        println!(
            "  [{target}] success={} profit={} turns={} error={:?}",
            result.success,
            result.final_profit,
            result.turns.len(),
            result.error
        );
    }

    Ok(())
}

async fn run_one_target(
    target: BatchTarget,
    model: String,
    max_turns: u32,
    run_log_dir: PathBuf,
    rpc: Option<String>,
    forge_std: Option<PathBuf>,
) -> LoopResult {
    let settings = Settings::from_env();

    let clients = match context::connect(target.chain_id, rpc.clone(), &settings).await {
        Ok(clients) => clients,
        Err(e) => return failed_result(e.to_string()),
    };
    let codec = AbiCodec::new();

    let rpc_url = match rpc.or_else(|| Settings::rpc_url(target.chain_id)) {
        Some(url) => url,
        None => return failed_result(format!("no RPC URL configured for chain {}", target.chain_id)),
    };
    let executor = ForkExecutor::new(ForkExecutorConfig {
        rpc_url,
        fork_block: target.block_number,
        forge_std_path: forge_std,
        timeout: settings.fork_timeout,
    });

    let registry = ToolRegistry::new(&clients.chain, &clients.explorer, &clients.spec, &codec, &executor);
    let policy = Policy::new(PolicyMode::AgentChosen, settings.max_calls_per_turn);

    let run_log = match FileRunLog::new(&run_log_dir) {
        Ok(log) => log,
        Err(e) => return failed_result(e.to_string()),
    };
    let reasoner = NullReasoner::new("batch run: no concrete LLM provider configured");

    let mut controller = AgentController::new(
        reasoner,
        registry,
        policy,
        &executor,
        clients.spec.base_token,
        target.chain_id,
        max_turns,
        &run_log,
        model,
    );

    controller.run(&target.address, target.block_number).await
}

fn failed_result(error: String) -> LoopResult {
    LoopResult {
        success: false,
        final_strategy: None,
        final_profit: 0,
        turns: vec![],
        total_tokens: 0,
        total_tool_calls: 0,
        duration_seconds: 0.0,
        error: Some(error),
    }
}
