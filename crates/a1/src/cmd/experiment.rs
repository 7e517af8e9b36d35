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

//! `a1 experiment`: runs a single target like `a1 run`, but against an explicitly named run log
//! directory, for downstream `a1 metrics`/`a1 results` inspection.

use std::path::PathBuf;

use a1_common::abi::AbiCodec;
use a1_common::settings::Settings;
use a1_engine::{
    AgentController, FileRunLog, ForkExecutor, ForkExecutorConfig, NullReasoner, Policy, PolicyMode, ToolRegistry,
};
use eyre::Result;

use crate::context;

#[allow(clippy::too_many_arguments)]
pub async fn experiment(
    target: &str,
    chain_id: u64,
    block: Option<u64>,
    model: &str,
    max_turns: u32,
    run_log_dir: PathBuf,
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
    let run_log = FileRunLog::new(&run_log_dir)?;
    let reasoner = NullReasoner::new("experiment run: no concrete LLM provider configured");

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

    let result = controller.run(target, block).await;
    println!(
        "{}",
        serde_json::json!({
            "success": result.success,
            "final_profit": result.final_profit,
            "turns": result.turns.len(),
            "total_tokens": result.total_tokens,
            "duration_seconds": result.duration_seconds,
        })
    );

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
