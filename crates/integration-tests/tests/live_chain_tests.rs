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

//! Full tool-registry flow against a live chain. These require a real RPC endpoint
//! (`RPC_URL_1`, mirroring `Settings::rpc_url`), so they are `#[ignore]`d by default -- run with
//! `cargo test -- --ignored` once an endpoint is configured.

use a1_common::abi::AbiCodec;
use a1_common::chain::ChainReader;
use a1_common::chain_spec::ChainRegistry;
use a1_common::explorer::ExplorerReader;
use a1_engine::{ForkExecutor, ForkExecutorConfig, Policy, PolicyMode, ToolRegistry};
use a1_integration_tests::init::{init_test_logging, live_rpc_url};

/// USDC on mainnet: a contract whose `code_sanitizer`-free tools (state reads, proxy
/// resolution) are safe to exercise against without spending any gas.
const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

#[tokio::test]
#[ignore = "requires a live RPC_URL_1"]
async fn resolves_known_contract_through_the_full_tool_registry() {
    init_test_logging();
    let Some(rpc_url) = live_rpc_url(1) else {
        eprintln!("skipping: RPC_URL_1 not configured");
        return;
    };

    let chain = ChainReader::connect(&rpc_url).await.expect("connect to mainnet");
    let cache = std::sync::Arc::new(a1_common::cache::Cache::new(None::<std::path::PathBuf>, None).unwrap());
    let explorer = ExplorerReader::new(1, a1_common::settings::Settings::explorer_api_key(1), cache).expect("explorer reader");
    let spec = ChainRegistry::with_defaults().get(1).unwrap().clone();
    let codec = AbiCodec::new();
    let executor = ForkExecutor::new(ForkExecutorConfig {
        rpc_url: rpc_url.clone(),
        fork_block: None,
        forge_std_path: None,
        timeout: std::time::Duration::from_secs(60),
    });

    let registry = ToolRegistry::new(&chain, &explorer, &spec, &codec, &executor);
    let mut policy = Policy::new(PolicyMode::AgentChosen, 4);

    let result =
        policy.execute_tool(&registry, "blockchain_state_reader", &serde_json::json!({ "address": USDC, "query": "code" })).await;
    assert!(result.ok, "expected a successful state read, got {result:?}");
}
