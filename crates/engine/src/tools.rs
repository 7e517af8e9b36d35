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

//! Tools the agent can call, wrapped around `a1-common`'s chain/explorer/proxy/dex/profit/code
//! primitives.
//!
//! A tool here is a variant of [`Tool`], not a `dyn Tool` trait object: every tool's inputs/outputs
//! are known up front, so a tagged enum with one `execute` per variant keeps call sites
//! exhaustive-checked without the indirection a trait object buys nothing for.

use a1_common::abi::AbiCodec;
use a1_common::chain::ChainReader;
use a1_common::chain_spec::ChainSpec;
use a1_common::code_analyzer as code;
use a1_common::constructor::decode_constructor;
use a1_common::dex::DexQuoter;
use a1_common::explorer::ExplorerReader;
use a1_common::profit::ProfitOracle;
use a1_common::proxy::ProxyResolver;
use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fork_executor::{ExecOutcome, ForkExecutor};

/// Outcome of a single tool call: tools never throw across this boundary, a failure is carried
/// as `ok: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    pub summary: String,
    pub details: Option<Value>,
    pub error: Option<String>,
}

impl ToolResult {
    fn ok(summary: impl Into<String>, details: Value) -> Self {
        Self { ok: true, summary: summary.into(), details: Some(details), error: None }
    }

    fn err(summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self { ok: false, summary: summary.into(), details: None, error: Some(error.into()) }
    }
}

/// Every concrete tool the agent may invoke.
pub enum Tool<'a> {
    BlockchainStateReader { chain: &'a ChainReader },
    SourceCodeFetcher { explorer: &'a ExplorerReader },
    ProxyResolver { chain: &'a ChainReader },
    ConstructorExtractor { chain: &'a ChainReader, explorer: &'a ExplorerReader, codec: &'a AbiCodec },
    DexAggregator { chain: &'a ChainReader, spec: &'a ChainSpec },
    ProfitOracle { chain: &'a ChainReader, spec: &'a ChainSpec },
    CodeSanitizer,
    ForkExecutor { executor: &'a ForkExecutor, base_token: Address },
}

impl<'a> Tool<'a> {
    /// The name the Reasoner sees in its tool-call arguments, snake_case and stable across
    /// releases so follow-up prompts can refer back to a prior call by name.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::BlockchainStateReader { .. } => "blockchain_state_reader",
            Tool::SourceCodeFetcher { .. } => "source_code_fetcher",
            Tool::ProxyResolver { .. } => "proxy_resolver",
            Tool::ConstructorExtractor { .. } => "constructor_extractor",
            Tool::DexAggregator { .. } => "dex_aggregator",
            Tool::ProfitOracle { .. } => "profit_oracle",
            Tool::CodeSanitizer => "code_sanitizer",
            Tool::ForkExecutor { .. } => "concrete_execution",
        }
    }

    /// Executes this tool with `args` (already-parsed JSON), containing any failure inside a
    /// failed [`ToolResult`] rather than propagating it to the caller.
    pub async fn execute(&self, args: &Value) -> ToolResult {
        match self {
            Tool::BlockchainStateReader { chain } => state_reader(chain, args).await,
            Tool::SourceCodeFetcher { explorer } => source_fetcher(explorer, args).await,
            Tool::ProxyResolver { chain } => proxy_resolver(chain, args).await,
            Tool::ConstructorExtractor { chain, explorer, codec } => {
                constructor_extractor(chain, explorer, codec, args).await
            }
            Tool::DexAggregator { chain, spec } => dex_aggregator(chain, spec, args).await,
            Tool::ProfitOracle { chain, spec } => profit_oracle(chain, spec, args).await,
            Tool::CodeSanitizer => code_sanitizer(args),
            Tool::ForkExecutor { executor, base_token } => {
                fork_execute(executor, *base_token, args).await
            }
        }
    }
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn arg_address(args: &Value, key: &str) -> Option<Address> {
    arg_str(args, key).and_then(|s| s.parse().ok())
}

fn arg_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

async fn state_reader(chain: &ChainReader, args: &Value) -> ToolResult {
    let Some(address) = arg_address(args, "address").or_else(|| arg_address(args, "to")) else {
        return ToolResult::err("missing address", "address is required");
    };
    let block = arg_u64(args, "block_number");

    match arg_str(args, "query").unwrap_or("code") {
        "balance" => match chain.balance(address, block).await {
            Ok(balance) => ToolResult::ok(
                format!("balance of {address} is {balance}"),
                serde_json::json!({ "balance": balance.to_string() }),
            ),
            Err(e) => ToolResult::err("balance query failed", e.to_string()),
        },
        "storage" => {
            let Some(slot) = arg_str(args, "slot").and_then(|s| s.parse::<alloy_primitives::B256>().ok())
            else {
                return ToolResult::err("missing slot", "slot is required for a storage query");
            };
            match chain.storage(address, slot, block).await {
                Ok(value) => ToolResult::ok(
                    format!("storage[{slot}] of {address} is {value}"),
                    serde_json::json!({ "value": value.to_string() }),
                ),
                Err(e) => ToolResult::err("storage query failed", e.to_string()),
            }
        }
        "call" => {
            let Some(data) = arg_str(args, "data").and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
            else {
                return ToolResult::err("missing data", "data is required for a call query");
            };
            match chain.call(address, data.into(), block).await {
                Ok(result) => ToolResult::ok(
                    format!("call to {address} returned {} bytes", result.len()),
                    serde_json::json!({ "result": format!("0x{}", hex::encode(&result)) }),
                ),
                Err(e) => ToolResult::err("call failed", e.to_string()),
            }
        }
        _ => match chain.code(address, block).await {
            Ok(code) => ToolResult::ok(
                format!("code of {address} is {} bytes", code.len()),
                serde_json::json!({ "code": format!("0x{}", hex::encode(&code)), "is_contract": !code.is_empty() }),
            ),
            Err(e) => ToolResult::err("code query failed", e.to_string()),
        },
    }
}

async fn source_fetcher(explorer: &ExplorerReader, args: &Value) -> ToolResult {
    let Some(address) = arg_address(args, "address") else {
        return ToolResult::err("missing address", "address is required");
    };
    match explorer.get_source(address).await {
        Ok(info) => ToolResult::ok(
            format!("fetched verified source for {} ({})", address, info.contract_name),
            serde_json::to_value(&info).unwrap_or(Value::Null),
        ),
        Err(e) => ToolResult::err(format!("source fetch failed for {address}"), e.to_string()),
    }
}

async fn proxy_resolver(chain: &ChainReader, args: &Value) -> ToolResult {
    let Some(address) = arg_address(args, "address") else {
        return ToolResult::err("missing address", "address is required");
    };
    let block = arg_u64(args, "block_number");
    let nested = args.get("nested").and_then(Value::as_bool).unwrap_or(true);

    let resolver = ProxyResolver::new(chain);
    let info = resolver.resolve(address, block, nested).await;
    ToolResult::ok(
        format!("{address} resolved as {:?}", info.kind),
        serde_json::to_value(&info).unwrap_or(Value::Null),
    )
}

async fn constructor_extractor(
    chain: &ChainReader,
    explorer: &ExplorerReader,
    codec: &AbiCodec,
    args: &Value,
) -> ToolResult {
    let Some(address) = arg_address(args, "address") else {
        return ToolResult::err("missing address", "address is required");
    };
    let block = arg_u64(args, "block_number");

    let creation = match explorer.get_creation_tx(address).await {
        Ok(c) => c,
        Err(e) => return ToolResult::err("no creation transaction found", e.to_string()),
    };
    let creation_input = match chain.transaction_input(creation.tx_hash).await {
        Ok(input) => input,
        Err(e) => return ToolResult::err("failed to fetch creation transaction", e.to_string()),
    };
    let deployed_code = match chain.code(address, block).await {
        Ok(code) => code,
        Err(e) => return ToolResult::err("failed to fetch deployed code", e.to_string()),
    };

    let abi = codec.get_cached_abi(address);
    let info = decode_constructor(
        address,
        Some(creation.tx_hash),
        Some(creation.creator),
        block,
        &creation_input,
        &deployed_code,
        abi.as_ref(),
    );

    ToolResult::ok(
        format!("decoded {} constructor argument(s) for {address}", info.params.len()),
        serde_json::to_value(&info).unwrap_or(Value::Null),
    )
}

async fn dex_aggregator(chain: &ChainReader, spec: &ChainSpec, args: &Value) -> ToolResult {
    let (Some(token_in), Some(token_out)) = (arg_address(args, "token_in"), arg_address(args, "token_out"))
    else {
        return ToolResult::err("missing tokens", "token_in and token_out are required");
    };
    let Some(amount_in) = arg_str(args, "amount_in").and_then(|s| U256::from_str_radix(s, 10).ok())
    else {
        return ToolResult::err("missing amount_in", "amount_in is required");
    };
    let block = arg_u64(args, "block_number");

    let quoter = DexQuoter::new(chain, spec);
    match quoter.get_quote(token_in, token_out, amount_in, block).await {
        Ok(quote) => ToolResult::ok(
            format!("best quote via {}: {} -> {}", quote.dex, quote.amount_in, quote.amount_out),
            serde_json::json!({
                "dex": quote.dex,
                "path": quote.path,
                "amount_out": quote.amount_out.to_string(),
                "price_impact": quote.price_impact,
                "effective_price": quote.effective_price,
            }),
        ),
        Err(e) => ToolResult::err("no usable quote", e.to_string()),
    }
}

async fn profit_oracle(chain: &ChainReader, spec: &ChainSpec, args: &Value) -> ToolResult {
    let Some(deltas) = args.get("deltas").and_then(Value::as_array) else {
        return ToolResult::err("missing deltas", "deltas (array of {token, delta}) is required");
    };
    let block = arg_u64(args, "block_number");

    let mut parsed = Vec::with_capacity(deltas.len());
    for entry in deltas {
        let Some(token) = entry.get("token").and_then(Value::as_str).and_then(|s| s.parse::<Address>().ok())
        else {
            return ToolResult::err("malformed delta entry", "each delta needs a token address");
        };
        let Some(delta) = entry.get("delta").and_then(Value::as_str).and_then(|s| s.parse::<I256>().ok())
        else {
            return ToolResult::err("malformed delta entry", "each delta needs a signed decimal delta");
        };
        parsed.push((token, delta));
    }

    let oracle = ProfitOracle::new(chain, spec);
    match oracle.evaluate(&parsed, block).await {
        Ok(report) => ToolResult::ok(
            format!("net profit {} base-token units (confidence {:.2})", report.net, report.confidence),
            serde_json::to_value(&report).unwrap_or(Value::Null),
        ),
        Err(e) => ToolResult::err("profit evaluation failed", e.to_string()),
    }
}

fn code_sanitizer(args: &Value) -> ToolResult {
    let Some(source) = arg_str(args, "code") else {
        return ToolResult::err("missing code", "code is required");
    };

    if let Some(target) = arg_str(args, "extract_target") {
        let parsed = code::parse(source);
        return match code::extract_minimal(&parsed, target) {
            Some(minimal) => ToolResult::ok(
                format!("extracted minimal closure for {target}"),
                serde_json::json!({ "code": minimal }),
            ),
            None => ToolResult::err(format!("entity {target} not found"), "unknown entity"),
        };
    }

    let sanitized = code::sanitize(source, code::SanitizeOptions::default());
    ToolResult::ok("sanitized source", serde_json::json!({ "code": sanitized }))
}

async fn fork_execute(executor: &ForkExecutor, base_token: Address, args: &Value) -> ToolResult {
    let Some(strategy_code) = arg_str(args, "strategy_code") else {
        return ToolResult::err("missing strategy_code", "strategy_code is required");
    };
    let tracked_tokens: Vec<Address> = args
        .get("tracked_tokens")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).filter_map(|s| s.parse().ok()).collect())
        .unwrap_or_default();
    let initial_balance =
        arg_str(args, "initial_balance").unwrap_or("100000000000000000000").to_string();

    match executor.execute(strategy_code, base_token, &tracked_tokens, &initial_balance).await {
        Ok(outcome) => outcome_to_result(outcome),
        Err(e) => ToolResult::err("execution failed", e.to_string()),
    }
}

fn outcome_to_result(outcome: ExecOutcome) -> ToolResult {
    if !outcome.ran {
        return ToolResult::err(
            format!("execution did not run ({:?})", outcome.failure_kind),
            outcome.revert_reason.unwrap_or_else(|| "unknown toolchain failure".to_string()),
        );
    }
    let summary = if outcome.success {
        format!("execution succeeded, profit {:?}", outcome.profit)
    } else {
        format!("execution failed: {}", outcome.revert_reason.as_deref().unwrap_or("unknown"))
    };
    let ok = outcome.success;
    let error = if ok { None } else { outcome.revert_reason.clone() };
    ToolResult { ok, summary, details: serde_json::to_value(&outcome).ok(), error }
}

/// Ties a [`Tool`] to its public-facing JSON schema so the Reasoner knows what arguments to pass.
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// The fixed roster of tool definitions offered to every run, independent of which concrete
/// clients back them at call time.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "blockchain_state_reader",
            description: "Reads on-chain state: contract code, balance, storage slot, or a raw eth_call.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "enum": ["code", "balance", "storage", "call"]},
                    "address": {"type": "string"},
                    "slot": {"type": "string"},
                    "data": {"type": "string"},
                    "block_number": {"type": "integer"}
                },
                "required": ["address"]
            }),
        },
        ToolDefinition {
            name: "source_code_fetcher",
            description: "Fetches verified source code for a contract from the block explorer.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {"address": {"type": "string"}},
                "required": ["address"]
            }),
        },
        ToolDefinition {
            name: "proxy_resolver",
            description: "Detects proxy patterns and resolves the implementation address.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "address": {"type": "string"},
                    "block_number": {"type": "integer"},
                    "nested": {"type": "boolean"}
                },
                "required": ["address"]
            }),
        },
        ToolDefinition {
            name: "constructor_extractor",
            description: "Decodes a contract's constructor arguments from its creation transaction.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "address": {"type": "string"},
                    "block_number": {"type": "integer"}
                },
                "required": ["address"]
            }),
        },
        ToolDefinition {
            name: "dex_aggregator",
            description: "Finds the best swap quote across registered DEXes for a token pair.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "token_in": {"type": "string"},
                    "token_out": {"type": "string"},
                    "amount_in": {"type": "string"},
                    "block_number": {"type": "integer"}
                },
                "required": ["token_in", "token_out", "amount_in"]
            }),
        },
        ToolDefinition {
            name: "profit_oracle",
            description: "Normalizes a set of per-token balance deltas into base-token profit.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "deltas": {"type": "array", "items": {"type": "object"}},
                    "block_number": {"type": "integer"}
                },
                "required": ["deltas"]
            }),
        },
        ToolDefinition {
            name: "code_sanitizer",
            description: "Sanitizes or extracts the minimal required closure from Solidity source.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "code": {"type": "string"},
                    "extract_target": {"type": "string"}
                },
                "required": ["code"]
            }),
        },
        ToolDefinition {
            name: "concrete_execution",
            description: "Compiles and runs a Strategy contract against a forked chain, reporting profit.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "strategy_code": {"type": "string"},
                    "tracked_tokens": {"type": "array", "items": {"type": "string"}},
                    "initial_balance": {"type": "string"}
                },
                "required": ["strategy_code"]
            }),
        },
    ]
}

/// Owns the live client set every [`Tool`] variant is wired to for a single run.
pub struct ToolRegistry<'a> {
    chain: &'a ChainReader,
    explorer: &'a ExplorerReader,
    spec: &'a ChainSpec,
    codec: &'a AbiCodec,
    executor: &'a ForkExecutor,
    base_token: Address,
}

impl<'a> ToolRegistry<'a> {
    /// The chain reader backing this registry's tools, for callers that need to compose a
    /// component directly rather than through a [`Tool`] variant.
    pub fn chain(&self) -> &'a ChainReader {
        self.chain
    }

    /// The chain spec backing this registry's tools.
    pub fn spec(&self) -> &'a ChainSpec {
        self.spec
    }

    pub fn new(
        chain: &'a ChainReader,
        explorer: &'a ExplorerReader,
        spec: &'a ChainSpec,
        codec: &'a AbiCodec,
        executor: &'a ForkExecutor,
    ) -> Self {
        Self { chain, explorer, spec, codec, executor, base_token: spec.base_token }
    }

    /// Looks up the live [`Tool`] for `name`, or `None` if unrecognized.
    pub fn resolve(&self, name: &str) -> Option<Tool<'a>> {
        match name {
            "blockchain_state_reader" => Some(Tool::BlockchainStateReader { chain: self.chain }),
            "source_code_fetcher" => Some(Tool::SourceCodeFetcher { explorer: self.explorer }),
            "proxy_resolver" => Some(Tool::ProxyResolver { chain: self.chain }),
            "constructor_extractor" => Some(Tool::ConstructorExtractor {
                chain: self.chain,
                explorer: self.explorer,
                codec: self.codec,
            }),
            "dex_aggregator" => Some(Tool::DexAggregator { chain: self.chain, spec: self.spec }),
            "profit_oracle" => Some(Tool::ProfitOracle { chain: self.chain, spec: self.spec }),
            "code_sanitizer" => Some(Tool::CodeSanitizer),
            "concrete_execution" => {
                Some(Tool::ForkExecutor { executor: self.executor, base_token: self.base_token })
            }
            _ => None,
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_sanitizer_rejects_missing_code() {
        let result = code_sanitizer(&serde_json::json!({}));
        assert!(!result.ok);
    }

    #[test]
    fn tool_definitions_cover_every_tool_name() {
        let names: Vec<_> = tool_definitions().iter().map(|d| d.name).collect();
        assert!(names.contains(&"blockchain_state_reader"));
        assert!(names.contains(&"concrete_execution"));
        assert_eq!(names.len(), 8);
    }
}
