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

//! Verified-source and creation-transaction lookups against Etherscan-compatible explorers.
//!
//! The wire client is `foundry-block-explorers`'s `Client`. The multi-file `SourceCode` string is
//! normalized by a small parser covering the three formats explorers actually emit (double-brace,
//! single-brace, plain string), failing soft when none of them match.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_chains::Chain;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, TxHash};
use foundry_block_explorers::{errors::EtherscanError, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::Cache;

/// Failure modes of explorer lookups.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The underlying explorer client could not be built (bad chain/key).
    #[error("failed to build explorer client: {0}")]
    ClientBuild(String),
    /// The explorer API call itself failed.
    #[error("explorer API error: {0}")]
    Api(String),
    /// The contract is not verified on the explorer.
    #[error("contract not verified")]
    NotVerified,
    /// No creation transaction is known for this address.
    #[error("no creation transaction found")]
    NoCreationTx,
}

impl From<EtherscanError> for ExplorerError {
    fn from(err: EtherscanError) -> Self {
        match err {
            EtherscanError::ContractCodeNotVerified(_) => ExplorerError::NotVerified,
            other => ExplorerError::Api(other.to_string()),
        }
    }
}

/// Verified source, as normalized from the explorer's `SourceCode` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The contract address.
    pub address: Address,
    /// The verified contract's declared name.
    pub contract_name: String,
    /// Solc version string, e.g. `"v0.8.19+commit.7dd6d404"`.
    pub compiler_version: String,
    /// Whether optimization was enabled.
    pub optimization_used: bool,
    /// Optimizer run count.
    pub runs: u32,
    /// Path -> source text, one entry per file.
    pub source_files: BTreeMap<String, String>,
    /// Parsed ABI, if the explorer returned one.
    pub abi: Option<JsonAbi>,
    /// Whether the explorer itself flags this as a proxy.
    pub proxy: bool,
    /// The explorer-reported implementation address, for proxies.
    pub implementation: Option<Address>,
    /// Raw constructor-argument hex, as returned by the explorer.
    pub constructor_arguments: Bytes,
}

/// Contract-creation transaction info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationInfo {
    /// The deployer address.
    pub creator: Address,
    /// The creation transaction hash.
    pub tx_hash: TxHash,
}

/// Splits a `SourceCode` payload into named files, per the three documented shapes:
///
/// - Double-brace-wrapped Standard-JSON-Input (`{{ ... }}`): strip exactly one matching pair of
///   outer braces, then parse the remainder as `{ "sources": { path: { "content": ... } } }` (or a
///   bare `path -> { "content": ... }` map without the `sources` wrapper).
/// - Single-brace JSON (`{ ... }`): parse directly, same two shapes.
/// - Anything else, or any parse failure: treated as one literal `main.sol` file.
///
/// The brace-stripping only fires when the first and last non-whitespace bytes are a genuinely
/// matching `{`/`}` pair; a lone leading `{` with no trailing `}` falls through to the plain-file
/// case instead of corrupting the payload.
pub fn normalize_source_code(raw: &str) -> BTreeMap<String, String> {
    let trimmed = raw.trim();

    if trimmed.starts_with("{{") && trimmed.ends_with("}}") && trimmed.len() >= 4 {
        let inner = &trimmed[1..trimmed.len() - 1];
        if let Some(files) = parse_json_sources(inner) {
            return files;
        }
    } else if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Some(files) = parse_json_sources(trimmed) {
            return files;
        }
    }

    let mut files = BTreeMap::new();
    files.insert("main.sol".to_string(), raw.to_string());
    files
}

fn parse_json_sources(text: &str) -> Option<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let sources_obj = value.get("sources").unwrap_or(&value);
    let map = sources_obj.as_object()?;

    let mut files = BTreeMap::new();
    for (path, entry) in map {
        let content = entry.get("content").and_then(|c| c.as_str())?;
        files.insert(path.clone(), content.to_string());
    }
    Some(files)
}

/// Verified-source and creation-metadata lookups, content-addressed-cached.
pub struct ExplorerReader {
    client: Client,
    chain_id: u64,
    cache: Arc<Cache>,
}

impl ExplorerReader {
    /// Builds a reader for `chain_id`, optionally authenticated with `api_key`.
    pub fn new(chain_id: u64, api_key: Option<String>, cache: Arc<Cache>) -> Result<Self, ExplorerError> {
        let chain = Chain::from(chain_id);
        let mut builder = Client::builder().chain(chain).map_err(|e| ExplorerError::ClientBuild(e.to_string()))?;
        if let Some(key) = api_key {
            builder = builder.with_api_key(key);
        }
        let client = builder.build().map_err(|e| ExplorerError::ClientBuild(e.to_string()))?;
        Ok(Self { client, chain_id, cache })
    }

    /// Fetches and normalizes verified source for `address`, or `Err(NotVerified)` if the
    /// contract has no verified source.
    pub async fn get_source(&self, address: Address) -> Result<SourceInfo, ExplorerError> {
        let cache_key = Cache::make_key_parts(&["source", &self.chain_id.to_string(), &format!("{address:#x}")]);
        if let Some(cached) = self.cache.get::<SourceInfo>(&cache_key) {
            return Ok(cached);
        }

        let mut meta = self.client.contract_source_code(address).await?;
        if meta.items.is_empty() {
            return Err(ExplorerError::NotVerified);
        }
        let item = meta.items.remove(0);

        let source_files = item
            .sources()
            .into_iter()
            .map(|(path, source)| (path.to_string_lossy().to_string(), source.content))
            .collect::<BTreeMap<_, _>>();

        let abi = item.abi().ok();
        let implementation = item
            .implementation
            .as_ref()
            .and_then(|s| s.parse::<Address>().ok())
            .filter(|a| !a.is_zero());
        let constructor_arguments = Bytes::from(item.constructor_arguments.clone());

        let info = SourceInfo {
            address,
            contract_name: item.contract_name.clone(),
            compiler_version: item.compiler_version.clone(),
            optimization_used: item.optimization_used != 0,
            runs: item.runs,
            source_files,
            abi,
            proxy: item.proxy != 0,
            implementation,
            constructor_arguments,
        };

        let _ = self.cache.set(&cache_key, &info, None);
        Ok(info)
    }

    /// Fetches the contract-creation transaction and deployer for `address`.
    pub async fn get_creation_tx(&self, address: Address) -> Result<CreationInfo, ExplorerError> {
        let cache_key =
            Cache::make_key_parts(&["creation_tx", &self.chain_id.to_string(), &format!("{address:#x}")]);
        if let Some(cached) = self.cache.get::<CreationInfo>(&cache_key) {
            return Ok(cached);
        }

        let data = self.client.contract_creation_data(address).await.map_err(|e| match e {
            EtherscanError::ContractCodeNotVerified(_) => ExplorerError::NoCreationTx,
            other => ExplorerError::Api(other.to_string()),
        })?;

        let info = CreationInfo { creator: data.contract_creator, tx_hash: data.transaction_hash };
        let _ = self.cache.set(&cache_key, &info, None);
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_double_brace_payload() {
        let raw = r#"{{"language":"Solidity","sources":{"A.sol":{"content":"contract A {}"}}}}"#;
        let files = normalize_source_code(raw);
        assert_eq!(files.get("A.sol").map(String::as_str), Some("contract A {}"));
    }

    #[test]
    fn normalizes_single_brace_sources_map() {
        let raw = r#"{"sources":{"B.sol":{"content":"contract B {}"}}}"#;
        let files = normalize_source_code(raw);
        assert_eq!(files.get("B.sol").map(String::as_str), Some("contract B {}"));
    }

    #[test]
    fn normalizes_bare_path_map_without_sources_wrapper() {
        let raw = r#"{"C.sol":{"content":"contract C {}"}}"#;
        let files = normalize_source_code(raw);
        assert_eq!(files.get("C.sol").map(String::as_str), Some("contract C {}"));
    }

    #[test]
    fn falls_back_to_plain_file_on_non_json() {
        let raw = "contract D { function f() public {} }";
        let files = normalize_source_code(raw);
        assert_eq!(files.get("main.sol").map(String::as_str), Some(raw));
    }

    #[test]
    fn falls_back_to_plain_file_when_brace_shape_mismatched() {
        let raw = "{ not actually json and no closing brace";
        let files = normalize_source_code(raw);
        assert_eq!(files.len(), 1);
        assert!(files.contains_key("main.sol"));
    }
}
