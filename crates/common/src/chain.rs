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

//! Read-only façade over a JSON-RPC EVM endpoint.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::{BlockId, BlockNumberOrTag, TransactionInput, TransactionRequest, TransactionTrait};
use alloy_transport::TransportError;
use futures::future::join_all;
use thiserror::Error;

/// A single `eth_call`-shaped request batched through [`ChainReader::batch_call`].
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Target contract address.
    pub to: Address,
    /// Calldata.
    pub data: Bytes,
}

/// Failure modes of a [`ChainReader`] operation.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The underlying transport (HTTP/WS) failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The node returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    RpcError {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
    /// The response could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        match &err {
            TransportError::ErrorResp(payload) => {
                ChainError::RpcError { code: payload.code, message: payload.message.to_string() }
            }
            other => ChainError::Transport(other.to_string()),
        }
    }
}

/// A read-only view of an EVM chain at an arbitrary (possibly historical) block.
///
/// Backed by `alloy-provider` over HTTP, the way the forking helper in [`crate::forking`]
/// connects (`ProviderBuilder::new().connect(rpc_url)`), generalized here into a reusable,
/// long-lived façade rather than a one-shot fork-and-replay helper.
#[derive(Clone)]
pub struct ChainReader {
    provider: alloy_provider::RootProvider,
    chain_id: u64,
}

impl ChainReader {
    /// Connects to `rpc_url` and confirms the reported chain id.
    pub async fn connect(rpc_url: &str) -> Result<Self, ChainError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let chain_id = provider.get_chain_id().await?;
        Ok(Self { provider, chain_id })
    }

    /// The chain id reported by the connected endpoint.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn block_id(block: Option<u64>) -> BlockId {
        block.map(BlockId::from).unwrap_or(BlockId::Number(BlockNumberOrTag::Latest))
    }

    /// `eth_call`: executes `data` against `to` at `block` (or latest) without mutating state.
    pub async fn call(
        &self,
        to: Address,
        data: Bytes,
        block: Option<u64>,
    ) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default().to(to).input(TransactionInput::new(data));
        let result = self.provider.call(tx).block(Self::block_id(block)).await?;
        Ok(result)
    }

    /// `eth_getCode`.
    pub async fn code(&self, addr: Address, block: Option<u64>) -> Result<Bytes, ChainError> {
        Ok(self.provider.get_code_at(addr).block_id(Self::block_id(block)).await?)
    }

    /// `eth_getStorageAt`.
    pub async fn storage(
        &self,
        addr: Address,
        slot: B256,
        block: Option<u64>,
    ) -> Result<B256, ChainError> {
        let value =
            self.provider.get_storage_at(addr, slot.into()).block_id(Self::block_id(block)).await?;
        Ok(B256::from(value))
    }

    /// `eth_blockNumber`.
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_block_number().await?)
    }

    /// `eth_getBalance`.
    pub async fn balance(&self, addr: Address, block: Option<u64>) -> Result<U256, ChainError> {
        Ok(self.provider.get_balance(addr).block_id(Self::block_id(block)).await?)
    }

    /// `eth_getTransactionByHash`, returning just the `input` field.
    pub async fn transaction_input(&self, tx_hash: B256) -> Result<Bytes, ChainError> {
        let tx = self
            .provider
            .get_transaction_by_hash(tx_hash)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("transaction {tx_hash} not found")))?;
        Ok(tx.input().clone())
    }

    /// Executes a list of `eth_call`s, preserving the order of `calls`. A single call's failure
    /// yields `0x` for that entry rather than failing the whole batch.
    pub async fn batch_call(
        &self,
        calls: &[CallRequest],
        block: Option<u64>,
    ) -> Result<Vec<Bytes>, ChainError> {
        let futures = calls.iter().map(|c| self.call(c.to, c.data.clone(), block));
        let results = join_all(futures).await;
        Ok(results.into_iter().map(|r| r.unwrap_or_else(|_| Bytes::from_static(b""))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_is_stable() {
        let err = ChainError::RpcError { code: -32000, message: "execution reverted".into() };
        assert_eq!(err.to_string(), "rpc error -32000: execution reverted");
    }
}
