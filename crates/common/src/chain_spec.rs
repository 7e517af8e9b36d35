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

//! Per-chain constants: base token, routing intermediates, and the DEX registry.

use std::collections::HashMap;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One DEX's router/factory pair and swap fee, in basis points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    /// Human-readable DEX name, e.g. `"uniswap_v2"`.
    pub name: String,
    /// Router contract (exposes `getAmountsOut`/`getAmountsIn`).
    pub router: Address,
    /// Factory contract (exposes `getPair`).
    pub factory: Address,
    /// Swap fee in basis points (e.g. `30` for 0.3%).
    pub fee_bps: u32,
}

/// Immutable, process-lifetime description of one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSpec {
    /// EVM chain id.
    pub chain_id: u64,
    /// The chain's canonical valuation asset (e.g. WETH on Ethereum).
    pub base_token: Address,
    /// The base token's symbol, used for display.
    pub base_symbol: String,
    /// Tokens with deep liquidity, used to widen multi-hop routing.
    pub intermediates: Vec<Address>,
    /// Registered DEXes for this chain.
    pub dexes: Vec<DexConfig>,
}

/// Raised when a chain id is not present in the registry.
#[derive(Debug, Error)]
#[error("unknown chain id {0}")]
pub struct UnknownChain(pub u64);

/// A registry of [`ChainSpec`]s keyed by chain id. Looking up an unregistered chain is a hard
/// failure, not a soft fallback.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<u64, ChainSpec>,
}

impl ChainRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces `spec` under its own `chain_id`.
    pub fn insert(&mut self, spec: ChainSpec) {
        self.chains.insert(spec.chain_id, spec);
    }

    /// Looks up `chain_id`, failing hard if unregistered.
    pub fn get(&self, chain_id: u64) -> Result<&ChainSpec, UnknownChain> {
        self.chains.get(&chain_id).ok_or(UnknownChain(chain_id))
    }

    /// The built-in registry: Ethereum mainnet and BSC.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(ethereum_mainnet());
        registry.insert(bsc_mainnet());
        registry
    }
}

fn ethereum_mainnet() -> ChainSpec {
    ChainSpec {
        chain_id: 1,
        base_token: address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), // WETH
        base_symbol: "WETH".to_string(),
        intermediates: vec![
            address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), // WETH
            address!("0xdAC17F958D2ee523a2206206994597C13D831ec7"), // USDT
            address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), // USDC
            address!("0x6B175474E89094C44Da98b954EedeAC495271d0F"), // DAI
        ],
        dexes: vec![
            DexConfig {
                name: "uniswap_v2".to_string(),
                router: address!("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
                factory: address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f"),
                fee_bps: 30,
            },
            DexConfig {
                name: "sushiswap".to_string(),
                router: address!("0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F"),
                factory: address!("0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac"),
                fee_bps: 30,
            },
        ],
    }
}

fn bsc_mainnet() -> ChainSpec {
    ChainSpec {
        chain_id: 56,
        base_token: address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"), // WBNB
        base_symbol: "WBNB".to_string(),
        intermediates: vec![
            address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"), // WBNB
            address!("0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56"), // BUSD
            address!("0x55d398326f99059fF775485246999027B3197955"), // USDT
        ],
        dexes: vec![
            DexConfig {
                name: "pancakeswap_v2".to_string(),
                router: address!("0x10ED43C718714eb63d5aA57B78B54704E256024E"),
                factory: address!("0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73"),
                fee_bps: 25,
            },
            DexConfig {
                name: "biswap".to_string(),
                router: address!("0x3a6d8cA21D1CF76F653A67577FA0D27453350dD8"),
                factory: address!("0x858E3312ed3A876947EA49d572A7C42DE08af7EE"),
                fee_bps: 10,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chain_is_hard_failure() {
        let registry = ChainRegistry::with_defaults();
        assert!(registry.get(999_999).is_err());
    }

    #[test]
    fn ethereum_mainnet_is_registered() {
        let registry = ChainRegistry::with_defaults();
        let spec = registry.get(1).unwrap();
        assert_eq!(spec.base_symbol, "WETH");
        assert_eq!(spec.dexes.len(), 2);
    }
}
