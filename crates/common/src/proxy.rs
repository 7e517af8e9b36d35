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

//! Proxy-pattern detection: EIP-1967, EIP-1167, custom slots, and getter-function fallback.

use alloy_primitives::{b256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::chain::ChainReader;

/// EIP-1967 implementation slot: `bytes32(uint256(keccak256("eip1967.proxy.implementation")) - 1)`.
pub const EIP1967_IMPL_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");
/// EIP-1967 beacon slot: `bytes32(uint256(keccak256("eip1967.proxy.beacon")) - 1)`.
pub const EIP1967_BEACON_SLOT: B256 =
    b256!("a3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50");
/// EIP-1967 admin slot: `bytes32(uint256(keccak256("eip1967.proxy.admin")) - 1)`.
pub const EIP1967_ADMIN_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// EIP-1167 minimal-proxy bytecode prefix (10 bytes).
pub const EIP1167_PREFIX: [u8; 10] = [
    0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73,
];
/// EIP-1167 minimal-proxy bytecode suffix (15 bytes).
pub const EIP1167_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// A finite list of well-known custom proxy slots used by protocols that predate EIP-1967.
pub const CUSTOM_IMPL_SLOTS: &[B256] = &[
    // Used by some early Gnosis Safe / Synthetix-style proxies.
    b256!("c5f16f0fcc639fa48a6947836d9850f504798523bf8c9a3a87d5876cf622bcf"),
    b256!("7050c9e0f4ca769c69bd3a8ef740bc37934f8e2c036e5a723fd8ee048ed3f8c"),
];

const IMPLEMENTATION_GETTERS: &[(&str, [u8; 4])] = &[
    ("implementation()", [0x5c, 0x60, 0xda, 0x1b]),
    ("getImplementation()", [0xaa, 0xf1, 0x0f, 0x42]),
    ("masterCopy()", [0xa6, 0x19, 0x48, 0x6e]),
    ("childImplementation()", [0xda, 0x52, 0x57, 0x16]),
];

const MAX_NESTED_DEPTH: u8 = 5;

/// Kind of proxy pattern detected, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyKind {
    /// No proxy pattern matched.
    None,
    /// EIP-1967 transparent proxy.
    Eip1967Transparent,
    /// EIP-1967 beacon proxy.
    Eip1967Beacon,
    /// EIP-1167 minimal proxy ("clone").
    Eip1167Minimal,
    /// UUPS-style proxy detected via an implementation getter function.
    Uups,
    /// A well-known custom storage slot.
    CustomSlot,
    /// A proxy-shaped contract whose pattern could not be classified.
    Unknown,
}

/// Result of resolving a single address's proxy status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyInfo {
    /// The address that was inspected.
    pub address: Address,
    /// The detected proxy kind.
    pub kind: ProxyKind,
    /// The (possibly nested) final implementation address, if any.
    pub implementation: Option<Address>,
    /// The beacon address, for `eip1967-beacon`.
    pub beacon: Option<Address>,
    /// The admin address, for `eip1967-transparent`.
    pub admin: Option<Address>,
    /// Every intermediate address visited while recursing through nested proxies.
    pub nested_chain: Vec<Address>,
    /// Human-readable description of which detection step matched.
    pub method: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl ProxyInfo {
    fn none(address: Address) -> Self {
        Self {
            address,
            kind: ProxyKind::None,
            implementation: None,
            beacon: None,
            admin: None,
            nested_chain: vec![],
            method: "no proxy pattern matched".to_string(),
            confidence: 0.0,
        }
    }
}

fn is_zero(word: B256) -> bool {
    word == B256::ZERO
}

fn address_from_word(word: B256) -> Address {
    Address::from_slice(&word[12..])
}

/// Detects proxy patterns for a single address at a given block, optionally recursing through
/// nested proxies up to a fixed depth.
pub struct ProxyResolver<'a> {
    chain: &'a ChainReader,
}

impl<'a> ProxyResolver<'a> {
    /// New resolver over `chain`.
    pub fn new(chain: &'a ChainReader) -> Self {
        Self { chain }
    }

    /// Resolves `address`'s proxy status at `block`. When `nested` is true, recurses into the
    /// detected implementation (if it is itself a proxy) up to a depth of 5.
    pub async fn resolve(&self, address: Address, block: Option<u64>, nested: bool) -> ProxyInfo {
        let mut info = self.resolve_one_step(address, block).await;
        if !nested || info.kind == ProxyKind::None {
            return info;
        }

        let mut depth = 0u8;
        let mut chain_trail = vec![address];
        while depth < MAX_NESTED_DEPTH {
            let Some(next) = info.implementation else { break };
            if chain_trail.contains(&next) {
                break; // cycle guard
            }
            let next_info = self.resolve_one_step(next, block).await;
            if next_info.kind == ProxyKind::None {
                break;
            }
            chain_trail.push(next);
            info.implementation = next_info.implementation;
            depth += 1;
        }
        info.nested_chain = chain_trail;
        info
    }

    /// A single, non-recursive detection pass over the ordered steps.
    async fn resolve_one_step(&self, address: Address, block: Option<u64>) -> ProxyInfo {
        if let Some(info) = self.try_eip1967(address, block).await {
            return info;
        }
        if let Some(info) = self.try_eip1167(address, block).await {
            return info;
        }
        if let Some(info) = self.try_custom_slots(address, block).await {
            return info;
        }
        if let Some(info) = self.try_implementation_function(address, block).await {
            return info;
        }
        ProxyInfo::none(address)
    }

    async fn try_eip1967(&self, address: Address, block: Option<u64>) -> Option<ProxyInfo> {
        if let Ok(impl_slot) = self.chain.storage(address, EIP1967_IMPL_SLOT, block).await {
            if !is_zero(impl_slot) {
                let admin = match self.chain.storage(address, EIP1967_ADMIN_SLOT, block).await {
                    Ok(word) if !is_zero(word) => Some(address_from_word(word)),
                    _ => None,
                };
                return Some(ProxyInfo {
                    address,
                    kind: ProxyKind::Eip1967Transparent,
                    implementation: Some(address_from_word(impl_slot)),
                    beacon: None,
                    admin,
                    nested_chain: vec![],
                    method: "EIP-1967 implementation slot".to_string(),
                    confidence: 1.0,
                });
            }
        }

        if let Ok(beacon_slot) = self.chain.storage(address, EIP1967_BEACON_SLOT, block).await {
            if !is_zero(beacon_slot) {
                let beacon = address_from_word(beacon_slot);
                let implementation = self.call_address_getter(beacon, block, "implementation()", [0x5c, 0x60, 0xda, 0x1b]).await;
                return Some(ProxyInfo {
                    address,
                    kind: ProxyKind::Eip1967Beacon,
                    implementation,
                    beacon: Some(beacon),
                    admin: None,
                    nested_chain: vec![],
                    method: "EIP-1967 beacon slot".to_string(),
                    confidence: 1.0,
                });
            }
        }

        None
    }

    async fn try_eip1167(&self, address: Address, block: Option<u64>) -> Option<ProxyInfo> {
        let code = self.chain.code(address, block).await.ok()?;
        if code.len() != 45 {
            return None;
        }
        if code[..10] != EIP1167_PREFIX || code[30..45] != EIP1167_SUFFIX {
            return None;
        }
        let implementation = Address::from_slice(&code[10..30]);
        Some(ProxyInfo {
            address,
            kind: ProxyKind::Eip1167Minimal,
            implementation: Some(implementation),
            beacon: None,
            admin: None,
            nested_chain: vec![],
            method: "EIP-1167 minimal-proxy bytecode".to_string(),
            confidence: 1.0,
        })
    }

    async fn try_custom_slots(&self, address: Address, block: Option<u64>) -> Option<ProxyInfo> {
        for slot in CUSTOM_IMPL_SLOTS {
            if let Ok(word) = self.chain.storage(address, *slot, block).await {
                if !is_zero(word) {
                    return Some(ProxyInfo {
                        address,
                        kind: ProxyKind::CustomSlot,
                        implementation: Some(address_from_word(word)),
                        beacon: None,
                        admin: None,
                        nested_chain: vec![],
                        method: format!("custom slot {slot:#x}"),
                        confidence: 0.8,
                    });
                }
            }
        }
        None
    }

    async fn try_implementation_function(
        &self,
        address: Address,
        block: Option<u64>,
    ) -> Option<ProxyInfo> {
        for (name, sel) in IMPLEMENTATION_GETTERS {
            if let Some(implementation) = self.call_address_getter(address, block, name, *sel).await
            {
                if self.chain.code(implementation, block).await.map(|c| !c.is_empty()).unwrap_or(false)
                {
                    return Some(ProxyInfo {
                        address,
                        kind: ProxyKind::Uups,
                        implementation: Some(implementation),
                        beacon: None,
                        admin: None,
                        nested_chain: vec![],
                        method: format!("implementation getter `{name}`"),
                        confidence: 0.9,
                    });
                }
            }
        }
        None
    }

    async fn call_address_getter(
        &self,
        target: Address,
        block: Option<u64>,
        _name: &str,
        selector: [u8; 4],
    ) -> Option<Address> {
        let result = self.chain.call(target, Bytes::from(selector.to_vec()), block).await.ok()?;
        if result.len() < 32 {
            return None;
        }
        let word = B256::from_slice(&result[result.len() - 32..]);
        if is_zero(word) {
            None
        } else {
            Some(address_from_word(word))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip1167_prefix_and_suffix_lengths_sum_to_45() {
        assert_eq!(EIP1167_PREFIX.len() + 20 + EIP1167_SUFFIX.len(), 45);
    }

    #[test]
    fn address_from_word_takes_last_20_bytes() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0xAB; 20]);
        let addr = address_from_word(B256::from(word));
        assert_eq!(addr.as_slice(), &[0xAB; 20]);
    }
}
