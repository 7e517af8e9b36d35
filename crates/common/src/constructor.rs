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

//! Extracts and decodes constructor arguments from creation bytecode.
//!
//! ABI-driven decoding is tried first when a `constructor` ABI entry is available, falling back
//! to a word-classification heuristic otherwise. Decoding never fails outright — at worst
//! `decoded_with_abi` is `false` and only `raw_args` survives.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// One decoded constructor parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorParam {
    /// Parameter name, or a positional placeholder (`arg0`, `arg1`, …) when unnamed.
    pub name: String,
    /// Solidity-ish type label (`address`, `uint256`, `bool`, `uint8`, `bytes32`, …).
    pub ty: String,
    /// Decoded value, rendered as a display string (addresses checksum-formatted, ints decimal).
    pub value: String,
    /// The raw 32-byte word this parameter was decoded from, hex-encoded.
    pub raw_hex: String,
}

/// The result of decoding one address's constructor arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorInfo {
    /// The contract address.
    pub address: Address,
    /// The creation transaction hash, if known.
    pub creation_tx: Option<B256>,
    /// The deployer (`from`) of the creation transaction, if known.
    pub deployer: Option<Address>,
    /// The block the contract was created in, if known.
    pub block: Option<u64>,
    /// The raw constructor-argument bytes, exactly as extracted.
    pub raw_args: Bytes,
    /// Decoded parameters, in order.
    pub params: Vec<ConstructorParam>,
    /// Whether `params` came from ABI-driven decoding (`true`) or the heuristic (`false`).
    pub decoded_with_abi: bool,
}

/// Extracts the constructor-argument suffix from a creation transaction's `input`, given the
/// contract's currently deployed (runtime) code.
///
/// The creation `input` is `initcode || constructor_args`. Since `initcode` itself embeds
/// `deployed_code` plus constructor logic, we can't know the exact initcode/args boundary without
/// a full disassembly; the heuristic instead takes `input.len() - deployed_code.len()` as the
/// tail length and rounds it down to a 32-byte boundary — that tail is treated as the
/// constructor-argument blob.
pub fn extract_raw_args(creation_input: &[u8], deployed_code: &[u8]) -> Bytes {
    if creation_input.len() <= deployed_code.len() {
        return Bytes::new();
    }

    // Round down to a 32-byte-aligned length.
    let mut tail_len = creation_input.len() - deployed_code.len();
    tail_len -= tail_len % 32;
    if tail_len == 0 {
        return Bytes::new();
    }
    Bytes::copy_from_slice(&creation_input[creation_input.len() - tail_len..])
}

/// Decodes `raw_args` against a constructor ABI entry, if one is present in `abi`.
fn decode_with_abi(abi: &JsonAbi, raw_args: &[u8]) -> Option<Vec<ConstructorParam>> {
    let ctor = abi.constructor.as_ref()?;
    let types: Vec<DynSolType> = ctor
        .inputs
        .iter()
        .map(|p| p.selector_type().parse::<DynSolType>())
        .collect::<Result<_, _>>()
        .ok()?;
    if types.is_empty() {
        return Some(vec![]);
    }
    let tuple_ty = DynSolType::Tuple(types);
    let decoded = tuple_ty.abi_decode_params(raw_args).ok()?;
    let DynSolValue::Tuple(values) = decoded else { return None };

    Some(
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let name = ctor
                    .inputs
                    .get(i)
                    .map(|p| p.name.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("arg{i}"));
                let ty = ctor.inputs.get(i).map(|p| p.ty.clone()).unwrap_or_default();
                ConstructorParam {
                    name,
                    ty,
                    value: display_value(&value),
                    raw_hex: hex::encode(value.abi_encode()),
                }
            })
            .collect(),
    )
}

fn display_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(a) => a.to_string(),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::FixedBytes(b, _) => format!("0x{}", hex::encode(b)),
        other => format!("{other:?}"),
    }
}

/// Classifies a single 32-byte word using a simple heuristic: likely address, small integer,
/// zero, or raw bytes.
fn classify_word(word: &[u8; 32]) -> (String, String) {
    let leading_zero = word[..12].iter().all(|b| *b == 0);
    let tail_nonzero = word[12..].iter().any(|b| *b != 0);
    if leading_zero && tail_nonzero {
        let addr = Address::from_slice(&word[12..]);
        return ("address".to_string(), addr.to_string());
    }

    let value = alloy_primitives::U256::from_be_bytes(*word);
    if value.is_zero() {
        ("uint256".to_string(), "0".to_string())
    } else if value == alloy_primitives::U256::from(1) {
        ("bool".to_string(), "true".to_string())
    } else if value < alloy_primitives::U256::from(256) {
        ("uint8".to_string(), value.to_string())
    } else if value < alloy_primitives::U256::from(10_001) {
        ("uint256".to_string(), value.to_string())
    } else if value <= alloy_primitives::U256::from(u128::MAX) {
        ("uint256".to_string(), value.to_string())
    } else {
        ("bytes32".to_string(), format!("0x{}", hex::encode(word)))
    }
}

/// Runs the heuristic word-classifying decoder over `raw_args`. Never fails: words that don't
/// divide evenly into 32 bytes are dropped from the tail.
fn decode_heuristic(raw_args: &[u8]) -> Vec<ConstructorParam> {
    raw_args
        .chunks_exact(32)
        .enumerate()
        .map(|(i, chunk)| {
            let word: [u8; 32] = chunk.try_into().expect("chunks_exact(32)");
            let (ty, value) = classify_word(&word);
            ConstructorParam { name: format!("arg{i}"), ty, value, raw_hex: hex::encode(chunk) }
        })
        .collect()
}

/// Builds a [`ConstructorInfo`] from the already-fetched creation input, deployed code, and
/// (optional) ABI. This never returns an error: on any decoding trouble `decoded_with_abi` is
/// `false` and `params` comes from the heuristic (possibly empty).
pub fn decode_constructor(
    address: Address,
    creation_tx: Option<B256>,
    deployer: Option<Address>,
    block: Option<u64>,
    creation_input: &[u8],
    deployed_code: &[u8],
    abi: Option<&JsonAbi>,
) -> ConstructorInfo {
    let raw_args = extract_raw_args(creation_input, deployed_code);

    if let Some(abi) = abi {
        if let Some(params) = decode_with_abi(abi, &raw_args) {
            return ConstructorInfo {
                address,
                creation_tx,
                deployer,
                block,
                raw_args,
                params,
                decoded_with_abi: true,
            };
        }
    }

    let params = decode_heuristic(&raw_args);
    ConstructorInfo { address, creation_tx, deployer, block, raw_args, params, decoded_with_abi: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_raw_args_takes_32_byte_aligned_tail() {
        let deployed = vec![0u8; 10];
        let mut creation = vec![0xAAu8; 10 + 32];
        creation[10..].copy_from_slice(&[1u8; 32]);
        let args = extract_raw_args(&creation, &deployed);
        assert_eq!(args.len(), 32);
        assert_eq!(&args[..], &[1u8; 32]);
    }

    #[test]
    fn classify_word_detects_address() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0x11; 20]);
        let (ty, _) = classify_word(&word);
        assert_eq!(ty, "address");
    }

    #[test]
    fn classify_word_small_value_is_uint8() {
        let mut word = [0u8; 32];
        word[31] = 42;
        let (ty, value) = classify_word(&word);
        assert_eq!(ty, "uint8");
        assert_eq!(value, "42");
    }

    #[test]
    fn decode_constructor_never_fails_without_abi() {
        let raw = vec![0u8; 32];
        let info = decode_constructor(Address::ZERO, None, None, None, &raw, &[], None);
        assert!(!info.decoded_with_abi);
        assert_eq!(info.params.len(), 1);
    }

    #[test]
    fn idempotent_decoding_is_byte_equal() {
        let deployed = vec![0u8; 4];
        let mut creation = vec![0u8; 4 + 64];
        creation[4..36].copy_from_slice(&[2u8; 32]);
        creation[36..].copy_from_slice(&[3u8; 32]);
        let a = decode_constructor(Address::ZERO, None, None, None, &creation, &deployed, None);
        let b = decode_constructor(Address::ZERO, None, None, None, &creation, &deployed, None);
        assert_eq!(a.raw_args, b.raw_args);
        assert_eq!(a.params.len(), b.params.len());
    }
}
