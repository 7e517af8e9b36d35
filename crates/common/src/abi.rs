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

//! Function-selector computation, ABI encode/decode, and a per-address ABI cache.

use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{keccak256, Address, Bytes};
use dashmap::DashMap;
use thiserror::Error;

/// Failure modes for ABI operations. Decode failures are recovered locally rather than
/// propagated: callers fall back to `raw_result`/heuristics instead of matching on this enum in
/// the hot path.
#[derive(Debug, Error)]
pub enum AbiError {
    /// The signature string could not be parsed into a type list.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    /// Argument/return decoding failed against the inferred or supplied types.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Selector (first 4 bytes of `keccak256(signature)`).
pub type Selector = [u8; 4];

/// Computes the 4-byte selector of a function signature, e.g. `"transfer(address,uint256)"`.
pub fn selector(sig: &str) -> Selector {
    if let Some(known) = common_selector(sig) {
        return known;
    }
    let hash = keccak256(sig.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// A small built-in table of common signatures, short-circuiting the keccak computation for the
/// handful of view functions every tool in this crate calls constantly.
fn common_selector(sig: &str) -> Option<Selector> {
    let table: &[(&str, Selector)] = &[
        ("name()", [0x06, 0xfd, 0xde, 0x03]),
        ("symbol()", [0x95, 0xd8, 0x9b, 0x41]),
        ("decimals()", [0x31, 0x3c, 0xe5, 0x67]),
        ("totalSupply()", [0x18, 0x16, 0x0d, 0xdd]),
        ("balanceOf(address)", [0x70, 0xa0, 0x82, 0x31]),
        ("getReserves()", [0x09, 0x02, 0xf1, 0xac]),
        ("token0()", [0x0d, 0xfe, 0x16, 0x81]),
        ("token1()", [0xd2, 0x12, 0x20, 0xa7]),
        ("factory()", [0xc4, 0x5a, 0x01, 0x55]),
        ("WETH()", [0xad, 0x5c, 0x46, 0x48]),
    ];
    table.iter().find(|(s, _)| *s == sig).map(|(_, sel)| *sel)
}

/// Splits `"name(type1,type2,...)"` into the parenthesized type list.
fn parse_types(sig: &str) -> Result<Vec<DynSolType>, AbiError> {
    let open = sig.find('(').ok_or_else(|| AbiError::InvalidSignature(sig.to_string()))?;
    let close = sig.rfind(')').ok_or_else(|| AbiError::InvalidSignature(sig.to_string()))?;
    let inner = &sig[open + 1..close];
    if inner.trim().is_empty() {
        return Ok(vec![]);
    }
    inner
        .split(',')
        .map(|t| t.trim().parse::<DynSolType>().map_err(|e| AbiError::InvalidSignature(e.to_string())))
        .collect()
}

/// Encodes `args` as calldata for `sig`: `selector || abi.encode(args)`.
pub fn encode_call(sig: &str, args: &[DynSolValue]) -> Result<Bytes, AbiError> {
    let types = parse_types(sig)?;
    if types.len() != args.len() {
        return Err(AbiError::InvalidSignature(format!(
            "{sig} expects {} args, got {}",
            types.len(),
            args.len()
        )));
    }
    let tuple = DynSolValue::Tuple(args.to_vec());
    let mut out = selector(sig).to_vec();
    out.extend(tuple.abi_encode_params());
    Ok(Bytes::from(out))
}

/// Decodes `data` against `output_types` if supplied, else against a heuristic inference from
/// well-known signatures (falling back to a single `bytes32` word).
pub fn decode_result(
    sig: &str,
    data: &[u8],
    output_types: Option<&[DynSolType]>,
) -> Result<Vec<DynSolValue>, AbiError> {
    let inferred;
    let types: &[DynSolType] = if let Some(t) = output_types {
        t
    } else {
        inferred = infer_output_types(sig);
        &inferred
    };

    if types.is_empty() {
        return Ok(vec![]);
    }
    let tuple_ty = DynSolType::Tuple(types.to_vec());
    let decoded = tuple_ty.abi_decode_params(data).map_err(|e| AbiError::Decode(e.to_string()))?;
    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

fn infer_output_types(sig: &str) -> Vec<DynSolType> {
    match sig {
        "symbol()" | "name()" => vec![DynSolType::String],
        "decimals()" => vec![DynSolType::Uint(8)],
        "totalSupply()" | "balanceOf(address)" | "allowance(address,address)" => {
            vec![DynSolType::Uint(256)]
        }
        "factory()" | "token0()" | "token1()" | "WETH()" | "implementation()"
        | "getImplementation()" | "masterCopy()" | "childImplementation()" => {
            vec![DynSolType::Address]
        }
        "getReserves()" => vec![
            DynSolType::Uint(112),
            DynSolType::Uint(112),
            DynSolType::Uint(32),
        ],
        "getAmountsOut(uint256,address[])" | "getAmountsIn(uint256,address[])" => {
            vec![DynSolType::Array(Box::new(DynSolType::Uint(256)))]
        }
        "getPair(address,address)" => vec![DynSolType::Address],
        _ => vec![DynSolType::FixedBytes(32)],
    }
}

struct AddressAbiCache {
    abi: Option<JsonAbi>,
    selectors: DashMap<Selector, String>,
}

/// Per-address cache of fetched ABIs and selector→signature maps, feeding
/// [`AbiCodec::decode_input`].
#[derive(Default)]
pub struct AbiCodec {
    by_address: DashMap<Address, Arc<AddressAbiCache>>,
}

impl AbiCodec {
    /// New, empty codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the known ABI for `addr`, indexing every function by selector.
    pub fn cache_abi(&self, addr: Address, abi: JsonAbi) {
        let selectors = DashMap::new();
        for function in abi.functions() {
            selectors.insert(function.selector().0, function.signature());
        }
        self.by_address.insert(addr, Arc::new(AddressAbiCache { abi: Some(abi), selectors }));
    }

    /// The cached ABI for `addr`, if any.
    pub fn get_cached_abi(&self, addr: Address) -> Option<JsonAbi> {
        self.by_address.get(&addr).and_then(|e| e.abi.clone())
    }

    /// Resolves `calldata` against `addr`'s cached selector table, returning the matched
    /// signature and its decoded, named arguments.
    pub fn decode_input(
        &self,
        addr: Address,
        calldata: &[u8],
    ) -> Option<(String, Vec<DynSolValue>)> {
        if calldata.len() < 4 {
            return None;
        }
        let cache = self.by_address.get(&addr)?;
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&calldata[..4]);
        let sig = cache.selectors.get(&sel)?.clone();
        let abi = cache.abi.as_ref()?;
        let function = abi.functions().find(|f| f.signature() == sig)?;
        let input_types: Vec<DynSolType> = function
            .inputs
            .iter()
            .map(|p| p.selector_type().parse::<DynSolType>())
            .collect::<Result<_, _>>()
            .ok()?;
        let tuple_ty = DynSolType::Tuple(input_types);
        let decoded = tuple_ty.abi_decode_params(&calldata[4..]).ok()?;
        match decoded {
            DynSolValue::Tuple(values) => Some((sig, values)),
            other => Some((sig, vec![other])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_table() {
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn selector_falls_back_to_keccak() {
        // keccak256("foo()")[0..4]
        let sel = selector("foo()");
        assert_eq!(sel.len(), 4);
        assert_ne!(sel, [0, 0, 0, 0]);
    }

    #[test]
    fn encode_call_prefixes_selector() {
        let args = vec![DynSolValue::Address(Address::ZERO)];
        let data = encode_call("balanceOf(address)", &args).unwrap();
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(data.len(), 4 + 32);
    }
}
