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

//! Multi-DEX, multi-hop best-quote oracle for token swaps.
//!
//! Direct and 2-hop paths are enumerated across every configured DEX for the chain, and the best
//! (maximal exact-in / minimal exact-out) quote wins.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::{abi, chain::ChainReader, chain_spec::ChainSpec};

/// Failure modes for quote discovery.
#[derive(Debug, Error)]
pub enum DexError {
    /// No configured DEX returned a usable quote along any enumerated path.
    #[error("no usable quote for the requested pair")]
    NoQuote,
    /// The underlying chain call failed.
    #[error("chain error: {0}")]
    Chain(String),
}

/// A single discovered quote.
#[derive(Debug, Clone)]
pub struct SwapQuote {
    /// Input token.
    pub token_in: Address,
    /// Output token.
    pub token_out: Address,
    /// Input amount (wei-equivalent units).
    pub amount_in: U256,
    /// Output amount.
    pub amount_out: U256,
    /// The hop path taken, `[in, ..., out]`.
    pub path: Vec<Address>,
    /// Name of the DEX that produced this quote.
    pub dex: String,
    /// Approximate price impact: `feeBps/10000 * len(path)`.
    pub price_impact: f64,
    /// `amount_out / amount_in` as a float, for display.
    pub effective_price: f64,
}

/// Reserves for a single pair, oriented by `token0()`.
#[derive(Debug, Clone)]
pub struct PairReserves {
    /// Reserve of the first queried token.
    pub reserve_a: U256,
    /// Reserve of the second queried token.
    pub reserve_b: U256,
    /// Timestamp of the last reserve update, per `getReserves()`.
    pub block_timestamp: u32,
}

/// Best-quote discovery over a chain's registered DEXes.
pub struct DexQuoter<'a> {
    chain: &'a ChainReader,
    spec: &'a ChainSpec,
}

impl<'a> DexQuoter<'a> {
    /// New quoter over `chain`'s registered DEXes.
    pub fn new(chain: &'a ChainReader, spec: &'a ChainSpec) -> Self {
        Self { chain, spec }
    }

    fn candidate_paths(&self, token_in: Address, token_out: Address) -> Vec<Vec<Address>> {
        let mut paths = vec![vec![token_in, token_out]];
        for hop in &self.spec.intermediates {
            if *hop != token_in && *hop != token_out {
                paths.push(vec![token_in, *hop, token_out]);
            }
        }
        paths
    }

    async fn call_amounts(
        &self,
        router: Address,
        sig: &str,
        amount: U256,
        path: &[Address],
        block: Option<u64>,
    ) -> Option<Vec<U256>> {
        let path_value =
            DynSolValue::Array(path.iter().map(|a| DynSolValue::Address(*a)).collect());
        let args = [DynSolValue::Uint(amount, 256), path_value];
        let data = abi::encode_call(sig, &args).ok()?;
        let result = self.chain.call(router, data, block).await.ok()?;
        let decoded = abi::decode_result(sig, &result, None).ok()?;
        let DynSolValue::Array(values) = decoded.into_iter().next()? else { return None };
        values
            .into_iter()
            .map(|v| match v {
                DynSolValue::Uint(u, _) => Some(u),
                _ => None,
            })
            .collect()
    }

    /// Exact-in quote: given `amount_in` of `token_in`, find the DEX/path maximizing `amount_out`.
    pub async fn get_quote(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        block: Option<u64>,
    ) -> Result<SwapQuote, DexError> {
        let mut best: Option<SwapQuote> = None;

        for dex in &self.spec.dexes {
            for path in self.candidate_paths(token_in, token_out) {
                let Some(amounts) = self
                    .call_amounts(dex.router, "getAmountsOut(uint256,address[])", amount_in, &path, block)
                    .await
                else {
                    continue;
                };
                let Some(amount_out) = amounts.last().copied() else { continue };
                if best.as_ref().is_none_or(|b| amount_out > b.amount_out) {
                    best = Some(SwapQuote {
                        token_in,
                        token_out,
                        amount_in,
                        amount_out,
                        price_impact: dex.fee_bps as f64 / 10_000.0 * path.len() as f64,
                        effective_price: ratio(amount_out, amount_in),
                        path,
                        dex: dex.name.clone(),
                    });
                }
            }
        }

        best.ok_or(DexError::NoQuote)
    }

    /// Exact-out quote: given `amount_out` of `token_out` desired, find the DEX/path minimizing
    /// the required `amount_in`.
    pub async fn get_quote_exact_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
        block: Option<u64>,
    ) -> Result<SwapQuote, DexError> {
        let mut best: Option<SwapQuote> = None;

        for dex in &self.spec.dexes {
            for path in self.candidate_paths(token_in, token_out) {
                let Some(amounts) = self
                    .call_amounts(dex.router, "getAmountsIn(uint256,address[])", amount_out, &path, block)
                    .await
                else {
                    continue;
                };
                let Some(amount_in) = amounts.first().copied() else { continue };
                if best.as_ref().is_none_or(|b| amount_in < b.amount_in) {
                    best = Some(SwapQuote {
                        token_in,
                        token_out,
                        amount_in,
                        amount_out,
                        price_impact: dex.fee_bps as f64 / 10_000.0 * path.len() as f64,
                        effective_price: ratio(amount_out, amount_in),
                        path,
                        dex: dex.name.clone(),
                    });
                }
            }
        }

        best.ok_or(DexError::NoQuote)
    }

    /// Finds a pair's reserves through `dex`'s factory (or the first configured DEX if `dex` is
    /// `None`), orienting `(reserveA, reserveB)` to match the `(a, b)` argument order using the
    /// pair's `token0()`.
    pub async fn pair_reserves(
        &self,
        a: Address,
        b: Address,
        dex: Option<&str>,
        block: Option<u64>,
    ) -> Result<PairReserves, DexError> {
        let dex_config = match dex {
            Some(name) => self.spec.dexes.iter().find(|d| d.name == name),
            None => self.spec.dexes.first(),
        }
        .ok_or(DexError::NoQuote)?;

        let args = [DynSolValue::Address(a), DynSolValue::Address(b)];
        let data = abi::encode_call("getPair(address,address)", &args)
            .map_err(|e| DexError::Chain(e.to_string()))?;
        let result = self
            .chain
            .call(dex_config.factory, data, block)
            .await
            .map_err(|e| DexError::Chain(e.to_string()))?;
        let decoded = abi::decode_result("getPair(address,address)", &result, None)
            .map_err(|e| DexError::Chain(e.to_string()))?;
        let Some(DynSolValue::Address(pair)) = decoded.into_iter().next() else {
            return Err(DexError::NoQuote);
        };
        if pair == Address::ZERO {
            return Err(DexError::NoQuote);
        }

        let reserves_data = self
            .chain
            .call(pair, abi::encode_call("getReserves()", &[]).unwrap(), block)
            .await
            .map_err(|e| DexError::Chain(e.to_string()))?;
        let reserves = abi::decode_result("getReserves()", &reserves_data, None)
            .map_err(|e| DexError::Chain(e.to_string()))?;

        let token0_data = self
            .chain
            .call(pair, abi::encode_call("token0()", &[]).unwrap(), block)
            .await
            .map_err(|e| DexError::Chain(e.to_string()))?;
        let token0 = match abi::decode_result("token0()", &token0_data, None).ok().and_then(|v| v.into_iter().next())
        {
            Some(DynSolValue::Address(t0)) => t0,
            _ => a,
        };

        let (reserve0, reserve1) = match (&reserves[0], &reserves[1]) {
            (DynSolValue::Uint(r0, _), DynSolValue::Uint(r1, _)) => (*r0, *r1),
            _ => return Err(DexError::NoQuote),
        };
        let block_timestamp = match reserves.get(2) {
            Some(DynSolValue::Uint(ts, _)) => ts.try_into().unwrap_or(0),
            _ => 0,
        };

        let (reserve_a, reserve_b) = if token0 == a { (reserve0, reserve1) } else { (reserve1, reserve0) };
        Ok(PairReserves { reserve_a, reserve_b, block_timestamp })
    }
}

fn ratio(numer: U256, denom: U256) -> f64 {
    if denom.is_zero() {
        0.0
    } else {
        let numer: f64 = numer.to_string().parse().unwrap_or(0.0);
        let denom: f64 = denom.to_string().parse().unwrap_or(1.0);
        numer / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_handles_zero_denominator() {
        assert_eq!(ratio(U256::from(5), U256::ZERO), 0.0);
    }
}
