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

//! Normalizes a set of per-token balance deltas into a single base-token-denominated profit
//! figure.
//!
//! The base token passes through unpriced, a surplus of any other token is valued via an exact-in
//! quote (falling back to zero when no quote exists — a token nobody can sell is worth nothing),
//! and a deficit is valued via an exact-out quote of what it would cost to *replace* the missing
//! balance, with a fixed sentinel (`-2^128`) marking an unpriceable deficit so it is never summed
//! as a real magnitude.

use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{chain::ChainReader, chain_spec::ChainSpec, dex::DexQuoter};

/// Sentinel value for a deficit that could not be priced. Chosen to be far outside any plausible
/// real deficit so it is visually and numerically obvious, and is never folded into aggregate
/// sums.
pub fn unpriceable_deficit_sentinel() -> I256 {
    -(I256::from_raw(U256::from(1u8) << 128))
}

/// Failure modes of profit computation. Profit computation itself does not fail — this exists for
/// plumbing errors encountered while gathering token metadata.
#[derive(Debug, Error)]
pub enum ProfitError {
    /// The underlying chain call failed while fetching token decimals/balances.
    #[error("chain error: {0}")]
    Chain(String),
}

/// One token's net balance change, in raw (non-decimal-adjusted) units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDelta {
    /// The token contract address (the base token itself is a valid entry).
    pub token: Address,
    /// Signed raw delta: positive is a surplus, negative is a deficit.
    pub delta: I256,
    /// This delta's value in base-token units, after classification and quoting.
    pub base_value: I256,
    /// Whether `base_value` could be computed from a live quote (`false` ⇒ zero or sentinel).
    pub priced: bool,
}

/// The full profit report for one simulated execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitReport {
    /// Per-token deltas and their base-token valuations.
    pub deltas: Vec<TokenDelta>,
    /// The base token's own delta plus the value of every priced surplus (non-base, positive
    /// `base_value`) entry.
    pub gross: I256,
    /// Sum of all `base_value`s, positive and negative.
    pub net: I256,
    /// Alias for `net`, kept for parity with the raw-sum naming used upstream.
    pub raw: I256,
    /// `net > 0` and no deficit hit the unpriceable sentinel.
    pub is_profitable: bool,
    /// `true` iff every token with a nonzero starting balance also appears with a non-negative
    /// ending balance, i.e. no token was drained below its starting balance without being priced.
    pub all_balances_preserved: bool,
    /// `1.0` if every delta was priced, scaling down by the fraction of unpriced deltas.
    pub confidence: f64,
}

/// Computes base-token-normalized profit over a set of simulated balance deltas.
pub struct ProfitOracle<'a> {
    chain: &'a ChainReader,
    spec: &'a ChainSpec,
}

impl<'a> ProfitOracle<'a> {
    /// New oracle for `chain`/`spec`.
    pub fn new(chain: &'a ChainReader, spec: &'a ChainSpec) -> Self {
        Self { chain, spec }
    }

    /// Classifies and values every entry in `deltas`, then aggregates.
    pub async fn evaluate(
        &self,
        deltas: &[(Address, I256)],
        block: Option<u64>,
    ) -> Result<ProfitReport, ProfitError> {
        let quoter = DexQuoter::new(self.chain, self.spec);
        let mut out = Vec::with_capacity(deltas.len());
        let mut unpriced = 0usize;

        for (token, delta) in deltas {
            let (base_value, priced) = if *token == self.spec.base_token {
                (*delta, true)
            } else if delta.is_zero() {
                (I256::ZERO, true)
            } else if delta.is_positive() {
                let amount = i256_to_u256_abs(*delta);
                match quoter.get_quote(*token, self.spec.base_token, amount, block).await {
                    Ok(quote) => (u256_to_i256(quote.amount_out), true),
                    Err(_) => (I256::ZERO, false),
                }
            } else {
                let amount = i256_to_u256_abs(*delta);
                match quoter.get_quote_exact_out(self.spec.base_token, *token, amount, block).await
                {
                    Ok(quote) => (-u256_to_i256(quote.amount_in), true),
                    Err(_) => (unpriceable_deficit_sentinel(), false),
                }
            };

            if !priced {
                unpriced += 1;
            }
            out.push(TokenDelta { token: *token, delta: *delta, base_value, priced });
        }

        let base_delta = out.iter().find(|d| d.token == self.spec.base_token).map(|d| d.base_value).unwrap_or(I256::ZERO);
        let surplus_value: I256 = out
            .iter()
            .filter(|d| d.token != self.spec.base_token && d.base_value.is_positive())
            .map(|d| d.base_value)
            .fold(I256::ZERO, |a, b| a + b);
        let gross = base_delta + surplus_value;
        let net: I256 = out.iter().map(|d| d.base_value).fold(I256::ZERO, |a, b| a + b);
        let sentinel = unpriceable_deficit_sentinel();
        let has_sentinel = out.iter().any(|d| d.base_value == sentinel);
        let all_balances_preserved = out.iter().all(|d| d.delta >= I256::ZERO);
        let confidence = if out.is_empty() {
            1.0
        } else {
            1.0 - (unpriced as f64 / out.len() as f64)
        };

        Ok(ProfitReport {
            deltas: out,
            gross,
            net,
            raw: net,
            is_profitable: net.is_positive() && !has_sentinel,
            all_balances_preserved,
            confidence,
        })
    }
}

fn i256_to_u256_abs(value: I256) -> U256 {
    if value.is_negative() {
        (-value).into_raw()
    } else {
        value.into_raw()
    }
}

fn u256_to_i256(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_large_negative() {
        let sentinel = unpriceable_deficit_sentinel();
        assert!(sentinel.is_negative());
        assert!(sentinel < I256::try_from(i64::MIN).unwrap());
    }

    #[test]
    fn i256_to_u256_abs_handles_negative() {
        let v = I256::try_from(-42i64).unwrap();
        assert_eq!(i256_to_u256_abs(v), U256::from(42));
    }
}
