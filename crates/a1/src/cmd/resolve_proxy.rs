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

//! `a1 resolve-proxy`: runs proxy-pattern detection against a single address.

use a1_common::chain::ChainReader;
use a1_common::proxy::ProxyResolver;
use a1_common::settings::Settings;
use alloy_primitives::Address;
use eyre::Result;

pub async fn resolve_proxy(
    address: Address,
    chain_id: u64,
    block: Option<u64>,
    nested: bool,
    rpc: Option<String>,
) -> Result<()> {
    let rpc_url = rpc
        .or_else(|| Settings::rpc_url(chain_id))
        .ok_or_else(|| eyre::eyre!("no RPC URL configured for chain {chain_id}: set RPC_URL_{chain_id} or pass --rpc"))?;
    let chain = ChainReader::connect(&rpc_url).await?;

    let resolver = ProxyResolver::new(&chain);
    let info = resolver.resolve(address, block, nested).await;

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
