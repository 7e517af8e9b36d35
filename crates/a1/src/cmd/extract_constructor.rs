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

//! `a1 extract-constructor`: decodes a deployed contract's constructor arguments.

use a1_common::constructor::decode_constructor;
use a1_common::settings::Settings;
use alloy_primitives::Address;
use eyre::Result;

use crate::context;

pub async fn extract_constructor(address: Address, chain_id: u64, block: Option<u64>, rpc: Option<String>) -> Result<()> {
    let settings = Settings::from_env();
    let clients = context::connect(chain_id, rpc, &settings).await?;

    let creation = clients.explorer.get_creation_tx(address).await?;
    let creation_input = clients.chain.transaction_input(creation.tx_hash).await?;
    let deployed_code = clients.chain.code(address, block).await?;
    let source = clients.explorer.get_source(address).await.ok();
    let abi = source.as_ref().and_then(|s| s.abi.as_ref());

    let info = decode_constructor(
        address,
        Some(creation.tx_hash),
        Some(creation.creator),
        block,
        &creation_input,
        &deployed_code,
        abi,
    );

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
