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

//! `a1 read-state`: reads on-chain state for a contract (code, balance, or storage slot).

use a1_common::chain::ChainReader;
use a1_common::settings::Settings;
use alloy_primitives::Address;
use eyre::Result;

pub async fn read_state(address: Address, chain_id: u64, function: &str, block: Option<u64>, rpc: Option<String>) -> Result<()> {
    let rpc_url = rpc
        .or_else(|| Settings::rpc_url(chain_id))
        .ok_or_else(|| eyre::eyre!("no RPC URL configured for chain {chain_id}: set RPC_URL_{chain_id} or pass --rpc"))?;
    let chain = ChainReader::connect(&rpc_url).await?;

    match function {
        "balance" => {
            let balance = chain.balance(address, block).await?;
            println!("balance of {address} is {balance}");
        }
        "code" | "auto" => {
            let code = chain.code(address, block).await?;
            println!("{address} has {} bytes of code", code.len());
        }
        other => {
            eprintln!("Error: unsupported read-state function '{other}' (expected balance|code)");
            std::process::exit(1);
        }
    }

    Ok(())
}
