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

//! Wires up the shared `a1-common` clients every subcommand needs, reading chain/explorer
//! credentials the way `Settings::from_env` documents them.

use std::sync::Arc;

use a1_common::cache::Cache;
use a1_common::chain::ChainReader;
use a1_common::chain_spec::{ChainRegistry, ChainSpec};
use a1_common::explorer::ExplorerReader;
use a1_common::settings::Settings;
use eyre::{eyre, Result};

/// The live clients a single invocation needs against one chain.
pub struct Clients {
    pub chain: ChainReader,
    pub explorer: ExplorerReader,
    pub spec: ChainSpec,
    pub cache: Arc<Cache>,
}

/// Connects to `chain_id`, resolving the RPC URL from `rpc_override` or `RPC_URL_<chain_id>`.
pub async fn connect(chain_id: u64, rpc_override: Option<String>, settings: &Settings) -> Result<Clients> {
    let rpc_url = rpc_override
        .or_else(|| Settings::rpc_url(chain_id))
        .ok_or_else(|| eyre!("no RPC URL configured for chain {chain_id}: set RPC_URL_{chain_id} or pass --rpc"))?;

    let cache = Arc::new(Cache::new(settings.cache_dir.clone(), Some(settings.cache_ttl))?);
    let chain = ChainReader::connect(&rpc_url).await?;

    let api_key = Settings::explorer_api_key(chain_id);
    let explorer = ExplorerReader::new(chain_id, api_key, Arc::clone(&cache))?;

    let registry = ChainRegistry::with_defaults();
    let spec = registry.get(chain_id)?.clone();

    Ok(Clients { chain, explorer, spec, cache })
}
