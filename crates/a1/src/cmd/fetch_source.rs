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

//! `a1 fetch-source`: fetches and prints/saves a contract's verified source.

use std::path::PathBuf;
use std::sync::Arc;

use a1_common::cache::Cache;
use a1_common::explorer::ExplorerReader;
use a1_common::settings::Settings;
use alloy_primitives::Address;
use eyre::Result;

pub async fn fetch_source(address: Address, chain_id: u64, output: Option<PathBuf>) -> Result<()> {
    let settings = Settings::from_env();
    let cache = Arc::new(Cache::new(settings.cache_dir, Some(settings.cache_ttl))?);
    let api_key = Settings::explorer_api_key(chain_id);
    let explorer = ExplorerReader::new(chain_id, api_key, cache)?;

    let info = match explorer.get_source(address).await {
        Ok(info) => info,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("Contract: {}", info.contract_name);
    println!("Compiler: {}", info.compiler_version);
    println!("Files: {}", info.source_files.len());

    if let Some(output) = output {
        std::fs::create_dir_all(&output)?;
        for (path, content) in &info.source_files {
            let file_name = path.replace('/', "_");
            std::fs::write(output.join(file_name), content)?;
        }
        println!("\nSaved to: {}", output.display());
    } else if let Some((path, content)) = info.source_files.iter().next() {
        println!("\n--- {path} ---");
        let preview: String = content.chars().take(3000).collect();
        println!("{preview}");
        if content.len() > 3000 {
            println!("... (truncated)");
        }
    }

    Ok(())
}
