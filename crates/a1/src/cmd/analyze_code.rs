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

//! `a1 analyze-code`: parses a Solidity source file, optionally extracting one entity's minimal
//! dependency closure, else printing a sanitized rendering.

use std::path::PathBuf;

use a1_common::code_analyzer as code;
use eyre::Result;

pub fn analyze_code(file: PathBuf, extract: Option<String>) -> Result<()> {
    let source = std::fs::read_to_string(&file)?;

    if let Some(target) = extract {
        let parsed = code::parse(&source);
        match code::extract_minimal(&parsed, &target) {
            Some(minimal) => println!("{minimal}"),
            None => {
                eprintln!("Error: entity '{target}' not found in {}", file.display());
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let parsed = code::parse(&source);
    println!("Contracts: {}", parsed.entities.len());
    for name in &parsed.entity_order {
        if let Some(entity) = parsed.entities.get(name) {
            println!("  - {} ({:?})", entity.name, entity.kind);
        }
    }

    let sanitized = code::sanitize(&source, code::SanitizeOptions::default());
    println!("\n--- sanitized ---");
    println!("{sanitized}");
    Ok(())
}
