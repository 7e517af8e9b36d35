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

//! Temporary `forge` project scaffolding for [`crate::fork_executor`].
//!
//! Each execution gets its own `tempfile::TempDir` holding a minimal `forge` project: the
//! Strategy source, a generated test harness, and the scaffolding `forge test` needs to run it.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use tempfile::TempDir;

use crate::error::EdbA1Error;

/// Strategy harness written into `test/Execute.t.sol`; emits the wire-level events and log
/// literals the parser in [`crate::fork_executor`] depends on.
fn generate_test_source(base_token: Address, tracked_tokens: &[Address], initial_balance: &str) -> String {
    let tokens_array = if tracked_tokens.is_empty() {
        "new address[](0)".to_string()
    } else {
        let items = tracked_tokens.iter().map(|a| format!("address({a})")).collect::<Vec<_>>().join(", ");
        format!("[{items}]")
    };

    format!(
        r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

import "forge-std/Test.sol";
import "../src/Strategy.sol";

interface IERC20 {{
    function balanceOf(address) external view returns (uint256);
}}

contract ExecuteTest is Test {{
    address constant BASE_TOKEN = {base_token};

    Strategy public strategy;

    address[] public trackedTokens;
    mapping(address => uint256) public balancesBefore;

    event BalanceChange(address token, int256 delta);
    event ExecutionResult(bool success, string reason, int256 profit);

    function setUp() public {{
        strategy = new Strategy();
        vm.deal(address(strategy), {initial_balance});

        address[] memory tokens = {tokens_array};
        for (uint i = 0; i < tokens.length; i++) {{
            trackedTokens.push(tokens[i]);
        }}
        trackedTokens.push(BASE_TOKEN);
    }}

    function test_Execute() public {{
        for (uint i = 0; i < trackedTokens.length; i++) {{
            address token = trackedTokens[i];
            balancesBefore[token] = IERC20(token).balanceOf(address(strategy));
        }}
        uint256 ethBefore = address(strategy).balance;

        bool success;
        string memory reason;
        try strategy.run() {{
            success = true;
        }} catch Error(string memory r) {{
            success = false;
            reason = r;
        }} catch {{
            success = false;
            reason = "Unknown error";
        }}

        int256 totalProfit = 0;
        for (uint i = 0; i < trackedTokens.length; i++) {{
            address token = trackedTokens[i];
            uint256 balanceAfter = IERC20(token).balanceOf(address(strategy));
            int256 delta = int256(balanceAfter) - int256(balancesBefore[token]);
            emit BalanceChange(token, delta);

            if (token == BASE_TOKEN) {{
                totalProfit += delta;
            }}
        }}

        int256 ethDelta = int256(address(strategy).balance) - int256(ethBefore);
        emit BalanceChange(address(0), ethDelta);

        emit ExecutionResult(success, reason, totalProfit);

        if (success) {{
            console.log("Execution: SUCCESS");
        }} else {{
            console.log("Execution: FAILED");
            console.log("Reason:", reason);
        }}
        console.log("Profit (base token):");
        console.logInt(totalProfit);
    }}
}}
"#
    )
}

const FOUNDRY_TOML: &str = r#"[profile.default]
src = "src"
out = "out"
libs = ["lib"]
solc = "0.8.20"
evm_version = "paris"
"#;

/// A materialized `forge` project, alive for as long as this value is held.
pub struct ForkWorkspace {
    dir: TempDir,
}

impl ForkWorkspace {
    /// Builds a fresh `src/`, `test/`, `lib/` project under a new temp directory, seeding
    /// `forge-std` from `forge_std_path` (an already-installed copy on disk).
    pub fn materialize(
        strategy_source: &str,
        base_token: Address,
        tracked_tokens: &[Address],
        initial_balance: &str,
        forge_std_path: Option<&Path>,
    ) -> Result<Self, EdbA1Error> {
        let dir = TempDir::with_prefix("a1_exec_")
            .map_err(|e| EdbA1Error::Toolchain(format!("failed to create workspace: {e}")))?;
        let root = dir.path();

        std::fs::create_dir_all(root.join("src"))
            .map_err(|e| EdbA1Error::Toolchain(e.to_string()))?;
        std::fs::create_dir_all(root.join("test"))
            .map_err(|e| EdbA1Error::Toolchain(e.to_string()))?;
        std::fs::create_dir_all(root.join("lib"))
            .map_err(|e| EdbA1Error::Toolchain(e.to_string()))?;

        let Some(forge_std_path) = forge_std_path else {
            return Err(EdbA1Error::Toolchain("forge-std not configured (lib_missing)".to_string()));
        };
        if !forge_std_path.exists() {
            return Err(EdbA1Error::Toolchain(format!(
                "forge-std not found at {} (lib_missing)",
                forge_std_path.display()
            )));
        }
        copy_dir_recursive(forge_std_path, &root.join("lib").join("forge-std"))
            .map_err(|e| EdbA1Error::Toolchain(format!("failed to seed forge-std: {e}")))?;

        std::fs::write(root.join("foundry.toml"), FOUNDRY_TOML)
            .map_err(|e| EdbA1Error::Toolchain(e.to_string()))?;
        std::fs::write(root.join("src").join("Strategy.sol"), strategy_source)
            .map_err(|e| EdbA1Error::Toolchain(e.to_string()))?;

        let test_source = generate_test_source(base_token, tracked_tokens, initial_balance);
        std::fs::write(root.join("test").join("Execute.t.sol"), test_source)
            .map_err(|e| EdbA1Error::Toolchain(e.to_string()))?;

        Ok(Self { dir })
    }

    /// Root directory of the materialized project.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let dst_path = dst.join(entry.file_name());
        if ty.is_dir() {
            copy_dir_recursive(&entry.path(), &dst_path)?;
        } else {
            std::fs::copy(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}

/// Resolves the `forge` binary's path, preferring `FORGE_BIN` then the search path's `forge`.
pub fn forge_binary() -> PathBuf {
    std::env::var("FORGE_BIN").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("forge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_fails_without_forge_std() {
        let result =
            ForkWorkspace::materialize("contract Strategy {}", Address::ZERO, &[], "0", None);
        assert!(result.is_err());
    }

    #[test]
    fn generated_test_embeds_wire_protocol_literals() {
        let source = generate_test_source(Address::ZERO, &[], "100");
        assert!(source.contains("event BalanceChange(address token, int256 delta)"));
        assert!(source.contains("Execution: SUCCESS"));
        assert!(source.contains("Execution: FAILED"));
        assert!(source.contains("Profit (base token):"));
    }
}
