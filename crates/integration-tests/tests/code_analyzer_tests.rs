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

//! Parsing, dependency closure extraction, and sanitization over a small multi-contract source.

use a1_common::code_analyzer as code;
use a1_integration_tests::init::init_test_logging;

const SOURCE: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

import "./IVault.sol";

interface IVault {
    function withdraw(uint256 amount) external;
}

contract Base {
    uint256 internal total;

    function note(uint256 amount) internal {
        total += amount;
    }
}

contract Strategy is Base {
    IVault public vault;

    // run the exploit
    function run() external {
        vault.withdraw(1);
        note(1);
    }
}
"#;

#[test]
fn parses_entities_in_source_order() {
    init_test_logging();
    let parsed = code::parse(SOURCE);

    assert_eq!(parsed.entity_order, vec!["IVault", "Base", "Strategy"]);
    assert_eq!(parsed.pragma.as_deref(), Some("^0.8.20"));

    let strategy = parsed.entities.get("Strategy").expect("Strategy entity");
    assert_eq!(strategy.inherits, vec!["Base"]);
    assert!(strategy.functions.contains(&"run".to_string()));
}

#[test]
fn extract_minimal_pulls_in_the_full_inheritance_and_usage_closure() {
    init_test_logging();
    let parsed = code::parse(SOURCE);

    let minimal = code::extract_minimal(&parsed, "Strategy").expect("Strategy resolves");
    assert!(minimal.contains("contract Strategy"));
    assert!(minimal.contains("contract Base"), "Base must be pulled in via inheritance");
    assert!(minimal.contains("interface IVault"), "IVault must be pulled in via field usage");
}

#[test]
fn sanitize_strips_comments_without_touching_entity_bodies() {
    init_test_logging();
    let sanitized = code::sanitize(SOURCE, code::SanitizeOptions::default());

    assert!(!sanitized.contains("// run the exploit"));
    assert!(sanitized.contains("function run() external"));

    let reparsed = code::parse(&sanitized);
    assert_eq!(reparsed.entity_order, vec!["IVault", "Base", "Strategy"]);
}
