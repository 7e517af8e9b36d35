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

//! Strategy-response parsing pipeline: extraction, validation, repair, re-validation.

use a1_engine::StrategyParser;
use a1_integration_tests::init::init_test_logging;

#[test]
fn malformed_response_is_repaired_into_a_valid_strategy() {
    init_test_logging();

    let response = r#"
Here is my analysis, followed by the strategy contract.

```solidity
contract Strategy is IStrategy {
    function run() external override {
        // drain the vault
    }
}
```
"#;

    let parsed = StrategyParser::parse(response).expect("response contains a fenced solidity block");
    assert_eq!(parsed.contract_name, "Strategy");
    assert!(parsed.has_run_function);

    let issues = StrategyParser::validate(&parsed);
    assert!(issues.iter().any(|i| i.contains("pragma")), "missing-pragma issue expected, got {issues:?}");

    let fixed = StrategyParser::fix_common_issues(&parsed.code);
    let reparsed = StrategyParser::parse(&format!("```solidity\n{fixed}\n```")).expect("fixed code still parses");
    let remaining = StrategyParser::validate(&reparsed);
    assert!(remaining.is_empty(), "expected a clean strategy after repair, found {remaining:?}");
}

#[test]
fn two_code_blocks_picks_the_longer_one_on_ties_broken_by_last_occurrence() {
    init_test_logging();

    let response = "```solidity\ncontract A { function run() external {} }\n```\nthoughts\n```solidity\ncontract B { function run() external {} }\n```";
    let parsed = StrategyParser::parse(response).unwrap();
    assert!(parsed.code.contains("contract B"));
}
