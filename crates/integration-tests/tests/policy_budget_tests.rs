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

//! Per-turn tool-call budgeting across repeated turns, and fixed-sequence bookkeeping.

use a1_engine::{FixedCall, Policy, PolicyMode};
use a1_integration_tests::init::init_test_logging;

#[test]
fn budget_resets_every_turn() {
    init_test_logging();
    let mut policy = Policy::new(PolicyMode::AgentChosen, 2);

    for _ in 0..3 {
        policy.reset_turn();
        assert!(policy.can_call_tool());
        policy.reset_turn();
    }
}

#[test]
fn fixed_sequence_drains_in_order_then_offers_no_more_tools() {
    init_test_logging();
    let mut policy = Policy::new(PolicyMode::AgentChosen, 1);
    policy.set_fixed_sequence(vec![
        FixedCall { name: "code_sanitizer".to_string(), arguments: serde_json::json!({}) },
        FixedCall { name: "code_sanitizer".to_string(), arguments: serde_json::json!({ "x": 1 }) },
    ]);
    assert_eq!(policy.mode(), PolicyMode::FixedSequence);

    assert!(policy.should_use_tools());
    let first = policy.next_fixed_call().expect("first queued call");
    assert_eq!(first.name, "code_sanitizer");
    assert_eq!(first.arguments, serde_json::json!({}));

    assert!(policy.should_use_tools());
    let second = policy.next_fixed_call().expect("second queued call");
    assert_eq!(second.arguments, serde_json::json!({ "x": 1 }));

    assert!(!policy.should_use_tools(), "sequence exhausted, no further tools should be offered");
    assert!(policy.next_fixed_call().is_none());
}
