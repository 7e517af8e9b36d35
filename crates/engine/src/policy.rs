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

//! Tool-calling policy: per-turn budgets, call ordering, and exception containment.

use serde_json::Value;

use crate::tools::{ToolDefinition, ToolRegistry, ToolResult};

/// How the controller decides which tool to call next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// The Reasoner freely chooses which tools to call.
    AgentChosen,
    /// A predetermined `(name, arguments)` sequence is played back, ignoring the Reasoner's
    /// tool choices.
    FixedSequence,
    /// The fixed sequence runs first; once exhausted, falls back to agent-chosen.
    Hybrid,
}

/// One step of a [`PolicyMode::FixedSequence`]/[`PolicyMode::Hybrid`] run.
#[derive(Debug, Clone)]
pub struct FixedCall {
    pub name: String,
    pub arguments: Value,
}

/// Wraps a [`ToolRegistry`] with per-turn call budgeting and a call-ordering mode.
pub struct Policy {
    mode: PolicyMode,
    max_calls_per_turn: u32,
    fixed_sequence: Vec<FixedCall>,
    sequence_index: usize,
    calls_this_turn: u32,
    total_calls: u64,
}

impl Policy {
    pub fn new(mode: PolicyMode, max_calls_per_turn: u32) -> Self {
        Self {
            mode,
            max_calls_per_turn,
            fixed_sequence: Vec::new(),
            sequence_index: 0,
            calls_this_turn: 0,
            total_calls: 0,
        }
    }

    /// Installs a fixed call sequence and switches to [`PolicyMode::FixedSequence`].
    pub fn set_fixed_sequence(&mut self, sequence: Vec<FixedCall>) {
        self.fixed_sequence = sequence;
        self.sequence_index = 0;
        self.mode = PolicyMode::FixedSequence;
    }

    /// Resets the per-turn call counter; called at the start of every agent turn.
    pub fn reset_turn(&mut self) {
        self.calls_this_turn = 0;
    }

    /// Whether another tool call is allowed within the current turn.
    pub fn can_call_tool(&self) -> bool {
        self.calls_this_turn < self.max_calls_per_turn
    }

    /// Pops the next call off the fixed sequence, if any remain.
    pub fn next_fixed_call(&mut self) -> Option<FixedCall> {
        if self.sequence_index >= self.fixed_sequence.len() {
            return None;
        }
        let call = self.fixed_sequence[self.sequence_index].clone();
        self.sequence_index += 1;
        Some(call)
    }

    /// Whether tools should be offered to the Reasoner this turn.
    pub fn should_use_tools(&self) -> bool {
        match self.mode {
            PolicyMode::AgentChosen | PolicyMode::Hybrid => true,
            PolicyMode::FixedSequence => self.sequence_index < self.fixed_sequence.len(),
        }
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub fn definitions(&self, registry: &ToolRegistry) -> Vec<ToolDefinition> {
        registry.definitions()
    }

    /// Looks up and executes `name` against `registry`, enforcing the per-turn budget and
    /// containing any failure inside a failed [`ToolResult`] (tools never throw across this
    /// boundary).
    pub async fn execute_tool(&mut self, registry: &ToolRegistry<'_>, name: &str, arguments: &Value) -> ToolResult {
        let Some(tool) = registry.resolve(name) else {
            return ToolResult::err_public(format!("Unknown tool: {name}"), format!("Tool '{name}' not found"));
        };

        if !self.can_call_tool() {
            return ToolResult::err_public(
                format!("Tool call limit reached ({} per turn)", self.max_calls_per_turn),
                "Call limit reached",
            );
        }

        self.calls_this_turn += 1;
        self.total_calls += 1;

        tool.execute(arguments).await
    }
}

impl ToolResult {
    /// Public constructor for a failed result, used by [`Policy`] for errors that occur before
    /// a tool is even reached (unknown name, budget exhausted).
    pub fn err_public(summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self { ok: false, summary: summary.into(), details: None, error: Some(error.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_enforced_after_max_calls() {
        let mut policy = Policy::new(PolicyMode::AgentChosen, 2);
        assert!(policy.can_call_tool());
        policy.calls_this_turn = 2;
        assert!(!policy.can_call_tool());
        policy.reset_turn();
        assert!(policy.can_call_tool());
    }

    #[test]
    fn fixed_sequence_drains_in_order() {
        let mut policy = Policy::new(PolicyMode::AgentChosen, 5);
        policy.set_fixed_sequence(vec![
            FixedCall { name: "a".into(), arguments: Value::Null },
            FixedCall { name: "b".into(), arguments: Value::Null },
        ]);
        assert_eq!(policy.mode(), PolicyMode::FixedSequence);
        assert_eq!(policy.next_fixed_call().unwrap().name, "a");
        assert_eq!(policy.next_fixed_call().unwrap().name, "b");
        assert!(policy.next_fixed_call().is_none());
        assert!(!policy.should_use_tools());
    }

    #[test]
    fn hybrid_always_offers_tools() {
        let policy = Policy::new(PolicyMode::Hybrid, 5);
        assert!(policy.should_use_tools());
    }
}
