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

//! Fork execution, tool calling, and the agent loop for the A1 exploit-construction agent.
//!
//! Builds on `a1_common`'s chain/explorer/proxy/dex/profit/code-analysis primitives: this crate
//! owns everything downstream of them — materializing a `forge` project and running it
//! ([`workspace`], [`compiler`], [`fork_executor`]), wrapping those primitives as agent-callable
//! tools under a turn budget ([`tools`], [`policy`]), driving an abstract LLM across turns
//! ([`reasoner`], [`controller`]), and recording what happened ([`run_log`], [`metrics`],
//! [`batch`]).

pub mod batch;
pub mod compiler;
pub mod controller;
pub mod error;
pub mod fork_executor;
pub mod metrics;
pub mod policy;
pub mod reasoner;
pub mod run_log;
pub mod tools;
pub mod workspace;

pub use batch::{BatchDriver, BatchTarget};
pub use controller::{AgentContext, AgentController, LoopResult, ParsedStrategy, PromptBuilder, StrategyParser, TurnResult};
pub use error::EdbA1Error;
pub use fork_executor::{BalanceChange, ExecOutcome, FailureKind, ForkExecutor, ForkExecutorConfig};
pub use metrics::{Metrics, MetricsReport, ModelStats};
pub use policy::{FixedCall, Policy, PolicyMode};
pub use reasoner::{EchoReasoner, FinishReason, GenerateResult, Message, NullReasoner, Reasoner, Role, ToolCall, Usage};
pub use run_log::{generate_run_id, FileRunLog, RunLog, RunLogFilter, RunRecord, TurnDigest};
pub use tools::{Tool, ToolDefinition, ToolRegistry, ToolResult};
pub use workspace::ForkWorkspace;
