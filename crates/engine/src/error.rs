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

//! Error taxonomy for the agent engine.
//!
//! Tools never throw across their boundary: the policy converts any tool failure into a
//! `ToolResult`. This enum exists for the handful of places that genuinely cannot be contained
//! (resource setup, controller-fatal errors) and is converted to `eyre::Report` only at the CLI
//! boundary.

use thiserror::Error;

/// The error kinds named by the error-handling design: configuration, transport, protocol,
/// decode, toolchain, execution, budget, and controller-fatal failures.
#[derive(Debug, Error)]
pub enum EdbA1Error {
    /// Missing chain in the registry, no RPC URL configured, or an unknown LLM provider.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// RPC, explorer, or LLM transport failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The explorer returned a non-success status or an unverified source.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// ABI decoding failed past the point where a heuristic fallback applies.
    #[error("decode error: {0}")]
    Decode(String),
    /// The `forge` binary or its standard test library is missing.
    #[error("toolchain error: {0}")]
    Toolchain(String),
    /// Compile failure, timeout, or revert during a forked run.
    #[error("execution error: {0}")]
    Execution(String),
    /// Per-turn tool-call budget exceeded.
    #[error("budget exceeded: {0}")]
    Budget(String),
    /// An exception outside tool execution that the controller could not recover from.
    #[error("controller fatal: {0}")]
    ControllerFatal(String),
}
