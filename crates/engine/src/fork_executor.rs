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

//! Submits a Strategy contract to a forked `forge test` run and parses the outcome.
//!
//! The temp-workspace/foundry.toml/test-harness shape lives in [`crate::workspace`], this module
//! owns invoking the `forge` child process and turning its stdout/stderr into an [`ExecOutcome`].

use std::process::Stdio;
use std::time::Duration;

use alloy_primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::EdbA1Error;
use crate::workspace::{forge_binary, ForkWorkspace};

/// A non-native-token balance delta observed across the strategy run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceChange {
    pub token: Address,
    pub delta: i128,
}

/// Outcome of a single fork execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecOutcome {
    /// Whether `forge` ran the test at all (false only on toolchain/compile/timeout failure).
    pub ran: bool,
    /// Whether `strategy.run()` completed without reverting.
    pub success: bool,
    pub compile_success: bool,
    pub revert_reason: Option<String>,
    pub profit: Option<i128>,
    pub balance_changes: Vec<BalanceChange>,
    pub gas_used: Option<u64>,
    pub trace: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub raw_stdout: String,
    pub raw_stderr: String,
}

/// Why a run did not produce a usable result, distinct from a strategy-level revert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    ToolchainMissing,
    LibMissing,
    Timeout,
    Compile,
}

/// Configuration for a single [`ForkExecutor::execute`] call.
pub struct ForkExecutorConfig {
    pub rpc_url: String,
    pub fork_block: Option<u64>,
    pub forge_std_path: Option<std::path::PathBuf>,
    pub timeout: Duration,
}

pub struct ForkExecutor {
    config: ForkExecutorConfig,
}

impl ForkExecutor {
    pub fn new(config: ForkExecutorConfig) -> Self {
        Self { config }
    }

    /// Materializes a workspace, runs `forge test`, and parses the result.
    pub async fn execute(
        &self,
        strategy_source: &str,
        base_token: Address,
        tracked_tokens: &[Address],
        initial_balance: &str,
    ) -> Result<ExecOutcome, EdbA1Error> {
        let workspace = match ForkWorkspace::materialize(
            strategy_source,
            base_token,
            tracked_tokens,
            initial_balance,
            self.config.forge_std_path.as_deref(),
        ) {
            Ok(w) => w,
            Err(e) => {
                let kind = if e.to_string().contains("lib_missing") || e.to_string().contains("not found") {
                    FailureKind::LibMissing
                } else {
                    FailureKind::ToolchainMissing
                };
                return Ok(ExecOutcome {
                    ran: false,
                    failure_kind: Some(kind),
                    raw_stderr: e.to_string(),
                    ..Default::default()
                });
            }
        };

        let mut cmd = Command::new(forge_binary());
        cmd.current_dir(workspace.root())
            .arg("test")
            .arg(format!("--fork-url={}", self.config.rpc_url));
        if let Some(block) = self.config.fork_block {
            cmd.arg(format!("--fork-block-number={block}"));
        }
        cmd.arg("-vvvv").arg("--match-test").arg("test_Execute");
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            EdbA1Error::Toolchain(format!("failed to spawn forge (is it on PATH?): {e}"))
        });

        let child = match child {
            Ok(c) => c,
            Err(e) => {
                return Ok(ExecOutcome {
                    ran: false,
                    failure_kind: Some(FailureKind::ToolchainMissing),
                    raw_stderr: e.to_string(),
                    ..Default::default()
                });
            }
        };

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output()).await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(ExecOutcome {
                    ran: false,
                    failure_kind: Some(FailureKind::ToolchainMissing),
                    raw_stderr: e.to_string(),
                    ..Default::default()
                });
            }
            Err(_) => {
                return Ok(ExecOutcome {
                    ran: false,
                    failure_kind: Some(FailureKind::Timeout),
                    raw_stderr: format!(
                        "forge test exceeded {} second timeout",
                        self.config.timeout.as_secs()
                    ),
                    ..Default::default()
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Ok(parse_forge_output(&stdout, &stderr))
    }
}

static ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Error[:\s]+(.+)").unwrap());
static REASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Reason:\s*(.+)").unwrap());
static PROFIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Profit.*?:\s*(-?\d+)").unwrap());
static BALANCE_CHANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BalanceChange\(([^,]+),\s*(-?\d+)\)").unwrap());
static GAS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"gas:\s*(\d+)").unwrap());

const MAX_TRACE_LINES: usize = 100;

/// Pure parser over `forge test`'s combined stdout/stderr.
fn parse_forge_output(stdout: &str, stderr: &str) -> ExecOutcome {
    let mut outcome = ExecOutcome { raw_stdout: stdout.to_string(), raw_stderr: stderr.to_string(), ..Default::default() };

    if stderr.contains("Compiler run failed") || stderr.contains("Error:") {
        outcome.ran = false;
        outcome.compile_success = false;
        outcome.failure_kind = Some(FailureKind::Compile);
        outcome.revert_reason =
            Some(ERROR_RE.captures(stderr).map(|c| c[1].trim().to_string()).unwrap_or_else(|| "Compilation failed".to_string()));
        return outcome;
    }

    outcome.ran = true;
    outcome.compile_success = true;

    if stdout.contains("Execution: SUCCESS") {
        outcome.success = true;
    } else if stdout.contains("Execution: FAILED") {
        outcome.success = false;
        if let Some(c) = REASON_RE.captures(stdout) {
            outcome.revert_reason = Some(c[1].trim().to_string());
        }
    }

    if let Some(c) = PROFIT_RE.captures(stdout) {
        outcome.profit = c[1].parse::<i128>().ok();
    }

    for c in BALANCE_CHANGE_RE.captures_iter(stdout) {
        let token_str = c[1].trim();
        if let Ok(token) = token_str.parse::<Address>() {
            if let Ok(delta) = c[2].parse::<i128>() {
                outcome.balance_changes.push(BalanceChange { token, delta });
            }
        }
    }

    if let Some(c) = GAS_RE.captures(stdout) {
        outcome.gas_used = c[1].parse::<u64>().ok();
    }

    if let Some(start) = stdout.find("Traces:") {
        let rest = &stdout[start..];
        let end = rest.find("Suite result:").map(|i| start + i).unwrap_or(stdout.len());
        let trace = &stdout[start..end];
        let truncated: String =
            trace.lines().take(MAX_TRACE_LINES).collect::<Vec<_>>().join("\n");
        outcome.trace = Some(truncated);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compile_failure() {
        let stderr = "Compiler run failed\nError: expected ';' but got '}'\n";
        let outcome = parse_forge_output("", stderr);
        assert!(!outcome.ran);
        assert_eq!(outcome.failure_kind, Some(FailureKind::Compile));
        assert!(outcome.revert_reason.is_some());
    }

    #[test]
    fn parses_successful_run_with_profit_and_balance_changes() {
        let stdout = r#"
Traces:
  [12345] ExecuteTest::test_Execute()
    ...

Execution: SUCCESS
Profit (base token):
50000000000000000

logs:
  BalanceChange(0x0000000000000000000000000000000000000000, 50000000000000000)
  BalanceChange(0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2, -1000000000000000000)

Suite result: ok. 1 passed; 0 failed; 0 skipped
"#;
        let outcome = parse_forge_output(stdout, "");
        assert!(outcome.ran);
        assert!(outcome.success);
        assert_eq!(outcome.profit, Some(50_000_000_000_000_000));
        assert_eq!(outcome.balance_changes.len(), 2);
        assert!(outcome.trace.is_some());
    }

    #[test]
    fn parses_failed_run_with_reason() {
        let stdout = "Execution: FAILED\nReason: Insufficient liquidity\n";
        let outcome = parse_forge_output(stdout, "");
        assert!(outcome.ran);
        assert!(!outcome.success);
        assert_eq!(outcome.revert_reason.as_deref(), Some("Insufficient liquidity"));
    }
}
