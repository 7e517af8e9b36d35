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

//! CLI smoke tests for the `a1` binary.

use predicates::prelude::*;

#[test]
fn test_help_command() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("--help").assert().success().stdout(predicate::str::contains("autonomous PoC generator"));
}

#[test]
fn test_version_command() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("--version").assert().success().stdout(predicate::str::contains("a1"));
}

#[test]
fn test_run_subcommand_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("run").arg("--help").assert().success().stdout(predicate::str::contains("Run the agent"));
}

#[test]
fn test_analyze_code_subcommand_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("analyze-code").arg("--help").assert().success().stdout(predicate::str::contains("Parse and sanitize"));
}

#[test]
fn test_results_subcommand_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("results").arg("--help").assert().success().stdout(predicate::str::contains("list"));
}

#[test]
fn test_analyze_code_missing_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("analyze-code").arg("/nonexistent/path/does/not/exist.sol").assert().failure();
}

#[test]
fn test_run_missing_target_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_metrics_on_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("a1");
    cmd.arg("metrics").arg("--run-log-dir").arg(dir.path()).assert().success();
}
