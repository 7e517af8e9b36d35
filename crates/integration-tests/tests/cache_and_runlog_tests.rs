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

//! `a1-common::cache::Cache` TTL semantics and `a1-engine`'s run log + metrics pipeline,
//! exercised together since `Metrics::from_run_log` is the consumer the run log exists for.

use std::thread::sleep;
use std::time::Duration;

use a1_engine::{FileRunLog, Metrics, RunLog, RunRecord};
use a1_integration_tests::init::init_test_logging;

#[test]
fn cache_entry_expires_exactly_at_ttl() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let cache = a1_common::cache::Cache::new(Some(dir.path()), None).unwrap();

    cache.set("k", &"v".to_string(), Some(Duration::from_millis(50))).unwrap();
    assert_eq!(cache.get::<String>("k"), Some("v".to_string()));

    sleep(Duration::from_millis(120));
    assert_eq!(cache.get::<String>("k"), None, "entry must be treated as absent once its TTL has elapsed");
}

fn record(run_id: &str, model: &str, ok: bool, profit: i128) -> RunRecord {
    RunRecord {
        run_id: run_id.to_string(),
        target: "0xdead00000000000000000000000000000000ff".to_string(),
        chain_id: 1,
        block: Some(18_000_000),
        model_name: model.to_string(),
        ok,
        best_profit: Some(profit),
        turns: 3,
        total_tokens: 500,
        total_tool_calls: 4,
        duration_seconds: 1.5,
        error: if ok { None } else { Some("no profitable strategy found".to_string()) },
        timestamp: "2026-01-01T00:00:00Z".to_string(),
    }
}

#[test]
fn run_log_append_and_metrics_aggregate_across_models() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let run_log = FileRunLog::new(dir.path()).unwrap();

    run_log.append(&record("r1", "null", true, 100)).unwrap();
    run_log.append(&record("r2", "null", false, 0)).unwrap();
    run_log.append(&record("r3", "echo", true, 50)).unwrap();

    let all = run_log.list(&Default::default()).unwrap();
    assert_eq!(all.len(), 3);

    let report = Metrics::from_run_log(&run_log).unwrap();
    assert_eq!(report.total_runs, 3);
    assert_eq!(report.successful_runs, 2);
    assert_eq!(report.by_model.len(), 2);
}
