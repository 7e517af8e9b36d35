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

//! Aggregate statistics over a [`RunLog`].
//!
//! Total and per-model counts, profit sum/avg/max over successful runs, and token sum/avg over
//! every run. Computed by iterating [`RunLog::list`] in memory rather than SQL aggregation, since
//! the default [`crate::run_log::FileRunLog`] has no query engine behind it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::run_log::{RunLog, RunLogFilter};

/// Per-model success breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelStats {
    pub total: u64,
    pub successful: u64,
    pub success_rate: f64,
}

/// Aggregate statistics over every run recorded so far.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsReport {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub success_rate: f64,
    pub total_profit: i128,
    pub avg_profit: f64,
    pub max_profit: i128,
    pub total_tokens: u64,
    pub avg_tokens: f64,
    pub by_model: BTreeMap<String, ModelStats>,
}

pub struct Metrics;

impl Metrics {
    /// Computes a [`MetricsReport`] over every record in `run_log`.
    pub fn from_run_log(run_log: &dyn RunLog) -> Result<MetricsReport, crate::error::EdbA1Error> {
        let records = run_log.list(&RunLogFilter::default())?;

        let total_runs = records.len() as u64;
        let successful: Vec<_> = records.iter().filter(|r| r.ok).collect();
        let successful_runs = successful.len() as u64;
        let success_rate = if total_runs > 0 { successful_runs as f64 / total_runs as f64 } else { 0.0 };

        let total_profit: i128 = successful.iter().filter_map(|r| r.best_profit).sum();
        let avg_profit =
            if successful_runs > 0 { total_profit as f64 / successful_runs as f64 } else { 0.0 };
        let max_profit = successful.iter().filter_map(|r| r.best_profit).max().unwrap_or(0);

        let total_tokens: u64 = records.iter().map(|r| r.total_tokens).sum();
        let avg_tokens = if total_runs > 0 { total_tokens as f64 / total_runs as f64 } else { 0.0 };

        let mut by_model: BTreeMap<String, ModelStats> = BTreeMap::new();
        for record in &records {
            let entry = by_model.entry(record.model_name.clone()).or_default();
            entry.total += 1;
            if record.ok {
                entry.successful += 1;
            }
        }
        for stats in by_model.values_mut() {
            stats.success_rate = if stats.total > 0 { stats.successful as f64 / stats.total as f64 } else { 0.0 };
        }

        Ok(MetricsReport {
            total_runs,
            successful_runs,
            success_rate,
            total_profit,
            avg_profit,
            max_profit,
            total_tokens,
            avg_tokens,
            by_model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_log::{FileRunLog, RunRecord};

    fn record(run_id: &str, model: &str, ok: bool, profit: Option<i128>, tokens: u64) -> RunRecord {
        RunRecord {
            run_id: run_id.to_string(),
            target: "0xabc".to_string(),
            chain_id: 1,
            block: None,
            model_name: model.to_string(),
            ok,
            best_profit: profit,
            turns: 1,
            total_tokens: tokens,
            total_tool_calls: 0,
            duration_seconds: 1.0,
            error: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn aggregates_profit_tokens_and_per_model_breakdown() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileRunLog::new(dir.path()).unwrap();
        log.append(&record("r1", "gpt-4o", true, Some(100), 50)).unwrap();
        log.append(&record("r2", "gpt-4o", false, None, 30)).unwrap();
        log.append(&record("r3", "claude", true, Some(300), 20)).unwrap();

        let report = Metrics::from_run_log(&log).unwrap();
        assert_eq!(report.total_runs, 3);
        assert_eq!(report.successful_runs, 2);
        assert_eq!(report.total_profit, 400);
        assert_eq!(report.max_profit, 300);
        assert_eq!(report.total_tokens, 100);

        let gpt = &report.by_model["gpt-4o"];
        assert_eq!(gpt.total, 2);
        assert_eq!(gpt.successful, 1);
        assert!((gpt.success_rate - 0.5).abs() < 1e-9);
    }
}
