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

//! Durable record of agent runs.
//!
//! Append-once-per-run durability plus simple filtering, backed by a JSONL file pair rather than
//! a database: one file of run summaries, one file of per-turn digests.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::EdbA1Error;

/// One completed (or abandoned) agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub target: String,
    pub chain_id: u64,
    pub block: Option<u64>,
    pub model_name: String,
    pub ok: bool,
    pub best_profit: Option<i128>,
    pub turns: u32,
    pub total_tokens: u64,
    pub total_tool_calls: u64,
    pub duration_seconds: f64,
    pub error: Option<String>,
    pub timestamp: String,
}

/// Per-turn detail, stored alongside a [`RunRecord`] for post-hoc inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDigest {
    pub turn: u32,
    pub tool_calls: Vec<String>,
    pub strategy_code_prefix: Option<String>,
    pub exec_outcome_digest: Option<String>,
}

/// Filters for [`RunLog::list`].
#[derive(Debug, Clone, Default)]
pub struct RunLogFilter {
    pub target: Option<String>,
    pub model: Option<String>,
    pub success: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// `sha256("target:model:timestamp")[:16]`.
pub fn generate_run_id(target: &str, model: &str, timestamp: &str) -> String {
    let data = format!("{target}:{model}:{timestamp}");
    let digest = Sha256::digest(data.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Append-only durable log of agent runs. Plain synchronous methods — unlike
/// [`crate::reasoner::Reasoner`] this has no need to be async, so it stays dyn-compatible.
pub trait RunLog {
    fn append(&self, record: &RunRecord) -> Result<(), EdbA1Error>;
    fn append_turn(&self, run_id: &str, turn: &TurnDigest) -> Result<(), EdbA1Error>;
    fn list(&self, filter: &RunLogFilter) -> Result<Vec<RunRecord>, EdbA1Error>;
    fn get(&self, run_id: &str) -> Result<Option<RunRecord>, EdbA1Error>;
}

/// File-backed [`RunLog`]: one `RunRecord` per line in `<root>/runs.jsonl`, per-turn digests in
/// `<root>/<run_id>.turns.jsonl`.
pub struct FileRunLog {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRunLog {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, EdbA1Error> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| EdbA1Error::Configuration(format!("failed to create run log directory: {e}")))?;
        Ok(Self { root, write_lock: Mutex::new(()) })
    }

    fn runs_path(&self) -> PathBuf {
        self.root.join("runs.jsonl")
    }

    fn turns_path(&self, run_id: &str) -> PathBuf {
        self.root.join(format!("{run_id}.turns.jsonl"))
    }

    fn read_all(&self) -> Result<Vec<RunRecord>, EdbA1Error> {
        let path = self.runs_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&path)
            .map_err(|e| EdbA1Error::Configuration(format!("failed to open run log: {e}")))?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| EdbA1Error::Decode(format!("failed to read run log line: {e}")))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RunRecord = serde_json::from_str(&line)
                .map_err(|e| EdbA1Error::Decode(format!("malformed run log entry: {e}")))?;
            records.push(record);
        }
        Ok(records)
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<(), EdbA1Error> {
        let _guard = self.write_lock.lock().expect("run log write lock poisoned");
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| EdbA1Error::Configuration(format!("failed to open run log for append: {e}")))?;
        writeln!(file, "{line}").map_err(|e| EdbA1Error::Configuration(format!("failed to append to run log: {e}")))
    }
}

impl RunLog for FileRunLog {
    fn append(&self, record: &RunRecord) -> Result<(), EdbA1Error> {
        let line = serde_json::to_string(record)
            .map_err(|e| EdbA1Error::Decode(format!("failed to serialize run record: {e}")))?;
        self.append_line(&self.runs_path(), &line)
    }

    fn append_turn(&self, run_id: &str, turn: &TurnDigest) -> Result<(), EdbA1Error> {
        let line = serde_json::to_string(turn)
            .map_err(|e| EdbA1Error::Decode(format!("failed to serialize turn digest: {e}")))?;
        self.append_line(&self.turns_path(run_id), &line)
    }

    fn list(&self, filter: &RunLogFilter) -> Result<Vec<RunRecord>, EdbA1Error> {
        let mut records = self.read_all()?;
        if let Some(target) = &filter.target {
            records.retain(|r| &r.target == target);
        }
        if let Some(model) = &filter.model {
            records.retain(|r| &r.model_name == model);
        }
        if let Some(success) = filter.success {
            records.retain(|r| r.ok == success);
        }
        if let Some(offset) = filter.offset {
            records = records.into_iter().skip(offset).collect();
        }
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn get(&self, run_id: &str) -> Result<Option<RunRecord>, EdbA1Error> {
        Ok(self.read_all()?.into_iter().find(|r| r.run_id == run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(run_id: &str, target: &str, ok: bool) -> RunRecord {
        RunRecord {
            run_id: run_id.to_string(),
            target: target.to_string(),
            chain_id: 1,
            block: Some(100),
            model_name: "null".to_string(),
            ok,
            best_profit: if ok { Some(1_000) } else { None },
            turns: 1,
            total_tokens: 10,
            total_tool_calls: 1,
            duration_seconds: 0.5,
            error: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn run_id_is_deterministic_and_truncated() {
        let id = generate_run_id("0xabc", "gpt-4o", "2026-01-01T00:00:00Z");
        assert_eq!(id.len(), 16);
        assert_eq!(id, generate_run_id("0xabc", "gpt-4o", "2026-01-01T00:00:00Z"));
    }

    #[test]
    fn append_once_per_run_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileRunLog::new(dir.path()).unwrap();
        log.append(&sample_record("run1", "0xabc", true)).unwrap();
        log.append(&sample_record("run2", "0xdef", false)).unwrap();

        let all = log.list(&RunLogFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let fetched = log.get("run1").unwrap().unwrap();
        assert!(fetched.ok);

        let successes = log.list(&RunLogFilter { success: Some(true), ..Default::default() }).unwrap();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0].run_id, "run1");
    }
}
