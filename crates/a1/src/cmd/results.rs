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

//! `a1 results {list,stats,export,import}`: inspect and move a run log around.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use a1_engine::{FileRunLog, Metrics, RunLog, RunLogFilter};
use eyre::Result;

pub fn list(run_log_dir: PathBuf, target: Option<String>, model: Option<String>, success: Option<bool>, limit: usize) -> Result<()> {
    let run_log = FileRunLog::new(&run_log_dir)?;
    let filter = RunLogFilter { target, model, success, limit: Some(limit), offset: None };
    let records = run_log.list(&filter)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

pub fn stats(run_log_dir: PathBuf) -> Result<()> {
    let run_log = FileRunLog::new(&run_log_dir)?;
    let report = Metrics::from_run_log(&run_log)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn export(run_log_dir: PathBuf, output: PathBuf) -> Result<()> {
    let run_log = FileRunLog::new(&run_log_dir)?;
    let records = run_log.list(&RunLogFilter::default())?;

    let mut file = std::fs::File::create(&output)?;
    for record in &records {
        writeln!(file, "{}", serde_json::to_string(record)?)?;
    }
    println!("Exported {} runs to {}", records.len(), output.display());
    Ok(())
}

pub fn import(run_log_dir: PathBuf, input: PathBuf) -> Result<()> {
    let run_log = FileRunLog::new(&run_log_dir)?;
    let file = std::fs::File::open(&input)?;
    let reader = std::io::BufReader::new(file);

    let mut imported = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)?;
        run_log.append(&record)?;
        imported += 1;
    }
    println!("Imported {imported} runs into {}", run_log_dir.display());
    Ok(())
}
