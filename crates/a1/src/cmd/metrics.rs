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

//! `a1 metrics`: aggregate statistics over a run log directory.

use std::path::PathBuf;

use a1_engine::{FileRunLog, Metrics};
use eyre::Result;

pub fn metrics(run_log_dir: PathBuf) -> Result<()> {
    let run_log = FileRunLog::new(&run_log_dir)?;
    let report = Metrics::from_run_log(&run_log)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
