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

//! Runs many targets' agent loops concurrently, bounded by a semaphore.
//!
//! Each target owns its own `AgentContext`/clients/workspace, sharing only the process-wide
//! `a1_common::cache::Cache`.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::controller::LoopResult;

/// One target to run through the agent loop, identified the way the CLI's `experiment`/`batch`
/// subcommands name a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTarget {
    pub address: String,
    pub chain_id: u64,
    pub block_number: Option<u64>,
}

/// Runs a fixed set of [`BatchTarget`]s with bounded parallelism.
pub struct BatchDriver {
    pub targets: Vec<BatchTarget>,
    pub parallelism: usize,
}

impl BatchDriver {
    pub fn new(targets: Vec<BatchTarget>, parallelism: usize) -> Self {
        Self { targets, parallelism: parallelism.max(1) }
    }

    /// Runs every target, using `controller_factory` to build an independent run for each one.
    /// `controller_factory` returns a future that drives that target's full agent loop; no
    /// state is shared across targets besides whatever the caller's closure captures (in
    /// practice: the process-wide cache).
    pub async fn run_all<F, Fut>(&self, controller_factory: F) -> Vec<LoopResult>
    where
        F: Fn(BatchTarget) -> Fut,
        Fut: Future<Output = LoopResult>,
    {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let futures = self.targets.iter().cloned().map(|target| {
            let semaphore = Arc::clone(&semaphore);
            let fut = controller_factory(target);
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                fut.await
            }
        });
        join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_every_target_exactly_once() {
        let targets = vec![
            BatchTarget { address: "0x1".into(), chain_id: 1, block_number: None },
            BatchTarget { address: "0x2".into(), chain_id: 1, block_number: None },
            BatchTarget { address: "0x3".into(), chain_id: 1, block_number: None },
        ];
        let driver = BatchDriver::new(targets, 2);

        let results = driver
            .run_all(|target| async move {
                LoopResult {
                    success: false,
                    final_strategy: None,
                    final_profit: 0,
                    turns: vec![],
                    total_tokens: 0,
                    total_tool_calls: 0,
                    duration_seconds: 0.0,
                    error: Some(target.address),
                }
            })
            .await;

        assert_eq!(results.len(), 3);
        let mut addresses: Vec<_> = results.into_iter().filter_map(|r| r.error).collect();
        addresses.sort();
        assert_eq!(addresses, vec!["0x1".to_string(), "0x2".to_string(), "0x3".to_string()]);
    }
}
