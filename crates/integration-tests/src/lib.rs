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

//! Shared helpers for A1's cross-component integration tests.

/// Test environment setup: integration tests here compose real `a1-common`/`a1-engine` types
/// directly, with no mock server in between.
pub mod init {
    use std::sync::Once;

    static LOGGING: Once = Once::new();

    /// Initializes `tracing_subscriber` once per test binary.
    pub fn init_test_logging() {
        LOGGING.call_once(|| {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        });
    }

    /// Returns the configured RPC URL for `chain_id`, if any -- tests that need a live chain
    /// should early-return (skip) rather than fail when this is absent.
    pub fn live_rpc_url(chain_id: u64) -> Option<String> {
        a1_common::settings::Settings::rpc_url(chain_id)
    }
}
