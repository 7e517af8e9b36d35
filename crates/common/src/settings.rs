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

//! Environment-driven configuration, in the same builder style as `EngineConfig` in the upstream
//! debugger (`crates/engine/src/core.rs`): a `Default` baseline, `with_*` builder methods, and a
//! `from_env()` constructor that layers environment variables on top.

use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;

/// Which LLM backend to drive the agent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completion API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// A local/offline reasoner, used for tests and dry runs.
    Null,
}

impl ProviderKind {
    fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "openai" => ProviderKind::OpenAi,
            "anthropic" => ProviderKind::Anthropic,
            _ => ProviderKind::Null,
        }
    }
}

/// LLM connection settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which backend to talk to.
    pub provider: ProviderKind,
    /// Model identifier, e.g. `"gpt-4o"` or `"claude-sonnet-4"`.
    pub model: String,
    /// API key, if required by the provider.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { provider: ProviderKind::Null, model: "null".to_string(), api_key: None }
    }
}

impl LlmConfig {
    /// Reads `LLM_PROVIDER` / `LLM_MODEL` / `LLM_API_KEY` from the environment, falling back to
    /// the null provider when unset.
    pub fn from_env() -> Self {
        let provider = std::env::var("LLM_PROVIDER").map(|s| ProviderKind::from_str(&s)).unwrap_or(ProviderKind::Null);
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "null".to_string());
        let api_key = std::env::var("LLM_API_KEY").ok();
        Self { provider, model, api_key }
    }
}

/// Process-wide settings for the agent: cache location/TTL, turn budgets, and per-chain
/// RPC/explorer credentials.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory for the content-addressed cache. `None` uses the platform default
    /// (`~/.a1/cache`).
    pub cache_dir: Option<std::path::PathBuf>,
    /// Default cache-entry TTL.
    pub cache_ttl: Duration,
    /// Maximum turns an `AgentController` run may take before giving up.
    pub max_turns: u32,
    /// Maximum tool calls the controller will issue within a single turn.
    pub max_calls_per_turn: u32,
    /// Timeout for a single forked-EVM execution.
    pub fork_timeout: Duration,
    /// LLM connection settings.
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_turns: 20,
            max_calls_per_turn: 8,
            fork_timeout: Duration::from_secs(60),
            llm: LlmConfig::default(),
        }
    }
}

impl Settings {
    /// Sets the cache root directory.
    pub fn with_cache_dir(mut self, dir: std::path::PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    /// Sets the default cache-entry TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the per-run turn budget.
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Builds settings from environment variables, falling back to [`Default`] for anything
    /// unset: `EDB_A1_CACHE_DIR`, `EDB_A1_CACHE_TTL_SECS`, `EDB_A1_MAX_TURNS`,
    /// `EDB_A1_MAX_CALLS_PER_TURN`, `EDB_A1_FORK_TIMEOUT_SECS`, plus `LLM_*` (see [`LlmConfig`]).
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(dir) = std::env::var("EDB_A1_CACHE_DIR") {
            settings.cache_dir = Some(std::path::PathBuf::from(dir));
        }
        if let Some(secs) = env_u64("EDB_A1_CACHE_TTL_SECS") {
            settings.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(turns) = env_u64("EDB_A1_MAX_TURNS") {
            settings.max_turns = turns as u32;
        }
        if let Some(calls) = env_u64("EDB_A1_MAX_CALLS_PER_TURN") {
            settings.max_calls_per_turn = calls as u32;
        }
        if let Some(secs) = env_u64("EDB_A1_FORK_TIMEOUT_SECS") {
            settings.fork_timeout = Duration::from_secs(secs);
        }
        settings.llm = LlmConfig::from_env();

        settings
    }

    /// Reads the RPC URL for `chain_id` from `RPC_URL_<chain_id>`.
    pub fn rpc_url(chain_id: u64) -> Option<String> {
        std::env::var(format!("RPC_URL_{chain_id}")).ok()
    }

    /// Reads the explorer API key for `chain_id` from `EXPLORER_API_KEY_<chain_id>`.
    pub fn explorer_api_key(chain_id: u64) -> Option<String> {
        std::env::var(format!("EXPLORER_API_KEY_{chain_id}")).ok()
    }

    /// Loads a `.env` file (if present) into the process environment before reading settings.
    pub fn load_dotenv() {
        let _ = dotenv::dotenv();
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_null_provider() {
        let settings = Settings::default();
        assert_eq!(settings.llm.provider, ProviderKind::Null);
        assert_eq!(settings.max_turns, 20);
    }

    #[test]
    fn provider_kind_parses_known_strings() {
        assert_eq!(ProviderKind::from_str("OpenAI"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::from_str("anthropic"), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::from_str("nonsense"), ProviderKind::Null);
    }
}
