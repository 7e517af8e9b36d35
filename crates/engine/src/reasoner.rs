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

//! The abstract LLM-calling capability the controller drives, plus test doubles.
//!
//! Concrete provider adapters (Anthropic/OpenAI/OpenRouter) are out of scope;
//! `a1_common::settings::ProviderKind` names the provider a real [`Reasoner`] impl would dispatch
//! on, chosen at the CLI boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EdbA1Error;
use crate::tools::ToolDefinition;

/// A chat message's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the Reasoner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A single turn in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Set on a `Role::Tool` message: which call this message answers (T3 integrity check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: Some(content.into()), tool_calls: None, tool_call_id: None, name: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: Some(content.into()), tool_calls: None, tool_call_id: None, name: None }
    }

    pub fn assistant(content: Option<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self { role: Role::Assistant, content, tool_calls, tool_call_id: None, name: None }
    }

    pub fn tool(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// Token accounting for one `generate` call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Why generation stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    Error,
}

/// Result of a single [`Reasoner::generate`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResult {
    pub message: Message,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// The single capability an agent loop needs from an LLM backend.
///
/// A native `async fn` in a trait (stable since 1.75): `AgentController` is generic over
/// `R: Reasoner` rather than using `dyn Reasoner`, so this need not be object-safe.
pub trait Reasoner {
    async fn generate(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<GenerateResult, EdbA1Error>;
}

/// Always responds with a fixed assistant message and no tool calls; useful for driving the
/// controller loop in tests without a strategy ever being produced.
pub struct NullReasoner {
    pub content: String,
}

impl NullReasoner {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}

impl Reasoner for NullReasoner {
    async fn generate(
        &self,
        _messages: &[Message],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<GenerateResult, EdbA1Error> {
        Ok(GenerateResult {
            message: Message::assistant(Some(self.content.clone()), None),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}

/// Replays a fixed, pre-scripted sequence of responses, one per call; useful for exercising
/// multi-turn controller flows (tool call → follow-up → final strategy) deterministically.
pub struct EchoReasoner {
    responses: std::sync::Mutex<std::collections::VecDeque<GenerateResult>>,
}

impl EchoReasoner {
    pub fn new(responses: Vec<GenerateResult>) -> Self {
        Self { responses: std::sync::Mutex::new(responses.into()) }
    }
}

impl Reasoner for EchoReasoner {
    async fn generate(
        &self,
        _messages: &[Message],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<GenerateResult, EdbA1Error> {
        let mut responses = self.responses.lock().expect("EchoReasoner mutex poisoned");
        responses.pop_front().ok_or_else(|| {
            EdbA1Error::ControllerFatal("EchoReasoner exhausted its scripted responses".to_string())
        })
    }
}

/// Human-readable usage totals accumulated across a run, keyed by nothing in particular beyond
/// being summed into [`crate::run_log::RunRecord`].
pub fn sum_usage(usages: &[Usage]) -> Usage {
    usages.iter().fold(Usage::default(), |mut acc, u| {
        acc.prompt_tokens += u.prompt_tokens;
        acc.completion_tokens += u.completion_tokens;
        acc.total_tokens += u.total_tokens;
        acc
    })
}

/// Placeholder for a provider-keyed response-format map, kept so additions for per-provider
/// quirks land in one place.
pub type ProviderExtras = HashMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_reasoner_never_requests_tools() {
        let reasoner = NullReasoner::new("no strategy yet");
        let result = reasoner.generate(&[], None).await.unwrap();
        assert!(result.message.tool_calls.is_none());
        assert_eq!(result.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn echo_reasoner_replays_in_order_then_errors() {
        let reasoner = EchoReasoner::new(vec![GenerateResult {
            message: Message::assistant(Some("first".into()), None),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        }]);
        let first = reasoner.generate(&[], None).await.unwrap();
        assert_eq!(first.message.content.as_deref(), Some("first"));
        assert!(reasoner.generate(&[], None).await.is_err());
    }
}
