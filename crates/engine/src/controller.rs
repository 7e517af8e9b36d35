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

//! Prompt templates, strategy parsing/validation/repair, and the multi-turn agent loop.
//!
//! `AgentController` is generic over `R: Reasoner` rather than `dyn Reasoner` so the reasoner's
//! `async fn` need not be object-safe.

use a1_common::profit::ProfitOracle;
use alloy_primitives::I256;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fork_executor::{ExecOutcome, ForkExecutor};
use crate::policy::Policy;
use crate::reasoner::{FinishReason, Message, Reasoner, Usage};
use crate::run_log::{generate_run_id, RunLog, RunRecord, TurnDigest};
use crate::tools::ToolRegistry;

const SYSTEM_PROMPT: &str = r#"You are an expert smart contract security researcher. Your task is to analyze a target smart contract and generate a Proof of Concept (PoC) exploit that demonstrates a vulnerability.

## Goal
Generate a Solidity contract called `Strategy` that implements `IStrategy` with a `run()` function. When executed on a forked blockchain, this contract should exploit a vulnerability in the target contract to generate profit.

## Available Tools
You have access to the following tools:
- `source_code_fetcher`: Fetch verified source code for a contract
- `blockchain_state_reader`: Read on-chain state (balances, reserves, etc.)
- `code_sanitizer`: Clean and process Solidity code
- `concrete_execution`: Execute your Strategy on a forked blockchain

## Workflow
1. Use tools to gather information about the target contract
2. Analyze the code and state to identify vulnerabilities
3. Generate a Strategy contract that exploits the vulnerability
4. Test the Strategy using concrete_execution
5. Iterate based on execution feedback until profitable

## Strategy Contract Template
```solidity
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

interface IStrategy {
    function run() external;
}

contract Strategy is IStrategy {
    // Your implementation here

    function run() external override {
        // Exploit logic
    }

    receive() external payable {}
}
```

## Important Notes
- The Strategy contract will be deployed with 100 ETH initial balance
- Focus on single-transaction exploits
- Common vulnerability patterns: reentrancy, price manipulation, access control, flash loans
- When execution fails, analyze the revert reason and adjust your approach
- Include all necessary interfaces and helper contracts in your code

Output your Strategy code in a ```solidity code block."#;

/// Builds the system and follow-up prompts the Reasoner is driven with.
pub struct PromptBuilder {
    chain_id: u64,
}

impl PromptBuilder {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    pub fn initial_prompt(&self, target_address: &str, block_number: Option<u64>) -> String {
        let mut parts = vec![
            "## Target".to_string(),
            format!("- Chain ID: {}", self.chain_id),
            format!("- Address: {target_address}"),
        ];
        if let Some(block) = block_number {
            parts.push(format!("- Block Number: {block}"));
        }
        parts.push(String::new());
        parts.push("Start by fetching the source code and analyzing the target contract.".to_string());
        parts.join("\n")
    }

    pub fn follow_up_prompt(&self, outcome: &ExecOutcome) -> String {
        if !outcome.ran {
            return format!(
                "Your Strategy failed to compile.\n\n**Error:**\n{}\n\nFix the compilation errors and generate a corrected Strategy contract.",
                outcome.revert_reason.as_deref().unwrap_or("Unknown compilation error")
            );
        }

        if outcome.success {
            return format!(
                "Your Strategy executed successfully with profit: {} wei.\n\nThe exploit worked! You can refine the strategy to maximize profit, or we can proceed with this version.",
                outcome.profit.unwrap_or(0)
            );
        }

        let balance_str = if outcome.balance_changes.is_empty() {
            "  No changes recorded".to_string()
        } else {
            outcome
                .balance_changes
                .iter()
                .map(|b| format!("  {}: {:+}", b.token, b.delta))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "Your Strategy execution failed.\n\n**Revert Reason:** {}\n\n**Execution Trace:**\n{}\n\n**Balance Changes:**\n{}\n\nAnalyze the failure and generate an improved Strategy. Common issues:\n- Missing approvals or allowances\n- Incorrect function signatures\n- Insufficient balance for operations\n- Reentrancy guards blocking exploit\n- Slippage/price impact issues\n\nGenerate an updated Strategy contract addressing these issues.",
            outcome.revert_reason.as_deref().unwrap_or("Unknown error"),
            outcome.trace.as_deref().unwrap_or("No trace available").chars().take(2000).collect::<String>(),
            balance_str,
        )
    }
}

static SOLIDITY_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:solidity|sol)?\s*\n(.*?)```").unwrap());
static CONTRACT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)contract\s+(\w+)\s+(?:is\s+[\w\s,]+\s*)?\{").unwrap());
static RUN_FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\s+run\s*\(\s*\)\s*(?:external|public)").unwrap());

/// A single parsed Strategy candidate.
#[derive(Debug, Clone)]
pub struct ParsedStrategy {
    pub code: String,
    pub contract_name: String,
    pub has_run_function: bool,
}

/// Extracts, validates, and repairs a Strategy contract from a Reasoner's assistant message.
pub struct StrategyParser;

impl StrategyParser {
    /// Extracts the Strategy code block from `response`.
    ///
    /// When multiple fenced code blocks are present, the **longest** one wins; ties are broken
    /// by **last occurrence** — the last code block in a multi-turn response is typically the
    /// most refined, so ties favor it.
    pub fn parse(response: &str) -> Option<ParsedStrategy> {
        let matches: Vec<&str> = SOLIDITY_BLOCK_RE.captures_iter(response).map(|c| c.get(1).unwrap().as_str()).collect();
        if matches.is_empty() {
            return None;
        }

        let mut best_index = 0usize;
        for (i, candidate) in matches.iter().enumerate() {
            if candidate.len() >= matches[best_index].len() {
                best_index = i;
            }
        }
        let code = matches[best_index].trim().to_string();

        let contract_names: Vec<String> = CONTRACT_RE.captures_iter(&code).map(|c| c[1].to_string()).collect();
        let contract_name = contract_names
            .iter()
            .find(|n| n.eq_ignore_ascii_case("strategy"))
            .cloned()
            .or_else(|| contract_names.last().cloned())
            .unwrap_or_else(|| "Strategy".to_string());

        let has_run_function = RUN_FUNCTION_RE.is_match(&code);

        Some(ParsedStrategy { code, contract_name, has_run_function })
    }

    /// Returns a list of human-readable validation issues; an empty list means the strategy is
    /// ready to submit as-is.
    pub fn validate(parsed: &ParsedStrategy) -> Vec<String> {
        let mut issues = Vec::new();
        if !parsed.has_run_function {
            issues.push("Missing run() function".to_string());
        }
        if !parsed.contract_name.contains("Strategy") {
            issues.push(format!("Contract should be named 'Strategy', found '{}'", parsed.contract_name));
        }
        if !parsed.code.contains("pragma solidity") {
            issues.push("Missing pragma statement".to_string());
        }
        if !parsed.code.contains("contract") {
            issues.push("No contract definition found".to_string());
        }
        issues
    }

    /// Deterministically repairs the most common omissions: missing pragma, missing `IStrategy`
    /// definition (when referenced), and a missing `receive()`/`payable fallback`.
    pub fn fix_common_issues(code: &str) -> String {
        let mut code = code.to_string();

        if !code.contains("pragma solidity") {
            code = format!("// SPDX-License-Identifier: MIT\npragma solidity ^0.8.20;\n\n{code}");
        }

        if !code.contains("interface IStrategy") && code.contains("IStrategy") {
            let interface_code = "\ninterface IStrategy {\n    function run() external;\n}\n";
            if let Some(pragma_pos) = code.find("pragma solidity") {
                if let Some(rel_semi) = code[pragma_pos..].find(';') {
                    let pragma_end = pragma_pos + rel_semi + 1;
                    code = format!("{}\n{}{}", &code[..pragma_end], interface_code, &code[pragma_end..]);
                }
            }
        }

        if !code.contains("receive()") && !code.contains("external payable") {
            if let Some(last_brace) = code.rfind('}') {
                let receive_code = "\n    receive() external payable {}\n";
                code = format!("{}{}{}", &code[..last_brace], receive_code, &code[last_brace..]);
            }
        }

        code
    }
}

/// State carried across turns of a single agent run.
pub struct AgentContext {
    pub target_address: String,
    pub chain_id: u64,
    pub block_number: Option<u64>,
    pub messages: Vec<Message>,
    pub strategies_tried: Vec<String>,
    pub best_profit: i128,
    pub best_strategy: Option<String>,
}

/// What happened in one turn.
pub struct TurnResult {
    pub turn: u32,
    pub tool_calls: Vec<String>,
    pub strategy_code: Option<String>,
    pub exec_outcome: Option<ExecOutcome>,
    pub tokens_used: Usage,
    /// Base-token-normalized net profit from `ProfitOracle::evaluate`, graded over
    /// `exec_outcome`'s balance changes. `None` when there was no successful execution to grade,
    /// or grading itself failed.
    pub graded_profit: Option<i128>,
}

/// Outcome of the complete agent run.
pub struct LoopResult {
    pub success: bool,
    pub final_strategy: Option<String>,
    pub final_profit: i128,
    pub turns: Vec<TurnResult>,
    pub total_tokens: u64,
    pub total_tool_calls: u64,
    pub duration_seconds: f64,
    pub error: Option<String>,
}

/// Drives a single-target agent run: prompt → tool calls → strategy parse → fork execution →
/// repeat, up to a turn budget, appending exactly one [`RunRecord`] on exit.
pub struct AgentController<'a, R: Reasoner> {
    reasoner: R,
    registry: ToolRegistry<'a>,
    policy: Policy,
    executor: &'a ForkExecutor,
    base_token: alloy_primitives::Address,
    prompt_builder: PromptBuilder,
    max_turns: u32,
    run_log: &'a dyn RunLog,
    model_name: String,
}

impl<'a, R: Reasoner> AgentController<'a, R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reasoner: R,
        registry: ToolRegistry<'a>,
        policy: Policy,
        executor: &'a ForkExecutor,
        base_token: alloy_primitives::Address,
        chain_id: u64,
        max_turns: u32,
        run_log: &'a dyn RunLog,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            reasoner,
            registry,
            policy,
            executor,
            base_token,
            prompt_builder: PromptBuilder::new(chain_id),
            max_turns,
            run_log,
            model_name: model_name.into(),
        }
    }

    /// Runs the full loop against `target_address`, always appending a [`RunRecord`] before
    /// returning (success, exhaustion, or error alike).
    pub async fn run(&mut self, target_address: &str, block_number: Option<u64>) -> LoopResult {
        let start = std::time::Instant::now();
        let mut ctx = AgentContext {
            target_address: target_address.to_string(),
            chain_id: self.prompt_builder.chain_id,
            block_number,
            messages: vec![
                Message::system(self.prompt_builder.system_prompt()),
                Message::user(self.prompt_builder.initial_prompt(target_address, block_number)),
            ],
            strategies_tried: Vec::new(),
            best_profit: 0,
            best_strategy: None,
        };

        let mut turns = Vec::new();
        let mut total_tokens = 0u64;
        let mut total_tool_calls = 0u64;
        let mut error = None;
        let mut success = false;

        for turn in 0..self.max_turns {
            match self.run_turn(&mut ctx, turn).await {
                Ok(turn_result) => {
                    total_tokens += turn_result.tokens_used.total_tokens;
                    total_tool_calls += turn_result.tool_calls.len() as u64;

                    if let Some(outcome) = &turn_result.exec_outcome {
                        if outcome.success {
                            if let Some(profit) = turn_result.graded_profit {
                                if profit > ctx.best_profit {
                                    ctx.best_profit = profit;
                                    ctx.best_strategy = turn_result.strategy_code.clone();
                                }
                                if profit > 0 {
                                    turns.push(turn_result);
                                    success = true;
                                    break;
                                }
                            }
                        }
                    }
                    turns.push(turn_result);
                }
                Err(e) => {
                    error = Some(e.to_string());
                    break;
                }
            }
        }

        if !success && error.is_none() {
            error = Some("Max turns reached".to_string());
        }

        let duration_seconds = start.elapsed().as_secs_f64();
        let result = LoopResult {
            success,
            final_strategy: ctx.best_strategy.clone(),
            final_profit: ctx.best_profit,
            turns,
            total_tokens,
            total_tool_calls,
            duration_seconds,
            error,
        };

        self.record_run(&ctx, &result);
        result
    }

    async fn run_turn(&mut self, ctx: &mut AgentContext, turn: u32) -> Result<TurnResult, crate::error::EdbA1Error> {
        self.policy.reset_turn();
        let mut tool_calls_made = Vec::new();
        let mut usage = Usage::default();

        let definitions = self.registry.definitions();
        let tools = self.policy.should_use_tools().then_some(definitions.as_slice());

        let mut response = self.reasoner.generate(&ctx.messages, tools).await?;
        usage = accumulate(usage, response.usage);
        ctx.messages.push(response.message.clone());

        while let Some(calls) = response.message.tool_calls.clone() {
            if calls.is_empty() || !self.policy.can_call_tool() {
                break;
            }
            for call in &calls {
                let result = self.policy.execute_tool(&self.registry, &call.name, &call.arguments).await;
                tool_calls_made.push(call.name.clone());
                ctx.messages.push(Message::tool(call.id.clone(), call.name.clone(), result.summary.clone()));
            }

            if !self.policy.can_call_tool() {
                break;
            }

            response = self.reasoner.generate(&ctx.messages, tools).await?;
            usage = accumulate(usage, response.usage);
            ctx.messages.push(response.message.clone());

            if response.finish_reason != FinishReason::ToolCalls {
                break;
            }
        }

        let mut strategy_code = None;
        let mut exec_outcome = None;
        let mut graded_profit = None;

        if let Some(content) = response.message.content.clone() {
            if let Some(parsed) = StrategyParser::parse(&content) {
                let issues = StrategyParser::validate(&parsed);
                let code = if issues.is_empty() { parsed.code.clone() } else { StrategyParser::fix_common_issues(&parsed.code) };

                let outcome = self
                    .executor
                    .execute(&code, self.base_token, &[], "100000000000000000000")
                    .await?;

                if outcome.success {
                    graded_profit = self.grade_profit(&outcome, ctx.block_number).await;
                }

                let follow_up = self.prompt_builder.follow_up_prompt(&outcome);
                ctx.messages.push(Message::user(follow_up));

                ctx.strategies_tried.push(code.clone());
                strategy_code = Some(code);
                exec_outcome = Some(outcome);
            }
        }

        Ok(TurnResult {
            turn,
            tool_calls: tool_calls_made,
            strategy_code,
            exec_outcome,
            tokens_used: usage,
            graded_profit,
        })
    }

    /// Grades a successful execution's balance changes with [`ProfitOracle`], returning the
    /// base-token-normalized net profit when the oracle finds the result profitable.
    async fn grade_profit(&self, outcome: &ExecOutcome, block_number: Option<u64>) -> Option<i128> {
        let deltas: Vec<(alloy_primitives::Address, I256)> =
            outcome.balance_changes.iter().map(|bc| (bc.token, I256::try_from(bc.delta).unwrap_or(I256::ZERO))).collect();

        let oracle = ProfitOracle::new(self.registry.chain(), self.registry.spec());
        match oracle.evaluate(&deltas, block_number).await {
            Ok(report) if report.is_profitable => i128::try_from(report.net).ok(),
            Ok(_) => None,
            Err(_) => None,
        }
    }

    fn record_run(&self, ctx: &AgentContext, result: &LoopResult) {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let run_id = generate_run_id(&ctx.target_address, &self.model_name, &timestamp);

        let record = RunRecord {
            run_id: run_id.clone(),
            target: ctx.target_address.clone(),
            chain_id: ctx.chain_id,
            block: ctx.block_number,
            model_name: self.model_name.clone(),
            ok: result.success,
            best_profit: if result.success { Some(result.final_profit) } else { None },
            turns: result.turns.len() as u32,
            total_tokens: result.total_tokens,
            total_tool_calls: result.total_tool_calls,
            duration_seconds: result.duration_seconds,
            error: result.error.clone(),
            timestamp,
        };

        let _ = self.run_log.append(&record);

        for turn in &result.turns {
            let digest = TurnDigest {
                turn: turn.turn,
                tool_calls: turn.tool_calls.clone(),
                strategy_code_prefix: turn.strategy_code.as_ref().map(|s| s.chars().take(200).collect()),
                exec_outcome_digest: turn.exec_outcome.as_ref().map(|o| format!("{:?}", o.failure_kind)),
            };
            let _ = self.run_log.append_turn(&run_id, &digest);
        }
    }
}

fn accumulate(a: Usage, b: Usage) -> Usage {
    Usage {
        prompt_tokens: a.prompt_tokens + b.prompt_tokens,
        completion_tokens: a.completion_tokens + b.completion_tokens,
        total_tokens: a.total_tokens + b.total_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_break_prefers_last_of_equal_length_blocks() {
        let response = "```solidity\ncontract A { function run() external {} }\n```\nsome text\n```solidity\ncontract B { function run() external {} }\n```";
        let parsed = StrategyParser::parse(response).unwrap();
        assert!(parsed.code.contains("contract B"));
    }

    #[test]
    fn longest_block_wins_even_if_not_last() {
        let short = "```solidity\ncontract A {}\n```";
        let long = "```solidity\ncontract Strategy is IStrategy { function run() external { } }\n```";
        let response = format!("{long}\nsome text\n{short}");
        let parsed = StrategyParser::parse(&response).unwrap();
        assert_eq!(parsed.contract_name, "Strategy");
    }

    #[test]
    fn validate_flags_missing_run_function_and_bad_name() {
        let parsed = ParsedStrategy {
            code: "pragma solidity ^0.8.20;\ncontract Foo {}".to_string(),
            contract_name: "Foo".to_string(),
            has_run_function: false,
        };
        let issues = StrategyParser::validate(&parsed);
        assert!(issues.iter().any(|i| i.contains("run()")));
        assert!(issues.iter().any(|i| i.contains("Strategy")));
    }

    #[test]
    fn fix_common_issues_adds_pragma_and_receive() {
        let fixed = StrategyParser::fix_common_issues("contract Strategy {}");
        assert!(fixed.contains("pragma solidity"));
        assert!(fixed.contains("receive()"));
    }

    #[test]
    fn fix_common_issues_injects_istrategy_interface_when_referenced_but_undefined() {
        let fixed = StrategyParser::fix_common_issues(
            "pragma solidity ^0.8.20;\ncontract Strategy is IStrategy { function run() external override {} }",
        );
        assert!(fixed.contains("interface IStrategy"));
    }
}
