// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! Shared chain, explorer, ABI, proxy, constructor, DEX, profit, and code-analysis primitives
//! for the A1 exploit-construction agent.

#![allow(unused_imports)]

pub mod abi;
pub mod cache;
pub mod chain;
pub mod chain_spec;
pub mod code_analyzer;
pub mod constructor;
pub mod dex;
pub mod explorer;
pub mod profit;
pub mod proxy;
pub mod settings;

pub use abi::*;
pub use cache::*;
pub use chain::*;
pub use chain_spec::*;
pub use code_analyzer::*;
pub use constructor::*;
pub use dex::*;
pub use explorer::*;
pub use profit::*;
pub use proxy::*;
pub use settings::*;
