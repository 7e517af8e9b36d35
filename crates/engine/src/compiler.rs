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

//! Solc toolchain management via `svm-solc`.
//!
//! The actual Strategy compile-and-run always goes through the external `forge` binary
//! (see [`crate::fork_executor`]); this module only ensures the pinned solc version is
//! installed before that child process runs, the same `Solc::find_or_install` pattern this
//! crate's debugger ancestor used to manage on-chain-matching compiler versions.

use std::str::FromStr;

use foundry_compilers::artifacts::Settings;
use foundry_compilers::error::SolcError;
use foundry_compilers::solc::Solc;
use semver::Version;

use crate::error::EdbA1Error;

/// The solc version `foundry.toml` pins for every fork execution.
pub const STRATEGY_SOLC_VERSION: &str = "0.8.20";

/// Ensures `version` is installed locally via svm, installing it if absent.
pub fn ensure_solc_installed(version: &str) -> Result<Solc, EdbA1Error> {
    let version = Version::from_str(version)
        .map_err(|e| EdbA1Error::Toolchain(format!("invalid solc version {version}: {e}")))?;
    Solc::find_or_install(&version).map_err(|e: SolcError| {
        EdbA1Error::Toolchain(format!("failed to install solc {version}: {e}"))
    })
}

/// Default compiler settings mirroring `foundry.toml`'s `[profile.default]` (paris EVM target).
pub fn default_settings() -> Settings {
    let mut settings = Settings::default();
    settings.evm_version = Some(foundry_compilers::artifacts::EvmVersion::Paris);
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_version() {
        assert!(ensure_solc_installed("not-a-version").is_err());
    }
}
