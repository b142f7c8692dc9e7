// Dweve HL7 - Health Level Seven v2 message toolkit
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CLI command definitions and argument parsing.
//!
//! # Organization
//!
//! - [`core`]: Commands that read a message file (validate, inspect, query,
//!   segments, stats)
//! - [`utility`]: Text utilities that need no message (escape, unescape)

mod core;
mod utility;

use crate::error::CliError;
use clap::Subcommand;

pub use core::CoreCommands;
pub use utility::UtilityCommands;

/// Top-level CLI commands enum.
///
/// ```text
/// Commands
/// ├── Core (validate, inspect, query, segments, stats)
/// └── Utility (escape, unescape)
/// ```
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use hl7_cli::cli::Commands;
///
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
/// ```
#[derive(Subcommand)]
pub enum Commands {
    // Core commands - flattened to appear at top level
    #[command(flatten)]
    Core(CoreCommands),

    // Utility commands - flattened to appear at top level
    #[command(flatten)]
    Utility(UtilityCommands),
}

impl Commands {
    /// Execute the command with the provided arguments.
    ///
    /// # Errors
    ///
    /// Returns `Err` if file I/O fails, the message does not parse, or a path
    /// expression is malformed.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Core(cmd) => cmd.execute(),
            Commands::Utility(cmd) => cmd.execute(),
        }
    }
}
