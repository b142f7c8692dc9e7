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

//! Text utilities that need no message file.

use crate::commands;
use crate::error::CliError;
use clap::Subcommand;

/// Utility commands.
///
/// Both commands use the default delimiters `|^~\&`.
#[derive(Subcommand)]
pub enum UtilityCommands {
    /// Encode delimiter characters in TEXT as escape sequences
    Escape {
        /// Text to encode
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Decode the escape sequences in TEXT
    Unescape {
        /// Text to decode
        #[arg(value_name = "TEXT")]
        text: String,
    },
}

impl UtilityCommands {
    /// Execute the utility command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if writing to stdout fails.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            UtilityCommands::Escape { text } => commands::escape(&text),
            UtilityCommands::Unescape { text } => commands::unescape(&text),
        }
    }
}
