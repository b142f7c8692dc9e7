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

//! Commands that operate on one message file.

use crate::commands::{self, QueryOptions};
use crate::error::CliError;
use clap::Subcommand;

/// Core HL7 commands.
#[derive(Subcommand)]
pub enum CoreCommands {
    /// Validate an HL7 message file
    ///
    /// Parses the file and reports the header fields and segment count. With
    /// `--stream` the file is read block by block instead of all at once.
    Validate {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Build the tree incrementally while reading
        #[arg(short, long)]
        stream: bool,
    },

    /// Print the element tree of a message
    Inspect {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Show every node down to subcomponents
        #[arg(short, long)]
        verbose: bool,

        /// Print the tree as JSON
        #[arg(long, conflicts_with = "verbose")]
        json: bool,
    },

    /// Evaluate a path expression
    ///
    /// Paths look like `PID.3.1`, `OBX[2].5`, `OBR.16[2].1` or `*.3`. A path
    /// with no match prints nothing and exits successfully.
    Query {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Path expression
        #[arg(value_name = "PATH")]
        path: String,

        /// Print every matching segment instead of the first
        #[arg(short, long)]
        all: bool,

        /// Decode escape sequences in the result
        #[arg(short, long)]
        decode: bool,
    },

    /// List every occurrence of a segment
    Segments {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Segment name, e.g. OBX
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Count the elements of a message
    Stats {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,
    },
}

impl CoreCommands {
    /// Execute the core command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the command execution fails.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            CoreCommands::Validate { file, stream } => commands::validate(&file, stream),
            CoreCommands::Inspect {
                file,
                verbose,
                json,
            } => commands::inspect(&file, verbose, json),
            CoreCommands::Query {
                file,
                path,
                all,
                decode,
            } => commands::query(&file, &path, QueryOptions { all, decode }),
            CoreCommands::Segments { file, name } => commands::segments(&file, &name),
            CoreCommands::Stats { file } => commands::stats(&file),
        }
    }
}
