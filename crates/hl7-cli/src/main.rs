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

//! HL7 Command Line Interface

use clap::Parser;
use hl7_cli::cli::Commands;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// HL7 - Health Level Seven v2 message toolkit
///
/// # Examples
///
/// ```bash
/// # Check a message
/// hl7 validate admission.hl7
///
/// # Read the patient's family name
/// hl7 query admission.hl7 PID.5.1
///
/// # Every observation value
/// hl7 query results.hl7 "OBX.5" --all
/// ```
#[derive(Parser)]
#[command(name = "hl7")]
#[command(author, version, about = "HL7 - Health Level Seven v2 message toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        if let Ok(directive) = "hl7_cli=warn".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
