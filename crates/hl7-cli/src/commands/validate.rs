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

//! Validate command - HL7 message well-formedness check

use super::{check_file_size, load_message};
use crate::error::CliError;
use colored::Colorize;
use hl7_core::Message;
use hl7_stream::MessageReader;
use std::fs::File;
use tracing::info;

/// Validate an HL7 message file.
///
/// # Arguments
///
/// * `file` - Path to the message file
/// * `stream` - Build the tree while reading instead of loading the whole file
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or does not hold a message: a
/// missing or malformed header, duplicate delimiters, invalid UTF-8 or a
/// limit violation.
///
/// # Output
///
/// Prints a check mark and the message type, control id, version and
/// segment count, or a cross when the message is invalid.
pub fn validate(file: &str, stream: bool) -> Result<(), CliError> {
    match read(file, stream) {
        Ok(message) => {
            println!("{} {}", "✓".green().bold(), file);
            println!("  Type: {}", message.message_type());
            println!("  Control ID: {}", message.control_id());
            println!("  Version: {}", message.version());
            println!("  Segments: {}", message.segments().count());
            println!("  Delimiters: {}", message.delimiters());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), file);
            Err(e)
        }
    }
}

fn read(file: &str, stream: bool) -> Result<Message, CliError> {
    if !stream {
        return load_message(file);
    }
    check_file_size(file)?;
    let input = File::open(file).map_err(|e| CliError::io_error(file, e))?;
    let message = MessageReader::new(input).read_message()?;
    info!(file, segments = message.segments().count(), "streamed message");
    Ok(message)
}
