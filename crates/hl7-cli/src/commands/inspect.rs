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

//! Inspect command - HL7 element tree visualization

use super::load_message;
use crate::error::CliError;
use colored::Colorize;
use hl7_core::{Element, ElementKind};

/// Print the element tree of a message.
///
/// # Arguments
///
/// * `file` - Path to the message file
/// * `verbose` - Descend into repetitions, components and subcomponents
/// * `json` - Print the serialized tree instead of the text view
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or parsed.
///
/// # Output
///
/// One line per segment, then one line per non-empty field with its
/// reference path. In verbose mode every node below a field is listed too.
pub fn inspect(file: &str, verbose: bool, json: bool) -> Result<(), CliError> {
    let message = load_message(file)?;

    if json {
        let snapshot = message.root().snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", "HL7 Message".bold().underline());
    println!();
    println!("{}  {}", "Delimiters:".cyan(), message.delimiters());
    println!("{}  {}", "Type:".cyan(), message.message_type());
    println!();

    for segment in message.segments() {
        let fields = format!("({} fields)", segment.child_count().saturating_sub(1));
        println!("{} {}", segment.reference_path().green().bold(), fields.dimmed());
        for field in segment.children().skip(1) {
            if field.to_text().is_empty() {
                continue;
            }
            print_element(field, 1, verbose);
        }
    }
    Ok(())
}

fn print_element(element: Element<'_>, indent: usize, verbose: bool) {
    let prefix = "  ".repeat(indent);
    let path = element.reference_path();

    if element.is_leaf() || !verbose {
        println!("{}{}: {}", prefix, path.yellow(), element.to_text());
        return;
    }

    let label = match element.kind() {
        ElementKind::Field if element.is_repeating() => "repeating field",
        kind => kind.name(),
    };
    println!("{}{} ({})", prefix, path.yellow(), label);
    for child in element.children() {
        print_element(child, indent + 1, verbose);
    }
}
