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

//! Stats command - element counts

use super::load_message;
use crate::error::CliError;
use colored::Colorize;
use hl7_core::{traverse, StatsCollector};

/// Count the elements of a message file.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or parsed.
pub fn stats(file: &str) -> Result<(), CliError> {
    let message = load_message(file)?;
    let mut stats = StatsCollector::default();
    // StatsCollector never fails.
    let _ = traverse(message.tree(), &mut stats);

    println!("{}", "Message Statistics".bold());
    println!();
    println!("  {:<20} {}", "Segments:", stats.segment_count);
    println!("  {:<20} {}", "Empty segments:", stats.empty_segment_count);
    println!("  {:<20} {}", "Fields:", stats.field_count);
    println!("  {:<20} {}", "Repeating fields:", stats.repeating_field_count);
    println!("  {:<20} {}", "Repetitions:", stats.repetition_count);
    println!("  {:<20} {}", "Components:", stats.component_count);
    println!("  {:<20} {}", "Subcomponents:", stats.subcomponent_count);
    println!("  {:<20} {}", "Leaves:", stats.leaf_count);
    println!("  {:<20} {}", "Max depth:", stats.max_depth);
    println!();
    println!("{}", "Segments by name".bold());
    for (name, count) in &stats.segments_by_name {
        println!("  {:<20} {}", name.green(), count);
    }
    Ok(())
}
