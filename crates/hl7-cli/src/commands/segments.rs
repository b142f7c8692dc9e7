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

//! Segments command - list segment occurrences

use super::load_message;
use crate::error::CliError;
use colored::Colorize;

/// Print every occurrence of the segment `name`.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or parsed.
pub fn segments(file: &str, name: &str) -> Result<(), CliError> {
    let message = load_message(file)?;
    for segment in message.all_segments(name) {
        println!("{}\t{}", segment.reference_path().cyan(), segment.to_text());
    }
    Ok(())
}
