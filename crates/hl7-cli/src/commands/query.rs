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

//! Query command - path expression evaluation

use super::load_message;
use crate::error::CliError;
use colored::Colorize;
use hl7_core::{resolve, unescape_text, Element, Message, SearchCriteria};
use tracing::{debug, info};

/// Options for [`query`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Report the match in every segment occurrence, not only the first.
    pub all: bool,
    /// Decode escape sequences before printing.
    pub decode: bool,
}

/// Evaluate a path expression against a message file.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or parsed, or the path is
/// malformed. A path that matches nothing is not an error.
///
/// # Output
///
/// The serialized text of each match, one per line. With `--all` each line is
/// prefixed by the match's reference path.
pub fn query(file: &str, path: &str, options: QueryOptions) -> Result<(), CliError> {
    let message = load_message(file)?;
    let criteria = SearchCriteria::parse_with_limits(path, message.limits())
        .map_err(|e| CliError::query(e.to_string()))?;
    debug!(path, criteria = %criteria, "parsed path");

    let matches = find(&message, &criteria, options.all);
    if matches.is_empty() {
        info!(path, "no match");
        return Ok(());
    }

    for element in matches {
        let text = element.to_text();
        let text = if options.decode {
            unescape_text(&text, message.delimiters()).into_owned()
        } else {
            text
        };
        if options.all {
            println!("{}\t{}", element.reference_path().cyan(), text);
        } else {
            println!("{}", text);
        }
    }
    Ok(())
}

fn find<'a>(message: &'a Message, criteria: &SearchCriteria, all: bool) -> Vec<Element<'a>> {
    if !all {
        let element = message.resolve(criteria);
        return if element.is_found() {
            vec![element]
        } else {
            Vec::new()
        };
    }
    message
        .segments()
        .map(|segment| resolve(segment, criteria))
        .filter(Element::is_found)
        .collect()
}
