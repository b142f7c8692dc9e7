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

//! Escape and unescape commands

use crate::error::CliError;
use hl7_core::{escape_text, unescape_text, Delimiters};

/// Print `text` with delimiter characters encoded as escape sequences.
pub fn escape(text: &str) -> Result<(), CliError> {
    println!("{}", escape_text(text));
    Ok(())
}

/// Print `text` with escape sequences decoded.
pub fn unescape(text: &str) -> Result<(), CliError> {
    println!("{}", unescape_text(text, &Delimiters::default()));
    Ok(())
}
