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

//! HL7 CLI library for command-line parsing and execution.
//!
//! # Commands
//!
//! ## Message Commands
//!
//! - **validate**: Check that a file holds a well-formed message
//! - **inspect**: Print the element tree of a message
//! - **query**: Evaluate a path expression against a message
//! - **segments**: List every occurrence of a segment
//! - **stats**: Count segments, fields, repetitions and components
//!
//! ## Text Utilities
//!
//! - **escape**: Encode delimiter characters as escape sequences
//! - **unescape**: Decode escape sequences
//!
//! # Examples
//!
//! ```no_run
//! use hl7_cli::commands::{query, validate, QueryOptions};
//!
//! # fn main() -> Result<(), hl7_cli::error::CliError> {
//! validate("adt.hl7", false)?;
//! query("adt.hl7", "PID.5.1", QueryOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod error;
