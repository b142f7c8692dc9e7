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

//! CLI command implementations

mod escape;
mod inspect;
mod query;
mod segments;
mod stats;
mod validate;

pub use escape::{escape, unescape};
pub use inspect::inspect;
pub use query::{query, QueryOptions};
pub use segments::segments;
pub use stats::stats;
pub use validate::validate;

use crate::error::CliError;
use hl7_core::{parse_bytes, Message, ParseOptions};
use std::fs;
use tracing::debug;

/// Default maximum file size to prevent OOM attacks (64 MB)
/// Can be overridden via HL7_MAX_FILE_SIZE environment variable
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Get the maximum file size from environment or use default.
///
/// Reads the `HL7_MAX_FILE_SIZE` environment variable. Falls back to
/// [`DEFAULT_MAX_FILE_SIZE`] if the variable is not set or is not a number.
pub(crate) fn max_file_size() -> u64 {
    std::env::var("HL7_MAX_FILE_SIZE")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_MAX_FILE_SIZE)
}

/// Check a file's size against [`max_file_size`] before it is read.
pub(crate) fn check_file_size(path: &str) -> Result<(), CliError> {
    let metadata = fs::metadata(path).map_err(|e| CliError::io_error(path, e))?;
    let max = max_file_size();
    if metadata.len() > max {
        return Err(CliError::file_too_large(path, metadata.len(), max));
    }
    Ok(())
}

/// Read a file from disk with size validation.
///
/// # Errors
///
/// Returns `Err` if the file metadata cannot be accessed, the file is larger
/// than the configured maximum (`HL7_MAX_FILE_SIZE`), or the read fails.
///
/// # Examples
///
/// ```no_run
/// use hl7_cli::commands::read_file;
///
/// # fn main() -> Result<(), hl7_cli::error::CliError> {
/// let bytes = read_file("adt.hl7")?;
/// assert!(bytes.starts_with(b"MSH"));
/// # Ok(())
/// # }
/// ```
pub fn read_file(path: &str) -> Result<Vec<u8>, CliError> {
    check_file_size(path)?;
    let bytes = fs::read(path).map_err(|e| CliError::io_error(path, e))?;
    debug!(path, bytes = bytes.len(), "read file");
    Ok(bytes)
}

/// Read and parse a message file.
///
/// The parser's message size limit follows the file size limit.
pub fn load_message(path: &str) -> Result<Message, CliError> {
    let bytes = read_file(path)?;
    let max = usize::try_from(max_file_size()).unwrap_or(usize::MAX);
    let options = ParseOptions::builder().max_message_size(max).build();
    let message = parse_bytes(&bytes, &options)?;
    debug!(
        path,
        segments = message.segments().count(),
        delimiters = %message.delimiters(),
        "parsed message"
    );
    Ok(message)
}
