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

//! Structured error types for the HL7 CLI.
//!
//! All command implementations return `Result<T, CliError>` so that `main`
//! reports every failure the same way.

use hl7_core::Hl7Error;
use hl7_stream::StreamError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for HL7 CLI operations.
///
/// # Examples
///
/// ```rust,no_run
/// use hl7_cli::error::CliError;
///
/// fn load(path: &str) -> Result<String, CliError> {
///     std::fs::read_to_string(path).map_err(|e| CliError::io_error(path, e))
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum CliError {
    /// I/O operation failed (file read or metadata access).
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// File size exceeds the maximum allowed limit.
    ///
    /// The limit is configured through `HL7_MAX_FILE_SIZE`.
    #[error("File '{path}' is too large ({actual} bytes). Maximum allowed: {max} bytes ({max_mb} MB)")]
    FileTooLarge {
        /// The file path that exceeded the limit
        path: PathBuf,
        /// The actual file size in bytes
        actual: u64,
        /// The maximum allowed file size in bytes
        max: u64,
        /// The maximum allowed file size in MB (for display)
        max_mb: u64,
    },

    /// The message could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A path expression was malformed or could not be answered.
    #[error("Query error: {0}")]
    Query(String),

    /// JSON serialization error.
    #[error("JSON format error: {message}")]
    Json {
        /// The error message
        message: String,
    },
}

impl CliError {
    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create a file too large error.
    pub fn file_too_large(path: impl Into<PathBuf>, actual: u64, max: u64) -> Self {
        Self::FileTooLarge {
            path: path.into(),
            actual,
            max,
            max_mb: max / (1024 * 1024),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

impl From<Hl7Error> for CliError {
    fn from(source: Hl7Error) -> Self {
        Self::Parse(source.to_string())
    }
}

impl From<StreamError> for CliError {
    fn from(source: StreamError) -> Self {
        Self::Parse(source.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            message: source.to_string(),
        }
    }
}
