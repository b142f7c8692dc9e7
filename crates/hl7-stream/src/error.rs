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

//! Error types for the streaming builder.
//!
//! # Error Categories
//!
//! - **I/O Errors**: Problems reading the input stream
//! - **UTF-8 Errors**: Input that is not valid UTF-8, including a truncated tail
//! - **Format Errors**: Malformed header or delimiter block
//! - **Security Errors**: A configured limit was exceeded
//!
//! # Examples
//!
//! ```rust
//! use hl7_stream::{IncrementalBuilder, StreamError};
//!
//! let mut builder = IncrementalBuilder::new();
//! builder.push_str("MSH|^^").unwrap();
//! match builder.finish() {
//!     Err(StreamError::Format { segment, message }) => {
//!         assert_eq!(segment, 1);
//!         assert!(message.contains("shorter than a minimal header"));
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use hl7_core::{Hl7Error, Hl7ErrorKind};
use thiserror::Error;

/// Errors that can occur while streaming a message.
#[derive(Error, Debug)]
pub enum StreamError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid UTF-8 encoding.
    #[error("Invalid UTF-8 at byte {offset}: {message}")]
    Utf8 { offset: usize, message: String },

    /// Malformed header or delimiter block.
    #[error("Format error in segment {segment}: {message}")]
    Format { segment: usize, message: String },

    /// A configured limit was exceeded.
    #[error("Security limit exceeded in segment {segment}: {message}")]
    Security { segment: usize, message: String },
}

impl StreamError {
    /// Create a format error.
    #[inline]
    pub fn format(segment: usize, message: impl Into<String>) -> Self {
        Self::Format {
            segment,
            message: message.into(),
        }
    }

    /// Create a security error.
    #[inline]
    pub fn security(segment: usize, message: impl Into<String>) -> Self {
        Self::Security {
            segment,
            message: message.into(),
        }
    }

    /// Get the segment number if available.
    #[inline]
    pub fn segment(&self) -> Option<usize> {
        match self {
            Self::Format { segment, .. } | Self::Security { segment, .. } => Some(*segment),
            _ => None,
        }
    }
}

impl From<Hl7Error> for StreamError {
    fn from(err: Hl7Error) -> Self {
        match err.kind {
            Hl7ErrorKind::Security => Self::security(err.segment, err.message),
            Hl7ErrorKind::Format | Hl7ErrorKind::Misuse => Self::format(err.segment, err.message),
        }
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    // ==================== StreamError variant tests ====================

    #[test]
    fn test_stream_error_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StreamError::from(io_err);
        let display = format!("{}", err);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
        assert_eq!(err.segment(), None);
    }

    #[test]
    fn test_stream_error_utf8() {
        let err = StreamError::Utf8 {
            offset: 42,
            message: "invalid byte sequence".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("Invalid UTF-8"));
        assert!(display.contains("42"));
    }

    #[test]
    fn test_stream_error_format() {
        let err = StreamError::format(3, "duplicate separator");
        assert_eq!(err.segment(), Some(3));
        assert!(err.to_string().contains("segment 3"));
    }

    // ==================== Conversion tests ====================

    #[test]
    fn test_from_hl7_error() {
        let err: StreamError = Hl7Error::security("too many segments").in_segment(7).into();
        assert!(matches!(err, StreamError::Security { segment: 7, .. }));

        let err: StreamError = Hl7Error::format("bad header").in_segment(1).into();
        assert!(matches!(err, StreamError::Format { segment: 1, .. }));

        let err: StreamError = Hl7Error::misuse("not a header").into();
        assert!(matches!(err, StreamError::Format { segment: 0, .. }));
    }
}
