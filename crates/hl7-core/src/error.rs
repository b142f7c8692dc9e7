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

//! Error types for HL7 parsing and querying.
//!
//! Only malformed input and API misuse are errors. An address that points
//! past the end of the message is not: it resolves to the tree's empty
//! sentinel element (see [`Element::is_found`](crate::Element::is_found)).

use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hl7ErrorKind {
    /// Malformed message header, delimiter block or path expression.
    Format,
    /// A scalar accessor was used on a node that has structure below it,
    /// or a write targeted an address that does not exist.
    Misuse,
    /// A configured limit was exceeded.
    Security,
}

impl fmt::Display for Hl7ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format => write!(f, "FormatError"),
            Self::Misuse => write!(f, "MisuseError"),
            Self::Security => write!(f, "SecurityError"),
        }
    }
}

/// An error raised while parsing, querying or editing an HL7 message.
#[derive(Debug, Clone, Error)]
#[error("{kind}{}: {message}", segment_suffix(.segment))]
pub struct Hl7Error {
    /// The kind of error.
    pub kind: Hl7ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Segment number the error was found in (1-based, 0 when unknown).
    pub segment: usize,
    /// Additional context (e.g., the path expression being parsed).
    pub context: Option<String>,
}

fn segment_suffix(segment: &usize) -> String {
    if *segment == 0 {
        String::new()
    } else {
        format!(" in segment {}", segment)
    }
}

impl Hl7Error {
    /// Create a new error.
    pub fn new(kind: Hl7ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            segment: 0,
            context: None,
        }
    }

    /// Add the segment number.
    pub fn in_segment(mut self, segment: usize) -> Self {
        self.segment = segment;
        self
    }

    /// Add context information.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(Hl7ErrorKind::Format, message)
    }

    pub fn misuse(message: impl Into<String>) -> Self {
        Self::new(Hl7ErrorKind::Misuse, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(Hl7ErrorKind::Security, message)
    }
}

/// Result type for HL7 operations.
pub type Hl7Result<T> = Result<T, Hl7Error>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Hl7ErrorKind Display tests ====================

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", Hl7ErrorKind::Format), "FormatError");
        assert_eq!(format!("{}", Hl7ErrorKind::Misuse), "MisuseError");
        assert_eq!(format!("{}", Hl7ErrorKind::Security), "SecurityError");
    }

    #[test]
    fn test_error_kind_equality() {
        assert_eq!(Hl7ErrorKind::Format, Hl7ErrorKind::Format);
        assert_ne!(Hl7ErrorKind::Format, Hl7ErrorKind::Misuse);
    }

    // ==================== Hl7Error Display tests ====================

    #[test]
    fn test_error_display_without_segment() {
        let err = Hl7Error::format("duplicate separator '|'");
        assert_eq!(err.to_string(), "FormatError: duplicate separator '|'");
    }

    #[test]
    fn test_error_display_with_segment() {
        let err = Hl7Error::security("too many fields").in_segment(3);
        let msg = err.to_string();
        assert!(msg.contains("SecurityError"));
        assert!(msg.contains("segment 3"));
        assert!(msg.contains("too many fields"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Hl7Error::format("position is not an integer").with_context("PID.x");
        assert_eq!(err.context.as_deref(), Some("PID.x"));
    }

    // ==================== Convenience constructor tests ====================

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(Hl7Error::format("x").kind, Hl7ErrorKind::Format);
        assert_eq!(Hl7Error::misuse("x").kind, Hl7ErrorKind::Misuse);
        assert_eq!(Hl7Error::security("x").kind, Hl7ErrorKind::Security);
        assert_eq!(Hl7Error::misuse("x").segment, 0);
    }

    #[test]
    fn test_error_is_std_error() {
        fn accepts_error<E: std::error::Error>(_: E) {}
        accepts_error(Hl7Error::format("test"));
    }

    #[test]
    fn test_error_chained_builders() {
        let err = Hl7Error::misuse("repeating field")
            .in_segment(2)
            .with_context("PID.3");
        assert_eq!(err.segment, 2);
        assert_eq!(err.context, Some("PID.3".to_string()));
    }
}
