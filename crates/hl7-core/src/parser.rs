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

//! Message parser entry points.
//!
//! Parsing runs in fixed stages:
//!
//! 1. size check and BOM skipping ([`preprocess`](crate::preprocess)),
//! 2. header check and delimiter sniffing,
//! 3. the OBX line-break pre-pass ([`escape_obx_crlf`]),
//! 4. line-ending detection on the pre-processed text,
//! 5. tree building under the configured [`Limits`].

use crate::delimiters::{Delimiters, LineEnding};
use crate::element::ElementTree;
use crate::error::Hl7Result;
use crate::limits::Limits;
use crate::message::{escape_obx_crlf, Message};
use crate::preprocess::{check_header, preprocess_bytes, preprocess_text};
use std::borrow::Cow;

/// Parsing options.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Security limits.
    pub limits: Limits,
    /// Escape raw line breaks inside OBX segments before splitting.
    pub escape_obx_line_breaks: bool,
    /// Segment terminator to use instead of detecting one.
    pub line_ending: Option<LineEnding>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            escape_obx_line_breaks: true,
            line_ending: None,
        }
    }
}

impl ParseOptions {
    /// Create a new builder for ParseOptions.
    ///
    /// # Examples
    ///
    /// ```
    /// use hl7_core::{LineEnding, ParseOptions};
    ///
    /// let opts = ParseOptions::builder()
    ///     .max_segments(500)
    ///     .line_ending(LineEnding::Lf)
    ///     .build();
    /// assert_eq!(opts.limits.max_segments, 500);
    /// ```
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }
}

/// Builder for [`ParseOptions`].
#[derive(Debug, Clone)]
pub struct ParseOptionsBuilder {
    limits: Limits,
    escape_obx_line_breaks: bool,
    line_ending: Option<LineEnding>,
}

impl ParseOptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            escape_obx_line_breaks: true,
            line_ending: None,
        }
    }

    /// Set the maximum message size in bytes (default: 64 MiB).
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.limits.max_message_size = size;
        self
    }

    /// Set the maximum number of segments (default: 100k).
    pub fn max_segments(mut self, count: usize) -> Self {
        self.limits.max_segments = count;
        self
    }

    /// Set the maximum number of fields in one segment (default: 10k).
    pub fn max_fields_per_segment(mut self, count: usize) -> Self {
        self.limits.max_fields_per_segment = count;
        self
    }

    /// Set the maximum path expression length (default: 256).
    pub fn max_path_length(mut self, length: usize) -> Self {
        self.limits.max_path_length = length;
        self
    }

    /// Replace all limits at once.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Enable or disable the OBX line-break pre-pass (default: enabled).
    pub fn escape_obx_line_breaks(mut self, enabled: bool) -> Self {
        self.escape_obx_line_breaks = enabled;
        self
    }

    /// Force the segment terminator instead of detecting it.
    pub fn line_ending(mut self, ending: LineEnding) -> Self {
        self.line_ending = Some(ending);
        self
    }

    /// Build the ParseOptions.
    pub fn build(self) -> ParseOptions {
        ParseOptions {
            limits: self.limits,
            escape_obx_line_breaks: self.escape_obx_line_breaks,
            line_ending: self.line_ending,
        }
    }
}

impl Default for ParseOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an HL7 message with default options.
pub fn parse(text: &str) -> Hl7Result<Message> {
    parse_with_options(text, &ParseOptions::default())
}

/// Parse an HL7 message with custom options.
///
/// # Errors
///
/// `Format` for a short or missing header, an invalid delimiter block or
/// duplicate delimiters. `Security` when a limit is exceeded.
pub fn parse_with_options(text: &str, options: &ParseOptions) -> Hl7Result<Message> {
    let text = preprocess_text(text, &options.limits)?;
    parse_prepared(text, options)
}

/// Parse an HL7 message from raw bytes (must be UTF-8).
pub fn parse_bytes(input: &[u8], options: &ParseOptions) -> Hl7Result<Message> {
    let text = preprocess_bytes(input, &options.limits)?;
    parse_prepared(text, options)
}

fn parse_prepared(text: &str, options: &ParseOptions) -> Hl7Result<Message> {
    check_header(text)?;
    let delimiters = Delimiters::from_header(text)?;

    let text = if options.escape_obx_line_breaks {
        escape_obx_crlf(text, &delimiters)
    } else {
        Cow::Borrowed(text)
    };
    let ending = options
        .line_ending
        .unwrap_or_else(|| LineEnding::detect(&text));
    let delimiters = delimiters.with_line_ending(ending);

    let tree = ElementTree::build_with_limits(&text, delimiters, &options.limits)?;
    Ok(Message::from_tree(tree)?.with_limits(options.limits.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Hl7ErrorKind;

    // ==================== ParseOptions tests ====================

    #[test]
    fn test_default_options() {
        let opts = ParseOptions::default();
        assert!(opts.escape_obx_line_breaks);
        assert_eq!(opts.line_ending, None);
        assert_eq!(opts.limits.max_segments, Limits::default().max_segments);
    }

    #[test]
    fn test_builder_chaining() {
        let opts = ParseOptions::builder()
            .max_message_size(1024)
            .max_fields_per_segment(20)
            .max_path_length(16)
            .escape_obx_line_breaks(false)
            .build();
        assert_eq!(opts.limits.max_message_size, 1024);
        assert_eq!(opts.limits.max_fields_per_segment, 20);
        assert_eq!(opts.limits.max_path_length, 16);
        assert!(!opts.escape_obx_line_breaks);
    }

    #[test]
    fn test_builder_limits_replaces_all() {
        let opts = ParseOptions::builder().limits(Limits::unlimited()).build();
        assert_eq!(opts.limits.max_segments, usize::MAX);
    }

    // ==================== Parsing tests ====================

    #[test]
    fn test_parse_minimal() {
        let msg = parse("MSH|^~\\&").unwrap();
        assert_eq!(msg.segments().count(), 1);
        assert_eq!(msg.to_text(), "MSH|^~\\&");
    }

    #[test]
    fn test_parse_rejects_short_and_headerless() {
        assert_eq!(parse("MSH|^~").unwrap_err().kind, Hl7ErrorKind::Format);
        assert_eq!(parse("PID|1|2|3").unwrap_err().kind, Hl7ErrorKind::Format);
        assert_eq!(parse("").unwrap_err().kind, Hl7ErrorKind::Format);
    }

    #[test]
    fn test_parse_rejects_duplicate_delimiters() {
        let err = parse("MSH|^^\\&|A").unwrap_err();
        assert!(err.message.contains("duplicate separator"));
    }

    #[test]
    fn test_parse_lf_message() {
        let msg = parse("MSH|^~\\&|A\nPID|1\n").unwrap();
        assert_eq!(msg.delimiters().segment(), LineEnding::Lf);
        assert_eq!(msg.segment_names(), vec!["MSH", "PID"]);
    }

    #[test]
    fn test_forced_line_ending() {
        let opts = ParseOptions::builder().line_ending(LineEnding::Lf).build();
        let msg = parse_with_options("MSH|^~\\&|A\rB\nPID|1", &opts).unwrap();
        assert_eq!(msg.segment_names(), vec!["MSH", "PID"]);
        assert_eq!(msg.get("MSH.3").unwrap().value().unwrap(), "A\rB");
    }

    #[test]
    fn test_obx_pre_pass_can_be_disabled() {
        let text = "MSH|^~\\&|A\rOBX|1|TX|one\rtwo\rPID|1";
        assert_eq!(parse(text).unwrap().segments().count(), 3);
        let opts = ParseOptions::builder().escape_obx_line_breaks(false).build();
        assert_eq!(parse_with_options(text, &opts).unwrap().segments().count(), 4);
    }

    #[test]
    fn test_parse_bytes() {
        let msg = parse_bytes(b"MSH|^~\\&|A\rPID|1", &ParseOptions::default()).unwrap();
        assert_eq!(msg.segment_names(), vec!["MSH", "PID"]);
    }

    #[test]
    fn test_path_limit_applies_to_queries() {
        let opts = ParseOptions::builder().max_path_length(4).build();
        let msg = parse_with_options("MSH|^~\\&|A\rPID|1||X^Y", &opts).unwrap();
        assert_eq!(msg.limits().max_path_length, 4);
        assert_eq!(msg.get("PID").unwrap().segment_name(), Some("PID"));

        let err = msg.get("PID.3.2").unwrap_err();
        assert_eq!(err.kind, Hl7ErrorKind::Security);
        let mut msg = msg;
        assert_eq!(msg.set("PID.3.2", "Z").unwrap_err().kind, Hl7ErrorKind::Security);
    }

    #[test]
    fn test_segment_limit_is_security_error() {
        let opts = ParseOptions::builder().max_segments(1).build();
        let err = parse_with_options("MSH|^~\\&|A\rPID|1", &opts).unwrap_err();
        assert_eq!(err.kind, Hl7ErrorKind::Security);
    }
}
