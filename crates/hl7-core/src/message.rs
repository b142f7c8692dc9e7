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

//! Message facade.
//!
//! A [`Message`] owns the element tree of one parsed message and the
//! delimiter set it was parsed with. It adds segment-level lookups, path
//! resolution and writes on top of the tree.

use crate::delimiters::{is_header_segment, Delimiters};
use crate::element::{Element, ElementTree};
use crate::error::{Hl7Error, Hl7Result};
use crate::limits::Limits;
use crate::query::{resolve, SearchCriteria};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// One parsed HL7 v2 message.
///
/// Equality compares the trees; the limits a message was parsed with are
/// not part of its content.
#[derive(Debug, Clone)]
pub struct Message {
    tree: ElementTree,
    limits: Limits,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl Eq for Message {}

impl Message {
    /// Parse a message with default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use hl7_core::Message;
    ///
    /// let msg = Message::parse("MSH|^~\\&|LAB||||||ORU^R01|42|P|2.5\rPID|1").unwrap();
    /// assert_eq!(msg.message_type(), "ORU^R01");
    /// assert_eq!(msg.get("PID.1").unwrap().value().unwrap(), "1");
    /// ```
    pub fn parse(text: &str) -> Hl7Result<Self> {
        crate::parser::parse(text)
    }

    /// Wrap a tree built elsewhere, for example by the streaming builder.
    ///
    /// # Errors
    ///
    /// `Format` if the first segment is not a header segment.
    pub fn from_tree(tree: ElementTree) -> Hl7Result<Self> {
        let first = tree.root().child(0).and_then(|s| s.segment_name());
        match first {
            Some(name) if is_header_segment(name) => Ok(Self {
                tree,
                limits: Limits::default(),
            }),
            _ => Err(Hl7Error::format(
                "message must start with a header segment (MSH, BHS or FHS)",
            )
            .in_segment(1)),
        }
    }

    /// Replace the limits applied to later queries and writes.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn into_tree(self) -> ElementTree {
        self.tree
    }

    pub fn delimiters(&self) -> &Delimiters {
        self.tree.delimiters()
    }

    pub fn root(&self) -> Element<'_> {
        self.tree.root()
    }

    /// Non-empty segments in document order.
    pub fn segments(&self) -> impl Iterator<Item = Element<'_>> {
        self.root().children().filter(|s| !s.is_empty_segment())
    }

    /// All segments named `name`, in document order.
    pub fn all_segments(&self, name: &str) -> Vec<Element<'_>> {
        self.segments()
            .filter(|s| s.segment_name() == Some(name))
            .collect()
    }

    pub fn segment_names(&self) -> Vec<&str> {
        self.segments().filter_map(|s| s.segment_name()).collect()
    }

    /// Resolve a path expression such as `PID.5.1` or `OBX[2].5`.
    ///
    /// # Errors
    ///
    /// `Format` if the path does not parse, `Security` if it is longer than
    /// the message's `max_path_length`. Addresses that do not exist resolve
    /// to the not-found sentinel.
    pub fn get(&self, path: &str) -> Hl7Result<Element<'_>> {
        let criteria = SearchCriteria::parse_with_limits(path, &self.limits)?;
        Ok(resolve(self.root(), &criteria))
    }

    /// Resolve pre-parsed criteria.
    pub fn resolve(&self, criteria: &SearchCriteria) -> Element<'_> {
        resolve(self.root(), criteria)
    }

    /// Replace the element at `path` with `text`, parsed at the element's level.
    ///
    /// `text` is raw HL7: delimiters of the target's level and below give it
    /// structure, and content must already be escaped (see
    /// [`escape_text_with`](crate::escape::escape_text_with)).
    ///
    /// # Errors
    ///
    /// `Format` for a bad path. `Misuse` when the path resolves to nothing, to
    /// a segment name or the encoding characters, or when `text` contains a
    /// delimiter above the target's level.
    pub fn set(&mut self, path: &str, text: &str) -> Hl7Result<()> {
        let target = self.get(path)?.id();
        self.tree
            .replace_text(target, text)
            .map_err(|e| e.with_context(path))
    }

    /// `MSH-9` of the header, rendered (`ORU^R01`).
    pub fn message_type(&self) -> String {
        self.header_field(9)
    }

    /// `MSH-10` of the header.
    pub fn control_id(&self) -> String {
        self.header_field(10)
    }

    /// `MSH-12` of the header.
    pub fn version(&self) -> String {
        self.header_field(12)
    }

    fn header_field(&self, position: usize) -> String {
        self.root()
            .child(0)
            .and_then(|header| header.child(position - 1))
            .map(|field| field.to_text())
            .unwrap_or_default()
    }

    /// Render the message back to its source text.
    pub fn to_text(&self) -> String {
        self.tree.to_text()
    }
}

impl FromStr for Message {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Escape line breaks embedded in `OBX` segments.
///
/// Free text and base64 payloads in OBX fields often carry raw CR or LF,
/// which would otherwise split the segment. Starting at each segment that
/// begins with `OBX` and the field delimiter, every line break is treated as
/// internal until one is followed by a segment name and a field delimiter
/// (or by the end of the text). Internal CRs become `\X0D\` and LFs `\X0A\`.
/// A CRLF pair counts as one break.
///
/// Text without such OBX runs is returned unchanged.
pub fn escape_obx_crlf<'a>(text: &'a str, delimiters: &Delimiters) -> Cow<'a, str> {
    let field = delimiters.field();
    let esc = delimiters.escape();
    let mut needle = String::from("OBX");
    needle.push(field);

    let bytes = text.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = text[search..].find(&needle) {
        let start = search + found;
        search = start + needle.len();
        if start > 0 && !matches!(bytes[start - 1], b'\r' | b'\n') {
            continue;
        }

        let mut cursor = start;
        let mut internal: Vec<usize> = Vec::new();
        while let Some(offset) = memchr::memchr2(b'\r', b'\n', &bytes[cursor..]) {
            let at = cursor + offset;
            let len = if bytes[at] == b'\r' && bytes.get(at + 1) == Some(&b'\n') {
                2
            } else {
                1
            };
            let next = at + len;
            let remaining = &text[next..];
            if remaining.is_empty() || remaining.chars().nth(3) == Some(field) {
                break;
            }
            internal.extend(at..next);
            cursor = next;
        }

        if internal.is_empty() {
            continue;
        }
        let buf = out.get_or_insert_with(|| String::with_capacity(text.len() + 16));
        for at in internal {
            buf.push_str(&text[copied..at]);
            buf.push(esc);
            buf.push_str(if bytes[at] == b'\r' { "X0D" } else { "X0A" });
            buf.push(esc);
            copied = at + 1;
        }
        search = search.max(cursor);
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}
