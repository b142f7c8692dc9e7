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

//! Incremental element builder.
//!
//! [`IncrementalBuilder`] consumes a message one character at a time and
//! produces the same [`ElementTree`] as [`ElementTree::build`] does for the
//! whole text.
//!
//! The builder is a pushdown automaton over an explicit stack of open
//! frames: the current segment, its fields, the repetitions of the current
//! field, their components and subcomponents. A delimiter never walks parent
//! links. It closes the frames below its own level and opens a sibling at
//! that level. A completed segment is written to the tree at its terminator.
//!
//! Before the first character can be classified the builder needs the
//! delimiter block (the first 8 characters) and the line-ending style. Input
//! is buffered until both are known, bounded by
//! [`StreamingConfig::max_detect_bytes`].

use crate::error::{StreamError, StreamResult};
use hl7_core::delimiters::{HEADER_SEGMENTS, MIN_HEADER_LEN};
use hl7_core::escape::{CharClass, EscapeScanner};
use hl7_core::{Delimiters, ElementKind, ElementTree, LineEnding, Limits, NodeId, Separator};

/// Configuration for streaming.
///
/// # Examples
///
/// ```rust
/// use hl7_stream::StreamingConfig;
/// use hl7_core::LineEnding;
///
/// let config = StreamingConfig {
///     line_ending: Some(LineEnding::Lf),
///     buffer_size: 8 * 1024,
///     ..StreamingConfig::default()
/// };
/// assert_eq!(config.max_detect_bytes, 64 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Buffer size for reading input.
    ///
    /// Default: 64KB
    pub buffer_size: usize,

    /// Segment terminator to use instead of detecting one.
    ///
    /// Default: None (detect)
    pub line_ending: Option<LineEnding>,

    /// Upper bound on the input buffered while detecting the line ending.
    ///
    /// A message whose first line break is a lone LF cannot be told apart
    /// from a mixed CR/LF message until a CR shows up or the input ends. Once
    /// this many bytes are buffered the builder commits to LF (or to the CR
    /// default when no line break was seen at all).
    ///
    /// Default: 64KB
    pub max_detect_bytes: usize,

    /// Security limits.
    pub limits: Limits,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            line_ending: None,
            max_detect_bytes: 64 * 1024,
            limits: Limits::default(),
        }
    }
}

/// Incremental builder for one message.
///
/// # Examples
///
/// ```rust
/// use hl7_core::{Delimiters, ElementTree};
/// use hl7_stream::IncrementalBuilder;
///
/// let text = "MSH|^~\\&|APP\rPID|1||123~456";
/// let mut builder = IncrementalBuilder::new();
/// for chunk in ["MSH|^~\\&|A", "PP\rPID|1||12", "3~456"] {
///     builder.push_str(chunk).unwrap();
/// }
/// let tree = builder.finish().unwrap();
///
/// let whole = ElementTree::build(text, Delimiters::from_header(text).unwrap()).unwrap();
/// assert_eq!(tree, whole);
/// ```
#[derive(Debug)]
pub struct IncrementalBuilder {
    config: StreamingConfig,
    phase: Phase,
    bytes: usize,
}

#[derive(Debug)]
enum Phase {
    Detecting(Detector),
    Building(Box<Building>),
}

impl Default for IncrementalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::with_config(StreamingConfig::default())
    }

    /// Create a builder that detects delimiters from the input.
    pub fn with_config(config: StreamingConfig) -> Self {
        Self {
            config,
            phase: Phase::Detecting(Detector::default()),
            bytes: 0,
        }
    }

    /// Create a builder for input whose delimiters are already known.
    pub fn with_delimiters(delimiters: Delimiters, config: StreamingConfig) -> Self {
        Self {
            phase: Phase::Building(Box::new(Building::new(delimiters))),
            config,
            bytes: 0,
        }
    }

    /// The delimiters in use, once detection is complete.
    pub fn delimiters(&self) -> Option<&Delimiters> {
        match &self.phase {
            Phase::Detecting(_) => None,
            Phase::Building(building) => Some(building.tree.delimiters()),
        }
    }

    /// Number of segments written to the tree so far.
    pub fn segments_completed(&self) -> usize {
        match &self.phase {
            Phase::Detecting(_) => 0,
            Phase::Building(building) => building.segments,
        }
    }

    /// Feed a chunk of text.
    pub fn push_str(&mut self, text: &str) -> StreamResult<()> {
        text.chars().try_for_each(|c| self.push_char(c))
    }

    /// Feed one character.
    pub fn push_char(&mut self, c: char) -> StreamResult<()> {
        self.bytes += c.len_utf8();
        if self.bytes > self.config.limits.max_message_size {
            return Err(StreamError::security(
                self.segments_completed() + 1,
                format!(
                    "message too large: exceeds limit of {} bytes",
                    self.config.limits.max_message_size
                ),
            ));
        }

        match &mut self.phase {
            Phase::Building(building) => building.push(c, &self.config.limits),
            Phase::Detecting(detector) => {
                detector.push(c);
                match detector.decide(&self.config, false) {
                    Some(ending) => self.start_building(ending),
                    None => Ok(()),
                }
            }
        }
    }

    /// Complete the message and return its tree.
    pub fn finish(mut self) -> StreamResult<ElementTree> {
        if let Phase::Detecting(detector) = &self.phase {
            let ending = detector
                .decide(&self.config, true)
                .unwrap_or_default();
            self.start_building(ending)?;
        }
        match self.phase {
            Phase::Building(building) => building.finish(&self.config.limits),
            Phase::Detecting(_) => Err(StreamError::format(1, "delimiters were never detected")),
        }
    }

    fn start_building(&mut self, ending: LineEnding) -> StreamResult<()> {
        let buffered = match &mut self.phase {
            Phase::Detecting(detector) => std::mem::take(&mut detector.buffer),
            Phase::Building(_) => return Ok(()),
        };
        let delimiters = Delimiters::from_header_with_ending(&buffered, ending)?;
        let mut building = Box::new(Building::new(delimiters));
        for c in buffered.chars() {
            building.push(c, &self.config.limits)?;
        }
        self.phase = Phase::Building(building);
        Ok(())
    }
}

/// Buffers the head of the input until delimiters can be derived.
#[derive(Debug, Default)]
struct Detector {
    buffer: String,
    chars: usize,
    first_cr: Option<usize>,
    first_lf: Option<usize>,
}

impl Detector {
    fn push(&mut self, c: char) {
        match c {
            '\r' if self.first_cr.is_none() => self.first_cr = Some(self.buffer.len()),
            '\n' if self.first_lf.is_none() => self.first_lf = Some(self.buffer.len()),
            _ => {}
        }
        self.buffer.push(c);
        self.chars += 1;
    }

    /// Line ending to build with, once it and the header are known.
    fn decide(&self, config: &StreamingConfig, at_end: bool) -> Option<LineEnding> {
        if self.chars < MIN_HEADER_LEN && !at_end {
            return None;
        }
        if let Some(ending) = config.line_ending {
            return Some(ending);
        }

        let exhausted = at_end || self.buffer.len() >= config.max_detect_bytes;
        match (self.first_cr, self.first_lf) {
            (Some(cr), Some(lf)) if lf == cr + 1 => Some(LineEnding::CrLf),
            (Some(_), Some(_)) => Some(LineEnding::Cr),
            // The character after the first CR decides.
            (Some(cr), None) if cr + 1 < self.buffer.len() || at_end => Some(LineEnding::Cr),
            (Some(_), None) => None,
            (None, Some(_)) if exhausted => Some(LineEnding::Lf),
            (None, None) if exhausted => Some(LineEnding::Cr),
            (None, _) => None,
        }
    }
}

/// Open frames of the segment being read.
#[derive(Debug)]
struct OpenSegment {
    fields: Vec<OpenField>,
    /// A structural delimiter was seen.
    structured: bool,
}

#[derive(Debug)]
struct OpenField {
    reps: Vec<OpenValue>,
    /// Header encoding characters, kept verbatim.
    literal: bool,
}

#[derive(Debug)]
struct OpenValue {
    components: Vec<OpenComponent>,
}

#[derive(Debug)]
struct OpenComponent {
    subs: Vec<String>,
}

impl Default for OpenSegment {
    fn default() -> Self {
        Self {
            fields: vec![OpenField::default()],
            structured: false,
        }
    }
}

impl Default for OpenField {
    fn default() -> Self {
        Self {
            reps: vec![OpenValue::default()],
            literal: false,
        }
    }
}

impl Default for OpenValue {
    fn default() -> Self {
        Self {
            components: vec![OpenComponent::default()],
        }
    }
}

impl Default for OpenComponent {
    fn default() -> Self {
        Self {
            subs: vec![String::new()],
        }
    }
}

fn last<T: Default>(items: &mut Vec<T>) -> &mut T {
    if items.is_empty() {
        items.push(T::default());
    }
    let end = items.len() - 1;
    &mut items[end]
}

impl OpenSegment {
    fn field(&mut self) -> &mut OpenField {
        last(&mut self.fields)
    }

    fn value(&mut self) -> &mut OpenValue {
        last(&mut self.field().reps)
    }

    fn component(&mut self) -> &mut OpenComponent {
        last(&mut self.value().components)
    }

    fn text(&mut self) -> &mut String {
        last(&mut self.component().subs)
    }

    /// The segment name, if field 0 is still plain text.
    fn plain_name(&self) -> Option<&str> {
        match self.fields.as_slice() {
            [field] => match field.reps.as_slice() {
                [value] => match value.components.as_slice() {
                    [component] => match component.subs.as_slice() {
                        [name] => Some(name.as_str()),
                        _ => None,
                    },
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Building {
    tree: ElementTree,
    delimiters: Delimiters,
    scanner: EscapeScanner,
    segment: OpenSegment,
    segments: usize,
    /// Reading the header encoding characters.
    literal: bool,
    /// CRLF mode: a CR arrived and the next character decides.
    pending_cr: bool,
}

impl Building {
    fn new(delimiters: Delimiters) -> Self {
        Self {
            tree: ElementTree::new(delimiters),
            delimiters,
            scanner: EscapeScanner::new(),
            segment: OpenSegment::default(),
            segments: 0,
            literal: false,
            pending_cr: false,
        }
    }

    fn push(&mut self, c: char, limits: &Limits) -> StreamResult<()> {
        if self.pending_cr {
            self.pending_cr = false;
            if c == '\n' {
                return self.end_segment(limits);
            }
            self.content('\r', limits)?;
        }

        match (self.delimiters.segment(), c) {
            (LineEnding::Cr, '\r') | (LineEnding::Lf, '\n') => self.end_segment(limits),
            (LineEnding::CrLf, '\r') => {
                self.pending_cr = true;
                Ok(())
            }
            _ => self.content(c, limits),
        }
    }

    /// A character inside a segment.
    fn content(&mut self, c: char, limits: &Limits) -> StreamResult<()> {
        let d = self.delimiters;
        if self.literal {
            if c == d.field() {
                self.literal = false;
                self.scanner.reset();
                return self.open_field(false, limits);
            }
            self.segment.text().push(c);
            return Ok(());
        }

        if self.scanner.classify(c, &d) != CharClass::Delimiter {
            self.segment.text().push(c);
            return Ok(());
        }

        self.segment.structured = true;
        if c == d.field() {
            let header = self
                .segment
                .plain_name()
                .is_some_and(|name| HEADER_SEGMENTS.contains(&name));
            self.literal = header;
            self.open_field(header, limits)
        } else if c == d.repetition() {
            self.segment.field().reps.push(OpenValue::default());
            Ok(())
        } else if c == d.component() {
            self.segment.value().components.push(OpenComponent::default());
            Ok(())
        } else {
            self.segment.component().subs.push(String::new());
            Ok(())
        }
    }

    fn open_field(&mut self, literal: bool, limits: &Limits) -> StreamResult<()> {
        self.segment.fields.push(OpenField {
            literal,
            ..OpenField::default()
        });
        if self.segment.fields.len() > limits.max_fields_per_segment {
            return Err(StreamError::security(
                self.segments + 1,
                format!(
                    "too many fields: {} exceeds limit {}",
                    self.segment.fields.len(),
                    limits.max_fields_per_segment
                ),
            ));
        }
        Ok(())
    }

    /// Write the open segment to the tree.
    fn end_segment(&mut self, limits: &Limits) -> StreamResult<()> {
        let number = self.segments + 1;
        if number > limits.max_segments {
            return Err(StreamError::security(
                number,
                format!("too many segments: limit is {}", limits.max_segments),
            ));
        }

        let segment = std::mem::take(&mut self.segment);
        self.write_segment(segment)
            .map_err(|e| StreamError::from(e.in_segment(number)))?;
        self.segments = number;
        self.scanner.reset();
        self.literal = false;
        Ok(())
    }

    fn write_segment(&mut self, mut segment: OpenSegment) -> hl7_core::Hl7Result<()> {
        let root = self.tree.root_id();
        if !segment.structured {
            let text = std::mem::take(segment.text());
            self.tree.push_leaf(root, ElementKind::Segment, text)?;
            return Ok(());
        }

        let d = self.delimiters;
        let id = self
            .tree
            .push_branch(root, ElementKind::Segment, Separator::Char(d.field()))?;
        for field in segment.fields {
            self.write_field(id, field)?;
        }
        Ok(())
    }

    fn write_field(&mut self, parent: NodeId, mut field: OpenField) -> hl7_core::Hl7Result<()> {
        if field.literal || field.reps.len() == 1 {
            let value = field.reps.pop().unwrap_or_default();
            return self.write_value(parent, ElementKind::Field, value);
        }
        let id = self.tree.push_branch(
            parent,
            ElementKind::Field,
            Separator::Char(self.delimiters.repetition()),
        )?;
        for value in field.reps {
            self.write_value(id, ElementKind::FieldRepetition, value)?;
        }
        Ok(())
    }

    fn write_value(
        &mut self,
        parent: NodeId,
        kind: ElementKind,
        mut value: OpenValue,
    ) -> hl7_core::Hl7Result<()> {
        if value.components.len() == 1 && value.components[0].subs.len() == 1 {
            let text = value.components.pop().and_then(|mut c| c.subs.pop());
            self.tree.push_leaf(parent, kind, text.unwrap_or_default())?;
            return Ok(());
        }
        let id = self.tree.push_branch(
            parent,
            kind,
            Separator::Char(self.delimiters.component()),
        )?;
        for mut component in value.components {
            if component.subs.len() == 1 {
                let text = component.subs.pop().unwrap_or_default();
                self.tree.push_leaf(id, ElementKind::Component, text)?;
                continue;
            }
            let sub_id = self.tree.push_branch(
                id,
                ElementKind::Component,
                Separator::Char(self.delimiters.subcomponent()),
            )?;
            for text in component.subs {
                self.tree.push_leaf(sub_id, ElementKind::Subcomponent, text)?;
            }
        }
        Ok(())
    }

    fn finish(mut self, limits: &Limits) -> StreamResult<ElementTree> {
        if self.pending_cr {
            self.pending_cr = false;
            self.content('\r', limits)?;
        }
        self.end_segment(limits)?;
        Ok(self.tree)
    }
}
