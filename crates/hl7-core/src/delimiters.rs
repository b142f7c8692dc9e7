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

//! Delimiter table: the structural alphabet of an HL7 v2 message.
//!
//! Every message carries six structural characters. Five of them are
//! declared positionally at the start of the header segment:
//!
//! ```text
//! MSH|^~\&
//!    ││││└ subcomponent
//!    │││└─ escape
//!    ││└── repetition
//!    │└─── component
//!    └──── field
//! ```
//!
//! The sixth, the segment terminator, is not declared anywhere; it is
//! detected from the line-ending style of the text (see [`LineEnding::detect`]).

use crate::error::{Hl7Error, Hl7Result};
use std::fmt;

/// Segment names that declare the message delimiters.
pub const HEADER_SEGMENTS: [&str; 3] = ["MSH", "BHS", "FHS"];

/// Length of the shortest header that declares a full delimiter block (`MSH|^~\&`).
pub const MIN_HEADER_LEN: usize = 8;

/// Check whether a segment name denotes a header segment.
#[inline]
pub fn is_header_segment(name: &str) -> bool {
    HEADER_SEGMENTS.contains(&name)
}

/// Segment terminator style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// Carriage return, the HL7 default.
    #[default]
    Cr,
    /// Line feed.
    Lf,
    /// Carriage return followed by line feed.
    CrLf,
}

impl LineEnding {
    /// The terminator as text.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Detect the line-ending style of a message.
    ///
    /// Looks at the first CR and the first LF in the text: CR only gives
    /// [`LineEnding::Cr`], LF only gives [`LineEnding::Lf`], an LF directly
    /// after the first CR gives [`LineEnding::CrLf`]. Anything else falls back
    /// to the default CR.
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        let cr = memchr::memchr(b'\r', bytes);
        let lf = memchr::memchr(b'\n', bytes);
        match (cr, lf) {
            (Some(_), None) => Self::Cr,
            (None, Some(_)) => Self::Lf,
            (Some(cr), Some(lf)) if lf == cr + 1 => Self::CrLf,
            _ => Self::Cr,
        }
    }

    fn contains(&self, c: char) -> bool {
        match self {
            Self::Cr => c == '\r',
            Self::Lf => c == '\n',
            Self::CrLf => c == '\r' || c == '\n',
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cr => write!(f, "CR"),
            Self::Lf => write!(f, "LF"),
            Self::CrLf => write!(f, "CRLF"),
        }
    }
}

/// The delimiter set of one message.
///
/// Immutable once derived. All six roles are held by distinct characters;
/// [`Delimiters::new`] rejects sets that reuse a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delimiters {
    segment: LineEnding,
    field: char,
    repetition: char,
    component: char,
    subcomponent: char,
    escape: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            segment: LineEnding::Cr,
            field: '|',
            repetition: '~',
            component: '^',
            subcomponent: '&',
            escape: '\\',
        }
    }
}

impl Delimiters {
    /// Build a delimiter set, rejecting duplicate characters.
    pub fn new(
        segment: LineEnding,
        field: char,
        repetition: char,
        component: char,
        subcomponent: char,
        escape: char,
    ) -> Hl7Result<Self> {
        let delimiters = Self {
            segment,
            field,
            repetition,
            component,
            subcomponent,
            escape,
        };
        delimiters.validate()?;
        Ok(delimiters)
    }

    /// Derive the delimiter set from the start of a message.
    ///
    /// Text that does not start with a header segment name yields the default
    /// set. The segment terminator always comes from [`LineEnding::detect`].
    pub fn from_header(text: &str) -> Hl7Result<Self> {
        Self::from_header_with_ending(text, LineEnding::detect(text))
    }

    /// Derive the delimiter set from the start of a message, using a known
    /// segment terminator.
    pub fn from_header_with_ending(text: &str, segment: LineEnding) -> Hl7Result<Self> {
        let mut head = ['\0'; MIN_HEADER_LEN];
        let mut len = 0;
        for (slot, c) in head.iter_mut().zip(text.chars()) {
            *slot = c;
            len += 1;
        }

        let starts_with_header = len >= 3
            && HEADER_SEGMENTS
                .iter()
                .any(|name| name.chars().eq(head[..3].iter().copied()));
        if !starts_with_header {
            return Ok(Self::default().with_line_ending(segment));
        }

        if len < MIN_HEADER_LEN {
            return Err(Hl7Error::format(format!(
                "message shorter than a minimal header: expected {} characters, found {}",
                MIN_HEADER_LEN, len
            ))
            .in_segment(1));
        }

        // MSH|^~\& : field, component, repetition, escape, subcomponent
        Self::new(segment, head[3], head[5], head[4], head[7], head[6]).map_err(|e| e.in_segment(1))
    }

    /// Replace the segment terminator.
    pub fn with_line_ending(mut self, segment: LineEnding) -> Self {
        self.segment = segment;
        self
    }

    fn validate(&self) -> Hl7Result<()> {
        let structural = self.structural();
        for (i, &c) in structural.iter().enumerate() {
            if structural[i + 1..].contains(&c) || self.segment.contains(c) {
                return Err(Hl7Error::format(format!(
                    "duplicate separator {:?} in delimiter set",
                    c
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub const fn segment(&self) -> LineEnding {
        self.segment
    }

    #[inline]
    pub const fn field(&self) -> char {
        self.field
    }

    #[inline]
    pub const fn repetition(&self) -> char {
        self.repetition
    }

    #[inline]
    pub const fn component(&self) -> char {
        self.component
    }

    #[inline]
    pub const fn subcomponent(&self) -> char {
        self.subcomponent
    }

    #[inline]
    pub const fn escape(&self) -> char {
        self.escape
    }

    /// Field, repetition, component, subcomponent and escape, in that order.
    pub const fn structural(&self) -> [char; 5] {
        [
            self.field,
            self.repetition,
            self.component,
            self.subcomponent,
            self.escape,
        ]
    }

    /// Check whether `c` splits fields, repetitions, components or subcomponents.
    #[inline]
    pub fn is_structural(&self, c: char) -> bool {
        c == self.field || c == self.repetition || c == self.component || c == self.subcomponent
    }

    /// The encoding characters as declared in a header (`^~\&`).
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    /// Check whether `text` is exactly the encoding characters field.
    pub fn is_encoding_characters(&self, text: &str) -> bool {
        text.chars()
            .eq([self.component, self.repetition, self.escape, self.subcomponent])
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} ({})", self.field, self.encoding_characters(), self.segment)
    }
}
