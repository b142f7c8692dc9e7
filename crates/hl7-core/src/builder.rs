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

//! Element tree builder.
//!
//! Splits message text level by level:
//!
//! 1. the message on the segment terminator,
//! 2. each segment on the field delimiter,
//! 3. each field on the repetition delimiter (only when one is present),
//! 4. each field or repetition on the component delimiter,
//! 5. each component on the subcomponent delimiter.
//!
//! A node whose text holds no unescaped delimiter of its own level or below
//! becomes a leaf. Recursion depth is fixed by the five levels.
//!
//! Field 1 of a header segment (`MSH`, `BHS`, `FHS`) is the encoding
//! characters field. It is always a leaf and ends at the next field
//! delimiter, whatever precedes it.

use crate::delimiters::{Delimiters, HEADER_SEGMENTS};
use crate::element::{ElementKind, ElementTree, NodeId, Separator};
use crate::error::{Hl7Error, Hl7Result};
use crate::escape::{contains_unescaped, split_unescaped};
use crate::limits::Limits;

impl ElementTree {
    /// Build the tree for `text` under `delimiters`, without limits.
    ///
    /// # Examples
    ///
    /// ```
    /// use hl7_core::{Delimiters, ElementTree};
    ///
    /// let text = "MSH|^~\\&|APP\rPID|1||A^B";
    /// let tree = ElementTree::build(text, Delimiters::from_header(text).unwrap()).unwrap();
    /// assert_eq!(tree.root().child_count(), 2);
    /// assert_eq!(tree.to_text(), text);
    /// ```
    pub fn build(text: &str, delimiters: Delimiters) -> Hl7Result<Self> {
        Self::build_with_limits(text, delimiters, &Limits::unlimited())
    }

    /// Build the tree for `text`, enforcing segment and field limits.
    pub fn build_with_limits(text: &str, delimiters: Delimiters, limits: &Limits) -> Hl7Result<Self> {
        let mut tree = ElementTree::new(delimiters);
        let root = tree.root_id();
        let mut builder = Builder {
            tree: &mut tree,
            delimiters,
            limits,
        };

        for (i, segment) in text.split(delimiters.segment().as_str()).enumerate() {
            if i >= limits.max_segments {
                return Err(Hl7Error::security(format!(
                    "too many segments: limit is {}",
                    limits.max_segments
                ))
                .in_segment(i + 1));
            }
            builder
                .segment(root, segment)
                .map_err(|e| e.in_segment(i + 1))?;
        }
        Ok(tree)
    }

    /// Replace the subtree at `target` with `text` parsed at the same level.
    ///
    /// # Errors
    ///
    /// `Misuse` when `target` is the message, the sentinel, a segment name,
    /// the encoding characters, or when `text` holds a delimiter that does
    /// not belong at the target's level.
    pub fn replace_text(&mut self, target: NodeId, text: &str) -> Hl7Result<()> {
        let delimiters = *self.delimiters();
        let element = self.element(target);
        if !element.is_found() {
            return Err(Hl7Error::misuse("cannot write to an element that does not exist"));
        }
        let kind = element.kind();
        let path = element.reference_path();
        let parent = match element.parent() {
            Some(parent) => parent.id(),
            None => return Err(Hl7Error::misuse("cannot replace the message node")),
        };
        let header = element
            .segment_name()
            .is_some_and(|name| HEADER_SEGMENTS.contains(&name));
        let index = element.index();

        if kind == ElementKind::Field && (index == 0 || (header && index == 1)) {
            return Err(Hl7Error::misuse("segment names and encoding characters are read-only")
                .with_context(path));
        }

        let forbidden: &[char] = match kind {
            ElementKind::Message | ElementKind::Segment => &[],
            ElementKind::Field => &[delimiters.field()],
            ElementKind::FieldRepetition => &[delimiters.field(), delimiters.repetition()],
            ElementKind::Component => &[
                delimiters.field(),
                delimiters.repetition(),
                delimiters.component(),
            ],
            ElementKind::Subcomponent => &[
                delimiters.field(),
                delimiters.repetition(),
                delimiters.component(),
                delimiters.subcomponent(),
            ],
        };
        if text.contains(delimiters.segment().as_str())
            || contains_unescaped(text, forbidden, &delimiters)
        {
            return Err(Hl7Error::misuse(format!(
                "text contains a delimiter not allowed in a {}",
                kind
            ))
            .with_context(path));
        }

        let limits = Limits::unlimited();
        let mut builder = Builder {
            tree: self,
            delimiters,
            limits: &limits,
        };
        match kind {
            ElementKind::Segment => builder.segment(parent, text)?,
            ElementKind::Field => builder.field(parent, text)?,
            ElementKind::FieldRepetition => builder.value(parent, ElementKind::FieldRepetition, text)?,
            ElementKind::Component => builder.component(parent, text)?,
            _ => builder.tree.push_leaf(parent, kind, text).map(|_| ())?,
        }
        self.replace_with_last_sibling(target)
    }
}

/// Split a segment into its field texts, honouring the literal header field.
pub(crate) fn split_fields<'a>(text: &'a str, delimiters: &Delimiters) -> Vec<&'a str> {
    let field = delimiters.field();
    let header = HEADER_SEGMENTS.iter().find(|name| {
        text.strip_prefix(**name)
            .is_some_and(|rest| rest.starts_with(field))
    });
    let Some(name) = header else {
        return split_unescaped(text, field, delimiters);
    };

    let rest = &text[name.len() + field.len_utf8()..];
    let mut pieces = vec![&text[..name.len()]];
    match rest.find(field) {
        Some(end) => {
            pieces.push(&rest[..end]);
            pieces.extend(split_unescaped(
                &rest[end + field.len_utf8()..],
                field,
                delimiters,
            ));
        }
        None => pieces.push(rest),
    }
    pieces
}

struct Builder<'t> {
    tree: &'t mut ElementTree,
    delimiters: Delimiters,
    limits: &'t Limits,
}

impl Builder<'_> {
    fn segment(&mut self, parent: NodeId, text: &str) -> Hl7Result<()> {
        let d = self.delimiters;
        let fields = split_fields(text, &d);
        let structural = [d.field(), d.repetition(), d.component(), d.subcomponent()];
        if fields.len() == 1 && !contains_unescaped(text, &structural, &d) {
            self.tree.push_leaf(parent, ElementKind::Segment, text)?;
            return Ok(());
        }
        if fields.len() > self.limits.max_fields_per_segment {
            return Err(Hl7Error::security(format!(
                "too many fields: {} exceeds limit {}",
                fields.len(),
                self.limits.max_fields_per_segment
            )));
        }

        let header = HEADER_SEGMENTS.contains(&fields[0]);
        let segment = self
            .tree
            .push_branch(parent, ElementKind::Segment, Separator::Char(d.field()))?;
        for (i, field) in fields.iter().enumerate() {
            if header && i == 1 {
                self.tree.push_leaf(segment, ElementKind::Field, *field)?;
            } else {
                self.field(segment, field)?;
            }
        }
        Ok(())
    }

    fn field(&mut self, parent: NodeId, text: &str) -> Hl7Result<()> {
        let d = self.delimiters;
        if !contains_unescaped(text, &[d.repetition()], &d) {
            return self.value(parent, ElementKind::Field, text);
        }
        let field = self
            .tree
            .push_branch(parent, ElementKind::Field, Separator::Char(d.repetition()))?;
        for repetition in split_unescaped(text, d.repetition(), &d) {
            self.value(field, ElementKind::FieldRepetition, repetition)?;
        }
        Ok(())
    }

    /// A field or a repetition: split on components.
    fn value(&mut self, parent: NodeId, kind: ElementKind, text: &str) -> Hl7Result<()> {
        let d = self.delimiters;
        if !contains_unescaped(text, &[d.component(), d.subcomponent()], &d) {
            self.tree.push_leaf(parent, kind, text)?;
            return Ok(());
        }
        let value = self
            .tree
            .push_branch(parent, kind, Separator::Char(d.component()))?;
        for component in split_unescaped(text, d.component(), &d) {
            self.component(value, component)?;
        }
        Ok(())
    }

    fn component(&mut self, parent: NodeId, text: &str) -> Hl7Result<()> {
        let d = self.delimiters;
        if !contains_unescaped(text, &[d.subcomponent()], &d) {
            self.tree.push_leaf(parent, ElementKind::Component, text)?;
            return Ok(());
        }
        let component = self.tree.push_branch(
            parent,
            ElementKind::Component,
            Separator::Char(d.subcomponent()),
        )?;
        for sub in split_unescaped(text, d.subcomponent(), &d) {
            self.tree.push_leaf(component, ElementKind::Subcomponent, sub)?;
        }
        Ok(())
    }
}
