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

//! Element tree traversal.
//!
//! The visitor pattern separates walking the tree from what is done with
//! each element. Implement [`ElementVisitor`] and override the methods you
//! need; [`traverse`] handles the recursion in document order.
//!
//! # Example
//!
//! ```
//! use hl7_core::traverse::{traverse, ElementVisitor, VisitorContext};
//! use hl7_core::{parse, Element};
//!
//! #[derive(Default)]
//! struct LeafPrinter {
//!     lines: Vec<String>,
//! }
//!
//! impl ElementVisitor for LeafPrinter {
//!     type Error = std::convert::Infallible;
//!
//!     fn visit_leaf(&mut self, leaf: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
//!         self.lines.push(format!("{} = {}", leaf.reference_path(), leaf.child_value(0)));
//!         Ok(())
//!     }
//! }
//!
//! let msg = parse("MSH|^~\\&|APP\rPID|1").unwrap();
//! let mut printer = LeafPrinter::default();
//! traverse(msg.tree(), &mut printer).unwrap();
//! assert!(printer.lines.contains(&"PID.1 = 1".to_string()));
//! ```

use crate::element::{Element, ElementKind, ElementTree};
use std::collections::BTreeMap;

/// Context provided to visitors during traversal.
#[derive(Debug, Clone)]
pub struct VisitorContext<'a> {
    /// Nesting depth (0 = message, 1 = segment, ...).
    pub depth: usize,
    /// 0-based position of the current segment in the message.
    pub segment_index: Option<usize>,
    /// Name of the current segment.
    pub segment_name: Option<&'a str>,
    /// The tree being traversed.
    pub tree: &'a ElementTree,
}

impl<'a> VisitorContext<'a> {
    /// Create a new context for the message level.
    pub fn new(tree: &'a ElementTree) -> Self {
        Self {
            depth: 0,
            segment_index: None,
            segment_name: None,
            tree,
        }
    }

    /// Context for the children of the current element.
    pub fn child(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    fn segment(&self, segment: Element<'a>) -> Self {
        Self {
            depth: self.depth + 1,
            segment_index: Some(segment.index()),
            segment_name: segment.segment_name(),
            tree: self.tree,
        }
    }
}

/// Trait for visiting the elements of a message.
///
/// All methods have default implementations that do nothing.
pub trait ElementVisitor {
    /// Error type returned by visitor methods.
    type Error;

    /// Called before the first segment.
    fn begin_message(&mut self, _message: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after the last segment.
    fn end_message(&mut self, _message: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every segment, including empty ones and segments without fields.
    fn begin_segment(&mut self, _segment: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_segment(&mut self, _segment: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for a field, repetition or component that has children.
    fn begin_branch(&mut self, _element: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_branch(&mut self, _element: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every leaf below segment level.
    fn visit_leaf(&mut self, _leaf: Element<'_>, _ctx: &VisitorContext) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walk `tree` in document order.
pub fn traverse<V: ElementVisitor>(tree: &ElementTree, visitor: &mut V) -> Result<(), V::Error> {
    let ctx = VisitorContext::new(tree);
    let root = tree.root();
    visitor.begin_message(root, &ctx)?;
    for segment in root.children() {
        let seg_ctx = ctx.segment(segment);
        visitor.begin_segment(segment, &seg_ctx)?;
        let child_ctx = seg_ctx.child();
        for field in segment.children() {
            traverse_element(field, visitor, &child_ctx)?;
        }
        visitor.end_segment(segment, &seg_ctx)?;
    }
    visitor.end_message(root, &ctx)
}

fn traverse_element<V: ElementVisitor>(
    element: Element<'_>,
    visitor: &mut V,
    ctx: &VisitorContext,
) -> Result<(), V::Error> {
    if element.is_leaf() {
        return visitor.visit_leaf(element, ctx);
    }
    visitor.begin_branch(element, ctx)?;
    let child_ctx = ctx.child();
    for child in element.children() {
        traverse_element(child, visitor, &child_ctx)?;
    }
    visitor.end_branch(element, ctx)
}

/// Statistics collector visitor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsCollector {
    /// Non-empty segments visited.
    pub segment_count: usize,
    /// Empty segments (blank lines, trailing terminator).
    pub empty_segment_count: usize,
    /// Fields, counting the segment name field.
    pub field_count: usize,
    /// Fields split into repetitions.
    pub repeating_field_count: usize,
    pub repetition_count: usize,
    pub component_count: usize,
    pub subcomponent_count: usize,
    /// Leaves below segment level.
    pub leaf_count: usize,
    /// Maximum depth reached.
    pub max_depth: usize,
    /// Occurrences per segment name.
    pub segments_by_name: BTreeMap<String, usize>,
}

impl StatsCollector {
    fn count(&mut self, element: Element<'_>, ctx: &VisitorContext) {
        self.max_depth = self.max_depth.max(ctx.depth);
        match element.kind() {
            ElementKind::Field => {
                self.field_count += 1;
                if element.is_repeating() {
                    self.repeating_field_count += 1;
                }
            }
            ElementKind::FieldRepetition => self.repetition_count += 1,
            ElementKind::Component => self.component_count += 1,
            ElementKind::Subcomponent => self.subcomponent_count += 1,
            ElementKind::Message | ElementKind::Segment => {}
        }
    }
}

impl ElementVisitor for StatsCollector {
    type Error = std::convert::Infallible;

    fn begin_segment(&mut self, segment: Element<'_>, ctx: &VisitorContext) -> Result<(), Self::Error> {
        self.max_depth = self.max_depth.max(ctx.depth);
        if segment.is_empty_segment() {
            self.empty_segment_count += 1;
            return Ok(());
        }
        self.segment_count += 1;
        let name = ctx.segment_name.unwrap_or_default().to_string();
        *self.segments_by_name.entry(name).or_insert(0) += 1;
        Ok(())
    }

    fn begin_branch(&mut self, element: Element<'_>, ctx: &VisitorContext) -> Result<(), Self::Error> {
        self.count(element, ctx);
        Ok(())
    }

    fn visit_leaf(&mut self, leaf: Element<'_>, ctx: &VisitorContext) -> Result<(), Self::Error> {
        self.leaf_count += 1;
        self.count(leaf, ctx);
        Ok(())
    }
}
