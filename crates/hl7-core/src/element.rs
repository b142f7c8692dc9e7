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

//! The element tree.
//!
//! A parsed message is a five-level hierarchy
//! `Message → Segment → Field → [FieldRepetition] → Component → Subcomponent`.
//! Nodes live in an arena ([`ElementTree`]) and refer to each other by
//! [`NodeId`]; parents are plain indices, never owning pointers.
//!
//! Every node is either a leaf holding its raw text or a branch holding the
//! separator that joins its children. [`Element`] is a cheap, copyable view of
//! one node and carries all the read operations.
//!
//! Slot zero of every arena holds an empty leaf, the *not found* sentinel.
//! Queries that address something absent return it instead of failing, so
//! chained lookups keep working:
//!
//! ```
//! use hl7_core::parse;
//!
//! let msg = parse("MSH|^~\\&|APP\rPID|1||123").unwrap();
//! let missing = msg.get("PID.30.2").unwrap();
//! assert!(!missing.is_found());
//! assert_eq!(missing.to_text(), "");
//! ```

use crate::delimiters::{is_header_segment, Delimiters, LineEnding};
use crate::error::{Hl7Error, Hl7Result};
use crate::escape::unescape_text;
use std::borrow::Cow;
use std::fmt;

/// Index of a node in its [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The not-found sentinel.
    pub const NOT_FOUND: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Nesting level of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    Message,
    Segment,
    Field,
    /// One occurrence of a repeating field.
    FieldRepetition,
    Component,
    Subcomponent,
}

impl ElementKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Message => "Message",
            Self::Segment => "Segment",
            Self::Field => "Field",
            Self::FieldRepetition => "FieldRepetition",
            Self::Component => "Component",
            Self::Subcomponent => "Subcomponent",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What joins the children of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    /// Segment terminator, used by the message node.
    Terminator(LineEnding),
    /// Field, repetition, component or subcomponent delimiter.
    Char(char),
}

impl Separator {
    fn write(&self, out: &mut String) {
        match self {
            Self::Terminator(ending) => out.push_str(ending.as_str()),
            Self::Char(c) => out.push(*c),
        }
    }
}

#[derive(Debug, Clone)]
enum Content {
    Leaf(String),
    Branch {
        separator: Separator,
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: ElementKind,
    parent: Option<NodeId>,
    /// Position among the parent's children.
    index: usize,
    content: Content,
}

/// Arena holding every node of one parsed message.
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    delimiters: Delimiters,
}

impl ElementTree {
    /// Create a tree with an empty message node.
    pub fn new(delimiters: Delimiters) -> Self {
        let sentinel = NodeData {
            kind: ElementKind::Subcomponent,
            parent: None,
            index: 0,
            content: Content::Leaf(String::new()),
        };
        let root = NodeData {
            kind: ElementKind::Message,
            parent: None,
            index: 0,
            content: Content::Branch {
                separator: Separator::Terminator(delimiters.segment()),
                children: Vec::new(),
            },
        };
        Self {
            nodes: vec![sentinel, root],
            root: NodeId(1),
            delimiters,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn root(&self) -> Element<'_> {
        self.element(self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// The empty sentinel returned by lookups that find nothing.
    pub fn not_found(&self) -> Element<'_> {
        self.element(NodeId::NOT_FOUND)
    }

    /// View a node. Ids from another tree, or out of range, give the sentinel.
    pub fn element(&self, id: NodeId) -> Element<'_> {
        let id = if id.0 < self.nodes.len() {
            id
        } else {
            NodeId::NOT_FOUND
        };
        Element { tree: self, id }
    }

    /// Append a leaf under `parent`.
    pub fn push_leaf(
        &mut self,
        parent: NodeId,
        kind: ElementKind,
        value: impl Into<String>,
    ) -> Hl7Result<NodeId> {
        self.push(parent, kind, Content::Leaf(value.into()))
    }

    /// Append an empty branch under `parent`.
    pub fn push_branch(
        &mut self,
        parent: NodeId,
        kind: ElementKind,
        separator: Separator,
    ) -> Hl7Result<NodeId> {
        self.push(
            parent,
            kind,
            Content::Branch {
                separator,
                children: Vec::new(),
            },
        )
    }

    fn push(&mut self, parent: NodeId, kind: ElementKind, content: Content) -> Hl7Result<NodeId> {
        let id = NodeId(self.nodes.len());
        let index = match self.nodes.get_mut(parent.0) {
            Some(NodeData {
                content: Content::Branch { children, .. },
                ..
            }) if parent != NodeId::NOT_FOUND => {
                children.push(id);
                children.len() - 1
            }
            _ => {
                return Err(Hl7Error::misuse(format!(
                    "cannot attach a {} below node {}: not a branch",
                    kind,
                    parent.0
                )))
            }
        };
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            index,
            content,
        });
        Ok(id)
    }

    /// Move the last child of `target`'s parent into `target`'s slot.
    ///
    /// Used to swap a freshly built subtree in for an existing one. The
    /// replaced nodes stay in the arena but are no longer reachable.
    pub(crate) fn replace_with_last_sibling(&mut self, target: NodeId) -> Hl7Result<()> {
        let (parent, index) = match self.nodes.get(target.0) {
            Some(NodeData {
                parent: Some(parent),
                index,
                ..
            }) if target != NodeId::NOT_FOUND => (*parent, *index),
            _ => return Err(Hl7Error::misuse("cannot replace a detached node")),
        };
        let moved = match &mut self.nodes[parent.0].content {
            Content::Branch { children, .. } if children.len() > index + 1 => {
                let moved = children.pop();
                if let Some(moved) = moved {
                    children[index] = moved;
                }
                moved
            }
            _ => None,
        };
        match moved {
            Some(moved) => {
                self.nodes[moved.0].index = index;
                Ok(())
            }
            None => Err(Hl7Error::misuse("no replacement subtree to move")),
        }
    }

    /// Render the whole message back to text.
    pub fn to_text(&self) -> String {
        self.root().to_text()
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

impl PartialEq for ElementTree {
    fn eq(&self, other: &Self) -> bool {
        self.delimiters == other.delimiters && self.root() == other.root()
    }
}

impl Eq for ElementTree {}

impl fmt::Display for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A view of one node in an [`ElementTree`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    tree: &'a ElementTree,
    id: NodeId,
}

impl<'a> Element<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a ElementTree {
        self.tree
    }

    fn data(&self) -> &'a NodeData {
        self.tree.node(self.id)
    }

    fn child_ids(&self) -> &'a [NodeId] {
        match &self.data().content {
            Content::Leaf(_) => &[],
            Content::Branch { children, .. } => children,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.data().kind
    }

    /// `false` for the not-found sentinel.
    pub fn is_found(&self) -> bool {
        self.id != NodeId::NOT_FOUND
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.data().content, Content::Leaf(_))
    }

    /// The separator joining this node's children, `None` for a leaf.
    pub fn separator(&self) -> Option<Separator> {
        match &self.data().content {
            Content::Leaf(_) => None,
            Content::Branch { separator, .. } => Some(*separator),
        }
    }

    /// The raw text of a leaf.
    ///
    /// # Errors
    ///
    /// A segment's scalar value is its name. Any other branch returns a
    /// `Misuse` error. A repeating field gets its own message so that callers
    /// do not silently read only the first repetition. Use
    /// [`to_text`](Self::to_text) to render any node.
    pub fn value(&self) -> Hl7Result<&'a str> {
        match &self.data().content {
            Content::Leaf(value) => Ok(value),
            Content::Branch { children, .. } => {
                if self.kind() == ElementKind::Segment {
                    if let Some(name) = self.child(0).and_then(|first| first.value().ok()) {
                        return Ok(name);
                    }
                }
                let err = if self.is_repeating() {
                    Hl7Error::misuse(format!(
                        "field repeats {} times; index a repetition or use repetitions()",
                        children.len()
                    ))
                } else {
                    Hl7Error::misuse(format!(
                        "{} has {} children and no scalar value; use to_text()",
                        self.kind(),
                        children.len()
                    ))
                };
                Err(err.with_context(self.reference_path()))
            }
        }
    }

    /// The leaf value with escape sequences decoded.
    pub fn decoded_value(&self) -> Hl7Result<Cow<'a, str>> {
        Ok(unescape_text(self.value()?, &self.tree.delimiters))
    }

    /// Render this node and everything below it back to source text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    /// Append the source text of this node to `out`.
    pub fn write_text(&self, out: &mut String) {
        match &self.data().content {
            Content::Leaf(value) => out.push_str(value),
            Content::Branch {
                separator,
                children,
            } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        separator.write(out);
                    }
                    self.tree.element(*child).write_text(out);
                }
            }
        }
    }

    pub fn child_count(&self) -> usize {
        self.child_ids().len()
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let tree = self.tree;
        self.child_ids().iter().map(move |id| tree.element(*id))
    }

    /// Child at 0-based index `i`.
    pub fn child(&self, i: usize) -> Option<Element<'a>> {
        self.child_ids().get(i).map(|id| self.tree.element(*id))
    }

    /// Child `i`, or the node itself when `i` is 0 and it has no such child.
    pub fn indexed_child(&self, i: usize) -> Option<Element<'a>> {
        match self.child(i) {
            Some(child) => Some(child),
            None if i == 0 => Some(*self),
            None => None,
        }
    }

    /// Value of child `i`; never fails.
    ///
    /// Falls back to this node's own value for `i == 0` and to the empty
    /// string otherwise, or when the addressed node is a branch.
    pub fn child_value(&self, i: usize) -> &'a str {
        match self.child(i) {
            Some(child) => child.value().unwrap_or(""),
            None if i == 0 => self.value().unwrap_or(""),
            None => "",
        }
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.data().parent.map(|id| self.tree.element(id))
    }

    /// Position among the parent's children (0-based).
    pub fn index(&self) -> usize {
        self.data().index
    }

    /// Whether this is a field split into repetitions.
    pub fn is_repeating(&self) -> bool {
        self.kind() == ElementKind::Field
            && self
                .child(0)
                .is_some_and(|c| c.kind() == ElementKind::FieldRepetition)
    }

    /// The repetitions of a repeating field, or the element itself.
    pub fn repetitions(&self) -> Vec<Element<'a>> {
        if self.is_repeating() {
            self.children().collect()
        } else if self.is_found() {
            vec![*self]
        } else {
            Vec::new()
        }
    }

    /// The segment this node belongs to (itself for a segment).
    pub fn segment(&self) -> Option<Element<'a>> {
        let mut current = *self;
        loop {
            match current.kind() {
                ElementKind::Segment if current.is_found() => return Some(current),
                ElementKind::Message => return None,
                _ => current = current.parent()?,
            }
        }
    }

    /// Name of the enclosing segment (`"PID"`).
    pub fn segment_name(&self) -> Option<&'a str> {
        let segment = self.segment()?;
        match segment.child(0) {
            Some(first) => first.value().ok(),
            None => segment.value().ok(),
        }
    }

    /// Whether this is an empty segment (blank line).
    pub fn is_empty_segment(&self) -> bool {
        self.kind() == ElementKind::Segment && self.is_leaf() && self.child_value(0).is_empty()
    }

    /// Logical address of this node, such as `OBX[2].5.1` or `PID.3[2].1`.
    ///
    /// Header segments number their fields from the field delimiter, so
    /// `MSH.9` is the ninth field. Empty for the message and the sentinel.
    pub fn reference_path(&self) -> String {
        if !self.is_found() {
            return String::new();
        }
        let mut parts: Vec<String> = Vec::new();
        let mut current = *self;
        loop {
            match current.kind() {
                ElementKind::Message => return String::new(),
                ElementKind::Segment => {
                    parts.push(segment_label(current));
                    break;
                }
                ElementKind::Field => {
                    let offset = if current.segment_name().is_some_and(is_header_segment) {
                        1
                    } else {
                        0
                    };
                    parts.push(format!(".{}", current.index() + offset));
                }
                ElementKind::FieldRepetition => parts.push(format!("[{}]", current.index() + 1)),
                ElementKind::Component | ElementKind::Subcomponent => {
                    parts.push(format!(".{}", current.index() + 1))
                }
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        parts.iter().rev().map(String::as_str).collect()
    }

    /// Resolve a path expression relative to this node.
    ///
    /// # Errors
    ///
    /// Returns a `Format` error if the path does not parse. An address that
    /// does not exist yields the sentinel, not an error.
    pub fn get(&self, path: &str) -> Hl7Result<Element<'a>> {
        let criteria: crate::query::SearchCriteria = path.parse()?;
        Ok(crate::query::resolve(*self, &criteria))
    }

    /// Serializable copy of this subtree.
    #[cfg(feature = "serde")]
    pub fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            kind: self.kind(),
            path: self.reference_path(),
            value: self.value().ok().map(str::to_string),
            children: self.children().map(|c| c.snapshot()).collect(),
        }
    }
}

fn segment_label(segment: Element<'_>) -> String {
    let name = segment.segment_name().unwrap_or("");
    let occurrence = segment
        .parent()
        .map(|root| {
            root.children()
                .take(segment.index())
                .filter(|s| s.segment_name() == Some(name))
                .count()
        })
        .unwrap_or(0);
    if occurrence > 0 {
        format!("{}[{}]", name, occurrence + 1)
    } else {
        name.to_string()
    }
}

impl PartialEq for Element<'_> {
    /// Structural equality: same kind, same leaf text, same separators and
    /// equal children.
    fn eq(&self, other: &Self) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match (&self.data().content, &other.data().content) {
            (Content::Leaf(a), Content::Leaf(b)) => a == b,
            (
                Content::Branch {
                    separator: sa,
                    children: ca,
                },
                Content::Branch {
                    separator: sb,
                    children: cb,
                },
            ) => sa == sb && ca.len() == cb.len() && self.children().eq(other.children()),
            _ => false,
        }
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind())
            .field("id", &self.id.0)
            .field("text", &self.to_text())
            .finish()
    }
}

impl fmt::Display for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Owned, serializable copy of a subtree.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementSnapshot {
    pub kind: ElementKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSnapshot>,
}
