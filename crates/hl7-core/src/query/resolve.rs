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

//! Query resolution over an element tree.

use super::path::{CriteriaElement, Repetition, SearchCriteria};
use crate::delimiters::is_header_segment;
use crate::element::{Element, ElementKind};

/// Locate the element addressed by `criteria`, starting at `start`.
///
/// From the message node the segment criterion selects among the message's
/// non-empty segments. From a segment it must be `*` or match the segment's
/// name. Elements below segment level resolve relative to their segment.
///
/// Header segments (`MSH`, `BHS`, `FHS`) count fields from the field
/// delimiter itself, so their field positions are read with an offset of -1:
/// `MSH.2` is the encoding characters and `MSH.9` the message type.
///
/// Anything absent resolves to the tree's not-found sentinel.
pub fn resolve<'a>(start: Element<'a>, criteria: &SearchCriteria) -> Element<'a> {
    let not_found = start.tree().not_found();

    let segment = match start.kind() {
        ElementKind::Message => select_segment(start, &criteria.segment),
        _ if !start.is_found() => None,
        _ => start
            .segment()
            .filter(|segment| segment_matches(*segment, &criteria.segment)),
    };
    let Some(segment) = segment else {
        return not_found;
    };

    if !criteria.field.enabled {
        return segment;
    }

    let field = match select_field(segment, &criteria.field) {
        Some(field) => field,
        None => return not_found,
    };

    let field = if field.kind() == ElementKind::Field {
        match criteria.field.repetition {
            Repetition::All => return field,
            Repetition::Unspecified if field.is_repeating() => field.child(0),
            Repetition::Unspecified => Some(field),
            Repetition::Index(n) if field.is_repeating() => field.child(n.saturating_sub(1)),
            Repetition::Index(1) => Some(field),
            Repetition::Index(_) => None,
        }
    } else {
        Some(field)
    };

    field
        .and_then(|field| descend(field, &criteria.component))
        .and_then(|component| descend(component, &criteria.subcomponent))
        .unwrap_or(not_found)
}

fn segment_matches(segment: Element<'_>, criterion: &CriteriaElement) -> bool {
    if !criterion.enabled || criterion.skip {
        return true;
    }
    match &criterion.literal {
        Some(name) => segment.segment_name() == Some(name.as_str()),
        None => false,
    }
}

fn select_segment<'a>(message: Element<'a>, criterion: &CriteriaElement) -> Option<Element<'a>> {
    let occurrence = match criterion.repetition {
        Repetition::Index(n) => n.saturating_sub(1),
        Repetition::Unspecified | Repetition::All => 0,
    };
    message
        .children()
        .filter(|segment| !segment.is_empty_segment())
        .filter(|segment| segment_matches(*segment, criterion))
        .nth(occurrence)
}

fn select_field<'a>(segment: Element<'a>, criterion: &CriteriaElement) -> Option<Element<'a>> {
    if criterion.skip {
        return Some(segment);
    }
    if let Some(literal) = &criterion.literal {
        return match_literal(segment, literal);
    }
    let position = criterion.position?;
    let index = if segment.segment_name().is_some_and(is_header_segment) {
        position.checked_sub(1)?
    } else {
        position
    };
    segment.indexed_child(index)
}

/// Apply a component or subcomponent criterion.
fn descend<'a>(node: Element<'a>, criterion: &CriteriaElement) -> Option<Element<'a>> {
    if !criterion.enabled || criterion.skip {
        return Some(node);
    }
    if let Some(literal) = &criterion.literal {
        return match_literal(node, literal);
    }
    let position = criterion.position?.checked_sub(1)?;
    if node.is_leaf() {
        return (position == 0).then_some(node);
    }
    node.child(position)
}

/// First child rendering as `literal`; a leaf matches itself.
fn match_literal<'a>(node: Element<'a>, literal: &str) -> Option<Element<'a>> {
    if node.is_leaf() {
        return (node.value().ok()? == literal).then_some(node);
    }
    node.children().find(|child| child.to_text() == literal)
}
