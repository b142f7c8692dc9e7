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

//! Path expression parsing.

use crate::error::{Hl7Error, Hl7Result};
use crate::limits::Limits;
use std::fmt;
use std::str::FromStr;

/// Which repetition a path level asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repetition {
    /// No bracket suffix, or `[0]`: the first occurrence.
    #[default]
    Unspecified,
    /// `[]`: the container holding every repetition.
    All,
    /// `[n]`: the n-th occurrence, 1-based.
    Index(usize),
}

/// One level of a path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CriteriaElement {
    /// The level was present in the path.
    pub enabled: bool,
    /// `*`: the level imposes no constraint.
    pub skip: bool,
    /// 1-based position.
    pub position: Option<usize>,
    pub repetition: Repetition,
    /// Text to match instead of a position.
    pub literal: Option<String>,
}

impl CriteriaElement {
    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skip {
            f.write_str("*")?;
        } else if let Some(literal) = &self.literal {
            if literal.chars().count() == 3 && !literal.contains(['.', '/', '[', ']', '\'']) {
                f.write_str(literal)?;
            } else {
                write!(f, "'{}'", literal)?;
            }
        } else if let Some(position) = self.position {
            write!(f, "{}", position)?;
        }
        match self.repetition {
            Repetition::Unspecified => Ok(()),
            Repetition::All => f.write_str("[]"),
            Repetition::Index(n) => write!(f, "[{}]", n),
        }
    }
}

/// A parsed path: segment, field, component and subcomponent criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchCriteria {
    pub segment: CriteriaElement,
    pub field: CriteriaElement,
    pub component: CriteriaElement,
    pub subcomponent: CriteriaElement,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Segment,
    Other,
}

impl SearchCriteria {
    /// Criteria selecting the first segment named `name`.
    pub fn for_segment(name: impl Into<String>) -> Self {
        Self {
            segment: CriteriaElement {
                enabled: true,
                literal: Some(name.into()),
                ..CriteriaElement::default()
            },
            ..Self::default()
        }
    }

    /// Parse a path expression with default limits.
    pub fn parse(path: &str) -> Hl7Result<Self> {
        Self::parse_with_limits(path, &Limits::default())
    }

    /// Parse a path expression.
    ///
    /// The separator is `/` when one occurs after the first character,
    /// `.` otherwise. Tokens beyond the fourth are ignored.
    ///
    /// # Errors
    ///
    /// `Security` if the path is longer than `limits.max_path_length`.
    /// `Format` for a missing segment literal, a non-integer position,
    /// unbalanced brackets or an unterminated quote.
    pub fn parse_with_limits(path: &str, limits: &Limits) -> Hl7Result<Self> {
        if path.len() > limits.max_path_length {
            return Err(Hl7Error::security(format!(
                "path length {} exceeds limit {}",
                path.len(),
                limits.max_path_length
            )));
        }

        let separator = if path.chars().skip(1).any(|c| c == '/') {
            '/'
        } else {
            '.'
        };
        let tokens = tokenize(path, separator).map_err(|e| e.with_context(path))?;

        let mut criteria = Self::default();
        let slots = [
            &mut criteria.segment,
            &mut criteria.field,
            &mut criteria.component,
            &mut criteria.subcomponent,
        ];
        for (i, (slot, token)) in slots.into_iter().zip(tokens).enumerate() {
            let kind = if i == 0 { Slot::Segment } else { Slot::Other };
            *slot = parse_token(token, kind).map_err(|e| e.with_context(path))?;
        }
        Ok(criteria)
    }
}

impl FromStr for SearchCriteria {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels = [&self.segment, &self.field, &self.component, &self.subcomponent];
        for (i, level) in levels.iter().filter(|l| l.enabled).enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            level.write(f)?;
        }
        Ok(())
    }
}

/// Split on `separator` outside single quotes.
fn tokenize(path: &str, separator: char) -> Hl7Result<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        } else if c == separator && !in_quote {
            tokens.push(&path[start..i]);
            start = i + c.len_utf8();
        }
    }
    if in_quote {
        return Err(Hl7Error::format("unterminated quoted literal"));
    }
    tokens.push(&path[start..]);
    Ok(tokens)
}

fn parse_token(token: &str, slot: Slot) -> Hl7Result<CriteriaElement> {
    let (base, repetition) = split_repetition(token)?;
    let mut element = CriteriaElement {
        enabled: true,
        repetition,
        ..CriteriaElement::default()
    };

    if base == "*" {
        element.skip = true;
        return Ok(element);
    }

    if let Some(inner) = base.strip_prefix('\'') {
        let literal = match inner.find('\'') {
            Some(end) if end + 1 == inner.len() => &inner[..end],
            Some(_) => {
                return Err(Hl7Error::format(format!(
                    "unexpected text after quoted literal in '{}'",
                    token
                )))
            }
            None => return Err(Hl7Error::format("unterminated quoted literal")),
        };
        if slot == Slot::Segment && literal.is_empty() {
            return Err(Hl7Error::format("segment type or wildcard expected"));
        }
        element.literal = Some(literal.to_string());
        return Ok(element);
    }

    match slot {
        Slot::Segment if base.chars().count() == 3 => {
            element.literal = Some(base.to_string());
        }
        Slot::Segment => {
            return Err(Hl7Error::format(format!(
                "segment type or wildcard expected, found '{}'",
                base
            )))
        }
        Slot::Other => {
            if let Ok(position) = base.parse::<usize>() {
                element.position = Some(position);
            } else if base.chars().count() == 3 {
                element.literal = Some(base.to_string());
            } else {
                return Err(Hl7Error::format(format!(
                    "position is not an integer: '{}'",
                    base
                )));
            }
        }
    }
    Ok(element)
}

/// Split a trailing `[n]` / `[]` off a token.
fn split_repetition(token: &str) -> Hl7Result<(&str, Repetition)> {
    // Brackets inside a leading quoted literal are content.
    let scan_from = match token.strip_prefix('\'') {
        Some(rest) => rest.find('\'').map(|end| end + 2).unwrap_or(token.len()),
        None => 0,
    };
    let suffix = &token[scan_from..];
    let open = suffix.find('[');
    let close = suffix.find(']');

    match (open, close) {
        (None, None) => Ok((token, Repetition::Unspecified)),
        (Some(open), Some(close))
            if close == suffix.len() - 1
                && open < close
                && suffix[open + 1..close].find(['[', ']']).is_none()
                && suffix[..open].find(['[', ']']).is_none() =>
        {
            let inner = &suffix[open + 1..close];
            let repetition = if inner.is_empty() {
                Repetition::All
            } else {
                match inner.parse::<usize>() {
                    Ok(0) => Repetition::Unspecified,
                    Ok(n) => Repetition::Index(n),
                    Err(_) => {
                        return Err(Hl7Error::format(format!(
                            "repetition is not an integer: '{}'",
                            inner
                        )))
                    }
                }
            };
            Ok((&token[..scan_from + open], repetition))
        }
        _ => Err(Hl7Error::format(format!("unbalanced brackets in '{}'", token))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Hl7ErrorKind;

    fn parse(path: &str) -> SearchCriteria {
        path.parse().unwrap()
    }

    fn parse_err(path: &str) -> Hl7Error {
        path.parse::<SearchCriteria>().unwrap_err()
    }

    // ==================== Basic paths ====================

    #[test]
    fn test_segment_only() {
        let c = parse("MSH");
        assert!(c.segment.enabled);
        assert_eq!(c.segment.literal.as_deref(), Some("MSH"));
        assert!(!c.field.enabled);
        assert_eq!(c, SearchCriteria::for_segment("MSH"));
    }

    #[test]
    fn test_full_depth() {
        let c = parse("PID.5.1.2");
        assert_eq!(c.field.position, Some(5));
        assert_eq!(c.component.position, Some(1));
        assert_eq!(c.subcomponent.position, Some(2));
    }

    #[test]
    fn test_slash_separator() {
        assert_eq!(parse("PID/5/1"), parse("PID.5.1"));
    }

    #[test]
    fn test_leading_slash_does_not_select_separator() {
        let err = parse_err("/PID.3");
        assert_eq!(err.kind, Hl7ErrorKind::Format);
    }

    #[test]
    fn test_extra_tokens_ignored() {
        assert_eq!(parse("PID.1.2.3.4.5"), parse("PID.1.2.3"));
    }

    // ==================== Repetitions ====================

    #[test]
    fn test_repetition_suffixes() {
        assert_eq!(parse("PID.3[2]").field.repetition, Repetition::Index(2));
        assert_eq!(parse("PID.3[]").field.repetition, Repetition::All);
        assert_eq!(parse("PID.3[0]").field.repetition, Repetition::Unspecified);
        assert_eq!(parse("OBX[2]").segment.repetition, Repetition::Index(2));
        assert_eq!(parse("OBR[1].16[2]").field.position, Some(16));
    }

    #[test]
    fn test_unbalanced_brackets() {
        for path in ["PID.3[2", "PID.3]", "PID.3[[2]]", "PID.3[2]x", "PID[.3]"] {
            let err = parse_err(path);
            assert_eq!(err.kind, Hl7ErrorKind::Format, "{}", path);
        }
    }

    #[test]
    fn test_repetition_not_an_integer() {
        assert!(parse_err("PID.3[x]").message.contains("repetition is not an integer"));
    }

    // ==================== Wildcards and literals ====================

    #[test]
    fn test_wildcard_segment() {
        let c = parse("*.3.2");
        assert!(c.segment.skip);
        assert_eq!(c.field.position, Some(3));
        assert_eq!(c.component.position, Some(2));
    }

    #[test]
    fn test_quoted_literal() {
        let c = parse("'ZPD'.'A.B'");
        assert_eq!(c.segment.literal.as_deref(), Some("ZPD"));
        assert_eq!(c.field.literal.as_deref(), Some("A.B"));
    }

    #[test]
    fn test_quoted_literal_with_brackets() {
        let c = parse("PID.'[x]'[2]");
        assert_eq!(c.field.literal.as_deref(), Some("[x]"));
        assert_eq!(c.field.repetition, Repetition::Index(2));
    }

    #[test]
    fn test_bare_three_char_literal_in_field_slot() {
        assert_eq!(parse("*.ABC").field.literal.as_deref(), Some("ABC"));
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(parse_err("PID.'abc").message.contains("unterminated"));
    }

    // ==================== Rejections ====================

    #[test]
    fn test_segment_slot_rejects_non_literal() {
        let err = parse_err("34A2");
        assert_eq!(err.kind, Hl7ErrorKind::Format);
        assert!(err.message.contains("segment type or wildcard expected"));
        assert!(parse_err("").message.contains("segment type or wildcard expected"));
        assert!(parse_err("''.3").message.contains("segment type or wildcard expected"));
    }

    #[test]
    fn test_text_after_quoted_literal() {
        for path in ["PID.'abc'x", "'PID'Z.3", "PID.'abc'x[2]"] {
            let err = parse_err(path);
            assert_eq!(err.kind, Hl7ErrorKind::Format);
            assert!(err.message.contains("unexpected text after quoted literal"), "{}", path);
        }
    }

    #[test]
    fn test_position_not_an_integer() {
        let err = parse_err("PID.x");
        assert!(err.message.contains("position is not an integer"));
        assert_eq!(err.context.as_deref(), Some("PID.x"));
        assert!(parse_err("PID..3").message.contains("position is not an integer"));
    }

    #[test]
    fn test_path_length_limit() {
        let limits = Limits {
            max_path_length: 4,
            ..Limits::default()
        };
        let err = SearchCriteria::parse_with_limits("PID.3.1", &limits).unwrap_err();
        assert_eq!(err.kind, Hl7ErrorKind::Security);
    }

    // ==================== Display ====================

    #[test]
    fn test_display() {
        assert_eq!(parse("PID/3[2]/1").to_string(), "PID.3[2].1");
        assert_eq!(parse("*.3[]").to_string(), "*.3[]");
        assert_eq!(parse("'Z1'.2").to_string(), "'Z1'.2");
    }
}
