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

//! Escape codec.
//!
//! Two separate concerns live here:
//!
//! - **Escape-aware splitting.** A delimiter written right after the escape
//!   character (`\|`) is content, not structure. [`EscapeScanner`] classifies
//!   every character of a segment as text, structural delimiter or escaped
//!   delimiter. [`apply_escape`] / [`remove_escape`] swap protected pairs for a
//!   sentinel and back; [`split_unescaped`] does the same split without
//!   allocating.
//! - **The escape vocabulary.** [`escape_text`] produces `\E\ \F\ \R\ \S\ \T\`
//!   and `\Xhh..\` sequences for outbound content, [`unescape_text`] decodes
//!   them.
//!
//! Escape sequences never span a structural delimiter: a delimiter found
//! inside an unterminated `\...` sequence closes it and splits as usual. This
//! keeps the classification of a character independent of the level being
//! split, so splitting a segment level by level and scanning it once in a
//! single pass agree.

use crate::delimiters::Delimiters;
use std::borrow::Cow;

/// Placeholder substituted for protected `escape + delimiter` pairs.
pub const SENTINEL: char = '\u{1}';

/// Classification of one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Ordinary content, including escape characters.
    Text,
    /// A structural field, repetition, component or subcomponent delimiter.
    Delimiter,
    /// A delimiter directly preceded by the escape character.
    EscapedDelimiter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Idle,
    /// The previous character was an opening escape character.
    Opened,
    /// Inside an escape sequence, waiting for the closing escape character.
    Inside,
}

/// Character classifier shared by the recursive and the streaming builders.
///
/// Feed it the characters of one segment in order. Call [`reset`](Self::reset)
/// at every segment boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeScanner {
    state: ScanState,
}

impl EscapeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the next character.
    pub fn classify(&mut self, c: char, delimiters: &Delimiters) -> CharClass {
        let structural = delimiters.is_structural(c);
        let escape = c == delimiters.escape();
        match self.state {
            ScanState::Idle => {
                if escape {
                    self.state = ScanState::Opened;
                    CharClass::Text
                } else if structural {
                    CharClass::Delimiter
                } else {
                    CharClass::Text
                }
            }
            ScanState::Opened => {
                if structural {
                    self.state = ScanState::Idle;
                    CharClass::EscapedDelimiter
                } else {
                    self.state = if escape {
                        ScanState::Idle
                    } else {
                        ScanState::Inside
                    };
                    CharClass::Text
                }
            }
            ScanState::Inside => {
                if escape {
                    self.state = ScanState::Idle;
                    CharClass::Text
                } else if structural {
                    self.state = ScanState::Idle;
                    CharClass::Delimiter
                } else {
                    CharClass::Text
                }
            }
        }
    }

    /// Whether the last character fed was an opening escape character.
    pub fn is_opened(&self) -> bool {
        self.state == ScanState::Opened
    }

    pub fn reset(&mut self) {
        self.state = ScanState::Idle;
    }
}

#[inline]
pub(crate) fn contains_char(text: &str, c: char) -> bool {
    if c.is_ascii() {
        memchr::memchr(c as u8, text.as_bytes()).is_some()
    } else {
        text.contains(c)
    }
}

/// Replace every protected `escape + delimiter` pair with [`SENTINEL`].
///
/// Text equal to the encoding characters (`^~\&`) is returned unchanged:
/// that field holds the delimiters positionally.
pub fn apply_escape<'a>(text: &'a str, delimiter: char, delimiters: &Delimiters) -> Cow<'a, str> {
    if !contains_char(text, delimiters.escape()) || delimiters.is_encoding_characters(text) {
        return Cow::Borrowed(text);
    }

    let mut scanner = EscapeScanner::new();
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    for c in text.chars() {
        if scanner.classify(c, delimiters) == CharClass::EscapedDelimiter && c == delimiter {
            out.pop();
            out.push(SENTINEL);
            changed = true;
        } else {
            out.push(c);
        }
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Undo [`apply_escape`]: every sentinel becomes `escape + delimiter` again.
pub fn remove_escape<'a>(text: &'a str, delimiter: char, delimiters: &Delimiters) -> Cow<'a, str> {
    if !contains_char(text, SENTINEL) {
        return Cow::Borrowed(text);
    }
    let mut pair = String::with_capacity(2);
    pair.push(delimiters.escape());
    pair.push(delimiter);
    Cow::Owned(text.replace(SENTINEL, &pair))
}

/// Split `text` on the unescaped occurrences of `delimiter`.
///
/// Yields the same pieces as `apply_escape`, a plain split and
/// `remove_escape` on each piece, without copying.
pub fn split_unescaped<'a>(text: &'a str, delimiter: char, delimiters: &Delimiters) -> Vec<&'a str> {
    if !contains_char(text, delimiters.escape()) || delimiters.is_encoding_characters(text) {
        return text.split(delimiter).collect();
    }

    let mut scanner = EscapeScanner::new();
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if scanner.classify(c, delimiters) == CharClass::Delimiter && c == delimiter {
            pieces.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Check whether `text` holds an unescaped occurrence of any of `targets`.
pub fn contains_unescaped(text: &str, targets: &[char], delimiters: &Delimiters) -> bool {
    if !contains_char(text, delimiters.escape()) {
        return text.contains(targets);
    }
    let mut scanner = EscapeScanner::new();
    text.chars()
        .any(|c| scanner.classify(c, delimiters) == CharClass::Delimiter && targets.contains(&c))
}

/// Escape `text` for use as field content under the default delimiters.
pub fn escape_text(text: &str) -> String {
    escape_text_with(text, &Delimiters::default())
}

/// Escape `text` for use as field content under `delimiters`.
///
/// Delimiters become their named sequences. Characters outside the printable
/// range 32..=127 are written as `\Xhh..\` with their UTF-8 bytes, one run per
/// stretch of consecutive non-printable characters.
pub fn escape_text_with(text: &str, delimiters: &Delimiters) -> String {
    let esc = delimiters.escape();
    let mut out = String::with_capacity(text.len() + 8);
    let mut hex_run = String::new();

    for c in text.chars() {
        if !(32..=127).contains(&(c as u32)) {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                hex_run.push_str(&format!("{:02X}", b));
            }
            continue;
        }
        flush_hex(&mut out, &mut hex_run, esc);

        let code = if c == esc {
            Some('E')
        } else if c == delimiters.field() {
            Some('F')
        } else if c == delimiters.repetition() {
            Some('R')
        } else if c == delimiters.component() {
            Some('S')
        } else if c == delimiters.subcomponent() {
            Some('T')
        } else {
            None
        };
        match code {
            Some(code) => {
                out.push(esc);
                out.push(code);
                out.push(esc);
            }
            None => out.push(c),
        }
    }
    flush_hex(&mut out, &mut hex_run, esc);
    out
}

fn flush_hex(out: &mut String, hex_run: &mut String, esc: char) {
    if hex_run.is_empty() {
        return;
    }
    out.push(esc);
    out.push('X');
    out.push_str(hex_run);
    out.push(esc);
    hex_run.clear();
}

/// Decode the escape vocabulary in `text`.
///
/// `\E\ \F\ \R\ \S\ \T\` become the corresponding delimiter and `\Xhh..\`
/// becomes the bytes it spells, read as UTF-8 (invalid sequences are replaced
/// with U+FFFD). Other sequences (`\H\`, `\N\`, `\C..\`, `\M..\`, `\Z..\`),
/// malformed hex runs and unterminated sequences are kept verbatim.
pub fn unescape_text<'a>(text: &'a str, delimiters: &Delimiters) -> Cow<'a, str> {
    let esc = delimiters.escape();
    if !contains_char(text, esc) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(esc) {
        out.push_str(&rest[..open]);
        let after = &rest[open + esc.len_utf8()..];
        let Some(close) = after.find(esc) else {
            out.push_str(&rest[open..]);
            return Cow::Owned(out);
        };
        let body = &after[..close];
        match decode_sequence(body, delimiters) {
            Some(decoded) => out.push_str(&decoded),
            None => {
                out.push(esc);
                out.push_str(body);
                out.push(esc);
            }
        }
        rest = &after[close + esc.len_utf8()..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_sequence(body: &str, delimiters: &Delimiters) -> Option<String> {
    match body {
        "E" => Some(delimiters.escape().to_string()),
        "F" => Some(delimiters.field().to_string()),
        "R" => Some(delimiters.repetition().to_string()),
        "S" => Some(delimiters.component().to_string()),
        "T" => Some(delimiters.subcomponent().to_string()),
        _ => {
            let hex = body.strip_prefix('X')?;
            let bytes = decode_hex(hex)?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d() -> Delimiters {
        Delimiters::default()
    }

    // ==================== Scanner ====================

    #[test]
    fn test_scanner_plain_delimiters() {
        let mut s = EscapeScanner::new();
        assert_eq!(s.classify('A', &d()), CharClass::Text);
        assert_eq!(s.classify('|', &d()), CharClass::Delimiter);
        assert_eq!(s.classify('^', &d()), CharClass::Delimiter);
    }

    #[test]
    fn test_scanner_escaped_delimiter() {
        let mut s = EscapeScanner::new();
        assert_eq!(s.classify('\\', &d()), CharClass::Text);
        assert!(s.is_opened());
        assert_eq!(s.classify('|', &d()), CharClass::EscapedDelimiter);
        assert_eq!(s.classify('|', &d()), CharClass::Delimiter);
    }

    #[test]
    fn test_scanner_named_sequence_is_text() {
        let mut s = EscapeScanner::new();
        let classes: Vec<_> = "\\F\\^".chars().map(|c| s.classify(c, &d())).collect();
        assert_eq!(
            classes,
            vec![CharClass::Text, CharClass::Text, CharClass::Text, CharClass::Delimiter]
        );
    }

    #[test]
    fn test_scanner_unterminated_sequence_closed_by_delimiter() {
        let mut s = EscapeScanner::new();
        for c in "\\XAB".chars() {
            assert_eq!(s.classify(c, &d()), CharClass::Text);
        }
        assert_eq!(s.classify('^', &d()), CharClass::Delimiter);
        assert!(!s.is_opened());
    }

    #[test]
    fn test_scanner_reset() {
        let mut s = EscapeScanner::new();
        s.classify('\\', &d());
        s.reset();
        assert_eq!(s.classify('|', &d()), CharClass::Delimiter);
    }

    // ==================== Sentinel protection ====================

    #[test]
    fn test_apply_escape_protects_pair() {
        let applied = apply_escape("A\\|B|C", '|', &d());
        assert_eq!(applied, "A\u{1}B|C");
        assert_eq!(remove_escape(&applied, '|', &d()), "A\\|B|C");
    }

    #[test]
    fn test_apply_escape_without_escape_borrows() {
        assert!(matches!(apply_escape("A|B", '|', &d()), Cow::Borrowed(_)));
    }

    #[test]
    fn test_apply_escape_only_for_requested_delimiter() {
        assert_eq!(apply_escape("A\\^B", '|', &d()), "A\\^B");
        assert_eq!(apply_escape("A\\^B", '^', &d()), "A\u{1}B");
    }

    #[test]
    fn test_apply_escape_skips_encoding_characters() {
        assert_eq!(apply_escape("^~\\&", '&', &d()), "^~\\&");
    }

    #[test]
    fn test_remove_escape_without_sentinel_borrows() {
        assert!(matches!(remove_escape("plain", '|', &d()), Cow::Borrowed(_)));
    }

    // ==================== Splitting ====================

    #[test]
    fn test_split_plain() {
        assert_eq!(split_unescaped("A|B||C", '|', &d()), vec!["A", "B", "", "C"]);
    }

    #[test]
    fn test_split_keeps_escaped_delimiter() {
        assert_eq!(split_unescaped("A\\|B|C", '|', &d()), vec!["A\\|B", "C"]);
    }

    #[test]
    fn test_split_named_sequence_followed_by_delimiter() {
        assert_eq!(split_unescaped("\\E\\^X", '^', &d()), vec!["\\E\\", "X"]);
    }

    #[test]
    fn test_split_matches_apply_remove() {
        let text = "A\\^B^C\\F\\^\\\\^D";
        let applied = apply_escape(text, '^', &d());
        let expected: Vec<String> = applied
            .split('^')
            .map(|p| remove_escape(p, '^', &d()).into_owned())
            .collect();
        assert_eq!(split_unescaped(text, '^', &d()), expected);
    }

    #[test]
    fn test_contains_unescaped() {
        assert!(contains_unescaped("A^B", &['^'], &d()));
        assert!(!contains_unescaped("A\\^B", &['^'], &d()));
        assert!(!contains_unescaped("ABC", &['^', '&'], &d()));
    }

    // ==================== Escape vocabulary ====================

    #[test]
    fn test_escape_text_named_sequences() {
        assert_eq!(escape_text("a|b~c^d&e\\f"), "a\\F\\b\\R\\c\\S\\d\\T\\e\\E\\f");
    }

    #[test]
    fn test_escape_text_coalesces_hex_run() {
        assert_eq!(escape_text("A\r\nB"), "A\\X0D0A\\B");
        assert_eq!(escape_text("\tX\n"), "\\X09\\X\\X0A\\");
    }

    #[test]
    fn test_escape_text_non_ascii_as_utf8() {
        assert_eq!(escape_text("é"), "\\XC3A9\\");
    }

    #[test]
    fn test_escape_text_with_custom_delimiters() {
        let custom = Delimiters::from_header("MSH#$%*@").unwrap();
        assert_eq!(escape_text_with("a#b*", &custom), "a*F*b*E*");
    }

    #[test]
    fn test_unescape_named_sequences() {
        assert_eq!(unescape_text("a\\F\\b\\S\\c\\E\\", &d()), "a|b^c\\");
    }

    #[test]
    fn test_unescape_hex() {
        assert_eq!(unescape_text("L1\\X0D0A\\L2", &d()), "L1\r\nL2");
        assert_eq!(unescape_text("\\XC3A9\\", &d()), "é");
    }

    #[test]
    fn test_unescape_leaves_unsupported_verbatim() {
        assert_eq!(unescape_text("\\H\\bold\\N\\", &d()), "\\H\\bold\\N\\");
        assert_eq!(unescape_text("\\X0\\", &d()), "\\X0\\");
        assert_eq!(unescape_text("tail\\F", &d()), "tail\\F");
    }

    #[test]
    fn test_escape_unescape_inverse() {
        let original = "Line 1\r\nresult|50^mg & more\\";
        assert_eq!(unescape_text(&escape_text(original), &d()), original);
    }
}
