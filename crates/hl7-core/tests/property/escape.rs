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

//! Property-based tests for the escape codec.

use hl7_core::escape::{apply_escape, remove_escape, split_unescaped, SENTINEL};
use hl7_core::{escape_text, unescape_text, Delimiters};
use proptest::prelude::*;

fn delimiter() -> impl Strategy<Value = char> {
    prop_oneof![Just('|'), Just('~'), Just('^'), Just('&')]
}

/// Text rich in delimiters and escape characters.
fn hl7_text() -> impl Strategy<Value = String> {
    "[a-c|~^&\\\\XEF0-9]{0,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Property: removing the sentinels restores the text.
    #[test]
    fn prop_escape_idempotence(text in hl7_text(), d in delimiter()) {
        prop_assume!(!text.contains(SENTINEL));
        let delimiters = Delimiters::default();
        let applied = apply_escape(&text, d, &delimiters);
        prop_assert_eq!(remove_escape(&applied, d, &delimiters), text.clone());
    }

    /// Property: the zero-copy split agrees with apply, split, remove.
    #[test]
    fn prop_split_equivalence(text in hl7_text(), d in delimiter()) {
        let delimiters = Delimiters::default();
        let applied = apply_escape(&text, d, &delimiters);
        let expected: Vec<String> = applied
            .split(d)
            .map(|piece| remove_escape(piece, d, &delimiters).into_owned())
            .collect();
        prop_assert_eq!(split_unescaped(&text, d, &delimiters), expected);
    }

    /// Property: joining the pieces of a split gives back the text.
    #[test]
    fn prop_split_join(text in hl7_text(), d in delimiter()) {
        let delimiters = Delimiters::default();
        let pieces = split_unescaped(&text, d, &delimiters);
        prop_assert_eq!(pieces.join(&d.to_string()), text);
    }

    /// Property: unescape inverts escape for any text.
    #[test]
    fn prop_escape_text_inverse(text in "\\PC{0,40}|[\\x00-\\x1f|^~&\\\\a-z]{0,20}") {
        let escaped = escape_text(&text);
        prop_assert!(escaped.chars().all(|c| (32..=127).contains(&(c as u32))));
        prop_assert_eq!(unescape_text(&escaped, &Delimiters::default()), text);
    }

    /// Property: escaped text has no structural delimiter left.
    #[test]
    fn prop_escaped_text_has_no_delimiters(text in "[a-z|^~&\\\\]{0,30}") {
        let escaped = escape_text(&text);
        prop_assert!(!escaped.contains(['|', '^', '~', '&']));
    }
}
