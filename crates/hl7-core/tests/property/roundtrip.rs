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

//! Property-based tests for parse/render round trips.

use hl7_core::{parse, LineEnding, ParseOptions};
use proptest::prelude::*;

/// Field text drawn from plain characters, delimiters and escape sequences.
fn field() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[A-Za-z0-9 .-]{1,6}",
            Just("^".to_string()),
            Just("~".to_string()),
            Just("&".to_string()),
            Just("\\F\\".to_string()),
            Just("\\X0D0A\\".to_string()),
            Just("\\^".to_string()),
            Just("\\".to_string()),
        ],
        0..6,
    )
    .prop_map(|parts| parts.concat())
}

fn segment() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just("PID"),
            Just("PV1"),
            Just("NK1"),
            Just("OBR"),
            Just("NTE"),
            Just("ZZ1")
        ],
        prop::collection::vec(field(), 0..8),
    )
        .prop_map(|(name, fields)| {
            let mut segment = name.to_string();
            for f in fields {
                segment.push('|');
                segment.push_str(&f);
            }
            segment
        })
}

fn message() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(field(), 0..10),
        prop::collection::vec(segment(), 0..8),
    )
        .prop_map(|(header_fields, segments)| {
            let mut text = String::from("MSH|^~\\&");
            for f in header_fields {
                text.push('|');
                text.push_str(&f);
            }
            for s in segments {
                text.push('\r');
                text.push_str(&s);
            }
            text
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: rendering a parsed message reproduces the input exactly.
    #[test]
    fn prop_round_trip(text in message()) {
        let msg = parse(&text);
        prop_assert!(msg.is_ok(), "Failed to parse: {:?}", msg.err());
        prop_assert_eq!(msg.unwrap().to_text(), text);
    }

    /// Property: the round trip holds for every line-ending style.
    #[test]
    fn prop_round_trip_line_endings(
        text in message(),
        ending in prop_oneof![Just(LineEnding::Lf), Just(LineEnding::CrLf)],
    ) {
        let text = text.replace('\r', ending.as_str());
        let msg = parse(&text).unwrap();
        prop_assert_eq!(msg.delimiters().segment(), if text.contains(ending.as_str()) { ending } else { LineEnding::Cr });
        prop_assert_eq!(msg.to_text(), text);
    }

    /// Property: every segment's reference path resolves back to it.
    #[test]
    fn prop_segment_paths_resolve(text in message()) {
        let msg = parse(&text).unwrap();
        for segment in msg.segments() {
            let path = segment.reference_path();
            let found = msg.get(&path).unwrap();
            prop_assert_eq!(found.id(), segment.id(), "path {}", path);
        }
    }

    /// Property: arbitrary input never panics the parser.
    #[test]
    fn prop_parse_never_panics(text in "\\PC{0,64}") {
        let opts = ParseOptions::builder().max_segments(64).build();
        let _ = hl7_core::parse_with_options(&text, &opts);
    }

    /// Property: arbitrary paths either fail to parse or resolve without panicking.
    #[test]
    fn prop_queries_never_panic(text in message(), path in "[A-Z*0-9.\\[\\]/']{0,16}") {
        let msg = parse(&text).unwrap();
        if let Ok(found) = msg.get(&path) {
            let _ = found.to_text();
            let _ = found.reference_path();
        }
    }
}
