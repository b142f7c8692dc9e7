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

//! HL7 v2 conformance tests.
//!
//! End-to-end checks of parsing, addressing and re-serialization against
//! representative ORU and ADT messages.

use hl7_core::{parse, Hl7ErrorKind, LineEnding, Message, SearchCriteria};

const ORU: &str = "MSH|^~\\&|CERNER||PriorityHealth||||ORU^R01|Q1|P|2.3|\r\
PID|||001677980||SMITH^CURTIS||19680219|M||||||||||929645156318|123456789|\r\
PD1||||1234567890^LAST^FIRST^M^^^^^NPI|\r\
OBR|1|341856649^HNAM_ORDERID|000002006326002362|648088^Basic Metabolic Panel|||20061122151600|||||||||1620^Hooker^Robert^L~1624^Smith^Bill^R||||||20061122154733|||F|||||||||||20061122140000|\r\
OBX|1|NM|GLU^Glucose Lvl|59|mg/dL|65-99^65^99|L|||F|||20061122154733|\r\
OBX|2|NM|ALT^Alanine Aminotransferase|13|IU/L|10-50^10^50|N|||F|||20061122154733|\r";

fn oru() -> Message {
    parse(ORU).unwrap()
}

fn value(msg: &Message, path: &str) -> String {
    msg.get(path).unwrap().to_text()
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_round_trip_exact() {
    assert_eq!(oru().to_text(), ORU);
}

#[test]
fn test_round_trip_lf_and_crlf() {
    for ending in ["\n", "\r\n"] {
        let text = ORU.replace('\r', ending);
        assert_eq!(parse(&text).unwrap().to_text(), text);
    }
}

#[test]
fn test_round_trip_with_escapes() {
    let text = "MSH|^~\\&|A\rNTE|1||Result \\F\\ 50\\S\\mg \\E\\ \\X0D0A\\ and a\\|b\r";
    assert_eq!(parse(text).unwrap().to_text(), text);
}

// =============================================================================
// Field extraction
// =============================================================================

#[test]
fn test_header_fields() {
    let msg = oru();
    assert_eq!(value(&msg, "MSH.3"), "CERNER");
    assert_eq!(value(&msg, "MSH.12"), "2.3");
}

#[test]
fn test_header_offset_message_type() {
    let msg = oru();
    assert_eq!(value(&msg, "MSH.9"), "ORU^R01");
    assert_eq!(value(&msg, "MSH.9.1"), "ORU");
    assert_eq!(value(&msg, "MSH.9.2"), "R01");
    assert_eq!(msg.message_type(), "ORU^R01");
    assert_eq!(msg.control_id(), "Q1");
}

#[test]
fn test_component_depth() {
    let msg = oru();
    assert_eq!(msg.get("PID.5.1").unwrap().value().unwrap(), "SMITH");
    assert_eq!(value(&msg, "PID/5/2"), "CURTIS");
}

// =============================================================================
// Repetitions
// =============================================================================

#[test]
fn test_repetition_indexing() {
    let msg = oru();
    assert_eq!(value(&msg, "OBR.16"), "1620^Hooker^Robert^L");
    assert_eq!(value(&msg, "OBR[1].16[2]"), "1624^Smith^Bill^R");

    let all = msg.get("OBR.16[]").unwrap();
    let reps = all.repetitions();
    assert_eq!(reps.len(), 2);
    assert_eq!(reps[0].to_text(), "1620^Hooker^Robert^L");
    assert_eq!(reps[1].to_text(), "1624^Smith^Bill^R");
}

#[test]
fn test_repeating_field_scalar_access_is_misuse() {
    let msg = oru();
    let err = msg.get("OBR.16[]").unwrap().value().unwrap_err();
    assert_eq!(err.kind, Hl7ErrorKind::Misuse);
}

// =============================================================================
// Segments and wildcards
// =============================================================================

#[test]
fn test_wildcard_cross_segment_query() {
    let msg = oru();
    let criteria: SearchCriteria = "*.3.2".parse().unwrap();
    let names: Vec<String> = msg
        .all_segments("OBX")
        .into_iter()
        .map(|obx| hl7_core::resolve(obx, &criteria).to_text())
        .collect();
    assert_eq!(names, vec!["Glucose Lvl", "Alanine Aminotransferase"]);
}

#[test]
fn test_segment_repetition_addressing() {
    let msg = oru();
    assert_eq!(
        value(&msg, "OBX[2]"),
        "OBX|2|NM|ALT^Alanine Aminotransferase|13|IU/L|10-50^10^50|N|||F|||20061122154733|"
    );
    assert_eq!(value(&msg, "OBX[2].4"), "13");
}

#[test]
fn test_all_segments_in_order() {
    let msg = oru();
    let obx = msg.all_segments("OBX");
    assert_eq!(obx.len(), 2);
    assert_eq!(obx[0].child_value(1), "1");
    assert_eq!(obx[1].child_value(1), "2");
    assert_eq!(obx[1].reference_path(), "OBX[2]");
}

// =============================================================================
// Errors and not-found
// =============================================================================

#[test]
fn test_malformed_path_rejected() {
    let err = "34A2".parse::<SearchCriteria>().unwrap_err();
    assert_eq!(err.kind, Hl7ErrorKind::Format);
    assert!(err.message.contains("segment type or wildcard expected"));

    let err = oru().get("PID.x").unwrap_err();
    assert!(err.message.contains("position is not an integer"));
}

#[test]
fn test_not_found_is_empty() {
    let msg = oru();
    for path in ["PID.99", "PID.5.9", "PID.5.1.4", "OBX[3].5", "ZZZ.1"] {
        let found = msg.get(path).unwrap();
        assert!(!found.is_found(), "{}", path);
        assert_eq!(found.to_text(), "");
        assert_eq!(found.value().unwrap(), "");
    }
}

#[test]
fn test_malformed_header_rejected() {
    for text in ["MSH|^~", "PID|1|2|3|4|5", "MSH|^~~&|A"] {
        let err = parse(text).unwrap_err();
        assert_eq!(err.kind, Hl7ErrorKind::Format, "{:?}", text);
    }
}

// =============================================================================
// OBX line breaks
// =============================================================================

#[test]
fn test_obx_crlf_escaping() {
    let payload = "SGVsbG8g\r\nV29ybGQh\rCg==\n";
    let text = format!(
        "MSH|^~\\&|LAB||||||ORU^R01|1|P|2.5\rOBX|1|ED|PDF||^AP^^Base64^{}\rOBX|2|TX|||done\r",
        payload
    );
    let msg = parse(&text).unwrap();

    assert_eq!(msg.segment_names(), vec!["MSH", "OBX", "OBX"]);
    let data = msg.get("OBX.5.5").unwrap();
    assert!(data.value().unwrap().contains("\\X0D\\\\X0A\\"));
    assert_eq!(data.decoded_value().unwrap(), payload);
    assert_eq!(value(&msg, "OBX[2].5"), "done");
}

#[test]
fn test_obx_line_breaks_in_lf_message() {
    let msg = parse("MSH|^~\\&|A\nOBX|1|ED|AA\nBB\nPID|1\n").unwrap();

    assert_eq!(msg.delimiters().segment(), LineEnding::Lf);
    assert_eq!(msg.segment_names(), vec!["MSH", "OBX", "PID"]);
    let data = msg.get("OBX.3").unwrap();
    assert_eq!(data.value().unwrap(), "AA\\X0A\\BB");
    assert_eq!(data.decoded_value().unwrap(), "AA\nBB");
}

// =============================================================================
// Custom delimiters
// =============================================================================

#[test]
fn test_custom_delimiters() {
    let text = "MSH#$%*@#APP#FAC#####ADT$A01\rPID#1##A$B%C$D";
    let msg = parse(text).unwrap();
    assert_eq!(msg.delimiters().field(), '#');
    assert_eq!(value(&msg, "MSH.9.2"), "A01");
    assert_eq!(value(&msg, "PID.3[2].1"), "C");
    assert_eq!(msg.to_text(), text);
}

// =============================================================================
// Snapshots
// =============================================================================

#[cfg(feature = "serde")]
#[test]
fn test_snapshot_serializes() {
    let msg = oru();
    let snapshot = msg.get("PID.5").unwrap().snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["kind"], "Field");
    assert_eq!(json["path"], "PID.5");
    assert_eq!(json["children"][0]["value"], "SMITH");
    assert_eq!(json["children"][1]["path"], "PID.5.2");
    assert!(json.get("value").is_none());
}
