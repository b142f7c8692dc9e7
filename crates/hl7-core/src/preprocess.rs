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

//! Input preprocessing for HL7 parsing.

use crate::delimiters::{HEADER_SEGMENTS, MIN_HEADER_LEN};
use crate::error::{Hl7Error, Hl7Result};
use crate::limits::Limits;

/// Validate raw bytes and return the message text.
///
/// This handles:
/// - Size limits
/// - UTF-8 validation
/// - BOM skipping
pub fn preprocess_bytes<'a>(input: &'a [u8], limits: &Limits) -> Hl7Result<&'a str> {
    check_size(input.len(), limits)?;
    let text = std::str::from_utf8(input)
        .map_err(|e| Hl7Error::format(format!("invalid UTF-8 encoding: {}", e)))?;
    Ok(strip_bom(text))
}

/// Size check and BOM skipping for text that is already decoded.
pub fn preprocess_text<'a>(input: &'a str, limits: &Limits) -> Hl7Result<&'a str> {
    check_size(input.len(), limits)?;
    Ok(strip_bom(input))
}

fn check_size(len: usize, limits: &Limits) -> Hl7Result<()> {
    // Don't reveal the exact input size.
    if len > limits.max_message_size {
        return Err(Hl7Error::security(format!(
            "message too large: exceeds limit of {} bytes",
            limits.max_message_size
        )));
    }
    Ok(())
}

#[inline]
fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Check that `text` opens with a complete header segment.
pub fn check_header(text: &str) -> Hl7Result<()> {
    let len = text.chars().take(MIN_HEADER_LEN).count();
    if len < MIN_HEADER_LEN {
        return Err(Hl7Error::format(format!(
            "message shorter than a minimal header: expected {} characters, found {}",
            MIN_HEADER_LEN, len
        ))
        .in_segment(1));
    }
    if !HEADER_SEGMENTS.iter().any(|name| text.starts_with(name)) {
        return Err(Hl7Error::format(
            "message must start with a header segment (MSH, BHS or FHS)",
        )
        .in_segment(1));
    }
    Ok(())
}
