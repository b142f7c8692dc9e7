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

//! Security limits for HL7 parsing.

/// Configurable limits for parser security.
///
/// These limits bound the resources consumed while parsing messages from
/// untrusted peers.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum message size in bytes (default: 64MB).
    pub max_message_size: usize,
    /// Maximum number of segments in one message (default: 100k).
    pub max_segments: usize,
    /// Maximum number of fields in one segment (default: 10k).
    pub max_fields_per_segment: usize,
    /// Maximum length of a path expression in bytes (default: 256).
    pub max_path_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024 * 1024, // 64MB
            max_segments: 100_000,
            max_fields_per_segment: 10_000,
            max_path_length: 256,
        }
    }
}

impl Limits {
    /// Create limits with no restrictions (for testing).
    pub fn unlimited() -> Self {
        Self {
            max_message_size: usize::MAX,
            max_segments: usize::MAX,
            max_fields_per_segment: usize::MAX,
            max_path_length: usize::MAX,
        }
    }
}
