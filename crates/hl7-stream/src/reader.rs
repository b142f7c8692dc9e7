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

//! Chunked reader for streamed messages.
//!
//! [`MessageReader`] pulls bytes from any [`Read`] source in blocks of
//! [`StreamingConfig::buffer_size`], decodes them as UTF-8 and feeds the
//! characters to an [`IncrementalBuilder`]. A multi-byte character split
//! across two blocks is carried over to the next read.

use crate::builder::{IncrementalBuilder, StreamingConfig};
use crate::error::{StreamError, StreamResult};
use hl7_core::{Delimiters, ElementTree, Message};
use std::io::{ErrorKind, Read};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads one message from a byte source.
///
/// # Examples
///
/// ```rust
/// use hl7_stream::MessageReader;
/// use std::io::Cursor;
///
/// let input = "MSH|^~\\&|LAB\rPID|1||12345^^^HOSP";
/// let message = MessageReader::new(Cursor::new(input)).read_message().unwrap();
///
/// assert_eq!(message.get("PID.3.1").unwrap().value().unwrap(), "12345");
/// ```
pub struct MessageReader<R: Read> {
    reader: R,
    config: StreamingConfig,
    delimiters: Option<Delimiters>,
}

impl<R: Read> MessageReader<R> {
    /// Create a reader with default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, StreamingConfig::default())
    }

    /// Create a reader with custom configuration.
    pub fn with_config(reader: R, config: StreamingConfig) -> Self {
        Self {
            reader,
            config,
            delimiters: None,
        }
    }

    /// Skip delimiter detection and use a known delimiter set.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = Some(delimiters);
        self
    }

    /// Read the whole source and build its element tree.
    pub fn read_tree(self) -> StreamResult<ElementTree> {
        let Self {
            mut reader,
            config,
            delimiters,
        } = self;
        let mut buffer = vec![0u8; config.buffer_size.max(4)];
        let mut builder = match delimiters {
            Some(delimiters) => IncrementalBuilder::with_delimiters(delimiters, config),
            None => IncrementalBuilder::with_config(config),
        };

        // Bytes of an incomplete character from the previous block.
        let mut carry: Vec<u8> = Vec::new();
        let mut offset = 0usize;
        let mut first = true;

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::Io(e)),
            };

            carry.extend_from_slice(&buffer[..n]);
            if first {
                if carry.len() < BOM.len() && BOM.starts_with(&carry) {
                    continue;
                }
                first = false;
                if carry.starts_with(BOM) {
                    carry.drain(..BOM.len());
                    offset = BOM.len();
                }
            }

            let valid = match std::str::from_utf8(&carry) {
                Ok(text) => {
                    builder.push_str(text)?;
                    carry.len()
                }
                Err(e) => {
                    if e.error_len().is_some() {
                        return Err(StreamError::Utf8 {
                            offset: offset + e.valid_up_to(),
                            message: e.to_string(),
                        });
                    }
                    let valid = e.valid_up_to();
                    // valid_up_to marks a character boundary.
                    let text = std::str::from_utf8(&carry[..valid]).map_err(|e| {
                        StreamError::Utf8 {
                            offset,
                            message: e.to_string(),
                        }
                    })?;
                    builder.push_str(text)?;
                    valid
                }
            };
            carry.drain(..valid);
            offset += valid;
        }

        if !carry.is_empty() {
            return Err(StreamError::Utf8 {
                offset,
                message: format!("input ends inside a {}-byte partial character", carry.len()),
            });
        }
        builder.finish()
    }

    /// Read the whole source as a message.
    ///
    /// Unlike [`read_tree`](Self::read_tree), this requires the input to
    /// start with a header segment.
    pub fn read_message(self) -> StreamResult<Message> {
        let limits = self.config.limits.clone();
        let tree = self.read_tree()?;
        Ok(Message::from_tree(tree)?.with_limits(limits))
    }
}
