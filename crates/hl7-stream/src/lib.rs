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

//! Streaming HL7 v2 element builder
//!
//! This crate builds the element tree of an HL7 v2 message from input that
//! arrives in pieces: a socket, a pipe or a large file read block by block.
//! The result is identical to what [`hl7_core::ElementTree::build`] produces
//! for the complete text.
//!
//! # Features
//!
//! - **Single pass**: Each character is classified once, as it arrives
//! - **Chunk agnostic**: Any split of the input yields the same tree
//! - **Bounded detection**: At most [`StreamingConfig::max_detect_bytes`] are
//!   buffered before the line ending is decided
//! - **Limits**: Message size, segment and field counts are enforced as the
//!   input is consumed
//!
//! # Pushing text
//!
//! ```rust
//! use hl7_stream::IncrementalBuilder;
//!
//! let mut builder = IncrementalBuilder::new();
//! builder.push_str("MSH|^~\\&|SEND|FAC\r").unwrap();
//! builder.push_str("PID|1||12345~67890\r").unwrap();
//! let tree = builder.finish().unwrap();
//!
//! let pid = tree.root().child(1).unwrap();
//! assert_eq!(pid.child(3).unwrap().repetitions().len(), 2);
//! ```
//!
//! # Reading bytes
//!
//! ```rust,no_run
//! use hl7_stream::MessageReader;
//! use std::fs::File;
//!
//! let file = File::open("admission.hl7").unwrap();
//! let message = MessageReader::new(file).read_message().unwrap();
//! println!("{}", message.message_type());
//! ```
//!
//! The OBX line-break pre-pass of [`hl7_core::parse`] needs to look ahead
//! past a line break and is not applied here. Streamed input is expected to
//! carry its OBX payload line breaks already escaped.

mod builder;
mod error;
mod reader;

pub use builder::{IncrementalBuilder, StreamingConfig};
pub use error::{StreamError, StreamResult};
pub use reader::MessageReader;

/// Re-export core types for convenience.
pub use hl7_core::{Delimiters, ElementTree, LineEnding, Limits, Message};
