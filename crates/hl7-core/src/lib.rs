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

//! Core parser and data model for HL7 v2 messages.
//!
//! This crate turns pipe-delimited HL7 v2.x text into an element tree,
//! answers path queries against it and renders it back to the exact source
//! text.
//!
//! ```
//! use hl7_core::parse;
//!
//! let msg = parse(
//!     "MSH|^~\\&|CERNER||PriorityHealth||||ORU^R01|Q1|P|2.3|\r\
//!      PID|||001677980||SMITH^CURTIS",
//! )
//! .unwrap();
//!
//! assert_eq!(msg.get("MSH.3").unwrap().value().unwrap(), "CERNER");
//! assert_eq!(msg.get("PID.5.1").unwrap().value().unwrap(), "SMITH");
//! assert_eq!(msg.message_type(), "ORU^R01");
//! ```
//!
//! # Modules
//!
//! - [`delimiters`]: the per-message delimiter set and line-ending detection
//! - [`escape`]: escape-aware splitting and the `\E\ \F\ \Xhh\` vocabulary
//! - [`query`]: path expressions (`OBX[2].5.1`, `*.3.2`) and their resolution
//! - [`traverse`]: visitor-based walks over an element tree
//!
//! The element tree itself ([`ElementTree`], [`Element`]) and the
//! [`Message`] facade are re-exported at the crate root.

mod builder;
pub mod delimiters;
mod element;
mod error;
pub mod escape;
mod limits;
mod message;
mod parser;
mod preprocess;
pub mod query;
pub mod traverse;

pub use delimiters::{Delimiters, LineEnding};
#[cfg(feature = "serde")]
pub use element::ElementSnapshot;
pub use element::{Element, ElementKind, ElementTree, NodeId, Separator};
pub use error::{Hl7Error, Hl7ErrorKind, Hl7Result};
pub use escape::{escape_text, escape_text_with, unescape_text};
pub use limits::Limits;
pub use message::{escape_obx_crlf, Message};
pub use parser::{parse, parse_bytes, parse_with_options, ParseOptions, ParseOptionsBuilder};
pub use query::{resolve, SearchCriteria};
pub use traverse::{traverse, ElementVisitor, StatsCollector, VisitorContext};
