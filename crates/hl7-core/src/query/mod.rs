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

//! Path query language.
//!
//! A path addresses one element of a message in up to four levels:
//! segment, field, component and subcomponent.
//!
//! ```text
//! MSH.9.1         first component of the message type
//! PID.3[2]        second repetition of PID-3
//! PID.3[]         every repetition of PID-3 (the field itself)
//! OBX[2].5        OBX-5 of the second OBX segment
//! *.3.2           component 2 of field 3 in whatever segment the query starts from
//! PID/5/1         slash works as separator too
//! ```
//!
//! Parsing produces [`SearchCriteria`]; [`resolve`] walks an element tree with
//! them. Resolution never fails: an address that does not exist yields the
//! tree's not-found sentinel.

mod path;
mod resolve;

pub use path::{CriteriaElement, Repetition, SearchCriteria};
pub use resolve::resolve;
