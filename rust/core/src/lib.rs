// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Report Core Parser
//!
//! STEP/IFC parser built with [nom](https://docs.rs/nom), tuned for reading
//! element properties rather than geometry.
//!
//! - **Statement scanning**: [memchr](https://docs.rs/memchr)-accelerated walk
//!   over the DATA section that respects quoted strings
//! - **Lazy decoding**: attributes are parsed on demand and cached per decoder
//! - **String decoding**: STEP `\X2\`/`\X\`/`\S\` escapes become UTF-8
//! - **Element catalogue**: which keywords are `IfcElement` subtypes
//!
//! ## Quick Start
//!
//! ```rust
//! use ifc_report_core::{EntityDecoder, EntityScanner};
//!
//! let content = "DATA;\n#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall-01',$,$,$,$,$);\nENDSEC;";
//! let mut scanner = EntityScanner::new(content);
//! let mut decoder = EntityDecoder::new(content);
//!
//! while let Some((id, type_name, start, end)) = scanner.next_entity() {
//!     let entity = decoder.decode_at_with_id(id, start, end).unwrap();
//!     assert_eq!(type_name, "IFCWALL");
//!     assert_eq!(entity.get_string(2), Some("Wall-01"));
//! }
//! ```

pub mod attribute;
pub mod decoder;
pub mod error;
pub mod parser;
pub mod schema;
pub mod strings;

pub use attribute::{AttributeValue, DecodedEntity};
pub use decoder::{build_entity_index, EntityDecoder, EntityIndex};
pub use error::{Error, Result};
pub use parser::{parse_entity, EntityScanner, Token};
pub use schema::{element_type_name, is_element_type, SchemaVersion};
pub use strings::decode_step_string;
