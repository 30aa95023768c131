//! Strict FHIR wire codecs
//!
//! Bidirectional JSON and XML codecs over the `aurum-element` tree. Both
//! directions preserve the metadata FHIR allows on primitives (internal ids
//! and extensions) and the array shape of repeating fields.
//!
//! # Module Organization
//!
//! - `json`: the JSON format with its `_field` primitive-metadata convention
//! - `xml`: the XML format with `value`/`id`/`url` attributes and raw XHTML
//!   narrative passthrough
//! - `error`: [`FormatError`]
//!
//! Format conversion composes the codecs through the element model:
//!
//! ```rust
//! let json = r#"{"resourceType":"Patient","active":true}"#;
//! let xml = aurum_format::json_to_xml(json).unwrap();
//! assert!(xml.contains(r#"<active value="true"/>"#));
//! ```

pub mod error;
pub mod json;
pub mod xml;

pub use error::{FormatError, Result};
pub use json::{parse_json, parse_json_value, to_json_string, to_json_string_pretty, write_json};
pub use xml::{parse_xml, write_xml, FHIR_NS, XHTML_NS};

/// Converts a JSON document to XML.
pub fn json_to_xml(input: &str) -> Result<String> {
    xml::write_xml(&json::parse_json(input)?)
}

/// Converts an XML document to JSON.
pub fn xml_to_json(input: &str) -> Result<String> {
    json::to_json_string(&xml::parse_xml(input)?)
}
