//! Codec errors.
//!
//! Both codecs are strict: a document that deviates from the wire format is
//! rejected with an error naming the offending field or element rather than
//! silently repaired.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write XML: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    #[error("output was not valid UTF-8")]
    Utf8,

    #[error("expected a JSON object at the document root")]
    ExpectedObject,

    #[error("document has no resourceType")]
    MissingResourceType,

    #[error("only resources can be written as documents")]
    NotAResource,

    #[error("unexpected null value in '{0}'")]
    UnexpectedNull(String),

    #[error("nested array in '{0}'")]
    NestedArray(String),

    #[error("primitive metadata for '_{0}' must be an object")]
    InvalidMetadata(String),

    #[error("'_{0}' does not align with '{0}'")]
    MetadataMismatch(String),

    #[error("'_{0}' targets a complex field")]
    MetadataOnComplex(String),

    #[error("element id in '{0}' must be a string")]
    InvalidElementId(String),

    #[error("element '{0}' is not in the FHIR namespace")]
    UnexpectedNamespace(String),

    #[error("unexpected attribute '{attribute}' on '{element}'")]
    UnexpectedAttribute { element: String, attribute: String },

    #[error("unexpected text content in '{0}'")]
    UnexpectedText(String),

    #[error("unexpected child element '{child}' in '{element}'")]
    UnexpectedChild { element: String, child: String },

    #[error("invalid value for '{name}': {value}")]
    InvalidValue { name: String, value: String },

    #[error(transparent)]
    Element(#[from] aurum_element::Error),
}
