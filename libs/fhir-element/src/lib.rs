//! Self-describing FHIR element tree
//!
//! This crate provides the in-memory representation shared by the wire
//! codecs and the FHIRPath engine: a dynamic tree of elements that carries
//! the type information the wire provides (resource names, choice-field
//! variants) without requiring generated per-resource types.
//!
//! # Module Organization
//!
//! - `element`: the tree itself ([`Element`], [`Field`], [`Node`],
//!   [`Primitive`], [`PrimitiveValue`])
//! - `types`: FHIR/System type names, choice-field tables, [`TypeInfo`]
//! - `compare`: structural equality and id-insensitive equivalence
//! - `convert`: checked primitive conversions
//!
//! # Design Philosophy
//!
//! - **Metadata everywhere**: every element, primitive included, can carry
//!   its own internal id and extensions
//! - **Choice fields are first-class**: `valueQuantity` is stored as field
//!   `value` with variant `Quantity`, and at most one variant may be
//!   populated
//! - **Wire-faithful**: field order and JSON array shape survive a decode /
//!   encode round trip
//!
//! # Example
//!
//! ```rust
//! use aurum_element::{Element, Field, Node, Primitive};
//!
//! let mut patient = Element::resource("Patient");
//! let mut active = Field::new("active");
//! active.push(Node::Primitive(Primitive::boolean(true).into()));
//! patient.push_field(active).unwrap();
//!
//! assert_eq!(patient.resource_type(), Some("Patient"));
//! assert!(patient.field("active").is_some());
//! ```

pub mod compare;
pub mod convert;
pub mod element;
pub mod error;
pub mod types;

pub use compare::{equal, equivalent, node_equal, node_equivalent};
pub use element::{Element, Field, Node, Primitive, PrimitiveValue};
pub use error::{Error, Result};
pub use types::{Namespace, TypeInfo};
