//! FHIRPath engine
//!
//! A lexer, recursive-descent parser, and tree-walking evaluator for
//! FHIRPath expressions over the `aurum-element` tree, with an LRU cache of
//! compiled expressions.
//!
//! # Module Organization
//!
//! - `lexer` / `token` / `parser` / `ast`: expression text to syntax tree
//! - `value` / `temporal`: runtime values, collections, partial dates
//! - `operations`: operator semantics (equality, ordering, arithmetic)
//! - `registry` / `functions`: the built-in function library
//! - `eval` / `context` / `engine`: the walker and its public entry points
//!
//! # Example
//!
//! ```rust
//! use aurum_fhirpath::FhirPath;
//!
//! let engine = FhirPath::new();
//! let patient = r#"{"resourceType": "Patient", "active": true}"#;
//! let result = engine.evaluate_json("Patient.active", patient).unwrap();
//! assert_eq!(result.as_boolean().unwrap(), Some(true));
//! ```
//!
//! # Semantics
//!
//! Evaluation follows the FHIRPath collection model: every expression
//! yields a collection, empty propagates, and boolean operators use
//! three-valued logic. Undefined arithmetic (overflow, division by zero)
//! evaluates to empty rather than failing. The engine is schema-less: type
//! tests match the names the wire carries, with no model-driven subtyping.

mod ast;
mod context;
mod engine;
mod error;
mod eval;
mod functions;
mod lexer;
mod operations;
mod parser;
mod registry;
mod temporal;
mod token;
mod value;

pub use ast::{Expression, TypeSpecifier};
pub use context::Context;
pub use engine::FhirPath;
pub use error::{FhirPathError, Result};
pub use parser::parse;
pub use registry::{lookup as function_metadata, FunctionMetadata};
pub use value::{
    Collection, DatePrecision, DateTimePrecision, TimePrecision, Value, ValueData,
};
