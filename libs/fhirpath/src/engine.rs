//! The engine: compilation cache plus the public evaluate entry points.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use aurum_element::Element;

use crate::ast::Expression;
use crate::context::Context;
use crate::error::{FhirPathError, Result};
use crate::eval;
use crate::parser;
use crate::value::{Collection, Value};

const DEFAULT_CACHE_SIZE: usize = 1000;

/// A FHIRPath engine with an LRU cache of compiled expressions.
///
/// The engine is cheap to share behind an `Arc` and safe to use from
/// multiple threads; compiled expressions are immutable and handed out as
/// `Arc`s, so cache hits never copy the tree.
pub struct FhirPath {
    cache: Mutex<LruCache<String, Arc<Expression>>>,
}

impl Default for FhirPath {
    fn default() -> Self {
        FhirPath::new()
    }
}

impl FhirPath {
    pub fn new() -> Self {
        FhirPath::with_cache_size(
            NonZeroUsize::new(DEFAULT_CACHE_SIZE).expect("default cache size is non-zero"),
        )
    }

    pub fn with_cache_size(size: NonZeroUsize) -> Self {
        FhirPath {
            cache: Mutex::new(LruCache::new(size)),
        }
    }

    /// Parses an expression, consulting the cache first.
    pub fn compile(&self, expression: &str) -> Result<Arc<Expression>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| FhirPathError::EvaluationError("expression cache poisoned".to_string()))?;
        if let Some(compiled) = cache.get(expression) {
            return Ok(compiled.clone());
        }
        let compiled = Arc::new(parser::parse(expression)?);
        cache.put(expression.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Evaluates an expression against a decoded resource.
    pub fn evaluate(&self, expression: &str, resource: Arc<Element>) -> Result<Collection> {
        let compiled = self.compile(expression)?;
        let context = Context::new(Value::element(resource));
        self.evaluate_expr(&compiled, &context)
    }

    /// Evaluates a compiled expression under an explicit context, which is
    /// how callers bind their own variables.
    pub fn evaluate_expr(&self, expression: &Expression, context: &Context) -> Result<Collection> {
        let input = match context.resource() {
            Some(resource) => Collection::singleton(resource.clone()),
            None => Collection::empty(),
        };
        eval::evaluate_expression(expression, &input, context)
    }

    /// Parses a JSON resource and evaluates against it.
    pub fn evaluate_json(&self, expression: &str, json: &str) -> Result<Collection> {
        let resource = aurum_format::parse_json(json)?;
        self.evaluate(expression, Arc::new(resource))
    }

    /// Parses an XML resource and evaluates against it.
    #[cfg(feature = "xml-support")]
    pub fn evaluate_xml(&self, expression: &str, xml: &str) -> Result<Collection> {
        let resource = aurum_format::parse_xml(xml)?;
        self.evaluate(expression, Arc::new(resource))
    }
}
