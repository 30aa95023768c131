//! Utility functions: `trace`, the clock functions, type reflection, `not`,
//! and the FHIR-specific helpers `hasValue`, `extension`, `getValue`.

use chrono::{Timelike, Utc};

use crate::ast::{Expression, TypeSpecifier};
use crate::context::Context;
use crate::error::{FhirPathError, Result};
use crate::eval;
use crate::functions::{filtering, truth};
use crate::value::{Collection, DatePrecision, DateTimePrecision, TimePrecision, Value, ValueData};

/// Logs the focus (or a projection of it) to stderr and passes the focus
/// through unchanged.
pub(crate) fn trace(input: &Collection, args: &[Expression], ctx: &Context) -> Result<Collection> {
    let name = eval::evaluate_expression(&args[0], input, ctx)?
        .as_string()?
        .unwrap_or_else(|| "trace".into());
    let traced = match args.get(1) {
        Some(projection) => filtering::select(input, projection, ctx)?,
        None => input.clone(),
    };
    let rendered: Vec<String> = traced.iter().map(Value::render).collect();
    eprintln!("TRACE[{name}] ({} items): {}", traced.len(), rendered.join(", "));
    Ok(input.clone())
}

pub(crate) fn now() -> Collection {
    let instant = Utc::now().with_nanosecond(0).unwrap_or_else(Utc::now);
    Collection::singleton(Value::datetime(
        instant,
        DateTimePrecision::Second,
        Some(0),
    ))
}

pub(crate) fn today() -> Collection {
    Collection::singleton(Value::date(Utc::now().date_naive(), DatePrecision::Day))
}

pub(crate) fn time_of_day() -> Collection {
    let time = Utc::now().time().with_nanosecond(0).unwrap_or_default();
    Collection::singleton(Value::time(time, TimePrecision::Second))
}

pub(crate) fn type_of(input: &Collection) -> Collection {
    input
        .iter()
        .map(|item| Value::of_type(item.type_info()))
        .collect()
}

pub(crate) fn is_type(input: &Collection, specifier: &TypeSpecifier) -> Result<Collection> {
    match input.as_slice() {
        [] => Ok(Collection::empty()),
        [item] => Ok(truth(eval::matches_type(item, specifier))),
        _ => Err(type_test_cardinality("is")),
    }
}

pub(crate) fn as_type(input: &Collection, specifier: &TypeSpecifier) -> Result<Collection> {
    match input.as_slice() {
        [] => Ok(Collection::empty()),
        [item] if eval::matches_type(item, specifier) => Ok(input.clone()),
        [_] => Ok(Collection::empty()),
        _ => Err(type_test_cardinality("as")),
    }
}

fn type_test_cardinality(function: &str) -> FhirPathError {
    FhirPathError::EvaluationError(format!("{function}() requires a single item"))
}

pub(crate) fn not(input: &Collection) -> Result<Collection> {
    match input.as_boolean()? {
        Some(b) => Ok(truth(!b)),
        None => Ok(Collection::empty()),
    }
}

/// True when the focus is a single primitive that carries an actual value
/// (as opposed to id/extension metadata only).
pub(crate) fn has_value(input: &Collection) -> Collection {
    let result = match input.single().map(Value::data) {
        Some(ValueData::Primitive(p)) => p.has_value(),
        _ => false,
    };
    truth(result)
}

/// `extension(url)`: the extensions of each item with a matching `url`.
pub(crate) fn extension(input: &Collection, url: &Collection) -> Result<Collection> {
    let Some(url) = url.as_string()? else {
        return Ok(Collection::empty());
    };
    let mut result = Collection::empty();
    for item in input.iter() {
        match item.data() {
            ValueData::Element(element) => {
                for node in element.items("extension") {
                    if let aurum_element::Node::Element(ext) = node {
                        if extension_url(ext) == Some(url.as_ref()) {
                            result.push(Value::element(ext.clone()));
                        }
                    }
                }
            }
            ValueData::Primitive(primitive) => {
                for ext in primitive.extensions() {
                    if extension_url(ext) == Some(url.as_ref()) {
                        result.push(Value::element(ext.clone()));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(result)
}

fn extension_url(extension: &aurum_element::Element) -> Option<&str> {
    match extension.items("url") {
        [aurum_element::Node::Primitive(p)] => match p.value() {
            Some(aurum_element::PrimitiveValue::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// The System value of a single primitive node; anything else is empty.
pub(crate) fn get_value(input: &Collection) -> Collection {
    match input.single().map(Value::data) {
        Some(ValueData::Primitive(_)) => match input.single().and_then(Value::system) {
            Some(value) => Collection::singleton(value),
            None => Collection::empty(),
        },
        _ => Collection::empty(),
    }
}
