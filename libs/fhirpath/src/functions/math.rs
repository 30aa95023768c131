//! Math functions.
//!
//! `exp`, `ln`, `log`, `sqrt`, and fractional `power` go through `f64`;
//! results outside the decimal range (and domain errors like `ln(0)` or
//! `sqrt(-1)`) evaluate to empty.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{FhirPathError, Result};
use crate::operations::singleton_system;
use crate::value::{Collection, Value, ValueData};

enum Number {
    Integer(i64),
    Decimal(Decimal),
}

impl Number {
    fn decimal(&self) -> Decimal {
        match self {
            Number::Integer(i) => Decimal::from(*i),
            Number::Decimal(d) => *d,
        }
    }

    fn float(&self) -> Option<f64> {
        self.decimal().to_f64()
    }
}

fn focus_number(function: &str, input: &Collection) -> Result<Option<Number>> {
    match singleton_system(input)?.as_ref().map(Value::data) {
        None => Ok(None),
        Some(ValueData::Integer(i)) => Ok(Some(Number::Integer(*i))),
        Some(ValueData::Decimal(d)) => Ok(Some(Number::Decimal(*d))),
        Some(_) => Err(FhirPathError::TypeError(format!(
            "{function}() requires a number"
        ))),
    }
}

fn from_float(value: f64) -> Collection {
    match Decimal::from_f64(value) {
        Some(d) => Collection::singleton(Value::decimal(d.normalize())),
        None => Collection::empty(),
    }
}

fn integer_result(value: Option<i64>) -> Collection {
    match value {
        Some(i) => Collection::singleton(Value::integer(i)),
        None => Collection::empty(),
    }
}

pub(crate) fn abs(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    match value.data() {
        ValueData::Integer(i) => Ok(integer_result(i.checked_abs())),
        ValueData::Decimal(d) => Ok(Collection::singleton(Value::decimal(d.abs()))),
        ValueData::Quantity { value, unit } => Ok(Collection::singleton(Value::quantity(
            value.abs(),
            unit.clone(),
        ))),
        _ => Err(FhirPathError::TypeError("abs() requires a number".into())),
    }
}

pub(crate) fn ceiling(input: &Collection) -> Result<Collection> {
    match focus_number("ceiling", input)? {
        None => Ok(Collection::empty()),
        Some(n) => Ok(integer_result(n.decimal().ceil().to_i64())),
    }
}

pub(crate) fn floor(input: &Collection) -> Result<Collection> {
    match focus_number("floor", input)? {
        None => Ok(Collection::empty()),
        Some(n) => Ok(integer_result(n.decimal().floor().to_i64())),
    }
}

pub(crate) fn truncate(input: &Collection) -> Result<Collection> {
    match focus_number("truncate", input)? {
        None => Ok(Collection::empty()),
        Some(n) => Ok(integer_result(n.decimal().trunc().to_i64())),
    }
}

pub(crate) fn round(input: &Collection, precision: Option<Collection>) -> Result<Collection> {
    let Some(n) = focus_number("round", input)? else {
        return Ok(Collection::empty());
    };
    let digits = match precision {
        Some(arg) => match arg.as_integer()? {
            Some(d) if d >= 0 => d as u32,
            Some(_) => {
                return Err(FhirPathError::EvaluationError(
                    "round() precision must not be negative".into(),
                ))
            }
            None => return Ok(Collection::empty()),
        },
        None => 0,
    };
    Ok(Collection::singleton(Value::decimal(
        n.decimal().round_dp(digits).normalize(),
    )))
}

pub(crate) fn exp(input: &Collection) -> Result<Collection> {
    match focus_number("exp", input)?.and_then(|n| n.float()) {
        None => Ok(Collection::empty()),
        Some(x) => Ok(from_float(x.exp())),
    }
}

pub(crate) fn ln(input: &Collection) -> Result<Collection> {
    match focus_number("ln", input)?.and_then(|n| n.float()) {
        None => Ok(Collection::empty()),
        Some(x) if x <= 0.0 => Ok(Collection::empty()),
        Some(x) => Ok(from_float(x.ln())),
    }
}

pub(crate) fn log(input: &Collection, base: &Collection) -> Result<Collection> {
    let value = focus_number("log", input)?.and_then(|n| n.float());
    let base = focus_number("log", base)?.and_then(|n| n.float());
    match (value, base) {
        (Some(x), Some(b)) if x > 0.0 && b > 0.0 => Ok(from_float(x.log(b))),
        _ => Ok(Collection::empty()),
    }
}

pub(crate) fn sqrt(input: &Collection) -> Result<Collection> {
    match focus_number("sqrt", input)?.and_then(|n| n.float()) {
        None => Ok(Collection::empty()),
        Some(x) if x < 0.0 => Ok(Collection::empty()),
        Some(x) => Ok(from_float(x.sqrt())),
    }
}

pub(crate) fn power(input: &Collection, exponent: &Collection) -> Result<Collection> {
    let (Some(base), Some(exponent)) =
        (focus_number("power", input)?, focus_number("power", exponent)?)
    else {
        return Ok(Collection::empty());
    };
    if let (Number::Integer(b), Number::Integer(e)) = (&base, &exponent) {
        if let Ok(e) = u32::try_from(*e) {
            return Ok(integer_result(b.checked_pow(e)));
        }
    }
    match (base.float(), exponent.float()) {
        (Some(b), Some(e)) => {
            let result = b.powf(e);
            if result.is_nan() {
                Ok(Collection::empty())
            } else {
                Ok(from_float(result))
            }
        }
        _ => Ok(Collection::empty()),
    }
}
