//! Conversion functions: `iif`, the `toX()` family, and (via the
//! dispatcher) their `convertsToX()` companions.
//!
//! A value that cannot be converted evaluates to empty; more than one item
//! in the focus is an error.

use std::str::FromStr;

use chrono::Duration;
use rust_decimal::Decimal;

use crate::ast::Expression;
use crate::context::Context;
use crate::error::{FhirPathError, Result};
use crate::eval;
use crate::operations::{singleton_system, strict_seconds};
use crate::temporal;
use crate::value::{Collection, DatePrecision, DateTimePrecision, Value, ValueData};

/// `iif(criterion, true-result [, otherwise-result])`. Only the selected
/// branch is evaluated.
pub(crate) fn iif(input: &Collection, args: &[Expression], ctx: &Context) -> Result<Collection> {
    let criterion = eval::evaluate_expression(&args[0], input, ctx)?;
    let chosen = match criterion.as_boolean()? {
        Some(true) => Some(&args[1]),
        _ => args.get(2),
    };
    match chosen {
        Some(branch) => eval::evaluate_expression(branch, input, ctx),
        None => Ok(Collection::empty()),
    }
}

pub(crate) fn to_boolean(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let converted = match value.data() {
        ValueData::Boolean(b) => Some(*b),
        ValueData::Integer(1) => Some(true),
        ValueData::Integer(0) => Some(false),
        ValueData::Decimal(d) if *d == Decimal::ONE => Some(true),
        ValueData::Decimal(d) if *d == Decimal::ZERO => Some(false),
        ValueData::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
            "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    Ok(from_option(converted.map(Value::boolean)))
}

pub(crate) fn to_integer(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let converted = match value.data() {
        ValueData::Integer(i) => Some(*i),
        ValueData::Boolean(b) => Some(i64::from(*b)),
        ValueData::String(s) => s.parse::<i64>().ok(),
        _ => None,
    };
    Ok(from_option(converted.map(Value::integer)))
}

pub(crate) fn to_decimal(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let converted = match value.data() {
        ValueData::Decimal(d) => Some(*d),
        ValueData::Integer(i) => Some(Decimal::from(*i)),
        ValueData::Boolean(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        ValueData::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    };
    Ok(from_option(converted.map(Value::decimal)))
}

/// Complex elements have no string form and convert to empty.
pub(crate) fn to_string(input: &Collection) -> Result<Collection> {
    match input.as_slice() {
        [] => Ok(Collection::empty()),
        [value] => match value.data() {
            ValueData::Element(_) => Ok(Collection::empty()),
            ValueData::Primitive(p) if p.value().is_none() => Ok(Collection::empty()),
            _ => Ok(Collection::singleton(Value::string(value.render()))),
        },
        _ => Err(FhirPathError::TypeError(format!(
            "toString() requires a single item, got {}",
            input.len()
        ))),
    }
}

pub(crate) fn to_date(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let converted = match value.data() {
        ValueData::Date(date, precision) => Some(Value::date(*date, *precision)),
        ValueData::DateTime {
            value,
            precision,
            offset,
        } => {
            let local = value.naive_utc() + Duration::seconds(offset.unwrap_or(0) as i64);
            let precision = match precision {
                DateTimePrecision::Year => DatePrecision::Year,
                DateTimePrecision::Month => DatePrecision::Month,
                _ => DatePrecision::Day,
            };
            Some(Value::date(local.date(), precision))
        }
        ValueData::String(s) => temporal::parse_date(s).map(|(d, p)| Value::date(d, p)),
        _ => None,
    };
    Ok(from_option(converted))
}

pub(crate) fn to_datetime(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let converted = match value.data() {
        ValueData::DateTime { .. } => Some(value.clone()),
        ValueData::Date(date, precision) => Some(date_to_datetime(*date, *precision)),
        ValueData::String(s) => {
            if s.contains('T') {
                temporal::parse_datetime(s).map(|(v, p, o)| Value::datetime(v, p, o))
            } else {
                temporal::parse_date(s).map(|(d, p)| date_to_datetime(d, p))
            }
        }
        _ => None,
    };
    Ok(from_option(converted))
}

fn date_to_datetime(date: chrono::NaiveDate, precision: DatePrecision) -> Value {
    let precision = match precision {
        DatePrecision::Year => DateTimePrecision::Year,
        DatePrecision::Month => DateTimePrecision::Month,
        DatePrecision::Day => DateTimePrecision::Day,
    };
    let instant = chrono::DateTime::from_naive_utc_and_offset(
        date.and_time(chrono::NaiveTime::MIN),
        chrono::Utc,
    );
    Value::datetime(instant, precision, None)
}

pub(crate) fn to_time(input: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let converted = match value.data() {
        ValueData::Time(t, p) => Some(Value::time(*t, *p)),
        ValueData::String(s) => temporal::parse_time(s).map(|(t, p)| Value::time(t, p)),
        _ => None,
    };
    Ok(from_option(converted))
}

pub(crate) fn to_quantity(input: &Collection, unit: Option<Collection>) -> Result<Collection> {
    let Some(value) = singleton_system(input)? else {
        return Ok(Collection::empty());
    };
    let quantity = match value.data() {
        ValueData::Quantity { value, unit } => Some((*value, unit.to_string())),
        ValueData::Integer(i) => Some((Decimal::from(*i), "1".to_string())),
        ValueData::Decimal(d) => Some((*d, "1".to_string())),
        ValueData::Boolean(b) => Some((
            if *b { Decimal::ONE } else { Decimal::ZERO },
            "1".to_string(),
        )),
        ValueData::String(s) => parse_quantity_string(s),
        _ => None,
    };
    let Some((amount, from_unit)) = quantity else {
        return Ok(Collection::empty());
    };
    match unit.map(|arg| arg.as_string()).transpose()?.flatten() {
        None => Ok(Collection::singleton(Value::quantity(amount, from_unit))),
        Some(target) if target.as_ref() == from_unit => {
            Ok(Collection::singleton(Value::quantity(amount, target)))
        }
        Some(target) => {
            let converted = match (strict_seconds(&from_unit), strict_seconds(&target)) {
                (Some(from), Some(to)) => amount
                    .checked_mul(from)
                    .and_then(|seconds| seconds.checked_div(to)),
                _ => None,
            };
            Ok(from_option(
                converted.map(|v| Value::quantity(v.normalize(), target)),
            ))
        }
    }
}

/// `5.5 'mg'`, `5 days`, or a bare number (unit `1`).
fn parse_quantity_string(s: &str) -> Option<(Decimal, String)> {
    let s = s.trim();
    match s.split_once(' ') {
        None => Decimal::from_str(s).ok().map(|v| (v, "1".to_string())),
        Some((number, unit)) => {
            let value = Decimal::from_str(number).ok()?;
            let unit = unit.trim();
            if let Some(inner) = unit.strip_prefix('\'').and_then(|u| u.strip_suffix('\'')) {
                Some((value, inner.to_string()))
            } else if temporal::is_calendar_unit(unit) {
                Some((value, unit.to_string()))
            } else {
                None
            }
        }
    }
}

fn from_option(value: Option<Value>) -> Collection {
    match value {
        Some(v) => Collection::singleton(v),
        None => Collection::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(v: Value) -> Collection {
        Collection::singleton(v)
    }

    #[test]
    fn test_boolean_string_spellings() {
        for s in ["true", "T", "yes", "Y", "1", "1.0"] {
            let result = to_boolean(&single(Value::string(s))).unwrap();
            assert_eq!(result.as_boolean().unwrap(), Some(true), "{s}");
        }
        assert!(to_boolean(&single(Value::string("maybe"))).unwrap().is_empty());
    }

    #[test]
    fn test_decimal_does_not_convert_to_integer() {
        let result = to_integer(&single(Value::decimal(Decimal::from_str("1.5").unwrap())));
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_quantity_string_shapes() {
        assert_eq!(
            parse_quantity_string("5.5 'mg'"),
            Some((Decimal::from_str("5.5").unwrap(), "mg".to_string()))
        );
        assert_eq!(
            parse_quantity_string("5 days"),
            Some((Decimal::from(5), "days".to_string()))
        );
        assert_eq!(
            parse_quantity_string("4"),
            Some((Decimal::from(4), "1".to_string()))
        );
        assert_eq!(parse_quantity_string("5 mg"), None);
    }

    #[test]
    fn test_quantity_unit_conversion() {
        let input = single(Value::quantity(Decimal::from(2), "min"));
        let result = to_quantity(&input, Some(single(Value::string("s")))).unwrap();
        match result.single().unwrap().data() {
            ValueData::Quantity { value, unit } => {
                assert_eq!(*value, Decimal::from(120));
                assert_eq!(unit.as_ref(), "s");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
