//! Operator semantics.
//!
//! Collection-level implementations of the FHIRPath operators: equality and
//! equivalence, ordering, membership, union, three-valued boolean logic,
//! and arithmetic with Integer/Decimal promotion. Undefined results
//! (overflow, divide-by-zero, precision-incompatible temporals,
//! unit-incomparable quantities) evaluate to the empty collection;
//! genuinely ill-typed operands are errors.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ast::{EqualityOperator, InequalityOperator, MembershipOperator};
use crate::error::{FhirPathError, Result};
use crate::temporal;
use crate::value::{Collection, DatePrecision, DateTimePrecision, Value, ValueData};

pub(crate) fn boolean_result(value: Option<bool>) -> Collection {
    match value {
        Some(b) => Collection::singleton(Value::boolean(b)),
        None => Collection::empty(),
    }
}

/// The single System value of a collection: `None` for empty (and for a
/// metadata-only primitive), an error for more than one item.
pub(crate) fn singleton_system(operand: &Collection) -> Result<Option<Value>> {
    match operand.as_slice() {
        [] => Ok(None),
        [value] => Ok(value.system()),
        _ => Err(FhirPathError::TypeError(format!(
            "expected a single value, got {} items",
            operand.len()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Equality and equivalence

pub(crate) fn equality(
    operator: EqualityOperator,
    left: &Collection,
    right: &Collection,
) -> Collection {
    match operator {
        EqualityOperator::Equal => boolean_result(collections_equal(left, right)),
        EqualityOperator::NotEqual => boolean_result(collections_equal(left, right).map(|b| !b)),
        EqualityOperator::Equivalent => boolean_result(Some(collections_equivalent(left, right))),
        EqualityOperator::NotEquivalent => {
            boolean_result(Some(!collections_equivalent(left, right)))
        }
    }
}

/// `=` over collections: item-wise in order, either side empty is empty,
/// an indeterminate item comparison makes the whole result empty.
pub(crate) fn collections_equal(left: &Collection, right: &Collection) -> Option<bool> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    if left.len() != right.len() {
        return Some(false);
    }
    let mut indeterminate = false;
    for (a, b) in left.iter().zip(right.iter()) {
        match items_equal(a, b) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => indeterminate = true,
        }
    }
    if indeterminate {
        None
    } else {
        Some(true)
    }
}

/// `~` over collections: both empty is true, order does not matter.
pub(crate) fn collections_equivalent(left: &Collection, right: &Collection) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    'outer: for a in left.iter() {
        for (i, b) in right.iter().enumerate() {
            if !used[i] && items_equivalent(a, b) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

pub(crate) fn items_equal(a: &Value, b: &Value) -> Option<bool> {
    match (a.data(), b.data()) {
        (ValueData::Element(x), ValueData::Element(y)) => Some(aurum_element::equal(x, y)),
        (ValueData::Element(_), _) | (_, ValueData::Element(_)) => Some(false),
        _ => {
            let a = a.system()?;
            let b = b.system()?;
            system_equal(&a, &b)
        }
    }
}

pub(crate) fn items_equivalent(a: &Value, b: &Value) -> bool {
    match (a.data(), b.data()) {
        (ValueData::Element(x), ValueData::Element(y)) => aurum_element::equivalent(x, y),
        (ValueData::Element(_), _) | (_, ValueData::Element(_)) => false,
        _ => match (a.system(), b.system()) {
            (None, None) => true,
            (Some(a), Some(b)) => system_equivalent(&a, &b),
            _ => false,
        },
    }
}

fn temporal_kind(value: &Value) -> u8 {
    match value.data() {
        ValueData::Date(..) => 1,
        ValueData::DateTime { .. } => 2,
        ValueData::Time(..) => 3,
        _ => 0,
    }
}

fn date_as_datetime(value: &Value) -> Option<Value> {
    if let ValueData::Date(date, precision) = value.data() {
        let mapped = match precision {
            DatePrecision::Year => DateTimePrecision::Year,
            DatePrecision::Month => DateTimePrecision::Month,
            DatePrecision::Day => DateTimePrecision::Day,
        };
        let instant = chrono::DateTime::from_naive_utc_and_offset(
            date.and_time(chrono::NaiveTime::MIN),
            chrono::Utc,
        );
        Some(Value::datetime(instant, mapped, None))
    } else {
        None
    }
}

fn system_equal(a: &Value, b: &Value) -> Option<bool> {
    match (a.data(), b.data()) {
        (ValueData::Boolean(x), ValueData::Boolean(y)) => Some(x == y),
        (ValueData::Integer(x), ValueData::Integer(y)) => Some(x == y),
        (ValueData::Decimal(x), ValueData::Decimal(y)) => Some(x == y),
        (ValueData::Integer(x), ValueData::Decimal(y))
        | (ValueData::Decimal(y), ValueData::Integer(x)) => Some(Decimal::from(*x) == *y),
        (ValueData::String(x), ValueData::String(y)) => {
            // FHIR carries dates and times as wire strings; agreeing
            // temporal readings win over byte comparison.
            if let (Some(ta), Some(tb)) = (
                temporal::parse_string_temporal(x),
                temporal::parse_string_temporal(y),
            ) {
                if temporal_kind(&ta) == temporal_kind(&tb) {
                    return system_equal(&ta, &tb);
                }
            }
            Some(x == y)
        }
        (ValueData::Date(da, pa), ValueData::Date(db, pb)) => {
            equal_from_ordering(temporal::compare_dates(*da, *pa, *db, *pb))
        }
        (
            ValueData::DateTime {
                value: va,
                precision: pa,
                ..
            },
            ValueData::DateTime {
                value: vb,
                precision: pb,
                ..
            },
        ) => equal_from_ordering(temporal::compare_datetimes(*va, *pa, *vb, *pb)),
        (ValueData::Time(ta, pa), ValueData::Time(tb, pb)) => {
            equal_from_ordering(temporal::compare_times(*ta, *pa, *tb, *pb))
        }
        (ValueData::Date(..), ValueData::DateTime { .. }) => {
            system_equal(&date_as_datetime(a)?, b)
        }
        (ValueData::DateTime { .. }, ValueData::Date(..)) => {
            system_equal(a, &date_as_datetime(b)?)
        }
        (ValueData::String(_), _) => system_equal(&temporal::promote_string(a, b)?, b),
        (_, ValueData::String(_)) => system_equal(a, &temporal::promote_string(b, a)?),
        (
            ValueData::Quantity { value: va, unit: ua },
            ValueData::Quantity { value: vb, unit: ub },
        ) => quantity_equal(*va, ua, *vb, ub),
        (ValueData::Type(x), ValueData::Type(y)) => Some(x == y),
        _ => Some(false),
    }
}

fn equal_from_ordering(ordering: Option<Ordering>) -> Option<bool> {
    ordering.map(|o| o == Ordering::Equal)
}

fn system_equivalent(a: &Value, b: &Value) -> bool {
    match (a.data(), b.data()) {
        (ValueData::String(x), ValueData::String(y)) => strings_equivalent(x, y),
        (ValueData::Decimal(x), ValueData::Decimal(y)) => decimals_equivalent(*x, *y),
        (ValueData::Integer(x), ValueData::Decimal(y))
        | (ValueData::Decimal(y), ValueData::Integer(x)) => {
            decimals_equivalent(Decimal::from(*x), *y)
        }
        (ValueData::Date(da, pa), ValueData::Date(db, pb)) => {
            temporal::ordering_to_equivalence(temporal::compare_dates(*da, *pa, *db, *pb))
        }
        (
            ValueData::DateTime {
                value: va,
                precision: pa,
                ..
            },
            ValueData::DateTime {
                value: vb,
                precision: pb,
                ..
            },
        ) => temporal::ordering_to_equivalence(temporal::compare_datetimes(*va, *pa, *vb, *pb)),
        (ValueData::Time(ta, pa), ValueData::Time(tb, pb)) => {
            temporal::ordering_to_equivalence(temporal::compare_times(*ta, *pa, *tb, *pb))
        }
        (
            ValueData::Quantity { value: va, unit: ua },
            ValueData::Quantity { value: vb, unit: ub },
        ) => quantity_equivalent(*va, ua, *vb, ub),
        _ => system_equal(a, b) == Some(true),
    }
}

/// Case-insensitive with runs of whitespace collapsed.
pub(crate) fn strings_equivalent(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };
    normalize(a) == normalize(b)
}

fn effective_scale(d: Decimal) -> u32 {
    d.normalize().scale()
}

/// Rounded to the smaller effective scale: 1.154 ~ 1.2.
pub(crate) fn decimals_equivalent(a: Decimal, b: Decimal) -> bool {
    let scale = effective_scale(a).min(effective_scale(b));
    a.round_dp(scale) == b.round_dp(scale)
}

// ---------------------------------------------------------------------------
// Quantities

/// Seconds per unit for strict (`=`, `<`) quantity conversion: definite
/// UCUM time units, plus the calendar keywords that are themselves
/// definite (second and below). Calendar years through minutes only match
/// their own spelling.
pub(crate) fn strict_seconds(unit: &str) -> Option<Decimal> {
    match unit {
        "second" | "seconds" | "s" => Some(Decimal::ONE),
        "millisecond" | "milliseconds" | "ms" => Some(Decimal::new(1, 3)),
        "wk" | "d" | "h" | "min" => temporal::definite_seconds(unit),
        _ => None,
    }
}

fn quantity_equal(va: Decimal, ua: &str, vb: Decimal, ub: &str) -> Option<bool> {
    if ua == ub {
        return Some(va == vb);
    }
    match (strict_seconds(ua), strict_seconds(ub)) {
        (Some(sa), Some(sb)) => Some(va.checked_mul(sa)? == vb.checked_mul(sb)?),
        _ => None,
    }
}

fn quantity_equivalent(va: Decimal, ua: &str, vb: Decimal, ub: &str) -> bool {
    if temporal::equivalence_unit(ua) == temporal::equivalence_unit(ub) {
        return decimals_equivalent(va, vb);
    }
    match (temporal::definite_seconds(ua), temporal::definite_seconds(ub)) {
        (Some(sa), Some(sb)) => match (va.checked_mul(sa), vb.checked_mul(sb)) {
            (Some(a), Some(b)) => decimals_equivalent(a, b),
            _ => false,
        },
        _ => false,
    }
}

fn quantity_compare(va: Decimal, ua: &str, vb: Decimal, ub: &str) -> Option<Ordering> {
    if ua == ub {
        return Some(va.cmp(&vb));
    }
    match (strict_seconds(ua), strict_seconds(ub)) {
        (Some(sa), Some(sb)) => Some(va.checked_mul(sa)?.cmp(&vb.checked_mul(sb)?)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Ordering

pub(crate) fn compare(
    operator: InequalityOperator,
    left: &Collection,
    right: &Collection,
) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    let Some(ordering) = system_compare(&a, &b)? else {
        return Ok(Collection::empty());
    };
    let result = match operator {
        InequalityOperator::LessThan => ordering == Ordering::Less,
        InequalityOperator::LessThanOrEqual => ordering != Ordering::Greater,
        InequalityOperator::GreaterThan => ordering == Ordering::Greater,
        InequalityOperator::GreaterThanOrEqual => ordering != Ordering::Less,
    };
    Ok(Collection::singleton(Value::boolean(result)))
}

fn system_compare(a: &Value, b: &Value) -> Result<Option<Ordering>> {
    match (a.data(), b.data()) {
        (ValueData::Integer(x), ValueData::Integer(y)) => Ok(Some(x.cmp(y))),
        (ValueData::Decimal(x), ValueData::Decimal(y)) => Ok(Some(x.cmp(y))),
        (ValueData::Integer(x), ValueData::Decimal(y)) => Ok(Some(Decimal::from(*x).cmp(y))),
        (ValueData::Decimal(x), ValueData::Integer(y)) => Ok(Some(x.cmp(&Decimal::from(*y)))),
        (ValueData::String(x), ValueData::String(y)) => {
            if let (Some(ta), Some(tb)) = (
                temporal::parse_string_temporal(x),
                temporal::parse_string_temporal(y),
            ) {
                if temporal_kind(&ta) == temporal_kind(&tb) {
                    return system_compare(&ta, &tb);
                }
            }
            Ok(Some(x.as_ref().cmp(y.as_ref())))
        }
        (ValueData::Date(da, pa), ValueData::Date(db, pb)) => {
            Ok(temporal::compare_dates(*da, *pa, *db, *pb))
        }
        (
            ValueData::DateTime {
                value: va,
                precision: pa,
                ..
            },
            ValueData::DateTime {
                value: vb,
                precision: pb,
                ..
            },
        ) => Ok(temporal::compare_datetimes(*va, *pa, *vb, *pb)),
        (ValueData::Time(ta, pa), ValueData::Time(tb, pb)) => {
            Ok(temporal::compare_times(*ta, *pa, *tb, *pb))
        }
        (ValueData::Date(..), ValueData::DateTime { .. }) => match date_as_datetime(a) {
            Some(a) => system_compare(&a, b),
            None => Ok(None),
        },
        (ValueData::DateTime { .. }, ValueData::Date(..)) => match date_as_datetime(b) {
            Some(b) => system_compare(a, &b),
            None => Ok(None),
        },
        (ValueData::String(_), _) => match temporal::promote_string(a, b) {
            Some(a) => system_compare(&a, b),
            None => Ok(None),
        },
        (_, ValueData::String(_)) => match temporal::promote_string(b, a) {
            Some(b) => system_compare(a, &b),
            None => Ok(None),
        },
        (
            ValueData::Quantity { value: va, unit: ua },
            ValueData::Quantity { value: vb, unit: ub },
        ) => Ok(quantity_compare(*va, ua, *vb, ub)),
        _ => Err(FhirPathError::TypeError(format!(
            "cannot compare {} with {}",
            a.type_info(),
            b.type_info()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Membership and union

pub(crate) fn membership(
    operator: MembershipOperator,
    left: &Collection,
    right: &Collection,
) -> Result<Collection> {
    let (needle, haystack) = match operator {
        MembershipOperator::In => (left, right),
        MembershipOperator::Contains => (right, left),
    };
    if needle.is_empty() {
        return Ok(Collection::empty());
    }
    let Some(item) = needle.single() else {
        return Err(FhirPathError::TypeError(format!(
            "membership needs a single item, got {}",
            needle.len()
        )));
    };
    let found = haystack
        .iter()
        .any(|candidate| items_equal(item, candidate) == Some(true));
    Ok(Collection::singleton(Value::boolean(found)))
}

/// `|`: left-to-right concatenation with duplicates removed.
pub(crate) fn union(left: &Collection, right: &Collection) -> Collection {
    let mut result = Collection::empty();
    for value in left.iter().chain(right.iter()) {
        if !result
            .iter()
            .any(|existing| items_equal(existing, value) == Some(true))
        {
            result.push(value.clone());
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Boolean logic (three-valued)

pub(crate) fn and(left: Option<bool>, right: Option<bool>) -> Collection {
    boolean_result(match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    })
}

pub(crate) fn or(left: Option<bool>, right: Option<bool>) -> Collection {
    boolean_result(match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    })
}

pub(crate) fn xor(left: Option<bool>, right: Option<bool>) -> Collection {
    boolean_result(match (left, right) {
        (Some(a), Some(b)) => Some(a != b),
        _ => None,
    })
}

pub(crate) fn implies(left: Option<bool>, right: Option<bool>) -> Collection {
    boolean_result(match (left, right) {
        (Some(false), _) => Some(true),
        (Some(true), b) => b,
        (None, Some(true)) => Some(true),
        (None, _) => None,
    })
}

// ---------------------------------------------------------------------------
// Arithmetic

pub(crate) fn add(left: &Collection, right: &Collection) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    match (a.data(), b.data()) {
        (ValueData::Integer(x), ValueData::Integer(y)) => {
            Ok(from_option(x.checked_add(*y).map(Value::integer)))
        }
        (ValueData::String(x), ValueData::String(y)) => {
            Ok(Collection::singleton(Value::string(format!("{x}{y}"))))
        }
        (ValueData::Quantity { .. }, ValueData::Quantity { .. }) => {
            quantity_add(&a, &b, Decimal::ONE)
        }
        (ValueData::Quantity { value, unit }, _) | (_, ValueData::Quantity { value, unit }) => {
            let temporal_side = if matches!(a.data(), ValueData::Quantity { .. }) {
                &b
            } else {
                &a
            };
            Ok(temporal_shift(temporal_side, *value, unit))
        }
        _ => numeric_op(&a, &b, "+", |x, y| x.checked_add(y)),
    }
}

pub(crate) fn subtract(left: &Collection, right: &Collection) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    match (a.data(), b.data()) {
        (ValueData::Integer(x), ValueData::Integer(y)) => {
            Ok(from_option(x.checked_sub(*y).map(Value::integer)))
        }
        (ValueData::Quantity { .. }, ValueData::Quantity { .. }) => {
            quantity_add(&a, &b, -Decimal::ONE)
        }
        (_, ValueData::Quantity { value, unit }) => Ok(temporal_shift(&a, -*value, unit)),
        _ => numeric_op(&a, &b, "-", |x, y| x.checked_sub(y)),
    }
}

pub(crate) fn multiply(left: &Collection, right: &Collection) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    match (a.data(), b.data()) {
        (ValueData::Integer(x), ValueData::Integer(y)) => {
            Ok(from_option(x.checked_mul(*y).map(Value::integer)))
        }
        (ValueData::Quantity { value, unit }, _) => {
            let Some(factor) = as_decimal(&b) else {
                return Err(invalid_operands("*", &a, &b));
            };
            Ok(from_option(
                value.checked_mul(factor).map(|v| Value::quantity(v, unit.clone())),
            ))
        }
        (_, ValueData::Quantity { value, unit }) => {
            let Some(factor) = as_decimal(&a) else {
                return Err(invalid_operands("*", &a, &b));
            };
            Ok(from_option(
                value.checked_mul(factor).map(|v| Value::quantity(v, unit.clone())),
            ))
        }
        _ => numeric_op(&a, &b, "*", |x, y| x.checked_mul(y)),
    }
}

/// `/` always divides as decimals; `5 / 2` is `2.5`.
pub(crate) fn divide(left: &Collection, right: &Collection) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    match (a.data(), b.data()) {
        (
            ValueData::Quantity { value: va, unit: ua },
            ValueData::Quantity { value: vb, unit: ub },
        ) => {
            if ua != ub {
                return Ok(Collection::empty());
            }
            Ok(from_option(
                va.checked_div(*vb).map(|v| Value::decimal(v.normalize())),
            ))
        }
        (ValueData::Quantity { value, unit }, _) => {
            let Some(divisor) = as_decimal(&b) else {
                return Err(invalid_operands("/", &a, &b));
            };
            Ok(from_option(
                value
                    .checked_div(divisor)
                    .map(|v| Value::quantity(v.normalize(), unit.clone())),
            ))
        }
        _ => {
            let (Some(x), Some(y)) = (as_decimal(&a), as_decimal(&b)) else {
                return Err(invalid_operands("/", &a, &b));
            };
            Ok(from_option(
                x.checked_div(y).map(|v| Value::decimal(v.normalize())),
            ))
        }
    }
}

/// `div`: truncated division yielding an integer.
pub(crate) fn integer_divide(left: &Collection, right: &Collection) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    match (a.data(), b.data()) {
        (ValueData::Integer(x), ValueData::Integer(y)) => {
            Ok(from_option(x.checked_div(*y).map(Value::integer)))
        }
        _ => {
            let (Some(x), Some(y)) = (as_decimal(&a), as_decimal(&b)) else {
                return Err(invalid_operands("div", &a, &b));
            };
            Ok(from_option(
                x.checked_div(y)
                    .and_then(|v| v.trunc().to_i64())
                    .map(Value::integer),
            ))
        }
    }
}

pub(crate) fn modulo(left: &Collection, right: &Collection) -> Result<Collection> {
    let (Some(a), Some(b)) = (singleton_system(left)?, singleton_system(right)?) else {
        return Ok(Collection::empty());
    };
    match (a.data(), b.data()) {
        (ValueData::Integer(x), ValueData::Integer(y)) => {
            Ok(from_option(x.checked_rem(*y).map(Value::integer)))
        }
        _ => {
            let (Some(x), Some(y)) = (as_decimal(&a), as_decimal(&b)) else {
                return Err(invalid_operands("mod", &a, &b));
            };
            Ok(from_option(x.checked_rem(y).map(Value::decimal)))
        }
    }
}

/// `&`: string concatenation with empty treated as `''`.
pub(crate) fn concat(left: &Collection, right: &Collection) -> Result<Collection> {
    let a = left.as_string()?.unwrap_or_else(|| "".into());
    let b = right.as_string()?.unwrap_or_else(|| "".into());
    Ok(Collection::singleton(Value::string(format!("{a}{b}"))))
}

/// Unary minus on a non-literal operand.
pub(crate) fn negate(operand: &Collection) -> Result<Collection> {
    let Some(value) = singleton_system(operand)? else {
        return Ok(Collection::empty());
    };
    match value.data() {
        ValueData::Integer(i) => Ok(from_option(i.checked_neg().map(Value::integer))),
        ValueData::Decimal(d) => Ok(Collection::singleton(Value::decimal(-*d))),
        ValueData::Quantity { value, unit } => {
            Ok(Collection::singleton(Value::quantity(-*value, unit.clone())))
        }
        _ => Err(FhirPathError::InvalidOperation(format!(
            "cannot negate {}",
            value.type_info()
        ))),
    }
}

fn from_option(value: Option<Value>) -> Collection {
    match value {
        Some(v) => Collection::singleton(v),
        None => Collection::empty(),
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value.data() {
        ValueData::Integer(i) => Some(Decimal::from(*i)),
        ValueData::Decimal(d) => Some(*d),
        _ => None,
    }
}

fn invalid_operands(op: &str, a: &Value, b: &Value) -> FhirPathError {
    FhirPathError::InvalidOperation(format!(
        "'{op}' is not defined for {} and {}",
        a.type_info(),
        b.type_info()
    ))
}

fn numeric_op(
    a: &Value,
    b: &Value,
    op: &str,
    f: impl Fn(Decimal, Decimal) -> Option<Decimal>,
) -> Result<Collection> {
    let (Some(x), Some(y)) = (as_decimal(a), as_decimal(b)) else {
        return Err(invalid_operands(op, a, b));
    };
    Ok(from_option(f(x, y).map(Value::decimal)))
}

/// Quantity plus or minus quantity, converting the right side into the left
/// side's unit when both are definite durations.
fn quantity_add(a: &Value, b: &Value, sign: Decimal) -> Result<Collection> {
    let (
        ValueData::Quantity { value: va, unit: ua },
        ValueData::Quantity { value: vb, unit: ub },
    ) = (a.data(), b.data())
    else {
        return Err(invalid_operands("+", a, b));
    };
    let converted = if ua == ub {
        Some(*vb)
    } else {
        match (strict_seconds(ua), strict_seconds(ub)) {
            (Some(sa), Some(sb)) => vb
                .checked_mul(sb)
                .and_then(|seconds| seconds.checked_div(sa)),
            _ => None,
        }
    };
    let result = converted
        .and_then(|vb| vb.checked_mul(sign))
        .and_then(|vb| va.checked_add(vb))
        .map(|v| Value::quantity(v, ua.clone()));
    Ok(from_option(result))
}

/// Date, datetime, or time shifted by a calendar quantity. Anything the
/// calendar cannot express evaluates to empty.
fn temporal_shift(value: &Value, amount: Decimal, unit: &str) -> Collection {
    let Some(whole) = temporal::whole_units(amount) else {
        return Collection::empty();
    };
    match value.data() {
        ValueData::Date(date, precision) => from_option(
            temporal::add_to_date(*date, *precision, whole, unit)
                .map(|(d, p)| Value::date(d, p)),
        ),
        ValueData::DateTime {
            value,
            precision,
            offset,
        } => from_option(
            temporal::add_to_datetime(*value, whole, unit)
                .map(|v| Value::datetime(v, *precision, *offset)),
        ),
        ValueData::Time(time, precision) => from_option(
            temporal::add_to_time(*time, whole, unit).map(|t| Value::time(t, *precision)),
        ),
        _ => Collection::empty(),
    }
}
