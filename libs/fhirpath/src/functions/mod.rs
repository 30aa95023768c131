//! Built-in function dispatch.
//!
//! Arity is validated against the registry before anything is evaluated.
//! Iteration functions (`where`, `select`, `exists(criteria)`, `all`,
//! `repeat`, `aggregate`, `iif`, `trace` with a projection) receive their
//! arguments unevaluated and run them per item with `$this`/`$index` bound;
//! everything else evaluates its arguments against the invocation focus
//! first.

pub(crate) mod aggregate;
pub(crate) mod combining;
pub(crate) mod conversion;
pub(crate) mod existence;
pub(crate) mod filtering;
pub(crate) mod math;
pub(crate) mod navigation;
pub(crate) mod string;
pub(crate) mod subsetting;
pub(crate) mod utility;

use crate::ast::{Expression, TypeSpecifier};
use crate::context::Context;
use crate::error::{FhirPathError, Result};
use crate::eval;
use crate::registry;
use crate::value::{Collection, Value};

pub(crate) fn invoke(
    name: &str,
    input: &Collection,
    args: &[Expression],
    ctx: &Context,
) -> Result<Collection> {
    let Some(meta) = registry::lookup(name) else {
        return Err(FhirPathError::FunctionNotFound(name.to_string()));
    };
    let argc = args.len() as u8;
    if argc < meta.min_args || meta.max_args.is_some_and(|max| argc > max) {
        return Err(FhirPathError::EvaluationError(format!(
            "{name}() takes {}{} argument(s), got {argc}",
            meta.min_args,
            match meta.max_args {
                Some(max) if max == meta.min_args => String::new(),
                Some(max) => format!(" to {max}"),
                None => " or more".to_string(),
            },
        )));
    }

    match name {
        // Existence
        "empty" => Ok(truth(input.is_empty())),
        "exists" => existence::exists(input, args.first(), ctx),
        "all" => existence::all(input, &args[0], ctx),
        "allTrue" => existence::all_true(input),
        "anyTrue" => existence::any_true(input),
        "allFalse" => existence::all_false(input),
        "anyFalse" => existence::any_false(input),
        "subsetOf" => existence::subset_of(input, &evaluate(&args[0], input, ctx)?),
        "supersetOf" => existence::subset_of(&evaluate(&args[0], input, ctx)?, input),
        "count" => Ok(Collection::singleton(Value::integer(input.len() as i64))),
        "distinct" => Ok(existence::distinct(input)),
        "isDistinct" => existence::is_distinct(input),

        // Filtering and projection
        "where" => filtering::filter(input, &args[0], ctx),
        "select" => filtering::select(input, &args[0], ctx),
        "repeat" => filtering::repeat(input, &args[0], ctx),
        "ofType" => Ok(filtering::of_type(input, &type_argument(name, &args[0])?)),

        // Subsetting
        "single" => subsetting::single(input),
        "first" => Ok(subsetting::first(input)),
        "last" => Ok(subsetting::last(input)),
        "tail" => Ok(subsetting::tail(input)),
        "skip" => subsetting::skip(input, &evaluate(&args[0], input, ctx)?),
        "take" => subsetting::take(input, &evaluate(&args[0], input, ctx)?),
        "intersect" => Ok(subsetting::intersect(input, &evaluate(&args[0], input, ctx)?)),
        "exclude" => Ok(subsetting::exclude(input, &evaluate(&args[0], input, ctx)?)),

        // Combining
        "union" => Ok(crate::operations::union(input, &evaluate(&args[0], input, ctx)?)),
        "combine" => Ok(combining::combine(input, &evaluate(&args[0], input, ctx)?)),

        // Strings
        "indexOf" => string::index_of(input, &evaluate(&args[0], input, ctx)?, false),
        "lastIndexOf" => string::index_of(input, &evaluate(&args[0], input, ctx)?, true),
        "substring" => string::substring(
            input,
            &evaluate(&args[0], input, ctx)?,
            args.get(1).map(|a| evaluate(a, input, ctx)).transpose()?,
        ),
        "startsWith" => string::starts_with(input, &evaluate(&args[0], input, ctx)?),
        "endsWith" => string::ends_with(input, &evaluate(&args[0], input, ctx)?),
        "contains" => string::contains(input, &evaluate(&args[0], input, ctx)?),
        "upper" => string::upper(input),
        "lower" => string::lower(input),
        "replace" => string::replace(
            input,
            &evaluate(&args[0], input, ctx)?,
            &evaluate(&args[1], input, ctx)?,
        ),
        "matches" => string::matches(input, &evaluate(&args[0], input, ctx)?, false),
        "matchesFull" => string::matches(input, &evaluate(&args[0], input, ctx)?, true),
        "replaceMatches" => string::replace_matches(
            input,
            &evaluate(&args[0], input, ctx)?,
            &evaluate(&args[1], input, ctx)?,
        ),
        "length" => string::length(input),
        "toChars" => string::to_chars(input),
        "trim" => string::trim(input),
        "split" => string::split(input, &evaluate(&args[0], input, ctx)?),
        "join" => string::join(
            input,
            args.first().map(|a| evaluate(a, input, ctx)).transpose()?,
        ),
        "encode" => string::encode(input, &evaluate(&args[0], input, ctx)?),
        "decode" => string::decode(input, &evaluate(&args[0], input, ctx)?),
        "escape" => string::escape(input, &evaluate(&args[0], input, ctx)?),
        "unescape" => string::unescape(input, &evaluate(&args[0], input, ctx)?),

        // Math
        "abs" => math::abs(input),
        "ceiling" => math::ceiling(input),
        "exp" => math::exp(input),
        "floor" => math::floor(input),
        "ln" => math::ln(input),
        "log" => math::log(input, &evaluate(&args[0], input, ctx)?),
        "power" => math::power(input, &evaluate(&args[0], input, ctx)?),
        "round" => math::round(
            input,
            args.first().map(|a| evaluate(a, input, ctx)).transpose()?,
        ),
        "sqrt" => math::sqrt(input),
        "truncate" => math::truncate(input),

        // Conversion
        "iif" => conversion::iif(input, args, ctx),
        "toBoolean" => conversion::to_boolean(input),
        "convertsToBoolean" => converts(input, conversion::to_boolean(input)?),
        "toInteger" => conversion::to_integer(input),
        "convertsToInteger" => converts(input, conversion::to_integer(input)?),
        "toLong" => conversion::to_integer(input),
        "convertsToLong" => converts(input, conversion::to_integer(input)?),
        "toDecimal" => conversion::to_decimal(input),
        "convertsToDecimal" => converts(input, conversion::to_decimal(input)?),
        "toString" => conversion::to_string(input),
        "convertsToString" => converts(input, conversion::to_string(input)?),
        "toDate" => conversion::to_date(input),
        "convertsToDate" => converts(input, conversion::to_date(input)?),
        "toDateTime" => conversion::to_datetime(input),
        "convertsToDateTime" => converts(input, conversion::to_datetime(input)?),
        "toTime" => conversion::to_time(input),
        "convertsToTime" => converts(input, conversion::to_time(input)?),
        "toQuantity" => conversion::to_quantity(
            input,
            args.first().map(|a| evaluate(a, input, ctx)).transpose()?,
        ),
        "convertsToQuantity" => {
            let unit = args.first().map(|a| evaluate(a, input, ctx)).transpose()?;
            converts(input, conversion::to_quantity(input, unit)?)
        }

        // Tree navigation
        "children" => Ok(navigation::children(input)),
        "descendants" => Ok(navigation::descendants(input)),

        // Utility
        "trace" => utility::trace(input, args, ctx),
        "now" => Ok(utility::now()),
        "today" => Ok(utility::today()),
        "timeOfDay" => Ok(utility::time_of_day()),
        "type" => Ok(utility::type_of(input)),
        "is" => utility::is_type(input, &type_argument(name, &args[0])?),
        "as" => utility::as_type(input, &type_argument(name, &args[0])?),
        "not" => utility::not(input),
        "hasValue" => Ok(utility::has_value(input)),
        "extension" => utility::extension(input, &evaluate(&args[0], input, ctx)?),
        "getValue" => Ok(utility::get_value(input)),

        // Aggregates
        "aggregate" => aggregate::aggregate(input, args, ctx),

        _ => Err(FhirPathError::FunctionNotFound(name.to_string())),
    }
}

fn evaluate(arg: &Expression, input: &Collection, ctx: &Context) -> Result<Collection> {
    eval::evaluate_expression(arg, input, ctx)
}

pub(super) fn truth(value: bool) -> Collection {
    Collection::singleton(Value::boolean(value))
}

/// `convertsToX()`: empty input stays empty, otherwise whether `toX()`
/// produced a value.
fn converts(input: &Collection, converted: Collection) -> Result<Collection> {
    if input.is_empty() {
        Ok(Collection::empty())
    } else {
        Ok(truth(!converted.is_empty()))
    }
}

/// The argument of `ofType()`, `is()`, and `as()` is a type name, which the
/// parser sees as a member path (`Quantity`, `System.Integer`).
fn type_argument(function: &str, arg: &Expression) -> Result<TypeSpecifier> {
    match arg {
        Expression::Member(name) => Ok(TypeSpecifier::bare(name.clone())),
        Expression::Invocation { target, invocation } => {
            if let (Expression::Member(qualifier), Expression::Member(name)) =
                (target.as_ref(), invocation.as_ref())
            {
                Ok(TypeSpecifier::new(Some(qualifier.clone()), name.clone()))
            } else {
                Err(bad_type_argument(function))
            }
        }
        _ => Err(bad_type_argument(function)),
    }
}

fn bad_type_argument(function: &str) -> FhirPathError {
    FhirPathError::EvaluationError(format!("{function}() takes a type name argument"))
}
