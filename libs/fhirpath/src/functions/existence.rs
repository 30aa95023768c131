//! Existence functions: `exists`, `all`, the boolean folds, set relations,
//! `count`, and `distinct`.

use crate::ast::Expression;
use crate::context::Context;
use crate::error::{FhirPathError, Result};
use crate::eval;
use crate::operations;
use crate::value::{Collection, Value, ValueData};

use super::truth;

pub(crate) fn exists(
    input: &Collection,
    criteria: Option<&Expression>,
    ctx: &Context,
) -> Result<Collection> {
    let Some(criteria) = criteria else {
        return Ok(truth(!input.is_empty()));
    };
    for (index, item) in input.iter().enumerate() {
        if check_item(criteria, item, index, ctx)? == Some(true) {
            return Ok(truth(true));
        }
    }
    Ok(truth(false))
}

/// True when the criteria holds for every item; an empty criteria result
/// counts against, and an empty input is vacuously true.
pub(crate) fn all(input: &Collection, criteria: &Expression, ctx: &Context) -> Result<Collection> {
    for (index, item) in input.iter().enumerate() {
        if check_item(criteria, item, index, ctx)? != Some(true) {
            return Ok(truth(false));
        }
    }
    Ok(truth(true))
}

fn check_item(
    criteria: &Expression,
    item: &Value,
    index: usize,
    ctx: &Context,
) -> Result<Option<bool>> {
    let scope = ctx.with_iteration(item.clone(), index);
    let focus = Collection::singleton(item.clone());
    eval::evaluate_expression(criteria, &focus, &scope)?.as_boolean()
}

pub(crate) fn all_true(input: &Collection) -> Result<Collection> {
    boolean_fold(input, |items| items.iter().all(|b| *b))
}

pub(crate) fn any_true(input: &Collection) -> Result<Collection> {
    boolean_fold(input, |items| items.iter().any(|b| *b))
}

pub(crate) fn all_false(input: &Collection) -> Result<Collection> {
    boolean_fold(input, |items| items.iter().all(|b| !*b))
}

pub(crate) fn any_false(input: &Collection) -> Result<Collection> {
    boolean_fold(input, |items| items.iter().any(|b| !*b))
}

fn boolean_fold(input: &Collection, fold: impl Fn(&[bool]) -> bool) -> Result<Collection> {
    let mut items = Vec::with_capacity(input.len());
    for value in input.iter() {
        match value.system().as_ref().map(Value::data) {
            Some(ValueData::Boolean(b)) => items.push(*b),
            _ => {
                return Err(FhirPathError::TypeError(format!(
                    "expected a collection of booleans, got {}",
                    value.type_info()
                )))
            }
        }
    }
    Ok(truth(fold(&items)))
}

/// Every item of `left` occurs in `right` under `=`. Doubles as
/// `supersetOf` with the operands swapped.
pub(crate) fn subset_of(left: &Collection, right: &Collection) -> Result<Collection> {
    let contained = left.iter().all(|item| {
        right
            .iter()
            .any(|candidate| operations::items_equal(item, candidate) == Some(true))
    });
    Ok(truth(contained))
}

pub(crate) fn distinct(input: &Collection) -> Collection {
    let mut result = Collection::empty();
    for value in input.iter() {
        if !result
            .iter()
            .any(|existing| operations::items_equal(existing, value) == Some(true))
        {
            result.push(value.clone());
        }
    }
    result
}

pub(crate) fn is_distinct(input: &Collection) -> Result<Collection> {
    Ok(truth(distinct(input).len() == input.len()))
}
