//! Subsetting: `single`, `first`, `last`, `tail`, `skip`, `take`,
//! `intersect`, `exclude`.

use crate::error::{FhirPathError, Result};
use crate::operations;
use crate::value::Collection;

pub(crate) fn single(input: &Collection) -> Result<Collection> {
    match input.len() {
        0 => Ok(Collection::empty()),
        1 => Ok(input.clone()),
        n => Err(FhirPathError::EvaluationError(format!(
            "single() requires at most one item, got {n}"
        ))),
    }
}

pub(crate) fn first(input: &Collection) -> Collection {
    input.first().cloned().map_or_else(Collection::empty, Collection::singleton)
}

pub(crate) fn last(input: &Collection) -> Collection {
    input.last().cloned().map_or_else(Collection::empty, Collection::singleton)
}

pub(crate) fn tail(input: &Collection) -> Collection {
    input.iter().skip(1).cloned().collect()
}

pub(crate) fn skip(input: &Collection, count: &Collection) -> Result<Collection> {
    let count = required_integer("skip", count)?;
    if count <= 0 {
        return Ok(input.clone());
    }
    Ok(input.iter().skip(count as usize).cloned().collect())
}

pub(crate) fn take(input: &Collection, count: &Collection) -> Result<Collection> {
    let count = required_integer("take", count)?;
    if count <= 0 {
        return Ok(Collection::empty());
    }
    Ok(input.iter().take(count as usize).cloned().collect())
}

fn required_integer(function: &str, argument: &Collection) -> Result<i64> {
    argument.as_integer()?.ok_or_else(|| {
        FhirPathError::EvaluationError(format!("{function}() takes an integer argument"))
    })
}

/// Items present in both operands, deduplicated.
pub(crate) fn intersect(input: &Collection, other: &Collection) -> Collection {
    let mut result = Collection::empty();
    for item in input.iter() {
        let in_other = other
            .iter()
            .any(|candidate| operations::items_equal(item, candidate) == Some(true));
        let seen = result
            .iter()
            .any(|existing| operations::items_equal(item, existing) == Some(true));
        if in_other && !seen {
            result.push(item.clone());
        }
    }
    result
}

/// Items not present in `other`; duplicates and order are preserved.
pub(crate) fn exclude(input: &Collection, other: &Collection) -> Collection {
    input
        .iter()
        .filter(|item| {
            !other
                .iter()
                .any(|candidate| operations::items_equal(item, candidate) == Some(true))
        })
        .cloned()
        .collect()
}
