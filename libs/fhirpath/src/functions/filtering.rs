//! Filtering and projection: `where`, `select`, `repeat`, `ofType`.

use crate::ast::{Expression, TypeSpecifier};
use crate::context::Context;
use crate::error::Result;
use crate::eval;
use crate::operations;
use crate::value::Collection;

pub(crate) fn filter(
    input: &Collection,
    criteria: &Expression,
    ctx: &Context,
) -> Result<Collection> {
    let mut result = Collection::empty();
    for (index, item) in input.iter().enumerate() {
        let scope = ctx.with_iteration(item.clone(), index);
        let focus = Collection::singleton(item.clone());
        if eval::evaluate_expression(criteria, &focus, &scope)?.as_boolean()? == Some(true) {
            result.push(item.clone());
        }
    }
    Ok(result)
}

pub(crate) fn select(
    input: &Collection,
    projection: &Expression,
    ctx: &Context,
) -> Result<Collection> {
    let mut result = Collection::empty();
    for (index, item) in input.iter().enumerate() {
        let scope = ctx.with_iteration(item.clone(), index);
        let focus = Collection::singleton(item.clone());
        result.append(&eval::evaluate_expression(projection, &focus, &scope)?);
    }
    Ok(result)
}

/// Transitive closure of the projection. Results are deduplicated under
/// `=`, which also keeps cyclic inputs from looping forever.
pub(crate) fn repeat(
    input: &Collection,
    projection: &Expression,
    ctx: &Context,
) -> Result<Collection> {
    let mut result = Collection::empty();
    let mut frontier = input.clone();
    while !frontier.is_empty() {
        let produced = select(&frontier, projection, ctx)?;
        frontier = Collection::empty();
        for value in produced.iter() {
            let seen = result
                .iter()
                .any(|existing| operations::items_equal(existing, value) == Some(true));
            if !seen {
                result.push(value.clone());
                frontier.push(value.clone());
            }
        }
    }
    Ok(result)
}

pub(crate) fn of_type(input: &Collection, specifier: &TypeSpecifier) -> Collection {
    input
        .iter()
        .filter(|item| eval::matches_type(item, specifier))
        .cloned()
        .collect()
}
