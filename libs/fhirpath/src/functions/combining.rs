//! Combining: `combine` (the deduplicating `union` lives with the `|`
//! operator in `operations`).

use crate::value::Collection;

/// Concatenation without deduplication.
pub(crate) fn combine(input: &Collection, other: &Collection) -> Collection {
    let mut result = input.clone();
    result.append(other);
    result
}
