//! Structural equality and equivalence over element trees.
//!
//! `equal` is the strict relation: same types, same ids, same metadata,
//! decimals compared numerically. `equivalent` follows FHIRPath `~`: ids and
//! primitive extensions are ignored, strings compare case-insensitively with
//! collapsed whitespace, decimals compare after rounding to the smaller
//! scale. Both relations ignore field order (JSON objects are unordered) but
//! respect item order within a repeating field.

use rust_decimal::Decimal;

use crate::element::{Element, Field, Node, Primitive, PrimitiveValue};

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Strict,
    Equivalent,
}

/// Strict structural equality.
pub fn equal(a: &Element, b: &Element) -> bool {
    elements_match(a, b, Mode::Strict)
}

/// FHIRPath-style equivalence: reflexive, id-insensitive.
pub fn equivalent(a: &Element, b: &Element) -> bool {
    elements_match(a, b, Mode::Equivalent)
}

pub fn node_equal(a: &Node, b: &Node) -> bool {
    nodes_match(a, b, Mode::Strict)
}

pub fn node_equivalent(a: &Node, b: &Node) -> bool {
    nodes_match(a, b, Mode::Equivalent)
}

fn elements_match(a: &Element, b: &Element, mode: Mode) -> bool {
    if a.type_name() != b.type_name() || a.is_resource() != b.is_resource() {
        return false;
    }
    if mode == Mode::Strict && a.id() != b.id() {
        return false;
    }
    if a.fields().len() != b.fields().len() {
        return false;
    }
    a.fields().iter().all(|fa| {
        b.fields()
            .iter()
            .find(|fb| fb.name() == fa.name())
            .is_some_and(|fb| fields_match(fa, fb, mode))
    })
}

fn fields_match(a: &Field, b: &Field, mode: Mode) -> bool {
    a.items().len() == b.items().len()
        && a.items()
            .iter()
            .zip(b.items())
            .all(|(x, y)| nodes_match(x, y, mode))
}

fn nodes_match(a: &Node, b: &Node, mode: Mode) -> bool {
    match (a, b) {
        (Node::Element(x), Node::Element(y)) => elements_match(x, y, mode),
        (Node::Primitive(x), Node::Primitive(y)) => primitives_match(x, y, mode),
        _ => false,
    }
}

fn primitives_match(a: &Primitive, b: &Primitive, mode: Mode) -> bool {
    let values = match (a.value(), b.value()) {
        (None, None) => true,
        (Some(x), Some(y)) => values_match(x, y, mode),
        _ => false,
    };
    if !values {
        return false;
    }
    match mode {
        Mode::Strict => {
            a.id() == b.id()
                && a.extensions().len() == b.extensions().len()
                && a.extensions()
                    .iter()
                    .zip(b.extensions())
                    .all(|(x, y)| elements_match(x, y, Mode::Strict))
        }
        Mode::Equivalent => true,
    }
}

fn values_match(a: &PrimitiveValue, b: &PrimitiveValue, mode: Mode) -> bool {
    match (a, b) {
        (PrimitiveValue::Boolean(x), PrimitiveValue::Boolean(y)) => x == y,
        (PrimitiveValue::Integer(x), PrimitiveValue::Integer(y)) => x == y,
        (PrimitiveValue::Decimal(x), PrimitiveValue::Decimal(y)) => match mode {
            Mode::Strict => x == y,
            Mode::Equivalent => decimals_equivalent(x, y),
        },
        (PrimitiveValue::Integer(x), PrimitiveValue::Decimal(y))
        | (PrimitiveValue::Decimal(y), PrimitiveValue::Integer(x)) => Decimal::from(*x) == *y,
        (PrimitiveValue::String(x), PrimitiveValue::String(y)) => match mode {
            Mode::Strict => x == y,
            Mode::Equivalent => strings_equivalent(x, y),
        },
        _ => false,
    }
}

fn strings_equivalent(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };
    normalize(a) == normalize(b)
}

/// Scale once trailing zeros are dropped, so `1.10` counts as scale 1.
fn effective_scale(d: &Decimal) -> u32 {
    d.normalize().scale()
}

fn decimals_equivalent(a: &Decimal, b: &Decimal) -> bool {
    let scale = effective_scale(a).min(effective_scale(b));
    a.round_dp(scale) == b.round_dp(scale)
}
