//! Tree navigation: `children` and `descendants`.

use crate::value::{Collection, Value, ValueData};

/// Immediate child nodes of every item. Primitive children are their
/// extension elements.
pub(crate) fn children(input: &Collection) -> Collection {
    let mut result = Collection::empty();
    for item in input.iter() {
        match item.data() {
            ValueData::Element(element) => {
                for node in element.child_nodes() {
                    result.push(Value::from_node(node));
                }
            }
            ValueData::Primitive(primitive) => {
                for extension in primitive.extensions() {
                    result.push(Value::element(extension.clone()));
                }
            }
            _ => {}
        }
    }
    result
}

/// All descendants, breadth-first, the items themselves excluded.
pub(crate) fn descendants(input: &Collection) -> Collection {
    let mut result = Collection::empty();
    let mut frontier = children(input);
    while !frontier.is_empty() {
        result.append(&frontier);
        frontier = children(&frontier);
    }
    result
}
