//! The tree-walking evaluator.
//!
//! Every expression maps a focus collection to a result collection under a
//! [`Context`]. Navigation never copies element trees; values hold `Arc`
//! handles into the decoded resource.

use aurum_element::Namespace;

use crate::ast::{
    AdditiveOperator, Expression, MultiplicativeOperator, OrOperator, PolarityOperator,
    TypeOperator, TypeSpecifier,
};
use crate::context::Context;
use crate::error::{FhirPathError, Result};
use crate::functions;
use crate::operations;
use crate::value::{Collection, Value, ValueData};

pub(crate) fn evaluate_expression(
    expr: &Expression,
    input: &Collection,
    ctx: &Context,
) -> Result<Collection> {
    match expr {
        Expression::Empty => Ok(Collection::empty()),
        Expression::Boolean(b) => Ok(Collection::singleton(Value::boolean(*b))),
        Expression::Integer(i) | Expression::Long(i) => {
            Ok(Collection::singleton(Value::integer(*i)))
        }
        Expression::Decimal(d) => Ok(Collection::singleton(Value::decimal(*d))),
        Expression::String(s) => Ok(Collection::singleton(Value::string(s.as_str()))),
        Expression::Date(date, precision) => {
            Ok(Collection::singleton(Value::date(*date, *precision)))
        }
        Expression::DateTime(value, precision, offset) => Ok(Collection::singleton(
            Value::datetime(*value, *precision, *offset),
        )),
        Expression::Time(time, precision) => {
            Ok(Collection::singleton(Value::time(*time, *precision)))
        }
        Expression::Quantity { value, unit } => Ok(Collection::singleton(Value::quantity(
            *value,
            unit.as_deref().unwrap_or("1"),
        ))),

        Expression::This => Ok(match ctx.this() {
            Some(this) => Collection::singleton(this.clone()),
            None => input.clone(),
        }),
        Expression::Index => match ctx.index() {
            Some(index) => Ok(Collection::singleton(Value::integer(index as i64))),
            None => Err(FhirPathError::EvaluationError(
                "$index is only defined inside iteration".to_string(),
            )),
        },
        Expression::Total => match ctx.total() {
            Some(total) => Ok(total.clone()),
            None => Err(FhirPathError::EvaluationError(
                "$total is only defined inside aggregate()".to_string(),
            )),
        },
        Expression::ExternalConstant(name) => match ctx.variable(name) {
            Some(value) => Ok(Collection::singleton(value.clone())),
            None => Err(FhirPathError::VariableNotFound(name.clone())),
        },

        Expression::Member(name) => Ok(navigate(input, name)),
        Expression::Function { name, arguments } => functions::invoke(name, input, arguments, ctx),
        Expression::Invocation { target, invocation } => {
            let focus = evaluate_expression(target, input, ctx)?;
            evaluate_expression(invocation, &focus, ctx)
        }
        Expression::Indexer { collection, index } => {
            let items = evaluate_expression(collection, input, ctx)?;
            let index = evaluate_expression(index, input, ctx)?.as_integer()?;
            Ok(match index {
                Some(i) if i >= 0 => match items.get(i as usize) {
                    Some(value) => Collection::singleton(value.clone()),
                    None => Collection::empty(),
                },
                _ => Collection::empty(),
            })
        }

        Expression::Polarity { operator, operand } => {
            let operand = evaluate_expression(operand, input, ctx)?;
            match operator {
                PolarityOperator::Plus => Ok(operand),
                PolarityOperator::Minus => operations::negate(&operand),
            }
        }
        Expression::Multiplicative {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, input, ctx)?;
            let r = evaluate_expression(right, input, ctx)?;
            match operator {
                MultiplicativeOperator::Multiply => operations::multiply(&l, &r),
                MultiplicativeOperator::Divide => operations::divide(&l, &r),
                MultiplicativeOperator::Div => operations::integer_divide(&l, &r),
                MultiplicativeOperator::Mod => operations::modulo(&l, &r),
            }
        }
        Expression::Additive {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, input, ctx)?;
            let r = evaluate_expression(right, input, ctx)?;
            match operator {
                AdditiveOperator::Plus => operations::add(&l, &r),
                AdditiveOperator::Minus => operations::subtract(&l, &r),
                AdditiveOperator::Concat => operations::concat(&l, &r),
            }
        }

        Expression::TypeTest {
            operator,
            operand,
            type_specifier,
        } => {
            let operand = evaluate_expression(operand, input, ctx)?;
            match operator {
                TypeOperator::Is => functions::utility::is_type(&operand, type_specifier),
                TypeOperator::As => functions::utility::as_type(&operand, type_specifier),
            }
        }
        Expression::Union { left, right } => {
            let l = evaluate_expression(left, input, ctx)?;
            let r = evaluate_expression(right, input, ctx)?;
            Ok(operations::union(&l, &r))
        }
        Expression::Inequality {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, input, ctx)?;
            let r = evaluate_expression(right, input, ctx)?;
            operations::compare(*operator, &l, &r)
        }
        Expression::Equality {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, input, ctx)?;
            let r = evaluate_expression(right, input, ctx)?;
            Ok(operations::equality(*operator, &l, &r))
        }
        Expression::Membership {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, input, ctx)?;
            let r = evaluate_expression(right, input, ctx)?;
            operations::membership(*operator, &l, &r)
        }

        Expression::And { left, right } => {
            let l = evaluate_expression(left, input, ctx)?.as_boolean()?;
            let r = evaluate_expression(right, input, ctx)?.as_boolean()?;
            Ok(operations::and(l, r))
        }
        Expression::Or {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, input, ctx)?.as_boolean()?;
            let r = evaluate_expression(right, input, ctx)?.as_boolean()?;
            Ok(match operator {
                OrOperator::Or => operations::or(l, r),
                OrOperator::Xor => operations::xor(l, r),
            })
        }
        Expression::Implies { left, right } => {
            let l = evaluate_expression(left, input, ctx)?.as_boolean()?;
            let r = evaluate_expression(right, input, ctx)?.as_boolean()?;
            Ok(operations::implies(l, r))
        }
    }
}

/// Member navigation over every item of the focus.
///
/// On a resource the resource type name selects the resource itself, so
/// `Patient.name` works with the resource as the root focus. On primitives
/// the reachable members are the metadata: `id` and `extension`.
fn navigate(input: &Collection, name: &str) -> Collection {
    let mut result = Collection::empty();
    for item in input.iter() {
        match item.data() {
            ValueData::Element(element) => {
                if element.resource_type() == Some(name) {
                    result.push(item.clone());
                } else if let Some(field) = element.field(name) {
                    for node in field.items() {
                        result.push(Value::from_node(node));
                    }
                } else if name == "id" {
                    if let Some(id) = element.id() {
                        result.push(Value::string(id));
                    }
                }
            }
            ValueData::Primitive(primitive) => match name {
                "extension" => {
                    for ext in primitive.extensions() {
                        result.push(Value::element(ext.clone()));
                    }
                }
                "id" => {
                    if let Some(id) = primitive.id() {
                        result.push(Value::string(id));
                    }
                }
                _ => {}
            },
            ValueData::Type(info) => match name {
                "namespace" => result.push(Value::string(info.namespace.to_string())),
                "name" => result.push(Value::string(info.name.clone())),
                _ => {}
            },
            _ => {}
        }
    }
    result
}

/// Schema-less type test: a bare name matches the value's own type name in
/// its own namespace (`Integer` for System integers, `boolean` for FHIR
/// boolean primitives, `Patient` for that resource); a qualifier pins the
/// namespace.
pub(crate) fn matches_type(value: &Value, specifier: &TypeSpecifier) -> bool {
    let info = value.type_info();
    match specifier.qualifier.as_deref() {
        Some("System") => {
            info.namespace == Namespace::System && info.name.as_ref() == specifier.name
        }
        Some("FHIR") => info.namespace == Namespace::Fhir && info.name.as_ref() == specifier.name,
        Some(_) => false,
        None => info.name.as_ref() == specifier.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurum_element::{Element, Field, Node, Primitive};
    use std::sync::Arc;

    fn patient() -> Collection {
        let mut resource = Element::resource("Patient");
        let mut active = Field::new("active");
        active.push(Node::Primitive(Arc::new(Primitive::boolean(true))));
        resource.push_field(active).unwrap();
        Collection::singleton(Value::element(Arc::new(resource)))
    }

    #[test]
    fn test_resource_type_head_selects_the_resource() {
        let focus = patient();
        assert_eq!(navigate(&focus, "Patient").len(), 1);
        assert_eq!(navigate(&focus, "Observation").len(), 0);
    }

    #[test]
    fn test_member_navigation_reaches_fields() {
        let focus = patient();
        let active = navigate(&focus, "active");
        assert_eq!(active.as_boolean().unwrap(), Some(true));
        assert!(navigate(&focus, "name").is_empty());
    }

    #[test]
    fn test_bare_type_names_match_their_namespace() {
        assert!(matches_type(
            &Value::integer(5),
            &TypeSpecifier::bare("Integer")
        ));
        assert!(matches_type(
            &Value::integer(5),
            &TypeSpecifier::new(Some("System".to_string()), "Integer")
        ));
        assert!(!matches_type(
            &Value::integer(5),
            &TypeSpecifier::new(Some("FHIR".to_string()), "Integer")
        ));
        let boolean = Value::primitive(Arc::new(Primitive::boolean(true)));
        assert!(matches_type(&boolean, &TypeSpecifier::bare("boolean")));
    }
}
