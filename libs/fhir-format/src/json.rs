//! The FHIR JSON wire format.
//!
//! Decoding is strict: the shapes FHIR JSON allows are accepted, everything
//! else is an error. Primitive metadata rides in `_field` siblings that pair
//! item-wise with their base field, `null`-padded on either side when only
//! one of value/metadata is present at a position.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};

use aurum_element::types;
use aurum_element::{Element, Field, Node, Primitive, PrimitiveValue};

use crate::error::{FormatError, Result};

/// Parses a FHIR JSON document into a resource tree.
pub fn parse_json(input: &str) -> Result<Element> {
    let value: JsonValue = serde_json::from_str(input)?;
    parse_json_value(&value)
}

/// Parses an already-deserialized JSON value into a resource tree.
pub fn parse_json_value(value: &JsonValue) -> Result<Element> {
    let obj = value.as_object().ok_or(FormatError::ExpectedObject)?;
    decode_resource(obj)
}

/// Encodes an element tree as a JSON value.
pub fn write_json(element: &Element) -> Result<JsonValue> {
    let mut map = Map::new();
    if let Some(resource_type) = element.resource_type() {
        map.insert(
            "resourceType".to_string(),
            JsonValue::String(resource_type.to_string()),
        );
    }
    if !element.is_resource() {
        if let Some(id) = element.id() {
            map.insert("id".to_string(), JsonValue::String(id.to_string()));
        }
    }
    for field in element.fields() {
        encode_field(&mut map, field)?;
    }
    Ok(JsonValue::Object(map))
}

pub fn to_json_string(element: &Element) -> Result<String> {
    Ok(serde_json::to_string(&write_json(element)?)?)
}

pub fn to_json_string_pretty(element: &Element) -> Result<String> {
    Ok(serde_json::to_string_pretty(&write_json(element)?)?)
}

fn decode_resource(obj: &Map<String, JsonValue>) -> Result<Element> {
    let resource_type = obj
        .get("resourceType")
        .and_then(JsonValue::as_str)
        .ok_or(FormatError::MissingResourceType)?;
    let mut element = Element::resource(resource_type);
    decode_members(&mut element, obj, true)?;
    Ok(element)
}

/// Decodes the properties of one JSON object into an element.
///
/// Underscore keys are paired with their base property here; an `_field`
/// whose base is absent decodes to value-less primitives.
fn decode_members(
    element: &mut Element,
    obj: &Map<String, JsonValue>,
    is_resource: bool,
) -> Result<()> {
    for (key, value) in obj {
        if is_resource && key == "resourceType" {
            continue;
        }
        if let Some(base) = key.strip_prefix('_') {
            if obj.contains_key(base) {
                // Handled when the base property is decoded.
                continue;
            }
            if !is_resource && base == "id" {
                return Err(FormatError::InvalidMetadata(base.to_string()));
            }
            element.push_field(decode_detached_metadata(base, value)?)?;
            continue;
        }
        if !is_resource && key == "id" {
            match value.as_str() {
                Some(id) => element.set_id(id),
                None => return Err(FormatError::InvalidElementId(key.clone())),
            }
            continue;
        }
        let meta = obj.get(&format!("_{key}"));
        element.push_field(decode_field(key, value, meta)?)?;
    }
    Ok(())
}

fn decode_field(name: &str, value: &JsonValue, meta: Option<&JsonValue>) -> Result<Field> {
    let mut field = Field::new(name);
    let variant = field.choice().map(str::to_string);
    match value {
        JsonValue::Array(items) => {
            field.set_array(true);
            let metas = align_metadata(name, meta, items.len())?;
            for (item, m) in items.iter().zip(metas) {
                field.push(decode_node(name, item, m, variant.as_deref())?);
            }
        }
        _ => {
            let m = single_metadata(name, meta)?;
            field.push(decode_node(name, value, m, variant.as_deref())?);
        }
    }
    Ok(field)
}

/// Pairs an `_field` value with a base array of `len` items.
fn align_metadata<'a>(
    name: &str,
    meta: Option<&'a JsonValue>,
    len: usize,
) -> Result<Vec<Option<&'a Map<String, JsonValue>>>> {
    match meta {
        None | Some(JsonValue::Null) => Ok(vec![None; len]),
        Some(JsonValue::Array(items)) => {
            if items.len() != len {
                return Err(FormatError::MetadataMismatch(name.to_string()));
            }
            items
                .iter()
                .map(|item| match item {
                    JsonValue::Null => Ok(None),
                    JsonValue::Object(m) => Ok(Some(m)),
                    _ => Err(FormatError::InvalidMetadata(name.to_string())),
                })
                .collect()
        }
        Some(_) => Err(FormatError::MetadataMismatch(name.to_string())),
    }
}

fn single_metadata<'a>(
    name: &str,
    meta: Option<&'a JsonValue>,
) -> Result<Option<&'a Map<String, JsonValue>>> {
    match meta {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(m)) => Ok(Some(m)),
        Some(_) => Err(FormatError::InvalidMetadata(name.to_string())),
    }
}

fn decode_node(
    name: &str,
    value: &JsonValue,
    meta: Option<&Map<String, JsonValue>>,
    variant: Option<&str>,
) -> Result<Node> {
    match value {
        JsonValue::Null => {
            // Null is only padding for a metadata-carrying position.
            let meta = meta.ok_or_else(|| FormatError::UnexpectedNull(name.to_string()))?;
            let mut primitive = Primitive::empty();
            apply_metadata(name, &mut primitive, meta)?;
            type_primitive(&mut primitive, variant);
            Ok(primitive.into())
        }
        JsonValue::Bool(b) => Ok(decode_primitive(PrimitiveValue::Boolean(*b), name, meta, variant)?),
        JsonValue::Number(n) => {
            Ok(decode_primitive(decode_number(name, n)?, name, meta, variant)?)
        }
        JsonValue::String(s) => Ok(decode_primitive(
            PrimitiveValue::String(s.as_str().into()),
            name,
            meta,
            variant,
        )?),
        JsonValue::Object(obj) => {
            if meta.is_some() {
                return Err(FormatError::MetadataOnComplex(name.to_string()));
            }
            if obj.contains_key("resourceType") {
                return Ok(decode_resource(obj)?.into());
            }
            let mut element = match variant {
                Some(v) if !types::is_primitive_type_name(v) => Element::typed(v),
                _ => Element::new(),
            };
            decode_members(&mut element, obj, false)?;
            Ok(element.into())
        }
        JsonValue::Array(_) => Err(FormatError::NestedArray(name.to_string())),
    }
}

fn decode_primitive(
    value: PrimitiveValue,
    name: &str,
    meta: Option<&Map<String, JsonValue>>,
    variant: Option<&str>,
) -> Result<Node> {
    let mut primitive = match value {
        PrimitiveValue::Boolean(b) => Primitive::boolean(b),
        PrimitiveValue::Integer(i) => Primitive::integer(i),
        PrimitiveValue::Decimal(d) => Primitive::decimal(d),
        PrimitiveValue::String(s) => Primitive::string(s),
    };
    if let Some(meta) = meta {
        apply_metadata(name, &mut primitive, meta)?;
    }
    type_primitive(&mut primitive, variant);
    Ok(primitive.into())
}

fn decode_number(name: &str, n: &serde_json::Number) -> Result<PrimitiveValue> {
    let literal = n.to_string();
    if !literal.contains(['.', 'e', 'E']) {
        if let Some(i) = n.as_i64() {
            return Ok(PrimitiveValue::Integer(i));
        }
    }
    let decimal = Decimal::from_str(&literal)
        .or_else(|_| Decimal::from_scientific(&literal))
        .map_err(|_| FormatError::InvalidValue {
            name: name.to_string(),
            value: literal,
        })?;
    Ok(PrimitiveValue::Decimal(decimal))
}

/// An `_field` with no base property: value-less primitives.
fn decode_detached_metadata(base: &str, value: &JsonValue) -> Result<Field> {
    let mut field = Field::new(base);
    let variant = field.choice().map(str::to_string);
    let metas: Vec<&Map<String, JsonValue>> = match value {
        JsonValue::Object(m) => vec![m],
        JsonValue::Array(items) => {
            field.set_array(true);
            items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| FormatError::InvalidMetadata(base.to_string()))
                })
                .collect::<Result<_>>()?
        }
        _ => return Err(FormatError::InvalidMetadata(base.to_string())),
    };
    for meta in metas {
        let mut primitive = Primitive::empty();
        apply_metadata(base, &mut primitive, meta)?;
        type_primitive(&mut primitive, variant.as_deref());
        field.push(primitive.into());
    }
    Ok(field)
}

fn apply_metadata(
    name: &str,
    primitive: &mut Primitive,
    meta: &Map<String, JsonValue>,
) -> Result<()> {
    for (key, value) in meta {
        match key.as_str() {
            "id" => match value.as_str() {
                Some(id) => primitive.set_id(id),
                None => return Err(FormatError::InvalidElementId(name.to_string())),
            },
            "extension" => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FormatError::InvalidMetadata(name.to_string()))?;
                for item in items {
                    let obj = item
                        .as_object()
                        .ok_or_else(|| FormatError::InvalidMetadata(name.to_string()))?;
                    let mut extension = Element::typed("Extension");
                    decode_members(&mut extension, obj, false)?;
                    primitive.push_extension(extension);
                }
            }
            _ => return Err(FormatError::InvalidMetadata(name.to_string())),
        }
    }
    Ok(())
}

fn type_primitive(primitive: &mut Primitive, variant: Option<&str>) {
    if let Some(v) = variant {
        if types::is_primitive_type_name(v) {
            primitive.set_type_name(types::variant_to_type_name(v));
        }
    }
}

fn encode_field(map: &mut Map<String, JsonValue>, field: &Field) -> Result<()> {
    let mut values = Vec::with_capacity(field.items().len());
    let mut metas = Vec::with_capacity(field.items().len());
    for node in field.items() {
        match node {
            Node::Element(e) => {
                values.push(write_json(e)?);
                metas.push(JsonValue::Null);
            }
            Node::Primitive(p) => {
                values.push(encode_primitive_value(p)?);
                metas.push(encode_primitive_metadata(p)?);
            }
        }
    }
    let any_value = values.iter().any(|v| !v.is_null());
    let any_meta = metas.iter().any(|m| !m.is_null());
    if field.is_array() || field.items().len() != 1 {
        if any_value {
            map.insert(field.name().to_string(), JsonValue::Array(values));
        }
        if any_meta {
            map.insert(format!("_{}", field.name()), JsonValue::Array(metas));
        }
    } else {
        if any_value {
            map.insert(field.name().to_string(), values.remove(0));
        }
        if any_meta {
            map.insert(format!("_{}", field.name()), metas.remove(0));
        }
    }
    Ok(())
}

fn encode_primitive_value(primitive: &Primitive) -> Result<JsonValue> {
    match primitive.value() {
        None => Ok(JsonValue::Null),
        Some(PrimitiveValue::Boolean(b)) => Ok(JsonValue::Bool(*b)),
        Some(PrimitiveValue::Integer(i)) => Ok(JsonValue::from(*i)),
        Some(PrimitiveValue::Decimal(d)) => {
            let number: serde_json::Number = serde_json::from_str(&d.to_string())?;
            Ok(JsonValue::Number(number))
        }
        Some(PrimitiveValue::String(s)) => Ok(JsonValue::String(s.to_string())),
    }
}

fn encode_primitive_metadata(primitive: &Primitive) -> Result<JsonValue> {
    if !primitive.has_metadata() {
        return Ok(JsonValue::Null);
    }
    let mut meta = Map::new();
    if let Some(id) = primitive.id() {
        meta.insert("id".to_string(), JsonValue::String(id.to_string()));
    }
    if !primitive.extensions().is_empty() {
        let extensions = primitive
            .extensions()
            .iter()
            .map(|e| write_json(e))
            .collect::<Result<Vec<_>>>()?;
        meta.insert("extension".to_string(), JsonValue::Array(extensions));
    }
    Ok(JsonValue::Object(meta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_number() {
        assert_eq!(
            decode_number("a", &serde_json::from_str("42").unwrap()).unwrap(),
            PrimitiveValue::Integer(42)
        );
        assert_eq!(
            decode_number("a", &serde_json::from_str("1.10").unwrap()).unwrap(),
            PrimitiveValue::Decimal(Decimal::from_str("1.10").unwrap())
        );
        assert_eq!(
            decode_number("a", &serde_json::from_str("1e2").unwrap()).unwrap(),
            PrimitiveValue::Decimal(Decimal::from(100))
        );
    }

    #[test]
    fn test_align_metadata_rejects_length_mismatch() {
        let meta = serde_json::json!([null]);
        assert!(matches!(
            align_metadata("given", Some(&meta), 2),
            Err(FormatError::MetadataMismatch(_))
        ));
    }
}
