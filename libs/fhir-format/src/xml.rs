//! The FHIR XML wire format.
//!
//! Reading uses `roxmltree` over the whole document; writing streams through
//! a `quick-xml` writer with two-space indentation. The narrative `div`
//! subtree lives in the XHTML namespace and is carried as a raw string in
//! both directions.

use std::io::Cursor;
use std::str::FromStr;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;

use aurum_element::types;
use aurum_element::{Element, Field, Node, Primitive};

use crate::error::{FormatError, Result};

pub const FHIR_NS: &str = "http://hl7.org/fhir";
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Parses a FHIR XML document into a resource tree.
pub fn parse_xml(input: &str) -> Result<Element> {
    let doc = roxmltree::Document::parse(input)?;
    let root = doc.root_element();
    expect_fhir_namespace(&root)?;
    check_attributes(&root, &[])?;
    let mut element = Element::resource(root.tag_name().name());
    decode_children(&mut element, root, input)?;
    Ok(element)
}

/// Encodes an element tree as an indented XML document.
pub fn write_xml(element: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write_resource(&mut writer, element, true)?;
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|_| FormatError::Utf8)
}

fn expect_fhir_namespace(node: &roxmltree::Node) -> Result<()> {
    if node.tag_name().namespace() == Some(FHIR_NS) {
        Ok(())
    } else {
        Err(FormatError::UnexpectedNamespace(
            node.tag_name().name().to_string(),
        ))
    }
}

fn check_attributes(node: &roxmltree::Node, allowed: &[&str]) -> Result<()> {
    for attr in node.attributes() {
        if attr.namespace().is_some() || !allowed.contains(&attr.name()) {
            return Err(FormatError::UnexpectedAttribute {
                element: node.tag_name().name().to_string(),
                attribute: attr.name().to_string(),
            });
        }
    }
    Ok(())
}

fn decode_children(element: &mut Element, node: roxmltree::Node, source: &str) -> Result<()> {
    let mut fields: Vec<Field> = Vec::new();
    for child in node.children() {
        if child.is_text() {
            if child.text().is_some_and(|t| !t.trim().is_empty()) {
                return Err(FormatError::UnexpectedText(
                    node.tag_name().name().to_string(),
                ));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }
        let name = child.tag_name().name();
        let item = if child.tag_name().namespace() == Some(XHTML_NS) {
            // Narrative: keep the XHTML subtree verbatim.
            let mut narrative = Primitive::string(&source[child.range()]);
            narrative.set_type_name("xhtml");
            Node::Primitive(narrative.into())
        } else {
            expect_fhir_namespace(&child)?;
            decode_element_node(child, source)?
        };
        match fields.iter_mut().find(|f| f.name() == name) {
            Some(field) => {
                field.set_array(true);
                field.push(item);
            }
            None => {
                let mut field = Field::new(name);
                field.push(item);
                fields.push(field);
            }
        }
    }
    for field in fields {
        element.push_field(field)?;
    }
    Ok(())
}

fn decode_element_node(node: roxmltree::Node, source: &str) -> Result<Node> {
    let name = node.tag_name().name();
    let variant = types::split_choice_name(name).map(|(_, v)| v);

    if let Some(inner) = inline_resource(&node) {
        check_attributes(&node, &[])?;
        expect_fhir_namespace(&inner)?;
        check_attributes(&inner, &[])?;
        let mut resource = Element::resource(inner.tag_name().name());
        decode_children(&mut resource, inner, source)?;
        return Ok(resource.into());
    }

    let is_extension = name == "extension" || name == "modifierExtension";
    if node.attribute("value").is_some()
        || (!is_extension && metadata_only_primitive(&node, variant))
    {
        return decode_primitive(node, source, variant);
    }

    let allowed: &[&str] = if is_extension { &["id", "url"] } else { &["id"] };
    check_attributes(&node, allowed)?;

    let mut element = match variant {
        _ if is_extension => Element::typed("Extension"),
        Some(v) if !types::is_primitive_type_name(v) => Element::typed(v),
        _ => Element::new(),
    };
    if let Some(id) = node.attribute("id") {
        element.set_id(id);
    }
    if let Some(url) = node.attribute("url") {
        let mut field = Field::new("url");
        field.push(Primitive::string(url).into());
        element.push_field(field)?;
    }
    decode_children(&mut element, node, source)?;
    Ok(element.into())
}

/// A primitive with no `value` attribute still decodes as a primitive when
/// its choice suffix names a primitive type, or when it has children and all
/// of them are `extension` elements: FHIR allows a primitive that carries
/// only metadata, and the JSON side produces one from a detached `_field`.
fn metadata_only_primitive(node: &roxmltree::Node, variant: Option<&str>) -> bool {
    if variant.is_some_and(|v| types::is_primitive_type_name(v)) {
        return true;
    }
    let mut children = node.children().filter(|c| c.is_element()).peekable();
    children.peek().is_some() && children.all(|c| c.tag_name().name() == "extension")
}

fn decode_primitive(node: roxmltree::Node, source: &str, variant: Option<&str>) -> Result<Node> {
    let name = node.tag_name().name();
    check_attributes(&node, &["value", "id"])?;
    let mut primitive = match node.attribute("value") {
        Some(value) => primitive_from_literal(name, value, variant)?,
        None => Primitive::empty(),
    };
    if let Some(v) = variant {
        if types::is_primitive_type_name(v) {
            primitive.set_type_name(types::variant_to_type_name(v));
        }
    }
    if let Some(id) = node.attribute("id") {
        primitive.set_id(id);
    }
    for child in node.children() {
        if child.is_text() {
            if child.text().is_some_and(|t| !t.trim().is_empty()) {
                return Err(FormatError::UnexpectedText(name.to_string()));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }
        expect_fhir_namespace(&child)?;
        if child.tag_name().name() != "extension" {
            return Err(FormatError::UnexpectedChild {
                element: name.to_string(),
                child: child.tag_name().name().to_string(),
            });
        }
        match decode_element_node(child, source)? {
            Node::Element(e) => primitive.push_extension((*e).clone()),
            Node::Primitive(_) => {
                return Err(FormatError::UnexpectedChild {
                    element: name.to_string(),
                    child: "extension".to_string(),
                })
            }
        }
    }
    Ok(primitive.into())
}

/// Types an attribute literal.
///
/// With a choice suffix the variant decides the value kind; otherwise the
/// literal shape does (exact-round-trip booleans, integers and decimals,
/// everything else a string). A schema-less reader cannot distinguish a
/// string field that happens to hold `"true"`.
fn primitive_from_literal(name: &str, value: &str, variant: Option<&str>) -> Result<Primitive> {
    let invalid = || FormatError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    };
    Ok(match variant {
        Some("Boolean") => Primitive::boolean(value.parse().map_err(|_| invalid())?),
        Some("Integer" | "Integer64" | "PositiveInt" | "UnsignedInt") => {
            Primitive::integer(value.parse().map_err(|_| invalid())?)
        }
        Some("Decimal") => Primitive::decimal(Decimal::from_str(value).map_err(|_| invalid())?),
        Some(_) => Primitive::string(value),
        None => untyped_literal(value),
    })
}

fn untyped_literal(value: &str) -> Primitive {
    match value {
        "true" => return Primitive::boolean(true),
        "false" => return Primitive::boolean(false),
        _ => {}
    }
    if let Ok(i) = value.parse::<i64>() {
        if i.to_string() == value {
            return Primitive::integer(i);
        }
    }
    if value.contains('.') && !value.contains(|c: char| c.is_ascii_alphabetic()) {
        if let Ok(d) = Decimal::from_str(value) {
            if d.to_string() == value {
                return Primitive::decimal(d);
            }
        }
    }
    Primitive::string(value)
}

fn inline_resource<'a, 'i>(node: &roxmltree::Node<'a, 'i>) -> Option<roxmltree::Node<'a, 'i>> {
    let mut elements = node.children().filter(|c| c.is_element());
    let first = elements.next()?;
    if elements.next().is_some() {
        return None;
    }
    // Field names are lowercase-initial; only resources are PascalCase.
    if first
        .tag_name()
        .name()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
    {
        Some(first)
    } else {
        None
    }
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_resource(writer: &mut XmlWriter, element: &Element, root: bool) -> Result<()> {
    let name = element.resource_type().ok_or(FormatError::NotAResource)?;
    let mut start = BytesStart::new(name);
    if root {
        start.push_attribute(("xmlns", FHIR_NS));
    }
    writer.write_event(Event::Start(start))?;
    write_fields(writer, element)?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_fields(writer: &mut XmlWriter, element: &Element) -> Result<()> {
    for field in element.fields() {
        for node in field.items() {
            match node {
                Node::Primitive(p) => write_primitive(writer, field.name(), p)?,
                Node::Element(e) if e.is_resource() => {
                    writer.write_event(Event::Start(BytesStart::new(field.name())))?;
                    write_resource(writer, e, false)?;
                    writer.write_event(Event::End(BytesEnd::new(field.name())))?;
                }
                Node::Element(e) => write_element(writer, field.name(), e)?,
            }
        }
    }
    Ok(())
}

fn write_primitive(writer: &mut XmlWriter, name: &str, primitive: &Primitive) -> Result<()> {
    if let Some(raw) = narrative_text(name, primitive) {
        writer.write_event(Event::Text(BytesText::from_escaped(raw)))?;
        return Ok(());
    }
    let rendered = primitive.value().map(|v| v.to_string_value());
    let mut start = BytesStart::new(name);
    if let Some(value) = &rendered {
        start.push_attribute(("value", value.as_ref()));
    }
    if let Some(id) = primitive.id() {
        start.push_attribute(("id", id));
    }
    if primitive.extensions().is_empty() {
        if rendered.is_some() || primitive.id().is_some() {
            writer.write_event(Event::Empty(start))?;
        }
    } else {
        writer.write_event(Event::Start(start))?;
        for extension in primitive.extensions() {
            write_element(writer, "extension", extension)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

/// Raw XHTML markup for narrative primitives, `None` for everything else.
fn narrative_text<'a>(name: &str, primitive: &'a Primitive) -> Option<&'a str> {
    let text = primitive.value()?.as_str()?;
    if primitive.type_name() == Some("xhtml") || (name == "div" && text.starts_with("<div")) {
        Some(text)
    } else {
        None
    }
}

fn write_element(writer: &mut XmlWriter, name: &str, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(name);
    if let Some(id) = element.id() {
        start.push_attribute(("id", id));
    }
    // Extension urls ride as attributes on the wire.
    let url_attribute = element.type_name() == Some("Extension");
    if url_attribute {
        if let Some(url) = extension_url(element) {
            start.push_attribute(("url", url));
        }
    }
    let remaining: Vec<&Field> = element
        .fields()
        .iter()
        .filter(|f| !(url_attribute && f.name() == "url"))
        .collect();
    if remaining.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for field in remaining {
        for node in field.items() {
            match node {
                Node::Primitive(p) => write_primitive(writer, field.name(), p)?,
                Node::Element(e) if e.is_resource() => {
                    writer.write_event(Event::Start(BytesStart::new(field.name())))?;
                    write_resource(writer, e, false)?;
                    writer.write_event(Event::End(BytesEnd::new(field.name())))?;
                }
                Node::Element(e) => write_element(writer, field.name(), e)?,
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn extension_url(element: &Element) -> Option<&str> {
    match element.items("url") {
        [Node::Primitive(p)] => p.value().and_then(|v| v.as_str()),
        _ => None,
    }
}
