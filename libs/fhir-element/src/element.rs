//! The element tree.
//!
//! FHIR's logical model distinguishes complex elements (named children) from
//! primitives (a value), but allows an internal id and extensions on both.
//! [`Element`] and [`Primitive`] mirror that split; [`Node`] is one child
//! position; [`Field`] is a named, possibly repeating group of children in
//! wire order.

use std::sync::Arc;

use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::types::{self, TypeInfo};

/// A complex element: a resource, datatype, or backbone element.
///
/// The type name is only populated when the wire states it (`resourceType`,
/// XML root name, or a choice-field suffix). Field order is wire order.
#[derive(Debug, Clone, Default)]
pub struct Element {
    type_name: Option<Arc<str>>,
    id: Option<String>,
    is_resource: bool,
    fields: Vec<Field>,
}

impl Element {
    pub fn new() -> Self {
        Element::default()
    }

    /// An element with a known FHIR type name, e.g. a choice variant.
    pub fn typed(type_name: impl Into<Arc<str>>) -> Self {
        Element {
            type_name: Some(type_name.into()),
            ..Element::default()
        }
    }

    /// A resource root or inline resource.
    pub fn resource(type_name: impl Into<Arc<str>>) -> Self {
        Element {
            type_name: Some(type_name.into()),
            is_resource: true,
            ..Element::default()
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn set_type_name(&mut self, type_name: impl Into<Arc<str>>) {
        self.type_name = Some(type_name.into());
    }

    pub fn is_resource(&self) -> bool {
        self.is_resource
    }

    /// The internal element id (`"id"` inside a datatype in JSON, the `id`
    /// attribute in XML). Resources keep their logical id as a field.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Appends a field, enforcing the choice invariant: a wire name may
    /// appear once, and a choice base may have only one populated variant.
    pub fn push_field(&mut self, field: Field) -> Result<()> {
        for existing in &self.fields {
            if existing.name() == field.name() {
                return Err(Error::DuplicateField(field.name().to_string()));
            }
            if field.choice().is_some()
                && existing.choice().is_some()
                && existing.base_name() == field.base_name()
            {
                return Err(Error::DuplicateChoiceVariant(field.base_name().to_string()));
            }
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks a field up by wire name (`valueQuantity`, `birthDate`) or, for
    /// choice-shaped names, by base name (`value`, `birth`).
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|f| f.choice().is_some() && f.base_name() == name)
            })
    }

    /// The items of a field, or an empty slice when the field is absent.
    pub fn items(&self, name: &str) -> &[Node] {
        self.field(name).map(|f| f.items()).unwrap_or(&[])
    }

    /// All child nodes in field order.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.fields.iter().flat_map(|f| f.items().iter())
    }

    /// `Some(type)` for resource nodes, `None` for plain elements.
    pub fn resource_type(&self) -> Option<&str> {
        if self.is_resource {
            self.type_name.as_deref()
        } else {
            None
        }
    }

    /// The logical id of a resource node (its `id` field).
    pub fn resource_id(&self) -> Option<&str> {
        if !self.is_resource {
            return None;
        }
        match self.items("id") {
            [Node::Primitive(p)] => p.value().and_then(|v| v.as_str()),
            _ => None,
        }
    }

    pub fn type_info(&self) -> TypeInfo {
        match &self.type_name {
            Some(name) => TypeInfo::fhir(name.clone()),
            None => TypeInfo::fhir("Element"),
        }
    }

    /// True when nothing is populated, not even an id.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.fields.is_empty()
    }
}

/// One named group of child nodes.
///
/// `name` is the full wire name. When the name carries a choice-type suffix
/// the variant is recorded so navigation can match the base name and the
/// parent can reject sibling variants.
#[derive(Debug, Clone)]
pub struct Field {
    name: Arc<str>,
    choice: Option<Arc<str>>,
    array: bool,
    items: SmallVec<[Node; 1]>,
}

impl Field {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let choice = types::split_choice_name(&name).map(|(_, variant)| Arc::from(variant));
        Field {
            name,
            choice,
            array: false,
            items: SmallVec::new(),
        }
    }

    /// The full wire name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The choice variant tag (`Quantity` in `valueQuantity`), if any.
    pub fn choice(&self) -> Option<&str> {
        self.choice.as_deref()
    }

    /// The wire name minus the variant tag; the full name for plain fields.
    pub fn base_name(&self) -> &str {
        match &self.choice {
            Some(variant) => &self.name[..self.name.len() - variant.len()],
            None => &self.name,
        }
    }

    /// Whether the field was a JSON array on the wire.
    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn set_array(&mut self, array: bool) {
        self.array = array;
    }

    pub fn push(&mut self, node: Node) {
        self.items.push(node);
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn single(&self) -> Option<&Node> {
        match self.items.as_slice() {
            [node] => Some(node),
            _ => None,
        }
    }
}

/// One child position in the tree.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Arc<Element>),
    Primitive(Arc<Primitive>),
}

impl Node {
    pub fn type_info(&self) -> TypeInfo {
        match self {
            Node::Element(e) => e.type_info(),
            Node::Primitive(p) => p.type_info(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Primitive(_) => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Node::Element(_) => None,
            Node::Primitive(p) => Some(p),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(Arc::new(e))
    }
}

impl From<Primitive> for Node {
    fn from(p: Primitive) -> Self {
        Node::Primitive(Arc::new(p))
    }
}

/// A primitive element: an optional value plus its own metadata.
///
/// A primitive may be value-less: JSON allows `"_birthDate": {...}` with no
/// `"birthDate"`, carrying only an id or extensions.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    value: Option<PrimitiveValue>,
    type_name: Option<Arc<str>>,
    id: Option<String>,
    extensions: Vec<Arc<Element>>,
}

impl Primitive {
    pub fn empty() -> Self {
        Primitive::default()
    }

    pub fn boolean(value: bool) -> Self {
        Primitive {
            value: Some(PrimitiveValue::Boolean(value)),
            ..Primitive::default()
        }
    }

    pub fn integer(value: i64) -> Self {
        Primitive {
            value: Some(PrimitiveValue::Integer(value)),
            ..Primitive::default()
        }
    }

    pub fn decimal(value: Decimal) -> Self {
        Primitive {
            value: Some(PrimitiveValue::Decimal(value)),
            ..Primitive::default()
        }
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Primitive {
            value: Some(PrimitiveValue::String(value.into())),
            ..Primitive::default()
        }
    }

    pub fn value(&self) -> Option<&PrimitiveValue> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The precise FHIR type name when a choice suffix provided one
    /// (`valueCode` → `code`).
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn set_type_name(&mut self, type_name: impl Into<Arc<str>>) {
        self.type_name = Some(type_name.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn extensions(&self) -> &[Arc<Element>] {
        &self.extensions
    }

    pub fn push_extension(&mut self, extension: Element) {
        self.extensions.push(Arc::new(extension));
    }

    pub fn has_metadata(&self) -> bool {
        self.id.is_some() || !self.extensions.is_empty()
    }

    pub fn type_info(&self) -> TypeInfo {
        if let Some(name) = &self.type_name {
            return TypeInfo::fhir(name.clone());
        }
        match &self.value {
            Some(v) => TypeInfo::fhir(v.fhir_name()),
            None => TypeInfo::fhir("Element"),
        }
    }
}

/// The typed payload of a primitive element.
///
/// Dates, times, uris and the other string-kinded FHIR primitives arrive as
/// strings on a schema-less wire; the FHIRPath layer interprets them.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(Arc<str>),
}

impl PrimitiveValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The System type name for this value kind.
    pub fn system_name(&self) -> &'static str {
        match self {
            PrimitiveValue::Boolean(_) => "Boolean",
            PrimitiveValue::Integer(_) => "Integer",
            PrimitiveValue::Decimal(_) => "Decimal",
            PrimitiveValue::String(_) => "String",
        }
    }

    /// The FHIR type name for this value kind.
    pub fn fhir_name(&self) -> &'static str {
        match self {
            PrimitiveValue::Boolean(_) => "boolean",
            PrimitiveValue::Integer(_) => "integer",
            PrimitiveValue::Decimal(_) => "decimal",
            PrimitiveValue::String(_) => "string",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_field(name: &str, value: &str) -> Field {
        let mut field = Field::new(name);
        field.push(Primitive::string(value).into());
        field
    }

    #[test]
    fn test_resource_accessors() {
        let mut patient = Element::resource("Patient");
        patient.push_field(string_field("id", "example")).unwrap();

        assert_eq!(patient.resource_type(), Some("Patient"));
        assert_eq!(patient.resource_id(), Some("example"));
        assert_eq!(patient.type_info().to_string(), "FHIR.Patient");
    }

    #[test]
    fn test_plain_element_is_not_a_resource() {
        let mut name = Element::new();
        name.push_field(string_field("family", "Chalmers")).unwrap();

        assert_eq!(name.resource_type(), None);
        assert_eq!(name.resource_id(), None);
        assert_eq!(name.type_info().to_string(), "FHIR.Element");
    }

    #[test]
    fn test_choice_field_navigation() {
        let mut obs = Element::resource("Observation");
        let mut value = Field::new("valueQuantity");
        let mut quantity = Element::typed("Quantity");
        quantity.push_field(string_field("unit", "mg")).unwrap();
        value.push(quantity.into());
        obs.push_field(value).unwrap();

        let by_base = obs.field("value").unwrap();
        let by_wire = obs.field("valueQuantity").unwrap();
        assert_eq!(by_base.name(), by_wire.name());
        assert_eq!(by_base.choice(), Some("Quantity"));
        assert_eq!(by_base.base_name(), "value");
    }

    #[test]
    fn test_duplicate_choice_variant_rejected() {
        let mut obs = Element::new();
        obs.push_field(string_field("valueString", "high")).unwrap();

        let err = obs
            .push_field(string_field("valueBoolean", "true"))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateChoiceVariant("value".to_string()));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut elem = Element::new();
        elem.push_field(string_field("family", "a")).unwrap();
        let err = elem.push_field(string_field("family", "b")).unwrap_err();
        assert_eq!(err, Error::DuplicateField("family".to_string()));
    }

    #[test]
    fn test_primitive_metadata() {
        let mut birth = Primitive::string("1974-12-25");
        birth.set_id("b1");
        let mut ext = Element::typed("Extension");
        ext.push_field(string_field("url", "http://example.org/birthTime"))
            .unwrap();
        birth.push_extension(ext);

        assert!(birth.has_value());
        assert!(birth.has_metadata());
        assert_eq!(birth.id(), Some("b1"));
        assert_eq!(birth.extensions().len(), 1);
    }

    #[test]
    fn test_valueless_primitive() {
        let mut p = Primitive::empty();
        p.set_id("only-meta");
        assert!(!p.has_value());
        assert!(p.has_metadata());
        assert_eq!(p.type_info().to_string(), "FHIR.Element");
    }
}
