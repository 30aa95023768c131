//! FHIR type names and choice-field tables.
//!
//! The wire formats label types in exactly three places: the `resourceType`
//! property (JSON) or root element name (XML), the capitalized suffix of a
//! choice field (`valueQuantity`), and the implicit kind of a primitive
//! value. Everything here derives from those three signals.

use std::fmt;
use std::sync::Arc;

/// Type namespace as used by FHIRPath reflection (`type().namespace`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    System,
    Fhir,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::System => write!(f, "System"),
            Namespace::Fhir => write!(f, "FHIR"),
        }
    }
}

/// A namespace-qualified type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub namespace: Namespace,
    pub name: Arc<str>,
}

impl TypeInfo {
    pub fn system(name: impl Into<Arc<str>>) -> Self {
        TypeInfo {
            namespace: Namespace::System,
            name: name.into(),
        }
    }

    pub fn fhir(name: impl Into<Arc<str>>) -> Self {
        TypeInfo {
            namespace: Namespace::Fhir,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Type names that may appear as the capitalized suffix of a choice field.
///
/// This is the R5 "open type" list plus the primitive wire tags, which is a
/// closed set: resources never appear as choice suffixes.
pub static CHOICE_TYPE_NAMES: phf::Set<&'static str> = phf::phf_set! {
    // Primitive wire tags
    "Base64Binary",
    "Boolean",
    "Canonical",
    "Code",
    "Date",
    "DateTime",
    "Decimal",
    "Id",
    "Instant",
    "Integer",
    "Integer64",
    "Markdown",
    "Oid",
    "PositiveInt",
    "String",
    "Time",
    "UnsignedInt",
    "Uri",
    "Url",
    "Uuid",
    // Complex datatypes
    "Address",
    "Age",
    "Annotation",
    "Attachment",
    "Availability",
    "CodeableConcept",
    "CodeableReference",
    "Coding",
    "ContactDetail",
    "ContactPoint",
    "Count",
    "DataRequirement",
    "Distance",
    "Dosage",
    "Duration",
    "Expression",
    "ExtendedContactDetail",
    "HumanName",
    "Identifier",
    "Meta",
    "Money",
    "ParameterDefinition",
    "Period",
    "Quantity",
    "Range",
    "Ratio",
    "RatioRange",
    "Reference",
    "RelatedArtifact",
    "SampledData",
    "Signature",
    "Timing",
    "TriggerDefinition",
    "UsageContext",
};

/// Split a wire field name into a choice base and variant type name.
///
/// Scans left to right for an uppercase boundary whose suffix is a known
/// choice type: `valueQuantity` → `("value", "Quantity")`,
/// `deceasedDateTime` → `("deceased", "DateTime")`. Returns `None` for
/// names with no type suffix.
///
/// Without a schema this over-matches fields that merely end in a type name
/// (`birthDate` → `("birth", "Date")`). Fields keep their full wire name, so
/// round trips are unaffected; the cost is that base-name navigation accepts
/// `birth` where only `birthDate` exists, and the benefit is that the suffix
/// types otherwise-anonymous values (`birthDate` values really are dates).
pub fn split_choice_name(wire_name: &str) -> Option<(&str, &str)> {
    for (idx, ch) in wire_name.char_indices() {
        if idx == 0 || !ch.is_ascii_uppercase() {
            continue;
        }
        let suffix = &wire_name[idx..];
        if CHOICE_TYPE_NAMES.contains(suffix) {
            return Some((&wire_name[..idx], suffix));
        }
    }
    None
}

/// FHIR primitive type names whose wire representation is a JSON string.
///
/// Used when deciding whether a choice variant describes a primitive.
pub fn is_primitive_type_name(name: &str) -> bool {
    matches!(
        name,
        "Base64Binary"
            | "Boolean"
            | "Canonical"
            | "Code"
            | "Date"
            | "DateTime"
            | "Decimal"
            | "Id"
            | "Instant"
            | "Integer"
            | "Integer64"
            | "Markdown"
            | "Oid"
            | "PositiveInt"
            | "String"
            | "Time"
            | "UnsignedInt"
            | "Uri"
            | "Url"
            | "Uuid"
    )
}

/// Lowercase a choice variant tag into the FHIR type name
/// (`DateTime` → `dateTime`, `Quantity` stays `Quantity`).
pub fn variant_to_type_name(variant: &str) -> String {
    if is_primitive_type_name(variant) {
        let mut chars = variant.chars();
        match chars.next() {
            Some(first) => format!("{}{}", first.to_ascii_lowercase(), chars.as_str()),
            None => String::new(),
        }
    } else {
        variant.to_string()
    }
}
