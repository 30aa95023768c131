use aurum_element::{equal, Node, PrimitiveValue};
use aurum_format::{parse_json, to_json_string_pretty, write_json, FormatError};

const PATIENT: &str = r#"{
  "resourceType": "Patient",
  "id": "example",
  "active": true,
  "name": [
    {
      "id": "n1",
      "use": "official",
      "family": "Chalmers",
      "given": ["Peter", "James"],
      "_given": [null, {"id": "g2"}]
    },
    {
      "use": "usual",
      "given": [null, "Jim"],
      "_given": [{"id": "g1"}, null]
    }
  ],
  "birthDate": "1974-12-25",
  "_birthDate": {
    "id": "b1",
    "extension": [
      {
        "url": "http://hl7.org/fhir/StructureDefinition/patient-birthTime",
        "valueDateTime": "1974-12-25T14:35:45-05:00"
      }
    ]
  },
  "_gender": {
    "extension": [
      {
        "url": "http://hl7.org/fhir/StructureDefinition/data-absent-reason",
        "valueCode": "asked-declined"
      }
    ]
  },
  "deceasedBoolean": false,
  "multipleBirthInteger": 3,
  "contained": [
    {"resourceType": "Organization", "id": "org1", "name": "ACME Healthcare"}
  ]
}"#;

#[test]
fn roundtrip_reproduces_the_document() {
    let resource = parse_json(PATIENT).unwrap();
    let encoded = write_json(&resource).unwrap();
    let original: serde_json::Value = serde_json::from_str(PATIENT).unwrap();
    assert_eq!(encoded, original);
}

#[test]
fn roundtrip_is_equal_under_the_element_model() {
    let first = parse_json(PATIENT).unwrap();
    let second = parse_json(&to_json_string_pretty(&first).unwrap()).unwrap();
    assert!(equal(&first, &second));
}

#[test]
fn resource_accessors() {
    let resource = parse_json(PATIENT).unwrap();
    assert_eq!(resource.resource_type(), Some("Patient"));
    assert_eq!(resource.resource_id(), Some("example"));
}

#[test]
fn primitive_metadata_survives() {
    let resource = parse_json(PATIENT).unwrap();
    let birth = match resource.items("birthDate") {
        [Node::Primitive(p)] => p.clone(),
        other => panic!("unexpected birthDate shape: {other:?}"),
    };
    assert_eq!(
        birth.value(),
        Some(&PrimitiveValue::String("1974-12-25".into()))
    );
    assert_eq!(birth.id(), Some("b1"));
    assert_eq!(birth.extensions().len(), 1);
    let ext = &birth.extensions()[0];
    assert!(matches!(
        ext.items("url"),
        [Node::Primitive(p)] if p.value().and_then(|v| v.as_str())
            == Some("http://hl7.org/fhir/StructureDefinition/patient-birthTime")
    ));
}

#[test]
fn null_padding_in_arrays() {
    let resource = parse_json(PATIENT).unwrap();
    let names = resource.items("name");
    assert_eq!(names.len(), 2);

    let second = names[1].as_element().unwrap();
    let given = second.items("given");
    assert_eq!(given.len(), 2);
    let first_given = given[0].as_primitive().unwrap();
    assert!(!first_given.has_value());
    assert_eq!(first_given.id(), Some("g1"));
    let second_given = given[1].as_primitive().unwrap();
    assert_eq!(
        second_given.value(),
        Some(&PrimitiveValue::String("Jim".into()))
    );
}

#[test]
fn detached_metadata_makes_a_valueless_primitive() {
    let resource = parse_json(PATIENT).unwrap();
    let gender = match resource.items("gender") {
        [Node::Primitive(p)] => p.clone(),
        other => panic!("unexpected gender shape: {other:?}"),
    };
    assert!(!gender.has_value());
    assert_eq!(gender.extensions().len(), 1);
}

#[test]
fn choice_fields_are_navigable_by_base_name() {
    let resource = parse_json(PATIENT).unwrap();
    let deceased = resource.field("deceased").unwrap();
    assert_eq!(deceased.name(), "deceasedBoolean");
    assert_eq!(deceased.choice(), Some("Boolean"));
    let multiple = resource.field("multipleBirth").unwrap();
    assert!(matches!(
        multiple.items(),
        [Node::Primitive(p)] if p.value() == Some(&PrimitiveValue::Integer(3))
    ));
}

#[test]
fn contained_resources_decode_as_resources() {
    let resource = parse_json(PATIENT).unwrap();
    let contained = resource.items("contained")[0].as_element().unwrap();
    assert_eq!(contained.resource_type(), Some("Organization"));
    assert_eq!(contained.resource_id(), Some("org1"));
}

#[test]
fn rejects_non_object_root() {
    assert!(matches!(
        parse_json("[1, 2]"),
        Err(FormatError::ExpectedObject)
    ));
}

#[test]
fn rejects_missing_resource_type() {
    assert!(matches!(
        parse_json(r#"{"active": true}"#),
        Err(FormatError::MissingResourceType)
    ));
}

#[test]
fn rejects_bare_null() {
    let doc = r#"{"resourceType": "Patient", "active": null}"#;
    assert!(matches!(parse_json(doc), Err(FormatError::UnexpectedNull(f)) if f == "active"));
}

#[test]
fn rejects_null_padding_without_metadata() {
    let doc = r#"{"resourceType": "Patient", "name": [{"given": [null, "Jim"]}]}"#;
    assert!(matches!(parse_json(doc), Err(FormatError::UnexpectedNull(_))));
}

#[test]
fn rejects_metadata_length_mismatch() {
    let doc = r#"{
      "resourceType": "Patient",
      "name": [{"given": ["Peter", "James"], "_given": [null]}]
    }"#;
    assert!(matches!(
        parse_json(doc),
        Err(FormatError::MetadataMismatch(f)) if f == "given"
    ));
}

#[test]
fn rejects_metadata_on_complex_field() {
    let doc = r#"{
      "resourceType": "Patient",
      "name": [{"family": "x"}],
      "_name": [{"id": "n"}]
    }"#;
    assert!(matches!(
        parse_json(doc),
        Err(FormatError::MetadataOnComplex(f)) if f == "name"
    ));
}

#[test]
fn rejects_non_object_metadata() {
    let doc = r#"{"resourceType": "Patient", "birthDate": "1974-12-25", "_birthDate": 5}"#;
    assert!(matches!(
        parse_json(doc),
        Err(FormatError::InvalidMetadata(f)) if f == "birthDate"
    ));
}

#[test]
fn rejects_nested_arrays() {
    let doc = r#"{"resourceType": "Patient", "name": [["x"]]}"#;
    assert!(matches!(parse_json(doc), Err(FormatError::NestedArray(_))));
}

#[test]
fn rejects_two_choice_variants() {
    let doc = r#"{
      "resourceType": "Patient",
      "deceasedBoolean": false,
      "deceasedDateTime": "2024-01-01"
    }"#;
    assert!(matches!(
        parse_json(doc),
        Err(FormatError::Element(aurum_element::Error::DuplicateChoiceVariant(f))) if f == "deceased"
    ));
}

#[test]
fn absent_fields_leave_no_trace() {
    let resource = parse_json(r#"{"resourceType": "Patient", "active": true}"#).unwrap();
    let encoded = write_json(&resource).unwrap();
    let obj = encoded.as_object().unwrap();
    assert_eq!(obj.len(), 2);
    assert!(obj.contains_key("resourceType"));
    assert!(obj.contains_key("active"));
}
