use aurum_element::{equal, Node, PrimitiveValue};
use aurum_format::{parse_xml, write_xml, FormatError};

const PATIENT: &str = r#"<Patient xmlns="http://hl7.org/fhir">
  <id value="example"/>
  <text>
    <status value="generated"/>
    <div xmlns="http://www.w3.org/1999/xhtml"><p>Peter James Chalmers</p></div>
  </text>
  <contained>
    <Organization>
      <id value="org1"/>
      <name value="ACME Healthcare"/>
    </Organization>
  </contained>
  <active value="true"/>
  <name id="n1">
    <use value="official"/>
    <family value="Chalmers"/>
    <given value="Peter"/>
    <given value="James"/>
  </name>
  <birthDate id="b1" value="1974-12-25">
    <extension url="http://hl7.org/fhir/StructureDefinition/patient-birthTime">
      <valueDateTime value="1974-12-25T14:35:45-05:00"/>
    </extension>
  </birthDate>
  <multipleBirthInteger value="3"/>
</Patient>"#;

#[test]
fn parses_a_populated_resource() {
    let resource = parse_xml(PATIENT).unwrap();
    assert_eq!(resource.resource_type(), Some("Patient"));
    assert_eq!(resource.resource_id(), Some("example"));

    let active = resource.items("active")[0].as_primitive().unwrap();
    assert_eq!(active.value(), Some(&PrimitiveValue::Boolean(true)));

    let name = resource.items("name")[0].as_element().unwrap();
    assert_eq!(name.id(), Some("n1"));
    assert_eq!(name.items("given").len(), 2);
    // Repeated siblings become arrays.
    assert!(name.field("given").unwrap().is_array());
}

#[test]
fn primitive_extensions_and_ids_decode() {
    let resource = parse_xml(PATIENT).unwrap();
    let birth = match resource.items("birthDate") {
        [Node::Primitive(p)] => p.clone(),
        other => panic!("unexpected birthDate shape: {other:?}"),
    };
    assert_eq!(birth.id(), Some("b1"));
    assert_eq!(birth.extensions().len(), 1);
    let ext = &birth.extensions()[0];
    assert!(matches!(
        ext.items("url"),
        [Node::Primitive(p)] if p.value().and_then(|v| v.as_str())
            == Some("http://hl7.org/fhir/StructureDefinition/patient-birthTime")
    ));
    assert!(ext.field("value").is_some());
}

#[test]
fn value_less_primitives_with_extensions_decode_as_primitives() {
    let xml = r#"<Patient xmlns="http://hl7.org/fhir">
  <gender>
    <extension url="http://hl7.org/fhir/StructureDefinition/data-absent-reason">
      <valueCode value="asked-declined"/>
    </extension>
  </gender>
</Patient>"#;
    let resource = parse_xml(xml).unwrap();
    let gender = match resource.items("gender") {
        [Node::Primitive(p)] => p.clone(),
        other => panic!("unexpected gender shape: {other:?}"),
    };
    assert!(gender.value().is_none());
    assert_eq!(gender.extensions().len(), 1);

    // A choice suffix naming a primitive type forces the primitive reading
    // even without a value attribute.
    let xml = r#"<Observation xmlns="http://hl7.org/fhir">
  <status value="final"/>
  <valueString id="v1"/>
</Observation>"#;
    let resource = parse_xml(xml).unwrap();
    let value = match resource.items("value") {
        [Node::Primitive(p)] => p.clone(),
        other => panic!("unexpected value shape: {other:?}"),
    };
    assert!(value.value().is_none());
    assert_eq!(value.id(), Some("v1"));
}

#[test]
fn narrative_is_captured_verbatim() {
    let resource = parse_xml(PATIENT).unwrap();
    let text = resource.items("text")[0].as_element().unwrap();
    let div = text.items("div")[0].as_primitive().unwrap();
    let raw = div.value().and_then(|v| v.as_str()).unwrap();
    assert!(raw.starts_with("<div"));
    assert!(raw.contains("<p>Peter James Chalmers</p>"));
}

#[test]
fn contained_resources_decode_as_resources() {
    let resource = parse_xml(PATIENT).unwrap();
    let contained = resource.items("contained")[0].as_element().unwrap();
    assert_eq!(contained.resource_type(), Some("Organization"));
    assert_eq!(contained.resource_id(), Some("org1"));
}

#[test]
fn choice_suffix_types_the_value() {
    let resource = parse_xml(PATIENT).unwrap();
    let multiple = resource.field("multipleBirth").unwrap();
    assert_eq!(multiple.choice(), Some("Integer"));
    assert!(matches!(
        multiple.items(),
        [Node::Primitive(p)] if p.value() == Some(&PrimitiveValue::Integer(3))
    ));
}

#[test]
fn roundtrip_is_equal_under_the_element_model() {
    let first = parse_xml(PATIENT).unwrap();
    let written = write_xml(&first).unwrap();
    let second = parse_xml(&written).unwrap();
    assert!(equal(&first, &second), "written document:\n{written}");
}

#[test]
fn writes_the_fhir_namespace_on_the_root() {
    let resource = parse_xml(PATIENT).unwrap();
    let written = write_xml(&resource).unwrap();
    assert!(written.starts_with(r#"<Patient xmlns="http://hl7.org/fhir">"#));
}

#[test]
fn rejects_wrong_namespace() {
    let doc = r#"<Patient xmlns="urn:example"><id value="x"/></Patient>"#;
    assert!(matches!(
        parse_xml(doc),
        Err(FormatError::UnexpectedNamespace(_))
    ));
}

#[test]
fn rejects_unknown_attributes() {
    let doc = r#"<Patient xmlns="http://hl7.org/fhir"><active value="true" flavor="odd"/></Patient>"#;
    assert!(matches!(
        parse_xml(doc),
        Err(FormatError::UnexpectedAttribute { element, attribute })
            if element == "active" && attribute == "flavor"
    ));
}

#[test]
fn rejects_text_outside_narrative() {
    let doc = r#"<Patient xmlns="http://hl7.org/fhir">loose text</Patient>"#;
    assert!(matches!(parse_xml(doc), Err(FormatError::UnexpectedText(_))));
}

#[test]
fn rejects_two_choice_variants() {
    let doc = r#"<Patient xmlns="http://hl7.org/fhir">
      <deceasedBoolean value="false"/>
      <deceasedDateTime value="2024-01-01"/>
    </Patient>"#;
    assert!(matches!(
        parse_xml(doc),
        Err(FormatError::Element(
            aurum_element::Error::DuplicateChoiceVariant(_)
        ))
    ));
}
