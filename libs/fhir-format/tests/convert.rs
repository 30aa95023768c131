use aurum_element::equivalent;
use aurum_format::{json_to_xml, parse_json, parse_xml, xml_to_json};

const PATIENT_JSON: &str = r#"{
  "resourceType": "Patient",
  "id": "example",
  "text": {
    "status": "generated",
    "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\"><p>Peter</p></div>"
  },
  "active": true,
  "name": [{"family": "Chalmers", "given": ["Peter", "James"]}],
  "birthDate": "1974-12-25",
  "multipleBirthInteger": 3,
  "contained": [
    {"resourceType": "Organization", "id": "org1", "name": "ACME"}
  ]
}"#;

#[test]
fn json_to_xml_emits_the_wire_shapes() {
    let xml = json_to_xml(PATIENT_JSON).unwrap();
    assert!(xml.starts_with(r#"<Patient xmlns="http://hl7.org/fhir">"#));
    assert!(xml.contains(r#"<active value="true"/>"#));
    assert!(xml.contains(r#"<given value="Peter"/>"#));
    assert!(xml.contains(r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>Peter</p></div>"#));
    assert!(xml.contains("<contained>"));
    assert!(xml.contains("<Organization>"));
}

#[test]
fn there_and_back_again() {
    let xml = json_to_xml(PATIENT_JSON).unwrap();
    let json = xml_to_json(&xml).unwrap();

    let original = parse_json(PATIENT_JSON).unwrap();
    let roundtripped = parse_json(&json).unwrap();
    assert!(
        equivalent(&original, &roundtripped),
        "after xml round trip:\n{json}"
    );
}

#[test]
fn detached_metadata_survives_xml() {
    let json = r#"{
  "resourceType": "Patient",
  "_gender": {
    "extension": [
      {
        "url": "http://hl7.org/fhir/StructureDefinition/data-absent-reason",
        "valueCode": "asked-declined"
      }
    ]
  }
}"#;
    let xml = json_to_xml(json).unwrap();
    let back = xml_to_json(&xml).unwrap();

    let original = parse_json(json).unwrap();
    let roundtripped = parse_json(&back).unwrap();
    assert!(
        equivalent(&original, &roundtripped),
        "after xml round trip:\n{back}"
    );
    assert!(back.contains("_gender"), "metadata lost: {back}");
}

#[test]
fn xml_origin_survives_json() {
    let xml = r#"<Observation xmlns="http://hl7.org/fhir">
  <id value="bp"/>
  <status value="final"/>
  <valueQuantity>
    <value value="107.5"/>
    <unit value="mm[Hg]"/>
  </valueQuantity>
</Observation>"#;
    let through_json = json_to_xml(&xml_to_json(xml).unwrap()).unwrap();
    let first = parse_xml(xml).unwrap();
    let second = parse_xml(&through_json).unwrap();
    assert!(equivalent(&first, &second));
}
