//! Navigation over a decoded resource: member paths, choice fields,
//! primitive metadata, indexers, and the tree functions.

use aurum_fhirpath::{Collection, FhirPath};

const PATIENT: &str = r#"{
  "resourceType": "Patient",
  "id": "example",
  "active": true,
  "name": [
    {
      "use": "official",
      "family": "Chalmers",
      "given": ["Peter", "James"]
    },
    {
      "use": "nickname",
      "given": ["Jim"]
    }
  ],
  "birthDate": "1974-12-25",
  "_birthDate": {
    "id": "bd",
    "extension": [
      {
        "url": "http://hl7.org/fhir/StructureDefinition/patient-birthTime",
        "valueDateTime": "1974-12-25T14:35:45-05:00"
      }
    ]
  },
  "deceasedBoolean": false,
  "contained": [
    {
      "resourceType": "Organization",
      "id": "org1",
      "name": "Acme"
    }
  ]
}"#;

const OBSERVATION: &str = r#"{
  "resourceType": "Observation",
  "status": "final",
  "valueQuantity": {
    "value": 185,
    "unit": "lbs",
    "system": "http://unitsofmeasure.org",
    "code": "[lb_av]"
  }
}"#;

fn eval(expression: &str) -> Collection {
    FhirPath::new()
        .evaluate_json(expression, PATIENT)
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

fn eval_observation(expression: &str) -> Collection {
    FhirPath::new()
        .evaluate_json(expression, OBSERVATION)
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

fn strings(collection: &Collection) -> Vec<String> {
    collection.iter().map(|v| v.render()).collect()
}

#[test]
fn test_resource_type_head() {
    assert_eq!(eval("Patient.active").as_boolean().unwrap(), Some(true));
    // A mismatched head name selects nothing.
    assert!(eval("Observation.value").is_empty());
}

#[test]
fn test_member_paths_flatten() {
    assert_eq!(
        strings(&eval("name.given")),
        vec!["Peter", "James", "Jim"]
    );
    assert_eq!(strings(&eval("name.family")), vec!["Chalmers"]);
}

#[test]
fn test_indexer() {
    assert_eq!(strings(&eval("name[0].given[1]")), vec!["James"]);
    assert!(eval("name[5]").is_empty());
    assert_eq!(strings(&eval("name.skip(1).given")), vec!["Jim"]);
}

#[test]
fn test_choice_fields_navigate_by_base_and_wire_name() {
    assert_eq!(eval("Patient.deceased").as_boolean().unwrap(), Some(false));
    assert_eq!(
        eval("Patient.deceasedBoolean").as_boolean().unwrap(),
        Some(false)
    );
    assert_eq!(
        eval_observation("Observation.value.unit").as_string().unwrap().as_deref(),
        Some("lbs")
    );
}

#[test]
fn test_missing_members_are_empty_not_errors() {
    assert!(eval("Patient.gender").is_empty());
    assert!(eval("name.period.start").is_empty());
}

#[test]
fn test_primitive_metadata_is_navigable() {
    assert_eq!(strings(&eval("birthDate.id")), vec!["bd"]);
    assert_eq!(
        strings(&eval("birthDate.extension.url")),
        vec!["http://hl7.org/fhir/StructureDefinition/patient-birthTime"]
    );
    assert_eq!(
        strings(&eval(
            "birthDate.extension('http://hl7.org/fhir/StructureDefinition/patient-birthTime').value"
        )),
        vec!["1974-12-25T14:35:45-05:00"]
    );
}

#[test]
fn test_contained_resources() {
    assert_eq!(strings(&eval("contained.name")), vec!["Acme"]);
    assert_eq!(strings(&eval("contained.id")), vec!["org1"]);
}

#[test]
fn test_children_and_descendants() {
    // Root children: id, active, two names, birthDate, deceased, contained.
    assert_eq!(eval("children().count()").as_integer().unwrap(), Some(7));
    let descendant_count = eval("descendants().count()").as_integer().unwrap().unwrap();
    assert!(descendant_count > 7, "got {descendant_count}");
    // given values are two levels down
    assert!(eval("descendants().where($this = 'Jim').exists()")
        .as_boolean()
        .unwrap()
        .unwrap());
}

#[test]
fn test_where_select_and_iteration_variables() {
    assert_eq!(
        strings(&eval("name.where(use = 'official').family")),
        vec!["Chalmers"]
    );
    assert_eq!(
        strings(&eval("name.given.select($this.upper())")),
        vec!["PETER", "JAMES", "JIM"]
    );
    assert_eq!(
        eval("name.given.where($index > 0).count()").as_integer().unwrap(),
        Some(2)
    );
}

#[test]
fn test_repeat_reaches_nested_values() {
    assert!(eval("repeat(children()).where($this = 'Acme').exists()")
        .as_boolean()
        .unwrap()
        .unwrap());
}

#[test]
fn test_of_type_and_type_tests() {
    assert_eq!(
        eval("Patient.active.ofType(boolean).count()").as_integer().unwrap(),
        Some(1)
    );
    assert_eq!(
        eval("Patient.active is boolean").as_boolean().unwrap(),
        Some(true)
    );
    assert_eq!(
        eval_observation("(Observation.value as Quantity).unit")
            .as_string()
            .unwrap()
            .as_deref(),
        Some("lbs")
    );
    // The wire labels types in three places only: the resource head, choice
    // suffixes, and primitive kinds. Untyped complex children are "Element".
    assert_eq!(
        eval("Patient.type().name").as_string().unwrap().as_deref(),
        Some("Patient")
    );
    assert_eq!(
        eval_observation("Observation.value.type().name")
            .as_string()
            .unwrap()
            .as_deref(),
        Some("Quantity")
    );
    assert_eq!(
        eval("name[0].type().name").as_string().unwrap().as_deref(),
        Some("Element")
    );
}
