//! Evaluation context: environment variables and iteration state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::{Collection, Value};

/// Variables and iteration state for one evaluation.
///
/// Cloning is cheap (the variable map is shared), so iteration functions
/// build derived contexts freely via [`Context::with_iteration`].
#[derive(Debug, Clone)]
pub struct Context {
    variables: Arc<HashMap<Arc<str>, Value>>,
    resource: Option<Value>,
    this: Option<Value>,
    index: Option<usize>,
    total: Option<Collection>,
}

/// Terminology urls every evaluation environment provides.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("sct", "http://snomed.info/sct"),
    ("loinc", "http://loinc.org"),
    ("ucum", "http://unitsofmeasure.org"),
    (
        "vs-administrative-gender",
        "http://hl7.org/fhir/ValueSet/administrative-gender",
    ),
    (
        "ext-patient-birthTime",
        "http://hl7.org/fhir/StructureDefinition/patient-birthTime",
    ),
];

impl Context {
    /// A context rooted in a resource; seeds `%resource`, `%context`,
    /// `%rootResource` and the well-known terminology urls, each under both
    /// its bare and `%`-prefixed name.
    pub fn new(resource: Value) -> Self {
        let mut context = Context::empty();
        let variables = Arc::make_mut(&mut context.variables);
        for name in ["resource", "context", "rootResource"] {
            insert_both(variables, name, resource.clone());
        }
        context.resource = Some(resource);
        context
    }

    /// A context with no root resource, for expressions over literals.
    pub fn empty() -> Self {
        let mut variables = HashMap::new();
        for (name, url) in WELL_KNOWN {
            insert_both(&mut variables, name, Value::string(*url));
        }
        Context {
            variables: Arc::new(variables),
            resource: None,
            this: None,
            index: None,
            total: None,
        }
    }

    /// Defines a user variable under both its bare and `%`-prefixed name.
    pub fn set_variable(&mut self, name: &str, value: Value) {
        let variables = Arc::make_mut(&mut self.variables);
        insert_both(variables, name.trim_start_matches('%'), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn resource(&self) -> Option<&Value> {
        self.resource.as_ref()
    }

    pub fn this(&self) -> Option<&Value> {
        self.this.as_ref()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn total(&self) -> Option<&Collection> {
        self.total.as_ref()
    }

    pub(crate) fn with_this(&self, this: Value) -> Context {
        let mut context = self.clone();
        context.this = Some(this);
        context
    }

    pub(crate) fn with_iteration(&self, this: Value, index: usize) -> Context {
        let mut context = self.clone();
        context.this = Some(this);
        context.index = Some(index);
        context
    }

    pub(crate) fn with_total(&self, total: Collection) -> Context {
        let mut context = self.clone();
        context.total = Some(total);
        context
    }
}

fn insert_both(variables: &mut HashMap<Arc<str>, Value>, name: &str, value: Value) {
    variables.insert(Arc::from(name), value.clone());
    variables.insert(Arc::from(format!("%{name}").as_str()), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueData;

    #[test]
    fn test_well_known_variables() {
        let context = Context::empty();
        for name in ["sct", "%sct", "loinc", "ucum"] {
            assert!(context.variable(name).is_some(), "missing {name}");
        }
        assert!(context.variable("undefined").is_none());
    }

    #[test]
    fn test_resource_seeding() {
        let context = Context::new(Value::integer(1));
        assert!(matches!(
            context.variable("resource").unwrap().data(),
            ValueData::Integer(1)
        ));
        assert!(matches!(
            context.variable("%rootResource").unwrap().data(),
            ValueData::Integer(1)
        ));
    }

    #[test]
    fn test_set_variable_registers_both_forms() {
        let mut context = Context::empty();
        context.set_variable("pi", Value::string("3"));
        assert!(context.variable("pi").is_some());
        assert!(context.variable("%pi").is_some());
    }
}
