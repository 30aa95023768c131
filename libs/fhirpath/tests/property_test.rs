//! Property-based tests using QuickCheck.

use quickcheck::{QuickCheck, TestResult};

use aurum_fhirpath::{parse, Collection, Context, FhirPath};

fn eval(engine: &FhirPath, expression: &str) -> Collection {
    let compiled = engine.compile(expression).unwrap();
    engine.evaluate_expr(&compiled, &Context::empty()).unwrap()
}

#[test]
fn prop_parse_never_panics() {
    fn property(input: String) -> TestResult {
        // Either outcome is fine; reaching it without a panic is the point.
        let _ = parse(&input);
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(500)
        .quickcheck(property as fn(String) -> TestResult);
}

#[test]
fn prop_integer_addition_is_commutative() {
    fn property(a: i32, b: i32) -> bool {
        let engine = FhirPath::new();
        let forward = eval(&engine, &format!("{a} + {b}"));
        let backward = eval(&engine, &format!("{b} + {a}"));
        forward.as_integer().unwrap() == backward.as_integer().unwrap()
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(i32, i32) -> bool);
}

#[test]
fn prop_every_integer_equals_itself() {
    fn property(n: i32) -> bool {
        let engine = FhirPath::new();
        eval(&engine, &format!("{n} = {n}")).as_boolean().unwrap() == Some(true)
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(i32) -> bool);
}

#[test]
fn prop_string_literals_round_trip_through_length() {
    fn property(s: String) -> TestResult {
        // Restrict to characters that need no escaping in a literal.
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
            return TestResult::discard();
        }
        let engine = FhirPath::new();
        let length = eval(&engine, &format!("'{s}'.length()"))
            .as_integer()
            .unwrap();
        TestResult::from_bool(length == Some(s.chars().count() as i64))
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(property as fn(String) -> TestResult);
}

#[test]
fn prop_union_is_idempotent() {
    fn property(items: Vec<i16>) -> TestResult {
        if items.is_empty() || items.len() > 8 {
            return TestResult::discard();
        }
        let list = items
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        let engine = FhirPath::new();
        let once = eval(&engine, &format!("({list}).count()"));
        let twice = eval(&engine, &format!("(({list}) | ({list})).count()"));
        TestResult::from_bool(once.as_integer().unwrap() == twice.as_integer().unwrap())
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(property as fn(Vec<i16>) -> TestResult);
}
