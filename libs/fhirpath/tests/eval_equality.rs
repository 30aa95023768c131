//! Equality, equivalence, ordering, membership, and boolean operators,
//! evaluated end to end.

use aurum_fhirpath::{Collection, Context, FhirPath};

fn eval(expression: &str) -> Collection {
    let engine = FhirPath::new();
    let compiled = engine.compile(expression).unwrap();
    engine
        .evaluate_expr(&compiled, &Context::empty())
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

fn truth(expression: &str) -> Option<bool> {
    eval(expression).as_boolean().unwrap()
}

#[test]
fn test_equality_basics() {
    assert_eq!(truth("1 = 1"), Some(true));
    assert_eq!(truth("1 = 2"), Some(false));
    assert_eq!(truth("1 != 2"), Some(true));
    assert_eq!(truth("1 = 1.0"), Some(true));
    assert_eq!(truth("'abc' = 'abc'"), Some(true));
    assert_eq!(truth("'abc' = 'ABC'"), Some(false));
    assert_eq!(truth("true = true"), Some(true));
}

#[test]
fn test_equality_over_collections_is_ordered() {
    assert_eq!(truth("(1 | 2) = (1 | 2)"), Some(true));
    assert_eq!(truth("(1 | 2) = (2 | 1)"), Some(false));
    assert_eq!(truth("(1 | 2) = (1 | 2 | 3)"), Some(false));
}

#[test]
fn test_empty_propagates_through_equality() {
    assert!(eval("{} = {}").is_empty());
    assert!(eval("1 = {}").is_empty());
    assert_eq!(truth("{} ~ {}"), Some(true));
    assert_eq!(truth("1 !~ {}"), Some(true));
}

#[test]
fn test_equivalence_folds_case_and_whitespace() {
    assert_eq!(truth("'Peter  James' ~ 'peter james'"), Some(true));
    assert_eq!(truth("(1 | 2) ~ (2 | 1)"), Some(true));
    assert_eq!(truth("1.154 ~ 1.2"), Some(true));
    assert_eq!(truth("1.154 = 1.2"), Some(false));
}

#[test]
fn test_temporal_equality_and_precision() {
    assert_eq!(truth("@2012-04-15 = @2012-04-15"), Some(true));
    // Same year, different precision: indeterminate under =, false under ~.
    assert!(eval("@2012 = @2012-04").is_empty());
    assert_eq!(truth("@2012 ~ @2012-04"), Some(false));
    // Seconds and milliseconds are one precision.
    assert_eq!(truth("@T10:30:05 = @T10:30:05.000"), Some(true));
    // Timezone-normalized instants compare equal.
    assert_eq!(
        truth("@2012-04-15T10:00:00Z = @2012-04-15T12:00:00+02:00"),
        Some(true)
    );
}

#[test]
fn test_ordering() {
    assert_eq!(truth("4 > 3"), Some(true));
    assert_eq!(truth("3.5 <= 3.5"), Some(true));
    assert_eq!(truth("'abc' < 'abd'"), Some(true));
    assert_eq!(truth("@2012-01-01 < @2013-01-01"), Some(true));
    assert_eq!(truth("@T10:00 < @T11:00"), Some(true));
    // Indeterminate precision comparisons are empty.
    assert!(eval("@2012 < @2012-06").is_empty());
    assert!(eval("{} < 1").is_empty());
}

#[test]
fn test_quantities() {
    assert_eq!(truth("4 'kg' = 4 'kg'"), Some(true));
    assert_eq!(truth("4 'kg' != 5 'kg'"), Some(true));
    assert_eq!(truth("1 second = 1 's'"), Some(true));
    assert_eq!(truth("2 'min' > 90 's'"), Some(true));
    // Calendar years are not definite durations.
    assert!(eval("1 year = 1 'a'").is_empty());
    assert_eq!(truth("1 year ~ 1 'a'"), Some(true));
    // Unrelated units cannot be compared.
    assert!(eval("4 'kg' = 4000 'g'").is_empty());
}

#[test]
fn test_membership_and_union() {
    assert_eq!(truth("2 in (1 | 2 | 3)"), Some(true));
    assert_eq!(truth("5 in (1 | 2 | 3)"), Some(false));
    assert_eq!(truth("(1 | 2 | 3) contains 2"), Some(true));
    assert!(eval("{} in (1 | 2)").is_empty());
    // Union deduplicates.
    assert_eq!(
        eval("(1 | 2 | 2 | 3 | 1).count()").as_integer().unwrap(),
        Some(3)
    );
}

#[test]
fn test_three_valued_logic() {
    assert_eq!(truth("true and {}"), None);
    assert_eq!(truth("false and {}"), Some(false));
    assert_eq!(truth("true or {}"), Some(true));
    assert_eq!(truth("{} or false"), None);
    assert_eq!(truth("true xor {}"), None);
    assert_eq!(truth("false implies {}"), Some(true));
    assert_eq!(truth("{} implies true"), Some(true));
    assert_eq!(truth("true implies {}"), None);
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval("2 + 3 * 4").as_integer().unwrap(), Some(14));
    assert_eq!(eval("5 / 2").single().unwrap().render(), "2.5");
    assert_eq!(eval("5 div 2").as_integer().unwrap(), Some(2));
    assert_eq!(eval("5 mod 2").as_integer().unwrap(), Some(1));
    assert_eq!(eval("-5 div 2").as_integer().unwrap(), Some(-2));
    assert!(eval("1 / 0").is_empty());
    assert_eq!(eval("'ab' + 'cd'").as_string().unwrap().as_deref(), Some("abcd"));
    assert_eq!(eval("'ab' & {}").as_string().unwrap().as_deref(), Some("ab"));
    assert_eq!(eval("3 'mg' + 2 'mg'").single().unwrap().render(), "5 'mg'");
}

#[test]
fn test_temporal_arithmetic() {
    assert_eq!(
        eval("@2012-01-31 + 1 month").single().unwrap().render(),
        "2012-02-29"
    );
    assert_eq!(
        eval("@2012-04-15 - 7 days").single().unwrap().render(),
        "2012-04-08"
    );
    assert_eq!(
        eval("@T23:30 + 1 hour").single().unwrap().render(),
        "00:30"
    );
    assert_eq!(
        eval("@2012-04-15T10:00:00Z + 30 minutes").single().unwrap().render(),
        "2012-04-15T10:30:00Z"
    );
}
