//! The built-in function library, evaluated end to end over literals.

use aurum_fhirpath::{Collection, Context, FhirPath, FhirPathError};

fn eval(expression: &str) -> Collection {
    let engine = FhirPath::new();
    let compiled = engine.compile(expression).unwrap();
    engine
        .evaluate_expr(&compiled, &Context::empty())
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

fn eval_err(expression: &str) -> FhirPathError {
    let engine = FhirPath::new();
    let compiled = engine.compile(expression).unwrap();
    engine
        .evaluate_expr(&compiled, &Context::empty())
        .expect_err(expression)
}

fn truth(expression: &str) -> Option<bool> {
    eval(expression).as_boolean().unwrap()
}

fn string(expression: &str) -> String {
    eval(expression).as_string().unwrap().unwrap().to_string()
}

fn integer(expression: &str) -> i64 {
    eval(expression).as_integer().unwrap().unwrap()
}

#[test]
fn test_existence() {
    assert_eq!(truth("{}.empty()"), Some(true));
    assert_eq!(truth("(1 | 2).empty()"), Some(false));
    assert_eq!(truth("(1 | 2).exists()"), Some(true));
    assert_eq!(truth("(1 | 2 | 3).exists($this > 2)"), Some(true));
    assert_eq!(truth("(1 | 2 | 3).all($this > 0)"), Some(true));
    assert_eq!(truth("(1 | 2 | 3).all($this > 1)"), Some(false));
    assert_eq!(truth("{}.all($this > 1)"), Some(true));
    assert_eq!(truth("(true | true).allTrue()"), Some(true));
    assert_eq!(truth("(true | false).anyFalse()"), Some(true));
    assert_eq!(truth("(1 | 2).subsetOf(1 | 2 | 3)"), Some(true));
    assert_eq!(truth("(1 | 2 | 3).supersetOf(1 | 2)"), Some(true));
    // Union deduplicates before combine appends.
    assert_eq!(integer("(1 | 2 | 2 | 3).count()"), 3);
    assert_eq!(integer("(1 | 2 | 2 | 3).combine(2).count()"), 4);
    assert_eq!(integer("(1 | 2 | 3).combine(2).combine(2).count()"), 5);
    assert_eq!(integer("(1 | 2).combine(2).distinct().count()"), 2);
    assert_eq!(truth("(1 | 2).isDistinct()"), Some(true));
    assert_eq!(truth("(1 | 2).combine(1).isDistinct()"), Some(false));
}

#[test]
fn test_subsetting() {
    assert_eq!(integer("(1 | 2 | 3).first()"), 1);
    assert_eq!(integer("(1 | 2 | 3).last()"), 3);
    assert_eq!(integer("(1 | 2 | 3).tail().first()"), 2);
    assert_eq!(integer("(1 | 2 | 3 | 4).skip(2).first()"), 3);
    assert_eq!(integer("(1 | 2 | 3 | 4).take(2).last()"), 2);
    assert!(eval("{}.single()").is_empty());
    assert_eq!(integer("(5).single()"), 5);
    assert!(matches!(
        eval_err("(1 | 2).single()"),
        FhirPathError::EvaluationError(_)
    ));
    assert_eq!(integer("(1 | 2 | 3).intersect(2 | 3 | 4).count()"), 2);
    assert_eq!(integer("(1 | 2 | 3).exclude(2).count()"), 2);
}

#[test]
fn test_string_functions() {
    assert_eq!(integer("'hello'.length()"), 5);
    assert_eq!(string("'hello'.upper()"), "HELLO");
    assert_eq!(string("'HELLO'.lower()"), "hello");
    assert_eq!(string("'  hi  '.trim()"), "hi");
    assert_eq!(integer("'abcdef'.indexOf('cd')"), 2);
    assert_eq!(integer("'abcdef'.indexOf('x')"), -1);
    assert_eq!(integer("'abcabc'.lastIndexOf('abc')"), 3);
    assert_eq!(string("'abcdef'.substring(2)"), "cdef");
    assert_eq!(string("'abcdef'.substring(2, 2)"), "cd");
    assert!(eval("'abc'.substring(7)").is_empty());
    assert_eq!(truth("'hello'.startsWith('he')"), Some(true));
    assert_eq!(truth("'hello'.endsWith('lo')"), Some(true));
    assert_eq!(truth("'hello'.contains('ell')"), Some(true));
    assert_eq!(string("'banana'.replace('a', 'o')"), "bonono");
    assert_eq!(string("'abc'.replace('', 'x')"), "xaxbxcx");
    assert_eq!(integer("'a,b,c'.split(',').count()"), 3);
    assert_eq!(string("('a' | 'b' | 'c').join('-')"), "a-b-c");
    assert_eq!(string("('a' | 'b').join()"), "ab");
    assert_eq!(integer("'abc'.toChars().count()"), 3);
}

#[cfg(feature = "regex-support")]
#[test]
fn test_regex_functions() {
    assert_eq!(truth("'hello123'.matches('[0-9]+')"), Some(true));
    // matchesFull anchors the pattern.
    assert_eq!(truth("'hello123'.matchesFull('[0-9]+')"), Some(false));
    assert_eq!(truth("'123'.matchesFull('[0-9]+')"), Some(true));
    assert_eq!(
        string("'hello world'.replaceMatches('o', '0')"),
        "hell0 w0rld"
    );
    assert!(matches!(
        eval_err("'x'.matches('[')"),
        FhirPathError::EvaluationError(_)
    ));
}

#[cfg(feature = "encoding")]
#[test]
fn test_encode_decode() {
    assert_eq!(string("'hi'.encode('hex')"), "6869");
    assert_eq!(string("'6869'.decode('hex')"), "hi");
    assert_eq!(string("'hello'.encode('base64')"), "aGVsbG8=");
    assert_eq!(string("'aGVsbG8='.decode('base64')"), "hello");
    assert!(eval("'not base64!'.decode('base64')").is_empty());
    assert_eq!(string("'a b'.encode('url')"), "a%20b");
    assert_eq!(string("'a%20b'.decode('url')"), "a b");
}

#[cfg(feature = "escaping")]
#[test]
fn test_escape_unescape() {
    assert_eq!(string("'<b>'.escape('html')"), "&lt;b&gt;");
    assert_eq!(string("'&lt;b&gt;'.unescape('html')"), "<b>");
    assert_eq!(string("'say \\'hi\\''.escape('json')"), "say 'hi'");
    assert_eq!(string("'a\\\\nb'.unescape('json')"), "a\nb");
}

#[test]
fn test_math_functions() {
    assert_eq!(integer("(-5).abs()"), 5);
    assert_eq!(eval("(-5.5).abs()").single().unwrap().render(), "5.5");
    assert_eq!(integer("1.1.ceiling()"), 2);
    assert_eq!(integer("1.9.floor()"), 1);
    assert_eq!(integer("(-1.5).truncate()"), -1);
    assert_eq!(eval("1.95.round(1)").single().unwrap().render(), "2");
    assert_eq!(eval("3.14159.round(2)").single().unwrap().render(), "3.14");
    assert_eq!(integer("(2).power(10)"), 1024);
    assert!(eval("(-1).sqrt()").is_empty());
    assert_eq!(eval("4.sqrt()").single().unwrap().render(), "2");
    assert_eq!(eval("100.log(10)").single().unwrap().render(), "2");
    assert!(eval("0.ln()").is_empty());
}

#[test]
fn test_iif_is_lazy() {
    assert_eq!(integer("iif(true, 1, 2)"), 1);
    assert_eq!(integer("iif(false, 1, 2)"), 2);
    assert!(eval("iif(false, 1)").is_empty());
    assert!(eval("iif({}, 1, 2)").as_integer().unwrap() == Some(2));
    // The untaken branch is never evaluated, so its errors never surface.
    assert_eq!(integer("iif(true, 1, (1 | 2).single())"), 1);
}

#[test]
fn test_conversions() {
    assert_eq!(truth("'true'.toBoolean()"), Some(true));
    assert_eq!(truth("'Y'.toBoolean()"), Some(true));
    assert_eq!(truth("1.convertsToBoolean()"), Some(true));
    assert_eq!(truth("'maybe'.convertsToBoolean()"), Some(false));
    assert_eq!(integer("'42'.toInteger()"), 42);
    assert!(eval("'4.2'.toInteger()").is_empty());
    assert_eq!(eval("'4.2'.toDecimal()").single().unwrap().render(), "4.2");
    assert_eq!(string("42.toString()"), "42");
    assert_eq!(string("4.5 'mg'.toString()"), "4.5 'mg'");
    assert_eq!(string("@2012-04-15.toString()"), "2012-04-15");
    assert_eq!(
        eval("'2012-04-15'.toDate()").single().unwrap().render(),
        "2012-04-15"
    );
    assert_eq!(
        eval("@2012-04-15T14:30:00Z.toDate()").single().unwrap().render(),
        "2012-04-15"
    );
    assert_eq!(
        eval("'14:30:00'.toTime()").single().unwrap().render(),
        "14:30:00"
    );
    assert_eq!(
        eval("@2012-04-15.toDateTime()").single().unwrap().render(),
        "2012-04-15"
    );
    assert_eq!(eval("'5 days'.toQuantity()").single().unwrap().render(), "5 days");
    assert_eq!(
        eval("2 'min'.toQuantity('s')").single().unwrap().render(),
        "120 's'"
    );
    assert_eq!(truth("'5 days'.convertsToQuantity()"), Some(true));
    assert_eq!(truth("'soon'.convertsToDate()"), Some(false));
}

#[test]
fn test_utility_functions() {
    assert_eq!(truth("(1 = 1).not()"), Some(false));
    assert!(eval("{}.not()").is_empty());
    // trace passes its input through unchanged.
    assert_eq!(integer("(1 | 2).trace('items').count()"), 2);
    assert_eq!(truth("now().exists()"), Some(true));
    assert_eq!(truth("today().exists()"), Some(true));
    assert_eq!(truth("timeOfDay().exists()"), Some(true));
    assert_eq!(string("1.type().name"), "Integer");
    assert_eq!(string("1.type().namespace"), "System");
    assert_eq!(truth("5.is(Integer)"), Some(true));
    assert_eq!(truth("5.is(System.Integer)"), Some(true));
    assert_eq!(integer("5.as(Integer)"), 5);
    assert!(eval("5.as(String)").is_empty());
}

#[test]
fn test_aggregate() {
    assert_eq!(integer("(1 | 2 | 3 | 4).aggregate($this + $total, 0)"), 10);
    assert_eq!(
        integer("(1 | 2 | 3).aggregate(iif($total.empty(), $this, iif($this > $total, $this, $total)))"),
        3
    );
}

#[test]
fn test_unknown_function_and_bad_arity() {
    assert!(matches!(
        eval_err("1.frobnicate()"),
        FhirPathError::FunctionNotFound(_)
    ));
    assert!(matches!(
        eval_err("(1 | 2).where()"),
        FhirPathError::EvaluationError(_)
    ));
}
