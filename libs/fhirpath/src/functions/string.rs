//! String functions.
//!
//! Indices are character positions, not byte offsets. An empty focus or an
//! empty required argument makes the result empty; a non-string singleton
//! focus is a type error.

use crate::error::{FhirPathError, Result};
use crate::value::{Collection, Value};

#[cfg(feature = "encoding")]
use base64::Engine;

pub(crate) fn index_of(
    input: &Collection,
    substring: &Collection,
    from_end: bool,
) -> Result<Collection> {
    let (Some(s), Some(sub)) = (input.as_string()?, substring.as_string()?) else {
        return Ok(Collection::empty());
    };
    let found = if from_end {
        s.rfind(sub.as_ref())
    } else {
        s.find(sub.as_ref())
    };
    let index = match found {
        Some(byte) => s[..byte].chars().count() as i64,
        None => -1,
    };
    Ok(Collection::singleton(Value::integer(index)))
}

pub(crate) fn substring(
    input: &Collection,
    start: &Collection,
    length: Option<Collection>,
) -> Result<Collection> {
    let Some(s) = input.as_string()? else {
        return Ok(Collection::empty());
    };
    let Some(start) = start.as_integer()? else {
        return Ok(Collection::empty());
    };
    let total = s.chars().count() as i64;
    if start < 0 || start >= total {
        return Ok(Collection::empty());
    }
    let length = match length {
        Some(arg) => match arg.as_integer()? {
            Some(n) if n <= 0 => return Ok(Collection::empty()),
            Some(n) => n as usize,
            None => return Ok(Collection::empty()),
        },
        None => usize::MAX,
    };
    let result: String = s.chars().skip(start as usize).take(length).collect();
    Ok(Collection::singleton(Value::string(result)))
}

pub(crate) fn starts_with(input: &Collection, prefix: &Collection) -> Result<Collection> {
    string_pair(input, prefix, |s, p| {
        Value::boolean(s.starts_with(p))
    })
}

pub(crate) fn ends_with(input: &Collection, suffix: &Collection) -> Result<Collection> {
    string_pair(input, suffix, |s, p| Value::boolean(s.ends_with(p)))
}

pub(crate) fn contains(input: &Collection, needle: &Collection) -> Result<Collection> {
    string_pair(input, needle, |s, p| Value::boolean(s.contains(p)))
}

pub(crate) fn upper(input: &Collection) -> Result<Collection> {
    string_unary(input, |s| Value::string(s.to_uppercase()))
}

pub(crate) fn lower(input: &Collection) -> Result<Collection> {
    string_unary(input, |s| Value::string(s.to_lowercase()))
}

pub(crate) fn trim(input: &Collection) -> Result<Collection> {
    string_unary(input, |s| Value::string(s.trim()))
}

pub(crate) fn length(input: &Collection) -> Result<Collection> {
    string_unary(input, |s| Value::integer(s.chars().count() as i64))
}

pub(crate) fn to_chars(input: &Collection) -> Result<Collection> {
    let Some(s) = input.as_string()? else {
        return Ok(Collection::empty());
    };
    Ok(s.chars().map(|c| Value::string(c.to_string())).collect())
}

pub(crate) fn replace(
    input: &Collection,
    pattern: &Collection,
    substitution: &Collection,
) -> Result<Collection> {
    let (Some(s), Some(pattern), Some(substitution)) = (
        input.as_string()?,
        pattern.as_string()?,
        substitution.as_string()?,
    ) else {
        return Ok(Collection::empty());
    };
    // An empty pattern inserts the substitution around every character.
    Ok(Collection::singleton(Value::string(
        s.replace(pattern.as_ref(), &substitution),
    )))
}

pub(crate) fn split(input: &Collection, separator: &Collection) -> Result<Collection> {
    let (Some(s), Some(sep)) = (input.as_string()?, separator.as_string()?) else {
        return Ok(Collection::empty());
    };
    if sep.is_empty() {
        return to_chars(input);
    }
    Ok(s.split(sep.as_ref()).map(Value::string).collect())
}

pub(crate) fn join(input: &Collection, separator: Option<Collection>) -> Result<Collection> {
    let separator = match separator {
        Some(arg) => arg.as_string()?.unwrap_or_else(|| "".into()),
        None => "".into(),
    };
    let mut parts = Vec::with_capacity(input.len());
    for value in input.iter() {
        match value.system() {
            Some(system) => match system.data() {
                crate::value::ValueData::String(s) => parts.push(s.to_string()),
                _ => {
                    return Err(FhirPathError::TypeError(format!(
                        "join() requires strings, got {}",
                        value.type_info()
                    )))
                }
            },
            None => parts.push(String::new()),
        }
    }
    Ok(Collection::singleton(Value::string(
        parts.join(separator.as_ref()),
    )))
}

#[cfg(feature = "regex-support")]
fn compile_regex(pattern: &str, anchored: bool) -> Result<regex::Regex> {
    let source = if anchored {
        format!("\\A(?:{pattern})\\z")
    } else {
        pattern.to_string()
    };
    regex::Regex::new(&source)
        .map_err(|e| FhirPathError::EvaluationError(format!("invalid regex: {e}")))
}

#[cfg(feature = "regex-support")]
pub(crate) fn matches(
    input: &Collection,
    pattern: &Collection,
    anchored: bool,
) -> Result<Collection> {
    let (Some(s), Some(pattern)) = (input.as_string()?, pattern.as_string()?) else {
        return Ok(Collection::empty());
    };
    let regex = compile_regex(&pattern, anchored)?;
    Ok(Collection::singleton(Value::boolean(regex.is_match(&s))))
}

#[cfg(feature = "regex-support")]
pub(crate) fn replace_matches(
    input: &Collection,
    pattern: &Collection,
    substitution: &Collection,
) -> Result<Collection> {
    let (Some(s), Some(pattern), Some(substitution)) = (
        input.as_string()?,
        pattern.as_string()?,
        substitution.as_string()?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile_regex(&pattern, false)?;
    Ok(Collection::singleton(Value::string(
        regex.replace_all(&s, substitution.as_ref()).into_owned(),
    )))
}

#[cfg(not(feature = "regex-support"))]
pub(crate) fn matches(_: &Collection, _: &Collection, _: bool) -> Result<Collection> {
    Err(FhirPathError::Unsupported(
        "matches() requires the regex-support feature".to_string(),
    ))
}

#[cfg(not(feature = "regex-support"))]
pub(crate) fn replace_matches(_: &Collection, _: &Collection, _: &Collection) -> Result<Collection> {
    Err(FhirPathError::Unsupported(
        "replaceMatches() requires the regex-support feature".to_string(),
    ))
}

pub(crate) fn encode(input: &Collection, format: &Collection) -> Result<Collection> {
    let (Some(s), Some(format)) = (input.as_string()?, format.as_string()?) else {
        return Ok(Collection::empty());
    };
    let encoded = match format.as_ref() {
        #[cfg(feature = "encoding")]
        "hex" => hex::encode(s.as_bytes()),
        #[cfg(feature = "encoding")]
        "base64" => base64::engine::general_purpose::STANDARD.encode(s.as_bytes()),
        #[cfg(feature = "encoding")]
        "urlbase64" => base64::engine::general_purpose::URL_SAFE.encode(s.as_bytes()),
        "url" => urlencoding::encode(&s).into_owned(),
        other => return Err(unknown_format("encode", other)),
    };
    Ok(Collection::singleton(Value::string(encoded)))
}

/// Undecodable input (bad hex digits, invalid base64, non-utf8 bytes)
/// evaluates to empty rather than an error, matching the conversion
/// functions.
pub(crate) fn decode(input: &Collection, format: &Collection) -> Result<Collection> {
    let (Some(s), Some(format)) = (input.as_string()?, format.as_string()?) else {
        return Ok(Collection::empty());
    };
    let bytes = match format.as_ref() {
        #[cfg(feature = "encoding")]
        "hex" => hex::decode(s.as_bytes()).ok(),
        #[cfg(feature = "encoding")]
        "base64" => base64::engine::general_purpose::STANDARD.decode(s.as_bytes()).ok(),
        #[cfg(feature = "encoding")]
        "urlbase64" => base64::engine::general_purpose::URL_SAFE.decode(s.as_bytes()).ok(),
        "url" => return Ok(match urlencoding::decode(&s) {
            Ok(decoded) => Collection::singleton(Value::string(decoded.into_owned())),
            Err(_) => Collection::empty(),
        }),
        other => return Err(unknown_format("decode", other)),
    };
    Ok(match bytes.and_then(|b| String::from_utf8(b).ok()) {
        Some(decoded) => Collection::singleton(Value::string(decoded)),
        None => Collection::empty(),
    })
}

pub(crate) fn escape(input: &Collection, format: &Collection) -> Result<Collection> {
    let (Some(s), Some(format)) = (input.as_string()?, format.as_string()?) else {
        return Ok(Collection::empty());
    };
    let escaped = match format.as_ref() {
        #[cfg(feature = "escaping")]
        "html" => html_escape::encode_safe(s.as_ref()).into_owned(),
        "json" => {
            let quoted = serde_json::to_string(s.as_ref())
                .map_err(|e| FhirPathError::EvaluationError(e.to_string()))?;
            quoted[1..quoted.len() - 1].to_string()
        }
        other => return Err(unknown_format("escape", other)),
    };
    Ok(Collection::singleton(Value::string(escaped)))
}

pub(crate) fn unescape(input: &Collection, format: &Collection) -> Result<Collection> {
    let (Some(s), Some(format)) = (input.as_string()?, format.as_string()?) else {
        return Ok(Collection::empty());
    };
    let unescaped = match format.as_ref() {
        #[cfg(feature = "escaping")]
        "html" => Some(html_escape::decode_html_entities(s.as_ref()).into_owned()),
        "json" => serde_json::from_str::<String>(&format!("\"{s}\"")).ok(),
        other => return Err(unknown_format("unescape", other)),
    };
    Ok(match unescaped {
        Some(result) => Collection::singleton(Value::string(result)),
        None => Collection::empty(),
    })
}

fn unknown_format(function: &str, format: &str) -> FhirPathError {
    FhirPathError::EvaluationError(format!("{function}() does not support format '{format}'"))
}

fn string_unary(input: &Collection, f: impl Fn(&str) -> Value) -> Result<Collection> {
    match input.as_string()? {
        Some(s) => Ok(Collection::singleton(f(&s))),
        None => Ok(Collection::empty()),
    }
}

fn string_pair(
    input: &Collection,
    argument: &Collection,
    f: impl Fn(&str, &str) -> Value,
) -> Result<Collection> {
    let (Some(s), Some(arg)) = (input.as_string()?, argument.as_string()?) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(f(&s, &arg)))
}
