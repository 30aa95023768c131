//! Checked conversions on primitive values.
//!
//! These implement the FHIRPath conversion table for the value kinds the
//! wire can carry. Failures are ordinary errors so callers can map them to
//! an empty collection (`toX()`) or a boolean (`convertsToX()`).

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::element::PrimitiveValue;
use crate::error::{Error, Result};

impl PrimitiveValue {
    pub fn to_boolean(&self) -> Result<bool> {
        match self {
            PrimitiveValue::Boolean(b) => Ok(*b),
            PrimitiveValue::Integer(1) => Ok(true),
            PrimitiveValue::Integer(0) => Ok(false),
            PrimitiveValue::Decimal(d) if *d == Decimal::ONE => Ok(true),
            PrimitiveValue::Decimal(d) if *d == Decimal::ZERO => Ok(false),
            PrimitiveValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" | "1.0" => Ok(true),
                "false" | "f" | "no" | "n" | "0" | "0.0" => Ok(false),
                _ => Err(Error::InvalidValue {
                    to: "Boolean",
                    value: s.to_string(),
                }),
            },
            _ => Err(self.conversion_failed("Boolean")),
        }
    }

    pub fn to_integer(&self) -> Result<i64> {
        match self {
            PrimitiveValue::Integer(i) => Ok(*i),
            PrimitiveValue::Boolean(b) => Ok(i64::from(*b)),
            PrimitiveValue::String(s) => {
                s.parse::<i64>().map_err(|_| Error::InvalidValue {
                    to: "Integer",
                    value: s.to_string(),
                })
            }
            _ => Err(self.conversion_failed("Integer")),
        }
    }

    pub fn to_decimal(&self) -> Result<Decimal> {
        match self {
            PrimitiveValue::Decimal(d) => Ok(*d),
            PrimitiveValue::Integer(i) => Ok(Decimal::from(*i)),
            PrimitiveValue::Boolean(b) => Ok(Decimal::from(u8::from(*b))),
            PrimitiveValue::String(s) => {
                Decimal::from_str(s.trim()).map_err(|_| Error::InvalidValue {
                    to: "Decimal",
                    value: s.to_string(),
                })
            }
        }
    }

    /// Canonical string rendering; never fails.
    pub fn to_string_value(&self) -> Arc<str> {
        match self {
            PrimitiveValue::Boolean(b) => Arc::from(if *b { "true" } else { "false" }),
            PrimitiveValue::Integer(i) => Arc::from(i.to_string().as_str()),
            PrimitiveValue::Decimal(d) => Arc::from(d.to_string().as_str()),
            PrimitiveValue::String(s) => s.clone(),
        }
    }

    fn conversion_failed(&self, to: &'static str) -> Error {
        Error::ConversionFailed {
            from: self.system_name(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_boolean() {
        assert!(PrimitiveValue::Boolean(true).to_boolean().unwrap());
        assert!(PrimitiveValue::Integer(1).to_boolean().unwrap());
        assert!(!PrimitiveValue::Integer(0).to_boolean().unwrap());
        assert!(PrimitiveValue::String("YES".into()).to_boolean().unwrap());
        assert!(!PrimitiveValue::String("f".into()).to_boolean().unwrap());
        assert!(PrimitiveValue::Integer(2).to_boolean().is_err());
        assert!(PrimitiveValue::String("maybe".into()).to_boolean().is_err());
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(PrimitiveValue::Integer(42).to_integer().unwrap(), 42);
        assert_eq!(
            PrimitiveValue::String("-17".into()).to_integer().unwrap(),
            -17
        );
        assert_eq!(PrimitiveValue::Boolean(true).to_integer().unwrap(), 1);
        assert!(PrimitiveValue::String("1.5".into()).to_integer().is_err());
        assert!(PrimitiveValue::Decimal(Decimal::ONE).to_integer().is_err());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(
            PrimitiveValue::String("1.5".into()).to_decimal().unwrap(),
            Decimal::from_str("1.5").unwrap()
        );
        assert_eq!(
            PrimitiveValue::Integer(3).to_decimal().unwrap(),
            Decimal::from(3)
        );
        assert!(PrimitiveValue::String("abc".into()).to_decimal().is_err());
    }

    #[test]
    fn test_to_string_value() {
        assert_eq!(&*PrimitiveValue::Boolean(false).to_string_value(), "false");
        assert_eq!(&*PrimitiveValue::Integer(7).to_string_value(), "7");
        assert_eq!(
            &*PrimitiveValue::Decimal(Decimal::from_str("1.50").unwrap()).to_string_value(),
            "1.50"
        );
    }
}
