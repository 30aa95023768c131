//! Abstract syntax tree.
//!
//! The tree mirrors the official FHIRPath grammar (fhirpath.g4) rule for
//! rule, with literal terms inlined as enum variants. Operator sets are
//! small `Copy` enums so evaluation can match on them directly.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::value::{DatePrecision, DateTimePrecision, TimePrecision};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Literal terms
    /// The empty collection `{}`.
    Empty,
    Boolean(bool),
    Integer(i64),
    Long(i64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate, DatePrecision),
    /// UTC-normalized instant plus the written offset in seconds east of
    /// UTC; `None` when the literal had no timezone.
    DateTime(DateTime<Utc>, DateTimePrecision, Option<i32>),
    Time(NaiveTime, TimePrecision),
    Quantity {
        value: Decimal,
        unit: Option<String>,
    },

    // Environment references and constants
    This,
    Index,
    Total,
    ExternalConstant(String),

    // Invocations
    Member(String),
    Function {
        name: String,
        arguments: Vec<Expression>,
    },

    // Composite expressions
    Invocation {
        target: Box<Expression>,
        invocation: Box<Expression>,
    },
    Indexer {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
    Polarity {
        operator: PolarityOperator,
        operand: Box<Expression>,
    },
    Multiplicative {
        operator: MultiplicativeOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Additive {
        operator: AdditiveOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    TypeTest {
        operator: TypeOperator,
        operand: Box<Expression>,
        type_specifier: TypeSpecifier,
    },
    Union {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Inequality {
        operator: InequalityOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Equality {
        operator: EqualityOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Membership {
        operator: MembershipOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Or {
        operator: OrOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Implies {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

/// A type name with an optional namespace qualifier (`System.String`,
/// `FHIR.Patient`, or a bare `Quantity`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpecifier {
    pub qualifier: Option<String>,
    pub name: String,
}

impl TypeSpecifier {
    pub fn new(qualifier: Option<String>, name: impl Into<String>) -> Self {
        TypeSpecifier {
            qualifier,
            name: name.into(),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        TypeSpecifier::new(None, name)
    }
}

impl std::fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarityOperator {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicativeOperator {
    Multiply, // *
    Divide,   // /
    Div,      // div
    Mod,      // mod
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditiveOperator {
    Plus,   // +
    Minus,  // -
    Concat, // &
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperator {
    Is,
    As,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InequalityOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOperator {
    Equal,         // =
    NotEqual,      // !=
    Equivalent,    // ~
    NotEquivalent, // !~
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOperator {
    In,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrOperator {
    Or,
    Xor,
}
