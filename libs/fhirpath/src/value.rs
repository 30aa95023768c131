//! Runtime values and collections.
//!
//! Every FHIRPath expression evaluates to a [`Collection`] of [`Value`]s.
//! Values are cheaply clonable handles (`Arc` inside); element and primitive
//! nodes are held by reference so navigation never copies trees, and
//! primitive nodes keep their id/extension metadata reachable.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use smallvec::SmallVec;

use aurum_element::{Element, Node, Primitive, PrimitiveValue, TypeInfo};

use crate::error::{FhirPathError, Result};
use crate::temporal;

/// Precision of a date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// Precision of a datetime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// Precision of a time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimePrecision {
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl DateTimePrecision {
    /// Seconds and milliseconds count as one precision: `05` equals `05.000`.
    pub fn compatible(self, other: Self) -> bool {
        self == other
            || (self >= DateTimePrecision::Second && other >= DateTimePrecision::Second)
    }
}

impl TimePrecision {
    pub fn compatible(self, other: Self) -> bool {
        self == other || (self >= TimePrecision::Second && other >= TimePrecision::Second)
    }
}

/// A single FHIRPath value.
#[derive(Debug, Clone)]
pub struct Value(Arc<ValueData>);

#[derive(Debug)]
pub enum ValueData {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(Arc<str>),
    Date(NaiveDate, DatePrecision),
    /// UTC-normalized instant; `offset` preserves the wire timezone in
    /// seconds east of UTC for rendering (`None`: no timezone given).
    DateTime {
        value: DateTime<Utc>,
        precision: DateTimePrecision,
        offset: Option<i32>,
    },
    Time(NaiveTime, TimePrecision),
    Quantity {
        value: Decimal,
        unit: Arc<str>,
    },
    Element(Arc<Element>),
    Primitive(Arc<Primitive>),
    Type(TypeInfo),
}

impl Value {
    pub fn boolean(value: bool) -> Self {
        Value(Arc::new(ValueData::Boolean(value)))
    }

    pub fn integer(value: i64) -> Self {
        Value(Arc::new(ValueData::Integer(value)))
    }

    pub fn decimal(value: Decimal) -> Self {
        Value(Arc::new(ValueData::Decimal(value)))
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Value(Arc::new(ValueData::String(value.into())))
    }

    pub fn date(value: NaiveDate, precision: DatePrecision) -> Self {
        Value(Arc::new(ValueData::Date(value, precision)))
    }

    pub fn datetime(value: DateTime<Utc>, precision: DateTimePrecision, offset: Option<i32>) -> Self {
        Value(Arc::new(ValueData::DateTime {
            value,
            precision,
            offset,
        }))
    }

    pub fn time(value: NaiveTime, precision: TimePrecision) -> Self {
        Value(Arc::new(ValueData::Time(value, precision)))
    }

    pub fn quantity(value: Decimal, unit: impl Into<Arc<str>>) -> Self {
        Value(Arc::new(ValueData::Quantity {
            value,
            unit: unit.into(),
        }))
    }

    pub fn element(element: Arc<Element>) -> Self {
        Value(Arc::new(ValueData::Element(element)))
    }

    pub fn primitive(primitive: Arc<Primitive>) -> Self {
        Value(Arc::new(ValueData::Primitive(primitive)))
    }

    pub fn of_type(info: TypeInfo) -> Self {
        Value(Arc::new(ValueData::Type(info)))
    }

    pub fn from_node(node: &Node) -> Self {
        match node {
            Node::Element(e) => Value::element(e.clone()),
            Node::Primitive(p) => Value::primitive(p.clone()),
        }
    }

    pub fn data(&self) -> &ValueData {
        &self.0
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Unwraps a primitive node to its System value. Value-less primitives
    /// (metadata only) yield `None`; everything else is already a System
    /// value or a node and passes through.
    pub fn system(&self) -> Option<Value> {
        match self.data() {
            ValueData::Primitive(p) => p.value().map(|v| match v {
                PrimitiveValue::Boolean(b) => Value::boolean(*b),
                PrimitiveValue::Integer(i) => Value::integer(*i),
                PrimitiveValue::Decimal(d) => Value::decimal(*d),
                PrimitiveValue::String(s) => Value::string(s.clone()),
            }),
            _ => Some(self.clone()),
        }
    }

    pub fn type_info(&self) -> TypeInfo {
        match self.data() {
            ValueData::Boolean(_) => TypeInfo::system("Boolean"),
            ValueData::Integer(_) => TypeInfo::system("Integer"),
            ValueData::Decimal(_) => TypeInfo::system("Decimal"),
            ValueData::String(_) => TypeInfo::system("String"),
            ValueData::Date(..) => TypeInfo::system("Date"),
            ValueData::DateTime { .. } => TypeInfo::system("DateTime"),
            ValueData::Time(..) => TypeInfo::system("Time"),
            ValueData::Quantity { .. } => TypeInfo::system("Quantity"),
            ValueData::Element(e) => e.type_info(),
            ValueData::Primitive(p) => p.type_info(),
            ValueData::Type(_) => TypeInfo::system("TypeInfo"),
        }
    }

    /// The boolean reading under the singleton evaluation rule: an actual
    /// boolean keeps its value, any other single item reads as `true`.
    pub fn singleton_boolean(&self) -> bool {
        match self.data() {
            ValueData::Boolean(b) => *b,
            ValueData::Primitive(p) => match p.value() {
                Some(PrimitiveValue::Boolean(b)) => *b,
                _ => true,
            },
            _ => true,
        }
    }

    /// Human-readable rendering, also the `toString()` conversion for
    /// System values.
    pub fn render(&self) -> String {
        match self.data() {
            ValueData::Boolean(b) => b.to_string(),
            ValueData::Integer(i) => i.to_string(),
            ValueData::Decimal(d) => d.to_string(),
            ValueData::String(s) => s.to_string(),
            ValueData::Date(date, precision) => temporal::render_date(*date, *precision),
            ValueData::DateTime {
                value,
                precision,
                offset,
            } => temporal::render_datetime(*value, *precision, *offset),
            ValueData::Time(time, precision) => temporal::render_time(*time, *precision),
            ValueData::Quantity { value, unit } => {
                if temporal::is_calendar_unit(unit) || unit.as_ref() == "1" {
                    format!("{value} {unit}")
                } else {
                    format!("{value} '{unit}'")
                }
            }
            ValueData::Element(e) => match e.type_name() {
                Some(name) => format!("[{name}]"),
                None => "[Element]".to_string(),
            },
            ValueData::Primitive(p) => p
                .value()
                .map(|v| v.to_string_value().to_string())
                .unwrap_or_default(),
            ValueData::Type(info) => info.to_string(),
        }
    }
}

const INLINE_ITEMS: usize = 4;

/// An ordered, duplicate-preserving collection of values.
///
/// Small collections live inline; larger ones spill into a shared `Arc` so
/// cloning stays cheap when intermediate results are fanned out.
#[derive(Debug, Clone)]
pub struct Collection(Repr);

#[derive(Debug, Clone)]
enum Repr {
    Small(SmallVec<[Value; INLINE_ITEMS]>),
    Large(Arc<Vec<Value>>),
}

impl Default for Collection {
    fn default() -> Self {
        Collection::empty()
    }
}

impl Collection {
    pub fn empty() -> Self {
        Collection(Repr::Small(SmallVec::new()))
    }

    pub fn singleton(value: Value) -> Self {
        let mut items = SmallVec::new();
        items.push(value);
        Collection(Repr::Small(items))
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        if items.len() <= INLINE_ITEMS {
            Collection(Repr::Small(items.into_iter().collect()))
        } else {
            Collection(Repr::Large(Arc::new(items)))
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        match &self.0 {
            Repr::Small(items) => items,
            Repr::Large(items) => items,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.as_slice().iter()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_slice().get(index)
    }

    pub fn first(&self) -> Option<&Value> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.as_slice().last()
    }

    pub fn push(&mut self, value: Value) {
        match &mut self.0 {
            Repr::Small(items) if items.len() < INLINE_ITEMS => items.push(value),
            Repr::Small(items) => {
                let mut spilled: Vec<Value> = items.drain(..).collect();
                spilled.push(value);
                self.0 = Repr::Large(Arc::new(spilled));
            }
            Repr::Large(items) => Arc::make_mut(items).push(value),
        }
    }

    pub fn append(&mut self, other: &Collection) {
        for value in other.iter() {
            self.push(value.clone());
        }
    }

    /// The single value, if there is exactly one.
    pub fn single(&self) -> Option<&Value> {
        match self.as_slice() {
            [value] => Some(value),
            _ => None,
        }
    }

    /// Singleton boolean reading: empty stays empty, one item coerces per
    /// the singleton rule, more than one item is a type error.
    pub fn as_boolean(&self) -> Result<Option<bool>> {
        match self.as_slice() {
            [] => Ok(None),
            [value] => Ok(Some(value.singleton_boolean())),
            _ => Err(FhirPathError::TypeError(format!(
                "expected a single boolean, got {} items",
                self.len()
            ))),
        }
    }

    pub fn as_string(&self) -> Result<Option<Arc<str>>> {
        match self.as_slice() {
            [] => Ok(None),
            [value] => match value.system().as_ref().map(Value::data) {
                Some(ValueData::String(s)) => Ok(Some(s.clone())),
                _ => Err(FhirPathError::TypeError(format!(
                    "expected a string, got {}",
                    value.type_info()
                ))),
            },
            _ => Err(FhirPathError::TypeError(format!(
                "expected a single string, got {} items",
                self.len()
            ))),
        }
    }

    pub fn as_integer(&self) -> Result<Option<i64>> {
        match self.as_slice() {
            [] => Ok(None),
            [value] => match value.system().as_ref().map(Value::data) {
                Some(ValueData::Integer(i)) => Ok(Some(*i)),
                _ => Err(FhirPathError::TypeError(format!(
                    "expected an integer, got {}",
                    value.type_info()
                ))),
            },
            _ => Err(FhirPathError::TypeError(format!(
                "expected a single integer, got {} items",
                self.len()
            ))),
        }
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Collection::from_vec(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
