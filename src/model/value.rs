use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::model::dtype::DType;

/// A single cell.
///
/// Columns hold values of one type plus `Null`; mixed columns are rejected
/// at construction. Equality is strict per variant: `Int(1)` and
/// `Float(1.0)` are distinct values (arithmetic widens, identity does not).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(NaiveDateTime),
}

/// Collapses `-0.0` into `0.0` and every NaN bit pattern into one, so that
/// equality, ordering, and hashing agree on floats used as group keys.
fn canonical_f64(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x == 0.0 {
        0.0
    } else {
        x
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                canonical_f64(*a).to_bits() == canonical_f64(*b).to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => canonical_f64(*f).to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
        }
    }
}

impl Value {
    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Timestamp(_) => 4,
            Value::Null => 5,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Total order: booleans, then numbers (ints and floats interleaved by
    /// magnitude), then strings, then timestamps, with nulls greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => {
                canonical_f64(*a).total_cmp(&canonical_f64(*b))
            }
            (Value::Int(a), Value::Float(b)) => (*a as f64)
                .total_cmp(&canonical_f64(*b))
                .then(Ordering::Less),
            (Value::Float(a), Value::Int(b)) => canonical_f64(*a)
                .total_cmp(&(*b as f64))
                .then(Ordering::Greater),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type this value belongs to, or `None` for nulls.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DType::Bool),
            Value::Int(_) => Some(DType::Int),
            Value::Float(_) => Some(DType::Float),
            Value::Str(_) => Some(DType::Str),
            Value::Timestamp(_) => Some(DType::Timestamp),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Numeric view used by aggregators and arithmetic widening.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn numeric_pair(&self, other: &Value, op: &str) -> Result<(f64, f64)> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(Error::type_mismatch(
                format!("numeric operands for {op}"),
                format!("{} and {}", self.type_name(), other.type_name()),
            )),
        }
    }

    /// Addition with null propagation. Two ints stay int, any float widens,
    /// two strings concatenate.
    pub fn add(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => {
                let (a, b) = self.numeric_pair(other, "+")?;
                Ok(Value::Float(a + b))
            }
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
            _ => {
                let (a, b) = self.numeric_pair(other, "-")?;
                Ok(Value::Float(a - b))
            }
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
            _ => {
                let (a, b) = self.numeric_pair(other, "*")?;
                Ok(Value::Float(a * b))
            }
        }
    }

    /// Division always yields a float; dividing by zero follows IEEE 754.
    pub fn div(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            _ => {
                let (a, b) = self.numeric_pair(other, "/")?;
                Ok(Value::Float(a / b))
            }
        }
    }

    fn compare(&self, other: &Value, op: &str) -> Result<Option<Ordering>> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(None),
            (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            (Value::Timestamp(a), Value::Timestamp(b)) => Ok(Some(a.cmp(b))),
            _ => {
                let (a, b) = self.numeric_pair(other, op)?;
                Ok(Some(a.total_cmp(&b)))
            }
        }
    }

    pub fn lt(&self, other: &Value) -> Result<Value> {
        Ok(match self.compare(other, "<")? {
            None => Value::Null,
            Some(ord) => Value::Bool(ord == Ordering::Less),
        })
    }

    pub fn le(&self, other: &Value) -> Result<Value> {
        Ok(match self.compare(other, "<=")? {
            None => Value::Null,
            Some(ord) => Value::Bool(ord != Ordering::Greater),
        })
    }

    pub fn gt(&self, other: &Value) -> Result<Value> {
        Ok(match self.compare(other, ">")? {
            None => Value::Null,
            Some(ord) => Value::Bool(ord == Ordering::Greater),
        })
    }

    pub fn ge(&self, other: &Value) -> Result<Value> {
        Ok(match self.compare(other, ">=")? {
            None => Value::Null,
            Some(ord) => Value::Bool(ord != Ordering::Less),
        })
    }

    /// Equality as an expression: null on either side yields null, ints
    /// and floats compare by value.
    pub fn eq_value(&self, other: &Value) -> Result<Value> {
        Ok(match self.compare(other, "==")? {
            None => Value::Null,
            Some(ord) => Value::Bool(ord == Ordering::Equal),
        })
    }

    /// Null markers recognized by default during text ingestion.
    pub const DEFAULT_NULL_TOKENS: &'static [&'static str] = &["", "null", "na", "n/a"];

    /// Interprets raw text the way delimited-text ingestion does: null
    /// markers, booleans, integers, floats, then timestamps, falling back
    /// to a plain string.
    pub fn parse_str(raw: &str) -> Value {
        let trimmed = raw.trim();
        if Self::DEFAULT_NULL_TOKENS
            .iter()
            .any(|t| trimmed.eq_ignore_ascii_case(t))
        {
            return Value::Null;
        }
        Self::parse_typed(trimmed)
    }

    /// As [`Value::parse_str`] but with null detection already done.
    pub(crate) fn parse_typed(trimmed: &str) -> Value {
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Value::Timestamp(ts);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            if let Some(ts) = d.and_hms_opt(0, 0, 0) {
                return Value::Timestamp(ts);
            }
        }
        Value::Str(trimmed.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => {
                serializer.collect_str(&ts.format("%Y-%m-%dT%H:%M:%S"))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
