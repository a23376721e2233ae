// Semantic types and typed measurement values

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Semantic type tag of a measurement item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Integer,
    Integer64,
    Unsigned,
    Counter,
    Counter64,
    Gauge,
    TimeTicks,
    IpAddress,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Integer64 => "integer64",
            SemanticType::Unsigned => "unsigned",
            SemanticType::Counter => "counter",
            SemanticType::Counter64 => "counter64",
            SemanticType::Gauge => "gauge",
            SemanticType::TimeTicks => "timeticks",
            SemanticType::IpAddress => "ipaddress",
        }
    }

    /// Convert raw text into a value of this type
    ///
    /// Numeric and address types ignore surrounding whitespace and are
    /// range-checked against the width of the tag.
    pub fn convert(&self, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        match self {
            SemanticType::String => Ok(Value::Str(text.to_string())),
            SemanticType::Integer => self.parse_signed(trimmed, i32::MIN as i64, i32::MAX as i64),
            SemanticType::Integer64 => self.parse_signed(trimmed, i64::MIN, i64::MAX),
            SemanticType::Counter64 => self.parse_unsigned(trimmed, u64::MAX),
            SemanticType::Unsigned
            | SemanticType::Counter
            | SemanticType::Gauge
            | SemanticType::TimeTicks => self.parse_unsigned(trimmed, u32::MAX as u64),
            SemanticType::IpAddress => Ipv4Addr::from_str(trimmed)
                .map(Value::Ip)
                .map_err(|e| self.conversion_error(text, e.to_string())),
        }
    }

    /// Coerce an already-typed value (e.g. the output of a derivation)
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (_, Value::Empty) => Ok(Value::Empty),
            (SemanticType::String, Value::Str(s)) => Ok(Value::Str(s)),
            (SemanticType::String, other) => Ok(Value::Str(other.to_string())),
            (_, Value::Str(s)) => self.convert(&s),
            (_, other) => self.convert(&other.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, SemanticType::String | SemanticType::IpAddress)
    }

    fn parse_signed(&self, text: &str, min: i64, max: i64) -> Result<Value> {
        let n: i64 = text
            .parse()
            .map_err(|e: std::num::ParseIntError| self.conversion_error(text, e.to_string()))?;
        if n < min || n > max {
            return Err(self.conversion_error(text, "out of range".to_string()));
        }
        Ok(Value::Int(n))
    }

    fn parse_unsigned(&self, text: &str, max: u64) -> Result<Value> {
        let n: u64 = text
            .parse()
            .map_err(|e: std::num::ParseIntError| self.conversion_error(text, e.to_string()))?;
        if n > max {
            return Err(self.conversion_error(text, "out of range".to_string()));
        }
        Ok(Value::UInt(n))
    }

    fn conversion_error(&self, text: &str, reason: String) -> DomainError {
        DomainError::Conversion {
            text: text.to_string(),
            semantic: self.as_str().to_string(),
            reason,
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "octetstring" => Ok(SemanticType::String),
            "integer" | "integer32" => Ok(SemanticType::Integer),
            "integer64" => Ok(SemanticType::Integer64),
            "unsigned" | "unsigned32" => Ok(SemanticType::Unsigned),
            "counter" | "counter32" => Ok(SemanticType::Counter),
            "counter64" => Ok(SemanticType::Counter64),
            "gauge" | "gauge32" => Ok(SemanticType::Gauge),
            "timeticks" => Ok(SemanticType::TimeTicks),
            "ipaddress" => Ok(SemanticType::IpAddress),
            other => Err(DomainError::UnknownType(other.to_string())),
        }
    }
}

/// A typed measurement value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Never computed
    #[default]
    Empty,
    Str(String),
    Int(i64),
    UInt(u64),
    Ip(Ipv4Addr),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
            (Value::Ip(a), Value::Ip(b)) => Some(a.cmp(b)),
            (Value::Empty, Value::Empty) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Ip(ip) => write!(f, "{}", ip),
        }
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

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}
