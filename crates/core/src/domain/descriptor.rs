// Value Descriptor - how one named measurement is computed

use super::error::{DomainError, Result};
use super::value::{SemanticType, Value};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::warn;

/// Reduction applied over all matches of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Min,
    Max,
    Sum,
    Len,
    Avg,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Sum,
        Aggregation::Len,
        Aggregation::Avg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Sum => "sum",
            Aggregation::Len => "len",
            Aggregation::Avg => "avg",
        }
    }

    /// Look up a tag; unrecognized tags yield `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == tag)
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derivation from a raw typed input to the stored value
pub type DeriveFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Where a descriptor's value comes from
#[derive(Clone)]
pub enum ValueSource {
    /// Set directly by the owning module
    Direct,
    /// Computed from a raw input by a derivation function
    Derived(DeriveFn),
    /// Extracted from text by pattern
    PatternBased {
        pattern: Regex,
        aggregation: Option<Aggregation>,
        join: String,
    },
}

impl std::fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Direct => write!(f, "Direct"),
            ValueSource::Derived(_) => write!(f, "Derived(..)"),
            ValueSource::PatternBased {
                pattern,
                aggregation,
                join,
            } => f
                .debug_struct("PatternBased")
                .field("pattern", &pattern.as_str())
                .field("aggregation", aggregation)
                .field("join", join)
                .finish(),
        }
    }
}

/// Compile a pattern with dot-matches-newline and multi-line anchors
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .dot_matches_new_line(true)
        .multi_line(true)
        .build()
        .map_err(|e| DomainError::InvalidPattern(e.to_string()))
}

/// Metadata and last good value of one measurement item
#[derive(Debug, Clone)]
pub struct ValueDescriptor {
    semantic: SemanticType,
    source: ValueSource,
    value: Value,
}

impl ValueDescriptor {
    pub fn direct(semantic: SemanticType) -> Self {
        Self {
            semantic,
            source: ValueSource::Direct,
            value: Value::Empty,
        }
    }

    pub fn derived<F>(semantic: SemanticType, derive: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            semantic,
            source: ValueSource::Derived(Arc::new(derive)),
            value: Value::Empty,
        }
    }

    /// Pattern-based descriptor with no aggregation and an empty join separator
    pub fn pattern(semantic: SemanticType, pattern: &str) -> Result<Self> {
        Ok(Self {
            semantic,
            source: ValueSource::PatternBased {
                pattern: compile_pattern(pattern)?,
                aggregation: None,
                join: String::new(),
            },
            value: Value::Empty,
        })
    }

    /// Build a descriptor from configuration tags
    ///
    /// An unknown `aggregation` tag is logged and the descriptor falls back
    /// to joining matches. `join` and `aggregation` are ignored without a pattern.
    pub fn from_tags(
        type_tag: &str,
        pattern: Option<&str>,
        join: Option<&str>,
        aggregation: Option<&str>,
    ) -> Result<Self> {
        let semantic: SemanticType = type_tag.parse()?;
        let Some(pattern) = pattern else {
            return Ok(Self::direct(semantic));
        };

        let mut descriptor = Self::pattern(semantic, pattern)?;
        if let Some(join) = join {
            descriptor = descriptor.with_join(join);
        }
        if let Some(tag) = aggregation {
            match Aggregation::from_tag(tag) {
                Some(agg) => descriptor = descriptor.with_aggregation(agg),
                None => warn!(aggregation = %tag, "Unrecognized aggregation, joining matches"),
            }
        }
        Ok(descriptor)
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        if let ValueSource::PatternBased {
            aggregation: slot, ..
        } = &mut self.source
        {
            *slot = Some(aggregation);
        }
        self
    }

    pub fn with_join(mut self, separator: impl Into<String>) -> Self {
        if let ValueSource::PatternBased { join, .. } = &mut self.source {
            *join = separator.into();
        }
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn semantic(&self) -> SemanticType {
        self.semantic
    }

    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    /// Last successfully computed value (fallback)
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.source, ValueSource::Derived(_))
    }

    /// Apply the derivation function and coerce its output to the semantic type
    ///
    /// Non-derived descriptors coerce the raw input directly.
    pub fn derive(&self, raw: Value) -> Result<Value> {
        let derived = match &self.source {
            ValueSource::Derived(f) => f(raw)?,
            _ => raw,
        };
        self.semantic.coerce(derived)
    }
}
