// Value extraction - one typed value from raw text
use super::aggregate::aggregate;
use crate::application::escalation::log_recoverable;
use crate::domain::error::Result;
use crate::domain::{Aggregation, SemanticType, Value, ValueDescriptor, ValueSource, ValueTable};
use regex::Regex;
use tracing::{debug, info_span, warn};

/// Extract a typed value from `text` as described by `descriptor`
///
/// Never fails: without a pattern, on zero matches, or on a conversion or
/// aggregation error, the descriptor's last value is returned unchanged.
pub fn extract_value(text: &str, descriptor: &ValueDescriptor) -> Value {
    let ValueSource::PatternBased {
        pattern,
        aggregation,
        join,
    } = descriptor.source()
    else {
        return descriptor.value().clone();
    };

    let matches = find_all(pattern, text);
    if matches.is_empty() {
        warn!(pattern = %pattern.as_str(), "No new value found, keeping previous");
        return descriptor.value().clone();
    }

    match compute(&matches, descriptor.semantic(), *aggregation, join) {
        Ok(value) => {
            debug!(matches = matches.len(), value = %value, "Extracted value");
            value
        }
        Err(e) => {
            log_recoverable(&e, Some("value extraction"));
            descriptor.value().clone()
        }
    }
}

/// Re-extract item `name` of `table` from `text` and store the result
///
/// Returns the stored value, which is the previous one when nothing matched.
pub fn refresh_from_text(table: &ValueTable, name: &str, text: &str) -> Result<Value> {
    let _span = info_span!("extract", item = %name).entered();
    table.update(name, |descriptor| extract_value(text, descriptor))
}

fn compute(
    matches: &[String],
    semantic: SemanticType,
    aggregation: Option<Aggregation>,
    join: &str,
) -> Result<Value> {
    match aggregation {
        Some(agg) => aggregate(agg, matches, semantic),
        None => semantic.convert(&matches.join(join)),
    }
}

/// All non-overlapping matches
///
/// Without capture groups a match contributes its whole text; otherwise the
/// participating groups are concatenated in order (unmatched groups add "").
pub fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    if pattern.captures_len() == 1 {
        return pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
    }

    pattern
        .captures_iter(text)
        .map(|caps| {
            caps.iter()
                .skip(1)
                .map(|g| g.map_or("", |m| m.as_str()))
                .collect::<String>()
        })
        .collect()
}
