// Aggregation table - fixed reducers over all pattern matches
use crate::domain::error::{DomainError, Result};
use crate::domain::{Aggregation, SemanticType, Value};

type Reducer = fn(&[String], SemanticType) -> Result<Value>;

/// Process-wide, immutable: one reducer per aggregation tag
static REDUCERS: [(Aggregation, Reducer); 5] = [
    (Aggregation::Min, reduce_min),
    (Aggregation::Max, reduce_max),
    (Aggregation::Sum, reduce_sum),
    (Aggregation::Len, reduce_len),
    (Aggregation::Avg, reduce_avg),
];

/// Apply `aggregation` to raw matches converted to `semantic`
pub fn aggregate(
    aggregation: Aggregation,
    matches: &[String],
    semantic: SemanticType,
) -> Result<Value> {
    let reducer = REDUCERS
        .iter()
        .find(|(agg, _)| *agg == aggregation)
        .map(|(_, reducer)| *reducer)
        .ok_or_else(|| DomainError::Internal(format!("no reducer for {}", aggregation)))?;
    reducer(matches, semantic)
}

fn convert_all(matches: &[String], semantic: SemanticType) -> Result<Vec<Value>> {
    matches.iter().map(|m| semantic.convert(m)).collect()
}

fn numeric(value: &Value) -> Option<i128> {
    match value {
        Value::Int(n) => Some(*n as i128),
        Value::UInt(n) => Some(*n as i128),
        _ => None,
    }
}

/// Convert a wide intermediate back into the semantic type
fn narrow(total: i128, aggregation: Aggregation, semantic: SemanticType) -> Result<Value> {
    semantic
        .convert(&total.to_string())
        .map_err(|_| DomainError::Overflow(aggregation.as_str().to_string()))
}

fn require_numeric(aggregation: Aggregation, semantic: SemanticType) -> Result<()> {
    if semantic.is_numeric() {
        Ok(())
    } else {
        Err(DomainError::UnsupportedAggregation {
            aggregation: aggregation.as_str().to_string(),
            semantic: semantic.as_str().to_string(),
        })
    }
}

fn checked_total(values: &[Value], aggregation: Aggregation) -> Result<i128> {
    values.iter().try_fold(0i128, |acc, v| {
        numeric(v)
            .and_then(|n| acc.checked_add(n))
            .ok_or_else(|| DomainError::Overflow(aggregation.as_str().to_string()))
    })
}

fn extreme(
    matches: &[String],
    semantic: SemanticType,
    aggregation: Aggregation,
    want_max: bool,
) -> Result<Value> {
    let values = convert_all(matches, semantic)?;
    let mut iter = values.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| DomainError::EmptyAggregation(aggregation.as_str().to_string()))?;

    // All values share one semantic type, so they are mutually comparable
    Ok(iter.fold(first, |best, v| {
        let replace = if want_max { v > best } else { v < best };
        if replace {
            v
        } else {
            best
        }
    }))
}

fn reduce_min(matches: &[String], semantic: SemanticType) -> Result<Value> {
    extreme(matches, semantic, Aggregation::Min, false)
}

fn reduce_max(matches: &[String], semantic: SemanticType) -> Result<Value> {
    extreme(matches, semantic, Aggregation::Max, true)
}

fn reduce_sum(matches: &[String], semantic: SemanticType) -> Result<Value> {
    require_numeric(Aggregation::Sum, semantic)?;
    let values = convert_all(matches, semantic)?;
    let total = checked_total(&values, Aggregation::Sum)?;
    narrow(total, Aggregation::Sum, semantic)
}

/// Match count; numeric items take the count in their own type
fn reduce_len(matches: &[String], semantic: SemanticType) -> Result<Value> {
    let count = Value::UInt(matches.len() as u64);
    if semantic.is_numeric() {
        semantic.coerce(count)
    } else {
        Ok(count)
    }
}

fn reduce_avg(matches: &[String], semantic: SemanticType) -> Result<Value> {
    require_numeric(Aggregation::Avg, semantic)?;
    if matches.is_empty() {
        return narrow(0, Aggregation::Avg, semantic);
    }
    let values = convert_all(matches, semantic)?;
    let total = checked_total(&values, Aggregation::Avg)?;
    narrow(total.div_euclid(values.len() as i128), Aggregation::Avg, semantic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_integer_aggregations() {
        let m = strings(&["3", "7", "5"]);
        let t = SemanticType::Integer;
        assert_eq!(aggregate(Aggregation::Sum, &m, t).unwrap(), Value::Int(15));
        assert_eq!(aggregate(Aggregation::Max, &m, t).unwrap(), Value::Int(7));
        assert_eq!(aggregate(Aggregation::Min, &m, t).unwrap(), Value::Int(3));
        assert_eq!(aggregate(Aggregation::Len, &m, t).unwrap(), Value::Int(3));
        assert_eq!(aggregate(Aggregation::Avg, &m, t).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_avg_floors() {
        let m = strings(&["1", "2"]);
        assert_eq!(
            aggregate(Aggregation::Avg, &m, SemanticType::Integer).unwrap(),
            Value::Int(1)
        );
        let m = strings(&["-1", "-2"]);
        assert_eq!(
            aggregate(Aggregation::Avg, &m, SemanticType::Integer64).unwrap(),
            Value::Int(-2)
        );
    }

    #[test]
    fn test_empty_inputs() {
        let none: Vec<String> = Vec::new();
        assert_eq!(
            aggregate(Aggregation::Avg, &none, SemanticType::Gauge).unwrap(),
            Value::UInt(0)
        );
        assert_eq!(
            aggregate(Aggregation::Sum, &none, SemanticType::Integer).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            aggregate(Aggregation::Len, &none, SemanticType::Counter).unwrap(),
            Value::UInt(0)
        );
        assert_eq!(
            aggregate(Aggregation::Max, &none, SemanticType::Integer),
            Err(DomainError::EmptyAggregation("max".to_string()))
        );
    }

    #[test]
    fn test_string_min_max_len() {
        let m = strings(&["eth1", "eth0", "lo"]);
        let t = SemanticType::String;
        assert_eq!(aggregate(Aggregation::Min, &m, t).unwrap(), Value::from("eth0"));
        assert_eq!(aggregate(Aggregation::Max, &m, t).unwrap(), Value::from("lo"));
        assert_eq!(aggregate(Aggregation::Len, &m, t).unwrap(), Value::UInt(3));
        assert!(matches!(
            aggregate(Aggregation::Sum, &m, t),
            Err(DomainError::UnsupportedAggregation { .. })
        ));
    }

    #[test]
    fn test_len_ignores_item_type() {
        let m = strings(&["10.0.0.1", "10.0.0.2"]);
        assert_eq!(
            aggregate(Aggregation::Len, &m, SemanticType::IpAddress).unwrap(),
            Value::UInt(2)
        );
        assert!(matches!(
            aggregate(Aggregation::Max, &m, SemanticType::IpAddress),
            Ok(Value::Ip(_))
        ));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let m = strings(&["2147483647", "1"]);
        assert_eq!(
            aggregate(Aggregation::Sum, &m, SemanticType::Integer),
            Err(DomainError::Overflow("sum".to_string()))
        );
        assert_eq!(
            aggregate(Aggregation::Sum, &m, SemanticType::Integer64).unwrap(),
            Value::Int(2_147_483_648)
        );
    }

    #[test]
    fn test_unconvertible_match_fails() {
        let m = strings(&["3", "x"]);
        assert!(matches!(
            aggregate(Aggregation::Sum, &m, SemanticType::Integer),
            Err(DomainError::Conversion { .. })
        ));
    }
}
