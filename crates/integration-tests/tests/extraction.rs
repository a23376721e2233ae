//! Extraction Tests
//!
//! Modules built from configuration, refreshed against real files.

use meterd_core::application::extract::{extract_rows, extract_value, ParserConfig, PathSpec};
use meterd_core::domain::{Aggregation, Row, SemanticType, Value, ValueDescriptor};
use meterd_core::port::{MeasurementModule, ModuleSnapshot};
use meterd_core::AppError;
use meterd_infra_system::{build_module, ModuleConfig};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const VMSTAT: &str = "\
pgfault 120
pgmajfault 3
pgfault_extra 80
nr_free_pages 4096
";

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn module_from(json: serde_json::Value) -> Arc<dyn MeasurementModule> {
    let config: ModuleConfig = serde_json::from_value(json).unwrap();
    build_module(config).unwrap()
}

fn values(snapshot: ModuleSnapshot) -> Vec<(String, Value)> {
    match snapshot {
        ModuleSnapshot::Values(values) => values,
        ModuleSnapshot::Rows(rows) => panic!("expected values, got {} rows", rows.len()),
    }
}

/// Test 1: configured items aggregate and convert matches from the file
#[test]
fn test_file_value_items_from_config() {
    let file = write_temp(VMSTAT);
    let module = module_from(serde_json::json!({
        "name": "vmstat",
        "kind": "file_value",
        "object": file.path(),
        "use_text": true,
        "items": [
            {"name": "faults", "type": "counter64", "regex": "^pgfault\\w* (\\d+)$", "cdef": "sum"},
            {"name": "free", "type": "gauge", "regex": "^nr_free_pages (\\d+)$"},
            {"name": "names", "type": "string", "regex": "^(pg\\w+) ", "join": ","}
        ]
    }));

    module.update().unwrap();

    assert_eq!(
        values(module.snapshot()),
        vec![
            ("faults".to_string(), Value::UInt(200)),
            ("free".to_string(), Value::UInt(4096)),
            ("names".to_string(), Value::from("pgfault,pgmajfault,pgfault_extra")),
        ]
    );
}

/// Test 2: a conversion error is recoverable and keeps the stored value
#[test]
fn test_conversion_error_keeps_previous_value() {
    let file = write_temp("temperature 41\n");
    let module = module_from(serde_json::json!({
        "name": "sensor",
        "kind": "file_value",
        "object": file.path(),
        "use_text": true,
        "items": [{"name": "temp", "type": "integer", "regex": "temperature (\\S+)"}]
    }));

    module.update().unwrap();
    std::fs::write(file.path(), "temperature hot\n").unwrap();
    module.update().unwrap();

    assert_eq!(values(module.snapshot()), vec![("temp".to_string(), Value::Int(41))]);
}

/// Test 3: min over zero matches never replaces the stored value
#[test]
fn test_empty_match_set_keeps_previous_value() {
    let descriptor = ValueDescriptor::pattern(SemanticType::Integer, r"queue=(\d+)")
        .unwrap()
        .with_aggregation(Aggregation::Min)
        .with_value(Value::Int(2));

    assert_eq!(extract_value("no queues today", &descriptor), Value::Int(2));
    assert_eq!(extract_value("queue=9 queue=4", &descriptor), Value::Int(4));
}

/// Test 4: table modules expose one row per record
#[test]
fn test_file_table_rows_from_config() {
    let file = write_temp(
        "proc /proc proc rw 0 0\ntmpfs /run tmpfs rw,nosuid 0 0\n/dev/sda1 / ext4 rw 0 0\n",
    );
    let module = module_from(serde_json::json!({
        "name": "mounts",
        "kind": "file_table",
        "object": file.path(),
        "parser": {
            "type": "regex",
            "path": ["(?m)^(?P<device>\\S+) (?P<mount>\\S+)", "(?P<fs>\\S+) (?P<options>\\S+) \\d"]
        }
    }));

    module.update().unwrap();

    let ModuleSnapshot::Rows(rows) = module.snapshot() else {
        panic!("expected rows");
    };
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].get("mount").map(String::as_str), Some("/run"));
    assert_eq!(rows[2].get("fs").map(String::as_str), Some("ext4"));
    assert_eq!(rows[2].get("options").map(String::as_str), Some("rw"));
}

/// Test 5: rows come back in document order and a rescan repeats them
#[test]
fn test_rows_follow_document_order() {
    let text = "id=3 id=1 id=2";
    let config = ParserConfig::regex(PathSpec::Pattern(r"id=(?P<id>\d)".to_string()));

    let ids: Vec<String> = extract_rows(&config, text)
        .filter_map(|row: Row| row.get("id").cloned())
        .collect();
    assert_eq!(ids, vec!["3", "1", "2"]);
    assert_eq!(extract_rows(&config, text).count(), 3);
}

/// Test 6: a parser without a known type yields no rows at all
#[test]
fn test_unknown_parser_type_yields_no_rows() {
    let file = write_temp("a=1\n");
    let module = module_from(serde_json::json!({
        "name": "broken",
        "kind": "file_table",
        "object": file.path(),
        "parser": {"type": "xml", "path": "(?P<a>\\w)"}
    }));

    module.update().unwrap();
    assert!(module.snapshot().is_empty());
}

/// Test 7: unknown type tags are rejected when the module is built
#[test]
fn test_unknown_type_tag_rejected_at_build() {
    let config: ModuleConfig = serde_json::from_value(serde_json::json!({
        "name": "bad",
        "kind": "file_value",
        "object": "/dev/null",
        "use_text": true,
        "items": [{"name": "x", "type": "float", "regex": "(.)"}]
    }))
    .unwrap();

    match build_module(config) {
        Err(AppError::Config(msg)) => assert!(msg.contains("item 'x'"), "{}", msg),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(module) => panic!("module {} accepted an unknown type", module.name()),
    }
}
