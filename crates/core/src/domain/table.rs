// Value containers shared between refresh routines and readers

use super::descriptor::ValueDescriptor;
use super::error::{DomainError, Result};
use super::value::Value;
use crate::port::time_provider::{SystemTimeProvider, TimeProvider};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// One extracted table row: capture group name -> captured text
pub type Row = BTreeMap<String, String>;

struct Entry {
    name: String,
    descriptor: ValueDescriptor,
    updated_at: Option<i64>,
}

/// Ordered mapping of item name -> descriptor
///
/// Cloning shares the underlying storage, so a THREAD-mode refresh routine
/// can hold a clone and write while other threads read.
#[derive(Clone)]
pub struct ValueTable {
    entries: Arc<RwLock<Vec<Entry>>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::with_time_provider(Arc::new(SystemTimeProvider))
    }

    pub fn with_time_provider(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            time_provider,
        }
    }

    /// Declare an item, replacing any previous descriptor under the same name
    pub fn declare(&self, name: impl Into<String>, descriptor: ValueDescriptor) {
        let name = name.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.descriptor = descriptor;
                entry.updated_at = None;
            }
            None => entries.push(Entry {
                name,
                descriptor,
                updated_at: None,
            }),
        }
    }

    /// Item names in declaration order
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.descriptor.value().clone())
    }

    pub fn descriptor(&self, name: &str) -> Option<ValueDescriptor> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.descriptor.clone())
    }

    /// Epoch ms of the last write to `name`
    pub fn updated_at(&self, name: &str) -> Option<i64> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.updated_at)
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.update(name, |_| value.into()).map(|_| ())
    }

    /// Compute a new value from the current descriptor and store it
    ///
    /// The write lock is held for the duration of `compute`.
    pub fn update<F>(&self, name: &str, compute: F) -> Result<Value>
    where
        F: FnOnce(&ValueDescriptor) -> Value,
    {
        let now = self.time_provider.now_millis();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| DomainError::UnknownItem(name.to_string()))?;

        let value = compute(&entry.descriptor);
        entry.descriptor.set_value(value.clone());
        entry.updated_at = Some(now);
        Ok(value)
    }

    /// (name, value) pairs in declaration order
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|e| (e.name.clone(), e.descriptor.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows produced by structured extraction, replaced wholesale on refresh
#[derive(Clone, Default)]
pub struct RowTable {
    rows: Arc<RwLock<Vec<Row>>>,
}

impl RowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, rows: Vec<Row>) {
        *self.rows.write().unwrap_or_else(PoisonError::into_inner) = rows;
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::SemanticType;
    use crate::port::time_provider::mocks::FixedTimeProvider;

    #[test]
    fn test_declaration_order_is_preserved() {
        let table = ValueTable::new();
        table.declare("zeta", ValueDescriptor::direct(SemanticType::String));
        table.declare("alpha", ValueDescriptor::direct(SemanticType::String));
        table.declare("zeta", ValueDescriptor::direct(SemanticType::Integer));

        assert_eq!(table.names(), vec!["zeta", "alpha"]);
        assert_eq!(
            table.descriptor("zeta").unwrap().semantic(),
            SemanticType::Integer
        );
    }

    #[test]
    fn test_set_stamps_update_time() {
        let table = ValueTable::with_time_provider(Arc::new(FixedTimeProvider::new(5000)));
        table.declare("size", ValueDescriptor::direct(SemanticType::Integer));

        assert_eq!(table.updated_at("size"), None);
        table.set("size", Value::Int(10)).unwrap();

        assert_eq!(table.get("size"), Some(Value::Int(10)));
        assert_eq!(table.updated_at("size"), Some(5000));
    }

    #[test]
    fn test_set_unknown_item_fails() {
        let table = ValueTable::new();
        assert_eq!(
            table.set("missing", Value::Int(1)),
            Err(DomainError::UnknownItem("missing".to_string()))
        );
    }

    #[test]
    fn test_clones_share_storage() {
        let table = ValueTable::new();
        table.declare("status", ValueDescriptor::direct(SemanticType::Integer));

        let writer = table.clone();
        std::thread::spawn(move || writer.set("status", Value::Int(3)).unwrap())
            .join()
            .unwrap();

        assert_eq!(table.snapshot(), vec![("status".to_string(), Value::Int(3))]);
    }

    #[test]
    fn test_row_table_replace() {
        let rows = RowTable::new();
        assert!(rows.is_empty());

        let mut row = Row::new();
        row.insert("name".to_string(), "eth0".to_string());
        rows.replace(vec![row.clone(), row]);
        assert_eq!(rows.len(), 2);

        rows.replace(Vec::new());
        assert!(rows.is_empty());
    }
}
