// File table module - rows extracted from a file by a row parser
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use meterd_core::application::extract::{extract_rows, ParserConfig};
use meterd_core::domain::{Row, RowTable};
use meterd_core::port::{MeasurementModule, ModuleSnapshot};
use meterd_core::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileTableConfig {
    /// File to parse
    pub object: PathBuf,
    pub parser: ParserConfig,
}

pub struct FileTableModule {
    name: String,
    config: FileTableConfig,
    rows: RowTable,
}

impl FileTableModule {
    pub fn new(name: impl Into<String>, config: FileTableConfig) -> Self {
        Self {
            name: name.into(),
            config,
            rows: RowTable::new(),
        }
    }

    pub fn rows(&self) -> &RowTable {
        &self.rows
    }
}

impl MeasurementModule for FileTableModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self) -> Result<()> {
        let bytes = fs::read(&self.config.object)?;
        let text = String::from_utf8_lossy(&bytes);

        let rows: Vec<Row> = extract_rows(&self.config.parser, &text).collect();
        debug!(
            module = %self.name,
            object = %self.config.object.display(),
            rows = rows.len(),
            "Parsed table"
        );
        self.rows.replace(rows);
        Ok(())
    }

    fn snapshot(&self) -> ModuleSnapshot {
        ModuleSnapshot::Rows(self.rows.rows())
    }
}
