// Module configuration shared by all system modules
use meterd_core::domain::ValueDescriptor;
use meterd_core::{AppError, Result};
use serde::{Deserialize, Serialize};

use crate::file_table::FileTableConfig;
use crate::file_value::FileValueConfig;
use crate::service_status::ServiceStatusConfig;

/// One configured item of a value module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub join: Option<String>,
    /// Aggregation tag (min, max, sum, len, avg)
    #[serde(default)]
    pub cdef: Option<String>,
}

impl ItemConfig {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            regex: None,
            join: None,
            cdef: None,
        }
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn with_cdef(mut self, cdef: impl Into<String>) -> Self {
        self.cdef = Some(cdef.into());
        self
    }

    /// Build the item's descriptor
    ///
    /// # Errors
    /// AppError::Config on an unknown type tag or an invalid pattern
    pub fn descriptor(&self) -> Result<ValueDescriptor> {
        ValueDescriptor::from_tags(
            &self.type_tag,
            self.regex.as_deref(),
            self.join.as_deref(),
            self.cdef.as_deref(),
        )
        .map_err(|e| AppError::Config(format!("item '{}': {}", self.name, e)))
    }
}

/// Kind-specific module options
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleKind {
    FileValue(FileValueConfig),
    FileTable(FileTableConfig),
    ServiceStatus(ServiceStatusConfig),
}

/// A configured measurement module
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: ModuleKind,
}
