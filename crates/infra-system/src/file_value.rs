// File value module - stat fields, content digest and extracted text values
//
// The digest item is `file_sha256` (hex SHA-256). Agents that polled the
// older `file_md5` item must switch to the new name.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, Metadata};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use meterd_core::application::escalation::log_recoverable;
use meterd_core::application::extract::refresh_from_text;
use meterd_core::domain::{DomainError, SemanticType, Value, ValueDescriptor, ValueTable};
use meterd_core::port::{MeasurementModule, ModuleSnapshot};
use meterd_core::Result;

use crate::config::ItemConfig;

/// Item holding the hex SHA-256 of the file
pub const HASH_ITEM: &str = "file_sha256";

const HASH_BLOCK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileValueConfig {
    /// File to observe
    pub object: PathBuf,
    #[serde(default)]
    pub use_stat: bool,
    #[serde(default)]
    pub use_text: bool,
    #[serde(default)]
    pub use_hash: bool,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// Measures one file
pub struct FileValueModule {
    name: String,
    config: FileValueConfig,
    table: ValueTable,
}

impl FileValueModule {
    /// Declare stat items (if enabled), user items, then the hash item
    ///
    /// # Errors
    /// AppError::Config if an item is malformed or stat is requested on a
    /// platform without POSIX metadata
    pub fn new(name: impl Into<String>, config: FileValueConfig) -> Result<Self> {
        let table = ValueTable::new();

        if config.use_stat {
            for (item, descriptor) in stat_items(&config.object)? {
                table.declare(item, descriptor);
            }
        }
        for item in &config.items {
            table.declare(item.name.clone(), item.descriptor()?);
        }
        if config.use_hash {
            table.declare(HASH_ITEM, ValueDescriptor::direct(SemanticType::String));
        }

        Ok(Self {
            name: name.into(),
            config,
            table,
        })
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    fn refresh_stat(&self, item: &str, meta: &Metadata) -> Result<()> {
        let raw = stat_field(meta, item);
        self.table.update(item, |descriptor| match descriptor.derive(raw) {
            Ok(value) => value,
            Err(e) => {
                log_recoverable(&e, Some(item));
                descriptor.value().clone()
            }
        })?;
        Ok(())
    }
}

impl MeasurementModule for FileValueModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self) -> Result<()> {
        let object = &self.config.object;

        let info = if self.config.use_stat {
            let meta = fs::symlink_metadata(object)?;
            debug!(object = %object.display(), len = meta.len(), "Read file metadata");
            Some(meta)
        } else {
            None
        };

        let text = if self.config.use_text {
            let bytes = fs::read(object)?;
            debug!(object = %object.display(), bytes = bytes.len(), "Read file text");
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };

        let hash = if self.config.use_hash {
            let digest = sha256_file(object)?;
            debug!(object = %object.display(), digest = %digest, "Computed digest");
            Some(digest)
        } else {
            None
        };

        for item in self.table.names() {
            let derived = self
                .table
                .descriptor(&item)
                .map(|d| d.is_derived())
                .unwrap_or(false);

            if let (true, Some(meta)) = (derived, &info) {
                self.refresh_stat(&item, meta)?;
            } else if item == HASH_ITEM {
                if let Some(digest) = &hash {
                    self.table.set(&item, digest.clone())?;
                }
            } else if let Some(text) = &text {
                refresh_from_text(&self.table, &item, text)?;
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> ModuleSnapshot {
        ModuleSnapshot::Values(self.table.snapshot())
    }
}

/// Hex SHA-256 of a file, read in blocks
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Human name of a file type from `st_mode`
pub fn file_kind(mode: u32) -> Option<&'static str> {
    match mode & 0o170000 {
        0o040000 => Some("directory"),
        0o020000 => Some("character device"),
        0o060000 => Some("block device"),
        0o100000 => Some("regular file"),
        0o010000 => Some("named pipe"),
        0o120000 => Some("symbolic link"),
        0o140000 => Some("socket"),
        _ => None,
    }
}

fn mode_of(raw: &Value) -> std::result::Result<u32, DomainError> {
    raw.as_i64()
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| DomainError::Derivation(format!("not a file mode: {:?}", raw)))
}

#[cfg(unix)]
fn stat_items(object: &Path) -> Result<Vec<(&'static str, ValueDescriptor)>> {
    use SemanticType::{Integer, Integer64, String as Text};

    let object_name = object.display().to_string();
    let identity = |t: SemanticType| ValueDescriptor::derived(t, |raw| Ok(raw));

    Ok(vec![
        (
            "file_name",
            ValueDescriptor::derived(Text, move |_| Ok(Value::Str(object_name.clone()))),
        ),
        (
            "file_type",
            ValueDescriptor::derived(Text, |raw| {
                let mode = mode_of(&raw)?;
                file_kind(mode)
                    .map(Value::from)
                    .ok_or_else(|| DomainError::Derivation(format!("unknown file type {:o}", mode)))
            }),
        ),
        (
            "file_mode",
            ValueDescriptor::derived(Text, |raw| {
                Ok(Value::Str(format!("{:04o}", mode_of(&raw)? & 0o7777)))
            }),
        ),
        ("file_atime", identity(Integer64)),
        ("file_mtime", identity(Integer64)),
        ("file_ctime", identity(Integer64)),
        ("file_nlink", identity(Integer)),
        ("file_size", identity(Integer64)),
        ("file_ino", identity(Integer64)),
        ("file_uid", identity(Integer)),
        ("file_gid", identity(Integer)),
    ])
}

#[cfg(not(unix))]
fn stat_items(_object: &Path) -> Result<Vec<(&'static str, ValueDescriptor)>> {
    Err(meterd_core::AppError::Config(
        "use_stat requires POSIX file metadata".to_string(),
    ))
}

/// Raw stat input for `item`; items without a matching field get `st_mode`
#[cfg(unix)]
fn stat_field(meta: &Metadata, item: &str) -> Value {
    use std::os::unix::fs::MetadataExt;

    match item.strip_prefix("file_").unwrap_or(item) {
        "atime" => Value::Int(meta.atime()),
        "mtime" => Value::Int(meta.mtime()),
        "ctime" => Value::Int(meta.ctime()),
        "nlink" => Value::UInt(meta.nlink()),
        "size" => Value::UInt(meta.size()),
        "ino" => Value::UInt(meta.ino()),
        "uid" => Value::UInt(meta.uid() as u64),
        "gid" => Value::UInt(meta.gid() as u64),
        _ => Value::UInt(meta.mode() as u64),
    }
}

#[cfg(not(unix))]
fn stat_field(meta: &Metadata, _item: &str) -> Value {
    Value::UInt(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterd_core::AppError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_text_items_extracted() {
        let file = write_temp("MemTotal: 2048 kB\nMemFree: 512 kB\n");
        let config = FileValueConfig {
            object: file.path().to_path_buf(),
            use_text: true,
            items: vec![
                ItemConfig::new("mem_total", "integer").with_regex(r"^MemTotal:\s+(\d+)"),
                ItemConfig::new("mem_lines", "integer")
                    .with_regex(r"^Mem\w+:")
                    .with_cdef("len"),
            ],
            ..Default::default()
        };

        let module = FileValueModule::new("meminfo", config).unwrap();
        module.update().unwrap();

        assert_eq!(module.table().get("mem_total"), Some(Value::Int(2048)));
        assert_eq!(module.table().get("mem_lines"), Some(Value::Int(2)));
    }

    #[test]
    fn test_text_item_keeps_value_when_pattern_disappears() {
        let file = write_temp("count=4\n");
        let config = FileValueConfig {
            object: file.path().to_path_buf(),
            use_text: true,
            items: vec![ItemConfig::new("count", "integer").with_regex(r"count=(\d+)")],
            ..Default::default()
        };
        let module = FileValueModule::new("counter", config).unwrap();
        module.update().unwrap();

        fs::write(file.path(), "garbled\n").unwrap();
        module.update().unwrap();

        assert_eq!(module.table().get("count"), Some(Value::Int(4)));
    }

    #[test]
    fn test_hash_item() {
        let file = write_temp("abc");
        let config = FileValueConfig {
            object: file.path().to_path_buf(),
            use_hash: true,
            ..Default::default()
        };
        let module = FileValueModule::new("digest", config).unwrap();
        module.update().unwrap();

        assert_eq!(module.table().names(), vec!["file_sha256".to_string()]);
        assert_eq!(
            module.table().get(HASH_ITEM),
            Some(Value::from(
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
            ))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_stat_items() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_temp("12345");
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o640)).unwrap();

        let config = FileValueConfig {
            object: file.path().to_path_buf(),
            use_stat: true,
            ..Default::default()
        };
        let module = FileValueModule::new("stat", config).unwrap();
        module.update().unwrap();

        let table = module.table();
        assert_eq!(table.names().len(), 11);
        assert_eq!(table.names()[0], "file_name");
        assert_eq!(
            table.get("file_name"),
            Some(Value::Str(file.path().display().to_string()))
        );
        assert_eq!(table.get("file_type"), Some(Value::from("regular file")));
        assert_eq!(table.get("file_mode"), Some(Value::from("0640")));
        assert_eq!(table.get("file_size"), Some(Value::Int(5)));
        assert_eq!(table.get("file_nlink"), Some(Value::Int(1)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = FileValueConfig {
            object: PathBuf::from("/nonexistent/meterd-test"),
            use_text: true,
            ..Default::default()
        };
        let module = FileValueModule::new("missing", config).unwrap();
        assert!(matches!(module.update(), Err(AppError::Io(_))));
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(file_kind(0o040755), Some("directory"));
        assert_eq!(file_kind(0o100644), Some("regular file"));
        assert_eq!(file_kind(0o000644), None);
    }
}
