//! Mapping file persistence
//!
//! Loading fails open: a missing, empty, unreadable or malformed file yields an
//! empty table so the controller always starts. Saving rewrites the whole file
//! through a temp file and rename, so a crash mid-write leaves either the old
//! or the new table on disk, never a truncated one.

use super::{MappingEntry, MappingTable};
use crate::error::{Error, Result};
use jukebox_common::MappingRecord;
use serde_yaml::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const MAX_TEMP_ATTEMPTS: u32 = 100;

/// Persistence backend for the mapping table
///
/// Both methods block; callers run them on the storage worker, never on the
/// dispatcher.
pub trait MappingStore: Send + Sync + 'static {
    /// Read the full table. Never fails: problems are logged and yield an empty table.
    fn load(&self) -> MappingTable;

    /// Overwrite the persisted table with `table`
    fn save(&self, table: &MappingTable) -> Result<()>;
}

/// YAML mapping file
#[derive(Debug, Clone)]
pub struct YamlMappingStore {
    path: PathBuf,
}

impl YamlMappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MappingStore for YamlMappingStore {
    fn load(&self) -> MappingTable {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "Mapping file not found at {}, starting with empty map",
                    self.path.display()
                );
                return MappingTable::new();
            }
            Err(err) => {
                error!("Error reading mapping file {}: {}", self.path.display(), err);
                return MappingTable::new();
            }
        };

        let table = parse_table(&content, &self.path);
        info!("Loaded {} mappings from {}", table.len(), self.path.display());
        table
    }

    fn save(&self, table: &MappingTable) -> Result<()> {
        let content = serde_yaml::to_string(&table.to_records()).map_err(|err| {
            Error::MappingFile(format!("Failed to serialize mappings: {}", err))
        })?;
        write_atomic(&self.path, content.as_bytes())?;
        info!("Saved {} mappings to {}", table.len(), self.path.display());
        Ok(())
    }
}

/// Decode mapping file content
///
/// Malformed YAML and non-mapping documents yield an empty table. Inside a
/// valid mapping, entries of an unsupported shape are skipped individually.
pub fn parse_table(content: &str, path: &Path) -> MappingTable {
    if content.trim().is_empty() {
        debug!("Mapping file {} is empty", path.display());
        return MappingTable::new();
    }

    let document: Value = match serde_yaml::from_str(content) {
        Ok(document) => document,
        Err(err) => {
            error!("Error reading mapping file {}: {}", path.display(), err);
            return MappingTable::new();
        }
    };

    let mapping = match document {
        Value::Mapping(mapping) => mapping,
        Value::Null => return MappingTable::new(),
        other => {
            warn!(
                "Mapping file {} is not a valid dictionary (found {})",
                path.display(),
                value_kind(&other)
            );
            return MappingTable::new();
        }
    };

    mapping
        .into_iter()
        .filter_map(|(key, value)| {
            let Some(tag) = scalar_string(&key).filter(|tag| !tag.is_empty()) else {
                warn!("Skipping mapping with unsupported key ({})", value_kind(&key));
                return None;
            };
            match decode_entry(value) {
                Ok(entry) => Some((tag, entry)),
                Err(reason) => {
                    warn!("Skipping mapping for tag {}: {}", tag, reason);
                    None
                }
            }
        })
        .collect()
}

fn decode_entry(value: Value) -> std::result::Result<MappingEntry, String> {
    match value {
        Value::Mapping(_) => serde_yaml::from_value::<MappingRecord>(value)
            .map(MappingEntry::Structured)
            .map_err(|err| format!("invalid record: {}", err)),
        other => match scalar_string(&other) {
            Some(name) => Ok(MappingEntry::Legacy(name)),
            None => Err(format!("unsupported value ({})", value_kind(&other))),
        },
    }
}

/// String form of a YAML scalar; unquoted tag ids like `12345` parse as numbers
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Replace `path` with `content` via a sibling temp file
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::MappingFile(format!("Invalid mapping file path: {}", path.display()))
        })?;

    fs::create_dir_all(&parent).map_err(|err| {
        Error::MappingFile(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            err
        ))
    })?;

    let (mut file, temp_path) = create_temp_file(&parent, file_name)?;

    #[cfg(unix)]
    {
        if let Ok(metadata) = fs::metadata(path) {
            if let Err(err) = fs::set_permissions(&temp_path, metadata.permissions()) {
                let _ = fs::remove_file(&temp_path);
                return Err(Error::MappingFile(format!(
                    "Failed to set temp mapping file permissions: {}",
                    err
                )));
            }
        }
    }

    if let Err(err) = file.write_all(content).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::MappingFile(format!(
            "Failed to write temp mapping file {}: {}",
            temp_path.display(),
            err
        )));
    }
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::MappingFile(format!(
            "Failed to replace mapping file {}: {}",
            path.display(),
            err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(&parent).and_then(|dir| dir.sync_all()) {
            warn!("Mapping directory sync failed: {}", err);
        }
    }

    Ok(())
}

fn create_temp_file(parent: &Path, file_name: &str) -> Result<(fs::File, PathBuf)> {
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let temp_path = parent.join(format!(
            ".{}.tmp.{}.{}",
            file_name,
            std::process::id(),
            attempt
        ));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(Error::MappingFile(format!(
                    "Failed to create temp mapping file: {}",
                    err
                )))
            }
        }
    }
    Err(Error::MappingFile(
        "Failed to create temp mapping file after multiple attempts".to_string(),
    ))
}
