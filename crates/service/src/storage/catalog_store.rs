use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::error;

use crate::errors::ServiceError;

/// A locale catalog loaded from disk: a flat JSON object of `key -> value`.
///
/// Key order is preserved so a rewrite only changes the values that were
/// translated. Edits stay in memory until [`CatalogStore::persist_with_backup`].
#[derive(Debug, Clone)]
pub struct CatalogStore {
    entries: Map<String, Value>,
    file_path: PathBuf,
}

impl CatalogStore {
    /// Read and parse the catalog at `path`.
    pub async fn load<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        let bytes = match fs::read(&file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServiceError::not_found(&file_path));
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(entries) => Ok(Self { entries, file_path }),
            other => Err(ServiceError::Validation(format!(
                "{} must contain a JSON object, found {}",
                file_path.display(),
                kind_of(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Keys whose value is exactly `marker`, in file order.
    pub fn untranslated_keys(&self, marker: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, v)| v.as_str() == Some(marker))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Replace the value of an existing key; unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: String) {
        if let Some(slot) = self.entries.get_mut(key) {
            *slot = Value::String(value);
        }
    }

    /// `<dir>/<stem><suffix>.<ext>`, e.g. `translation.json` -> `translation_untranslated.json`.
    pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
            None => format!("{stem}{suffix}"),
        };
        path.with_file_name(name)
    }

    /// Pretty JSON with `indent` spaces per level; non-ASCII is written as-is.
    pub fn to_pretty_bytes(&self, indent: usize) -> Result<Vec<u8>, ServiceError> {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Scratch file the new catalog is written to before it replaces the original.
    pub fn staging_path(path: &Path) -> PathBuf {
        let name = path.file_name().map(|s| s.to_string_lossy()).unwrap_or_default();
        path.with_file_name(format!("{name}.tmp"))
    }

    /// Move the original file aside and write the edited catalog in its place.
    ///
    /// The new content is staged next to the catalog first, so a failed write
    /// leaves the original where it was. An older backup at the same path is
    /// replaced. Returns the backup path.
    pub async fn persist_with_backup(&self, suffix: &str, indent: usize) -> Result<PathBuf, ServiceError> {
        if suffix.is_empty() {
            return Err(ServiceError::Validation("backup suffix must not be empty".into()));
        }
        let data = self.to_pretty_bytes(indent)?;
        let staging = Self::staging_path(&self.file_path);
        let backup = Self::backup_path(&self.file_path, suffix);

        if let Err(e) = fs::write(&staging, data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&self.file_path, &backup).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staging, &self.file_path).await {
            if let Err(restore) = fs::rename(&backup, &self.file_path).await {
                error!(path = %self.file_path.display(), backup = %backup.display(), error = %restore, "cannot restore catalog from backup");
            }
            return Err(e.into());
        }
        Ok(backup)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
