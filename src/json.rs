//! JSON documents as a provider.
//!
//! Keys are delimited paths walked one object level at a time:
//! `"db.primary.host"` reads `{"db": {"primary": {"host": ...}}}`. The
//! delimiter defaults to `.` and is configurable per provider (`::` is common
//! when real keys contain dots).
//!
//! Values always leave the provider as strings so the caster layer sees a
//! uniform contract. Scalars are stringified, arrays are re-serialized as
//! JSON, and `null` counts as absent. Objects are not values: a key that
//! stops at an object is not found.

use std::path::Path;

use serde_json::Value as Json;
use tracing::debug;

use crate::error::BindError;
use crate::file;
use crate::provider::Provider;

#[derive(Debug, Clone)]
pub struct JsonProvider {
    document: Json,
    delimiter: String,
}

impl JsonProvider {
    pub const DEFAULT_DELIMITER: &'static str = ".";

    /// Parse a JSON document held in memory.
    pub fn parse(content: &str) -> Result<Self, BindError> {
        Self::parse_at(content, &file::inline_path())
    }

    /// Read and parse a JSON file once.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BindError> {
        let path = path.as_ref();
        let content = file::read_source(path)?;
        Self::parse_at(&content, path)
    }

    fn parse_at(content: &str, path: &Path) -> Result<Self, BindError> {
        let document: Json = serde_json::from_str(content).map_err(|e| BindError::Parse {
            path: path.to_path_buf(),
            line: e.line(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded JSON source");
        Ok(Self {
            document,
            delimiter: Self::DEFAULT_DELIMITER.to_string(),
        })
    }

    /// Use a different path delimiter, e.g. `"::"`.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    fn lookup(&self, key: &str) -> Option<&Json> {
        if self.delimiter.is_empty() {
            return self.document.as_object()?.get(key);
        }
        let mut current = &self.document;
        for segment in key.split(self.delimiter.as_str()) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl Provider for JsonProvider {
    fn get(&self, key: &str) -> Result<String, BindError> {
        let found = self.lookup(key).ok_or_else(|| BindError::not_found(key))?;
        match found {
            Json::Null => Err(BindError::not_found(key)),
            Json::String(s) => Ok(s.clone()),
            Json::Bool(b) => Ok(b.to_string()),
            Json::Number(n) => Ok(n.to_string()),
            Json::Array(_) => serde_json::to_string(found)
                .map_err(|e| BindError::Misuse(format!("cannot re-serialize '{key}': {e}"))),
            // Only leaves are reachable; an object is a path prefix, not a value.
            Json::Object(_) => Err(BindError::not_found(key)),
        }
    }
}
