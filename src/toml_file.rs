//! TOML documents as a provider. Lookup is flat: keys name entries of the
//! top-level table only.

use std::path::Path;

use toml::{Table, Value};
use tracing::debug;

use crate::error::BindError;
use crate::file;
use crate::provider::Provider;

#[derive(Debug, Clone)]
pub struct TomlProvider {
    table: Table,
}

impl TomlProvider {
    pub fn parse(content: &str) -> Result<Self, BindError> {
        Self::parse_at(content, &file::inline_path())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BindError> {
        let path = path.as_ref();
        let content = file::read_source(path)?;
        Self::parse_at(&content, path)
    }

    fn parse_at(content: &str, path: &Path) -> Result<Self, BindError> {
        let table: Table = toml::from_str(content).map_err(|e| BindError::Parse {
            path: path.to_path_buf(),
            line: line_of(content, e.span().map(|s| s.start)),
            reason: e.message().to_string(),
        })?;
        debug!(path = %path.display(), entries = table.len(), "loaded TOML source");
        Ok(Self { table })
    }
}

impl Provider for TomlProvider {
    fn get(&self, key: &str) -> Result<String, BindError> {
        match self.table.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(BindError::not_found(key)),
        }
    }
}

/// 1-indexed line of a byte offset, 0 when unknown.
fn line_of(content: &str, offset: Option<usize>) -> usize {
    match offset {
        Some(offset) => content[..offset.min(content.len())].matches('\n').count() + 1,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DOC: &str = r#"
host = "localhost"
port = 8080
debug = false
ratio = 1.5
hosts = ["a", "b"]

[database]
url = "pg://"
"#;

    #[test]
    fn top_level_scalars() {
        let provider = TomlProvider::parse(DOC).unwrap();
        assert_eq!(provider.get("host").unwrap(), "localhost");
        assert_eq!(provider.get("port").unwrap(), "8080");
        assert_eq!(provider.get("debug").unwrap(), "false");
        assert_eq!(provider.get("ratio").unwrap(), "1.5");
    }

    #[test]
    fn arrays_are_rendered_inline() {
        let provider = TomlProvider::parse(DOC).unwrap();
        assert_eq!(provider.get("hosts").unwrap(), r#"["a", "b"]"#);
    }

    #[test]
    fn lookup_is_flat() {
        let provider = TomlProvider::parse(DOC).unwrap();
        assert!(provider.get("database.url").unwrap_err().is_not_found());
        assert!(provider.get("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn parse_error_reports_line() {
        match TomlProvider::parse("a = 1\nb = = 2\n") {
            Err(BindError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn reads_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "name = \"svc\"\n").unwrap();
        assert_eq!(TomlProvider::from_path(&path).unwrap().get("name").unwrap(), "svc");
    }
}
