//! `.env` files as a provider.
//!
//! The file is parsed in full before anything is exposed: one bad line fails
//! the whole load with a single parse error, and nothing is merged into the
//! environment. After a successful load the file is never read again.
//!
//! Each non-blank line is `KEY=VALUE`, split at the first `=`; the value is
//! the rest of the line, taken literally.
//!
//! Two modes decide where the parsed pairs live:
//!
//! - [`DotenvMode::Private`] (default) keeps them in the provider.
//! - [`DotenvMode::Environment`] merges them into the process environment,
//!   overriding existing variables, and answers lookups from there.
//!
//! Loading is explicit ([`DotenvProvider::load`]) unless the provider is
//! built with [`auto_load`](DotenvProvider::auto_load), in which case the
//! first `get` triggers it. Querying an unloaded, non-auto-loading provider is
//! a [`BindError::Misuse`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::error::BindError;
use crate::file;
use crate::provider::{EnvironmentProvider, Provider};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DotenvMode {
    #[default]
    Private,
    Environment,
}

#[derive(Debug)]
pub struct DotenvProvider {
    path: PathBuf,
    mode: DotenvMode,
    auto_load: bool,
    loaded: OnceLock<HashMap<String, String>>,
}

impl DotenvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: DotenvMode::default(),
            auto_load: false,
            loaded: OnceLock::new(),
        }
    }

    pub fn mode(mut self, mode: DotenvMode) -> Self {
        self.mode = mode;
        self
    }

    /// Load lazily on the first lookup instead of requiring [`load`](Self::load).
    pub fn auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Parse the file and, in [`DotenvMode::Environment`], merge it into the
    /// process environment. A second call is a no-op.
    pub fn load(&self) -> Result<(), BindError> {
        self.ensure_loaded().map(|_| ())
    }

    fn ensure_loaded(&self) -> Result<&HashMap<String, String>, BindError> {
        if let Some(pairs) = self.loaded.get() {
            return Ok(pairs);
        }

        let content = file::read_source(&self.path)?;
        let pairs = parse(&content, &self.path)?;

        if self.mode == DotenvMode::Environment {
            for (key, value) in &pairs {
                // SAFETY: config assembly is single-threaded; loading happens
                // before any concurrent reader of the environment exists.
                unsafe { std::env::set_var(key, value) };
            }
        }
        debug!(
            path = %self.path.display(),
            entries = pairs.len(),
            mode = ?self.mode,
            "loaded dotenv source"
        );
        Ok(self.loaded.get_or_init(|| pairs))
    }
}

impl Provider for DotenvProvider {
    fn get(&self, key: &str) -> Result<String, BindError> {
        let pairs = match self.loaded.get() {
            Some(pairs) => pairs,
            None if self.auto_load => self.ensure_loaded()?,
            None => {
                return Err(BindError::Misuse(format!(
                    "dotenv file {} was never loaded; call load() or enable auto_load",
                    self.path.display()
                )));
            }
        };

        match self.mode {
            DotenvMode::Environment => EnvironmentProvider.get(key),
            DotenvMode::Private => pairs
                .get(key)
                .cloned()
                .ok_or_else(|| BindError::not_found(key)),
        }
    }
}

/// One `KEY=VALUE` pair per non-blank line, split at the first `=`. The
/// value is the rest of the line, verbatim: no quoting, expansion or
/// comments.
fn parse(content: &str, path: &Path) -> Result<HashMap<String, String>, BindError> {
    let mut pairs = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parse_error = |reason: String| BindError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };
        let Some((key, value)) = line.split_once('=') else {
            return Err(parse_error(format!("cannot parse '{line}' as KEY=VALUE")));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(parse_error("entry has an empty key".into()));
        }
        pairs.insert(key.to_string(), value.to_string());
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn env_file(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn private_mode_reads_pairs() {
        let (_dir, path) = env_file("HOST=localhost\n\nPORT=8080\nURL=http://x?a=b\n");
        let provider = DotenvProvider::new(&path);
        provider.load().unwrap();
        assert_eq!(provider.get("HOST").unwrap(), "localhost");
        assert_eq!(provider.get("PORT").unwrap(), "8080");
        assert_eq!(provider.get("URL").unwrap(), "http://x?a=b");
        assert!(provider.get("MISSING").unwrap_err().is_not_found());
    }

    #[test]
    fn values_are_taken_verbatim() {
        let (_dir, path) = env_file(
            "SECRET=pa$HOME_X\nCOLOR=#ff0000\nPW=abc #tail\nQ=\"quoted\"\nDSN=a=b=c\n",
        );
        let provider = DotenvProvider::new(&path);
        provider.load().unwrap();
        assert_eq!(provider.get("SECRET").unwrap(), "pa$HOME_X");
        assert_eq!(provider.get("COLOR").unwrap(), "#ff0000");
        assert_eq!(provider.get("PW").unwrap(), "abc #tail");
        assert_eq!(provider.get("Q").unwrap(), "\"quoted\"");
        assert_eq!(provider.get("DSN").unwrap(), "a=b=c");
    }

    #[test]
    fn empty_value_is_present() {
        let (_dir, path) = env_file("EMPTY=\n");
        let provider = DotenvProvider::new(&path);
        provider.load().unwrap();
        assert_eq!(provider.get("EMPTY").unwrap(), "");
    }

    #[test]
    fn parse_error_counts_blank_lines() {
        let path = Path::new(".env");
        match parse("A=1\n\nbroken\nB=2\nbroken\n", path) {
            Err(BindError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_key_is_parse_error() {
        let (_dir, path) = env_file("=value\n");
        assert!(matches!(
            DotenvProvider::new(&path).load(),
            Err(BindError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn unloaded_provider_is_misuse() {
        let (_dir, path) = env_file("HOST=localhost\n");
        let provider = DotenvProvider::new(&path);
        assert!(matches!(provider.get("HOST"), Err(BindError::Misuse(_))));
        assert!(!provider.is_loaded());
    }

    #[test]
    fn auto_load_on_first_get() {
        let (_dir, path) = env_file("HOST=lazy\n");
        let provider = DotenvProvider::new(&path).auto_load(true);
        assert!(!provider.is_loaded());
        assert_eq!(provider.get("HOST").unwrap(), "lazy");
        assert!(provider.is_loaded());
    }

    #[test]
    fn file_is_not_reread_after_load() {
        let (_dir, path) = env_file("HOST=first\n");
        let provider = DotenvProvider::new(&path);
        provider.load().unwrap();
        fs::write(&path, "HOST=second\n").unwrap();
        provider.load().unwrap();
        assert_eq!(provider.get("HOST").unwrap(), "first");
    }

    #[test]
    fn bad_line_fails_whole_file_once() {
        let (_dir, path) = env_file("GOOD=1\nthis line is wrong\nALSO_GOOD=2\n");
        let provider = DotenvProvider::new(&path).auto_load(true);
        match provider.load() {
            Err(BindError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected Parse error, got {other:?}"),
        }
        assert!(!provider.is_loaded());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let provider = DotenvProvider::new(dir.path().join(".env"));
        assert!(matches!(provider.load(), Err(BindError::Io { .. })));
    }

    #[test]
    #[serial]
    fn environment_mode_merges_into_process_env() {
        let (_dir, path) = env_file("CONFBIND_DOTENV_MERGED=from-file\n");
        let provider = DotenvProvider::new(&path).mode(DotenvMode::Environment);
        provider.load().unwrap();
        assert_eq!(
            std::env::var("CONFBIND_DOTENV_MERGED").as_deref(),
            Ok("from-file")
        );
        assert_eq!(provider.get("CONFBIND_DOTENV_MERGED").unwrap(), "from-file");
        // SAFETY: serialized with every other test that touches the environment.
        unsafe { std::env::remove_var("CONFBIND_DOTENV_MERGED") };
    }

    #[test]
    #[serial]
    fn environment_mode_leaves_env_untouched_on_parse_error() {
        let (_dir, path) = env_file("CONFBIND_DOTENV_PARTIAL=1\nbroken line here\n");
        let provider = DotenvProvider::new(&path).mode(DotenvMode::Environment);
        assert!(provider.load().is_err());
        assert!(std::env::var("CONFBIND_DOTENV_PARTIAL").is_err());
    }
}
