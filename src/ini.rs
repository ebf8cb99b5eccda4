//! INI files as a provider, scoped to one section.
//!
//! The dialect is the common one: `[section]` headers, `key = value` or
//! `key: value` entries, whole-line comments starting with `#` or `;`, and
//! indented continuation lines appended to the previous value. Keys are
//! case-insensitive. Entries of the `DEFAULT` section are visible from every
//! section unless shadowed.
//!
//! No crate in our dependency stack reads INI, so the parser lives here.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::BindError;
use crate::file;
use crate::provider::Provider;

pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Delimiters and comment markers of an INI dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniFormat {
    pub delimiters: Vec<String>,
    pub comment_prefixes: Vec<String>,
}

impl Default for IniFormat {
    fn default() -> Self {
        Self {
            delimiters: vec!["=".into(), ":".into()],
            comment_prefixes: vec!["#".into(), ";".into()],
        }
    }
}

type Sections = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
pub struct IniProvider {
    section: String,
    sections: Sections,
}

impl IniProvider {
    pub fn parse(content: &str, section: impl Into<String>) -> Result<Self, BindError> {
        Self::parse_with(content, section, &IniFormat::default())
    }

    pub fn parse_with(
        content: &str,
        section: impl Into<String>,
        format: &IniFormat,
    ) -> Result<Self, BindError> {
        Self::parse_at(content, section.into(), format, &file::inline_path())
    }

    pub fn from_path(path: impl AsRef<Path>, section: impl Into<String>) -> Result<Self, BindError> {
        Self::from_path_with(path, section, &IniFormat::default())
    }

    pub fn from_path_with(
        path: impl AsRef<Path>,
        section: impl Into<String>,
        format: &IniFormat,
    ) -> Result<Self, BindError> {
        let path = path.as_ref();
        let content = file::read_source(path)?;
        Self::parse_at(&content, section.into(), format, path)
    }

    fn parse_at(
        content: &str,
        section: String,
        format: &IniFormat,
        path: &Path,
    ) -> Result<Self, BindError> {
        let sections = parse_sections(content, format, path)?;
        debug!(
            path = %path.display(),
            section = %section,
            sections = sections.len(),
            "loaded INI source"
        );
        Ok(Self { section, sections })
    }

    /// The section this provider reads from.
    pub fn section(&self) -> &str {
        &self.section
    }
}

impl Provider for IniProvider {
    fn get(&self, key: &str) -> Result<String, BindError> {
        let key_lower = key.to_lowercase();
        [self.section.as_str(), DEFAULT_SECTION]
            .iter()
            .find_map(|section| self.sections.get(*section)?.get(&key_lower))
            .cloned()
            .ok_or_else(|| BindError::not_found(key))
    }
}

fn parse_sections(content: &str, format: &IniFormat, path: &Path) -> Result<Sections, BindError> {
    let parse_error = |line: usize, reason: &str| BindError::Parse {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    };

    let mut sections: Sections = HashMap::new();
    let mut current: Option<String> = None;
    // Last entry written, for continuation lines.
    let mut last_key: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            last_key = None;
            continue;
        }
        if format
            .comment_prefixes
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
        {
            continue;
        }

        let indented = line.starts_with(|c: char| c.is_whitespace());
        if indented && let (Some(section), Some(key)) = (&current, &last_key) {
            if let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key)) {
                value.push('\n');
                value.push_str(trimmed);
            }
            continue;
        }

        if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            last_key = None;
            continue;
        }

        let Some((key, value)) = split_entry(trimmed, &format.delimiters) else {
            return Err(parse_error(line_no, "line is neither a section, a comment nor an entry"));
        };
        let Some(section) = &current else {
            return Err(parse_error(line_no, "entry appears before any section header"));
        };
        if key.is_empty() {
            return Err(parse_error(line_no, "entry has an empty key"));
        }

        let key = key.to_lowercase();
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.clone(), value.to_string());
        last_key = Some(key);
    }

    Ok(sections)
}

/// Split at the earliest occurring delimiter.
fn split_entry<'a>(line: &'a str, delimiters: &[String]) -> Option<(&'a str, &'a str)> {
    let (pos, delimiter) = delimiters
        .iter()
        .filter(|d| !d.is_empty())
        .filter_map(|d| line.find(d.as_str()).map(|pos| (pos, d)))
        .min_by_key(|(pos, _)| *pos)?;
    Some((
        line[..pos].trim(),
        line[pos + delimiter.len()..].trim(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DOC: &str = "\
[DEFAULT]
timeout = 30

# main settings
[app]
Host = localhost
port: 8080
url = http://x?a=b
timeout = 5

[other]
; comment
name = other
motd = first line
    second line
";

    #[test]
    fn reads_entries_of_its_section() {
        let provider = IniProvider::parse(DOC, "app").unwrap();
        assert_eq!(provider.get("port").unwrap(), "8080");
        assert_eq!(provider.get("timeout").unwrap(), "5");
    }

    #[test]
    fn keys_are_case_insensitive() {
        let provider = IniProvider::parse(DOC, "app").unwrap();
        assert_eq!(provider.get("host").unwrap(), "localhost");
        assert_eq!(provider.get("HOST").unwrap(), "localhost");
    }

    #[test]
    fn first_delimiter_wins() {
        let provider = IniProvider::parse(DOC, "app").unwrap();
        assert_eq!(provider.get("url").unwrap(), "http://x?a=b");
    }

    #[test]
    fn default_section_is_fallback() {
        let provider = IniProvider::parse(DOC, "other").unwrap();
        assert_eq!(provider.get("timeout").unwrap(), "30");
    }

    #[test]
    fn other_sections_are_invisible() {
        let provider = IniProvider::parse(DOC, "app").unwrap();
        assert!(provider.get("name").unwrap_err().is_not_found());
        let missing = IniProvider::parse(DOC, "nope").unwrap();
        assert!(missing.get("name").unwrap_err().is_not_found());
    }

    #[test]
    fn continuation_lines_join_with_newline() {
        let provider = IniProvider::parse(DOC, "other").unwrap();
        assert_eq!(provider.get("motd").unwrap(), "first line\nsecond line");
    }

    #[test]
    fn custom_format() {
        let format = IniFormat {
            delimiters: vec!["=>".into()],
            comment_prefixes: vec!["//".into()],
        };
        let provider =
            IniProvider::parse_with("// hi\n[s]\nkey => value\n", "s", &format).unwrap();
        assert_eq!(provider.get("key").unwrap(), "value");
    }

    #[test]
    fn entry_without_section_is_parse_error() {
        match IniProvider::parse("key = value\n", "s") {
            Err(BindError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn line_without_delimiter_is_parse_error() {
        match IniProvider::parse("[s]\nok = 1\ngarbage\n", "s") {
            Err(BindError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn reads_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, "[db]\nuser = admin\n").unwrap();
        let provider = IniProvider::from_path(&path, "db").unwrap();
        assert_eq!(provider.section(), "db");
        assert_eq!(provider.get("user").unwrap(), "admin");
    }
}
