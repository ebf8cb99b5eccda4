//! The result of assembling a config: a table of resolved values, with
//! sub-configs as nested tables, in declaration order.

use std::fmt;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::error::BindError;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    name: String,
    table: Table,
}

impl ResolvedConfig {
    pub(crate) fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Name of the config this was assembled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look a value up by dotted path, e.g. `"database.url"` for field `url`
    /// of sub-config `database`.
    pub fn get(&self, dotted_key: &str) -> Option<&Value> {
        let mut segments = dotted_key.split('.');
        let first = self.table.get(segments.next()?)?;
        segments.try_fold(first, |value, segment| value.as_table()?.get(segment))
    }

    /// The resolved sub-config `name`, unless an override replaced it with
    /// something other than a table.
    pub fn sub_config(&self, name: &str) -> Option<&Table> {
        self.table.get(name)?.as_table()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Every leaf value as `(dotted_key, value)`, depth first.
    pub fn entries(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        collect_entries(&self.table, "", &mut out);
        out
    }

    /// Convert into any deserializable type, typically a struct mirroring the
    /// declared fields.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        Value::Table(self.table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| BindError::Convert {
                config: self.name.clone(),
                reason: e.message().to_string(),
            })
    }
}

impl fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {}", format_value(value))?;
        }
        Ok(())
    }
}

fn collect_entries<'a>(table: &'a Table, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
    for (key, value) in table {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(nested) => collect_entries(nested, &dotted, out),
            leaf => out.push((dotted, leaf)),
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}
