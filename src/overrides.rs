//! Caller-supplied values that win over every source.
//!
//! Overrides are keyed by attribute name, not lookup key, and are not dotted:
//! the same set is handed to every sub-config, so `host` replaces a `host`
//! field at any depth. An override named like a sub-config replaces that
//! whole sub-config.

use serde::Serialize;
use toml::{Table, Value};

use crate::error::BindError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    values: Table,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every top-level entry of a serializable value. `None` fields are
    /// skipped, so an `Option` left unset does not override anything.
    ///
    /// ```
    /// use confbind::Overrides;
    ///
    /// #[derive(serde::Serialize)]
    /// struct Flags { port: Option<u16>, host: Option<String> }
    ///
    /// let overrides = Overrides::from_serialize(&Flags { port: Some(9000), host: None }).unwrap();
    /// assert_eq!(overrides.len(), 1);
    /// ```
    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, BindError> {
        let value = Value::try_from(source).map_err(|e| BindError::Convert {
            config: "overrides".into(),
            reason: e.to_string(),
        })?;
        match value {
            Value::Table(values) => Ok(Self { values }),
            other => Err(BindError::Convert {
                config: "overrides".into(),
                reason: format!("expected a struct or map, got {}", other.type_str()),
            }),
        }
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Later values for the same name replace earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overrides = Overrides::new();
        for (name, value) in iter {
            overrides.insert(name, value);
        }
        overrides
    }
}
