use std::fmt;

use crate::caster::ScalarType;

/// Namespacing rule for generated lookup keys: `prefix + delimiter + name`.
///
/// Inside sub-configs the prefix is the first segment of an accumulated
/// path, see [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub value: String,
    pub delimiter: String,
}

impl Prefix {
    pub const DEFAULT_DELIMITER: &'static str = "_";

    pub fn new(value: impl Into<String>) -> Self {
        Self::with_delimiter(value, Self::DEFAULT_DELIMITER)
    }

    pub fn with_delimiter(value: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            delimiter: delimiter.into(),
        }
    }

    /// `prefix + delimiter + name`, or `name` alone without a prefix.
    pub fn apply(prefix: Option<&Prefix>, name: &str) -> String {
        match prefix {
            Some(p) => format!("{}{}{}", p.value, p.delimiter, name),
            None => name.to_string(),
        }
    }
}

impl From<&str> for Prefix {
    fn from(value: &str) -> Self {
        Prefix::new(value)
    }
}

impl From<String> for Prefix {
    fn from(value: String) -> Self {
        Prefix::new(value)
    }
}

/// The declared type of a config attribute.
///
/// Scalars get a built-in caster. An opaque type has none, so it must be
/// paired with an explicit field carrying its own caster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Scalar(ScalarType),
    Opaque(String),
}

impl Annotation {
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Annotation::Opaque(type_name.into())
    }
}

impl From<ScalarType> for Annotation {
    fn from(ty: ScalarType) -> Self {
        Annotation::Scalar(ty)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Scalar(ty) => write!(f, "{ty}"),
            Annotation::Opaque(name) => f.write_str(name),
        }
    }
}

/// Where a config node sits in the tree, used to generate keys for fields
/// that were not given one.
///
/// At the root a key is `Prefix::apply(prefix, name)`. Every enclosing
/// sub-config pushes a segment (its own prefix value, else its attribute
/// name); once nested, keys are the joined path uppercased, e.g.
/// `PROD_INTEGRATION_SMTP_LOGIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyPath {
    segments: Vec<String>,
    delimiter: String,
    nested: bool,
}

impl KeyPath {
    pub(crate) fn root(prefix: Option<&Prefix>) -> Self {
        Self {
            segments: prefix.map(|p| vec![p.value.clone()]).unwrap_or_default(),
            delimiter: prefix
                .map(|p| p.delimiter.clone())
                .unwrap_or_else(|| Prefix::DEFAULT_DELIMITER.to_string()),
            nested: false,
        }
    }

    pub(crate) fn child(&self, name: &str, prefix: Option<&Prefix>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(prefix.map_or(name, |p| p.value.as_str()).to_string());
        Self {
            segments,
            delimiter: prefix.map_or_else(|| self.delimiter.clone(), |p| p.delimiter.clone()),
            nested: true,
        }
    }

    pub(crate) fn key_for(&self, name: &str) -> String {
        if self.segments.is_empty() {
            return name.to_string();
        }
        let mut key = self.segments.join(&self.delimiter);
        key.push_str(&self.delimiter);
        key.push_str(name);
        if self.nested { key.to_uppercase() } else { key }
    }
}
