//! Casters: conversions from the raw string a provider returns to a typed
//! [`Value`].
//!
//! Every built-in is stateless or holds an immutable table, so one instance
//! can be shared (behind an `Arc`) by any number of fields and configs.
//! Casters never swallow a failure: an input they cannot convert yields a
//! [`CastError`] carrying the raw string.

use std::fmt;
use std::sync::Arc;

use toml::Value;

use crate::error::CastError;

/// A pluggable `string -> value` conversion.
pub trait Caster: Send + Sync + fmt::Debug {
    fn cast(&self, raw: &str) -> Result<Value, CastError>;

    /// Identity used in cast error messages.
    fn name(&self) -> &str;
}

/// Returns the raw string unchanged. The caster of any field that declares
/// no type and no explicit caster.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCaster;

impl Caster for IdentityCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        Ok(Value::String(raw.to_string()))
    }

    fn name(&self) -> &str {
        "IdentityCaster"
    }
}

const TRUTHY: [&str; 5] = ["true", "1", "yes", "ok", "on"];
const FALSY: [&str; 4] = ["false", "0", "no", "off"];

/// Case-insensitive lookup over the usual spellings of a boolean.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCaster;

impl Caster for BoolCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        let lowered = raw.trim().to_lowercase();
        if TRUTHY.contains(&lowered.as_str()) {
            Ok(Value::Boolean(true))
        } else if FALSY.contains(&lowered.as_str()) {
            Ok(Value::Boolean(false))
        } else {
            Err(CastError::new(raw, self.name()))
        }
    }

    fn name(&self) -> &str {
        "BoolCaster"
    }
}

/// Base-10 integer. Float-looking input is rejected, not truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntCaster;

impl Caster for IntCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        raw.trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| CastError::new(raw, self.name()))
    }

    fn name(&self) -> &str {
        "IntCaster"
    }
}

/// Floating point number, accepting `,` as well as `.` for the decimal separator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCaster;

impl Caster for FloatCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        raw.trim()
            .replace(',', ".")
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CastError::new(raw, self.name()))
    }

    fn name(&self) -> &str {
        "FloatCaster"
    }
}

/// Splits the input into a list of strings. Never fails.
///
/// A single trailing separator does not produce a trailing empty element, so
/// `"a,b,"` and `"a,b"` cast to the same list. Empty input is an empty list;
/// an empty separator yields the whole input as one element.
#[derive(Debug, Clone)]
pub struct ListCaster {
    separator: String,
}

impl ListCaster {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for ListCaster {
    fn default() -> Self {
        Self::new(",")
    }
}

impl Caster for ListCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        if self.separator.is_empty() {
            return Ok(Value::Array(vec![Value::String(trimmed.to_string())]));
        }

        let body = trimmed.strip_suffix(self.separator.as_str()).unwrap_or(trimmed);
        let items = body
            .split(self.separator.as_str())
            .map(|item| Value::String(item.to_string()))
            .collect();
        Ok(Value::Array(items))
    }

    fn name(&self) -> &str {
        "ListCaster"
    }
}

/// Maps one or more equivalent spellings, matched case-insensitively, to a
/// fixed value. Inputs outside the table fail.
///
/// ```
/// use confbind::ConstantCaster;
///
/// let mode = ConstantCaster::new("ModeCaster")
///     .entry(["prod", "production"], "production")
///     .entry(["dev"], "development");
/// ```
#[derive(Debug, Clone)]
pub struct ConstantCaster {
    name: String,
    table: Vec<(Vec<String>, Value)>,
}

impl ConstantCaster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Vec::new(),
        }
    }

    /// Add an entry. Spellings are stored lowercased.
    pub fn entry<I, S, V>(mut self, spellings: I, value: V) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        let keys = spellings
            .into_iter()
            .map(|s| s.as_ref().to_lowercase())
            .collect();
        self.table.push((keys, value.into()));
        self
    }
}

impl Caster for ConstantCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        let needle = raw.trim().to_lowercase();
        self.table
            .iter()
            .find(|(keys, _)| keys.iter().any(|k| *k == needle))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| CastError::new(raw, self.name.as_str()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Maps log level spellings to the canonical lowercase names understood by
/// `tracing`'s level parsing and `EnvFilter` directives.
pub fn log_level_caster() -> ConstantCaster {
    ConstantCaster::new("LogLevelCaster")
        .entry(["trace"], "trace")
        .entry(["debug"], "debug")
        .entry(["info"], "info")
        .entry(["warn", "warning"], "warn")
        .entry(["error", "critical", "fatal"], "error")
}

/// Parses a raw JSON string into a value tree, e.g. an environment variable
/// holding a JSON object, or an array handed over by a `JsonProvider`. JSON
/// `null` cannot be represented and fails.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCaster;

#[cfg(feature = "json")]
impl Caster for JsonCaster {
    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        let parsed: serde_json::Value =
            serde_json::from_str(raw).map_err(|_| CastError::new(raw, self.name()))?;
        Value::try_from(parsed).map_err(|_| CastError::new(raw, self.name()))
    }

    fn name(&self) -> &str {
        "JsonCaster"
    }
}

/// The scalar types a config can declare without naming a caster. Each maps
/// to its built-in caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Str,
    Int,
    Float,
    Bool,
    List,
}

impl ScalarType {
    pub fn caster(self) -> Arc<dyn Caster> {
        match self {
            ScalarType::Str => Arc::new(IdentityCaster),
            ScalarType::Int => Arc::new(IntCaster),
            ScalarType::Float => Arc::new(FloatCaster),
            ScalarType::Bool => Arc::new(BoolCaster),
            ScalarType::List => Arc::new(ListCaster::default()),
        }
    }

    /// Whether a literal default is already of this type.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarType::Str, Value::String(_))
                | (ScalarType::Int, Value::Integer(_))
                | (ScalarType::Float, Value::Float(_))
                | (ScalarType::Bool, Value::Boolean(_))
                | (ScalarType::List, Value::Array(_))
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Str => "str",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
            ScalarType::List => "list",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn type_name_of(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "str",
        Value::Integer(_) => "int",
        Value::Float(_) => "float",
        Value::Boolean(_) => "bool",
        Value::Array(_) => "list",
        Value::Table(_) => "table",
        Value::Datetime(_) => "datetime",
    }
}
