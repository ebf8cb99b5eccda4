use std::path::PathBuf;

use thiserror::Error;

/// Returned by [`Caster::cast`](crate::Caster::cast) when a raw string cannot
/// be converted.
///
/// Carries the offending raw string so fields that opted into
/// `ignore_cast_error` can substitute it for the casted value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not cast \"{raw}\" with {caster}")]
pub struct CastError {
    pub raw: String,
    pub caster: String,
}

impl CastError {
    pub fn new(raw: impl Into<String>, caster: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            caster: caster.into(),
        }
    }
}

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum BindError {
    #[error("Variable '{key}' hasn't been found")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confbind::variable_not_found),
            help("set the variable in the source, or give the field a default")
        )
    )]
    VariableNotFound { key: String },

    #[error("Variable '{key}' is set but is not valid UTF-8")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::not_unicode)))]
    NotUnicode { key: String },

    #[error("Field has no key to look up and no default")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::unnamed)))]
    Unnamed,

    #[error("{0}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confbind::cast),
            help("use .ignore_cast_error(true) to keep the raw string instead")
        )
    )]
    ImpossibleToCast(#[from] CastError),

    #[error("Invalid declaration of '{name}' in {config}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::declaration)))]
    Declaration {
        config: String,
        name: String,
        reason: String,
    },

    #[error("Field '{name}' in {config} references unknown field '{target}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::unknown_reference)))]
    UnknownReference {
        config: String,
        name: String,
        target: String,
    },

    #[error("Circular reference while resolving '{name}' in {config}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::circular_reference)))]
    CircularReference { config: String, name: String },

    #[error("Failed to parse {path} (line {line}): {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::parse)))]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::io)))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Derived value could not be computed: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::derivation)))]
    Derivation(String),

    #[error("Could not convert {config}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::convert)))]
    Convert { config: String, reason: String },

    #[error("Configuration misuse: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::misuse)))]
    Misuse(String),

    #[error("{} field(s) could not be resolved", .0.len())]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confbind::unresolved)))]
    Unresolved(#[cfg_attr(feature = "rich-errors", related)] Vec<BindError>),
}

impl BindError {
    pub fn not_found(key: impl Into<String>) -> Self {
        BindError::VariableNotFound { key: key.into() }
    }

    /// Whether this error means "the source has no value", the only condition
    /// under which a field falls back to its default.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BindError::VariableNotFound { .. } | BindError::Unnamed)
    }
}
