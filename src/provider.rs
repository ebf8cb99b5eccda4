//! Providers: pluggable `key -> string` lookup sources.
//!
//! A provider answers with the raw string for a key or fails with
//! [`BindError::VariableNotFound`]. That error is the only one a field
//! recovers from (by falling back to its default); anything else a provider
//! returns propagates to the caller unchanged.

use std::collections::HashMap;
use std::env::VarError;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::BindError;

pub trait Provider: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<String, BindError>;
}

/// Looks keys up in the process environment. The provider every field falls
/// back to when neither it nor any enclosing config names one.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentProvider;

impl Provider for EnvironmentProvider {
    fn get(&self, key: &str) -> Result<String, BindError> {
        match std::env::var(key) {
            Ok(value) => Ok(value),
            Err(VarError::NotPresent) => Err(BindError::not_found(key)),
            Err(VarError::NotUnicode(_)) => Err(BindError::NotUnicode { key: key.to_string() }),
        }
    }
}

/// The shared process-wide [`EnvironmentProvider`].
pub fn default_provider() -> Arc<dyn Provider> {
    static DEFAULT: OnceLock<Arc<dyn Provider>> = OnceLock::new();
    DEFAULT.get_or_init(|| Arc::new(EnvironmentProvider)).clone()
}

/// Holds its pairs in memory.
///
/// Takes an iterator so tests and callers can pass synthetic data instead of
/// touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    values: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Provider for MemoryProvider {
    fn get(&self, key: &str) -> Result<String, BindError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| BindError::not_found(key))
    }
}
