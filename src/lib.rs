//! Declarative configuration binding. Describe each field once, say where its
//! value comes from, and get a resolved tree back.
//!
//! Confbind resolves configuration field by field from pluggable sources
//! (environment variables, JSON, INI, TOML and `.env` files, or anything
//! implementing [`Provider`]), converts raw strings with [`Caster`]s, and
//! falls back to literal, computed or derived defaults.
//!
//! ```
//! use std::sync::Arc;
//! use confbind::{field, MemoryProvider, Schema, ScalarType, Value};
//!
//! let schema = Schema::builder("App")
//!     .prefix("APP")
//!     .typed("port", ScalarType::Int)
//!     .literal("debug", ScalarType::Bool, false)
//!     .sub_config("db", Schema::builder("Db").field("url", field()))
//!     .build()?;
//!
//! let source = MemoryProvider::new([("APP_port", "8080"), ("APP_DB_URL", "pg://")]);
//! let config = schema.instance().provider(Arc::new(source)).load()?;
//!
//! assert_eq!(config.get("port"), Some(&Value::Integer(8080)));
//! assert_eq!(config.get("debug"), Some(&Value::Boolean(false)));
//! assert_eq!(config.get("db.url").and_then(Value::as_str), Some("pg://"));
//! # Ok::<(), confbind::BindError>(())
//! ```
//!
//! # Fields
//!
//! A [`FieldSpec`] is an immutable template: a lookup key, a default, an
//! optional provider and a caster. Resolving it asks the provider for the
//! key, casts what comes back, and only on "not found" takes the default.
//! Defaults are returned as declared, never cast. A cast failure is an error
//! unless the field asked to keep the raw string instead.
//!
//! Nothing is cached on the field. The same field can sit in several schemas,
//! or be resolved on its own with [`FieldSpec::resolve`], and always reflects
//! the provider it is resolved against.
//!
//! Three kinds of defaults exist:
//!
//! - **Literal**: [`FieldSpec::default`].
//! - **Deferred**: [`FieldSpec::default_with`], a closure run each time the
//!   fallback is taken.
//! - **Derived**: [`reference_field`], computed from sibling fields,
//!   standalone fields and constants. Siblings are read from the current
//!   assembly, so overrides and provider values flow into derived fields.
//!
//! [`constant_field`] never consults a provider at all.
//!
//! # Declaring a config
//!
//! [`Schema::builder`] collects declarations in order. Each one is
//! classified when the schema is built:
//!
//! | Declaration | Becomes |
//! |---|---|
//! | [`typed`](ConfigBuilder::typed) | field keyed by the attribute name, with the type's caster |
//! | [`alias`](ConfigBuilder::alias) | field keyed by the alias, stored under the attribute name |
//! | [`field`](ConfigBuilder::field) / [`typed_field`](ConfigBuilder::typed_field) | the given field, with a missing key or caster filled in |
//! | [`literal`](ConfigBuilder::literal) | field with the literal as default; a literal of the wrong type is an error |
//! | [`sub_config`](ConfigBuilder::sub_config) | nested config, assembled recursively |
//!
//! An [`Annotation::Opaque`] type has no built-in caster; declaring one
//! without an explicit field fails and points at [`constant_field`].
//!
//! Builders are `Clone`, and declaring an existing name again replaces it in
//! place. A config that differs from another in a few fields is a clone
//! with those fields redeclared.
//!
//! # Keys and prefixes
//!
//! Explicit keys are used verbatim. Generated keys follow the position of
//! the field in the tree:
//!
//! | Where | Key for `login` |
//! |---|---|
//! | root, no prefix | `login` |
//! | root, prefix `APP` | `APP_login` |
//! | `Prod` (prefix `PROD`) > `Integration` > `SMTP` | `PROD_INTEGRATION_SMTP_LOGIN` |
//!
//! Nested keys join every enclosing segment (a sub-config's own prefix, or
//! its attribute name) with the nearest declared delimiter and are
//! uppercased. Constant and reference fields never get a generated key.
//!
//! # Providers
//!
//! Per field, the first of these wins:
//!
//! ```text
//! Field's own provider        field().provider(..)
//!        ↓ else
//! Call-time provider          schema.instance().provider(..)
//!        ↓ else
//! Config's provider           builder.provider(..)
//!        ↓ else
//! Enclosing config's provider (resolved when the parent is assembled)
//!        ↓ else
//! Process environment         EnvironmentProvider
//! ```
//!
//! File-backed providers read and parse their source once, up front, and
//! fail with [`BindError::Parse`] pointing at the offending line.
//!
//! # Overrides
//!
//! [`Instance::set`] and [`Instance::overrides`] replace values by attribute
//! name. Overrides skip the provider and the caster. The same set is handed
//! to every sub-config; an override named like a sub-config replaces the
//! whole sub-config. [`Instance::overrides_from`] takes them from any
//! `Serialize` value, e.g. parsed command-line flags.
//!
//! # Errors
//!
//! All fallible operations return [`BindError`]. [`Instance::load`] stops at
//! the first failure; [`Instance::report`] resolves everything it can and
//! returns every failure at once as [`BindError::Unresolved`]. With the
//! `rich-errors` feature, errors implement `miette::Diagnostic`.
//!
//! # Features
//!
//! - `json` (default): [`JsonProvider`] and [`JsonCaster`].
//! - `dotenv` (default): [`DotenvProvider`].
//! - `rich-errors`: miette diagnostics.
//!
//! The crate logs through `tracing` at `debug` and `trace` levels and never
//! logs resolved values.

pub mod caster;
pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "dotenv")]
mod dotenv;
mod field;
mod file;
mod ini;
#[cfg(feature = "json")]
mod json;
mod overrides;
mod provider;
mod resolve;
mod resolved;
mod schema;
mod toml_file;

#[cfg(test)]
mod fixtures;

pub use builder::{Alias, ConfigBuilder};
#[cfg(feature = "json")]
pub use caster::JsonCaster;
pub use caster::{
    BoolCaster, Caster, ConstantCaster, FloatCaster, IdentityCaster, IntCaster, ListCaster,
    ScalarType, log_level_caster,
};
#[cfg(feature = "dotenv")]
pub use dotenv::{DotenvMode, DotenvProvider};
pub use error::{BindError, CastError};
pub use field::{
    Combine, DefaultValue, Derivation, FieldSpec, Input, Thunk, constant_field, field,
    reference_field, sibling,
};
pub use ini::{IniFormat, IniProvider};
#[cfg(feature = "json")]
pub use json::JsonProvider;
pub use overrides::Overrides;
pub use provider::{EnvironmentProvider, MemoryProvider, Provider, default_provider};
pub use resolved::ResolvedConfig;
pub use schema::{FieldEntry, Instance, Schema, SubConfigEntry};
pub use toml::{Table, Value};
pub use toml_file::TomlProvider;
pub use types::{Annotation, Prefix};
