//! The built, immutable description of a config and the per-call
//! [`Instance`] used to assemble it.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::Value;

use crate::builder::ConfigBuilder;
use crate::error::BindError;
use crate::field::FieldSpec;
use crate::overrides::Overrides;
use crate::provider::Provider;
use crate::resolve::{self, Mode};
use crate::resolved::ResolvedConfig;
use crate::types::Prefix;

/// A declared field after classification, under its attribute name.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub name: String,
    pub spec: FieldSpec,
}

#[derive(Debug, Clone)]
pub struct SubConfigEntry {
    pub name: String,
    pub schema: Schema,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) prefix: Option<Prefix>,
    pub(crate) provider: Option<Arc<dyn Provider>>,
    pub(crate) fields: Vec<FieldEntry>,
    pub(crate) sub_configs: Vec<SubConfigEntry>,
}

/// A config descriptor: every field with its final key, caster and default,
/// and every sub-config, in declaration order.
///
/// Cheap to clone and safe to share across threads; assembling it never
/// mutates it.
#[derive(Debug, Clone)]
pub struct Schema {
    node: Arc<Node>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(name)
    }

    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn prefix(&self) -> Option<&Prefix> {
        self.node.prefix.as_ref()
    }

    pub fn fields(&self) -> &[FieldEntry] {
        &self.node.fields
    }

    pub fn sub_configs(&self) -> &[SubConfigEntry] {
        &self.node.sub_configs
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().iter().find(|f| f.name == name).map(|f| &f.spec)
    }

    pub fn sub_config(&self, name: &str) -> Option<&Schema> {
        self.sub_configs()
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.schema)
    }

    /// The key field `name` is looked up under, `None` for constant and
    /// reference fields.
    pub fn key_of(&self, name: &str) -> Option<&str> {
        self.field(name)?.lookup_key()
    }

    /// Assemble with no overrides and the declared providers.
    pub fn load(&self) -> Result<ResolvedConfig, BindError> {
        self.instance().load()
    }

    pub fn instance(&self) -> Instance<'_> {
        Instance {
            schema: self,
            provider: None,
            overrides: Overrides::new(),
        }
    }
}

/// One assembly of a [`Schema`]: the provider and overrides it runs with.
///
/// ```
/// use std::sync::Arc;
/// use confbind::{field, MemoryProvider, Schema};
///
/// let schema = Schema::builder("App")
///     .field("var1", field().key("var_1").default(1))
///     .build()
///     .unwrap();
///
/// let config = schema
///     .instance()
///     .provider(Arc::new(MemoryProvider::default()))
///     .set("var1", 100000)
///     .load()
///     .unwrap();
/// assert_eq!(config.get("var1"), Some(&confbind::Value::Integer(100000)));
/// ```
#[derive(Debug, Clone)]
pub struct Instance<'a> {
    schema: &'a Schema,
    provider: Option<Arc<dyn Provider>>,
    overrides: Overrides,
}

impl Instance<'_> {
    /// Provider for every field, at every depth, that does not carry its
    /// own. Takes precedence over providers declared on the configs.
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(name, value);
        self
    }

    /// Merge `overrides` over any already set.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        for (name, value) in overrides.iter() {
            self.overrides.insert(name, value.clone());
        }
        self
    }

    /// Take overrides from the top-level entries of a serializable value,
    /// e.g. parsed command-line flags. `None` fields are skipped.
    pub fn overrides_from<S: Serialize>(self, source: &S) -> Result<Self, BindError> {
        Ok(self.overrides(Overrides::from_serialize(source)?))
    }

    /// Resolve every field, stopping at the first failure.
    pub fn load(&self) -> Result<ResolvedConfig, BindError> {
        resolve::assemble(self.schema, self.provider.as_ref(), &self.overrides, Mode::FailFast)
    }

    /// Resolve every field and report all failures at once as
    /// [`BindError::Unresolved`], in declaration order.
    pub fn report(&self) -> Result<ResolvedConfig, BindError> {
        resolve::assemble(self.schema, self.provider.as_ref(), &self.overrides, Mode::Collect)
    }

    /// [`load`](Self::load), then deserialize into `T`.
    pub fn load_into<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        self.load()?.deserialize()
    }
}
