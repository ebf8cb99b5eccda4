use std::sync::Arc;

use toml::Value;

use crate::caster::type_name_of;
use crate::error::BindError;
use crate::field::{FieldSpec, field};
use crate::provider::Provider;
use crate::schema::{FieldEntry, Node, Schema, SubConfigEntry};
use crate::types::{Annotation, KeyPath, Prefix};

/// A declared attribute that reads its value under a different lookup key
/// than its own name.
///
/// ```
/// use confbind::{Alias, ScalarType};
///
/// // `port` is looked up as `APP_PORT`, cast to an integer, 8080 if absent.
/// let port = Alias::new(ScalarType::Int, "APP_PORT").default(8080);
/// ```
#[derive(Debug, Clone)]
pub struct Alias {
    annotation: Annotation,
    key: String,
    assigned: Option<Assigned>,
}

#[derive(Debug, Clone)]
enum Assigned {
    Literal(Value),
    Field(FieldSpec),
}

impl Alias {
    pub fn new(annotation: impl Into<Annotation>, key: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
            key: key.into(),
            assigned: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.assigned = Some(Assigned::Literal(value.into()));
        self
    }

    /// Attach an explicit field. The field is kept as declared; the alias
    /// only fills in its key and caster when they are missing.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.assigned = Some(Assigned::Field(spec));
        self
    }
}

#[derive(Debug, Clone)]
enum Declaration {
    Typed(Annotation),
    Alias(Alias),
    Field {
        annotation: Option<Annotation>,
        spec: FieldSpec,
    },
    Literal {
        annotation: Annotation,
        value: Value,
    },
    SubConfig(ConfigBuilder),
}

/// Declares the shape of a config: its fields, their types and defaults,
/// and nested sub-configs, in declaration order.
///
/// The builder is `Clone`. Declaring a name that already exists replaces that
/// declaration in place, so a variant of a config is a clone with a few
/// declarations swapped:
///
/// ```
/// use confbind::{field, Schema, ScalarType};
///
/// let base = Schema::builder("Base")
///     .literal("debug", ScalarType::Bool, false)
///     .field("login", field());
/// let prod = base.clone()
///     .prefix("PROD")
///     .field("login", field().default("prod@example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    name: String,
    provider: Option<Arc<dyn Provider>>,
    prefix: Option<Prefix>,
    declarations: Vec<(String, Declaration)>,
}

impl ConfigBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: None,
            prefix: None,
            declarations: Vec::new(),
        }
    }

    /// Default provider for this config's fields and, unless they declare
    /// their own, its sub-configs.
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Namespace generated keys, see [`Prefix`].
    pub fn prefix(mut self, prefix: impl Into<Prefix>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// An attribute declared by type only. Its key is generated from the
    /// attribute name and it is cast with the type's built-in caster.
    pub fn typed(self, name: &str, annotation: impl Into<Annotation>) -> Self {
        self.declare(name, Declaration::Typed(annotation.into()))
    }

    pub fn alias(self, name: &str, alias: Alias) -> Self {
        self.declare(name, Declaration::Alias(alias))
    }

    /// An explicit field. A missing key is generated from the attribute name.
    pub fn field(self, name: &str, spec: FieldSpec) -> Self {
        self.declare(
            name,
            Declaration::Field {
                annotation: None,
                spec,
            },
        )
    }

    /// An explicit field with a declared type. The type's caster is used
    /// unless the field names its own.
    pub fn typed_field(self, name: &str, annotation: impl Into<Annotation>, spec: FieldSpec) -> Self {
        self.declare(
            name,
            Declaration::Field {
                annotation: Some(annotation.into()),
                spec,
            },
        )
    }

    /// A typed attribute with a literal default. The literal must already be
    /// of the declared type.
    pub fn literal(self, name: &str, annotation: impl Into<Annotation>, value: impl Into<Value>) -> Self {
        self.declare(
            name,
            Declaration::Literal {
                annotation: annotation.into(),
                value: value.into(),
            },
        )
    }

    /// A nested config, resolved recursively under this one.
    pub fn sub_config(self, name: &str, config: ConfigBuilder) -> Self {
        self.declare(name, Declaration::SubConfig(config))
    }

    fn declare(mut self, name: &str, declaration: Declaration) -> Self {
        match self.declarations.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = declaration,
            None => self.declarations.push((name.to_string(), declaration)),
        }
        self
    }

    /// Classify every declaration and produce the immutable [`Schema`].
    ///
    /// Fails fast on anything that cannot become a field: a literal of the
    /// wrong type, an opaque type with no field to cast it, or a reference
    /// to a field that does not exist.
    pub fn build(self) -> Result<Schema, BindError> {
        let path = KeyPath::root(self.prefix.as_ref());
        self.build_at(&path)
    }

    fn build_at(self, path: &KeyPath) -> Result<Schema, BindError> {
        let mut fields = Vec::new();
        let mut sub_configs = Vec::new();

        for (name, declaration) in self.declarations {
            let declaration_error = |reason: String| BindError::Declaration {
                config: self.name.clone(),
                name: name.clone(),
                reason,
            };

            let spec = match declaration {
                Declaration::SubConfig(child) => {
                    let child_path = path.child(&name, child.prefix.as_ref());
                    let schema = child.build_at(&child_path)?;
                    sub_configs.push(SubConfigEntry { name, schema });
                    continue;
                }
                Declaration::Typed(Annotation::Scalar(ty)) => field()
                    .key(path.key_for(&name))
                    .shared_caster(ty.caster()),
                Declaration::Typed(Annotation::Opaque(type_name)) => {
                    return Err(declaration_error(format!(
                        "type '{type_name}' has no built-in caster; declare it with an explicit \
                         field and caster, or use constant_field"
                    )));
                }
                Declaration::Alias(alias) => {
                    let spec = match alias.assigned {
                        Some(Assigned::Field(spec)) => spec,
                        Some(Assigned::Literal(value)) => {
                            check_literal(&alias.annotation, &value).map_err(declaration_error)?;
                            field().default(value)
                        }
                        None => field(),
                    };
                    backfill(spec, Some(&alias.annotation), || path.key_for(&alias.key))
                }
                Declaration::Field { annotation, spec } => {
                    backfill(spec, annotation.as_ref(), || path.key_for(&name))
                }
                Declaration::Literal { annotation, value } => {
                    check_literal(&annotation, &value).map_err(declaration_error)?;
                    let spec = field().key(path.key_for(&name)).default(value);
                    backfill(spec, Some(&annotation), || path.key_for(&name))
                }
            };
            fields.push(FieldEntry { name, spec });
        }

        check_references(&self.name, &fields)?;

        Ok(Schema::from_node(Node {
            name: self.name,
            prefix: self.prefix,
            provider: self.provider,
            fields,
            sub_configs,
        }))
    }
}

/// Fill in what an explicit field left unset, never overwriting what it set.
fn backfill(
    mut spec: FieldSpec,
    annotation: Option<&Annotation>,
    key: impl FnOnce() -> String,
) -> FieldSpec {
    if spec.key.is_none() && spec.auto_key {
        spec.key = Some(key());
    }
    if spec.caster.is_none()
        && let Some(Annotation::Scalar(ty)) = annotation
    {
        spec.caster = Some(ty.caster());
    }
    spec
}

fn check_literal(annotation: &Annotation, value: &Value) -> Result<(), String> {
    match annotation {
        Annotation::Scalar(ty) if ty.accepts(value) => Ok(()),
        Annotation::Scalar(ty) => Err(format!(
            "value {value} of type {} is not assignable to type {ty}",
            type_name_of(value)
        )),
        Annotation::Opaque(type_name) => Err(format!(
            "a literal of type '{type_name}' cannot be bound to a source; use constant_field"
        )),
    }
}

fn check_references(config: &str, fields: &[FieldEntry]) -> Result<(), BindError> {
    for entry in fields {
        for target in entry.spec.sibling_refs() {
            if !fields.iter().any(|f| f.name == target) {
                return Err(BindError::UnknownReference {
                    config: config.to_string(),
                    name: entry.name.clone(),
                    target: target.to_string(),
                });
            }
        }
    }
    Ok(())
}
