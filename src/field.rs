//! Field specifications and the single-field resolution algorithm.
//!
//! A [`FieldSpec`] is an immutable template: lookup key, default, provider,
//! caster. Resolving it is a one-shot computation that is re-run on every
//! call; nothing is memoized on the spec, so the same spec can be shared by
//! several configs and reflect whatever provider and overrides are active for
//! each assembly.
//!
//! Resolution order:
//!
//! 1. No key: treated as not found.
//! 2. Ask the provider. On not-found, return the default (literal, deferred
//!    thunk, or derived value) **uncasted**, or propagate if there is none.
//! 3. Cast the raw string. On a cast failure, return the raw string if the
//!    field ignores cast errors, otherwise propagate.

use std::fmt;
use std::sync::Arc;

use toml::Value;
use tracing::trace;

use crate::caster::{Caster, IdentityCaster};
use crate::error::BindError;
use crate::provider::{Provider, default_provider};

pub type Thunk = Arc<dyn Fn() -> Value + Send + Sync>;
pub type Combine = Arc<dyn Fn(&[Value]) -> Result<Value, BindError> + Send + Sync>;

/// What a field resolves to when its provider has nothing.
#[derive(Clone, Default)]
pub enum DefaultValue {
    #[default]
    None,
    Literal(Value),
    /// Evaluated only on the fallback path.
    Deferred(Thunk),
    /// The value of a reference field, computed from other values.
    Derived(Derivation),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::None => f.write_str("None"),
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Deferred(_) => f.write_str("Deferred(..)"),
            DefaultValue::Derived(d) => f.debug_tuple("Derived").field(d).finish(),
        }
    }
}

/// One input of a reference field.
#[derive(Debug, Clone)]
pub enum Input {
    /// Another field of the same config, by attribute name. Reads the value
    /// that field takes in the current assembly, overrides included.
    Sibling(String),
    /// A standalone field, resolved on its own.
    Field(Box<FieldSpec>),
    Const(Value),
}

impl Input {
    pub fn constant(value: impl Into<Value>) -> Self {
        Input::Const(value.into())
    }
}

impl From<FieldSpec> for Input {
    fn from(spec: FieldSpec) -> Self {
        Input::Field(Box::new(spec))
    }
}

/// Shorthand for [`Input::Sibling`].
pub fn sibling(name: impl Into<String>) -> Input {
    Input::Sibling(name.into())
}

#[derive(Clone)]
pub struct Derivation {
    inputs: Vec<Input>,
    combine: Combine,
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation")
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

impl Derivation {
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    fn evaluate(&self, inherited: &dyn Provider, scope: &mut dyn Scope) -> Result<Value, BindError> {
        let mut values = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            values.push(match input {
                Input::Sibling(name) => scope.sibling(name)?,
                Input::Field(spec) => spec.resolve_in(inherited, scope)?,
                Input::Const(value) => value.clone(),
            });
        }
        (self.combine)(&values)
    }
}

/// Access to the other fields of the config being assembled.
pub(crate) trait Scope {
    fn sibling(&mut self, name: &str) -> Result<Value, BindError>;
}

/// Scope of a field resolved on its own, outside any config.
struct Detached;

impl Scope for Detached {
    fn sibling(&mut self, name: &str) -> Result<Value, BindError> {
        Err(BindError::Misuse(format!(
            "field '{name}' can only be referenced from inside a config"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub(crate) key: Option<String>,
    /// Whether a missing key may be generated from the attribute name.
    pub(crate) auto_key: bool,
    pub(crate) default: DefaultValue,
    pub(crate) provider: Option<Arc<dyn Provider>>,
    pub(crate) caster: Option<Arc<dyn Caster>>,
    pub(crate) ignore_cast_error: bool,
}

/// Declare a field. Without a [`key`](FieldSpec::key) the config generates
/// one from the attribute name.
pub fn field() -> FieldSpec {
    FieldSpec {
        key: None,
        auto_key: true,
        default: DefaultValue::None,
        provider: None,
        caster: None,
        ignore_cast_error: false,
    }
}

/// A field that always resolves to `value` and never consults a provider.
pub fn constant_field(value: impl Into<Value>) -> FieldSpec {
    FieldSpec {
        auto_key: false,
        default: DefaultValue::Literal(value.into()),
        ..field()
    }
}

/// A field whose value is `combine` applied to the current values of
/// `inputs`, in order.
///
/// ```
/// use confbind::{reference_field, sibling, Value};
///
/// let greeting = reference_field([sibling("money"), sibling("name")], |v| {
///     Ok(Value::String(format!("Hello, my name is {} and I'm rich for {}",
///         v[1].as_str().unwrap_or_default(), v[0])))
/// });
/// ```
pub fn reference_field<I, F>(inputs: I, combine: F) -> FieldSpec
where
    I: IntoIterator<Item = Input>,
    F: Fn(&[Value]) -> Result<Value, BindError> + Send + Sync + 'static,
{
    FieldSpec {
        auto_key: false,
        default: DefaultValue::Derived(Derivation {
            inputs: inputs.into_iter().collect(),
            combine: Arc::new(combine),
        }),
        ..field()
    }
}

impl FieldSpec {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Literal(value.into());
        self
    }

    /// A default computed on demand, each time the fallback is taken.
    pub fn default_with<F>(mut self, thunk: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = DefaultValue::Deferred(Arc::new(thunk));
        self
    }

    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn caster<C: Caster + 'static>(self, caster: C) -> Self {
        self.shared_caster(Arc::new(caster))
    }

    pub fn shared_caster(mut self, caster: Arc<dyn Caster>) -> Self {
        self.caster = Some(caster);
        self
    }

    /// Keep the raw string instead of failing when the caster rejects it.
    pub fn ignore_cast_error(mut self, ignore: bool) -> Self {
        self.ignore_cast_error = ignore;
        self
    }

    pub fn lookup_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, DefaultValue::None)
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.default, DefaultValue::Derived(_))
    }

    pub fn caster_name(&self) -> &str {
        self.effective_caster().name()
    }

    fn effective_caster(&self) -> &dyn Caster {
        self.caster.as_deref().unwrap_or(&IdentityCaster)
    }

    /// Resolve this field on its own, against its provider or the process
    /// environment.
    pub fn resolve(&self) -> Result<Value, BindError> {
        self.resolve_in(&*default_provider(), &mut Detached)
    }

    /// Like [`resolve`](Self::resolve), with `provider` standing in for a
    /// field that names none.
    pub fn resolve_with(&self, provider: &dyn Provider) -> Result<Value, BindError> {
        self.resolve_in(provider, &mut Detached)
    }

    pub(crate) fn resolve_in(
        &self,
        inherited: &dyn Provider,
        scope: &mut dyn Scope,
    ) -> Result<Value, BindError> {
        let provider: &dyn Provider = match self.provider.as_deref() {
            Some(own) => own,
            None => inherited,
        };
        let looked_up = match &self.key {
            Some(key) => provider.get(key),
            None => Err(BindError::Unnamed),
        };

        let raw = match looked_up {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => return self.fallback(err, inherited, scope),
            Err(err) => return Err(err),
        };

        match self.effective_caster().cast(&raw) {
            Ok(value) => {
                trace!(key = ?self.key, "resolved from provider");
                Ok(value)
            }
            Err(err) if self.ignore_cast_error => {
                trace!(key = ?self.key, caster = %err.caster, "cast failed, keeping raw value");
                Ok(Value::String(err.raw))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn fallback(
        &self,
        not_found: BindError,
        inherited: &dyn Provider,
        scope: &mut dyn Scope,
    ) -> Result<Value, BindError> {
        let value = match &self.default {
            DefaultValue::None => return Err(not_found),
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Deferred(thunk) => thunk(),
            DefaultValue::Derived(derivation) => derivation.evaluate(inherited, scope)?,
        };
        trace!(key = ?self.key, "fell back to default");
        Ok(value)
    }

    /// Names of the sibling fields this field reads, including through
    /// nested standalone inputs.
    pub(crate) fn sibling_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let DefaultValue::Derived(derivation) = &self.default {
            for input in &derivation.inputs {
                match input {
                    Input::Sibling(name) => names.push(name.as_str()),
                    Input::Field(spec) => names.extend(spec.sibling_refs()),
                    Input::Const(_) => {}
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caster::{BoolCaster, IntCaster};
    use crate::provider::MemoryProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn provider(pairs: &[(&str, &str)]) -> MemoryProvider {
        MemoryProvider::new(pairs.iter().copied())
    }

    #[test]
    fn provider_value_is_cast() {
        let spec = field().key("PORT").caster(IntCaster);
        let value = spec.resolve_with(&provider(&[("PORT", "8080")])).unwrap();
        assert_eq!(value, Value::Integer(8080));
    }

    #[test]
    fn missing_key_falls_back_to_literal_default() {
        let spec = field().key("X").default("fallback");
        assert_eq!(
            spec.resolve_with(&provider(&[])).unwrap(),
            Value::String("fallback".into())
        );
    }

    #[test]
    fn default_bypasses_caster() {
        let spec = field().key("DEBUG").default("not-a-bool").caster(BoolCaster);
        assert_eq!(
            spec.resolve_with(&provider(&[])).unwrap(),
            Value::String("not-a-bool".into())
        );
    }

    #[test]
    fn missing_key_without_default_is_not_found() {
        let err = field().key("X").resolve_with(&provider(&[])).unwrap_err();
        assert!(matches!(err, BindError::VariableNotFound { ref key } if key == "X"));
    }

    #[test]
    fn unnamed_field_without_default_fails() {
        let err = field().resolve_with(&provider(&[])).unwrap_err();
        assert!(matches!(err, BindError::Unnamed));
    }

    #[test]
    fn unnamed_field_with_default_uses_it() {
        let spec = field().default(3);
        assert_eq!(spec.resolve_with(&provider(&[])).unwrap(), Value::Integer(3));
    }

    #[test]
    fn falsy_strings_are_present_values() {
        let spec = field().key("ZERO").default("fallback");
        assert_eq!(
            spec.resolve_with(&provider(&[("ZERO", "0")])).unwrap(),
            Value::String("0".into())
        );
        let spec = field().key("EMPTY").default("fallback");
        assert_eq!(
            spec.resolve_with(&provider(&[("EMPTY", "")])).unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn cast_error_propagates() {
        let spec = field().key("PORT").caster(IntCaster);
        let err = spec.resolve_with(&provider(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, BindError::ImpossibleToCast(ref e) if e.raw == "eighty"));
    }

    #[test]
    fn ignored_cast_error_returns_raw() {
        let spec = field().key("PORT").caster(IntCaster).ignore_cast_error(true);
        assert_eq!(
            spec.resolve_with(&provider(&[("PORT", "eighty")])).unwrap(),
            Value::String("eighty".into())
        );
    }

    #[test]
    fn explicit_provider_wins_over_inherited() {
        let own: Arc<dyn Provider> = Arc::new(provider(&[("HOST", "own")]));
        let spec = field().key("HOST").provider(own);
        let value = spec.resolve_with(&provider(&[("HOST", "inherited")])).unwrap();
        assert_eq!(value, Value::String("own".into()));
    }

    #[test]
    fn deferred_default_runs_on_every_fallback_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let spec = field().key("X").default_with(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::Integer(7)
        });

        assert_eq!(spec.resolve_with(&provider(&[("X", "1")])).unwrap(), Value::String("1".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(spec.resolve_with(&provider(&[])).unwrap(), Value::Integer(7));
        assert_eq!(spec.resolve_with(&provider(&[])).unwrap(), Value::Integer(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resolution_is_repeatable() {
        let source = provider(&[("N", "5")]);
        let spec = field().key("N").caster(IntCaster);
        assert_eq!(spec.resolve_with(&source).unwrap(), spec.resolve_with(&source).unwrap());
    }

    #[test]
    fn constant_field_ignores_provider() {
        let spec = constant_field("fixed");
        assert_eq!(spec.lookup_key(), None);
        assert!(!spec.auto_key);
        assert_eq!(
            spec.resolve_with(&provider(&[("fixed", "nope")])).unwrap(),
            Value::String("fixed".into())
        );
    }

    #[test]
    fn standalone_reference_over_fields_and_constants() {
        let money = field().key("MONEY").default(10).caster(IntCaster);
        let spec = reference_field([money.into(), Input::constant(1000)], |v| {
            let m = v[0].as_integer().unwrap_or_default();
            let k = v[1].as_integer().unwrap_or_default();
            Ok(Value::Integer(m * k))
        });
        assert_eq!(spec.resolve_with(&provider(&[])).unwrap(), Value::Integer(10_000));
        assert_eq!(
            spec.resolve_with(&provider(&[("MONEY", "3")])).unwrap(),
            Value::Integer(3000)
        );
    }

    #[test]
    fn reference_combine_error_propagates() {
        let spec = reference_field([Input::constant("x")], |_| {
            Err(BindError::Derivation("no luck".into()))
        });
        assert!(matches!(
            spec.resolve_with(&provider(&[])),
            Err(BindError::Derivation(_))
        ));
    }

    #[test]
    fn sibling_outside_config_is_misuse() {
        let spec = reference_field([sibling("money")], |v| Ok(v[0].clone()));
        assert!(matches!(spec.resolve_with(&provider(&[])), Err(BindError::Misuse(_))));
    }

    #[test]
    fn sibling_refs_include_nested_inputs() {
        let inner = reference_field([sibling("a")], |v| Ok(v[0].clone()));
        let outer = reference_field([sibling("b"), inner.into()], |v| Ok(v[0].clone()));
        assert_eq!(outer.sibling_refs(), vec!["b", "a"]);
    }
}
