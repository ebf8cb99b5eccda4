//! Assembly: walk a [`Schema`] depth first and resolve every field.
//!
//! For each config node:
//!
//! 1. Pick the node's provider: the call-time provider, else the provider
//!    the node declares, else the one its parent ended up with, else the
//!    process environment.
//! 2. Resolve fields in declaration order. An override named like the field
//!    is used as-is; otherwise the field's own resolution runs.
//! 3. Resolve sub-configs, each replaced wholesale by an override of the same
//!    name or assembled recursively with the same overrides.
//!
//! Reference fields read siblings through per-node slots, so a sibling is
//! resolved once per assembly (on demand, whatever the declaration order)
//! and overrides flow into everything derived from it.

use std::sync::Arc;

use toml::{Table, Value};
use tracing::{debug, trace};

use crate::error::BindError;
use crate::field::Scope;
use crate::overrides::Overrides;
use crate::provider::{Provider, default_provider};
use crate::resolved::ResolvedConfig;
use crate::schema::{Node, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Stop at the first failure and return it.
    FailFast,
    /// Keep going and return every failure as [`BindError::Unresolved`].
    Collect,
}

pub(crate) fn assemble(
    schema: &Schema,
    call_provider: Option<&Arc<dyn Provider>>,
    overrides: &Overrides,
    mode: Mode,
) -> Result<ResolvedConfig, BindError> {
    let mut assembly = Assembly {
        call_provider,
        overrides,
        mode,
        errors: Vec::new(),
    };
    let table = assembly.node(schema.node(), &default_provider())?;

    if !assembly.errors.is_empty() {
        return Err(BindError::Unresolved(assembly.errors));
    }
    Ok(ResolvedConfig::new(schema.name(), table))
}

struct Assembly<'a> {
    call_provider: Option<&'a Arc<dyn Provider>>,
    overrides: &'a Overrides,
    mode: Mode,
    errors: Vec<BindError>,
}

impl Assembly<'_> {
    fn node(&mut self, node: &Node, inherited: &Arc<dyn Provider>) -> Result<Table, BindError> {
        let provider = self
            .call_provider
            .or(node.provider.as_ref())
            .unwrap_or(inherited)
            .clone();

        let mut table = Table::new();
        let mut scope = NodeScope::new(node, &*provider, self.overrides);
        for (index, entry) in node.fields.iter().enumerate() {
            match scope.resolve(index) {
                Ok(value) => {
                    table.insert(entry.name.clone(), value);
                }
                Err(err) => self.fail(err)?,
            }
        }

        for sub in &node.sub_configs {
            if let Some(value) = self.overrides.get(&sub.name) {
                trace!(config = %node.name, sub_config = %sub.name, "sub-config overridden");
                table.insert(sub.name.clone(), value.clone());
                continue;
            }
            let nested = self.node(sub.schema.node(), &provider)?;
            table.insert(sub.name.clone(), Value::Table(nested));
        }

        debug!(
            config = %node.name,
            fields = node.fields.len(),
            sub_configs = node.sub_configs.len(),
            "assembled config"
        );
        Ok(table)
    }

    fn fail(&mut self, err: BindError) -> Result<(), BindError> {
        match self.mode {
            Mode::FailFast => Err(err),
            Mode::Collect => {
                self.errors.push(err);
                Ok(())
            }
        }
    }
}

enum Slot {
    Pending,
    Resolving,
    Done(Value),
}

/// The fields of one node during one assembly.
struct NodeScope<'a> {
    node: &'a Node,
    provider: &'a dyn Provider,
    overrides: &'a Overrides,
    slots: Vec<Slot>,
}

impl<'a> NodeScope<'a> {
    fn new(node: &'a Node, provider: &'a dyn Provider, overrides: &'a Overrides) -> Self {
        Self {
            node,
            provider,
            overrides,
            slots: node.fields.iter().map(|_| Slot::Pending).collect(),
        }
    }

    fn resolve(&mut self, index: usize) -> Result<Value, BindError> {
        let node = self.node;
        let entry = &node.fields[index];

        match &self.slots[index] {
            Slot::Done(value) => return Ok(value.clone()),
            Slot::Resolving => {
                return Err(BindError::CircularReference {
                    config: node.name.clone(),
                    name: entry.name.clone(),
                });
            }
            Slot::Pending => {}
        }

        if let Some(value) = self.overrides.get(&entry.name) {
            trace!(config = %node.name, field = %entry.name, "field overridden");
            self.slots[index] = Slot::Done(value.clone());
            return Ok(value.clone());
        }

        self.slots[index] = Slot::Resolving;
        let provider = self.provider;
        match entry.spec.resolve_in(provider, self) {
            Ok(value) => {
                self.slots[index] = Slot::Done(value.clone());
                Ok(value)
            }
            Err(err) => {
                // A failed field is retried, and fails again, if something
                // else reads it.
                self.slots[index] = Slot::Pending;
                Err(err)
            }
        }
    }
}

impl Scope for NodeScope<'_> {
    fn sibling(&mut self, name: &str) -> Result<Value, BindError> {
        let node = self.node;
        match node.fields.iter().position(|f| f.name == name) {
            Some(index) => self.resolve(index),
            None => Err(BindError::Misuse(format!(
                "'{name}' is not a field of {}",
                node.name
            ))),
        }
    }
}
