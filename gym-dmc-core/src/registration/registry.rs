//! Registry of environment specs.
use super::{
    env_id::{canonical_id, parse_env_id},
    kwargs::Kwargs,
    spec::{Constructor, EntryPoint, EnvSpec},
};
use crate::{error::GymDmcError, Env};
use anyhow::Result;
use log::debug;
use std::{collections::HashMap, fmt, sync::Arc};

/// Registers environments by id.
///
/// Ids remain stable over time and are guaranteed to resolve to the same
/// environment dynamics. The registry is an ordinary value: build it at
/// start-up, register every environment, then hand it to whatever calls
/// [`EnvRegistry::make`].
#[derive(Default)]
pub struct EnvRegistry {
    specs: HashMap<String, EnvSpec>,
    constructors: HashMap<String, Constructor>,
}

impl EnvRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `spec` under its canonical id, replacing any previous spec with that id.
    pub fn register(&mut self, spec: EnvSpec) {
        let id = spec.id();
        if self.specs.contains_key(&id) {
            debug!("Overriding environment {}", id);
        }
        self.specs.insert(id, spec);
    }

    /// Creates and stores a spec from an id, an entry point and default kwargs.
    pub fn register_id(
        &mut self,
        id: &str,
        entry_point: impl Into<EntryPoint>,
        kwargs: Kwargs,
    ) -> Result<()> {
        self.register(EnvSpec::new(id, entry_point)?.kwargs(kwargs));
        Ok(())
    }

    /// Adds a constructor that [`EntryPoint::Named`] entry points can refer to.
    pub fn register_constructor<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, &Kwargs) -> Result<Box<dyn Env>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(f));
    }

    /// Returns the spec registered under `id`.
    pub fn spec(&self, id: &str) -> Option<&EnvSpec> {
        self.specs.get(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = self.specs.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// Number of registered specs.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Makes the environment registered under `id` with its default kwargs updated by `kwargs`.
    ///
    /// A `module:` prefix, as in `"dmc:Walker-walk-v1"`, is stripped before lookup.
    pub fn make(&self, id: &str, kwargs: &Kwargs) -> Result<Box<dyn Env>> {
        let spec = self.lookup(id)?;
        let ctor = match &spec.entry_point {
            EntryPoint::Callable(ctor) => ctor.clone(),
            EntryPoint::Named(name) => self
                .constructors
                .get(name)
                .cloned()
                .ok_or_else(|| GymDmcError::ConstructorNotFound(name.clone()))?,
        };
        spec.make_with(&ctor, kwargs)
    }

    fn lookup(&self, id: &str) -> Result<&EnvSpec> {
        if let Some(spec) = self.specs.get(id) {
            return Ok(spec);
        }
        let id = match id.split_once(':') {
            Some((_module, rest)) if !rest.is_empty() => rest,
            _ => id,
        };
        let (_namespace, name, version) = parse_env_id(id)?;
        let id = canonical_id(&name, version);
        self.specs
            .get(&id)
            .ok_or_else(|| GymDmcError::UnknownEnvironment(id).into())
    }
}

impl fmt::Debug for EnvRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.constructors.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("EnvRegistry")
            .field("ids", &self.ids())
            .field("constructors", &names)
            .finish()
    }
}
