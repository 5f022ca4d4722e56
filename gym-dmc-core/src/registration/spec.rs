//! Specification of a registered environment.
use super::{
    env_id::{canonical_id, parse_env_id},
    kwargs::{merge_kwargs, Kwargs},
};
use crate::{
    error::GymDmcError,
    wrappers::{OrderEnforcing, TimeLimit},
    Env,
};
use anyhow::Result;
use log::debug;
use std::{fmt, sync::Arc};

/// Constructs an environment from its canonical id and merged keyword arguments.
pub type Constructor = Arc<dyn Fn(&str, &Kwargs) -> Result<Box<dyn Env>> + Send + Sync>;

/// How an [`EnvSpec`] constructs its environment.
#[derive(Clone)]
pub enum EntryPoint {
    /// A constructor given directly.
    Callable(Constructor),

    /// A constructor registered by name, e.g. `"gym_dmc:make_env"`, in the
    /// constructor table of an [`EnvRegistry`](super::EnvRegistry).
    Named(String),
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Callable(_) => write!(f, "<callable>"),
            EntryPoint::Named(name) => write!(f, "{}", name),
        }
    }
}

impl<F> From<F> for EntryPoint
where
    F: Fn(&str, &Kwargs) -> Result<Box<dyn Env>> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        EntryPoint::Callable(Arc::new(f))
    }
}

/// A specification for a particular instance of the environment.
///
/// `namespace`, `name` and `version` are parsed from `id_requested` at
/// construction. [`EnvSpec::id`] is recomputed from `name` and `version` on
/// every call, so changing those fields changes the id.
#[derive(Clone)]
pub struct EnvSpec {
    /// The id the spec was created with.
    pub id_requested: String,

    /// How the environment is constructed.
    pub entry_point: EntryPoint,

    /// The reward threshold before the task is considered solved.
    pub reward_threshold: Option<f64>,

    /// Whether this environment is non-deterministic even after seeding.
    pub nondeterministic: bool,

    /// The maximum number of steps that an episode can consist of.
    pub max_episode_steps: Option<usize>,

    /// Whether to wrap the environment in an [`OrderEnforcing`] wrapper.
    pub order_enforce: bool,

    /// The keyword arguments passed to the constructor.
    pub kwargs: Kwargs,

    /// Namespace parsed from the id.
    pub namespace: Option<String>,

    /// Name parsed from the id.
    pub name: String,

    /// Version parsed from the id.
    pub version: Option<u64>,
}

impl EnvSpec {
    /// Creates a spec, failing if `id` is malformed.
    pub fn new(id: impl Into<String>, entry_point: impl Into<EntryPoint>) -> Result<Self> {
        let id_requested = id.into();
        let (namespace, name, version) = parse_env_id(&id_requested)?;

        Ok(Self {
            id_requested,
            entry_point: entry_point.into(),
            reward_threshold: None,
            nondeterministic: false,
            max_episode_steps: None,
            order_enforce: true,
            kwargs: Kwargs::new(),
            namespace,
            name,
            version,
        })
    }

    /// Creates a spec whose constructor is looked up by name in the registry.
    pub fn named(id: impl Into<String>, entry_point: impl Into<String>) -> Result<Self> {
        Self::new(id, EntryPoint::Named(entry_point.into()))
    }

    /// The canonical id, `name[-vVERSION]`.
    pub fn id(&self) -> String {
        canonical_id(&self.name, self.version)
    }

    /// Sets the default keyword arguments.
    pub fn kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Sets the maximum number of steps of an episode.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = Some(v);
        self
    }

    /// Sets the reward threshold.
    pub fn reward_threshold(mut self, v: f64) -> Self {
        self.reward_threshold = Some(v);
        self
    }

    /// Sets the non-determinism flag.
    pub fn nondeterministic(mut self, v: bool) -> Self {
        self.nondeterministic = v;
        self
    }

    /// Sets whether to enforce calling `reset` before `step`.
    pub fn order_enforce(mut self, v: bool) -> Self {
        self.order_enforce = v;
        self
    }

    /// Instantiates the environment with the default kwargs updated by `kwargs`.
    ///
    /// Fails with [`GymDmcError::ConstructorNotFound`] for a named entry point;
    /// those are resolved by [`EnvRegistry::make`](super::EnvRegistry::make).
    pub fn make(&self, kwargs: &Kwargs) -> Result<Box<dyn Env>> {
        match &self.entry_point {
            EntryPoint::Callable(ctor) => self.make_with(ctor, kwargs),
            EntryPoint::Named(name) => Err(GymDmcError::ConstructorNotFound(name.clone()).into()),
        }
    }

    pub(crate) fn make_with(&self, ctor: &Constructor, kwargs: &Kwargs) -> Result<Box<dyn Env>> {
        let kwargs = merge_kwargs(&self.kwargs, kwargs);
        let id = self.id();
        debug!("Make {} with {:?}", id, kwargs);
        let mut env = ctor(&id, &kwargs)?;

        // Make the environment aware of which spec it came from.
        let mut spec = self.clone();
        spec.kwargs = kwargs;
        if spec.max_episode_steps.is_none() {
            spec.max_episode_steps = env.max_episode_steps();
        }
        env.set_spec(spec);

        if self.order_enforce {
            env = Box::new(OrderEnforcing::new(env));
        }

        if env.spec().is_none() {
            return Err(GymDmcError::SpecNotSet.into());
        }

        if let Some(max_episode_steps) = self.max_episode_steps {
            env = Box::new(TimeLimit::new(env, max_episode_steps));
        }

        Ok(env)
    }
}

impl fmt::Debug for EnvSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSpec")
            .field("id_requested", &self.id_requested)
            .field("entry_point", &self.entry_point)
            .field("reward_threshold", &self.reward_threshold)
            .field("nondeterministic", &self.nondeterministic)
            .field("max_episode_steps", &self.max_episode_steps)
            .field("order_enforce", &self.order_enforce)
            .field("kwargs", &self.kwargs)
            .finish()
    }
}
