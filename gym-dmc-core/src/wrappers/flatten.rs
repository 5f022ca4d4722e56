//! Flattens dict observations.
use crate::{
    record::RecordValue, registration::EnvSpec, Array, Env, Metadata, Observation, RenderMode,
    RenderOpts, Rendered, Space, Step,
};
use anyhow::Result;
use log::debug;

/// Info key holding the observation before flattening.
pub const ORIGINAL_OBSERVATION_KEY: &str = "observations_original";

/// Replaces the observation space with its flattened box and flattens every
/// observation in the same key order.
pub struct FlattenObservation<E> {
    env: E,
    observation_space: Space,
    include_original: bool,
}

impl<E: Env> FlattenObservation<E> {
    /// Wraps `env`.
    ///
    /// With `include_original`, the info of every step carries the structured
    /// observation under [`ORIGINAL_OBSERVATION_KEY`]. `reset` returns no info,
    /// so the observation it returns is only available flattened.
    pub fn new(env: E, include_original: bool) -> Self {
        let observation_space = Space::Box(env.observation_space().flatten_space());
        debug!(
            "Flatten observation space into {:?}",
            observation_space.shape()
        );
        Self {
            env,
            observation_space,
            include_original,
        }
    }

    /// Flattens an observation of the wrapped environment.
    pub fn observation(&self, obs: &Observation) -> Result<Observation> {
        Ok(Observation::Array(self.env.observation_space().flatten(obs)?))
    }

    /// Returns the wrapped environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Env for FlattenObservation<E> {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Observation> {
        let obs = self.env.reset()?;
        self.observation(&obs)
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        let mut step = self.env.step(act)?;
        let obs = self.observation(&step.obs)?;
        let original = std::mem::replace(&mut step.obs, obs);
        if self.include_original {
            step.info
                .insert(ORIGINAL_OBSERVATION_KEY, RecordValue::Observation(original));
        }
        Ok(step)
    }

    fn render(&mut self, mode: RenderMode, opts: &RenderOpts) -> Result<Rendered> {
        self.env.render(mode, opts)
    }

    fn seed(&mut self, seed: u64) {
        self.env.seed(seed)
    }

    fn sample_action(&mut self) -> Array {
        self.env.sample_action()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }

    fn spec(&self) -> Option<&EnvSpec> {
        self.env.spec()
    }

    fn set_spec(&mut self, spec: EnvSpec) {
        self.env.set_spec(spec)
    }

    fn metadata(&self) -> Metadata {
        self.env.metadata()
    }

    fn max_episode_steps(&self) -> Option<usize> {
        self.env.max_episode_steps()
    }
}
