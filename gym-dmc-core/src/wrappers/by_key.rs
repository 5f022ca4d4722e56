//! Projects a dict observation onto one key.
use crate::{
    error::GymDmcError, registration::EnvSpec, Array, Env, Metadata, Observation, RenderMode,
    RenderOpts, Rendered, Space, Step,
};
use anyhow::Result;

/// Replaces the observation space with one named sub-space, e.g. `"pixels"`,
/// and drops every other sub-observation.
pub struct ObservationByKey<E> {
    env: E,
    obs_key: String,
    observation_space: Space,
}

impl<E: Env> ObservationByKey<E> {
    /// Wraps `env`, failing if `obs_key` is not a key of its observation space.
    pub fn new(env: E, obs_key: impl Into<String>) -> Result<Self> {
        let obs_key = obs_key.into();
        let space = env.observation_space();
        let sub_space = space
            .get(&obs_key)
            .cloned()
            .ok_or_else(|| GymDmcError::MissingObservationKey {
                key: obs_key.clone(),
                available: space.keys(),
            })?;

        Ok(Self {
            env,
            obs_key,
            observation_space: Space::Box(sub_space),
        })
    }

    /// The projected key.
    pub fn obs_key(&self) -> &str {
        &self.obs_key
    }

    /// Returns the wrapped environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Env for ObservationByKey<E> {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Observation> {
        let obs = self.env.reset()?;
        Ok(Observation::Array(obs.take(&self.obs_key)?))
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        let mut step = self.env.step(act)?;
        let obs = std::mem::replace(&mut step.obs, Observation::Dict(Default::default()));
        step.obs = Observation::Array(obs.take(&self.obs_key)?);
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
