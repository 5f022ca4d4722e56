//! This module is used for tests.
use crate::{
    error::GymDmcError, record::Record, registration::EnvSpec, Array, BoxSpace, DType, Env,
    Observation, RenderMode, RenderOpts, Rendered, Space, Step,
};
use anyhow::Result;
use std::collections::BTreeMap;

/// Dummy environment with a dict observation `{"position": [2], "velocity": [1]}`.
///
/// Every step adds the action to the velocity and yields a reward of 1. The
/// episode terminates after `terminate_after` steps, if set.
pub struct DummyEnv {
    observation_space: Space,
    action_space: Space,
    rng: fastrand::Rng,
    spec: Option<EnvSpec>,
    terminate_after: Option<usize>,
    position: [f64; 2],
    velocity: f64,

    /// Number of steps since the last reset.
    pub n_steps: usize,

    /// Number of resets.
    pub n_resets: usize,

    /// Set by [`Env::close`].
    pub closed: bool,
}

impl DummyEnv {
    /// Creates the environment.
    pub fn new(terminate_after: Option<usize>) -> Self {
        let mut d = BTreeMap::new();
        d.insert("position".to_string(), BoxSpace::unbounded(&[2], DType::F64));
        d.insert("velocity".to_string(), BoxSpace::unbounded(&[1], DType::F64));

        Self {
            observation_space: Space::Dict(d),
            action_space: Space::Box(BoxSpace::uniform(&[1], -1.0, 1.0, DType::F64)),
            rng: fastrand::Rng::with_seed(0),
            spec: None,
            terminate_after,
            position: [0.0; 2],
            velocity: 0.0,
            n_steps: 0,
            n_resets: 0,
            closed: false,
        }
    }

    fn obs(&self) -> Observation {
        let mut d = BTreeMap::new();
        d.insert("position".to_string(), Array::from(self.position.to_vec()));
        d.insert("velocity".to_string(), Array::from(vec![self.velocity]));
        Observation::Dict(d)
    }
}

impl Env for DummyEnv {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self) -> Result<Observation> {
        self.position = [0.0; 2];
        self.velocity = 0.0;
        self.n_steps = 0;
        self.n_resets += 1;
        Ok(self.obs())
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        if act.len() != 1 {
            return Err(GymDmcError::InvalidAction(format!("shape {:?}", act.shape())).into());
        }
        self.velocity += act.to_flat_vec::<f64>()[0];
        self.position[0] += self.velocity;
        self.position[1] += 1.0;
        self.n_steps += 1;
        let is_terminated = self
            .terminate_after
            .map(|n| self.n_steps >= n)
            .unwrap_or(false);
        Ok(Step::new(self.obs(), 1.0, is_terminated, false, Record::empty()))
    }

    fn render(&mut self, mode: RenderMode, _opts: &RenderOpts) -> Result<Rendered> {
        Err(GymDmcError::UnsupportedRenderMode(mode.to_string()).into())
    }

    fn seed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
    }

    fn sample_action(&mut self) -> Array {
        match self.action_space.sample(&mut self.rng) {
            Observation::Array(a) => a,
            Observation::Dict(_) => unreachable!(),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn spec(&self) -> Option<&EnvSpec> {
        self.spec.as_ref()
    }

    fn set_spec(&mut self, spec: EnvSpec) {
        self.spec = Some(spec);
    }
}
