//! Enforces `reset` before `step`.
use crate::{
    error::GymDmcError, registration::EnvSpec, Array, Env, Metadata, Observation, RenderMode,
    RenderOpts, Rendered, Space, Step,
};
use anyhow::Result;

/// Rejects `step` (and, unless disabled, `render`) before the first `reset`,
/// and `step` after the end of an episode until the next `reset`.
pub struct OrderEnforcing<E> {
    env: E,
    has_reset: bool,
    needs_reset: bool,
    disable_render_order_enforcing: bool,
}

impl<E: Env> OrderEnforcing<E> {
    /// Wraps `env`.
    pub fn new(env: E) -> Self {
        Self {
            env,
            has_reset: false,
            needs_reset: true,
            disable_render_order_enforcing: false,
        }
    }

    /// Allows `render` before the first `reset`.
    pub fn disable_render_order_enforcing(mut self, v: bool) -> Self {
        self.disable_render_order_enforcing = v;
        self
    }

    /// Returns `true` once `reset` has been called.
    pub fn has_reset(&self) -> bool {
        self.has_reset
    }

    /// Returns the wrapped environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Env for OrderEnforcing<E> {
    fn observation_space(&self) -> &Space {
        self.env.observation_space()
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Observation> {
        let obs = self.env.reset()?;
        self.has_reset = true;
        self.needs_reset = false;
        Ok(obs)
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        if self.needs_reset {
            return Err(GymDmcError::ResetNeeded("step").into());
        }
        let step = self.env.step(act)?;
        self.needs_reset = step.is_done();
        Ok(step)
    }

    fn render(&mut self, mode: RenderMode, opts: &RenderOpts) -> Result<Rendered> {
        if !self.disable_render_order_enforcing && !self.has_reset {
            return Err(GymDmcError::ResetNeeded("render").into());
        }
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
