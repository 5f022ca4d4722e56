//! Truncates episodes after a fixed number of steps.
use crate::{
    error::GymDmcError,
    record::RecordValue,
    registration::EnvSpec,
    Array, Env, Metadata, Observation, RenderMode, RenderOpts, Rendered, Space, Step,
};
use anyhow::Result;
use log::trace;

/// Info key set on the step that reaches the limit; `true` unless the
/// environment terminated on that same step.
pub const TRUNCATED_KEY: &str = "TimeLimit.truncated";

/// Marks the episode truncated once `max_episode_steps` steps have been taken
/// since the last reset.
///
/// The limit counts wrapper steps, not wall-clock time.
pub struct TimeLimit<E> {
    env: E,
    max_episode_steps: usize,
    elapsed_steps: Option<usize>,
}

impl<E: Env> TimeLimit<E> {
    /// Wraps `env`.
    pub fn new(env: E, max_episode_steps: usize) -> Self {
        Self {
            env,
            max_episode_steps,
            elapsed_steps: None,
        }
    }

    /// Steps taken since the last reset, `None` before the first reset.
    pub fn elapsed_steps(&self) -> Option<usize> {
        self.elapsed_steps
    }

    /// Returns the wrapped environment.
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Env for TimeLimit<E> {
    fn observation_space(&self) -> &Space {
        self.env.observation_space()
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Observation> {
        self.elapsed_steps = Some(0);
        self.env.reset()
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        let elapsed = self
            .elapsed_steps
            .ok_or(GymDmcError::ResetNeeded("step"))?
            + 1;
        let mut step = self.env.step(act)?;
        self.elapsed_steps = Some(elapsed);

        if elapsed >= self.max_episode_steps {
            trace!("TimeLimit reached after {} steps", elapsed);
            step.info
                .insert(TRUNCATED_KEY, RecordValue::Bool(!step.is_terminated));
            if !step.is_terminated {
                step.is_truncated = true;
            }
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
        Some(self.max_episode_steps)
    }
}
