//! Environment.
use super::{Observation, RenderMode, RenderOpts, Rendered, Step};
use crate::{registration::EnvSpec, Array, Space};
use anyhow::Result;

/// Static information about an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Supported render modes.
    pub render_modes: Vec<RenderMode>,

    /// Frames per second of the rendered video, `round(1 / control_timestep)`.
    pub frames_per_second: u32,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            render_modes: vec![RenderMode::Human, RenderMode::Rgb],
            frames_per_second: 0,
        }
    }
}

/// Represents an environment, typically an MDP.
///
/// The trait is object safe; the registry hands out `Box<dyn Env>` and wrappers
/// are themselves environments.
pub trait Env {
    /// Space every observation returned by [`Env::reset`] and [`Env::step`] lies in.
    fn observation_space(&self) -> &Space;

    /// Space of valid actions.
    fn action_space(&self) -> &Space;

    /// Resets the environment and returns an initial observation.
    fn reset(&mut self) -> Result<Observation>;

    /// Performes an environment step.
    fn step(&mut self, act: &Array) -> Result<Step>;

    /// Renders the current state.
    fn render(&mut self, mode: RenderMode, opts: &RenderOpts) -> Result<Rendered>;

    /// Seeds the action-space sampler and the randomness of the environment.
    ///
    /// Call this before [`Env::reset`] to replay an episode.
    fn seed(&mut self, seed: u64);

    /// Draws a random action from the seeded action-space sampler.
    fn sample_action(&mut self) -> Array;

    /// Releases the resources of the environment. Calling it twice is harmless.
    fn close(&mut self) -> Result<()>;

    /// Spec this environment was made from, set by [`EnvSpec::make`].
    fn spec(&self) -> Option<&EnvSpec>;

    /// Sets the spec on the innermost environment.
    fn set_spec(&mut self, spec: EnvSpec);

    /// Static information about the environment.
    fn metadata(&self) -> Metadata {
        Metadata::default()
    }

    /// The number of steps after which the episode is truncated, if any.
    fn max_episode_steps(&self) -> Option<usize> {
        self.spec().and_then(|spec| spec.max_episode_steps)
    }

    /// Renders with a mode given by name, e.g. `"rgb_array"` or `"grey"`.
    fn render_str(&mut self, mode: &str, opts: &RenderOpts) -> Result<Rendered> {
        let mode: RenderMode = mode.parse()?;
        self.render(mode, opts)
    }
}

impl<E: Env + ?Sized> Env for Box<E> {
    fn observation_space(&self) -> &Space {
        (**self).observation_space()
    }

    fn action_space(&self) -> &Space {
        (**self).action_space()
    }

    fn reset(&mut self) -> Result<Observation> {
        (**self).reset()
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        (**self).step(act)
    }

    fn render(&mut self, mode: RenderMode, opts: &RenderOpts) -> Result<Rendered> {
        (**self).render(mode, opts)
    }

    fn seed(&mut self, seed: u64) {
        (**self).seed(seed)
    }

    fn sample_action(&mut self) -> Array {
        (**self).sample_action()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn spec(&self) -> Option<&EnvSpec> {
        (**self).spec()
    }

    fn set_spec(&mut self, spec: EnvSpec) {
        (**self).set_spec(spec)
    }

    fn metadata(&self) -> Metadata {
        (**self).metadata()
    }

    fn max_episode_steps(&self) -> Option<usize> {
        (**self).max_episode_steps()
    }
}
