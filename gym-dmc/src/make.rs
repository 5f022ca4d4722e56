//! Entry point and registration of the built-in suite.
use crate::{
    env::{DmcEnv, DmcEnvConfig, PIXELS_KEY},
    suite,
};
use anyhow::Result;
use gym_dmc_core::{
    error::GymDmcError,
    kwargs,
    registration::{kwargs_to_config, take_kwarg},
    wrappers::{FlattenObservation, ObservationByKey, TimeLimit},
    Env, EnvRegistry, EnvSpec, Kwargs,
};
use log::{debug, warn};

/// Name under which [`make_env`] is registered as a constructor.
pub const ENTRY_POINT: &str = "gym_dmc:make_env";

/// Native frames of an episode when `episode_frames` is not given.
pub const DEFAULT_EPISODE_FRAMES: usize = 1000;

/// Id of a suite task, e.g. `Point_mass-easy-v1`.
pub fn env_id(domain_name: &str, task_name: &str) -> String {
    let mut chars = domain_name.chars();
    let domain = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    format!("{}-{}-v1", domain, task_name)
}

/// Number of wrapper steps of an episode of `episode_frames` native frames.
pub fn max_episode_steps(episode_frames: usize, frame_skip: usize) -> usize {
    (episode_frames / frame_skip.max(1)).max(1)
}

/// Builds a wrapped [`DmcEnv`] from keyword arguments.
///
/// Besides the fields of [`DmcEnvConfig`], `kwargs` may hold
///
/// * `flatten_obs` (default `true`): flatten the dict observation,
/// * `episode_frames` (default 1000): native frames per episode,
/// * `max_episode_steps`: steps per episode, overriding `episode_frames / frame_skip`.
///
/// With `from_pixels`, the observation is the frame alone and `flatten_obs` is ignored.
/// The result is always wrapped in a [`TimeLimit`]. If `id` is not empty, the
/// environment gets a spec with that id.
pub fn make_env(id: &str, kwargs: &Kwargs) -> Result<Box<dyn Env>> {
    let mut config_kwargs = kwargs.clone();
    let flatten_obs = take_kwarg::<bool>(&mut config_kwargs, "flatten_obs")?;
    let episode_frames = take_kwarg::<usize>(&mut config_kwargs, "episode_frames")?
        .unwrap_or(DEFAULT_EPISODE_FRAMES);
    let steps = take_kwarg::<usize>(&mut config_kwargs, "max_episode_steps")?;
    let config: DmcEnvConfig = kwargs_to_config(&config_kwargs)?;
    config.validate()?;

    let steps = steps.unwrap_or_else(|| max_episode_steps(episode_frames, config.frame_skip));
    if steps == 0 {
        return Err(GymDmcError::InvalidConfig("max_episode_steps must be at least 1".into()).into());
    }
    let from_pixels = config.from_pixels;
    let mut env = DmcEnv::build(config)?;
    if !id.is_empty() {
        let spec = EnvSpec::new(id, make_env)?
            .kwargs(kwargs.clone())
            .max_episode_steps(steps);
        env.set_spec(spec);
    }

    let env: Box<dyn Env> = if from_pixels {
        if flatten_obs == Some(true) {
            warn!("flatten_obs is ignored for pixel observations");
        }
        debug!("Observe {} only", PIXELS_KEY);
        Box::new(ObservationByKey::new(env, PIXELS_KEY)?)
    } else if flatten_obs.unwrap_or(true) {
        Box::new(FlattenObservation::new(env, false))
    } else {
        Box::new(env)
    };
    Ok(Box::new(TimeLimit::new(env, steps)))
}

/// Registers every task of the built-in suite together with [`make_env`].
pub fn register_suite(registry: &mut EnvRegistry) -> Result<()> {
    registry.register_constructor(ENTRY_POINT, make_env);
    for (domain_name, task_name) in suite::all_tasks() {
        let kwargs = kwargs! {
            "domain_name" => domain_name,
            "task_name" => task_name,
            "channels_first" => true,
            "width" => 84,
            "height" => 84,
            "frame_skip" => 1,
        };
        registry.register(EnvSpec::named(env_id(domain_name, task_name), ENTRY_POINT)?.kwargs(kwargs));
    }
    debug!("Registered {} suite environments", suite::all_tasks().len());
    Ok(())
}

/// Ids of every suite task, sorted.
pub fn registered_ids() -> Vec<String> {
    let mut ids = suite::all_tasks()
        .into_iter()
        .map(|(domain_name, task_name)| env_id(domain_name, task_name))
        .collect::<Vec<_>>();
    ids.sort();
    ids
}

/// Makes a suite environment by id, e.g. `make("Walker-walk-v1", &kwargs! {"frame_skip" => 4})`.
///
/// Builds a fresh registry; keep an [`EnvRegistry`] around to make many environments.
pub fn make(id: &str, kwargs: &Kwargs) -> Result<Box<dyn Env>> {
    let mut registry = EnvRegistry::new();
    register_suite(&mut registry)?;
    registry.make(id, kwargs)
}
