//! Gym-style adapter of a native control-suite environment.
mod config;
mod viewer;
use crate::suite::{self, ArraySpec, ControlEnv, LoadOptions, NativeObservation, TimeStep};
use anyhow::Result;
pub use config::DmcEnvConfig;
use gym_dmc_core::{
    error::GymDmcError,
    record::{Record, RecordValue},
    Array, BoxSpace, DType, Env, EnvSpec, Metadata, Observation, RenderMode, RenderOpts,
    Rendered, Space, Step,
};
use image::RgbImage;
use log::{debug, info, trace};
use ndarray::{ArrayD, IxDyn};
use std::collections::BTreeMap;
use viewer::Viewer;

/// Key of the physics state in the info of a step.
pub const SIM_STATE_KEY: &str = "sim_state";

/// Key of the rendered frame in pixel observations.
pub const PIXELS_KEY: &str = "pixels";

/// Converts the spec of a native array into a box.
pub fn box_from_spec(spec: &ArraySpec) -> Result<BoxSpace> {
    match spec {
        ArraySpec::Array { shape, dtype } => Ok(BoxSpace::unbounded(shape, *dtype)),
        ArraySpec::BoundedArray {
            shape,
            dtype,
            minimum,
            maximum,
        } => BoxSpace::new(
            ArrayD::from_shape_vec(IxDyn(shape), minimum.clone())?,
            ArrayD::from_shape_vec(IxDyn(shape), maximum.clone())?,
            *dtype,
        ),
    }
}

/// Converts native observation specs into a dict space.
pub fn space_from_specs(specs: &BTreeMap<String, ArraySpec>) -> Result<Space> {
    let d = specs
        .iter()
        .map(|(k, spec)| Ok((k.clone(), box_from_spec(spec)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(Space::Dict(d))
}

/// Returns the frame as a `u8` array of shape `[h, w, 3]`.
pub fn rgb_array(img: RgbImage) -> Result<ArrayD<u8>> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    Ok(ArrayD::from_shape_vec(IxDyn(&[h, w, 3]), img.into_raw())?)
}

/// Returns the frame as a `u8` array of shape `[h, w, 1]` holding the rounded channel mean.
pub fn gray_array(img: &RgbImage) -> Result<ArrayD<u8>> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let v = img
        .pixels()
        .map(|p| ((p.0[0] as f64 + p.0[1] as f64 + p.0[2] as f64) / 3.0).round() as u8)
        .collect();
    Ok(ArrayD::from_shape_vec(IxDyn(&[h, w, 1]), v)?)
}

/// Wraps a native control-suite environment behind [`Env`].
///
/// Observations are dicts of the native features, plus the rendered frame under
/// `"pixels"` when `from_pixels` is set. Each call to [`Env::step`] repeats the
/// action for `frame_skip` native steps, stopping early at the end of the
/// native episode, and returns the summed reward.
pub struct DmcEnv {
    env: Box<dyn ControlEnv>,
    config: DmcEnvConfig,
    observation_space: Space,
    action_space: Space,
    act_box: BoxSpace,
    rng: fastrand::Rng,
    spec: Option<EnvSpec>,
    viewer: Option<Viewer>,
    warm_state: Option<Vec<f64>>,
    closed: bool,
}

impl DmcEnv {
    /// Loads the configured task of the built-in suite.
    pub fn build(config: DmcEnvConfig) -> Result<Self> {
        config.validate()?;
        let opts = LoadOptions {
            task_seed: config.task_seed,
            time_limit: config.time_limit,
        };
        let env = suite::load(&config.domain_name, &config.task_name, &opts)?;
        Self::from_control_env(env, config)
    }

    /// Wraps an already constructed native environment.
    ///
    /// `domain_name`, `task_name`, `task_seed` and `time_limit` of `config` are not used
    /// to construct anything; the task seed still seeds the action sampler.
    pub fn from_control_env(mut env: Box<dyn ControlEnv>, config: DmcEnvConfig) -> Result<Self> {
        config.validate()?;
        if config.no_gravity {
            env.physics_mut().body_mass_mut().iter_mut().for_each(|m| *m = 0.0);
        }

        let act_box = box_from_spec(&env.action_spec())?;
        let mut observation_space = space_from_specs(&env.observation_spec())?;
        if config.from_pixels {
            if let Space::Dict(d) = &mut observation_space {
                let pixels = BoxSpace::uniform(&config.pixel_shape(), 0.0, 255.0, DType::U8);
                d.insert(PIXELS_KEY.to_string(), pixels);
            }
        }
        let rng = match config.task_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        info!(
            "Created environment {}/{} (frame_skip = {}, from_pixels = {})",
            config.domain_name, config.task_name, config.frame_skip, config.from_pixels
        );

        Ok(Self {
            env,
            config,
            observation_space,
            action_space: Space::Box(act_box.clone()),
            act_box,
            rng,
            spec: None,
            viewer: None,
            warm_state: None,
            closed: false,
        })
    }

    /// Configuration of the environment.
    pub fn config(&self) -> &DmcEnvConfig {
        &self.config
    }

    /// The wrapped native environment.
    pub fn control_env(&self) -> &dyn ControlEnv {
        self.env.as_ref()
    }

    /// Snapshot of the physics state.
    pub fn physics_state(&self) -> Vec<f64> {
        self.env.physics().get_state()
    }

    /// Restores a snapshot taken with [`DmcEnv::physics_state`].
    pub fn set_physics_state(&mut self, state: &[f64]) -> Result<()> {
        self.env.physics_mut().set_state(state)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(GymDmcError::Closed.into());
        }
        Ok(())
    }

    fn native_step(&mut self, action: &[f64]) -> Result<TimeStep> {
        if self.config.non_newtonian {
            self.env
                .physics_mut()
                .velocity_mut()
                .iter_mut()
                .for_each(|v| *v = 0.0);
        }
        self.env.step(action)
    }

    fn frame(&self, height: usize, width: usize, camera_id: i32) -> Result<RgbImage> {
        let highlight = if self.config.visualize_reward {
            self.env.last_reward()
        } else {
            None
        };
        self.env.physics().render(height, width, camera_id, highlight)
    }

    fn pixels(&self) -> Result<Array> {
        let img = self.frame(self.config.height, self.config.width, self.config.camera_id)?;
        let a = if self.config.gray_scale {
            gray_array(&img)?
        } else {
            rgb_array(img)?
        };
        let a = Array::U8(a);
        Ok(if self.config.channels_first {
            a.permuted_axes(&[2, 0, 1])
        } else {
            a
        })
    }

    fn observation(&self, native: NativeObservation) -> Result<Observation> {
        let mut d = native
            .into_iter()
            .map(|(k, v)| (k, Array::F64(v)))
            .collect::<BTreeMap<_, _>>();
        if self.config.from_pixels {
            d.insert(PIXELS_KEY.to_string(), self.pixels()?);
        }
        Ok(Observation::Dict(d))
    }
}

impl Env for DmcEnv {
    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self) -> Result<Observation> {
        self.ensure_open()?;
        let mut ts = self.env.reset();
        if self.config.warmstart {
            if let Some(state) = self.warm_state.as_ref() {
                self.env.physics_mut().set_state(state)?;
                ts.observation = self.env.observation();
            }
        }
        if self.config.skip_start > 0 {
            let zeros = vec![0.0; self.act_box.flat_dim()];
            for _ in 0..self.config.skip_start {
                ts = self.native_step(&zeros)?;
            }
        }
        trace!("reset {}/{}", self.config.domain_name, self.config.task_name);

        self.observation(ts.observation)
    }

    fn step(&mut self, act: &Array) -> Result<Step> {
        self.ensure_open()?;
        let action = act.to_flat_vec::<f64>();
        if action.len() != self.act_box.flat_dim() {
            return Err(GymDmcError::InvalidAction(format!(
                "expected shape {:?}, got {:?}",
                self.act_box.shape(),
                act.shape()
            ))
            .into());
        }

        let mut ts = self.native_step(&action)?;
        let mut reward = ts.reward.unwrap_or(0.0);
        for _ in 1..self.config.frame_skip {
            if ts.last() {
                break;
            }
            ts = self.native_step(&action)?;
            reward += ts.reward.unwrap_or(0.0);
        }

        let sim_state = self.env.physics().get_state();
        if self.config.warmstart {
            self.warm_state = Some(sim_state.clone());
        }
        // The native episode ends with a unit discount only when it runs out of time.
        let is_truncated = ts.last() && ts.discount == Some(1.0);
        let is_terminated = ts.last() && !is_truncated;
        let info = Record::from_slice(&[(SIM_STATE_KEY, RecordValue::Array(sim_state.into()))]);
        trace!("step: reward = {}, last = {}", reward, ts.last());

        let obs = self.observation(ts.observation)?;
        Ok(Step::new(obs, reward, is_terminated, is_truncated, info))
    }

    fn render(&mut self, mode: RenderMode, opts: &RenderOpts) -> Result<Rendered> {
        self.ensure_open()?;
        let img = self.frame(
            opts.height.unwrap_or(self.config.height),
            opts.width.unwrap_or(self.config.width),
            opts.camera_id.unwrap_or(self.config.camera_id),
        )?;

        Ok(match mode {
            RenderMode::Rgb => Rendered::Array(Array::U8(rgb_array(img)?)),
            RenderMode::Gray => Rendered::Array(Array::U8(gray_array(&img)?)),
            RenderMode::Human => Rendered::Image(img),
            RenderMode::Notebook => {
                self.viewer.get_or_insert_with(Viewer::new).show(&img)?;
                Rendered::Image(img)
            }
        })
    }

    fn seed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
        self.env.seed(seed);
    }

    fn sample_action(&mut self) -> Array {
        self.act_box.sample(&mut self.rng)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.viewer = None;
        self.env.close();
        self.closed = true;
        debug!("Closed {}/{}", self.config.domain_name, self.config.task_name);
        Ok(())
    }

    fn spec(&self) -> Option<&EnvSpec> {
        self.spec.as_ref()
    }

    fn set_spec(&mut self, spec: EnvSpec) {
        self.spec = Some(spec);
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            render_modes: vec![
                RenderMode::Rgb,
                RenderMode::Gray,
                RenderMode::Human,
                RenderMode::Notebook,
            ],
            frames_per_second: (1.0 / self.env.control_timestep()).round() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{Physics, PhysicsData, StepType};
    use image::Rgb;
    use ndarray::Axis;

    fn channel_mean(a: &ArrayD<u8>) -> ArrayD<u8> {
        let mean = a.mapv(|x| x as f64).mean_axis(Axis(2)).unwrap();
        mean.mapv(|x| x.round() as u8)
    }

    /// Counts native steps; the episode ends after `episode_len` steps and every step
    /// yields a reward of 1.
    struct Counter {
        data: PhysicsData,
        episode_len: usize,
        n_steps: usize,
    }

    impl Counter {
        fn new(episode_len: usize) -> Self {
            Self {
                data: PhysicsData::new(vec![0.0], 1, vec![1.0]),
                episode_len,
                n_steps: 0,
            }
        }

        fn native_obs(&self) -> NativeObservation {
            let mut obs = BTreeMap::new();
            obs.insert(
                "count".to_string(),
                ArrayD::from_elem(IxDyn(&[1]), self.data.qpos[0]),
            );
            obs
        }
    }

    impl Physics for Counter {
        fn data(&self) -> &PhysicsData {
            &self.data
        }

        fn data_mut(&mut self) -> &mut PhysicsData {
            &mut self.data
        }

        fn timestep(&self) -> f64 {
            0.02
        }

        fn advance(&mut self) {
            self.data.qvel[0] += 1.0;
            self.data.qpos[0] += self.data.qvel[0];
        }

        fn render(&self, height: usize, width: usize, _: i32, _: Option<f64>) -> Result<RgbImage> {
            Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, 7])
            }))
        }
    }

    impl ControlEnv for Counter {
        fn observation_spec(&self) -> BTreeMap<String, ArraySpec> {
            let mut specs = BTreeMap::new();
            specs.insert(
                "count".to_string(),
                ArraySpec::Array {
                    shape: vec![1],
                    dtype: DType::F64,
                },
            );
            specs
        }

        fn action_spec(&self) -> ArraySpec {
            ArraySpec::BoundedArray {
                shape: vec![1],
                dtype: DType::F64,
                minimum: vec![-1.0],
                maximum: vec![1.0],
            }
        }

        fn reset(&mut self) -> TimeStep {
            self.n_steps = 0;
            self.data.reset();
            TimeStep {
                step_type: StepType::First,
                reward: None,
                discount: None,
                observation: self.native_obs(),
            }
        }

        fn step(&mut self, _action: &[f64]) -> Result<TimeStep> {
            self.n_steps += 1;
            self.advance();
            let last = self.n_steps >= self.episode_len;
            Ok(TimeStep {
                step_type: if last { StepType::Last } else { StepType::Mid },
                reward: Some(1.0),
                discount: Some(if last { 0.0 } else { 1.0 }),
                observation: self.native_obs(),
            })
        }

        fn observation(&self) -> NativeObservation {
            self.native_obs()
        }

        fn physics(&self) -> &dyn Physics {
            self
        }

        fn physics_mut(&mut self) -> &mut dyn Physics {
            self
        }

        fn control_timestep(&self) -> f64 {
            0.02
        }

        fn last_reward(&self) -> Option<f64> {
            None
        }

        fn seed(&mut self, _seed: u64) {}
    }

    fn counter_env(episode_len: usize, config: DmcEnvConfig) -> Result<DmcEnv> {
        DmcEnv::from_control_env(Box::new(Counter::new(episode_len)), config)
    }

    fn count(obs: &Observation) -> f64 {
        obs.get("count").map(|a| a.to_flat_vec::<f64>()[0]).unwrap_or(f64::NAN)
    }

    #[test]
    fn test_frame_skip_sums_rewards() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default().frame_skip(4))?;
        env.reset()?;
        let step = env.step(&Array::from(vec![0.0]))?;
        assert_eq!(step.reward, 4.0);
        assert!(!step.is_done());
        Ok(())
    }

    #[test]
    fn test_frame_skip_stops_at_last_step() -> Result<()> {
        let mut env = counter_env(6, DmcEnvConfig::default().frame_skip(4))?;
        env.reset()?;
        assert_eq!(env.step(&Array::from(vec![0.0]))?.reward, 4.0);
        let step = env.step(&Array::from(vec![0.0]))?;
        assert_eq!(step.reward, 2.0);
        assert!(step.is_terminated);
        assert!(!step.is_truncated);
        Ok(())
    }

    #[test]
    fn test_sim_state_in_info() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default())?;
        env.reset()?;
        let step = env.step(&Array::from(vec![0.0]))?;
        let state = step.info.get_array(SIM_STATE_KEY)?;
        assert_eq!(state.to_flat_vec::<f64>(), env.physics_state());
        Ok(())
    }

    #[test]
    fn test_skip_start() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default().skip_start(3))?;
        let obs = env.reset()?;
        // Positions after 1, 2 and 3 unit accelerations: 1, 3, 6.
        assert_eq!(count(&obs), 6.0);
        Ok(())
    }

    #[test]
    fn test_non_newtonian_zeroes_velocity() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default().non_newtonian(true).frame_skip(3))?;
        env.reset()?;
        let step = env.step(&Array::from(vec![0.0]))?;
        assert_eq!(count(&step.obs), 3.0);
        Ok(())
    }

    #[test]
    fn test_warmstart_restores_last_state() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default().warmstart(true))?;
        env.reset()?;
        env.step(&Array::from(vec![0.0]))?;
        let step = env.step(&Array::from(vec![0.0]))?;
        let obs = env.reset()?;
        assert_eq!(count(&obs), count(&step.obs));
        Ok(())
    }

    #[test]
    fn test_no_gravity_zeroes_masses() -> Result<()> {
        let env = counter_env(100, DmcEnvConfig::default().no_gravity(true))?;
        assert!(env.control_env().physics().data().body_mass.iter().all(|m| *m == 0.0));
        Ok(())
    }

    #[test]
    fn test_pixel_layouts() -> Result<()> {
        let config = DmcEnvConfig::default().from_pixels(true).size(6, 5);
        for (channels_first, gray_scale, shape) in [
            (true, false, vec![3, 6, 5]),
            (false, false, vec![6, 5, 3]),
            (true, true, vec![1, 6, 5]),
            (false, true, vec![6, 5, 1]),
        ] {
            let config = config
                .clone()
                .channels_first(channels_first)
                .gray_scale(gray_scale);
            let mut env = counter_env(100, config)?;
            let obs = env.reset()?;
            let pixels = obs.get(PIXELS_KEY).map(|a| a.shape().to_vec());
            assert_eq!(pixels, Some(shape.clone()));
            assert_eq!(env.observation_space().get(PIXELS_KEY).map(|b| b.shape().to_vec()), Some(shape));
            assert!(env.observation_space().contains(&obs));
        }
        Ok(())
    }

    #[test]
    fn test_channels_first_is_transpose() -> Result<()> {
        let config = DmcEnvConfig::default().from_pixels(true).size(6, 5);
        let mut first = counter_env(100, config.clone())?;
        let mut last = counter_env(100, config.channels_first(false))?;
        let a = first.reset()?.take(PIXELS_KEY)?;
        let b = last.reset()?.take(PIXELS_KEY)?;
        if let (Array::U8(a), Array::U8(b)) = (a, b) {
            assert_eq!(a[[0, 4, 3]], b[[4, 3, 0]]);
            assert_eq!(a[[1, 4, 3]], 4);
            assert_eq!(b[[4, 3, 2]], 7);
        } else {
            panic!("pixels are not u8");
        }
        Ok(())
    }

    #[test]
    fn test_gray_is_channel_mean() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default().size(4, 9))?;
        env.reset()?;
        let rgb = env.render(RenderMode::Rgb, &RenderOpts::default())?.into_array();
        let gray = env.render_str("grey", &RenderOpts::default())?.into_array();
        match (rgb, gray) {
            (Some(Array::U8(rgb)), Some(Array::U8(gray))) => {
                assert_eq!(rgb.shape(), &[4, 9, 3]);
                assert_eq!(gray.shape(), &[4, 9, 1]);
                let mean = channel_mean(&rgb);
                assert_eq!(gray.index_axis(Axis(2), 0).to_owned(), mean);
            }
            _ => panic!("render did not return u8 arrays"),
        }
        Ok(())
    }

    #[test]
    fn test_render_overrides_size() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default())?;
        env.reset()?;
        let opts = RenderOpts::default().height(10).width(20);
        let img = env.render(RenderMode::Human, &opts)?.into_image();
        assert_eq!(img.map(|img| img.dimensions()), Some((20, 10)));
        let err = env.render_str("depth", &opts).err().map(|e| e.to_string());
        assert_eq!(err, Some("`depth` mode is not implemented".to_string()));
        Ok(())
    }

    #[test]
    fn test_seeded_sampler() -> Result<()> {
        let mut a = counter_env(100, DmcEnvConfig::default())?;
        let mut b = counter_env(100, DmcEnvConfig::default())?;
        a.seed(3);
        b.seed(3);
        assert_eq!(a.sample_action(), b.sample_action());
        let sampled = a.sample_action();
        assert!(a.action_space().contains(&Observation::Array(sampled)));
        Ok(())
    }

    #[test]
    fn test_close_is_idempotent() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default())?;
        env.reset()?;
        env.close()?;
        env.close()?;
        let err = env.reset().err();
        assert!(matches!(
            err.as_ref().and_then(|e| e.downcast_ref::<GymDmcError>()),
            Some(GymDmcError::Closed)
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_action() -> Result<()> {
        let mut env = counter_env(100, DmcEnvConfig::default())?;
        env.reset()?;
        assert!(env.step(&Array::from(vec![0.0, 1.0])).is_err());
        Ok(())
    }

    #[test]
    fn test_metadata() -> Result<()> {
        let env = counter_env(100, DmcEnvConfig::default())?;
        let metadata = env.metadata();
        assert_eq!(metadata.frames_per_second, 50);
        assert!(metadata.render_modes.contains(&RenderMode::Notebook));
        Ok(())
    }
}
