//! Native control-suite interface.
use anyhow::Result;
use gym_dmc_core::{error::GymDmcError, DType};
use image::RgbImage;
use log::trace;
use ndarray::ArrayD;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

/// Observation of a native environment, keyed by feature name.
pub type NativeObservation = BTreeMap<String, ArrayD<f64>>;

/// Position of a [`TimeStep`] in an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    /// First time step of an episode, carries no reward.
    First,

    /// Any time step that is neither first nor last.
    Mid,

    /// Last time step of an episode.
    Last,
}

/// Outcome of a native reset or step.
#[derive(Debug, Clone)]
pub struct TimeStep {
    /// Position in the episode.
    pub step_type: StepType,

    /// Reward, absent on the first time step.
    pub reward: Option<f64>,

    /// Discount, absent on the first time step.
    ///
    /// `1.0` on a last time step means the episode ran out of time.
    pub discount: Option<f64>,

    /// Observation.
    pub observation: NativeObservation,
}

impl TimeStep {
    /// Returns `true` for the first time step of an episode.
    pub fn first(&self) -> bool {
        self.step_type == StepType::First
    }

    /// Returns `true` for the last time step of an episode.
    pub fn last(&self) -> bool {
        self.step_type == StepType::Last
    }
}

/// Describes the arrays a native environment consumes or emits.
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySpec {
    /// Unbounded array.
    Array {
        /// Shape.
        shape: Vec<usize>,
        /// Element type.
        dtype: DType,
    },

    /// Array with elementwise bounds.
    BoundedArray {
        /// Shape.
        shape: Vec<usize>,
        /// Element type.
        dtype: DType,
        /// Lower bounds, one per element.
        minimum: Vec<f64>,
        /// Upper bounds, one per element.
        maximum: Vec<f64>,
    },
}

impl ArraySpec {
    /// Shape of the arrays.
    pub fn shape(&self) -> &[usize] {
        match self {
            ArraySpec::Array { shape, .. } => shape,
            ArraySpec::BoundedArray { shape, .. } => shape,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Returns `true` if the arrays have no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Simulation state of a planar physics model.
///
/// `body_mass` belongs to the model and survives [`PhysicsData::reset`];
/// everything else is reinitialised.
#[derive(Debug, Clone)]
pub struct PhysicsData {
    /// Generalized positions.
    pub qpos: Vec<f64>,

    /// Generalized velocities.
    pub qvel: Vec<f64>,

    /// Actuator controls in `[-1, 1]`.
    pub ctrl: Vec<f64>,

    /// Simulation time in seconds.
    pub time: f64,

    /// Body masses.
    pub body_mass: Vec<f64>,

    qpos0: Vec<f64>,
}

impl PhysicsData {
    /// Creates the data of a model with reference pose `qpos0`.
    pub fn new(qpos0: Vec<f64>, n_actuators: usize, body_mass: Vec<f64>) -> Self {
        Self {
            qvel: vec![0.0; qpos0.len()],
            qpos: qpos0.clone(),
            ctrl: vec![0.0; n_actuators],
            time: 0.0,
            body_mass,
            qpos0,
        }
    }

    /// Restores the reference pose with zero velocity and control.
    pub fn reset(&mut self) {
        self.qpos.copy_from_slice(&self.qpos0);
        self.qvel.iter_mut().for_each(|v| *v = 0.0);
        self.ctrl.iter_mut().for_each(|v| *v = 0.0);
        self.time = 0.0;
    }
}

/// A physics simulation.
pub trait Physics: Send {
    /// Simulation state.
    fn data(&self) -> &PhysicsData;

    /// Mutable simulation state.
    fn data_mut(&mut self) -> &mut PhysicsData;

    /// Integration step in seconds.
    fn timestep(&self) -> f64;

    /// Advances the simulation by one integration step under the current controls.
    fn advance(&mut self);

    /// Renders the scene from a camera.
    ///
    /// `highlight`, when given, is a value in `[0, 1]` used to tint the bodies.
    fn render(
        &self,
        height: usize,
        width: usize,
        camera_id: i32,
        highlight: Option<f64>,
    ) -> Result<RgbImage>;

    /// Returns the state as `[time, qpos.., qvel..]`.
    fn get_state(&self) -> Vec<f64> {
        let data = self.data();
        let mut state = Vec::with_capacity(1 + data.qpos.len() + data.qvel.len());
        state.push(data.time);
        state.extend_from_slice(&data.qpos);
        state.extend_from_slice(&data.qvel);
        state
    }

    /// Restores a state returned by [`Physics::get_state`].
    fn set_state(&mut self, state: &[f64]) -> Result<()> {
        let data = self.data_mut();
        let (nq, nv) = (data.qpos.len(), data.qvel.len());
        if state.len() != 1 + nq + nv {
            return Err(GymDmcError::InvalidConfig(format!(
                "physics state has {} values, expected {}",
                state.len(),
                1 + nq + nv
            ))
            .into());
        }
        data.time = state[0];
        data.qpos.copy_from_slice(&state[1..1 + nq]);
        data.qvel.copy_from_slice(&state[1 + nq..]);
        Ok(())
    }

    /// Body masses of the model.
    fn body_mass_mut(&mut self) -> &mut [f64] {
        &mut self.data_mut().body_mass
    }

    /// Generalized velocities.
    fn velocity_mut(&mut self) -> &mut [f64] {
        &mut self.data_mut().qvel
    }
}

/// Defines the reward, observation and initial state distribution on top of a physics model.
pub trait Task: Send {
    /// Physics the task is defined on.
    type Physics: Physics + 'static;

    /// Sets the state of the physics at the start of an episode.
    fn initialize_episode(&mut self, physics: &mut Self::Physics, rng: &mut StdRng);

    /// Observation of the current state.
    fn get_observation(&self, physics: &Self::Physics) -> NativeObservation;

    /// Reward of the current state.
    fn get_reward(&self, physics: &Self::Physics) -> f64;

    /// Returns a discount when the episode should end, `None` otherwise.
    fn get_termination(&self, _physics: &Self::Physics) -> Option<f64> {
        None
    }

    /// Applies the action to the physics.
    fn before_step(&mut self, action: &[f64], physics: &mut Self::Physics) {
        for (c, a) in physics.data_mut().ctrl.iter_mut().zip(action) {
            *c = a.clamp(-1.0, 1.0);
        }
    }

    /// Spec of the actions, one bounded control per actuator.
    fn action_spec(&self, physics: &Self::Physics) -> ArraySpec {
        let n = physics.data().ctrl.len();
        ArraySpec::BoundedArray {
            shape: vec![n],
            dtype: DType::F64,
            minimum: vec![-1.0; n],
            maximum: vec![1.0; n],
        }
    }

    /// Spec of the observations, derived from the shapes of [`Task::get_observation`].
    fn observation_spec(&self, physics: &Self::Physics) -> BTreeMap<String, ArraySpec> {
        self.get_observation(physics)
            .into_iter()
            .map(|(k, v)| {
                let spec = ArraySpec::Array {
                    shape: v.shape().to_vec(),
                    dtype: DType::F64,
                };
                (k, spec)
            })
            .collect()
    }
}

/// A native control-suite environment.
pub trait ControlEnv: Send {
    /// Specs of the observation features.
    fn observation_spec(&self) -> BTreeMap<String, ArraySpec>;

    /// Spec of the actions.
    fn action_spec(&self) -> ArraySpec;

    /// Starts a new episode.
    fn reset(&mut self) -> TimeStep;

    /// Advances the environment by one control step.
    ///
    /// Stepping after a last time step starts a new episode.
    fn step(&mut self, action: &[f64]) -> Result<TimeStep>;

    /// Observation of the current state.
    fn observation(&self) -> NativeObservation;

    /// Physics of the environment.
    fn physics(&self) -> &dyn Physics;

    /// Mutable physics of the environment.
    fn physics_mut(&mut self) -> &mut dyn Physics;

    /// Duration of a control step in seconds.
    fn control_timestep(&self) -> f64;

    /// Reward of the last step, if any.
    fn last_reward(&self) -> Option<f64>;

    /// Reseeds the random number generator of the task.
    fn seed(&mut self, seed: u64);

    /// Releases resources.
    fn close(&mut self) {}
}

/// Options for [`load`](super::load).
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Seed of the task's random number generator; entropy when `None`.
    pub task_seed: Option<u64>,

    /// Episode length in seconds; the domain default when `None`.
    pub time_limit: Option<f64>,
}

/// Runs a [`Task`] on its physics with a fixed control timestep and a time limit.
pub struct Environment<T: Task> {
    task: T,
    physics: T::Physics,
    rng: StdRng,
    n_sub_steps: usize,
    step_limit: usize,
    step_count: usize,
    reset_next_step: bool,
    last_reward: Option<f64>,
}

impl<T: Task> Environment<T> {
    /// Creates an environment.
    ///
    /// `control_timestep` is rounded to a whole number of physics steps.
    pub fn new(
        task: T,
        physics: T::Physics,
        control_timestep: f64,
        time_limit: f64,
        task_seed: Option<u64>,
    ) -> Result<Self> {
        if control_timestep <= 0.0 || time_limit <= 0.0 {
            return Err(GymDmcError::InvalidConfig(format!(
                "control timestep {} and time limit {} must be positive",
                control_timestep, time_limit
            ))
            .into());
        }
        let n_sub_steps = ((control_timestep / physics.timestep()).round() as usize).max(1);
        let control_timestep = n_sub_steps as f64 * physics.timestep();
        let step_limit = ((time_limit / control_timestep).round() as usize).max(1);
        let rng = match task_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            task,
            physics,
            rng,
            n_sub_steps,
            step_limit,
            step_count: 0,
            reset_next_step: true,
            last_reward: None,
        })
    }

    /// Number of control steps in an episode.
    pub fn step_limit(&self) -> usize {
        self.step_limit
    }
}

impl<T: Task> ControlEnv for Environment<T> {
    fn observation_spec(&self) -> BTreeMap<String, ArraySpec> {
        self.task.observation_spec(&self.physics)
    }

    fn action_spec(&self) -> ArraySpec {
        self.task.action_spec(&self.physics)
    }

    fn reset(&mut self) -> TimeStep {
        self.reset_next_step = false;
        self.step_count = 0;
        self.last_reward = None;
        self.physics.data_mut().reset();
        self.task.initialize_episode(&mut self.physics, &mut self.rng);

        TimeStep {
            step_type: StepType::First,
            reward: None,
            discount: None,
            observation: self.task.get_observation(&self.physics),
        }
    }

    fn step(&mut self, action: &[f64]) -> Result<TimeStep> {
        if self.reset_next_step {
            return Ok(self.reset());
        }
        let n_actuators = self.physics.data().ctrl.len();
        if action.len() != n_actuators {
            return Err(GymDmcError::InvalidAction(format!(
                "expected {} controls, got {}",
                n_actuators,
                action.len()
            ))
            .into());
        }

        self.task.before_step(action, &mut self.physics);
        for _ in 0..self.n_sub_steps {
            self.physics.advance();
        }
        let reward = self.task.get_reward(&self.physics);
        self.last_reward = Some(reward);
        self.step_count += 1;

        let discount = if self.step_count >= self.step_limit {
            Some(1.0)
        } else {
            self.task.get_termination(&self.physics)
        };
        let step_type = match discount {
            Some(_) => {
                self.reset_next_step = true;
                StepType::Last
            }
            None => StepType::Mid,
        };
        trace!("native step {}: reward {}", self.step_count, reward);

        Ok(TimeStep {
            step_type,
            reward: Some(reward),
            discount: Some(discount.unwrap_or(1.0)),
            observation: self.task.get_observation(&self.physics),
        })
    }

    fn observation(&self) -> NativeObservation {
        self.task.get_observation(&self.physics)
    }

    fn physics(&self) -> &dyn Physics {
        &self.physics
    }

    fn physics_mut(&mut self) -> &mut dyn Physics {
        &mut self.physics
    }

    fn control_timestep(&self) -> f64 {
        self.n_sub_steps as f64 * self.physics.timestep()
    }

    fn last_reward(&self) -> Option<f64> {
        self.last_reward
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Draws from the standard normal distribution.
pub(crate) fn randn(rng: &mut StdRng) -> f64 {
    // Box-Muller; `1 - u` keeps the logarithm finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
