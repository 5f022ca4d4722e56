//! Point-mass domain.
//!
//! A mass moving in a walled square is pushed by two actuators towards a
//! target at the origin. In `easy` the actuators push along the axes; in
//! `hard` their directions are drawn at random every episode.
use super::{
    base::{ControlEnv, Environment, LoadOptions, NativeObservation, Physics, PhysicsData, Task},
    canvas::{self, Camera, Canvas},
    rewards::{tolerance, Sigmoid, Tolerance},
};
use anyhow::Result;
use gym_dmc_core::error::GymDmcError;
use image::RgbImage;
use ndarray::arr1;
use rand::{rngs::StdRng, Rng};
use std::collections::BTreeMap;

/// Tasks of the domain.
pub const TASKS: [&str; 2] = ["easy", "hard"];

const TIMESTEP: f64 = 0.02;
const CONTROL_TIMESTEP: f64 = 0.02;
const DEFAULT_TIME_LIMIT: f64 = 20.0;

const MASS: f64 = 0.3;
const ARMATURE: f64 = 0.01;
const DAMPING: f64 = 1.0;
const WALL: f64 = 0.3;
const TARGET_SIZE: f64 = 0.015;
const POINT_SIZE: f64 = 0.01;

/// Physics of the point mass: `qpos = [x, y]`.
pub struct PointMassPhysics {
    data: PhysicsData,
    gains: [[f64; 2]; 2],
}

impl Default for PointMassPhysics {
    fn default() -> Self {
        Self {
            data: PhysicsData::new(vec![0.0, 0.0], 2, vec![MASS]),
            gains: [[1.0, 0.0], [0.0, 1.0]],
        }
    }
}

impl PointMassPhysics {
    /// Vector from the target to the mass.
    pub fn mass_to_target(&self) -> [f64; 2] {
        [self.data.qpos[0], self.data.qpos[1]]
    }

    /// Distance between the mass and the target.
    pub fn mass_to_target_dist(&self) -> f64 {
        let [x, y] = self.mass_to_target();
        (x * x + y * y).sqrt()
    }
}

impl Physics for PointMassPhysics {
    fn data(&self) -> &PhysicsData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut PhysicsData {
        &mut self.data
    }

    fn timestep(&self) -> f64 {
        TIMESTEP
    }

    fn advance(&mut self) {
        let d = &mut self.data;
        let m = d.body_mass[0] + ARMATURE;
        for i in 0..2 {
            let force = self.gains[0][i] * d.ctrl[0] + self.gains[1][i] * d.ctrl[1];
            d.qvel[i] += TIMESTEP * (force - DAMPING * d.qvel[i]) / m;
            d.qpos[i] += TIMESTEP * d.qvel[i];
            if d.qpos[i].abs() > WALL {
                d.qpos[i] = d.qpos[i].clamp(-WALL, WALL);
                d.qvel[i] = 0.0;
            }
        }
        d.time += TIMESTEP;
    }

    fn render(
        &self,
        height: usize,
        width: usize,
        camera_id: i32,
        highlight: Option<f64>,
    ) -> Result<RgbImage> {
        let camera = match camera_id {
            -1 | 0 => Camera {
                center: (0.0, 0.0),
                view_width: 2.4 * WALL,
            },
            _ => return Err(canvas::unknown_camera("point_mass", camera_id, 1)),
        };
        let mut canvas = Canvas::new(height, width, camera)?;
        let (lo, hi) = (-WALL - POINT_SIZE, WALL + POINT_SIZE);
        let corners = [(lo, lo), (hi, lo), (hi, hi), (lo, hi)];
        for i in 0..4 {
            canvas.capsule(corners[i], corners[(i + 1) % 4], 0.02, canvas::DECOR_COLOR);
        }
        canvas.disk((0.0, 0.0), TARGET_SIZE, canvas::DECOR_COLOR);
        let [x, y] = self.mass_to_target();
        canvas.disk((x, y), 2.0 * POINT_SIZE, canvas::self_color(highlight));

        Ok(canvas.into_image())
    }
}

/// A point-mass task.
pub struct PointMass {
    randomize_gains: bool,
}

impl PointMass {
    /// Creates the task.
    pub fn new(randomize_gains: bool) -> Self {
        Self { randomize_gains }
    }
}

fn random_direction(rng: &mut StdRng) -> [f64; 2] {
    let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    [angle.cos(), angle.sin()]
}

impl Task for PointMass {
    type Physics = PointMassPhysics;

    fn initialize_episode(&mut self, physics: &mut Self::Physics, rng: &mut StdRng) {
        if self.randomize_gains {
            let dir1 = random_direction(rng);
            // Directions close to parallel would leave the mass uncontrollable.
            let dir2 = loop {
                let dir2 = random_direction(rng);
                if (dir1[0] * dir2[0] + dir1[1] * dir2[1]).abs() <= 0.9 {
                    break dir2;
                }
            };
            physics.gains = [dir1, dir2];
        }
        let d = physics.data_mut();
        for q in d.qpos.iter_mut() {
            *q = rng.gen_range(-WALL..WALL);
        }
    }

    fn get_observation(&self, physics: &Self::Physics) -> NativeObservation {
        let mut obs = BTreeMap::new();
        obs.insert("position".to_string(), arr1(&physics.data().qpos).into_dyn());
        obs.insert("velocity".to_string(), arr1(&physics.data().qvel).into_dyn());
        obs
    }

    fn get_reward(&self, physics: &Self::Physics) -> f64 {
        let near_target = tolerance(
            physics.mass_to_target_dist(),
            Tolerance::default()
                .bounds(0.0, TARGET_SIZE)
                .margin(TARGET_SIZE),
        );
        let ctrl = &physics.data().ctrl;
        let control_reward = ctrl
            .iter()
            .map(|&u| {
                tolerance(
                    u,
                    Tolerance::default()
                        .margin(1.0)
                        .value_at_margin(0.0)
                        .sigmoid(Sigmoid::Quadratic),
                )
            })
            .sum::<f64>()
            / ctrl.len() as f64;
        let small_control = (control_reward + 4.0) / 5.0;
        near_target * small_control
    }
}

/// Loads a task of the domain.
pub fn load(task: &str, opts: &LoadOptions) -> Result<Box<dyn ControlEnv>> {
    let randomize_gains = match task {
        "easy" => false,
        "hard" => true,
        _ => {
            return Err(GymDmcError::UnknownTask {
                domain: "point_mass".to_string(),
                task: task.to_string(),
            }
            .into())
        }
    };
    let env = Environment::new(
        PointMass::new(randomize_gains),
        PointMassPhysics::default(),
        CONTROL_TIMESTEP,
        opts.time_limit.unwrap_or(DEFAULT_TIME_LIMIT),
        opts.task_seed,
    )?;
    Ok(Box::new(env))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_layout() -> Result<()> {
        let env = load("easy", &LoadOptions::default())?;
        let spec = env.observation_spec();
        assert_eq!(spec.keys().collect::<Vec<_>>(), vec!["position", "velocity"]);
        assert_eq!(spec["position"].shape(), &[2]);
        assert_eq!(env.action_spec().shape(), &[2]);
        Ok(())
    }

    #[test]
    fn test_mass_stays_inside_walls() -> Result<()> {
        let opts = LoadOptions {
            task_seed: Some(3),
            ..Default::default()
        };
        let mut env = load("hard", &opts)?;
        env.reset();
        for _ in 0..200 {
            let ts = env.step(&[1.0, 1.0])?;
            let pos = &ts.observation["position"];
            assert!(pos.iter().all(|x| x.abs() <= WALL));
        }
        Ok(())
    }

    #[test]
    fn test_reward_at_target() {
        let physics = PointMassPhysics::default();
        let reward = PointMass::new(false).get_reward(&physics);
        assert!((reward - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_initial_state() -> Result<()> {
        let opts = LoadOptions {
            task_seed: Some(11),
            ..Default::default()
        };
        let (mut a, mut b) = (load("easy", &opts)?, load("easy", &opts)?);
        assert_eq!(a.reset().observation, b.reset().observation);
        a.seed(5);
        b.seed(5);
        assert_eq!(a.reset().observation, b.reset().observation);
        Ok(())
    }
}
