//! Cart-pole domain.
//!
//! A pole hinged on a cart that slides along a rail. The only actuator pushes
//! the cart. In the `swingup` tasks the pole starts pointing down; in the
//! `balance` tasks it starts close to upright.
use super::{
    base::{
        randn, ControlEnv, Environment, LoadOptions, NativeObservation, Physics, PhysicsData,
        Task,
    },
    canvas::{self, Camera, Canvas},
    rewards::{tolerance, Sigmoid, Tolerance},
};
use anyhow::Result;
use gym_dmc_core::error::GymDmcError;
use image::RgbImage;
use ndarray::arr1;
use rand::{rngs::StdRng, Rng};
use std::{collections::BTreeMap, f64::consts::PI};

/// Tasks of the domain.
pub const TASKS: [&str; 4] = ["balance", "balance_sparse", "swingup", "swingup_sparse"];

const TIMESTEP: f64 = 0.01;
const CONTROL_TIMESTEP: f64 = 0.01;
const DEFAULT_TIME_LIMIT: f64 = 10.0;

const GRAVITY: f64 = 9.81;
const CART_MASS: f64 = 1.0;
const POLE_MASS: f64 = 0.1;
const POLE_HALF_LENGTH: f64 = 0.5;
const GEAR: f64 = 10.0;
const ARMATURE: f64 = 0.01;
const SLIDER_DAMPING: f64 = 5e-4;
const HINGE_DAMPING: f64 = 2e-6;
const RAIL: f64 = 1.8;
const RAIL_HEIGHT: f64 = 1.0;

/// Physics of the cart-pole: `qpos = [cart position, pole angle]`, the angle being zero upright.
pub struct CartpolePhysics {
    data: PhysicsData,
}

impl Default for CartpolePhysics {
    fn default() -> Self {
        Self {
            data: PhysicsData::new(vec![0.0, 0.0], 1, vec![CART_MASS, POLE_MASS]),
        }
    }
}

impl CartpolePhysics {
    /// Position of the cart on the rail.
    pub fn cart_position(&self) -> f64 {
        self.data.qpos[0]
    }

    /// Angular velocity of the pole.
    pub fn angular_vel(&self) -> f64 {
        self.data.qvel[1]
    }

    /// Cosine of the pole angle, 1 when upright.
    pub fn pole_angle_cosine(&self) -> f64 {
        self.data.qpos[1].cos()
    }

    /// Cart position followed by the cosine and sine of the pole angle.
    pub fn bounded_position(&self) -> Vec<f64> {
        let angle = self.data.qpos[1];
        vec![self.cart_position(), angle.cos(), angle.sin()]
    }
}

impl Physics for CartpolePhysics {
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
        let (th, xd, thd) = (d.qpos[1], d.qvel[0], d.qvel[1]);
        let (m_c, m_p) = (d.body_mass[0], d.body_mass[1]);
        let l = POLE_HALF_LENGTH;
        let (s, c) = th.sin_cos();

        // Mass matrix of the cart-pole with rotor inertia added to the diagonal.
        let m = m_c + m_p + ARMATURE;
        let i = 4.0 / 3.0 * m_p * l * l + ARMATURE;
        let k = m_p * l * c;
        let rhs_x = GEAR * d.ctrl[0] - SLIDER_DAMPING * xd + m_p * l * thd * thd * s;
        let rhs_th = m_p * GRAVITY * l * s - HINGE_DAMPING * thd;
        let det = m * i - k * k;
        let xdd = (i * rhs_x - k * rhs_th) / det;
        let thdd = (m * rhs_th - k * rhs_x) / det;

        d.qvel[0] += TIMESTEP * xdd;
        d.qvel[1] += TIMESTEP * thdd;
        d.qpos[0] += TIMESTEP * d.qvel[0];
        d.qpos[1] += TIMESTEP * d.qvel[1];
        if d.qpos[0].abs() > RAIL {
            d.qpos[0] = d.qpos[0].clamp(-RAIL, RAIL);
            d.qvel[0] = 0.0;
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
        let x = self.cart_position();
        let camera = match camera_id {
            -1 | 0 => Camera {
                center: (0.0, RAIL_HEIGHT),
                view_width: 4.0,
            },
            1 => Camera {
                center: (x, RAIL_HEIGHT + 0.3),
                view_width: 2.5,
            },
            _ => return Err(canvas::unknown_camera("cartpole", camera_id, 2)),
        };
        let mut canvas = Canvas::new(height, width, camera)?;
        canvas.ground(0.0, 0.5);
        canvas.capsule(
            (-RAIL - 0.2, RAIL_HEIGHT),
            (RAIL + 0.2, RAIL_HEIGHT),
            0.03,
            canvas::DECOR_COLOR,
        );
        let color = canvas::self_color(highlight);
        canvas.rect((x - 0.2, RAIL_HEIGHT - 0.1), (x + 0.2, RAIL_HEIGHT + 0.1), color);
        let (s, c) = self.data.qpos[1].sin_cos();
        let tip = (x + 2.0 * POLE_HALF_LENGTH * s, RAIL_HEIGHT + 2.0 * POLE_HALF_LENGTH * c);
        canvas.capsule((x, RAIL_HEIGHT), tip, 0.06, color);

        Ok(canvas.into_image())
    }
}

/// A cart-pole task.
pub struct Balance {
    swing_up: bool,
    sparse: bool,
}

impl Balance {
    /// Creates the task.
    pub fn new(swing_up: bool, sparse: bool) -> Self {
        Self { swing_up, sparse }
    }
}

impl Task for Balance {
    type Physics = CartpolePhysics;

    fn initialize_episode(&mut self, physics: &mut Self::Physics, rng: &mut StdRng) {
        let d = physics.data_mut();
        if self.swing_up {
            d.qpos[0] = 0.01 * randn(rng);
            d.qpos[1] = PI + 0.01 * randn(rng);
        } else {
            d.qpos[0] = rng.gen_range(-0.1..0.1);
            d.qpos[1] = rng.gen_range(-0.034..0.034);
        }
        for v in d.qvel.iter_mut() {
            *v = 0.01 * randn(rng);
        }
    }

    fn get_observation(&self, physics: &Self::Physics) -> NativeObservation {
        let mut obs = BTreeMap::new();
        obs.insert(
            "position".to_string(),
            arr1(&physics.bounded_position()).into_dyn(),
        );
        obs.insert("velocity".to_string(), arr1(&physics.data().qvel).into_dyn());
        obs
    }

    fn get_reward(&self, physics: &Self::Physics) -> f64 {
        let x = physics.cart_position();
        let cos = physics.pole_angle_cosine();
        if self.sparse {
            let cart_in_bounds = tolerance(x, Tolerance::default().bounds(-0.25, 0.25));
            let angle_in_bounds = tolerance(cos, Tolerance::default().bounds(0.995, 1.0));
            cart_in_bounds * angle_in_bounds
        } else {
            let upright = (cos + 1.0) / 2.0;
            let centered = (1.0 + tolerance(x, Tolerance::default().margin(2.0))) / 2.0;
            let control = tolerance(
                physics.data().ctrl[0],
                Tolerance::default()
                    .margin(1.0)
                    .value_at_margin(0.0)
                    .sigmoid(Sigmoid::Quadratic),
            );
            let small_control = (4.0 + control) / 5.0;
            let small_velocity =
                (1.0 + tolerance(physics.angular_vel(), Tolerance::default().margin(5.0))) / 2.0;
            upright * small_control * small_velocity * centered
        }
    }
}

/// Loads a task of the domain.
pub fn load(task: &str, opts: &LoadOptions) -> Result<Box<dyn ControlEnv>> {
    let (swing_up, sparse) = match task {
        "balance" => (false, false),
        "balance_sparse" => (false, true),
        "swingup" => (true, false),
        "swingup_sparse" => (true, true),
        _ => {
            return Err(GymDmcError::UnknownTask {
                domain: "cartpole".to_string(),
                task: task.to_string(),
            }
            .into())
        }
    };
    let env = Environment::new(
        Balance::new(swing_up, sparse),
        CartpolePhysics::default(),
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
        let env = load("balance", &LoadOptions::default())?;
        let spec = env.observation_spec();
        assert_eq!(spec["position"].shape(), &[3]);
        assert_eq!(spec["velocity"].shape(), &[2]);
        assert_eq!(env.action_spec().shape(), &[1]);
        assert!((env.control_timestep() - 0.01).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_pole_falls_without_control() -> Result<()> {
        let opts = LoadOptions {
            task_seed: Some(42),
            ..Default::default()
        };
        let mut env = load("balance", &opts)?;
        env.reset();
        let mut min_cos = 1f64;
        for _ in 0..300 {
            let ts = env.step(&[0.0])?;
            min_cos = min_cos.min(ts.observation["position"][[1]]);
        }
        assert!(min_cos < 0.5, "pole stayed upright: min cos = {}", min_cos);
        Ok(())
    }

    #[test]
    fn test_pole_stays_without_pole_mass() -> Result<()> {
        let opts = LoadOptions {
            task_seed: Some(0),
            ..Default::default()
        };
        let mut env = load("balance", &opts)?;
        env.physics_mut()
            .body_mass_mut()
            .iter_mut()
            .for_each(|m| *m = 0.0);
        env.reset();
        env.physics_mut().velocity_mut().iter_mut().for_each(|v| *v = 0.0);
        let before = env.observation()["position"][[1]];
        for _ in 0..100 {
            env.step(&[0.5])?;
        }
        let after = env.observation()["position"][[1]];
        assert!((before - after).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_episode_ends_at_time_limit() -> Result<()> {
        let opts = LoadOptions {
            task_seed: Some(0),
            time_limit: Some(0.05),
        };
        let mut env = load("swingup", &opts)?;
        assert!(env.reset().first());
        let mut n = 0;
        loop {
            n += 1;
            let ts = env.step(&[0.0])?;
            if ts.last() {
                assert_eq!(ts.discount, Some(1.0));
                break;
            }
        }
        assert_eq!(n, 5);
        Ok(())
    }

    #[test]
    fn test_unknown_task() {
        let err = load("dance", &LoadOptions::default()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<GymDmcError>(),
            Some(GymDmcError::UnknownTask { .. })
        ));
    }
}
