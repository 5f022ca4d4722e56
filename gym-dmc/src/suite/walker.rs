//! Walker domain.
//!
//! A planar biped with a torso, two thighs, two legs and two feet. Six
//! actuators drive the hips, knees and ankles. `stand` rewards an upright
//! torso above standing height; `walk` and `run` additionally reward forward
//! velocity.
//!
//! The simulation works in generalized coordinates
//! `[rootz, rootx, rooty, right_hip, right_knee, right_ankle, left_hip, left_knee, left_ankle]`
//! with a diagonal mass matrix, penalty contacts against the floor and
//! semi-implicit Euler integration.
use super::{
    base::{ControlEnv, Environment, LoadOptions, NativeObservation, Physics, PhysicsData, Task},
    canvas::{self, Camera, Canvas},
    rewards::{tolerance, Sigmoid, Tolerance},
};
use anyhow::Result;
use gym_dmc_core::error::GymDmcError;
use image::{Rgb, RgbImage};
use ndarray::{arr0, arr1};
use rand::{rngs::StdRng, Rng};
use std::{collections::BTreeMap, f64::consts::PI};

/// Tasks of the domain.
pub const TASKS: [&str; 3] = ["stand", "walk", "run"];

const TIMESTEP: f64 = 0.0025;
const CONTROL_TIMESTEP: f64 = 0.025;
const DEFAULT_TIME_LIMIT: f64 = 25.0;

const STAND_HEIGHT: f64 = 1.2;
const WALK_SPEED: f64 = 1.0;
const RUN_SPEED: f64 = 8.0;

const NQ: usize = 9;
const N_BODIES: usize = 7;
const N_CONTACTS: usize = 8;
const N_KEYPOINTS: usize = N_BODIES + N_CONTACTS;

const GRAVITY: f64 = 9.81;
const HIP_HEIGHT: f64 = 1.0;
const TORSO: f64 = 0.6;
const THIGH: f64 = 0.45;
const LEG: f64 = 0.5;
const HEEL: f64 = 0.05;
const TOE: f64 = 0.15;
const FOOT_RADIUS: f64 = 0.05;

// torso, right_thigh, right_leg, right_foot, left_thigh, left_leg, left_foot
const BODY_MASS: [f64; N_BODIES] = [3.5, 1.0, 0.8, 0.5, 1.0, 0.8, 0.5];
const GEAR: [f64; 6] = [100.0, 50.0, 20.0, 100.0, 50.0, 20.0];
const JOINT_RANGE: [(f64, f64); 3] = [
    (-20.0 * PI / 180.0, 100.0 * PI / 180.0),
    (-150.0 * PI / 180.0, 0.0),
    (-45.0 * PI / 180.0, 45.0 * PI / 180.0),
];

const ROOT_ARMATURE: f64 = 0.1;
const JOINT_ARMATURE: f64 = 0.01;
const JOINT_DAMPING: f64 = 0.1;
const LIMIT_STIFFNESS: f64 = 200.0;
const LIMIT_DAMPING: f64 = 5.0;
const CONTACT_STIFFNESS: f64 = 1e4;
const CONTACT_DAMPING: f64 = 100.0;
const FRICTION: f64 = 1.0;
const FRICTION_DAMPING: f64 = 100.0;
const MAX_SPEED: f64 = 50.0;
const FD_EPS: f64 = 1e-6;

type Point = (f64, f64);

/// Absolute angles of the seven bodies.
fn body_angles(q: &[f64]) -> [f64; N_BODIES] {
    let phi = q[2];
    let mut a = [phi; N_BODIES];
    for (leg, k) in [(0, 3), (1, 6)] {
        a[1 + 3 * leg] = phi + q[k];
        a[2 + 3 * leg] = a[1 + 3 * leg] + q[k + 1];
        a[3 + 3 * leg] = a[2 + 3 * leg] + q[k + 2];
    }
    a
}

/// Point `len` below `p` along a segment rotated counterclockwise by `angle`.
fn along(p: Point, angle: f64, len: f64) -> Point {
    (p.0 + len * angle.sin(), p.1 - len * angle.cos())
}

fn mid(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Segments of the model: hip, neck, then `[knee, ankle, heel, toe]` per leg.
struct Skeleton {
    hip: Point,
    neck: Point,
    legs: [[Point; 4]; 2],
}

fn skeleton(q: &[f64]) -> Skeleton {
    let a = body_angles(q);
    let hip = (q[1], HIP_HEIGHT + q[0]);
    let neck = (hip.0 - TORSO * a[0].sin(), hip.1 + TORSO * a[0].cos());
    let mut legs = [[(0.0, 0.0); 4]; 2];
    for (leg, points) in legs.iter_mut().enumerate() {
        let knee = along(hip, a[1 + 3 * leg], THIGH);
        let ankle = along(knee, a[2 + 3 * leg], LEG);
        let foot = a[3 + 3 * leg];
        let (c, s) = (foot.cos(), foot.sin());
        let heel = (ankle.0 - HEEL * c, ankle.1 - HEEL * s);
        let toe = (ankle.0 + TOE * c, ankle.1 + TOE * s);
        *points = [knee, ankle, heel, toe];
    }
    Skeleton { hip, neck, legs }
}

/// Centers of mass of the bodies followed by the contact candidates.
fn keypoints(q: &[f64]) -> [Point; N_KEYPOINTS] {
    let s = skeleton(q);
    let mut kp = [(0.0, 0.0); N_KEYPOINTS];
    kp[0] = mid(s.hip, s.neck);
    for (leg, [knee, ankle, heel, toe]) in s.legs.iter().enumerate() {
        kp[1 + 3 * leg] = mid(s.hip, *knee);
        kp[2 + 3 * leg] = mid(*knee, *ankle);
        kp[3 + 3 * leg] = mid(*heel, *toe);
        kp[N_BODIES + 3 * leg] = *knee;
        kp[N_BODIES + 3 * leg + 1] = *heel;
        kp[N_BODIES + 3 * leg + 2] = *toe;
    }
    kp[N_KEYPOINTS - 2] = s.hip;
    kp[N_KEYPOINTS - 1] = s.neck;
    kp
}

/// Keypoints and their derivatives with respect to each generalized coordinate.
fn keypoint_jacobian(q: &[f64]) -> ([Point; N_KEYPOINTS], Vec<[Point; N_KEYPOINTS]>) {
    let kp = keypoints(q);
    let mut qe = q.to_vec();
    let jac = (0..NQ)
        .map(|i| {
            qe[i] += FD_EPS;
            let kpe = keypoints(&qe);
            qe[i] = q[i];
            let mut d = [(0.0, 0.0); N_KEYPOINTS];
            for (k, dk) in d.iter_mut().enumerate() {
                *dk = ((kpe[k].0 - kp[k].0) / FD_EPS, (kpe[k].1 - kp[k].1) / FD_EPS);
            }
            d
        })
        .collect();
    (kp, jac)
}

fn limit_force(q: f64, v: f64, (lo, hi): (f64, f64)) -> f64 {
    if q < lo {
        LIMIT_STIFFNESS * (lo - q) - LIMIT_DAMPING * v.min(0.0)
    } else if q > hi {
        LIMIT_STIFFNESS * (hi - q) - LIMIT_DAMPING * v.max(0.0)
    } else {
        0.0
    }
}

/// Physics of the walker.
pub struct WalkerPhysics {
    data: PhysicsData,
}

impl Default for WalkerPhysics {
    fn default() -> Self {
        Self {
            data: PhysicsData::new(vec![0.0; NQ], 6, BODY_MASS.to_vec()),
        }
    }
}

impl WalkerPhysics {
    /// Height of the torso center.
    pub fn torso_height(&self) -> f64 {
        keypoints(&self.data.qpos)[0].1
    }

    /// Cosine of the torso pitch, 1 when upright.
    pub fn torso_upright(&self) -> f64 {
        self.data.qpos[2].cos()
    }

    /// Forward velocity of the torso center.
    pub fn horizontal_velocity(&self) -> f64 {
        let (q, v) = (&self.data.qpos, &self.data.qvel);
        v[1] - 0.5 * TORSO * q[2].cos() * v[2]
    }

    /// Cosine and sine of the absolute angle of every body.
    pub fn orientations(&self) -> Vec<f64> {
        body_angles(&self.data.qpos)
            .iter()
            .flat_map(|a| [a.cos(), a.sin()])
            .collect()
    }

    /// Lowest point of the model above the floor, accounting for the foot radius.
    fn clearance(&self) -> f64 {
        keypoints(&self.data.qpos)[N_BODIES..]
            .iter()
            .map(|p| p.1 - FOOT_RADIUS)
            .fold(f64::INFINITY, f64::min)
    }
}

impl Physics for WalkerPhysics {
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
        let (kp, jac) = keypoint_jacobian(&d.qpos);
        let mut force = [0.0; NQ];
        let mut inertia = [JOINT_ARMATURE; NQ];
        inertia[..3].iter_mut().for_each(|m| *m = ROOT_ARMATURE);

        for i in 0..NQ {
            for b in 0..N_BODIES {
                let (jx, jz) = jac[i][b];
                force[i] -= d.body_mass[b] * GRAVITY * jz;
                inertia[i] += d.body_mass[b] * (jx * jx + jz * jz);
            }
        }

        for c in N_BODIES..N_KEYPOINTS {
            let penetration = FOOT_RADIUS - kp[c].1;
            if penetration <= 0.0 {
                continue;
            }
            let (mut vx, mut vz) = (0.0, 0.0);
            for i in 0..NQ {
                vx += jac[i][c].0 * d.qvel[i];
                vz += jac[i][c].1 * d.qvel[i];
            }
            let normal = (CONTACT_STIFFNESS * penetration - CONTACT_DAMPING * vz).max(0.0);
            let tangent = (-FRICTION_DAMPING * vx).clamp(-FRICTION * normal, FRICTION * normal);
            for i in 0..NQ {
                force[i] += jac[i][c].0 * tangent + jac[i][c].1 * normal;
            }
        }

        for j in 0..6 {
            let i = 3 + j;
            force[i] += GEAR[j] * d.ctrl[j];
            force[i] += limit_force(d.qpos[i], d.qvel[i], JOINT_RANGE[j % 3]);
        }

        for i in 0..NQ {
            let damping = if i < 3 { 0.0 } else { JOINT_DAMPING };
            let v = (d.qvel[i] + TIMESTEP * force[i] / inertia[i])
                / (1.0 + TIMESTEP * damping / inertia[i]);
            d.qvel[i] = v.clamp(-MAX_SPEED, MAX_SPEED);
            d.qpos[i] += TIMESTEP * d.qvel[i];
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
        let torso_x = keypoints(&self.data.qpos)[0].0;
        let camera = match camera_id {
            -1 => Camera {
                center: (0.0, 1.0),
                view_width: 4.0,
            },
            0 => Camera {
                center: (torso_x, 1.0),
                view_width: 3.0,
            },
            1 => Camera {
                center: (torso_x, 1.2),
                view_width: 5.0,
            },
            _ => return Err(canvas::unknown_camera("walker", camera_id, 2)),
        };
        let mut canvas = Canvas::new(height, width, camera)?;
        canvas.ground(0.0, 0.5);

        let s = skeleton(&self.data.qpos);
        let color = canvas::self_color(highlight);
        let shade = Rgb([color.0[0] / 4 * 3, color.0[1] / 4 * 3, color.0[2] / 4 * 3]);
        // Left leg first so that the right one is drawn in front.
        for (leg, c) in [(1, shade), (0, color)] {
            let [knee, ankle, heel, toe] = s.legs[leg];
            canvas.capsule(s.hip, knee, 0.1, c);
            canvas.capsule(knee, ankle, 0.08, c);
            canvas.capsule(heel, toe, 2.0 * FOOT_RADIUS, c);
            if leg == 1 {
                canvas.capsule(s.hip, s.neck, 0.14, color);
            }
        }

        Ok(canvas.into_image())
    }
}

/// A walker task.
pub struct PlanarWalker {
    move_speed: f64,
}

impl PlanarWalker {
    /// Creates the task; a zero `move_speed` rewards standing only.
    pub fn new(move_speed: f64) -> Self {
        Self { move_speed }
    }
}

impl Task for PlanarWalker {
    type Physics = WalkerPhysics;

    fn initialize_episode(&mut self, physics: &mut Self::Physics, rng: &mut StdRng) {
        let d = physics.data_mut();
        d.qpos[2] = rng.gen_range(-PI..PI);
        for j in 0..6 {
            let (lo, hi) = JOINT_RANGE[j % 3];
            d.qpos[3 + j] = rng.gen_range(lo..hi);
        }
        // Lift the model out of the floor.
        let clearance = physics.clearance();
        physics.data_mut().qpos[0] -= clearance.min(0.0);
    }

    fn get_observation(&self, physics: &Self::Physics) -> NativeObservation {
        let mut obs = BTreeMap::new();
        obs.insert(
            "orientations".to_string(),
            arr1(&physics.orientations()).into_dyn(),
        );
        obs.insert("height".to_string(), arr0(physics.torso_height()).into_dyn());
        obs.insert("velocity".to_string(), arr1(&physics.data().qvel).into_dyn());
        obs
    }

    fn get_reward(&self, physics: &Self::Physics) -> f64 {
        let standing = tolerance(
            physics.torso_height(),
            Tolerance::default()
                .bounds(STAND_HEIGHT, f64::INFINITY)
                .margin(STAND_HEIGHT / 2.0),
        );
        let upright = (1.0 + physics.torso_upright()) / 2.0;
        let stand_reward = (3.0 * standing + upright) / 4.0;
        if self.move_speed == 0.0 {
            return stand_reward;
        }
        let move_reward = tolerance(
            physics.horizontal_velocity(),
            Tolerance::default()
                .bounds(self.move_speed, f64::INFINITY)
                .margin(self.move_speed / 2.0)
                .value_at_margin(0.5)
                .sigmoid(Sigmoid::Linear),
        );
        stand_reward * (5.0 * move_reward + 1.0) / 6.0
    }
}

/// Loads a task of the domain.
pub fn load(task: &str, opts: &LoadOptions) -> Result<Box<dyn ControlEnv>> {
    let move_speed = match task {
        "stand" => 0.0,
        "walk" => WALK_SPEED,
        "run" => RUN_SPEED,
        _ => {
            return Err(GymDmcError::UnknownTask {
                domain: "walker".to_string(),
                task: task.to_string(),
            }
            .into())
        }
    };
    let env = Environment::new(
        PlanarWalker::new(move_speed),
        WalkerPhysics::default(),
        CONTROL_TIMESTEP,
        opts.time_limit.unwrap_or(DEFAULT_TIME_LIMIT),
        opts.task_seed,
    )?;
    Ok(Box::new(env))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> LoadOptions {
        LoadOptions {
            task_seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_spec_layout() -> Result<()> {
        let env = load("walk", &LoadOptions::default())?;
        let spec = env.observation_spec();
        assert_eq!(spec["orientations"].shape(), &[14]);
        assert!(spec["height"].shape().is_empty());
        assert_eq!(spec["velocity"].shape(), &[9]);
        assert_eq!(env.action_spec().shape(), &[6]);
        assert!((env.control_timestep() - 0.025).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_standing_pose() {
        let physics = WalkerPhysics::default();
        assert!((physics.torso_height() - (HIP_HEIGHT + TORSO / 2.0)).abs() < 1e-12);
        assert!(physics.clearance().abs() < 1e-12);
        let reward = PlanarWalker::new(0.0).get_reward(&physics);
        assert!((reward - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_initial_state_is_above_floor() -> Result<()> {
        let mut physics = WalkerPhysics::default();
        let mut task = PlanarWalker::new(WALK_SPEED);
        let mut rng = rand::SeedableRng::seed_from_u64(7);
        for _ in 0..20 {
            physics.data_mut().reset();
            task.initialize_episode(&mut physics, &mut rng);
            assert!(physics.clearance() >= -1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_simulation_stays_finite() -> Result<()> {
        let mut env = load("run", &seeded(1))?;
        env.reset();
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..200 {
            let action = (0..6).map(|_| 2.0 * rng.f64() - 1.0).collect::<Vec<_>>();
            let ts = env.step(&action)?;
            let reward = ts.reward.unwrap_or(f64::NAN);
            assert!((0.0..=1.0).contains(&reward));
            assert!(ts.observation.values().all(|a| a.iter().all(|x| x.is_finite())));
        }
        Ok(())
    }

    #[test]
    fn test_floats_without_mass() -> Result<()> {
        let mut env = load("stand", &seeded(2))?;
        env.physics_mut()
            .body_mass_mut()
            .iter_mut()
            .for_each(|m| *m = 0.0);
        env.reset();
        let before = env.observation()["height"].sum();
        for _ in 0..40 {
            env.step(&[0.0; 6])?;
        }
        let after = env.observation()["height"].sum();
        assert!((before - after).abs() < 1e-6, "{} -> {}", before, after);
        Ok(())
    }
}
