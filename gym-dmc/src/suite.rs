//! Built-in control suite.
//!
//! Planar domains simulated in pure Rust behind the [`ControlEnv`] trait. They
//! publish the observation and action layouts of the well-known control-suite
//! domains of the same names:
//!
//! | domain       | tasks                                               | observation                                    | action |
//! |--------------|-----------------------------------------------------|------------------------------------------------|--------|
//! | `cartpole`   | `balance`, `balance_sparse`, `swingup`, `swingup_sparse` | `position` 3, `velocity` 2                | 1      |
//! | `point_mass` | `easy`, `hard`                                      | `position` 2, `velocity` 2                     | 2      |
//! | `walker`     | `stand`, `walk`, `run`                              | `orientations` 14, `height` (scalar), `velocity` 9 | 6  |
mod base;
pub mod canvas;
pub mod cartpole;
pub mod point_mass;
pub mod rewards;
pub mod walker;
use anyhow::Result;
pub use base::{
    ArraySpec, ControlEnv, Environment, LoadOptions, NativeObservation, Physics, PhysicsData,
    StepType, Task, TimeStep,
};
use gym_dmc_core::error::GymDmcError;
use log::info;

/// Domain names of the suite.
pub const DOMAINS: [&str; 3] = ["cartpole", "point_mass", "walker"];

/// Returns every `(domain, task)` pair of the suite.
pub fn all_tasks() -> Vec<(&'static str, &'static str)> {
    let mut tasks = vec![];
    tasks.extend(cartpole::TASKS.iter().map(|t| ("cartpole", *t)));
    tasks.extend(point_mass::TASKS.iter().map(|t| ("point_mass", *t)));
    tasks.extend(walker::TASKS.iter().map(|t| ("walker", *t)));
    tasks
}

/// Loads the task `task_name` of the domain `domain_name`.
pub fn load(
    domain_name: &str,
    task_name: &str,
    opts: &LoadOptions,
) -> Result<Box<dyn ControlEnv>> {
    let env = match domain_name {
        "cartpole" => cartpole::load(task_name, opts)?,
        "point_mass" => point_mass::load(task_name, opts)?,
        "walker" => walker::load(task_name, opts)?,
        _ => {
            return Err(GymDmcError::UnknownTask {
                domain: domain_name.to_string(),
                task: task_name.to_string(),
            }
            .into())
        }
    };
    info!("Loaded {}/{} with {:?}", domain_name, task_name, opts);
    Ok(env)
}
