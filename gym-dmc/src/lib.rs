//! Control-suite environments behind the gym-style [`Env`](gym_dmc_core::Env) interface.
//!
//! [`DmcEnv`] adapts a native [`ControlEnv`](suite::ControlEnv), which reports
//! time steps with an optional reward and a dict of observation arrays, to
//! `reset`/`step`. It repeats actions for `frame_skip` native steps and can
//! add rendered frames to the observation. [`make_env`] wraps the adapter the
//! way registered environments are built, and [`register_suite`] registers
//! every task of the built-in [`suite`] under ids like `Walker-walk-v1`.
//!
//! ```no_run
//! use anyhow::Result;
//! use gym_dmc::make;
//! use gym_dmc_core::{kwargs, Env as _};
//!
//! fn main() -> Result<()> {
//! #     env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
//!     let mut env = make("Walker-walk-v1", &kwargs! {"frame_skip" => 4})?;
//!     assert_eq!(env.max_episode_steps(), Some(250));
//!
//!     env.seed(42);
//!     let mut obs = env.reset()?;
//!     loop {
//!         let act = env.sample_action();
//!         let step = env.step(&act)?;
//!         let done = step.is_done();
//!         obs = step.obs;
//!         if done {
//!             break;
//!         }
//!     }
//!     println!("{:?}", obs.shape());
//!     env.close()
//! }
//! ```
mod env;
mod make;
pub mod suite;
pub use env::{
    box_from_spec, gray_array, rgb_array, space_from_specs, DmcEnv, DmcEnvConfig, PIXELS_KEY,
    SIM_STATE_KEY,
};
pub use make::{
    env_id, make, make_env, max_episode_steps, register_suite, registered_ids,
    DEFAULT_EPISODE_FRAMES, ENTRY_POINT,
};
