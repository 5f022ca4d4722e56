//! Environment ids, specs and the registry.
//!
//! An [`EnvRegistry`] maps ids of the form `[namespace/]name[-vVERSION]` to
//! [`EnvSpec`]s. A spec knows how to construct its environment (an
//! [`EntryPoint`]), the default keyword arguments passed to the constructor and
//! the decorators applied to the constructed environment.
//!
//! ```rust
//! use gym_dmc_core::{kwargs, registration::{EnvRegistry, EnvSpec}};
//! # use gym_dmc_core::{Env, Space};
//! # fn build(_id: &str, _kwargs: &gym_dmc_core::Kwargs) -> anyhow::Result<Box<dyn Env>> {
//! #     unimplemented!()
//! # }
//!
//! let mut registry = EnvRegistry::new();
//! registry.register(
//!     EnvSpec::new("Cartpole-balance-v1", build)?
//!         .kwargs(kwargs! {"frame_skip" => 1})
//!         .max_episode_steps(1000),
//! );
//! assert!(registry.spec("Cartpole-balance-v1").is_some());
//! # Ok::<(), anyhow::Error>(())
//! ```
mod env_id;
mod kwargs;
mod registry;
mod spec;

pub use env_id::{canonical_id, parse_env_id, ENV_ID_GRAMMAR};
pub use kwargs::{kwargs_from_config, kwargs_to_config, merge_kwargs, take_kwarg, KwValue, Kwargs};
pub use registry::EnvRegistry;
pub use spec::{Constructor, EntryPoint, EnvSpec};
