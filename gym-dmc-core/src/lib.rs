#![warn(missing_docs)]
//! Environment contract, registry and wrappers of gym-dmc.
//!
//! This crate does not know about any physics engine. It defines
//!
//! * the [`Env`] trait with `reset`/`step`/`render`/`seed`/`close`,
//! * [`Space`] and [`Observation`], the shapes environments declare and emit,
//! * the [`registration`] of environments by string id, and
//! * [`wrappers`] that decorate environments.
//!
//! Concrete environments live in the `gym-dmc` crate.
pub mod array;
pub mod dummy;
pub mod error;
pub mod record;
pub mod registration;
pub mod space;
pub mod wrappers;

mod base;
pub use array::{Array, DType};
pub use base::{Env, Metadata, Observation, RenderMode, RenderOpts, Rendered, Step};
pub use registration::{EnvRegistry, EnvSpec, KwValue, Kwargs};
pub use space::{BoxSpace, Space};
