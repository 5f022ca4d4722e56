//! Core functionalities.
mod env;
mod obs;
mod render;
mod step;
pub use env::{Env, Metadata};
pub use obs::Observation;
pub use render::{RenderMode, RenderOpts, Rendered};
pub use step::Step;
