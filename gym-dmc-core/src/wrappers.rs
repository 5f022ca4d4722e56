//! Environment decorators.
//!
//! Each wrapper is itself an [`Env`](crate::Env) and forwards everything it
//! does not change to the wrapped environment, so wrappers compose freely:
//!
//! * [`OrderEnforcing`] rejects `step` before `reset`,
//! * [`TimeLimit`] truncates episodes after a number of steps,
//! * [`FlattenObservation`] turns dict observations into one array,
//! * [`ObservationByKey`] keeps a single named sub-observation.
mod by_key;
mod flatten;
mod order_enforcing;
mod time_limit;
pub use by_key::ObservationByKey;
pub use flatten::{FlattenObservation, ORIGINAL_OBSERVATION_KEY};
pub use order_enforcing::OrderEnforcing;
pub use time_limit::{TimeLimit, TRUNCATED_KEY};
