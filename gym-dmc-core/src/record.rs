//! Side-channel information attached to a [`Step`](crate::Step).
//!
//! A [`Record`] is a flexible container of key-value pairs. Environments and
//! wrappers put diagnostic values into it:
//!
//! * `"sim_state"` - the physics state after the last native transition,
//! * `"observations_original"` - the structured observation before flattening,
//! * `"TimeLimit.truncated"` - set when a time limit ended the episode.
//!
//! ```rust
//! use gym_dmc_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("reward", RecordValue::Scalar(-1.0));
//! assert_eq!(record.get_scalar("reward").unwrap(), -1.0);
//! ```
mod base;

pub use base::{Record, RecordValue};
