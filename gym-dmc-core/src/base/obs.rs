//! Observation.
use crate::{error::GymDmcError, Array};
use anyhow::Result;
use std::collections::BTreeMap;

/// Observation returned by [`Env::reset`](crate::Env::reset) and [`Env::step`](crate::Env::step).
///
/// Native control-suite environments emit named arrays; wrappers may turn them
/// into a single array.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A single array.
    Array(Array),

    /// Named arrays, iterated in key order.
    Dict(BTreeMap<String, Array>),
}

impl Observation {
    /// Shape of the observation, `None` for [`Observation::Dict`].
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Observation::Array(a) => Some(a.shape()),
            Observation::Dict(_) => None,
        }
    }

    /// Returns the named array of a dict observation.
    pub fn get(&self, key: &str) -> Option<&Array> {
        match self {
            Observation::Array(_) => None,
            Observation::Dict(d) => d.get(key),
        }
    }

    /// Returns the array of an array observation.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Observation::Array(a) => Some(a),
            Observation::Dict(_) => None,
        }
    }

    /// Inserts a named array into a dict observation.
    pub fn insert(&mut self, key: impl Into<String>, a: Array) -> Result<()> {
        match self {
            Observation::Dict(d) => {
                d.insert(key.into(), a);
                Ok(())
            }
            Observation::Array(_) => Err(GymDmcError::InvalidConfig(
                "cannot insert a named array into an array observation".to_string(),
            )
            .into()),
        }
    }

    /// Takes the named array out of a dict observation.
    pub fn take(self, key: &str) -> Result<Array> {
        match self {
            Observation::Dict(mut d) => {
                let available = d.keys().cloned().collect();
                d.remove(key).ok_or_else(|| {
                    GymDmcError::MissingObservationKey {
                        key: key.to_string(),
                        available,
                    }
                    .into()
                })
            }
            Observation::Array(_) => Err(GymDmcError::MissingObservationKey {
                key: key.to_string(),
                available: vec![],
            }
            .into()),
        }
    }
}

impl From<Array> for Observation {
    fn from(a: Array) -> Self {
        Observation::Array(a)
    }
}

impl From<BTreeMap<String, Array>> for Observation {
    fn from(d: BTreeMap<String, Array>) -> Self {
        Observation::Dict(d)
    }
}
