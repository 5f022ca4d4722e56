//! Base implementation of records.
use crate::{error::GymDmcError, Array, Observation};
use std::{
    collections::{
        hash_map::{Iter, Keys},
        HashMap,
    },
    convert::Into,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value.
    Scalar(f64),

    /// A flag.
    Bool(bool),

    /// An array, e.g. a physics state snapshot.
    Array(Array),

    /// A text value.
    String(String),

    /// A whole observation.
    Observation(Observation),
}

/// A container for storing key-value pairs of various data types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f64) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns `true` if the key exists.
    pub fn contains_key(&self, k: &str) -> bool {
        self.0.contains_key(k)
    }

    /// Merges two records, consuming both.
    ///
    /// If both records contain the same key, the value from the second record
    /// will overwrite the value from the first record.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f64, GymDmcError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(value_type_error(k, "Scalar")),
            None => Err(key_error(k)),
        }
    }

    /// Gets a flag from the record.
    pub fn get_bool(&self, k: &str) -> Result<bool, GymDmcError> {
        match self.0.get(k) {
            Some(RecordValue::Bool(v)) => Ok(*v),
            Some(_) => Err(value_type_error(k, "Bool")),
            None => Err(key_error(k)),
        }
    }

    /// Gets an array from the record.
    pub fn get_array(&self, k: &str) -> Result<&Array, GymDmcError> {
        match self.0.get(k) {
            Some(RecordValue::Array(v)) => Ok(v),
            Some(_) => Err(value_type_error(k, "Array")),
            None => Err(key_error(k)),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, GymDmcError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(value_type_error(k, "String")),
            None => Err(key_error(k)),
        }
    }

    /// Gets an observation from the record.
    pub fn get_observation(&self, k: &str) -> Result<&Observation, GymDmcError> {
        match self.0.get(k) {
            Some(RecordValue::Observation(o)) => Ok(o),
            Some(_) => Err(value_type_error(k, "Observation")),
            None => Err(key_error(k)),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }
}

fn key_error(k: &str) -> GymDmcError {
    GymDmcError::RecordKeyError(k.to_string())
}

fn value_type_error(k: &str, expected: &str) -> GymDmcError {
    GymDmcError::RecordValueTypeError(format!("{} (expected {})", k, expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites() {
        let a = Record::from_slice(&[
            ("x", RecordValue::Scalar(1.0)),
            ("y", RecordValue::Bool(false)),
        ]);
        let b = Record::from_scalar("x", 2.0);
        let c = a.merge(b);
        assert_eq!(c.len(), 2);
        assert_eq!(c.get_scalar("x").unwrap(), 2.0);
        assert!(!c.get_bool("y").unwrap());
        assert!(c.get_string("y").is_err());
        assert!(c.get_scalar("z").is_err());
    }
}
