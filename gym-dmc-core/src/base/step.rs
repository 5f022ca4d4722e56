//! Environment step.
use super::Observation;
use crate::record::Record;

/// Represents the outcome `(o_t+1, r_t, done, info)` of an environment step.
///
/// An environment emits [`Step`] object at every interaction steps.
#[derive(Debug)]
pub struct Step {
    /// Observation.
    pub obs: Observation,

    /// Reward, summed over repeated native transitions.
    pub reward: f64,

    /// Flag denoting if episode is terminated by the environment.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated by a time limit.
    pub is_truncated: bool,

    /// Side-channel information.
    pub info: Record,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: Observation,
        reward: f64,
        is_terminated: bool,
        is_truncated: bool,
        info: Record,
    ) -> Self {
        Step {
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }

    /// Returns the classic `(observation, reward, done, info)` tuple.
    pub fn into_tuple(self) -> (Observation, f64, bool, Record) {
        let done = self.is_done();
        (self.obs, self.reward, done, self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record::RecordValue, Array};

    #[test]
    fn test_into_tuple() {
        let info = Record::from_slice(&[("x", RecordValue::Scalar(2.0))]);
        let obs = Observation::Array(Array::from(vec![0.5]));
        let step = Step::new(obs.clone(), 1.5, false, true, info.clone());
        assert!(step.is_done());

        let (obs_, reward, done, info_) = step.into_tuple();
        assert_eq!(obs_, obs);
        assert_eq!(reward, 1.5);
        assert!(done);
        assert_eq!(info_, info);

        let step = Step::new(obs, 0.0, false, false, Record::empty());
        assert!(!step.into_tuple().2);
    }
}
