//! Observation and action spaces.
use crate::{error::GymDmcError, Array, DType, Observation};
use anyhow::Result;
use ndarray::{Array1, ArrayD, IxDyn, Zip};
use std::collections::BTreeMap;

/// A box in `R^n` (or a grid of bytes for `u8`), bounded elementwise by `low` and `high`.
///
/// Unbounded dimensions carry infinite bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    /// Lower bounds.
    pub low: ArrayD<f64>,

    /// Upper bounds.
    pub high: ArrayD<f64>,

    /// Element type of the arrays contained in the space.
    pub dtype: DType,
}

impl BoxSpace {
    /// Creates a box from elementwise bounds.
    pub fn new(low: ArrayD<f64>, high: ArrayD<f64>, dtype: DType) -> Result<Self> {
        if low.shape() != high.shape() {
            return Err(GymDmcError::InvalidConfig(format!(
                "shape of low {:?} differs from shape of high {:?}",
                low.shape(),
                high.shape()
            ))
            .into());
        }
        Ok(Self { low, high, dtype })
    }

    /// Creates a box with the same bounds for every element.
    pub fn uniform(shape: &[usize], low: f64, high: f64, dtype: DType) -> Self {
        Self {
            low: ArrayD::from_elem(IxDyn(shape), low),
            high: ArrayD::from_elem(IxDyn(shape), high),
            dtype,
        }
    }

    /// Creates a box without bounds.
    pub fn unbounded(shape: &[usize], dtype: DType) -> Self {
        Self::uniform(shape, f64::NEG_INFINITY, f64::INFINITY, dtype)
    }

    /// Shape of the arrays in the space.
    pub fn shape(&self) -> &[usize] {
        self.low.shape()
    }

    /// Number of elements of an array in the space.
    pub fn flat_dim(&self) -> usize {
        self.low.len()
    }

    /// Returns `true` if `a` has the shape and element type of the space and lies in the bounds.
    pub fn contains(&self, a: &Array) -> bool {
        if a.shape() != self.shape() || a.dtype() != self.dtype {
            return false;
        }
        a.to_flat_vec::<f64>()
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(x, (lo, hi))| lo <= x && x <= hi)
    }

    /// Draws an element of the space.
    ///
    /// Bounded dimensions are sampled uniformly, unbounded ones from a standard normal
    /// distribution and half-bounded ones from a shifted exponential distribution.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Array {
        let v = Zip::from(&self.low)
            .and(&self.high)
            .map_collect(|&lo, &hi| match (lo.is_finite(), hi.is_finite()) {
                (true, true) if self.dtype.is_integer() => {
                    lo + (rng.f64() * (hi - lo + 1.0)).floor().min(hi - lo)
                }
                (true, true) => lo + rng.f64() * (hi - lo),
                (true, false) => lo + exponential(rng),
                (false, true) => hi - exponential(rng),
                (false, false) => standard_normal(rng),
            });
        Array::F64(v).cast(self.dtype)
    }
}

fn exponential(rng: &mut fastrand::Rng) -> f64 {
    -(1.0 - rng.f64()).ln()
}

fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    // Box-Muller
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// An observation or action space.
#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    /// A single array.
    Box(BoxSpace),

    /// Named arrays, iterated in key order.
    Dict(BTreeMap<String, BoxSpace>),
}

impl Space {
    /// Shape of the space, `None` for [`Space::Dict`].
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Space::Box(b) => Some(b.shape()),
            Space::Dict(_) => None,
        }
    }

    /// Element type of the space, `None` for [`Space::Dict`].
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Space::Box(b) => Some(b.dtype),
            Space::Dict(_) => None,
        }
    }

    /// Returns the sub-space under `key` of a dict space.
    pub fn get(&self, key: &str) -> Option<&BoxSpace> {
        match self {
            Space::Box(_) => None,
            Space::Dict(d) => d.get(key),
        }
    }

    /// Keys of a dict space in iteration order; empty for a box.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Space::Box(_) => vec![],
            Space::Dict(d) => d.keys().cloned().collect(),
        }
    }

    /// Number of elements of the flattened space.
    pub fn flat_dim(&self) -> usize {
        match self {
            Space::Box(b) => b.flat_dim(),
            Space::Dict(d) => d.values().map(|b| b.flat_dim()).sum(),
        }
    }

    /// Returns `true` if the observation matches the space in structure, shape,
    /// element type and bounds.
    pub fn contains(&self, obs: &Observation) -> bool {
        match (self, obs) {
            (Space::Box(b), Observation::Array(a)) => b.contains(a),
            (Space::Dict(d), Observation::Dict(o)) => {
                d.len() == o.len()
                    && d
                        .iter()
                        .all(|(k, b)| o.get(k).map(|a| b.contains(a)).unwrap_or(false))
            }
            _ => false,
        }
    }

    /// Draws an element of the space.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Observation {
        match self {
            Space::Box(b) => Observation::Array(b.sample(rng)),
            Space::Dict(d) => Observation::Dict(
                d.iter()
                    .map(|(k, b)| (k.clone(), b.sample(rng)))
                    .collect(),
            ),
        }
    }

    /// Returns the one-dimensional box the space flattens into.
    ///
    /// For dict spaces, bounds are concatenated in key order and the element type is
    /// the promotion of all sub-space types.
    pub fn flatten_space(&self) -> BoxSpace {
        match self {
            Space::Box(b) => {
                BoxSpace {
                    low: b.low.iter().cloned().collect::<Array1<_>>().into_dyn(),
                    high: b.high.iter().cloned().collect::<Array1<_>>().into_dyn(),
                    dtype: b.dtype,
                }
            }
            Space::Dict(d) => {
                let low = d
                    .values()
                    .flat_map(|b| b.low.iter().cloned())
                    .collect::<Vec<_>>();
                let high = d
                    .values()
                    .flat_map(|b| b.high.iter().cloned())
                    .collect::<Vec<_>>();
                let dtype = d
                    .values()
                    .map(|b| b.dtype)
                    .reduce(|a, b| a.promote(b))
                    .unwrap_or(DType::F64);
                BoxSpace {
                    low: Array1::from(low).into_dyn(),
                    high: Array1::from(high).into_dyn(),
                    dtype,
                }
            }
        }
    }

    /// Flattens an observation of this space into a one-dimensional array of the
    /// type of [`Space::flatten_space`].
    pub fn flatten(&self, obs: &Observation) -> Result<Array> {
        let flat = self.flatten_space();
        let v = match (self, obs) {
            (Space::Box(_), Observation::Array(a)) => a.to_flat_vec::<f64>(),
            (Space::Dict(d), Observation::Dict(o)) => {
                let mut v = Vec::with_capacity(flat.flat_dim());
                for key in d.keys() {
                    let a = o.get(key).ok_or_else(|| GymDmcError::MissingObservationKey {
                        key: key.clone(),
                        available: o.keys().cloned().collect(),
                    })?;
                    v.extend(a.to_flat_vec::<f64>());
                }
                v
            }
            _ => {
                return Err(GymDmcError::InvalidConfig(
                    "observation does not match the structure of the space".to_string(),
                )
                .into())
            }
        };
        if v.len() != flat.flat_dim() {
            return Err(GymDmcError::InvalidConfig(format!(
                "observation has {} elements, space expects {}",
                v.len(),
                flat.flat_dim()
            ))
            .into());
        }
        Array::from_f64_vec(flat.shape(), flat.dtype, v)
    }

    /// Inverse of [`Space::flatten`].
    pub fn unflatten(&self, flat: &Array) -> Result<Observation> {
        if flat.len() != self.flat_dim() {
            return Err(GymDmcError::InvalidConfig(format!(
                "flat array has {} elements, space expects {}",
                flat.len(),
                self.flat_dim()
            ))
            .into());
        }
        let v = flat.to_flat_vec::<f64>();
        match self {
            Space::Box(b) => Ok(Observation::Array(Array::from_f64_vec(
                b.shape(),
                b.dtype,
                v,
            )?)),
            Space::Dict(d) => {
                let mut offset = 0;
                let mut obs = BTreeMap::new();
                for (key, b) in d.iter() {
                    let n = b.flat_dim();
                    let a = Array::from_f64_vec(b.shape(), b.dtype, v[offset..offset + n].to_vec())?;
                    obs.insert(key.clone(), a);
                    offset += n;
                }
                Ok(Observation::Dict(obs))
            }
        }
    }
}

impl From<BoxSpace> for Space {
    fn from(b: BoxSpace) -> Self {
        Space::Box(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker_like() -> Space {
        let mut d = BTreeMap::new();
        d.insert("orientations".to_string(), BoxSpace::unbounded(&[14], DType::F64));
        d.insert("height".to_string(), BoxSpace::unbounded(&[], DType::F64));
        d.insert("velocity".to_string(), BoxSpace::unbounded(&[9], DType::F64));
        Space::Dict(d)
    }

    #[test]
    fn test_flat_dim_is_sum_of_leaves() {
        let space = walker_like();
        assert_eq!(space.flat_dim(), 24);
        assert_eq!(space.flatten_space().shape(), &[24]);
    }

    #[test]
    fn test_flatten_unflatten() -> Result<()> {
        let space = walker_like();
        let mut rng = fastrand::Rng::with_seed(3);
        let obs = space.sample(&mut rng);
        assert!(space.contains(&obs));

        let flat = space.flatten(&obs)?;
        assert_eq!(flat.shape(), &[24]);

        // Keys are concatenated in sorted order: height, orientations, velocity.
        let v = flat.to_flat_vec::<f64>();
        let height = obs.get("height").unwrap().to_flat_vec::<f64>();
        assert_eq!(v[0], height[0]);

        assert_eq!(space.unflatten(&flat)?, obs);
        Ok(())
    }

    #[test]
    fn test_flatten_missing_key() {
        let space = walker_like();
        let mut obs = BTreeMap::new();
        obs.insert("height".to_string(), Array::zeros(&[], DType::F64));
        let err = space.flatten(&Observation::Dict(obs)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GymDmcError>(),
            Some(GymDmcError::MissingObservationKey { .. })
        ));
    }

    #[test]
    fn test_flatten_space_promotes_dtype() {
        let mut d = BTreeMap::new();
        d.insert("pixels".to_string(), BoxSpace::uniform(&[2, 2, 1], 0.0, 255.0, DType::U8));
        d.insert("position".to_string(), BoxSpace::unbounded(&[3], DType::F64));
        let flat = Space::Dict(d).flatten_space();
        assert_eq!(flat.dtype, DType::F64);
        assert_eq!(flat.flat_dim(), 7);
        assert_eq!(flat.low[0], 0.0);
        assert_eq!(flat.high[6], f64::INFINITY);
    }

    #[test]
    fn test_sample_within_bounds() {
        let b = BoxSpace::uniform(&[6], -1.0, 1.0, DType::F64);
        let mut rng = fastrand::Rng::with_seed(0);
        for _ in 0..100 {
            assert!(b.contains(&b.sample(&mut rng)));
        }
        let pixels = BoxSpace::uniform(&[4, 4, 3], 0.0, 255.0, DType::U8);
        assert!(pixels.contains(&pixels.sample(&mut rng)));
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let b = BoxSpace::uniform(&[3], -1.0, 1.0, DType::F32);
        let a1 = b.sample(&mut fastrand::Rng::with_seed(7));
        let a2 = b.sample(&mut fastrand::Rng::with_seed(7));
        assert_eq!(a1, a2);
    }
}
