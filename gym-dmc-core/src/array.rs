//! Arrays exchanged with environments.
//!
//! Observations of control-suite domains mix element types: proprioceptive
//! features are `f64` while rendered frames are `u8`. [`Array`] keeps the
//! element type as a tag so that an observation can be checked against the
//! declared [`Space`](crate::Space) without guessing.
use anyhow::Result;
use ndarray::{Array1, ArrayD, IxDyn};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

/// Element type of an [`Array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit float.
    F32,

    /// 64-bit float.
    F64,

    /// Unsigned byte, used for pixels.
    U8,
}

impl DType {
    /// Returns the type both `self` and `other` can be represented in without loss.
    pub fn promote(self, other: DType) -> DType {
        match (self, other) {
            (DType::F64, _) | (_, DType::F64) => DType::F64,
            (DType::F32, _) | (_, DType::F32) => DType::F32,
            _ => DType::U8,
        }
    }

    /// Returns `true` for integer types.
    pub fn is_integer(&self) -> bool {
        matches!(self, DType::U8)
    }
}

/// A dynamically shaped array tagged with its element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// `f32` elements.
    F32(ArrayD<f32>),

    /// `f64` elements.
    F64(ArrayD<f64>),

    /// `u8` elements.
    U8(ArrayD<u8>),
}

impl Array {
    /// Creates an array filled with zeros.
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        match dtype {
            DType::F32 => Array::F32(ArrayD::zeros(IxDyn(shape))),
            DType::F64 => Array::F64(ArrayD::zeros(IxDyn(shape))),
            DType::U8 => Array::U8(ArrayD::zeros(IxDyn(shape))),
        }
    }

    /// Creates an array of `dtype` from `f64` values laid out in row-major order.
    ///
    /// Values are converted with `as` casts, so integer types truncate.
    pub fn from_f64_vec(shape: &[usize], dtype: DType, v: Vec<f64>) -> Result<Self> {
        let a = ArrayD::from_shape_vec(IxDyn(shape), v)?;
        Ok(Array::F64(a).cast(dtype))
    }

    /// Shape of the array.
    pub fn shape(&self) -> &[usize] {
        match self {
            Array::F32(a) => a.shape(),
            Array::F64(a) => a.shape(),
            Array::U8(a) => a.shape(),
        }
    }

    /// Element type of the array.
    pub fn dtype(&self) -> DType {
        match self {
            Array::F32(_) => DType::F32,
            Array::F64(_) => DType::F64,
            Array::U8(_) => DType::U8,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Array::F32(a) => a.len(),
            Array::F64(a) => a.len(),
            Array::U8(a) => a.len(),
        }
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts the array into a [`ArrayD`] of element type `T`.
    pub fn to_arrayd<T>(&self) -> ArrayD<T>
    where
        T: 'static + Copy,
        f32: AsPrimitive<T>,
        f64: AsPrimitive<T>,
        u8: AsPrimitive<T>,
    {
        match self {
            Array::F32(a) => a.mapv(|x| x.as_()),
            Array::F64(a) => a.mapv(|x| x.as_()),
            Array::U8(a) => a.mapv(|x| x.as_()),
        }
    }

    /// Returns the elements in row-major order converted to `T`.
    pub fn to_flat_vec<T>(&self) -> Vec<T>
    where
        T: 'static + Copy,
        f32: AsPrimitive<T>,
        f64: AsPrimitive<T>,
        u8: AsPrimitive<T>,
    {
        match self {
            Array::F32(a) => a.iter().map(|x| x.as_()).collect(),
            Array::F64(a) => a.iter().map(|x| x.as_()).collect(),
            Array::U8(a) => a.iter().map(|x| x.as_()).collect(),
        }
    }

    /// Converts the array to `dtype`.
    pub fn cast(&self, dtype: DType) -> Array {
        if self.dtype() == dtype {
            return self.clone();
        }
        match dtype {
            DType::F32 => Array::F32(self.to_arrayd()),
            DType::F64 => Array::F64(self.to_arrayd()),
            DType::U8 => Array::U8(self.to_arrayd()),
        }
    }

    /// Returns the array with axes permuted, in row-major layout.
    pub fn permuted_axes(self, axes: &[usize]) -> Array {
        fn standard<T: Clone>(a: ArrayD<T>, axes: &[usize]) -> ArrayD<T> {
            a.permuted_axes(IxDyn(axes))
                .as_standard_layout()
                .into_owned()
        }
        match self {
            Array::F32(a) => Array::F32(standard(a, axes)),
            Array::F64(a) => Array::F64(standard(a, axes)),
            Array::U8(a) => Array::U8(standard(a, axes)),
        }
    }
}

impl From<ArrayD<f32>> for Array {
    fn from(a: ArrayD<f32>) -> Self {
        Array::F32(a)
    }
}

impl From<ArrayD<f64>> for Array {
    fn from(a: ArrayD<f64>) -> Self {
        Array::F64(a)
    }
}

impl From<ArrayD<u8>> for Array {
    fn from(a: ArrayD<u8>) -> Self {
        Array::U8(a)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::F64(Array1::from(v).into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote() {
        assert_eq!(DType::U8.promote(DType::U8), DType::U8);
        assert_eq!(DType::U8.promote(DType::F32), DType::F32);
        assert_eq!(DType::F32.promote(DType::F64), DType::F64);
    }

    #[test]
    fn test_permuted_axes_keeps_elements() -> Result<()> {
        let v = (0..24).map(|x| x as f64).collect::<Vec<_>>();
        let a = Array::from_f64_vec(&[2, 3, 4], DType::U8, v)?;
        let b = a.clone().permuted_axes(&[2, 0, 1]);
        assert_eq!(b.shape(), &[4, 2, 3]);
        assert_eq!(b.dtype(), DType::U8);
        if let (Array::U8(a), Array::U8(b)) = (&a, &b) {
            assert_eq!(a[[1, 2, 3]], b[[3, 1, 2]]);
        } else {
            panic!("dtype changed");
        }
        Ok(())
    }
}
