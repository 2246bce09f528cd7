//! Dense tensors and the elementwise arithmetic used to fold parameters.
//!
//! Every arithmetic operation returns a new tensor; operands are never
//! modified, so a tensor that is still referenced by the graph stays intact
//! until a rewrite replaces it.

use crate::broadcast::{broadcast_indices, broadcast_shape, broadcast_strides};
use crate::types::DataType;
use crate::{Error, Result};
use half::f16;

/// Raw tensor element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    Bool(Vec<bool>),
}

impl TensorData {
    /// Get the number of elements in this tensor data.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F16(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::F64(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::U8(v) => v.len(),
            TensorData::Bool(v) => v.len(),
        }
    }

    /// Check if this tensor data is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the data type of the stored elements.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::F16(_) => DataType::F16,
            TensorData::F32(_) => DataType::F32,
            TensorData::F64(_) => DataType::F64,
            TensorData::I32(_) => DataType::I32,
            TensorData::I64(_) => DataType::I64,
            TensorData::U8(_) => DataType::U8,
            TensorData::Bool(_) => DataType::Bool,
        }
    }

    /// Widen floating-point elements to `f64`. Returns `None` for other types.
    fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            TensorData::F16(v) => Some(v.iter().map(|x| x.to_f64()).collect()),
            TensorData::F32(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TensorData::F64(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Narrow `f64` values to the floating-point type `dtype`.
    fn from_f64(values: Vec<f64>, dtype: DataType) -> Result<Self> {
        match dtype {
            DataType::F16 => Ok(TensorData::F16(
                values.into_iter().map(f16::from_f64).collect(),
            )),
            DataType::F32 => Ok(TensorData::F32(
                values.into_iter().map(|x| x as f32).collect(),
            )),
            DataType::F64 => Ok(TensorData::F64(values)),
            other => Err(Error::Type(format!(
                "Cannot store floating-point results as {other}"
            ))),
        }
    }
}

/// A dense n-dimensional tensor known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorValue {
    /// The raw tensor data, row-major.
    pub data: TensorData,

    /// The shape of the tensor (dimensions).
    pub shape: Vec<usize>,

    /// The data type of the tensor.
    pub dtype: DataType,
}

impl TensorValue {
    /// Create a new TensorValue with data and shape.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the shape product.
    pub fn new(data: TensorData, shape: Vec<usize>) -> Self {
        let expected_len: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_len,
            "Data length {} doesn't match shape {:?} (product = {})",
            data.len(),
            shape,
            expected_len
        );
        let dtype = data.dtype();
        Self { data, shape, dtype }
    }

    /// Fallible variant of [`TensorValue::new`].
    pub fn try_new(data: TensorData, shape: Vec<usize>) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::Shape(format!(
                "Data length {} doesn't match shape {:?} (product = {})",
                data.len(),
                shape,
                expected_len
            )));
        }
        let dtype = data.dtype();
        Ok(Self { data, shape, dtype })
    }

    /// Create an `F32` tensor.
    pub fn from_f32(values: Vec<f32>, shape: Vec<usize>) -> Self {
        Self::new(TensorData::F32(values), shape)
    }

    /// Get the number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if this tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size along `axis`, if the axis exists.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.shape.get(axis).copied()
    }

    /// Whether the element type is floating point.
    pub fn is_floating_point(&self) -> bool {
        self.dtype.is_floating_point()
    }

    /// Try to get as f32 slice.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            TensorData::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as f64 slice.
    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            TensorData::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Floating-point elements widened to `f64`.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        self.data.to_f64().ok_or_else(|| {
            Error::Type(format!(
                "Expected a floating-point tensor, got {}",
                self.dtype
            ))
        })
    }

    /// Create a new tensor with a different shape (data unchanged).
    pub fn reshape(&self, new_shape: Vec<usize>) -> Result<Self> {
        Self::try_new(self.data.clone(), new_shape)
    }

    /// Convert a floating-point tensor to another floating-point type.
    pub fn to_float_dtype(&self, dtype: DataType) -> Result<TensorValue> {
        if self.dtype == dtype {
            return Ok(self.clone());
        }
        let data = TensorData::from_f64(self.to_f64_vec()?, dtype)?;
        TensorValue::try_new(data, self.shape.clone())
    }

    // ── Elementwise arithmetic ──

    /// Elementwise `self + other` with broadcasting.
    pub fn add(&self, other: &TensorValue) -> Result<TensorValue> {
        self.zip_float(other, "add", |a, b| a + b)
    }

    /// Elementwise `self - other` with broadcasting.
    pub fn sub(&self, other: &TensorValue) -> Result<TensorValue> {
        self.zip_float(other, "sub", |a, b| a - b)
    }

    /// Elementwise `self * other` with broadcasting.
    pub fn mul(&self, other: &TensorValue) -> Result<TensorValue> {
        self.zip_float(other, "mul", |a, b| a * b)
    }

    /// Elementwise `self / other` with broadcasting.
    pub fn div(&self, other: &TensorValue) -> Result<TensorValue> {
        self.zip_float(other, "div", |a, b| a / b)
    }

    /// Add a scalar to every element.
    pub fn add_scalar(&self, scalar: f64) -> Result<TensorValue> {
        self.map_float("add_scalar", |x| x + scalar)
    }

    /// Elementwise square root.
    pub fn sqrt(&self) -> Result<TensorValue> {
        self.map_float("sqrt", f64::sqrt)
    }

    /// Elementwise reciprocal.
    pub fn recip(&self) -> Result<TensorValue> {
        self.map_float("recip", |x| 1.0 / x)
    }

    /// Scale every slice along axis 0 by the matching element of `factors`.
    ///
    /// `factors` must be 1-D with length equal to `self.shape[0]`; it is
    /// broadcast over all remaining dimensions.
    pub fn mul_per_channel(&self, factors: &TensorValue) -> Result<TensorValue> {
        let channels = self
            .dim(0)
            .ok_or_else(|| Error::Shape("Cannot scale channels of a scalar".to_string()))?;
        if factors.shape != [channels] {
            return Err(Error::Shape(format!(
                "Per-channel factors {:?} don't match leading dimension {}",
                factors.shape, channels
            )));
        }

        let mut factor_shape = vec![1; self.rank()];
        factor_shape[0] = channels;
        self.mul(&factors.reshape(factor_shape)?)
    }

    fn map_float(&self, op: &str, f: impl Fn(f64) -> f64) -> Result<TensorValue> {
        let values = self.data.to_f64().ok_or_else(|| {
            Error::Type(format!("{op} requires a floating-point tensor, got {}", self.dtype))
        })?;
        let data = TensorData::from_f64(values.into_iter().map(f).collect(), self.dtype)?;
        TensorValue::try_new(data, self.shape.clone())
    }

    fn zip_float(
        &self,
        other: &TensorValue,
        op: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<TensorValue> {
        let dtype = self.dtype.promote_float(other.dtype).ok_or_else(|| {
            Error::Type(format!(
                "{op} requires floating-point operands, got {} and {}",
                self.dtype, other.dtype
            ))
        })?;
        let out_shape = broadcast_shape(&self.shape, &other.shape)?;

        let lhs = self.to_f64_vec()?;
        let rhs = other.to_f64_vec()?;
        let lhs_idx = broadcast_indices(&out_shape, &broadcast_strides(&self.shape, out_shape.len()));
        let rhs_idx = broadcast_indices(&out_shape, &broadcast_strides(&other.shape, out_shape.len()));

        let values = lhs_idx
            .iter()
            .zip(&rhs_idx)
            .map(|(&i, &j)| f(lhs[i], rhs[j]))
            .collect();

        TensorValue::try_new(TensorData::from_f64(values, dtype)?, out_shape)
    }
}
