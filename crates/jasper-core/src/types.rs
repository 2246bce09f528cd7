//! Element types, shapes, and node attributes.

use crate::tensor::TensorValue;
use std::fmt;

/// Element data types a tensor can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F16,
    F32,
    F64,
    I32,
    I64,
    U8,
    Bool,
}

impl DataType {
    /// Whether this type belongs to the floating-point family.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, DataType::F16 | DataType::F32 | DataType::F64)
    }

    /// Result type of a floating-point operation between `self` and `other`.
    ///
    /// Returns `None` unless both types are floating point.
    pub fn promote_float(self, other: DataType) -> Option<DataType> {
        if !self.is_floating_point() || !other.is_floating_point() {
            return None;
        }
        Some(match (self, other) {
            (DataType::F64, _) | (_, DataType::F64) => DataType::F64,
            (DataType::F32, _) | (_, DataType::F32) => DataType::F32,
            _ => DataType::F16,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::F16 => "F16",
            DataType::F32 => "F32",
            DataType::F64 => "F64",
            DataType::I32 => "I32",
            DataType::I64 => "I64",
            DataType::U8 => "U8",
            DataType::Bool => "Bool",
        };
        f.write_str(name)
    }
}

/// Type metadata attached to a value: element type plus shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorType {
    pub dtype: DataType,
    pub shape: Vec<usize>,
}

impl TensorType {
    pub fn new(dtype: DataType, shape: Vec<usize>) -> Self {
        Self { dtype, shape }
    }

    /// Type of a concrete tensor.
    pub fn of(tensor: &TensorValue) -> Self {
        Self::new(tensor.dtype, tensor.shape.clone())
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
        write!(f, "{}({})", self.dtype, dims.join(", "))
    }
}

/// Attribute value types.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Tensor(TensorValue),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::String(v) => write!(f, "\"{v}\""),
            AttributeValue::Tensor(t) => write!(f, "<Tensor {}{:?}>", t.dtype, t.shape),
            AttributeValue::Floats(v) => write!(f, "{v:?}"),
            AttributeValue::Ints(v) => write!(f, "{v:?}"),
            AttributeValue::Strings(v) => write!(f, "{v:?}"),
        }
    }
}

impl TryFrom<AttributeValue> for f32 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Float(v) => Ok(v),
            _ => Err("Not a float".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for i64 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            _ => Err("Not an int".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for String {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::String(v) => Ok(v),
            _ => Err("Not a string".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<i64> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Ints(v) => Ok(v),
            _ => Err("Not an int array".to_string()),
        }
    }
}

impl TryFrom<AttributeValue> for TensorValue {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Tensor(v) => Ok(v),
            _ => Err("Not a tensor".to_string()),
        }
    }
}
