//! Core intermediate representation and tensor types for Jasper.
//!
//! This crate provides the foundational abstractions the optimization passes
//! build on:
//! - Block-structured graph IR with explicit use-lists (`Graph`, `Block`, `Node`, `Value`)
//! - Dense tensors with broadcasting elementwise arithmetic (`TensorValue`)
//! - The binding table between graph inputs and named parameters (`ValueParamMap`)
//! - The `Pass` trait for graph transformations

pub mod broadcast;
pub mod dump;
pub mod ir;
pub mod params;
pub mod pass;
pub mod tensor;
pub mod types;

// Re-export commonly used types
pub use broadcast::broadcast_shape;
pub use ir::{Block, BlockId, Graph, Node, NodeId, Use, Value, ValueDef, ValueId, kinds};
pub use params::{ParamMap, ValueParamMap};
pub use pass::Pass;
pub use tensor::{TensorData, TensorValue};
pub use types::{AttributeValue, DataType, TensorType};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for jasper-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Type error: {0}")]
    Type(String),
}
