//! NumPy-style broadcasting helpers for elementwise tensor arithmetic.

use crate::{Error, Result};

/// Compute the broadcast output shape of two input shapes.
///
/// Shapes are aligned from the rightmost dimension; dimensions match if they
/// are equal or one of them is 1, and missing leading dimensions count as 1.
///
/// ```text
/// broadcast_shape(&[16, 3, 3, 3], &[16, 1, 1, 1]) -> [16, 3, 3, 3]
/// broadcast_shape(&[16], &[1])                    -> [16]
/// broadcast_shape(&[8, 1, 6, 1], &[7, 1, 5])      -> [8, 7, 6, 5]
/// ```
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let pad_a = rank - a.len();
    let pad_b = rank - b.len();

    (0..rank)
        .map(|i| {
            let da = if i < pad_a { 1 } else { a[i - pad_a] };
            let db = if i < pad_b { 1 } else { b[i - pad_b] };
            match (da, db) {
                _ if da == db => Ok(da),
                (1, _) => Ok(db),
                (_, 1) => Ok(da),
                _ => Err(Error::Shape(format!(
                    "Cannot broadcast shapes {:?} and {:?} at dimension {i}",
                    a, b
                ))),
            }
        })
        .collect()
}

/// Row-major strides of `shape` as seen from a broadcast output of rank
/// `out_rank`: broadcast (size 1) and missing dimensions get stride 0.
pub fn broadcast_strides(shape: &[usize], out_rank: usize) -> Vec<usize> {
    let pad = out_rank - shape.len();
    let mut strides = vec![0; out_rank];
    let mut stride = 1;
    for (i, &dim) in shape.iter().enumerate().rev() {
        if dim != 1 {
            strides[pad + i] = stride;
        }
        stride *= dim;
    }
    strides
}

/// Map every flat index of `out_shape` to the flat index of an operand whose
/// broadcast strides are `strides`.
pub fn broadcast_indices(out_shape: &[usize], strides: &[usize]) -> Vec<usize> {
    let numel: usize = out_shape.iter().product();
    let mut indices = Vec::with_capacity(numel);
    let mut coord = vec![0usize; out_shape.len()];

    for _ in 0..numel {
        indices.push(coord.iter().zip(strides).map(|(c, s)| c * s).sum());

        // Advance the row-major coordinate.
        for axis in (0..coord.len()).rev() {
            coord[axis] += 1;
            if coord[axis] < out_shape[axis] {
                break;
            }
            coord[axis] = 0;
        }
    }

    indices
}
