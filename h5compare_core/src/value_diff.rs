//! Value comparison between two materialized datasets.

use h5compare_common::{Element, Value, ValueMismatch};
use thiserror::Error;

/// Outcome of comparing two dataset values
#[derive(Debug, Clone, PartialEq)]
pub enum ValueOutcome {
    Equal,
    Mismatch(ValueMismatch),
}

/// Element-wise masking does not apply to this pair of values
#[derive(Error, Debug)]
#[error("values of shape {shape_a:?} and {shape_b:?} cannot be masked element-wise")]
struct Incomparable {
    shape_a: Vec<usize>,
    shape_b: Vec<usize>,
}

/// Compares two values.
///
/// Values are equivalent when their shapes broadcast against each other and
/// every broadcast pair of elements is equal. Non-equivalent arrays of the
/// same shape are reported position by position; anything else is reported
/// as a whole-value mismatch.
pub fn compare_values(a: &Value, b: &Value) -> ValueOutcome {
    if array_equiv(a, b) {
        return ValueOutcome::Equal;
    }

    match elementwise_mismatch(a, b) {
        Ok(mismatch) => ValueOutcome::Mismatch(mismatch),
        Err(err) => {
            tracing::trace!("Falling back to whole-value comparison: {}", err);
            ValueOutcome::Mismatch(ValueMismatch::Whole {
                value_a: a.clone(),
                value_b: b.clone(),
            })
        }
    }
}

/// Broadcast-aware whole-array equality. Shapes that do not broadcast are
/// never equivalent.
pub fn array_equiv(a: &Value, b: &Value) -> bool {
    let Some(shape) = broadcast_shape(a.shape(), b.shape()) else {
        return false;
    };

    let (elements_a, elements_b) = (a.elements(), b.elements());
    let (strides_a, strides_b) = (
        broadcast_strides(a.shape(), shape.len()),
        broadcast_strides(b.shape(), shape.len()),
    );

    let total: usize = shape.iter().product();
    let mut index = vec![0usize; shape.len()];
    for _ in 0..total {
        let offset_a = dot(&index, &strides_a);
        let offset_b = dot(&index, &strides_b);
        if !elements_a[offset_a].equals(&elements_b[offset_b]) {
            return false;
        }
        advance(&mut index, &shape);
    }
    true
}

fn elementwise_mismatch(a: &Value, b: &Value) -> Result<ValueMismatch, Incomparable> {
    let (array_a, array_b) = match (a, b) {
        (Value::Array(x), Value::Array(y)) if x.shape() == y.shape() => (x, y),
        _ => {
            return Err(Incomparable {
                shape_a: a.shape().to_vec(),
                shape_b: b.shape().to_vec(),
            })
        }
    };

    let shape = array_a.shape();
    let mut indices = Vec::new();
    let mut values_a: Vec<Element> = Vec::new();
    let mut values_b: Vec<Element> = Vec::new();
    let mut index = vec![0usize; shape.len()];

    for (left, right) in array_a.elements().iter().zip(array_b.elements()) {
        if !left.equals(right) {
            indices.push(index.clone());
            values_a.push(left.clone());
            values_b.push(right.clone());
        }
        advance(&mut index, shape);
    }

    Ok(ValueMismatch::Elementwise {
        mismatch_count: indices.len(),
        total_count: array_b.elements().len(),
        indices,
        values_a,
        values_b,
    })
}

/// Numpy broadcasting: dimensions are right-aligned and must be equal or 1.
fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut shape = vec![0usize; ndim];
    for axis in 0..ndim {
        let da = dim_from_right(a, ndim - 1 - axis);
        let db = dim_from_right(b, ndim - 1 - axis);
        shape[axis] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(shape)
}

fn dim_from_right(shape: &[usize], from_right: usize) -> usize {
    if from_right < shape.len() {
        shape[shape.len() - 1 - from_right]
    } else {
        1
    }
}

/// Row-major strides of `shape` laid out against `ndim` broadcast axes;
/// broadcast (size 1 or missing) axes get a stride of zero.
fn broadcast_strides(shape: &[usize], ndim: usize) -> Vec<usize> {
    let mut strides = vec![0usize; ndim];
    let lead = ndim - shape.len();
    let mut stride = 1;
    for (axis, &dim) in shape.iter().enumerate().rev() {
        if dim != 1 {
            strides[lead + axis] = stride;
        }
        stride *= dim;
    }
    strides
}

fn dot(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides).map(|(i, s)| i * s).sum()
}

/// Steps a row-major multi-index forward by one position.
fn advance(index: &mut [usize], shape: &[usize]) {
    for axis in (0..index.len()).rev() {
        index[axis] += 1;
        if index[axis] < shape[axis] {
            return;
        }
        index[axis] = 0;
    }
}
