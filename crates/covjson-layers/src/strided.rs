//! Row-major N-dimensional view over a flat buffer.

use serde::Serialize;

/// Flat buffer reinterpreted as an N-dimensional array.
///
/// The last axis varies fastest. Construction checks that the buffer
/// length equals the product of the shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StridedArray<T> {
    data: Vec<T>,
    shape: Vec<usize>,
    axis_names: Vec<String>,
    strides: Vec<usize>,
}

impl<T: Clone> StridedArray<T> {
    /// Wrap `data` with the given shape and axis names.
    ///
    /// Returns `None` when the shape and names disagree in length or the
    /// data does not fill the shape exactly.
    pub fn new(data: Vec<T>, shape: Vec<usize>, axis_names: Vec<String>) -> Option<Self> {
        if shape.len() != axis_names.len() || element_count(&shape) != Some(data.len()) {
            return None;
        }
        let strides = row_major_strides(&shape);
        Some(Self {
            data,
            shape,
            axis_names,
            strides,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn axis_names(&self) -> &[String] {
        &self.axis_names
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of an axis by name.
    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axis_names.iter().position(|a| a == name)
    }

    /// Flat offset of a multi-index, `None` if out of bounds.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for ((&i, &n), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= n {
                return None;
            }
            offset += i * stride;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).map(|o| &self.data[o])
    }

    /// Contiguous block of the trailing axes at a prefix index.
    ///
    /// With a prefix covering all but the last two axes this is one
    /// `rows × cols` plane.
    pub fn block(&self, prefix: &[usize]) -> Option<&[T]> {
        if prefix.len() > self.shape.len() {
            return None;
        }
        let mut start = 0;
        for ((&i, &n), &stride) in prefix.iter().zip(&self.shape).zip(&self.strides) {
            if i >= n {
                return None;
            }
            start += i * stride;
        }
        let size = element_count(&self.shape[prefix.len()..])?;
        self.data.get(start..start + size)
    }

    /// All multi-indices over the leading `count` axes, in row-major order.
    pub fn leading_indices(&self, count: usize) -> Vec<Vec<usize>> {
        let dims = &self.shape[..count.min(self.shape.len())];
        let total = element_count(dims).unwrap_or(0);
        let mut out = Vec::with_capacity(total);
        let mut current = vec![0usize; dims.len()];
        for _ in 0..total {
            out.push(current.clone());
            for d in (0..dims.len()).rev() {
                current[d] += 1;
                if current[d] < dims[d] {
                    break;
                }
                current[d] = 0;
            }
        }
        out
    }

    /// The flat buffer, in the order it was given.
    pub fn flatten(&self) -> &[T] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<T> {
        self.data
    }
}

/// Number of elements of `shape`, `None` when it overflows `usize`.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}
