//! Dense arrays exchanged with the automatic differentiation host.
use crate::error::{Error, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// The element type of a host array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DType {
    F64,
}

/// The abstract value of an array: its shape and element type, but no data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapedArray {
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl ShapedArray {
    pub fn new(shape: Vec<usize>) -> Self {
        Self {
            shape,
            dtype: DType::F64,
        }
    }

    pub fn scalar() -> Self {
        Self::new(Vec::new())
    }
}

/// A dense, row-major array of `f64` with an arbitrary shape.
///
/// An array of shape `[]` is a scalar and holds exactly one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    shape: Vec<usize>,
    data: DVector<f64>,
}

fn num_elements(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl Array {
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: DVector::from_element(1, value),
        }
    }

    /// A one-dimensional array with the entries of the given vector.
    pub fn from_vector(data: DVector<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        if num_elements(&shape) != data.len() {
            return Err(Error::TypeCheck(format!(
                "array of shape {:?} needs {} elements, got {}",
                shape,
                num_elements(&shape),
                data.len()
            )));
        }
        Ok(Self {
            shape,
            data: DVector::from_vec(data),
        })
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = num_elements(&shape);
        Self {
            shape,
            data: DVector::zeros(n),
        }
    }

    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape.clone())
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// The value of a scalar array.
    pub fn to_scalar(&self) -> Option<f64> {
        if self.is_scalar() {
            Some(self.data[0])
        } else {
            None
        }
    }

    /// The elements in row-major order.
    pub fn data(&self) -> &DVector<f64> {
        &self.data
    }

    pub fn into_data(self) -> DVector<f64> {
        self.data
    }

    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        if num_elements(&shape) != self.len() {
            return Err(Error::TypeCheck(format!(
                "cannot reshape array of shape {:?} into shape {:?}",
                self.shape, shape
            )));
        }
        Ok(Self { shape, data: self.data })
    }

    pub fn scale(mut self, factor: f64) -> Self {
        self.data *= factor;
        self
    }

    /// The sum of the elementwise products of two arrays of the same shape.
    pub fn dot(&self, other: &Array) -> Result<f64> {
        if self.shape != other.shape {
            return Err(Error::TypeCheck(format!(
                "cannot contract arrays of shapes {:?} and {:?}",
                self.shape, other.shape
            )));
        }
        Ok(self.data.dot(&other.data))
    }

    /// Stacks arrays of identical shape along a new leading axis.
    pub fn stack(arrays: &[Array]) -> Result<Self> {
        let element_shape = match arrays.first() {
            Some(first) => first.shape.clone(),
            None => return Err(Error::TypeCheck("cannot stack an empty list of arrays".to_string())),
        };
        if let Some(array) = arrays.iter().find(|a| a.shape != element_shape) {
            return Err(Error::TypeCheck(format!(
                "cannot stack arrays of shapes {:?} and {:?}",
                element_shape, array.shape
            )));
        }
        let mut shape = Vec::with_capacity(element_shape.len() + 1);
        shape.push(arrays.len());
        shape.extend_from_slice(&element_shape);
        let data = arrays.iter().flat_map(|a| a.data.iter().copied());
        Ok(Self {
            data: DVector::from_iterator(num_elements(&shape), data),
            shape,
        })
    }

    /// Splits the array along its leading axis. The inverse of [`Array::stack`].
    pub fn unstack(&self) -> Result<Vec<Array>> {
        let (&n, element_shape) = self
            .shape
            .split_first()
            .ok_or_else(|| Error::TypeCheck("cannot unstack a scalar".to_string()))?;
        let stride = num_elements(element_shape);
        Ok((0..n)
            .map(|i| Array {
                shape: element_shape.to_vec(),
                data: self.data.rows(i * stride, stride).into_owned(),
            })
            .collect())
    }

    /// The abstract value of this array.
    pub fn shaped(&self) -> ShapedArray {
        ShapedArray::new(self.shape.clone())
    }
}

impl From<f64> for Array {
    fn from(value: f64) -> Self {
        Self::scalar(value)
    }
}
