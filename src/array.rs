//! Owning array: a buffer plus its canonical view metadata.

use crate::buffer::{Buffer, Scalar};
use crate::dtype::DataType;
use crate::shape::{canonical_strides, numel, Order};
use crate::view::{NdArrayLike, NdView, NdViewMut};
use crate::Result;

/// An owning n-dimensional array.
///
/// `NdArray` pairs a [`Buffer`] with shape, strides, and order; its offset
/// is always zero. Allocating operations (`zeros`, `full`, and the
/// dtype-resolving element-wise ops in [`crate::ops`]) produce these, and
/// [`NdArray::view`] / [`NdArray::view_mut`] hand out borrowed views for
/// everything else.
#[derive(Debug, Clone)]
pub struct NdArray {
    buffer: Buffer,
    shape: Vec<usize>,
    strides: Vec<isize>,
    order: Order,
}

impl NdArray {
    /// Allocate a zero-initialized array.
    pub fn zeros(dtype: DataType, shape: &[usize], order: Order) -> NdArray {
        let buffer = Buffer::allocate(dtype, numel(shape));
        let strides = canonical_strides(shape, order);
        NdArray {
            buffer,
            shape: shape.to_vec(),
            strides,
            order,
        }
    }

    /// Allocate an array filled with one value (cast to `dtype`).
    pub fn full(dtype: DataType, shape: &[usize], value: Scalar, order: Order) -> Result<NdArray> {
        let mut out = NdArray::zeros(dtype, shape, order);
        crate::map::fill_scalar_into(&mut out.view_mut(), value)?;
        Ok(out)
    }

    /// Wrap an existing buffer with a contiguous interpretation.
    ///
    /// # Errors
    /// [`crate::NdError::ShapeMismatch`] when the buffer length does not
    /// equal the shape's element count.
    pub fn from_buffer(buffer: Buffer, shape: &[usize], order: Order) -> Result<NdArray> {
        if buffer.len() != numel(shape) {
            return Err(crate::NdError::ShapeMismatch(
                shape.to_vec(),
                vec![buffer.len()],
            ));
        }
        let strides = canonical_strides(shape, order);
        Ok(NdArray {
            buffer,
            shape: shape.to_vec(),
            strides,
            order,
        })
    }

    /// Wrap an owned `Vec` of a primitive element type.
    pub fn from_vec<T: crate::buffer::Element>(
        data: Vec<T>,
        shape: &[usize],
        order: Order,
    ) -> Result<NdArray> {
        NdArray::from_buffer(Buffer::from_vec(data), shape, order)
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    /// Borrow as an immutable view.
    pub fn view(&self) -> NdView<'_> {
        NdView::new(
            &self.buffer,
            self.shape.clone(),
            self.strides.clone(),
            0,
            self.order,
        )
        .expect("owned metadata is always valid")
    }

    /// Borrow as a mutable view.
    pub fn view_mut(&mut self) -> NdViewMut<'_> {
        NdViewMut::new(
            &mut self.buffer,
            self.shape.clone(),
            self.strides.clone(),
            0,
            self.order,
        )
        .expect("owned metadata is always valid")
    }

    /// Take the buffer out of the array.
    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }
}

impl NdArrayLike for NdArray {
    fn data_type(&self) -> DataType {
        self.buffer.data_type()
    }
    fn buffer(&self) -> &Buffer {
        &self.buffer
    }
    fn shape(&self) -> &[usize] {
        &self.shape
    }
    fn strides(&self) -> &[isize] {
        &self.strides
    }
    fn offset(&self) -> usize {
        0
    }
    fn order(&self) -> Order {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let a = NdArray::zeros(DataType::Int32, &[2, 3], Order::RowMajor);
        assert_eq!(a.numel(), 6);
        assert_eq!(a.strides(), &[3, 1]);
        assert_eq!(a.view().get(&[1, 2]), Scalar::Int32(0));
    }

    #[test]
    fn test_full() {
        let a = NdArray::full(
            DataType::Float32,
            &[2, 2],
            Scalar::Float64(2.5),
            Order::ColumnMajor,
        )
        .unwrap();
        assert_eq!(a.strides(), &[1, 2]);
        assert_eq!(a.view().get(&[1, 1]), Scalar::Float32(2.5));
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(NdArray::from_vec(vec![1.0f64, 2.0], &[3], Order::RowMajor).is_err());
        let a = NdArray::from_vec(vec![1.0f64, 2.0, 3.0], &[3], Order::RowMajor).unwrap();
        assert_eq!(a.view().get(&[2]), Scalar::Float64(3.0));
    }
}
