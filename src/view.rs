//! Strided views over shared buffers.
//!
//! This module provides [`NdView`] and [`NdViewMut`]: zero-copy strided
//! views pairing a borrowed [`Buffer`] with shape, strides, offset, memory
//! order, and a read-only flag. Derived views (reverse, transpose,
//! permute, broadcast, dimension insertion) compute new metadata in
//! O(ndims) and alias the same buffer; none of them copy data.
//!
//! Bounds are validated once at construction: the minimum and maximum
//! reachable buffer indices must lie inside the buffer. Element access
//! through a validated view does not re-check.

use crate::buffer::{Buffer, Scalar};
use crate::dtype::DataType;
use crate::shape::{is_contiguous, numel, subscripts_to_buffer, validate_view, Order};
use crate::{NdError, Result};

/// The capability every array-like argument exposes to the engines.
///
/// Both concrete view types and the owning [`crate::NdArray`] implement
/// this; engines accept any implementor rather than a single concrete
/// struct.
pub trait NdArrayLike {
    fn data_type(&self) -> DataType;
    fn buffer(&self) -> &Buffer;
    fn shape(&self) -> &[usize];
    fn strides(&self) -> &[isize];
    fn offset(&self) -> usize;
    fn order(&self) -> Order;
}

/// An immutable strided view over a shared buffer.
#[derive(Debug, Clone)]
pub struct NdView<'a> {
    buffer: &'a Buffer,
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
    readonly: bool,
}

/// A mutable strided view over a shared buffer.
///
/// Rust's borrow rules make this the single writer for its buffer while it
/// lives. The `readonly` flag is an additional contract: a mutable view
/// can still be marked read-only (broadcast views are, since their zero
/// strides alias one slot across many logical positions), and every
/// mutating operation checks the flag before writing.
#[derive(Debug)]
pub struct NdViewMut<'a> {
    buffer: &'a mut Buffer,
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
    readonly: bool,
}

impl<'a> NdView<'a> {
    /// Create a view with explicit metadata.
    ///
    /// # Errors
    /// Fails if `strides` and `shape` disagree in length or if any
    /// reachable buffer index falls outside the buffer.
    pub fn new(
        buffer: &'a Buffer,
        shape: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        order: Order,
    ) -> Result<Self> {
        validate_view(buffer.len(), &shape, &strides, offset)?;
        Ok(NdView {
            buffer,
            shape,
            strides,
            offset,
            order,
            readonly: false,
        })
    }

    /// Wrap an entire buffer as a 1-d contiguous view.
    pub fn of_buffer(buffer: &'a Buffer, order: Order) -> Self {
        let shape = vec![buffer.len()];
        let strides = vec![1isize];
        NdView {
            buffer,
            shape,
            strides,
            offset: 0,
            order,
            readonly: false,
        }
    }

    /// A zero-dimensional (scalar) view of one buffer element.
    pub fn scalar(buffer: &'a Buffer, offset: usize) -> Result<Self> {
        if offset >= buffer.len() {
            return Err(NdError::OutOfBounds {
                min: offset as isize,
                max: offset as isize,
                len: buffer.len(),
            });
        }
        Ok(NdView {
            buffer,
            shape: Vec::new(),
            strides: Vec::new(),
            offset,
            order: Order::RowMajor,
            readonly: false,
        })
    }

    /// Mark the view read-only.
    pub fn into_readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Whether the view is flagged read-only.
    #[inline]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndims(&self) -> usize {
        self.shape.len()
    }

    /// Total number of logical elements.
    #[inline]
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    /// Whether some dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Contiguity under the view's declared order.
    pub fn is_contiguous(&self) -> bool {
        is_contiguous(&self.shape, &self.strides, self.order)
    }

    /// Read the element at the given subscripts through the accessor
    /// protocol.
    ///
    /// # Panics
    /// Panics if a subscript is out of range for its axis.
    pub fn get(&self, subs: &[usize]) -> Scalar {
        self.buffer.get(self.element_index(subs))
    }

    fn element_index(&self, subs: &[usize]) -> usize {
        assert_eq!(subs.len(), self.ndims(), "subscript rank mismatch");
        for (axis, (&sub, &dim)) in subs.iter().zip(self.shape.iter()).enumerate() {
            assert!(sub < dim, "subscript {sub} out of range for axis {axis}");
        }
        subscripts_to_buffer(&self.strides, self.offset, subs) as usize
    }

    /// Reverse one axis: the view walks that dimension backward.
    pub fn reverse_axis(&self, axis: usize) -> Result<NdView<'a>> {
        let (shape, strides, offset) =
            reverse_axis_meta(&self.shape, &self.strides, self.offset, axis)?;
        Ok(NdView {
            buffer: self.buffer,
            shape,
            strides,
            offset,
            order: self.order,
            readonly: self.readonly,
        })
    }

    /// Reverse every axis.
    pub fn reverse(&self) -> NdView<'a> {
        let (shape, strides, offset) = reverse_all_meta(&self.shape, &self.strides, self.offset);
        NdView {
            buffer: self.buffer,
            shape,
            strides,
            offset,
            order: self.order,
            readonly: self.readonly,
        }
    }

    /// Swap the last two axes.
    ///
    /// The offset is left untouched: a normalized offset depends only on
    /// which strides are negative, and transposition permutes strides
    /// without changing their signs.
    pub fn transpose(&self) -> Result<NdView<'a>> {
        let (shape, strides) = transpose_meta(&self.shape, &self.strides)?;
        Ok(NdView {
            buffer: self.buffer,
            shape,
            strides,
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        })
    }

    /// Permute the axes by the given permutation of `0..ndims`.
    pub fn permute(&self, perm: &[usize]) -> Result<NdView<'a>> {
        let (shape, strides) = permute_meta(&self.shape, &self.strides, perm)?;
        Ok(NdView {
            buffer: self.buffer,
            shape,
            strides,
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        })
    }

    /// Prepend `n` singleton dimensions.
    ///
    /// Each new axis takes the stride of the first existing axis (or 1 for
    /// a zero-dimensional view); a singleton axis is consistent with any
    /// stride, and this choice keeps the metadata fusible.
    pub fn prepend_singletons(&self, n: usize) -> NdView<'a> {
        let (shape, strides) = prepend_meta(&self.shape, &self.strides, n);
        NdView {
            buffer: self.buffer,
            shape,
            strides,
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        }
    }

    /// Insert one singleton dimension at `axis` (`0..=ndims`).
    pub fn expand_dims(&self, axis: usize) -> Result<NdView<'a>> {
        let (shape, strides) = expand_meta(&self.shape, &self.strides, axis)?;
        Ok(NdView {
            buffer: self.buffer,
            shape,
            strides,
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        })
    }

    /// Broadcast to a larger shape, right-aligned.
    ///
    /// Broadcast axes get stride zero, so many logical positions alias one
    /// buffer slot; the result is therefore flagged read-only.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<NdView<'a>> {
        let strides = crate::broadcast::broadcast_strides(target, &self.shape, &self.strides)?;
        Ok(NdView {
            buffer: self.buffer,
            shape: target.to_vec(),
            strides,
            offset: self.offset,
            order: self.order,
            readonly: true,
        })
    }
}

impl<'a> NdViewMut<'a> {
    /// Create a mutable view with explicit metadata.
    pub fn new(
        buffer: &'a mut Buffer,
        shape: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        order: Order,
    ) -> Result<Self> {
        validate_view(buffer.len(), &shape, &strides, offset)?;
        Ok(NdViewMut {
            buffer,
            shape,
            strides,
            offset,
            order,
            readonly: false,
        })
    }

    /// Wrap an entire buffer as a 1-d contiguous mutable view.
    pub fn of_buffer(buffer: &'a mut Buffer, order: Order) -> Self {
        let shape = vec![buffer.len()];
        NdViewMut {
            buffer,
            shape,
            strides: vec![1],
            offset: 0,
            order,
            readonly: false,
        }
    }

    /// Mark the view read-only. Mutating operations will refuse it.
    pub fn into_readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    #[inline]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    pub fn is_contiguous(&self) -> bool {
        is_contiguous(&self.shape, &self.strides, self.order)
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> NdView<'_> {
        NdView {
            buffer: self.buffer,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        }
    }

    /// Mutable access to the underlying buffer, for typed engines.
    ///
    /// Callers must check [`NdViewMut::is_readonly`] first; the typed
    /// engines do.
    pub(crate) fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffer
    }

    /// Read the element at the given subscripts.
    ///
    /// # Panics
    /// Panics if a subscript is out of range for its axis.
    pub fn get(&self, subs: &[usize]) -> Scalar {
        self.buffer.get(self.element_index(subs))
    }

    /// Write the element at the given subscripts through the accessor
    /// protocol, casting the value to the buffer's dtype.
    ///
    /// # Errors
    /// [`NdError::ReadOnlyView`] when the view is flagged read-only;
    /// [`NdError::CastFailure`] when the value cannot be represented.
    ///
    /// # Panics
    /// Panics if a subscript is out of range for its axis.
    pub fn set(&mut self, subs: &[usize], value: Scalar) -> Result<()> {
        if self.readonly {
            return Err(NdError::ReadOnlyView);
        }
        let index = self.element_index(subs);
        self.buffer.set(index, value)
    }

    fn element_index(&self, subs: &[usize]) -> usize {
        assert_eq!(subs.len(), self.ndims(), "subscript rank mismatch");
        for (axis, (&sub, &dim)) in subs.iter().zip(self.shape.iter()).enumerate() {
            assert!(sub < dim, "subscript {sub} out of range for axis {axis}");
        }
        subscripts_to_buffer(&self.strides, self.offset, subs) as usize
    }

    /// Reverse one axis, consuming the view.
    pub fn reverse_axis(self, axis: usize) -> Result<NdViewMut<'a>> {
        let (shape, strides, offset) =
            reverse_axis_meta(&self.shape, &self.strides, self.offset, axis)?;
        Ok(NdViewMut {
            buffer: self.buffer,
            shape,
            strides,
            offset,
            order: self.order,
            readonly: self.readonly,
        })
    }

    /// Swap the last two axes, consuming the view. Offset handling matches
    /// [`NdView::transpose`].
    pub fn transpose(self) -> Result<NdViewMut<'a>> {
        let (shape, strides) = transpose_meta(&self.shape, &self.strides)?;
        Ok(NdViewMut {
            buffer: self.buffer,
            shape,
            strides,
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        })
    }

    /// Permute the axes, consuming the view.
    pub fn permute(self, perm: &[usize]) -> Result<NdViewMut<'a>> {
        let (shape, strides) = permute_meta(&self.shape, &self.strides, perm)?;
        Ok(NdViewMut {
            buffer: self.buffer,
            shape,
            strides,
            offset: self.offset,
            order: self.order,
            readonly: self.readonly,
        })
    }
}

impl NdArrayLike for NdView<'_> {
    fn data_type(&self) -> DataType {
        self.buffer.data_type()
    }
    fn buffer(&self) -> &Buffer {
        self.buffer
    }
    fn shape(&self) -> &[usize] {
        &self.shape
    }
    fn strides(&self) -> &[isize] {
        &self.strides
    }
    fn offset(&self) -> usize {
        self.offset
    }
    fn order(&self) -> Order {
        self.order
    }
}

impl NdArrayLike for NdViewMut<'_> {
    fn data_type(&self) -> DataType {
        self.buffer.data_type()
    }
    fn buffer(&self) -> &Buffer {
        self.buffer
    }
    fn shape(&self) -> &[usize] {
        &self.shape
    }
    fn strides(&self) -> &[isize] {
        &self.strides
    }
    fn offset(&self) -> usize {
        self.offset
    }
    fn order(&self) -> Order {
        self.order
    }
}

// Shared metadata transforms. Each returns fresh shape/strides (and offset
// where it changes) so both view flavors derive identically.

fn reverse_axis_meta(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    axis: usize,
) -> Result<(Vec<usize>, Vec<isize>, usize)> {
    let rank = shape.len();
    if axis >= rank {
        return Err(NdError::InvalidAxis { axis, rank });
    }
    let mut strides = strides.to_vec();
    let dim = shape[axis];
    let stride = strides[axis];
    // Anchor the offset at what used to be the last element of the axis.
    let offset = if dim > 0 {
        (offset as isize + (dim as isize - 1) * stride) as usize
    } else {
        offset
    };
    strides[axis] = -stride;
    Ok((shape.to_vec(), strides, offset))
}

fn reverse_all_meta(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
) -> (Vec<usize>, Vec<isize>, usize) {
    let mut offset = offset as isize;
    let mut new_strides = strides.to_vec();
    for (stride, &dim) in new_strides.iter_mut().zip(shape.iter()) {
        if dim > 0 {
            offset += (dim as isize - 1) * *stride;
        }
        *stride = -*stride;
    }
    (shape.to_vec(), new_strides, offset as usize)
}

fn transpose_meta(shape: &[usize], strides: &[isize]) -> Result<(Vec<usize>, Vec<isize>)> {
    let rank = shape.len();
    if rank < 2 {
        return Err(NdError::TransposeRank { rank });
    }
    let mut shape = shape.to_vec();
    let mut strides = strides.to_vec();
    shape.swap(rank - 2, rank - 1);
    strides.swap(rank - 2, rank - 1);
    Ok((shape, strides))
}

fn permute_meta(
    shape: &[usize],
    strides: &[isize],
    perm: &[usize],
) -> Result<(Vec<usize>, Vec<isize>)> {
    let rank = shape.len();
    if perm.len() != rank {
        return Err(NdError::RankMismatch(rank, perm.len()));
    }
    let mut seen = vec![false; rank];
    for &p in perm {
        if p >= rank || seen[p] {
            return Err(NdError::InvalidAxis { axis: p, rank });
        }
        seen[p] = true;
    }
    let shape = perm.iter().map(|&p| shape[p]).collect();
    let strides = perm.iter().map(|&p| strides[p]).collect();
    Ok((shape, strides))
}

fn prepend_meta(shape: &[usize], strides: &[isize], n: usize) -> (Vec<usize>, Vec<isize>) {
    let lead_stride = strides.first().copied().unwrap_or(1);
    let mut new_shape = vec![1usize; n];
    let mut new_strides = vec![lead_stride; n];
    new_shape.extend_from_slice(shape);
    new_strides.extend_from_slice(strides);
    (new_shape, new_strides)
}

fn expand_meta(shape: &[usize], strides: &[isize], axis: usize) -> Result<(Vec<usize>, Vec<isize>)> {
    let rank = shape.len();
    if axis > rank {
        return Err(NdError::InvalidAxis { axis, rank });
    }
    let mut new_shape = shape.to_vec();
    let mut new_strides = strides.to_vec();
    // The inserted singleton borrows the stride of the axis it displaces.
    let stride = strides.get(axis).copied().unwrap_or(1);
    new_shape.insert(axis, 1);
    new_strides.insert(axis, stride);
    Ok((new_shape, new_strides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;

    fn buffer123456() -> Buffer {
        Buffer::from_f64(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    fn f64s(s: Scalar) -> f64 {
        match s {
            Scalar::Float64(v) => v,
            other => panic!("expected float64, got {other:?}"),
        }
    }

    #[test]
    fn test_new_validates_bounds() {
        let buf = buffer123456();
        assert!(NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).is_ok());
        assert!(matches!(
            NdView::new(&buf, vec![4, 2], vec![2, 1], 0, Order::RowMajor),
            Err(NdError::OutOfBounds { .. })
        ));
        assert!(matches!(
            NdView::new(&buf, vec![3, 2], vec![2], 0, Order::RowMajor),
            Err(NdError::StrideLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_logical_layout() {
        // shape [3,2], strides [2,1]: [[1,2],[3,4],[5,6]]
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        assert_eq!(f64s(v.get(&[0, 0])), 1.0);
        assert_eq!(f64s(v.get(&[0, 1])), 2.0);
        assert_eq!(f64s(v.get(&[1, 0])), 3.0);
        assert_eq!(f64s(v.get(&[2, 1])), 6.0);
    }

    #[test]
    fn test_reverse_axis0() {
        // Reversing axis 0 of [[1,2],[3,4],[5,6]] yields [[5,6],[3,4],[1,2]].
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let r = v.reverse_axis(0).unwrap();
        assert_eq!(f64s(r.get(&[0, 0])), 5.0);
        assert_eq!(f64s(r.get(&[0, 1])), 6.0);
        assert_eq!(f64s(r.get(&[1, 0])), 3.0);
        assert_eq!(f64s(r.get(&[2, 0])), 1.0);
        assert_eq!(r.strides(), &[-2, 1]);
        assert_eq!(r.offset(), 4);
    }

    #[test]
    fn test_reverse_of_reverse_identity() {
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let rr = v.reverse_axis(0).unwrap().reverse_axis(0).unwrap();
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(f64s(rr.get(&[i, j])), f64s(v.get(&[i, j])));
            }
        }
        let full = v.reverse().reverse();
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(f64s(full.get(&[i, j])), f64s(v.get(&[i, j])));
            }
        }
    }

    #[test]
    fn test_transpose_swap_law() {
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let t = v.transpose().unwrap();
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.strides(), &[1, 2]);
        assert_eq!(f64s(t.get(&[0, 2])), 5.0);
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(f64s(t.get(&[j, i])), f64s(v.get(&[i, j])));
            }
        }
    }

    #[test]
    fn test_transpose_rank_error() {
        let buf = buffer123456();
        let v = NdView::of_buffer(&buf, Order::RowMajor);
        assert!(matches!(
            v.transpose(),
            Err(NdError::TransposeRank { rank: 1 })
        ));
        let s = NdView::scalar(&buf, 0).unwrap();
        assert!(matches!(
            s.transpose(),
            Err(NdError::TransposeRank { rank: 0 })
        ));
    }

    #[test]
    fn test_transpose_with_offset() {
        // A 2x2 window into the buffer starting at index 2: [[3,4],[5,6]].
        // Transposing must keep the offset and swap metadata only.
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![2, 2], vec![2, 1], 2, Order::RowMajor).unwrap();
        let t = v.transpose().unwrap();
        assert_eq!(t.offset(), 2);
        assert_eq!(f64s(t.get(&[0, 0])), 3.0);
        assert_eq!(f64s(t.get(&[1, 0])), 4.0);
        assert_eq!(f64s(t.get(&[0, 1])), 5.0);
        assert_eq!(f64s(t.get(&[1, 1])), 6.0);
    }

    #[test]
    fn test_permute() {
        let data: Vec<f64> = (0..24).map(|x| x as f64).collect();
        let buf = Buffer::from_f64(data);
        let v = NdView::new(&buf, vec![2, 3, 4], vec![12, 4, 1], 0, Order::RowMajor).unwrap();
        let p = v.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
        assert_eq!(f64s(p.get(&[3, 1, 2])), 23.0);
        assert!(matches!(
            v.permute(&[0, 0, 1]),
            Err(NdError::InvalidAxis { .. })
        ));
    }

    #[test]
    fn test_prepend_singletons() {
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let p = v.prepend_singletons(2);
        assert_eq!(p.shape(), &[1, 1, 3, 2]);
        assert_eq!(p.strides(), &[2, 2, 2, 1]);
        assert_eq!(f64s(p.get(&[0, 0, 2, 1])), 6.0);
    }

    #[test]
    fn test_expand_dims() {
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let e = v.expand_dims(1).unwrap();
        assert_eq!(e.shape(), &[3, 1, 2]);
        assert_eq!(e.strides(), &[2, 1, 1]);
        let tail = v.expand_dims(2).unwrap();
        assert_eq!(tail.shape(), &[3, 2, 1]);
        assert_eq!(tail.strides(), &[2, 1, 1]);
        assert!(v.expand_dims(3).is_err());
    }

    #[test]
    fn test_broadcast_to_readonly() {
        let buf = Buffer::from_f64(vec![10.0, 20.0, 30.0]);
        let v = NdView::of_buffer(&buf, Order::RowMajor);
        let b = v.broadcast_to(&[4, 3]).unwrap();
        assert_eq!(b.shape(), &[4, 3]);
        assert_eq!(b.strides(), &[0, 1]);
        assert!(b.is_readonly());
        for i in 0..4 {
            assert_eq!(f64s(b.get(&[i, 1])), 20.0);
        }
    }

    #[test]
    fn test_readonly_write_rejected() {
        let mut buf = buffer123456();
        let mut v = NdViewMut::of_buffer(&mut buf, Order::RowMajor).into_readonly();
        assert!(matches!(
            v.set(&[0], Scalar::Float64(9.0)),
            Err(NdError::ReadOnlyView)
        ));
    }

    #[test]
    fn test_mut_view_set() {
        let mut buf = buffer123456();
        let mut v =
            NdViewMut::new(&mut buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        v.set(&[1, 1], Scalar::Float64(40.0)).unwrap();
        assert_eq!(f64s(v.get(&[1, 1])), 40.0);
        // Writes go through to the shared buffer.
        drop(v);
        assert_eq!(buf.get(3), Scalar::Float64(40.0));
    }

    #[test]
    fn test_contiguity() {
        let buf = buffer123456();
        let v = NdView::new(&buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        assert!(v.is_contiguous());
        let t = v.transpose().unwrap();
        assert!(!t.is_contiguous());
        let cm = NdView::new(&buf, vec![3, 2], vec![1, 3], 0, Order::ColumnMajor).unwrap();
        assert!(cm.is_contiguous());
    }

    #[test]
    fn test_canonical_strides_agree_with_view() {
        let shape = [3usize, 2];
        assert_eq!(
            crate::shape::canonical_strides(&shape, Order::RowMajor),
            vec![2, 1]
        );
        assert_eq!(numel(&shape), 6);
    }
}
