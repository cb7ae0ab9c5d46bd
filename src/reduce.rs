//! Strided reductions and accumulations.
//!
//! Reduction kernels (sum, max, whatever the caller supplies) are plain
//! closures; this module owns only the traversal. [`reduce`] collapses a
//! whole view to one value, [`reduce_axis_into`] collapses a single axis
//! carrying one accumulator per outer index, and [`accumulate_axis_into`]
//! writes running totals element-wise while consuming an axis.

use crate::buffer::{Element, Scalar};
use crate::kernel::{
    build_plan_fused, ensure_same_shape, for_each_inner_block, for_each_offset, RawView,
    RawViewMut,
};
use crate::shape::{is_row_major_contiguous, numel};
use crate::view::{NdArrayLike, NdViewMut};
use crate::{NdError, Result};

/// Reduce every element of `src` to a single value.
///
/// `map_fn` lifts each element, `reduce_fn` folds the lifted values into
/// the accumulator starting from `init`. An empty view reduces to `init`.
pub fn reduce<T, U, M, R>(src: &impl NdArrayLike, map_fn: M, reduce_fn: R, init: U) -> Result<U>
where
    T: Element,
    U: Clone,
    M: Fn(T) -> U,
    R: Fn(U, U) -> U,
{
    let src_view = RawView::<T>::from_operand(src)?;
    let total = numel(&src_view.dims);
    if total == 0 {
        return Ok(init);
    }

    if src_view.dims.is_empty() || is_row_major_contiguous(&src_view.dims, &src_view.strides) {
        let mut ptr = src_view.ptr;
        let mut acc = init;
        for _ in 0..total {
            acc = reduce_fn(acc, map_fn(unsafe { *ptr }));
            ptr = ptr.wrapping_add(1);
        }
        return Ok(acc);
    }

    let strides_list = [&src_view.strides[..]];
    let (fused, plan) = build_plan_fused(
        &src_view.dims,
        &strides_list,
        None,
        std::mem::size_of::<T>(),
    );

    let mut acc = init;
    for_each_inner_block(&fused, &plan, &strides_list, |offsets, run, inner| {
        let mut ptr = src_view.ptr.wrapping_offset(offsets[0]);
        let stride = inner[0];
        let mut local = acc.clone();
        for _ in 0..run {
            local = reduce_fn(local, map_fn(unsafe { *ptr }));
            ptr = ptr.wrapping_offset(stride);
        }
        acc = local;
        Ok(())
    })?;

    Ok(acc)
}

/// Collapse one axis of `src` into `dst`.
///
/// `dst` must have exactly `src`'s shape with `axis` removed; each of its
/// elements receives the fold of the corresponding lane. When the reduced
/// axis has extent zero every lane is `init`.
pub fn reduce_axis_into<T, U, M, R>(
    dst: &mut NdViewMut<'_>,
    src: &impl NdArrayLike,
    axis: usize,
    map_fn: M,
    reduce_fn: R,
    init: U,
) -> Result<()>
where
    T: Element,
    U: Element,
    M: Fn(T) -> U,
    R: Fn(U, U) -> U,
{
    let src_view = RawView::<T>::from_operand(src)?;
    let rank = src_view.dims.len();
    if axis >= rank {
        return Err(NdError::InvalidAxis { axis, rank });
    }

    let axis_len = src_view.dims[axis];
    let axis_stride = src_view.strides[axis];

    let outer_dims: Vec<usize> = without_axis(&src_view.dims, axis);
    let outer_strides: Vec<isize> = without_axis(&src_view.strides, axis);

    let dst_view = RawViewMut::<U>::from_view_mut(dst)?;
    ensure_same_shape(&dst_view.dims, &outer_dims)?;
    if numel(&outer_dims) == 0 {
        return Ok(());
    }

    let strides_list = [&outer_strides[..], &dst_view.strides[..]];
    let (fused, plan) = build_plan_fused(
        &outer_dims,
        &strides_list,
        Some(1),
        std::mem::size_of::<U>(),
    );

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let mut acc = init.clone();
        let mut ptr = src_view.ptr.wrapping_offset(offsets[0]);
        for _ in 0..axis_len {
            acc = reduce_fn(acc, map_fn(unsafe { *ptr }));
            ptr = ptr.wrapping_offset(axis_stride);
        }
        unsafe {
            *dst_view.ptr.wrapping_offset(offsets[1]) = acc;
        }
        Ok(())
    })
}

/// Running totals along one axis.
///
/// `dst` has the same shape as `src`. For each lane along `axis`, the
/// first element is copied and each following element is
/// `f(previous_total, element)`.
pub fn accumulate_axis_into<T, F>(
    dst: &mut NdViewMut<'_>,
    src: &impl NdArrayLike,
    axis: usize,
    f: F,
) -> Result<()>
where
    T: Element,
    F: Fn(T, T) -> T,
{
    let src_view = RawView::<T>::from_operand(src)?;
    let rank = src_view.dims.len();
    if axis >= rank {
        return Err(NdError::InvalidAxis { axis, rank });
    }

    let dst_view = RawViewMut::<T>::from_view_mut(dst)?;
    ensure_same_shape(&dst_view.dims, &src_view.dims)?;
    if numel(&src_view.dims) == 0 {
        return Ok(());
    }

    let axis_len = src_view.dims[axis];
    let src_axis_stride = src_view.strides[axis];
    let dst_axis_stride = dst_view.strides[axis];

    let outer_dims: Vec<usize> = without_axis(&src_view.dims, axis);
    let src_outer: Vec<isize> = without_axis(&src_view.strides, axis);
    let dst_outer: Vec<isize> = without_axis(&dst_view.strides, axis);

    let strides_list = [&src_outer[..], &dst_outer[..]];
    let (fused, plan) = build_plan_fused(
        &outer_dims,
        &strides_list,
        Some(1),
        std::mem::size_of::<T>(),
    );

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let mut src_ptr = src_view.ptr.wrapping_offset(offsets[0]);
        let mut dst_ptr = dst_view.ptr.wrapping_offset(offsets[1]);
        let mut running = unsafe { *src_ptr };
        unsafe {
            *dst_ptr = running;
        }
        for _ in 1..axis_len {
            src_ptr = src_ptr.wrapping_offset(src_axis_stride);
            dst_ptr = dst_ptr.wrapping_offset(dst_axis_stride);
            running = f(running, unsafe { *src_ptr });
            unsafe {
                *dst_ptr = running;
            }
        }
        Ok(())
    })
}

// ============================================================================
// Accessor variants
// ============================================================================

/// [`reduce`] through the accessor protocol: dtype-agnostic, and the only
/// reduction path for `generic` buffers. Same traversal, element access
/// via [`crate::Buffer::get`].
pub fn reduce_scalar<R>(src: &impl NdArrayLike, reduce_fn: R, init: Scalar) -> Result<Scalar>
where
    R: Fn(Scalar, Scalar) -> Scalar,
{
    let dims = src.shape().to_vec();
    if numel(&dims) == 0 {
        return Ok(init);
    }
    let strides = src.strides().to_vec();
    let base = src.offset() as isize;
    let elem_size = src.data_type().byte_width().unwrap_or(8);

    let strides_list = [&strides[..]];
    let (fused, plan) = build_plan_fused(&dims, &strides_list, None, elem_size);

    let mut acc = init;
    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let value = src.buffer().get((base + offsets[0]) as usize);
        acc = reduce_fn(acc.clone(), value);
        Ok(())
    })?;
    Ok(acc)
}

/// [`reduce_axis_into`] through the accessor protocol. Results are cast
/// to the destination dtype on write.
pub fn reduce_axis_scalar_into<R>(
    dst: &mut NdViewMut<'_>,
    src: &impl NdArrayLike,
    axis: usize,
    reduce_fn: R,
    init: Scalar,
) -> Result<()>
where
    R: Fn(Scalar, Scalar) -> Scalar,
{
    if dst.is_readonly() {
        return Err(NdError::ReadOnlyView);
    }
    let rank = src.shape().len();
    if axis >= rank {
        return Err(NdError::InvalidAxis { axis, rank });
    }

    let axis_len = src.shape()[axis];
    let axis_stride = src.strides()[axis];
    let outer_dims = without_axis(src.shape(), axis);
    let outer_strides = without_axis(src.strides(), axis);
    ensure_same_shape(dst.shape(), &outer_dims)?;
    if numel(&outer_dims) == 0 {
        return Ok(());
    }

    let dst_strides = dst.strides().to_vec();
    let dst_base = dst.offset() as isize;
    let src_base = src.offset() as isize;
    let elem_size = dst.data_type().byte_width().unwrap_or(8);

    let strides_list = [&outer_strides[..], &dst_strides[..]];
    let (fused, plan) = build_plan_fused(&outer_dims, &strides_list, Some(1), elem_size);

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let mut acc = init.clone();
        let mut index = src_base + offsets[0];
        for _ in 0..axis_len {
            acc = reduce_fn(acc, src.buffer().get(index as usize));
            index += axis_stride;
        }
        dst.buffer_mut().set((dst_base + offsets[1]) as usize, acc)
    })
}

/// [`accumulate_axis_into`] through the accessor protocol.
pub fn accumulate_axis_scalar_into<F>(
    dst: &mut NdViewMut<'_>,
    src: &impl NdArrayLike,
    axis: usize,
    f: F,
) -> Result<()>
where
    F: Fn(Scalar, Scalar) -> Scalar,
{
    if dst.is_readonly() {
        return Err(NdError::ReadOnlyView);
    }
    let rank = src.shape().len();
    if axis >= rank {
        return Err(NdError::InvalidAxis { axis, rank });
    }
    ensure_same_shape(dst.shape(), src.shape())?;
    if numel(src.shape()) == 0 {
        return Ok(());
    }

    let axis_len = src.shape()[axis];
    let src_axis_stride = src.strides()[axis];
    let dst_axis_stride = dst.strides()[axis];
    let outer_dims = without_axis(src.shape(), axis);
    let src_outer = without_axis(src.strides(), axis);
    let dst_outer = without_axis(dst.strides(), axis);
    let src_base = src.offset() as isize;
    let dst_base = dst.offset() as isize;
    let elem_size = dst.data_type().byte_width().unwrap_or(8);

    let strides_list = [&src_outer[..], &dst_outer[..]];
    let (fused, plan) = build_plan_fused(&outer_dims, &strides_list, Some(1), elem_size);

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let mut src_index = src_base + offsets[0];
        let mut dst_index = dst_base + offsets[1];
        let mut running = src.buffer().get(src_index as usize);
        dst.buffer_mut().set(dst_index as usize, running.clone())?;
        for _ in 1..axis_len {
            src_index += src_axis_stride;
            dst_index += dst_axis_stride;
            running = f(running, src.buffer().get(src_index as usize));
            dst.buffer_mut().set(dst_index as usize, running.clone())?;
        }
        Ok(())
    })
}

fn without_axis<C: Copy>(values: &[C], axis: usize) -> Vec<C> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != axis)
        .map(|(_, &v)| v)
        .collect()
}
