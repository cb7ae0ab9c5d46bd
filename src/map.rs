//! Element-wise traversal engines.
//!
//! Two strata share one iteration pipeline. The typed engines
//! ([`fill_into`], [`map_into`], [`zip_map2_into`], [`zip_map_n_into`])
//! are generic over [`Element`] types and walk raw slices directly; they
//! require every operand's buffer to hold exactly the monomorphized
//! element type. The accessor engines ([`fill_scalar_into`],
//! [`map_scalar_into`], [`zip_map2_scalar_into`]) move [`Scalar`] values
//! through [`crate::Buffer::get`]/[`crate::Buffer::set`] instead, which
//! makes them
//! dtype-heterogeneous: they are the generic fallback kernels for
//! dispatch, and the only path for `generic` buffers.
//!
//! All engines require operands of identical shape (broadcast first, via
//! [`crate::NdView::broadcast_to`]), visit every logical position exactly
//! once, and call the user function in unspecified element order.

use crate::buffer::{Element, Scalar};
use crate::kernel::{
    build_plan_fused, ensure_same_shape, for_each_inner_block, for_each_offset, RawView,
    RawViewMut,
};
use crate::shape::{is_row_major_contiguous, numel};
use crate::view::{NdArrayLike, NdView, NdViewMut};
use crate::{NdError, Result};

/// Fill a view from a zero-argument generator, one call per element.
pub fn fill_into<T, F>(dst: &mut NdViewMut<'_>, mut f: F) -> Result<()>
where
    T: Element,
    F: FnMut() -> T,
{
    let dst_view = RawViewMut::<T>::from_view_mut(dst)?;
    let total = numel(&dst_view.dims);
    if total == 0 {
        return Ok(());
    }

    if dst_view.dims.is_empty() || is_row_major_contiguous(&dst_view.dims, &dst_view.strides) {
        let mut ptr = dst_view.ptr;
        for _ in 0..total {
            unsafe {
                *ptr = f();
                ptr = ptr.add(1);
            }
        }
        return Ok(());
    }

    let strides_list = [&dst_view.strides[..]];
    let (fused, plan) = build_plan_fused(
        &dst_view.dims,
        &strides_list,
        Some(0),
        std::mem::size_of::<T>(),
    );

    for_each_inner_block(&fused, &plan, &strides_list, |offsets, run, inner| {
        let mut ptr = dst_view.ptr.wrapping_offset(offsets[0]);
        let stride = inner[0];
        for _ in 0..run {
            unsafe {
                *ptr = f();
            }
            ptr = ptr.wrapping_offset(stride);
        }
        Ok(())
    })
}

/// Apply `f` element-wise from `src` into `dst`.
pub fn map_into<T, U, F>(dst: &mut NdViewMut<'_>, src: &impl NdArrayLike, f: F) -> Result<()>
where
    T: Element,
    U: Element,
    F: Fn(T) -> U,
{
    let dst_view = RawViewMut::<U>::from_view_mut(dst)?;
    let src_view = RawView::<T>::from_operand(src)?;
    ensure_same_shape(&dst_view.dims, &src_view.dims)?;

    let total = numel(&dst_view.dims);
    if total == 0 {
        return Ok(());
    }

    if dst_view.dims.is_empty()
        || (is_row_major_contiguous(&dst_view.dims, &dst_view.strides)
            && is_row_major_contiguous(&src_view.dims, &src_view.strides))
    {
        let mut dst_ptr = dst_view.ptr;
        let mut src_ptr = src_view.ptr;
        for _ in 0..total {
            unsafe {
                *dst_ptr = f(*src_ptr);
                dst_ptr = dst_ptr.add(1);
                src_ptr = src_ptr.add(1);
            }
        }
        return Ok(());
    }

    let strides_list = [&dst_view.strides[..], &src_view.strides[..]];
    let (fused, plan) = build_plan_fused(
        &dst_view.dims,
        &strides_list,
        Some(0),
        std::mem::size_of::<U>(),
    );

    for_each_inner_block(&fused, &plan, &strides_list, |offsets, run, inner| {
        let mut dst_ptr = dst_view.ptr.wrapping_offset(offsets[0]);
        let mut src_ptr = src_view.ptr.wrapping_offset(offsets[1]);
        let (dst_stride, src_stride) = (inner[0], inner[1]);
        for _ in 0..run {
            unsafe {
                *dst_ptr = f(*src_ptr);
            }
            dst_ptr = dst_ptr.wrapping_offset(dst_stride);
            src_ptr = src_ptr.wrapping_offset(src_stride);
        }
        Ok(())
    })
}

/// Apply `f` element-wise over two sources into `dst`.
pub fn zip_map2_into<T, U, V, F>(
    dst: &mut NdViewMut<'_>,
    a: &impl NdArrayLike,
    b: &impl NdArrayLike,
    f: F,
) -> Result<()>
where
    T: Element,
    U: Element,
    V: Element,
    F: Fn(T, U) -> V,
{
    let dst_view = RawViewMut::<V>::from_view_mut(dst)?;
    let a_view = RawView::<T>::from_operand(a)?;
    let b_view = RawView::<U>::from_operand(b)?;
    ensure_same_shape(&dst_view.dims, &a_view.dims)?;
    ensure_same_shape(&dst_view.dims, &b_view.dims)?;

    let total = numel(&dst_view.dims);
    if total == 0 {
        return Ok(());
    }

    if dst_view.dims.is_empty()
        || (is_row_major_contiguous(&dst_view.dims, &dst_view.strides)
            && is_row_major_contiguous(&a_view.dims, &a_view.strides)
            && is_row_major_contiguous(&b_view.dims, &b_view.strides))
    {
        let mut dst_ptr = dst_view.ptr;
        let mut a_ptr = a_view.ptr;
        let mut b_ptr = b_view.ptr;
        for _ in 0..total {
            unsafe {
                *dst_ptr = f(*a_ptr, *b_ptr);
                dst_ptr = dst_ptr.add(1);
                a_ptr = a_ptr.add(1);
                b_ptr = b_ptr.add(1);
            }
        }
        return Ok(());
    }

    let strides_list = [
        &dst_view.strides[..],
        &a_view.strides[..],
        &b_view.strides[..],
    ];
    let (fused, plan) = build_plan_fused(
        &dst_view.dims,
        &strides_list,
        Some(0),
        std::mem::size_of::<V>(),
    );

    for_each_inner_block(&fused, &plan, &strides_list, |offsets, run, inner| {
        let mut dst_ptr = dst_view.ptr.wrapping_offset(offsets[0]);
        let mut a_ptr = a_view.ptr.wrapping_offset(offsets[1]);
        let mut b_ptr = b_view.ptr.wrapping_offset(offsets[2]);
        let (dst_stride, a_stride, b_stride) = (inner[0], inner[1], inner[2]);
        for _ in 0..run {
            unsafe {
                *dst_ptr = f(*a_ptr, *b_ptr);
            }
            dst_ptr = dst_ptr.wrapping_offset(dst_stride);
            a_ptr = a_ptr.wrapping_offset(a_stride);
            b_ptr = b_ptr.wrapping_offset(b_stride);
        }
        Ok(())
    })
}

/// Apply `f` element-wise over any number of same-dtype sources into
/// `dst`. The slice handed to `f` holds the current element of each
/// source, in order.
pub fn zip_map_n_into<T, F>(dst: &mut NdViewMut<'_>, srcs: &[NdView<'_>], f: F) -> Result<()>
where
    T: Element,
    F: Fn(&[T]) -> T,
{
    let dst_view = RawViewMut::<T>::from_view_mut(dst)?;
    let src_views: Vec<RawView<T>> = srcs
        .iter()
        .map(|src| RawView::<T>::from_operand(src))
        .collect::<Result<_>>()?;
    for src in &src_views {
        ensure_same_shape(&dst_view.dims, &src.dims)?;
    }

    let total = numel(&dst_view.dims);
    if total == 0 {
        return Ok(());
    }

    let mut strides_list: Vec<&[isize]> = Vec::with_capacity(src_views.len() + 1);
    strides_list.push(&dst_view.strides);
    for src in &src_views {
        strides_list.push(&src.strides);
    }

    let (fused, plan) = build_plan_fused(
        &dst_view.dims,
        &strides_list,
        Some(0),
        std::mem::size_of::<T>(),
    );

    let mut scratch: Vec<T> = Vec::with_capacity(src_views.len());
    for_each_inner_block(&fused, &plan, &strides_list, |offsets, run, inner| {
        let mut dst_ptr = dst_view.ptr.wrapping_offset(offsets[0]);
        let mut src_ptrs: Vec<*const T> = src_views
            .iter()
            .zip(offsets[1..].iter())
            .map(|(src, &off)| src.ptr.wrapping_offset(off))
            .collect();
        for _ in 0..run {
            scratch.clear();
            for ptr in &src_ptrs {
                scratch.push(unsafe { **ptr });
            }
            unsafe {
                *dst_ptr = f(&scratch);
            }
            dst_ptr = dst_ptr.wrapping_offset(inner[0]);
            for (ptr, &stride) in src_ptrs.iter_mut().zip(inner[1..].iter()) {
                *ptr = ptr.wrapping_offset(stride);
            }
        }
        Ok(())
    })
}

// ============================================================================
// Accessor engines
// ============================================================================

fn accessor_elem_size(view: &NdViewMut<'_>) -> usize {
    view.data_type().byte_width().unwrap_or(8)
}

/// Fill a view with one value through the accessor protocol.
///
/// The value is cast to the destination dtype up front, so an
/// unrepresentable fill value fails before any element is written.
pub fn fill_scalar_into(dst: &mut NdViewMut<'_>, value: Scalar) -> Result<()> {
    if dst.is_readonly() {
        return Err(NdError::ReadOnlyView);
    }
    let dtype = dst.data_type();
    // Generic destinations store the scalar as-is; everything else casts
    // once up front so a bad fill value fails before any write.
    let stored = if dtype == crate::dtype::DataType::Generic {
        value
    } else {
        value.cast(dtype).ok_or(NdError::CastFailure {
            from: value.data_type(),
            to: dtype,
        })?
    };
    if dst.numel() == 0 {
        return Ok(());
    }

    let dims = dst.shape().to_vec();
    let strides = dst.strides().to_vec();
    let base = dst.offset() as isize;
    let elem_size = accessor_elem_size(dst);

    let strides_list = [&strides[..]];
    let (fused, plan) = build_plan_fused(&dims, &strides_list, Some(0), elem_size);

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let index = (base + offsets[0]) as usize;
        dst.buffer_mut().set(index, stored.clone())
    })
}

/// Apply `f` element-wise from `src` into `dst` through the accessor
/// protocol. Source and destination may have any dtypes; results are cast
/// to the destination dtype on write.
pub fn map_scalar_into<F>(dst: &mut NdViewMut<'_>, src: &impl NdArrayLike, f: F) -> Result<()>
where
    F: Fn(Scalar) -> Scalar,
{
    if dst.is_readonly() {
        return Err(NdError::ReadOnlyView);
    }
    ensure_same_shape(dst.shape(), src.shape())?;
    if dst.numel() == 0 {
        return Ok(());
    }

    let dims = dst.shape().to_vec();
    let dst_strides = dst.strides().to_vec();
    let src_strides = src.strides().to_vec();
    let dst_base = dst.offset() as isize;
    let src_base = src.offset() as isize;
    let elem_size = accessor_elem_size(dst);

    let strides_list = [&dst_strides[..], &src_strides[..]];
    let (fused, plan) = build_plan_fused(&dims, &strides_list, Some(0), elem_size);

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let value = src.buffer().get((src_base + offsets[1]) as usize);
        let index = (dst_base + offsets[0]) as usize;
        dst.buffer_mut().set(index, f(value))
    })
}

/// Apply `f` element-wise over two sources into `dst` through the
/// accessor protocol.
pub fn zip_map2_scalar_into<F>(
    dst: &mut NdViewMut<'_>,
    a: &impl NdArrayLike,
    b: &impl NdArrayLike,
    f: F,
) -> Result<()>
where
    F: Fn(Scalar, Scalar) -> Scalar,
{
    if dst.is_readonly() {
        return Err(NdError::ReadOnlyView);
    }
    ensure_same_shape(dst.shape(), a.shape())?;
    ensure_same_shape(dst.shape(), b.shape())?;
    if dst.numel() == 0 {
        return Ok(());
    }

    let dims = dst.shape().to_vec();
    let dst_strides = dst.strides().to_vec();
    let a_strides = a.strides().to_vec();
    let b_strides = b.strides().to_vec();
    let dst_base = dst.offset() as isize;
    let a_base = a.offset() as isize;
    let b_base = b.offset() as isize;
    let elem_size = accessor_elem_size(dst);

    let strides_list = [&dst_strides[..], &a_strides[..], &b_strides[..]];
    let (fused, plan) = build_plan_fused(&dims, &strides_list, Some(0), elem_size);

    for_each_offset(&fused, &plan, &strides_list, |offsets| {
        let x = a.buffer().get((a_base + offsets[1]) as usize);
        let y = b.buffer().get((b_base + offsets[2]) as usize);
        let index = (dst_base + offsets[0]) as usize;
        dst.buffer_mut().set(index, f(x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::dtype::DataType;
    use crate::shape::Order;

    #[test]
    fn test_fill_into() {
        let mut buf = Buffer::allocate(DataType::Float64, 6);
        let mut dst =
            NdViewMut::new(&mut buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let mut next = 0.0;
        fill_into(&mut dst, || {
            next += 1.0;
            next
        })
        .unwrap();
        // Contiguous destination: generator runs in logical order.
        drop(dst);
        assert_eq!(
            f64::from_buffer(&buf).unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_map_into_strided_src() {
        let src_buf = Buffer::from_f64(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let src = NdView::new(&src_buf, vec![3, 2], vec![2, 1], 0, Order::RowMajor)
            .unwrap()
            .transpose()
            .unwrap();

        let mut dst_buf = Buffer::allocate(DataType::Float64, 6);
        let mut dst =
            NdViewMut::new(&mut dst_buf, vec![2, 3], vec![3, 1], 0, Order::RowMajor).unwrap();

        map_into(&mut dst, &src, |x: f64| x * 10.0).unwrap();
        drop(dst);
        // Transposed [[1,3,5],[2,4,6]] scaled by 10.
        assert_eq!(
            f64::from_buffer(&dst_buf).unwrap(),
            &[10.0, 30.0, 50.0, 20.0, 40.0, 60.0]
        );
    }

    #[test]
    fn test_map_into_shape_mismatch() {
        let src_buf = Buffer::from_f64(vec![1.0, 2.0, 3.0]);
        let src = NdView::of_buffer(&src_buf, Order::RowMajor);
        let mut dst_buf = Buffer::allocate(DataType::Float64, 4);
        let mut dst = NdViewMut::of_buffer(&mut dst_buf, Order::RowMajor);
        assert!(matches!(
            map_into(&mut dst, &src, |x: f64| x),
            Err(NdError::ShapeMismatch(..))
        ));
    }

    #[test]
    fn test_map_into_dtype_mismatch() {
        let src_buf = Buffer::from_vec(vec![1i32, 2]);
        let src = NdView::of_buffer(&src_buf, Order::RowMajor);
        let mut dst_buf = Buffer::allocate(DataType::Float64, 2);
        let mut dst = NdViewMut::of_buffer(&mut dst_buf, Order::RowMajor);
        assert!(matches!(
            map_into(&mut dst, &src, |x: f64| x),
            Err(NdError::DataTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_zip_map2_into() {
        let a_buf = Buffer::from_f64(vec![1.0, 2.0, 3.0, 4.0]);
        let b_buf = Buffer::from_f64(vec![10.0, 20.0, 30.0, 40.0]);
        let a = NdView::new(&a_buf, vec![2, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
        let b = NdView::new(&b_buf, vec![2, 2], vec![1, 2], 0, Order::ColumnMajor).unwrap();

        let mut dst_buf = Buffer::allocate(DataType::Float64, 4);
        let mut dst =
            NdViewMut::new(&mut dst_buf, vec![2, 2], vec![2, 1], 0, Order::RowMajor).unwrap();

        zip_map2_into(&mut dst, &a, &b, |x: f64, y: f64| x + y).unwrap();
        drop(dst);
        // b is column-major: logical [[10,30],[20,40]].
        assert_eq!(
            f64::from_buffer(&dst_buf).unwrap(),
            &[11.0, 32.0, 23.0, 44.0]
        );
    }

    #[test]
    fn test_zip_map_n_into() {
        let bufs: Vec<Buffer> = (0..3)
            .map(|k| Buffer::from_f64(vec![k as f64 + 1.0; 4]))
            .collect();
        let views: Vec<NdView<'_>> = bufs
            .iter()
            .map(|b| NdView::of_buffer(b, Order::RowMajor))
            .collect();

        let mut dst_buf = Buffer::allocate(DataType::Float64, 4);
        let mut dst = NdViewMut::of_buffer(&mut dst_buf, Order::RowMajor);
        zip_map_n_into(&mut dst, &views, |xs: &[f64]| xs.iter().sum()).unwrap();
        drop(dst);
        assert_eq!(f64::from_buffer(&dst_buf).unwrap(), &[6.0, 6.0, 6.0, 6.0]);
    }

    #[test]
    fn test_zero_dim_direct_call() {
        let src_buf = Buffer::from_f64(vec![5.0]);
        let src = NdView::scalar(&src_buf, 0).unwrap();
        let mut dst_buf = Buffer::allocate(DataType::Float64, 1);
        let mut dst =
            NdViewMut::new(&mut dst_buf, vec![], vec![], 0, Order::RowMajor).unwrap();
        map_into(&mut dst, &src, |x: f64| x * 2.0).unwrap();
        drop(dst);
        assert_eq!(dst_buf.get(0), Scalar::Float64(10.0));
    }

    #[test]
    fn test_readonly_dst_rejected() {
        let mut buf = Buffer::allocate(DataType::Float64, 4);
        let mut dst = NdViewMut::of_buffer(&mut buf, Order::RowMajor).into_readonly();
        assert!(matches!(
            fill_into(&mut dst, || 1.0f64),
            Err(NdError::ReadOnlyView)
        ));
        assert!(matches!(
            fill_scalar_into(&mut dst, Scalar::Float64(1.0)),
            Err(NdError::ReadOnlyView)
        ));
    }

    #[test]
    fn test_fill_scalar_into_casts_once() {
        let mut buf = Buffer::allocate(DataType::Int16, 4);
        let mut dst = NdViewMut::of_buffer(&mut buf, Order::RowMajor);
        fill_scalar_into(&mut dst, Scalar::Float64(3.7)).unwrap();
        drop(dst);
        assert_eq!(i16::from_buffer(&buf).unwrap(), &[3, 3, 3, 3]);

        let mut buf = Buffer::allocate(DataType::Int8, 2);
        let mut dst = NdViewMut::of_buffer(&mut buf, Order::RowMajor);
        assert!(matches!(
            fill_scalar_into(&mut dst, Scalar::Float64(1e9)),
            Err(NdError::CastFailure { .. })
        ));
    }

    #[test]
    fn test_map_scalar_into_cross_dtype() {
        let src_buf = Buffer::from_vec(vec![1i32, 2, 3, 4]);
        let src = NdView::of_buffer(&src_buf, Order::RowMajor);
        let mut dst_buf = Buffer::allocate(DataType::Float64, 4);
        let mut dst = NdViewMut::of_buffer(&mut dst_buf, Order::RowMajor);

        map_scalar_into(&mut dst, &src, |x| {
            // Promote by value: i32 in, f64 out.
            Scalar::Float64(match x {
                Scalar::Int32(v) => v as f64 * 0.5,
                other => panic!("unexpected {other:?}"),
            })
        })
        .unwrap();
        drop(dst);
        assert_eq!(f64::from_buffer(&dst_buf).unwrap(), &[0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_zip_map2_scalar_generic_buffers() {
        let mut a_buf = Buffer::allocate(DataType::Generic, 2);
        a_buf.set(0, Scalar::Int32(1)).unwrap();
        a_buf.set(1, Scalar::Float64(2.5)).unwrap();
        let b_buf = Buffer::from_vec(vec![10i32, 20]);

        let a = NdView::of_buffer(&a_buf, Order::RowMajor);
        let b = NdView::of_buffer(&b_buf, Order::RowMajor);

        let mut dst_buf = Buffer::allocate(DataType::Float64, 2);
        let mut dst = NdViewMut::of_buffer(&mut dst_buf, Order::RowMajor);
        zip_map2_scalar_into(&mut dst, &a, &b, |x, y| {
            let (x, y) = (
                x.cast(DataType::Float64).unwrap(),
                y.cast(DataType::Float64).unwrap(),
            );
            match (x, y) {
                (Scalar::Float64(x), Scalar::Float64(y)) => Scalar::Float64(x + y),
                _ => unreachable!(),
            }
        })
        .unwrap();
        drop(dst);
        assert_eq!(f64::from_buffer(&dst_buf).unwrap(), &[11.0, 22.5]);
    }
}
