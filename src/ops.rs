//! Built-in array operations.
//!
//! These wire the rest of the crate together the way a host is expected
//! to: resolve the output dtype from the inputs and a policy, allocate
//! through the buffer factory, broadcast the operands, then route to a
//! type-specialized kernel through a [`DispatchTable`] with an
//! accessor-protocol kernel as the generic fallback.
//!
//! Real sums accumulate in `float64` and complex sums in `complex128`;
//! the generic fallback kernels compute in those domains as well and cast
//! on write, so mixed-dtype operands cost precision only where the output
//! dtype itself does.

use num_complex::Complex;

use crate::array::NdArray;
use crate::broadcast::broadcast_shapes;
use crate::buffer::{Element, Scalar};
use crate::dispatch::DispatchTable;
use crate::dtype::DataType;
use crate::map::{
    fill_scalar_into, map_into, map_scalar_into, zip_map2_into, zip_map2_scalar_into,
};
use crate::promote::{output_data_type, OutputPolicy, PolicyKind};
use crate::reduce::{
    accumulate_axis_into, accumulate_axis_scalar_into, reduce, reduce_axis_into,
    reduce_axis_scalar_into, reduce_scalar,
};
use crate::view::{NdArrayLike, NdView, NdViewMut};
use crate::Result;

type UnaryKernel = fn(&mut NdViewMut<'_>, &NdView<'_>) -> Result<()>;
type BinaryKernel = fn(&mut NdViewMut<'_>, &NdView<'_>, &NdView<'_>) -> Result<()>;
type SumKernel = fn(&NdView<'_>) -> Result<Scalar>;
type AxisKernel = fn(&mut NdViewMut<'_>, &NdView<'_>, usize) -> Result<()>;

/// Copy `src` into `dst`, broadcasting to `dst`'s shape and casting to
/// `dst`'s dtype where needed.
pub fn assign(dst: &mut NdViewMut<'_>, src: &NdView<'_>) -> Result<()> {
    use DataType::*;
    let src = if src.shape() == dst.shape() {
        src.clone()
    } else {
        src.broadcast_to(dst.shape())?
    };

    let table: DispatchTable<UnaryKernel> = DispatchTable::new()
        .entry(&[Float64, Float64], copy_kernel::<f64> as UnaryKernel)
        .entry(&[Float32, Float32], copy_kernel::<f32>)
        .entry(&[Int32, Int32], copy_kernel::<i32>)
        .entry(&[Complex128, Complex128], copy_kernel::<Complex<f64>>)
        .default_kernel(copy_generic);

    let kernel = table.resolve(&[src.data_type(), dst.data_type()])?;
    kernel(dst, &src)
}

fn copy_kernel<T: Element>(dst: &mut NdViewMut<'_>, src: &NdView<'_>) -> Result<()> {
    map_into(dst, src, |x: T| x)
}

fn copy_generic(dst: &mut NdViewMut<'_>, src: &NdView<'_>) -> Result<()> {
    map_scalar_into(dst, src, |x| x)
}

/// Fill `dst` with one value, cast to its dtype.
pub fn fill(dst: &mut NdViewMut<'_>, value: Scalar) -> Result<()> {
    fill_scalar_into(dst, value)
}

/// Element-wise sum of two views into a freshly allocated array.
///
/// The output dtype is the promoted type of the inputs (`generic`
/// propagates); the output shape is their broadcast shape.
pub fn add(a: &NdView<'_>, b: &NdView<'_>) -> Result<NdArray> {
    use DataType::*;
    let table: DispatchTable<BinaryKernel> = DispatchTable::new()
        .entry(&[Float64, Float64, Float64], add_kernel::<f64> as BinaryKernel)
        .entry(&[Float32, Float32, Float32], add_kernel::<f32>)
        .entry(&[Int32, Int32, Int32], add_kernel::<i32>)
        .entry(
            &[Complex128, Complex128, Complex128],
            add_kernel::<Complex<f64>>,
        )
        .default_kernel(add_generic);
    binary_elementwise(a, b, &table)
}

/// Element-wise product of two views into a freshly allocated array.
pub fn mul(a: &NdView<'_>, b: &NdView<'_>) -> Result<NdArray> {
    use DataType::*;
    let table: DispatchTable<BinaryKernel> = DispatchTable::new()
        .entry(&[Float64, Float64, Float64], mul_kernel::<f64> as BinaryKernel)
        .entry(&[Float32, Float32, Float32], mul_kernel::<f32>)
        .entry(&[Int32, Int32, Int32], mul_kernel::<i32>)
        .entry(
            &[Complex128, Complex128, Complex128],
            mul_kernel::<Complex<f64>>,
        )
        .default_kernel(mul_generic);
    binary_elementwise(a, b, &table)
}

fn add_kernel<T>(dst: &mut NdViewMut<'_>, a: &NdView<'_>, b: &NdView<'_>) -> Result<()>
where
    T: Element + std::ops::Add<Output = T>,
{
    zip_map2_into(dst, a, b, |x: T, y: T| x + y)
}

fn add_generic(dst: &mut NdViewMut<'_>, a: &NdView<'_>, b: &NdView<'_>) -> Result<()> {
    zip_map2_scalar_into(dst, a, b, |x, y| scalar_add(&x, &y))
}

fn mul_kernel<T>(dst: &mut NdViewMut<'_>, a: &NdView<'_>, b: &NdView<'_>) -> Result<()>
where
    T: Element + std::ops::Mul<Output = T>,
{
    zip_map2_into(dst, a, b, |x: T, y: T| x * y)
}

fn mul_generic(dst: &mut NdViewMut<'_>, a: &NdView<'_>, b: &NdView<'_>) -> Result<()> {
    zip_map2_scalar_into(dst, a, b, |x, y| scalar_mul(&x, &y))
}

fn binary_elementwise(
    a: &NdView<'_>,
    b: &NdView<'_>,
    table: &DispatchTable<BinaryKernel>,
) -> Result<NdArray> {
    let out_shape = broadcast_shapes(&[a.shape(), b.shape()])?;
    let out_dtype = output_data_type(
        &[a.data_type(), b.data_type()],
        OutputPolicy::and_generic(PolicyKind::Promoted),
    )?;
    let mut out = NdArray::zeros(out_dtype, &out_shape, a.order());

    let av = if a.shape() == out_shape.as_slice() {
        a.clone()
    } else {
        a.broadcast_to(&out_shape)?
    };
    let bv = if b.shape() == out_shape.as_slice() {
        b.clone()
    } else {
        b.broadcast_to(&out_shape)?
    };

    let kernel = table.resolve(&[av.data_type(), bv.data_type(), out_dtype])?;
    {
        let mut dst = out.view_mut();
        kernel(&mut dst, &av, &bv)?;
    }
    Ok(out)
}

/// Element-wise negation into a freshly allocated array.
pub fn neg(a: &NdView<'_>) -> Result<NdArray> {
    use DataType::*;
    let out_dtype = output_data_type(
        &[a.data_type()],
        OutputPolicy::and_generic(PolicyKind::Promoted),
    )?;
    let mut out = NdArray::zeros(out_dtype, a.shape(), a.order());

    let table: DispatchTable<UnaryKernel> = DispatchTable::new()
        .entry(&[Float64, Float64], neg_kernel::<f64> as UnaryKernel)
        .entry(&[Float32, Float32], neg_kernel::<f32>)
        .entry(&[Int32, Int32], neg_kernel::<i32>)
        .entry(&[Complex128, Complex128], neg_kernel::<Complex<f64>>)
        .default_kernel(neg_generic);

    let kernel = table.resolve(&[a.data_type(), out_dtype])?;
    {
        let mut dst = out.view_mut();
        kernel(&mut dst, a)?;
    }
    Ok(out)
}

fn neg_kernel<T>(dst: &mut NdViewMut<'_>, src: &NdView<'_>) -> Result<()>
where
    T: Element + std::ops::Neg<Output = T>,
{
    map_into(dst, src, |x: T| -x)
}

fn neg_generic(dst: &mut NdViewMut<'_>, src: &NdView<'_>) -> Result<()> {
    map_scalar_into(dst, src, |x| scalar_neg(&x))
}

/// Sum of every element.
///
/// Real inputs accumulate in and return `float64`; complex inputs return
/// `complex128`. Empty views sum to zero.
pub fn sum(src: &NdView<'_>) -> Result<Scalar> {
    use DataType::*;
    let table: DispatchTable<SumKernel> = DispatchTable::new()
        .entry(&[Float64], sum_f64 as SumKernel)
        .entry(&[Float32], sum_f32)
        .entry(&[Int32], sum_i32)
        .entry(&[Complex128], sum_c128)
        .default_kernel(sum_generic);
    let kernel = table.resolve(&[src.data_type()])?;
    kernel(src)
}

fn sum_f64(src: &NdView<'_>) -> Result<Scalar> {
    Ok(Scalar::Float64(reduce(src, |x: f64| x, |a, b| a + b, 0.0)?))
}

fn sum_f32(src: &NdView<'_>) -> Result<Scalar> {
    Ok(Scalar::Float64(reduce(
        src,
        |x: f32| x as f64,
        |a, b| a + b,
        0.0,
    )?))
}

fn sum_i32(src: &NdView<'_>) -> Result<Scalar> {
    Ok(Scalar::Float64(reduce(
        src,
        |x: i32| x as f64,
        |a, b| a + b,
        0.0,
    )?))
}

fn sum_c128(src: &NdView<'_>) -> Result<Scalar> {
    Ok(Scalar::Complex128(reduce(
        src,
        |x: Complex<f64>| x,
        |a, b| a + b,
        Complex::new(0.0, 0.0),
    )?))
}

fn sum_generic(src: &NdView<'_>) -> Result<Scalar> {
    reduce_scalar(src, |acc, x| scalar_add(&acc, &x), Scalar::Float64(0.0))
}

/// Sum along one axis into a freshly allocated array of the remaining
/// shape. Boolean inputs count as `int32`; other dtypes keep their own.
pub fn sum_axis(src: &NdView<'_>, axis: usize) -> Result<NdArray> {
    use DataType::*;
    let out_dtype = match src.data_type() {
        Bool => Int32,
        other => other,
    };
    let out_shape: Vec<usize> = src
        .shape()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != axis)
        .map(|(_, &d)| d)
        .collect();
    let mut out = NdArray::zeros(out_dtype, &out_shape, src.order());

    let table: DispatchTable<AxisKernel> = DispatchTable::new()
        .entry(&[Float64, Float64], sum_axis_kernel::<f64> as AxisKernel)
        .entry(&[Float32, Float32], sum_axis_kernel::<f32>)
        .entry(&[Int32, Int32], sum_axis_kernel::<i32>)
        .entry(
            &[Complex128, Complex128],
            sum_axis_kernel::<Complex<f64>>,
        )
        .default_kernel(sum_axis_generic);

    let kernel = table.resolve(&[src.data_type(), out_dtype])?;
    {
        let mut dst = out.view_mut();
        kernel(&mut dst, src, axis)?;
    }
    Ok(out)
}

fn sum_axis_kernel<T>(dst: &mut NdViewMut<'_>, src: &NdView<'_>, axis: usize) -> Result<()>
where
    T: Element + num_traits::Zero + std::ops::Add<Output = T>,
{
    reduce_axis_into(dst, src, axis, |x: T| x, |a, b| a + b, T::zero())
}

fn sum_axis_generic(dst: &mut NdViewMut<'_>, src: &NdView<'_>, axis: usize) -> Result<()> {
    reduce_axis_scalar_into(dst, src, axis, |a, x| scalar_add(&a, &x), Scalar::Float64(0.0))
}

/// Running totals along one axis into a freshly allocated array of the
/// same shape. Boolean inputs accumulate as `int32`.
pub fn cumsum_axis(src: &NdView<'_>, axis: usize) -> Result<NdArray> {
    use DataType::*;
    let out_dtype = match src.data_type() {
        Bool => Int32,
        other => other,
    };
    let mut out = NdArray::zeros(out_dtype, src.shape(), src.order());

    let table: DispatchTable<AxisKernel> = DispatchTable::new()
        .entry(&[Float64, Float64], cumsum_axis_kernel::<f64> as AxisKernel)
        .entry(&[Float32, Float32], cumsum_axis_kernel::<f32>)
        .entry(&[Int32, Int32], cumsum_axis_kernel::<i32>)
        .entry(
            &[Complex128, Complex128],
            cumsum_axis_kernel::<Complex<f64>>,
        )
        .default_kernel(cumsum_axis_generic);

    let kernel = table.resolve(&[src.data_type(), out_dtype])?;
    {
        let mut dst = out.view_mut();
        kernel(&mut dst, src, axis)?;
    }
    Ok(out)
}

fn cumsum_axis_kernel<T>(dst: &mut NdViewMut<'_>, src: &NdView<'_>, axis: usize) -> Result<()>
where
    T: Element + std::ops::Add<Output = T>,
{
    accumulate_axis_into(dst, src, axis, |a: T, b: T| a + b)
}

fn cumsum_axis_generic(dst: &mut NdViewMut<'_>, src: &NdView<'_>, axis: usize) -> Result<()> {
    accumulate_axis_scalar_into(dst, src, axis, |a, b| scalar_add(&a, &b))
}

// ============================================================================
// Scalar arithmetic for the generic fallback kernels
// ============================================================================

fn is_complex_valued(s: &Scalar) -> bool {
    match s {
        Scalar::Complex64(_) | Scalar::Complex128(_) => true,
        Scalar::Generic(inner) => is_complex_valued(inner),
        _ => false,
    }
}

fn as_f64(s: &Scalar) -> f64 {
    match s.cast(DataType::Float64) {
        Some(Scalar::Float64(v)) => v,
        _ => unreachable!("float64 projection is total"),
    }
}

fn as_c128(s: &Scalar) -> Complex<f64> {
    match s.cast(DataType::Complex128) {
        Some(Scalar::Complex128(v)) => v,
        _ => unreachable!("complex128 projection is total"),
    }
}

fn scalar_add(x: &Scalar, y: &Scalar) -> Scalar {
    if is_complex_valued(x) || is_complex_valued(y) {
        Scalar::Complex128(as_c128(x) + as_c128(y))
    } else {
        Scalar::Float64(as_f64(x) + as_f64(y))
    }
}

fn scalar_mul(x: &Scalar, y: &Scalar) -> Scalar {
    if is_complex_valued(x) || is_complex_valued(y) {
        Scalar::Complex128(as_c128(x) * as_c128(y))
    } else {
        Scalar::Float64(as_f64(x) * as_f64(y))
    }
}

fn scalar_neg(x: &Scalar) -> Scalar {
    if is_complex_valued(x) {
        Scalar::Complex128(-as_c128(x))
    } else {
        Scalar::Float64(-as_f64(x))
    }
}
