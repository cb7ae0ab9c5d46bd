use approx::assert_relative_eq;
use num_complex::Complex;

use ndview::ops;
use ndview::{
    fill_into, map_into, reduce, reduce_axis_into, zip_map2_into, Buffer, DataType, Element,
    NdArray, NdArrayLike, NdView, NdViewMut, Order, Scalar,
};

fn iota_array(rows: usize, cols: usize) -> NdArray {
    let data: Vec<f64> = (0..rows * cols).map(|x| x as f64).collect();
    NdArray::from_vec(data, &[rows, cols], Order::RowMajor).unwrap()
}

fn f64_at(view: &NdView<'_>, subs: &[usize]) -> f64 {
    match view.get(subs) {
        Scalar::Float64(v) => v,
        other => panic!("expected float64, got {other:?}"),
    }
}

#[test]
fn test_map_into_transposed() {
    let a = iota_array(8, 5);
    let a_view = a.view();
    let a_t = a_view.transpose().unwrap();
    let mut out = NdArray::zeros(DataType::Float64, &[5, 8], Order::RowMajor);

    {
        let mut dst = out.view_mut();
        map_into(&mut dst, &a_t, |x: f64| x * 2.0).unwrap();
    }

    let out_view = out.view();
    for i in 0..5 {
        for j in 0..8 {
            assert_relative_eq!(
                f64_at(&out_view, &[i, j]),
                f64_at(&a_t, &[i, j]) * 2.0,
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn test_zip_map2_mixed_strides() {
    let a = iota_array(6, 4);
    let b = iota_array(6, 4);
    let a_view = a.view();
    let b_view = b.view();
    let a_t = a_view.transpose().unwrap();
    let b_t = b_view.transpose().unwrap();
    let mut out = NdArray::zeros(DataType::Float64, &[4, 6], Order::RowMajor);

    {
        let mut dst = out.view_mut();
        zip_map2_into(&mut dst, &a_t, &b_t, |x: f64, y: f64| x + y).unwrap();
    }

    let out_view = out.view();
    for i in 0..4 {
        for j in 0..6 {
            assert_relative_eq!(
                f64_at(&out_view, &[i, j]),
                2.0 * f64_at(&a_t, &[i, j]),
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn test_fill_into_strided_destination() {
    let mut out = NdArray::zeros(DataType::Float64, &[3, 4], Order::RowMajor);
    {
        let dst = out.view_mut();
        let mut reversed = dst.reverse_axis(1).unwrap();
        let mut counter = 0.0f64;
        fill_into(&mut reversed, || {
            counter += 1.0;
            counter
        })
        .unwrap();
    }
    // Every slot written exactly once: the multiset of values is 1..=12.
    let mut values = f64::from_buffer(out.view().buffer()).unwrap().to_vec();
    values.sort_by(f64::total_cmp);
    assert_eq!(values, (1..=12).map(|x| x as f64).collect::<Vec<_>>());
}

#[test]
fn test_reduce_matches_manual_sum() {
    let a = iota_array(10, 12);
    let total = reduce(&a.view(), |x: f64| x, |p, q| p + q, 0.0).unwrap();
    let expected: f64 = (0..120).map(|x| x as f64).sum();
    assert_relative_eq!(total, expected, epsilon = 1e-10);
}

#[test]
fn test_reduce_axis_against_scalar_reduce() {
    let data: Vec<f64> = (0..24).map(|x| (x * 7 % 11) as f64).collect();
    let a = NdArray::from_vec(data, &[4, 3, 2], Order::RowMajor).unwrap();
    let a_view = a.view();

    for axis in 0..3 {
        let summed = ops::sum_axis(&a_view, axis).unwrap();
        // Cross-check each output lane against explicit subscript reads.
        let out_view = summed.view();
        let out_shape = out_view.shape().to_vec();
        let axis_len = a_view.shape()[axis];
        let mut outer_subs = vec![0usize; out_shape.len()];
        loop {
            let mut expected = 0.0;
            for k in 0..axis_len {
                let mut subs: Vec<usize> = outer_subs.clone();
                subs.insert(axis, k);
                expected += f64_at(&a_view, &subs);
            }
            assert_relative_eq!(f64_at(&out_view, &outer_subs), expected, epsilon = 1e-10);

            // Odometer over the outer subscripts.
            let mut done = true;
            for i in (0..out_shape.len()).rev() {
                outer_subs[i] += 1;
                if outer_subs[i] < out_shape[i] {
                    done = false;
                    break;
                }
                outer_subs[i] = 0;
            }
            if done {
                break;
            }
        }
    }
}

#[test]
fn test_reduce_axis_into_strided_dest() {
    let a = iota_array(4, 6);
    let mut out = NdArray::zeros(DataType::Float64, &[6], Order::RowMajor);
    {
        let dst = out.view_mut();
        let mut reversed = dst.reverse_axis(0).unwrap();
        reduce_axis_into(&mut reversed, &a.view(), 0, |x: f64| x, |p, q| p + q, 0.0).unwrap();
    }
    // Column j of iota(4,6) sums to j*4 + 36; reversed destination stores
    // column 5 first.
    let out_view = out.view();
    let stored = f64::from_buffer(out_view.buffer()).unwrap();
    for (k, &v) in stored.iter().enumerate() {
        let j = 5 - k;
        assert_relative_eq!(v, (j * 4 + 36) as f64, epsilon = 1e-12);
    }
}

#[test]
fn test_assign_through_broadcast_and_cast() {
    let row = NdArray::from_vec(vec![1i32, 2, 3], &[3], Order::RowMajor).unwrap();
    let mut out = NdArray::zeros(DataType::Float32, &[4, 3], Order::RowMajor);
    {
        let mut dst = out.view_mut();
        ops::assign(&mut dst, &row.view()).unwrap();
    }
    let out_view = out.view();
    for i in 0..4 {
        for j in 0..3 {
            assert_eq!(out_view.get(&[i, j]), Scalar::Float32((j + 1) as f32));
        }
    }
}

#[test]
fn test_add_dispatch_specialized_vs_generic() {
    // float64 x float64 runs the specialized kernel; int16 x int16 has no
    // table entry and must produce identical results via the fallback.
    let a64 = NdArray::from_vec(vec![1.0f64, 2.0, 3.0], &[3], Order::RowMajor).unwrap();
    let b64 = NdArray::from_vec(vec![4.0f64, 5.0, 6.0], &[3], Order::RowMajor).unwrap();
    let out64 = ops::add(&a64.view(), &b64.view()).unwrap();
    assert_eq!(
        f64::from_buffer(out64.view().buffer()).unwrap(),
        &[5.0, 7.0, 9.0]
    );

    let a16 = NdArray::from_vec(vec![1i16, 2, 3], &[3], Order::RowMajor).unwrap();
    let b16 = NdArray::from_vec(vec![4i16, 5, 6], &[3], Order::RowMajor).unwrap();
    let out16 = ops::add(&a16.view(), &b16.view()).unwrap();
    assert_eq!(out16.data_type(), DataType::Int16);
    assert_eq!(
        i16::from_buffer(out16.view().buffer()).unwrap(),
        &[5, 7, 9]
    );
}

#[test]
fn test_generic_buffer_arithmetic() {
    let mut gen_buf = Buffer::allocate(DataType::Generic, 3);
    gen_buf.set(0, Scalar::Int32(1)).unwrap();
    gen_buf.set(1, Scalar::Float64(2.5)).unwrap();
    gen_buf
        .set(2, Scalar::Complex128(Complex::new(0.0, 1.0)))
        .unwrap();
    let gen_arr = NdArray::from_buffer(gen_buf, &[3], Order::RowMajor).unwrap();
    let ones = NdArray::from_vec(vec![1.0f64, 1.0, 1.0], &[3], Order::RowMajor).unwrap();

    let out = ops::add(&gen_arr.view(), &ones.view()).unwrap();
    assert_eq!(out.data_type(), DataType::Generic);
    let v = out.view();
    assert_eq!(v.get(&[0]), Scalar::Float64(2.0));
    assert_eq!(v.get(&[1]), Scalar::Float64(3.5));
    assert_eq!(v.get(&[2]), Scalar::Complex128(Complex::new(1.0, 1.0)));
}

#[test]
fn test_blocked_traversal_matches_naive_large() {
    // Large enough to force tiling; a transposed operand defeats the
    // contiguous fast path, so the blocked kernel itself is exercised.
    let n = 256usize;
    let data: Vec<f64> = (0..n * n).map(|x| (x % 977) as f64).collect();
    let a = NdArray::from_vec(data.clone(), &[n, n], Order::RowMajor).unwrap();
    let a_view = a.view();
    let a_t = a_view.transpose().unwrap();

    let mut out = NdArray::zeros(DataType::Float64, &[n, n], Order::RowMajor);
    {
        let mut dst = out.view_mut();
        map_into(&mut dst, &a_t, |x: f64| x + 1.0).unwrap();
    }

    let out_view = out.view();
    let stored = f64::from_buffer(out_view.buffer()).unwrap();
    for i in 0..n {
        for j in 0..n {
            let expected = data[j * n + i] + 1.0;
            assert_eq!(stored[i * n + j], expected, "mismatch at ({i}, {j})");
        }
    }
}

#[test]
fn test_empty_views_are_no_ops() {
    let a = NdArray::zeros(DataType::Float64, &[3, 0, 4], Order::RowMajor);
    assert_eq!(a.numel(), 0);
    let total = reduce(&a.view(), |x: f64| x, |p, q| p + q, 0.0).unwrap();
    assert_eq!(total, 0.0);

    let mut out = NdArray::zeros(DataType::Float64, &[3, 0, 4], Order::RowMajor);
    let mut dst = out.view_mut();
    map_into(&mut dst, &a.view(), |x: f64| x * 2.0).unwrap();
}

#[test]
fn test_readonly_views_reject_engine_writes() {
    let src = NdArray::from_vec(vec![1.0f64, 2.0], &[2], Order::RowMajor).unwrap();
    let mut out = NdArray::zeros(DataType::Float64, &[2], Order::RowMajor);
    let mut dst = out.view_mut().into_readonly();
    assert!(ops::assign(&mut dst, &src.view()).is_err());
}

#[test]
fn test_scalar_view_roundtrip_through_engines() {
    let buf = Buffer::from_f64(vec![41.0]);
    let src = NdView::scalar(&buf, 0).unwrap();
    let mut out_buf = Buffer::allocate(DataType::Float64, 1);
    {
        let mut dst = NdViewMut::new(&mut out_buf, vec![], vec![], 0, Order::RowMajor).unwrap();
        map_into(&mut dst, &src, |x: f64| x + 1.0).unwrap();
    }
    assert_eq!(out_buf.get(0), Scalar::Float64(42.0));
}
