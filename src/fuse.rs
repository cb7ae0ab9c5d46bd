//! Dimension fusion.
//!
//! Adjacent axes that are contiguous in memory for every operand can be
//! merged into one longer axis, reducing the number of loop levels the
//! kernels have to run. Axis `i` (outer) fuses into axis `i + 1` (inner)
//! when `strides[i] == dims[i + 1] * strides[i + 1]` holds for all
//! operands; the merged extent lands on the inner position and the outer
//! axis collapses to extent 1.

/// Fuse contiguous adjacent dimensions across all operands.
///
/// Returns the fused dimensions. Stride slices are left untouched: a
/// fused-away axis keeps its stride but has extent 1, so loops over it
/// never advance.
pub(crate) fn fuse_dims(dims: &[usize], all_strides: &[&[isize]]) -> Vec<usize> {
    let n = dims.len();
    if n <= 1 || all_strides.is_empty() {
        return dims.to_vec();
    }

    let mut result = dims.to_vec();

    for i in 0..n - 1 {
        let mut can_merge = true;
        for strides in all_strides {
            let expected = result[i + 1] as isize * strides[i + 1];
            if strides[i] != expected {
                can_merge = false;
                break;
            }
        }
        if can_merge {
            result[i + 1] *= result[i];
            result[i] = 1;
        }
    }

    result
}

/// Per-axis iteration cost used when shrinking blocks.
///
/// The cost of an axis is the smallest stride magnitude any operand has
/// along it: zero-stride (broadcast) axes cost 1, others twice their
/// stride.
pub(crate) fn axis_costs(all_strides: &[&[isize]]) -> Vec<isize> {
    if all_strides.is_empty() {
        return Vec::new();
    }

    let n = all_strides[0].len();
    let mut costs = vec![isize::MAX; n];

    for strides in all_strides {
        for i in 0..n {
            costs[i] = costs[i].min(strides[i].abs());
        }
    }

    for cost in &mut costs {
        if *cost == 0 {
            *cost = 1;
        } else {
            *cost *= 2;
        }
    }

    costs
}
