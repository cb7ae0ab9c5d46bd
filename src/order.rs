//! Loop-order selection for strided traversal.
//!
//! Axes are permuted so that the axis with the smallest combined stride
//! magnitude comes last and therefore innermost in the generated loop
//! nest, maximizing sequential memory access and cache-line reuse. The
//! permutation is applied identically to the shape and to every
//! participating operand's strides, so it never changes results, only the
//! order buffer slots are touched in.

/// Compute the iteration order for a set of operands.
///
/// Returns a permutation of `0..dims.len()` from outermost to innermost:
/// the axis with the smallest weighted stride magnitude sorts last. The
/// destination operand, identified by `dest_index`, is weighted double:
/// writes benefit more from locality than reads.
pub(crate) fn loop_order(
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
) -> Vec<usize> {
    let rank = dims.len();
    if rank == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..rank).collect();
    order.sort_by(|&a, &b| {
        let score_a = axis_score(a, strides_list, dest_index);
        let score_b = axis_score(b, strides_list, dest_index);
        score_b.cmp(&score_a).then_with(|| a.cmp(&b))
    });
    order
}

fn axis_score(axis: usize, strides_list: &[&[isize]], dest_index: Option<usize>) -> usize {
    let mut score = 0usize;
    for (i, strides) in strides_list.iter().enumerate() {
        let weight = if dest_index == Some(i) { 2 } else { 1 };
        let stride = strides[axis].unsigned_abs();
        score = score.saturating_add(weight * stride);
    }
    score
}
