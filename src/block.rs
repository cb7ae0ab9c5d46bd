//! Block size computation for cache-tiled traversal.
//!
//! Given dimensions in iteration order, per-operand strides, and the
//! element byte width, compute how many elements of each axis one tile
//! should span so the tile's estimated memory region fits the
//! [`crate::BLOCK_MEMORY_SIZE`] cache target. Small arrays keep their full
//! extents; larger ones are shrunk by cost-weighted halving, largest
//! contribution first.

use crate::fuse::axis_costs;
use crate::{BLOCK_MEMORY_SIZE, CACHE_LINE_SIZE};

/// Compute block sizes for tiled iteration.
///
/// `order` is the iteration permutation (outermost first); the returned
/// block sizes are in iteration order and each is between 1 and the
/// corresponding dimension extent.
pub(crate) fn block_sizes(
    dims: &[usize],
    order: &[usize],
    strides_list: &[&[isize]],
    elem_size: usize,
) -> Vec<usize> {
    if order.is_empty() {
        return Vec::new();
    }

    let ordered_dims: Vec<usize> = order.iter().map(|&i| dims[i]).collect();

    let byte_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| {
            order
                .iter()
                .map(|&i| strides[i] * elem_size as isize)
                .collect()
        })
        .collect();

    let stride_ranks: Vec<Vec<usize>> = byte_strides.iter().map(|bs| stride_rank(bs)).collect();

    let reordered_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| order.iter().map(|&i| strides[i]).collect())
        .collect();
    let reordered_refs: Vec<&[isize]> = reordered_strides.iter().map(|s| s.as_slice()).collect();
    let costs = axis_costs(&reordered_refs);

    let byte_stride_refs: Vec<&[isize]> = byte_strides.iter().map(|s| s.as_slice()).collect();
    let stride_rank_refs: Vec<&[usize]> = stride_ranks.iter().map(|s| s.as_slice()).collect();

    compute_blocks(
        &ordered_dims,
        &costs,
        &byte_stride_refs,
        &stride_rank_refs,
        BLOCK_MEMORY_SIZE,
    )
}

fn compute_blocks(
    dims: &[usize],
    costs: &[isize],
    byte_strides: &[&[isize]],
    stride_ranks: &[&[usize]],
    block_size: usize,
) -> Vec<usize> {
    let n = dims.len();
    if n == 0 {
        return Vec::new();
    }

    // Everything fits in cache: use full extents.
    if memory_region(dims, byte_strides) <= block_size {
        return dims.to_vec();
    }

    // When the innermost (last) axis has the smallest stride in every
    // operand, keep it whole and shrink only the outer axes; splitting the
    // contiguous run would forfeit the sequential access it provides.
    let min_rank = stride_ranks
        .iter()
        .filter_map(|ranks| ranks.iter().min().copied())
        .min()
        .unwrap_or(1);

    if n > 1
        && stride_ranks
            .iter()
            .all(|ranks| !ranks.is_empty() && ranks[n - 1] == min_rank)
    {
        let head_dims = &dims[..n - 1];
        let head_costs = &costs[..n - 1];
        let head_byte_strides: Vec<&[isize]> =
            byte_strides.iter().map(|s| &s[..n - 1]).collect();
        let head_stride_ranks: Vec<&[usize]> =
            stride_ranks.iter().map(|s| &s[..n - 1]).collect();

        let mut blocks = compute_blocks(
            head_dims,
            head_costs,
            &head_byte_strides,
            &head_stride_ranks,
            block_size,
        );
        blocks.push(dims[n - 1]);
        return blocks;
    }

    // Every stride is already larger than the cache target: blocking
    // cannot help, touch one element per axis at a time.
    let min_stride = byte_strides
        .iter()
        .filter_map(|s| s.iter().map(|x| x.unsigned_abs()).min())
        .min()
        .unwrap_or(0);
    if min_stride > block_size {
        return vec![1; n];
    }

    let mut blocks = dims.to_vec();

    // Phase 1: halve the most expensive axis until within 2x of target.
    while memory_region(&blocks, byte_strides) >= 2 * block_size {
        match last_argmax_weighted(&blocks, costs) {
            Some(i) if blocks[i] > 1 => blocks[i] = blocks[i].div_ceil(2),
            _ => break,
        }
    }

    // Phase 2: decrement until within target.
    while memory_region(&blocks, byte_strides) > block_size {
        match last_argmax_weighted(&blocks, costs) {
            Some(i) if blocks[i] > 1 => blocks[i] -= 1,
            _ => break,
        }
    }

    blocks
}

/// Estimate the memory region one tile touches, in bytes.
///
/// Strides below the cache line length contribute to one contiguous
/// region; larger strides multiply the number of distinct cache-line
/// blocks the tile spans.
fn memory_region(dims: &[usize], byte_strides: &[&[isize]]) -> usize {
    let cache_line = CACHE_LINE_SIZE;
    let mut region = 0usize;

    for strides in byte_strides {
        let mut contiguous_bytes = 0usize;
        let mut cache_line_blocks = 1usize;

        for (&d, &s) in dims.iter().zip(strides.iter()) {
            let s_abs = s.unsigned_abs();
            if s_abs < cache_line {
                contiguous_bytes += d.saturating_sub(1) * s_abs;
            } else {
                cache_line_blocks *= d;
            }
        }

        let contiguous_lines = contiguous_bytes / cache_line + 1;
        region += cache_line * contiguous_lines * cache_line_blocks;
    }

    region
}

// Rank of each stride magnitude among the operand's non-zero strides;
// zero strides rank 1.
fn stride_rank(strides: &[isize]) -> Vec<usize> {
    let n = strides.len();
    let mut result = vec![1usize; n];

    for i in 0..n {
        let si = strides[i].unsigned_abs();
        if si == 0 {
            continue;
        }
        let mut rank = 1usize;
        for &s in strides {
            if s != 0 && s.unsigned_abs() < si {
                rank += 1;
            }
        }
        result[i] = rank;
    }

    result
}

// Last index maximizing (block - 1) * cost, skipping exhausted axes.
fn last_argmax_weighted(blocks: &[usize], costs: &[isize]) -> Option<usize> {
    let mut max_score = 0isize;
    let mut max_idx = None;

    for (i, (&b, &c)) in blocks.iter().zip(costs.iter()).enumerate() {
        if b <= 1 {
            continue;
        }
        let score = (b as isize - 1) * c;
        if score >= max_score {
            max_score = score;
            max_idx = Some(i);
        }
    }

    max_idx
}
