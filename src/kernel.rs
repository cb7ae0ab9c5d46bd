//! The blocked iteration engine.
//!
//! Every traversal in this crate flows through the same pipeline: fuse
//! contiguous dimensions, pick a loop order (smallest stride innermost),
//! compute cache-targeted block sizes, then walk the index space with
//! per-operand offset arithmetic. [`for_each_inner_block`] is the core
//! driver: it hands the callback a run of innermost elements at a time
//! (current per-operand offsets, run length, innermost strides), which
//! lets callers write tight inner loops over raw slices or pointers.
//!
//! Kernels are specialized by rank for 1-3 dimensions with a recursive
//! fallback above that. All variants visit every logical position exactly
//! once; they differ only in loop structure.

use crate::block::block_sizes;
use crate::buffer::Element;
use crate::fuse::fuse_dims;
use crate::order::loop_order;
use crate::view::NdArrayLike;
use crate::{NdError, Result};

/// An execution plan: iteration order (outermost first) plus block sizes
/// in iteration order.
pub(crate) struct KernelPlan {
    pub(crate) order: Vec<usize>,
    pub(crate) block: Vec<usize>,
}

/// Build an execution plan for a set of operands sharing `dims`.
pub(crate) fn build_plan(
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
    elem_size: usize,
) -> KernelPlan {
    let order = loop_order(dims, strides_list, dest_index);
    let block = block_sizes(dims, &order, strides_list, elem_size);
    KernelPlan { order, block }
}

/// Fuse contiguous dimensions, then build a plan on the fused extents.
///
/// Returns the fused dims alongside the plan; strides are valid unchanged
/// because fused-away axes keep extent 1.
pub(crate) fn build_plan_fused(
    dims: &[usize],
    strides_list: &[&[isize]],
    dest_index: Option<usize>,
    elem_size: usize,
) -> (Vec<usize>, KernelPlan) {
    let fused_dims = fuse_dims(dims, strides_list);
    let plan = build_plan(&fused_dims, strides_list, dest_index, elem_size);
    (fused_dims, plan)
}

/// Iterate in blocks, calling `f` with `(offsets, run_len, inner_strides)`.
///
/// `offsets` holds the current offset of each operand relative to its own
/// base (view offset); `run_len` elements follow along the innermost axis,
/// each operand advancing by its entry in `inner_strides`. A
/// zero-dimensional index space produces exactly one call with a run of 1.
pub(crate) fn for_each_inner_block<F>(
    dims: &[usize],
    plan: &KernelPlan,
    strides_list: &[&[isize]],
    mut f: F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let rank = dims.len();
    let num_operands = strides_list.len();
    if rank == 0 {
        let offsets = vec![0isize; num_operands];
        let inner = vec![0isize; num_operands];
        return f(&offsets, 1, &inner);
    }

    let ordered_dims: Vec<usize> = plan.order.iter().map(|&d| dims[d]).collect();
    let ordered_strides: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|strides| plan.order.iter().map(|&d| strides[d]).collect())
        .collect();

    let mut offsets = vec![0isize; num_operands];

    match rank {
        1 => kernel_1d(&ordered_dims, &plan.block, &ordered_strides, &mut offsets, &mut f),
        2 => kernel_2d(&ordered_dims, &plan.block, &ordered_strides, &mut offsets, &mut f),
        3 => kernel_3d(&ordered_dims, &plan.block, &ordered_strides, &mut offsets, &mut f),
        _ => kernel_nd(&ordered_dims, &plan.block, &ordered_strides, &mut offsets, &mut f),
    }
}

/// Iterate element-wise, calling `f` with per-operand offsets.
///
/// Convenience wrapper over [`for_each_inner_block`] for callers that need
/// one callback per logical element (accessor engines, per-element
/// reductions) rather than a run at a time.
pub(crate) fn for_each_offset<F>(
    dims: &[usize],
    plan: &KernelPlan,
    strides_list: &[&[isize]],
    mut f: F,
) -> Result<()>
where
    F: FnMut(&[isize]) -> Result<()>,
{
    let mut current = vec![0isize; strides_list.len()];
    for_each_inner_block(dims, plan, strides_list, |offsets, run, inner| {
        current.copy_from_slice(offsets);
        for _ in 0..run {
            f(&current)?;
            for (c, s) in current.iter_mut().zip(inner.iter()) {
                *c += s;
            }
        }
        Ok(())
    })
}

fn kernel_1d<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let d0 = dims[0];
    let b0 = blocks[0].clamp(1, d0.max(1));
    let inner: Vec<isize> = strides.iter().map(|s| s[0]).collect();

    let mut j0 = 0usize;
    while j0 < d0 {
        let run = b0.min(d0 - j0);
        f(offsets, run, &inner)?;
        for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
            *offset += run as isize * s[0];
        }
        j0 += run;
    }
    for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
        *offset -= d0 as isize * s[0];
    }

    Ok(())
}

// Axis 0 is outermost, axis 1 is the innermost run.
fn kernel_2d<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let (d0, d1) = (dims[0], dims[1]);
    let b0 = blocks[0].clamp(1, d0.max(1));
    let b1 = blocks[1].clamp(1, d1.max(1));
    let inner: Vec<isize> = strides.iter().map(|s| s[1]).collect();

    let mut j0 = 0usize;
    while j0 < d0 {
        let blen0 = b0.min(d0 - j0);

        let mut j1 = 0usize;
        while j1 < d1 {
            let blen1 = b1.min(d1 - j1);

            for _ in 0..blen0 {
                f(offsets, blen1, &inner)?;
                for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                    *offset += s[0];
                }
            }
            for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                *offset -= blen0 as isize * s[0];
                *offset += blen1 as isize * s[1];
            }
            j1 += blen1;
        }

        for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
            *offset -= d1 as isize * s[1];
            *offset += blen0 as isize * s[0];
        }
        j0 += blen0;
    }

    for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
        *offset -= d0 as isize * s[0];
    }

    Ok(())
}

// Axis 0 outermost, axis 1 middle, axis 2 the innermost run.
fn kernel_3d<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let (d0, d1, d2) = (dims[0], dims[1], dims[2]);
    let b0 = blocks[0].clamp(1, d0.max(1));
    let b1 = blocks[1].clamp(1, d1.max(1));
    let b2 = blocks[2].clamp(1, d2.max(1));
    let inner: Vec<isize> = strides.iter().map(|s| s[2]).collect();

    let mut j0 = 0usize;
    while j0 < d0 {
        let blen0 = b0.min(d0 - j0);

        let mut j1 = 0usize;
        while j1 < d1 {
            let blen1 = b1.min(d1 - j1);

            let mut j2 = 0usize;
            while j2 < d2 {
                let blen2 = b2.min(d2 - j2);

                for _ in 0..blen0 {
                    for _ in 0..blen1 {
                        f(offsets, blen2, &inner)?;
                        for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                            *offset += s[1];
                        }
                    }
                    for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                        *offset -= blen1 as isize * s[1];
                        *offset += s[0];
                    }
                }
                for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                    *offset -= blen0 as isize * s[0];
                    *offset += blen2 as isize * s[2];
                }
                j2 += blen2;
            }

            for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                *offset -= d2 as isize * s[2];
                *offset += blen1 as isize * s[1];
            }
            j1 += blen1;
        }

        for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
            *offset -= d1 as isize * s[1];
            *offset += blen0 as isize * s[0];
        }
        j0 += blen0;
    }

    for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
        *offset -= d0 as isize * s[0];
    }

    Ok(())
}

// Recursive fallback for rank >= 4. Level 0 is outermost; the last level
// delivers runs to the callback.
fn kernel_nd<F>(
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    offsets: &mut [isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let inner: Vec<isize> = strides.iter().map(|s| s[dims.len() - 1]).collect();
    kernel_nd_level(0, dims, blocks, strides, &inner, offsets, f)
}

fn kernel_nd_level<F>(
    level: usize,
    dims: &[usize],
    blocks: &[usize],
    strides: &[Vec<isize>],
    inner: &[isize],
    offsets: &mut [isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let d = dims[level];
    let b = blocks[level].clamp(1, d.max(1));

    if level == dims.len() - 1 {
        let mut j = 0usize;
        while j < d {
            let run = b.min(d - j);
            f(offsets, run, inner)?;
            for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                *offset += run as isize * s[level];
            }
            j += run;
        }
    } else {
        let mut j = 0usize;
        while j < d {
            let blen = b.min(d - j);
            for _ in 0..blen {
                kernel_nd_level(level + 1, dims, blocks, strides, inner, offsets, f)?;
                for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
                    *offset += s[level];
                }
            }
            j += blen;
        }
    }

    for (offset, s) in offsets.iter_mut().zip(strides.iter()) {
        *offset -= d as isize * s[level];
    }

    Ok(())
}

// ============================================================================
// Raw typed views for the engines
// ============================================================================

/// Borrowed raw parts of a typed operand: base pointer (already advanced
/// to the view offset), dims, and strides.
pub(crate) struct RawView<T> {
    pub(crate) ptr: *const T,
    pub(crate) dims: Vec<usize>,
    pub(crate) strides: Vec<isize>,
}

pub(crate) struct RawViewMut<T> {
    pub(crate) ptr: *mut T,
    pub(crate) dims: Vec<usize>,
    pub(crate) strides: Vec<isize>,
}

impl<T: Element> RawView<T> {
    /// Extract typed parts from an array-like operand.
    ///
    /// # Errors
    /// [`NdError::DataTypeMismatch`] when the buffer's dtype is not `T`'s.
    pub(crate) fn from_operand(operand: &impl NdArrayLike) -> Result<RawView<T>> {
        let slice = T::from_buffer(operand.buffer()).ok_or(NdError::DataTypeMismatch {
            expected: T::DATA_TYPE,
            actual: operand.data_type(),
        })?;
        // wrapping_add keeps degenerate empty views (whose offsets are
        // unchecked) from being undefined behavior; the pointer is only
        // dereferenced for validated non-empty views.
        Ok(RawView {
            ptr: slice.as_ptr().wrapping_add(operand.offset()),
            dims: operand.shape().to_vec(),
            strides: operand.strides().to_vec(),
        })
    }
}

impl<T: Element> RawViewMut<T> {
    pub(crate) fn from_view_mut(view: &mut crate::view::NdViewMut<'_>) -> Result<RawViewMut<T>> {
        if view.is_readonly() {
            return Err(NdError::ReadOnlyView);
        }
        let dims = view.shape().to_vec();
        let strides = view.strides().to_vec();
        let offset = view.offset();
        let actual = view.data_type();
        let slice = T::from_buffer_mut(view.buffer_mut()).ok_or(NdError::DataTypeMismatch {
            expected: T::DATA_TYPE,
            actual,
        })?;
        Ok(RawViewMut {
            ptr: slice.as_mut_ptr().wrapping_add(offset),
            dims,
            strides,
        })
    }
}

/// Require two operands to share a shape exactly.
pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a.len() != b.len() {
        return Err(NdError::RankMismatch(a.len(), b.len()));
    }
    if a != b {
        return Err(NdError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}
