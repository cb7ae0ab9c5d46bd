//! Shape broadcasting.
//!
//! The standard right-aligned rule: shapes are compared from their trailing
//! axes, each axis must be equal, 1, or absent (treated as 1), and the
//! result takes the larger extent. Any other mismatch across the whole set
//! is a fatal shape incompatibility.

use crate::{NdError, Result};

/// Broadcast any number of shapes to their common shape.
///
/// # Errors
/// [`NdError::ShapeMismatch`] naming the first incompatible pair of
/// shapes; [`NdError::EmptySignature`] for an empty list.
pub fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    if shapes.is_empty() {
        return Err(NdError::EmptySignature);
    }
    let rank = shapes.iter().map(|s| s.len()).max().unwrap();
    let mut out = vec![1usize; rank];

    for d in 0..rank {
        // d counts from the trailing axis.
        let mut target = 1usize;
        let mut target_owner = shapes[0];
        for &shape in shapes {
            let n = if d < shape.len() {
                shape[shape.len() - 1 - d]
            } else {
                1
            };
            if n == 1 {
                continue;
            }
            if target == 1 {
                target = n;
                target_owner = shape;
            } else if target != n {
                return Err(NdError::ShapeMismatch(
                    target_owner.to_vec(),
                    shape.to_vec(),
                ));
            }
        }
        out[rank - 1 - d] = target;
    }

    Ok(out)
}

/// Broadcast shapes only when needed.
///
/// When every input shape is already identical the common shape is `None`,
/// signalling that callers can keep their existing views untouched instead
/// of deriving new ones.
pub fn maybe_broadcast_shapes(shapes: &[&[usize]]) -> Result<Option<Vec<usize>>> {
    if shapes.is_empty() {
        return Err(NdError::EmptySignature);
    }
    if shapes.windows(2).all(|w| w[0] == w[1]) {
        return Ok(None);
    }
    broadcast_shapes(shapes).map(Some)
}

/// Strides for a view broadcast to a target shape.
///
/// Right-aligned against the target: an axis of matching extent keeps its
/// stride, a size-1 or absent axis becomes stride 0 (many logical
/// positions, one buffer slot), and anything else is a shape mismatch.
pub fn broadcast_strides(
    target: &[usize],
    src_shape: &[usize],
    src_strides: &[isize],
) -> Result<Vec<isize>> {
    if src_strides.len() != src_shape.len() {
        return Err(NdError::StrideLengthMismatch {
            strides: src_strides.len(),
            dims: src_shape.len(),
        });
    }
    if src_shape.len() > target.len() {
        return Err(NdError::RankMismatch(src_shape.len(), target.len()));
    }

    let lead = target.len() - src_shape.len();
    let mut out = vec![0isize; target.len()];
    for i in 0..src_shape.len() {
        let sdim = src_shape[i];
        let tdim = target[lead + i];
        if sdim == tdim {
            out[lead + i] = src_strides[i];
        } else if sdim == 1 {
            out[lead + i] = 0;
        } else {
            return Err(NdError::ShapeMismatch(src_shape.to_vec(), target.to_vec()));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shapes_basic() {
        let out = broadcast_shapes(&[&[2, 3], &[1, 3]]).unwrap();
        assert_eq!(out, vec![2, 3]);
    }

    #[test]
    fn test_broadcast_shapes_right_aligned() {
        let out = broadcast_shapes(&[&[4, 1, 3], &[3]]).unwrap();
        assert_eq!(out, vec![4, 1, 3]);
        let out = broadcast_shapes(&[&[5, 1], &[4], &[1, 1]]).unwrap();
        assert_eq!(out, vec![5, 4]);
    }

    #[test]
    fn test_broadcast_shapes_scalar() {
        // A 0-d shape broadcasts against anything.
        let out = broadcast_shapes(&[&[], &[2, 2]]).unwrap();
        assert_eq!(out, vec![2, 2]);
    }

    #[test]
    fn test_broadcast_shapes_incompatible() {
        assert!(matches!(
            broadcast_shapes(&[&[2, 3], &[4, 3]]),
            Err(NdError::ShapeMismatch(..))
        ));
        assert!(matches!(
            broadcast_shapes(&[]),
            Err(NdError::EmptySignature)
        ));
    }

    #[test]
    fn test_maybe_broadcast_identity() {
        // Already-equal shapes come back as None: no view churn.
        let out = maybe_broadcast_shapes(&[&[2, 3], &[2, 3]]).unwrap();
        assert_eq!(out, None);
        let out = maybe_broadcast_shapes(&[&[2, 3], &[1, 3]]).unwrap();
        assert_eq!(out, Some(vec![2, 3]));
    }

    #[test]
    fn test_broadcast_strides() {
        let out = broadcast_strides(&[2, 3], &[1, 3], &[3, 1]).unwrap();
        assert_eq!(out, vec![0, 1]);
        let out = broadcast_strides(&[4, 3], &[3], &[1]).unwrap();
        assert_eq!(out, vec![0, 1]);
        assert!(broadcast_strides(&[2, 3], &[2, 4], &[4, 1]).is_err());
    }
}
