//! Strided n-dimensional array views over flat buffers.
//!
//! This crate provides the metadata and traversal layer of an ndarray
//! implementation: shapes, strides, offsets, memory orders, a closed data
//! type catalog with promotion and cast-safety rules, zero-copy view
//! transformations, and cache-optimized element-wise traversal engines.
//!
//! # Core Types
//!
//! - [`Buffer`]: dtype-tagged flat storage, produced by the buffer factory
//!   [`Buffer::allocate`]
//! - [`NdView`] / [`NdViewMut`]: strided views over a shared buffer
//! - [`NdArray`]: an owning buffer + metadata pair
//! - [`DataType`] / [`Scalar`]: the closed element type catalog and its
//!   value-level counterpart
//!
//! # Traversal
//!
//! Element-wise operations flow through a single iteration pipeline:
//! dimension fusion, loop-order selection (smallest stride innermost), and
//! cache-targeted block tiling. The same pipeline backs the typed engines
//! ([`fill_into`], [`map_into`], [`zip_map2_into`], [`zip_map_n_into`]),
//! the dtype-heterogeneous accessor engines ([`map_scalar_into`] and
//! friends), and the axis reductions ([`reduce`], [`reduce_axis_into`],
//! [`accumulate_axis_into`]).
//!
//! # Dispatch
//!
//! [`DispatchTable`] routes a runtime dtype signature to a specialized
//! kernel, falling back to a declared default. The built-in operations in
//! [`ops`] show the intended wiring: typed kernels for the common dtypes,
//! an accessor-based generic kernel for everything else.
//!
//! # Example
//!
//! ```rust
//! use ndview::{Buffer, NdArrayLike, NdView, Order, Scalar};
//!
//! let buffer = Buffer::from_f64(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! let view = NdView::new(&buffer, vec![3, 2], vec![2, 1], 0, Order::RowMajor).unwrap();
//!
//! assert_eq!(view.get(&[2, 0]), Scalar::Float64(5.0));
//! let flipped = view.reverse_axis(0).unwrap();
//! assert_eq!(flipped.get(&[0, 0]), Scalar::Float64(5.0));
//!
//! let t = view.transpose().unwrap();
//! assert_eq!(t.shape(), &[2, 3]);
//! assert_eq!(t.get(&[0, 2]), Scalar::Float64(5.0));
//! ```

mod array;
mod block;
pub mod broadcast;
mod buffer;
mod cast;
mod dispatch;
mod dtype;
mod fuse;
mod kernel;
mod map;
pub mod ops;
mod order;
mod promote;
mod reduce;
pub mod shape;
mod view;

pub use array::NdArray;
pub use buffer::{Buffer, Element, Scalar};
pub use cast::{can_cast, CastMode};
pub use dispatch::DispatchTable;
pub use dtype::DataType;
pub use map::{
    fill_into, fill_scalar_into, map_into, map_scalar_into, zip_map2_into, zip_map2_scalar_into,
    zip_map_n_into,
};
pub use promote::{output_data_type, promote, promote_all, OutputPolicy, PolicyKind};
pub use reduce::{
    accumulate_axis_into, accumulate_axis_scalar_into, reduce, reduce_axis_into,
    reduce_axis_scalar_into, reduce_scalar,
};
pub use shape::Order;
pub use view::{NdArrayLike, NdView, NdViewMut};

/// Block memory size for cache-optimized iteration (L1 cache target).
///
/// Traversal is tiled so that each block's memory footprint stays within
/// this size. Default: 32KB (typical L1 data cache size).
pub const BLOCK_MEMORY_SIZE: usize = 32 * 1024;

/// Cache line size in bytes, used when estimating a block's memory region.
pub const CACHE_LINE_SIZE: usize = 64;

/// Errors that can occur during view construction, dtype resolution,
/// traversal, or dispatch.
#[derive(Debug, thiserror::Error)]
pub enum NdError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Array shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Stride array length doesn't match the number of dimensions.
    #[error("stride and shape length mismatch: {strides} strides for {dims} dims")]
    StrideLengthMismatch { strides: usize, dims: usize },

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Transpose requires at least two dimensions.
    #[error("cannot transpose an array of rank {rank}")]
    TransposeRank { rank: usize },

    /// A reachable buffer index falls outside the buffer.
    #[error("view reaches buffer indices {min}..={max}, buffer has length {len}")]
    OutOfBounds { min: isize, max: isize, len: usize },

    /// Integer overflow while computing a buffer offset.
    #[error("offset overflow while computing buffer index")]
    OffsetOverflow,

    /// A data type name that is not in the catalog.
    #[error("unknown data type {0:?}")]
    UnknownDataType(String),

    /// An output data type policy name that is not recognized.
    #[error("unknown output data type policy {0:?}")]
    UnknownPolicy(String),

    /// No common data type exists for the pair under the promotion lattice.
    #[error("data types {0} and {1} have no common promoted type")]
    NoCommonDataType(DataType, DataType),

    /// A policy without the `_and_generic` flag received a generic input.
    #[error("policy {policy:?} does not accept generic inputs")]
    GenericNotAccepted { policy: PolicyKind },

    /// The promoted data type cannot be represented within the policy's
    /// category without loss.
    #[error("data type {actual} cannot be represented in the {policy:?} category")]
    PolicyUnsatisfiable { policy: PolicyKind, actual: DataType },

    /// A data type list was empty where at least one entry is required.
    #[error("empty data type list")]
    EmptySignature,

    /// An operand's data type does not match what the kernel expects.
    #[error("data type mismatch: expected {expected}, got {actual}")]
    DataTypeMismatch { expected: DataType, actual: DataType },

    /// A scalar value could not be represented in the target data type.
    #[error("cannot represent value of type {from} as {to}")]
    CastFailure { from: DataType, to: DataType },

    /// No dispatch table entry matches the signature and no default exists.
    #[error("no kernel registered for data type signature {signature:?}")]
    NoMatchingKernel { signature: Vec<DataType> },

    /// Attempted to write through a read-only view.
    #[error("cannot write through a read-only view")]
    ReadOnlyView,
}

/// Result type for ndview operations.
pub type Result<T> = std::result::Result<T, NdError>;
