//! Dtype-tagged flat storage and the accessor protocol.
//!
//! A [`Buffer`] owns one contiguous `Vec` of elements, tagged by its
//! [`DataType`]. Views never own buffers; they borrow them, and several
//! views may alias one buffer with different shapes, strides, and offsets.
//!
//! [`Scalar`] is the value-level counterpart of `DataType` and the currency
//! of the accessor protocol: [`Buffer::get`] / [`Buffer::set`] move single
//! elements in and out of any buffer regardless of its dtype. Typed engines
//! bypass the protocol entirely through the [`Element`] trait, which maps a
//! Rust element type to its buffer variant and exposes the backing slice.

use num_complex::Complex;
use num_traits::ToPrimitive;

use crate::dtype::DataType;
use crate::{NdError, Result};

/// A single element value, tagged with its data type.
///
/// `Generic` boxes an arbitrary nested scalar; it is how untyped elements
/// travel through the accessor protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Float32(f32),
    Float64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),
    Binary(u8),
    Generic(Box<Scalar>),
}

impl Scalar {
    /// The data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Bool(_) => DataType::Bool,
            Scalar::Int8(_) => DataType::Int8,
            Scalar::Int16(_) => DataType::Int16,
            Scalar::Int32(_) => DataType::Int32,
            Scalar::Uint8(_) => DataType::Uint8,
            Scalar::Uint16(_) => DataType::Uint16,
            Scalar::Uint32(_) => DataType::Uint32,
            Scalar::Float32(_) => DataType::Float32,
            Scalar::Float64(_) => DataType::Float64,
            Scalar::Complex64(_) => DataType::Complex64,
            Scalar::Complex128(_) => DataType::Complex128,
            Scalar::Binary(_) => DataType::Binary,
            Scalar::Generic(_) => DataType::Generic,
        }
    }

    /// The zero value of a data type. For `Generic` this is a boxed
    /// `float64` zero, matching what [`Buffer::allocate`] fills with.
    pub fn zero(dtype: DataType) -> Scalar {
        match dtype {
            DataType::Bool => Scalar::Bool(false),
            DataType::Int8 => Scalar::Int8(0),
            DataType::Int16 => Scalar::Int16(0),
            DataType::Int32 => Scalar::Int32(0),
            DataType::Uint8 => Scalar::Uint8(0),
            DataType::Uint16 => Scalar::Uint16(0),
            DataType::Uint32 => Scalar::Uint32(0),
            DataType::Float32 => Scalar::Float32(0.0),
            DataType::Float64 => Scalar::Float64(0.0),
            DataType::Complex64 => Scalar::Complex64(Complex::new(0.0, 0.0)),
            DataType::Complex128 => Scalar::Complex128(Complex::new(0.0, 0.0)),
            DataType::Binary => Scalar::Binary(0),
            DataType::Generic => Scalar::Generic(Box::new(Scalar::Float64(0.0))),
        }
    }

    // Real-valued projection. A complex scalar contributes its real part;
    // booleans become 0/1; generic unboxes.
    fn to_f64(&self) -> f64 {
        match self {
            Scalar::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Int8(v) => *v as f64,
            Scalar::Int16(v) => *v as f64,
            Scalar::Int32(v) => *v as f64,
            Scalar::Uint8(v) => *v as f64,
            Scalar::Uint16(v) => *v as f64,
            Scalar::Uint32(v) => *v as f64,
            Scalar::Float32(v) => *v as f64,
            Scalar::Float64(v) => *v,
            Scalar::Complex64(v) => v.re as f64,
            Scalar::Complex128(v) => v.re,
            Scalar::Binary(v) => *v as f64,
            Scalar::Generic(inner) => inner.to_f64(),
        }
    }

    fn to_complex(&self) -> Complex<f64> {
        match self {
            Scalar::Complex64(v) => Complex::new(v.re as f64, v.im as f64),
            Scalar::Complex128(v) => *v,
            Scalar::Generic(inner) => inner.to_complex(),
            other => Complex::new(other.to_f64(), 0.0),
        }
    }

    /// Convert this value to another data type.
    ///
    /// The conversion uses value semantics, not cast-safety tables: a
    /// complex scalar keeps its real part when cast to a real type,
    /// fractional floats truncate toward zero when cast to integers, and
    /// booleans map to 0/1. Returns `None` when the value is out of range
    /// for the target (e.g. `1e20` into `int32`); use
    /// [`crate::can_cast`] to vet the dtype pair beforehand.
    pub fn cast(&self, to: DataType) -> Option<Scalar> {
        let v = match to {
            DataType::Bool => Scalar::Bool(self.to_f64() != 0.0),
            DataType::Int8 => Scalar::Int8(self.to_f64().to_i8()?),
            DataType::Int16 => Scalar::Int16(self.to_f64().to_i16()?),
            DataType::Int32 => Scalar::Int32(self.to_f64().to_i32()?),
            DataType::Uint8 => Scalar::Uint8(self.to_f64().to_u8()?),
            DataType::Uint16 => Scalar::Uint16(self.to_f64().to_u16()?),
            DataType::Uint32 => Scalar::Uint32(self.to_f64().to_u32()?),
            DataType::Float32 => Scalar::Float32(self.to_f64() as f32),
            DataType::Float64 => Scalar::Float64(self.to_f64()),
            DataType::Complex64 => {
                let c = self.to_complex();
                Scalar::Complex64(Complex::new(c.re as f32, c.im as f32))
            }
            DataType::Complex128 => Scalar::Complex128(self.to_complex()),
            DataType::Binary => Scalar::Binary(self.to_f64().to_u8()?),
            DataType::Generic => Scalar::Generic(Box::new(self.clone())),
        };
        Some(v)
    }
}

/// Flat, contiguous, dtype-tagged storage.
///
/// The only way this crate creates storage is [`Buffer::allocate`]: a
/// zero-initialized, contiguous block of `len` elements of the dtype's
/// width, or a boxed-scalar array for `generic`.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f32>>),
    Complex128(Vec<Complex<f64>>),
    Binary(Vec<u8>),
    Generic(Vec<Scalar>),
}

impl Buffer {
    /// The buffer factory: zero-initialized contiguous storage for `len`
    /// elements of the given data type.
    pub fn allocate(dtype: DataType, len: usize) -> Buffer {
        match dtype {
            DataType::Bool => Buffer::Bool(vec![false; len]),
            DataType::Int8 => Buffer::Int8(vec![0; len]),
            DataType::Int16 => Buffer::Int16(vec![0; len]),
            DataType::Int32 => Buffer::Int32(vec![0; len]),
            DataType::Uint8 => Buffer::Uint8(vec![0; len]),
            DataType::Uint16 => Buffer::Uint16(vec![0; len]),
            DataType::Uint32 => Buffer::Uint32(vec![0; len]),
            DataType::Float32 => Buffer::Float32(vec![0.0; len]),
            DataType::Float64 => Buffer::Float64(vec![0.0; len]),
            DataType::Complex64 => Buffer::Complex64(vec![Complex::new(0.0, 0.0); len]),
            DataType::Complex128 => Buffer::Complex128(vec![Complex::new(0.0, 0.0); len]),
            DataType::Binary => Buffer::Binary(vec![0; len]),
            DataType::Generic => Buffer::Generic(vec![Scalar::Float64(0.0); len]),
        }
    }

    /// Wrap an owned `Vec` of a primitive element type.
    pub fn from_vec<T: Element>(data: Vec<T>) -> Buffer {
        T::into_buffer(data)
    }

    /// Convenience constructor for `float64` data.
    pub fn from_f64(data: Vec<f64>) -> Buffer {
        Buffer::Float64(data)
    }

    /// The data type of the stored elements.
    pub fn data_type(&self) -> DataType {
        match self {
            Buffer::Bool(_) => DataType::Bool,
            Buffer::Int8(_) => DataType::Int8,
            Buffer::Int16(_) => DataType::Int16,
            Buffer::Int32(_) => DataType::Int32,
            Buffer::Uint8(_) => DataType::Uint8,
            Buffer::Uint16(_) => DataType::Uint16,
            Buffer::Uint32(_) => DataType::Uint32,
            Buffer::Float32(_) => DataType::Float32,
            Buffer::Float64(_) => DataType::Float64,
            Buffer::Complex64(_) => DataType::Complex64,
            Buffer::Complex128(_) => DataType::Complex128,
            Buffer::Binary(_) => DataType::Binary,
            Buffer::Generic(_) => DataType::Generic,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Buffer::Bool(v) => v.len(),
            Buffer::Int8(v) => v.len(),
            Buffer::Int16(v) => v.len(),
            Buffer::Int32(v) => v.len(),
            Buffer::Uint8(v) => v.len(),
            Buffer::Uint16(v) => v.len(),
            Buffer::Uint32(v) => v.len(),
            Buffer::Float32(v) => v.len(),
            Buffer::Float64(v) => v.len(),
            Buffer::Complex64(v) => v.len(),
            Buffer::Complex128(v) => v.len(),
            Buffer::Binary(v) => v.len(),
            Buffer::Generic(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one element through the accessor protocol.
    ///
    /// For a `generic` buffer this returns the stored scalar as-is, which
    /// may carry any data type.
    ///
    /// # Panics
    /// Panics if `index` is out of range. Validated views guarantee every
    /// reachable index is in range, so engines do not re-check.
    pub fn get(&self, index: usize) -> Scalar {
        match self {
            Buffer::Bool(v) => Scalar::Bool(v[index]),
            Buffer::Int8(v) => Scalar::Int8(v[index]),
            Buffer::Int16(v) => Scalar::Int16(v[index]),
            Buffer::Int32(v) => Scalar::Int32(v[index]),
            Buffer::Uint8(v) => Scalar::Uint8(v[index]),
            Buffer::Uint16(v) => Scalar::Uint16(v[index]),
            Buffer::Uint32(v) => Scalar::Uint32(v[index]),
            Buffer::Float32(v) => Scalar::Float32(v[index]),
            Buffer::Float64(v) => Scalar::Float64(v[index]),
            Buffer::Complex64(v) => Scalar::Complex64(v[index]),
            Buffer::Complex128(v) => Scalar::Complex128(v[index]),
            Buffer::Binary(v) => Scalar::Binary(v[index]),
            Buffer::Generic(v) => v[index].clone(),
        }
    }

    /// Write one element through the accessor protocol.
    ///
    /// The value is cast to the buffer's data type first; an
    /// unrepresentable value is a [`NdError::CastFailure`]. A `generic`
    /// buffer stores the scalar unchanged.
    ///
    /// # Panics
    /// Panics if `index` is out of range, as with [`Buffer::get`].
    pub fn set(&mut self, index: usize, value: Scalar) -> Result<()> {
        if let Buffer::Generic(v) = self {
            v[index] = value;
            return Ok(());
        }
        let dtype = self.data_type();
        let cast = value.cast(dtype).ok_or(NdError::CastFailure {
            from: value.data_type(),
            to: dtype,
        })?;
        match (self, cast) {
            (Buffer::Bool(v), Scalar::Bool(x)) => v[index] = x,
            (Buffer::Int8(v), Scalar::Int8(x)) => v[index] = x,
            (Buffer::Int16(v), Scalar::Int16(x)) => v[index] = x,
            (Buffer::Int32(v), Scalar::Int32(x)) => v[index] = x,
            (Buffer::Uint8(v), Scalar::Uint8(x)) => v[index] = x,
            (Buffer::Uint16(v), Scalar::Uint16(x)) => v[index] = x,
            (Buffer::Uint32(v), Scalar::Uint32(x)) => v[index] = x,
            (Buffer::Float32(v), Scalar::Float32(x)) => v[index] = x,
            (Buffer::Float64(v), Scalar::Float64(x)) => v[index] = x,
            (Buffer::Complex64(v), Scalar::Complex64(x)) => v[index] = x,
            (Buffer::Complex128(v), Scalar::Complex128(x)) => v[index] = x,
            (Buffer::Binary(v), Scalar::Binary(x)) => v[index] = x,
            _ => unreachable!("cast produced a mismatched scalar"),
        }
        Ok(())
    }

    /// Raw bytes of a pod buffer, or `None` for `bool` and `generic`
    /// storage which have no stable byte layout.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Buffer::Int8(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Int16(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Int32(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Uint8(v) | Buffer::Binary(v) => Some(v.as_slice()),
            Buffer::Uint16(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Uint32(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Float32(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Float64(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Complex64(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Complex128(v) => Some(bytemuck::cast_slice(v)),
            Buffer::Bool(_) | Buffer::Generic(_) => None,
        }
    }
}

/// A Rust element type backed by a typed buffer variant.
///
/// This is the seam between the dynamic layer and the typed traversal
/// engines: given a buffer of the matching dtype, an `Element` exposes the
/// backing slice for direct strided indexing.
pub trait Element: Copy + 'static {
    /// The catalog entry this element type stores as.
    const DATA_TYPE: DataType;

    /// Borrow the backing slice when the buffer holds this element type.
    fn from_buffer(buffer: &Buffer) -> Option<&[Self]>;

    /// Mutably borrow the backing slice when the buffer holds this
    /// element type.
    fn from_buffer_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;

    /// Wrap an owned vector into the matching buffer variant.
    fn into_buffer(data: Vec<Self>) -> Buffer;

    /// Lift a value into the accessor protocol.
    fn to_scalar(self) -> Scalar;

    /// Lower a scalar into this element type, casting by value.
    fn from_scalar(value: &Scalar) -> Option<Self>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$variant;

            fn from_buffer(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn from_buffer_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                match buffer {
                    Buffer::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn into_buffer(data: Vec<Self>) -> Buffer {
                Buffer::$variant(data)
            }

            fn to_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            fn from_scalar(value: &Scalar) -> Option<Self> {
                match value.cast(DataType::$variant)? {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool);
impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(u8, Uint8);
impl_element!(u16, Uint16);
impl_element!(u32, Uint32);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
impl_element!(Complex<f32>, Complex64);
impl_element!(Complex<f64>, Complex128);
