//! The closed data type catalog.
//!
//! Every element type a buffer can hold is a [`DataType`] variant. The
//! catalog is immutable and built into the binary: names, abbreviations,
//! byte widths, and category membership are `const` lookups, never mutated
//! at runtime. Enum discriminants are implementation-internal and must not
//! be persisted or compared across builds.

use std::fmt;
use std::str::FromStr;

use crate::NdError;

/// An element data type.
///
/// The set is closed: real and complex floating point, fixed-width signed
/// and unsigned integers, booleans, raw bytes (`Binary`), and `Generic`
/// for boxed values with no fixed layout. There are no 64-bit integer
/// types; pairings whose exact result would need one promote to `Float64`
/// instead (see the promotion table in [`crate::promote`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Binary,
    Generic,
}

impl DataType {
    /// Every data type in the catalog, in no meaningful order.
    pub const ALL: [DataType; 13] = [
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Float32,
        DataType::Float64,
        DataType::Complex64,
        DataType::Complex128,
        DataType::Binary,
        DataType::Generic,
    ];

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
            DataType::Binary => "binary",
            DataType::Generic => "generic",
        }
    }

    /// Single-character abbreviation, usable in compact signatures.
    pub const fn abbrev(self) -> char {
        match self {
            DataType::Bool => 'x',
            DataType::Int8 => 's',
            DataType::Int16 => 'k',
            DataType::Int32 => 'i',
            DataType::Uint8 => 'b',
            DataType::Uint16 => 't',
            DataType::Uint32 => 'u',
            DataType::Float32 => 'f',
            DataType::Float64 => 'd',
            DataType::Complex64 => 'c',
            DataType::Complex128 => 'z',
            DataType::Binary => 'r',
            DataType::Generic => 'o',
        }
    }

    /// Width of one element in bytes, or `None` for `Generic` which has no
    /// fixed width.
    pub const fn byte_width(self) -> Option<usize> {
        match self {
            DataType::Bool | DataType::Int8 | DataType::Uint8 | DataType::Binary => Some(1),
            DataType::Int16 | DataType::Uint16 => Some(2),
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => Some(4),
            DataType::Float64 | DataType::Complex64 => Some(8),
            DataType::Complex128 => Some(16),
            DataType::Generic => None,
        }
    }

    /// Look up a data type by canonical name. Returns `None` for names not
    /// in the catalog; use the `FromStr` impl for an error-carrying parse.
    pub fn from_name(name: &str) -> Option<DataType> {
        DataType::ALL.iter().copied().find(|d| d.name() == name)
    }

    /// Look up a data type by single-character abbreviation.
    pub fn from_abbrev(ch: char) -> Option<DataType> {
        DataType::ALL.iter().copied().find(|d| d.abbrev() == ch)
    }

    pub const fn is_boolean(self) -> bool {
        matches!(self, DataType::Bool)
    }

    pub const fn is_signed_integer(self) -> bool {
        matches!(self, DataType::Int8 | DataType::Int16 | DataType::Int32)
    }

    pub const fn is_unsigned_integer(self) -> bool {
        matches!(self, DataType::Uint8 | DataType::Uint16 | DataType::Uint32)
    }

    pub const fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Real floating point (`float32`, `float64`).
    pub const fn is_real_floating_point(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub const fn is_complex_floating_point(self) -> bool {
        matches!(self, DataType::Complex64 | DataType::Complex128)
    }

    /// Floating point of either kind, real or complex.
    pub const fn is_floating_point(self) -> bool {
        self.is_real_floating_point() || self.is_complex_floating_point()
    }

    /// Real-valued numeric: integers and real floating point.
    pub const fn is_real(self) -> bool {
        self.is_integer() || self.is_real_floating_point()
    }

    /// Any numeric type: integers, real and complex floating point.
    pub const fn is_numeric(self) -> bool {
        self.is_real() || self.is_complex_floating_point()
    }

    /// Whether a typed `Vec` backs this data type (everything except
    /// `Generic`, whose elements are boxed).
    pub const fn is_primitive(self) -> bool {
        !matches!(self, DataType::Generic)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = NdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::from_name(s).ok_or_else(|| NdError::UnknownDataType(s.to_string()))
    }
}
