//! Data type promotion and output-type policy resolution.
//!
//! [`promote`] implements the pairwise promotion lattice: the smallest
//! catalog type in which both operands are representable without precision
//! loss. The catalog has no 64-bit integers, so integer pairings whose
//! exact result would need one (`int32 × uint32`, `uint32 × uint32` with a
//! signed partner, 32-bit integers mixed with `float32`) promote to
//! `Float64` instead. The full table is pinned by the tests below.
//!
//! [`output_data_type`] sits above the lattice and resolves the dtype of an
//! operation's output buffer from its input dtypes and a named policy.
//! "No promoted type exists" is data-dependent and reported as
//! [`NdError::NoCommonDataType`]; a malformed policy name is a programming
//! error and reported as [`NdError::UnknownPolicy`] at parse time. The two
//! are deliberately distinct.

use std::str::FromStr;

use crate::dtype::DataType;
use crate::{NdError, Result};

/// Promote two data types to their smallest common representation.
///
/// Commutative; associative on any totally ordered chain of the lattice.
/// Returns `None` when no common type exists (`binary` with anything other
/// than itself). `Generic` absorbs every partner; whether that is accepted
/// is decided by the policy layer, not here.
pub fn promote(a: DataType, b: DataType) -> Option<DataType> {
    use DataType::*;

    if a == b {
        return Some(a);
    }
    if a == Generic || b == Generic {
        return Some(Generic);
    }
    if a == Binary || b == Binary {
        return None;
    }
    if a == Bool {
        return Some(b);
    }
    if b == Bool {
        return Some(a);
    }

    if a.is_complex_floating_point() || b.is_complex_floating_point() {
        return Some(promote_complex(a, b));
    }
    if a.is_real_floating_point() || b.is_real_floating_point() {
        return Some(promote_real_float(a, b));
    }
    Some(promote_integers(a, b))
}

/// Fold [`promote`] over a list of data types.
pub fn promote_all(dtypes: &[DataType]) -> Option<DataType> {
    let mut iter = dtypes.iter().copied();
    let first = iter.next()?;
    iter.try_fold(first, promote)
}

// At least one side is complex. The result is complex, with component
// precision wide enough for both operands.
fn promote_complex(a: DataType, b: DataType) -> DataType {
    use DataType::*;
    let needs_double = |d: DataType| match d {
        Complex128 | Float64 | Int32 | Uint32 => true,
        Complex64 | Float32 | Int8 | Int16 | Uint8 | Uint16 => false,
        _ => unreachable!("non-numeric type in complex promotion"),
    };
    if needs_double(a) || needs_double(b) {
        Complex128
    } else {
        Complex64
    }
}

// At least one side is a real float, the other real.
fn promote_real_float(a: DataType, b: DataType) -> DataType {
    use DataType::*;
    // float32 holds every integer of width < 32 exactly; 32-bit integers
    // and float64 force double precision.
    let needs_double = |d: DataType| matches!(d, Float64 | Int32 | Uint32);
    if needs_double(a) || needs_double(b) {
        Float64
    } else {
        Float32
    }
}

// Both sides are integers.
fn promote_integers(a: DataType, b: DataType) -> DataType {
    let width = |d: DataType| d.byte_width().unwrap();

    match (a.is_signed_integer(), b.is_signed_integer()) {
        (true, true) | (false, false) => {
            if width(a) >= width(b) {
                a
            } else {
                b
            }
        }
        // Mixed signedness: the smallest signed type that contains the
        // unsigned operand's full range, or float64 when none exists.
        (true, false) => promote_mixed_sign(a, b),
        (false, true) => promote_mixed_sign(b, a),
    }
}

fn promote_mixed_sign(signed: DataType, unsigned: DataType) -> DataType {
    use DataType::*;
    let containing = match unsigned {
        Uint8 => Int16,
        Uint16 => Int32,
        Uint32 => return Float64,
        _ => unreachable!("unsigned operand expected"),
    };
    if signed.byte_width().unwrap() >= containing.byte_width().unwrap() {
        signed
    } else {
        containing
    }
}

/// The policy family, without the `_and_generic` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// All inputs must share one dtype, which is returned unchanged.
    Same,
    /// Pairwise promotion across all inputs.
    Promoted,
    /// Output is always `bool`.
    Boolean,
    /// Promoted result constrained to a real type.
    Real,
    /// Promoted result constrained to floating point (real or complex).
    FloatingPoint,
    /// Promoted result constrained to complex floating point.
    ComplexFloatingPoint,
    /// Promoted result constrained to an integer type.
    Integer,
    /// Promoted result constrained to a signed integer type.
    SignedInteger,
    /// Promoted result constrained to an unsigned integer type.
    UnsignedInteger,
    /// Promoted result constrained to any numeric type.
    Numeric,
    /// The crate default dtype (`float64`) regardless of inputs.
    Default,
}

/// An output data type policy: a [`PolicyKind`] plus whether `generic`
/// inputs are accepted and propagated (`*_and_generic` policy names).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPolicy {
    pub kind: PolicyKind,
    pub and_generic: bool,
}

impl OutputPolicy {
    pub const fn new(kind: PolicyKind) -> Self {
        OutputPolicy {
            kind,
            and_generic: false,
        }
    }

    pub const fn and_generic(kind: PolicyKind) -> Self {
        OutputPolicy {
            kind,
            and_generic: true,
        }
    }
}

impl FromStr for OutputPolicy {
    type Err = NdError;

    fn from_str(s: &str) -> Result<Self> {
        let (base, and_generic) = match s.strip_suffix("_and_generic") {
            Some(base) => (base, true),
            None => (s, false),
        };
        let kind = match base {
            "same" => PolicyKind::Same,
            "promoted" => PolicyKind::Promoted,
            "boolean" => PolicyKind::Boolean,
            "real" => PolicyKind::Real,
            "floating_point" => PolicyKind::FloatingPoint,
            "complex_floating_point" => PolicyKind::ComplexFloatingPoint,
            "integer" => PolicyKind::Integer,
            "signed_integer" => PolicyKind::SignedInteger,
            "unsigned_integer" => PolicyKind::UnsignedInteger,
            "numeric" => PolicyKind::Numeric,
            "default" => PolicyKind::Default,
            _ => return Err(NdError::UnknownPolicy(s.to_string())),
        };
        Ok(OutputPolicy { kind, and_generic })
    }
}

/// Resolve the output data type for a list of input dtypes under a policy.
///
/// Category policies first promote the inputs, then map the promoted type
/// to the nearest representative inside the category; a promoted type the
/// category cannot represent without loss (a float under `integer`, a
/// complex under `real`) is a [`NdError::PolicyUnsatisfiable`] failure,
/// never a silent truncation.
pub fn output_data_type(inputs: &[DataType], policy: OutputPolicy) -> Result<DataType> {
    use DataType::*;
    use PolicyKind::*;

    if inputs.is_empty() {
        return Err(NdError::EmptySignature);
    }

    if inputs.contains(&Generic) {
        if policy.and_generic {
            return Ok(Generic);
        }
        return Err(NdError::GenericNotAccepted {
            policy: policy.kind,
        });
    }

    if policy.kind == Same {
        let first = inputs[0];
        for &d in &inputs[1..] {
            if d != first {
                return Err(NdError::DataTypeMismatch {
                    expected: first,
                    actual: d,
                });
            }
        }
        return Ok(first);
    }

    if policy.kind == Default {
        return Ok(Float64);
    }

    if policy.kind == Boolean {
        for &d in inputs {
            if !(d.is_numeric() || d.is_boolean()) {
                return Err(NdError::PolicyUnsatisfiable {
                    policy: policy.kind,
                    actual: d,
                });
            }
        }
        return Ok(Bool);
    }

    let mut promoted = inputs[0];
    for &d in &inputs[1..] {
        promoted = promote(promoted, d).ok_or(NdError::NoCommonDataType(promoted, d))?;
    }

    let unsatisfiable = |actual: DataType| NdError::PolicyUnsatisfiable {
        policy: policy.kind,
        actual,
    };

    match policy.kind {
        Promoted => Ok(promoted),
        Real => match promoted {
            d if d.is_real() => Ok(d),
            Bool => Ok(Int32),
            d => Err(unsatisfiable(d)),
        },
        FloatingPoint => match promoted {
            d if d.is_floating_point() => Ok(d),
            d if d.is_integer() || d.is_boolean() => Ok(Float64),
            d => Err(unsatisfiable(d)),
        },
        ComplexFloatingPoint => match promoted {
            d if d.is_complex_floating_point() => Ok(d),
            Float32 => Ok(Complex64),
            Float64 => Ok(Complex128),
            d if d.is_integer() || d.is_boolean() => Ok(Complex128),
            d => Err(unsatisfiable(d)),
        },
        Integer => match promoted {
            d if d.is_integer() => Ok(d),
            Bool => Ok(Int32),
            d => Err(unsatisfiable(d)),
        },
        SignedInteger => match promoted {
            d if d.is_signed_integer() => Ok(d),
            Bool => Ok(Int32),
            Uint8 => Ok(Int16),
            Uint16 => Ok(Int32),
            d => Err(unsatisfiable(d)),
        },
        UnsignedInteger => match promoted {
            d if d.is_unsigned_integer() => Ok(d),
            Bool => Ok(Uint32),
            d => Err(unsatisfiable(d)),
        },
        Numeric => match promoted {
            d if d.is_numeric() => Ok(d),
            Bool => Ok(Int32),
            d => Err(unsatisfiable(d)),
        },
        Same | Default | Boolean => unreachable!("handled above"),
    }
}
