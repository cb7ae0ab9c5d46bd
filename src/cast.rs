//! Cast-safety predicates.
//!
//! [`can_cast`] answers "may a value of dtype `from` be stored as dtype
//! `to` under a given mode". The modes form a widening sequence: every
//! cast allowed by one mode is allowed by the next.

use std::str::FromStr;

use crate::dtype::DataType;
use crate::promote::promote;
use crate::NdError;

/// How permissive a cast is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    /// Only identical data types.
    None,
    /// Identical data types, plus byte-layout equivalents
    /// (`binary` ↔ `uint8`).
    Equiv,
    /// No precision or range loss: a safe cast exists exactly when the
    /// promotion lattice maps the pair onto the target.
    Safe,
    /// Safe casts plus floating-point downcasts (`float64` → `float32`,
    /// `complex128` → `complex64`, and real → complex of lower component
    /// precision).
    MostlySafe,
    /// Safe casts plus any cast within a single category
    /// (signed ↔ signed, unsigned ↔ unsigned, float ↔ float,
    /// complex ↔ complex).
    SameKind,
    /// Any cast. Value-level conversion may still fail at runtime for
    /// unrepresentable values.
    Unsafe,
}

impl FromStr for CastMode {
    type Err = NdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CastMode::None),
            "equiv" => Ok(CastMode::Equiv),
            "safe" => Ok(CastMode::Safe),
            "mostly-safe" => Ok(CastMode::MostlySafe),
            "same-kind" => Ok(CastMode::SameKind),
            "unsafe" => Ok(CastMode::Unsafe),
            _ => Err(NdError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Whether a value of dtype `from` may be stored as dtype `to` under the
/// given mode.
pub fn can_cast(from: DataType, to: DataType, mode: CastMode) -> bool {
    use DataType::*;

    match mode {
        CastMode::None => from == to,
        CastMode::Equiv => from == to || layout_equivalent(from, to),
        CastMode::Safe => is_safe(from, to),
        CastMode::MostlySafe => {
            is_safe(from, to)
                || matches!(
                    (from, to),
                    (Float64, Float32)
                        | (Complex128, Complex64)
                        | (Float64, Complex64)
                )
        }
        CastMode::SameKind => is_safe(from, to) || same_kind(from, to),
        CastMode::Unsafe => true,
    }
}

// binary and uint8 share a byte-for-byte layout.
fn layout_equivalent(a: DataType, b: DataType) -> bool {
    use DataType::*;
    matches!((a, b), (Binary, Uint8) | (Uint8, Binary))
}

// A safe cast exists exactly when promoting the pair lands on the target.
// Everything casts safely into generic, and byte-layout equivalents lose
// nothing in either direction.
fn is_safe(from: DataType, to: DataType) -> bool {
    to == DataType::Generic || promote(from, to) == Some(to) || layout_equivalent(from, to)
}

fn same_kind(a: DataType, b: DataType) -> bool {
    (a.is_signed_integer() && b.is_signed_integer())
        || (a.is_unsigned_integer() && b.is_unsigned_integer())
        || (a.is_real_floating_point() && b.is_real_floating_point())
        || (a.is_complex_floating_point() && b.is_complex_floating_point())
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataType::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("none".parse::<CastMode>().unwrap(), CastMode::None);
        assert_eq!(
            "mostly-safe".parse::<CastMode>().unwrap(),
            CastMode::MostlySafe
        );
        assert!("sorta-safe".parse::<CastMode>().is_err());
    }

    #[test]
    fn test_none_requires_equality() {
        assert!(can_cast(Float64, Float64, CastMode::None));
        assert!(!can_cast(Float32, Float64, CastMode::None));
    }

    #[test]
    fn test_equiv() {
        assert!(can_cast(Binary, Uint8, CastMode::Equiv));
        assert!(can_cast(Uint8, Binary, CastMode::Equiv));
        assert!(!can_cast(Uint8, Int8, CastMode::Equiv));
    }

    #[test]
    fn test_safe() {
        assert!(can_cast(Int8, Int32, CastMode::Safe));
        assert!(can_cast(Uint16, Int32, CastMode::Safe));
        assert!(can_cast(Float32, Float64, CastMode::Safe));
        assert!(can_cast(Float32, Complex64, CastMode::Safe));
        assert!(can_cast(Bool, Int8, CastMode::Safe));
        assert!(can_cast(Int32, Generic, CastMode::Safe));
        assert!(can_cast(Binary, Uint8, CastMode::Safe));
        // Lossy directions are rejected.
        assert!(!can_cast(Int32, Int8, CastMode::Safe));
        assert!(!can_cast(Float64, Float32, CastMode::Safe));
        assert!(!can_cast(Int32, Float32, CastMode::Safe));
        assert!(!can_cast(Int8, Uint8, CastMode::Safe));
        assert!(!can_cast(Complex64, Float32, CastMode::Safe));
        assert!(!can_cast(Binary, Int8, CastMode::Safe));
    }

    #[test]
    fn test_mostly_safe_adds_float_downcasts() {
        assert!(can_cast(Float64, Float32, CastMode::MostlySafe));
        assert!(can_cast(Complex128, Complex64, CastMode::MostlySafe));
        assert!(can_cast(Float64, Complex64, CastMode::MostlySafe));
        // Still no integer truncation.
        assert!(!can_cast(Int32, Int8, CastMode::MostlySafe));
        assert!(!can_cast(Complex64, Float64, CastMode::MostlySafe));
    }

    #[test]
    fn test_same_kind() {
        assert!(can_cast(Int32, Int8, CastMode::SameKind));
        assert!(can_cast(Uint32, Uint8, CastMode::SameKind));
        assert!(can_cast(Float64, Float32, CastMode::SameKind));
        assert!(can_cast(Complex128, Complex64, CastMode::SameKind));
        // Crossing a category boundary is not same-kind.
        assert!(!can_cast(Int8, Uint8, CastMode::SameKind));
        assert!(!can_cast(Complex64, Float64, CastMode::SameKind));
        // But safe casts remain allowed.
        assert!(can_cast(Int8, Float32, CastMode::SameKind));
    }

    #[test]
    fn test_unsafe_allows_everything() {
        for from in DataType::ALL {
            for to in DataType::ALL {
                assert!(can_cast(from, to, CastMode::Unsafe));
            }
        }
    }

    #[test]
    fn test_modes_widen() {
        let modes = [
            CastMode::None,
            CastMode::Equiv,
            CastMode::Safe,
            CastMode::MostlySafe,
            CastMode::Unsafe,
        ];
        for w in modes.windows(2) {
            for from in DataType::ALL {
                for to in DataType::ALL {
                    if can_cast(from, to, w[0]) {
                        assert!(
                            can_cast(from, to, w[1]),
                            "{from}->{to} allowed by {:?} but not {:?}",
                            w[0],
                            w[1]
                        );
                    }
                }
            }
        }
    }
}
