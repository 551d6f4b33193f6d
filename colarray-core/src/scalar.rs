//! Scalar element types and their runtime type tags.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runtime tag identifying the element type stored by an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Short lowercase name, matching the Rust primitive.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Returns true for the integer tags.
    #[must_use]
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type of a typed array.
///
/// Implemented for the ten primitive numeric types. Conversions follow Rust's
/// `as` semantics: float to integer saturates, integer to integer truncates.
pub trait Scalar:
    Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Tag reported by arrays storing this type.
    const SCALAR_TYPE: ScalarType;

    /// Widens the value to double precision.
    fn to_f64(self) -> f64;

    /// Converts from double precision.
    fn from_f64(value: f64) -> Self;

    /// Widens the value to a 128-bit integer.
    fn to_i128(self) -> i128;

    /// Converts from a 128-bit integer.
    fn from_i128(value: i128) -> Self;

    /// Converts between any two scalar types.
    ///
    /// Integer to integer conversions go through `i128` so 64-bit values keep
    /// every bit up to the final truncation.
    #[inline]
    fn cast<T: Scalar>(self) -> T {
        if Self::SCALAR_TYPE.is_integral() && T::SCALAR_TYPE.is_integral() {
            T::from_i128(self.to_i128())
        } else {
            T::from_f64(self.to_f64())
        }
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SCALAR_TYPE: ScalarType = ScalarType::$tag;

                #[inline]
                #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_lossless
                )]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
                fn to_i128(self) -> i128 {
                    self as i128
                }

                #[inline]
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss,
                    clippy::cast_possible_wrap
                )]
                fn from_i128(value: i128) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_scalar!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_tags() {
        assert_eq!(<f32 as Scalar>::SCALAR_TYPE, ScalarType::F32);
        assert_eq!(<u16 as Scalar>::SCALAR_TYPE, ScalarType::U16);
        assert_eq!(ScalarType::I64.size_in_bytes(), 8);
        assert!(ScalarType::U8.is_integral());
        assert!(!ScalarType::F64.is_integral());
        assert_eq!(ScalarType::F64.to_string(), "f64");
    }

    #[test]
    fn test_cast_semantics() {
        assert_eq!(3.9_f64.cast::<i32>(), 3);
        assert_eq!((-1.0_f64).cast::<u8>(), 0);
        assert_eq!(300_i32.cast::<u8>(), 44);
        assert_eq!(u64::MAX.cast::<u64>(), u64::MAX);
        assert_eq!((i64::MAX - 1).cast::<i64>(), i64::MAX - 1);
        assert!((1.5_f32.cast::<f64>() - 1.5).abs() < f64::EPSILON);
    }
}
