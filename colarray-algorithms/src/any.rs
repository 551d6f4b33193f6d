//! Closed set of concrete arrays resolved at runtime.
//!
//! Every combination of layout and scalar type is one variant of
//! [`AnyArray`]. Callers that only know an array at runtime hold it as an
//! `AnyArray` and use [`dispatch!`](crate::dispatch) to reach the concrete
//! array inside, where generic code runs against the resolved type.

use colarray_core::{AosArray, ArrayLayout, GenericArray, ScalarType, SoaArray};
use colarray_periodic::PeriodicArray;

macro_rules! any_array {
    ($($aos:ident, $soa:ident, $periodic:ident => $ty:ty),* $(,)?) => {
        /// An array of any supported layout and scalar type.
        #[derive(Debug)]
        pub enum AnyArray<'a> {
            $(
                #[doc = concat!("Interleaved `", stringify!($ty), "` array.")]
                $aos(AosArray<'a, $ty>),
                #[doc = concat!("Columnar `", stringify!($ty), "` array.")]
                $soa(SoaArray<'a, $ty>),
                #[doc = concat!("Periodic view over `", stringify!($ty), "` tuples.")]
                $periodic(PeriodicArray<'a, $ty>),
            )*
        }

        $(
            impl<'a> From<AosArray<'a, $ty>> for AnyArray<'a> {
                fn from(array: AosArray<'a, $ty>) -> Self {
                    AnyArray::$aos(array)
                }
            }

            impl<'a> From<SoaArray<'a, $ty>> for AnyArray<'a> {
                fn from(array: SoaArray<'a, $ty>) -> Self {
                    AnyArray::$soa(array)
                }
            }

            impl<'a> From<PeriodicArray<'a, $ty>> for AnyArray<'a> {
                fn from(array: PeriodicArray<'a, $ty>) -> Self {
                    AnyArray::$periodic(array)
                }
            }
        )*
    };
}

any_array!(
    AosI8, SoaI8, PeriodicI8 => i8,
    AosU8, SoaU8, PeriodicU8 => u8,
    AosI16, SoaI16, PeriodicI16 => i16,
    AosU16, SoaU16, PeriodicU16 => u16,
    AosI32, SoaI32, PeriodicI32 => i32,
    AosU32, SoaU32, PeriodicU32 => u32,
    AosI64, SoaI64, PeriodicI64 => i64,
    AosU64, SoaU64, PeriodicU64 => u64,
    AosF32, SoaF32, PeriodicF32 => f32,
    AosF64, SoaF64, PeriodicF64 => f64,
);

/// Runs `$body` with `$name` bound to the concrete array inside an
/// [`AnyArray`](crate::AnyArray).
///
/// Works on `AnyArray`, `&AnyArray` and `&mut AnyArray`; the binding mode
/// follows the scrutinee. `$body` is instantiated once per variant, so it
/// must type-check for every layout and scalar type.
#[macro_export]
macro_rules! dispatch {
    ($array:expr, $name:ident => $body:expr) => {
        match $array {
            $crate::AnyArray::AosI8($name) => $body,
            $crate::AnyArray::SoaI8($name) => $body,
            $crate::AnyArray::PeriodicI8($name) => $body,
            $crate::AnyArray::AosU8($name) => $body,
            $crate::AnyArray::SoaU8($name) => $body,
            $crate::AnyArray::PeriodicU8($name) => $body,
            $crate::AnyArray::AosI16($name) => $body,
            $crate::AnyArray::SoaI16($name) => $body,
            $crate::AnyArray::PeriodicI16($name) => $body,
            $crate::AnyArray::AosU16($name) => $body,
            $crate::AnyArray::SoaU16($name) => $body,
            $crate::AnyArray::PeriodicU16($name) => $body,
            $crate::AnyArray::AosI32($name) => $body,
            $crate::AnyArray::SoaI32($name) => $body,
            $crate::AnyArray::PeriodicI32($name) => $body,
            $crate::AnyArray::AosU32($name) => $body,
            $crate::AnyArray::SoaU32($name) => $body,
            $crate::AnyArray::PeriodicU32($name) => $body,
            $crate::AnyArray::AosI64($name) => $body,
            $crate::AnyArray::SoaI64($name) => $body,
            $crate::AnyArray::PeriodicI64($name) => $body,
            $crate::AnyArray::AosU64($name) => $body,
            $crate::AnyArray::SoaU64($name) => $body,
            $crate::AnyArray::PeriodicU64($name) => $body,
            $crate::AnyArray::AosF32($name) => $body,
            $crate::AnyArray::SoaF32($name) => $body,
            $crate::AnyArray::PeriodicF32($name) => $body,
            $crate::AnyArray::AosF64($name) => $body,
            $crate::AnyArray::SoaF64($name) => $body,
            $crate::AnyArray::PeriodicF64($name) => $body,
        }
    };
}

impl AnyArray<'_> {
    /// Runtime scalar tag of the wrapped array.
    #[must_use]
    pub fn scalar_type(&self) -> ScalarType {
        dispatch!(self, array => array.scalar_type())
    }

    /// Layout of the wrapped array.
    #[must_use]
    pub fn layout(&self) -> ArrayLayout {
        dispatch!(self, array => array.layout())
    }

    /// Number of components per tuple.
    #[must_use]
    pub fn number_of_components(&self) -> usize {
        dispatch!(self, array => array.number_of_components())
    }

    /// Number of tuples.
    #[must_use]
    pub fn number_of_tuples(&self) -> usize {
        dispatch!(self, array => array.number_of_tuples())
    }

    /// Total number of scalar values.
    #[must_use]
    pub fn number_of_values(&self) -> usize {
        dispatch!(self, array => array.number_of_values())
    }

    /// Bytes of memory owned by the wrapped array.
    #[must_use]
    pub fn actual_memory_size(&self) -> usize {
        dispatch!(self, array => array.actual_memory_size())
    }

    /// Reads one component widened to double precision.
    #[must_use]
    pub fn component_f64(&self, tuple: usize, component: usize) -> f64 {
        dispatch!(self, array => array.component_f64(tuple, component))
    }

    /// True for views that refuse every mutation.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.layout() == ArrayLayout::Periodic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colarray_periodic::{AngularTransform, Axis, BoxedTransform};

    #[test]
    fn test_tags_follow_variant() {
        let aos: AnyArray = AosArray::from_vec(vec![1_u16, 2, 3, 4], 2).unwrap().into();
        assert_eq!(aos.scalar_type(), ScalarType::U16);
        assert_eq!(aos.layout(), ArrayLayout::Aos);
        assert_eq!(aos.number_of_tuples(), 2);
        assert!(!aos.is_read_only());

        let soa: AnyArray = SoaArray::from_columns(vec![vec![1.5_f32], vec![2.5], vec![3.5]])
            .unwrap()
            .into();
        assert_eq!(soa.scalar_type(), ScalarType::F32);
        assert_eq!(soa.layout(), ArrayLayout::Soa);
        assert_eq!(soa.number_of_components(), 3);
        assert!((soa.component_f64(0, 2) - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_periodic_variant() {
        let source = AosArray::from_vec(vec![1_i64, 0, 0], 3).unwrap();
        let transform: BoxedTransform = Box::new(AngularTransform::new(Axis::Z, 180.0));
        let view = PeriodicArray::with_source(&source, transform);
        let any = AnyArray::from(view);
        assert_eq!(any.scalar_type(), ScalarType::I64);
        assert!(any.is_read_only());
        assert!((any.component_f64(0, 0) + 1.0).abs() < f64::EPSILON);
    }
}
