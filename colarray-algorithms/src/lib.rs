//! colarray-algorithms: Operations over arrays whose type is known only at runtime.
//!
//! This crate provides:
//! - **`AnyArray`** - every layout and scalar type as one enum, with [`dispatch!`]
//! - **Tuple helpers** - `set_tuple` / `get_tuple` between any two arrays
//! - **Conversion** - deep copies between interleaved and columnar layouts
//! - **Ranges** - component and magnitude ranges, parallel with rayon
//!
#![warn(missing_docs)]

mod any;
mod convert;
mod helpers;
mod range;

pub use any::AnyArray;
pub use convert::{deep_copy_to_aos, deep_copy_to_soa, LayoutConvert};
pub use helpers::{
    copy_tuple, get_tuple, get_tuple_range, get_tuples, set_tuple, set_tuple_converting,
};
pub use range::{component_range, magnitude_range, tuple_magnitude, RangeConfig, RangeScan};

// Re-export the array types callers wrap into `AnyArray`
pub use colarray_core::{AosArray, ArrayLayout, Error, GenericArray, Result, ScalarType, SoaArray};
pub use colarray_periodic::PeriodicArray;
