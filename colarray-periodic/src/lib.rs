//! colarray-periodic: Read-only transformed views over interleaved arrays.
//!
//! A [`PeriodicArray`] presents every tuple of a source [`AosArray`] after a
//! geometric mapping without materializing the transformed data. The built-in
//! [`AngularTransform`] rotates points and tensors about a coordinate axis;
//! any [`TupleTransform`] can be plugged in.
//!
//! Views keep a single-tuple cache and a cached range behind interior
//! mutability, so they are `Send` but not `Sync`.
//!
//! [`AosArray`]: colarray_core::AosArray

pub mod transform;
pub mod view;

pub use transform::{
    AngularPeriodicConfig, AngularTransform, Axis, BoxedTransform, FnTransform, TupleTransform,
};
pub use view::PeriodicArray;
