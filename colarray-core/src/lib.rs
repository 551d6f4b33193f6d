//! colarray-core: Typed tuple arrays with interchangeable storage layouts.
//!
//! This crate provides the storage primitives: typed buffers that own or
//! borrow memory, the [`GenericArray`] tuple access contract, and its two
//! physical layouts, interleaved ([`AosArray`]) and columnar ([`SoaArray`]).
//!
//! Arrays hold no hidden shared state beyond their buffers: concurrent reads
//! are safe, writers must be serialized by the caller.

pub mod aos;
pub mod array;
pub mod buffer;
pub mod error;
pub mod range;
pub mod scalar;
pub mod soa;

pub use aos::AosArray;
pub use array::{split_value_index, ArrayLayout, GenericArray};
pub use buffer::{Ownership, Release, TypedBuffer};
pub use error::{Error, Result};
pub use range::{component_range, component_ranges, magnitude, magnitude_range, RangeAccumulator};
pub use scalar::{Scalar, ScalarType};
pub use soa::SoaArray;
