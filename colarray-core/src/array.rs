//! The tuple access contract shared by every array layout.
//!
//! Callers read and write tuples through [`GenericArray`] without knowing
//! whether the storage is interleaved, columnar, or a derived view. Index
//! arguments are not validated on the read path: tuple indices must lie in
//! `[0, number_of_tuples())` and component indices in
//! `[0, number_of_components())`, otherwise the call panics.

use crate::error::{Error, Result};
use crate::scalar::{Scalar, ScalarType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical arrangement of an array's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ArrayLayout {
    /// Array of structures: components of a tuple are adjacent.
    Aos,
    /// Structure of arrays: one contiguous buffer per component.
    Soa,
    /// Read-only view computing tuples from another array.
    Periodic,
}

/// Splits a flat value index into `(tuple, component)` with integer division.
#[inline]
#[must_use]
pub fn split_value_index(value_index: usize, components: usize) -> (usize, usize) {
    (value_index / components, value_index % components)
}

/// Uniform typed tuple access over any storage layout.
///
/// Two arrays with the same tuple count, component count and values behave
/// identically through this trait regardless of their layout. Mutating
/// operations return [`Result`] so read-only implementations can refuse them
/// with [`Error::Unsupported`].
pub trait GenericArray {
    /// Element type.
    type Scalar: Scalar;

    /// Physical layout of this array.
    fn layout(&self) -> ArrayLayout;

    /// Runtime tag of [`Self::Scalar`].
    fn scalar_type(&self) -> ScalarType {
        <Self::Scalar as Scalar>::SCALAR_TYPE
    }

    /// Number of components per tuple.
    fn number_of_components(&self) -> usize;

    /// Number of tuples.
    fn number_of_tuples(&self) -> usize;

    /// Total number of scalar values.
    fn number_of_values(&self) -> usize {
        self.number_of_tuples() * self.number_of_components()
    }

    /// Reads one component of one tuple.
    fn component(&self, tuple: usize, component: usize) -> Self::Scalar;

    /// Copies one tuple into `out`, which must hold at least
    /// `number_of_components()` values.
    fn typed_tuple(&self, tuple: usize, out: &mut [Self::Scalar]);

    /// Reads a value by flat index (tuple-major, component-minor).
    fn value(&self, value_index: usize) -> Self::Scalar {
        let (tuple, component) = split_value_index(value_index, self.number_of_components());
        self.component(tuple, component)
    }

    /// Reads one component widened to double precision.
    fn component_f64(&self, tuple: usize, component: usize) -> f64 {
        self.component(tuple, component).to_f64()
    }

    /// Copies one tuple into `out` as double precision values.
    fn tuple_f64(&self, tuple: usize, out: &mut [f64]) {
        for (component, slot) in out[..self.number_of_components()].iter_mut().enumerate() {
            *slot = self.component(tuple, component).to_f64();
        }
    }

    /// Writes one component of one tuple.
    ///
    /// # Errors
    /// Read-only arrays return [`Error::Unsupported`].
    fn set_component(&mut self, tuple: usize, component: usize, value: Self::Scalar)
        -> Result<()>;

    /// Writes a whole tuple; `values` must have exactly
    /// `number_of_components()` entries.
    ///
    /// # Errors
    /// [`Error::TupleSizeMismatch`] for a wrong-sized slice, or
    /// [`Error::Unsupported`] for read-only arrays.
    fn set_typed_tuple(&mut self, tuple: usize, values: &[Self::Scalar]) -> Result<()>;

    /// Writes a value by flat index.
    ///
    /// # Errors
    /// Read-only arrays return [`Error::Unsupported`].
    fn set_value(&mut self, value_index: usize, value: Self::Scalar) -> Result<()> {
        let (tuple, component) = split_value_index(value_index, self.number_of_components());
        self.set_component(tuple, component, value)
    }

    /// Writes a tuple given in double precision, converting each value.
    ///
    /// # Errors
    /// See [`GenericArray::set_typed_tuple`].
    fn set_tuple_f64(&mut self, tuple: usize, values: &[f64]) -> Result<()> {
        let components = self.number_of_components();
        if values.len() != components {
            return Err(Error::TupleSizeMismatch {
                expected: components,
                actual: values.len(),
            });
        }
        for (component, &value) in values.iter().enumerate() {
            self.set_component(tuple, component, Self::Scalar::from_f64(value))?;
        }
        Ok(())
    }

    /// Changes the number of components per tuple.
    ///
    /// # Errors
    /// Allocation failures, or [`Error::Unsupported`] for read-only arrays.
    fn set_number_of_components(&mut self, components: usize) -> Result<()>;

    /// Replaces the storage with `tuples` zeroed tuples.
    ///
    /// # Errors
    /// Allocation failures, [`Error::NotResizeable`], or
    /// [`Error::Unsupported`] for read-only arrays.
    fn allocate_tuples(&mut self, tuples: usize) -> Result<()>;

    /// Resizes to `tuples` tuples, keeping existing values and zero-filling
    /// new ones.
    ///
    /// # Errors
    /// Allocation failures, [`Error::NotResizeable`], or
    /// [`Error::Unsupported`] for read-only arrays.
    fn reallocate_tuples(&mut self, tuples: usize) -> Result<()>;

    /// Alias of [`GenericArray::reallocate_tuples`].
    ///
    /// # Errors
    /// See [`GenericArray::reallocate_tuples`].
    fn set_number_of_tuples(&mut self, tuples: usize) -> Result<()> {
        self.reallocate_tuples(tuples)
    }

    /// Writes a tuple, growing the array first when `tuple` is past the end.
    ///
    /// # Errors
    /// See [`GenericArray::reallocate_tuples`] and
    /// [`GenericArray::set_typed_tuple`].
    fn insert_typed_tuple(&mut self, tuple: usize, values: &[Self::Scalar]) -> Result<()> {
        if tuple >= self.number_of_tuples() {
            self.reallocate_tuples(tuple + 1)?;
        }
        self.set_typed_tuple(tuple, values)
    }

    /// Appends a tuple and returns its index.
    ///
    /// # Errors
    /// See [`GenericArray::insert_typed_tuple`].
    fn insert_next_typed_tuple(&mut self, values: &[Self::Scalar]) -> Result<usize> {
        let tuple = self.number_of_tuples();
        self.insert_typed_tuple(tuple, values)?;
        Ok(tuple)
    }

    /// Removes one tuple, shifting later tuples down by one.
    ///
    /// # Panics
    /// If `tuple` is out of range.
    ///
    /// # Errors
    /// Read-only arrays return [`Error::Unsupported`].
    fn remove_tuple(&mut self, tuple: usize) -> Result<()> {
        let tuples = self.number_of_tuples();
        let components = self.number_of_components();
        assert!(tuple < tuples, "tuple {tuple} out of range for {tuples} tuples");
        for dest in tuple..tuples - 1 {
            for component in 0..components {
                let moved = self.component(dest + 1, component);
                self.set_component(dest, component, moved)?;
            }
        }
        self.reallocate_tuples(tuples - 1)
    }

    /// Removes the last tuple.
    ///
    /// # Errors
    /// Read-only arrays return [`Error::Unsupported`].
    fn remove_last_tuple(&mut self) -> Result<()> {
        self.reallocate_tuples(self.number_of_tuples().saturating_sub(1))
    }

    /// Flat index of the first value equal to `value`.
    ///
    /// # Errors
    /// Arrays that cannot be searched return [`Error::Unsupported`].
    fn lookup_value(&self, value: Self::Scalar) -> Result<Option<usize>> {
        Ok((0..self.number_of_values()).find(|&index| self.value(index) == value))
    }

    /// Flat indices of every value equal to `value`.
    ///
    /// # Errors
    /// Arrays that cannot be searched return [`Error::Unsupported`].
    fn lookup_all_values(&self, value: Self::Scalar) -> Result<Vec<usize>> {
        Ok((0..self.number_of_values())
            .filter(|&index| self.value(index) == value)
            .collect())
    }

    /// Bytes of memory owned by this array.
    fn actual_memory_size(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_value_index() {
        assert_eq!(split_value_index(0, 3), (0, 0));
        assert_eq!(split_value_index(4, 3), (1, 1));
        assert_eq!(split_value_index(8, 9), (0, 8));
        assert_eq!(split_value_index(9, 9), (1, 0));
    }
}
