//! Interleaved (array of structures) storage.
//!
//! All components of a tuple sit next to each other in a single buffer,
//! tuples follow one another: `[x0, y0, z0, x1, y1, z1, ...]`.

use crate::array::{ArrayLayout, GenericArray};
use crate::buffer::{Release, TypedBuffer};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Typed array storing tuples interleaved in one buffer.
#[derive(Debug, Clone)]
pub struct AosArray<'a, S: Scalar> {
    buffer: TypedBuffer<'a, S>,
    components: usize,
    tuples: usize,
}

impl<'a, S: Scalar> AosArray<'a, S> {
    /// Creates an empty array with `components` values per tuple.
    #[must_use]
    pub fn new(components: usize) -> Self {
        Self {
            buffer: TypedBuffer::new(),
            components,
            tuples: 0,
        }
    }

    /// Takes ownership of interleaved values.
    ///
    /// # Errors
    /// [`Error::TupleSizeMismatch`] if `data.len()` is not a multiple of
    /// `components`.
    pub fn from_vec(data: Vec<S>, components: usize) -> Result<Self> {
        let tuples = whole_tuples(data.len(), components)?;
        Ok(Self {
            buffer: TypedBuffer::from_vec(data),
            components,
            tuples,
        })
    }

    /// Uses caller-owned memory as storage without copying.
    ///
    /// The slice is never freed; resizing the array later moves the values
    /// into owned memory and leaves the slice untouched.
    ///
    /// # Errors
    /// [`Error::TupleSizeMismatch`] if the slice length is not a multiple of
    /// the component count.
    pub fn set_array(&mut self, data: &'a mut [S]) -> Result<()> {
        let tuples = whole_tuples(data.len(), self.components)?;
        self.buffer.set_borrowed(data);
        self.tuples = tuples;
        Ok(())
    }

    /// Adopts an externally allocated vector released through `release`.
    ///
    /// # Errors
    /// [`Error::TupleSizeMismatch`] if the vector length is not a multiple of
    /// the component count.
    pub fn set_buffer(&mut self, data: Vec<S>, release: Release<S>) -> Result<()> {
        let tuples = whole_tuples(data.len(), self.components)?;
        self.buffer.set_buffer(data, release);
        self.tuples = tuples;
        Ok(())
    }

    /// Interleaved values of every tuple.
    #[must_use]
    pub fn as_slice(&self) -> &[S] {
        self.buffer.as_slice()
    }

    /// Mutable interleaved values.
    pub fn as_mut_slice(&mut self) -> &mut [S] {
        self.buffer.as_mut_slice()
    }

    /// The backing buffer.
    #[must_use]
    pub fn buffer(&self) -> &TypedBuffer<'a, S> {
        &self.buffer
    }

    /// Values of one tuple.
    #[inline]
    #[must_use]
    pub fn tuple_slice(&self, tuple: usize) -> &[S] {
        let start = tuple * self.components;
        &self.buffer.as_slice()[start..start + self.components]
    }

    /// Mutable values of one tuple.
    #[inline]
    pub fn tuple_slice_mut(&mut self, tuple: usize) -> &mut [S] {
        let start = tuple * self.components;
        let components = self.components;
        &mut self.buffer.as_mut_slice()[start..start + components]
    }

    /// Iterates over tuples as slices.
    pub fn tuples(&self) -> impl Iterator<Item = &[S]> + '_ {
        self.buffer.as_slice().chunks_exact(self.components.max(1))
    }

    fn values_for(&self, tuples: usize) -> Result<usize> {
        tuples
            .checked_mul(self.components)
            .ok_or(Error::AllocationFailed {
                requested: usize::MAX,
            })
    }
}

impl<S: Scalar> Default for AosArray<'_, S> {
    fn default() -> Self {
        Self::new(1)
    }
}

fn whole_tuples(values: usize, components: usize) -> Result<usize> {
    if components == 0 {
        return if values == 0 {
            Ok(0)
        } else {
            Err(Error::TupleSizeMismatch {
                expected: 0,
                actual: values,
            })
        };
    }
    if values % components != 0 {
        return Err(Error::TupleSizeMismatch {
            expected: components,
            actual: values % components,
        });
    }
    Ok(values / components)
}

impl<S: Scalar> GenericArray for AosArray<'_, S> {
    type Scalar = S;

    fn layout(&self) -> ArrayLayout {
        ArrayLayout::Aos
    }

    fn number_of_components(&self) -> usize {
        self.components
    }

    fn number_of_tuples(&self) -> usize {
        self.tuples
    }

    #[inline]
    fn component(&self, tuple: usize, component: usize) -> S {
        self.buffer.as_slice()[tuple * self.components + component]
    }

    #[inline]
    fn typed_tuple(&self, tuple: usize, out: &mut [S]) {
        out[..self.components].copy_from_slice(self.tuple_slice(tuple));
    }

    #[inline]
    fn value(&self, value_index: usize) -> S {
        self.buffer.as_slice()[value_index]
    }

    #[inline]
    fn set_component(&mut self, tuple: usize, component: usize, value: S) -> Result<()> {
        let index = tuple * self.components + component;
        self.buffer.as_mut_slice()[index] = value;
        Ok(())
    }

    fn set_typed_tuple(&mut self, tuple: usize, values: &[S]) -> Result<()> {
        if values.len() != self.components {
            return Err(Error::TupleSizeMismatch {
                expected: self.components,
                actual: values.len(),
            });
        }
        self.tuple_slice_mut(tuple).copy_from_slice(values);
        Ok(())
    }

    #[inline]
    fn set_value(&mut self, value_index: usize, value: S) -> Result<()> {
        self.buffer.as_mut_slice()[value_index] = value;
        Ok(())
    }

    fn set_number_of_components(&mut self, components: usize) -> Result<()> {
        if components == self.components {
            return Ok(());
        }
        let total = self
            .tuples
            .checked_mul(components)
            .ok_or(Error::AllocationFailed {
                requested: usize::MAX,
            })?;
        let mut relaid = Vec::new();
        relaid
            .try_reserve_exact(total)
            .map_err(|_| Error::AllocationFailed { requested: total })?;
        relaid.resize(total, S::default());

        let keep = components.min(self.components);
        if keep > 0 {
            for (dest, src) in relaid
                .chunks_exact_mut(components)
                .zip(self.buffer.as_slice().chunks_exact(self.components))
            {
                dest[..keep].copy_from_slice(&src[..keep]);
            }
        }
        self.buffer.set_buffer(relaid, Release::Drop);
        self.components = components;
        Ok(())
    }

    fn allocate_tuples(&mut self, tuples: usize) -> Result<()> {
        let values = self.values_for(tuples)?;
        self.buffer.allocate(values)?;
        self.tuples = tuples;
        Ok(())
    }

    fn reallocate_tuples(&mut self, tuples: usize) -> Result<()> {
        let values = self.values_for(tuples)?;
        self.buffer.reallocate(values)?;
        self.tuples = tuples;
        Ok(())
    }

    fn remove_tuple(&mut self, tuple: usize) -> Result<()> {
        assert!(
            tuple < self.tuples,
            "tuple {tuple} out of range for {} tuples",
            self.tuples
        );
        let start = (tuple + 1) * self.components;
        let dest = tuple * self.components;
        self.buffer.as_mut_slice().copy_within(start.., dest);
        self.reallocate_tuples(self.tuples - 1)
    }

    fn actual_memory_size(&self) -> usize {
        self.buffer.owned_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Ownership;

    #[test]
    fn test_component_round_trip() {
        let mut array = AosArray::<f32>::new(3);
        array.allocate_tuples(4).unwrap();
        for tuple in 0..4 {
            for component in 0..3 {
                let value = (tuple * 10 + component) as f32;
                array.set_component(tuple, component, value).unwrap();
                assert!((array.component(tuple, component) - value).abs() < f32::EPSILON);
            }
        }
        assert_eq!(array.value(7), 21.0);
    }

    #[test]
    fn test_allocate_zeroes_tuples() {
        let mut array = AosArray::<i64>::from_vec(vec![9; 6], 2).unwrap();
        array.allocate_tuples(5).unwrap();
        assert_eq!(array.number_of_tuples(), 5);
        assert!(array.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_from_vec_rejects_partial_tuple() {
        let err = AosArray::<u8>::from_vec(vec![1, 2, 3, 4], 3).unwrap_err();
        assert!(matches!(err, Error::TupleSizeMismatch { .. }));
    }

    #[test]
    fn test_insert_and_remove_tuples() {
        let mut array = AosArray::<i32>::new(2);
        assert_eq!(array.insert_next_typed_tuple(&[1, 2]).unwrap(), 0);
        assert_eq!(array.insert_next_typed_tuple(&[3, 4]).unwrap(), 1);
        array.insert_typed_tuple(3, &[7, 8]).unwrap();
        assert_eq!(array.number_of_tuples(), 4);
        assert_eq!(array.tuple_slice(2), &[0, 0]);

        array.remove_tuple(1).unwrap();
        assert_eq!(array.as_slice(), &[1, 2, 0, 0, 7, 8]);
        array.remove_last_tuple().unwrap();
        assert_eq!(array.as_slice(), &[1, 2, 0, 0]);
    }

    #[test]
    fn test_set_typed_tuple_checks_size() {
        let mut array = AosArray::<f64>::new(3);
        array.allocate_tuples(1).unwrap();
        let err = array.set_typed_tuple(0, &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            Error::TupleSizeMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_borrowed_storage_grows_into_owned() {
        let mut external = vec![1.0_f64, 2.0, 3.0, 4.0];
        {
            let mut array = AosArray::new(2);
            array.set_array(&mut external).unwrap();
            assert_eq!(array.number_of_tuples(), 2);
            assert_eq!(array.buffer().ownership(), Ownership::Borrowed);

            array.set_typed_tuple(1, &[30.0, 40.0]).unwrap();
            array.insert_next_typed_tuple(&[5.0, 6.0]).unwrap();
            assert_eq!(array.buffer().ownership(), Ownership::Owned);
            assert_eq!(array.as_slice(), &[1.0, 2.0, 30.0, 40.0, 5.0, 6.0]);
        }
        assert_eq!(external, vec![1.0, 2.0, 30.0, 40.0]);
    }

    #[test]
    fn test_change_components_relays_tuples() {
        let mut array = AosArray::<u16>::from_vec(vec![1, 2, 3, 4, 5, 6], 3).unwrap();
        array.set_number_of_components(2).unwrap();
        assert_eq!(array.as_slice(), &[1, 2, 4, 5]);
        array.set_number_of_components(4).unwrap();
        assert_eq!(array.as_slice(), &[1, 2, 0, 0, 4, 5, 0, 0]);
        assert_eq!(array.number_of_tuples(), 2);
    }

    #[test]
    fn test_lookup() {
        let array = AosArray::<i8>::from_vec(vec![4, 5, 6, 5], 2).unwrap();
        assert_eq!(array.lookup_value(5).unwrap(), Some(1));
        assert_eq!(array.lookup_all_values(5).unwrap(), vec![1, 3]);
        assert_eq!(array.lookup_value(9).unwrap(), None);
    }

    #[test]
    fn test_tuple_f64() {
        let array = AosArray::<u8>::from_vec(vec![1, 2, 3], 3).unwrap();
        let mut out = [0.0; 3];
        array.tuple_f64(0, &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }
}
