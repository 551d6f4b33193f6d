//! Structure of Arrays (`SoA`) storage.
//!
//! Each component lives in its own contiguous [`TypedBuffer`] so a pass over
//! one component touches only that component's memory. All component buffers
//! are kept at the same length, the array's tuple count.

use crate::array::{ArrayLayout, GenericArray};
use crate::buffer::{Release, TypedBuffer};
use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Typed array storing one buffer per component.
#[derive(Debug, Clone)]
pub struct SoaArray<'a, S: Scalar> {
    columns: Vec<TypedBuffer<'a, S>>,
    tuples: usize,
    resizeable: bool,
    /// `1 / components`, used to split flat value indices.
    components_reciprocal: f64,
}

impl<'a, S: Scalar> SoaArray<'a, S> {
    /// Creates an empty, resizeable array with zero components.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            tuples: 0,
            resizeable: true,
            components_reciprocal: 0.0,
        }
    }

    /// Creates an empty array with `components` empty columns.
    #[must_use]
    pub fn with_components(components: usize) -> Self {
        let mut array = Self::new();
        array.columns = (0..components).map(|_| TypedBuffer::new()).collect();
        array.update_reciprocal();
        array
    }

    /// Builds an array from owned columns of equal length.
    ///
    /// # Errors
    /// [`Error::TupleSizeMismatch`] if the columns differ in length.
    pub fn from_columns(columns: Vec<Vec<S>>) -> Result<Self> {
        let tuples = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().find(|column| column.len() != tuples) {
            return Err(Error::TupleSizeMismatch {
                expected: tuples,
                actual: bad.len(),
            });
        }
        let mut array = Self::new();
        array.columns = columns.into_iter().map(TypedBuffer::from_vec).collect();
        array.tuples = tuples;
        array.update_reciprocal();
        Ok(array)
    }

    /// Whether storage may grow.
    #[must_use]
    pub fn is_resizeable(&self) -> bool {
        self.resizeable
    }

    /// When false, growth requests and tuple removals fail with
    /// [`Error::NotResizeable`]; shrinking through
    /// [`GenericArray::reallocate_tuples`] keeps the tuple count, and
    /// [`GenericArray::allocate_tuples`] zeroes the tuples it keeps.
    pub fn set_resizeable(&mut self, resizeable: bool) {
        self.resizeable = resizeable;
    }

    /// Uses caller-owned memory as the storage of one component.
    ///
    /// `data.len()` becomes the tuple count; other columns are resized to
    /// match, zero-filling any new values. On error no column is changed.
    ///
    /// # Errors
    /// [`Error::ComponentOutOfRange`] for a bad component,
    /// [`Error::NotResizeable`] if `data` is longer than the tuple count of a
    /// non-resizeable array, or allocation failures while resizing the other
    /// columns.
    pub fn set_array(&mut self, component: usize, data: &'a mut [S]) -> Result<()> {
        self.check_component(component)?;
        self.match_other_columns(component, data.len())?;
        self.columns[component].set_borrowed(data);
        Ok(())
    }

    /// Adopts an owned vector as the storage of one component.
    ///
    /// # Errors
    /// Same as [`SoaArray::set_array`].
    pub fn set_buffer(&mut self, component: usize, data: Vec<S>, release: Release<S>) -> Result<()> {
        self.check_component(component)?;
        self.match_other_columns(component, data.len())?;
        self.columns[component].set_buffer(data, release);
        Ok(())
    }

    /// Values of one component across all tuples.
    #[must_use]
    pub fn column(&self, component: usize) -> &[S] {
        self.columns[component].as_slice()
    }

    /// Mutable values of one component.
    pub fn column_mut(&mut self, component: usize) -> &mut [S] {
        self.columns[component].as_mut_slice()
    }

    /// The buffer backing one component.
    #[must_use]
    pub fn buffer(&self, component: usize) -> &TypedBuffer<'a, S> {
        &self.columns[component]
    }

    /// Iterates over the component columns in order.
    pub fn columns(&self) -> impl Iterator<Item = &[S]> + '_ {
        self.columns.iter().map(TypedBuffer::as_slice)
    }

    /// Splits a flat value index into `(tuple, component)`.
    ///
    /// Multiplies by the cached reciprocal instead of dividing, then corrects
    /// the estimate so the result always equals integer division.
    #[inline]
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn decompose_value_index(&self, value_index: usize) -> (usize, usize) {
        let components = self.columns.len();
        if components == 0 {
            return (0, value_index);
        }
        let mut tuple = (value_index as f64 * self.components_reciprocal) as usize;
        while tuple * components > value_index {
            tuple -= 1;
        }
        while (tuple + 1) * components <= value_index {
            tuple += 1;
        }
        (tuple, value_index - tuple * components)
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_reciprocal(&mut self) {
        self.components_reciprocal = match self.columns.len() {
            0 => 0.0,
            n => 1.0 / n as f64,
        };
    }

    fn check_component(&self, component: usize) -> Result<()> {
        if component >= self.columns.len() {
            return Err(Error::ComponentOutOfRange {
                component,
                components: self.columns.len(),
            });
        }
        Ok(())
    }

    fn match_other_columns(&mut self, skip: usize, tuples: usize) -> Result<()> {
        if tuples == self.tuples {
            return Ok(());
        }
        if tuples > self.tuples {
            self.ensure_resizeable(tuples)?;
        }
        for (component, column) in self.columns.iter_mut().enumerate() {
            if component != skip {
                column.reserve(tuples)?;
            }
        }
        for (component, column) in self.columns.iter_mut().enumerate() {
            if component != skip {
                column.reallocate(tuples)?;
            }
        }
        self.tuples = tuples;
        Ok(())
    }

    fn ensure_resizeable(&self, tuples: usize) -> Result<()> {
        if self.resizeable {
            Ok(())
        } else {
            Err(Error::NotResizeable {
                requested: tuples,
                current: self.tuples,
            })
        }
    }

    /// Reserves room in every column, then applies `resize` to each. Once
    /// every reservation succeeded `resize` cannot fail, so the columns are
    /// either all resized or all left with their values.
    fn resize_columns<R, F>(&mut self, tuples: usize, reserve: R, resize: F) -> Result<()>
    where
        R: Fn(&mut TypedBuffer<'a, S>, usize) -> Result<()>,
        F: Fn(&mut TypedBuffer<'a, S>, usize) -> Result<()>,
    {
        if tuples > self.tuples {
            self.ensure_resizeable(tuples)?;
        }
        if !self.resizeable {
            if tuples < self.tuples {
                log::debug!(
                    "keeping {} tuples on non-resizeable array asked to shrink to {tuples}",
                    self.tuples
                );
            }
            return Ok(());
        }

        for column in &mut self.columns {
            reserve(column, tuples)?;
        }
        for column in &mut self.columns {
            resize(column, tuples)?;
        }
        self.tuples = tuples;
        Ok(())
    }
}

impl<S: Scalar> Default for SoaArray<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scalar> GenericArray for SoaArray<'_, S> {
    type Scalar = S;

    fn layout(&self) -> ArrayLayout {
        ArrayLayout::Soa
    }

    fn number_of_components(&self) -> usize {
        self.columns.len()
    }

    fn number_of_tuples(&self) -> usize {
        self.tuples
    }

    #[inline]
    fn component(&self, tuple: usize, component: usize) -> S {
        self.columns[component].as_slice()[tuple]
    }

    #[inline]
    fn typed_tuple(&self, tuple: usize, out: &mut [S]) {
        for (slot, column) in out.iter_mut().zip(&self.columns) {
            *slot = column.as_slice()[tuple];
        }
    }

    #[inline]
    fn value(&self, value_index: usize) -> S {
        let (tuple, component) = self.decompose_value_index(value_index);
        self.component(tuple, component)
    }

    #[inline]
    fn set_component(&mut self, tuple: usize, component: usize, value: S) -> Result<()> {
        self.columns[component].as_mut_slice()[tuple] = value;
        Ok(())
    }

    fn set_typed_tuple(&mut self, tuple: usize, values: &[S]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::TupleSizeMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.as_mut_slice()[tuple] = value;
        }
        Ok(())
    }

    #[inline]
    fn set_value(&mut self, value_index: usize, value: S) -> Result<()> {
        let (tuple, component) = self.decompose_value_index(value_index);
        self.set_component(tuple, component, value)
    }

    fn set_number_of_components(&mut self, components: usize) -> Result<()> {
        if components > self.columns.len() {
            let mut added = Vec::with_capacity(components - self.columns.len());
            for _ in self.columns.len()..components {
                let mut column = TypedBuffer::new();
                column.allocate(self.tuples)?;
                added.push(column);
            }
            self.columns.extend(added);
        } else {
            self.columns.truncate(components);
        }
        self.update_reciprocal();
        Ok(())
    }

    fn allocate_tuples(&mut self, tuples: usize) -> Result<()> {
        if !self.resizeable && tuples <= self.tuples {
            for column in &mut self.columns {
                column.fill(S::default());
            }
        }
        self.resize_columns(tuples, TypedBuffer::reserve_owned, TypedBuffer::allocate)
    }

    fn reallocate_tuples(&mut self, tuples: usize) -> Result<()> {
        self.resize_columns(tuples, TypedBuffer::reserve, TypedBuffer::reallocate)
    }

    fn remove_tuple(&mut self, tuple: usize) -> Result<()> {
        assert!(
            tuple < self.tuples,
            "tuple {tuple} out of range for {} tuples",
            self.tuples
        );
        self.ensure_resizeable(self.tuples - 1)?;
        for column in &mut self.columns {
            column.as_mut_slice().copy_within(tuple + 1.., tuple);
        }
        self.reallocate_tuples(self.tuples - 1)
    }

    fn remove_last_tuple(&mut self) -> Result<()> {
        if self.tuples == 0 {
            return Ok(());
        }
        self.ensure_resizeable(self.tuples - 1)?;
        self.reallocate_tuples(self.tuples - 1)
    }

    fn actual_memory_size(&self) -> usize {
        self.columns.iter().map(TypedBuffer::owned_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Ownership;

    fn sample() -> SoaArray<'static, f64> {
        SoaArray::from_columns(vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]).unwrap()
    }

    #[test]
    fn test_value_by_flat_index() {
        let array = sample();
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.number_of_components(), 3);
        assert!((array.value(4) - 5.0).abs() < f64::EPSILON);
        assert!((array.value(5) - 6.0).abs() < f64::EPSILON);

        let mut tuple = [0.0; 3];
        array.typed_tuple(1, &mut tuple);
        assert_eq!(tuple, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_reciprocal_decomposition_matches_integer_division() {
        for components in [1_usize, 2, 3, 4, 9] {
            let array = SoaArray::<f32>::with_components(components);
            let values = 1_000_000 * components;
            for value_index in 0..values {
                let expected = (value_index / components, value_index % components);
                assert_eq!(
                    array.decompose_value_index(value_index),
                    expected,
                    "components={components} index={value_index}"
                );
            }
        }
    }

    #[test]
    fn test_set_value_round_trip() {
        let mut array = SoaArray::<i32>::with_components(4);
        array.allocate_tuples(3).unwrap();
        for index in 0..12 {
            array.set_value(index, i32::try_from(index).unwrap() * 2).unwrap();
        }
        for index in 0..12 {
            assert_eq!(array.value(index), i32::try_from(index).unwrap() * 2);
        }
        assert_eq!(array.column(1), &[2, 10, 18]);
    }

    #[test]
    fn test_allocate_zeroes_every_column() {
        let mut array = sample();
        array.allocate_tuples(4).unwrap();
        assert_eq!(array.number_of_tuples(), 4);
        assert!(array.columns().all(|column| column.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_add_components_keeps_tuples() {
        let mut array = sample();
        array.set_number_of_components(5).unwrap();
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.column(4), &[0.0, 0.0]);
        assert!(array.value(4).abs() < f64::EPSILON);
        assert!((array.value(5) - 4.0).abs() < f64::EPSILON);

        array.set_number_of_components(1).unwrap();
        assert_eq!(array.value(1), 4.0);
    }

    #[test]
    fn test_set_array_borrows_component_memory() {
        let mut xs = vec![1_u32, 2, 3];
        let mut ys = vec![4_u32, 5, 6];
        let xs_ptr = xs.as_ptr();
        {
            let mut array = SoaArray::with_components(2);
            array.set_array(0, &mut xs).unwrap();
            array.set_array(1, &mut ys).unwrap();
            assert_eq!(array.number_of_tuples(), 3);
            assert_eq!(array.buffer(0).ownership(), Ownership::Borrowed);
            assert_eq!(array.value(3), 5);

            array.reallocate_tuples(4).unwrap();
            assert_eq!(array.buffer(0).ownership(), Ownership::Owned);
            assert_ne!(array.buffer(0).as_ptr(), xs_ptr);
            assert_eq!(array.column(0), &[1, 2, 3, 0]);
        }
        assert_eq!(xs, vec![1, 2, 3]);
        assert_eq!(ys, vec![4, 5, 6]);
    }

    #[test]
    fn test_set_array_rejects_bad_component() {
        let mut data = vec![1.0_f32; 2];
        let mut array = SoaArray::with_components(2);
        let err = array.set_array(2, &mut data).unwrap_err();
        assert_eq!(
            err,
            Error::ComponentOutOfRange {
                component: 2,
                components: 2
            }
        );
    }

    #[test]
    fn test_non_resizeable_rejects_growth() {
        let mut array = sample();
        array.set_resizeable(false);

        let err = array.reallocate_tuples(3).unwrap_err();
        assert_eq!(
            err,
            Error::NotResizeable {
                requested: 3,
                current: 2
            }
        );
        assert!(array.insert_next_typed_tuple(&[7.0, 8.0, 9.0]).is_err());

        array.reallocate_tuples(1).unwrap();
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.column(2), &[3.0, 6.0]);
    }

    fn fixed_three_tuples<'a>() -> SoaArray<'a, f64> {
        let mut array =
            SoaArray::from_columns(vec![vec![1.0, 4.0, 7.0], vec![2.0, 5.0, 8.0]]).unwrap();
        array.set_resizeable(false);
        array
    }

    #[test]
    fn test_non_resizeable_refuses_removal() {
        let mut array = fixed_three_tuples();
        let expected = Error::NotResizeable {
            requested: 2,
            current: 3,
        };
        assert_eq!(array.remove_tuple(0).unwrap_err(), expected);
        assert_eq!(array.remove_last_tuple().unwrap_err(), expected);
        assert_eq!(array.number_of_tuples(), 3);
        assert_eq!(array.column(0), &[1.0, 4.0, 7.0]);
        assert_eq!(array.column(1), &[2.0, 5.0, 8.0]);
    }

    #[test]
    fn test_non_resizeable_refuses_longer_column() {
        let mut longer = vec![9.0; 10];
        let mut array = fixed_three_tuples();
        let err = array.set_array(0, &mut longer).unwrap_err();
        assert_eq!(
            err,
            Error::NotResizeable {
                requested: 10,
                current: 3
            }
        );
        assert!(array.set_buffer(1, vec![9.0; 4], Release::Drop).is_err());
        assert_eq!(array.number_of_tuples(), 3);
        assert_eq!(array.column(0), &[1.0, 4.0, 7.0]);
        assert_eq!(array.column(1), &[2.0, 5.0, 8.0]);

        array.set_buffer(1, vec![0.5, 0.25], Release::Drop).unwrap();
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.column(0), &[1.0, 4.0]);
    }

    #[test]
    fn test_non_resizeable_allocate_zeroes_kept_tuples() {
        let mut array = fixed_three_tuples();
        array.allocate_tuples(3).unwrap();
        assert_eq!(array.number_of_tuples(), 3);
        assert!(array.columns().all(|column| column.iter().all(|&v| v == 0.0)));

        let mut array = fixed_three_tuples();
        array.allocate_tuples(1).unwrap();
        assert_eq!(array.number_of_tuples(), 3);
        assert!(array.columns().all(|column| column.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_failed_resize_keeps_every_column() {
        let mut xs = vec![1_u64, 2];
        let mut array = SoaArray::from_columns(vec![vec![0_u64; 2], vec![3, 4]]).unwrap();
        array.set_array(0, &mut xs).unwrap();

        for result in [
            array.allocate_tuples(usize::MAX),
            array.reallocate_tuples(usize::MAX),
        ] {
            assert_eq!(
                result.unwrap_err(),
                Error::AllocationFailed {
                    requested: usize::MAX
                }
            );
            assert_eq!(array.number_of_tuples(), 2);
            assert_eq!(array.column(0), &[1, 2]);
            assert_eq!(array.column(1), &[3, 4]);
            assert_eq!(array.buffer(0).ownership(), Ownership::Borrowed);
        }
    }

    #[test]
    fn test_remove_tuple() {
        let mut array = sample();
        array.remove_tuple(0).unwrap();
        assert_eq!(array.number_of_tuples(), 1);
        let mut tuple = [0.0; 3];
        array.typed_tuple(0, &mut tuple);
        assert_eq!(tuple, [4.0, 5.0, 6.0]);
    }
}
