//! Deep copies between storage layouts.

use crate::any::AnyArray;
use crate::dispatch;
use colarray_core::{AosArray, GenericArray, Result, Scalar, SoaArray};
use colarray_periodic::{PeriodicArray, TupleTransform};
use rayon::prelude::*;

/// Arrays that can produce owned copies of themselves in either layout.
pub trait LayoutConvert {
    /// Element type of the copies.
    type Scalar: Scalar;

    /// Interleaved copy owning its memory.
    ///
    /// # Errors
    /// Allocation failures.
    fn to_aos(&self) -> Result<AosArray<'static, Self::Scalar>>;

    /// Columnar copy owning its memory.
    ///
    /// # Errors
    /// Allocation failures.
    fn to_soa(&self) -> Result<SoaArray<'static, Self::Scalar>>;
}

impl<S: Scalar> LayoutConvert for AosArray<'_, S> {
    type Scalar = S;

    fn to_aos(&self) -> Result<AosArray<'static, S>> {
        AosArray::from_vec(self.as_slice().to_vec(), self.number_of_components())
    }

    fn to_soa(&self) -> Result<SoaArray<'static, S>> {
        let components = self.number_of_components();
        let columns: Vec<Vec<S>> = (0..components)
            .into_par_iter()
            .map(|component| self.tuples().map(|tuple| tuple[component]).collect())
            .collect();
        SoaArray::from_columns(columns)
    }
}

impl<S: Scalar> LayoutConvert for SoaArray<'_, S> {
    type Scalar = S;

    fn to_aos(&self) -> Result<AosArray<'static, S>> {
        let components = self.number_of_components();
        let mut data = vec![S::default(); self.number_of_values()];
        if components > 0 {
            data.par_chunks_mut(components)
                .enumerate()
                .for_each(|(tuple, values)| {
                    for (component, value) in values.iter_mut().enumerate() {
                        *value = self.column(component)[tuple];
                    }
                });
        }
        AosArray::from_vec(data, components)
    }

    fn to_soa(&self) -> Result<SoaArray<'static, S>> {
        SoaArray::from_columns(self.columns().map(<[S]>::to_vec).collect())
    }
}

/// Views are read through their tuple cache on one thread.
impl<S: Scalar, T: TupleTransform> LayoutConvert for PeriodicArray<'_, S, T> {
    type Scalar = S;

    fn to_aos(&self) -> Result<AosArray<'static, S>> {
        let components = self.number_of_components();
        let mut data = vec![S::default(); self.number_of_values()];
        if components > 0 {
            for (tuple, values) in data.chunks_exact_mut(components).enumerate() {
                self.typed_tuple(tuple, values);
            }
        }
        AosArray::from_vec(data, components)
    }

    fn to_soa(&self) -> Result<SoaArray<'static, S>> {
        let components = self.number_of_components();
        let mut columns = vec![Vec::with_capacity(self.number_of_tuples()); components];
        let mut values = vec![S::default(); components];
        for tuple in 0..self.number_of_tuples() {
            self.typed_tuple(tuple, &mut values);
            for (column, &value) in columns.iter_mut().zip(&values) {
                column.push(value);
            }
        }
        SoaArray::from_columns(columns)
    }
}

/// Interleaved deep copy of any array, keeping its scalar type.
///
/// # Errors
/// Allocation failures.
pub fn deep_copy_to_aos(source: &AnyArray<'_>) -> Result<AnyArray<'static>> {
    dispatch!(source, array => array.to_aos().map(AnyArray::from))
}

/// Columnar deep copy of any array, keeping its scalar type.
///
/// # Errors
/// Allocation failures.
pub fn deep_copy_to_soa(source: &AnyArray<'_>) -> Result<AnyArray<'static>> {
    dispatch!(source, array => array.to_soa().map(AnyArray::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use colarray_core::ArrayLayout;

    #[test]
    fn test_aos_to_soa_and_back() {
        let aos = AosArray::from_vec((0..12).collect::<Vec<i32>>(), 3).unwrap();
        let soa = aos.to_soa().unwrap();
        assert_eq!(soa.number_of_tuples(), 4);
        assert_eq!(soa.column(1), &[1, 4, 7, 10]);
        let back = soa.to_aos().unwrap();
        assert_eq!(back.as_slice(), aos.as_slice());
    }

    #[test]
    fn test_deep_copy_keeps_scalar_type() {
        let soa: AnyArray = SoaArray::from_columns(vec![vec![1_u8, 2], vec![3, 4]])
            .unwrap()
            .into();
        let aos = deep_copy_to_aos(&soa).unwrap();
        assert_eq!(aos.layout(), ArrayLayout::Aos);
        assert_eq!(aos.scalar_type(), soa.scalar_type());
        assert!((aos.component_f64(1, 0) - 2.0).abs() < f64::EPSILON);

        let soa_again = deep_copy_to_soa(&aos).unwrap();
        assert_eq!(soa_again.layout(), ArrayLayout::Soa);
        assert!((soa_again.component_f64(1, 1) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_arrays() {
        let aos = AosArray::<f64>::new(3);
        assert_eq!(aos.to_soa().unwrap().number_of_tuples(), 0);
        let soa = SoaArray::<f64>::with_components(2);
        assert_eq!(soa.to_aos().unwrap().number_of_tuples(), 0);
    }
}
