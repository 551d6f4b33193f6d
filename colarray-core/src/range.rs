//! Value ranges computed by scanning an array.
//!
//! NaN values are skipped. Empty arrays (or arrays holding only NaN in the
//! scanned component) have no range.

use crate::array::GenericArray;

/// Running `[min, max]` accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeAccumulator {
    min: f64,
    max: f64,
}

impl RangeAccumulator {
    /// Creates an accumulator that has seen no values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Folds one value in.
    #[inline]
    pub fn add(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Combines two accumulators.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The range, or `None` if no value was added.
    #[must_use]
    pub fn finish(self) -> Option<[f64; 2]> {
        (self.min <= self.max).then_some([self.min, self.max])
    }
}

impl Default for RangeAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Range of one component over every tuple.
#[must_use]
pub fn component_range<A: GenericArray + ?Sized>(array: &A, component: usize) -> Option<[f64; 2]> {
    let mut range = RangeAccumulator::new();
    for tuple in 0..array.number_of_tuples() {
        range.add(array.component_f64(tuple, component));
    }
    range.finish()
}

/// Range of every component, in component order.
#[must_use]
pub fn component_ranges<A: GenericArray + ?Sized>(array: &A) -> Vec<Option<[f64; 2]>> {
    let mut ranges = vec![RangeAccumulator::new(); array.number_of_components()];
    let mut tuple_values = vec![0.0; array.number_of_components()];
    for tuple in 0..array.number_of_tuples() {
        array.tuple_f64(tuple, &mut tuple_values);
        for (range, &value) in ranges.iter_mut().zip(&tuple_values) {
            range.add(value);
        }
    }
    ranges.into_iter().map(RangeAccumulator::finish).collect()
}

/// Euclidean norm of a tuple.
#[inline]
#[must_use]
pub fn magnitude(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Range of the tuple magnitudes.
#[must_use]
pub fn magnitude_range<A: GenericArray + ?Sized>(array: &A) -> Option<[f64; 2]> {
    let mut range = RangeAccumulator::new();
    let mut tuple_values = vec![0.0; array.number_of_components()];
    for tuple in 0..array.number_of_tuples() {
        array.tuple_f64(tuple, &mut tuple_values);
        range.add(magnitude(&tuple_values));
    }
    range.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aos::AosArray;
    use crate::soa::SoaArray;
    use approx::assert_relative_eq;

    #[test]
    fn test_component_ranges() {
        let array = AosArray::from_vec(vec![1.0_f32, -2.0, 5.0, 3.0, 0.5, -1.0], 3).unwrap();
        assert_eq!(component_range(&array, 0), Some([1.0, 3.0]));
        assert_eq!(
            component_ranges(&array),
            vec![Some([1.0, 3.0]), Some([-2.0, 0.5]), Some([-1.0, 5.0])]
        );
    }

    #[test]
    fn test_magnitude_range_same_for_both_layouts() {
        let aos = AosArray::from_vec(vec![3.0_f64, 4.0, 0.0, 1.0], 2).unwrap();
        let soa = SoaArray::from_columns(vec![vec![3.0_f64, 0.0], vec![4.0, 1.0]]).unwrap();
        let expected = magnitude_range(&aos).unwrap();
        assert_relative_eq!(expected[0], 1.0);
        assert_relative_eq!(expected[1], 5.0);
        assert_eq!(magnitude_range(&soa), Some(expected));
    }

    #[test]
    fn test_empty_and_nan() {
        let empty = AosArray::<f64>::new(3);
        assert_eq!(component_range(&empty, 0), None);
        assert_eq!(magnitude_range(&empty), None);

        let nan = AosArray::from_vec(vec![f64::NAN, 2.0], 1).unwrap();
        assert_eq!(component_range(&nan, 0), Some([2.0, 2.0]));
    }
}
