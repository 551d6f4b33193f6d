//! Component and magnitude ranges over runtime-typed arrays.
//!
//! Interleaved and columnar storage is scanned in parallel with rayon once
//! the tuple count reaches [`RangeConfig::min_parallel_tuples`]. Periodic
//! views answer from their own cached range.

use crate::any::AnyArray;
use crate::dispatch;
use colarray_core::{magnitude, AosArray, GenericArray, RangeAccumulator, Scalar, SoaArray};
use colarray_periodic::{PeriodicArray, TupleTransform};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Controls how range scans are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeConfig {
    /// Allow scanning on the rayon thread pool.
    pub parallel: bool,
    /// Smallest tuple count scanned in parallel.
    pub min_parallel_tuples: usize,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_parallel_tuples: 1 << 16,
        }
    }
}

impl RangeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans sequentially regardless of size.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets whether parallel scans are allowed.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the parallel threshold.
    #[must_use]
    pub fn with_min_parallel_tuples(mut self, tuples: usize) -> Self {
        self.min_parallel_tuples = tuples;
        self
    }

    fn use_parallel(&self, tuples: usize) -> bool {
        self.parallel && tuples >= self.min_parallel_tuples
    }
}

/// Arrays that can report value ranges.
pub trait RangeScan {
    /// Range of one component, `None` if empty or `component` is out of range.
    fn scan_component_range(&self, component: usize, config: &RangeConfig) -> Option<[f64; 2]>;

    /// Range of the tuple magnitudes, `None` if empty.
    fn scan_magnitude_range(&self, config: &RangeConfig) -> Option<[f64; 2]>;
}

fn fold_values<'v, S: Scalar>(values: impl ParallelIterator<Item = &'v S>) -> Option<[f64; 2]> {
    values
        .fold(RangeAccumulator::new, |mut range, value| {
            range.add(value.to_f64());
            range
        })
        .reduce(RangeAccumulator::new, RangeAccumulator::merge)
        .finish()
}

impl<S: Scalar> RangeScan for AosArray<'_, S> {
    fn scan_component_range(&self, component: usize, config: &RangeConfig) -> Option<[f64; 2]> {
        let components = self.number_of_components();
        if component >= components {
            return None;
        }
        if !config.use_parallel(self.number_of_tuples()) {
            return colarray_core::component_range(self, component);
        }
        fold_values(
            self.as_slice()
                .par_chunks_exact(components)
                .map(move |tuple| &tuple[component]),
        )
    }

    fn scan_magnitude_range(&self, config: &RangeConfig) -> Option<[f64; 2]> {
        let components = self.number_of_components();
        if components == 0 || !config.use_parallel(self.number_of_tuples()) {
            return colarray_core::magnitude_range(self);
        }
        self.as_slice()
            .par_chunks_exact(components)
            .fold(RangeAccumulator::new, |mut range, tuple| {
                range.add(tuple.iter().map(|v| v.to_f64().powi(2)).sum::<f64>().sqrt());
                range
            })
            .reduce(RangeAccumulator::new, RangeAccumulator::merge)
            .finish()
    }
}

impl<S: Scalar> RangeScan for SoaArray<'_, S> {
    fn scan_component_range(&self, component: usize, config: &RangeConfig) -> Option<[f64; 2]> {
        if component >= self.number_of_components() {
            return None;
        }
        if !config.use_parallel(self.number_of_tuples()) {
            return colarray_core::component_range(self, component);
        }
        fold_values(self.column(component).par_iter())
    }

    fn scan_magnitude_range(&self, config: &RangeConfig) -> Option<[f64; 2]> {
        if !config.use_parallel(self.number_of_tuples()) {
            return colarray_core::magnitude_range(self);
        }
        (0..self.number_of_tuples())
            .into_par_iter()
            .fold(RangeAccumulator::new, |mut range, tuple| {
                let squares: f64 = self
                    .columns()
                    .map(|column| column[tuple].to_f64().powi(2))
                    .sum();
                range.add(squares.sqrt());
                range
            })
            .reduce(RangeAccumulator::new, RangeAccumulator::merge)
            .finish()
    }
}

/// Views are not `Sync`; `config` is ignored.
impl<S: Scalar, T: TupleTransform> RangeScan for PeriodicArray<'_, S, T> {
    fn scan_component_range(&self, component: usize, _config: &RangeConfig) -> Option<[f64; 2]> {
        self.component_range(component)
    }

    fn scan_magnitude_range(&self, _config: &RangeConfig) -> Option<[f64; 2]> {
        self.vector_range()
    }
}

/// Range of one component of any array.
#[must_use]
pub fn component_range(
    array: &AnyArray<'_>,
    component: usize,
    config: &RangeConfig,
) -> Option<[f64; 2]> {
    dispatch!(array, array => array.scan_component_range(component, config))
}

/// Range of the tuple magnitudes of any array.
#[must_use]
pub fn magnitude_range(array: &AnyArray<'_>, config: &RangeConfig) -> Option<[f64; 2]> {
    dispatch!(array, array => array.scan_magnitude_range(config))
}

/// Sequential magnitude of one tuple read through the contract.
#[must_use]
pub fn tuple_magnitude(array: &AnyArray<'_>, tuple: usize) -> f64 {
    let mut values = vec![0.0; array.number_of_components()];
    dispatch!(array, array => array.tuple_f64(tuple, &mut values));
    magnitude(&values)
}
