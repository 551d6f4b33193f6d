//! Read-only array computing transformed tuples from an interleaved source.
//!
//! Binding a source is free; each tuple access reads the raw tuple, applies
//! the transform, and keeps the result in a one-tuple cache. Repeated reads
//! of the same tuple reuse the cache, reading any other tuple replaces it.
//! Reading components one at a time across different tuples therefore
//! transforms a whole tuple per read.
//!
//! The caches live behind `RefCell`/`Cell`, so a view is not `Sync`: share
//! one view between threads only behind external synchronization, or give
//! each thread its own view of the same source.

use crate::transform::{AngularPeriodicConfig, AngularTransform, BoxedTransform, TupleTransform};
use colarray_core::{
    component_ranges, magnitude, magnitude_range, AosArray, ArrayLayout, Error, GenericArray,
    RangeAccumulator, Result, Scalar,
};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;

/// The most recently transformed tuple.
#[derive(Debug, Clone)]
struct TupleCache<S> {
    index: Option<usize>,
    scalars: Vec<S>,
    doubles: Vec<f64>,
}

impl<S> TupleCache<S> {
    fn empty() -> Self {
        Self {
            index: None,
            scalars: Vec::new(),
            doubles: Vec::new(),
        }
    }
}

/// Ranges computed since the last invalidation; `None` means not computed yet.
#[derive(Debug, Clone, Default)]
struct RangeCache {
    components: Option<Option<Vec<[f64; 2]>>>,
    magnitude: Option<Option<[f64; 2]>>,
}

/// Read-only view applying a [`TupleTransform`] to every tuple of an
/// [`AosArray`] it borrows.
///
/// Every mutating operation of [`GenericArray`] fails with
/// [`Error::Unsupported`], as do value lookups.
pub struct PeriodicArray<'a, S: Scalar, T: TupleTransform = BoxedTransform> {
    source: Option<&'a AosArray<'a, S>>,
    transform: T,
    normalize: bool,
    cache: RefCell<TupleCache<S>>,
    range: RefCell<RangeCache>,
    range_invalid: Cell<bool>,
}

impl<'a, S: Scalar, T: TupleTransform> PeriodicArray<'a, S, T> {
    /// Creates an unbound view; it has no tuples until
    /// [`PeriodicArray::initialize_array`] is called.
    pub fn new(transform: T) -> Self {
        Self {
            source: None,
            transform,
            normalize: false,
            cache: RefCell::new(TupleCache::empty()),
            range: RefCell::new(RangeCache::default()),
            range_invalid: Cell::new(true),
        }
    }

    /// Creates a view bound to `source`.
    pub fn with_source(source: &'a AosArray<'a, S>, transform: T) -> Self {
        let mut view = Self::new(transform);
        view.initialize_array(source);
        view
    }

    /// Binds the view to `source`. No data is copied or transformed; the
    /// tuple cache is emptied and the range marked invalid.
    pub fn initialize_array(&mut self, source: &'a AosArray<'a, S>) {
        self.source = Some(source);
        self.reset_caches();
    }

    /// Unbinds the source and empties both caches.
    pub fn initialize(&mut self) {
        self.source = None;
        self.reset_caches();
    }

    /// The bound source array.
    #[must_use]
    pub fn source(&self) -> Option<&'a AosArray<'a, S>> {
        self.source
    }

    /// The transform applied to each tuple.
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Replaces the transform, emptying both caches.
    pub fn set_transform(&mut self, transform: T) {
        self.transform = transform;
        self.reset_caches();
    }

    /// Whether transformed tuples are rescaled to unit length.
    #[must_use]
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Sets the normalize flag, emptying both caches when it changes.
    pub fn set_normalize(&mut self, normalize: bool) {
        if self.normalize != normalize {
            self.normalize = normalize;
            self.reset_caches();
        }
    }

    /// Transformed tuple `tuple` as double values.
    ///
    /// The borrow must be released before the next read of this view.
    ///
    /// # Panics
    /// If the view is unbound, `tuple` is out of range, or a previous borrow
    /// returned by this method is still alive.
    pub fn tuple(&self, tuple: usize) -> Ref<'_, [f64]> {
        drop(self.cached(tuple));
        Ref::map(self.cache.borrow(), |cache| cache.doubles.as_slice())
    }

    /// Marks the component and magnitude ranges stale. The tuple cache is
    /// kept.
    pub fn invalidate_range(&self) {
        self.range_invalid.set(true);
    }

    /// Transformed range of each component, recomputed only after
    /// invalidation. `None` for an unbound or empty source.
    ///
    /// For 3-component tuples under an affine transform without
    /// normalization, the range is the box spanned by the eight transformed
    /// corners of the source's bounding box, rounded the way transformed
    /// values are stored, which contains every transformed tuple. Otherwise
    /// each tuple is transformed and scanned.
    #[must_use]
    pub fn scalar_range(&self) -> Option<Vec<[f64; 2]>> {
        self.ranges()
            .components
            .get_or_insert_with(|| self.compute_periodic_range())
            .clone()
    }

    /// Transformed range of one component.
    #[must_use]
    pub fn component_range(&self, component: usize) -> Option<[f64; 2]> {
        self.scalar_range()
            .and_then(|ranges| ranges.get(component).copied())
    }

    /// Range of the transformed tuple magnitudes, recomputed only after
    /// invalidation.
    ///
    /// Delegates to the source when the transform keeps magnitudes and the
    /// normalize flag is off; otherwise every tuple is transformed.
    #[must_use]
    pub fn vector_range(&self) -> Option<[f64; 2]> {
        *self
            .ranges()
            .magnitude
            .get_or_insert_with(|| self.compute_magnitude_range())
    }

    /// The range cache, emptied first if the ranges were invalidated.
    fn ranges(&self) -> RefMut<'_, RangeCache> {
        let mut ranges = self.range.borrow_mut();
        if self.range_invalid.replace(false) {
            *ranges = RangeCache::default();
        }
        ranges
    }

    fn compute_magnitude_range(&self) -> Option<[f64; 2]> {
        let source = self.source?;
        let components = source.number_of_components();
        if !self.normalize && self.transform.preserves_magnitude(components) {
            return magnitude_range(source);
        }
        let mut range = RangeAccumulator::new();
        self.scan_transformed(source, |values| range.add(magnitude(values)));
        range.finish()
    }

    fn reset_caches(&mut self) {
        *self.cache.get_mut() = TupleCache::empty();
        *self.range.get_mut() = RangeCache::default();
        self.range_invalid.set(true);
    }

    fn bound_source(&self) -> &'a AosArray<'a, S> {
        match self.source {
            Some(source) => source,
            None => panic!("periodic array read before initialize_array"),
        }
    }

    /// Ensures `tuple` is the cached tuple and returns the cache.
    fn cached(&self, tuple: usize) -> RefMut<'_, TupleCache<S>> {
        let mut cache = self.cache.borrow_mut();
        if cache.index != Some(tuple) {
            let source = self.bound_source();
            let TupleCache {
                index,
                scalars,
                doubles,
            } = &mut *cache;
            *index = None;
            scalars.resize(source.number_of_components(), S::default());
            doubles.resize(source.number_of_components(), 0.0);
            scalars.copy_from_slice(source.tuple_slice(tuple));
            self.apply(scalars, doubles);
            *index = Some(tuple);
        }
        cache
    }

    /// Transforms `scalars` in place, leaving the matching doubles in
    /// `doubles`.
    fn apply(&self, scalars: &mut [S], doubles: &mut [f64]) {
        for (double, &scalar) in doubles.iter_mut().zip(scalars.iter()) {
            *double = scalar.to_f64();
        }
        self.transform.transform(doubles);
        if self.normalize {
            normalize_in_place(doubles);
        }
        for (scalar, double) in scalars.iter_mut().zip(doubles.iter_mut()) {
            *scalar = S::from_f64(*double);
            *double = scalar.to_f64();
        }
    }

    /// Feeds every transformed tuple to `visit` without touching the tuple
    /// cache.
    fn scan_transformed<F: FnMut(&[f64])>(&self, source: &AosArray<'_, S>, mut visit: F) {
        let mut scalars = vec![S::default(); source.number_of_components()];
        let mut doubles = vec![0.0; source.number_of_components()];
        for raw in source.tuples() {
            scalars.copy_from_slice(raw);
            self.apply(&mut scalars, &mut doubles);
            visit(&doubles);
        }
    }

    fn compute_periodic_range(&self) -> Option<Vec<[f64; 2]>> {
        let source = self.source?;
        let components = source.number_of_components();
        log::debug!(
            "recomputing periodic range over {} tuples of {components} components",
            source.number_of_tuples()
        );

        if components == 3 && self.transform.is_affine() && !self.normalize {
            let bounds: Option<Vec<[f64; 2]>> = component_ranges(source).into_iter().collect();
            let bounds = bounds?;
            let mut ranges = [RangeAccumulator::new(); 3];
            for corner_mask in 0..8_usize {
                let mut corner = [0.0; 3];
                for (axis, value) in corner.iter_mut().enumerate() {
                    *value = bounds[axis][(corner_mask >> axis) & 1];
                }
                self.transform.transform(&mut corner);
                for (range, &value) in ranges.iter_mut().zip(&corner) {
                    range.add(value);
                }
            }
            return ranges
                .into_iter()
                .map(|range| {
                    range
                        .finish()
                        .map(|[lo, hi]| [stored::<S>(lo), stored::<S>(hi)])
                })
                .collect();
        }

        let mut ranges = vec![RangeAccumulator::new(); components];
        self.scan_transformed(source, |values| {
            for (range, &value) in ranges.iter_mut().zip(values) {
                range.add(value);
            }
        });
        ranges.into_iter().map(RangeAccumulator::finish).collect()
    }
}

impl<'a, S: Scalar> PeriodicArray<'a, S, AngularTransform> {
    /// Angular periodic replica of `source` described by `config`.
    #[must_use]
    pub fn angular(source: &'a AosArray<'a, S>, config: &AngularPeriodicConfig) -> Self {
        let mut view = Self::with_source(source, AngularTransform::from_config(config));
        view.normalize = config.normalize;
        view
    }
}

/// `value` as it reads back after being stored in an `S`.
fn stored<S: Scalar>(value: f64) -> f64 {
    S::from_f64(value).to_f64()
}

fn normalize_in_place(values: &mut [f64]) {
    let norm = magnitude(values);
    if norm > 0.0 {
        for value in values {
            *value /= norm;
        }
    }
}

fn read_only<R>(operation: &'static str) -> Result<R> {
    Err(Error::Unsupported { operation })
}

impl<S: Scalar, T: TupleTransform> GenericArray for PeriodicArray<'_, S, T> {
    type Scalar = S;

    fn layout(&self) -> ArrayLayout {
        ArrayLayout::Periodic
    }

    fn number_of_components(&self) -> usize {
        self.source.map_or(0, GenericArray::number_of_components)
    }

    fn number_of_tuples(&self) -> usize {
        self.source.map_or(0, GenericArray::number_of_tuples)
    }

    fn component(&self, tuple: usize, component: usize) -> S {
        self.cached(tuple).scalars[component]
    }

    fn typed_tuple(&self, tuple: usize, out: &mut [S]) {
        let cache = self.cached(tuple);
        out[..cache.scalars.len()].copy_from_slice(&cache.scalars);
    }

    fn component_f64(&self, tuple: usize, component: usize) -> f64 {
        self.cached(tuple).doubles[component]
    }

    fn tuple_f64(&self, tuple: usize, out: &mut [f64]) {
        let cache = self.cached(tuple);
        out[..cache.doubles.len()].copy_from_slice(&cache.doubles);
    }

    fn set_component(&mut self, _tuple: usize, _component: usize, _value: S) -> Result<()> {
        read_only("set_component")
    }

    fn set_typed_tuple(&mut self, _tuple: usize, _values: &[S]) -> Result<()> {
        read_only("set_typed_tuple")
    }

    fn set_value(&mut self, _value_index: usize, _value: S) -> Result<()> {
        read_only("set_value")
    }

    fn set_tuple_f64(&mut self, _tuple: usize, _values: &[f64]) -> Result<()> {
        read_only("set_tuple_f64")
    }

    fn set_number_of_components(&mut self, _components: usize) -> Result<()> {
        read_only("set_number_of_components")
    }

    fn allocate_tuples(&mut self, _tuples: usize) -> Result<()> {
        read_only("allocate_tuples")
    }

    fn reallocate_tuples(&mut self, _tuples: usize) -> Result<()> {
        read_only("reallocate_tuples")
    }

    fn set_number_of_tuples(&mut self, _tuples: usize) -> Result<()> {
        read_only("set_number_of_tuples")
    }

    fn insert_typed_tuple(&mut self, _tuple: usize, _values: &[S]) -> Result<()> {
        read_only("insert_typed_tuple")
    }

    fn insert_next_typed_tuple(&mut self, _values: &[S]) -> Result<usize> {
        read_only("insert_next_typed_tuple")
    }

    fn remove_tuple(&mut self, _tuple: usize) -> Result<()> {
        read_only("remove_tuple")
    }

    fn remove_last_tuple(&mut self) -> Result<()> {
        read_only("remove_last_tuple")
    }

    fn lookup_value(&self, _value: S) -> Result<Option<usize>> {
        read_only("lookup_value")
    }

    fn lookup_all_values(&self, _value: S) -> Result<Vec<usize>> {
        read_only("lookup_all_values")
    }

    /// Only the view's own caches; the source is not counted.
    fn actual_memory_size(&self) -> usize {
        let cache = self.cache.borrow();
        cache.scalars.capacity() * S::SCALAR_TYPE.size_in_bytes()
            + cache.doubles.capacity() * std::mem::size_of::<f64>()
    }
}

impl<S: Scalar, T: TupleTransform> fmt::Debug for PeriodicArray<'_, S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicArray")
            .field("bound", &self.source.is_some())
            .field("tuples", &self.number_of_tuples())
            .field("components", &self.number_of_components())
            .field("normalize", &self.normalize)
            .field("cached_tuple", &self.cache.borrow().index)
            .field("range_invalid", &self.range_invalid.get())
            .finish_non_exhaustive()
    }
}
