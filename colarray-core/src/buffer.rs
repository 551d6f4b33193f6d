//! Contiguous typed storage with explicit ownership.
//!
//! A [`TypedBuffer`] either owns its elements or borrows memory supplied by
//! the caller. Borrowed memory is never resized in place and never released:
//! any size change copies into a fresh owned allocation and forgets the
//! borrowed slice.

use crate::error::{Error, Result};
use crate::scalar::Scalar;
use std::fmt;

/// How owned memory is handed back when a buffer replaces or drops it.
pub enum Release<S> {
    /// Ordinary deallocation.
    Drop,
    /// Invoked exactly once with the memory when it is released.
    Custom(Box<dyn FnOnce(Vec<S>) + Send + Sync>),
}

impl<S> Release<S> {
    /// Wraps a deleter closure.
    pub fn custom<F>(deleter: F) -> Self
    where
        F: FnOnce(Vec<S>) + Send + Sync + 'static,
    {
        Self::Custom(Box::new(deleter))
    }

    fn release(self, data: Vec<S>) {
        match self {
            Self::Drop => drop(data),
            Self::Custom(deleter) => deleter(data),
        }
    }
}

impl<S> fmt::Debug for Release<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => f.write_str("Drop"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Who is responsible for the memory behind a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The buffer allocated or adopted the memory and releases it.
    Owned,
    /// The caller keeps the memory; the buffer only references it.
    Borrowed,
}

enum Memory<'a, S> {
    Owned { data: Vec<S>, release: Release<S> },
    Borrowed(&'a mut [S]),
}

impl<S> Memory<'_, S> {
    fn release(self) {
        if let Memory::Owned { data, release } = self {
            release.release(data);
        }
    }
}

/// A resizable block of scalars that owns or borrows its memory.
///
/// Invariant: `capacity() >= len()`.
pub struct TypedBuffer<'a, S: Scalar> {
    memory: Memory<'a, S>,
}

impl<'a, S: Scalar> TypedBuffer<'a, S> {
    /// Creates an empty owned buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Adopts a vector with ordinary deallocation.
    #[must_use]
    pub fn from_vec(data: Vec<S>) -> Self {
        Self {
            memory: Memory::Owned {
                data,
                release: Release::Drop,
            },
        }
    }

    /// Creates a buffer referencing caller-owned memory.
    #[must_use]
    pub fn borrowed(data: &'a mut [S]) -> Self {
        Self {
            memory: Memory::Borrowed(data),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.memory {
            Memory::Owned { data, .. } => data.len(),
            Memory::Borrowed(data) => data.len(),
        }
    }

    /// Returns true if the buffer holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements the current memory can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.memory {
            Memory::Owned { data, .. } => data.capacity(),
            Memory::Borrowed(data) => data.len(),
        }
    }

    /// Reports whether the memory is owned or borrowed.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        match self.memory {
            Memory::Owned { .. } => Ownership::Owned,
            Memory::Borrowed(_) => Ownership::Borrowed,
        }
    }

    /// Element slice. Invalidated by any call that may reallocate.
    #[must_use]
    pub fn as_slice(&self) -> &[S] {
        match &self.memory {
            Memory::Owned { data, .. } => data,
            Memory::Borrowed(data) => data,
        }
    }

    /// Mutable element slice. Writes to borrowed memory reach the caller.
    pub fn as_mut_slice(&mut self) -> &mut [S] {
        match &mut self.memory {
            Memory::Owned { data, .. } => data,
            Memory::Borrowed(data) => data,
        }
    }

    /// Raw pointer to the first element.
    #[must_use]
    pub fn as_ptr(&self) -> *const S {
        self.as_slice().as_ptr()
    }

    /// Adopts externally allocated memory, releasing the previous memory.
    ///
    /// `release` decides how `data` is handed back when it is replaced or the
    /// buffer is dropped.
    pub fn set_buffer(&mut self, data: Vec<S>, release: Release<S>) {
        self.replace(Memory::Owned { data, release });
    }

    /// References caller-owned memory, releasing the previous memory.
    ///
    /// The slice is never freed or resized by this buffer; growth or shrink
    /// requests switch to a new owned allocation.
    pub fn set_borrowed(&mut self, data: &'a mut [S]) {
        self.replace(Memory::Borrowed(data));
    }

    /// Discards the contents and provides `len` zeroed elements.
    ///
    /// # Errors
    /// Returns [`Error::AllocationFailed`] if memory cannot be reserved; the
    /// buffer is left unchanged in that case.
    pub fn allocate(&mut self, len: usize) -> Result<()> {
        match &mut self.memory {
            Memory::Owned { data, .. } => {
                data.try_reserve(len.saturating_sub(data.len()))
                    .map_err(|_| Error::AllocationFailed { requested: len })?;
                data.clear();
                data.resize(len, S::default());
            }
            Memory::Borrowed(_) => {
                log::debug!("allocating owned storage for {len} elements, forgetting borrowed memory");
                let fresh = zeroed(len)?;
                self.replace(Memory::Owned {
                    data: fresh,
                    release: Release::Drop,
                });
            }
        }
        Ok(())
    }

    /// Resizes to `len` elements, keeping the common prefix and zero-filling
    /// any new tail.
    ///
    /// # Errors
    /// Returns [`Error::AllocationFailed`] if memory cannot be reserved; the
    /// buffer is left unchanged in that case.
    pub fn reallocate(&mut self, len: usize) -> Result<()> {
        match &mut self.memory {
            Memory::Owned { data, .. } => {
                if len > data.len() {
                    data.try_reserve(len - data.len())
                        .map_err(|_| Error::AllocationFailed { requested: len })?;
                }
                data.resize(len, S::default());
            }
            Memory::Borrowed(borrowed) => {
                if len == borrowed.len() {
                    return Ok(());
                }
                log::debug!(
                    "reallocating borrowed buffer from {} to {len} elements as owned storage",
                    borrowed.len()
                );
                let mut fresh = Vec::new();
                fresh
                    .try_reserve_exact(len)
                    .map_err(|_| Error::AllocationFailed { requested: len })?;
                let keep = len.min(borrowed.len());
                fresh.extend_from_slice(&borrowed[..keep]);
                fresh.resize(len, S::default());
                self.replace(Memory::Owned {
                    data: fresh,
                    release: Release::Drop,
                });
            }
        }
        Ok(())
    }

    /// Makes room for `len` elements without changing the contents, so a
    /// following [`TypedBuffer::reallocate`] to `len` cannot fail.
    ///
    /// Borrowed memory whose length differs from `len` is copied into owned
    /// memory first; the caller's slice is left as it was.
    ///
    /// # Errors
    /// Returns [`Error::AllocationFailed`] if memory cannot be reserved; the
    /// buffer is left unchanged in that case.
    pub fn reserve(&mut self, len: usize) -> Result<()> {
        match &self.memory {
            Memory::Borrowed(borrowed) if borrowed.len() == len => Ok(()),
            _ => self.reserve_owned(len),
        }
    }

    /// Like [`TypedBuffer::reserve`], but always leaves the values in owned
    /// memory, so a following [`TypedBuffer::allocate`] to `len` cannot fail.
    ///
    /// # Errors
    /// Returns [`Error::AllocationFailed`] if memory cannot be reserved; the
    /// buffer is left unchanged in that case.
    pub fn reserve_owned(&mut self, len: usize) -> Result<()> {
        match &mut self.memory {
            Memory::Owned { data, .. } => {
                data.try_reserve(len.saturating_sub(data.len()))
                    .map_err(|_| Error::AllocationFailed { requested: len })?;
            }
            Memory::Borrowed(borrowed) => {
                let mut owned = Vec::new();
                owned
                    .try_reserve_exact(len.max(borrowed.len()))
                    .map_err(|_| Error::AllocationFailed { requested: len })?;
                owned.extend_from_slice(borrowed);
                self.replace(Memory::Owned {
                    data: owned,
                    release: Release::Drop,
                });
            }
        }
        Ok(())
    }

    /// Overwrites every element with `value`.
    pub fn fill(&mut self, value: S) {
        self.as_mut_slice().fill(value);
    }

    /// Bytes held by this buffer's own memory (borrowed memory counts as zero).
    #[must_use]
    pub fn owned_bytes(&self) -> usize {
        match &self.memory {
            Memory::Owned { data, .. } => data.capacity() * S::SCALAR_TYPE.size_in_bytes(),
            Memory::Borrowed(_) => 0,
        }
    }

    fn replace(&mut self, memory: Memory<'a, S>) {
        std::mem::replace(&mut self.memory, memory).release();
    }
}

fn zeroed<S: Scalar>(len: usize) -> Result<Vec<S>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed { requested: len })?;
    data.resize(len, S::default());
    Ok(data)
}

impl<S: Scalar> Default for TypedBuffer<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scalar> Clone for TypedBuffer<'_, S> {
    /// Deep copy into owned memory, whatever the source ownership.
    fn clone(&self) -> Self {
        Self::from_vec(self.as_slice().to_vec())
    }
}

impl<S: Scalar> Drop for TypedBuffer<'_, S> {
    fn drop(&mut self) {
        let empty = Memory::Owned {
            data: Vec::new(),
            release: Release::Drop,
        };
        std::mem::replace(&mut self.memory, empty).release();
    }
}

impl<S: Scalar> fmt::Debug for TypedBuffer<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("ownership", &self.ownership())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_allocate_zero_fills() {
        let mut buffer = TypedBuffer::<i32>::from_vec(vec![7, 8, 9]);
        buffer.allocate(5).unwrap();
        assert_eq!(buffer.as_slice(), &[0, 0, 0, 0, 0]);
        assert!(buffer.capacity() >= buffer.len());
    }

    #[test]
    fn test_reallocate_keeps_prefix() {
        let mut buffer = TypedBuffer::<f32>::from_vec(vec![1.0, 2.0, 3.0]);
        buffer.reallocate(5).unwrap();
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0, 0.0, 0.0]);
        buffer.reallocate(2).unwrap();
        assert_eq!(buffer.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_borrowed_growth_switches_to_owned() {
        let mut external = vec![1.0_f64, 2.0, 3.0];
        let external_ptr = external.as_ptr();
        {
            let mut buffer = TypedBuffer::borrowed(&mut external);
            assert_eq!(buffer.ownership(), Ownership::Borrowed);
            assert_eq!(buffer.owned_bytes(), 0);

            buffer.reallocate(6).unwrap();
            assert_eq!(buffer.ownership(), Ownership::Owned);
            assert_ne!(buffer.as_ptr(), external_ptr);
            assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);

            buffer.as_mut_slice()[0] = 42.0;
        }
        // Caller memory is intact and still usable.
        assert_eq!(external, vec![1.0, 2.0, 3.0]);
        assert_eq!(external.as_ptr(), external_ptr);
    }

    #[test]
    fn test_borrowed_allocate_forgets_slice() {
        let mut external = [5_u8; 4];
        let mut buffer = TypedBuffer::borrowed(&mut external);
        buffer.allocate(4).unwrap();
        assert_eq!(buffer.ownership(), Ownership::Owned);
        assert_eq!(buffer.as_slice(), &[0, 0, 0, 0]);
        drop(buffer);
        assert_eq!(external, [5, 5, 5, 5]);
    }

    #[test]
    fn test_borrowed_writes_reach_caller() {
        let mut external = vec![0_i16; 3];
        {
            let mut buffer = TypedBuffer::borrowed(&mut external);
            buffer.as_mut_slice()[1] = 11;
            buffer.reallocate(3).unwrap();
            assert_eq!(buffer.ownership(), Ownership::Borrowed);
        }
        assert_eq!(external, vec![0, 11, 0]);
    }

    #[test]
    fn test_custom_release_runs_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let mut buffer = TypedBuffer::<u32>::new();
        buffer.set_buffer(
            vec![1, 2, 3],
            Release::custom(move |data| {
                assert_eq!(data.len(), 3);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(released.load(Ordering::SeqCst), 0);

        buffer.set_buffer(vec![4], Release::Drop);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        drop(buffer);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_release_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let mut buffer = TypedBuffer::<f64>::new();
        buffer.set_buffer(
            vec![0.5; 8],
            Release::custom(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        drop(buffer);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reserve_keeps_contents() {
        let mut buffer = TypedBuffer::<u16>::from_vec(vec![1, 2, 3]);
        buffer.reserve(10).unwrap();
        assert!(buffer.capacity() >= 10);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);

        let mut external = [4_u16, 5];
        {
            let mut borrowed = TypedBuffer::borrowed(&mut external);
            borrowed.reserve(2).unwrap();
            assert_eq!(borrowed.ownership(), Ownership::Borrowed);
            borrowed.reserve(6).unwrap();
            assert_eq!(borrowed.ownership(), Ownership::Owned);
            assert_eq!(borrowed.as_slice(), &[4, 5]);
            assert!(borrowed.capacity() >= 6);
        }
        {
            let mut borrowed = TypedBuffer::borrowed(&mut external);
            borrowed.reserve_owned(2).unwrap();
            assert_eq!(borrowed.ownership(), Ownership::Owned);
            assert_eq!(borrowed.as_slice(), &[4, 5]);
        }
        assert_eq!(external, [4, 5]);

        assert!(buffer.reserve(usize::MAX).is_err());
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_allocation_failure_leaves_buffer_intact() {
        let mut buffer = TypedBuffer::<f64>::from_vec(vec![1.0, 2.0]);
        let err = buffer.reallocate(usize::MAX).unwrap_err();
        assert_eq!(
            err,
            Error::AllocationFailed {
                requested: usize::MAX
            }
        );
        assert_eq!(buffer.as_slice(), &[1.0, 2.0]);

        assert!(buffer.allocate(usize::MAX).is_err());
        assert_eq!(buffer.as_slice(), &[1.0, 2.0]);
    }
}
