//! Layout-agnostic tuple copies between runtime-typed arrays.
//!
//! Each operation resolves its arguments once with [`dispatch!`] and then
//! runs a single generic routine against the concrete array types, so any
//! pair of layouts and scalar types can be combined.

use crate::any::AnyArray;
use crate::dispatch;
use colarray_core::{Error, GenericArray, Result, Scalar};

/// Copies tuple `source_tuple` of `source` into tuple `dest_tuple` of `dest`.
///
/// Both arrays must carry the same scalar tag and component count; a mismatch
/// is logged as a warning and reported without touching `dest`.
///
/// # Errors
/// [`Error::ScalarTypeMismatch`], [`Error::ComponentCountMismatch`], or
/// [`Error::Unsupported`] when `dest` is read-only.
pub fn set_tuple(
    dest: &mut AnyArray<'_>,
    dest_tuple: usize,
    source: &AnyArray<'_>,
    source_tuple: usize,
) -> Result<()> {
    if dest.scalar_type() != source.scalar_type() {
        log::warn!(
            "set_tuple: scalar type mismatch ({} <- {})",
            dest.scalar_type(),
            source.scalar_type()
        );
        return Err(Error::ScalarTypeMismatch {
            dest: dest.scalar_type(),
            src: source.scalar_type(),
        });
    }
    set_tuple_converting(dest, dest_tuple, source, source_tuple)
}

/// Like [`set_tuple`] but accepts differing scalar types, casting each
/// component with [`Scalar::cast`].
///
/// # Errors
/// [`Error::ComponentCountMismatch`], or [`Error::Unsupported`] when `dest`
/// is read-only.
pub fn set_tuple_converting(
    dest: &mut AnyArray<'_>,
    dest_tuple: usize,
    source: &AnyArray<'_>,
    source_tuple: usize,
) -> Result<()> {
    check_components(dest, source, "set_tuple")?;
    dispatch!(dest, dest => set_tuple_from(dest, dest_tuple, source, source_tuple))
}

/// Second dispatch stage: `dest` is resolved, `source` is not.
fn set_tuple_from<D: GenericArray + ?Sized>(
    dest: &mut D,
    dest_tuple: usize,
    source: &AnyArray<'_>,
    source_tuple: usize,
) -> Result<()> {
    dispatch!(source, source => copy_tuple(dest, dest_tuple, source, source_tuple))
}

/// Copies one tuple between two concrete arrays, casting every component.
///
/// Component counts are not checked; `source` must have at least as many
/// components as `dest`.
///
/// # Errors
/// Whatever `dest` returns from [`GenericArray::set_component`].
pub fn copy_tuple<D, S>(dest: &mut D, dest_tuple: usize, source: &S, source_tuple: usize) -> Result<()>
where
    D: GenericArray + ?Sized,
    S: GenericArray + ?Sized,
{
    for component in 0..dest.number_of_components() {
        let value = source.component(source_tuple, component).cast::<D::Scalar>();
        dest.set_component(dest_tuple, component, value)?;
    }
    Ok(())
}

/// Reads tuple `tuple` of `source` into `out` as double precision values.
///
/// # Errors
/// [`Error::TupleSizeMismatch`] if `out` is shorter than the component count.
pub fn get_tuple(source: &AnyArray<'_>, tuple: usize, out: &mut [f64]) -> Result<()> {
    let components = source.number_of_components();
    if out.len() < components {
        return Err(Error::TupleSizeMismatch {
            expected: components,
            actual: out.len(),
        });
    }
    dispatch!(source, source => source.tuple_f64(tuple, out));
    Ok(())
}

/// Copies the tuples listed in `ids` into `output`, which is resized to
/// `ids.len()` tuples. Tuple `i` of `output` receives tuple `ids[i]`.
///
/// # Errors
/// [`Error::ComponentCountMismatch`], resize failures of `output`, or
/// [`Error::Unsupported`] when `output` is read-only.
pub fn get_tuples(source: &AnyArray<'_>, ids: &[usize], output: &mut AnyArray<'_>) -> Result<()> {
    check_components(output, source, "get_tuples")?;
    dispatch!(output, output => {
        output.set_number_of_tuples(ids.len())?;
        for (dest_tuple, &source_tuple) in ids.iter().enumerate() {
            set_tuple_from(output, dest_tuple, source, source_tuple)?;
        }
        Ok(())
    })
}

/// Copies tuples `first..=last` of `source` into `output`, which is resized
/// to hold exactly that many tuples.
///
/// # Errors
/// See [`get_tuples`].
///
/// # Panics
/// If `last < first`.
pub fn get_tuple_range(
    source: &AnyArray<'_>,
    first: usize,
    last: usize,
    output: &mut AnyArray<'_>,
) -> Result<()> {
    assert!(first <= last, "empty tuple range {first}..={last}");
    let ids: Vec<usize> = (first..=last).collect();
    get_tuples(source, &ids, output)
}

fn check_components(dest: &AnyArray<'_>, source: &AnyArray<'_>, operation: &str) -> Result<()> {
    let (dest_components, src_components) =
        (dest.number_of_components(), source.number_of_components());
    if dest_components != src_components {
        log::warn!(
            "{operation}: component count mismatch ({dest_components} <- {src_components})"
        );
        return Err(Error::ComponentCountMismatch {
            dest: dest_components,
            src: src_components,
        });
    }
    Ok(())
}
