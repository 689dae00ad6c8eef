//! # Numeric Array Utilities
//!
//! Save and load `ndarray` arrays in the NumPy `.npy` container format
//! (a header describing dtype and shape followed by the raw buffer), so
//! arrays written here can also be opened with `numpy.load`.

use ndarray::{Array, ArrayBase, Data, Dimension};
use ndarray_npy::{ReadNpyExt, ReadableElement, WritableElement, WriteNpyExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::paths::ensure_parent_dir;
use crate::error::{wrap, Operation, Result};

/// Writes `array` to `path` as `.npy`, creating missing parent directories.
///
/// # Arguments
/// * `path`: Destination file.
/// * `array`: Any array (owned, view, any dimensionality) with an element
///   type that has a NumPy dtype.
#[track_caller]
pub fn save_numpy_array_data<A, S, D, P>(path: P, array: &ArrayBase<S, D>) -> Result<()>
where
    A: WritableElement,
    S: Data<Elem = A>,
    D: Dimension,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    wrap(Operation::SaveArray, path, || {
        ensure_parent_dir(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        array.write_npy(&mut writer)?;
        writer.flush()?;
        Ok(())
    })
}

/// Reads an `.npy` file into an owned array.
///
/// The caller picks the element type `A` and dimensionality `D`
/// (`IxDyn` accepts any shape). A file whose dtype or number of axes does not
/// match fails with a wrapped error, as does a missing or truncated file.
#[track_caller]
pub fn load_numpy_array_data<A, D, P>(path: P) -> Result<Array<A, D>>
where
    A: ReadableElement,
    D: Dimension,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    wrap(Operation::LoadArray, path, || {
        let reader = BufReader::new(File::open(path)?);
        Ok(Array::<A, D>::read_npy(reader)?)
    })
}
