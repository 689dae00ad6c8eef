//! # Object Serialization Utilities
//!
//! Save and load arbitrary serde values (fitted models, preprocessors,
//! encoders) using `bincode` as the binary format. The format is opaque and
//! only meant to be read back by this crate.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::paths::ensure_parent_dir;
use crate::error::{wrap, Operation, Result};

/// Serializes `obj` to `path`, creating missing parent directories.
///
/// Fails with a wrapped error if `obj` cannot be represented in the binary
/// format or the file cannot be written.
#[track_caller]
pub fn save_object<T, P>(path: P, obj: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    wrap(Operation::SaveObject, path, || {
        ensure_parent_dir(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, obj)?;
        writer.flush()?;
        Ok(())
    })
}

/// Loads an object previously written by [`save_object`].
///
/// # Arguments
/// * `path`: Location of the object file.
///
/// # Returns
/// The reconstructed object, or a wrapped error if the file is missing,
/// truncated, or does not hold a `T`.
#[track_caller]
pub fn load_object<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    wrap(Operation::LoadObject, path, || {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use serde::{Deserialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct StandardScaler {
        mean: Vec<f64>,
        scale: Vec<f64>,
        feature_names: Option<Vec<String>>,
        params: BTreeMap<String, i64>,
    }

    fn scaler() -> StandardScaler {
        StandardScaler {
            mean: vec![0.5, -1.25, 3.0],
            scale: vec![1.0, 2.0, 0.75],
            feature_names: Some(vec!["a".into(), "b".into(), "c".into()]),
            params: BTreeMap::from([("with_mean".to_string(), 1), ("copy".to_string(), 0)]),
        }
    }

    #[test]
    fn object_round_trips_into_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("artifacts/preprocessing/scaler.bin");

        save_object(&path, &scaler()).unwrap();
        let back: StandardScaler = load_object(&path).unwrap();
        assert_eq!(back, scaler());
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize a live connection"))
        }
    }

    #[test]
    fn serialization_fault_is_wrapped() {
        let tmp = tempfile::tempdir().unwrap();
        let err = save_object(tmp.path().join("conn.bin"), &Unserializable).unwrap_err();
        assert_eq!(err.operation(), Operation::SaveObject);
        assert!(matches!(err.fault(), Fault::Bincode(_)));
        assert!(err.to_string().contains("cannot serialize a live connection"));
    }

    #[test]
    fn truncated_file_is_wrapped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scaler.bin");
        save_object(&path, &scaler()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = load_object::<StandardScaler, _>(&path).unwrap_err();
        assert_eq!(err.operation(), Operation::LoadObject);
        assert!(matches!(err.fault(), Fault::Bincode(_)));
    }
}
