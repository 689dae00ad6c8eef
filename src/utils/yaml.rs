//! # YAML Document Utilities
//!
//! Reading and writing structured documents (pipeline configs, schemas,
//! reports) as YAML via `serde_yaml`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use super::paths::ensure_parent_dir;
use crate::error::{wrap, Operation, Result};

/// Reads a YAML file into a generic document tree.
///
/// Fails with a wrapped error if the file is missing or is not valid YAML.
#[track_caller]
pub fn read_yaml_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    read_yaml_as(path)
}

/// Reads a YAML file straight into a typed value.
#[track_caller]
pub fn read_yaml_as<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    wrap(Operation::ReadYaml, path, || {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_yaml::from_reader(reader)?)
    })
}

/// Writes `content` to `path` as YAML.
///
/// # Arguments
/// * `path`: Destination file. Missing parent directories are created.
/// * `content`: Any serializable value.
/// * `replace`: Delete an existing file at `path` before writing. This is not
///   atomic: if the process dies between the delete and the write, the old
///   file is gone.
#[track_caller]
pub fn write_yaml_file<T, P>(path: P, content: &T, replace: bool) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    wrap(Operation::WriteYaml, path, || {
        if replace {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        ensure_parent_dir(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        serde_yaml::to_writer(&mut writer, content)?;
        writer.flush()?;
        Ok(())
    })
}
