//! # Size-Based Log Rotation
//!
//! [`RotatingFileAppender`] writes to one active file. Before a record would
//! push that file past `max_bytes`, the file is renamed to `<name>.1`, older
//! backups shift up by one (`.1` → `.2`, ...) and anything past
//! `backup_count` is dropped. A `max_bytes` or `backup_count` of zero turns
//! rotation off.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

use crate::utils::paths::ensure_parent_dir;

/// A size-rotated log file usable as a `tracing_subscriber` writer.
#[derive(Debug)]
pub struct RotatingFileAppender {
    path: PathBuf,
    state: Mutex<ActiveFile>,
}

#[derive(Debug)]
struct ActiveFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backup_count: usize,
}

impl RotatingFileAppender {
    /// Opens (or creates) `path` in append mode.
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(RotatingFileAppender {
            path: path.clone(),
            state: Mutex::new(ActiveFile {
                path,
                file,
                written,
                max_bytes,
                backup_count,
            }),
        })
    }

    /// The active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th backup (`1` is the most recent).
    pub fn backup_path(&self, index: usize) -> PathBuf {
        backup_path(&self.path, index)
    }

    fn lock(&self) -> MutexGuard<'_, ActiveFile> {
        // a panic mid-write leaves the file usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActiveFile {
    fn should_rollover(&self, incoming: usize) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && self.written > 0
            && self.written + incoming as u64 > self.max_bytes
    }

    fn rollover(&mut self) -> io::Result<()> {
        self.file.flush()?;
        for index in (1..self.backup_count).rev() {
            let src = backup_path(&self.path, index);
            if src.exists() {
                replace(&src, &backup_path(&self.path, index + 1))?;
            }
        }
        replace(&self.path, &backup_path(&self.path, 1))?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

/// Exclusive handle on the active file for the duration of one record.
pub struct RotatingWriter<'a> {
    state: MutexGuard<'a, ActiveFile>,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state.should_rollover(buf.len()) {
            self.state.rollover()?;
        }
        // a record must not straddle two files
        self.state.file.write_all(buf)?;
        self.state.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileAppender {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter { state: self.lock() }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Renames `src` over `dst`, removing `dst` first so this also works where
/// rename does not overwrite.
fn replace(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::remove_file(dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::rename(src, dst)
}
