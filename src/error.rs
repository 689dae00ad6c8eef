//! # Error Types
//!
//! Every persistence helper in [`crate::utils`] reports failure through one
//! type, [`PipelineError`]. The original fault is kept as the error source and
//! the call site plus a backtrace are attached as context, so a failing file
//! operation can be diagnosed from the error alone.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};

/// Convenience alias used throughout the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

// --- Operations ---

/// The persistence operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadYaml,
    WriteYaml,
    SaveObject,
    LoadObject,
    SaveArray,
    LoadArray,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ReadYaml => "read_yaml_file",
            Operation::WriteYaml => "write_yaml_file",
            Operation::SaveObject => "save_object",
            Operation::LoadObject => "load_object",
            Operation::SaveArray => "save_numpy_array_data",
            Operation::LoadArray => "load_numpy_array_data",
        };
        f.write_str(name)
    }
}

// --- Underlying Faults ---

/// The low-level failure wrapped by a [`PipelineError`].
#[derive(thiserror::Error, Debug)]
pub enum Fault {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML Error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Serialization Error (Bincode): {0}")]
    Bincode(#[from] bincode::Error),
    #[error("NPY read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),
    #[error("NPY write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),
}

impl Fault {
    /// The I/O error kind, when the fault originated in the file system.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Fault::Io(err) => Some(err.kind()),
            Fault::Bincode(err) => match err.as_ref() {
                bincode::ErrorKind::Io(io) => Some(io.kind()),
                _ => None,
            },
            Fault::NpyRead(ndarray_npy::ReadNpyError::Io(io)) => Some(io.kind()),
            Fault::NpyWrite(ndarray_npy::WriteNpyError::Io(io)) => Some(io.kind()),
            _ => None,
        }
    }
}

// --- Execution Context ---

/// Where a failure was raised: the caller's source location and, when
/// enabled through `RUST_BACKTRACE`, the captured stack.
#[derive(Debug)]
pub struct ErrorContext {
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl ErrorContext {
    #[track_caller]
    pub fn capture() -> Self {
        ErrorContext {
            location: Location::caller(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    pub fn line(&self) -> u32 {
        self.location.line()
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location.file(), self.location.line())?;
        if self.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

// --- Domain Error ---

/// The single error type surfaced by every persistence helper.
#[derive(thiserror::Error, Debug)]
#[error("{operation} failed for '{}' at {}: {source}", .path.display(), .context.location)]
pub struct PipelineError {
    operation: Operation,
    path: PathBuf,
    #[source]
    source: Fault,
    context: ErrorContext,
}

impl PipelineError {
    /// Wraps `fault` raised while running `operation` on `path`, recording the
    /// caller's location.
    #[track_caller]
    pub fn wrap(operation: Operation, path: impl Into<PathBuf>, fault: impl Into<Fault>) -> Self {
        PipelineError {
            operation,
            path: path.into(),
            source: fault.into(),
            context: ErrorContext::capture(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The original fault.
    pub fn fault(&self) -> &Fault {
        &self.source
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Shorthand for `self.fault().io_kind()`.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        self.source.io_kind()
    }
}

// --- Error Boundary ---

/// Runs `body` and maps any fault it returns into a [`PipelineError`].
///
/// Public helpers are `#[track_caller]` too, so the recorded location is the
/// line that called the helper rather than a line inside this crate.
#[track_caller]
pub(crate) fn wrap<T, F>(operation: Operation, path: &Path, body: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, Fault>,
{
    let location = Location::caller();
    match body() {
        Ok(value) => {
            tracing::debug!(%operation, path = %path.display(), "completed");
            Ok(value)
        }
        Err(fault) => {
            tracing::error!(%operation, path = %path.display(), error = %fault, "failed");
            Err(PipelineError {
                operation,
                path: path.to_path_buf(),
                source: fault,
                context: ErrorContext {
                    location,
                    backtrace: Backtrace::capture(),
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn wrap_keeps_original_fault_as_source() {
        let err = PipelineError::wrap(
            Operation::ReadYaml,
            "missing.yaml",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.operation(), Operation::ReadYaml);
        assert_eq!(err.path(), Path::new("missing.yaml"));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));

        let source = err.source().expect("source is set");
        assert!(source.to_string().contains("no such file"));
    }

    #[test]
    fn display_names_operation_path_and_location() {
        let err = PipelineError::wrap(
            Operation::SaveObject,
            "out/model.bin",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let line = line!() - 5;
        let text = err.to_string();
        assert!(text.starts_with("save_object failed for 'out/model.bin'"), "{text}");
        assert!(text.contains(&format!("{}:{}", file!(), line)), "{text}");
        assert!(text.ends_with("IO Error: denied"), "{text}");
        assert_eq!(err.context().file(), file!());
        assert_eq!(err.context().line(), line);
    }

    #[test]
    fn boundary_passes_success_through() {
        let value = wrap(Operation::LoadObject, Path::new("x.bin"), || Ok(7)).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn boundary_records_its_caller() {
        let err = wrap::<(), _>(Operation::LoadArray, Path::new("x.npy"), || {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short").into())
        })
        .unwrap_err();
        assert_eq!(err.context().file(), file!());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn bincode_io_errors_report_their_kind() {
        let fault = Fault::from(Box::new(bincode::ErrorKind::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "eof",
        ))));
        assert_eq!(fault.io_kind(), Some(io::ErrorKind::UnexpectedEof));
    }
}
