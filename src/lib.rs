//! # Pipeline Utilities
//!
//! Shared plumbing for the ML pipeline: a process-wide logging bootstrap and
//! persistence helpers for YAML documents, serialized objects and numeric
//! arrays. Every persistence helper fails with a single
//! [`PipelineError`](error::PipelineError).

pub mod error;
pub mod logger;
pub mod utils;

pub use error::{PipelineError, Result};
pub use logger::{LogConfig, LoggingContext};
pub use utils::{
    load_numpy_array_data, load_object, read_yaml_as, read_yaml_file, save_numpy_array_data,
    save_object, write_yaml_file,
};
