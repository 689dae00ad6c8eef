//! # Utility Functions (`utils`)
//!
//! Persistence helpers for the three data shapes the pipeline stores on disk:
//! YAML documents, arbitrary serde objects and numeric arrays. Every helper
//! reports failure as a [`PipelineError`](crate::error::PipelineError).

pub mod arrays;
pub mod paths;
pub mod serialization;
pub mod yaml;

pub use arrays::{load_numpy_array_data, save_numpy_array_data};
pub use serialization::{load_object, save_object};
pub use yaml::{read_yaml_as, read_yaml_file, write_yaml_file};
