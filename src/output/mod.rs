//! Output module for reporting on stored postings
//!
//! This module handles:
//! - Statistics over the job database
//! - CSV export of stored (and unsaved) postings

pub mod export;
pub mod stats;

pub use export::{export_csv, export_to_dir, export_unsaved_to_dir};
pub use stats::{load_statistics, print_statistics, JobStatistics};
