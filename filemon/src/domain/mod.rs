//! Domain model for filemon
//!
//! Core event types and structured errors shared by the monitor pipeline.

pub mod errors;
pub mod types;

pub use errors::{DecodeError, MonitorError};
pub use types::{FileActivityEvent, FileOperation};
