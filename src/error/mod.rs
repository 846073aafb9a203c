//! Error handling module for media export runs.
//!
//! This module provides:
//! - A crate-wide error type covering configuration, connection and export failures
//! - Per-asset export error kinds that the pipeline downgrades to warnings
//! - One-line descriptions of MongoDB driver errors for terminal output
//!
//! # Example
//!
//! ```rust,no_run
//! use media_export::error::{ExportError, MediaExportError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ExportError::Write {
//!         path: "Data/MediaExport/a.jpg".into(),
//!         message: "permission denied".into(),
//!     }
//!     .into())
//! }
//!
//! if let Err(MediaExportError::Export(e)) = example_operation() {
//!     assert!(!e.is_fatal());
//! }
//! ```

pub mod kinds;
pub mod mongo;

// Re-export commonly used types
pub use kinds::{ConfigError, ConnectionError, ExportError, MediaExportError, Result};
pub use mongo::describe_mongodb_error;
