//! Media Export Library
//!
//! This library exports media assets (binary content plus a JSON metadata
//! sidecar) from an asset repository into a directory on the filesystem.
//! It can be embedded to drive exports from other tools.
//!
//! # Modules
//!
//! - `asset`: Asset data model
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `export`: Filtering, writing, aggregation and the export coordinator
//! - `formatter`: Report lines and tables
//! - `repository`: Asset repository abstraction with MongoDB and in-memory adapters
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use media_export::{
//!     config::Config,
//!     connection::ConnectionManager,
//!     export::{AssetExporter, ConsoleReport, ExportCoordinator, FilterCriteria},
//!     repository::MongoAssetRepository,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let mut manager = ConnectionManager::new(config.connection.clone());
//!     manager.connect().await?;
//!
//!     let repository = MongoAssetRepository::new(
//!         &manager.database()?,
//!         &config.connection.assets_collection,
//!         &config.connection.resource_bucket,
//!         config.connection.batch_size,
//!     );
//!     let mut coordinator = ExportCoordinator::new(
//!         Arc::new(repository),
//!         FilterCriteria::new("", "", true),
//!         AssetExporter::new(&config.export.directory),
//!         Box::new(ConsoleReport::new(true, true, config.display.table_style)),
//!     );
//!     coordinator.execute().await?;
//!
//!     manager.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod asset;
pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod formatter;
pub mod repository;
pub mod utils;

// Re-export commonly used types
pub use asset::{Asset, AssetRecord};
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{MediaExportError, Result};
pub use export::{ExportCoordinator, ExportResult};
pub use repository::{AssetRepository, AssetStream};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
