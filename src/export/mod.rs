//! Export pipeline for media assets
//!
//! This module turns a stream of asset records into files on disk and a
//! console report:
//! - Filtering by asset source, tags and usage
//! - Writing content plus a `.meta` sidecar per asset
//! - Aggregating report rows per asset source
//! - Progress tracking with real-time feedback
//!
//! # Architecture
//!
//! 1. **FilterCriteria**: decides which assets qualify
//! 2. **AssetExporter**: writes one asset pair into the export directory
//! 3. **ExportAggregator**: collects report rows and totals
//! 4. **ReportSink**: receives lines, progress and tables
//!
//! These components are orchestrated by the **ExportCoordinator**, which
//! pulls records from an [`AssetRepository`](crate::repository::AssetRepository).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use media_export::export::{AssetExporter, ConsoleReport, ExportCoordinator, FilterCriteria};
//! use media_export::formatter::TableStyle;
//! use media_export::repository::InMemoryAssetRepository;
//!
//! # async fn run() -> media_export::error::Result<()> {
//! let repository = Arc::new(InMemoryAssetRepository::new());
//! let mut coordinator = ExportCoordinator::new(
//!     repository,
//!     FilterCriteria::new("", "", true),
//!     AssetExporter::new("./Data/MediaExport"),
//!     Box::new(ConsoleReport::new(true, true, TableStyle::Ascii)),
//! );
//! let result = coordinator.execute().await?;
//! println!("{} assets exported", result.exported);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod coordinator;
pub mod exporter;
pub mod filter;
pub mod progress;
pub mod report;

pub use aggregator::{ExportAggregator, ReportRow, SourceGroup};
pub use coordinator::{ExportCoordinator, ExportResult, PipelineState};
pub use exporter::{AssetExporter, ExportedFileInfo, FilenamePolicy, PairingPolicy, SIDECAR_SUFFIX};
pub use filter::FilterCriteria;
pub use progress::ProgressTracker;
pub use report::{ConsoleReport, RecordingReport, ReportEvent, ReportSink};
