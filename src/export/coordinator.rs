//! Export coordinator for orchestrating an asset export run
//!
//! This module drives the whole pipeline: it pulls records from the asset
//! repository, filters them, exports the qualifying ones, aggregates the
//! report rows and renders the final report through a [`ReportSink`].

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::asset::Asset;
use crate::error::{ExportError, MediaExportError, Result};
use crate::formatter::ReportFormatter;
use crate::repository::{AssetRepository, AssetStream};
use crate::utils::convert::format_bytes;
use crate::utils::string::pad_left;

use super::aggregator::{ExportAggregator, ReportRow};
use super::exporter::AssetExporter;
use super::filter::FilterCriteria;
use super::report::ReportSink;

/// Width the size column is padded to
const SIZE_COLUMN_WIDTH: usize = 9;

/// Result of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportResult {
    /// Records pulled from the repository
    pub scanned: u64,
    /// Assets written to the export directory
    pub exported: u64,
    /// Sum of the declared sizes of exported assets
    pub total_bytes: u64,
    /// Records without resource or asset source
    pub malformed: u64,
    /// Records rejected by the filter or already exported
    pub filtered_out: u64,
    /// Assets whose export failed
    pub failed: u64,
    /// Time taken for the run
    pub elapsed_ms: u64,
    /// Whether the run was cancelled
    pub cancelled: bool,
}

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    Finalizing,
    Done,
}

/// Outcome of handling a single record
enum RecordOutcome {
    Exported,
    Malformed,
    Filtered,
    Failed,
}

/// Coordinator for an export run
///
/// Single-use: [`ExportCoordinator::execute`] may be called once.
pub struct ExportCoordinator {
    repository: Arc<dyn AssetRepository>,
    criteria: FilterCriteria,
    exporter: AssetExporter,
    report: Box<dyn ReportSink>,
    formatter: ReportFormatter,
    aggregator: ExportAggregator,
    cancel_token: Option<CancellationToken>,
    state: PipelineState,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    ///
    /// # Arguments
    /// * `repository` - Source of asset records and content
    /// * `criteria` - Filter deciding which assets are exported
    /// * `exporter` - Writer for the export directory
    /// * `report` - Destination of console output
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        criteria: FilterCriteria,
        exporter: AssetExporter,
        report: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            repository,
            criteria,
            exporter,
            report,
            formatter: ReportFormatter::new(false),
            aggregator: ExportAggregator::new(),
            cancel_token: None,
            state: PipelineState::Idle,
        }
    }

    /// Enable colored report lines
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.formatter = ReportFormatter::new(use_colors);
        self
    }

    /// Set cancellation token for this run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Groups aggregated so far
    pub fn aggregator(&self) -> &ExportAggregator {
        &self.aggregator
    }

    /// Execute the export run
    ///
    /// 1. Count assets and open the record stream
    /// 2. Announce the scan and start progress
    /// 3. Export every qualifying record
    /// 4. Render the report
    ///
    /// # Returns
    /// * `Result<ExportResult>` - Run statistics or a fatal error
    pub async fn execute(&mut self) -> Result<ExportResult> {
        if self.state != PipelineState::Idle {
            return Err(MediaExportError::Pipeline(
                "export coordinator has already been run".to_string(),
            ));
        }

        let start_time = Instant::now();
        self.state = PipelineState::Scanning;

        let only_unused = self.criteria.only_unused();
        info!(
            "Starting export (unused only: {}, asset source: {})",
            only_unused,
            self.criteria.asset_source().unwrap_or("all")
        );

        let total = self.repository.count_all().await?;
        let mut stream = self.repository.stream_all().await?;

        let header = self
            .formatter
            .scan_header(only_unused, self.criteria.asset_source());
        self.report.line(&header);
        self.report.progress_start(total);

        let mut result = ExportResult::default();
        let scan = self.scan(stream.as_mut(), &mut result).await;

        // Release the cursor whatever happened during the scan
        if let Err(e) = stream.close().await {
            debug!("Failed to close asset stream: {}", e);
        }

        self.state = PipelineState::Finalizing;
        self.report.progress_finish();

        if let Err(e) = scan {
            self.state = PipelineState::Done;
            return Err(e);
        }

        self.render_report(only_unused);
        self.state = PipelineState::Done;

        result.exported = self.aggregator.exported_count();
        result.total_bytes = self.aggregator.exported_bytes();
        result.elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Export completed: {} scanned, {} exported ({} bytes), {} malformed, {} filtered, {} failed, {} ms{}",
            result.scanned,
            result.exported,
            result.total_bytes,
            result.malformed,
            result.filtered_out,
            result.failed,
            result.elapsed_ms,
            if result.cancelled { " (cancelled)" } else { "" }
        );

        Ok(result)
    }

    async fn scan(&mut self, stream: &mut dyn AssetStream, result: &mut ExportResult) -> Result<()> {
        loop {
            if let Some(ref token) = self.cancel_token
                && token.is_cancelled()
            {
                info!("Export cancelled after {} records", result.scanned);
                result.cancelled = true;
                return Ok(());
            }

            let Some(record) = stream.next_record().await? else {
                debug!("Asset stream exhausted after {} records", result.scanned);
                return Ok(());
            };

            result.scanned += 1;
            self.report.progress_advance();

            let identifier = record.identifier.clone();
            let outcome = match record.into_exportable() {
                Some(asset) => self.process(asset).await?,
                None => {
                    debug!("Skipping malformed asset record {:?}", identifier);
                    RecordOutcome::Malformed
                }
            };

            match outcome {
                RecordOutcome::Exported => {}
                RecordOutcome::Malformed => result.malformed += 1,
                RecordOutcome::Filtered => result.filtered_out += 1,
                RecordOutcome::Failed => result.failed += 1,
            }
        }
    }

    /// Export a single well-formed asset
    ///
    /// Only a fatal export error is returned; everything else becomes an
    /// outcome.
    async fn process(&mut self, asset: Asset) -> Result<RecordOutcome> {
        if !self.criteria.should_include(&asset) {
            debug!("Skipping asset {}: rejected by filter", asset.identifier);
            return Ok(RecordOutcome::Filtered);
        }

        if self.aggregator.has_exported(&asset.identifier) {
            debug!("Skipping asset {}: already exported", asset.identifier);
            return Ok(RecordOutcome::Filtered);
        }

        let exported = match self.repository.open_content(&asset.resource).await {
            Ok(content) => self.exporter.export(&asset, content).await,
            Err(e) => Err(ExportError::SourceRead {
                identifier: asset.identifier.clone(),
                message: e.to_string(),
            }),
        };

        match exported {
            Ok(info) => {
                let row = ReportRow {
                    identifier: asset.identifier.clone(),
                    filename: info.filename,
                    size: pad_left(&format_bytes(info.file_size), SIZE_COLUMN_WIDTH),
                };
                self.aggregator
                    .record(&asset.asset_source_identifier, row, info.file_size);
                Ok(RecordOutcome::Exported)
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!("Skipping asset {}: {}", asset.identifier, e);
                Ok(RecordOutcome::Failed)
            }
        }
    }

    fn render_report(&mut self, only_unused: bool) {
        if self.aggregator.is_empty() {
            let notice = self.formatter.nothing_found(only_unused);
            self.report.line("");
            self.report.line(&notice);
            return;
        }

        for group in self.aggregator.groups() {
            let label = self.formatter.group_label(only_unused, &group.asset_source);
            self.report.line("");
            self.report.line(&label);
            self.report.line("");
            self.report.table(&group.rows);
        }

        let summary = self.formatter.summary(
            self.aggregator.exported_count(),
            self.aggregator.exported_bytes(),
        );
        self.report.line("");
        self.report.line(&summary);
    }
}
