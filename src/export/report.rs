//! Report sinks
//!
//! The coordinator talks to the terminal through [`ReportSink`]: plain lines,
//! a progress bar and tables. [`ConsoleReport`] renders to stdout/stderr,
//! [`RecordingReport`] keeps every event for later inspection.

use std::sync::{Arc, Mutex};

use crate::formatter::{TableFormatter, TableStyle};

use super::aggregator::ReportRow;
use super::progress::ProgressTracker;

/// Destination for everything an export run shows the operator
pub trait ReportSink: Send {
    /// Print one line of text
    fn line(&mut self, text: &str);

    /// Start progress reporting over `total` records
    fn progress_start(&mut self, total: u64);

    /// One more record was scanned
    fn progress_advance(&mut self);

    /// Stop progress reporting
    fn progress_finish(&mut self);

    /// Print a table of report rows
    fn table(&mut self, rows: &[ReportRow]);
}

/// Terminal report: lines and tables on stdout, progress bar on stderr
pub struct ConsoleReport {
    show_progress: bool,
    tracker: Option<ProgressTracker>,
    tables: TableFormatter,
}

impl ConsoleReport {
    /// Create a new console report
    ///
    /// # Arguments
    /// * `show_progress` - Whether to draw a progress bar
    /// * `use_colors` - Enable colored table headers
    /// * `style` - Table style
    pub fn new(show_progress: bool, use_colors: bool, style: TableStyle) -> Self {
        Self {
            show_progress,
            tracker: None,
            tables: TableFormatter::with_colors(use_colors).with_style(style),
        }
    }
}

impl ReportSink for ConsoleReport {
    fn line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn progress_start(&mut self, total: u64) {
        self.tracker = Some(ProgressTracker::new(total, self.show_progress));
    }

    fn progress_advance(&mut self) {
        if let Some(ref tracker) = self.tracker {
            tracker.advance();
        }
    }

    fn progress_finish(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.finish();
        }
    }

    fn table(&mut self, rows: &[ReportRow]) {
        println!("{}", self.tables.format_rows(rows));
    }
}

/// Event captured by [`RecordingReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Line(String),
    ProgressStart(u64),
    ProgressAdvance,
    ProgressFinish,
    Table(Vec<ReportRow>),
}

/// Report sink that records events instead of printing them
///
/// Clones share the same event log, so a clone kept by the caller sees what
/// the coordinator reported.
#[derive(Debug, Clone, Default)]
pub struct RecordingReport {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl RecordingReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// All events so far
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Non-empty text lines
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Line(text) if !text.is_empty() => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<Vec<ReportRow>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Table(rows) => Some(rows),
                _ => None,
            })
            .collect()
    }

    /// Number of progress advances
    pub fn advances(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ReportEvent::ProgressAdvance))
            .count()
    }
}

impl ReportSink for RecordingReport {
    fn line(&mut self, text: &str) {
        self.push(ReportEvent::Line(text.to_string()));
    }

    fn progress_start(&mut self, total: u64) {
        self.push(ReportEvent::ProgressStart(total));
    }

    fn progress_advance(&mut self) {
        self.push(ReportEvent::ProgressAdvance);
    }

    fn progress_finish(&mut self) {
        self.push(ReportEvent::ProgressFinish);
    }

    fn table(&mut self, rows: &[ReportRow]) {
        self.push(ReportEvent::Table(rows.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_report_shares_events_between_clones() {
        let handle = RecordingReport::new();
        let mut sink = handle.clone();

        sink.line("hello");
        sink.line("");
        sink.progress_start(2);
        sink.progress_advance();
        sink.progress_advance();
        sink.progress_finish();

        assert_eq!(handle.lines(), vec!["hello".to_string()]);
        assert_eq!(handle.advances(), 2);
        assert_eq!(handle.events().len(), 6);
    }

    #[test]
    fn test_console_report_progress_lifecycle() {
        let mut report = ConsoleReport::new(false, false, TableStyle::Ascii);
        report.progress_start(3);
        report.progress_advance();
        assert_eq!(report.tracker.as_ref().map(|t| t.processed()), Some(1));
        report.progress_finish();
        assert!(report.tracker.is_none());
    }
}
