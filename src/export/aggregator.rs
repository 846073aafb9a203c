//! Per-source aggregation of exported assets
//!
//! Pure bookkeeping: rows grouped by asset source in first-seen order, plus
//! running totals. Only small row tuples are kept, never content.

use std::collections::{HashMap, HashSet};

/// One line of the final report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub identifier: String,
    pub filename: String,
    /// Human-readable size, right-aligned
    pub size: String,
}

/// Rows exported from one asset source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub asset_source: String,
    pub rows: Vec<ReportRow>,
    pub total_bytes: u64,
}

/// Accumulates report rows and totals while the scan runs
#[derive(Debug, Default)]
pub struct ExportAggregator {
    groups: Vec<SourceGroup>,
    index: HashMap<String, usize>,
    exported: HashSet<String>,
    exported_count: u64,
    exported_bytes: u64,
}

impl ExportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exported asset under its asset source
    ///
    /// # Arguments
    /// * `asset_source` - Asset source identifier used as group key
    /// * `row` - Report row for the asset
    /// * `byte_size` - Declared resource size
    pub fn record(&mut self, asset_source: &str, row: ReportRow, byte_size: u64) {
        let position = match self.index.get(asset_source) {
            Some(&position) => position,
            None => {
                self.groups.push(SourceGroup {
                    asset_source: asset_source.to_string(),
                    rows: Vec::new(),
                    total_bytes: 0,
                });
                self.index
                    .insert(asset_source.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        self.exported.insert(row.identifier.clone());

        let group = &mut self.groups[position];
        group.rows.push(row);
        group.total_bytes += byte_size;

        self.exported_count += 1;
        self.exported_bytes += byte_size;
    }

    /// Whether an asset with this identifier was already recorded
    pub fn has_exported(&self, identifier: &str) -> bool {
        self.exported.contains(identifier)
    }

    /// Groups in first-seen order
    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    pub fn exported_count(&self) -> u64 {
        self.exported_count
    }

    pub fn exported_bytes(&self) -> u64 {
        self.exported_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.exported_count == 0
    }
}
