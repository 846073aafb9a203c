//! Table formatting for export reports using tabled
//!
//! One table per asset source, with a fixed three-column layout:
//! asset identifier, filename and size.

use serde::{Deserialize, Serialize};
use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Color, Modify, Style,
        object::{Columns, Rows},
        width::Width,
    },
};

use crate::export::ReportRow;

/// Column headers of the report table
pub const REPORT_HEADERS: [&str; 3] = ["Asset identifier", "Filename", "Size"];

/// Maximum width for a single column (characters)
const MAX_COLUMN_WIDTH: usize = 60;

/// Table formatter for report rows
pub struct TableFormatter {
    /// Table style
    style: TableStyle,

    /// Enable colored output
    use_colors: bool,
}

/// Available table styles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// ASCII style with basic characters
    #[default]
    Ascii,
    /// Modern style with box-drawing characters
    Modern,
    /// Rounded style
    Rounded,
    /// Markdown style
    Markdown,
    /// Psql style
    Psql,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self {
            style: TableStyle::default(),
            use_colors: false,
        }
    }

    /// Create a new table formatter with color support
    ///
    /// # Arguments
    /// * `use_colors` - Enable colored header row
    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Format report rows as a table
    ///
    /// # Arguments
    /// * `rows` - Rows of one asset source, in export order
    ///
    /// # Returns
    /// * `String` - Rendered table
    pub fn format_rows(&self, rows: &[ReportRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(REPORT_HEADERS);

        for row in rows {
            builder.push_record([
                row.identifier.as_str(),
                row.filename.as_str(),
                row.size.as_str(),
            ]);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);

        for i in 0..REPORT_HEADERS.len() {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(MAX_COLUMN_WIDTH)));
        }

        // Sizes line up on the unit
        table.with(Modify::new(Columns::last()).with(Alignment::right()));

        if self.use_colors {
            table.modify(Rows::first(), Color::FG_GREEN);
        }

        table.to_string()
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Rounded => table.with(Style::rounded()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}
