//! Output formatting for export reports
//!
//! This module renders everything the operator sees on stdout:
//! - The scan header announcing mode and scope
//! - Per-source table labels and tables
//! - The "nothing found" notice and the summary line
//!
//! Colors are applied with nu-ansi-term and can be switched off.

use nu_ansi_term::{Color, Style};

use crate::utils::convert::format_bytes;

pub mod table;

pub use table::{TableFormatter, TableStyle};

/// Formatter for report lines
#[derive(Debug, Clone, Copy)]
pub struct ReportFormatter {
    /// Enable colored output
    use_colors: bool,
}

impl ReportFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Header printed before scanning starts
    ///
    /// # Arguments
    /// * `only_unused` - Whether only unused assets are exported
    /// * `asset_source` - Asset source filter, None for all sources
    pub fn scan_header(&self, only_unused: bool, asset_source: Option<&str>) -> String {
        let line = match asset_source {
            Some(source) => format!(
                "Searching for {}assets of asset source \"{}\":",
                mode_word(only_unused),
                source
            ),
            None => format!(
                "Searching for {}assets in all asset sources:",
                mode_word(only_unused)
            ),
        };
        self.bold(&line)
    }

    /// Label printed above the table of one asset source
    pub fn group_label(&self, only_unused: bool, asset_source: &str) -> String {
        format!(
            "Exported the following {}assets from asset source {}:",
            mode_word(only_unused),
            self.success(asset_source)
        )
    }

    /// Notice printed when nothing was exported
    pub fn nothing_found(&self, only_unused: bool) -> String {
        format!("No {}assets found.", mode_word(only_unused))
    }

    /// Summary line printed after all tables
    pub fn summary(&self, exported_count: u64, exported_bytes: u64) -> String {
        format!(
            "Total size of {} exported assets: {}",
            exported_count,
            format_bytes(exported_bytes)
        )
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            Style::new().bold().paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn success(&self, text: &str) -> String {
        if self.use_colors {
            Color::Green.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn mode_word(only_unused: bool) -> &'static str {
    if only_unused { "unused " } else { "" }
}
