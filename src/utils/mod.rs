//! Utility functions and helpers for media-export
//!
//! This module provides common utility functions used throughout the application:
//! - String padding
//! - File system helpers
//! - Byte size formatting

use std::path::{Path, PathBuf};

use crate::error::Result;

/// String utilities
pub mod string {
    /// Right-align a string within `width` characters
    pub fn pad_left(s: &str, width: usize) -> String {
        format!("{s:>width$}")
    }
}

/// File system utilities
pub mod fs {
    use super::*;

    /// Ensure directory exists, create it and its parents if not
    ///
    /// # Arguments
    /// * `path` - Directory path
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.is_dir() {
            std::fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Expand home directory in path
    ///
    /// # Arguments
    /// * `path` - Path potentially starting with ~
    ///
    /// # Returns
    /// * `PathBuf` - Expanded path
    pub fn expand_home(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    /// Whether a file name stays inside the directory it is joined to
    ///
    /// Rejects empty names, `.`/`..` and anything containing a path separator.
    pub fn is_plain_file_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains('\0')
    }
}

/// Conversion utilities
pub mod convert {
    /// Format bytes as human-readable size
    ///
    /// # Arguments
    /// * `bytes` - Number of bytes
    ///
    /// # Returns
    /// * `String` - Formatted size (e.g., "1.50 MB")
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_left() {
        assert_eq!(string::pad_left("1.00 KB", 9), "  1.00 KB");
        assert_eq!(string::pad_left("1023.99 MB", 9), "1023.99 MB");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(convert::format_bytes(0), "0 B");
        assert_eq!(convert::format_bytes(500), "500 B");
        assert_eq!(convert::format_bytes(1024), "1.00 KB");
        assert_eq!(convert::format_bytes(1536), "1.50 KB");
        assert_eq!(convert::format_bytes(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_is_plain_file_name() {
        assert!(fs::is_plain_file_name("sunset.jpg"));
        assert!(fs::is_plain_file_name(".hidden"));
        assert!(!fs::is_plain_file_name(""));
        assert!(!fs::is_plain_file_name(".."));
        assert!(!fs::is_plain_file_name("../etc/passwd"));
        assert!(!fs::is_plain_file_name("a\\b.jpg"));
    }

    #[test]
    fn test_ensure_dir_exists_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("Data").join("MediaExport");
        fs::ensure_dir_exists(&nested).unwrap();
        fs::ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(fs::expand_home("Data/MediaExport"), PathBuf::from("Data/MediaExport"));
    }
}
