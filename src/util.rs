//! Filesystem helpers shared by the file sinks

use crate::core::error::{LoggerError, Result};
use std::fs;
use std::path::Path;

/// Create every missing directory above `path`
///
/// # Errors
///
/// Returns `IoOperation` if a directory cannot be created
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })
        }
        _ => Ok(()),
    }
}

pub fn path_exists(path: &Path) -> bool {
    path.exists()
}
