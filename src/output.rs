//! Output formatting and persistence for scores and batch results.
//!
//! Supports JSON logging, JSON files, and CSV append.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    debug!(path = %path.display(), "JSON written");
    Ok(())
}

/// Appends a record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
