//! Whole-file CSV table persistence.
//!
//! Tables are small enough to keep in memory: they are read once on open
//! and rewritten completely after every mutation.

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read every row of a table, creating it with just the header when the
/// file does not exist yet.
pub fn load_or_create<T: DeserializeOwned + Serialize>(path: &Path, header: &[&str]) -> Result<Vec<T>> {
    if !path.exists() {
        debug!("Creating empty table at {:?}", path);
        write_all::<T>(path, header, &[])?;
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Replace the table contents with `rows`.
///
/// The header is always written, even for an empty table. The new content
/// goes to a sibling file first and is renamed over the old one.
pub fn write_all<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = path.with_extension("csv.tmp");
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&staging)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&staging, path)?;
    Ok(())
}
