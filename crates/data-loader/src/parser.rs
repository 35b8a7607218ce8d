//! Readers for the tabular catalog inputs.
//!
//! - interactions: `user_id,parent_asin,rating,timestamp` (usually `.csv.gz`)
//! - title map: `asin,title`
//! - image map: `asin,image`
//!
//! Files ending in `.gz` are transparently decompressed.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Open a file for reading, decompressing it when the name ends in `.gz`
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DataLoadError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            DataLoadError::IoError(e)
        }
    })?;
    let reader = BufReader::new(file);
    if is_gz(path) {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Output file that is optionally gzip-compressed.
///
/// Call [`OutputFile::finish`] to write the gzip trailer and flush; a
/// dropped writer finishes silently.
pub enum OutputFile {
    Plain(BufWriter<File>),
    Gz(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    pub fn finish(self) -> Result<()> {
        match self {
            OutputFile::Plain(mut writer) => writer.flush()?,
            OutputFile::Gz(encoder) => encoder.finish()?.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            OutputFile::Plain(writer) => writer.write(buf),
            OutputFile::Gz(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            OutputFile::Plain(writer) => writer.flush(),
            OutputFile::Gz(encoder) => encoder.flush(),
        }
    }
}

/// Create a file for writing, compressing it when the name ends in `.gz`
pub fn create_maybe_gz(path: &Path) -> Result<OutputFile> {
    create_output(path, is_gz(path))
}

fn create_output(path: &Path, gz: bool) -> Result<OutputFile> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(path)?);
    if gz {
        Ok(OutputFile::Gz(GzEncoder::new(writer, Compression::default())))
    } else {
        Ok(OutputFile::Plain(writer))
    }
}

/// Output written to a `.part` sibling and moved over the target only by
/// [`StagedOutput::commit`].
///
/// Compression follows the target's name. A staged output dropped without
/// a commit removes its `.part` file and leaves the target untouched.
pub struct StagedOutput {
    file: Option<OutputFile>,
    staging: PathBuf,
    target: PathBuf,
}

impl StagedOutput {
    pub fn create(target: &Path) -> Result<Self> {
        let staging = staging_path(target);
        let file = create_output(&staging, is_gz(target))?;
        Ok(Self {
            file: Some(file),
            staging,
            target: target.to_path_buf(),
        })
    }

    /// Finish the stream and rename it into place
    pub fn commit(mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.finish()?;
        }
        std::fs::rename(&self.staging, &self.target)?;
        Ok(())
    }

    fn open_file(&mut self) -> std::io::Result<&mut OutputFile> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("staged output already committed"))
    }
}

impl Write for StagedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.open_file()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.open_file()?.flush()
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.staging);
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

fn is_gz(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Open a CSV table and check that every required column is present
fn open_table(path: &Path, required: &[&str]) -> Result<csv::Reader<Box<dyn Read>>> {
    let mut reader = csv::Reader::from_reader(open_maybe_gz(path)?);
    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataLoadError::MissingColumn {
                file: file_label(path),
                column: column.to_string(),
            });
        }
    }
    Ok(reader)
}

fn read_rows<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let mut reader = open_table(path, required)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Stream every interaction row through `visit`.
///
/// Returns the number of rows read. The interaction table is large, so it
/// is never collected into memory.
pub fn for_each_interaction<F>(path: &Path, mut visit: F) -> Result<usize>
where
    F: FnMut(Interaction),
{
    let mut reader = open_table(path, &["user_id", "parent_asin", "rating", "timestamp"])?;
    let mut count = 0;
    for row in reader.deserialize::<Interaction>() {
        visit(row?);
        count += 1;
    }
    Ok(count)
}

/// Parse the `asin,title` map
pub fn parse_title_map(path: &Path) -> Result<Vec<TitleRow>> {
    read_rows(path, &["asin", "title"])
}

/// Parse the `asin,image` map
pub fn parse_image_map(path: &Path) -> Result<Vec<ImageRow>> {
    read_rows(path, &["asin", "image"])
}
