//! Offline conversion of the raw review and metadata dumps.
//!
//! Both dumps are line-delimited JSON, usually gzip-compressed. The output
//! tables are the inputs [`crate::Catalog::load`] reads.

use crate::error::{DataLoadError, Result};
use crate::parser::{StagedOutput, open_maybe_gz};
use serde::Deserialize;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, instrument};

/// Counters reported by a conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub lines_read: usize,
    pub rows_written: usize,
}

#[derive(Debug, Deserialize)]
struct ReviewLine {
    #[serde(default)]
    user_id: Value,
    #[serde(default)]
    parent_asin: Value,
    #[serde(default)]
    rating: Value,
    #[serde(default)]
    timestamp: Value,
}

#[derive(Debug, Deserialize)]
struct MetadataLine {
    parent_asin: Option<String>,
    asin: Option<String>,
    title: Option<String>,
    images: Option<Vec<ImageVariants>>,
}

#[derive(Debug, Deserialize)]
struct ImageVariants {
    large: Option<String>,
    hi_res: Option<String>,
    thumb: Option<String>,
}

impl ImageVariants {
    fn best(&self) -> Option<&str> {
        [&self.large, &self.hi_res, &self.thumb]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|url| !url.is_empty())
    }
}

/// Project `user_id,parent_asin,rating,timestamp` out of a review dump.
///
/// Missing fields become empty cells and row order is preserved. A line
/// that is not valid JSON aborts the run and leaves any previous output in
/// place.
#[instrument]
pub fn convert_reviews(input: &Path, output: &Path) -> Result<ConversionStats> {
    let mut writer = csv::Writer::from_writer(StagedOutput::create(output)?);
    writer.write_record(["user_id", "parent_asin", "rating", "timestamp"])?;

    let mut stats = ConversionStats::default();
    stats.lines_read = for_each_json_line(input, |review: ReviewLine| {
        writer.write_record([
            cell(&review.user_id),
            cell(&review.parent_asin),
            cell(&review.rating),
            cell(&review.timestamp),
        ])?;
        stats.rows_written += 1;
        Ok(())
    })?;

    finish_csv(writer)?;
    info!("Converted {} reviews into {:?}", stats.rows_written, output);
    Ok(stats)
}

/// Build the `asin,title` map (and optionally the `asin,image` map) from a
/// metadata dump.
///
/// The identifier is `parent_asin`, falling back to `asin`. Entries without
/// an identifier or a title are skipped. The image map gets one row per
/// entry that carries at least one image URL. Outputs are replaced only
/// when the whole dump converts.
#[instrument]
pub fn prepare_metadata(
    input: &Path,
    titles: &Path,
    images: Option<&Path>,
) -> Result<ConversionStats> {
    let mut title_writer = csv::Writer::from_writer(StagedOutput::create(titles)?);
    title_writer.write_record(["asin", "title"])?;
    let mut image_writer = match images {
        Some(path) => {
            let mut writer = csv::Writer::from_writer(StagedOutput::create(path)?);
            writer.write_record(["asin", "image"])?;
            Some(writer)
        }
        None => None,
    };

    let mut stats = ConversionStats::default();
    stats.lines_read = for_each_json_line(input, |meta: MetadataLine| {
        let asin = meta
            .parent_asin
            .as_deref()
            .filter(|a| !a.is_empty())
            .or(meta.asin.as_deref())
            .unwrap_or_default();
        let title = meta.title.as_deref().unwrap_or_default();
        if asin.is_empty() || title.is_empty() {
            return Ok(());
        }

        title_writer.write_record([asin, title])?;
        stats.rows_written += 1;

        let first_image = meta.images.as_ref().and_then(|images| images.first());
        if let (Some(writer), Some(url)) = (image_writer.as_mut(), first_image.and_then(ImageVariants::best)) {
            writer.write_record([asin, url])?;
        }
        Ok(())
    })?;

    finish_csv(title_writer)?;
    if let Some(writer) = image_writer {
        finish_csv(writer)?;
    }
    info!("Wrote {} titles into {:?}", stats.rows_written, titles);
    Ok(stats)
}

/// Decode every non-blank line of a JSON-lines file and pass it to `visit`.
///
/// Returns the number of lines read, blank ones included.
fn for_each_json_line<T, F>(path: &Path, mut visit: F) -> Result<usize>
where
    T: for<'de> Deserialize<'de>,
    F: FnMut(T) -> Result<()>,
{
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let reader = BufReader::new(open_maybe_gz(path)?);

    let mut lines = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        lines += 1;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|e| DataLoadError::ParseError {
            file: file.clone(),
            line: number + 1,
            reason: e.to_string(),
        })?;
        visit(value)?;
    }
    Ok(lines)
}

/// Render a JSON scalar as a CSV cell; null and absent values are empty
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn finish_csv(writer: csv::Writer<StagedOutput>) -> Result<()> {
    let output = writer
        .into_inner()
        .map_err(|e| DataLoadError::IoError(e.into_error()))?;
    output.commit()
}
