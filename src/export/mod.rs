//! Resumable tab-separated export.
//!
//! The output file is the only persistent state of the tool. Each run
//! re-reads it to recover the set of ids already written, then appends
//! only rows for new ids; rows are never rewritten or deleted, so the
//! file grows monotonically across runs. Encoding is UTF-8, fields are
//! tab-separated, rows newline-terminated.

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::api::{Deviation, DeviationMetadata};

/// Column names of the output file, written once per file.
pub const OUTPUT_HEADER: [&str; 5] = ["Deviation ID", "Title", "Image URL", "HTML", "Text"];

/// Errors that can occur reading or appending the output file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// File system error opening or flushing the output.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The output path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The existing output could not be parsed as tab-separated rows.
    #[error("failed to parse existing output {path}: {source}")]
    Parse {
        /// The output path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// A row could not be encoded and appended.
    #[error("failed to write row to {path}: {source}")]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

/// Appends deviation rows to a TSV file, skipping ids already present.
pub struct TsvExporter {
    path: PathBuf,
}

impl TsvExporter {
    /// Creates an exporter for `path`. Nothing is opened until the first
    /// read or append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The output path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids already recorded in the output file.
    ///
    /// The first column of every row after the header counts; a missing
    /// file yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the file exists but cannot be read or
    /// parsed.
    pub fn existing_ids(&self) -> Result<HashSet<String>, ExportError> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }

        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut ids = HashSet::new();
        for record in reader.records() {
            let record = record.map_err(|source| self.parse_error(source))?;
            if let Some(id) = record.get(0) {
                let id = id.trim();
                if !id.is_empty() {
                    ids.insert(id.to_string());
                }
            }
        }
        Ok(ids)
    }

    /// Appends every deviation whose id is not yet in the file.
    ///
    /// The header row is written first when the file was absent or empty.
    /// Ids written during this call join the known set, so
    /// duplicates within `deviations` are suppressed too. Tab and newline
    /// characters in the description fields are each replaced by a single
    /// space. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the file cannot be read, written, or
    /// parsed.
    pub fn append(
        &self,
        deviations: &[Deviation],
        metadata: &HashMap<String, DeviationMetadata>,
    ) -> Result<usize, ExportError> {
        let mut known_ids = self.existing_ids()?;
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if needs_header {
            writer
                .write_record(OUTPUT_HEADER)
                .map_err(|source| self.write_error(source))?;
        }

        let mut written = 0;
        for deviation in deviations {
            if known_ids.contains(&deviation.deviationid) {
                continue;
            }

            let description = metadata.get(&deviation.deviationid);
            let html = description.map(|d| sanitize(&d.html)).unwrap_or_default();
            let text = description.map(|d| sanitize(&d.text)).unwrap_or_default();

            writer
                .write_record([
                    deviation.deviationid.as_str(),
                    deviation.title_or_default(),
                    deviation.image_url_or_default(),
                    html.as_str(),
                    text.as_str(),
                ])
                .map_err(|source| self.write_error(source))?;

            known_ids.insert(deviation.deviationid.clone());
            written += 1;
        }

        writer.flush().map_err(|source| self.io_error(source))?;
        debug!(written, path = %self.path.display(), "appended rows");
        Ok(written)
    }

    fn io_error(&self, source: std::io::Error) -> ExportError {
        ExportError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parse_error(&self, source: csv::Error) -> ExportError {
        ExportError::Parse {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: csv::Error) -> ExportError {
        ExportError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Strips field and row separators out of free-text fields.
fn sanitize(value: &str) -> String {
    value.replace(['\t', '\n'], " ")
}
