//! Export flows: all content, or deviations from selected folders.
//!
//! Both flows run on a single logical thread of control: every page fetch,
//! metadata batch, and file write completes before the next begins. The
//! write is the last step, so a failed run leaves at most a shorter file,
//! never a corrupted row.

use std::path::PathBuf;

use tracing::info;

use crate::api::{Deviation, GalleryClient, fetch_all_pages, fetch_metadata};
use crate::export::{ExportError, TsvExporter};
use crate::select::{FolderDecider, select_folders};

/// Failures surfaced by the export flows.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Required interactive input was blank.
    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),
    /// Writing the output file failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Validated inputs for one export run.
///
/// Construction rejects blank values before any network traffic happens.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    file_stem: String,
    username: String,
}

impl ExportRequest {
    /// Builds a request from the raw prompt answers.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EmptyInput`] when the file name or username is
    /// blank after trimming.
    pub fn new(
        file_stem: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<Self, AppError> {
        let file_stem = file_stem.into().trim().to_string();
        let username = username.into().trim().to_string();

        if file_stem.is_empty() {
            return Err(AppError::EmptyInput("file name"));
        }
        if username.is_empty() {
            return Err(AppError::EmptyInput("username"));
        }

        Ok(Self {
            file_stem,
            username,
        })
    }

    /// The platform username whose gallery is exported.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Output path: the file stem with the `.tsv` extension appended.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.tsv", self.file_stem))
    }
}

/// Outcome of one export run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Deviations seen this run, before duplicate suppression.
    pub total: usize,
    /// Rows actually appended.
    pub written: usize,
    /// Path of the output file.
    pub output_path: PathBuf,
}

/// Exports every deviation in the user's gallery.
///
/// # Errors
///
/// Returns [`AppError`] when the output file cannot be written. Request
/// failures do not error: they truncate the fetched set (see
/// [`fetch_all_pages`]).
pub async fn export_all(
    client: &GalleryClient,
    request: &ExportRequest,
    batch_size: usize,
) -> Result<ExportSummary, AppError> {
    let deviations =
        fetch_all_pages(|offset| client.deviations(request.username(), None, offset)).await;
    info!(count = deviations.len(), "retrieved all deviations");

    write_output(client, request, &deviations, batch_size).await
}

/// Exports deviations from the folders the decider accepts.
///
/// Folder listings are walked first, then the decider is consulted for
/// every folder in depth-first order, then each selected folder's
/// deviations are fetched in turn into one accumulated list.
///
/// # Errors
///
/// Returns [`AppError`] when the output file cannot be written.
pub async fn export_selected(
    client: &GalleryClient,
    request: &ExportRequest,
    decider: &mut dyn FolderDecider,
    batch_size: usize,
) -> Result<ExportSummary, AppError> {
    let folders = fetch_all_pages(|offset| client.folders(request.username(), offset)).await;
    info!(count = folders.len(), "retrieved gallery folders");

    let selected = select_folders(&folders, decider);
    info!(count = selected.len(), "folders selected");

    let mut deviations: Vec<Deviation> = Vec::new();
    for folderid in &selected {
        info!(folder = %folderid, "retrieving deviations from folder");
        let mut folder_items = fetch_all_pages(|offset| {
            client.deviations(request.username(), Some(folderid.as_str()), offset)
        })
        .await;
        info!(
            count = folder_items.len(),
            folder = %folderid,
            "retrieved folder deviations"
        );
        deviations.append(&mut folder_items);
    }
    info!(total = deviations.len(), "retrieved all deviations");

    write_output(client, request, &deviations, batch_size).await
}

async fn write_output(
    client: &GalleryClient,
    request: &ExportRequest,
    deviations: &[Deviation],
    batch_size: usize,
) -> Result<ExportSummary, AppError> {
    let metadata = fetch_metadata(client, deviations, batch_size).await;
    info!(entries = metadata.len(), "retrieved deviation metadata");

    let exporter = TsvExporter::new(request.output_path());
    let written = exporter.append(deviations, &metadata)?;
    info!(written, path = %exporter.path().display(), "export complete");

    Ok(ExportSummary {
        total: deviations.len(),
        written,
        output_path: exporter.path().to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_request_rejects_blank_file_name() {
        let result = ExportRequest::new("   ", "artist");
        assert!(matches!(result, Err(AppError::EmptyInput("file name"))));
    }

    #[test]
    fn test_export_request_rejects_blank_username() {
        let result = ExportRequest::new("out", "\t");
        assert!(matches!(result, Err(AppError::EmptyInput("username"))));
    }

    #[test]
    fn test_export_request_trims_inputs() {
        let request = ExportRequest::new(" out ", " artist ").unwrap();
        assert_eq!(request.username(), "artist");
        assert_eq!(request.output_path(), PathBuf::from("out.tsv"));
    }

    #[test]
    fn test_export_request_appends_tsv_extension() {
        let request = ExportRequest::new("gallery-backup", "artist").unwrap();
        assert_eq!(request.output_path(), PathBuf::from("gallery-backup.tsv"));
    }
}
